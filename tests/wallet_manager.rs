use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use hawala_txcore::fees::model::FeeQuote;
use hawala_txcore::fees::{Fee, FeeParameters};
use hawala_txcore::signing::{SignedResult, Signer};
use hawala_txcore::tx::ChainData;
use hawala_txcore::types::{Address, Amount, Blockchain, Currency, PublicKey, Transaction};
use hawala_txcore::wallet::{AccountSnapshot, NetworkProvider, NetworkResult, WalletFactory, WalletManager, WalletState};
use hawala_txcore::{NetworkError, SignerError, WalletError};
use rust_decimal::Decimal;

const WALLET_KEY: &str = "04EB30400CE9D1DEED12B84D4161A1FA922EF4185A155EF3EC208078B3807B126FA22C335081AAEBF161095C11C7D8BD550EF8882A3125B0EE9AE96DDDE1AE743F";
const SIGNATURE: &str = "B945398FB90158761F6D61789B594D042F0F490F9656FBFFAE8F18B49D5F30054F43EE43CCAB2703F0E2E4E61D99CF3D4A875CD759569787CF0AED02415434C6";
const SIGNED_TX: &str = "f86c0f856edf2a079e825208947655b9b19ffab8b897f836857dae22a1e7f8d73588016345785d8a00008025a0b945398fb90158761f6d61789b594d042f0f490f9656fbffae8f18b49d5f3005a04f43ee43ccab2703f0e2e4e61d99cf3d4a875cd759569787cf0aed02415434c6";

#[derive(Default)]
struct FakeProvider {
    balance: Mutex<Option<Result<Decimal, NetworkError>>>,
    updates: AtomicUsize,
    submitted: Mutex<Vec<Vec<u8>>>,
}

impl FakeProvider {
    fn with_balance(balance: &str) -> Arc<Self> {
        let provider = Self::default();
        provider.set_balance(Ok(Decimal::from_str(balance).unwrap()));
        Arc::new(provider)
    }

    fn set_balance(&self, balance: Result<Decimal, NetworkError>) {
        *self.balance.lock().unwrap() = Some(balance);
    }
}

#[async_trait]
impl NetworkProvider for FakeProvider {
    async fn update(&self, addresses: &[Address]) -> NetworkResult<AccountSnapshot> {
        assert!(!addresses.is_empty());
        self.updates.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        let balance = self
            .balance
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(NetworkError::Transport("no response configured".into())))?;
        Ok(AccountSnapshot {
            balance: Amount::coin(Blockchain::Ethereum, balance),
            chain_data: ChainData::Account { nonce: 15 },
        })
    }

    async fn fee_quote(&self, _amount: &Amount, _destination: &str) -> NetworkResult<FeeQuote> {
        Ok(FeeQuote::Gas {
            limit: 21_000,
            prices: vec![1_000_000_000, 2_000_000_000, 3_000_000_000],
        })
    }

    async fn submit(&self, signed: &SignedResult) -> NetworkResult<String> {
        let raw = signed.as_raw().ok_or_else(|| NetworkError::Rejected("not raw".into()))?;
        self.submitted.lock().unwrap().push(raw.to_vec());
        Ok("0xbdbecf64b443f82d1f9fda3f2d6ba69af6d82029b8271339b7e775613ae57761".into())
    }
}

enum Behaviour {
    Sign,
    Cancel,
    Hang,
}

struct FakeSigner {
    behaviour: Behaviour,
    calls: AtomicUsize,
}

impl FakeSigner {
    fn new(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Signer for FakeSigner {
    async fn sign(&self, hashes: &[Vec<u8>], _public_key: &PublicKey) -> Result<Vec<Vec<u8>>, SignerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behaviour {
            Behaviour::Sign => Ok(hashes.iter().map(|_| hex::decode(SIGNATURE).unwrap()).collect()),
            Behaviour::Cancel => Err(SignerError::Cancelled),
            Behaviour::Hang => futures::future::pending().await,
        }
    }
}

fn manager(provider: Arc<FakeProvider>) -> WalletManager {
    hawala_txcore::utils::logging::init();
    WalletFactory::default()
        .make_wallet(
            Blockchain::Ethereum,
            PublicKey::secp256k1(hex::decode(WALLET_KEY).unwrap()),
            provider,
        )
        .unwrap()
}

fn transaction(manager: &WalletManager) -> Transaction {
    let parameters = FeeParameters::Legacy {
        limit: 21_000,
        price: 476_190_476_190,
    };
    let fee = Fee::with_parameters(
        Amount::from_smallest_unit(Currency::Coin { blockchain: Blockchain::Ethereum }, parameters.total_units()),
        parameters,
    );
    Transaction::new(
        Amount::coin(Blockchain::Ethereum, Decimal::from_str("0.1").unwrap()),
        fee,
        manager.default_address().unwrap().value.clone(),
        "0x7655b9b19ffab8b897f836857dae22a1e7f8d735",
    )
}

#[tokio::test]
async fn update_moves_to_idle_with_balance() {
    let provider = FakeProvider::with_balance("1.5");
    let manager = manager(provider.clone());
    assert_eq!(manager.state(), WalletState::Created);

    manager.update().await.unwrap();
    assert_eq!(manager.state(), WalletState::Idle);
    assert_eq!(manager.balance().unwrap().value, Decimal::from_str("1.5").unwrap());
    assert_eq!(manager.chain_data(), ChainData::Account { nonce: 15 });
}

#[tokio::test]
async fn concurrent_updates_are_coalesced() {
    let provider = FakeProvider::with_balance("1");
    let manager = manager(provider.clone());

    let (first, second) = tokio::join!(manager.update(), manager.update());
    assert_eq!(first, second);
    assert!(first.is_ok());
    assert_eq!(provider.updates.load(Ordering::SeqCst), 1);

    manager.update().await.unwrap();
    assert_eq!(provider.updates.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failed_update_clears_balance() {
    let provider = FakeProvider::with_balance("1");
    let manager = manager(provider.clone());
    manager.update().await.unwrap();

    provider.set_balance(Err(NetworkError::Transport("timeout".into())));
    let err = manager.update().await.unwrap_err();
    assert_eq!(err, WalletError::Network(NetworkError::Transport("timeout".into())));
    assert_eq!(manager.state(), WalletState::Failed(err));
    assert_eq!(manager.balance(), None);
}

#[tokio::test]
async fn unknown_account_is_a_state_not_a_failure() {
    let provider = FakeProvider::with_balance("1");
    provider.set_balance(Err(NetworkError::NoAccount("fund the account first".into())));
    let manager = manager(provider);

    manager.update().await.unwrap();
    assert_eq!(manager.state(), WalletState::NoAccount("fund the account first".into()));
    assert_eq!(manager.balance(), None);
}

#[tokio::test]
async fn state_changes_are_observable() {
    let provider = FakeProvider::with_balance("1");
    let manager = manager(provider);
    let mut receiver = manager.subscribe();

    let update = manager.update();
    tokio::pin!(update);
    assert!(futures::poll!(&mut update).is_pending());
    assert_eq!(*receiver.borrow_and_update(), WalletState::Loading);

    update.await.unwrap();
    receiver.changed().await.unwrap();
    assert_eq!(*receiver.borrow(), WalletState::Idle);
}

#[tokio::test]
async fn send_broadcasts_and_records_pending() {
    let provider = FakeProvider::with_balance("1");
    let manager = manager(provider.clone());
    manager.update().await.unwrap();

    let signer = FakeSigner::new(Behaviour::Sign);
    let hash = manager.send(&transaction(&manager), &signer).await.unwrap();

    assert_eq!(hash, "0xbdbecf64b443f82d1f9fda3f2d6ba69af6d82029b8271339b7e775613ae57761");
    assert_eq!(hex::encode(&provider.submitted.lock().unwrap()[0]), SIGNED_TX);
    let pending = manager.pending_transactions();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].hash, hash);
    assert_eq!(pending[0].amount.value, Decimal::from_str("0.1").unwrap());
}

#[tokio::test]
async fn balance_change_clears_pending() {
    let provider = FakeProvider::with_balance("1");
    let manager = manager(provider.clone());
    manager.update().await.unwrap();
    manager
        .send(&transaction(&manager), &FakeSigner::new(Behaviour::Sign))
        .await
        .unwrap();

    manager.update().await.unwrap();
    assert_eq!(manager.pending_transactions().len(), 1);

    provider.set_balance(Ok(Decimal::from_str("0.89").unwrap()));
    manager.update().await.unwrap();
    assert!(manager.pending_transactions().is_empty());
}

#[tokio::test]
async fn balance_change_after_failed_refresh_clears_pending() {
    let provider = FakeProvider::with_balance("1");
    let manager = manager(provider.clone());
    manager.update().await.unwrap();
    manager
        .send(&transaction(&manager), &FakeSigner::new(Behaviour::Sign))
        .await
        .unwrap();

    provider.set_balance(Err(NetworkError::Transport("timeout".into())));
    assert!(manager.update().await.is_err());
    assert_eq!(manager.balance(), None);
    assert_eq!(manager.pending_transactions().len(), 1);

    provider.set_balance(Ok(Decimal::from_str("0.89").unwrap()));
    manager.update().await.unwrap();
    assert!(manager.pending_transactions().is_empty());
    assert_eq!(manager.balance().unwrap().value, Decimal::from_str("0.89").unwrap());
}

#[tokio::test]
async fn pending_survives_refresh_after_failure_with_same_balance() {
    let provider = FakeProvider::with_balance("1");
    let manager = manager(provider.clone());
    manager.update().await.unwrap();
    manager
        .send(&transaction(&manager), &FakeSigner::new(Behaviour::Sign))
        .await
        .unwrap();

    provider.set_balance(Err(NetworkError::Transport("timeout".into())));
    assert!(manager.update().await.is_err());

    provider.set_balance(Ok(Decimal::ONE));
    manager.update().await.unwrap();
    assert_eq!(manager.pending_transactions().len(), 1);
}

#[tokio::test]
async fn abandoned_update_still_completes() {
    let provider = FakeProvider::with_balance("1");
    let manager = manager(provider.clone());

    let abandoned = tokio::time::timeout(Duration::from_millis(5), manager.update()).await;
    assert!(abandoned.is_err());
    assert_eq!(manager.state(), WalletState::Loading);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(manager.state(), WalletState::Idle);
    assert_eq!(manager.balance().unwrap().value, Decimal::ONE);

    // The finished refresh is not replayed; a new call fetches again.
    provider.set_balance(Ok(Decimal::from_str("2").unwrap()));
    manager.update().await.unwrap();
    assert_eq!(provider.updates.load(Ordering::SeqCst), 2);
    assert_eq!(manager.balance().unwrap().value, Decimal::from_str("2").unwrap());
}

#[tokio::test]
async fn cancelled_signing_has_no_side_effects() {
    let provider = FakeProvider::with_balance("1");
    let manager = manager(provider.clone());
    manager.update().await.unwrap();

    let signer = FakeSigner::new(Behaviour::Cancel);
    let err = manager.send(&transaction(&manager), &signer).await.unwrap_err();

    assert!(err.is_cancellation());
    assert_eq!(signer.calls.load(Ordering::SeqCst), 1);
    assert_eq!(manager.state(), WalletState::Idle);
    assert!(manager.pending_transactions().is_empty());
    assert!(provider.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn dropping_send_while_signing_has_no_side_effects() {
    let provider = FakeProvider::with_balance("1");
    let manager = manager(provider.clone());
    manager.update().await.unwrap();

    let signer = FakeSigner::new(Behaviour::Hang);
    let tx = transaction(&manager);
    let result = tokio::time::timeout(Duration::from_millis(20), manager.send(&tx, &signer)).await;

    assert!(result.is_err());
    assert_eq!(manager.state(), WalletState::Idle);
    assert!(manager.pending_transactions().is_empty());
    assert!(provider.submitted.lock().unwrap().is_empty());

    // The sign slot is released with the dropped future.
    let hash = manager.send(&tx, &FakeSigner::new(Behaviour::Sign)).await;
    assert!(hash.is_ok());
}

#[tokio::test]
async fn only_one_send_may_await_the_signer() {
    let provider = FakeProvider::with_balance("1");
    let manager = manager(provider.clone());
    manager.update().await.unwrap();

    let tx = transaction(&manager);
    let hanging = FakeSigner::new(Behaviour::Hang);
    let first = manager.send(&tx, &hanging);
    tokio::pin!(first);
    assert!(futures::poll!(&mut first).is_pending());

    let err = manager
        .send(&tx, &FakeSigner::new(Behaviour::Sign))
        .await
        .unwrap_err();
    assert_eq!(err, WalletError::SendInProgress);
    assert!(provider.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn fee_options_come_from_the_chain_model() {
    let provider = FakeProvider::with_balance("1");
    let manager = manager(provider);
    let amount = Amount::coin(Blockchain::Ethereum, Decimal::ONE);

    let fees = manager.get_fee(&amount, "0x7655b9b19ffab8b897f836857dae22a1e7f8d735").await.unwrap();
    assert_eq!(fees.len(), 3);
    assert_eq!(fees[0].amount.smallest_unit(), Some(21_000 * 1_000_000_000));
    assert!(matches!(fees[2].parameters, Some(FeeParameters::Legacy { price: 3_000_000_000, .. })));
}
