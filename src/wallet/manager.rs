//! Wallet orchestration
//!
//! One `WalletManager` per active wallet. It owns the last refresh result
//! and the pending-transaction list, and is the only place that suspends:
//! on the network provider and on the external signer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::provider::NetworkProvider;
use crate::error::{NetworkError, WalletError, WalletResult};
use crate::fees::model::FeeModel;
use crate::fees::Fee;
use crate::signing::Signer;
use crate::tx::{ChainData, TransactionBuilder};
use crate::types::{Address, Amount, Blockchain, PublicKey, Transaction};
use crate::{log_debug, log_error, log_info, log_warn};

const MODULE: &str = "wallet";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletState {
    Created,
    Loading,
    Idle,
    NoAccount(String),
    Failed(WalletError),
}

/// A broadcast transaction not yet reflected in the balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransaction {
    pub hash: String,
    pub amount: Amount,
    pub fee: Amount,
    pub destination: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct WalletData {
    /// Shown to callers; hidden again after a failed refresh.
    balance: Option<Amount>,
    /// Last balance a refresh succeeded with. Only a successful refresh moves it.
    last_known_balance: Option<Amount>,
    chain_data: ChainData,
    pending: Vec<PendingTransaction>,
}

type Refresh = Shared<BoxFuture<'static, WalletResult<()>>>;

/// The refresh currently running, if any. `generation` tells a finishing
/// task whether the slot still holds its own refresh.
#[derive(Default)]
struct RefreshSlot {
    generation: u64,
    running: Option<Refresh>,
}

struct Inner {
    blockchain: Blockchain,
    public_key: PublicKey,
    addresses: Vec<Address>,
    builder: Box<dyn TransactionBuilder>,
    fee_model: Box<dyn FeeModel>,
    provider: Arc<dyn NetworkProvider>,
    state: watch::Sender<WalletState>,
    data: Mutex<WalletData>,
    refresh: Mutex<RefreshSlot>,
    signing: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Frees the refresh slot when the refresh task ends, however it ends.
struct RefreshDone<'a> {
    inner: &'a Inner,
    generation: u64,
}

impl Drop for RefreshDone<'_> {
    fn drop(&mut self) {
        let mut slot = lock(&self.inner.refresh);
        if slot.generation == self.generation {
            slot.running = None;
        }
    }
}

impl Inner {
    /// Runs on its own task, so callers dropping their `update()` future
    /// neither stall it nor leave the wallet `Loading`.
    async fn refresh(self: Arc<Self>, generation: u64) -> WalletResult<()> {
        let _done = RefreshDone {
            inner: &self,
            generation,
        };
        log_debug!(MODULE, "refreshing", blockchain = self.blockchain);

        match self.provider.update(&self.addresses).await {
            Ok(snapshot) => {
                {
                    let mut data = lock(&self.data);
                    let changed = data
                        .last_known_balance
                        .as_ref()
                        .is_some_and(|last| *last != snapshot.balance);
                    if changed && !data.pending.is_empty() {
                        log_info!(MODULE, "balance moved, clearing pending", count = data.pending.len());
                        data.pending.clear();
                    }
                    data.last_known_balance = Some(snapshot.balance.clone());
                    data.balance = Some(snapshot.balance);
                    data.chain_data = snapshot.chain_data;
                }
                self.state.send_replace(WalletState::Idle);
                Ok(())
            }
            Err(NetworkError::NoAccount(message)) => {
                {
                    let mut data = lock(&self.data);
                    data.balance = None;
                    data.chain_data = ChainData::None;
                }
                log_info!(MODULE, "account not found", blockchain = self.blockchain);
                self.state.send_replace(WalletState::NoAccount(message));
                Ok(())
            }
            Err(error) => {
                let error = WalletError::from(error);
                {
                    let mut data = lock(&self.data);
                    data.balance = None;
                    data.chain_data = ChainData::None;
                }
                log_warn!(MODULE, "refresh failed", code = format!("{:?}", error.code()));
                self.state.send_replace(WalletState::Failed(error.clone()));
                Err(error)
            }
        }
    }
}

/// Held for the duration of one `send`.
struct SignSlot<'a>(&'a AtomicBool);

impl<'a> SignSlot<'a> {
    fn acquire(flag: &'a AtomicBool) -> WalletResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| SignSlot(flag))
            .map_err(|_| WalletError::SendInProgress)
    }
}

impl Drop for SignSlot<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct WalletManager {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for WalletManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletManager")
            .field("blockchain", &self.inner.blockchain)
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

impl WalletManager {
    pub fn new(
        blockchain: Blockchain,
        public_key: PublicKey,
        addresses: Vec<Address>,
        builder: Box<dyn TransactionBuilder>,
        fee_model: Box<dyn FeeModel>,
        provider: Arc<dyn NetworkProvider>,
    ) -> Self {
        let (state, _) = watch::channel(WalletState::Created);
        Self {
            inner: Arc::new(Inner {
                blockchain,
                public_key,
                addresses,
                builder,
                fee_model,
                provider,
                state,
                data: Mutex::new(WalletData::default()),
                refresh: Mutex::new(RefreshSlot::default()),
                signing: AtomicBool::new(false),
            }),
        }
    }

    pub fn blockchain(&self) -> Blockchain {
        self.inner.blockchain
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.inner.public_key
    }

    pub fn addresses(&self) -> &[Address] {
        &self.inner.addresses
    }

    /// The address transactions are sent from by default.
    pub fn default_address(&self) -> Option<&Address> {
        self.inner.addresses.first()
    }

    pub fn state(&self) -> WalletState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WalletState> {
        self.inner.state.subscribe()
    }

    /// `None` until a refresh succeeds, and again after one fails.
    pub fn balance(&self) -> Option<Amount> {
        lock(&self.inner.data).balance.clone()
    }

    pub fn chain_data(&self) -> ChainData {
        lock(&self.inner.data).chain_data.clone()
    }

    pub fn pending_transactions(&self) -> Vec<PendingTransaction> {
        lock(&self.inner.data).pending.clone()
    }

    /// Refresh balance and chain data.
    ///
    /// Calls made while a refresh is running join it and get its result.
    /// The refresh itself runs on a spawned task and completes even if
    /// every caller stops waiting.
    pub async fn update(&self) -> WalletResult<()> {
        let refresh = {
            let mut slot = lock(&self.inner.refresh);
            match slot.running.clone() {
                Some(running) => running,
                None => {
                    slot.generation = slot.generation.wrapping_add(1);
                    self.inner.state.send_replace(WalletState::Loading);
                    let task = tokio::spawn(Arc::clone(&self.inner).refresh(slot.generation));
                    let refresh = async move {
                        task.await.unwrap_or_else(|e| {
                            log_error!(MODULE, "refresh task ended abnormally", reason = e);
                            Err(WalletError::from(NetworkError::Transport(format!("refresh task: {e}"))))
                        })
                    }
                    .boxed()
                    .shared();
                    slot.running = Some(refresh.clone());
                    refresh
                }
            }
        };
        refresh.await
    }

    /// Fee options for sending `amount` to `destination`, slowest first.
    pub async fn get_fee(&self, amount: &Amount, destination: &str) -> WalletResult<Vec<Fee>> {
        let quote = self.inner.provider.fee_quote(amount, destination).await?;
        Ok(self.inner.fee_model.make_fees(&quote))
    }

    /// Build, sign, assemble and broadcast. Returns the transaction hash.
    ///
    /// Nothing is recorded and nothing is broadcast unless every step
    /// succeeds. Dropping the future while the signer is pending cancels
    /// the send with no side effect.
    pub async fn send(&self, transaction: &Transaction, signer: &dyn Signer) -> WalletResult<String> {
        let _slot = SignSlot::acquire(&self.inner.signing)?;

        let chain_data = self.chain_data();
        let payload = self.inner.builder.build_for_sign(transaction, &chain_data)?;
        let hashes = payload.hashes();
        log_debug!(MODULE, "awaiting signatures", count = hashes.len());

        let signatures = match signer.sign(&hashes, &self.inner.public_key).await {
            Ok(signatures) => signatures,
            Err(error) => {
                let error = WalletError::from(error);
                if error.is_cancellation() {
                    log_info!(MODULE, "signing cancelled");
                }
                return Err(error);
            }
        };

        let signed = self.inner.builder.build_for_send(&payload, &signatures)?;
        let hash = self.inner.provider.submit(&signed).await?;

        log_info!(
            MODULE,
            "transaction sent",
            blockchain = self.inner.blockchain,
            tx_hash = hash,
            destination = transaction.destination_address
        );
        lock(&self.inner.data).pending.push(PendingTransaction {
            hash: hash.clone(),
            amount: transaction.amount.clone(),
            fee: transaction.fee.amount.clone(),
            destination: transaction.destination_address.clone(),
            date: Utc::now(),
        });
        Ok(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_slot_is_exclusive() {
        let flag = AtomicBool::new(false);
        let first = SignSlot::acquire(&flag).unwrap();
        assert_eq!(SignSlot::acquire(&flag).err(), Some(WalletError::SendInProgress));
        drop(first);
        assert!(SignSlot::acquire(&flag).is_ok());
    }
}
