use hawala_txcore::fees::{Fee, FeeParameters};
use hawala_txcore::tx::{ChainData, EthereumTransactionBuilder, TransactionBuilder};
use hawala_txcore::types::{Amount, Blockchain, Currency, PublicKey, Token, Transaction};
use hawala_txcore::BuildError;
use rust_decimal::Decimal;
use std::str::FromStr;

const ETHEREUM_KEY: &str = "04EB30400CE9D1DEED12B84D4161A1FA922EF4185A155EF3EC208078B3807B126FA22C335081AAEBF161095C11C7D8BD550EF8882A3125B0EE9AE96DDDE1AE743F";
const POLYGON_KEY: &str = "043b08e56e38404199eb3320f32fdc7557029d4a4c39adae01cc47afd86cfa9a25fcbfaa2acda3ab33560a1d482a2088f3bb2c7b313fd11f50dd8fe508165d4ecf";

fn fee(blockchain: Blockchain, parameters: FeeParameters) -> Fee {
    let amount = Amount::from_smallest_unit(Currency::Coin { blockchain }, parameters.total_units());
    Fee::with_parameters(amount, parameters)
}

fn legacy_fee() -> Fee {
    fee(
        Blockchain::Ethereum,
        FeeParameters::Legacy {
            limit: 21_000,
            price: 476_190_476_190,
        },
    )
}

fn sign_and_send(
    builder: &EthereumTransactionBuilder,
    transaction: &Transaction,
    nonce: u64,
    signature: &str,
) -> (String, String) {
    let payload = builder
        .build_for_sign(transaction, &ChainData::Account { nonce })
        .unwrap();
    let hashes = payload.hashes();
    assert_eq!(hashes.len(), 1);
    let signed = builder
        .build_for_send(&payload, &[hex::decode(signature).unwrap()])
        .unwrap();
    (hex::encode(&hashes[0]), hex::encode(signed.as_raw().unwrap()))
}

#[test]
fn legacy_coin_transfer() {
    let builder = EthereumTransactionBuilder::new(1, PublicKey::secp256k1(hex::decode(ETHEREUM_KEY).unwrap()));
    let tx = Transaction::new(
        Amount::coin(Blockchain::Ethereum, Decimal::from_str("0.1").unwrap()),
        legacy_fee(),
        "0xb3a7f2c1d0e45f6a7b8c9d0e1f2a3b4c5d6e7f80",
        "0x7655b9b19ffab8b897f836857dae22a1e7f8d735",
    );

    let (hash, signed) = sign_and_send(
        &builder,
        &tx,
        15,
        "B945398FB90158761F6D61789B594D042F0F490F9656FBFFAE8F18B49D5F30054F43EE43CCAB2703F0E2E4E61D99CF3D4A875CD759569787CF0AED02415434C6",
    );
    assert_eq!(hash, "bdbecf64b443f82d1f9fda3f2d6ba69af6d82029b8271339b7e775613ae57761");
    assert_eq!(
        signed,
        "f86c0f856edf2a079e825208947655b9b19ffab8b897f836857dae22a1e7f8d73588016345785d8a00008025a0b945398fb90158761f6d61789b594d042f0f490f9656fbffae8f18b49d5f3005a04f43ee43ccab2703f0e2e4e61d99cf3d4a875cd759569787cf0aed02415434c6"
    );
}

#[test]
fn legacy_token_transfer_normalizes_high_s() {
    let builder = EthereumTransactionBuilder::new(1, PublicKey::secp256k1(hex::decode(ETHEREUM_KEY).unwrap()));
    let token = Token::new("USDC", "0xA0B86991C6218B36C1D19D4A2E9EB0CE3606EB48", 18);
    let tx = Transaction::new(
        Amount::token(token, Decimal::from_str("0.1").unwrap()),
        legacy_fee(),
        "0xb3a7f2c1d0e45f6a7b8c9d0e1f2a3b4c5d6e7f80",
        "0x7655b9b19ffab8b897f836857dae22a1e7f8d735",
    );

    let (hash, signed) = sign_and_send(
        &builder,
        &tx,
        15,
        "F408C40F8D8B4A40E35502355C87FBBF218EC9ECB036D42DAA6211EAD4498A6FBC800E82CB2CC0FAB1D68FD3F8E895EC3E0DCB5A05342F5153210142E4224D4C",
    );
    assert_eq!(hash, "2f47b058a0c4a91ec6e26372fa926acb899235d7a639565b4fc82c7a9356d6c5");
    assert_eq!(
        signed,
        "f8a90f856edf2a079e82520894a0b86991c6218b36c1d19d4a2e9eb0ce3606eb4880b844a9059cbb0000000000000000000000007655b9b19ffab8b897f836857dae22a1e7f8d735000000000000000000000000000000000000000000000000016345785d8a000025a0f408c40f8d8b4a40e35502355c87fbbf218ec9ecb036d42daa6211ead4498a6fa0437ff17d34d33f054e29702c07176a127ca1118caa1470ea6cb15d49ec13f3f5"
    );
}

#[test]
fn eip1559_token_transfer() {
    let builder = EthereumTransactionBuilder::new(137, PublicKey::secp256k1(hex::decode(POLYGON_KEY).unwrap()));
    let token = Token::new("USDT", "0xc2132d05d31c914a87c6611c10748aeb04b58e8f", 6);
    let tx = Transaction::new(
        Amount::token(token, Decimal::ONE),
        fee(
            Blockchain::Polygon,
            FeeParameters::PriorityBased {
                limit: 47_525,
                max_fee: 138_077_377_799,
                priority_fee: 30_000_000_000,
            },
        ),
        "0x90e4d59c8583e37426b37d1d7394b6008a987c67",
        "0x90e4d59c8583e37426b37d1d7394b6008a987c67",
    );

    let (hash, signed) = sign_and_send(
        &builder,
        &tx,
        195,
        "b8291b199416b39434f3c3b8cfd273afb41fa25f2ae66f8a4c56b08ad1749a122148b8bbbdeb7761031799ffbcbc7c0ee1dd4482f516bd6a33387ea5bce8cb7d",
    );
    assert_eq!(hash, "7843727fd03b42156222548815759dda5ac888033372157edffdde58fc05eff5");
    assert_eq!(
        signed,
        "02f8b3818981c38506fc23ac008520260d950782b9a594c2132d05d31c914a87c6611c10748aeb04b58e8f80b844a9059cbb00000000000000000000000090e4d59c8583e37426b37d1d7394b6008a987c6700000000000000000000000000000000000000000000000000000000000f4240c080a0b8291b199416b39434f3c3b8cfd273afb41fa25f2ae66f8a4c56b08ad1749a12a02148b8bbbdeb7761031799ffbcbc7c0ee1dd4482f516bd6a33387ea5bce8cb7d"
    );
}

#[test]
fn eip1559_coin_transfer() {
    let builder = EthereumTransactionBuilder::new(137, PublicKey::secp256k1(hex::decode(POLYGON_KEY).unwrap()));
    let tx = Transaction::new(
        Amount::coin(Blockchain::Polygon, Decimal::ONE),
        fee(
            Blockchain::Polygon,
            FeeParameters::PriorityBased {
                limit: 21_000,
                max_fee: 4_478_253_867_089,
                priority_fee: 31_900_000_000,
            },
        ),
        "0x90e4d59c8583e37426b37d1d7394b6008a987c67",
        "0x90e4d59c8583e37426b37d1d7394b6008a987c67",
    );

    let (hash, signed) = sign_and_send(
        &builder,
        &tx,
        196,
        "56DF71FF2A7FE93D2363056FE5FF32C51E5AC71733AF23A82F3974CB872537E95B60D6A0042CC34724DB84E949EEC8643761FE9027E9E7B1ED3DA23D8AB7C0A4",
    );
    assert_eq!(hash, "925f1debbb96941544aefe6a5532508e51f2b8ae1f3a911abfb24b83af610400");
    assert_eq!(
        signed,
        "02f877818981c485076d635f00860412acbb20518252089490e4d59c8583e37426b37d1d7394b6008a987c67880de0b6b3a764000080c080a056df71ff2a7fe93d2363056fe5ff32c51e5ac71733af23a82f3974cb872537e9a05b60d6a0042cc34724db84e949eec8643761fe9027e9e7b1ed3da23d8ab7c0a4"
    );
}

#[test]
fn nonce_is_required() {
    let builder = EthereumTransactionBuilder::new(1, PublicKey::secp256k1(hex::decode(ETHEREUM_KEY).unwrap()));
    let tx = Transaction::new(
        Amount::coin(Blockchain::Ethereum, Decimal::ONE),
        legacy_fee(),
        "0xb3a7f2c1d0e45f6a7b8c9d0e1f2a3b4c5d6e7f80",
        "0x7655b9b19ffab8b897f836857dae22a1e7f8d735",
    );
    assert_eq!(
        builder.build_for_sign(&tx, &ChainData::None).unwrap_err(),
        BuildError::MissingRequiredParam("nonce")
    );
}

#[test]
fn changing_gas_limit_keeps_price() {
    let fee = legacy_fee().changing_limit(50_000);
    assert_eq!(
        fee.parameters,
        Some(FeeParameters::Legacy {
            limit: 50_000,
            price: 476_190_476_190,
        })
    );
    assert_eq!(fee.amount.smallest_unit(), Some(50_000 * 476_190_476_190));
}
