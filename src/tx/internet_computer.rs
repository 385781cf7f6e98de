//! Internet Computer transaction builder
//!
//! A ledger transfer is an update `call` to the ledger canister. The
//! wallet signs two requests up front: the call itself and a `read_state`
//! poll for its status, so that no second trip to the signer is needed.
//! Each is signed over its representation-independent request id.

use super::{
    amount_units, check_signature_count, fee_units, foreign_payload, to_u64, ChainData, TransactionBuilder,
    UnsignedTransaction,
};
use crate::address::internet_computer::{
    account_identifier, decode_account_identifier, der_encode_public_key, principal_from_public_key,
    principal_from_text,
};
use crate::codec::cbor::{CborValue, SELF_DESCRIBE_TAG};
use crate::codec::protobuf::ProtoWriter;
use crate::error::{BuildError, BuildResult};
use crate::signing::{ecdsa, SignPayload, SignedResult};
use crate::types::{InternetComputerParams, PublicKey, Transaction, TransactionParams};
use crate::utils::chain_config::InternetComputerConfig;
use crate::utils::crypto::sha256;

const REQUEST_DOMAIN_SEPARATOR: &[u8] = b"\x0Aic-request";
const REQUEST_STATUS_PATH: &[u8] = b"request_status";
const ACCOUNT_ID_HEX_LEN: usize = 64;

/// Unsigned call and read_state contents, kept for envelope assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedRequests {
    pub canister_id: Vec<u8>,
    pub call: CborValue,
    pub read_state: CborValue,
    pub request_id: [u8; 32],
    /// DER-encoded sender key.
    pub sender_pubkey: Vec<u8>,
}

/// Signed CBOR envelopes, ready for `/api/v2/canister/<id>/call` and `/read_state`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequests {
    pub canister_id: Vec<u8>,
    pub request_id: [u8; 32],
    pub call_envelope: Vec<u8>,
    pub read_state_envelope: Vec<u8>,
    /// State-tree paths the read_state request asks for.
    pub paths: Vec<Vec<Vec<u8>>>,
}

/// Representation-independent hash of a request value.
pub fn hash_of(value: &CborValue) -> [u8; 32] {
    match value {
        CborValue::Unsigned(n) => sha256(&leb128(*n)),
        CborValue::Bytes(bytes) => sha256(bytes),
        CborValue::Text(text) => sha256(text.as_bytes()),
        CborValue::Array(items) => {
            let concatenated: Vec<u8> = items.iter().flat_map(hash_of).collect();
            sha256(&concatenated)
        }
        CborValue::Map(entries) => {
            let mut pairs: Vec<Vec<u8>> = entries
                .iter()
                .map(|(key, value)| [sha256(key.as_bytes()), hash_of(value)].concat())
                .collect();
            pairs.sort();
            sha256(&pairs.concat())
        }
        CborValue::Tag(_, inner) => hash_of(inner),
    }
}

fn leb128(mut value: u64) -> Vec<u8> {
    let mut out = Vec::new();
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return out;
        }
        out.push(byte | 0x80);
    }
}

/// Digest the sender signs for a request id.
pub fn request_digest(request_id: &[u8; 32]) -> [u8; 32] {
    let mut preimage = REQUEST_DOMAIN_SEPARATOR.to_vec();
    preimage.extend_from_slice(request_id);
    sha256(&preimage)
}

fn status_paths(request_id: &[u8; 32]) -> Vec<Vec<Vec<u8>>> {
    vec![vec![REQUEST_STATUS_PATH.to_vec(), request_id.to_vec()]]
}

fn tokens(e8s: u64) -> Vec<u8> {
    ProtoWriter::new().uint64(1, e8s).finish()
}

#[derive(Debug, Clone)]
pub struct InternetComputerTransactionBuilder {
    config: InternetComputerConfig,
    public_key: PublicKey,
}

impl InternetComputerTransactionBuilder {
    pub fn new(config: InternetComputerConfig, public_key: PublicKey) -> Self {
        Self { config, public_key }
    }

    /// Account identifier hex or principal text.
    fn destination_account(address: &str) -> BuildResult<[u8; 32]> {
        if address.len() == ACCOUNT_ID_HEX_LEN {
            return Ok(decode_account_identifier(address)?);
        }
        Ok(account_identifier(&principal_from_text(address)?))
    }

    /// Serialized ledger `SendRequest`.
    fn send_request(&self, transaction: &Transaction, params: &InternetComputerParams) -> BuildResult<Vec<u8>> {
        let amount = to_u64(amount_units(&transaction.amount)?, "amount")?;
        let fee = to_u64(fee_units(&transaction.fee)?, "fee")?;
        let to = Self::destination_account(&transaction.destination_address)?;

        let memo = ProtoWriter::new().uint64(1, params.memo).finish();
        let payment = ProtoWriter::new().message(1, &tokens(amount)).finish();
        let account = ProtoWriter::new().bytes(1, &to).finish();
        let created_at = ProtoWriter::new().uint64(1, params.created_at_nanos).finish();

        Ok(ProtoWriter::new()
            .message(1, &memo)
            .message(2, &payment)
            .message(3, &tokens(fee))
            .message(5, &account)
            .message(7, &created_at)
            .finish())
    }

    fn canister_id(&self) -> BuildResult<Vec<u8>> {
        hex::decode(&self.config.ledger_canister_id)
            .map_err(|e| BuildError::SerializationFailed(format!("ledger canister id: {e}")))
    }

    fn build_requests(&self, transaction: &Transaction) -> BuildResult<UnsignedRequests> {
        let Some(TransactionParams::InternetComputer(params)) = &transaction.params else {
            return Err(BuildError::MissingRequiredParam("memo and creation time"));
        };
        let sender = principal_from_public_key(&self.public_key.bytes)?;
        let canister_id = self.canister_id()?;
        let ingress_expiry = params.created_at_nanos.saturating_add(self.config.ingress_expiry_nanos);

        let mut call = vec![
            ("request_type", CborValue::text("call")),
            ("canister_id", CborValue::bytes(canister_id.clone())),
            ("method_name", CborValue::text(self.config.transfer_method.clone())),
            ("arg", CborValue::bytes(self.send_request(transaction, params)?)),
            ("sender", CborValue::bytes(sender.clone())),
            ("ingress_expiry", CborValue::Unsigned(ingress_expiry)),
        ];
        if let Some(nonce) = &params.nonce {
            call.push(("nonce", CborValue::bytes(nonce.clone())));
        }
        let call = CborValue::map(call);
        let request_id = hash_of(&call);

        let paths = CborValue::Array(
            status_paths(&request_id)
                .into_iter()
                .map(|path| CborValue::Array(path.into_iter().map(CborValue::Bytes).collect()))
                .collect(),
        );
        let read_state = CborValue::map([
            ("request_type", CborValue::text("read_state")),
            ("paths", paths),
            ("sender", CborValue::bytes(sender)),
            ("ingress_expiry", CborValue::Unsigned(ingress_expiry)),
        ]);

        Ok(UnsignedRequests {
            canister_id,
            call,
            read_state,
            request_id,
            sender_pubkey: der_encode_public_key(&self.public_key.bytes)?,
        })
    }

    fn envelope(content: &CborValue, sender_pubkey: &[u8], signature: &[u8]) -> Vec<u8> {
        CborValue::Tag(
            SELF_DESCRIBE_TAG,
            Box::new(CborValue::map([
                ("content", content.clone()),
                ("sender_pubkey", CborValue::bytes(sender_pubkey.to_vec())),
                ("sender_sig", CborValue::bytes(signature.to_vec())),
            ])),
        )
        .encode()
    }
}

impl TransactionBuilder for InternetComputerTransactionBuilder {
    fn build_for_sign(&self, transaction: &Transaction, _chain_data: &ChainData) -> BuildResult<SignPayload> {
        let requests = self.build_requests(transaction)?;
        let hashes = vec![
            request_digest(&requests.request_id).to_vec(),
            request_digest(&hash_of(&requests.read_state)).to_vec(),
        ];
        Ok(SignPayload::Hashes {
            hashes,
            unsigned: UnsignedTransaction::InternetComputer(requests),
        })
    }

    fn build_for_send(&self, payload: &SignPayload, signatures: &[Vec<u8>]) -> BuildResult<SignedResult> {
        let UnsignedTransaction::InternetComputer(requests) = payload.unsigned() else {
            return Err(foreign_payload());
        };
        check_signature_count(payload, signatures)?;
        for (index, (signature, digest)) in signatures.iter().zip(payload.hashes()).enumerate() {
            if !ecdsa::verify(signature, &digest, &self.public_key.bytes) {
                return Err(BuildError::SignatureOrderMismatch { index });
            }
        }

        Ok(SignedResult::InternetComputer(SignedRequests {
            canister_id: requests.canister_id.clone(),
            request_id: requests.request_id,
            call_envelope: Self::envelope(&requests.call, &requests.sender_pubkey, &signatures[0]),
            read_state_envelope: Self::envelope(&requests.read_state, &requests.sender_pubkey, &signatures[1]),
            paths: status_paths(&requests.request_id),
        }))
    }
}
