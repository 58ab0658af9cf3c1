// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed transaction decoding and sender recovery.
//!
//! The decoder is pure: the same hex always yields the same [`DecodedTx`].
//! It keeps the exact decoded byte vector so the forwarder can submit the
//! transaction bit-for-bit; nothing here ever re-encodes or re-signs.

use alloy::{
    consensus::{transaction::SignerRecoverable, Transaction, TxEnvelope},
    eips::{eip2718::Decodable2718, eip2718::Eip2718Error, Typed2718},
    primitives::{Address, Bytes, TxKind, U256},
};

/// Pricing scheme of a decoded transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedTxType {
    /// Legacy (and EIP-2930) transactions, priced by `gasPrice`.
    Legacy,
    /// EIP-1559 transactions, priced by `maxFeePerGas`.
    Eip1559,
}

/// A parsed signed transaction with its recovered sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTx {
    /// Sender recovered from the signature. Authoritative: client-supplied
    /// addresses are never trusted over this.
    pub sender: Address,
    /// Call target; `None` for contract creation.
    pub to: Option<Address>,
    pub value: U256,
    pub data: Bytes,
    pub gas_limit: u64,
    /// `gasPrice` for legacy, `maxFeePerGas` for EIP-1559.
    pub effective_gas_price: u128,
    pub tx_type: DecodedTxType,
    /// The exact bytes that were decoded; forwarded unchanged.
    pub raw: Bytes,
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid transaction hex: {0}")]
    InvalidHex(String),

    #[error("invalid transaction encoding: {0}")]
    InvalidEncoding(String),

    #[error("unsupported transaction type {0}")]
    UnsupportedType(u8),

    #[error("sender recovery failed: {0}")]
    SenderRecovery(String),
}

/// Parse a hex-encoded signed transaction (0x-prefixed or bare) and
/// recover its sender.
pub fn decode_signed_tx(hex_input: &str) -> Result<DecodedTx, DecodeError> {
    let trimmed = hex_input.trim();
    let stripped = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let raw = alloy::hex::decode(stripped).map_err(|e| DecodeError::InvalidHex(e.to_string()))?;

    let envelope = TxEnvelope::decode_2718_exact(&raw).map_err(map_decode_error)?;

    let sender = envelope
        .recover_signer()
        .map_err(|e| DecodeError::SenderRecovery(e.to_string()))?;

    let (tx_type, effective_gas_price) = match &envelope {
        TxEnvelope::Legacy(tx) => (DecodedTxType::Legacy, tx.tx().gas_price),
        TxEnvelope::Eip2930(tx) => (DecodedTxType::Legacy, tx.tx().gas_price),
        TxEnvelope::Eip1559(tx) => (DecodedTxType::Eip1559, tx.tx().max_fee_per_gas),
        other => return Err(DecodeError::UnsupportedType(other.ty())),
    };

    let to = match envelope.kind() {
        TxKind::Call(address) => Some(address),
        TxKind::Create => None,
    };

    Ok(DecodedTx {
        sender,
        to,
        value: envelope.value(),
        data: envelope.input().clone(),
        gas_limit: envelope.gas_limit(),
        effective_gas_price,
        tx_type,
        raw: Bytes::from(raw),
    })
}

fn map_decode_error(error: Eip2718Error) -> DecodeError {
    match error {
        Eip2718Error::UnexpectedType(ty) => DecodeError::UnsupportedType(ty),
        other => DecodeError::InvalidEncoding(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::{
        consensus::{SignableTransaction, TxEip1559, TxLegacy},
        eips::eip2718::Encodable2718,
        network::TxSignerSync,
        primitives::address,
        signers::local::PrivateKeySigner,
    };

    const RECIPIENT: Address = address!("0x2222222222222222222222222222222222222222");

    fn signer() -> PrivateKeySigner {
        // Deterministic key so recovered senders are stable across runs.
        "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d"
            .parse()
            .unwrap()
    }

    fn signed_legacy_hex(gas_price: u128, gas_limit: u64, value: U256) -> String {
        let signer = signer();
        let mut tx = TxLegacy {
            chain_id: Some(1),
            nonce: 7,
            gas_price,
            gas_limit,
            to: TxKind::Call(RECIPIENT),
            value,
            input: Bytes::new(),
        };
        let signature = signer.sign_transaction_sync(&mut tx).unwrap();
        let envelope = TxEnvelope::from(tx.into_signed(signature));
        format!("0x{}", alloy::hex::encode(envelope.encoded_2718()))
    }

    fn signed_eip1559_hex(max_fee: u128, gas_limit: u64, value: U256) -> String {
        let signer = signer();
        let mut tx = TxEip1559 {
            chain_id: 1,
            nonce: 3,
            gas_limit,
            max_fee_per_gas: max_fee,
            max_priority_fee_per_gas: 1_000_000_000,
            to: TxKind::Call(RECIPIENT),
            value,
            access_list: Default::default(),
            input: Bytes::from(vec![0xa9, 0x05, 0x9c, 0xbb]),
        };
        let signature = signer.sign_transaction_sync(&mut tx).unwrap();
        let envelope = TxEnvelope::from(tx.into_signed(signature));
        format!("0x{}", alloy::hex::encode(envelope.encoded_2718()))
    }

    #[test]
    fn decodes_legacy_transaction() {
        let hex = signed_legacy_hex(25_000_000_000, 100_000, U256::from(42u64));
        let decoded = decode_signed_tx(&hex).unwrap();

        assert_eq!(decoded.sender, signer().address());
        assert_eq!(decoded.to, Some(RECIPIENT));
        assert_eq!(decoded.value, U256::from(42u64));
        assert_eq!(decoded.gas_limit, 100_000);
        assert_eq!(decoded.effective_gas_price, 25_000_000_000);
        assert_eq!(decoded.tx_type, DecodedTxType::Legacy);
    }

    #[test]
    fn decodes_eip1559_transaction() {
        let hex = signed_eip1559_hex(30_000_000_000, 65_000, U256::ZERO);
        let decoded = decode_signed_tx(&hex).unwrap();

        assert_eq!(decoded.sender, signer().address());
        assert_eq!(decoded.effective_gas_price, 30_000_000_000);
        assert_eq!(decoded.tx_type, DecodedTxType::Eip1559);
        assert_eq!(decoded.data.as_ref(), &[0xa9, 0x05, 0x9c, 0xbb]);
    }

    #[test]
    fn accepts_bare_hex_without_prefix() {
        let hex = signed_legacy_hex(1_000, 21_000, U256::ZERO);
        let bare = hex.strip_prefix("0x").unwrap();
        let decoded = decode_signed_tx(bare).unwrap();
        assert_eq!(decoded.gas_limit, 21_000);
    }

    #[test]
    fn decoding_is_deterministic() {
        let hex = signed_eip1559_hex(10_000_000_000, 80_000, U256::from(5u64));
        let first = decode_signed_tx(&hex).unwrap();
        let second = decode_signed_tx(&hex).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn raw_bytes_match_input_exactly() {
        let hex = signed_legacy_hex(2_000, 21_000, U256::ZERO);
        let decoded = decode_signed_tx(&hex).unwrap();
        let expected = alloy::hex::decode(hex.strip_prefix("0x").unwrap()).unwrap();
        assert_eq!(decoded.raw.as_ref(), expected.as_slice());
    }

    #[test]
    fn rejects_invalid_hex() {
        assert!(matches!(
            decode_signed_tx("0xzzzz"),
            Err(DecodeError::InvalidHex(_))
        ));
    }

    #[test]
    fn rejects_garbage_bytes() {
        let result = decode_signed_tx("0xdeadbeef");
        assert!(matches!(
            result,
            Err(DecodeError::InvalidEncoding(_)) | Err(DecodeError::UnsupportedType(_))
        ));
    }

    #[test]
    fn rejects_unknown_envelope_type() {
        // Type byte 0x05 is not a known transaction envelope.
        let result = decode_signed_tx("0x05c0");
        assert!(matches!(result, Err(DecodeError::UnsupportedType(5))));
    }

    #[test]
    fn rejects_trailing_bytes() {
        let hex = signed_legacy_hex(2_000, 21_000, U256::ZERO);
        let padded = format!("{hex}00");
        assert!(decode_signed_tx(&padded).is_err());
    }
}
