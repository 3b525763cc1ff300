//! Decimal text codec for `u64` ledger values
//!
//! Nonces and token balances are stored on the ledger as base-10 ASCII.
//! An absent or empty value decodes to `None`; anything else must be a plain
//! unsigned decimal (no sign, no whitespace, no leading `+`).

use crate::errors::NumericError;

/// Encode a value the way it is stored on the ledger.
pub fn encode_u64(value: u64) -> Vec<u8> {
    value.to_string().into_bytes()
}

/// Parse a decimal `u64` from raw bytes.
pub fn parse_u64(raw: &[u8]) -> Result<u64, NumericError> {
    let text = std::str::from_utf8(raw).map_err(|_| NumericError::NotUtf8)?;
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(NumericError::NotDecimal {
            value: text.to_string(),
        });
    }
    text.parse::<u64>().map_err(|_| NumericError::OutOfRange {
        value: text.to_string(),
    })
}

/// Decode an optional ledger value. Absent and empty both mean "no value".
pub fn decode_u64(raw: Option<&[u8]>) -> Result<Option<u64>, NumericError> {
    match raw {
        None => Ok(None),
        Some(bytes) if bytes.is_empty() => Ok(None),
        Some(bytes) => parse_u64(bytes).map(Some),
    }
}
