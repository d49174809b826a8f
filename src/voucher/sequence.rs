//! Per-type sequential voucher identifiers
//!
//! Identifiers look like `BPV-00042`: the type prefix, a dash, and the
//! sequence number zero-padded to [`ID_WIDTH`] digits. Numbers come from
//! [`VoucherTransaction::reserve_number`], which backends implement under an
//! exclusive per-type lock. A reserved number is never handed out again, even
//! when the transaction that reserved it rolls back.

use crate::traits::VoucherTransaction;
use crate::types::*;

/// Minimum number of digits in the numeric suffix
pub const ID_WIDTH: usize = 5;

/// Reserve the next identifier for `voucher_type` inside `tx`
pub async fn next_id<T: VoucherTransaction>(
    tx: &mut T,
    voucher_type: VoucherType,
) -> VoucherResult<String> {
    let number = tx.reserve_number(voucher_type).await?;
    Ok(format_id(voucher_type, number))
}

pub fn format_id(voucher_type: VoucherType, number: u32) -> String {
    format!("{}-{:0width$}", voucher_type.prefix(), number, width = ID_WIDTH)
}

/// Split an identifier into its type and sequence number
pub fn parse_id(id: &str) -> VoucherResult<(VoucherType, u32)> {
    let invalid = || VoucherError::InvalidId(id.to_string());

    let (prefix, digits) = id.split_once('-').ok_or_else(invalid)?;
    let voucher_type = VoucherType::from_prefix(prefix).ok_or_else(invalid)?;

    if digits.len() < ID_WIDTH || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let number: u32 = digits.parse().map_err(|_| invalid())?;
    if number == 0 {
        return Err(invalid());
    }

    Ok((voucher_type, number))
}
