//! Previous/next navigation between vouchers
//!
//! Neighbours are found by raw identifier order across every voucher type.
//! Since identifiers compare as strings, all bank payments (`BPV-…`) come
//! before bank receipts (`BRV-…`), then cash payments and cash receipts; the
//! numeric order only applies within one type. Navigation therefore walks the
//! book type by type, not by date.

use crate::traits::VoucherStorage;
use crate::types::*;

/// Identifier-ordered view over the vouchers in a storage backend
pub struct NavigationIndex<'a, S: VoucherStorage> {
    storage: &'a S,
}

impl<'a, S: VoucherStorage> NavigationIndex<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    /// Least voucher identifier strictly greater than `voucher_id`
    pub async fn next_id(&self, voucher_id: &str) -> VoucherResult<Option<String>> {
        self.storage.next_id(voucher_id).await
    }

    /// Greatest voucher identifier strictly less than `voucher_id`
    pub async fn previous_id(&self, voucher_id: &str) -> VoucherResult<Option<String>> {
        self.storage.previous_id(voucher_id).await
    }

    /// Both neighbours of an existing voucher
    pub async fn navigate(&self, voucher_id: &str) -> VoucherResult<Navigation> {
        if self.storage.get_voucher(voucher_id).await?.is_none() {
            return Err(VoucherError::NotFound(voucher_id.to_string()));
        }

        Ok(Navigation {
            previous_id: self.previous_id(voucher_id).await?,
            next_id: self.next_id(voucher_id).await?,
        })
    }
}
