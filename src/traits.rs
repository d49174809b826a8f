//! Traits for storage abstraction and extensibility

use async_trait::async_trait;

use crate::export::PrintableVoucher;
use crate::types::*;

/// Storage abstraction for the voucher book
///
/// This trait allows the voucher core to work with any storage backend
/// (PostgreSQL, SQLite, in-memory, etc.). Reads must only ever observe
/// committed vouchers and must not wait on an open [`VoucherTransaction`].
#[async_trait]
pub trait VoucherStorage: Send + Sync {
    /// Unit of work used by the creation workflow
    type Transaction: VoucherTransaction;

    /// Start a new unit of work
    async fn begin(&self) -> VoucherResult<Self::Transaction>;

    /// Get a committed voucher row by ID
    async fn get_voucher(&self, voucher_id: &str) -> VoucherResult<Option<VoucherRow>>;

    /// Items of a committed voucher, in line order
    async fn get_items(&self, voucher_id: &str) -> VoucherResult<Vec<Item>>;

    /// Committed vouchers ordered newest-first by (date, id)
    async fn list_vouchers(&self, offset: usize, limit: usize) -> VoucherResult<Vec<VoucherRow>>;

    /// Number of committed vouchers
    async fn count_vouchers(&self) -> VoucherResult<usize>;

    /// Greatest committed voucher ID strictly less than `voucher_id`
    async fn previous_id(&self, voucher_id: &str) -> VoucherResult<Option<String>>;

    /// Least committed voucher ID strictly greater than `voucher_id`
    async fn next_id(&self, voucher_id: &str) -> VoucherResult<Option<String>>;
}

/// An atomic unit of work: everything written through it becomes visible on
/// [`commit`](VoucherTransaction::commit) or not at all.
#[async_trait]
pub trait VoucherTransaction: Send + Sync {
    /// Reserve the next sequence number for `voucher_type`
    ///
    /// Implementations must hold an exclusive lock scoped to the voucher type
    /// (a counter row, or the last row of that type) for the read-increment,
    /// so two concurrent callers can never receive the same number. The
    /// reservation survives a rollback. A lost race may be reported as
    /// [`VoucherError::Concurrency`]; the caller retries.
    async fn reserve_number(&mut self, voucher_type: VoucherType) -> VoucherResult<u32>;

    /// Write a voucher row
    async fn insert_voucher(&mut self, row: &VoucherRow) -> VoucherResult<()>;

    /// Write an item row; its voucher must already exist in this
    /// transaction or in committed storage
    async fn insert_item(&mut self, item: &Item) -> VoucherResult<()>;

    /// Items of `voucher_id` as seen from inside this transaction
    async fn items(&self, voucher_id: &str) -> VoucherResult<Vec<Item>>;

    /// Set the derived total columns of a voucher written in this transaction
    async fn update_totals(
        &mut self,
        voucher_id: &str,
        total: &Money,
        amount_in_words: &str,
    ) -> VoucherResult<()>;

    /// Publish every write atomically
    async fn commit(self) -> VoucherResult<()>;

    /// Discard every write; reserved numbers stay consumed
    async fn rollback(self) -> VoucherResult<()>;
}

/// Trait for implementing custom voucher validation rules
pub trait VoucherValidator: Send + Sync {
    /// Check a request and resolve it into a draft, reporting every bad field
    fn validate_voucher(&self, voucher: &NewVoucher) -> VoucherResult<VoucherDraft>;
}

/// Default validator: required base fields, per-type variant fields, item rules
pub struct DefaultVoucherValidator;

impl VoucherValidator for DefaultVoucherValidator {
    fn validate_voucher(&self, voucher: &NewVoucher) -> VoucherResult<VoucherDraft> {
        crate::utils::validation::validate_new_voucher(voucher)
    }
}

/// Renders a resolved voucher into a PDF document
///
/// The template engine lives outside this crate; it only receives data that
/// has already been committed and read back.
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, document: &PrintableVoucher) -> VoucherResult<Vec<u8>>;
}
