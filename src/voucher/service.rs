//! Voucher service that orchestrates creation, lookup, listing and export

use chrono::Utc;
use std::fmt;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::export::PrintableVoucher;
use crate::settings::VoucherConfig;
use crate::traits::*;
use crate::types::*;
use crate::voucher::navigation::NavigationIndex;
use crate::voucher::sequence;
use crate::voucher::total::compute_total;
use crate::words::to_words;

/// Steps of the creation workflow, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationStage {
    Validating,
    Reserving,
    Persisting,
    Finalizing,
    Done,
    Failed,
}

impl fmt::Display for CreationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CreationStage::Validating => "validating",
            CreationStage::Reserving => "reserving",
            CreationStage::Persisting => "persisting",
            CreationStage::Finalizing => "finalizing",
            CreationStage::Done => "done",
            CreationStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Main voucher book service
pub struct VoucherService<S: VoucherStorage> {
    storage: S,
    validator: Box<dyn VoucherValidator>,
    config: VoucherConfig,
}

impl<S: VoucherStorage> VoucherService<S> {
    /// Create a new service with the given storage backend
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, VoucherConfig::default())
    }

    /// Create a new service with explicit configuration
    pub fn with_config(storage: S, config: VoucherConfig) -> Self {
        Self {
            storage,
            validator: Box::new(DefaultVoucherValidator),
            config,
        }
    }

    /// Replace the validator
    pub fn with_validator(mut self, validator: Box<dyn VoucherValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn config(&self) -> &VoucherConfig {
        &self.config
    }

    /// Create and post a voucher
    ///
    /// The identifier, total and amount in words are assigned here. Either
    /// the voucher and all of its items are committed together, or nothing
    /// is. Reservation conflicts are retried up to
    /// `max_creation_attempts` times before [`VoucherError::Transient`] is
    /// returned.
    #[instrument(skip(self, new_voucher), fields(voucher_type = %new_voucher.voucher_type))]
    pub async fn create_voucher(&self, new_voucher: NewVoucher) -> VoucherResult<Voucher> {
        debug!(stage = %CreationStage::Validating, "validating voucher");
        let draft = match self.validator.validate_voucher(&new_voucher) {
            Ok(draft) => draft,
            Err(e) => {
                debug!(stage = %CreationStage::Failed, error = %e, "voucher rejected");
                return Err(e);
            }
        };

        let max_attempts = self.config.max_creation_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_create(&draft).await {
                Ok(voucher) => {
                    info!(
                        voucher_id = %voucher.id(),
                        total = %voucher.total(),
                        items = draft.items.len(),
                        "voucher created"
                    );
                    return Ok(voucher);
                }
                Err(VoucherError::Concurrency(message)) if attempt < max_attempts => {
                    warn!(attempt, %message, "voucher creation conflicted, retrying");
                }
                Err(VoucherError::Concurrency(message)) => {
                    warn!(attempt, %message, "voucher creation conflicted, giving up");
                    return Err(VoucherError::Transient {
                        attempts: attempt,
                        message,
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_create(&self, draft: &VoucherDraft) -> VoucherResult<Voucher> {
        let mut tx = self.storage.begin().await?;

        let voucher = match Self::write_voucher(&mut tx, draft).await {
            Ok(voucher) => voucher,
            Err(e) => {
                warn!(stage = %CreationStage::Failed, error = %e, "rolling back voucher creation");
                if let Err(rollback_error) = tx.rollback().await {
                    warn!(error = %rollback_error, "rollback failed");
                }
                return Err(e);
            }
        };

        tx.commit().await?;
        debug!(stage = %CreationStage::Done, voucher_id = %voucher.id(), "voucher committed");
        Ok(voucher)
    }

    async fn write_voucher(tx: &mut S::Transaction, draft: &VoucherDraft) -> VoucherResult<Voucher> {
        debug!(stage = %CreationStage::Reserving, "reserving voucher id");
        let voucher_id = sequence::next_id(tx, draft.voucher_type()).await?;

        debug!(stage = %CreationStage::Persisting, voucher_id = %voucher_id, "writing voucher");
        let mut row = draft.to_row(voucher_id.clone(), Utc::now().naive_utc());
        tx.insert_voucher(&row).await?;

        for (index, draft_item) in draft.items.iter().enumerate() {
            let item = Item {
                id: Uuid::new_v4(),
                voucher_id: voucher_id.clone(),
                line_no: index as u32 + 1,
                account: draft_item.account.clone(),
                description: draft_item.description.clone(),
                amount: draft_item.amount.clone(),
            };
            tx.insert_item(&item).await?;
        }

        debug!(stage = %CreationStage::Finalizing, voucher_id = %voucher_id, "computing total");
        let items = tx.items(&voucher_id).await?;
        let total = compute_total(&items);
        let amount_in_words = to_words(&total);
        tx.update_totals(&voucher_id, &total, &amount_in_words)
            .await?;

        row.total = total;
        row.amount_in_words = amount_in_words;
        row.resolve()
    }

    /// Get a voucher by ID
    pub async fn get_voucher(&self, voucher_id: &str) -> VoucherResult<Voucher> {
        self.storage
            .get_voucher(voucher_id)
            .await?
            .ok_or_else(|| VoucherError::NotFound(voucher_id.to_string()))?
            .resolve()
    }

    /// Get a voucher together with its items
    pub async fn get_voucher_with_items(
        &self,
        voucher_id: &str,
    ) -> VoucherResult<(Voucher, Vec<Item>)> {
        let voucher = self.get_voucher(voucher_id).await?;
        let items = self.storage.get_items(voucher_id).await?;
        Ok((voucher, items))
    }

    /// One page of vouchers, newest first by (date, id)
    ///
    /// Pages are 1-based; a page number outside the available range returns
    /// the nearest existing page.
    pub async fn list_vouchers(&self, page: usize, page_size: usize) -> VoucherResult<Page<Voucher>> {
        if page_size == 0 {
            return Err(VoucherError::Validation(ValidationErrors::single(
                "page_size",
                "Page size must be at least 1",
            )));
        }
        let page_size = page_size.min(self.config.max_page_size.max(1));

        let total_items = self.storage.count_vouchers().await?;
        let total_pages = total_items.div_ceil(page_size).max(1);
        let page = page.clamp(1, total_pages);

        let items = self
            .storage
            .list_vouchers((page - 1) * page_size, page_size)
            .await?
            .into_iter()
            .map(VoucherRow::resolve)
            .collect::<VoucherResult<Vec<_>>>()?;

        Ok(Page {
            items,
            page,
            page_size,
            total_items,
            total_pages,
        })
    }

    /// One page of vouchers using the configured default page size
    pub async fn recent_vouchers(&self, page: usize) -> VoucherResult<Page<Voucher>> {
        self.list_vouchers(page, self.config.default_page_size)
            .await
    }

    /// Navigation index over this service's storage
    pub fn navigation(&self) -> NavigationIndex<'_, S> {
        NavigationIndex::new(&self.storage)
    }

    /// Previous and next voucher identifiers around `voucher_id`
    pub async fn navigate(&self, voucher_id: &str) -> VoucherResult<Navigation> {
        self.navigation().navigate(voucher_id).await
    }

    /// Resolve a voucher and its items for printing
    pub async fn export_for_print(&self, voucher_id: &str) -> VoucherResult<PrintableVoucher> {
        let (voucher, items) = self.get_voucher_with_items(voucher_id).await?;
        Ok(PrintableVoucher::new(voucher, items))
    }

    /// Render a committed voucher to PDF, returning the file name and bytes
    #[instrument(skip(self, renderer))]
    pub async fn export_pdf(
        &self,
        voucher_id: &str,
        renderer: &dyn PdfRenderer,
    ) -> VoucherResult<(String, Vec<u8>)> {
        let document = self.export_for_print(voucher_id).await?;
        let bytes = renderer.render(&document).await?;
        debug!(filename = %document.filename, bytes = bytes.len(), "voucher rendered");
        Ok((document.filename, bytes))
    }
}
