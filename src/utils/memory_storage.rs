//! In-memory storage implementation for testing

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use crate::traits::*;
use crate::types::*;
use crate::voucher::sequence;

#[derive(Debug, Default)]
struct Tables {
    /// Keyed by voucher ID, so key order is navigation order
    vouchers: BTreeMap<String, VoucherRow>,
    /// Items owned by each voucher, in line order
    items: HashMap<String, Vec<Item>>,
}

#[derive(Debug, Default)]
struct Faults {
    fail_item_insert_after: Option<usize>,
    reservation_conflicts: u32,
}

/// In-memory storage implementation for testing and development
///
/// Clones share the same data. Committed vouchers sit behind one `RwLock`,
/// sequence counters behind a separate `Mutex`, which plays the part of the
/// per-type counter row.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    tables: Arc<RwLock<Tables>>,
    sequences: Arc<Mutex<HashMap<VoucherType, u32>>>,
    faults: Arc<Mutex<Faults>>,
}

fn poisoned<T>(_: T) -> VoucherError {
    VoucherError::Storage("memory storage lock poisoned".to_string())
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data and sequence counters (useful for testing)
    pub fn clear(&self) -> VoucherResult<()> {
        // Sequences first: reservations lock them before reading tables.
        let mut sequences = self.sequences.lock().map_err(poisoned)?;
        let mut tables = self.write()?;
        tables.vouchers.clear();
        tables.items.clear();
        sequences.clear();
        Ok(())
    }

    /// Make the next transaction that writes items fail after `count`
    /// successful item writes
    pub fn fail_item_insert_after(&self, count: usize) -> VoucherResult<()> {
        self.faults().map(|mut f| f.fail_item_insert_after = Some(count))
    }

    /// Make the next `count` reservations report a concurrency conflict
    pub fn inject_reservation_conflicts(&self, count: u32) -> VoucherResult<()> {
        self.faults().map(|mut f| f.reservation_conflicts = count)
    }

    /// Number of item rows across all committed vouchers
    pub fn item_count(&self) -> VoucherResult<usize> {
        Ok(self.read()?.items.values().map(Vec::len).sum())
    }

    fn read(&self) -> VoucherResult<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(poisoned)
    }

    fn write(&self) -> VoucherResult<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(poisoned)
    }

    fn faults(&self) -> VoucherResult<MutexGuard<'_, Faults>> {
        self.faults.lock().map_err(poisoned)
    }

    fn highest_committed_number(&self, voucher_type: VoucherType) -> VoucherResult<u32> {
        let tables = self.read()?;
        Ok(tables
            .vouchers
            .values()
            .filter(|row| row.voucher_type == voucher_type)
            .filter_map(|row| sequence::parse_id(&row.id).ok())
            .map(|(_, number)| number)
            .max()
            .unwrap_or(0))
    }
}

#[async_trait]
impl VoucherStorage for MemoryStorage {
    type Transaction = MemoryTransaction;

    async fn begin(&self) -> VoucherResult<MemoryTransaction> {
        Ok(MemoryTransaction {
            storage: self.clone(),
            vouchers: BTreeMap::new(),
            items: Vec::new(),
        })
    }

    async fn get_voucher(&self, voucher_id: &str) -> VoucherResult<Option<VoucherRow>> {
        Ok(self.read()?.vouchers.get(voucher_id).cloned())
    }

    async fn get_items(&self, voucher_id: &str) -> VoucherResult<Vec<Item>> {
        let mut items = self
            .read()?
            .items
            .get(voucher_id)
            .cloned()
            .unwrap_or_default();
        items.sort_by_key(|item| item.line_no);
        Ok(items)
    }

    async fn list_vouchers(&self, offset: usize, limit: usize) -> VoucherResult<Vec<VoucherRow>> {
        let tables = self.read()?;
        let mut rows: Vec<&VoucherRow> = tables.vouchers.values().collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
        Ok(rows.into_iter().skip(offset).take(limit).cloned().collect())
    }

    async fn count_vouchers(&self) -> VoucherResult<usize> {
        Ok(self.read()?.vouchers.len())
    }

    async fn previous_id(&self, voucher_id: &str) -> VoucherResult<Option<String>> {
        Ok(self
            .read()?
            .vouchers
            .range::<str, _>((Bound::Unbounded, Bound::Excluded(voucher_id)))
            .next_back()
            .map(|(id, _)| id.clone()))
    }

    async fn next_id(&self, voucher_id: &str) -> VoucherResult<Option<String>> {
        Ok(self
            .read()?
            .vouchers
            .range::<str, _>((Bound::Excluded(voucher_id), Bound::Unbounded))
            .next()
            .map(|(id, _)| id.clone()))
    }
}

/// Buffered unit of work over [`MemoryStorage`]
///
/// Writes stay private to the transaction until [`commit`](VoucherTransaction::commit)
/// publishes them under a single write lock. Dropping it without committing
/// discards them.
#[derive(Debug)]
pub struct MemoryTransaction {
    storage: MemoryStorage,
    vouchers: BTreeMap<String, VoucherRow>,
    items: Vec<Item>,
}

impl MemoryTransaction {
    fn voucher_known(&self, voucher_id: &str) -> VoucherResult<bool> {
        Ok(self.vouchers.contains_key(voucher_id)
            || self.storage.read()?.vouchers.contains_key(voucher_id))
    }
}

#[async_trait]
impl VoucherTransaction for MemoryTransaction {
    async fn reserve_number(&mut self, voucher_type: VoucherType) -> VoucherResult<u32> {
        {
            let mut faults = self.storage.faults()?;
            if faults.reservation_conflicts > 0 {
                faults.reservation_conflicts -= 1;
                return Err(VoucherError::Concurrency(format!(
                    "{} sequence is locked by another transaction",
                    voucher_type
                )));
            }
        }

        let mut sequences = self.storage.sequences.lock().map_err(poisoned)?;
        let last = match sequences.get(&voucher_type) {
            Some(last) => *last,
            None => self.storage.highest_committed_number(voucher_type)?,
        };
        let next = last.checked_add(1).ok_or_else(|| {
            VoucherError::Storage(format!("{} sequence exhausted", voucher_type))
        })?;
        sequences.insert(voucher_type, next);
        Ok(next)
    }

    async fn insert_voucher(&mut self, row: &VoucherRow) -> VoucherResult<()> {
        if self.voucher_known(&row.id)? {
            return Err(VoucherError::Concurrency(format!(
                "voucher '{}' already exists",
                row.id
            )));
        }
        self.vouchers.insert(row.id.clone(), row.clone());
        Ok(())
    }

    async fn insert_item(&mut self, item: &Item) -> VoucherResult<()> {
        if !self.voucher_known(&item.voucher_id)? {
            return Err(VoucherError::Integrity(format!(
                "item references unknown voucher '{}'",
                item.voucher_id
            )));
        }

        {
            let mut faults = self.storage.faults()?;
            if faults.fail_item_insert_after == Some(self.items.len()) {
                faults.fail_item_insert_after = None;
                return Err(VoucherError::Storage(format!(
                    "write failed for item {} of '{}'",
                    item.line_no, item.voucher_id
                )));
            }
        }

        self.items.push(item.clone());
        Ok(())
    }

    async fn items(&self, voucher_id: &str) -> VoucherResult<Vec<Item>> {
        let mut items: Vec<Item> = self
            .storage
            .read()?
            .items
            .get(voucher_id)
            .cloned()
            .unwrap_or_default();
        items.extend(
            self.items
                .iter()
                .filter(|item| item.voucher_id == voucher_id)
                .cloned(),
        );
        items.sort_by_key(|item| item.line_no);
        Ok(items)
    }

    async fn update_totals(
        &mut self,
        voucher_id: &str,
        total: &Money,
        amount_in_words: &str,
    ) -> VoucherResult<()> {
        let row = self.vouchers.get_mut(voucher_id).ok_or_else(|| {
            VoucherError::Integrity(format!(
                "voucher '{}' was not written in this transaction",
                voucher_id
            ))
        })?;
        row.total = total.clone();
        row.amount_in_words = amount_in_words.to_string();
        Ok(())
    }

    async fn commit(self) -> VoucherResult<()> {
        let mut tables = self.storage.write()?;

        if let Some(id) = self
            .vouchers
            .keys()
            .find(|id| tables.vouchers.contains_key(id.as_str()))
        {
            return Err(VoucherError::Concurrency(format!(
                "voucher '{}' was committed by another transaction",
                id
            )));
        }

        for item in &self.items {
            if !self.vouchers.contains_key(&item.voucher_id)
                && !tables.vouchers.contains_key(&item.voucher_id)
            {
                return Err(VoucherError::Integrity(format!(
                    "item references unknown voucher '{}'",
                    item.voucher_id
                )));
            }
        }

        let voucher_count = self.vouchers.len();
        let item_count = self.items.len();
        tables.vouchers.extend(self.vouchers);
        for item in self.items {
            tables
                .items
                .entry(item.voucher_id.clone())
                .or_default()
                .push(item);
        }
        debug!(vouchers = voucher_count, items = item_count, "memory transaction committed");
        Ok(())
    }

    async fn rollback(self) -> VoucherResult<()> {
        debug!(
            vouchers = self.vouchers.len(),
            items = self.items.len(),
            "memory transaction rolled back"
        );
        Ok(())
    }
}
