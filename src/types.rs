//! Core types and data structures for the voucher book

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;
use uuid::Uuid;

use crate::voucher::sequence;

/// Fixed-point monetary amount in rupees, always carried with two decimal places
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "BigDecimal", into = "String")]
pub struct Money(BigDecimal);

/// Largest number of digits accepted before the decimal point
const MAX_INTEGER_DIGITS: i64 = 15;

impl Money {
    /// Zero rupees
    pub fn zero() -> Self {
        Self(BigDecimal::from(0).with_scale(2))
    }

    /// Create an amount, rejecting anything finer than one paisa
    ///
    /// Scale and magnitude are checked on the normalized digits before any
    /// rescaling, so extreme exponents are refused without expanding them.
    pub fn new(amount: BigDecimal) -> VoucherResult<Self> {
        let amount = amount.normalized();
        let (_, scale) = amount.as_bigint_and_exponent();
        if scale > 2 {
            return Err(VoucherError::InvalidAmount(
                "Amount cannot have more than 2 decimal places".to_string(),
            ));
        }
        if amount.digits() as i64 - scale > MAX_INTEGER_DIGITS {
            return Err(VoucherError::InvalidAmount(format!(
                "Amount cannot have more than {} digits before the decimal point",
                MAX_INTEGER_DIGITS
            )));
        }
        Ok(Self(amount.with_scale(2)))
    }

    /// Create an amount from a count of paise
    pub fn from_paise(paise: i64) -> Self {
        Self((BigDecimal::from(paise) / BigDecimal::from(100)).with_scale(2))
    }

    /// The underlying decimal value
    pub fn amount(&self) -> &BigDecimal {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == BigDecimal::from(0)
    }

    pub fn is_negative(&self) -> bool {
        self.0 < BigDecimal::from(0)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (paise, _) = self.0.with_scale(2).as_bigint_and_exponent();
        let text = paise.to_string();
        let (sign, magnitude) = match text.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", text.as_str()),
        };
        let padded = format!("{:0>3}", magnitude);
        let (rupees, fraction) = padded.split_at(padded.len() - 2);
        f.pad(&format!("{}{}.{}", sign, rupees, fraction))
    }
}

impl FromStr for Money {
    type Err = VoucherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = BigDecimal::from_str(s.trim())
            .map_err(|e| VoucherError::InvalidAmount(format!("'{}': {}", s, e)))?;
        Self::new(amount)
    }
}

impl TryFrom<BigDecimal> for Money {
    type Error = VoucherError;

    fn try_from(amount: BigDecimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Money> for BigDecimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl From<Money> for String {
    fn from(money: Money) -> Self {
        money.to_string()
    }
}

impl Add for &Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Money {
        Money((&self.0 + &rhs.0).with_scale(2))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        &self + &rhs
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| &acc + m)
    }
}

impl Sum<Money> for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| &acc + &m)
    }
}

/// The four kinds of voucher the book records
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VoucherType {
    /// Cash paid out (CPV)
    CashPayment,
    /// Cash received (CRV)
    CashReceipt,
    /// Payment by cheque from a bank account (BPV)
    BankPayment,
    /// Receipt of a bank instrument (BRV)
    BankReceipt,
}

impl VoucherType {
    pub const ALL: [VoucherType; 4] = [
        VoucherType::BankPayment,
        VoucherType::BankReceipt,
        VoucherType::CashPayment,
        VoucherType::CashReceipt,
    ];

    /// Identifier prefix for this voucher type
    pub fn prefix(&self) -> &'static str {
        match self {
            VoucherType::CashPayment => "CPV",
            VoucherType::CashReceipt => "CRV",
            VoucherType::BankPayment => "BPV",
            VoucherType::BankReceipt => "BRV",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.prefix() == prefix)
    }

    /// Human-readable name used on printed vouchers
    pub fn label(&self) -> &'static str {
        match self {
            VoucherType::CashPayment => "Cash Payment Voucher",
            VoucherType::CashReceipt => "Cash Receipt Voucher",
            VoucherType::BankPayment => "Bank Payment Voucher",
            VoucherType::BankReceipt => "Bank Receipt Voucher",
        }
    }

    pub fn is_bank(&self) -> bool {
        matches!(self, VoucherType::BankPayment | VoucherType::BankReceipt)
    }
}

impl fmt::Display for VoucherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for VoucherType {
    type Err = VoucherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_prefix(s.trim()).ok_or_else(|| {
            VoucherError::Validation(ValidationErrors::single(
                "voucher_type",
                format!("unknown voucher type '{}'", s),
            ))
        })
    }
}

/// Extra fields carried by a bank payment voucher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankPaymentDetails {
    pub bank: String,
    pub cheque_number: String,
}

/// Extra fields carried by a bank receipt voucher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankReceiptDetails {
    pub bank: String,
    /// Cheque, demand draft, pay order, ...
    pub instrument_type: String,
    pub instrument_number: String,
}

/// Type-specific payload of a voucher; the variant is the voucher's type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoucherVariant {
    CashPayment,
    CashReceipt,
    BankPayment(BankPaymentDetails),
    BankReceipt(BankReceiptDetails),
}

impl VoucherVariant {
    pub fn voucher_type(&self) -> VoucherType {
        match self {
            VoucherVariant::CashPayment => VoucherType::CashPayment,
            VoucherVariant::CashReceipt => VoucherType::CashReceipt,
            VoucherVariant::BankPayment(_) => VoucherType::BankPayment,
            VoucherVariant::BankReceipt(_) => VoucherType::BankReceipt,
        }
    }
}

/// A posted voucher
///
/// Instances only come out of [`VoucherRow::resolve`], so the identifier,
/// total and amount in words are always the ones assigned on creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Voucher {
    id: String,
    /// Date printed on the voucher
    pub date: NaiveDate,
    /// Party paid or received from
    pub payee: String,
    pub memo: Option<String>,
    pub prepared_by: String,
    total: Money,
    amount_in_words: String,
    variant: VoucherVariant,
    /// When the voucher was recorded
    pub created_at: NaiveDateTime,
}

impl Voucher {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn voucher_type(&self) -> VoucherType {
        self.variant.voucher_type()
    }

    /// Sum of the voucher's item amounts as of creation
    pub fn total(&self) -> &Money {
        &self.total
    }

    pub fn amount_in_words(&self) -> &str {
        &self.amount_in_words
    }

    pub fn variant(&self) -> &VoucherVariant {
        &self.variant
    }

    pub fn bank_payment(&self) -> Option<&BankPaymentDetails> {
        match &self.variant {
            VoucherVariant::BankPayment(details) => Some(details),
            _ => None,
        }
    }

    pub fn bank_receipt(&self) -> Option<&BankReceiptDetails> {
        match &self.variant {
            VoucherVariant::BankReceipt(details) => Some(details),
            _ => None,
        }
    }

    /// Bank name for either bank voucher type
    pub fn bank(&self) -> Option<&str> {
        match &self.variant {
            VoucherVariant::BankPayment(details) => Some(&details.bank),
            VoucherVariant::BankReceipt(details) => Some(&details.bank),
            VoucherVariant::CashPayment | VoucherVariant::CashReceipt => None,
        }
    }

    /// Flatten into the persisted single-table shape
    pub fn to_row(&self) -> VoucherRow {
        let mut row = VoucherRow {
            id: self.id.clone(),
            voucher_type: self.voucher_type(),
            date: self.date,
            payee: self.payee.clone(),
            memo: self.memo.clone(),
            prepared_by: self.prepared_by.clone(),
            total: self.total.clone(),
            amount_in_words: self.amount_in_words.clone(),
            bank: None,
            cheque_number: None,
            instrument_type: None,
            instrument_number: None,
            created_at: self.created_at,
        };
        row.set_variant(&self.variant);
        row
    }
}

/// Persisted shape of a voucher: shared columns plus nullable variant columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoucherRow {
    pub id: String,
    pub voucher_type: VoucherType,
    pub date: NaiveDate,
    pub payee: String,
    pub memo: Option<String>,
    pub prepared_by: String,
    pub total: Money,
    pub amount_in_words: String,
    pub bank: Option<String>,
    pub cheque_number: Option<String>,
    pub instrument_type: Option<String>,
    pub instrument_number: Option<String>,
    pub created_at: NaiveDateTime,
}

impl VoucherRow {
    pub(crate) fn set_variant(&mut self, variant: &VoucherVariant) {
        match variant {
            VoucherVariant::BankPayment(details) => {
                self.bank = Some(details.bank.clone());
                self.cheque_number = Some(details.cheque_number.clone());
            }
            VoucherVariant::BankReceipt(details) => {
                self.bank = Some(details.bank.clone());
                self.instrument_type = Some(details.instrument_type.clone());
                self.instrument_number = Some(details.instrument_number.clone());
            }
            VoucherVariant::CashPayment | VoucherVariant::CashReceipt => {}
        }
    }

    /// Dereference the row into its typed voucher using the type discriminant
    pub fn resolve(self) -> VoucherResult<Voucher> {
        let (id_type, _) = sequence::parse_id(&self.id)
            .map_err(|e| VoucherError::Integrity(e.to_string()))?;
        if id_type != self.voucher_type {
            return Err(VoucherError::Integrity(format!(
                "voucher '{}' is stored as {}",
                self.id, self.voucher_type
            )));
        }

        let id = self.id;
        let column = |value: Option<String>, name: &str| {
            value.ok_or_else(|| {
                VoucherError::Integrity(format!("voucher '{}' is missing {}", id, name))
            })
        };

        let variant = match self.voucher_type {
            VoucherType::CashPayment => VoucherVariant::CashPayment,
            VoucherType::CashReceipt => VoucherVariant::CashReceipt,
            VoucherType::BankPayment => VoucherVariant::BankPayment(BankPaymentDetails {
                bank: column(self.bank, "bank")?,
                cheque_number: column(self.cheque_number, "cheque_number")?,
            }),
            VoucherType::BankReceipt => VoucherVariant::BankReceipt(BankReceiptDetails {
                bank: column(self.bank, "bank")?,
                instrument_type: column(self.instrument_type, "instrument_type")?,
                instrument_number: column(self.instrument_number, "instrument_number")?,
            }),
        };

        Ok(Voucher {
            id,
            date: self.date,
            payee: self.payee,
            memo: self.memo,
            prepared_by: self.prepared_by,
            total: self.total,
            amount_in_words: self.amount_in_words,
            variant,
            created_at: self.created_at,
        })
    }
}

/// One ledger line of a voucher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    /// Owning voucher
    pub voucher_id: String,
    /// 1-based position on the voucher
    pub line_no: u32,
    pub account: String,
    pub description: String,
    pub amount: Money,
}

/// Item as submitted for a new voucher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub account: String,
    pub description: String,
    pub amount: BigDecimal,
}

impl NewItem {
    pub fn new(
        account: impl Into<String>,
        description: impl Into<String>,
        amount: BigDecimal,
    ) -> Self {
        Self {
            account: account.into(),
            description: description.into(),
            amount,
        }
    }
}

/// Variant fields as submitted; which ones matter depends on the voucher type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantFields {
    pub bank: Option<String>,
    pub cheque_number: Option<String>,
    pub instrument_type: Option<String>,
    pub instrument_number: Option<String>,
}

/// Request to create a voucher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVoucher {
    pub voucher_type: VoucherType,
    pub date: NaiveDate,
    pub payee: String,
    pub memo: Option<String>,
    pub prepared_by: String,
    pub variant_fields: VariantFields,
    pub items: Vec<NewItem>,
}

impl NewVoucher {
    pub fn new(
        voucher_type: VoucherType,
        date: NaiveDate,
        payee: impl Into<String>,
        prepared_by: impl Into<String>,
    ) -> Self {
        Self {
            voucher_type,
            date,
            payee: payee.into(),
            memo: None,
            prepared_by: prepared_by.into(),
            variant_fields: VariantFields::default(),
            items: Vec::new(),
        }
    }

    pub fn memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    pub fn bank(mut self, bank: impl Into<String>) -> Self {
        self.variant_fields.bank = Some(bank.into());
        self
    }

    pub fn cheque_number(mut self, cheque_number: impl Into<String>) -> Self {
        self.variant_fields.cheque_number = Some(cheque_number.into());
        self
    }

    pub fn instrument(
        mut self,
        instrument_type: impl Into<String>,
        instrument_number: impl Into<String>,
    ) -> Self {
        self.variant_fields.instrument_type = Some(instrument_type.into());
        self.variant_fields.instrument_number = Some(instrument_number.into());
        self
    }

    /// Append an item line
    pub fn item(
        mut self,
        account: impl Into<String>,
        description: impl Into<String>,
        amount: BigDecimal,
    ) -> Self {
        self.items.push(NewItem::new(account, description, amount));
        self
    }
}

/// Validated item ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct DraftItem {
    pub account: String,
    pub description: String,
    pub amount: Money,
}

/// A voucher request that passed validation, with its variant resolved
#[derive(Debug, Clone, PartialEq)]
pub struct VoucherDraft {
    pub date: NaiveDate,
    pub payee: String,
    pub memo: Option<String>,
    pub prepared_by: String,
    pub variant: VoucherVariant,
    pub items: Vec<DraftItem>,
}

impl VoucherDraft {
    pub fn voucher_type(&self) -> VoucherType {
        self.variant.voucher_type()
    }

    /// Row written while persisting, before the total is known
    pub(crate) fn to_row(&self, id: String, created_at: NaiveDateTime) -> VoucherRow {
        let mut row = VoucherRow {
            id,
            voucher_type: self.voucher_type(),
            date: self.date,
            payee: self.payee.clone(),
            memo: self.memo.clone(),
            prepared_by: self.prepared_by.clone(),
            total: Money::zero(),
            amount_in_words: String::new(),
            bank: None,
            cheque_number: None,
            instrument_type: None,
            instrument_number: None,
            created_at,
        };
        row.set_variant(&self.variant);
        row
    }
}

/// One rejected input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// All field errors found while validating one request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// `Ok(())` when nothing was collected
    pub fn into_result(self) -> VoucherResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(VoucherError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

/// One page of a newest-first listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number actually returned
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Neighbouring voucher identifiers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Navigation {
    pub previous_id: Option<String>,
    pub next_id: Option<String>,
}

/// Errors that can occur in the voucher book
#[derive(Debug, thiserror::Error)]
pub enum VoucherError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("Voucher not found: {0}")]
    NotFound(String),
    #[error("Concurrent update conflict: {0}")]
    Concurrency(String),
    #[error("Integrity violation: {0}")]
    Integrity(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Voucher could not be created after {attempts} attempts: {message}")]
    Transient { attempts: u32, message: String },
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid voucher id: {0}")]
    InvalidId(String),
    #[error("Export failed: {0}")]
    Export(String),
}

/// Result type for voucher operations
pub type VoucherResult<T> = Result<T, VoucherError>;
