//! Validation utilities

use bigdecimal::BigDecimal;

use crate::types::*;

/// Longest payee / preparer name
pub const MAX_NAME_LEN: usize = 255;
/// Longest memo
pub const MAX_MEMO_LEN: usize = 500;
/// Longest item account name
pub const MAX_ACCOUNT_LEN: usize = 100;
/// Longest item description
pub const MAX_DESCRIPTION_LEN: usize = 255;

/// Largest item amount a `decimal(10,2)` column holds
pub fn max_item_amount() -> Money {
    Money::from_paise(9_999_999_999)
}

/// Largest voucher total a `decimal(12,2)` column holds
pub fn max_total() -> Money {
    Money::from_paise(999_999_999_999)
}

/// Check a required free-text field, recording an error under `field`
pub fn validate_required_text(
    errors: &mut ValidationErrors,
    field: &str,
    label: &str,
    value: &str,
    max_len: usize,
) {
    if value.trim().is_empty() {
        errors.push(field, format!("{} is required", label));
    } else if value.chars().count() > max_len {
        errors.push(
            field,
            format!("{} cannot exceed {} characters", label, max_len),
        );
    }
}

fn required_variant_field(
    errors: &mut ValidationErrors,
    field: &str,
    label: &str,
    value: &Option<String>,
) -> Option<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => {
            if v.chars().count() > MAX_NAME_LEN {
                errors.push(
                    field,
                    format!("{} cannot exceed {} characters", label, MAX_NAME_LEN),
                );
                None
            } else {
                Some(v.to_string())
            }
        }
        _ => {
            errors.push(field, format!("{} is required for this voucher type", label));
            None
        }
    }
}

/// Resolve the submitted variant fields for `voucher_type`
///
/// Fields that do not belong to the type are ignored.
pub fn validate_variant_fields(
    errors: &mut ValidationErrors,
    voucher_type: VoucherType,
    fields: &VariantFields,
) -> Option<VoucherVariant> {
    match voucher_type {
        VoucherType::CashPayment => Some(VoucherVariant::CashPayment),
        VoucherType::CashReceipt => Some(VoucherVariant::CashReceipt),
        VoucherType::BankPayment => {
            let bank = required_variant_field(errors, "bank", "Bank", &fields.bank);
            let cheque_number = required_variant_field(
                errors,
                "cheque_number",
                "Cheque number",
                &fields.cheque_number,
            );
            Some(VoucherVariant::BankPayment(BankPaymentDetails {
                bank: bank?,
                cheque_number: cheque_number?,
            }))
        }
        VoucherType::BankReceipt => {
            let bank = required_variant_field(errors, "bank", "Bank", &fields.bank);
            let instrument_type = required_variant_field(
                errors,
                "instrument_type",
                "Instrument type",
                &fields.instrument_type,
            );
            let instrument_number = required_variant_field(
                errors,
                "instrument_number",
                "Instrument number",
                &fields.instrument_number,
            );
            Some(VoucherVariant::BankReceipt(BankReceiptDetails {
                bank: bank?,
                instrument_type: instrument_type?,
                instrument_number: instrument_number?,
            }))
        }
    }
}

/// Validate an item amount: not negative, whole paise, fits the column
pub fn validate_item_amount(amount: &BigDecimal) -> Result<Money, String> {
    let money = Money::new(amount.clone()).map_err(|e| match e {
        VoucherError::InvalidAmount(message) => message,
        other => other.to_string(),
    })?;
    if money.is_negative() {
        return Err("Amount cannot be negative".to_string());
    }
    if money > max_item_amount() {
        return Err(format!("Amount cannot exceed {}", max_item_amount()));
    }
    Ok(money)
}

/// Validate a single item line, recording errors under `items[index].*`
pub fn validate_item(
    errors: &mut ValidationErrors,
    index: usize,
    item: &NewItem,
) -> Option<DraftItem> {
    let prefix = format!("items[{}]", index);
    let before = errors.len();

    validate_required_text(
        errors,
        &format!("{}.account", prefix),
        "Account",
        &item.account,
        MAX_ACCOUNT_LEN,
    );
    validate_required_text(
        errors,
        &format!("{}.description", prefix),
        "Description",
        &item.description,
        MAX_DESCRIPTION_LEN,
    );
    let amount = match validate_item_amount(&item.amount) {
        Ok(amount) => Some(amount),
        Err(message) => {
            errors.push(format!("{}.amount", prefix), message);
            None
        }
    };

    if errors.len() != before {
        return None;
    }
    Some(DraftItem {
        account: item.account.trim().to_string(),
        description: item.description.trim().to_string(),
        amount: amount?,
    })
}

/// Validate a whole voucher request; every problem is reported at once
pub fn validate_new_voucher(voucher: &NewVoucher) -> VoucherResult<VoucherDraft> {
    let mut errors = ValidationErrors::new();

    validate_required_text(&mut errors, "payee", "Payee", &voucher.payee, MAX_NAME_LEN);
    validate_required_text(
        &mut errors,
        "prepared_by",
        "Prepared by",
        &voucher.prepared_by,
        MAX_NAME_LEN,
    );
    let memo = voucher
        .memo
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty());
    if let Some(memo) = memo {
        if memo.chars().count() > MAX_MEMO_LEN {
            errors.push(
                "memo",
                format!("Memo cannot exceed {} characters", MAX_MEMO_LEN),
            );
        }
    }

    let variant = validate_variant_fields(&mut errors, voucher.voucher_type, &voucher.variant_fields);

    let items: Vec<DraftItem> = voucher
        .items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| validate_item(&mut errors, index, item))
        .collect();

    if items.len() == voucher.items.len() {
        let total: Money = items.iter().map(|item| &item.amount).sum();
        if total > max_total() {
            errors.push("items", format!("Voucher total cannot exceed {}", max_total()));
        }
    }

    errors.into_result()?;

    let variant = variant.ok_or_else(|| {
        VoucherError::Validation(ValidationErrors::single(
            "voucher_type",
            "variant fields could not be resolved",
        ))
    })?;

    Ok(VoucherDraft {
        date: voucher.date,
        payee: voucher.payee.trim().to_string(),
        memo: memo.map(str::to_string),
        prepared_by: voucher.prepared_by.trim().to_string(),
        variant,
        items,
    })
}
