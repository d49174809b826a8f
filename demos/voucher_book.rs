//! Voucher book walkthrough

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::str::FromStr;
use voucher_core::utils::MemoryStorage;
use voucher_core::{
    telemetry, NewVoucher, PdfRenderer, PrintableVoucher, VoucherConfig, VoucherError,
    VoucherResult, VoucherService, VoucherType,
};

/// Stand-in for a real template engine: renders the voucher as plain text
struct TextRenderer;

#[async_trait]
impl PdfRenderer for TextRenderer {
    async fn render(&self, document: &PrintableVoucher) -> VoucherResult<Vec<u8>> {
        let voucher = &document.voucher;
        let mut out = format!(
            "{}  {}\nDate: {}\nPayee: {}\n",
            voucher.voucher_type().label(),
            voucher.id(),
            voucher.date,
            voucher.payee
        );
        for item in &document.items {
            out.push_str(&format!(
                "{:>3}  {:<20} {:<30} {:>12}\n",
                item.line_no, item.account, item.description, item.amount
            ));
        }
        out.push_str(&format!(
            "Total: {}\n{}\n",
            voucher.total(),
            voucher.amount_in_words()
        ));
        Ok(out.into_bytes())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init_tracing();
    println!("🧾 Voucher Core - Voucher Book Example\n");

    let config = VoucherConfig::load()?;
    let service = VoucherService::with_config(MemoryStorage::new(), config);

    // 1. Record a few vouchers of each kind
    println!("💰 Recording vouchers...");
    let date = NaiveDate::from_ymd_opt(2024, 4, 1).ok_or("bad date")?;

    let rent = service
        .create_voucher(
            NewVoucher::new(VoucherType::BankPayment, date, "City Landlord", "Accounts Clerk")
                .bank("State Bank of India")
                .cheque_number("004512")
                .memo("April rent")
                .item("Rent", "Office rent, April", BigDecimal::from(25000)),
        )
        .await?;

    let petty = service
        .create_voucher(
            NewVoucher::new(VoucherType::CashPayment, date, "Ravi Kumar", "Accounts Clerk")
                .item("Office Expenses", "Printer paper", BigDecimal::from_str("1000.00")?)
                .item("Office Expenses", "Toner", BigDecimal::from_str("500.50")?),
        )
        .await?;

    let receipt = service
        .create_voucher(
            NewVoucher::new(VoucherType::BankReceipt, date, "Acme Traders", "Accounts Clerk")
                .bank("HDFC Bank")
                .instrument("Demand Draft", "DD-7781")
                .item("Debtors", "Invoice 118", BigDecimal::from(250000)),
        )
        .await?;

    for voucher in [&rent, &petty, &receipt] {
        println!(
            "  ✓ {}  ₹{:>12}  {}",
            voucher.id(),
            voucher.total(),
            voucher.amount_in_words()
        );
    }

    // 2. Validation happens before anything is written
    println!("\n🚫 Bank payment without a cheque number...");
    let rejected = service
        .create_voucher(
            NewVoucher::new(VoucherType::BankPayment, date, "Supplier", "Accounts Clerk")
                .bank("State Bank of India"),
        )
        .await;
    if let Err(VoucherError::Validation(errors)) = rejected {
        for error in errors.iter() {
            println!("  ✗ {}: {}", error.field, error.message);
        }
    }

    // 3. Browse
    println!("\n📚 Latest vouchers:");
    let page = service.recent_vouchers(1).await?;
    for voucher in &page.items {
        println!("  {}  {}  {}", voucher.date, voucher.id(), voucher.payee);
    }

    println!("\n🧭 Navigation from {}:", petty.id());
    let navigation = service.navigate(petty.id()).await?;
    println!("  previous: {:?}", navigation.previous_id);
    println!("  next:     {:?}", navigation.next_id);

    // 4. Print
    println!("\n🖨  Exporting {}...", receipt.id());
    let (filename, bytes) = service.export_pdf(receipt.id(), &TextRenderer).await?;
    println!("  {} ({} bytes)", filename, bytes.len());
    println!("{}", String::from_utf8_lossy(&bytes));

    Ok(())
}
