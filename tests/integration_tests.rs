//! Integration tests for voucher-core

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

use voucher_core::{
    sequence, utils::MemoryStorage, DefaultVoucherValidator, NavigationIndex, NewVoucher,
    PdfRenderer, PrintableVoucher, ValidationErrors, VoucherConfig, VoucherDraft, VoucherError,
    VoucherResult, VoucherService, VoucherStorage, VoucherType, VoucherValidator,
};

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, day).unwrap()
}

fn amount(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

fn cash_payment(day: u32) -> NewVoucher {
    NewVoucher::new(VoucherType::CashPayment, date(day), "Ravi Kumar", "Accounts Clerk")
        .item("Office Expenses", "Printer paper", amount("1000.00"))
        .item("Office Expenses", "Toner", amount("500.50"))
}

fn cash_receipt(day: u32) -> NewVoucher {
    NewVoucher::new(VoucherType::CashReceipt, date(day), "Meena Stores", "Accounts Clerk")
        .item("Sales", "Counter sale", amount("250.00"))
}

fn bank_payment(day: u32) -> NewVoucher {
    NewVoucher::new(VoucherType::BankPayment, date(day), "City Landlord", "Accounts Clerk")
        .bank("State Bank of India")
        .cheque_number("004512")
        .item("Rent", "April rent", amount("25000.00"))
}

fn bank_receipt(day: u32) -> NewVoucher {
    NewVoucher::new(VoucherType::BankReceipt, date(day), "Acme Traders", "Accounts Clerk")
        .bank("HDFC Bank")
        .instrument("Demand Draft", "DD-7781")
        .item("Debtors", "Invoice 118", amount("2500.00"))
}

fn new_service() -> VoucherService<MemoryStorage> {
    VoucherService::new(MemoryStorage::new())
}

#[tokio::test]
async fn test_create_cash_payment_voucher() {
    let service = new_service();

    let voucher = service
        .create_voucher(cash_payment(1).memo("Stationery for April"))
        .await
        .unwrap();

    assert_eq!(voucher.id(), "CPV-00001");
    assert_eq!(voucher.voucher_type(), VoucherType::CashPayment);
    assert_eq!(voucher.total().to_string(), "1500.50");
    assert_eq!(
        voucher.amount_in_words(),
        "One Thousand Five Hundred Rupees and Fifty Paisas"
    );
    assert_eq!(voucher.memo.as_deref(), Some("Stationery for April"));
    assert!(voucher.bank().is_none());

    let (stored, items) = service.get_voucher_with_items("CPV-00001").await.unwrap();
    assert_eq!(stored, voucher);
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].line_no, 1);
    assert_eq!(items[0].description, "Printer paper");
    assert_eq!(items[1].line_no, 2);
    assert!(items.iter().all(|item| item.voucher_id == "CPV-00001"));
}

#[tokio::test]
async fn test_bank_vouchers_keep_their_details() {
    let service = new_service();

    let payment = service.create_voucher(bank_payment(2)).await.unwrap();
    let receipt = service.create_voucher(bank_receipt(2)).await.unwrap();

    assert_eq!(payment.id(), "BPV-00001");
    let cheque = payment.bank_payment().unwrap();
    assert_eq!(cheque.bank, "State Bank of India");
    assert_eq!(cheque.cheque_number, "004512");
    assert!(payment.bank_receipt().is_none());
    assert_eq!(
        payment.amount_in_words(),
        "Twenty Five Thousand Rupees only"
    );

    assert_eq!(receipt.id(), "BRV-00001");
    let instrument = service
        .get_voucher("BRV-00001")
        .await
        .unwrap()
        .bank_receipt()
        .cloned()
        .unwrap();
    assert_eq!(instrument.instrument_type, "Demand Draft");
    assert_eq!(instrument.instrument_number, "DD-7781");
}

#[tokio::test]
async fn test_sequence_is_per_type() {
    let service = new_service();

    let ids = vec![
        service.create_voucher(cash_payment(1)).await.unwrap(),
        service.create_voucher(cash_receipt(1)).await.unwrap(),
        service.create_voucher(cash_payment(2)).await.unwrap(),
        service.create_voucher(bank_payment(2)).await.unwrap(),
        service.create_voucher(cash_payment(3)).await.unwrap(),
    ]
    .into_iter()
    .map(|v| v.id().to_string())
    .collect::<Vec<_>>();

    assert_eq!(
        ids,
        vec!["CPV-00001", "CRV-00001", "CPV-00002", "BPV-00001", "CPV-00003"]
    );
}

#[tokio::test]
async fn test_empty_voucher_totals_zero() {
    let service = new_service();

    let voucher = service
        .create_voucher(NewVoucher::new(
            VoucherType::CashReceipt,
            date(5),
            "Walk-in",
            "Cashier",
        ))
        .await
        .unwrap();

    assert!(voucher.total().is_zero());
    assert_eq!(voucher.total().to_string(), "0.00");
    assert_eq!(voucher.amount_in_words(), "Zero Rupees only");
    assert!(service
        .get_voucher_with_items(voucher.id())
        .await
        .unwrap()
        .1
        .is_empty());
}

#[tokio::test]
async fn test_total_equals_sum_of_items() {
    let service = new_service();
    let request = NewVoucher::new(VoucherType::CashPayment, date(6), "Petty", "Cashier")
        .item("Travel", "Auto fare", amount("85.25"))
        .item("Travel", "Bus pass", amount("400.00"))
        .item("Meals", "Lunch", amount("199.99"));

    let voucher = service.create_voucher(request).await.unwrap();
    let (_, items) = service.get_voucher_with_items(voucher.id()).await.unwrap();

    let sum: voucher_core::Money = items.iter().map(|item| &item.amount).sum();
    assert_eq!(voucher.total(), &sum);
    assert_eq!(voucher.total().to_string(), "685.24");
    assert_eq!(
        voucher.amount_in_words(),
        "Six Hundred Eighty Five Rupees and Twenty Four Paisas"
    );
}

#[tokio::test]
async fn test_missing_variant_fields_fail_before_any_write() {
    let service = new_service();

    let no_cheque = NewVoucher::new(VoucherType::BankPayment, date(1), "Landlord", "Clerk")
        .bank("State Bank of India")
        .item("Rent", "April rent", amount("100.00"));
    match service.create_voucher(no_cheque).await {
        Err(VoucherError::Validation(errors)) => assert!(errors.has_field("cheque_number")),
        other => panic!("expected validation error, got {:?}", other),
    }

    let no_instrument = NewVoucher::new(VoucherType::BankReceipt, date(1), "Acme", "Clerk")
        .bank("HDFC Bank")
        .item("Debtors", "Invoice 9", amount("100.00"));
    match service.create_voucher(no_instrument).await {
        Err(VoucherError::Validation(errors)) => {
            assert!(errors.has_field("instrument_type"));
            assert!(errors.has_field("instrument_number"));
        }
        other => panic!("expected validation error, got {:?}", other),
    }

    let storage = service.storage();
    assert_eq!(storage.count_vouchers().await.unwrap(), 0);
    assert_eq!(storage.item_count().unwrap(), 0);

    // Nothing was reserved either.
    let voucher = service.create_voucher(bank_payment(3)).await.unwrap();
    assert_eq!(voucher.id(), "BPV-00001");
}

/// Only pays out to payees on an approved list
struct ApprovedPayeesValidator {
    approved: Vec<&'static str>,
}

impl VoucherValidator for ApprovedPayeesValidator {
    fn validate_voucher(&self, voucher: &NewVoucher) -> VoucherResult<VoucherDraft> {
        let draft = DefaultVoucherValidator.validate_voucher(voucher)?;
        if !self.approved.contains(&draft.payee.as_str()) {
            return Err(VoucherError::Validation(ValidationErrors::single(
                "payee",
                "Payee is not on the approved list",
            )));
        }
        Ok(draft)
    }
}

#[tokio::test]
async fn test_custom_validator() {
    let service = new_service().with_validator(Box::new(ApprovedPayeesValidator {
        approved: vec!["City Landlord"],
    }));

    match service.create_voucher(cash_payment(1)).await {
        Err(VoucherError::Validation(errors)) => assert!(errors.has_field("payee")),
        other => panic!("expected validation error, got {:?}", other),
    }
    assert_eq!(service.storage().count_vouchers().await.unwrap(), 0);

    // Default rules still apply underneath.
    let no_cheque = NewVoucher::new(VoucherType::BankPayment, date(2), "City Landlord", "Clerk")
        .bank("State Bank of India")
        .item("Rent", "April rent", amount("100.00"));
    match service.create_voucher(no_cheque).await {
        Err(VoucherError::Validation(errors)) => assert!(errors.has_field("cheque_number")),
        other => panic!("expected validation error, got {:?}", other),
    }

    let voucher = service.create_voucher(bank_payment(3)).await.unwrap();
    assert_eq!(voucher.id(), "BPV-00001");
}

#[tokio::test]
async fn test_failed_item_write_leaves_nothing_behind() {
    let service = new_service();
    service.create_voucher(cash_payment(1)).await.unwrap();

    service.storage().fail_item_insert_after(1).unwrap();
    let result = service.create_voucher(cash_payment(2)).await;
    assert!(matches!(result, Err(VoucherError::Storage(_))));

    let storage = service.storage();
    assert_eq!(storage.count_vouchers().await.unwrap(), 1);
    assert_eq!(storage.item_count().unwrap(), 2);
    assert!(matches!(
        service.get_voucher("CPV-00002").await,
        Err(VoucherError::NotFound(_))
    ));
    assert!(storage.get_items("CPV-00002").await.unwrap().is_empty());

    // The aborted number is skipped, never reused.
    let next = service.create_voucher(cash_payment(3)).await.unwrap();
    assert_eq!(next.id(), "CPV-00003");
}

#[tokio::test]
async fn test_reservation_conflicts_are_retried() {
    let service = new_service();
    service.storage().inject_reservation_conflicts(2).unwrap();

    let voucher = service.create_voucher(cash_receipt(1)).await.unwrap();
    assert_eq!(voucher.id(), "CRV-00001");
}

#[tokio::test]
async fn test_persistent_conflicts_surface_as_transient() {
    let config = VoucherConfig {
        max_creation_attempts: 2,
        ..VoucherConfig::default()
    };
    let service = VoucherService::with_config(MemoryStorage::new(), config);
    service.storage().inject_reservation_conflicts(5).unwrap();

    match service.create_voucher(cash_receipt(1)).await {
        Err(VoucherError::Transient { attempts, .. }) => assert_eq!(attempts, 2),
        other => panic!("expected transient failure, got {:?}", other),
    }
    assert_eq!(service.storage().count_vouchers().await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creations_never_share_an_id() {
    let service = Arc::new(new_service());

    let handles: Vec<_> = (0..40)
        .map(|i| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                let request = if i % 2 == 0 {
                    cash_payment(1 + i % 28)
                } else {
                    bank_payment(1 + i % 28)
                };
                service.create_voucher(request).await
            })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap().id().to_string());
    }

    let unique: HashSet<&String> = ids.iter().collect();
    assert_eq!(unique.len(), 40);

    for voucher_type in [VoucherType::CashPayment, VoucherType::BankPayment] {
        let mut numbers: Vec<u32> = ids
            .iter()
            .map(|id| sequence::parse_id(id).unwrap())
            .filter(|(t, _)| *t == voucher_type)
            .map(|(_, n)| n)
            .collect();
        numbers.sort_unstable();
        assert_eq!(numbers, (1..=20).collect::<Vec<u32>>());
    }
}

#[tokio::test]
async fn test_navigation_orders_by_identifier_not_date() {
    let service = new_service();

    // Created (and dated) in this order...
    service.create_voucher(cash_payment(1)).await.unwrap(); // CPV-00001
    service.create_voucher(bank_payment(2)).await.unwrap(); // BPV-00001
    service.create_voucher(cash_receipt(3)).await.unwrap(); // CRV-00001
    service.create_voucher(bank_receipt(4)).await.unwrap(); // BRV-00001
    service.create_voucher(cash_payment(5)).await.unwrap(); // CPV-00002

    // ...but walked in identifier order.
    let expected = ["BPV-00001", "BRV-00001", "CPV-00001", "CPV-00002", "CRV-00001"];
    let navigation = service.navigation();

    let mut walked = vec![expected[0].to_string()];
    loop {
        let current = walked.last().unwrap().clone();
        match navigation.next_id(&current).await.unwrap() {
            Some(next) => walked.push(next),
            None => break,
        }
    }
    assert_eq!(walked, expected);

    for pair in expected.windows(2) {
        assert_eq!(
            navigation.previous_id(pair[1]).await.unwrap().as_deref(),
            Some(pair[0])
        );
    }

    let first = service.navigate("BPV-00001").await.unwrap();
    assert_eq!(first.previous_id, None);
    assert_eq!(first.next_id.as_deref(), Some("BRV-00001"));

    let last = service.navigate("CRV-00001").await.unwrap();
    assert_eq!(last.previous_id.as_deref(), Some("CPV-00002"));
    assert_eq!(last.next_id, None);
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() {
    let service = new_service();
    service.create_voucher(cash_payment(1)).await.unwrap();

    assert!(matches!(
        service.get_voucher("CPV-00099").await,
        Err(VoucherError::NotFound(id)) if id == "CPV-00099"
    ));
    assert!(matches!(
        service.navigate("BPV-00001").await,
        Err(VoucherError::NotFound(_))
    ));
    assert!(matches!(
        service.export_for_print("CRV-00001").await,
        Err(VoucherError::NotFound(_))
    ));

    // Raw neighbour lookup works for any identifier.
    let navigation = NavigationIndex::new(service.storage());
    assert_eq!(
        navigation.next_id("BPV-00001").await.unwrap().as_deref(),
        Some("CPV-00001")
    );
}

#[tokio::test]
async fn test_list_is_newest_first_by_date_then_id() {
    let service = new_service();
    service.create_voucher(cash_payment(3)).await.unwrap(); // CPV-00001
    service.create_voucher(cash_receipt(5)).await.unwrap(); // CRV-00001
    service.create_voucher(cash_payment(5)).await.unwrap(); // CPV-00002
    service.create_voucher(bank_payment(1)).await.unwrap(); // BPV-00001
    service.create_voucher(bank_receipt(5)).await.unwrap(); // BRV-00001

    let page = service.list_vouchers(1, 10).await.unwrap();
    let ids: Vec<&str> = page.items.iter().map(|v| v.id()).collect();
    assert_eq!(
        ids,
        vec!["CRV-00001", "CPV-00002", "BRV-00001", "CPV-00001", "BPV-00001"]
    );
    assert_eq!(page.total_items, 5);
    assert_eq!(page.total_pages, 1);
    assert!(!page.has_next());
}

#[tokio::test]
async fn test_list_pagination_and_clamping() {
    let service = new_service();
    for day in 1..=12 {
        service.create_voucher(cash_payment(day)).await.unwrap();
    }

    let first = service.recent_vouchers(1).await.unwrap();
    assert_eq!(first.page_size, 10);
    assert_eq!(first.items.len(), 10);
    assert_eq!(first.total_pages, 2);
    assert_eq!(first.items[0].id(), "CPV-00012");
    assert!(first.has_next());
    assert!(!first.has_previous());

    let second = service.list_vouchers(2, 10).await.unwrap();
    assert_eq!(second.items.len(), 2);
    assert_eq!(second.items[1].id(), "CPV-00001");

    let beyond = service.list_vouchers(99, 10).await.unwrap();
    assert_eq!(beyond.page, 2);
    let before = service.list_vouchers(0, 10).await.unwrap();
    assert_eq!(before.page, 1);

    assert!(matches!(
        service.list_vouchers(1, 0).await,
        Err(VoucherError::Validation(_))
    ));
}

#[tokio::test]
async fn test_list_on_empty_book() {
    let service = new_service();
    let page = service.list_vouchers(3, 10).await.unwrap();
    assert_eq!(page.page, 1);
    assert_eq!(page.total_pages, 1);
    assert!(page.items.is_empty());
}

struct FakeRenderer;

#[async_trait]
impl PdfRenderer for FakeRenderer {
    async fn render(&self, document: &PrintableVoucher) -> VoucherResult<Vec<u8>> {
        let body = format!(
            "%PDF {} {} {} lines",
            document.voucher.id(),
            document.voucher.amount_in_words(),
            document.items.len()
        );
        Ok(body.into_bytes())
    }
}

struct BrokenRenderer;

#[async_trait]
impl PdfRenderer for BrokenRenderer {
    async fn render(&self, _document: &PrintableVoucher) -> VoucherResult<Vec<u8>> {
        Err(VoucherError::Export("template missing".to_string()))
    }
}

#[tokio::test]
async fn test_export_for_print() {
    let service = new_service();
    let voucher = service.create_voucher(bank_payment(9)).await.unwrap();

    let document = service.export_for_print(voucher.id()).await.unwrap();
    assert_eq!(document.filename, "BPV-00001_2024-04-09.pdf");
    assert_eq!(document.voucher, voucher);
    assert_eq!(document.items.len(), 1);

    let (filename, bytes) = service
        .export_pdf(voucher.id(), &FakeRenderer)
        .await
        .unwrap();
    assert_eq!(filename, "BPV-00001_2024-04-09.pdf");
    assert_eq!(
        String::from_utf8(bytes).unwrap(),
        "%PDF BPV-00001 Twenty Five Thousand Rupees only 1 lines"
    );

    assert!(matches!(
        service.export_pdf(voucher.id(), &BrokenRenderer).await,
        Err(VoucherError::Export(_))
    ));
}

#[tokio::test]
async fn test_printable_voucher_serializes() {
    let service = new_service();
    let voucher = service.create_voucher(bank_receipt(10)).await.unwrap();
    let document = service.export_for_print(voucher.id()).await.unwrap();

    let json = serde_json::to_value(&document).unwrap();
    assert_eq!(json["filename"], "BRV-00001_2024-04-10.pdf");
    assert_eq!(json["voucher"]["id"], "BRV-00001");
    assert_eq!(
        json["voucher"]["amount_in_words"],
        "Two Thousand Five Hundred Rupees only"
    );
    assert_eq!(json["voucher"]["total"], "2500.00");
}
