//! # Voucher Core
//!
//! A voucher book for small organizations: cash and bank payment/receipt
//! vouchers with sequential per-type numbers, line items, totals spelled out
//! in words, and print export.
//!
//! ## Features
//!
//! - **Sequential numbering**: `BPV-00001`, `CRV-00042`, ... reserved under a per-type lock
//! - **Typed variants**: bank vouchers carry bank and cheque/instrument details
//! - **Amount in words**: Indian numbering ("Two Lakh Fifty Thousand Rupees only")
//! - **Atomic creation**: a voucher and its items are committed together or not at all
//! - **Navigation**: previous/next voucher by identifier
//! - **Storage abstraction**: Database-agnostic design with trait-based storage
//!
//! ## Quick Start
//!
//! ```rust
//! use voucher_core::utils::MemoryStorage;
//! use voucher_core::{NewVoucher, VoucherService, VoucherType};
//! use bigdecimal::BigDecimal;
//! use chrono::NaiveDate;
//!
//! # tokio_test_block(async {
//! let service = VoucherService::new(MemoryStorage::new());
//! let voucher = service
//!     .create_voucher(
//!         NewVoucher::new(
//!             VoucherType::CashPayment,
//!             NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
//!             "Ravi Kumar",
//!             "Accounts Clerk",
//!         )
//!         .item("Office Expenses", "Printer paper", BigDecimal::from(1500)),
//!     )
//!     .await
//!     .unwrap();
//!
//! assert_eq!(voucher.id(), "CPV-00001");
//! assert_eq!(voucher.amount_in_words(), "One Thousand Five Hundred Rupees only");
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f);
//! # }
//! ```

pub mod export;
pub mod settings;
pub mod telemetry;
pub mod traits;
pub mod types;
pub mod utils;
pub mod voucher;
pub mod words;

// Re-export commonly used types
pub use export::*;
pub use settings::VoucherConfig;
pub use traits::*;
pub use types::*;
pub use voucher::*;
pub use words::{number_to_words, to_words};
