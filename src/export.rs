//! Print export: the resolved data handed to a [`PdfRenderer`](crate::traits::PdfRenderer)

use serde::Serialize;

use crate::types::{Item, Voucher};

/// A committed voucher with its items, ready for a template
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrintableVoucher {
    pub voucher: Voucher,
    pub items: Vec<Item>,
    /// Suggested download name, `{voucher id}_{date}.pdf`
    pub filename: String,
}

impl PrintableVoucher {
    pub fn new(voucher: Voucher, items: Vec<Item>) -> Self {
        let filename = pdf_filename(&voucher);
        Self {
            voucher,
            items,
            filename,
        }
    }
}

/// `BPV-00001_2024-04-01.pdf`
pub fn pdf_filename(voucher: &Voucher) -> String {
    format!("{}_{}.pdf", voucher.id(), voucher.date.format("%Y-%m-%d"))
}
