//! Voucher module containing numbering, totals, navigation and the creation workflow

pub mod navigation;
pub mod sequence;
pub mod service;
pub mod total;

pub use navigation::*;
pub use service::*;
pub use total::*;
