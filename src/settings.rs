//! Service configuration.

use serde::{Deserialize, Serialize};

/// Tunables for [`VoucherService`](crate::voucher::VoucherService).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherConfig {
    /// Vouchers per page when the caller does not choose.
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    /// Upper bound on a requested page size.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
    /// Creation attempts before a reservation conflict is reported.
    #[serde(default = "default_max_creation_attempts")]
    pub max_creation_attempts: u32,
}

fn default_page_size() -> usize {
    10
}

fn default_max_page_size() -> usize {
    100
}

fn default_max_creation_attempts() -> u32 {
    3
}

impl Default for VoucherConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            max_creation_attempts: default_max_creation_attempts(),
        }
    }
}

impl VoucherConfig {
    /// Loads `config/vouchers.toml` (optional) overlaid with `VOUCHERS__*`
    /// environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config/vouchers")
    }

    /// Like [`load`](Self::load) with a different base file name.
    pub fn load_from(path: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("VOUCHERS").separator("__"))
            .build()?
            .try_deserialize()
    }
}
