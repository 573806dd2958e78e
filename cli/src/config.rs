//! Configuration management for the storefront CLI
//!
//! Values are read from environment variables with defaults; command-line
//! flags override them.

use std::env;

/// Centralized configuration for the storefront CLI
#[derive(Debug, Clone)]
pub struct StorefrontCliConfig {
    /// Default output format for CLI commands
    pub default_output_format: String,

    /// Divisor for converting currency base units to display units
    pub currency_decimals_divisor: u64,
}

impl StorefrontCliConfig {
    /// Create a new configuration instance with values from environment variables
    /// or defaults if not set
    #[must_use]
    pub fn new() -> Self {
        Self {
            default_output_format: env::var("STOREFRONT_DEFAULT_OUTPUT_FORMAT")
                .unwrap_or_else(|_| "human".to_string()),

            currency_decimals_divisor: env::var("STOREFRONT_CURRENCY_DECIMALS_DIVISOR")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|divisor| Self::is_valid_divisor(*divisor))
                .unwrap_or(1),
        }
    }

    /// Display divisors must be powers of ten so the fraction has a fixed width
    #[must_use]
    pub const fn is_valid_divisor(divisor: u64) -> bool {
        divisor > 0 && 10_u64.pow(divisor.ilog10()) == divisor
    }

    /// Number of fractional digits implied by the divisor (10^n)
    #[must_use]
    pub const fn currency_decimals(&self) -> usize {
        self.currency_decimals_divisor.ilog10() as usize
    }

    /// Render base units in display units
    #[must_use]
    pub fn format_amount(&self, units: u64) -> String {
        let decimals = self.currency_decimals();
        if decimals == 0 {
            return units.to_string();
        }
        let whole = units / self.currency_decimals_divisor;
        let fraction = units % self.currency_decimals_divisor;
        format!("{whole}.{fraction:0decimals$}")
    }
}

impl Default for StorefrontCliConfig {
    fn default() -> Self {
        Self::new()
    }
}
