//! Base-unit to display-unit conversion.

use alloy_primitives::U256;
use alloy_primitives::utils::format_units;

/// Decimals assumed when a chain record does not state its own.
pub const DEFAULT_DECIMALS: u8 = 18;

/// Converts a smallest-unit amount into its display value
/// (`raw / 10^decimals`).
///
/// Precision is that of `f64`; use [`format_amount`] for an exact string.
#[must_use]
pub fn to_display(raw: U256, decimals: u8) -> f64 {
    format_amount(raw, decimals)
        .parse()
        .unwrap_or(f64::NAN)
}

/// Formats a smallest-unit amount as an exact decimal string.
#[must_use]
pub fn format_amount(raw: U256, decimals: u8) -> String {
    format_units(raw, decimals).unwrap_or_else(|_| below_one(raw, decimals))
}

/// `format_units` stops at 77 decimals. Past that every U256 is below one,
/// so the digits only need left-padding.
fn below_one(raw: U256, decimals: u8) -> String {
    format!("0.{:0>width$}", raw.to_string(), width = usize::from(decimals))
}
