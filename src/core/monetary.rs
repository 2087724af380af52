/// Monetary units for the settlement engine
///
/// Values are carried as signed base units so that a transaction declaring a
/// negative output can be represented and then rejected, rather than being
/// unrepresentable. Everything in a consistent pool is non-negative.
///
/// ## Units
/// - **Base unit**: the smallest indivisible amount
/// - **Coin**: 100,000,000 base units
pub type Amount = i64;

/// Number of base units in one coin
pub const UNITS_PER_COIN: Amount = 100_000_000;

/// Sum amounts, returning `None` on overflow
pub fn checked_sum<I>(values: I) -> Option<Amount>
where
    I: IntoIterator<Item = Amount>,
{
    values
        .into_iter()
        .try_fold(0 as Amount, |acc, value| acc.checked_add(value))
}

/// Sum amounts in a width that cannot overflow for any realistic batch
pub fn wide_sum<I>(values: I) -> i128
where
    I: IntoIterator<Item = Amount>,
{
    values.into_iter().map(i128::from).sum()
}

/// Utility functions for monetary conversions
pub mod conversions {
    use super::*;

    /// Convert coins to base units
    ///
    /// # Examples
    /// ```
    /// use ledger_settlement::core::monetary::conversions::coins_to_units;
    /// assert_eq!(coins_to_units(1.0), 100_000_000);
    /// assert_eq!(coins_to_units(0.5), 50_000_000);
    /// ```
    pub fn coins_to_units(coins: f64) -> Amount {
        (coins * UNITS_PER_COIN as f64).round() as Amount
    }

    /// Convert base units to coins
    pub fn units_to_coins(units: Amount) -> f64 {
        units as f64 / UNITS_PER_COIN as f64
    }

    /// Format an amount as a human-readable string
    ///
    /// # Examples
    /// ```
    /// use ledger_settlement::core::monetary::conversions::format_amount;
    /// assert_eq!(format_amount(100_000_000), "1.00000000 coins");
    /// assert_eq!(format_amount(-1_000), "-0.00001000 coins");
    /// ```
    pub fn format_amount(units: Amount) -> String {
        format!("{:.8} coins", units_to_coins(units))
    }
}
