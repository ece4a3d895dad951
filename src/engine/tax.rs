// Tax rate resolution by shipping country
//
// Rates are fractions (0.07 == 7%) keyed by upper-cased ISO country code.
// An unmapped or absent country resolves to a zero rate - tax is an
// optional step of placement, never a failure path.
//
// Rounding is **half-up on cents** over a non-negative subtotal:
// `tax = floor(subtotal * rate + 0.5)`. Subtotals are validated
// non-negative before this is ever called, so the negative half-up edge
// case never arises.

use std::collections::HashMap;

/// Country-code to tax-rate mapping
#[derive(Debug, Clone)]
pub struct TaxTable {
    rates: HashMap<String, f64>,
}

impl Default for TaxTable {
    /// The built-in rates the service ships with
    fn default() -> Self {
        let mut rates = HashMap::new();
        rates.insert("US".to_string(), 0.07);
        rates.insert("IN".to_string(), 0.18);
        rates.insert("GB".to_string(), 0.20);
        rates.insert("DE".to_string(), 0.19);
        Self { rates }
    }
}

impl TaxTable {
    /// An empty table - every country resolves to zero tax
    pub fn empty() -> Self {
        Self {
            rates: HashMap::new(),
        }
    }

    /// Add or replace a country's rate (fraction, not percentage points)
    pub fn with_rate<S: Into<String>>(mut self, country: S, rate: f64) -> Self {
        self.rates.insert(country.into().to_uppercase(), rate);
        self
    }

    /// Resolve the rate for a shipping country
    ///
    /// Lookup is case-insensitive; unmapped or absent countries are 0.0.
    pub fn rate_for(&self, country: Option<&str>) -> f64 {
        country
            .and_then(|c| self.rates.get(&c.to_uppercase()))
            .copied()
            .unwrap_or(0.0)
    }

    /// Compute the tax in cents for a non-negative subtotal, half-up
    pub fn tax_cents(&self, subtotal_cents: i64, country: Option<&str>) -> i64 {
        let rate = self.rate_for(country);
        (subtotal_cents as f64 * rate + 0.5).floor() as i64
    }
}
