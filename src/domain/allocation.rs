//! Portfolio allocation: raw per-ticker weights and their normalization.

use crate::domain::error::PortmetricsError;
use std::collections::HashSet;

/// Largest total of raw allocation percentages accepted from configuration.
pub const MAX_TOTAL_ALLOCATION: f64 = 100.0;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AllocationEntry {
    pub ticker: String,
    /// Raw, non-negative weight (typically a percentage).
    pub weight: f64,
}

/// Ordered ticker to raw weight mapping.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Allocation {
    entries: Vec<AllocationEntry>,
}

impl Allocation {
    /// Tickers are trimmed and uppercased. Empty or duplicate tickers and
    /// negative or non-finite weights are rejected.
    pub fn new<T: AsRef<str>>(entries: Vec<(T, f64)>) -> Result<Self, PortmetricsError> {
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(entries.len());

        for (ticker, weight) in entries {
            let ticker = normalize_ticker(ticker.as_ref());
            if ticker.is_empty() {
                return Err(PortmetricsError::invalid_allocation("empty ticker"));
            }
            if !weight.is_finite() || weight < 0.0 {
                return Err(PortmetricsError::invalid_allocation(format!(
                    "weight for {ticker} must be a non-negative number, got {weight}"
                )));
            }
            if !seen.insert(ticker.clone()) {
                return Err(PortmetricsError::invalid_allocation(format!(
                    "duplicate ticker {ticker}"
                )));
            }
            out.push(AllocationEntry { ticker, weight });
        }

        Ok(Self { entries: out })
    }

    /// Parse `"AAPL:15, TSLA:15, GLD:10"`.
    pub fn parse(input: &str) -> Result<Self, PortmetricsError> {
        let mut pairs = Vec::new();
        for token in input.split(',') {
            let token = token.trim();
            if token.is_empty() {
                return Err(PortmetricsError::invalid_allocation("empty token in allocation list"));
            }
            let (ticker, weight) = token.rsplit_once(':').ok_or_else(|| {
                PortmetricsError::invalid_allocation(format!(
                    "expected TICKER:WEIGHT, got {token:?}"
                ))
            })?;
            let weight: f64 = weight.trim().parse().map_err(|_| {
                PortmetricsError::invalid_allocation(format!(
                    "invalid weight for {}: {:?}",
                    ticker.trim(),
                    weight.trim()
                ))
            })?;
            pairs.push((ticker.to_string(), weight));
        }
        Self::new(pairs)
    }

    pub fn entries(&self) -> &[AllocationEntry] {
        &self.entries
    }

    pub fn tickers(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.ticker.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of raw weights.
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|e| e.weight).sum()
    }

    /// Weights divided by the total raw weight of the tickers found in
    /// `available`, in allocation order. Tickers not available are left
    /// out, so the result always sums to 1.
    pub fn normalized_weights(
        &self,
        available: &[&str],
    ) -> Result<Vec<(String, f64)>, PortmetricsError> {
        let used: Vec<&AllocationEntry> = self
            .entries
            .iter()
            .filter(|e| available.contains(&e.ticker.as_str()))
            .collect();

        if used.is_empty() {
            return Err(PortmetricsError::invalid_allocation(
                "no allocated ticker is present in the return table",
            ));
        }

        let total: f64 = used.iter().map(|e| e.weight).sum();
        if total <= 0.0 {
            return Err(PortmetricsError::invalid_allocation(
                "total weight of available tickers is zero",
            ));
        }

        Ok(used
            .into_iter()
            .map(|e| (e.ticker.clone(), e.weight / total))
            .collect())
    }
}

pub fn normalize_ticker(raw: &str) -> String {
    raw.trim().to_uppercase()
}
