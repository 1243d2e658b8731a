//! Pairwise Pearson correlation matrix over a return table.

use crate::domain::error::PortmetricsError;
use crate::domain::series_table::{ReturnTable, Series};
use chrono::NaiveDate;

/// Rows with every ticker present required before any correlation is
/// computed.
pub const MIN_VALID_ROWS: usize = 3;
/// Jointly present observations required for a single pair.
pub const MIN_PAIRED_OBSERVATIONS: usize = 3;

/// Square, symmetric correlation matrix. Undefined entries are `None`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CorrelationMatrix {
    pub tickers: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
    /// Rows where every ticker had a value.
    pub rows_used: usize,
    /// First and last date among those rows.
    pub window: Option<(NaiveDate, NaiveDate)>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.tickers.iter().position(|t| t == a)?;
        let j = self.tickers.iter().position(|t| t == b)?;
        self.values[i][j]
    }
}

/// Pearson correlation for every pair of ticker columns.
///
/// Fails with [`PortmetricsError::InsufficientValidRows`] when fewer than
/// [`MIN_VALID_ROWS`] rows have a value for every ticker. Each pair is then
/// computed over the rows where both members are present; pairs with fewer
/// than [`MIN_PAIRED_OBSERVATIONS`] such rows, or with a zero-variance
/// member, are undefined.
pub fn corr_matrix(returns: &ReturnTable) -> Result<CorrelationMatrix, PortmetricsError> {
    let complete = returns.complete_rows();
    if complete.len() < MIN_VALID_ROWS {
        return Err(PortmetricsError::InsufficientValidRows {
            found: complete.len(),
            minimum: MIN_VALID_ROWS,
        });
    }

    let columns = returns.columns();
    let n = columns.len();
    let mut values = vec![vec![None; n]; n];

    for i in 0..n {
        values[i][i] = (columns[i].count() >= 1).then_some(1.0);
        for j in (i + 1)..n {
            let r = pairwise_pearson(&columns[i], &columns[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    let dates = returns.dates();
    let window = match (complete.first(), complete.last()) {
        (Some(&first), Some(&last)) => Some((dates[first], dates[last])),
        _ => None,
    };

    Ok(CorrelationMatrix {
        tickers: columns.iter().map(|c| c.ticker.clone()).collect(),
        values,
        rows_used: complete.len(),
        window,
    })
}

fn pairwise_pearson(a: &Series, b: &Series) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = a
        .values
        .iter()
        .zip(&b.values)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();

    if pairs.len() < MIN_PAIRED_OBSERVATIONS {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let denom = (sxx * syy).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }
    Some((sxy / denom).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series_table::SeriesTable;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn dates(n: usize) -> Vec<NaiveDate> {
        (0..n)
            .map(|i| NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64))
            .collect()
    }

    fn table(columns: Vec<Series>) -> SeriesTable {
        let n = columns.first().map(|c| c.values.len()).unwrap_or(0);
        SeriesTable::new("Date", dates(n), columns).unwrap()
    }

    fn assert_all(matrix: &CorrelationMatrix, expected: &[&[f64]]) {
        for (i, row) in expected.iter().enumerate() {
            for (j, &e) in row.iter().enumerate() {
                assert_relative_eq!(matrix.values[i][j].unwrap(), e, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn matrix_positive() {
        let t = table(vec![
            Series::from_f64("A", &[1.0, 2.0, 3.0, 4.0]),
            Series::from_f64("B", &[1.0, 2.0, 3.0, 4.0]),
            Series::from_f64("C", &[2.0, 4.0, 6.0, 8.0]),
        ]);
        let m = corr_matrix(&t).unwrap();
        assert_eq!(m.tickers, vec!["A", "B", "C"]);
        assert_all(&m, &[&[1.0, 1.0, 1.0], &[1.0, 1.0, 1.0], &[1.0, 1.0, 1.0]]);
    }

    #[test]
    fn matrix_negative() {
        let t = table(vec![
            Series::from_f64("A", &[1.0, 2.0, 3.0, 4.0]),
            Series::from_f64("B", &[4.0, 3.0, 2.0, 1.0]),
            Series::from_f64("C", &[8.0, 6.0, 4.0, 2.0]),
        ]);
        let m = corr_matrix(&t).unwrap();
        assert_all(
            &m,
            &[&[1.0, -1.0, -1.0], &[-1.0, 1.0, 1.0], &[-1.0, 1.0, 1.0]],
        );
    }

    #[test]
    fn two_rows_is_insufficient() {
        let t = table(vec![
            Series::from_f64("A", &[1.0, 2.0]),
            Series::from_f64("B", &[4.0, 3.0]),
        ]);
        let err = corr_matrix(&t).unwrap_err();
        assert!(matches!(
            err,
            PortmetricsError::InsufficientValidRows { found: 2, minimum: 3 }
        ));
    }

    #[test]
    fn exactly_three_rows_succeeds() {
        let t = table(vec![
            Series::from_f64("A", &[1.0, 2.0, 4.0]),
            Series::from_f64("B", &[3.0, 1.0, 2.0]),
        ]);
        let m = corr_matrix(&t).unwrap();
        assert_eq!(m.rows_used, 3);
        assert!(m.get("A", "B").is_some());
    }

    #[test]
    fn gaps_reduce_complete_rows_below_threshold() {
        let t = table(vec![
            Series::new("A", vec![Some(1.0), None, Some(3.0), None]),
            Series::from_f64("B", &[4.0, 3.0, 2.0, 1.0]),
            Series::from_f64("C", &[8.0, 6.0, 4.0, 2.0]),
        ]);
        assert!(matches!(
            corr_matrix(&t),
            Err(PortmetricsError::InsufficientValidRows { found: 2, .. })
        ));
    }

    #[test]
    fn all_missing_is_insufficient() {
        let t = table(vec![
            Series::new("A", vec![None; 4]),
            Series::new("B", vec![None; 4]),
        ]);
        assert!(matches!(
            corr_matrix(&t),
            Err(PortmetricsError::InsufficientValidRows { found: 0, .. })
        ));
    }

    #[test]
    fn pair_uses_own_overlap() {
        // A/B share 5 rows, C only has the 3 complete rows.
        let t = table(vec![
            Series::from_f64("A", &[1.0, 2.0, 3.0, 4.0, 5.0]),
            Series::from_f64("B", &[2.0, 4.0, 6.0, 8.0, 10.0]),
            Series::new("C", vec![Some(1.0), Some(3.0), Some(2.0), None, None]),
        ]);
        let m = corr_matrix(&t).unwrap();
        assert_eq!(m.rows_used, 3);
        assert_relative_eq!(m.get("A", "B").unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(m.get("A", "C").unwrap(), 0.5, epsilon = 1e-12);
        assert_eq!(
            m.window,
            Some((dates(5)[0], dates(5)[2]))
        );
    }

    #[test]
    fn constant_column_pair_is_undefined() {
        let t = table(vec![
            Series::from_f64("A", &[1.0, 2.0, 3.0]),
            Series::from_f64("B", &[5.0, 5.0, 5.0]),
        ]);
        let m = corr_matrix(&t).unwrap();
        assert_eq!(m.get("A", "B"), None);
        assert_eq!(m.get("B", "B"), Some(1.0));
    }

    #[test]
    fn matrix_is_symmetric() {
        let t = table(vec![
            Series::from_f64("A", &[0.1, -0.2, 0.05, 0.3, -0.1]),
            Series::from_f64("B", &[0.2, 0.1, -0.3, 0.0, 0.4]),
            Series::from_f64("C", &[-0.1, 0.2, 0.1, -0.2, 0.3]),
        ]);
        let m = corr_matrix(&t).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(m.values[i][j], m.values[j][i]);
                let v = m.values[i][j].unwrap();
                assert!((-1.0..=1.0).contains(&v));
            }
        }
    }

    proptest! {
        #[test]
        fn scalar_multiples_are_perfectly_correlated(
            xs in proptest::collection::vec(-10.0f64..10.0, 3..40),
            k in 0.01f64..100.0,
        ) {
            let mean = xs.iter().sum::<f64>() / xs.len() as f64;
            prop_assume!(xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() > 1e-6);
            let scaled: Vec<f64> = xs.iter().map(|x| x * k).collect();
            let negated: Vec<f64> = xs.iter().map(|x| -x).collect();
            let t = table(vec![
                Series::from_f64("A", &xs),
                Series::from_f64("B", &scaled),
                Series::from_f64("C", &negated),
            ]);
            let m = corr_matrix(&t).unwrap();
            prop_assert!((m.get("A", "B").unwrap() - 1.0).abs() < 1e-9);
            prop_assert!((m.get("A", "C").unwrap() + 1.0).abs() < 1e-9);
        }
    }
}
