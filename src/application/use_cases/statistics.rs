// ============================================================
// COLUMN STATISTICS
// ============================================================
// Summary numbers for the browsing view, computed over one column

use crate::domain::value_type::parse_number;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Statistics over one column. Count and unique cover every value; the
/// numeric fields only cover values that parse as numbers and are `None`
/// when no value does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStatistics {
    pub count: usize,
    pub unique: usize,
    pub numeric_count: usize,
    pub sum: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub variance: Option<f64>,
    pub std_dev: Option<f64>,
    pub quartile1: Option<f64>,
    pub quartile3: Option<f64>,
    /// Values outside `[q1 - 1.5*iqr, q3 + 1.5*iqr]`.
    pub outliers: Vec<f64>,
}

fn median_of(sorted: &[f64]) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Compute statistics over the raw values of one column.
pub fn column_statistics(values: &[String]) -> ColumnStatistics {
    let unique: HashSet<&str> = values.iter().map(String::as_str).collect();
    let mut numbers: Vec<f64> = values
        .iter()
        .filter_map(|v| parse_number(v.trim()))
        .collect();
    numbers.sort_by(f64::total_cmp);

    let numeric_count = numbers.len();
    let sum = (!numbers.is_empty()).then(|| numbers.iter().sum::<f64>());
    let mean = sum.map(|s| s / numeric_count as f64);
    let median = median_of(&numbers);
    let min = numbers.first().copied();
    let max = numbers.last().copied();

    let variance = mean.map(|m| {
        numbers.iter().map(|n| (n - m).powi(2)).sum::<f64>() / numeric_count as f64
    });
    let std_dev = variance.map(f64::sqrt);

    // Quartiles as medians of the lower and upper half, the half split
    // excluding the middle element for odd lengths.
    let mid = numbers.len() / 2;
    let (quartile1, quartile3) = if numbers.len() < 2 {
        (None, None)
    } else {
        let upper_start = if numbers.len() % 2 == 0 { mid } else { mid + 1 };
        (
            median_of(&numbers[..mid]),
            median_of(&numbers[upper_start..]),
        )
    };

    let outliers = match (quartile1, quartile3) {
        (Some(q1), Some(q3)) => {
            let iqr = q3 - q1;
            let low = q1 - 1.5 * iqr;
            let high = q3 + 1.5 * iqr;
            numbers
                .iter()
                .copied()
                .filter(|n| *n < low || *n > high)
                .collect()
        }
        _ => Vec::new(),
    };

    ColumnStatistics {
        count: values.len(),
        unique: unique.len(),
        numeric_count,
        sum,
        mean,
        median,
        min,
        max,
        variance,
        std_dev,
        quartile1,
        quartile3,
        outliers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_counts_and_unique() {
        let stats = column_statistics(&values(&["a", "b", "a", ""]));
        assert_eq!(stats.count, 4);
        assert_eq!(stats.unique, 3);
        assert_eq!(stats.numeric_count, 0);
        assert_eq!(stats.mean, None);
        assert_eq!(stats.median, None);
    }

    #[test]
    fn test_basic_numeric_stats() {
        let stats = column_statistics(&values(&["1", "2", "3", "4"]));
        assert_eq!(stats.sum, Some(10.0));
        assert_eq!(stats.mean, Some(2.5));
        assert_eq!(stats.median, Some(2.5));
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(4.0));
        assert_eq!(stats.variance, Some(1.25));
    }

    #[test]
    fn test_comma_decimals_counted() {
        let stats = column_statistics(&values(&["1,5", "2.5"]));
        assert_eq!(stats.numeric_count, 2);
        assert_eq!(stats.sum, Some(4.0));
    }

    #[test]
    fn test_quartiles_and_outliers() {
        let stats = column_statistics(&values(&[
            "1", "2", "3", "4", "5", "6", "7", "8", "100",
        ]));
        assert_eq!(stats.quartile1, Some(2.5));
        assert_eq!(stats.quartile3, Some(7.5));
        assert_eq!(stats.outliers, vec![100.0]);
    }

    #[test]
    fn test_mixed_values_skip_non_numeric() {
        let stats = column_statistics(&values(&["oak", "3", "fir", "5"]));
        assert_eq!(stats.count, 4);
        assert_eq!(stats.numeric_count, 2);
        assert_eq!(stats.mean, Some(4.0));
    }

    #[test]
    fn test_single_value_has_no_quartiles() {
        let stats = column_statistics(&values(&["7"]));
        assert_eq!(stats.median, Some(7.0));
        assert_eq!(stats.quartile1, None);
        assert!(stats.outliers.is_empty());
    }
}
