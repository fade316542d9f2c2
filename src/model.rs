//! Piecewise logistic win probability model.
//!
//! The model is a pretrained coefficient table indexed by intervals of
//! absolute game seconds remaining. Scoring picks the interval covering
//! the query time, forms a logit from the score differential and a
//! pre-game favored-by prior, and squashes it through a sigmoid. The
//! table is loaded once at construction and is read-only afterwards, so
//! it can be shared across stream instances.

use anyhow::{anyhow, Context, Result};
use log::warn;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Favored-by prior used when the caller does not supply one.
pub const DEFAULT_FAVORED_BY: f64 = 0.5;

const COEFFICIENT_PTS_DIFF: &str = "pts_diff";
const COEFFICIENT_FAVORED_BY: &str = "favored_by";

/// One row of the coefficient table.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientRow {
    /// Interval lower bound in absolute game seconds, inclusive.
    pub min_time: i64,
    /// Interval upper bound in absolute game seconds, inclusive.
    pub max_time: i64,
    /// Which model term this estimate belongs to.
    pub coefficient: String,
    pub estimate: f64,
}

#[derive(Debug, Clone)]
pub struct WinProbabilityModel {
    rows: Vec<CoefficientRow>,
}

impl WinProbabilityModel {
    /// Builds a model from rows already in memory. Row order is preserved:
    /// when several rows of one coefficient cover a query time, the first
    /// wins.
    pub fn from_rows(rows: Vec<CoefficientRow>) -> Self {
        Self { rows }
    }

    /// Loads the coefficient table from a CSV file with columns
    /// `min_time, max_time, coefficient, estimate` (header order is free,
    /// resolved by name). Missing required columns are fatal; malformed
    /// data rows are skipped with a warning.
    pub fn from_csv(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open coefficient table {}", path.display()))?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let header = lines
            .next()
            .ok_or_else(|| anyhow!("coefficient table {} is empty", path.display()))?
            .context("failed to read coefficient table header")?;
        let columns: Vec<&str> = header.split(',').map(str::trim).collect();

        let column_index = |name: &str| -> Result<usize> {
            columns
                .iter()
                .position(|c| *c == name)
                .ok_or_else(|| anyhow!("coefficient table is missing a {:?} column", name))
        };
        let min_idx = column_index("min_time")?;
        let max_idx = column_index("max_time")?;
        let coef_idx = column_index("coefficient")?;
        let est_idx = column_index("estimate")?;

        let mut rows = Vec::new();
        for (line_num, line) in lines.enumerate() {
            let line = line.context("failed to read coefficient table row")?;
            if line.trim().is_empty() {
                continue;
            }

            match parse_row(&line, min_idx, max_idx, coef_idx, est_idx) {
                Ok(row) => rows.push(row),
                Err(e) => {
                    warn!("skipping malformed coefficient row {}: {}", line_num + 2, e);
                }
            }
        }

        if rows.is_empty() {
            return Err(anyhow!(
                "coefficient table {} has no usable rows",
                path.display()
            ));
        }

        Ok(Self { rows })
    }

    /// Win probability for team 1 given the live state.
    ///
    /// Time is rounded to the nearest whole second and matched against the
    /// interval bounds, inclusive on both ends. Returns `None` when no
    /// interval supplies both the `pts_diff` and `favored_by` estimates;
    /// the caller decides how to render that.
    pub fn compute(
        &self,
        score1: i64,
        score2: i64,
        time_remaining_sec: f64,
        favored_by: f64,
    ) -> Option<f64> {
        let t = time_remaining_sec.round() as i64;

        let estimate_for = |name: &str| -> Option<f64> {
            self.rows
                .iter()
                .find(|row| row.coefficient == name && row.min_time <= t && t <= row.max_time)
                .map(|row| row.estimate)
        };

        let pts_diff_coef = estimate_for(COEFFICIENT_PTS_DIFF)?;
        let favored_by_coef = estimate_for(COEFFICIENT_FAVORED_BY)?;

        // The table defines no intercept term.
        let score_diff = (score1 - score2) as f64;
        let logit = pts_diff_coef * score_diff + favored_by_coef * favored_by;
        let probability = 1.0 / (1.0 + (-logit).exp());

        Some(probability.clamp(0.0, 1.0))
    }
}

fn parse_row(
    line: &str,
    min_idx: usize,
    max_idx: usize,
    coef_idx: usize,
    est_idx: usize,
) -> Result<CoefficientRow> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    let width = min_idx.max(max_idx).max(coef_idx).max(est_idx) + 1;
    if parts.len() < width {
        return Err(anyhow!("expected at least {} columns, got {}", width, parts.len()));
    }

    Ok(CoefficientRow {
        min_time: parts[min_idx].parse().context("invalid min_time")?,
        max_time: parts[max_idx].parse().context("invalid max_time")?,
        coefficient: parts[coef_idx].to_string(),
        estimate: parts[est_idx].parse().context("invalid estimate")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn row(min_time: i64, max_time: i64, coefficient: &str, estimate: f64) -> CoefficientRow {
        CoefficientRow {
            min_time,
            max_time,
            coefficient: coefficient.to_string(),
            estimate,
        }
    }

    fn simple_model() -> WinProbabilityModel {
        WinProbabilityModel::from_rows(vec![
            row(0, 60, "pts_diff", 0.1),
            row(0, 60, "favored_by", 0.2),
            row(61, 120, "pts_diff", 0.05),
            row(61, 120, "favored_by", 0.1),
        ])
    }

    #[test]
    fn test_compute_known_value() {
        let model = simple_model();
        // logit = 0.1 * 3 + 0.2 * 0.5 = 0.4
        let p = model.compute(88, 85, 45.0, 0.5).unwrap();
        assert!((p - 0.598687).abs() < 1e-5);
    }

    #[test]
    fn test_time_rounds_to_nearest_second() {
        let model = simple_model();
        // 60.4 rounds to 60 -> first interval; 60.6 rounds to 61 -> second.
        let near = model.compute(10, 0, 60.4, 0.5).unwrap();
        let far = model.compute(10, 0, 60.6, 0.5).unwrap();
        assert!(near > far);
    }

    #[test]
    fn test_no_interval_is_none() {
        let model = simple_model();
        assert_eq!(model.compute(88, 85, 500.0, 0.5), None);
    }

    #[test]
    fn test_missing_one_coefficient_is_none() {
        let model = WinProbabilityModel::from_rows(vec![row(0, 60, "pts_diff", 0.1)]);
        assert_eq!(model.compute(88, 85, 45.0, 0.5), None);
    }

    #[test]
    fn test_probability_stays_clamped() {
        let model = WinProbabilityModel::from_rows(vec![
            row(0, 60, "pts_diff", 50.0),
            row(0, 60, "favored_by", 50.0),
        ]);
        let blowout = model.compute(150, 0, 30.0, 0.5).unwrap();
        assert!((0.0..=1.0).contains(&blowout));
        let reverse = model.compute(0, 150, 30.0, 0.5).unwrap();
        assert!((0.0..=1.0).contains(&reverse));
    }

    #[test]
    fn test_overlapping_intervals_first_row_wins() {
        // Both intervals cover t=60 at the shared boundary; file order decides.
        let model = WinProbabilityModel::from_rows(vec![
            row(0, 60, "pts_diff", 0.1),
            row(0, 60, "favored_by", 0.0),
            row(60, 120, "pts_diff", 0.9),
            row(60, 120, "favored_by", 0.0),
        ]);
        let p = model.compute(10, 0, 60.0, 0.5).unwrap();
        let expected = 1.0 / (1.0 + (-0.1f64 * 10.0).exp());
        assert!((p - expected).abs() < 1e-9);
    }

    #[test]
    fn test_from_csv_resolves_columns_by_name() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "coefficient,estimate,min_time,max_time\n\
             pts_diff,0.1,0,60\n\
             favored_by,0.2,0,60\n"
        )
        .unwrap();

        let model = WinProbabilityModel::from_csv(file.path()).unwrap();
        let p = model.compute(88, 85, 45.0, 0.5).unwrap();
        assert!((p - 0.598687).abs() < 1e-5);
    }

    #[test]
    fn test_from_csv_missing_column_is_fatal() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "min_time,max_time,estimate\n0,60,0.1\n").unwrap();
        assert!(WinProbabilityModel::from_csv(file.path()).is_err());
    }

    #[test]
    fn test_from_csv_skips_malformed_rows() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "min_time,max_time,coefficient,estimate\n\
             0,60,pts_diff,0.1\n\
             not,a,row\n\
             0,60,favored_by,0.2\n\
             \n"
        )
        .unwrap();

        let model = WinProbabilityModel::from_csv(file.path()).unwrap();
        assert!(model.compute(88, 85, 45.0, 0.5).is_some());
    }

    #[test]
    fn test_from_csv_no_usable_rows_is_fatal() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "min_time,max_time,coefficient,estimate\nbad,row,here,too\n").unwrap();
        assert!(WinProbabilityModel::from_csv(file.path()).is_err());
    }
}
