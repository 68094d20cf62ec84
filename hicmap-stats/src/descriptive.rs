//! Summary statistics over diagonal strata.

use hicmap_core::{HicError, Result};

/// Arithmetic mean.
pub fn mean(data: &[f64]) -> Result<f64> {
    if data.is_empty() {
        return Err(HicError::InvalidInput("mean of empty data".into()));
    }
    Ok(data.iter().sum::<f64>() / data.len() as f64)
}

/// Variance with `ddof` delta degrees of freedom.
///
/// `ddof = 0` gives the population variance, `ddof = 1` the sample variance.
pub fn variance(data: &[f64], ddof: usize) -> Result<f64> {
    if data.len() <= ddof {
        return Err(HicError::InvalidInput(format!(
            "variance needs more than {ddof} observations, got {}",
            data.len()
        )));
    }
    let m = mean(data)?;
    let ss: f64 = data.iter().map(|x| (x - m) * (x - m)).sum();
    Ok(ss / (data.len() - ddof) as f64)
}

/// Population standard deviation. Empty data has deviation 0.
pub fn population_std(data: &[f64]) -> f64 {
    variance(data, 0).map_or(0.0, f64::sqrt)
}
