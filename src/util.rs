//! Numeric helpers shared by the level summary and the result store.

/// Arithmetic mean; `None` for an empty sample.
pub fn mean<I: IntoIterator<Item = f64>>(samples: I) -> Option<f64> {
    let (sum, count) = samples
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Population standard deviation.
pub fn std_dev(samples: &[f64]) -> Option<f64> {
    let m = mean(samples.iter().copied())?;
    let variance = mean(samples.iter().map(|v| (m - v) * (m - v)))?;
    Some(variance.sqrt())
}

pub fn millis_to_f64(samples: &[u64]) -> Vec<f64> {
    samples.iter().map(|ms| *ms as f64).collect()
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
