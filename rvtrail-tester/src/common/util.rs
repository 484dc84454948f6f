pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Mean of a sample, zero when empty.
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation, zero when empty.
#[allow(clippy::cast_precision_loss)]
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let avg = mean(values);
    let variance =
        values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_csv_trims_and_filters() {
        let parts = split_csv(" beijing, ,xian,  wuhan ");
        assert_eq!(parts, vec!["beijing", "xian", "wuhan"]);
    }

    #[test]
    fn stats_handle_small_samples() {
        assert!(mean(&[]).abs() < f64::EPSILON);
        assert!(std_dev(&[4.0]).abs() < f64::EPSILON);
        assert!((mean(&[2.0, 4.0]) - 3.0).abs() < f64::EPSILON);
        assert!((std_dev(&[2.0, 4.0]) - 1.0).abs() < f64::EPSILON);
    }
}
