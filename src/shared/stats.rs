/// Median of an unsorted sample set. Averages the two middle values for even
/// counts, the way `statistics.median` does.
pub fn median_u32(samples: &[u32]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(f64::from(sorted[mid]))
    } else {
        Some((f64::from(sorted[mid - 1]) + f64::from(sorted[mid])) / 2.0)
    }
}

pub fn median_f64(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_unstable_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Rounds to one fractional digit, the precision every exported float uses.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[test]
fn median_odd_test() {
    assert_eq!(median_u32(&[3, 1, 2]), Some(2.0));
}

#[test]
fn median_even_test() {
    assert_eq!(median_u32(&[4, 1, 3, 2]), Some(2.5));
}

#[test]
fn median_skew_test() {
    // A single outlier must not drag the representative value.
    assert_eq!(median_u32(&[5, 5, 5, 30]), Some(5.0));
}

#[test]
fn median_empty_test() {
    assert_eq!(median_u32(&[]), None);
    assert_eq!(median_f64(&[]), None);
}

#[test]
fn median_f64_test() {
    assert_eq!(median_f64(&[12.0, 10.0, 14.0]), Some(12.0));
}

#[test]
fn round1_test() {
    assert_eq!(round1(5.4999), 5.5);
    assert_eq!(round1(6.0), 6.0);
    assert_eq!(round1(0.4167), 0.4);
}
