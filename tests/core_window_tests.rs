use liveseries::core::{apply_window, Sample, WindowRange, WindowSpec};

fn series(n: u64) -> Vec<Sample> {
    (0..n).map(|i| Sample::new(i, i as f64 * 0.1)).collect()
}

#[test]
fn test_window_keeps_last_max_points() {
    let samples = series(35);
    let view = apply_window(&samples, WindowSpec::new(30).unwrap());

    assert_eq!(view.samples.len(), 30);
    assert_eq!(view.samples[0].sequence, 5);
    assert_eq!(view.range, Some(WindowRange { start: 5, end: 34 }));
}

#[test]
fn test_short_series_is_not_truncated() {
    let samples = series(10);
    let view = apply_window(&samples, WindowSpec::default());

    assert_eq!(view.samples.len(), 10);
    assert_eq!(view.range, Some(WindowRange { start: 0, end: 9 }));
}

#[test]
fn test_exactly_full_window() {
    let samples = series(30);
    let view = apply_window(&samples, WindowSpec::default());

    assert_eq!(view.samples.len(), 30);
    assert_eq!(view.range, Some(WindowRange { start: 0, end: 29 }));
}

#[test]
fn test_empty_series_has_no_range() {
    let view = apply_window(&[], WindowSpec::default());
    assert!(view.samples.is_empty());
    assert!(view.range.is_none());
}

#[test]
fn test_zero_window_rejected() {
    assert!(WindowSpec::new(0).is_err());
}
