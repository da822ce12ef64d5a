use super::model::SummaryStats;

/// Default trailing window for most metrics.
pub const DEFAULT_WINDOW: usize = 7;
/// Particulate sensors are noisier and get a wider window.
pub const PARTICULATE_WINDOW: usize = 9;
/// Window that passes raw values straight through.
pub const RAW_WINDOW: usize = 1;

/// Round to two decimal places.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

// ---------------------------------------------------------------------------
// Moving average
// ---------------------------------------------------------------------------

/// Trailing moving average in O(n).
///
/// Keeps a running sum and count of the finite values inside the window.
/// Positions whose window holds no numeric value are `None`.
pub fn moving_average(column: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window <= 1 {
        return column.iter().map(|v| finite(*v)).collect();
    }

    let mut out = Vec::with_capacity(column.len());
    let mut sum = 0.0;
    let mut count = 0usize;

    for (i, value) in column.iter().enumerate() {
        if let Some(v) = finite(*value) {
            sum += v;
            count += 1;
        }
        if i >= window {
            if let Some(old) = finite(column[i - window]) {
                sum -= old;
                count -= 1;
            }
        }
        out.push(if count > 0 {
            Some(round2(sum / count as f64))
        } else {
            None
        });
    }
    out
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Aggregate over every finite value of a column. `None` when there are none.
pub fn summarize(column: &[Option<f64>]) -> Option<SummaryStats> {
    let values: Vec<f64> = column.iter().filter_map(|v| finite(*v)).collect();
    if values.is_empty() {
        return None;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let avg = values.iter().sum::<f64>() / values.len() as f64;
    Some(SummaryStats {
        min: round2(min),
        max: round2(max),
        avg: round2(avg),
        count: values.len(),
    })
}

/// Whether any series in a chart group holds at least one finite value.
pub fn has_numeric_data<C>(columns: &[C]) -> bool
where
    C: AsRef<[Option<f64>]>,
{
    columns
        .iter()
        .any(|c| c.as_ref().iter().any(|v| finite(*v).is_some()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_one_passes_through() {
        assert_eq!(
            moving_average(&[Some(1.0), None, Some(3.0)], 1),
            vec![Some(1.0), None, Some(3.0)]
        );
        assert_eq!(moving_average(&[Some(f64::NAN), Some(2.0)], 0), vec![None, Some(2.0)]);
    }

    #[test]
    fn trailing_window_drops_expiring_value() {
        let col = [Some(1.0), Some(2.0), Some(3.0), Some(4.0)];
        assert_eq!(
            moving_average(&col, 3),
            vec![Some(1.0), Some(1.5), Some(2.0), Some(3.0)]
        );
    }

    #[test]
    fn gaps_shrink_the_denominator() {
        let col = [Some(2.0), None, Some(4.0), None, None, None];
        assert_eq!(
            moving_average(&col, 2),
            vec![Some(2.0), Some(2.0), Some(4.0), Some(4.0), None, None]
        );
    }

    #[test]
    fn averages_are_rounded() {
        let col = [Some(1.0), Some(1.0), Some(2.0)];
        assert_eq!(moving_average(&col, 3)[2], Some(1.33));
    }

    #[test]
    fn output_length_matches_input() {
        let col: Vec<Option<f64>> = (0..50)
            .map(|i| if i % 4 == 0 { None } else { Some(i as f64) })
            .collect();
        for w in [0, 1, 2, 7, 9, 100] {
            assert_eq!(moving_average(&col, w).len(), col.len());
        }
    }

    #[test]
    fn summarize_skips_nulls() {
        assert_eq!(
            summarize(&[Some(1.0), Some(2.0), None, Some(3.0)]),
            Some(SummaryStats { min: 1.0, max: 3.0, avg: 2.0, count: 3 })
        );
        assert_eq!(summarize(&[None, None]), None);
        assert_eq!(summarize(&[]), None);
    }

    #[test]
    fn summarize_rounds() {
        let s = summarize(&[Some(1.004), Some(2.0), Some(2.0)]).unwrap();
        assert_eq!(s.min, 1.0);
        assert_eq!(s.avg, 1.67);
    }

    #[test]
    fn numeric_data_predicate() {
        let empty: [Vec<Option<f64>>; 2] = [vec![None], vec![Some(f64::NAN)]];
        assert!(!has_numeric_data(&empty));
        let some = [vec![None], vec![None, Some(0.0)]];
        assert!(has_numeric_data(&some));
    }
}
