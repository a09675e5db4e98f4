use crate::domain::model::ChangeSeries;

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// 季對季相對變化：`levels[i] / levels[i-1] - 1`，四捨五入至小數 6 位。
/// 任一端缺值或前期為 0 時為 `None`
pub fn qoq_change(levels: &[Option<f64>]) -> ChangeSeries {
    let mut changes = Vec::with_capacity(levels.len());
    if levels.is_empty() {
        return changes;
    }
    changes.push(None);

    changes.extend(levels.windows(2).map(|pair| match (pair[0], pair[1]) {
        (Some(previous), Some(current)) if previous != 0.0 => {
            Some(round_to(current / previous - 1.0, 6))
        }
        _ => None,
    }));
    changes
}

/// 利率（%）的變化：先除以 100 再取差額，1pp 對應 0.01。
/// 與 [`qoq_change`] 不同，這是絕對變化而非相對變化
pub fn rate_change(levels_pct: &[Option<f64>]) -> ChangeSeries {
    let mut changes = Vec::with_capacity(levels_pct.len());
    if levels_pct.is_empty() {
        return changes;
    }
    changes.push(None);

    changes.extend(levels_pct.windows(2).map(|pair| match (pair[0], pair[1]) {
        (Some(previous), Some(current)) => Some(round_to(current / 100.0 - previous / 100.0, 6)),
        _ => None,
    }));
    changes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qoq_first_element_is_absent() {
        let changes = qoq_change(&[Some(100.0), Some(110.0), Some(121.0)]);
        assert_eq!(changes, vec![None, Some(0.1), Some(0.1)]);
    }

    #[test]
    fn test_qoq_constant_series_is_zero() {
        let changes = qoq_change(&[Some(50.0), Some(50.0), Some(50.0)]);
        assert_eq!(changes, vec![None, Some(0.0), Some(0.0)]);
    }

    #[test]
    fn test_qoq_zero_or_missing_previous() {
        let changes = qoq_change(&[Some(0.0), Some(10.0), None, Some(12.0)]);
        assert_eq!(changes, vec![None, None, None, None]);
    }

    #[test]
    fn test_qoq_empty_and_single() {
        assert!(qoq_change(&[]).is_empty());
        assert_eq!(qoq_change(&[Some(1.0)]), vec![None]);
    }

    #[test]
    fn test_qoq_rounds_to_six_places() {
        let changes = qoq_change(&[Some(3.0), Some(4.0)]);
        assert_eq!(changes[1], Some(0.333333));
    }

    #[test]
    fn test_rate_change_is_absolute_fraction() {
        // 3.00% → 3.50% → 3.25%
        let changes = rate_change(&[Some(3.0), Some(3.5), Some(3.25)]);
        assert_eq!(changes, vec![None, Some(0.005), Some(-0.0025)]);
    }

    #[test]
    fn test_rate_change_missing_level() {
        let changes = rate_change(&[Some(3.0), None, Some(3.2)]);
        assert_eq!(changes, vec![None, None, None]);
    }
}
