use crate::domain::model::{DurationOutcome, DurationSeries};
use crate::domain::services::change::round_to;

/// 敏感度 D_t = 資本變化率 / 利率變化。
///
/// 正值代表資本與利率同向、負值代表反向。第 0 期、利率變化為 0、
/// 任一端缺值，或 |D_t| 超過 `outlier_threshold` 時該期為 `None`。
/// 摘要值取有效比值（未四捨五入）的中位數，再四捨五入至小數 2 位。
pub fn duration(
    capital_change: &[Option<f64>],
    rate_change: &[Option<f64>],
    outlier_threshold: f64,
) -> DurationOutcome {
    let mut series: DurationSeries = Vec::with_capacity(capital_change.len());
    let mut kept = Vec::new();

    for (index, capital) in capital_change.iter().enumerate() {
        // 第 0 期沒有前期可比
        if index == 0 {
            series.push(None);
            continue;
        }

        let rate = rate_change.get(index).copied().flatten();
        let ratio = match (capital, rate) {
            (Some(capital), Some(rate)) if rate != 0.0 => Some(capital / rate),
            _ => None,
        };

        match ratio {
            Some(ratio) if ratio.abs() <= outlier_threshold => {
                kept.push(ratio);
                series.push(Some(round_to(ratio, 2)));
            }
            Some(ratio) => {
                tracing::debug!("Discarding outlier duration {:.2} at index {}", ratio, index);
                series.push(None);
            }
            None => series.push(None),
        }
    }

    DurationOutcome {
        series,
        summary: median(&mut kept).map(|value| round_to(value, 2)),
    }
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));

    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}
