use crate::model::{
    RecoveryResult, RecoveryStatistics, TargetStats, TimeframeStat, RECOVERY_TARGETS,
    TIMEFRAME_WINDOWS,
};
use crate::utils::{median_sorted, round1};
use std::collections::BTreeMap;

/// Reduces recovery results to per-target distributions and timeframe recovery rates.
/// An empty input yields `total_count == 0` with empty maps.
pub fn aggregate(results: &[RecoveryResult]) -> RecoveryStatistics {
    let total = results.len();
    if total == 0 {
        return RecoveryStatistics::default();
    }

    let per_target: BTreeMap<u32, TargetStats> = RECOVERY_TARGETS
        .iter()
        .map(|&target| (target, target_stats(results, target)))
        .collect();

    let timeframe_percentages = TIMEFRAME_WINDOWS
        .iter()
        .map(|&(target, window_days)| {
            let count = results
                .iter()
                .filter(|r| r.days_for(target).is_some_and(|d| d <= window_days))
                .count();
            TimeframeStat {
                target,
                window_days,
                percentage: percent(count, total),
                count,
                total,
            }
        })
        .collect();

    RecoveryStatistics {
        total_count: total,
        per_target,
        timeframe_percentages,
    }
}

fn target_stats(results: &[RecoveryResult], target: u32) -> TargetStats {
    let total = results.len();
    let mut days: Vec<i64> = results.iter().filter_map(|r| r.days_for(target)).collect();
    days.sort_unstable();

    let resolved = days.len();
    let average = (resolved > 0).then(|| round1(days.iter().sum::<i64>() as f64 / resolved as f64));

    TargetStats {
        average_days: average,
        median_days: median_sorted(&days).map(round1),
        min_days: days.first().copied(),
        max_days: days.last().copied(),
        resolved_count: resolved,
        total_count: total,
        recovery_rate_pct: percent(resolved, total),
    }
}

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round1(count as f64 / total as f64 * 100.0)
}
