use crate::model::{DeclineEvent, PriceRecord, RecoveryResult, RECOVERY_TARGETS};
use crate::storage::SeriesStore;
use std::collections::BTreeMap;

/// Measures how long each decline took to recover by the fixed target percentages.
pub struct RecoveryCalculator<'a> {
    store: &'a SeriesStore,
}

impl<'a> RecoveryCalculator<'a> {
    pub fn new(store: &'a SeriesStore) -> Self {
        Self { store }
    }

    /// One result per event, in input order. Events without later records are kept
    /// with no recovery days.
    pub fn compute_recovery(&self, events: Vec<DeclineEvent>) -> Vec<RecoveryResult> {
        events
            .into_iter()
            .map(|event| {
                let future = self.store.records_after(&event.symbol, event.date);
                recovery_for(event, future)
            })
            .collect()
    }
}

/// Target price for `target` percent above `open`.
pub fn target_price(open: f64, target: u32) -> f64 {
    open * (1.0 + f64::from(target) / 100.0)
}

/// Single forward pass over `future` (ascending, strictly after the event date)
/// resolving every target at its first day with `open >= target price`.
pub fn recovery_for(event: DeclineEvent, future: &[PriceRecord]) -> RecoveryResult {
    let targets: [(u32, f64); RECOVERY_TARGETS.len()] =
        RECOVERY_TARGETS.map(|t| (t, target_price(event.open_price, t)));

    let mut recovery_days = BTreeMap::new();
    let mut next = 0;
    for record in future {
        if next == targets.len() {
            break;
        }
        // Target prices ascend, so every target cleared today is a prefix of the remaining ones.
        while next < targets.len() && record.open >= targets[next].1 {
            let days = (record.date - event.date).num_days();
            recovery_days.insert(targets[next].0, days);
            next += 1;
        }
    }

    RecoveryResult {
        event,
        recovery_days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::decline::DeclineDetector;
    use crate::model::DeclineQuery;
    use crate::storage::series::tests::{day, record};
    use crate::storage::CompanyDirectory;

    fn scenario_a() -> SeriesStore {
        SeriesStore::build(vec![
            record("ABC", day(1), 100.0),
            record("ABC", day(2), 80.0),
            record("ABC", day(3), 85.0),
            record("ABC", day(4), 90.0),
            record("ABC", day(5), 110.0),
        ])
        .unwrap()
    }

    fn declines(store: &SeriesStore) -> Vec<DeclineEvent> {
        let directory = CompanyDirectory::new();
        DeclineDetector::new(store, &directory).find_declines(&DeclineQuery::with_threshold(-20.0))
    }

    #[test]
    fn scenario_a_first_crossing_in_calendar_days() {
        let store = scenario_a();
        let results = RecoveryCalculator::new(&store).compute_recovery(declines(&store));
        assert_eq!(results.len(), 1);

        let result = &results[0];
        assert_eq!(result.event.date, day(2));
        // Jan 2 to Jan 4 is 2 calendar days.
        assert_eq!(result.days_for(10), Some(2));
        assert_eq!(result.days_for(15), Some(3));
        assert_eq!(result.days_for(20), Some(3));
        // 80 * 1.3 = 104 is cleared by the 110 open as well; 112 is not.
        assert_eq!(result.days_for(30), Some(3));
        assert_eq!(result.days_for(40), None);
        assert_eq!(result.days_for(100), None);
        assert_eq!(result.recovery_days.len(), 4);
    }

    #[test]
    fn decline_on_last_date_keeps_event_unresolved() {
        let store =
            SeriesStore::build(vec![record("ABC", day(1), 100.0), record("ABC", day(2), 50.0)])
                .unwrap();
        let results = RecoveryCalculator::new(&store).compute_recovery(declines(&store));
        assert_eq!(results.len(), 1);
        assert!(results[0].recovery_days.is_empty());
        assert_eq!(results[0].event.open_price, 50.0);
    }

    #[test]
    fn intraday_high_does_not_count() {
        let event = DeclineEvent {
            symbol: "ABC".into(),
            date: day(2),
            open_price: 50.0,
            prev_open: 100.0,
            close_price: 200.0,
            volume: 0,
            decline_pct: -50.0,
            company_name: "ABC".into(),
        };
        let mut spike = record("ABC", day(3), 54.0);
        spike.high = 500.0;
        let result = recovery_for(event, &[spike]);
        assert!(result.recovery_days.is_empty());
    }

    #[test]
    fn one_day_can_clear_several_targets() {
        let store = SeriesStore::build(vec![
            record("ABC", day(1), 100.0),
            record("ABC", day(2), 50.0),
            record("ABC", day(10), 76.0),
            record("ABC", day(20), 101.0),
        ])
        .unwrap();
        let results = RecoveryCalculator::new(&store).compute_recovery(declines(&store));
        let days = &results[0].recovery_days;
        for target in [10, 15, 20, 30, 40, 50] {
            assert_eq!(days.get(&target), Some(&8), "target {target}");
        }
        assert_eq!(days.get(&75), Some(&18));
        assert_eq!(days.get(&100), Some(&18));
    }

    #[test]
    fn later_dip_does_not_undo_a_crossing() {
        let store = SeriesStore::build(vec![
            record("ABC", day(1), 100.0),
            record("ABC", day(2), 50.0),
            record("ABC", day(3), 56.0),
            record("ABC", day(4), 40.0),
            record("ABC", day(6), 61.0),
        ])
        .unwrap();
        let results = RecoveryCalculator::new(&store).compute_recovery(declines(&store));
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].event.date, day(4));

        let first = results.iter().find(|r| r.event.date == day(2)).unwrap();
        assert_eq!(first.days_for(10), Some(1));
        assert_eq!(first.days_for(15), Some(4));
        assert_eq!(first.days_for(20), Some(4));
        assert_eq!(first.days_for(30), None);

        let second = results.iter().find(|r| r.event.date == day(4)).unwrap();
        assert_eq!(second.event.open_price, 40.0);
        for target in [10, 15, 20, 30, 40, 50] {
            assert_eq!(second.days_for(target), Some(2), "target {target}");
        }
        assert_eq!(second.days_for(75), None);
        assert_eq!(second.days_for(100), None);
    }

    #[test]
    fn targets_resolve_in_ascending_price_order() {
        let event = DeclineEvent {
            symbol: "ABC".into(),
            date: day(2),
            open_price: 10.0,
            prev_open: 20.0,
            close_price: 10.0,
            volume: 0,
            decline_pct: -50.0,
            company_name: "ABC".into(),
        };
        let future = [record("ABC", day(3), 12.5), record("ABC", day(9), 20.0)];
        let result = recovery_for(event, &future);
        assert_eq!(result.days_for(20), Some(1));
        assert_eq!(result.days_for(30), Some(7));
        assert_eq!(result.days_for(100), Some(7));
        assert_eq!(result.recovery_days.len(), RECOVERY_TARGETS.len());
    }

    #[test]
    fn preserves_input_order_across_symbols() {
        let store = SeriesStore::build(vec![
            record("AAA", day(1), 100.0),
            record("AAA", day(3), 70.0),
            record("AAA", day(5), 80.0),
            record("BBB", day(1), 100.0),
            record("BBB", day(2), 60.0),
            record("BBB", day(4), 70.0),
        ])
        .unwrap();
        let events = declines(&store);
        let expected: Vec<_> = events.iter().map(|e| e.symbol.clone()).collect();
        let results = RecoveryCalculator::new(&store).compute_recovery(events);
        let actual: Vec<_> = results.iter().map(|r| r.event.symbol.clone()).collect();
        assert_eq!(actual, expected);
        assert_eq!(actual, vec!["AAA", "BBB"]);
        assert_eq!(results[0].days_for(10), Some(2));
        assert_eq!(results[1].days_for(15), Some(2));
    }
}
