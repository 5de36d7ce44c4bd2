use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

use crate::utils::time_utils::{month_key, month_span, month_start};

/// Field-wise addition for per-month summary values.
///
/// `MonthlyLedger::add` treats an absent entry as `Default` and folds the
/// delta into it.
pub trait Accumulate: Default + Clone {
    fn accumulate(&mut self, delta: &Self);
}

impl Accumulate for Decimal {
    fn accumulate(&mut self, delta: &Self) {
        *self += *delta;
    }
}

/// Per-entity history of monthly values.
///
/// Keys are first-of-month dates; the ordered map doubles as the tracked
/// `[min, max]` range.
#[derive(Debug, Clone, PartialEq)]
struct MonthlyHistory<V> {
    entries: BTreeMap<NaiveDate, V>,
}

/// Container mapping `(entity id, month)` to a summary value of type `V`.
///
/// Dates are canonicalized to their month on every access. Reads are
/// side-effect free; occupancy only ever changes through `set` and `add`.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyLedger<V> {
    histories: HashMap<String, MonthlyHistory<V>>,
}

impl<V> Default for MonthlyLedger<V> {
    fn default() -> Self {
        MonthlyLedger::new()
    }
}

impl<V> MonthlyLedger<V> {
    pub fn new() -> Self {
        MonthlyLedger {
            histories: HashMap::new(),
        }
    }

    /// Overwrites the value for the month containing `date`.
    pub fn set(&mut self, id: &str, date: NaiveDate, value: V) {
        self.histories
            .entry(id.to_string())
            .or_insert_with(|| MonthlyHistory {
                entries: BTreeMap::new(),
            })
            .entries
            .insert(month_start(date), value);
    }

    /// Returns the value recorded for the month containing `date`, if any.
    pub fn get(&self, id: &str, date: NaiveDate) -> Option<&V> {
        self.histories
            .get(id)?
            .entries
            .get(&month_start(date))
    }

    /// Inclusive `[earliest, latest]` month range written for `id`.
    pub fn range(&self, id: &str) -> Option<(NaiveDate, NaiveDate)> {
        let entries = &self.histories.get(id)?.entries;
        let (first, _) = entries.first_key_value()?;
        let (last, _) = entries.last_key_value()?;
        Some((*first, *last))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.histories.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }
}

impl<V: Accumulate> MonthlyLedger<V> {
    /// Folds `delta` into the value for the month containing `date`,
    /// treating an absent entry as all-zero.
    pub fn add(&mut self, id: &str, date: NaiveDate, delta: &V) {
        self.histories
            .entry(id.to_string())
            .or_insert_with(|| MonthlyHistory {
                entries: BTreeMap::new(),
            })
            .entries
            .entry(month_start(date))
            .or_default()
            .accumulate(delta);
    }
}

impl<V: Clone> MonthlyLedger<V> {
    /// Converts a history into an array indexed by months before `view_date`:
    /// index 0 is the month containing `view_date`, index 1 one month
    /// earlier, down to the earliest recorded month. Months with no recorded
    /// value are `None`; months after `view_date` are not represented.
    pub fn to_array(&self, id: &str, view_date: NaiveDate) -> Vec<Option<V>> {
        let history = match self.histories.get(id) {
            Some(h) => h,
            None => return Vec::new(),
        };
        let view_month = month_start(view_date);
        let earliest = match history.entries.first_key_value() {
            Some((first, _)) if *first <= view_month => *first,
            _ => return Vec::new(),
        };

        let len = month_span(earliest, view_month) as usize + 1;
        let mut slots: Vec<Option<V>> = vec![None; len];
        for (month, value) in history.entries.range(..=view_month) {
            let index = month_span(*month, view_month) as usize;
            slots[index] = Some(value.clone());
        }
        slots
    }

    /// History as a `"YYYY-MM" -> value` map, the handoff shape expected by
    /// the external cache store.
    pub fn month_map(&self, id: &str) -> BTreeMap<String, V> {
        self.histories
            .get(id)
            .map(|history| {
                history
                    .entries
                    .iter()
                    .map(|(month, value)| (month_key(*month), value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn set_canonicalizes_to_month_and_overwrites() {
        let mut ledger: MonthlyLedger<Decimal> = MonthlyLedger::new();
        ledger.set("acc", date(2024, 3, 5), dec!(100));
        ledger.set("acc", date(2024, 3, 28), dec!(250));

        assert_eq!(ledger.get("acc", date(2024, 3, 17)), Some(&dec!(250)));
    }

    #[test]
    fn get_is_side_effect_free() {
        let ledger: MonthlyLedger<Decimal> = MonthlyLedger::new();
        assert_eq!(ledger.get("missing", date(2024, 1, 1)), None);
        assert!(ledger.is_empty());
    }

    #[test]
    fn add_treats_absent_entry_as_zero() {
        let mut ledger: MonthlyLedger<Decimal> = MonthlyLedger::new();
        ledger.add("acc", date(2024, 1, 10), &dec!(40));
        ledger.add("acc", date(2024, 1, 20), &dec!(2));

        assert_eq!(ledger.get("acc", date(2024, 1, 1)), Some(&dec!(42)));
    }

    #[test]
    fn range_tracks_earliest_and_latest_month() {
        let mut ledger: MonthlyLedger<Decimal> = MonthlyLedger::new();
        ledger.set("acc", date(2024, 5, 9), dec!(1));
        ledger.set("acc", date(2023, 11, 30), dec!(2));
        ledger.set("acc", date(2024, 2, 1), dec!(3));

        assert_eq!(
            ledger.range("acc"),
            Some((date(2023, 11, 1), date(2024, 5, 1)))
        );
        assert_eq!(ledger.range("other"), None);
    }

    #[test]
    fn to_array_indexes_months_before_view_date() {
        let mut ledger: MonthlyLedger<Decimal> = MonthlyLedger::new();
        ledger.set("acc", date(2024, 4, 15), dec!(400));
        ledger.set("acc", date(2024, 2, 3), dec!(200));
        // Later than the view date, must not appear
        ledger.set("acc", date(2024, 6, 1), dec!(600));

        let slots = ledger.to_array("acc", date(2024, 4, 20));
        assert_eq!(
            slots,
            vec![Some(dec!(400)), None, Some(dec!(200))]
        );
    }

    #[test]
    fn to_array_is_empty_when_history_starts_after_view_date() {
        let mut ledger: MonthlyLedger<Decimal> = MonthlyLedger::new();
        ledger.set("acc", date(2024, 6, 1), dec!(600));

        assert!(ledger.to_array("acc", date(2024, 4, 20)).is_empty());
        assert!(ledger.to_array("missing", date(2024, 4, 20)).is_empty());
    }

    #[test]
    fn month_map_uses_canonical_keys() {
        let mut ledger: MonthlyLedger<Decimal> = MonthlyLedger::new();
        ledger.set("acc", date(2024, 4, 15), dec!(400));
        ledger.set("acc", date(2023, 12, 31), dec!(120));

        let map = ledger.month_map("acc");
        assert_eq!(map.get("2024-04"), Some(&dec!(400)));
        assert_eq!(map.get("2023-12"), Some(&dec!(120)));

        let json = serde_json::to_string(&map).unwrap();
        assert!(json.contains("\"2024-04\""));
    }
}
