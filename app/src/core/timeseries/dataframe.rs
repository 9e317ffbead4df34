use std::collections::BTreeMap;

use crate::core::time::{DateTime, DateTimeRange};

use super::DataPoint;

/// Ordered timestamp-keyed series. Iteration is always in ascending
/// timestamp order; inserting an existing timestamp overwrites (last write
/// wins). May be empty, since optional fields of a forecast response are
/// allowed to be missing entirely.
#[derive(Debug, Clone)]
pub struct DataFrame<T> {
    data: BTreeMap<DateTime, DataPoint<T>>,
}

impl<T> DataFrame<T> {
    pub fn new(values: impl IntoIterator<Item = DataPoint<T>>) -> Self {
        let mut data: BTreeMap<DateTime, DataPoint<T>> = BTreeMap::new();
        for dp in values {
            data.insert(dp.timestamp, dp);
        }

        Self { data }
    }

    pub fn empty() -> Self {
        Self { data: BTreeMap::new() }
    }

    pub fn insert(&mut self, dp: DataPoint<T>) {
        self.data.insert(dp.timestamp, dp);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Entry with the exact timestamp.
    pub fn at(&self, at: &DateTime) -> Option<&DataPoint<T>> {
        self.data.get(at)
    }

    /// Last entry whose timestamp is at or before the given instant. None
    /// when the instant precedes every entry.
    pub fn prev_or_at(&self, at: DateTime) -> Option<&DataPoint<T>> {
        self.data.range(..=at).next_back().map(|(_, v)| v)
    }

    /// Sum of values with timestamps in [start, end). The map range query
    /// only touches entries inside the interval, so this stays an ordered
    /// early-exit scan.
    pub fn sum_in(&self, range: &DateTimeRange) -> f64
    where
        for<'a> &'a T: Into<f64>,
    {
        if range.end() <= range.start() {
            return 0.0;
        }

        self.data
            .range(*range.start()..*range.end())
            .map(|(_, dp)| (&dp.value).into())
            .sum()
    }

    /// Maximum-value entry with timestamp in [start, end).
    pub fn max_in(&self, range: &DateTimeRange) -> Option<&DataPoint<T>>
    where
        T: PartialOrd,
    {
        if range.end() <= range.start() {
            return None;
        }

        self.data
            .range(*range.start()..*range.end())
            .map(|(_, v)| v)
            .max_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(std::cmp::Ordering::Equal))
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataPoint<T>> {
        self.data.values()
    }
}
