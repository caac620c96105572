//! Route groups and the countdown step.

use std::ops::Add;

use super::record::ArrivalRecord;

/// Records sharing a route category, in feed order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RouteGroup {
    records: Vec<ArrivalRecord>,
    changed_by_timer: bool,
}

impl RouteGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<ArrivalRecord>) -> Self {
        Self {
            records,
            changed_by_timer: false,
        }
    }

    pub fn push(&mut self, record: ArrivalRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&ArrivalRecord> {
        self.records.first()
    }

    pub fn get(&self, index: usize) -> Option<&ArrivalRecord> {
        self.records.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ArrivalRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[ArrivalRecord] {
        &self.records
    }

    /// Whether this group was last updated by a countdown tick rather than
    /// a refresh. Lets a display skip re-laying-out rows whose membership
    /// has not changed.
    pub fn changed_by_timer(&self) -> bool {
        self.changed_by_timer
    }

    /// The group one second later.
    ///
    /// Every countdown drops by one second, stopping at zero; other
    /// statuses are unchanged.
    pub fn descended(&self) -> Self {
        Self {
            records: self.records.iter().map(ArrivalRecord::descended).collect(),
            changed_by_timer: true,
        }
    }
}

impl Add for RouteGroup {
    type Output = RouteGroup;

    /// Concatenate, keeping `self`'s records first.
    fn add(mut self, rhs: RouteGroup) -> RouteGroup {
        self.records.extend(rhs.records);
        self.changed_by_timer = false;
        self
    }
}

impl<'a> IntoIterator for &'a RouteGroup {
    type Item = &'a ArrivalRecord;
    type IntoIter = std::slice::Iter<'a, ArrivalRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
