//! Active/inactive classification and display ordering.
//!
//! A batch of raw records is split into routes with live arrival
//! information ("active") and routes without it ("inactive"), each grouped
//! by route category. The display order lists every active section before
//! every inactive one, each block ascending by category code.

use std::collections::{BTreeMap, HashSet};

use tracing::trace;

use crate::domain::{RouteCategory, RouteId};
use crate::feed::RawArrivalRecord;

use super::group::RouteGroup;
use super::record::ArrivalRecord;

/// Whether a section holds routes with or without live information.
///
/// Ordered so that live sections sort first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Activity {
    Active,
    Inactive,
}

/// Identifies one section of the board.
///
/// A category can have both live and no-info routes in the same batch, so a
/// section is keyed by activity as well as category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionKey {
    pub activity: Activity,
    pub category: RouteCategory,
}

impl SectionKey {
    pub fn active(category: RouteCategory) -> Self {
        Self {
            activity: Activity::Active,
            category,
        }
    }

    pub fn inactive(category: RouteCategory) -> Self {
        Self {
            activity: Activity::Inactive,
            category,
        }
    }
}

/// The order in which sections are displayed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DisplayOrder(Vec<SectionKey>);

impl DisplayOrder {
    fn from_maps(
        active: &BTreeMap<RouteCategory, RouteGroup>,
        inactive: &BTreeMap<RouteCategory, RouteGroup>,
    ) -> Self {
        // BTreeMap keys are already ascending by category code
        let keys = active
            .keys()
            .copied()
            .map(SectionKey::active)
            .chain(inactive.keys().copied().map(SectionKey::inactive))
            .collect();
        Self(keys)
    }

    pub fn keys(&self) -> &[SectionKey] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SectionKey> {
        self.0.iter()
    }
}

/// A batch split into active and inactive route groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Classification {
    active: BTreeMap<RouteCategory, RouteGroup>,
    inactive: BTreeMap<RouteCategory, RouteGroup>,
    order: DisplayOrder,
}

impl Classification {
    /// Classify a raw batch.
    ///
    /// Records keep their batch order within a group. Records with an
    /// unknown route category are dropped.
    pub fn classify(batch: &[RawArrivalRecord]) -> Self {
        let mut active: BTreeMap<RouteCategory, RouteGroup> = BTreeMap::new();
        let mut inactive: BTreeMap<RouteCategory, RouteGroup> = BTreeMap::new();

        for raw in batch {
            let Some(record) = ArrivalRecord::build(raw) else {
                trace!(route_type = %raw.route_type, route = %raw.route_number, "dropping unknown route category");
                continue;
            };
            let target = if record.is_active() {
                &mut active
            } else {
                &mut inactive
            };
            target.entry(record.category).or_default().push(record);
        }

        let order = DisplayOrder::from_maps(&active, &inactive);
        Self {
            active,
            inactive,
            order,
        }
    }

    pub fn active(&self) -> &BTreeMap<RouteCategory, RouteGroup> {
        &self.active
    }

    pub fn inactive(&self) -> &BTreeMap<RouteCategory, RouteGroup> {
        &self.inactive
    }

    pub fn order(&self) -> &DisplayOrder {
        &self.order
    }

    /// Look up the group for a section.
    pub fn group(&self, key: &SectionKey) -> Option<&RouteGroup> {
        match key.activity {
            Activity::Active => self.active.get(&key.category),
            Activity::Inactive => self.inactive.get(&key.category),
        }
    }

    /// Sections in display order.
    pub fn sections(&self) -> impl Iterator<Item = (SectionKey, &RouteGroup)> + '_ {
        self.order
            .iter()
            .filter_map(|key| self.group(key).map(|group| (*key, group)))
    }

    /// Total number of records across all sections.
    pub fn record_count(&self) -> usize {
        self.active
            .values()
            .chain(self.inactive.values())
            .map(RouteGroup::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The classification one second later.
    ///
    /// Only active groups count down; inactive groups carry no countdown
    /// and are left as they are.
    pub fn descended(&self) -> Self {
        Self {
            active: self
                .active
                .iter()
                .map(|(category, group)| (*category, group.descended()))
                .collect(),
            inactive: self.inactive.clone(),
            order: self.order.clone(),
        }
    }
}

/// Keep only records whose route id appears in `known`.
///
/// Records without a route id are dropped, since they cannot be matched.
pub fn filter_known_routes(
    batch: Vec<RawArrivalRecord>,
    known: &HashSet<RouteId>,
) -> Vec<RawArrivalRecord> {
    batch
        .into_iter()
        .filter(|raw| {
            RouteId::parse(&raw.route_id)
                .map(|id| known.contains(&id))
                .unwrap_or(false)
        })
        .collect()
}
