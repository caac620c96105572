//! Normalized arrival records.

use crate::domain::{Congestion, DecodedEta, RouteCategory, RouteId};
use crate::feed::RawArrivalRecord;

/// One route's arrival information at a station, decoded and normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrivalRecord {
    pub category: RouteCategory,
    pub first_congestion: Option<Congestion>,
    /// Only present when both vehicles have live information; the feed only
    /// reports congestion for the first vehicle, so it is inherited.
    pub second_congestion: Option<Congestion>,
    pub next_station: String,
    pub route_number: String,
    pub station_ord: Option<u32>,
    pub route_id: Option<RouteId>,
    pub first: DecodedEta,
    pub second: DecodedEta,
}

impl ArrivalRecord {
    /// Build a record from a raw feed snapshot.
    ///
    /// Returns `None` when the route category is not one the board shows.
    /// A route without live information for its first vehicle is cleared
    /// entirely, whatever the second vehicle's message says.
    pub fn build(raw: &RawArrivalRecord) -> Option<Self> {
        let category = RouteCategory::parse(&raw.route_type)?;

        let mut record = Self {
            category,
            first_congestion: None,
            second_congestion: None,
            next_station: raw.next_station.clone(),
            route_number: raw.route_number.clone(),
            station_ord: raw.station_ord.trim().parse().ok(),
            route_id: RouteId::parse(&raw.route_id).ok(),
            first: DecodedEta::no_info(),
            second: DecodedEta::no_info(),
        };

        let first = DecodedEta::decode(&raw.first_arrival);
        if !first.is_usable() {
            return Some(record);
        }

        let second = DecodedEta::decode(&raw.second_arrival);
        record.first_congestion = Congestion::parse(&raw.congestion);
        record.second_congestion = if second.is_usable() {
            record.first_congestion
        } else {
            None
        };
        record.first = first;
        record.second = second;

        Some(record)
    }

    /// Whether the first approaching vehicle has live information.
    pub fn is_active(&self) -> bool {
        self.first.is_usable()
    }

    /// The same record one countdown step later.
    pub fn descended(&self) -> Self {
        Self {
            first: self.first.descended(),
            second: self.second.descended(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::EtaStatus;

    pub(crate) fn raw(route_type: &str, first: &str, second: &str) -> RawArrivalRecord {
        RawArrivalRecord {
            route_type: route_type.to_string(),
            congestion: "4".to_string(),
            next_station: "City Hall".to_string(),
            route_number: "472".to_string(),
            station_ord: "17".to_string(),
            route_id: "100100073".to_string(),
            first_arrival: first.to_string(),
            second_arrival: second.to_string(),
        }
    }

    #[test]
    fn countdown_with_no_second_vehicle() {
        let record = ArrivalRecord::build(&raw("3", "120", "운행종료")).unwrap();

        assert_eq!(record.category, RouteCategory::Trunk);
        assert_eq!(record.first.status, EtaStatus::CountingDown(120));
        assert_eq!(record.second.status, EtaStatus::NoInfo);
        assert_eq!(record.first_congestion, Some(Congestion::Normal));
        assert_eq!(record.second_congestion, None);
        assert_eq!(record.station_ord, Some(17));
        assert_eq!(record.route_id, Some(RouteId::parse("100100073").unwrap()));
        assert!(record.is_active());
    }

    #[test]
    fn second_vehicle_inherits_congestion() {
        let record = ArrivalRecord::build(&raw("3", "1분후", "7분30초후[4번째 전]")).unwrap();

        assert_eq!(record.second.status, EtaStatus::CountingDown(450));
        assert_eq!(record.second_congestion, Some(Congestion::Normal));
        assert_eq!(record.second.position.as_ref().unwrap().stops_away(), Some(4));
    }

    #[test]
    fn inactive_clears_everything() {
        let record = ArrivalRecord::build(&raw("4", "출발대기", "5분후[9번째 전]")).unwrap();

        assert!(!record.is_active());
        assert_eq!(record.first, DecodedEta::no_info());
        assert_eq!(record.second, DecodedEta::no_info());
        assert_eq!(record.first_congestion, None);
        assert_eq!(record.second_congestion, None);
        assert_eq!(record.route_number, "472");
    }

    #[test]
    fn unknown_category_is_dropped() {
        assert!(ArrivalRecord::build(&raw("42", "120", "")).is_none());
        assert!(ArrivalRecord::build(&raw("", "120", "")).is_none());
    }

    #[test]
    fn bad_ordinal_and_route_id_are_none() {
        let mut input = raw("3", "120", "");
        input.station_ord = "x".to_string();
        input.route_id = " ".to_string();

        let record = ArrivalRecord::build(&input).unwrap();
        assert_eq!(record.station_ord, None);
        assert_eq!(record.route_id, None);
    }

    #[test]
    fn build_is_reproducible() {
        let input = raw("3", "2분10초후[1번째 전]", "곧 도착");
        assert_eq!(ArrivalRecord::build(&input), ArrivalRecord::build(&input));
    }

    #[test]
    fn descended_touches_both_vehicles() {
        let record = ArrivalRecord::build(&raw("3", "120", "300")).unwrap().descended();
        assert_eq!(record.first.status, EtaStatus::CountingDown(119));
        assert_eq!(record.second.status, EtaStatus::CountingDown(299));
    }
}
