//! Arrival feed response DTOs.
//!
//! These types map directly to the bus information API's JSON responses
//! (`resultType=json`). Every field is a string in the feed, and fields are
//! omitted rather than nulled, so everything defaults to empty.

use serde::Deserialize;

/// Envelope shared by every feed endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse<T> {
    pub msg_header: MsgHeader,
    #[serde(default = "MsgBody::empty")]
    pub msg_body: MsgBody<T>,
}

/// Result code of a feed call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MsgHeader {
    /// `"0"` on success, `"4"` when the query matched nothing.
    pub header_cd: String,
    #[serde(default)]
    pub header_msg: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MsgBody<T> {
    /// `null` or absent when the query matched nothing.
    pub item_list: Option<Vec<T>>,
}

impl<T> MsgBody<T> {
    fn empty() -> Self {
        Self { item_list: None }
    }
}

/// One route's arrival snapshot at a station (`getStationByUid` item).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawArrivalRecord {
    /// Route category code, e.g. `"3"` for a trunk route.
    #[serde(rename = "routeType", default)]
    pub route_type: String,

    /// Congestion code of the first approaching vehicle.
    #[serde(default)]
    pub congestion: String,

    /// Name of the stop after this one.
    #[serde(rename = "nxtStn", default)]
    pub next_station: String,

    /// Route number shown to passengers, e.g. `"472"`.
    #[serde(rename = "rtNm", default)]
    pub route_number: String,

    /// Position of this station in the route's stop sequence.
    #[serde(rename = "staOrd", default)]
    pub station_ord: String,

    #[serde(rename = "busRouteId", default)]
    pub route_id: String,

    /// Encoded arrival message for the first approaching vehicle.
    #[serde(rename = "arrmsg1", default)]
    pub first_arrival: String,

    /// Encoded arrival message for the second approaching vehicle.
    #[serde(rename = "arrmsg2", default)]
    pub second_arrival: String,
}

/// A vehicle's current position (`getBusPosByVehId` item).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BusPosition {
    #[serde(rename = "vehId", default)]
    pub vehicle_id: String,

    /// Licence plate.
    #[serde(rename = "plainNo", default)]
    pub plate_number: String,

    /// Id of the stop the vehicle last passed.
    #[serde(rename = "stId", default)]
    pub last_stop_id: String,

    /// Ordinal of that stop on the route.
    #[serde(rename = "stOrd", default)]
    pub last_stop_ord: String,

    /// Feed timestamp, `yyyyMMddHHmmss`.
    #[serde(rename = "dataTm", default)]
    pub data_time: String,
}
