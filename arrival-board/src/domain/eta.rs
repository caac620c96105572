//! Arrival-time codec.
//!
//! The feed reports each approaching vehicle as a short message made of a
//! time component optionally followed by a bracketed position component,
//! for example `2분10초후[1번째 전]` ("in 2 min 10 s, 1 stop away").
//!
//! Besides genuine countdowns, the time component can be one of a few
//! sentinels:
//!
//! | time component              | decoded status      |
//! |-----------------------------|---------------------|
//! | `곧 도착`, `0`               | [`EtaStatus::Imminent`] |
//! | `도착`, `회차지 도착`          | [`EtaStatus::Arriving`] |
//! | `운행종료`, `출발대기`, `정보없음` | [`EtaStatus::NoInfo`]   |
//! | `N분M초후`, `N분후`, `M초후`, `N` | [`EtaStatus::CountingDown`] |
//!
//! Decoding never fails: anything unrecognised is treated as "no
//! information", since the feed's encoding is not independently validated.

use std::fmt;

use tracing::trace;

/// The time component of a decoded arrival message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EtaStatus {
    /// No usable estimate (service ended, not yet departed, or unparseable).
    NoInfo,
    /// The vehicle is about to arrive.
    Imminent,
    /// The vehicle is standing at a reportable stop.
    Arriving,
    /// Seconds until arrival.
    CountingDown(u32),
}

impl EtaStatus {
    /// Whether this status carries live arrival information.
    pub fn is_usable(&self) -> bool {
        !matches!(self, EtaStatus::NoInfo)
    }

    /// One second later: countdowns decrease by one, clamped at zero.
    ///
    /// All other statuses are returned unchanged.
    pub fn descended(self) -> Self {
        match self {
            EtaStatus::CountingDown(secs) => EtaStatus::CountingDown(secs.saturating_sub(1)),
            other => other,
        }
    }
}

impl fmt::Display for EtaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtaStatus::NoInfo => f.write_str("no info"),
            EtaStatus::Imminent => f.write_str("imminent"),
            EtaStatus::Arriving => f.write_str("arriving"),
            EtaStatus::CountingDown(secs) => write!(f, "{}m{:02}s", secs / 60, secs % 60),
        }
    }
}

/// Where the vehicle is relative to this station, e.g. `3번째 전`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelativePosition(String);

impl RelativePosition {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of stops between the vehicle and this station, if the marker
    /// starts with one.
    pub fn stops_away(&self) -> Option<u32> {
        let digits: String = self.0.chars().take_while(|c| c.is_ascii_digit()).collect();
        digits.parse().ok()
    }
}

impl fmt::Display for RelativePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A decoded arrival message for one approaching vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecodedEta {
    pub status: EtaStatus,
    /// Only present for genuine countdowns.
    pub position: Option<RelativePosition>,
}

impl DecodedEta {
    /// The cleared value used for vehicles without information.
    pub fn no_info() -> Self {
        Self {
            status: EtaStatus::NoInfo,
            position: None,
        }
    }

    /// Decode one raw arrival message.
    ///
    /// # Examples
    ///
    /// ```
    /// use arrival_board::domain::{DecodedEta, EtaStatus};
    ///
    /// let eta = DecodedEta::decode("2분10초후[1번째 전]");
    /// assert_eq!(eta.status, EtaStatus::CountingDown(130));
    /// assert_eq!(eta.position.unwrap().stops_away(), Some(1));
    ///
    /// assert_eq!(DecodedEta::decode("곧 도착").status, EtaStatus::Imminent);
    /// assert!(!DecodedEta::decode("운행종료").is_usable());
    /// ```
    pub fn decode(raw: &str) -> Self {
        let Some((time, position)) = split_message(raw) else {
            trace!(raw, "malformed arrival message");
            return Self::no_info();
        };

        let compact: String = time.chars().filter(|c| !c.is_whitespace()).collect();
        let status = match compact.as_str() {
            "" | "운행종료" | "출발대기" | "정보없음" => EtaStatus::NoInfo,
            "곧도착" | "0" => EtaStatus::Imminent,
            "도착" | "회차지도착" => EtaStatus::Arriving,
            other => match parse_countdown(other) {
                Some(secs) => EtaStatus::CountingDown(secs),
                None => {
                    trace!(raw, "unrecognised arrival time");
                    EtaStatus::NoInfo
                }
            },
        };

        let position = match status {
            EtaStatus::CountingDown(_) => position
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(|p| RelativePosition(p.to_string())),
            _ => None,
        };

        Self { status, position }
    }

    pub fn is_usable(&self) -> bool {
        self.status.is_usable()
    }

    /// One countdown step later; the position marker is kept.
    pub fn descended(&self) -> Self {
        Self {
            status: self.status.descended(),
            position: self.position.clone(),
        }
    }
}

/// Split a message into its time component and optional bracket body.
///
/// Returns `None` for an unclosed bracket or trailing text after it.
fn split_message(raw: &str) -> Option<(&str, Option<&str>)> {
    match raw.split_once('[') {
        None => Some((raw, None)),
        Some((time, rest)) => {
            let (body, trailing) = rest.split_once(']')?;
            if !trailing.trim().is_empty() {
                return None;
            }
            Some((time, Some(body)))
        }
    }
}

/// Parse `N분M초후`, `N분후`, `M초후`, or a bare number of seconds.
fn parse_countdown(s: &str) -> Option<u32> {
    if let Some(secs) = parse_digits(s) {
        return Some(secs);
    }

    let body = s.strip_suffix('후')?;
    let (mins, rest) = match body.split_once('분') {
        Some((mins, rest)) => (parse_digits(mins)?, rest),
        None => (0, body),
    };
    let secs = if rest.is_empty() && body.contains('분') {
        0
    } else {
        parse_digits(rest.strip_suffix('초')?)?
    };

    mins.checked_mul(60)?.checked_add(secs)
}

fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Decoding arbitrary text never panics
        #[test]
        fn decode_never_panics(s in ".*") {
            let _ = DecodedEta::decode(&s);
        }

        /// Minute/second messages decode to the matching number of seconds
        #[test]
        fn minutes_seconds_roundtrip(m in 1u32..120, s in 0u32..60, stops in 1u32..30) {
            let raw = format!("{m}분{s}초후[{stops}번째 전]");
            let eta = DecodedEta::decode(&raw);
            prop_assert_eq!(eta.status, EtaStatus::CountingDown(m * 60 + s));
            prop_assert_eq!(eta.position.and_then(|p| p.stops_away()), Some(stops));
        }

        /// Descending never increases a countdown and never goes below zero
        #[test]
        fn descend_monotone(n in 0u32..100_000) {
            match EtaStatus::CountingDown(n).descended() {
                EtaStatus::CountingDown(m) => prop_assert!(m == n.saturating_sub(1)),
                other => prop_assert!(false, "unexpected {:?}", other),
            }
        }
    }
}
