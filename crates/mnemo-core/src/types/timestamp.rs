// Copyright 2026 The Mnemo Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Display;
use std::fmt::Formatter;

use chrono::DateTime;
use serde::Deserialize;
use serde::Serialize;

use crate::types::date::Date;

const MILLIS_PER_MINUTE: i64 = 60_000;
const MILLIS_PER_DAY: i64 = 86_400_000;

/// An instant in time, stored as milliseconds since the Unix epoch in UTC.
///
/// Scheduling arithmetic works on the raw integer, so results are identical
/// across platforms and independent of the host timezone.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub fn as_unix_millis(self) -> i64 {
        self.0
    }

    /// The current instant.
    #[cfg(feature = "clock")]
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis())
    }

    /// The UTC calendar date this instant falls on.
    pub fn date(self) -> Date {
        Date::from_unix_days(self.0.div_euclid(MILLIS_PER_DAY) as i32)
    }

    pub fn plus_minutes(self, minutes: u32) -> Self {
        Self(self.0 + minutes as i64 * MILLIS_PER_MINUTE)
    }

    pub fn plus_millis(self, millis: i64) -> Self {
        Self(self.0 + millis)
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match DateTime::from_timestamp_millis(self.0) {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.3fZ")),
            None => write!(f, "{}ms", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_component() {
        // 2024-01-01T12:00:00Z
        let ts = Timestamp::from_unix_millis(1_704_110_400_000);
        assert_eq!(ts.date().to_string(), "2024-01-01");
    }

    #[test]
    fn test_date_component_before_epoch() {
        let ts = Timestamp::from_unix_millis(-1);
        assert_eq!(ts.date().to_string(), "1969-12-31");
    }

    #[test]
    fn test_plus_minutes() {
        let ts = Timestamp::from_unix_millis(0);
        assert_eq!(ts.plus_minutes(10).as_unix_millis(), 600_000);
    }

    #[test]
    fn test_display() {
        let ts = Timestamp::from_unix_millis(1_704_110_400_123);
        assert_eq!(ts.to_string(), "2024-01-01T12:00:00.123Z");
    }

    #[test]
    fn test_serialize_as_integer() {
        let ts = Timestamp::from_unix_millis(42);
        assert_eq!(serde_json::to_string(&ts).unwrap(), "42");
        let back: Timestamp = serde_json::from_str("42").unwrap();
        assert_eq!(back, ts);
    }
}
