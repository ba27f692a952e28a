//! Store-native timestamp type
//!
//! The document store hands out timestamps as a `(seconds, nanoseconds)` pair.
//! The read path converts them to [`chrono::DateTime<Utc>`] for consumers.
//!
//! ## Precision
//!
//! Conversion keeps whole seconds only: the date is computed as
//! `seconds * 1000` milliseconds since the Unix epoch and the nanosecond
//! component is dropped. This is enough for display purposes.
//!
//! ```
//! use catalog_core::StoreTimestamp;
//!
//! let ts = StoreTimestamp::new(1_700_000_000, 999_999_999);
//! let date = ts.to_date().unwrap();
//! assert_eq!(date.timestamp_millis(), 1_700_000_000_000);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// JSON key holding the seconds component
pub const SECONDS_KEY: &str = "seconds";
/// JSON key holding the nanoseconds component
pub const NANOSECONDS_KEY: &str = "nanoseconds";

/// Timestamp as stored by the document store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StoreTimestamp {
    /// Seconds since Unix epoch
    pub seconds: i64,
    /// Sub-second component, `0..1_000_000_000`
    pub nanoseconds: u32,
}

impl StoreTimestamp {
    /// Unix epoch
    pub const EPOCH: StoreTimestamp = StoreTimestamp {
        seconds: 0,
        nanoseconds: 0,
    };

    // =========================================================================
    // Constructors
    // =========================================================================

    /// Create a timestamp; nanoseconds above one second are clamped
    pub fn new(seconds: i64, nanoseconds: u32) -> Self {
        StoreTimestamp {
            seconds,
            nanoseconds: nanoseconds.min(999_999_999),
        }
    }

    /// Current time
    pub fn now() -> Self {
        Self::from_date(Utc::now())
    }

    /// Timestamp for a date, keeping sub-second precision
    pub fn from_date(date: DateTime<Utc>) -> Self {
        StoreTimestamp {
            seconds: date.timestamp(),
            nanoseconds: date.timestamp_subsec_nanos().min(999_999_999),
        }
    }

    // =========================================================================
    // Conversion
    // =========================================================================

    /// Milliseconds since epoch used for the normalized date (nanos discarded)
    pub fn millis(&self) -> i64 {
        self.seconds.saturating_mul(1000)
    }

    /// Normalized date, or `None` when out of chrono's range
    pub fn to_date(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.millis())
    }

    /// Parse the duck-typed JSON shape `{"seconds": n, "nanoseconds": n}`
    ///
    /// The object must carry exactly those two integer keys.
    pub fn from_json(json: &serde_json::Value) -> Option<Self> {
        let map = json.as_object()?;
        if map.len() != 2 {
            return None;
        }
        let seconds = map.get(SECONDS_KEY)?.as_i64()?;
        let nanoseconds = map.get(NANOSECONDS_KEY)?.as_u64()?;
        let nanoseconds = u32::try_from(nanoseconds).ok()?;
        Some(StoreTimestamp::new(seconds, nanoseconds))
    }

    /// JSON shape used by the store
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            SECONDS_KEY: self.seconds,
            NANOSECONDS_KEY: self.nanoseconds,
        })
    }
}

impl fmt::Display for StoreTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanoseconds)
    }
}

impl From<DateTime<Utc>> for StoreTimestamp {
    fn from(date: DateTime<Utc>) -> Self {
        StoreTimestamp::from_date(date)
    }
}

// ============================================================================
// Tests
// ============================================================================
