//! Serde adapter storing a `Duration` as whole milliseconds
//!
//! Accumulated pause/rest/reader-writer totals are persisted as plain
//! integers so that exported session files stay readable.
//!
//! ```ignore
//! #[serde(with = "examclock_util::millis")]
//! pub pause_duration_total: Duration,
//! ```

use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
    serializer.serialize_u64(millis)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = u64::deserialize(deserializer)?;
    Ok(Duration::from_millis(millis))
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Holder {
        #[serde(with = "super")]
        taken: Duration,
    }

    #[test]
    fn writes_whole_milliseconds() {
        let holder = Holder {
            taken: Duration::from_millis(300_250),
        };
        let json = serde_json::to_string(&holder).unwrap();
        assert_eq!(json, r#"{"taken":300250}"#);
    }

    #[test]
    fn reads_whole_milliseconds() {
        let holder: Holder = serde_json::from_str(r#"{"taken":90000}"#).unwrap();
        assert_eq!(holder.taken, Duration::from_secs(90));
    }
}
