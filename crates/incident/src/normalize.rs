use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::warn;

use crate::models::EventTimeSeries;

/// An active incident reduced to what the janitor acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleIncident {
    /// Incident ID, never empty
    pub id: String,
    /// Detector name and ID, e.g. "cpu -- det1"
    pub label: String,
    /// Last update time, truncated to whole seconds
    pub updated_at: DateTime<Utc>,
}

impl SimpleIncident {
    /// Build from a raw record. Returns `None` if the record has no incident ID or its
    /// timestamp is missing or out of range.
    pub fn from_series(series: &EventTimeSeries) -> Option<Self> {
        if series.incident_id.is_empty() {
            return None;
        }
        let secs = (series.updated_on_ms? / 1000.0).trunc();
        if !secs.is_finite() {
            return None;
        }
        let updated_at = DateTime::from_timestamp(secs as i64, 0)?;
        Some(Self {
            id: series.incident_id.clone(),
            label: format!("{} -- {}", series.detector, series.detector_id),
            updated_at,
        })
    }

    /// Time elapsed between the last update and `now`.
    pub fn age(&self, now: DateTime<Utc>) -> TimeDelta {
        now.signed_duration_since(self.updated_at)
    }
}

impl fmt::Display for SimpleIncident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (updated {})", self.label, self.updated_at.to_rfc3339())
    }
}

/// Convert raw records into simple incidents, skipping records that cannot be addressed.
pub fn normalize(series: &[EventTimeSeries]) -> Vec<SimpleIncident> {
    series
        .iter()
        .filter_map(|s| {
            let incident = SimpleIncident::from_series(s);
            if incident.is_none() {
                warn!(
                    incident_id = %s.incident_id,
                    updated_on_ms = ?s.updated_on_ms,
                    detector = %s.detector,
                    "Skipping malformed incident record"
                );
            }
            incident
        })
        .collect()
}
