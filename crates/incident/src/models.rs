use serde::{Deserialize, Deserializer, Serialize};

/// Property name SignalFx uses to filter on a detector.
pub const DETECTOR_ID_PROPERTY: &str = "sf_detectorId";

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Response page returned by the v1 event time series search.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventTimeSeriesPage {
    /// Matching incident records
    #[serde(default, deserialize_with = "null_as_default")]
    pub rs: Vec<EventTimeSeries>,
}

/// A single active incident as reported by the v1 event time series search.
///
/// Missing or `null` fields decode to empty values so one bad record does not
/// fail the whole page; such records are dropped during normalization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventTimeSeries {
    /// Incident ID
    #[serde(rename = "sf_incidentId", default, deserialize_with = "null_as_default")]
    pub incident_id: String,
    /// Last update time in milliseconds since the Unix epoch
    #[serde(rename = "sf_updatedOnMs", default)]
    pub updated_on_ms: Option<f64>,
    /// Detector name
    #[serde(rename = "sf_detector", default, deserialize_with = "null_as_default")]
    pub detector: String,
    /// Detector ID
    #[serde(rename = "sf_detectorId", default, deserialize_with = "null_as_default")]
    pub detector_id: String,
}

/// Property filter selecting what a muting rule applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MuteFilter {
    /// Property name
    pub property: String,
    /// Property value to match
    pub property_value: String,
}

impl MuteFilter {
    /// Create a filter matching a single detector.
    pub fn detector(detector_id: &str) -> Self {
        Self { property: DETECTOR_ID_PROPERTY.to_owned(), property_value: detector_id.to_owned() }
    }
}

/// Payload for creating an alert muting rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MuteRequest {
    /// Filters selecting the muted alerts
    pub filters: Vec<MuteFilter>,
    /// Start of the muting window in milliseconds since the Unix epoch
    pub start_time: i64,
    /// End of the muting window in milliseconds since the Unix epoch
    pub stop_time: i64,
    /// Human readable reason
    pub description: String,
}

impl MuteRequest {
    /// Detector ID targeted by this request, if it filters on one.
    pub fn detector_id(&self) -> Option<&str> {
        self.filters
            .iter()
            .find(|f| f.property == DETECTOR_ID_PROPERTY)
            .map(|f| f.property_value.as_str())
    }
}
