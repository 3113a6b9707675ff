use std::time::Duration;

use chrono::{DateTime, Utc};
use eyre::{Result, WrapErr, bail, eyre};
use primitives::duration::{format_duration, parse_duration};
use tracing::{info, warn};

use crate::{
    client::Client,
    models::{MuteFilter, MuteRequest},
};

/// Description attached to every muting rule created by the janitor.
pub const MUTE_DESCRIPTION: &str = "Muted by signalfx-janitor";

/// Build the muting rule description, appending `info` when present.
pub fn mute_description(info: Option<&str>) -> String {
    match non_empty(info) {
        Some(info) => format!("{MUTE_DESCRIPTION}: {info}"),
        None => MUTE_DESCRIPTION.to_owned(),
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Validated parameters of the mute task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuteParams {
    /// Detector to mute
    pub detector_id: String,
    /// Length of the muting window
    pub duration: Duration,
    /// Extra context for the description
    pub info: Option<String>,
}

impl MuteParams {
    /// Validate raw task options. Detector and duration are both required.
    pub fn from_options(
        detector: Option<&str>,
        duration: Option<&str>,
        description: Option<&str>,
    ) -> Result<Self> {
        let (Some(detector_id), Some(duration)) = (non_empty(detector), non_empty(duration)) else {
            bail!("mute requires both detector and duration flags");
        };

        let duration = parse_duration(duration)
            .wrap_err_with(|| format!("invalid mute duration {duration:?}"))?;
        if duration.is_zero() {
            bail!("mute duration must be greater than zero");
        }

        Ok(Self {
            detector_id: detector_id.to_owned(),
            duration,
            info: non_empty(description).map(str::to_owned),
        })
    }

    /// Build the muting request for a window starting at `now`.
    pub fn request_at(&self, now: DateTime<Utc>) -> Result<MuteRequest> {
        let start_time = now.timestamp_millis();
        let stop_time = i64::try_from(self.duration.as_millis())
            .ok()
            .and_then(|ms| start_time.checked_add(ms))
            .ok_or_else(|| eyre!("mute duration {:?} is out of range", self.duration))?;
        Ok(MuteRequest {
            filters: vec![MuteFilter::detector(&self.detector_id)],
            start_time,
            stop_time,
            description: mute_description(self.info.as_deref()),
        })
    }
}

/// Mute a detector starting now.
pub async fn mute_detector(client: &Client, params: &MuteParams, dry_run: bool) -> Result<()> {
    let request = params.request_at(Utc::now())?;
    let duration = format_duration(params.duration);

    if dry_run {
        warn!(
            detector_id = %params.detector_id,
            duration = %duration,
            description = %request.description,
            "Dry run - would mute detector"
        );
        return Ok(());
    }

    client.mute_detector(&request).await?;
    info!(
        detector_id = %params.detector_id,
        duration = %duration,
        start_time = request.start_time,
        stop_time = request.stop_time,
        "Muted detector"
    );
    Ok(())
}
