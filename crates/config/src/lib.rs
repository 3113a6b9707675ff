//! signalfx-janitor configuration
use clap::{Parser, ValueEnum};
use url::Url;

/// Default SignalFx REST API endpoint.
pub const DEFAULT_SFX_API_URL: &str = "https://api.signalfx.com/";

/// SignalFx API configuration options
#[derive(Debug, Clone, Parser)]
pub struct SignalFxOpts {
    /// SignalFx org access token
    #[clap(long = "sfx-token", env = "SFX_TOKEN", hide_env_values = true)]
    pub token: String,
    /// SignalFx organization ID
    #[clap(long = "sfx-org-id", env = "SFX_ORG_ID")]
    pub org_id: String,
    /// SignalFx API base URL
    #[clap(long = "sfx-api-url", env = "SFX_API_URL", default_value = DEFAULT_SFX_API_URL)]
    pub api_url: Url,
}

/// Workflow to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Task {
    /// Clear incidents that have not been updated recently
    #[default]
    Stale,
    /// Mute a detector for a period of time
    Mute,
}

/// CLI options for signalfx-janitor
#[derive(Debug, Clone, Parser)]
#[clap(name = "signalfx-janitor", about = "Clears stale SignalFx incidents and mutes detectors")]
pub struct Opts {
    /// SignalFx API configuration
    #[clap(flatten)]
    pub signalfx: SignalFxOpts,

    /// Task to run
    #[clap(long, env = "JANITOR_TASK", value_enum, default_value_t = Task::Stale)]
    pub task: Task,

    /// Detector ID to mute (mute task only)
    #[clap(long, env = "JANITOR_DETECTOR")]
    pub detector: Option<String>,

    /// How long to mute the detector for, e.g. "45m" or "1h30m" (mute task only)
    #[clap(long, env = "JANITOR_DURATION")]
    pub duration: Option<String>,

    /// Extra context appended to the mute description (mute task only)
    #[clap(long, env = "JANITOR_DESCRIPTION")]
    pub description: Option<String>,

    /// Keep clearing the remaining incidents when one clear fails
    #[clap(long, env = "JANITOR_CONTINUE_ON_ERROR")]
    pub continue_on_error: bool,

    /// Log the write calls that would be made without sending them
    #[clap(long, env = "JANITOR_DRY_RUN")]
    pub dry_run: bool,
}
