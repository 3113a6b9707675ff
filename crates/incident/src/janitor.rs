use chrono::Utc;
use config::{Opts, Task};
use eyre::{Result, bail};
use tracing::info;

use crate::{
    client::Client,
    mute::{MuteParams, mute_detector},
    normalize::normalize,
    resolver::{FailurePolicy, ResolveSummary, Resolver},
};

/// Runs the configured janitor task against SignalFx.
#[derive(Debug)]
pub struct Janitor {
    client: Client,
    opts: Opts,
}

impl Janitor {
    /// Create a janitor, building the API client from the configured credentials.
    pub fn new(opts: Opts) -> Self {
        let client = Client::new(
            opts.signalfx.token.clone(),
            opts.signalfx.org_id.clone(),
            opts.signalfx.api_url.clone(),
        );
        Self { client, opts }
    }

    /// Run the selected task to completion.
    pub async fn run(&self) -> Result<()> {
        match self.opts.task {
            Task::Stale => self.resolve_stale().await.map(|_| ()),
            Task::Mute => self.mute().await,
        }
    }

    /// Clear every active incident that has gone stale.
    pub async fn resolve_stale(&self) -> Result<ResolveSummary> {
        let series = self.client.list_active_incidents().await?;
        let incidents = normalize(&series);
        info!("Found {} incidents", incidents.len());

        let policy = if self.opts.continue_on_error {
            FailurePolicy::ContinueOnError
        } else {
            FailurePolicy::FailFast
        };
        let summary = Resolver::new(&self.client)
            .with_policy(policy)
            .with_dry_run(self.opts.dry_run)
            .resolve(&incidents, Utc::now())
            .await?;

        info!(
            inspected = summary.inspected,
            stale = summary.stale,
            cleared = summary.cleared,
            failed = summary.failed,
            dry_run = self.opts.dry_run,
            "Stale incident pass finished"
        );
        if summary.failed > 0 {
            bail!("failed to clear {} of {} stale incidents", summary.failed, summary.stale);
        }
        Ok(summary)
    }

    /// Mute the configured detector for the configured duration.
    pub async fn mute(&self) -> Result<()> {
        let params = MuteParams::from_options(
            self.opts.detector.as_deref(),
            self.opts.duration.as_deref(),
            self.opts.description.as_deref(),
        )?;
        mute_detector(&self.client, &params, self.opts.dry_run).await
    }
}
