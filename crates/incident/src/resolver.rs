use chrono::{DateTime, TimeDelta, Utc};
use eyre::Result;
use primitives::duration::format_duration;
use tracing::{error, info, warn};

use crate::{client::Client, normalize::SimpleIncident};

/// Incidents not updated for this many minutes are cleared.
pub const STALE_AFTER_MINUTES: i64 = 30;

/// What to do when clearing one incident fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort on the first failure.
    #[default]
    FailFast,
    /// Log the failure and move on to the next incident.
    ContinueOnError,
}

/// Outcome of a resolution pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolveSummary {
    /// Incidents looked at
    pub inspected: usize,
    /// Incidents old enough to clear
    pub stale: usize,
    /// Incidents successfully cleared
    pub cleared: usize,
    /// Clear calls that failed (continue-on-error only)
    pub failed: usize,
}

/// Returns true if `incident` was last updated more than [`STALE_AFTER_MINUTES`] before `now`.
pub fn is_stale(incident: &SimpleIncident, now: DateTime<Utc>) -> bool {
    incident.updated_at < now - TimeDelta::minutes(STALE_AFTER_MINUTES)
}

/// Clears stale incidents one at a time, in list order.
#[derive(Debug)]
pub struct Resolver<'a> {
    client: &'a Client,
    policy: FailurePolicy,
    dry_run: bool,
}

impl<'a> Resolver<'a> {
    /// Create a fail-fast resolver that issues clear calls.
    pub const fn new(client: &'a Client) -> Self {
        Self { client, policy: FailurePolicy::FailFast, dry_run: false }
    }

    /// Set the failure policy.
    pub const fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Log stale incidents instead of clearing them.
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Clear every incident that is stale relative to `now`.
    pub async fn resolve(
        &self,
        incidents: &[SimpleIncident],
        now: DateTime<Utc>,
    ) -> Result<ResolveSummary> {
        let mut summary = ResolveSummary::default();
        for incident in incidents {
            summary.inspected += 1;
            let stale = is_stale(incident, now);
            let age = incident.age(now).to_std().map(format_duration).unwrap_or_default();
            info!(
                incident_id = %incident.id,
                label = %incident.label,
                age = %age,
                should_auto_resolve = stale,
                "Incident"
            );
            if !stale {
                continue;
            }
            summary.stale += 1;

            if self.dry_run {
                warn!(incident_id = %incident.id, "Dry run - would clear incident");
                continue;
            }

            match self.client.clear_incident(&incident.id).await {
                Ok(()) => {
                    summary.cleared += 1;
                    info!(incident_id = %incident.id, "Cleared incident");
                }
                Err(e) => match self.policy {
                    FailurePolicy::FailFast => {
                        return Err(e.wrap_err(format!("error resolving incident {}", incident.id)));
                    }
                    FailurePolicy::ContinueOnError => {
                        summary.failed += 1;
                        error!(incident_id = %incident.id, error = %e, "Failed to clear incident");
                    }
                },
            }
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use mockito::Server;

    fn incident(id: &str, updated_at: DateTime<Utc>) -> SimpleIncident {
        SimpleIncident { id: id.to_owned(), label: format!("cpu -- {id}"), updated_at }
    }

    fn client_for(server: &Server) -> Client {
        Client::new("test_token".to_owned(), "test_org".to_owned(), server.url().parse().unwrap())
    }

    #[test]
    fn staleness_threshold_is_strict() {
        let now = Utc::now();
        assert!(is_stale(&incident("old", now - TimeDelta::minutes(31)), now));
        assert!(!is_stale(&incident("edge", now - TimeDelta::minutes(30)), now));
        assert!(!is_stale(&incident("fresh", now - TimeDelta::minutes(5)), now));
        assert!(!is_stale(&incident("future", now + TimeDelta::minutes(5)), now));
    }

    #[tokio::test]
    async fn clears_only_stale_incidents() {
        let mut server = Server::new_async().await;
        let old = server
            .mock("PUT", "/v2/incident/old/clear")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;
        let fresh = server
            .mock("PUT", "/v2/incident/fresh/clear")
            .with_status(200)
            .expect(0)
            .create_async()
            .await;

        let now = Utc::now();
        let incidents =
            [incident("old", now - TimeDelta::hours(2)), incident("fresh", now - TimeDelta::minutes(1))];
        let client = client_for(&server);
        let summary = Resolver::new(&client).resolve(&incidents, now).await.unwrap();

        assert_eq!(summary, ResolveSummary { inspected: 2, stale: 1, cleared: 1, failed: 0 });
        old.assert_async().await;
        fresh.assert_async().await;
    }

    #[tokio::test]
    async fn fail_fast_stops_at_first_failure() {
        let mut server = Server::new_async().await;
        let first = server
            .mock("PUT", "/v2/incident/first/clear")
            .with_status(500)
            .with_body("boom")
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("PUT", "/v2/incident/second/clear")
            .with_status(200)
            .expect(0)
            .create_async()
            .await;

        let now = Utc::now();
        let incidents =
            [incident("first", now - TimeDelta::hours(1)), incident("second", now - TimeDelta::hours(1))];
        let client = client_for(&server);
        let err = Resolver::new(&client).resolve(&incidents, now).await.unwrap_err();

        assert_eq!(err.to_string(), "error resolving incident first");
        assert!(format!("{err:?}").contains("500"));
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn continue_on_error_clears_the_rest() {
        let mut server = Server::new_async().await;
        let first = server
            .mock("PUT", "/v2/incident/first/clear")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("PUT", "/v2/incident/second/clear")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let now = Utc::now();
        let incidents =
            [incident("first", now - TimeDelta::hours(1)), incident("second", now - TimeDelta::hours(1))];
        let client = client_for(&server);
        let summary = Resolver::new(&client)
            .with_policy(FailurePolicy::ContinueOnError)
            .resolve(&incidents, now)
            .await
            .unwrap();

        assert_eq!(summary, ResolveSummary { inspected: 2, stale: 2, cleared: 1, failed: 1 });
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn dry_run_sends_nothing() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", mockito::Matcher::Any)
            .with_status(200)
            .expect(0)
            .create_async()
            .await;

        let now = Utc::now();
        let incidents = [incident("old", now - TimeDelta::hours(3))];
        let client = client_for(&server);
        let summary =
            Resolver::new(&client).with_dry_run(true).resolve(&incidents, now).await.unwrap();

        assert_eq!(summary, ResolveSummary { inspected: 1, stale: 1, cleared: 0, failed: 0 });
        mock.assert_async().await;
    }
}
