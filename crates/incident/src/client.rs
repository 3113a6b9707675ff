use eyre::{Result, WrapErr, bail, eyre};
use reqwest::{Client as HttpClient, RequestBuilder, Response, StatusCode, header::CONTENT_TYPE};
use tracing::{debug, error};
use url::Url;

use crate::models::{EventTimeSeries, EventTimeSeriesPage, MuteRequest};

/// Header carrying the org access token.
pub const TOKEN_HEADER: &str = "X-SF-TOKEN";
/// Event time series search, used to list active incidents.
pub const EVENT_TIME_SERIES_PATH: &str = "v1/eventtimeseries";
/// Incident resource prefix; the incident ID and action are appended.
pub const INCIDENT_PATH: &str = "v2/incident/";
/// Alert muting rules.
pub const ALERT_MUTING_PATH: &str = "v2/alertmuting";
/// Maximum number of incidents returned by [`Client::list_active_incidents`].
///
/// Only the first page is requested; incidents beyond this cap are not seen.
pub const LIST_LIMIT: u32 = 500;
/// Highest priority first, then most recently changed.
pub const LIST_ORDER: &str = "-sf_priority,-sf_anomalyStateUpdateTimestampMs";

/// Client for interacting with the SignalFx API.
#[derive(Debug, Clone)]
pub struct Client {
    http: HttpClient,
    token: String,
    org_id: String,
    base_url: Url,
}

impl Client {
    /// Create a new SignalFx API client rooted at `base_url`.
    ///
    /// A trailing slash is added to the base path if missing so endpoints resolve below it.
    pub fn new(token: String, org_id: String, mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { http: HttpClient::new(), token, org_id, base_url }
    }

    /// Authenticate the request.
    fn auth(&self, rb: RequestBuilder) -> RequestBuilder {
        rb.header(TOKEN_HEADER, &self.token)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).wrap_err_with(|| format!("invalid endpoint path {path}"))
    }

    /// Search query selecting the organization's open, anomalous incidents.
    pub fn active_incidents_query(&self) -> String {
        format!(
            r#"sf_organizationID:{} AND (NOT sf_archived:true) AND ((((sf_anomalyState:("anomalous" "too high" "too low"))) AND (sf_detector.lowercase:* OR sf_displayName.lowercase:*)))"#,
            self.org_id
        )
    }

    /// List active incidents, highest priority first.
    pub async fn list_active_incidents(&self) -> Result<Vec<EventTimeSeries>> {
        let url = self.endpoint(EVENT_TIME_SERIES_PATH)?;
        let query = self.active_incidents_query();
        let limit = LIST_LIMIT.to_string();
        let resp = self
            .auth(self.http.get(url))
            .query(&[
                ("query", query.as_str()),
                ("offset", "0"),
                ("limit", limit.as_str()),
                ("order_by", LIST_ORDER),
            ])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            error!(%status, body = %body, "Listing incidents failed");
            bail!("error listing incidents, got status code {}: {}", status.as_u16(), body);
        }

        let page: EventTimeSeriesPage =
            serde_json::from_str(&body).wrap_err("failed to decode incident list")?;
        debug!(count = page.rs.len(), "Fetched active incidents");
        Ok(page.rs)
    }

    /// Clear (resolve) an incident. Works for v1 and v2 detectors.
    pub async fn clear_incident(&self, id: &str) -> Result<()> {
        let mut url = self.endpoint(INCIDENT_PATH)?;
        url.path_segments_mut()
            .map_err(|_| eyre!("base URL {} cannot carry a path", self.base_url))?
            .pop_if_empty()
            .extend([id, "clear"]);

        let resp = self
            .auth(self.http.put(url))
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;
        expect_status(resp, StatusCode::OK, || format!("error clearing incident {id}")).await
    }

    /// Create a muting rule. Works for v1 and v2 detectors.
    pub async fn mute_detector(&self, body: &MuteRequest) -> Result<()> {
        let url = self.endpoint(ALERT_MUTING_PATH)?;
        let resp = self.auth(self.http.post(url)).json(body).send().await?;
        expect_status(resp, StatusCode::CREATED, || {
            format!("error muting detector {}", body.detector_id().unwrap_or_default())
        })
        .await
    }
}

/// Fail unless `resp` has the `expected` status, reporting the body for diagnostics.
async fn expect_status(
    resp: Response,
    expected: StatusCode,
    context: impl FnOnce() -> String,
) -> Result<()> {
    let status = resp.status();
    if status == expected {
        return Ok(());
    }
    let body = resp.text().await?;
    let context = context();
    error!(%status, body = %body, "{context}");
    bail!("{context}, got status code {}: {body}", status.as_u16())
}
