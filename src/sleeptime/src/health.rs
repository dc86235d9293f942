use std::future::Future;

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sleeptime_types::SleepPeriod;

/// Uploads sleep periods to an external health record store.
pub trait HealthExporter {
    fn export(&self, period: &SleepPeriod) -> impl Future<Output = anyhow::Result<()>> + Send;
}

#[derive(Serialize, Debug, PartialEq)]
struct SleepSample {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    value: &'static str,
}

impl From<&SleepPeriod> for SleepSample {
    fn from(period: &SleepPeriod) -> Self {
        Self {
            start: period.start(),
            end: period.end(),
            value: "asleepUnspecified",
        }
    }
}

/// Posts each period as a JSON sleep sample to a configured endpoint.
pub struct HttpHealthExporter {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpHealthExporter {
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            token,
        }
    }
}

impl HealthExporter for HttpHealthExporter {
    async fn export(&self, period: &SleepPeriod) -> anyhow::Result<()> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&SleepSample::from(period));

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let resp = request
            .send()
            .await
            .context("failed to reach health export endpoint")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("health export failed ({status}): {body}");
        }

        info!(
            "exported sleep {} -> {} to {}",
            period.start(),
            period.end(),
            self.endpoint
        );
        Ok(())
    }
}
