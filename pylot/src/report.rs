//! Best-effort delivery of what was seen in each system.

use crate::errors::PilotError;
use crate::types::Resolution;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// One observation, as posted to the collector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationReport {
    pub system: Resolution,
    #[serde(rename = "probe")]
    pub probe_contacts: Vec<String>,
    #[serde(rename = "dscan")]
    pub dscan_contacts: Vec<String>,
    #[serde(rename = "key")]
    pub auth_key: String,
}

impl ObservationReport {
    pub fn new(system: Resolution, probe_text: &str, dscan_text: &str, auth_key: &str) -> Self {
        Self {
            system,
            probe_contacts: clean_lines(probe_text),
            dscan_contacts: clean_lines(dscan_text),
            auth_key: auth_key.to_string(),
        }
    }
}

/// Trimmed, non-blank lines of `text`, in order.
pub fn clean_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Destination for observation reports.
#[async_trait::async_trait]
pub trait ReportSink: Send + Sync {
    async fn send(&self, report: &ObservationReport) -> Result<(), PilotError>;
}

/// Posts reports as JSON to the collector endpoint.
pub struct HttpReportSink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpReportSink {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, PilotError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PilotError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait::async_trait]
impl ReportSink for HttpReportSink {
    #[instrument(level = "debug", skip(self, report))]
    async fn send(&self, report: &ObservationReport) -> Result<(), PilotError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(report)
            .send()
            .await
            .map_err(|e| PilotError::Report(format!("POST {} failed: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PilotError::Report(format!(
                "Collector at {} answered {status}",
                self.endpoint
            )));
        }
        debug!(%status, "Collector accepted report");
        Ok(())
    }
}

/// Builds a report per cycle and hands it to the sink.
///
/// Delivery failures are logged and returned for inspection, never retried.
pub struct ReportEmitter {
    sink: Box<dyn ReportSink>,
    key: String,
}

impl ReportEmitter {
    pub fn new(sink: Box<dyn ReportSink>, key: impl Into<String>) -> Self {
        Self {
            sink,
            key: key.into(),
        }
    }

    pub async fn emit(
        &self,
        position: &Resolution,
        probe_text: &str,
        dscan_text: &str,
    ) -> Result<(), PilotError> {
        let report = ObservationReport::new(position.clone(), probe_text, dscan_text, &self.key);
        debug!(
            probe = report.probe_contacts.len(),
            dscan = report.dscan_contacts.len(),
            "Sending report for {}",
            position
        );

        let result = self.sink.send(&report).await;
        match &result {
            Ok(()) => info!("Report sent for {}", position),
            Err(e) => warn!("Report for {} not delivered: {}", position, e),
        }
        result
    }
}
