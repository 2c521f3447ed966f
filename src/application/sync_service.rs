// Sync service - backlog restore and change feed polling into the chart
use crate::application::chart_service::ChartService;
use crate::application::document_repository::DocumentRepository;
use crate::domain::doc;
use futures::StreamExt;
use futures::stream::Stream;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

const BACKOFF_BASE: Duration = Duration::from_secs(1);
const BACKOFF_MAX: Duration = Duration::from_secs(60);

/// Exponential retry delay: doubles per failure up to a cap.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            current: base,
        }
    }

    /// Delay to wait before the next attempt.
    pub fn next(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.base;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(BACKOFF_BASE, BACKOFF_MAX)
    }
}

/// One page of the change feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangesPage {
    pub docs: Vec<Value>,
    pub last_seq: String,
}

impl ChangesPage {
    fn from_json(body: &Value, since: &str) -> Self {
        let docs = body["results"]
            .as_array()
            .map(|results| {
                results
                    .iter()
                    .filter(|change| !change["deleted"].as_bool().unwrap_or(false))
                    .filter_map(|change| change.get("doc").cloned())
                    .collect()
            })
            .unwrap_or_default();
        Self {
            docs,
            last_seq: seq_to_string(&body["last_seq"]).unwrap_or_else(|| since.to_string()),
        }
    }
}

/// Sequence ids are opaque strings on CouchDB 2+ and integers before that.
fn seq_to_string(seq: &Value) -> Option<String> {
    match seq {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub struct SyncService {
    repository: Arc<dyn DocumentRepository>,
    chart: Arc<ChartService>,
    remote: Option<String>,
    poll_interval: Duration,
}

impl SyncService {
    pub fn new(
        repository: Arc<dyn DocumentRepository>,
        chart: Arc<ChartService>,
        remote: Option<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            repository,
            chart,
            remote,
            poll_interval,
        }
    }

    /// Replicate from the remote (when configured), load every stored document
    /// into the chart and return the sequence to follow changes from.
    pub async fn bootstrap(&self) -> anyhow::Result<String> {
        if let Some(remote) = &self.remote {
            match self.repository.sync(remote).await {
                Ok(()) => tracing::info!("Replicated from {}", remote),
                Err(e) => tracing::warn!("Replication from {} failed: {:#}", remote, e),
            }
        }

        let info = self.repository.get("").await?;
        let since = seq_to_string(&info["update_seq"]).unwrap_or_else(|| "0".to_string());

        let raw = self.repository.restore().await?;
        let docs = doc::parse_batch(&raw);
        tracing::info!(
            "Restored {} documents ({} telemetry), following changes from {}",
            raw.len(),
            docs.len(),
            since
        );
        if doc::is_recipe_running(&docs) {
            tracing::info!("A recipe is running");
        }
        self.chart.ingest_docs(docs).await;
        Ok(since)
    }

    async fn poll(&self, since: &str) -> anyhow::Result<ChangesPage> {
        let path = format!(
            "_changes?include_docs=true&since={}",
            urlencoding::encode(since)
        );
        let body = self.repository.get(&path).await?;
        Ok(ChangesPage::from_json(&body, since))
    }

    /// Endless change feed starting after `since`. A failed poll is yielded as
    /// an error and retried from the same sequence on the next pull.
    pub fn changes(&self, since: String) -> impl Stream<Item = anyhow::Result<ChangesPage>> + '_ {
        async_stream::stream! {
            let mut since = since;
            loop {
                let page = self.poll(&since).await;
                if let Ok(page) = &page {
                    since = page.last_seq.clone();
                }
                yield page;
            }
        }
    }

    /// Bootstrap, then feed every change batch into the chart forever.
    pub async fn run(self: Arc<Self>) {
        let since = match self.bootstrap().await {
            Ok(since) => since,
            Err(e) => {
                tracing::warn!("Restore failed, replaying the full change feed: {:#}", e);
                "0".to_string()
            }
        };

        let mut backoff = Backoff::default();
        let changes = self.changes(since);
        futures::pin_mut!(changes);
        while let Some(page) = changes.next().await {
            match page {
                Ok(page) => {
                    backoff.reset();
                    if !page.docs.is_empty() {
                        let charted = self.chart.ingest(&page.docs).await;
                        tracing::debug!(
                            "{} changes ({} telemetry) up to {}",
                            page.docs.len(),
                            charted,
                            page.last_seq
                        );
                    }
                    tokio::time::sleep(self.poll_interval).await;
                }
                Err(e) => {
                    let delay = backoff.next();
                    tracing::warn!("Change feed poll failed, retrying in {:?}: {:#}", delay, e);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
