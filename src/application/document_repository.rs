// Repository trait for the telemetry document database
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Fetch a JSON resource by path relative to the database, e.g.
    /// `_changes?include_docs=true&since=0`. An empty path reads the database
    /// info document.
    async fn get(&self, path: &str) -> anyhow::Result<Value>;

    /// Store a document under its `_id`.
    async fn put(&self, doc: &Value) -> anyhow::Result<()>;

    /// One-shot replication from `remote` into the local database.
    async fn sync(&self, remote: &str) -> anyhow::Result<()>;

    /// Every document currently in the database.
    async fn restore(&self) -> anyhow::Result<Vec<Value>>;
}
