// CouchDB repository implementation
use crate::application::document_repository::DocumentRepository;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Clone)]
pub struct CouchRepository {
    client: reqwest::Client,
    origin: String,
    database: String,
}

#[derive(Debug, Deserialize)]
struct AllDocsResponse {
    rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
struct AllDocsRow {
    #[serde(default)]
    doc: Option<Value>,
}

impl CouchRepository {
    pub fn new(origin: String, database: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            origin: origin.trim_end_matches('/').to_string(),
            database,
        }
    }

    fn database_url(&self) -> String {
        format!("{}/{}", self.origin, urlencoding::encode(&self.database))
    }

    fn url(&self, path: &str) -> String {
        if path.is_empty() {
            self.database_url()
        } else {
            format!("{}/{}", self.database_url(), path)
        }
    }

    async fn check(response: reqwest::Response, action: &str) -> Result<reqwest::Response> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("CouchDB {} failed with status {}: {}", action, status, body);
        }
        Ok(response)
    }
}

#[async_trait]
impl DocumentRepository for CouchRepository {
    async fn get(&self, path: &str) -> Result<Value> {
        let url = self.url(path);
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to CouchDB")?;

        Self::check(response, "get")
            .await?
            .json::<Value>()
            .await
            .context("Failed to parse CouchDB response")
    }

    async fn put(&self, doc: &Value) -> Result<()> {
        let id = doc["_id"]
            .as_str()
            .context("Document has no string _id")?;
        let url = self.url(&urlencoding::encode(id));
        let response = self
            .client
            .put(&url)
            .json(doc)
            .send()
            .await
            .context("Failed to send document to CouchDB")?;

        Self::check(response, "put").await?;
        Ok(())
    }

    async fn sync(&self, remote: &str) -> Result<()> {
        let url = format!("{}/_replicate", self.origin);
        let response = self
            .client
            .post(&url)
            .json(&json!({
                "source": remote,
                "target": self.database,
                "create_target": true,
            }))
            .send()
            .await
            .context("Failed to start CouchDB replication")?;

        Self::check(response, "replication").await?;
        Ok(())
    }

    async fn restore(&self) -> Result<Vec<Value>> {
        let url = self.url("_all_docs?include_docs=true");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send request to CouchDB")?;

        let all_docs = Self::check(response, "restore")
            .await?
            .json::<AllDocsResponse>()
            .await
            .context("Failed to parse CouchDB _all_docs response")?;

        Ok(all_docs.rows.into_iter().filter_map(|row| row.doc).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let repository = CouchRepository::new(
            "http://localhost:5984/".to_string(),
            "environmental_data_point".to_string(),
        );
        assert_eq!(
            repository.url(""),
            "http://localhost:5984/environmental_data_point"
        );
        assert_eq!(
            repository.url("_changes?since=0"),
            "http://localhost:5984/environmental_data_point/_changes?since=0"
        );
    }

    #[test]
    fn test_all_docs_rows_without_doc_are_skipped() {
        let body = json!({
            "total_rows": 2,
            "rows": [
                {"id": "a", "doc": {"_id": "a", "timestamp": 1}},
                {"id": "b", "error": "not_found"}
            ]
        });
        let parsed: AllDocsResponse = serde_json::from_value(body).unwrap();
        let docs: Vec<Value> = parsed.rows.into_iter().filter_map(|row| row.doc).collect();
        assert_eq!(docs.len(), 1);
    }

    #[tokio::test]
    async fn test_put_requires_id() {
        let repository = CouchRepository::new(
            "http://localhost:5984".to_string(),
            "environmental_data_point".to_string(),
        );
        let err = repository.put(&json!({"value": 1})).await.unwrap_err();
        assert!(err.to_string().contains("_id"));
    }
}
