use axum::body::Bytes;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use super::{KeyRole, SupabaseClient};
use crate::error::AppResult;

/// Object storage for user uploads
#[async_trait::async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Uploads `data` to `bucket/path`, replacing any existing object
    async fn upload(&self, bucket: &str, path: &str, data: Bytes, content_type: &str)
        -> AppResult<()>;

    /// Names of the objects under `prefix` (not recursive)
    async fn list(&self, bucket: &str, prefix: &str) -> AppResult<Vec<String>>;

    /// Deletes objects by full path
    async fn remove(&self, bucket: &str, paths: &[String]) -> AppResult<()>;

    /// URL the object is served from when the bucket is public
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

#[derive(Debug, Deserialize)]
struct ObjectEntry {
    name: String,
}

/// Supabase Storage over REST, authenticated with the service-role key
#[derive(Clone)]
pub struct SupabaseStorage {
    client: SupabaseClient,
}

impl SupabaseStorage {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> AppResult<()> {
        let size = data.len();
        let request = self
            .client
            .request(
                Method::POST,
                &format!("/storage/v1/object/{}/{}", bucket, path),
                KeyRole::Service,
                None,
            )
            .header("content-type", content_type)
            .header("x-upsert", "true")
            .body(data);

        self.client.send(request).await?;
        tracing::info!(bucket = %bucket, path = %path, size, "Object uploaded");
        Ok(())
    }

    async fn list(&self, bucket: &str, prefix: &str) -> AppResult<Vec<String>> {
        let request = self
            .client
            .request(
                Method::POST,
                &format!("/storage/v1/object/list/{}", bucket),
                KeyRole::Service,
                None,
            )
            .json(&json!({ "prefix": prefix, "limit": 100, "offset": 0 }));

        let entries: Vec<ObjectEntry> = self.client.send_json(request).await?;
        Ok(entries.into_iter().map(|e| e.name).collect())
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> AppResult<()> {
        if paths.is_empty() {
            return Ok(());
        }

        let request = self
            .client
            .request(
                Method::DELETE,
                &format!("/storage/v1/object/{}", bucket),
                KeyRole::Service,
                None,
            )
            .json(&json!({ "prefixes": paths }));

        self.client.send(request).await?;
        tracing::info!(bucket = %bucket, count = paths.len(), "Objects removed");
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.client.base_url(),
            bucket,
            path
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url() {
        let storage = SupabaseStorage::new(SupabaseClient::new(
            "https://p.supabase.co",
            "anon".into(),
            "service".into(),
        ));
        assert_eq!(
            storage.public_url("avatars", "abc/avatar.png"),
            "https://p.supabase.co/storage/v1/object/public/avatars/abc/avatar.png"
        );
    }
}
