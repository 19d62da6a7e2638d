use anyhow::bail;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::info;

/// Thin wrapper over the bfw-server REST API.
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
    token: String,
}

impl ApiClient {
    pub fn new(server: &str, token: &str) -> anyhow::Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            base: server.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/api/v1/{}", self.base, path);
        info!("{} {}", method, url);
        self.http.request(method, url).bearer_auth(&self.token)
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<Option<Value>> {
        let resp = self.request(Method::GET, path).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(json_body(resp).await?))
    }

    pub async fn post(&self, path: &str, body: &Value) -> anyhow::Result<Value> {
        let resp = self.request(Method::POST, path).json(body).send().await?;
        json_body(resp).await
    }

    /// Returns `false` when the target did not exist.
    pub async fn delete(&self, path: &str) -> anyhow::Result<bool> {
        let resp = self.request(Method::DELETE, path).send().await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => bail!("server returned {}: {}", status, error_message(resp).await),
        }
    }
}

async fn json_body(resp: Response) -> anyhow::Result<Value> {
    let status = resp.status();
    if !status.is_success() {
        bail!("server returned {}: {}", status, error_message(resp).await);
    }
    Ok(resp.json().await?)
}

/// The `error` field of an error body, or the raw text.
async fn error_message(resp: Response) -> String {
    let text = resp.text().await.unwrap_or_default();
    serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| v["error"].as_str().map(str::to_string))
        .unwrap_or(text)
}
