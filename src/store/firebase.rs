use std::collections::BTreeMap;
use std::num::NonZeroU32;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use serde_json::Value;
use tracing::debug;

use super::{validate_segment, value_to_count, CounterStore, StoreError};

/// Realtime-database REST backend: every key maps to `<database_url>/<key>.json`.
pub struct FirebaseStore {
    base_url: String,
    auth: Option<String>,
    client: reqwest::Client,
    limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl FirebaseStore {
    pub fn new(database_url: &str, auth: Option<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: database_url.trim().trim_end_matches('/').to_string(),
            auth: auth.filter(|a| !a.trim().is_empty()),
            client,
            limiter: None,
        }
    }

    /// Caps outgoing requests per second; 0 disables the cap.
    pub fn with_rate_limit(mut self, rate: u32) -> Self {
        self.limiter = NonZeroU32::new(rate).map(|r| RateLimiter::direct(Quota::per_second(r)));
        self
    }

    pub fn url_for(&self, key: &str) -> Result<String, StoreError> {
        let mut path = String::new();
        for seg in key.split('/').filter(|s| !s.is_empty()) {
            validate_segment(seg)?;
            path.push('/');
            path.push_str(seg);
        }
        if path.is_empty() {
            return Err(StoreError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(format!("{}{}.json", self.base_url, path))
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, url);
        match self.auth.as_deref() {
            Some(token) => builder.query(&[("auth", token)]),
            None => builder,
        }
    }

    async fn throttle(&self) {
        if let Some(lim) = self.limiter.as_ref() {
            lim.until_ready().await;
        }
    }

    async fn send_json(
        &self,
        key: &str,
        builder: reqwest::RequestBuilder,
    ) -> Result<Value, StoreError> {
        self.throttle().await;
        let response = builder.send().await.map_err(|e| StoreError::Request {
            key: key.to_string(),
            source: e,
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                key: key.to_string(),
                status: status.as_u16(),
            });
        }
        response.json::<Value>().await.map_err(|e| StoreError::Request {
            key: key.to_string(),
            source: e,
        })
    }
}

#[async_trait]
impl CounterStore for FirebaseStore {
    fn backend_tag(&self) -> &'static str {
        "firebase"
    }

    async fn get(&self, key: &str) -> Result<Option<u64>, StoreError> {
        let url = self.url_for(key)?;
        debug!(%url, "GET counter");
        let value = self
            .send_json(key, self.request(reqwest::Method::GET, url))
            .await?;
        if value.is_null() {
            return Ok(None);
        }
        value_to_count(key, &value).map(Some)
    }

    async fn set(&self, key: &str, value: u64) -> Result<(), StoreError> {
        let url = self.url_for(key)?;
        debug!(%url, value, "PUT counter");
        self.send_json(key, self.request(reqwest::Method::PUT, url).json(&value))
            .await?;
        Ok(())
    }

    async fn list(&self, namespace: &str) -> Result<BTreeMap<String, u64>, StoreError> {
        let url = self.url_for(namespace)?;
        debug!(%url, "GET namespace");
        let value = self
            .send_json(namespace, self.request(reqwest::Method::GET, url))
            .await?;
        let mut out = BTreeMap::new();
        match value {
            Value::Object(children) => {
                for (child, v) in children {
                    match value_to_count(&child, &v) {
                        Ok(n) => {
                            out.insert(child, n);
                        }
                        Err(e) => tracing::warn!(error = %e, "skipping counter"),
                    }
                }
            }
            // sequential numeric keys come back as an array with null holes
            Value::Array(items) => {
                for (idx, v) in items.into_iter().enumerate() {
                    if v.is_null() {
                        continue;
                    }
                    let child = idx.to_string();
                    match value_to_count(&child, &v) {
                        Ok(n) => {
                            out.insert(child, n);
                        }
                        Err(e) => tracing::warn!(error = %e, "skipping counter"),
                    }
                }
            }
            Value::Null => {}
            other => {
                return Err(StoreError::InvalidValue {
                    key: namespace.to_string(),
                    value: other.to_string(),
                })
            }
        }
        Ok(out)
    }

    async fn atomic_add(&self, key: &str, delta: u64) -> Result<Option<u64>, StoreError> {
        let url = self.url_for(key)?;
        debug!(%url, delta, "PUT server increment");
        let body = serde_json::json!({ ".sv": { "increment": delta } });
        let written = self
            .send_json(key, self.request(reqwest::Method::PUT, url).json(&body))
            .await?;
        if let Ok(n) = value_to_count(key, &written) {
            return Ok(Some(n));
        }
        // the echo may still carry the placeholder; read back the resolved value
        Ok(Some(self.get(key).await?.unwrap_or(delta)))
    }
}
