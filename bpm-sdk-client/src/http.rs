//! HTTP layer: verb wrappers over `reqwest` with engine error extraction.
//!
//! Paths are built from segments so ids and variable names are
//! percent-escaped by the URL machinery, never by hand.

use crate::config::{ClientConfig, Credentials};
use crate::error::EngineError;
use reqwest::Method;
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;
use url::Url;

pub struct HttpClient {
    inner: reqwest::Client,
    config: ClientConfig,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Result<Self, EngineError> {
        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { inner, config })
    }

    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    /// Resolve a resource path under the REST root. Each segment is escaped
    /// on its own, so `task/a b` becomes `task/a%20b`.
    pub fn url_for(&self, segments: &[&str]) -> Result<Url, EngineError> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                EngineError::InvalidRequest(format!(
                    "base url cannot carry paths: {}",
                    self.config.base_url
                ))
            })?
            .extend(segments);
        Ok(url)
    }

    pub async fn get(
        &self,
        segments: &[&str],
        query: &[(String, String)],
    ) -> Result<Value, EngineError> {
        self.request(Method::GET, segments, query, None).await
    }

    pub async fn post(
        &self,
        segments: &[&str],
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value, EngineError> {
        self.request(Method::POST, segments, query, body).await
    }

    pub async fn put(
        &self,
        segments: &[&str],
        body: Option<&Value>,
    ) -> Result<Value, EngineError> {
        self.request(Method::PUT, segments, &[], body).await
    }

    pub async fn delete(
        &self,
        segments: &[&str],
        query: &[(String, String)],
    ) -> Result<Value, EngineError> {
        self.request(Method::DELETE, segments, query, None).await
    }

    pub async fn options(&self, segments: &[&str]) -> Result<Value, EngineError> {
        self.request(Method::OPTIONS, segments, &[], None).await
    }

    async fn request(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value, EngineError> {
        let url = self.url_for(segments)?;
        debug!(%method, %url, "engine request");

        let mut request = self.inner.request(method, url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = self.authorize(request).send().await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(EngineError::from_response(status.as_u16(), &text));
        }
        if text.is_empty() {
            // many engine operations (claim, complete, ...) answer 204
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Fetch a raw document (form HTML). `url` may be absolute or relative
    /// to the REST root; a `noCache` timestamp defeats intermediary caches.
    pub async fn load(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<String, EngineError> {
        let resolved = match Url::parse(url) {
            Ok(absolute) => absolute,
            Err(_) => {
                let mut joined = self.config.base_url.clone();
                joined
                    .path_segments_mut()
                    .map_err(|_| {
                        EngineError::InvalidRequest(format!("cannot resolve form url: {url}"))
                    })?
                    .extend(url.trim_start_matches('/').split('/'));
                joined
            }
        };

        debug!(url = %resolved, "load document");
        let mut request = self
            .inner
            .get(resolved)
            .header(reqwest::header::ACCEPT, "*/*")
            .query(&[("noCache", now_ms().to_string())]);
        if !params.is_empty() {
            request = request.query(params);
        }
        let response = self.authorize(request).send().await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(EngineError::from_response(status.as_u16(), &text));
        }
        Ok(text)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.credentials {
            Some(Credentials::Basic { user, password }) => {
                request.basic_auth(user, Some(password))
            }
            Some(Credentials::Bearer { token }) => request.bearer_auth(token),
            None => request,
        }
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
