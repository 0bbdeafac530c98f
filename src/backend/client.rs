use anyhow::{Context, Result};
use http::{Method, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};
use tracing::{debug, warn};

use super::cache::ResponseCache;
use super::error::BackendError;
use super::types::error_message;

/// HTTP client for the scouting backend.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    cache: ResponseCache,
}

/// Form fields; repeated keys such as `teams[]` are allowed.
pub type Form = Vec<(String, String)>;

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration, cache: ResponseCache) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("frc-scout/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send_once(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        form: Option<&Form>,
    ) -> Result<Value, BackendError> {
        let mut request = self.http.request(method, self.url(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(form) = form {
            request = request.form(form);
        }

        let transport = |source: reqwest::Error| BackendError::Transport {
            endpoint: path.to_string(),
            source,
        };

        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::Status {
                endpoint: path.to_string(),
                status,
            });
        }

        let text = response.text().await.map_err(transport)?;
        let body: Value = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(BackendError::Status {
                    endpoint: path.to_string(),
                    status,
                })
            }
            Err(e) => {
                return Err(BackendError::Decode {
                    endpoint: path.to_string(),
                    reason: e.to_string(),
                })
            }
        };

        if let Some(message) = error_message(&body) {
            return Err(BackendError::Server {
                endpoint: path.to_string(),
                message,
            });
        }
        if !status.is_success() {
            return Err(BackendError::Status {
                endpoint: path.to_string(),
                status,
            });
        }

        Ok(body)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        form: Option<&Form>,
    ) -> Result<Value, BackendError> {
        // Retry strategy: exponential backoff with 3 attempts
        let retry_strategy = ExponentialBackoff::from_millis(100)
            .max_delay(Duration::from_secs(5))
            .take(3);

        RetryIf::spawn(
            retry_strategy,
            || self.send_once(method.clone(), path, query, form),
            |e: &BackendError| {
                let retry = e.is_retryable();
                if retry {
                    debug!("Retrying {}: {}", path, e);
                }
                retry
            },
        )
        .await
    }

    /// GET a JSON document. With `cacheable`, successful bodies are cached
    /// and served back when the backend cannot be reached.
    pub async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
        cacheable: bool,
    ) -> Result<Value, BackendError> {
        let cache_key = cache_key(path, query);

        match self.send(Method::GET, path, query, None).await {
            Ok(body) => {
                if cacheable {
                    self.cache.put(&cache_key, &body);
                }
                Ok(body)
            }
            Err(e) if cacheable && e.is_retryable() => match self.cache.get(&cache_key) {
                Some(cached) => {
                    warn!("{} unreachable ({}), using cached response", path, e);
                    Ok(cached)
                }
                None => Err(e),
            },
            Err(e) => Err(e),
        }
    }

    pub async fn post_form(&self, path: &str, form: &Form) -> Result<Value, BackendError> {
        self.send(Method::POST, path, &[], Some(form)).await
    }
}

fn cache_key(path: &str, query: &[(&str, String)]) -> String {
    let mut key = format!("GET {}", path);
    for (i, (name, value)) in query.iter().enumerate() {
        key.push(if i == 0 { '?' } else { '&' });
        key.push_str(name);
        key.push('=');
        key.push_str(value);
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_includes_query() {
        assert_eq!(cache_key("/get_all_teams", &[]), "GET /get_all_teams");
        assert_eq!(
            cache_key("/get_match_data", &[("team_number", "254".to_string())]),
            "GET /get_match_data?team_number=254"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let _ = rustls::crypto::ring::default_provider().install_default();
        let client = BackendClient::new(
            "http://127.0.0.1:5000/",
            Duration::from_secs(5),
            ResponseCache::disabled(),
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:5000");
        assert_eq!(client.url("/get_config"), "http://127.0.0.1:5000/get_config");
    }
}
