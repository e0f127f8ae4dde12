//! # Initial value seeding.
//!
//! Some endpoints only push changes; the full current value lives behind a
//! companion HTTP resource (e.g. `http://host/usersettings` next to
//! `ws://host/usersettings`). A store built [`with_seed`](crate::StoreSpec::with_seed)
//! fetches it every time its link starts.
//!
//! ## Rules
//! - Best-effort: up to [`Config::seed_attempts`](crate::Config::seed_attempts)
//!   attempts spaced by the store's backoff, each bounded by
//!   [`Config::seed_timeout`](crate::Config::seed_timeout).
//! - The fetched body goes through the store's decoder.
//! - It is applied only if no value was accepted since the link started:
//!   a socket frame always wins over the seed.
//! - Failures publish `SeedFailed` and never touch the socket path.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::{select, time};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::core::Shared;
use crate::error::{StoreError, TransportError};
use crate::events::EventKind;

/// Source of a store's initial value.
#[async_trait]
pub trait SeedSource: Send + Sync + 'static {
    /// Fetches the raw body to decode.
    async fn fetch(&self) -> Result<String, TransportError>;
}

/// HTTP GET seed source (reqwest).
#[derive(Clone, Debug)]
pub struct HttpSeed {
    client: reqwest::Client,
    url: Url,
}

impl HttpSeed {
    /// Seeds from an absolute `http://` / `https://` URL.
    pub fn new(url: &str) -> Result<Self, StoreError> {
        let parsed = Url::parse(url).map_err(|e| StoreError::InvalidEndpoint {
            endpoint: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(StoreError::InvalidEndpoint {
                endpoint: url.to_string(),
                reason: format!("unsupported scheme {:?}", parsed.scheme()),
            });
        }
        Ok(Self {
            client: reqwest::Client::new(),
            url: parsed,
        })
    }

    /// Seeds from `path` on the same host as a WebSocket endpoint.
    ///
    /// `ws://` maps to `http://`, `wss://` to `https://`.
    ///
    /// ```rust
    /// use wirestate::HttpSeed;
    ///
    /// let seed = HttpSeed::sibling("wss://lab.local:8443/ws/usersettings", "/usersettings").unwrap();
    /// assert_eq!(seed.url(), "https://lab.local:8443/usersettings");
    /// ```
    pub fn sibling(endpoint: &str, path: &str) -> Result<Self, StoreError> {
        let invalid = |reason: String| StoreError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason,
        };
        let mut url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
        let scheme = match url.scheme() {
            "ws" => "http",
            "wss" => "https",
            other => return Err(invalid(format!("unsupported scheme {other:?}"))),
        };
        url.set_scheme(scheme)
            .map_err(|()| invalid(format!("cannot switch to {scheme}")))?;
        url.set_path(path);
        url.set_query(None);
        Ok(Self {
            client: reqwest::Client::new(),
            url,
        })
    }

    /// Uses a preconfigured client (proxies, headers, TLS roots).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }
}

#[async_trait]
impl SeedSource for HttpSeed {
    async fn fetch(&self) -> Result<String, TransportError> {
        let resp = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?
            .error_for_status()
            .map_err(|e| TransportError::Http(e.to_string()))?;
        resp.text()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))
    }
}

/// Seeding task spawned by a link actor at link start.
pub(crate) async fn seed_link<In: Send + Sync + 'static>(
    shared: Arc<Shared<In>>,
    source: Arc<dyn SeedSource>,
    token: CancellationToken,
) {
    let baseline = shared.version();
    let attempts = shared.env.seed_attempts;

    for attempt in 1..=attempts {
        let fetched = select! {
            res = fetch_once(source.as_ref(), shared.env.seed_timeout) => res,
            _ = token.cancelled() => return,
        };
        let decoded = fetched.and_then(|raw| {
            shared
                .settings
                .decoder
                .decode(&raw)
                .map_err(|e| e.to_string())
        });

        match decoded {
            Ok(value) => {
                if shared.accept_if_unchanged(value, baseline) {
                    shared.publish(shared.event(EventKind::SeedApplied).with_attempt(attempt));
                } else {
                    shared.publish(
                        shared
                            .event(EventKind::SeedFailed)
                            .with_attempt(attempt)
                            .with_reason("superseded by a newer value"),
                    );
                }
                return;
            }
            Err(reason) => shared.publish(
                shared
                    .event(EventKind::SeedFailed)
                    .with_attempt(attempt)
                    .with_reason(reason),
            ),
        }

        if attempt < attempts {
            let delay = shared.settings.backoff.delay(attempt - 1);
            select! {
                _ = time::sleep(delay) => {}
                _ = token.cancelled() => return,
            }
        }
    }
}

async fn fetch_once(source: &dyn SeedSource, timeout: Option<Duration>) -> Result<String, String> {
    let res = match timeout {
        Some(dur) => time::timeout(dur, source.fetch())
            .await
            .map_err(|_| format!("timed out after {dur:?}"))?,
        None => source.fetch().await,
    };
    res.map_err(|e| e.as_message())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sibling_maps_scheme_and_path() {
        let seed = HttpSeed::sibling("ws://10.0.0.2:8000/ws?x=1", "/usersettings").unwrap();
        assert_eq!(seed.url(), "http://10.0.0.2:8000/usersettings");
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(HttpSeed::new("ftp://host/x").is_err());
        assert!(HttpSeed::new("not a url").is_err());
        assert!(HttpSeed::sibling("http://host/x", "/y").is_err());
    }
}
