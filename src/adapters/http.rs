//! HTTP probe adapter

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;

use crate::core::error::QueryError;
use crate::core::ports::HttpProbe;

/// Connect timeout, capped by the request timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// `reqwest` backed probe
#[derive(Debug, Clone)]
pub struct ReqwestProbe {
    client: Client,
    timeout: Duration,
}

impl ReqwestProbe {
    /// Build a probe whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .user_agent(concat!("wiverify/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, timeout })
    }
}

impl HttpProbe for ReqwestProbe {
    fn get_json(&self, url: &str) -> Result<serde_json::Value, QueryError> {
        log::debug!("GET {url}");
        let response = self.client.get(url).send().map_err(|e| {
            if e.is_timeout() {
                QueryError::Timeout {
                    what: format!("GET {url}"),
                    after: self.timeout,
                }
            } else {
                QueryError::Unavailable(format!("GET {url}: {e}"))
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(QueryError::NotFound(format!("GET {url}")));
        }
        if !status.is_success() {
            return Err(QueryError::Unavailable(format!("GET {url}: HTTP {status}")));
        }

        response
            .json::<serde_json::Value>()
            .map_err(|e| QueryError::Malformed(format!("GET {url}: {e}")))
    }
}
