use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::client::Fetcher;
use crate::protocol::{
    REQUIRED_RESPONSE_KEYS, VALIDATION_TIMEOUT, entry_title, has_required_keys, present_keys,
    status_url,
};
use crate::types::{EntryData, ValidationInfo};
use crate::{Error, Result};

/// Probes a device's status endpoint once and classifies the outcome.
pub struct Validator<F> {
    fetcher: F,
    timeout: Duration,
}

impl<F: Fetcher> Validator<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            timeout: VALIDATION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fails with [`Error::CannotConnect`] on transport errors, timeouts and
    /// any status other than 200, and with [`Error::InvalidData`] when the
    /// body holds none of the required reading keys. Any other failure while
    /// fetching or decoding (a malformed JSON body, say) is reported as
    /// `CannotConnect` as well.
    ///
    /// `scan_interval` is not looked at.
    pub async fn validate(&self, data: &EntryData) -> Result<ValidationInfo> {
        let url = status_url(&data.ip_address);
        debug!(url = %url, "validating device");

        let body = match self.fetch(&url).await {
            Ok(body) => body,
            Err(e @ Error::CannotConnect(_)) => return Err(e),
            Err(e) => return Err(Error::CannotConnect(e.to_string())),
        };

        if !has_required_keys(&body) {
            warn!(
                url = %url,
                required = ?REQUIRED_RESPONSE_KEYS,
                "device response has none of the required keys"
            );
            return Err(Error::InvalidData(
                "missing required keys in JSON response".to_string(),
            ));
        }

        debug!(keys = ?present_keys(&body), "device response accepted");
        Ok(ValidationInfo {
            title: entry_title(&data.ip_address),
        })
    }

    async fn fetch(&self, url: &str) -> Result<Value> {
        let resp = tokio::time::timeout(self.timeout, self.fetcher.get(url))
            .await
            .map_err(|_| Error::Timeout)??;

        if resp.status != 200 {
            return Err(Error::CannotConnect(format!("HTTP {}", resp.status)));
        }
        resp.json()
    }
}
