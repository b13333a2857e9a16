use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use serde_json::{Value, json};
use tracing::warn;

use crate::protocol::present_keys;

/// How much of each device response ends up in the exchange log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLogMode {
    /// The whole response body.
    Full,
    /// Only the reading keys found in the body.
    Summary,
}

/// Appends one NDJSON line per request and per response.
pub(crate) struct MessageLogger {
    mode: MessageLogMode,
    file: File,
}

impl MessageLogger {
    pub fn new(mode: MessageLogMode, path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { mode, file })
    }

    pub fn log_request(&mut self, method: &str, url: &str) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "req",
            "method": method,
            "url": url,
        });
        self.write_line(&entry);
    }

    pub fn log_response(&mut self, url: &str, status: u16, body: &str) {
        let parsed: Value = serde_json::from_str(body).unwrap_or(Value::Null);
        let entry = match self.mode {
            MessageLogMode::Full => json!({
                "ts": Utc::now().to_rfc3339(),
                "dir": "resp",
                "url": url,
                "status": status,
                "body": parsed,
            }),
            MessageLogMode::Summary => json!({
                "ts": Utc::now().to_rfc3339(),
                "dir": "resp",
                "url": url,
                "status": status,
                "keys": present_keys(&parsed),
                "bytes": body.len(),
            }),
        };
        self.write_line(&entry);
    }

    pub fn log_failure(&mut self, url: &str, error: &str) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "err",
            "url": url,
            "error": error,
        });
        self.write_line(&entry);
    }

    fn write_line(&mut self, entry: &Value) {
        if let Ok(line) = serde_json::to_string(entry)
            && let Err(e) = writeln!(self.file, "{line}")
        {
            warn!("failed to write log entry: {e}");
        }
    }
}
