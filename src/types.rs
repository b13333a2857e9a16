use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::protocol::{CONFIG_MINOR_VERSION, CONFIG_VERSION, DOMAIN};

/// The two user-supplied settings of one configured device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryData {
    pub ip_address: String,
    pub scan_interval: u32,
}

impl EntryData {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.scan_interval))
    }
}

/// Returned by a successful validation. Only used as a label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationInfo {
    pub title: String,
}

/// A persisted configuration record for one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub entry_id: String,
    pub domain: String,
    pub title: String,
    pub version: u32,
    pub minor_version: u32,
    pub data: EntryData,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl ConfigEntry {
    pub fn new(title: impl Into<String>, data: EntryData) -> Self {
        let now = Utc::now();
        Self {
            entry_id: Uuid::new_v4().to_string(),
            domain: DOMAIN.to_string(),
            title: title.into(),
            version: CONFIG_VERSION,
            minor_version: CONFIG_MINOR_VERSION,
            data,
            created_at: now,
            modified_at: now,
        }
    }

    /// Swap in new settings. Title and id stay as they are.
    pub fn replace_data(&mut self, data: EntryData) {
        self.data = data;
        self.modified_at = Utc::now();
    }
}
