use std::time::Duration;

use serde_json::Value;

pub const DOMAIN: &str = "ecotracker";

pub const API_ENDPOINT: &str = "/v1/json";

/// A valid status body carries at least one of these.
pub const REQUIRED_RESPONSE_KEYS: [&str; 4] =
    ["power", "powerAvg", "energyCounterIn", "energyCounterOut"];

/// Every reading key the device publishes.
pub const RESPONSE_KEYS: [&str; 7] = [
    "power",
    "powerPhase1",
    "powerPhase2",
    "powerPhase3",
    "powerAvg",
    "energyCounterIn",
    "energyCounterOut",
];

pub const DEFAULT_SCAN_INTERVAL: u32 = 60;
pub const MIN_SCAN_INTERVAL: u32 = 1;
pub const MAX_SCAN_INTERVAL: u32 = 86_400;

pub const VALIDATION_TIMEOUT: Duration = Duration::from_secs(10);

pub const CONFIG_VERSION: u32 = 1;
pub const CONFIG_MINOR_VERSION: u32 = 1;

pub const CONF_IP_ADDRESS: &str = "ip_address";
pub const CONF_SCAN_INTERVAL: &str = "scan_interval";

pub fn status_url(address: &str) -> String {
    format!("http://{address}{API_ENDPOINT}")
}

pub fn entry_title(address: &str) -> String {
    format!("Ecotracker ({address})")
}

/// True when `body` is an object holding any of [`REQUIRED_RESPONSE_KEYS`].
pub fn has_required_keys(body: &Value) -> bool {
    body.as_object()
        .is_some_and(|obj| REQUIRED_RESPONSE_KEYS.iter().any(|k| obj.contains_key(*k)))
}

/// Reading keys present in `body`, in [`RESPONSE_KEYS`] order.
pub fn present_keys(body: &Value) -> Vec<&'static str> {
    match body.as_object() {
        Some(obj) => RESPONSE_KEYS
            .iter()
            .copied()
            .filter(|k| obj.contains_key(*k))
            .collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_url_appends_endpoint() {
        assert_eq!(status_url("192.168.1.40"), "http://192.168.1.40/v1/json");
        assert_eq!(status_url("10.0.0.2:8080"), "http://10.0.0.2:8080/v1/json");
    }

    #[test]
    fn title_wraps_address() {
        assert_eq!(entry_title("192.168.1.40"), "Ecotracker (192.168.1.40)");
    }

    #[test]
    fn any_single_required_key_is_enough() {
        for key in REQUIRED_RESPONSE_KEYS {
            let mut body = serde_json::Map::new();
            body.insert(key.to_string(), json!(0));
            assert!(has_required_keys(&Value::Object(body)), "{key} alone");
        }
    }

    #[test]
    fn phase_keys_alone_are_not_enough() {
        let body = json!({"powerPhase1": 120, "powerPhase2": 80, "powerPhase3": 0});
        assert!(!has_required_keys(&body));
    }

    #[test]
    fn non_object_bodies_have_no_keys() {
        assert!(!has_required_keys(&json!(["power", "powerAvg"])));
        assert!(!has_required_keys(&json!("power")));
        assert!(!has_required_keys(&Value::Null));
        assert!(present_keys(&json!([1, 2])).is_empty());
    }

    #[test]
    fn present_keys_follow_declared_order() {
        let body = json!({"energyCounterOut": 3.5, "power": 412, "powerPhase2": 200, "foo": 1});
        assert_eq!(
            present_keys(&body),
            vec!["power", "powerPhase2", "energyCounterOut"]
        );
    }
}
