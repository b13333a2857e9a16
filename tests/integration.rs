use ecotracker::{ConfigFlow, DeviceClient, EntryStore, FlowResult, MemoryStore};
use serde_json::json;

/// Run with: ECOTRACKER_IP=192.168.1.40 cargo test --test integration -- --ignored
/// Requires an Ecotracker on the local network with its HTTP API enabled.
#[tokio::test]
#[ignore]
async fn setup_then_reconfigure_real_device() {
    let ip = std::env::var("ECOTRACKER_IP").expect("ECOTRACKER_IP not set");

    let mut flow = ConfigFlow::new(DeviceClient::new().unwrap(), MemoryStore::new());

    let result = flow
        .step_user(Some(&json!({"ip_address": ip, "scan_interval": 30})))
        .await;
    let FlowResult::CreateEntry { entry_id, title, .. } = result else {
        panic!("setup failed");
    };
    assert_eq!(title, format!("Ecotracker ({ip})"));

    let result = flow
        .step_reconfigure(&entry_id, Some(&json!({"ip_address": ip, "scan_interval": 10})))
        .await;
    assert!(matches!(result, FlowResult::Abort { reason: "reconfigure_successful" }));

    let entries = flow.store().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].data.scan_interval, 10);
}
