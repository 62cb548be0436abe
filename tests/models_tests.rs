// Model serialization tests (JSON wire shapes)

mod common;

use hostmon::metrics::{ProcessMatcher, derive_metrics};
use hostmon::models::*;

#[test]
fn test_snapshot_serialization_camel_case() {
    let snapshot = common::snapshot(46.0);
    let json = serde_json::to_string(&snapshot).unwrap();
    assert!(json.contains("\"cpuLoadPercent\""));
    assert!(json.contains("\"buffCacheBytes\""));
    assert!(json.contains("\"rxBytesPerSec\""));
    let back: Snapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back, snapshot);
}

#[test]
fn test_snapshot_network_sums_interfaces() {
    let mut snapshot = common::snapshot(0.0);
    snapshot.network.push(InterfaceRate {
        interface: "wlan0".into(),
        rx_bytes_per_sec: 1024.0,
        tx_bytes_per_sec: -1.0,
    });
    assert_eq!(snapshot.network_rx_bytes_per_sec(), 1024.0 * 1024.0 + 1024.0);
    assert_eq!(snapshot.network_tx_bytes_per_sec(), 512.0 * 1024.0);
}

#[test]
fn test_memory_sample_active_defaults_to_none() {
    let json = r#"{"totalBytes":10,"usedBytes":5}"#;
    let mem: MemorySample = serde_json::from_str(json).unwrap();
    assert_eq!(mem.active_bytes, None);
    assert_eq!(mem.buff_cache_bytes, 0);
}

#[test]
fn test_derived_metrics_field_names() {
    let m = derive_metrics(&common::snapshot(46.0), &ProcessMatcher::default());
    let v = serde_json::to_value(&m).unwrap();
    assert_eq!(v["cpuPercent"], 46);
    assert_eq!(v["groupMemoryMB"], 410);
    assert_eq!(v["networkDownFormatted"], "1M");
    assert_eq!(v["uptimeText"], "1d1h");
    assert!(v.get("diskReadPercent").is_some());
}

#[test]
fn test_panel_update_data_is_flat() {
    let m = derive_metrics(&common::snapshot(46.0), &ProcessMatcher::default());
    let v = serde_json::to_value(PanelMessage::UpdateData(m)).unwrap();
    assert_eq!(v["command"], "updateData");
    assert_eq!(v["cpuPercent"], 46);
}

#[test]
fn test_panel_monitoring_state_shape() {
    let v = serde_json::to_value(PanelMessage::UpdateMonitoringState {
        enabled: false,
        is_paused: true,
    })
    .unwrap();
    assert_eq!(
        v,
        serde_json::json!({"command": "updateMonitoringState", "enabled": false, "isPaused": true})
    );
    let focus = serde_json::to_value(PanelMessage::Focus).unwrap();
    assert_eq!(focus, serde_json::json!({"command": "focus"}));
}

#[test]
fn test_current_settings_shape() {
    let v = serde_json::to_value(PanelMessage::CurrentSettings {
        settings: DisplaySettings::defaults(4000),
    })
    .unwrap();
    assert_eq!(v["command"], "currentSettings");
    assert_eq!(v["settings"]["showCpu"], true);
    assert_eq!(v["settings"]["showGroupMemory"], true);
    assert_eq!(v["settings"]["updateInterval"], 4000);
}

#[test]
fn test_panel_requests_parse() {
    let r: PanelRequest = serde_json::from_str(r#"{"command":"toggleMonitoring"}"#).unwrap();
    assert_eq!(r, PanelRequest::ToggleMonitoring);
    let r: PanelRequest = serde_json::from_str(r#"{"command":"restoreDefaults"}"#).unwrap();
    assert_eq!(r, PanelRequest::RestoreDefaults);
    let r: PanelRequest = serde_json::from_str(
        r#"{"command":"saveSettings","settings":{"showCpu":false,"showMemory":true,
            "showGroupCpu":true,"showGroupMemory":true,"showNetwork":false,"updateInterval":1000}}"#,
    )
    .unwrap();
    let PanelRequest::SaveSettings { settings } = r else {
        panic!("expected saveSettings");
    };
    assert!(!settings.visibility.show_cpu);
    assert!(!settings.visibility.show_network);
    assert_eq!(settings.update_interval, 1000);
    assert!(serde_json::from_str::<PanelRequest>(r#"{"command":"explode"}"#).is_err());
}

#[test]
fn test_indicator_commands_parse() {
    let c: IndicatorCommand = serde_json::from_str(r#"{"command":"togglePause"}"#).unwrap();
    assert_eq!(c, IndicatorCommand::TogglePause);
    let c: IndicatorCommand = serde_json::from_str(r#"{"command":"focusPanel"}"#).unwrap();
    assert_eq!(c, IndicatorCommand::FocusPanel);
}

#[test]
fn test_display_settings_validation() {
    assert!(DisplaySettings::defaults(MIN_UPDATE_INTERVAL_MS).validate().is_ok());
    let err = DisplaySettings::defaults(100).validate().unwrap_err();
    assert!(err.to_string().contains("updateInterval"));
}
