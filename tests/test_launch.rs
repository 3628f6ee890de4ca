//! Launch strategy selection: cold launch, warm delivery, and manual wait.
//!
//! Everything runs against the recording mock driver; assertions are on the
//! exact sequence of capability calls and their arguments.

mod common;

use common::{drain_events, new_instance_request, prepared, url_request};
use serde_json::json;
use testrig::{DeviceError, DeviceEvent, DeviceId, LaunchRequest, ProcessId};
use testrig_harness::{DeviceFixtureBuilder, MockDriverBuilder};

#[tokio::test]
async fn launch_with_no_args_uses_session_defaults() {
    let fixture = prepared().await;
    fixture.device.launch_app(&LaunchRequest::default()).await.unwrap();

    let calls = fixture.driver.launch_app_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].device_id, DeviceId::new("mock-device"));
    assert_eq!(calls[0].bundle_id.as_str(), "test.bundle");
    assert_eq!(
        serde_json::to_value(&calls[0].payload).unwrap(),
        json!({"detoxServer": "ws://localhost:8099", "detoxSessionId": "test"})
    );
    assert_eq!(calls[0].language_and_locale, None);
}

#[tokio::test]
async fn manual_mode_announces_and_waits() {
    let fixture = DeviceFixtureBuilder::new().manual_launch().prepared().await;
    let mut events = fixture.device.subscribe();

    fixture.device.launch_app(&LaunchRequest::default()).await.unwrap();

    assert_eq!(fixture.driver.count("launch_app"), 0);
    assert_eq!(fixture.driver.count("deliver_payload"), 0);
    let waits = fixture.driver.wait_for_app_launch_calls();
    assert_eq!(waits.len(), 1);
    assert_eq!(
        serde_json::to_value(&waits[0].payload).unwrap(),
        json!({"detoxServer": "ws://localhost:8099", "detoxSessionId": "test"})
    );
    assert!(drain_events(&mut events).is_empty());
}

#[tokio::test]
async fn cold_launch_publishes_app_ready() {
    common::init_tracing();
    let fixture = DeviceFixtureBuilder::new()
        .driver(MockDriverBuilder::new().bundle_id("test.bundle").launch_pids([42]).build())
        .prepared()
        .await;
    let mut events = fixture.device.subscribe();

    fixture.device.launch_app(&LaunchRequest::default()).await.unwrap();

    assert_eq!(
        drain_events(&mut events),
        vec![DeviceEvent::AppReady {
            device_id: DeviceId::new("mock-device"),
            bundle_id: "test.bundle".into(),
            pid: ProcessId(42),
        }]
    );
}

#[tokio::test]
async fn language_and_locale_is_forwarded_verbatim() {
    let fixture = prepared().await;
    let request = LaunchRequest {
        language_and_locale: Some(testrig::LanguageAndLocale {
            language: Some("es-MX".into()),
            locale: Some("es-MX".into()),
        }),
        ..LaunchRequest::default()
    };

    fixture.device.launch_app(&request).await.unwrap();

    let calls = fixture.driver.launch_app_calls();
    assert_eq!(calls[0].language_and_locale, request.language_and_locale);
    // The payload itself carries only the session seed.
    assert!(!calls[0].payload.contains_key("language"));
}

#[tokio::test]
async fn disable_touch_indicators_adds_the_switch() {
    let fixture = prepared().await;
    let request = LaunchRequest {
        disable_touch_indicators: true,
        ..LaunchRequest::default()
    };

    fixture.device.launch_app(&request).await.unwrap();

    let calls = fixture.driver.launch_app_calls();
    assert_eq!(calls[0].payload["detoxDisableTouchIndicators"], json!(true));
}

#[tokio::test]
async fn conflicting_params_fail_with_zero_driver_calls() {
    let fixture = prepared().await;
    let request = LaunchRequest {
        url: Some("scheme://some.url".into()),
        user_notification: Some(json!("notif")),
        ..LaunchRequest::default()
    };

    let err = fixture.device.launch_app(&request).await.unwrap_err();

    assert!(matches!(err, DeviceError::ConflictingLaunchParams { .. }));
    assert!(fixture.driver.calls().is_empty());
}

#[tokio::test]
async fn permissions_are_applied_before_the_process_starts() {
    let fixture = prepared().await;
    let request = LaunchRequest {
        permissions: Some([("calendar".to_string(), "YES".to_string())].into()),
        ..LaunchRequest::default()
    };

    fixture.device.launch_app(&request).await.unwrap();

    assert_eq!(
        fixture.driver.call_names(),
        vec!["bundle_id_from_binary", "set_permissions", "launch_app"]
    );
}

#[tokio::test]
async fn relaunching_into_a_running_process_without_payload_is_a_noop() {
    let fixture = prepared().await;

    fixture.device.launch_app(&new_instance_request(true)).await.unwrap();
    fixture.device.launch_app(&new_instance_request(false)).await.unwrap();

    assert_eq!(fixture.driver.count("launch_app"), 1);
    assert_eq!(fixture.driver.count("deliver_payload"), 0);
}

#[tokio::test]
async fn url_reaches_a_running_process_as_a_warm_delivery() {
    let fixture = prepared().await;
    let mut events = fixture.device.subscribe();

    fixture.device.launch_app(&new_instance_request(true)).await.unwrap();
    fixture.device.launch_app(&url_request("url://me")).await.unwrap();

    assert_eq!(fixture.driver.count("launch_app"), 1);
    let deliveries = fixture.driver.deliver_payload_calls();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(
        serde_json::to_value(&deliveries[0].0).unwrap(),
        json!({"delayPayload": true, "url": "url://me"})
    );
    // Only the cold launch publishes readiness.
    assert_eq!(drain_events(&mut events).len(), 1);
}

#[tokio::test]
async fn url_on_a_fresh_device_goes_through_launch_args() {
    let fixture = prepared().await;

    fixture.device.launch_app(&url_request("url://me")).await.unwrap();

    assert_eq!(fixture.driver.count("deliver_payload"), 0);
    let calls = fixture.driver.launch_app_calls();
    assert_eq!(calls[0].payload["detoxURLOverride"], json!("url://me"));
}

#[tokio::test]
async fn url_with_source_app_composes_both_overrides() {
    let fixture = prepared().await;
    let request = LaunchRequest {
        url: Some("scheme://some.url".into()),
        source_app: Some("sourceAppBundleId".into()),
        ..LaunchRequest::default()
    };

    fixture.device.launch_app(&request).await.unwrap();

    let payload = &fixture.driver.launch_app_calls()[0].payload;
    assert_eq!(payload["detoxURLOverride"], json!("scheme://some.url"));
    assert_eq!(payload["detoxSourceAppOverride"], json!("sourceAppBundleId"));
}

#[tokio::test]
async fn notification_reaches_a_running_process_via_its_data_file() {
    let fixture = DeviceFixtureBuilder::new()
        .driver(
            MockDriverBuilder::new()
                .bundle_id("test.bundle")
                .payload_file_url("file:///notification.json")
                .build(),
        )
        .prepared()
        .await;

    fixture.device.launch_app(&new_instance_request(true)).await.unwrap();
    let request = LaunchRequest {
        user_notification: Some(json!({"trigger": {"type": "push"}})),
        ..LaunchRequest::default()
    };
    fixture.device.launch_app(&request).await.unwrap();

    assert_eq!(fixture.driver.count("create_payload_file"), 1);
    let deliveries = fixture.driver.deliver_payload_calls();
    assert_eq!(
        serde_json::to_value(&deliveries[0].0).unwrap(),
        json!({"delayPayload": true, "detoxUserNotificationDataURL": "file:///notification.json"})
    );
}

#[tokio::test]
async fn activity_reaches_a_running_process_via_its_data_file() {
    let fixture = prepared().await;

    fixture.device.launch_app(&new_instance_request(true)).await.unwrap();
    let request = LaunchRequest {
        user_activity: Some(json!({"activityType": "browsing"})),
        ..LaunchRequest::default()
    };
    fixture.device.launch_app(&request).await.unwrap();

    let deliveries = fixture.driver.deliver_payload_calls();
    assert_eq!(
        serde_json::to_value(&deliveries[0].0).unwrap(),
        json!({"delayPayload": true, "detoxUserActivityDataURL": "mock://payload"})
    );
    assert_eq!(fixture.driver.count("launch_app"), 1);
}

#[tokio::test]
async fn notification_on_a_fresh_device_goes_through_launch_args() {
    let fixture = prepared().await;
    let request = LaunchRequest {
        user_notification: Some(json!("notification")),
        ..LaunchRequest::default()
    };

    fixture.device.launch_app(&request).await.unwrap();

    assert_eq!(fixture.driver.count("deliver_payload"), 0);
    let payload = &fixture.driver.launch_app_calls()[0].payload;
    assert_eq!(payload["detoxUserNotificationDataURL"], json!("mock://payload"));
}

#[tokio::test]
async fn forcing_a_new_instance_starts_a_second_process() {
    let fixture = DeviceFixtureBuilder::new()
        .driver(MockDriverBuilder::new().bundle_id("test.bundle").launch_pids([1, 2]).build())
        .prepared()
        .await;
    let mut events = fixture.device.subscribe();

    fixture.device.launch_app(&new_instance_request(true)).await.unwrap();
    fixture.device.launch_app(&new_instance_request(true)).await.unwrap();

    assert_eq!(fixture.driver.count("launch_app"), 2);
    let events = drain_events(&mut events);
    let pids: Vec<_> = events
        .iter()
        .map(|DeviceEvent::AppReady { pid, .. }| *pid)
        .collect();
    assert_eq!(pids, vec![ProcessId(1), ProcessId(2)]);
}

#[tokio::test]
async fn failed_cold_launch_leaves_the_tracker_unstarted() {
    let fixture = prepared().await;
    let mut events = fixture.device.subscribe();
    fixture.driver.fail("launch_app", "boot loop");

    let err = fixture.device.launch_app(&LaunchRequest::default()).await.unwrap_err();
    assert!(matches!(err, DeviceError::Driver(_)));
    assert!(drain_events(&mut events).is_empty());

    // The tracker never saw a started process, so a follow-up URL launch
    // must still take the cold path rather than warm delivery.
    fixture.driver.clear_failure("launch_app");
    fixture.device.launch_app(&url_request("url://me")).await.unwrap();
    assert_eq!(fixture.driver.count("deliver_payload"), 0);
    assert_eq!(fixture.driver.count("launch_app"), 2);
}
