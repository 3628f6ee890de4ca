//! Shared helpers for integration tests.
//!
//! Each integration test file compiles common/ as its own module, so not
//! every helper is used in every file.
#![allow(dead_code)]

use testrig::{DeviceEvent, LaunchRequest};
use testrig_harness::{DeviceFixture, DeviceFixtureBuilder};
use tokio::sync::mpsc::UnboundedReceiver;

/// Install a test subscriber for `tracing` output; safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// A prepared device on a fresh mock driver, reuse flag off.
pub async fn prepared() -> DeviceFixture {
    DeviceFixtureBuilder::new().prepared().await
}

/// A prepared device with the reuse flag on (no reinstall on relaunch).
pub async fn prepared_with_reuse() -> DeviceFixture {
    DeviceFixtureBuilder::new().reuse(true).prepared().await
}

/// A request carrying only a deep-link URL.
pub fn url_request(url: &str) -> LaunchRequest {
    LaunchRequest {
        url: Some(url.into()),
        ..LaunchRequest::default()
    }
}

/// A request forcing (or suppressing) a new process instance.
pub fn new_instance_request(new_instance: bool) -> LaunchRequest {
    LaunchRequest {
        new_instance: Some(new_instance),
        ..LaunchRequest::default()
    }
}

/// Drain all events currently buffered on a subscription.
pub fn drain_events(rx: &mut UnboundedReceiver<DeviceEvent>) -> Vec<DeviceEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
