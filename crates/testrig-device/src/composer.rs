//! Launch-payload composition.
//!
//! Merges session config, the prebaked store snapshot, and call-site
//! parameters into the flat payload handed to the driver. Pure except for
//! the payload-file round-trips, which go through the driver and whose
//! failures propagate unchanged.

use serde_json::{Map, Value};

use testrig_driver::DeviceDriver;
use testrig_types::launch::keys;
use testrig_types::{DeviceError, LaunchPayload, LaunchRequest, SessionConfig};

/// Check the mutual exclusivity of `url`, `user_notification`, and
/// `user_activity`. Runs before any side effect.
pub fn validate(request: &LaunchRequest) -> Result<(), DeviceError> {
    let set = request.payload_params();
    if set.len() > 1 {
        return Err(DeviceError::conflicting_params(&set));
    }
    Ok(())
}

/// Build the launch payload for `request`.
///
/// Precedence for launch-arg keys: call-site `launch_args` over `prebaked`
/// over the session seed. The request is only read; `prebaked` is the
/// store's owned snapshot and is consumed.
pub async fn compose(
    session: &SessionConfig,
    prebaked: Map<String, Value>,
    request: &LaunchRequest,
    driver: &dyn DeviceDriver,
) -> Result<LaunchPayload, DeviceError> {
    validate(request)?;

    let mut payload = LaunchPayload::new();
    payload.insert(keys::SERVER.into(), Value::String(session.server.clone()));
    payload.insert(
        keys::SESSION_ID.into(),
        Value::String(session.session_id.clone()),
    );

    for (key, value) in prebaked {
        payload.insert(key, value);
    }
    if let Some(onsite) = &request.launch_args {
        for (key, value) in onsite {
            payload.insert(key.clone(), value.clone());
        }
    }

    if let Some(url) = &request.url {
        payload.insert(keys::URL_OVERRIDE.into(), Value::String(url.clone()));
        if let Some(source_app) = &request.source_app {
            payload.insert(
                keys::SOURCE_APP_OVERRIDE.into(),
                Value::String(source_app.clone()),
            );
        }
    }

    if let Some(notification) = &request.user_notification {
        let data_url = driver.create_payload_file(notification).await?;
        payload.insert(
            keys::USER_NOTIFICATION_DATA_URL.into(),
            Value::String(data_url),
        );
    }

    if let Some(activity) = &request.user_activity {
        let data_url = driver.create_payload_file(activity).await?;
        payload.insert(keys::USER_ACTIVITY_DATA_URL.into(), Value::String(data_url));
    }

    if request.disable_touch_indicators {
        payload.insert(keys::DISABLE_TOUCH_INDICATORS.into(), Value::Bool(true));
    }

    Ok(payload)
}
