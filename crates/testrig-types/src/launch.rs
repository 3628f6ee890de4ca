//! The launch-request data model.
//!
//! A [`LaunchRequest`] is built per call and never mutated by the engine; the
//! composed result is a flat [`LaunchPayload`] of string keys to serializable
//! values handed to the driver. [`DeliveryPayload`] is the smaller object
//! handed to an already-running process on warm delivery.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Well-known keys of the composed launch payload.
pub mod keys {
    /// Server URL the app connects back to.
    pub const SERVER: &str = "detoxServer";
    /// Session identifier shared with the app.
    pub const SESSION_ID: &str = "detoxSessionId";
    /// Deep-link URL override.
    pub const URL_OVERRIDE: &str = "detoxURLOverride";
    /// Source application for the deep link.
    pub const SOURCE_APP_OVERRIDE: &str = "detoxSourceAppOverride";
    /// Data-file URL of a serialized user notification.
    pub const USER_NOTIFICATION_DATA_URL: &str = "detoxUserNotificationDataURL";
    /// Data-file URL of a serialized user activity.
    pub const USER_ACTIVITY_DATA_URL: &str = "detoxUserActivityDataURL";
    /// Switch disabling touch indicators during the run.
    pub const DISABLE_TOUCH_INDICATORS: &str = "detoxDisableTouchIndicators";
}

/// Flat key/value mapping handed to the driver when starting a process.
pub type LaunchPayload = Map<String, Value>;

/// Language/locale the app should launch under, forwarded to the driver
/// verbatim (not merged into the launch payload).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LanguageAndLocale {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

/// Parameters of a single `launch_app`/`relaunch_app` call.
///
/// At most one of `url`, `user_notification`, `user_activity` may be set;
/// composition rejects the request otherwise, before any driver call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LaunchRequest {
    /// Force a brand-new process even if one is already running.
    /// `relaunch_app` defaults this to `true`, `launch_app` to `false`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_instance: Option<bool>,
    /// Force (or suppress, with `Some(false)`) a reinstall before launching.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<bool>,
    /// Deep-link URL to open the app with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Bundle id of the app the deep link originates from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_app: Option<String>,
    /// Opaque user-notification payload, written to a data file by the driver.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_notification: Option<Value>,
    /// Opaque user-activity payload, written to a data file by the driver.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_activity: Option<Value>,
    /// On-site launch arguments; win over prebaked store entries on collision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_args: Option<Map<String, Value>>,
    /// Language/locale to launch under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_and_locale: Option<LanguageAndLocale>,
    /// Permission overrides to apply before the app's first frame renders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<BTreeMap<String, String>>,
    /// Disable touch indicators for this launch.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disable_touch_indicators: bool,
}

impl LaunchRequest {
    /// Names of the payload parameters set on this request, in declaration
    /// order. More than one is a validation failure.
    pub fn payload_params(&self) -> Vec<&'static str> {
        let mut set = Vec::new();
        if self.url.is_some() {
            set.push("url");
        }
        if self.user_notification.is_some() {
            set.push("user_notification");
        }
        if self.user_activity.is_some() {
            set.push("user_activity");
        }
        set
    }

    /// Whether the request carries something deliverable to a running process.
    pub fn has_payload_param(&self) -> bool {
        self.url.is_some() || self.user_notification.is_some() || self.user_activity.is_some()
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Object handed to `deliver_payload` for an already-running process.
///
/// Exactly one of the three content fields is set. `delay_payload` marks
/// deliveries that accompany a foregrounding rather than an in-place send.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeliveryPayload {
    #[serde(rename = "delayPayload", default, skip_serializing_if = "is_false")]
    pub delay_payload: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "sourceApp", skip_serializing_if = "Option::is_none")]
    pub source_app: Option<String>,
    #[serde(
        rename = "detoxUserNotificationDataURL",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_notification_data_url: Option<String>,
    #[serde(
        rename = "detoxUserActivityDataURL",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_activity_data_url: Option<String>,
}

impl DeliveryPayload {
    /// Delivery of a deep-link URL, with an optional source application.
    pub fn open_url(url: impl Into<String>, source_app: Option<String>) -> Self {
        Self {
            url: Some(url.into()),
            source_app,
            ..Self::default()
        }
    }

    /// Delivery of a user notification via its data-file URL.
    pub fn user_notification(data_url: impl Into<String>) -> Self {
        Self {
            user_notification_data_url: Some(data_url.into()),
            ..Self::default()
        }
    }

    /// Delivery of a user activity via its data-file URL.
    pub fn user_activity(data_url: impl Into<String>) -> Self {
        Self {
            user_activity_data_url: Some(data_url.into()),
            ..Self::default()
        }
    }

    /// Mark the delivery as delayed until the app is foregrounded.
    pub fn delayed(mut self) -> Self {
        self.delay_payload = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_params_reports_set_fields_in_order() {
        let request = LaunchRequest {
            url: Some("scheme://x".into()),
            user_activity: Some(json!({"kind": "browse"})),
            ..LaunchRequest::default()
        };
        assert_eq!(request.payload_params(), vec!["url", "user_activity"]);
    }

    #[test]
    fn empty_request_has_no_payload_param() {
        assert!(!LaunchRequest::default().has_payload_param());
        assert!(LaunchRequest::default().payload_params().is_empty());
    }

    #[test]
    fn delivery_payload_serializes_with_wire_keys() {
        let delivery = DeliveryPayload::open_url("scheme://x", None).delayed();
        let json = serde_json::to_value(&delivery).unwrap();
        assert_eq!(json, json!({"delayPayload": true, "url": "scheme://x"}));

        let delivery = DeliveryPayload::user_notification("file:///n.json");
        let json = serde_json::to_value(&delivery).unwrap();
        assert_eq!(json, json!({"detoxUserNotificationDataURL": "file:///n.json"}));
    }

    #[test]
    fn launch_request_round_trips_camel_case() {
        let request = LaunchRequest {
            new_instance: Some(false),
            url: Some("scheme://x".into()),
            source_app: Some("com.other.app".into()),
            ..LaunchRequest::default()
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["newInstance"], json!(false));
        assert_eq!(json["sourceApp"], json!("com.other.app"));
        let back: LaunchRequest = serde_json::from_value(json).unwrap();
        assert_eq!(back, request);
    }
}
