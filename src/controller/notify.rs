//! Push notification output.

use serde::Serialize;

use crate::cache::current_timestamp_ms;

/// Icon used for the notification, its badge and its actions.
pub const NOTIFICATION_ICON: &str = "/logo192.png";

/// Action that opens the application.
pub const EXPLORE_ACTION: &str = "explore";

pub const CLOSE_ACTION: &str = "close";

/// A notification ready to hand to the platform's display API.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    /// Unix milliseconds when the push arrived
    pub date_of_arrival: u64,
    pub primary_key: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

impl Notification {
    /// Builds the notification for a push, using a generic body when the
    /// push carried no text.
    pub fn for_push(app_name: &str, payload: Option<&str>) -> Self {
        let body = payload
            .filter(|text| !text.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("New notification from {}", app_name));

        Self {
            title: app_name.to_string(),
            body,
            icon: NOTIFICATION_ICON.to_string(),
            badge: NOTIFICATION_ICON.to_string(),
            vibrate: vec![100, 50, 100],
            data: NotificationData {
                date_of_arrival: current_timestamp_ms(),
                primary_key: 1,
            },
            actions: vec![
                NotificationAction {
                    action: EXPLORE_ACTION.to_string(),
                    title: "View Report".to_string(),
                    icon: NOTIFICATION_ICON.to_string(),
                },
                NotificationAction {
                    action: CLOSE_ACTION.to_string(),
                    title: "Close".to_string(),
                    icon: NOTIFICATION_ICON.to_string(),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_with_text() {
        let n = Notification::for_push("RashTrackr", Some("Your report was resolved"));
        assert_eq!(n.title, "RashTrackr");
        assert_eq!(n.body, "Your report was resolved");
        assert_eq!(n.vibrate, vec![100, 50, 100]);
        assert_eq!(n.data.primary_key, 1);
        assert_eq!(n.actions.len(), 2);
        assert_eq!(n.actions[0].action, "explore");
        assert_eq!(n.actions[1].action, "close");
    }

    #[test]
    fn test_push_without_text_uses_default_body() {
        let n = Notification::for_push("RashTrackr", None);
        assert_eq!(n.body, "New notification from RashTrackr");
        let empty = Notification::for_push("RashTrackr", Some(""));
        assert_eq!(empty.body, "New notification from RashTrackr");
    }

    #[test]
    fn test_serializes_camel_case() {
        let value = serde_json::to_value(Notification::for_push("App", None)).unwrap();
        assert!(value["data"]["dateOfArrival"].as_u64().unwrap() > 0);
        assert_eq!(value["data"]["primaryKey"], 1);
        assert_eq!(value["badge"], "/logo192.png");
    }
}
