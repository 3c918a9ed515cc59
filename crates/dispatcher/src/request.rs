//! Generic action requests
//!
//! `ActionRequest` describes any action as data, for callers that route work
//! from a job queue rather than calling the typed operations directly.

use protocol::ProfileUpdate;
use serde::Deserialize;

/// One write action and its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    CreatePost {
        text: String,
        #[serde(default)]
        media_ids: Vec<String>,
    },
    Requote {
        target_id: String,
        #[serde(default)]
        commentary: Option<String>,
        #[serde(default)]
        media_ids: Vec<String>,
    },
    Reply {
        target_id: String,
        text: String,
        #[serde(default)]
        media_ids: Vec<String>,
    },
    Follow {
        user_id: String,
    },
    UpdateProfile {
        #[serde(flatten)]
        fields: ProfileUpdate,
    },
}

/// An action plus the optional credential the caller wants it performed as.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActionRequest {
    #[serde(flatten)]
    pub action: Action,
    /// Explicit credential handle; bypasses queue-based leasing
    #[serde(default)]
    pub credential: Option<String>,
}

impl ActionRequest {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            credential: None,
        }
    }

    pub fn as_credential(mut self, handle: impl Into<String>) -> Self {
        self.credential = Some(handle.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_tagged_request() {
        let request: ActionRequest = serde_json::from_str(
            r#"{"action":"reply","target_id":"7","text":"hi","credential":"alice"}"#,
        )
        .unwrap();
        assert_eq!(request.credential.as_deref(), Some("alice"));
        assert_eq!(
            request.action,
            Action::Reply {
                target_id: "7".into(),
                text: "hi".into(),
                media_ids: vec![],
            }
        );
    }

    #[test]
    fn deserializes_profile_update_fields() {
        let request: ActionRequest =
            serde_json::from_str(r#"{"action":"update_profile","name":"New Name"}"#).unwrap();
        let Action::UpdateProfile { fields } = &request.action else {
            panic!("expected update_profile, got {:?}", request.action);
        };
        assert_eq!(fields.name.as_deref(), Some("New Name"));
        assert!(fields.description.is_none());
        assert!(request.credential.is_none());
    }
}
