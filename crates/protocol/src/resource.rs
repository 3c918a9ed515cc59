//! Resource descriptors returned by remote operations

use serde::{Deserialize, Serialize};

/// A user account on the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub screen_name: String,
    pub name: String,
}

impl User {
    /// Placeholder author for descriptors built without remote data.
    pub fn unknown() -> Self {
        Self {
            id: "unknown".into(),
            screen_name: "unknown".into(),
            name: "Unknown User".into(),
        }
    }
}

/// A post on the remote service.
///
/// `degraded` marks a descriptor that was synthesized locally because the
/// remote acknowledgement did not carry the full post. Only `id` is
/// authoritative on a degraded post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub text: String,
    pub author: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quoted_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media_ids: Vec<String>,
    #[serde(default)]
    pub is_repost: bool,
    #[serde(default)]
    pub degraded: bool,
}

impl Post {
    /// Minimal descriptor for a successful bare repost of `target_id`.
    pub fn degraded_repost(target_id: &str) -> Self {
        Self {
            id: target_id.to_string(),
            text: format!("Reposted post {target_id}"),
            author: User::unknown(),
            in_reply_to: None,
            quoted_url: None,
            media_ids: Vec::new(),
            is_repost: true,
            degraded: true,
        }
    }
}

/// Either descriptor kind, for the generic dispatch entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Resource {
    Post(Post),
    User(User),
}

impl Resource {
    /// Id of the described resource.
    pub fn id(&self) -> &str {
        match self {
            Resource::Post(post) => &post.id,
            Resource::User(user) => &user.id,
        }
    }

    /// Whether this is a locally synthesized descriptor.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Resource::Post(post) if post.degraded)
    }
}

/// Parameters of a create-post call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PostDraft {
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub media_ids: Vec<String>,
    /// URL of the referenced resource, for quoted reposts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

impl PostDraft {
    pub fn new(text: impl Into<String>, media_ids: Vec<String>) -> Self {
        Self {
            text: text.into(),
            media_ids,
            ..Self::default()
        }
    }

    pub fn quoting(mut self, attachment_url: impl Into<String>) -> Self {
        self.attachment_url = Some(attachment_url.into());
        self
    }

    pub fn replying_to(mut self, post_id: impl Into<String>) -> Self {
        self.reply_to = Some(post_id.into());
        self
    }
}

/// Acknowledgement of a bare requote.
///
/// Most remote responses only confirm the action; `post` is filled in when
/// the response happened to carry the full target post.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequoteAck {
    pub target_id: String,
    pub post: Option<Post>,
}

/// Profile fields to update. Absent fields are left untouched remotely and
/// are not serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Hex color without the leading `#`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_link_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_entities: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_status: Option<bool>,
}

impl ProfileUpdate {
    /// Names of the fields that will be sent.
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.name.is_some() {
            names.push("name");
        }
        if self.description.is_some() {
            names.push("description");
        }
        if self.location.is_some() {
            names.push("location");
        }
        if self.url.is_some() {
            names.push("url");
        }
        if self.profile_link_color.is_some() {
            names.push("profile_link_color");
        }
        if self.include_entities.is_some() {
            names.push("include_entities");
        }
        if self.skip_status.is_some() {
            names.push("skip_status");
        }
        names
    }

    pub fn is_empty(&self) -> bool {
        self.field_names().is_empty()
    }

    /// Supplied fields as a JSON object, ready for a form or JSON body.
    pub fn to_fields(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }
}
