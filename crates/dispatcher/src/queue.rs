//! Action kinds and their rate-limit queues
//!
//! The remote service rate-limits per operation, so credentials are leased
//! and locked per queue. Quoted requotes are published as posts and share the
//! post queue; bare requotes have their own.

use std::fmt;

pub const CREATE_TWEET: &str = "CreateTweet";
pub const RETWEET: &str = "Retweet";
pub const CREATE_FRIENDSHIP: &str = "CreateFriendship";
pub const UPDATE_PROFILE: &str = "UpdateProfile";

/// Suffix of the bucket locked when an account lacks permission for a queue.
pub const OPS_SUFFIX: &str = "_ops";

/// Kind of write action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    CreatePost,
    /// `quoted` is true when the requote carries commentary
    Requote { quoted: bool },
    Reply,
    Follow,
    UpdateProfile,
}

impl ActionKind {
    /// Requote kind for the given commentary. Whitespace-only commentary is
    /// a bare requote.
    pub fn requote(commentary: Option<&str>) -> Self {
        let quoted = commentary.is_some_and(|c| !c.trim().is_empty());
        ActionKind::Requote { quoted }
    }

    /// Label for logging and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::CreatePost => "create_post",
            ActionKind::Requote { quoted: false } => "requote",
            ActionKind::Requote { quoted: true } => "quoted_requote",
            ActionKind::Reply => "reply",
            ActionKind::Follow => "follow",
            ActionKind::UpdateProfile => "update_profile",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rate-limit queue an action is leased and locked against.
pub fn resolve(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::CreatePost | ActionKind::Reply => CREATE_TWEET,
        ActionKind::Requote { quoted: true } => CREATE_TWEET,
        ActionKind::Requote { quoted: false } => RETWEET,
        ActionKind::Follow => CREATE_FRIENDSHIP,
        ActionKind::UpdateProfile => UPDATE_PROFILE,
    }
}

/// Bucket locked on a permission denial for `queue`.
pub fn ops_bucket(queue: &str) -> String {
    format!("{queue}{OPS_SUFFIX}")
}
