//! Action executor
//!
//! Performs one action on an already-authenticated session. Faults from the
//! client pass through untouched; classification and recovery happen in the
//! dispatcher.

use protocol::{Fault, Post, PostDraft, ProfileUpdate, RemoteClient, Session, User};
use tracing::{debug, info, warn};

use crate::config::RequotePolicy;
use crate::probe::ReferenceProber;

pub struct Executor<'a> {
    client: &'a dyn RemoteClient,
    session: &'a Session,
    prober: &'a ReferenceProber,
    requote_policy: RequotePolicy,
}

impl<'a> Executor<'a> {
    pub fn new(
        client: &'a dyn RemoteClient,
        session: &'a Session,
        prober: &'a ReferenceProber,
        requote_policy: RequotePolicy,
    ) -> Self {
        Self {
            client,
            session,
            prober,
            requote_policy,
        }
    }

    pub async fn create_post(&self, text: &str, media_ids: &[String]) -> Result<Post, Fault> {
        let draft = PostDraft::new(text, media_ids.to_vec());
        self.client.create_post(self.session, &draft).await
    }

    /// Requote `target_id`. Non-blank commentary publishes a quoted post via
    /// the reference prober; otherwise a bare requote is issued. Commentary
    /// is published exactly as given.
    pub async fn requote(
        &self,
        target_id: &str,
        commentary: Option<&str>,
        media_ids: &[String],
    ) -> Result<Post, Fault> {
        match commentary.filter(|c| !c.trim().is_empty()) {
            Some(text) => {
                self.prober
                    .probe(self.client, self.session, text, media_ids, target_id)
                    .await
            }
            None => self.bare_requote(target_id).await,
        }
    }

    async fn bare_requote(&self, target_id: &str) -> Result<Post, Fault> {
        let ack = self.client.requote(self.session, target_id).await?;
        if let Some(post) = ack.post {
            return Ok(post);
        }

        match self.requote_policy {
            RequotePolicy::Degrade => {
                debug!(target_id, "requote acknowledged without post, returning degraded descriptor");
                Ok(Post::degraded_repost(target_id))
            }
            RequotePolicy::Enrich => match self.client.fetch_post(self.session, target_id).await {
                Ok(post) => Ok(post),
                Err(fault) => {
                    warn!(target_id, error = %fault, "could not fetch requoted post, returning degraded descriptor");
                    Ok(Post::degraded_repost(target_id))
                }
            },
        }
    }

    pub async fn reply(
        &self,
        target_id: &str,
        text: &str,
        media_ids: &[String],
    ) -> Result<Post, Fault> {
        let draft = PostDraft::new(text, media_ids.to_vec()).replying_to(target_id);
        self.client.create_post(self.session, &draft).await
    }

    pub async fn follow(&self, user_id: &str) -> Result<User, Fault> {
        self.client.follow(self.session, user_id).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, Fault> {
        let user = self.client.update_profile(self.session, update).await?;
        let description = update.description.as_deref().map(preview);
        info!(
            fields = ?update.field_names(),
            description = description.as_deref(),
            "profile updated"
        );
        Ok(user)
    }
}

const DESCRIPTION_PREVIEW_CHARS: usize = 50;

fn preview(text: &str) -> String {
    if text.chars().count() <= DESCRIPTION_PREVIEW_CHARS {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
    cut.push_str("...");
    cut
}
