//! Quote-reference probing
//!
//! The remote service accepts a quoted post only when the referenced post is
//! given in a URL form it currently recognizes, and which forms work changes
//! over time. The prober tries each configured template in order on the same
//! session and stops at the first accepted one. Only the last fault survives
//! exhaustion.

use protocol::{Fault, FaultKind, Post, PostDraft, RemoteClient, Session};
use tracing::{error, info, warn};

use crate::metrics;

/// Placeholder replaced by the target post id.
pub const ID_PLACEHOLDER: &str = "{id}";

pub const DEFAULT_REFERENCE_TEMPLATES: &[&str] = &[
    "https://x.com/i/status/{id}",
    "https://twitter.com/i/web/status/{id}",
];

#[derive(Debug, Clone)]
pub struct ReferenceProber {
    templates: Vec<String>,
}

impl Default for ReferenceProber {
    fn default() -> Self {
        Self::new(
            DEFAULT_REFERENCE_TEMPLATES
                .iter()
                .map(|t| t.to_string())
                .collect(),
        )
    }
}

impl ReferenceProber {
    pub fn new(templates: Vec<String>) -> Self {
        Self { templates }
    }

    pub fn templates(&self) -> &[String] {
        &self.templates
    }

    /// Every reference URL for `target_id`, in attempt order.
    pub fn reference_urls(&self, target_id: &str) -> Vec<String> {
        self.templates
            .iter()
            .map(|t| t.replace(ID_PLACEHOLDER, target_id))
            .collect()
    }

    /// Publish `text` quoting `target_id`, trying each reference format until
    /// one is accepted.
    ///
    /// On exhaustion the returned fault wraps the last attempt's fault and
    /// keeps its kind, so recovery reacts to the last attempt's failure
    /// (a rate limit on the final format locks the queue).
    pub async fn probe(
        &self,
        client: &dyn RemoteClient,
        session: &Session,
        text: &str,
        media_ids: &[String],
        target_id: &str,
    ) -> Result<Post, Fault> {
        let mut last_fault = None;

        for (index, url) in self.reference_urls(target_id).into_iter().enumerate() {
            let attempt = index + 1;
            info!(attempt, url = %url, target_id, "trying quote reference");

            let draft = PostDraft::new(text, media_ids.to_vec()).quoting(url.clone());
            match client.create_post(session, &draft).await {
                Ok(post) => {
                    metrics::record_probe_attempt(true);
                    info!(attempt, url = %url, post_id = %post.id, "quote reference accepted");
                    return Ok(post);
                }
                Err(fault) => {
                    metrics::record_probe_attempt(false);
                    warn!(attempt, url = %url, error = %fault, "quote reference rejected");
                    last_fault = Some(fault);
                }
            }
        }

        match last_fault {
            Some(last) => {
                let attempts = self.templates.len();
                error!(attempts, target_id, error = %last, "every quote reference format failed");
                Err(Fault::wrap(
                    format!("quoting post {target_id} failed with all {attempts} reference formats"),
                    last,
                ))
            }
            None => Err(Fault::new(
                FaultKind::Unclassified,
                "no quote reference formats configured",
            )),
        }
    }
}
