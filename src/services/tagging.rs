use tracing::instrument;

use crate::{
    db::{Commit, TagStore},
    error::AppResult,
    models::Tag,
    services::terms::TermExtractor,
};

/// What happened to an article's terms when tags were created from them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagOutcome {
    /// Extraction yielded at least one keyword or concept
    pub had_terms: bool,
    /// Tags that did not exist before
    pub created: Vec<Tag>,
}

/// Creates tags from the most relevant terms of the article at `url`
///
/// Concepts come before keywords, and only the first `max_tags` candidates
/// are attempted. Candidates that already exist as tags, or that fail to
/// persist, are dropped.
#[instrument(skip(store, extractor))]
pub async fn create_tags<S>(
    store: &S,
    extractor: &TermExtractor,
    url: &str,
    max_tags: usize,
) -> AppResult<TagOutcome>
where
    S: TagStore + ?Sized,
{
    let terms = extractor.relevant_terms(url).await?;
    if terms.is_empty() {
        return Ok(TagOutcome::default());
    }

    let mut created = Vec::new();
    for keyword in terms.into_candidates().into_iter().take(max_tags) {
        match store.create_tag(&keyword).await {
            Commit::Committed(tag) => created.push(tag),
            Commit::Duplicate | Commit::Failed => {
                tracing::debug!(keyword = %keyword, "Tag not created");
            }
        }
    }

    tracing::info!(created = created.len(), "Created tags for article");

    Ok(TagOutcome {
        had_terms: true,
        created,
    })
}
