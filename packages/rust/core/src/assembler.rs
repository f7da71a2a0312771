//! Note assembly: one full note body plus every tag it references.
//!
//! A note is only handed back once each of its tag lookups has finished,
//! successfully or not. Tag lookups run concurrently and are joined before the
//! [`Note`] is built; a failed lookup is recorded on the note instead of
//! failing it.

use futures::future::join_all;
use tracing::{debug, error, instrument, warn};

use steamlib_remote::NoteBodyOptions;
use steamlib_shared::{Note, Result, SteamError, Tag};

use crate::context::RunContext;
use crate::mapping;

/// Fetch, map and tag-resolve a single note.
///
/// `fallback_title` is the listing title, used when the body carries none.
#[instrument(skip_all, fields(note_guid = %note_guid))]
pub(crate) async fn assemble_note(
    ctx: &RunContext<'_>,
    note_guid: &str,
    fallback_title: &str,
) -> Result<Note> {
    let remote = match ctx
        .gateway
        .get_note(note_guid, NoteBodyOptions::everything())
        .await
    {
        Ok(Some(remote)) => remote,
        Ok(None) => {
            let err = SteamError::note_fetch(note_guid, SteamError::empty_response("note body"));
            error!(error = %err, "note fetch returned no body");
            return Err(err);
        }
        Err(e) => {
            let err = SteamError::note_fetch(note_guid, e);
            error!(error = %err, "note fetch failed");
            return Err(err);
        }
    };

    let draft = mapping::note_draft(remote, fallback_title);

    // Every lookup is joined here; nothing is left running past this point.
    let lookups = draft
        .tag_guids()
        .iter()
        .map(|guid| async move { (guid.clone(), resolve_tag(ctx, guid).await) });
    let outcomes = join_all(lookups).await;

    let mut tags = Vec::with_capacity(outcomes.len());
    let mut unresolved = Vec::new();
    for (tag_guid, outcome) in outcomes {
        match outcome {
            Ok(tag) => tags.push(tag),
            Err(e) => {
                warn!(tag_guid = %tag_guid, error = %e, "tag lookup failed, omitting tag");
                ctx.progress.tag_failed(draft.guid(), &tag_guid, &e);
                unresolved.push(tag_guid);
            }
        }
    }

    let note = draft.resolve(tags, unresolved);
    debug!(
        tags = note.tags.len(),
        unresolved = note.unresolved_tag_guids.len(),
        "note assembled"
    );
    ctx.progress.note_assembled(&note.title);
    Ok(note)
}

async fn resolve_tag(ctx: &RunContext<'_>, guid: &str) -> Result<Tag> {
    match &ctx.tag_cache {
        Some(cache) => cache.get_or_fetch(guid, || fetch_tag(ctx, guid)).await,
        None => fetch_tag(ctx, guid).await,
    }
}

async fn fetch_tag(ctx: &RunContext<'_>, guid: &str) -> Result<Tag> {
    ctx.gateway
        .get_tag(guid)
        .await
        .map(mapping::tag)
        .map_err(|e| SteamError::tag_fetch(guid, e))
}
