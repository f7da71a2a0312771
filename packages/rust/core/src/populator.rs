//! Notebook population: list a notebook's note summaries, then assemble every
//! note concurrently and attach them once all assemblies have finished.

use futures::future::join_all;
use tracing::{error, info, instrument, warn};

use steamlib_shared::{Note, NoteFilter, NoteSummary, Notebook, Result, SteamError};

use crate::assembler::assemble_note;
use crate::context::RunContext;
use crate::mapping;

/// List note summaries for `filter`.
///
/// Without `all_pages` only the first page is requested; a notebook holding
/// more notes than that is truncated and a warning is logged.
#[instrument(skip_all, fields(notebook_guid = %filter.notebook_guid, page_size = page_size))]
pub(crate) async fn list_summaries(
    ctx: &RunContext<'_>,
    filter: &NoteFilter,
    page_size: u32,
) -> Result<Vec<NoteSummary>> {
    let guid = filter.notebook_guid.as_str();
    let mut summaries = Vec::new();
    let mut offset = 0u32;

    loop {
        let page = ctx
            .gateway
            .find_notes_metadata(filter, offset, page_size, &ctx.options.field_spec)
            .await
            .and_then(|page| page.ok_or_else(|| SteamError::empty_response("note listing")))
            .map_err(|e| {
                let err = SteamError::note_list(guid, e);
                error!(offset, error = %err, "note listing failed");
                err
            })?;

        let fetched = page.notes.len() as u32;
        let total = page.total_notes;
        summaries.extend(page.notes.into_iter().map(mapping::summary));

        if !ctx.options.all_pages {
            if total > fetched {
                warn!(
                    listed = fetched,
                    total, "notebook has more notes than one page, returning first page only"
                );
            }
            break;
        }

        offset = offset.saturating_add(page_size);
        if fetched < page_size || (total > 0 && offset >= total) {
            break;
        }
    }

    Ok(summaries)
}

/// Fill `notebook.notes` with fully assembled notes.
///
/// `filter` defaults to every active note in the notebook and must target the
/// same notebook when supplied. `page_size` defaults to the configured size.
#[instrument(skip_all, fields(notebook_guid = %notebook.guid, name = %notebook.name))]
pub(crate) async fn populate(
    ctx: &RunContext<'_>,
    mut notebook: Notebook,
    filter: Option<NoteFilter>,
    page_size: Option<u32>,
) -> Result<Notebook> {
    let page_size = page_size.unwrap_or(ctx.options.page_size);
    if page_size == 0 {
        return Err(SteamError::validation("page size must be at least 1"));
    }

    let filter = match filter {
        Some(f) if f.notebook_guid != notebook.guid => {
            return Err(SteamError::validation(format!(
                "filter targets notebook {} but {} was requested",
                f.notebook_guid, notebook.guid
            )));
        }
        Some(f) => f,
        None => NoteFilter::for_notebook(notebook.guid.as_str())
            .map_err(|e| SteamError::note_list(notebook.guid.as_str(), e))?
            .with_time_zone(ctx.options.time_zone.as_str()),
    };

    let summaries = list_summaries(ctx, &filter, page_size).await?;

    let assemblies = summaries
        .iter()
        .map(|s| assemble_note(ctx, &s.guid, &s.title));
    let results = join_all(assemblies).await;
    let notes = results.into_iter().collect::<Result<Vec<Note>>>()?;

    notebook.notes = notes
        .into_iter()
        .filter(|note| {
            let belongs = note.notebook_guid == notebook.guid;
            if !belongs {
                warn!(
                    note_guid = %note.guid,
                    found_in = %note.notebook_guid,
                    "listed note belongs to another notebook, skipping"
                );
            }
            belongs
        })
        .collect();

    info!(notes = notebook.notes.len(), "notebook populated");
    ctx.progress
        .notebook_populated(&notebook.name, notebook.notes.len());
    Ok(notebook)
}
