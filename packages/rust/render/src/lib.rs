//! Note markup rendering.
//!
//! Turns the note service's XHTML-based markup (an `<en-note>` root with
//! `<en-media>`, `<en-todo>` and `<en-crypt>` extensions) into an HTML
//! document fragment and a plaintext rendering. Rendering is pure: it performs
//! no I/O and never fails, malformed markup is parsed leniently by `scraper`.

mod html;
mod plaintext;

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;
use tracing::{debug, instrument};

use steamlib_shared::Resource;

/// Both renderings of a note body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedContent {
    pub plaintext: String,
    pub html: String,
}

/// Render note markup to plaintext and HTML.
///
/// `resources` are the note's attachments; `<en-media hash=..>` elements are
/// matched against [`Resource::hash`].
#[instrument(skip_all, fields(markup_len = markup.len(), resources = resources.len()))]
pub fn render(markup: &str, resources: &[Resource]) -> RenderedContent {
    if markup.trim().is_empty() {
        return RenderedContent::default();
    }

    let prepared = prepare_markup(markup);
    let fragment = Html::parse_fragment(&prepared);
    let root = fragment.root_element();

    let html = html::render_children(root, resources).trim().to_string();
    let plaintext = plaintext::render_children(root, resources);

    debug!(
        html_len = html.len(),
        plaintext_len = plaintext.len(),
        "markup rendered"
    );

    RenderedContent { plaintext, html }
}

/// Strip the XML prolog and doctype, and expand self-closing vendor elements.
///
/// The HTML parser ignores `/>` on unknown elements, which would otherwise
/// swallow every following sibling into an `<en-media>` or `<en-todo>`.
fn prepare_markup(markup: &str) -> String {
    static PROLOG_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?is)<\?xml.*?\?>").expect("valid regex"));
    static DOCTYPE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?is)<!DOCTYPE[^>]*>").expect("valid regex"));
    static SELF_CLOSING_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?is)<(en-media|en-todo)(\s[^>]*?)?\s*/>").expect("valid regex")
    });

    let without_prolog = PROLOG_RE.replace_all(markup, "");
    let without_doctype = DOCTYPE_RE.replace_all(&without_prolog, "");
    SELF_CLOSING_RE
        .replace_all(&without_doctype, "<$1$2></$1>")
        .into_owned()
}

/// Find the resource an `<en-media hash=..>` element refers to.
pub(crate) fn find_resource<'a>(resources: &'a [Resource], hash: &str) -> Option<&'a Resource> {
    resources.iter().find(|r| {
        r.hash
            .as_deref()
            .is_some_and(|h| h.eq_ignore_ascii_case(hash))
    })
}
