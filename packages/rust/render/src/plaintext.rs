//! Plaintext rendering of parsed note markup.
//!
//! The tree walk emits rough text with explicit line breaks around block
//! elements; a short cleanup pipeline then normalizes whitespace.

use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;

use steamlib_shared::Resource;

use crate::find_resource;
use crate::html::is_checked;

/// Elements rendered on their own line(s).
const BLOCK_ELEMENTS: &[&str] = &[
    "en-note", "div", "p", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "blockquote", "pre",
    "table", "tr", "hr", "address", "center", "dl", "dt", "dd",
];

/// Elements whose content never reaches the plaintext.
const DROPPED_ELEMENTS: &[&str] = &["script", "style", "iframe", "object"];

pub(crate) fn render_children(parent: ElementRef<'_>, resources: &[Resource]) -> String {
    let mut out = String::new();
    write_children(parent, resources, &mut out);
    run_pipeline(&out)
}

fn write_children(parent: ElementRef<'_>, resources: &[Resource], out: &mut String) {
    for child in parent.children() {
        if let Some(el) = ElementRef::wrap(child) {
            write_element(el, resources, out);
        } else if let Some(text) = child.value().as_text() {
            push_text(out, text);
        }
    }
}

fn write_element(el: ElementRef<'_>, resources: &[Resource], out: &mut String) {
    let element = el.value();
    match element.name() {
        "br" => out.push('\n'),
        "en-todo" => out.push_str(if is_checked(element) { "[x] " } else { "[ ] " }),
        "en-crypt" => push_text(out, "[encrypted]"),
        "en-media" => {
            let hash = element.attr("hash").unwrap_or_default();
            let label = find_resource(resources, hash)
                .and_then(|r| r.file_name.as_deref())
                .or(element.attr("type"))
                .unwrap_or("attachment");
            push_text(out, &format!("[{label}]"));
        }
        "li" => {
            ensure_line_break(out);
            out.push_str("- ");
            write_children(el, resources, out);
            ensure_line_break(out);
        }
        "td" | "th" => {
            write_children(el, resources, out);
            out.push('\t');
        }
        name if DROPPED_ELEMENTS.contains(&name) => {}
        name if BLOCK_ELEMENTS.contains(&name) => {
            ensure_line_break(out);
            write_children(el, resources, out);
            ensure_line_break(out);
        }
        _ => write_children(el, resources, out),
    }
}

/// Append text with HTML whitespace semantics (runs collapse to one space).
fn push_text(out: &mut String, text: &str) {
    let mut collapsed = String::with_capacity(text.len());
    let mut last_was_space = out.is_empty() || out.ends_with(['\n', ' ']);
    for c in text.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                collapsed.push(' ');
                last_was_space = true;
            }
        } else {
            collapsed.push(c);
            last_was_space = false;
        }
    }
    out.push_str(&collapsed);
}

fn ensure_line_break(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

// ---------------------------------------------------------------------------
// Cleanup pipeline
// ---------------------------------------------------------------------------

fn run_pipeline(text: &str) -> String {
    let mut result = trim_line_edges(text);
    result = collapse_blank_lines(&result);
    result.trim().to_string()
}

/// Strip spaces and tabs at the start and end of every line.
fn trim_line_edges(text: &str) -> String {
    text.lines()
        .map(|line| line.trim_matches([' ', '\t']))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collapse runs of 2+ blank lines into one.
fn collapse_blank_lines(text: &str) -> String {
    static MULTI_BLANK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

    MULTI_BLANK_RE.replace_all(text, "\n\n").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn plain(markup: &str) -> String {
        let fragment = Html::parse_fragment(markup);
        render_children(fragment.root_element(), &[])
    }

    #[test]
    fn whitespace_collapses() {
        assert_eq!(plain("<div>  lots \n\n of   space </div>"), "lots of space");
    }

    #[test]
    fn br_breaks_lines() {
        assert_eq!(plain("<div>one<br/>two</div>"), "one\ntwo");
    }

    #[test]
    fn blank_lines_collapse() {
        assert_eq!(plain("<p>a</p><br><br><br><br><p>b</p>"), "a\n\nb");
    }

    #[test]
    fn table_cells_are_tab_separated() {
        let text = plain("<table><tr><td>a</td><td>b</td></tr><tr><td>c</td><td>d</td></tr></table>");
        assert_eq!(text, "a\tb\nc\td");
    }

    #[test]
    fn media_without_resource_uses_mime() {
        assert_eq!(
            plain(r#"<en-media type="audio/wav" hash="00"></en-media>"#),
            "[audio/wav]"
        );
    }
}
