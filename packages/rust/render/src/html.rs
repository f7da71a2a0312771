//! HTML rendering of parsed note markup.

use scraper::ElementRef;
use scraper::node::Element;

use steamlib_shared::Resource;

use crate::find_resource;

/// Elements that never carry a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements dropped with their content.
const DROPPED_ELEMENTS: &[&str] = &["script", "style", "iframe", "object"];

/// Attributes whose value is loaded or navigated to.
const URL_ATTRIBUTES: &[&str] = &[
    "href", "src", "action", "formaction", "xlink:href", "background", "poster",
];

pub(crate) fn render_children(parent: ElementRef<'_>, resources: &[Resource]) -> String {
    let mut out = String::new();
    write_children(parent, resources, &mut out);
    out
}

fn write_children(parent: ElementRef<'_>, resources: &[Resource], out: &mut String) {
    for child in parent.children() {
        if let Some(el) = ElementRef::wrap(child) {
            write_element(el, resources, out);
        } else if let Some(text) = child.value().as_text() {
            out.push_str(&escape(text, false));
        }
    }
}

fn write_element(el: ElementRef<'_>, resources: &[Resource], out: &mut String) {
    let element = el.value();
    match element.name() {
        "en-note" => {
            out.push_str("<div>");
            write_children(el, resources, out);
            out.push_str("</div>");
        }
        "en-media" => write_media(element, resources, out),
        "en-todo" => {
            out.push_str(r#"<input type="checkbox" disabled"#);
            if is_checked(element) {
                out.push_str(" checked");
            }
            out.push('>');
        }
        "en-crypt" => {
            out.push_str(r#"<span class="en-crypt""#);
            if let Some(hint) = element.attr("hint") {
                push_attr(out, "title", hint);
            }
            out.push_str(">[encrypted]</span>");
        }
        name if DROPPED_ELEMENTS.contains(&name) => {}
        name => {
            out.push('<');
            out.push_str(name);
            for (attr, value) in element.attrs() {
                if attr.starts_with("on") {
                    continue;
                }
                if URL_ATTRIBUTES.contains(&attr) && !is_safe_url(value) {
                    continue;
                }
                push_attr(out, attr, value);
            }
            out.push('>');

            if VOID_ELEMENTS.contains(&name) {
                return;
            }

            write_children(el, resources, out);
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
    }
}

/// Images inline as `<img>`, everything else links to the resource.
///
/// The target is a data URI when the resource body was fetched, otherwise a
/// `resource:<hash>` reference the consumer can resolve.
fn write_media(element: &Element, resources: &[Resource], out: &mut String) {
    let hash = element.attr("hash").unwrap_or_default();
    let resource = find_resource(resources, hash);

    let mime = element
        .attr("type")
        .or(resource.map(|r| r.mime.as_str()))
        .unwrap_or("application/octet-stream");
    let target = resource
        .and_then(|r| r.data.as_deref())
        .map(|data| format!("data:{mime};base64,{data}"))
        .filter(|uri| is_safe_url(uri))
        .unwrap_or_else(|| format!("resource:{}", hash.to_ascii_lowercase()));
    let label = resource
        .and_then(|r| r.file_name.as_deref())
        .unwrap_or(hash);

    if mime.starts_with("image/") {
        out.push_str("<img");
        push_attr(out, "src", &target);
        push_attr(out, "alt", label);
        for dim in ["width", "height"] {
            if let Some(value) = element.attr(dim) {
                push_attr(out, dim, value);
            }
        }
        out.push('>');
    } else {
        out.push_str("<a");
        push_attr(out, "href", &target);
        out.push('>');
        out.push_str(&escape(label, false));
        out.push_str("</a>");
    }
}

/// `false` for script schemes and for `data:` URIs that are not images.
///
/// Browsers ignore whitespace and control characters inside the scheme, so
/// those are stripped before comparing.
fn is_safe_url(value: &str) -> bool {
    let normalized: String = value
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase();

    if normalized.starts_with("javascript:") || normalized.starts_with("vbscript:") {
        return false;
    }
    if normalized.starts_with("data:") {
        return normalized.starts_with("data:image/");
    }
    true
}

pub(crate) fn is_checked(element: &Element) -> bool {
    element
        .attr("checked")
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape(value, true));
    out.push('"');
}

fn escape(s: &str, in_attr: bool) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' if in_attr => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }
    escaped
}
