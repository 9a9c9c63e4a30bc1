use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Node};

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Elements whose text is never rendered.
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Flatten an HTML document to its visible text with every whitespace run
/// collapsed to a single ASCII space.
pub fn normalize_html(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut text = String::with_capacity(html.len() / 2);

    for node in document.tree.root().descendants() {
        let Node::Text(t) = node.value() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element())
            .is_some_and(|e| HIDDEN_TAGS.contains(&e.name()));
        if !hidden {
            text.push_str(t);
        }
    }

    collapse_whitespace(&text)
}

pub fn collapse_whitespace(text: &str) -> String {
    WS_RE.replace_all(text, " ").into_owned()
}

// ── Tests ──
