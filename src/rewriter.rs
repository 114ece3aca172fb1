//! Broken link substitution inside article markup.
//!
//! An article body is parsed as an HTML fragment and every `a[href]` whose
//! raw `href` is a known broken link gets its attribute replaced in the parsed
//! tree. The fragment is then serialized once by html5ever. Matching is exact
//! string equality on the attribute value: no trailing-slash, query-string or
//! case folding.
//!
//! Bodies without a single match are returned byte-for-byte untouched, which
//! makes a second pass over already-fixed markup a no-op.

use crate::rules::ReplacementRules;
use once_cell::sync::Lazy;
use scraper::node::Element;
use scraper::{ElementRef, Html, Node, Selector, StrTendril};
use tracing::{debug, instrument};

static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// One replaced link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub old_link: String,
    pub new_link: String,
    /// Visible text of the anchor, empty when it has none.
    pub anchor_text: String,
}

/// Result of rewriting one article body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub markup: String,
    /// In document order.
    pub substitutions: Vec<Substitution>,
    /// `false` means `markup` is the input, unchanged.
    pub changed: bool,
}

/// Replace every broken `href` in `markup` according to `rules`.
///
/// # Arguments
///
/// * `markup` - Article body HTML (a fragment, not a full document)
/// * `rules` - Broken link to replacement lookup
///
/// # Returns
///
/// A [`Rewrite`] holding the new markup, one [`Substitution`] per replaced
/// anchor in document order, and whether anything changed. When nothing
/// matched, `markup` is handed back as is.
///
/// # Example
///
/// ```ignore
/// let result = rewrite(r#"<a href="/old-page">Click here</a>"#, &rules);
/// assert_eq!(result.markup, r#"<a href="/new-page">Click here</a>"#);
/// assert_eq!(result.substitutions[0].anchor_text, "Click here");
/// ```
#[instrument(level = "debug", skip_all, fields(bytes = markup.len()))]
pub fn rewrite(markup: &str, rules: &ReplacementRules) -> Rewrite {
    let mut fragment = Html::parse_fragment(markup);

    let mut matched = Vec::new();
    let mut substitutions = Vec::new();
    for anchor in fragment.select(&ANCHOR_SELECTOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(new_link) = rules.replacement_for(href) else {
            continue;
        };
        substitutions.push(Substitution {
            old_link: href.to_string(),
            new_link: new_link.to_string(),
            anchor_text: anchor_text(anchor),
        });
        matched.push((anchor.id(), new_link));
    }

    if substitutions.is_empty() {
        return Rewrite {
            markup: markup.to_string(),
            substitutions,
            changed: false,
        };
    }

    debug!(count = substitutions.len(), "Rewriting links");
    for (id, new_link) in matched {
        if let Some(mut node) = fragment.tree.get_mut(id) {
            if let Node::Element(element) = node.value() {
                set_href(element, new_link);
            }
        }
    }

    // parse_fragment wraps the content in a synthetic <html> element
    let markup = fragment.root_element().inner_html();
    Rewrite {
        markup,
        substitutions,
        changed: true,
    }
}

/// Overwrite the un-namespaced `href` attribute, leaving e.g. `xlink:href` alone.
fn set_href(element: &mut Element, new_link: &str) {
    for (name, value) in element.attrs.iter_mut() {
        if name.ns.is_empty() && &*name.local == "href" {
            *value = StrTendril::from(new_link);
        }
    }
}

/// Visible text of an anchor: each text node trimmed, blanks dropped, joined
/// without a separator.
fn anchor_text(anchor: ElementRef<'_>) -> String {
    anchor
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}
