//! Cursor extraction from the `Link` response header.
//!
//! Paginated listings answer with a header such as
//!
//! ```text
//! Link: <https://shop.myshopify.com/admin/api/2023-10/blogs/1/articles.json?limit=250&page_info=eyJ...>; rel="next"
//! ```
//!
//! and the next page is requested with that `page_info` value.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static NEXT_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<([^>]+)>;\s*rel="?next"?"#).unwrap());

/// The `page_info` cursor of the `rel="next"` link, if there is one.
pub fn next_page_info(link_header: &str) -> Option<String> {
    let target = NEXT_LINK.captures(link_header)?.get(1)?.as_str();
    // joining against a dummy base accepts relative links too
    let url = Url::parse("https://localhost/").ok()?.join(target).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "page_info")
        .map(|(_, value)| value.into_owned())
        .filter(|cursor| !cursor.is_empty())
}
