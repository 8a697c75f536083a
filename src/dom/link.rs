//! Link targets compared against the current page.
//!
//! Links in the document carry raw `href` attributes. The widgets resolve
//! them against the page location and compare the results with the fragment
//! ignored, the way a browser decides whether following a link stays on the
//! same document.

use url::{Position, Url};

/// Parse a page location. `None` for relative or malformed locations.
pub fn parse_location(location: &str) -> Option<Url> {
    Url::parse(location.trim()).ok()
}

/// Resolve a raw `href` attribute against `base`.
pub fn resolve_href(base: &Url, href: &str) -> Option<Url> {
    base.join(href.trim()).ok()
}

/// Whether `a` and `b` name the same document, fragments ignored.
pub fn same_document(a: &Url, b: &Url) -> bool {
    a[..Position::AfterQuery] == b[..Position::AfterQuery]
}

/// `name` as it appears in the fragment of a URL based on `base`.
///
/// Resolved links carry percent-encoded fragments while anchor names are
/// stored raw; encoding the name the same way makes the two comparable.
pub fn encode_fragment(base: &Url, name: &str) -> Option<String> {
    let mut url = base.clone();
    url.set_fragment(Some(name));
    url.fragment().map(str::to_owned)
}
