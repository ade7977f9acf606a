use url::Url;

/// Resolve a raw `href` against the page it was found on.
///
/// Relative, protocol-relative and absolute forms follow standard URL
/// resolution. The fragment is always dropped, so a bare `#section` link
/// resolves to the base page itself. Returns `None` for an absent or blank
/// `href`, or when either side cannot be parsed.
pub fn normalize(base: &str, raw_href: Option<&str>) -> Option<String> {
    let href = raw_href?.trim();
    if href.is_empty() {
        return None;
    }

    let base_url = Url::parse(base).ok()?;
    normalize_against(&base_url, href)
}

/// Same as [`normalize`] but with an already parsed base, so a page with
/// many anchors only parses its own URL once.
pub fn normalize_against(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let mut url = base.join(href).ok()?;
    url.set_fragment(None);

    Some(url.to_string())
}
