use url::Url;

/// Reference schemes that never lead to a fetchable resource
const NON_NAVIGABLE_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:"];

/// Resolves a reference against a base URL
///
/// # Normalization Steps
///
/// 1. Trim whitespace; reject empty references
/// 2. Reject `javascript:`, `mailto:` and `tel:` references (case-insensitive)
/// 3. Resolve against `base` using standard URL resolution
/// 4. Remove fragment (everything after #)
///
/// Normalizing an already-normalized absolute URL yields the same URL.
///
/// # Arguments
///
/// * `base` - The URL of the document the reference was found in
/// * `reference` - The raw attribute value or text match
///
/// # Returns
///
/// * `Some(Url)` - The absolute URL without fragment
/// * `None` - The reference is empty, non-navigable, or unparsable
///
/// # Examples
///
/// ```
/// use arachnida::url::normalize;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/gallery/index.html").unwrap();
/// let url = normalize(&base, "../img/a.jpg#zoom").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/img/a.jpg");
///
/// assert!(normalize(&base, "mailto:someone@example.com").is_none());
/// ```
pub fn normalize(base: &Url, reference: &str) -> Option<Url> {
    let reference = reference.trim();

    if reference.is_empty() {
        return None;
    }

    if is_non_navigable(reference) {
        return None;
    }

    let mut url = base.join(reference).ok()?;
    url.set_fragment(None);
    Some(url)
}

/// Checks whether a URL uses a scheme the fetch layer can retrieve
pub fn is_fetchable_scheme(url: &Url) -> bool {
    // Url::scheme() is always lowercase, so this is a case-insensitive match
    matches!(url.scheme(), "http" | "https")
}

fn is_non_navigable(reference: &str) -> bool {
    NON_NAVIGABLE_SCHEMES.iter().any(|scheme| {
        reference
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}
