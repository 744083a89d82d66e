use url::Url;

/// Compares the authority (host and port) of two absolute URLs
///
/// Host comparison is case-insensitive. Only explicit ports count. A port equal
/// to the scheme's default is dropped during parsing, so `https://Example.com`
/// and `https://example.com:443/x` share a host even though their written
/// authorities differ. Every URL reaching this check has already been through
/// `Url` parsing, so the written form is not available to compare.
/// Any parse failure, or a URL without a host, yields `false`.
///
/// # Examples
///
/// ```
/// use arachnida::url::same_host;
///
/// assert!(same_host("https://EXAMPLE.com/a", "https://example.com/b"));
/// assert!(!same_host("https://example.com/", "https://example.com:8443/"));
/// assert!(!same_host("https://example.com/", "not a url"));
/// ```
pub fn same_host(a: &str, b: &str) -> bool {
    match (Url::parse(a), Url::parse(b)) {
        (Ok(a), Ok(b)) => match (authority(&a), authority(&b)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
        _ => false,
    }
}

/// Lowercased host and explicit port of a URL
fn authority(url: &Url) -> Option<(String, Option<u16>)> {
    url.host_str()
        .map(|host| (host.to_lowercase(), url.port()))
}
