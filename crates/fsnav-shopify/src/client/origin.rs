//! Store origin handling for the Storefront API client.

/// Normalises a configured store domain into a scheme+host origin.
///
/// Accepts a bare domain (`shop.example.com`, assumed `https`) or a full URL
/// (`https://shop.example.com/collections/all`). Paths are dropped.
///
/// # Errors
///
/// Returns the parse failure reason if the input cannot be read as a URL.
pub fn store_origin(store_domain: &str) -> Result<reqwest::Url, String> {
    let trimmed = store_domain.trim().trim_end_matches('/');
    let candidate = if trimmed.contains("://") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    };
    let url = reqwest::Url::parse(&candidate).map_err(|e| e.to_string())?;
    if url.host_str().is_none() {
        return Err("missing host".to_owned());
    }
    let origin = url.origin().ascii_serialization();
    reqwest::Url::parse(&format!("{origin}/")).map_err(|e| e.to_string())
}

/// Extracts the hostname from a store URL for log fields.
pub(super) fn extract_domain(url: &reqwest::Url) -> String {
    url.host_str().map_or_else(|| url.to_string(), str::to_owned)
}
