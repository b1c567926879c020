//! URL helpers for the generation service endpoints.

/// Normalize a base URL by removing trailing slashes
///
/// # Examples
///
/// ```
/// use polymind::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("https://api.example.com/v1beta/"), "https://api.example.com/v1beta");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Join a base URL and an endpoint path without doubling slashes.
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}

/// Endpoint that streams a reply from `model` as server-sent events.
///
/// # Examples
///
/// ```
/// use polymind::utils::url::stream_generate_url;
///
/// assert_eq!(
///     stream_generate_url("https://host/v1beta/", "gemini-2.5-flash"),
///     "https://host/v1beta/models/gemini-2.5-flash:streamGenerateContent?alt=sse"
/// );
/// ```
pub fn stream_generate_url(base_url: &str, model: &str) -> String {
    construct_api_url(
        base_url,
        &format!("models/{model}:streamGenerateContent?alt=sse"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construct_api_url() {
        assert_eq!(
            construct_api_url("https://api.example.com/v1beta", "models"),
            "https://api.example.com/v1beta/models"
        );
        assert_eq!(
            construct_api_url("https://api.example.com/v1beta///", "/models"),
            "https://api.example.com/v1beta/models"
        );
    }

    #[test]
    fn stream_url_targets_the_requested_model() {
        assert_eq!(
            stream_generate_url("http://127.0.0.1:1234", "gemini-3-pro-preview"),
            "http://127.0.0.1:1234/models/gemini-3-pro-preview:streamGenerateContent?alt=sse"
        );
    }
}
