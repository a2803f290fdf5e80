//! Canonical form for link destinations.

use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum UrlNormalizationError {
    #[error("URL must not be empty")]
    Empty,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(#[from] url::ParseError),

    #[error("Only http and https destinations are allowed, got '{0}'")]
    UnsupportedScheme(String),
}

/// Normalizes a destination before it is stored.
///
/// Input without a scheme is read as `https://`. Parsing through [`Url`]
/// lowercases the host and drops the default port; the fragment is removed
/// here. Anything but http and https is rejected.
pub fn normalize_url(input: &str) -> Result<String, UrlNormalizationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(UrlNormalizationError::Empty);
    }

    let mut url = if has_scheme(input) {
        Url::parse(input)?
    } else {
        Url::parse(&format!("https://{}", input))?
    };

    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlNormalizationError::UnsupportedScheme(
            url.scheme().to_string(),
        ));
    }

    url.set_fragment(None);
    Ok(url.to_string())
}

/// Whether `input` names its own scheme.
///
/// Only the text before the first `/`, `?` or `#` is looked at, so a URL
/// embedded in a query does not count. `host:port` is not a scheme.
fn has_scheme(input: &str) -> bool {
    let head = input
        .split(|c| matches!(c, '/' | '?' | '#'))
        .next()
        .unwrap_or_default();

    let Some((scheme, rest)) = head.split_once(':') else {
        return false;
    };

    scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        && !rest.starts_with(|c: char| c.is_ascii_digit())
}
