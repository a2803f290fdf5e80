//! Short code generation and custom slug validation.
//!
//! Generated codes are 6 characters drawn from `[a-zA-Z0-9]` using the OS
//! CSPRNG. Custom slugs are trimmed, checked, and lowercased before use.

use regex::Regex;
use std::sync::LazyLock;

/// Length of a generated short code.
pub const CODE_LENGTH: usize = 6;

/// Alphabet for generated codes.
pub const ALPHABET: &[u8; 62] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Bytes at or above this value are rejected so every symbol is equally likely.
const REJECTION_THRESHOLD: u8 = 248; // 62 * 4

/// Reserved slugs that would shadow system routes.
pub const RESERVED_CODES: &[&str] = &["api", "health", "admin"];

static SLUG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{3,20}$").unwrap());

/// Reasons a custom slug is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlugError {
    #[error("Custom slug must be 3-20 letters or digits")]
    InvalidFormat,
    #[error("Custom slug '{0}' is reserved")]
    Reserved(String),
}

/// Generates a random short code of [`CODE_LENGTH`] characters.
///
/// Uses rejection sampling over raw random bytes so the distribution across
/// [`ALPHABET`] carries no modulo bias.
///
/// # Errors
///
/// Fails only if the operating system random source is unavailable.
pub fn generate_code() -> Result<String, getrandom::Error> {
    let mut code = String::with_capacity(CODE_LENGTH);
    let mut buffer = [0u8; 16];

    while code.len() < CODE_LENGTH {
        getrandom::fill(&mut buffer)?;
        for &byte in &buffer {
            if byte < REJECTION_THRESHOLD {
                code.push(ALPHABET[usize::from(byte % 62)] as char);
                if code.len() == CODE_LENGTH {
                    break;
                }
            }
        }
    }

    Ok(code)
}

/// Validates a user-provided slug and returns its canonical (lowercase) form.
///
/// # Rules
///
/// - Surrounding whitespace is ignored
/// - Length: 3-20 characters
/// - Allowed characters: ASCII letters and digits
/// - Cannot be a reserved system route name
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize_custom_slug("  MyLink ").unwrap(), "mylink");
/// assert!(normalize_custom_slug("ab").is_err());
/// assert!(normalize_custom_slug("my-link").is_err());
/// assert!(normalize_custom_slug("API").is_err());
/// ```
pub fn normalize_custom_slug(slug: &str) -> Result<String, SlugError> {
    let trimmed = slug.trim();

    if !SLUG_PATTERN.is_match(trimmed) {
        return Err(SlugError::InvalidFormat);
    }

    let lowered = trimmed.to_ascii_lowercase();
    if RESERVED_CODES.contains(&lowered.as_str()) {
        return Err(SlugError::Reserved(lowered));
    }

    Ok(lowered)
}
