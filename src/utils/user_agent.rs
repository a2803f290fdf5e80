//! User-agent classification for click analytics.
//!
//! Pure substring matching against ordered tables. The first matching row
//! wins, so more specific tokens come before the generic ones they contain
//! (Edge and Chrome before Safari, iPad before "mobile", iOS and Android
//! before macOS and Linux).

use serde::Serialize;

/// Device, browser and OS labels derived from a user-agent string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub device_type: &'static str,
    pub browser: &'static str,
    pub os: &'static str,
}

pub const UNKNOWN: &str = "Unknown";

const DEVICE_TABLE: &[(&[&str], &str)] = &[
    (&["ipad", "tablet"], "tablet"),
    (&["mobile", "iphone", "ipod", "android"], "mobile"),
];

const BROWSER_TABLE: &[(&[&str], &str)] = &[
    (&["edg/", "edge/"], "Edge"),
    (&["opr/", "opera"], "Opera"),
    (&["crios/", "chrome/"], "Chrome"),
    (&["fxios/", "firefox/"], "Firefox"),
    (&["safari/"], "Safari"),
    (&["trident/", "msie "], "Internet Explorer"),
];

const OS_TABLE: &[(&[&str], &str)] = &[
    (&["windows nt 10.0"], "Windows 10"),
    (&["windows nt 6.3"], "Windows 8.1"),
    (&["windows nt 6.2"], "Windows 8"),
    (&["windows nt 6.1"], "Windows 7"),
    (&["windows"], "Windows"),
    (&["iphone", "ipad", "ipod"], "iOS"),
    (&["android"], "Android"),
    (&["mac os x", "macintosh"], "macOS"),
    (&["cros"], "ChromeOS"),
    (&["linux"], "Linux"),
];

fn lookup(ua: &str, table: &[(&[&str], &'static str)]) -> Option<&'static str> {
    table
        .iter()
        .find(|(needles, _)| needles.iter().any(|needle| ua.contains(needle)))
        .map(|(_, label)| *label)
}

/// Classifies a raw `User-Agent` header value.
///
/// An empty or whitespace-only string yields `Unknown` for every field.
///
/// # Examples
///
/// ```ignore
/// let info = classify_user_agent(
///     "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 \
///      (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1",
/// );
/// assert_eq!(info.device_type, "mobile");
/// assert_eq!(info.browser, "Safari");
/// assert_eq!(info.os, "iOS");
/// ```
pub fn classify_user_agent(user_agent: &str) -> DeviceInfo {
    let ua = user_agent.trim().to_ascii_lowercase();
    if ua.is_empty() {
        return DeviceInfo {
            device_type: UNKNOWN,
            browser: UNKNOWN,
            os: UNKNOWN,
        };
    }

    DeviceInfo {
        device_type: lookup(&ua, DEVICE_TABLE).unwrap_or("desktop"),
        browser: lookup(&ua, BROWSER_TABLE).unwrap_or(UNKNOWN),
        os: lookup(&ua, OS_TABLE).unwrap_or(UNKNOWN),
    }
}
