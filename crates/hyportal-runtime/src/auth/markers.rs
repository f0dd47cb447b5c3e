//! Text the Hytale server and downloader print during device auth.
//!
//! These strings belong to external binaries and are not a stable contract.
//! Everything that matches on them goes through `AuthMarkers`.

use std::sync::LazyLock;

use regex::Regex;

/// Recognizes device-auth prompts in ANSI-stripped output.
pub trait AuthMarkers: Send + Sync {
    /// The server has no credentials and wants a login.
    fn is_tokens_missing(&self, text: &str) -> bool;

    /// The server finished the device flow.
    fn is_auth_success(&self, text: &str) -> bool;

    /// The user code the server asks to be entered.
    fn user_code(&self, text: &str) -> Option<String>;

    /// A verification URL printed by the server.
    fn verify_url(&self, text: &str) -> Option<String>;

    /// A verification URL printed by the downloader (always carries the code).
    fn downloader_auth_url(&self, text: &str) -> Option<String>;

    /// Command that starts the device flow.
    fn login_command(&self) -> &str {
        "/auth login device\n"
    }

    /// Command that persists credentials after a successful login.
    fn persist_command(&self) -> &str {
        "/auth persistence Encrypted\n"
    }
}

const TOKENS_MISSING: &str = "No server tokens configured. Use /auth login to authenticate.";
const AUTH_SUCCESS: &str = "Authentication successful! Use '/auth status' to view details.";

static USER_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)enter code:\s*([A-Za-z0-9-]+)").expect("valid code regex"));

static VERIFY_URLS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)https://oauth\.accounts\.hytale\.com/oauth2/device/verify[^\s)]+")
            .expect("valid verify regex"),
        Regex::new(r"(?i)https://accounts\.hytale\.com/device[^\s)]+").expect("valid device regex"),
    ]
});

static DOWNLOADER_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)https://oauth\.accounts\.hytale\.com/oauth2/device/verify\?user_code=[^\s]+")
        .expect("valid downloader regex")
});

/// Markers printed by current Hytale server and downloader builds.
#[derive(Debug, Clone, Copy, Default)]
pub struct HytaleMarkers;

impl AuthMarkers for HytaleMarkers {
    fn is_tokens_missing(&self, text: &str) -> bool {
        text.contains(TOKENS_MISSING)
    }

    fn is_auth_success(&self, text: &str) -> bool {
        text.contains(AUTH_SUCCESS)
    }

    fn user_code(&self, text: &str) -> Option<String> {
        USER_CODE
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    fn verify_url(&self, text: &str) -> Option<String> {
        VERIFY_URLS
            .iter()
            .find_map(|re| re.find(text))
            .map(|m| m.as_str().trim().to_string())
    }

    fn downloader_auth_url(&self, text: &str) -> Option<String> {
        DOWNLOADER_URL.find(text).map(|m| m.as_str().to_string())
    }
}

/// Add `user_code=<code>` unless the URL already carries one.
///
/// Returns `None` when the URL needs a code and none is known yet.
pub fn append_user_code(url: &str, code: Option<&str>) -> Option<String> {
    if url.to_ascii_lowercase().contains("user_code=") {
        return Some(url.to_string());
    }
    let code = code?;
    let separator = if url.contains('?') { '&' } else { '?' };
    Some(format!("{url}{separator}user_code={code}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_server_prompts() {
        let markers = HytaleMarkers;
        assert!(markers.is_tokens_missing(
            "[2026/01/14 10:00:00 WARN] No server tokens configured. Use /auth login to authenticate."
        ));
        assert!(markers.is_auth_success(
            "Authentication successful! Use '/auth status' to view details."
        ));
        assert!(!markers.is_auth_success("Authentication failed"));
    }

    #[test]
    fn extracts_user_code() {
        let markers = HytaleMarkers;
        assert_eq!(
            markers.user_code("Please visit the URL and Enter code: AB12-CD34").as_deref(),
            Some("AB12-CD34")
        );
        assert_eq!(markers.user_code("no code here"), None);
    }

    #[test]
    fn extracts_verify_urls_without_trailing_paren() {
        let markers = HytaleMarkers;
        assert_eq!(
            markers
                .verify_url("Visit (https://oauth.accounts.hytale.com/oauth2/device/verify?flow=x) now")
                .as_deref(),
            Some("https://oauth.accounts.hytale.com/oauth2/device/verify?flow=x")
        );
        assert_eq!(
            markers
                .verify_url("Go to https://accounts.hytale.com/device?user_code=XYZ")
                .as_deref(),
            Some("https://accounts.hytale.com/device?user_code=XYZ")
        );
    }

    #[test]
    fn downloader_url_requires_code() {
        let markers = HytaleMarkers;
        assert_eq!(
            markers.downloader_auth_url(
                "Please visit https://oauth.accounts.hytale.com/oauth2/device/verify?user_code=QWER-TY12 to authorize"
            )
            .as_deref(),
            Some("https://oauth.accounts.hytale.com/oauth2/device/verify?user_code=QWER-TY12")
        );
        assert_eq!(
            markers.downloader_auth_url("https://oauth.accounts.hytale.com/oauth2/device/verify"),
            None
        );
    }

    #[test]
    fn appends_code_with_correct_separator() {
        assert_eq!(
            append_user_code("https://accounts.hytale.com/device", Some("AB")).as_deref(),
            Some("https://accounts.hytale.com/device?user_code=AB")
        );
        assert_eq!(
            append_user_code("https://accounts.hytale.com/device?x=1", Some("AB")).as_deref(),
            Some("https://accounts.hytale.com/device?x=1&user_code=AB")
        );
        assert_eq!(
            append_user_code("https://accounts.hytale.com/device?USER_CODE=Z", None).as_deref(),
            Some("https://accounts.hytale.com/device?USER_CODE=Z")
        );
        assert_eq!(append_user_code("https://accounts.hytale.com/device", None), None);
    }
}
