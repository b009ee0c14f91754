//! Canonical URLs and selectors for the remote platform.
//!
//! The remote's markup and endpoints change without notice. Everything in
//! this module is best-effort: consumers either fail soft (scraping) or
//! fail with a descriptive error plus a screenshot (commenting).

pub const BASE_URL: &str = "https://www.instagram.com/";

#[must_use]
pub fn profile_url(handle: &str) -> String {
    format!("https://www.instagram.com/{handle}/")
}

#[must_use]
pub fn post_url(shortcode: &str) -> String {
    format!("https://www.instagram.com/p/{shortcode}/")
}

/// URL fragments identifying the profile timeline feed request.
pub const FEED_URL_MARKERS: [&str; 2] = ["/graphql/query", "/api/v1/feed/user/"];

/// Shown to logged-out visitors; its presence means the session is invalid.
pub const LOGIN_LINK: &str = r#"a[href="/accounts/login/"]"#;

/// Like control in its unliked state, scoped to the post container.
pub const LIKE_ICON: &str =
    r#"div[data-visualcompletion="ignore-dynamic"] svg[aria-label="Like"]"#;

/// Like control once the post is already liked.
pub const UNLIKE_ICON: &str =
    r#"div[data-visualcompletion="ignore-dynamic"] svg[aria-label="Unlike"]"#;

/// Comment input, current markup.
pub const COMMENT_BOX: &str = r#"textarea[aria-label="Add a comment…"]"#;

/// Comment input, older markup still seen on some post pages.
pub const COMMENT_BOX_FALLBACK: &str = "form textarea";

/// Role selector scanned for the submit control by its visible label.
pub const BUTTON_ROLE: &str = r#"div[role="button"]"#;
pub const POST_BUTTON_LABEL: &str = "Post";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_url_is_canonical() {
        assert_eq!(profile_url("wanderer"), "https://www.instagram.com/wanderer/");
    }

    #[test]
    fn post_url_is_canonical() {
        assert_eq!(post_url("AbC123"), "https://www.instagram.com/p/AbC123/");
    }
}
