//! Heuristics for pages gated behind JavaScript or an anti-bot challenge.

/// Markers that indicate a script-gated or challenge page.
pub const DEFAULT_MARKERS: &[&str] = &[
    "enable javascript",
    "requires javascript",
    "please enable js",
    "captcha",
    "cf-chl",
    "challenge-form",
    "just a moment...",
    "cloudflare",
];

/// Default minimum number of non-whitespace characters in a real page.
pub const DEFAULT_MIN_BODY_LEN: usize = 64;

/// Decides whether a response body is a challenge or script-gated shell
/// rather than real content.
pub trait ChallengeDetector: Send + Sync {
    fn is_challenge(&self, status: u16, body: &str) -> bool;
}

impl<F> ChallengeDetector for F
where
    F: Fn(u16, &str) -> bool + Send + Sync,
{
    fn is_challenge(&self, status: u16, body: &str) -> bool {
        self(status, body)
    }
}

/// Marker and body-length based detector.
///
/// A 404 is never a challenge. Otherwise the body is gated when it has fewer
/// than `min_body_len` non-whitespace characters or contains a marker
/// (case-insensitive).
#[derive(Debug, Clone)]
pub struct MarkerDetector {
    markers: Vec<String>,
    min_body_len: usize,
}

impl Default for MarkerDetector {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_BODY_LEN)
    }
}

impl MarkerDetector {
    #[must_use]
    pub fn new(min_body_len: usize) -> Self {
        Self {
            markers: DEFAULT_MARKERS.iter().map(|m| (*m).to_string()).collect(),
            min_body_len,
        }
    }

    /// Replace the marker list. Markers are matched lowercased.
    #[must_use]
    pub fn with_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.markers = markers
            .into_iter()
            .map(|m| m.as_ref().to_lowercase())
            .filter(|m| !m.is_empty())
            .collect();
        self
    }

    #[must_use]
    pub fn markers(&self) -> &[String] {
        &self.markers
    }
}

impl ChallengeDetector for MarkerDetector {
    fn is_challenge(&self, status: u16, body: &str) -> bool {
        if status == 404 {
            return false;
        }
        let visible = body.chars().filter(|c| !c.is_whitespace()).count();
        if visible < self.min_body_len {
            return true;
        }
        let lowered = body.to_lowercase();
        self.markers.iter().any(|m| lowered.contains(m.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> String {
        format!("<html><body><p>{}</p>{body}</body></html>", "real content ".repeat(10))
    }

    #[test]
    fn test_plain_page_is_not_challenge() {
        let detector = MarkerDetector::default();
        assert!(!detector.is_challenge(200, &page("")));
    }

    #[test]
    fn test_markers_detected_case_insensitively() {
        let detector = MarkerDetector::default();
        for marker in ["Please Enable JavaScript", "CAPTCHA", "cf-chl-bypass", "Just a moment..."] {
            assert!(detector.is_challenge(200, &page(marker)), "{marker}");
        }
    }

    #[test]
    fn test_short_body_is_challenge() {
        let detector = MarkerDetector::default();
        assert!(detector.is_challenge(200, "<html>   </html>"));
        assert!(detector.is_challenge(503, ""));
    }

    #[test]
    fn test_not_found_is_never_challenge() {
        let detector = MarkerDetector::default();
        assert!(!detector.is_challenge(404, ""));
        assert!(!detector.is_challenge(404, &page("captcha")));
    }

    #[test]
    fn test_custom_markers() {
        let detector = MarkerDetector::new(0).with_markers(["Access Denied"]);
        assert!(detector.is_challenge(403, "access denied by policy"));
        assert!(!detector.is_challenge(200, "captcha"));
    }

    #[test]
    fn test_closure_detector() {
        let detector = |status: u16, _: &str| status == 403;
        assert!(detector.is_challenge(403, ""));
        assert!(!detector.is_challenge(200, ""));
    }
}
