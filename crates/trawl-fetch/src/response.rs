use scraper::{Html, Selector};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;
use trawl_core::truncate_snippet;

/// HTTP method supported by the fetch layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Head => write!(f, "HEAD"),
        }
    }
}

/// A fully resolved request handed to a [`Transport`](crate::Transport).
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub url: String,
    /// Extra headers; the user agent is always among them
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl FetchRequest {
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            timeout,
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Response returned by the fetch layer.
///
/// Header names are lowercased. When the render fallback replaced the body,
/// `rendered` is set and `text` holds the rendered copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub text: String,
    pub headers: BTreeMap<String, String>,
    pub final_url: String,
    pub rendered: bool,
}

impl Response {
    #[must_use]
    pub fn new(status: u16, text: impl Into<String>, final_url: impl Into<String>) -> Self {
        Self {
            status,
            text: text.into(),
            headers: BTreeMap::new(),
            final_url: final_url.into(),
            rendered: false,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }

    /// 429 and 5xx: worth another attempt.
    #[must_use]
    pub fn is_retryable_status(&self) -> bool {
        self.status == 429 || (500..600).contains(&self.status)
    }

    /// Header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Text of the first `<title>` element, whitespace-collapsed.
    #[must_use]
    pub fn title(&self) -> Option<String> {
        static TITLE: OnceLock<Selector> = OnceLock::new();
        let selector = TITLE.get_or_init(|| Selector::parse("title").expect("valid title selector"));

        let document = Html::parse_document(&self.text);
        let title = document
            .select(selector)
            .next()?
            .text()
            .collect::<String>();
        let title = truncate_snippet(&title, usize::MAX);
        (!title.is_empty()).then_some(title)
    }

    /// Whitespace-collapsed prefix of the body.
    #[must_use]
    pub fn snippet(&self, max_chars: usize) -> String {
        truncate_snippet(&self.text, max_chars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_extraction() {
        let resp = Response::new(
            200,
            "<html><head><title>\n  Jane Doe |  Profile </title></head><body>x</body></html>",
            "https://example.com",
        );
        assert_eq!(resp.title().as_deref(), Some("Jane Doe | Profile"));
    }

    #[test]
    fn test_title_missing() {
        let resp = Response::new(200, "<html><body>no title</body></html>", "u");
        assert_eq!(resp.title(), None);
        assert_eq!(Response::new(200, "<title>  </title>", "u").title(), None);
    }

    #[test]
    fn test_status_helpers() {
        assert!(Response::new(204, "", "u").is_success());
        assert!(Response::new(429, "", "u").is_retryable_status());
        assert!(Response::new(503, "", "u").is_retryable_status());
        assert!(!Response::new(404, "", "u").is_retryable_status());
        assert!(Response::new(404, "", "u").is_error());
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut resp = Response::new(200, "", "u");
        resp.headers
            .insert("content-type".to_string(), "text/html".to_string());
        assert_eq!(resp.header("Content-Type"), Some("text/html"));
    }

    #[test]
    fn test_snippet() {
        let resp = Response::new(200, "a   b\n\nc", "u");
        assert_eq!(resp.snippet(3), "a b");
    }
}
