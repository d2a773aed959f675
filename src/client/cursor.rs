use reqwest::header::HeaderMap;
use serde_json::Value;

pub const NEXT_LOG_ID_HEADER: &str = "x-datadog-next-log-id";

/// Places a list response may carry its continuation token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorSource {
    /// `result.nextLogId` in the body
    NextLogId,
    /// `meta.page.after` in the body
    PageAfter,
    /// `x-datadog-next-log-id` response header
    Header,
}

/// Extraction order; the first hit wins.
pub const CURSOR_SOURCES: [CursorSource; 3] = [
    CursorSource::NextLogId,
    CursorSource::PageAfter,
    CursorSource::Header,
];

impl CursorSource {
    pub fn extract(self, body: &Value, headers: &HeaderMap) -> Option<String> {
        match self {
            Self::NextLogId => token_at(body, "/result/nextLogId"),
            Self::PageAfter => token_at(body, "/meta/page/after"),
            Self::Header => headers
                .get(NEXT_LOG_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

pub fn extract_cursor(body: &Value, headers: &HeaderMap) -> Option<String> {
    CURSOR_SOURCES
        .iter()
        .find_map(|source| source.extract(body, headers))
}

fn token_at(body: &Value, pointer: &str) -> Option<String> {
    match body.pointer(pointer)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
