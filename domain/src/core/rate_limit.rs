//! Rate-limit signal detection.
//!
//! Providers signal throttling either with HTTP 429 or with free text in an
//! error body. The phrase set is matched case-insensitively.

/// Phrases that mark an error body as a rate-limit rejection.
pub const RATE_LIMIT_PHRASES: &[&str] = &[
    "rate limit",
    "rate_limit",
    "ratelimit",
    "too many requests",
    "quota exceeded",
    "exceeded your current quota",
    "resource_exhausted",
];

/// HTTP status used by providers for throttled requests.
pub const RATE_LIMIT_STATUS: u16 = 429;

/// Returns `true` if the text contains one of [`RATE_LIMIT_PHRASES`].
pub fn mentions_rate_limit(text: &str) -> bool {
    let lower = text.to_lowercase();
    RATE_LIMIT_PHRASES.iter().any(|p| lower.contains(p))
}

/// Returns `true` for a status/body pair that signals throttling.
pub fn is_rate_limit_signal(status: u16, body: &str) -> bool {
    status == RATE_LIMIT_STATUS || mentions_rate_limit(body)
}
