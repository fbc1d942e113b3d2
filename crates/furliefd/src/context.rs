//! Request context built from headers

use axum::http::{header, HeaderMap};
use furlief_shared::session::{new_session_id, RequestContext};

pub const SESSION_HEADER: &str = "x-session-id";

fn header_str<'a>(headers: &'a HeaderMap, name: impl header::AsHeaderName) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Percent-decoded `ref` query parameter of a page URL
/// (`https://furlief.com/?ref=ABCD2345`)
pub fn referral_code_from_url(url: &str) -> Option<String> {
    let query = url.split_once('?')?.1;
    let query = query.split('#').next().unwrap_or(query);
    let (_, value) = query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "ref")?;
    let code = urlencoding::decode(value).ok()?;
    let code = code.trim();
    (!code.is_empty()).then(|| code.to_string())
}

/// Session from `X-Session-Id` (or a fresh one), user agent, and the
/// referring page with any `?ref=` code it carries
pub fn request_context(headers: &HeaderMap) -> RequestContext {
    let session_id = header_str(headers, SESSION_HEADER)
        .map(str::to_string)
        .unwrap_or_else(new_session_id);

    let mut ctx = RequestContext::new(session_id);
    if let Some(agent) = header_str(headers, header::USER_AGENT) {
        ctx = ctx.with_user_agent(agent);
    }
    if let Some(page) = header_str(headers, header::REFERER) {
        if let Some(code) = referral_code_from_url(page) {
            ctx = ctx.with_referral_code(code);
        }
        ctx = ctx.with_page_url(page);
    }
    ctx
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_context_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_HEADER, HeaderValue::from_static("session_1_abc"));
        headers.insert(header::USER_AGENT, HeaderValue::from_static("curl/8.0"));
        headers.insert(
            header::REFERER,
            HeaderValue::from_static("https://furlief.com/?utm=x&ref=ABCD2345#quiz"),
        );

        let ctx = request_context(&headers);
        assert_eq!(ctx.session_id, "session_1_abc");
        assert_eq!(ctx.user_agent.as_deref(), Some("curl/8.0"));
        assert_eq!(ctx.referral_code.as_deref(), Some("ABCD2345"));
        assert_eq!(
            ctx.page_url.as_deref(),
            Some("https://furlief.com/?utm=x&ref=ABCD2345#quiz")
        );
    }

    #[test]
    fn test_missing_session_gets_generated() {
        let ctx = request_context(&HeaderMap::new());
        assert!(ctx.session_id.starts_with("session_"));
        assert!(ctx.referral_code.is_none());
    }

    #[test]
    fn test_referral_code_from_url() {
        assert_eq!(referral_code_from_url("https://furlief.com?ref=XYZ").as_deref(), Some("XYZ"));
        assert_eq!(referral_code_from_url("https://furlief.com?ref="), None);
        assert_eq!(referral_code_from_url("https://furlief.com?ref=%20"), None);
        assert_eq!(
            referral_code_from_url("https://furlief.com/?ref=AB%43D2345&x=1").as_deref(),
            Some("ABCD2345")
        );
        // Invalid UTF-8 after decoding is ignored
        assert_eq!(referral_code_from_url("https://furlief.com?ref=%FF"), None);
        assert_eq!(referral_code_from_url("https://furlief.com/quiz"), None);
        assert_eq!(referral_code_from_url("https://furlief.com?prefix=1"), None);
    }
}
