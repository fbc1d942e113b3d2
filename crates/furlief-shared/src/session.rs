//! Request-scoped context: who is asking, from where, with which referral code.
//!
//! Built once per request by the HTTP layer and passed explicitly into every
//! operation that records or attributes anything.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    /// Referral code the visitor arrived with (`?ref=`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referral_code: Option<String>,
}

impl RequestContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user_agent: None,
            page_url: None,
            referral_code: None,
        }
    }

    /// Context with a freshly generated session id
    pub fn anonymous() -> Self {
        Self::new(new_session_id())
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_page_url(mut self, page_url: impl Into<String>) -> Self {
        self.page_url = Some(page_url.into());
        self
    }

    pub fn with_referral_code(mut self, code: impl Into<String>) -> Self {
        let code = code.into();
        let code = code.trim();
        if !code.is_empty() {
            self.referral_code = Some(code.to_string());
        }
        self
    }
}

/// `session_<unix millis>_<base36 random>`
pub fn session_id_at<R: Rng>(now: DateTime<Utc>, rng: &mut R) -> String {
    format!("session_{}_{}", now.timestamp_millis(), to_base36(rng.gen()))
}

pub fn new_session_id() -> String {
    session_id_at(Utc::now(), &mut rand::thread_rng())
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
