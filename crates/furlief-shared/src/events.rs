//! Analytics events.
//!
//! Closed catalog of funnel events plus the record shape the event log stores.

use crate::quiz::{RawAnswers, SeverityTier};
use crate::session::RequestContext;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AnalyticsEvent {
    PageView {
        page: String,
    },
    WaitlistSignup {
        email: String,
        referral_code: String,
    },
    QuizStart,
    QuizComplete {
        responses: RawAnswers,
        severity_level: SeverityTier,
    },
    ReferralClick {
        referral_code: String,
    },
    ExitIntentModalShown,
    SocialShare {
        platform: String,
        referral_code: String,
    },
}

impl AnalyticsEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            AnalyticsEvent::PageView { .. } => "page_view",
            AnalyticsEvent::WaitlistSignup { .. } => "waitlist_signup",
            AnalyticsEvent::QuizStart => "quiz_start",
            AnalyticsEvent::QuizComplete { .. } => "quiz_complete",
            AnalyticsEvent::ReferralClick { .. } => "referral_click",
            AnalyticsEvent::ExitIntentModalShown => "exit_intent_modal_shown",
            AnalyticsEvent::SocialShare { .. } => "social_share",
        }
    }

    /// Event attributes without the type tag
    pub fn attributes(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut map)) => {
                map.remove("event_type");
                map
            }
            _ => Map::new(),
        }
    }

    /// Signup and quiz completion are recorded by the server itself when the
    /// underlying operation happens; clients may not report them.
    pub fn is_client_reportable(&self) -> bool {
        !matches!(
            self,
            AnalyticsEvent::WaitlistSignup { .. } | AnalyticsEvent::QuizComplete { .. }
        )
    }
}

/// One row of the event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub event_type: String,
    pub event_data: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl EventRecord {
    pub fn new(ctx: &RequestContext, event: &AnalyticsEvent) -> Self {
        Self {
            session_id: ctx.session_id.clone(),
            user_id: None,
            event_type: event.event_type().to_string(),
            event_data: event.attributes(),
            page_url: ctx.page_url.clone(),
            user_agent: ctx.user_agent.clone(),
            created_at: Utc::now(),
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_matches_tag() {
        let events = [
            AnalyticsEvent::PageView { page: "/".into() },
            AnalyticsEvent::QuizStart,
            AnalyticsEvent::ExitIntentModalShown,
            AnalyticsEvent::SocialShare {
                platform: "twitter".into(),
                referral_code: "ABCD2345".into(),
            },
        ];
        for event in events {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["event_type"], event.event_type());
        }
    }

    #[test]
    fn test_quiz_complete_attributes() {
        let event = AnalyticsEvent::QuizComplete {
            responses: vec![vec!["Frequently (daily)".into()]],
            severity_level: SeverityTier::High,
        };
        let attrs = event.attributes();
        assert!(!attrs.contains_key("event_type"));
        assert_eq!(attrs["severity_level"], "High");
        assert_eq!(attrs["responses"][0][0], "Frequently (daily)");
    }

    #[test]
    fn test_parse_client_event() {
        let event: AnalyticsEvent =
            serde_json::from_str(r#"{"event_type":"referral_click","referral_code":"XY7Z2345"}"#)
                .unwrap();
        assert_eq!(
            event,
            AnalyticsEvent::ReferralClick {
                referral_code: "XY7Z2345".into()
            }
        );
        assert!(event.is_client_reportable());
    }

    #[test]
    fn test_record_carries_context() {
        let ctx = RequestContext::new("session_1_abc")
            .with_page_url("https://furlief.com/")
            .with_user_agent("test-agent");
        let record = EventRecord::new(&ctx, &AnalyticsEvent::QuizStart).with_user("user-1");
        assert_eq!(record.session_id, "session_1_abc");
        assert_eq!(record.event_type, "quiz_start");
        assert!(record.event_data.is_empty());
        assert_eq!(record.user_id.as_deref(), Some("user-1"));
        assert_eq!(record.page_url.as_deref(), Some("https://furlief.com/"));
    }
}
