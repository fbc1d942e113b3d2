//! Waitlist service: signups with referral attribution, quiz submissions and
//! fire-and-forget analytics.

use crate::store::{EventLog, NewSignup, QuizResponseRecord, StoreError, WaitlistStore};
use chrono::{SecondsFormat, Utc};
use furlief_shared::events::{AnalyticsEvent, EventRecord};
use furlief_shared::quiz::{evaluate, QuizAnswers, QuizResult, SeverityTier};
use furlief_shared::session::RequestContext;
use furlief_shared::signup::{
    is_valid_email, normalize_email, SignupFailure, SignupOutcome, SignupRequest, SignupStatus,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const SIGNUP_SOURCE: &str = "website";

/// Map a store failure to the category shown to the visitor
pub fn failure_for(err: &StoreError) -> SignupFailure {
    match err {
        StoreError::Conflict { field } if field == "email" => SignupFailure::AlreadyRegistered,
        StoreError::Unavailable(_) => SignupFailure::Network,
        StoreError::PermissionDenied(_) => SignupFailure::Permission,
        _ => SignupFailure::Generic,
    }
}

/// Result of a completed quiz
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizSubmission {
    pub severity_level: SeverityTier,
    pub result: QuizResult,
    /// Whether the response reached the store
    pub saved: bool,
}

pub struct WaitlistService<S> {
    store: Arc<S>,
    fallback_total: u64,
}

impl<S> Clone for WaitlistService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            fallback_total: self.fallback_total,
        }
    }
}

impl<S: WaitlistStore + EventLog> WaitlistService<S> {
    pub fn new(store: Arc<S>, fallback_total: u64) -> Self {
        Self {
            store,
            fallback_total,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Add a visitor to the waitlist. Never returns an error: failures come
    /// back as `SignupOutcome::Failed` with a user-facing category.
    pub fn submit_signup(&self, ctx: &RequestContext, request: &SignupRequest) -> SignupOutcome {
        if !is_valid_email(&request.email) {
            return SignupOutcome::Failed {
                failure: SignupFailure::InvalidEmail,
                detail: "invalid email format".to_string(),
            };
        }
        let email = normalize_email(&request.email);

        match self.store.find_signup_by_email(&email) {
            Ok(Some(existing)) => {
                debug!("Signup for existing email, returning record {}", existing.id);
                return SignupOutcome::AlreadyRegistered(existing);
            }
            Ok(None) => {}
            // The insert below still enforces uniqueness
            Err(e) => warn!("Existing-email lookup failed: {}", e),
        }

        let referral_code = request
            .referral_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .or(ctx.referral_code.as_deref());
        let referred_by = referral_code.and_then(|code| self.resolve_referrer(code));

        let new = NewSignup {
            email,
            first_name: non_blank(request.first_name.as_deref()),
            dog_breed: non_blank(request.dog_breed.as_deref()),
            referred_by,
            metadata: json!({
                "signup_source": SIGNUP_SOURCE,
                "user_agent": ctx.user_agent,
                "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            }),
            created_at: Utc::now(),
        };

        match self.store.insert_signup(new) {
            Ok(signup) => {
                info!(
                    "New waitlist signup at position {:?} (referred: {})",
                    signup.position,
                    signup.referred_by.is_some()
                );
                let event = AnalyticsEvent::WaitlistSignup {
                    email: signup.email.clone(),
                    referral_code: signup.referral_code.clone(),
                };
                self.record(EventRecord::new(ctx, &event).with_user(signup.id.clone()));
                SignupOutcome::Joined(signup)
            }
            Err(e) => {
                let failure = failure_for(&e);
                warn!("Signup failed ({:?}): {}", failure, e);
                SignupOutcome::Failed {
                    failure,
                    detail: e.to_string(),
                }
            }
        }
    }

    /// Referring signup id for `code`; unknown codes and lookup errors
    /// degrade to no referrer
    fn resolve_referrer(&self, code: &str) -> Option<String> {
        match self.store.find_signup_id_by_referral_code(code) {
            Ok(Some(id)) => Some(id),
            Ok(None) => {
                warn!("Unknown referral code {:?}, signing up without referrer", code);
                None
            }
            Err(e) => {
                warn!("Referral lookup for {:?} failed: {}", code, e);
                None
            }
        }
    }

    /// Classify a finished quiz, log it and store the response
    pub fn submit_quiz(&self, ctx: &RequestContext, answers: &QuizAnswers) -> QuizSubmission {
        let (severity_level, result) = evaluate(answers);

        self.track(
            ctx,
            &AnalyticsEvent::QuizComplete {
                responses: answers.to_raw(),
                severity_level,
            },
        );

        let record = QuizResponseRecord {
            session_id: ctx.session_id.clone(),
            answers: answers.clone(),
            severity_level,
            created_at: Utc::now(),
        };
        let saved = match self.store.insert_quiz_response(&record) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to store quiz response: {}", e);
                false
            }
        };

        QuizSubmission {
            severity_level,
            result,
            saved,
        }
    }

    /// Record an analytics event. Failures are logged and dropped.
    pub fn track(&self, ctx: &RequestContext, event: &AnalyticsEvent) {
        self.record(EventRecord::new(ctx, event));
    }

    fn record(&self, record: EventRecord) {
        if let Err(e) = self.store.record_event(&record) {
            warn!("Dropped {} event: {}", record.event_type, e);
        }
    }

    /// Public waitlist size: active signups, or the configured fallback
    /// when the store cannot answer
    pub fn waitlist_total(&self) -> u64 {
        match self.store.count_signups(Some(SignupStatus::Active)) {
            Ok(total) => total,
            Err(e) => {
                warn!("Waitlist count unavailable, showing fallback: {}", e);
                self.fallback_total
            }
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
