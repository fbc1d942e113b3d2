//! Shared types and the lead qualification engine for Furlief components.
//!
//! Everything here is pure: no I/O, no clocks except where a caller asks
//! for a fresh session id or event timestamp.

pub mod events;
pub mod quiz;
pub mod session;
pub mod signup;
pub mod symptoms;

pub use events::{AnalyticsEvent, EventRecord};
pub use quiz::{classify_quiz, result_message, QuizAnswers, QuizResult, SeverityTier};
pub use session::RequestContext;
pub use signup::{Signup, SignupOutcome, SignupRequest, SignupResponse, SignupStatus};
pub use symptoms::{assess_symptoms, classify_symptoms, SymptomId, SymptomTier};
