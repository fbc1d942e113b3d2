//! Waitlist signup types: requests, records, outcomes and referral links.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Referral codes avoid 0/O and 1/I
pub const REFERRAL_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const REFERRAL_CODE_LEN: usize = 8;

pub const SHARE_TEXT: &str = "I just joined the waitlist for Furlief - affordable pet allergy medication coming soon! Join me and get early access:";

pub const DOG_BREEDS: [&str; 26] = [
    "Labrador Retriever",
    "German Shepherd",
    "Golden Retriever",
    "French Bulldog",
    "Bulldog",
    "Poodle",
    "Beagle",
    "Rottweiler",
    "Dachshund",
    "Yorkshire Terrier",
    "Boxer",
    "Australian Shepherd",
    "Siberian Husky",
    "Great Dane",
    "Doberman Pinscher",
    "Miniature Schnauzer",
    "Shih Tzu",
    "Boston Terrier",
    "Bernese Mountain Dog",
    "Pomeranian",
    "Havanese",
    "Shetland Sheepdog",
    "Brittany",
    "English Springer Spaniel",
    "Belgian Malinois",
    "Mixed Breed / Other",
];

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Emails are unique case-insensitively
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn generate_referral_code<R: Rng>(rng: &mut R) -> String {
    (0..REFERRAL_CODE_LEN)
        .map(|_| REFERRAL_ALPHABET[rng.gen_range(0..REFERRAL_ALPHABET.len())] as char)
        .collect()
}

/// Link a new visitor follows to be attributed to `code`
pub fn referral_link(origin: &str, code: &str) -> String {
    format!("{}?ref={}", origin.trim_end_matches('/'), code)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignupStatus {
    Active,
    Converted,
    Unsubscribed,
}

impl SignupStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SignupStatus::Active => "active",
            SignupStatus::Converted => "converted",
            SignupStatus::Unsubscribed => "unsubscribed",
        }
    }
}

impl fmt::Display for SignupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignupStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(SignupStatus::Active),
            "converted" => Ok(SignupStatus::Converted),
            "unsubscribed" => Ok(SignupStatus::Unsubscribed),
            other => Err(format!("unknown signup status: {}", other)),
        }
    }
}

/// Body of a waitlist signup request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRequest {
    /// Missing emails reach validation as "" and fail as invalid
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub dog_breed: Option<String>,
    #[serde(default, alias = "referred_by")]
    pub referral_code: Option<String>,
}

/// A stored signup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signup {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub dog_breed: Option<String>,
    /// Id of the referring signup
    #[serde(default)]
    pub referred_by: Option<String>,
    pub referral_code: String,
    #[serde(default)]
    pub position: Option<u32>,
    pub status: SignupStatus,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// User-facing failure categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignupFailure {
    InvalidEmail,
    AlreadyRegistered,
    Network,
    Permission,
    Generic,
}

impl SignupFailure {
    pub fn message(self) -> &'static str {
        match self {
            SignupFailure::InvalidEmail => "Please enter a valid email address",
            SignupFailure::AlreadyRegistered => "This email is already on the waitlist.",
            SignupFailure::Network => "Network error. Please check your connection and try again.",
            SignupFailure::Permission => "Permission error. Please try again or contact support.",
            SignupFailure::Generic => "Failed to join waitlist. Please try again.",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignupOutcome {
    Joined(Signup),
    AlreadyRegistered(Signup),
    Failed {
        failure: SignupFailure,
        detail: String,
    },
}

impl SignupOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, SignupOutcome::Failed { .. })
    }

    pub fn into_response(self, origin: &str) -> SignupResponse {
        match self {
            SignupOutcome::Joined(signup) => SignupResponse::success(signup, origin, "Successfully joined the waitlist!"),
            SignupOutcome::AlreadyRegistered(signup) => {
                SignupResponse::success(signup, origin, "You are already on the waitlist!")
            }
            SignupOutcome::Failed { failure, detail } => SignupResponse {
                success: false,
                data: None,
                share_url: None,
                message: failure.message().to_string(),
                error: Some(detail),
                failure: Some(failure),
            },
        }
    }
}

/// Result object returned to the signup form. Never an error at the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignupResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Signup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_url: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<SignupFailure>,
}

impl SignupResponse {
    fn success(signup: Signup, origin: &str, message: &str) -> Self {
        Self {
            success: true,
            share_url: Some(referral_link(origin, &signup.referral_code)),
            data: Some(signup),
            message: message.to_string(),
            error: None,
            failure: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("pat@example.com"));
        assert!(is_valid_email("  pat@example.co.uk "));
        assert!(!is_valid_email("pat@example"));
        assert!(!is_valid_email("pat example@x.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_referral_code_shape() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let code = generate_referral_code(&mut rng);
            assert_eq!(code.len(), REFERRAL_CODE_LEN);
            assert!(code.bytes().all(|b| REFERRAL_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_referral_link() {
        assert_eq!(
            referral_link("https://furlief.com/", "ABCD2345"),
            "https://furlief.com?ref=ABCD2345"
        );
    }

    #[test]
    fn test_request_accepts_referred_by_alias() {
        let req: SignupRequest =
            serde_json::from_str(r#"{"email":"a@b.co","referred_by":"ABCD2345"}"#).unwrap();
        assert_eq!(req.referral_code.as_deref(), Some("ABCD2345"));
        assert!(req.first_name.is_none());
    }

    #[test]
    fn test_failed_outcome_response() {
        let response = SignupOutcome::Failed {
            failure: SignupFailure::Network,
            detail: "database is locked".into(),
        }
        .into_response("https://furlief.com");
        assert!(!response.success);
        assert!(response.message.starts_with("Network error"));
        assert_eq!(response.error.as_deref(), Some("database is locked"));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Active".parse::<SignupStatus>(), Ok(SignupStatus::Active));
        assert!("paused".parse::<SignupStatus>().is_err());
    }
}
