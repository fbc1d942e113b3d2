//! Admin dashboard: aggregate statistics, signup listing and CSV export.
//!
//! Everything here works on a snapshot of signups (newest first, as the
//! store lists them) with `now` passed in.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use furlief_shared::signup::{Signup, SignupStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub const TOP_REFERRERS: usize = 5;
pub const TREND_DAYS: i64 = 30;

pub const CSV_HEADER: &str = "Email,First Name,Dog Breed,Position,Status,Created At,Referral Code";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferrerCount {
    pub email: String,
    pub referrals: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_signups: usize,
    pub today_signups: usize,
    pub weekly_signups: usize,
    pub monthly_signups: usize,
    /// Share of all signups that joined in the last 7 days, in percent
    pub conversion_rate: f64,
    pub average_position: f64,
    pub top_referrers: Vec<ReferrerCount>,
    /// Oldest day first
    pub signup_trend: Vec<TrendPoint>,
}

pub fn compute_stats(signups: &[Signup], now: DateTime<Utc>) -> DashboardStats {
    let today = now.date_naive();
    let today_start = today.and_time(NaiveTime::MIN).and_utc();
    let week_start = today_start - Duration::days(7);
    let month_start = today_start - Duration::days(30);

    let since = |start: DateTime<Utc>| signups.iter().filter(|s| s.created_at >= start).count();

    let total_signups = signups.len();
    let weekly_signups = since(week_start);

    let conversion_rate = if total_signups == 0 {
        0.0
    } else {
        weekly_signups as f64 / total_signups as f64 * 100.0
    };

    let positions: Vec<f64> = signups.iter().filter_map(|s| s.position).map(f64::from).collect();
    let average_position = if positions.is_empty() {
        0.0
    } else {
        positions.iter().sum::<f64>() / positions.len() as f64
    };

    DashboardStats {
        total_signups,
        today_signups: since(today_start),
        weekly_signups,
        monthly_signups: since(month_start),
        conversion_rate,
        average_position,
        top_referrers: top_referrers(signups),
        signup_trend: signup_trend(signups, today),
    }
}

fn top_referrers(signups: &[Signup]) -> Vec<ReferrerCount> {
    let emails: HashMap<&str, &str> = signups
        .iter()
        .map(|s| (s.id.as_str(), s.email.as_str()))
        .collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for referrer in signups.iter().filter_map(|s| s.referred_by.as_deref()) {
        if let Some(email) = emails.get(referrer) {
            *counts.entry(*email).or_default() += 1;
        }
    }

    let mut ranked: Vec<ReferrerCount> = counts
        .into_iter()
        .map(|(email, referrals)| ReferrerCount {
            email: email.to_string(),
            referrals,
        })
        .collect();
    ranked.sort_by(|a, b| b.referrals.cmp(&a.referrals).then_with(|| a.email.cmp(&b.email)));
    ranked.truncate(TOP_REFERRERS);
    ranked
}

fn signup_trend(signups: &[Signup], today: NaiveDate) -> Vec<TrendPoint> {
    let mut per_day: HashMap<NaiveDate, usize> = HashMap::new();
    for signup in signups {
        *per_day.entry(signup.created_at.date_naive()).or_default() += 1;
    }

    (0..TREND_DAYS)
        .rev()
        .map(|days_ago| {
            let date = today - Duration::days(days_ago);
            TrendPoint {
                date,
                count: per_day.get(&date).copied().unwrap_or(0),
            }
        })
        .collect()
}

/// Status filter of the signup listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(SignupStatus),
}

impl StatusFilter {
    pub fn matches(self, status: SignupStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "all" => Ok(StatusFilter::All),
            other => other.parse().map(StatusFilter::Only),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("all"),
            StatusFilter::Only(status) => write!(f, "{}", status),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupQuery {
    pub search: Option<String>,
    pub status: StatusFilter,
    /// 1-based
    pub page: usize,
}

impl Default for SignupQuery {
    fn default() -> Self {
        Self {
            search: None,
            status: StatusFilter::All,
            page: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignupPage {
    pub signups: Vec<Signup>,
    pub page: usize,
    pub total_pages: usize,
    pub total_matches: usize,
    pub page_size: usize,
}

/// Search by email or first name (case-insensitive), filter by status and
/// cut out one page. Out-of-range pages clamp to the nearest valid one.
pub fn filter_signups(signups: &[Signup], query: &SignupQuery, page_size: usize) -> SignupPage {
    let page_size = page_size.max(1);
    let needle = query
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let matches: Vec<&Signup> = signups
        .iter()
        .filter(|s| query.status.matches(s.status))
        .filter(|s| match &needle {
            None => true,
            Some(needle) => {
                s.email.to_lowercase().contains(needle.as_str())
                    || s
                        .first_name
                        .as_deref()
                        .is_some_and(|name| name.to_lowercase().contains(needle.as_str()))
            }
        })
        .collect();

    let total_matches = matches.len();
    let total_pages = total_matches.div_ceil(page_size).max(1);
    let page = query.page.clamp(1, total_pages);

    SignupPage {
        signups: matches
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .cloned()
            .collect(),
        page,
        total_pages,
        total_matches,
        page_size,
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// CSV export of the given signups, one row each
pub fn export_csv(signups: &[Signup]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for signup in signups {
        let position = signup.position.map(|p| p.to_string()).unwrap_or_default();
        let created = signup.created_at.format("%Y-%m-%d").to_string();
        let row = [
            signup.email.as_str(),
            signup.first_name.as_deref().unwrap_or(""),
            signup.dog_breed.as_deref().unwrap_or(""),
            position.as_str(),
            signup.status.as_str(),
            created.as_str(),
            signup.referral_code.as_str(),
        ]
        .map(csv_field)
        .join(",");
        out.push_str(&row);
        out.push('\n');
    }
    out
}

pub fn export_filename(now: DateTime<Utc>) -> String {
    format!("furlief-waitlist-{}.csv", now.format("%Y-%m-%d"))
}
