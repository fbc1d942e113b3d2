//! Terminal output for furliefctl

use furlief_common::dashboard::{DashboardStats, SignupPage};
use furlief_shared::quiz::{QuizResult, SeverityTier};
use furlief_shared::symptoms::{SymptomAssessment, SymptomTier};
use owo_colors::OwoColorize;

pub fn tier_label(tier: SeverityTier) -> String {
    match tier {
        SeverityTier::High => tier.as_str().bright_red().to_string(),
        SeverityTier::Moderate => tier.as_str().yellow().to_string(),
        SeverityTier::Low => tier.as_str().bright_green().to_string(),
    }
}

pub fn display_quiz(tier: SeverityTier, result: &QuizResult, answered: usize) {
    println!();
    println!("[QUIZ] Severity: {}  ({} of 5 answered)", tier_label(tier), answered);
    println!();
    println!("{}", result.title.bold());
    println!("{}", result.message);
    println!("{}", result.action.cyan());
}

pub fn display_assessment(assessment: &SymptomAssessment) {
    let headline = match assessment.tier {
        SymptomTier::High => assessment.headline.bright_red().to_string(),
        SymptomTier::Moderate => assessment.headline.yellow().to_string(),
        SymptomTier::Low => assessment.headline.bright_green().to_string(),
    };
    println!();
    println!("[SYMPTOMS] {} selected", assessment.selected_count);
    println!("{}", headline);
    println!("{}", assessment.advice);
}

pub fn display_stats(stats: &DashboardStats) {
    println!();
    println!("{}", "Waitlist".bold());
    println!("  Total signups     {}", stats.total_signups);
    println!("  Today             {}", stats.today_signups);
    println!("  Last 7 days       {}", stats.weekly_signups);
    println!("  Last 30 days      {}", stats.monthly_signups);
    println!("  Weekly share      {:.1}%", stats.conversion_rate);
    println!("  Average position  {:.1}", stats.average_position);

    if !stats.top_referrers.is_empty() {
        println!();
        println!("{}", "Top referrers".bold());
        for (rank, referrer) in stats.top_referrers.iter().enumerate() {
            println!("  {}. {}  {} referrals", rank + 1, referrer.email.cyan(), referrer.referrals);
        }
    }

    println!();
    println!("{}", "Last 30 days".bold());
    let peak = stats.signup_trend.iter().map(|p| p.count).max().unwrap_or(0);
    for point in &stats.signup_trend {
        println!("  {}  {:>4}  {}", point.date, point.count, bar(point.count, peak, 40));
    }
}

/// ASCII bar scaled so `peak` fills `width`
pub fn bar(count: usize, peak: usize, width: usize) -> String {
    if peak == 0 {
        return String::new();
    }
    "#".repeat((count * width).div_ceil(peak))
}

pub fn display_signups(page: &SignupPage) {
    println!();
    println!(
        "{:<32} {:<14} {:<22} {:>6}  {:<12} {:<10}",
        "EMAIL", "NAME", "BREED", "POS", "STATUS", "CODE"
    );
    for signup in &page.signups {
        println!(
            "{:<32} {:<14} {:<22} {:>6}  {:<12} {:<10}",
            signup.email,
            signup.first_name.as_deref().unwrap_or("-"),
            signup.dog_breed.as_deref().unwrap_or("-"),
            signup.position.map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
            signup.status.as_str(),
            signup.referral_code,
        );
    }
    println!();
    println!(
        "Page {} of {} ({} matching)",
        page.page, page.total_pages, page.total_matches
    );
}
