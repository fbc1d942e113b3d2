//! Prometheus metrics for the signup funnel

use prometheus::{
    register_int_counter_vec_with_registry, Encoder, IntCounterVec, Registry, TextEncoder,
};

pub struct FunnelMetrics {
    pub signups_total: IntCounterVec,
    pub quiz_completions_total: IntCounterVec,
    pub symptom_assessments_total: IntCounterVec,
    pub events_total: IntCounterVec,

    registry: Registry,
}

impl FunnelMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let signups_total = register_int_counter_vec_with_registry!(
            "furlief_signups_total",
            "Waitlist signup attempts by outcome",
            &["outcome"],
            registry
        )?;

        let quiz_completions_total = register_int_counter_vec_with_registry!(
            "furlief_quiz_completions_total",
            "Completed quizzes by severity tier",
            &["tier"],
            registry
        )?;

        let symptom_assessments_total = register_int_counter_vec_with_registry!(
            "furlief_symptom_assessments_total",
            "Symptom checker assessments by tier",
            &["tier"],
            registry
        )?;

        let events_total = register_int_counter_vec_with_registry!(
            "furlief_events_total",
            "Client-reported analytics events by type",
            &["event_type"],
            registry
        )?;

        Ok(Self {
            signups_total,
            quiz_completions_total,
            symptom_assessments_total,
            events_total,
            registry,
        })
    }

    pub fn record_signup(&self, outcome: &str) {
        self.signups_total.with_label_values(&[outcome]).inc();
    }

    pub fn record_quiz(&self, tier: &str) {
        self.quiz_completions_total.with_label_values(&[tier]).inc();
    }

    pub fn record_assessment(&self, tier: &str) {
        self.symptom_assessments_total.with_label_values(&[tier]).inc();
    }

    pub fn record_event(&self, event_type: &str) {
        self.events_total.with_label_values(&[event_type]).inc();
    }

    /// Prometheus text exposition
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_show_up_in_export() {
        let metrics = FunnelMetrics::new().unwrap();
        metrics.record_signup("joined");
        metrics.record_signup("joined");
        metrics.record_quiz("High");
        metrics.record_event("page_view");

        let text = metrics.export().unwrap();
        assert!(text.contains("furlief_signups_total{outcome=\"joined\"} 2"));
        assert!(text.contains("furlief_quiz_completions_total{tier=\"High\"} 1"));
        assert!(text.contains("furlief_events_total{event_type=\"page_view\"} 1"));
    }

    #[test]
    fn test_separate_instances_do_not_collide() {
        let a = FunnelMetrics::new().unwrap();
        let b = FunnelMetrics::new().unwrap();
        a.record_assessment("high");
        assert!(!b.export().unwrap().contains("tier=\"high\"} 1"));
    }
}
