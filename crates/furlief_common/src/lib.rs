//! Furlief service layer: configuration, the waitlist store, the waitlist
//! service and admin dashboard aggregation.

pub mod config;
pub mod dashboard;
pub mod store;
pub mod waitlist;

pub use config::Config;
pub use store::{EventLog, SqliteStore, StoreError, WaitlistStore};
pub use waitlist::{QuizSubmission, WaitlistService};
