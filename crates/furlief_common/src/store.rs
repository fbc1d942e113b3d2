//! Waitlist store.
//!
//! SQLite-backed persistence for signups, quiz responses and analytics
//! events. Location: /var/lib/furlief/waitlist.db unless configured.

use chrono::{DateTime, SecondsFormat, Utc};
use furlief_shared::events::EventRecord;
use furlief_shared::quiz::{QuizAnswers, SeverityTier};
use furlief_shared::signup::{generate_referral_code, Signup, SignupStatus};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// Current schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Referral code draws before giving up on finding an unused one
const REFERRAL_CODE_ATTEMPTS: usize = 8;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unique constraint violated on {field}")]
    Conflict { field: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[source] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        let (code, message) = match &err {
            rusqlite::Error::SqliteFailure(e, msg) => (Some(e.code), msg.clone().unwrap_or_default()),
            _ => (None, String::new()),
        };

        match code {
            Some(ErrorCode::ConstraintViolation) => {
                // "UNIQUE constraint failed: signups.email"
                match message.rsplit_once('.') {
                    Some((_, field)) if message.contains("UNIQUE") => StoreError::Conflict {
                        field: field.trim().to_string(),
                    },
                    _ => StoreError::Sqlite(err),
                }
            }
            Some(
                ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::CannotOpen
                | ErrorCode::SystemIoFailure
                | ErrorCode::DiskFull,
            ) => StoreError::Unavailable(err.to_string()),
            Some(ErrorCode::PermissionDenied | ErrorCode::ReadOnly | ErrorCode::AuthorizationForStatementDenied) => {
                StoreError::PermissionDenied(err.to_string())
            }
            Some(ErrorCode::DatabaseCorrupt | ErrorCode::NotADatabase) => StoreError::Corrupt(err.to_string()),
            _ => StoreError::Sqlite(err),
        }
    }
}

/// Fields of a signup supplied by the caller; the store assigns the rest
#[derive(Debug, Clone, PartialEq)]
pub struct NewSignup {
    pub email: String,
    pub first_name: Option<String>,
    pub dog_breed: Option<String>,
    pub referred_by: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl NewSignup {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            first_name: None,
            dog_breed: None,
            referred_by: None,
            metadata: serde_json::Value::Object(Default::default()),
            created_at: Utc::now(),
        }
    }
}

/// A classified quiz submission
#[derive(Debug, Clone, PartialEq)]
pub struct QuizResponseRecord {
    pub session_id: String,
    pub answers: QuizAnswers,
    pub severity_level: SeverityTier,
    pub created_at: DateTime<Utc>,
}

/// Persistence operations the waitlist needs
pub trait WaitlistStore: Send + Sync {
    fn find_signup_by_email(&self, email: &str) -> Result<Option<Signup>, StoreError>;

    /// Existence check used for referral attribution
    fn find_signup_id_by_referral_code(&self, code: &str) -> Result<Option<String>, StoreError>;

    /// Insert a signup, assigning id, referral code, position and status
    fn insert_signup(&self, signup: NewSignup) -> Result<Signup, StoreError>;

    /// Count signups, optionally only those with `status`
    fn count_signups(&self, status: Option<SignupStatus>) -> Result<u64, StoreError>;

    /// Every signup, newest first
    fn list_signups(&self) -> Result<Vec<Signup>, StoreError>;

    fn insert_quiz_response(&self, response: &QuizResponseRecord) -> Result<(), StoreError>;
}

/// Fire-and-forget analytics sink
pub trait EventLog: Send + Sync {
    fn record_event(&self, event: &EventRecord) -> Result<(), StoreError>;
}

/// Waitlist store backed by SQLite
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create the store at a specific path
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Unavailable(format!("Failed to create {}: {}", parent.display(), e))
                })?;
            }
        }

        let conn = Connection::open(path)?;
        let store = Self::from_connection(conn)?;
        info!("Opened waitlist store at {}", path.display());
        Ok(store)
    }

    /// In-memory store, for tests and dry runs
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("store connection lock poisoned".to_string()))
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;

        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS signups (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                first_name TEXT,
                dog_breed TEXT,
                referred_by TEXT REFERENCES signups(id),
                referral_code TEXT NOT NULL UNIQUE,
                position INTEGER,
                status TEXT NOT NULL DEFAULT 'active',
                metadata TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS quiz_responses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                responses TEXT NOT NULL,
                severity_level TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS analytics_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                user_id TEXT,
                event_type TEXT NOT NULL,
                event_data TEXT NOT NULL,
                page_url TEXT,
                user_agent TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS schema_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_signups_status ON signups(status);
            CREATE INDEX IF NOT EXISTS idx_signups_created_at ON signups(created_at);
            CREATE INDEX IF NOT EXISTS idx_events_type ON analytics_events(event_type);
            "#,
        )?;

        conn.execute(
            "INSERT OR REPLACE INTO schema_meta (key, value) VALUES ('version', ?)",
            params![SCHEMA_VERSION.to_string()],
        )?;

        Ok(())
    }

    /// Change a signup's status
    pub fn set_status(&self, id: &str, status: SignupStatus) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE signups SET status = ? WHERE id = ?",
            params![status.as_str(), id],
        )?;
        Ok(changed > 0)
    }

    /// Number of logged events of a type
    pub fn count_events(&self, event_type: &str) -> Result<u64, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM analytics_events WHERE event_type = ?",
            params![event_type],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Stored quiz responses for a session, oldest first
    pub fn quiz_responses_for_session(
        &self,
        session_id: &str,
    ) -> Result<Vec<QuizResponseRecord>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT session_id, responses, severity_level, created_at
             FROM quiz_responses WHERE session_id = ? ORDER BY id",
        )?;
        let rows = stmt.query_map(params![session_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (session_id, responses, severity, created_at) = row?;
            let wrapper: serde_json::Value = serde_json::from_str(&responses)?;
            let answers: QuizAnswers = serde_json::from_value(wrapper["answers"].clone())?;
            records.push(QuizResponseRecord {
                session_id,
                answers,
                severity_level: severity
                    .parse()
                    .map_err(|e| StoreError::Corrupt(format!("{}", e)))?,
                created_at: parse_timestamp(&created_at)?,
            });
        }
        Ok(records)
    }
}

const SIGNUP_COLUMNS: &str = "id, email, first_name, dog_breed, referred_by, referral_code, position, status, metadata, created_at";

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp {:?}: {}", raw, e)))
}

/// Raw signup row, decoded outside the rusqlite row closure
struct SignupRow {
    id: String,
    email: String,
    first_name: Option<String>,
    dog_breed: Option<String>,
    referred_by: Option<String>,
    referral_code: String,
    position: Option<i64>,
    status: String,
    metadata: String,
    created_at: String,
}

impl SignupRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            email: row.get(1)?,
            first_name: row.get(2)?,
            dog_breed: row.get(3)?,
            referred_by: row.get(4)?,
            referral_code: row.get(5)?,
            position: row.get(6)?,
            status: row.get(7)?,
            metadata: row.get(8)?,
            created_at: row.get(9)?,
        })
    }

    fn into_signup(self) -> Result<Signup, StoreError> {
        Ok(Signup {
            status: self.status.parse().map_err(StoreError::Corrupt)?,
            metadata: serde_json::from_str(&self.metadata)?,
            created_at: parse_timestamp(&self.created_at)?,
            position: self
                .position
                .map(|p| u32::try_from(p).map_err(|_| StoreError::Corrupt(format!("bad position {}", p))))
                .transpose()?,
            id: self.id,
            email: self.email,
            first_name: self.first_name,
            dog_breed: self.dog_breed,
            referred_by: self.referred_by,
            referral_code: self.referral_code,
        })
    }
}

impl WaitlistStore for SqliteStore {
    fn find_signup_by_email(&self, email: &str) -> Result<Option<Signup>, StoreError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!("SELECT {} FROM signups WHERE email = ?", SIGNUP_COLUMNS),
                params![email],
                SignupRow::from_row,
            )
            .optional()?;
        row.map(SignupRow::into_signup).transpose()
    }

    fn find_signup_id_by_referral_code(&self, code: &str) -> Result<Option<String>, StoreError> {
        let conn = self.lock()?;
        let id = conn
            .query_row(
                "SELECT id FROM signups WHERE referral_code = ?",
                params![code],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn insert_signup(&self, signup: NewSignup) -> Result<Signup, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let mut rng = rand::thread_rng();
        let mut referral_code = None;
        for _ in 0..REFERRAL_CODE_ATTEMPTS {
            let candidate = generate_referral_code(&mut rng);
            let taken: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM signups WHERE referral_code = ?)",
                params![candidate],
                |row| row.get(0),
            )?;
            if !taken {
                referral_code = Some(candidate);
                break;
            }
            debug!("Referral code collision, drawing again");
        }
        let referral_code = referral_code.ok_or_else(|| StoreError::Conflict {
            field: "referral_code".to_string(),
        })?;

        let position: i64 = tx.query_row(
            "SELECT COALESCE(MAX(position), 0) + 1 FROM signups",
            [],
            |row| row.get(0),
        )?;

        let id = Uuid::new_v4().to_string();
        let created_at = format_timestamp(&signup.created_at);
        tx.execute(
            &format!(
                "INSERT INTO signups ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                SIGNUP_COLUMNS
            ),
            params![
                &id,
                &signup.email,
                &signup.first_name,
                &signup.dog_breed,
                &signup.referred_by,
                &referral_code,
                position,
                SignupStatus::Active.as_str(),
                serde_json::to_string(&signup.metadata)?,
                &created_at,
            ],
        )?;
        tx.commit()?;

        Ok(Signup {
            id,
            email: signup.email,
            first_name: signup.first_name,
            dog_breed: signup.dog_breed,
            referred_by: signup.referred_by,
            referral_code,
            position: u32::try_from(position).ok(),
            status: SignupStatus::Active,
            metadata: signup.metadata,
            // Stored precision, so the returned record equals a later read
            created_at: parse_timestamp(&created_at)?,
        })
    }

    fn count_signups(&self, status: Option<SignupStatus>) -> Result<u64, StoreError> {
        let conn = self.lock()?;
        let count: i64 = match status {
            Some(status) => conn.query_row(
                "SELECT COUNT(*) FROM signups WHERE status = ?",
                params![status.as_str()],
                |row| row.get(0),
            )?,
            None => conn.query_row("SELECT COUNT(*) FROM signups", [], |row| row.get(0))?,
        };
        Ok(count as u64)
    }

    fn list_signups(&self) -> Result<Vec<Signup>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM signups ORDER BY created_at DESC, position DESC",
            SIGNUP_COLUMNS
        ))?;
        let rows = stmt.query_map([], SignupRow::from_row)?;

        let mut signups = Vec::new();
        for row in rows {
            signups.push(row?.into_signup()?);
        }
        Ok(signups)
    }

    fn insert_quiz_response(&self, response: &QuizResponseRecord) -> Result<(), StoreError> {
        let responses = serde_json::json!({ "answers": response.answers });
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO quiz_responses (session_id, responses, severity_level, created_at)
             VALUES (?, ?, ?, ?)",
            params![
                &response.session_id,
                serde_json::to_string(&responses)?,
                response.severity_level.as_str(),
                format_timestamp(&response.created_at),
            ],
        )?;
        Ok(())
    }
}

impl EventLog for SqliteStore {
    fn record_event(&self, event: &EventRecord) -> Result<(), StoreError> {
        let event_data = serde_json::to_string(&event.event_data)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO analytics_events
                (session_id, user_id, event_type, event_data, page_url, user_agent, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                &event.session_id,
                &event.user_id,
                &event.event_type,
                event_data,
                &event.page_url,
                &event.user_agent,
                format_timestamp(&event.created_at),
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use furlief_shared::events::AnalyticsEvent;
    use furlief_shared::session::RequestContext;
    use tempfile::TempDir;

    fn signup(email: &str) -> NewSignup {
        NewSignup::new(email)
    }

    #[test]
    fn test_insert_assigns_positions_and_codes() {
        let store = SqliteStore::open_in_memory().unwrap();
        let first = store.insert_signup(signup("a@example.com")).unwrap();
        let second = store.insert_signup(signup("b@example.com")).unwrap();

        assert_eq!(first.position, Some(1));
        assert_eq!(second.position, Some(2));
        assert_eq!(first.status, SignupStatus::Active);
        assert_ne!(first.referral_code, second.referral_code);
        assert_eq!(first.referral_code.len(), 8);
        assert_eq!(store.count_signups(None).unwrap(), 2);
    }

    #[test]
    fn test_duplicate_email_is_conflict() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_signup(signup("dup@example.com")).unwrap();
        let err = store.insert_signup(signup("dup@example.com")).unwrap_err();
        match err {
            StoreError::Conflict { field } => assert_eq!(field, "email"),
            other => panic!("expected conflict, got {:?}", other),
        }
        assert_eq!(store.count_signups(None).unwrap(), 1);
    }

    #[test]
    fn test_lookup_by_email_and_referral_code() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut new = signup("pat@example.com");
        new.first_name = Some("Pat".into());
        new.dog_breed = Some("Beagle".into());
        let created = store.insert_signup(new).unwrap();

        let found = store.find_signup_by_email("pat@example.com").unwrap().unwrap();
        assert_eq!(found, created);
        assert!(store.find_signup_by_email("nobody@example.com").unwrap().is_none());

        let id = store
            .find_signup_id_by_referral_code(&created.referral_code)
            .unwrap();
        assert_eq!(id.as_deref(), Some(created.id.as_str()));
        assert!(store.find_signup_id_by_referral_code("ZZZZZZZZ").unwrap().is_none());
    }

    #[test]
    fn test_referred_by_must_exist() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut new = signup("orphan@example.com");
        new.referred_by = Some("no-such-id".into());
        assert!(store.insert_signup(new).is_err());
    }

    #[test]
    fn test_list_newest_first_and_count_by_status() {
        let store = SqliteStore::open_in_memory().unwrap();
        let base = Utc.with_ymd_and_hms(2026, 1, 10, 9, 0, 0).unwrap();
        for (i, email) in ["old@x.com", "mid@x.com", "new@x.com"].iter().enumerate() {
            let mut new = signup(email);
            new.created_at = base + Duration::hours(i as i64);
            store.insert_signup(new).unwrap();
        }

        let listed = store.list_signups().unwrap();
        let emails: Vec<&str> = listed.iter().map(|s| s.email.as_str()).collect();
        assert_eq!(emails, vec!["new@x.com", "mid@x.com", "old@x.com"]);

        assert!(store.set_status(&listed[0].id, SignupStatus::Unsubscribed).unwrap());
        assert!(!store.set_status("missing", SignupStatus::Converted).unwrap());
        assert_eq!(store.count_signups(Some(SignupStatus::Active)).unwrap(), 2);
        assert_eq!(store.count_signups(Some(SignupStatus::Unsubscribed)).unwrap(), 1);
    }

    #[test]
    fn test_quiz_response_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let answers = QuizAnswers::from_raw(&[
            vec!["Frequently (daily)".to_string()],
            vec!["Red, irritated skin".to_string(), "Hair loss or bald patches".to_string()],
        ]);
        let record = QuizResponseRecord {
            session_id: "session_1_a".into(),
            answers: answers.clone(),
            severity_level: SeverityTier::High,
            created_at: Utc::now(),
        };
        store.insert_quiz_response(&record).unwrap();

        let stored = store.quiz_responses_for_session("session_1_a").unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].answers, answers);
        assert_eq!(stored[0].severity_level, SeverityTier::High);
    }

    #[test]
    fn test_record_event() {
        let store = SqliteStore::open_in_memory().unwrap();
        let ctx = RequestContext::new("session_2_b");
        store
            .record_event(&EventRecord::new(&ctx, &AnalyticsEvent::QuizStart))
            .unwrap();
        store
            .record_event(&EventRecord::new(&ctx, &AnalyticsEvent::QuizStart))
            .unwrap();
        assert_eq!(store.count_events("quiz_start").unwrap(), 2);
        assert_eq!(store.count_events("page_view").unwrap(), 0);
    }

    #[test]
    fn test_reopen_on_disk_keeps_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("waitlist.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.insert_signup(signup("keep@example.com")).unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.count_signups(None).unwrap(), 1);
        let next = store.insert_signup(signup("next@example.com")).unwrap();
        assert_eq!(next.position, Some(2));
    }

    #[test]
    fn test_constraint_message_maps_to_field() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE),
            Some("UNIQUE constraint failed: signups.referral_code".to_string()),
        );
        match StoreError::from(err) {
            StoreError::Conflict { field } => assert_eq!(field, "referral_code"),
            other => panic!("unexpected {:?}", other),
        }

        let busy = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        assert!(matches!(StoreError::from(busy), StoreError::Unavailable(_)));

        let readonly = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_READONLY),
            None,
        );
        assert!(matches!(StoreError::from(readonly), StoreError::PermissionDenied(_)));
    }
}
