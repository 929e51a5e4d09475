//! Database module
//!
//! Provides persistence for per-page message threads. Two operations are
//! needed: insert one message, and load a page's thread in ascending
//! creation order.

mod schema;

pub use schema::*;

use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Insert a single message row
    pub fn insert_message(&self, message: &Message) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO messages (id, page_id, kind, content, sender, file_name, file_size, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                message.id,
                message.page_id,
                message.kind.to_string(),
                message.content,
                message.sender.to_string(),
                message.file_name,
                message.file_size,
                message.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Load all messages for a page, ascending by creation time.
    ///
    /// `rowid` is the tiebreak so same-millisecond inserts keep their
    /// insertion order across reloads.
    pub fn messages_for_page(&self, page_id: &str) -> DbResult<Vec<Message>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, page_id, kind, content, sender, file_name, file_size, created_at
             FROM messages
             WHERE page_id = ?1
             ORDER BY created_at ASC, rowid ASC",
        )?;

        let rows = stmt.query_map(params![page_id], |row| {
            let kind: String = row.get(2)?;
            let sender: String = row.get(4)?;
            Ok(Message {
                id: row.get(0)?,
                page_id: row.get(1)?,
                kind: MessageKind::parse_or_text(&kind),
                content: row.get(3)?,
                sender: if sender == "bot" {
                    Sender::Bot
                } else {
                    Sender::User
                },
                file_name: row.get(5)?,
                file_size: row.get(6)?,
                timestamp: parse_datetime(&row.get::<_, String>(7)?),
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::Sqlite)
    }
}

fn parse_datetime(s: &str) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map_or_else(|_| chrono::Utc::now(), |dt| dt.with_timezone(&chrono::Utc))
}
