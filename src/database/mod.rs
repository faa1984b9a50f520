pub mod db;
pub mod users;

use crate::error::{Error, Result};
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};

/// Connection shared by the UI, the identity provider and study sessions.
pub type SharedConnection = Arc<Mutex<Connection>>;

pub fn shared(conn: Connection) -> SharedConnection {
    Arc::new(Mutex::new(conn))
}

pub fn lock(conn: &SharedConnection) -> Result<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|_| Error::LockPoisoned)
}
