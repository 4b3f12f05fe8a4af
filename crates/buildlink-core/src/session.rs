use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use buildlink_db::Database;

/// Blob key of the active session.
pub const SESSION_KEY: &str = "buildlink_currentUser";

/// The account that is currently logged in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub email: String,
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn start(email: &str) -> Self {
        Self {
            email: email.to_string(),
            started_at: Utc::now(),
        }
    }
}

pub fn load(db: &Database) -> Result<Option<Session>> {
    match db.get_blob(SESSION_KEY)? {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

pub fn clear(db: &Database) -> Result<()> {
    db.delete_blob(SESSION_KEY)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_reads_stored_session() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(load(&db).unwrap(), None);

        let session = Session::start("jane@x.com");
        db.put_blob(SESSION_KEY, &serde_json::to_string(&session).unwrap())
            .unwrap();
        assert_eq!(load(&db).unwrap(), Some(session));

        clear(&db).unwrap();
        assert_eq!(load(&db).unwrap(), None);
    }
}
