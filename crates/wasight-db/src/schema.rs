use rusqlite::Connection;
use tracing::info;

use crate::{DataSourceError, Result};

/// Tables the load queries read from.
pub const REQUIRED_TABLES: [&str; 6] = [
    "message",
    "chat",
    "jid",
    "message_media",
    "message_location",
    "call_log",
];

/// Fail with `MissingTable` unless every table the queries touch exists.
pub fn verify(conn: &Connection) -> Result<()> {
    let mut stmt = conn.prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
    for table in REQUIRED_TABLES {
        if !stmt.exists([table])? {
            return Err(DataSourceError::MissingTable(table));
        }
    }
    Ok(())
}

/// Create an empty database with the subset of the msgstore schema the
/// viewer reads. Used to build fixtures; the viewer itself never writes.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS jid (
            _id         INTEGER PRIMARY KEY,
            raw_string  TEXT
        );

        CREATE TABLE IF NOT EXISTS chat (
            _id         INTEGER PRIMARY KEY,
            jid_row_id  INTEGER,
            subject     TEXT
        );

        CREATE TABLE IF NOT EXISTS message (
            _id                 INTEGER PRIMARY KEY,
            key_id              TEXT,
            chat_row_id         INTEGER,
            from_me             INTEGER,
            sender_jid_row_id   INTEGER,
            status              INTEGER,
            timestamp           INTEGER,
            message_type        INTEGER,
            text_data           TEXT
        );

        CREATE TABLE IF NOT EXISTS message_media (
            message_row_id  INTEGER PRIMARY KEY,
            file_path       TEXT,
            media_name      TEXT,
            file_size       INTEGER,
            media_caption   TEXT,
            media_duration  INTEGER,
            mime_type       TEXT,
            width           INTEGER,
            height          INTEGER
        );

        CREATE TABLE IF NOT EXISTS message_location (
            message_row_id                  INTEGER PRIMARY KEY,
            latitude                        REAL,
            longitude                       REAL,
            place_name                      TEXT,
            place_address                   TEXT,
            url                             TEXT,
            live_location_share_duration    INTEGER,
            live_location_sequence_number   INTEGER,
            live_location_final_latitude    REAL,
            live_location_final_longitude   REAL,
            live_location_final_timestamp   INTEGER
        );

        CREATE TABLE IF NOT EXISTS call_log (
            _id             INTEGER PRIMARY KEY,
            jid_row_id      INTEGER,
            from_me         INTEGER,
            call_id         TEXT,
            timestamp       INTEGER,
            duration        INTEGER,
            video_call      INTEGER,
            call_result     INTEGER,
            call_type       INTEGER
        );
        ",
    )?;

    info!("msgstore schema created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_reports_first_missing_table() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE message (_id INTEGER PRIMARY KEY);").unwrap();
        match verify(&conn) {
            Err(DataSourceError::MissingTable(name)) => assert_eq!(name, "chat"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn created_schema_verifies() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        verify(&conn).unwrap();
    }
}
