use rusqlite::Connection;
use tracing::info;

use wasight_types::{CallRow, LocationRow, MessageRow, Table};

use crate::models::{RawCall, RawLocation, RawLocationRow, RawMessage, lenient_i64};
use crate::{MsgStore, Result};

const MESSAGES_SQL: &str = "
    SELECT
        message._id,
        message.key_id,
        message.from_me,
        message.status,
        message.timestamp,
        message.message_type,
        message.text_data,
        jid.raw_string,
        chat.subject,
        chat_jid.raw_string,
        message_media.message_row_id,
        message_media.file_path,
        message_media.media_name,
        message_media.file_size,
        message_media.media_caption,
        message_media.media_duration,
        message_media.mime_type,
        message_media.width,
        message_media.height,
        message_location.message_row_id,
        message_location.latitude,
        message_location.longitude,
        message_location.place_name,
        message_location.place_address,
        message_location.url,
        message_location.live_location_share_duration,
        message_location.live_location_sequence_number,
        message_location.live_location_final_latitude,
        message_location.live_location_final_longitude,
        message_location.live_location_final_timestamp
    FROM message
    LEFT JOIN jid ON message.sender_jid_row_id = jid._id
    LEFT JOIN chat ON message.chat_row_id = chat._id
    LEFT JOIN jid AS chat_jid ON chat.jid_row_id = chat_jid._id
    LEFT JOIN message_media ON message._id = message_media.message_row_id
    LEFT JOIN message_location ON message._id = message_location.message_row_id
    ORDER BY message._id";

const CALLS_SQL: &str = "
    SELECT
        call_log._id,
        call_log.from_me,
        call_log.call_id,
        call_log.timestamp,
        call_log.duration,
        call_log.video_call,
        call_log.call_result,
        call_log.call_type,
        jid.raw_string
    FROM call_log
    LEFT JOIN jid ON call_log.jid_row_id = jid._id
    ORDER BY call_log._id";

const LOCATIONS_SQL: &str = "
    SELECT
        ml.message_row_id,
        j.raw_string,
        m.timestamp,
        ml.latitude,
        ml.longitude,
        ml.place_name,
        ml.place_address,
        ml.url,
        ml.live_location_share_duration,
        ml.live_location_sequence_number,
        ml.live_location_final_latitude,
        ml.live_location_final_longitude,
        ml.live_location_final_timestamp
    FROM message_location ml
    LEFT JOIN message m ON ml.message_row_id = m._id
    LEFT JOIN chat cc ON m.chat_row_id = cc._id
    LEFT JOIN jid j ON cc.jid_row_id = j._id
    ORDER BY ml.message_row_id";

impl MsgStore {
    pub fn load_messages(&self) -> Result<Table<MessageRow>> {
        let rows = self.with_conn(query_messages)?;
        let table = Table::new(rows);
        info!("Loaded {} messages", table.len());
        Ok(table)
    }

    pub fn load_calls(&self) -> Result<Table<CallRow>> {
        let rows = self.with_conn(query_calls)?;
        let table = Table::new(rows);
        info!("Loaded {} calls", table.len());
        Ok(table)
    }

    pub fn load_locations(&self) -> Result<Table<LocationRow>> {
        let rows = self.with_conn(query_locations)?;
        let table = Table::new(rows);
        info!("Loaded {} shared locations", table.len());
        Ok(table)
    }
}

fn query_messages(conn: &Connection) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(MESSAGES_SQL)?;

    let rows = stmt
        .query_map([], |row| {
            let location = match row.get::<_, Option<i64>>(19)? {
                Some(_) => Some(RawLocation::from_row(row, 20)?),
                None => None,
            };
            Ok(RawMessage {
                id: row.get(0)?,
                key_id: row.get(1)?,
                from_me: lenient_i64(row, 2)?,
                status: lenient_i64(row, 3)?,
                timestamp: lenient_i64(row, 4)?,
                message_type: lenient_i64(row, 5)?,
                text_data: row.get(6)?,
                sender_jid: row.get(7)?,
                chat_name: row.get(8)?,
                chat_jid: row.get(9)?,
                media_row: row.get(10)?,
                file_path: row.get(11)?,
                media_name: row.get(12)?,
                media_size: lenient_i64(row, 13)?,
                media_caption: row.get(14)?,
                media_duration: lenient_i64(row, 15)?,
                mime_type: row.get(16)?,
                width: lenient_i64(row, 17)?,
                height: lenient_i64(row, 18)?,
                location,
            }
            .into_row())
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_calls(conn: &Connection) -> Result<Vec<CallRow>> {
    let mut stmt = conn.prepare(CALLS_SQL)?;

    let rows = stmt
        .query_map([], |row| {
            Ok(RawCall {
                id: row.get(0)?,
                from_me: lenient_i64(row, 1)?,
                call_id: row.get(2)?,
                timestamp: lenient_i64(row, 3)?,
                duration: lenient_i64(row, 4)?,
                video_call: lenient_i64(row, 5)?,
                call_result: lenient_i64(row, 6)?,
                call_type: lenient_i64(row, 7)?,
                caller_jid: row.get(8)?,
            }
            .into_row())
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_locations(conn: &Connection) -> Result<Vec<LocationRow>> {
    let mut stmt = conn.prepare(LOCATIONS_SQL)?;

    let rows = stmt
        .query_map([], |row| {
            Ok(RawLocationRow {
                message_id: row.get(0)?,
                number: row.get(1)?,
                timestamp: lenient_i64(row, 2)?,
                location: RawLocation::from_row(row, 3)?,
            }
            .into_row())
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}
