/// Nullable rows as they come out of the left-joined queries.
/// Normalization into `wasight_types` rows happens here, so nothing
/// downstream branches on a missing column value.
use rusqlite::Row;
use rusqlite::types::ValueRef;

use wasight_types::time::normalize_timestamp;
use wasight_types::{
    CallRow, Category, LiveShare, LocationInfo, LocationRow, MediaRef, MessageRow,
};

pub struct RawMessage {
    pub id: i64,
    pub key_id: Option<String>,
    pub from_me: Option<i64>,
    pub status: Option<i64>,
    pub timestamp: Option<i64>,
    pub message_type: Option<i64>,
    pub text_data: Option<String>,
    pub sender_jid: Option<String>,
    pub chat_name: Option<String>,
    pub chat_jid: Option<String>,
    pub media_row: Option<i64>,
    pub file_path: Option<String>,
    pub media_name: Option<String>,
    pub media_size: Option<i64>,
    pub media_caption: Option<String>,
    pub media_duration: Option<i64>,
    pub mime_type: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub location: Option<RawLocation>,
}

pub struct RawLocation {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub place_name: Option<String>,
    pub place_address: Option<String>,
    pub url: Option<String>,
    pub share_duration: Option<i64>,
    pub sequence_number: Option<i64>,
    pub final_latitude: Option<f64>,
    pub final_longitude: Option<f64>,
    pub final_timestamp: Option<i64>,
}

pub struct RawCall {
    pub id: i64,
    pub from_me: Option<i64>,
    pub call_id: Option<String>,
    pub timestamp: Option<i64>,
    pub duration: Option<i64>,
    pub video_call: Option<i64>,
    pub call_result: Option<i64>,
    pub call_type: Option<i64>,
    pub caller_jid: Option<String>,
}

pub struct RawLocationRow {
    pub message_id: i64,
    pub number: Option<String>,
    pub timestamp: Option<i64>,
    pub location: RawLocation,
}

impl RawLocation {
    /// Read the ten location columns starting at `start`.
    pub fn from_row(row: &Row<'_>, start: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            latitude: lenient_f64(row, start)?,
            longitude: lenient_f64(row, start + 1)?,
            place_name: row.get(start + 2)?,
            place_address: row.get(start + 3)?,
            url: row.get(start + 4)?,
            share_duration: lenient_i64(row, start + 5)?,
            sequence_number: lenient_i64(row, start + 6)?,
            final_latitude: lenient_f64(row, start + 7)?,
            final_longitude: lenient_f64(row, start + 8)?,
            final_timestamp: lenient_i64(row, start + 9)?,
        })
    }

    fn live(&self) -> Option<LiveShare> {
        let duration_secs = self.share_duration.unwrap_or(0);
        if duration_secs <= 0 {
            return None;
        }
        Some(LiveShare {
            duration_secs,
            sequence_number: self.sequence_number.unwrap_or(0),
            final_latitude: self.final_latitude,
            final_longitude: self.final_longitude,
            final_timestamp: normalize_timestamp(self.final_timestamp),
        })
    }

    pub fn into_info(self) -> LocationInfo {
        let live = self.live();
        LocationInfo {
            latitude: self.latitude,
            longitude: self.longitude,
            place_name: self.place_name.unwrap_or_default(),
            place_address: self.place_address.unwrap_or_default(),
            url: self.url.unwrap_or_default(),
            live,
        }
    }
}

impl RawMessage {
    pub fn into_row(self) -> MessageRow {
        let media = self.media_row.map(|_| MediaRef {
            path: self.file_path.unwrap_or_default(),
            name: self.media_name.unwrap_or_default(),
            caption: self.media_caption.unwrap_or_default(),
            mime_type: self.mime_type.unwrap_or_default(),
            size: self.media_size.unwrap_or(0),
            duration_secs: self.media_duration.unwrap_or(0),
            width: self.width,
            height: self.height,
        });

        MessageRow {
            id: self.id,
            key_id: self.key_id.unwrap_or_default(),
            chat_jid: self.chat_jid.unwrap_or_default(),
            chat_name: self.chat_name.unwrap_or_default(),
            sender_jid: self.sender_jid.unwrap_or_default(),
            from_me: self.from_me.unwrap_or(0) == 1,
            status: self.status.unwrap_or(0),
            timestamp: normalize_timestamp(self.timestamp),
            category: Category::from_code(self.message_type.unwrap_or(0)),
            text: self.text_data.unwrap_or_default(),
            media,
            location: self.location.map(RawLocation::into_info),
        }
    }
}

impl RawCall {
    pub fn into_row(self) -> CallRow {
        CallRow {
            id: self.id,
            counterparty: self.caller_jid.unwrap_or_default(),
            from_me: self.from_me.unwrap_or(0) == 1,
            call_id: self.call_id.unwrap_or_default(),
            timestamp: normalize_timestamp(self.timestamp),
            duration_secs: self.duration.unwrap_or(0),
            video: self.video_call.unwrap_or(0) == 1,
            result: self.call_result.unwrap_or(0),
            call_type: self.call_type.unwrap_or(0),
        }
    }
}

impl RawLocationRow {
    pub fn into_row(self) -> LocationRow {
        let info = self.location.into_info();
        LocationRow {
            id: self.message_id,
            counterparty: self.number.unwrap_or_default(),
            latitude: info.latitude,
            longitude: info.longitude,
            place_name: info.place_name,
            place_address: info.place_address,
            url: info.url,
            live: info.live,
            timestamp: normalize_timestamp(self.timestamp),
        }
    }
}

/// Integer column that tolerates REAL and numeric TEXT storage; anything
/// else reads as absent.
pub fn lenient_i64(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<i64>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Integer(v) => Some(v),
        ValueRef::Real(v) if v.is_finite() => Some(v as i64),
        ValueRef::Text(t) => std::str::from_utf8(t)
            .ok()
            .and_then(|s| s.trim().parse::<i64>().ok()),
        _ => None,
    })
}

pub fn lenient_f64(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<f64>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Integer(v) => Some(v as f64),
        ValueRef::Real(v) if v.is_finite() => Some(v),
        ValueRef::Text(t) => std::str::from_utf8(t)
            .ok()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite()),
        _ => None,
    })
}
