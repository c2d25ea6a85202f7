//! Location map controller: contact checklist, date-time range, marker
//! commands for the map page and the positions table.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use wasight_types::time::format_timestamp;
use wasight_types::{LocationRow, Predicates, Scope, Table, TimeRange};

use crate::filter::{apply, contains_ignore_case};

/// Id of the extra marker placed at a live share's end point.
pub const FINAL_MARKER_ID: i64 = 999_999;
pub const UNNAMED_PLACE: &str = "Unnamed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LiveStatus {
    None,
    Live,
    Final,
}

impl LiveStatus {
    pub fn of(row: &LocationRow) -> Self {
        match &row.live {
            Some(live) if live.final_point().is_some() => LiveStatus::Final,
            Some(_) => LiveStatus::Live,
            None => LiveStatus::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
    pub number: String,
    pub time: String,
    pub live: LiveStatus,
    pub place: String,
}

/// Instructions for the map page, serialized as JSON and replayed in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum MapCommand {
    Clear,
    AddMarker(Marker),
    /// Centre on the marker and flash it.
    Highlight { id: i64, lat: f64, lon: f64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactEntry {
    pub number: String,
    pub count: usize,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionRow {
    pub id: i64,
    pub time: String,
    pub coordinates: String,
    pub place: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerDetail {
    pub id: i64,
    pub number: String,
    pub time: String,
    pub place: String,
    pub coordinates: String,
    pub live: bool,
    pub duration_secs: Option<i64>,
    pub final_point: Option<(f64, f64)>,
    pub final_time: Option<String>,
}

/// Counterparties that shared a location, with their row counts, most
/// locations first and ties by number.
pub fn location_counts(rows: &[LocationRow]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for row in rows.iter().filter(|r| !r.counterparty.is_empty()) {
        *counts.entry(row.counterparty.as_str()).or_insert(0) += 1;
    }
    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(number, n)| (number.to_string(), n))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

fn display_time(ts: Option<i64>) -> String {
    ts.and_then(format_timestamp).unwrap_or_default()
}

pub struct LocationController {
    table: Arc<Table<LocationRow>>,
    contacts: Vec<(String, usize)>,
    contact_filter: String,
    checked: BTreeSet<String>,
    extent: TimeRange,
    range: TimeRange,
    visible: Vec<LocationRow>,
}

impl LocationController {
    pub fn new(table: Arc<Table<LocationRow>>) -> Self {
        let contacts = location_counts(table.rows());
        let extent = match table.timestamp_bounds() {
            Some((from, to)) => TimeRange::new(from, to),
            None => {
                let now = Utc::now().timestamp_millis();
                TimeRange::new(now, now)
            }
        };
        Self {
            table,
            contacts,
            contact_filter: String::new(),
            checked: BTreeSet::new(),
            extent,
            range: extent,
            visible: Vec::new(),
        }
    }

    /// Contacts passing the list filter, in count order.
    pub fn contacts(&self) -> Vec<ContactEntry> {
        let needle = self.contact_filter.trim().to_lowercase();
        self.contacts
            .iter()
            .filter(|(number, _)| contains_ignore_case(number, &needle))
            .map(|(number, count)| ContactEntry {
                number: number.clone(),
                count: *count,
                checked: self.checked.contains(number),
            })
            .collect()
    }

    pub fn checked(&self) -> &BTreeSet<String> {
        &self.checked
    }

    pub fn extent(&self) -> TimeRange {
        self.extent
    }

    pub fn range(&self) -> TimeRange {
        self.range
    }

    /// Narrow the contact list. Checks on contacts that drop out of the
    /// list are removed.
    pub fn set_contact_filter(&mut self, filter: &str) {
        self.contact_filter = filter.to_string();
        let visible: BTreeSet<String> = self.contacts().into_iter().map(|c| c.number).collect();
        self.checked.retain(|n| visible.contains(n));
        self.refresh();
    }

    /// Returns false for numbers not in the contact list.
    pub fn check(&mut self, number: &str, checked: bool) -> bool {
        if !self.contacts.iter().any(|(n, _)| n == number) {
            return false;
        }
        if checked {
            self.checked.insert(number.to_string());
        } else {
            self.checked.remove(number);
        }
        self.refresh();
        true
    }

    pub fn select_all(&mut self) {
        let visible = self.contacts();
        self.checked.extend(visible.into_iter().map(|c| c.number));
        self.refresh();
    }

    pub fn clear_selection(&mut self) {
        self.checked.clear();
        self.refresh();
    }

    pub fn set_range(&mut self, range: TimeRange) {
        self.range = range;
        self.refresh();
    }

    /// Rows of checked contacts inside the range that can be placed on the map.
    fn refresh(&mut self) {
        let predicates = Predicates::reset(Scope::Set(self.checked.clone()), self.range);
        self.visible = apply(self.table.rows(), &predicates)
            .into_iter()
            .filter(|r| r.coordinates().is_some())
            .collect();
        debug!(
            "{} markers for {} checked contacts",
            self.visible.len(),
            self.checked.len()
        );
    }

    pub fn visible(&self) -> &[LocationRow] {
        &self.visible
    }

    pub fn markers(&self) -> Vec<Marker> {
        self.visible.iter().filter_map(marker_for).collect()
    }

    /// Clear, then one marker per visible row.
    pub fn commands(&self) -> Vec<MapCommand> {
        std::iter::once(MapCommand::Clear)
            .chain(self.markers().into_iter().map(MapCommand::AddMarker))
            .collect()
    }

    pub fn positions(&self) -> Vec<PositionRow> {
        self.visible
            .iter()
            .filter_map(|row| {
                let (lat, lon) = row.coordinates()?;
                Some(PositionRow {
                    id: row.id,
                    time: display_time(row.timestamp),
                    coordinates: format!("{}, {}", lat, lon),
                    place: place_or_unnamed(row).to_string(),
                })
            })
            .collect()
    }

    /// "Go to" on a positions row.
    pub fn highlight(&self, id: i64) -> Option<MapCommand> {
        let row = self.visible.iter().find(|r| r.id == id)?;
        let (lat, lon) = row.coordinates()?;
        Some(MapCommand::Highlight { id, lat, lon })
    }

    pub fn detail(&self, id: i64) -> Option<MarkerDetail> {
        let row = self.table.get(id)?;
        let live = row.live.as_ref();
        Some(MarkerDetail {
            id: row.id,
            number: row.counterparty.clone(),
            time: display_time(row.timestamp),
            place: row.place_name.clone(),
            coordinates: row
                .coordinates()
                .map(|(lat, lon)| format!("{}, {}", lat, lon))
                .unwrap_or_default(),
            live: live.is_some(),
            duration_secs: live.map(|l| l.duration_secs),
            final_point: live.and_then(|l| l.final_point()),
            final_time: live.and_then(|l| l.final_timestamp).map(|ts| display_time(Some(ts))),
        })
    }

    /// Marker at the end point of the live share on row `id`.
    pub fn final_marker(&self, id: i64) -> Option<MapCommand> {
        let (lat, lon) = self.table.get(id)?.live.as_ref()?.final_point()?;
        Some(MapCommand::AddMarker(Marker {
            id: FINAL_MARKER_ID,
            lat,
            lon,
            number: "Final".to_string(),
            time: "Final location".to_string(),
            live: LiveStatus::Final,
            place: "Final position".to_string(),
        }))
    }
}

fn place_or_unnamed(row: &LocationRow) -> &str {
    if row.place_name.is_empty() {
        UNNAMED_PLACE
    } else {
        &row.place_name
    }
}

fn marker_for(row: &LocationRow) -> Option<Marker> {
    let (lat, lon) = row.coordinates()?;
    Some(Marker {
        id: row.id,
        lat,
        lon,
        number: row.counterparty.clone(),
        time: display_time(row.timestamp),
        live: LiveStatus::of(row),
        place: row.place_name.clone(),
    })
}
