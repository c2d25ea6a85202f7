use std::collections::HashMap;

use tracing::warn;

use crate::models::Record;

/// An immutable in-memory table of rows in load order.
///
/// Identifiers are unique: when the source yields the same id twice (a
/// left join fanning out over auxiliary rows), the first occurrence wins.
#[derive(Debug, Clone)]
pub struct Table<R> {
    rows: Vec<R>,
    index: HashMap<i64, usize>,
}

impl<R: Record> Table<R> {
    pub fn new(rows: Vec<R>) -> Self {
        let mut index = HashMap::with_capacity(rows.len());
        let mut kept = Vec::with_capacity(rows.len());
        let mut duplicates = 0usize;

        for row in rows {
            if index.contains_key(&row.id()) {
                duplicates += 1;
                continue;
            }
            index.insert(row.id(), kept.len());
            kept.push(row);
        }

        if duplicates > 0 {
            warn!("Dropped {} rows with duplicate ids", duplicates);
        }

        Self { rows: kept, index }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&R> {
        self.index.get(&id).map(|&i| &self.rows[i])
    }

    /// Smallest and largest present timestamp, if any row has one.
    pub fn timestamp_bounds(&self) -> Option<(i64, i64)> {
        self.rows
            .iter()
            .filter_map(|r| r.timestamp())
            .fold(None, |acc, ts| match acc {
                None => Some((ts, ts)),
                Some((lo, hi)) => Some((lo.min(ts), hi.max(ts))),
            })
    }
}

impl<R: Record> Default for Table<R> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LocationRow, Record};

    fn loc(id: i64, ts: Option<i64>) -> LocationRow {
        LocationRow {
            id,
            counterparty: "a".into(),
            latitude: Some(1.0),
            longitude: Some(2.0),
            place_name: String::new(),
            place_address: String::new(),
            url: String::new(),
            live: None,
            timestamp: ts,
        }
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let mut second = loc(1, Some(99));
        second.place_name = "dup".into();
        let table = Table::new(vec![loc(1, Some(10)), second, loc(2, None)]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1).map(|r| r.timestamp()), Some(Some(10)));
    }

    #[test]
    fn bounds_ignore_absent_timestamps() {
        let table = Table::new(vec![loc(1, Some(30)), loc(2, None), loc(3, Some(5))]);
        assert_eq!(table.timestamp_bounds(), Some((5, 30)));
        assert_eq!(Table::<LocationRow>::default().timestamp_bounds(), None);
    }
}
