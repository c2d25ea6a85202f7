//! Call-log star diagram: own line at the centre, one spoke per
//! counterparty, draggable nodes and a per-contact detail table.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::Arc;

use chrono::Local;
use serde::Serialize;
use tracing::debug;

use wasight_types::time::to_datetime_in;
use wasight_types::{CallRow, Table};

use crate::export::DetailTable;
use crate::filter::contains_ignore_case;

pub const DEFAULT_TOP_N: usize = 10;
pub const MAX_TOP_N: usize = 1000;
/// Distance from a node within which a press picks it.
pub const PICK_RADIUS: f64 = 0.75;

pub const DETAIL_COLUMNS: [&str; 4] = ["date", "time", "call_type", "duration"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactNode {
    pub jid: String,
    pub total_calls: usize,
    pub x: f64,
    pub y: f64,
}

impl ContactNode {
    /// Where the call count label sits: halfway along the spoke.
    pub fn midpoint(&self) -> (f64, f64) {
        (self.x / 2.0, self.y / 2.0)
    }

    fn distance_to(&self, x: f64, y: f64) -> f64 {
        ((self.x - x).powi(2) + (self.y - y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StarDiagram {
    pub center: String,
    pub radius: f64,
    pub nodes: Vec<ContactNode>,
}

impl StarDiagram {
    /// Half-width of the square viewport that fits every spoke.
    pub fn extent(&self) -> f64 {
        self.radius + 2.0
    }
}

/// Call counts per counterparty, most calls first, ties by JID. The own
/// number and calls without a counterparty are left out.
pub fn call_counts(calls: &[CallRow], own_number: &str, search: &str) -> Vec<(String, usize)> {
    let needle = search.trim().to_lowercase();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for call in calls {
        let jid = call.counterparty.as_str();
        if jid.is_empty() || jid == own_number || !contains_ignore_case(jid, &needle) {
            continue;
        }
        *counts.entry(jid).or_insert(0) += 1;
    }

    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(jid, n)| (jid.to_string(), n))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

/// Lay the top `top_n` counterparties out evenly on a circle around the
/// own number.
pub fn build_star(calls: &[CallRow], own_number: &str, search: &str, top_n: usize) -> StarDiagram {
    let mut counts = call_counts(calls, own_number, search);
    counts.truncate(top_n);

    let n = counts.len();
    let radius = 5.0 + n as f64 * 0.2;
    let step = if n == 0 { 0.0 } else { 2.0 * PI / n as f64 };

    let nodes = counts
        .into_iter()
        .enumerate()
        .map(|(i, (jid, total_calls))| {
            let angle = i as f64 * step;
            ContactNode {
                jid,
                total_calls,
                x: radius * angle.cos(),
                y: radius * angle.sin(),
            }
        })
        .collect();

    StarDiagram {
        center: own_number.to_string(),
        radius,
        nodes,
    }
}

/// Every call with `jid`, in load order, as date / time / type / duration.
pub fn call_detail(calls: &[CallRow], jid: &str) -> DetailTable {
    let mut table = DetailTable::new(&DETAIL_COLUMNS);
    for call in calls.iter().filter(|c| c.counterparty == jid) {
        let when = call.timestamp.and_then(|ts| to_datetime_in(&Local, ts));
        let (date, time) = match when {
            Some(dt) => (
                dt.format("%Y-%m-%d").to_string(),
                dt.format("%H:%M:%S").to_string(),
            ),
            None => (String::new(), String::new()),
        };
        table.push_row(vec![
            date,
            time,
            call.outcome().label().to_string(),
            call.duration_secs.to_string(),
        ]);
    }
    table
}

#[derive(Debug, Clone)]
struct Drag {
    index: usize,
    origin: (f64, f64),
    grab: (f64, f64),
}

pub struct CallController {
    table: Arc<Table<CallRow>>,
    own_number: String,
    search: String,
    top_n: usize,
    diagram: StarDiagram,
    selected: Option<String>,
    drag: Option<Drag>,
}

impl CallController {
    pub fn new(table: Arc<Table<CallRow>>, own_number: impl Into<String>, top_n: usize) -> Self {
        let mut controller = Self {
            table,
            own_number: own_number.into(),
            search: String::new(),
            top_n: top_n.clamp(1, MAX_TOP_N),
            diagram: StarDiagram {
                center: String::new(),
                radius: 0.0,
                nodes: Vec::new(),
            },
            selected: None,
            drag: None,
        };
        controller.rebuild();
        controller
    }

    pub fn diagram(&self) -> &StarDiagram {
        &self.diagram
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    pub fn set_search(&mut self, search: &str) {
        self.search = search.to_string();
        self.rebuild();
    }

    pub fn set_top_n(&mut self, top_n: usize) {
        self.top_n = top_n.clamp(1, MAX_TOP_N);
        self.rebuild();
    }

    /// Relayout from scratch; drops the selection and any drag.
    fn rebuild(&mut self) {
        self.diagram = build_star(self.table.rows(), &self.own_number, &self.search, self.top_n);
        self.selected = None;
        self.drag = None;
        debug!("Star diagram rebuilt with {} contacts", self.diagram.nodes.len());
    }

    /// Press at diagram coordinates. Picking a node selects it and starts a
    /// drag; pressing empty space keeps the previous selection.
    pub fn press(&mut self, x: f64, y: f64) -> Option<&ContactNode> {
        let index = self
            .diagram
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (i, node.distance_to(x, y)))
            .filter(|(_, d)| *d <= PICK_RADIUS)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)?;

        let node = &self.diagram.nodes[index];
        self.selected = Some(node.jid.clone());
        self.drag = Some(Drag {
            index,
            origin: (node.x, node.y),
            grab: (x, y),
        });
        Some(node)
    }

    /// Pointer moved; repositions the dragged node. Returns whether anything moved.
    pub fn move_to(&mut self, x: f64, y: f64) -> bool {
        let Some(drag) = &self.drag else {
            return false;
        };
        let node = &mut self.diagram.nodes[drag.index];
        node.x = drag.origin.0 + (x - drag.grab.0);
        node.y = drag.origin.1 + (y - drag.grab.1);
        true
    }

    pub fn release(&mut self) {
        self.drag = None;
    }

    /// Detail of the last selected node, if any, whether or not it was dragged.
    pub fn double_click(&self) -> Option<DetailTable> {
        let jid = self.selected.as_deref()?;
        let detail = self.detail(jid);
        (!detail.is_empty()).then_some(detail)
    }

    pub fn detail(&self, jid: &str) -> DetailTable {
        call_detail(self.table.rows(), jid)
    }
}
