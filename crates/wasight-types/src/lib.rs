pub mod api;
pub mod filter;
pub mod models;
pub mod summary;
pub mod table;
pub mod time;

pub use filter::{CategoryFilter, Predicates, Scope, TimeRange};
pub use models::{
    CallOutcome, CallRow, Category, LiveShare, LocationInfo, LocationRow, MediaRef, MessageRow,
    Record, Row,
};
pub use summary::ConversationSummary;
pub use table::Table;
