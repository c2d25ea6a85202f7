//! Filtering, pagination, rendering and interaction for the three
//! msgstore views. Nothing here touches a display surface directly:
//! controllers return data and effects, renderers emit display lists.

pub mod calls;
pub mod export;
pub mod filter;
pub mod layout;
pub mod locations;
pub mod media;
pub mod messages;
pub mod open;
pub mod paging;

pub use filter::apply;
pub use paging::{PageError, Pager};
