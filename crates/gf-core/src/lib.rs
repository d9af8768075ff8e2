//! Core types for the data grid filtering layer
//! 
//! This crate provides the row data model and the event plumbing shared by
//! the clause filter engine and the filterable row store.

pub mod events;
pub mod value;

// Re-export commonly used types
pub use events::{handler_from_fn, Emitter, EventHandler, SubscriptionId};
pub use value::{CellValue, FieldAccess, Row};
