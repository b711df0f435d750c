pub mod batch;
pub mod coordinator;
pub mod document;

pub use coordinator::{DocumentFilter, IndexWriteCoordinator};
