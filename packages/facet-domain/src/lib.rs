pub mod catalog;
pub mod confidence;
pub mod extraction;

pub use catalog::{CatalogField, FieldCategory};
pub use confidence::{ConfidenceLevel, confidence_level};
pub use extraction::{AttributeQuery, CanonicalQuery, EventQuery, normalize_extraction};
