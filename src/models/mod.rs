pub mod remedy;
pub mod symptom;
pub mod timeline;

pub use remedy::Remedy;
pub use symptom::{Severity, Symptom};
pub use timeline::{DateRange, ItemKind, KindFilter, TimelineFilter, TimelineItem};
