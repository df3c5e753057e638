//! Date math behind the journal: wait-and-watch windows, duration units,
//! recurrence occurrences and reminder trigger generation.
//!
//! Everything here is pure. Inputs outside their allowed range are clamped
//! rather than rejected, so none of these functions return errors.

pub mod duration;
pub mod potency;
pub mod recurrence;
pub mod triggers;
pub mod window;

pub use duration::DurationUnit;
pub use potency::Potency;
pub use recurrence::{Recurrence, RecurrencePlan};
pub use triggers::{CalendarTrigger, TriggerDescriptor};
pub use window::{WaitWindow, WindowEdit};
