//! Reminder bookkeeping between remedies and whatever delivers notifications.
//!
//! The schedule core only describes triggers. A [`ReminderPlan`] says which
//! identifiers to cancel and which descriptors to register, and is applied to
//! a [`NotificationScheduler`]. The journal ships with [`ReminderRegistry`],
//! which keeps registered reminders in the journal file.

use crate::models::Remedy;
use crate::schedule::triggers::{self, DAILY_SYMPTOM_REMINDER_ID, TriggerDescriptor};
use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Something that can deliver calendar reminders.
pub trait NotificationScheduler {
    fn register(&mut self, requests: &[TriggerDescriptor]) -> Result<()>;
    fn cancel(&mut self, identifiers: &[String]) -> Result<()>;
}

/// Scheduling instructions for one change to a remedy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderPlan {
    pub cancel: Vec<String>,
    pub register: Vec<TriggerDescriptor>,
}

impl ReminderPlan {
    pub fn is_empty(&self) -> bool {
        self.cancel.is_empty() && self.register.is_empty()
    }

    /// Identifiers the remedy owns once this plan is applied.
    pub fn handles(&self) -> Vec<String> {
        self.register.iter().map(|r| r.identifier.clone()).collect()
    }

    /// Cancels first, then registers. Returns the new handles.
    pub fn apply(self, scheduler: &mut dyn NotificationScheduler) -> Result<Vec<String>> {
        if !self.cancel.is_empty() {
            scheduler.cancel(&self.cancel)?;
        }
        if !self.register.is_empty() {
            scheduler.register(&self.register)?;
        }
        tracing::debug!(
            cancelled = self.cancel.len(),
            registered = self.register.len(),
            "applied reminder plan"
        );
        Ok(self.handles())
    }
}

/// Replace the remedy's reminders with a freshly generated schedule.
pub fn plan_reschedule(remedy: &Remedy) -> ReminderPlan {
    ReminderPlan {
        cancel: remedy.notification_handles.clone(),
        register: remedy.trigger_schedule(),
    }
}

/// Drop every reminder the remedy owns.
pub fn plan_retirement(remedy: &Remedy) -> ReminderPlan {
    ReminderPlan {
        cancel: remedy.notification_handles.clone(),
        register: Vec::new(),
    }
}

/// Apply [`plan_reschedule`] and store the new handles on the remedy.
pub fn reschedule(remedy: &mut Remedy, scheduler: &mut dyn NotificationScheduler) -> Result<()> {
    let plan = plan_reschedule(remedy);
    if plan.is_empty() {
        return Ok(());
    }
    remedy.notification_handles = plan.apply(scheduler)?;
    Ok(())
}

pub fn retire(remedy: &mut Remedy, scheduler: &mut dyn NotificationScheduler) -> Result<()> {
    plan_retirement(remedy).apply(scheduler)?;
    remedy.notification_handles.clear();
    Ok(())
}

/// Bring the daily symptom reminder in line with the settings.
pub fn sync_daily_symptom_reminder(
    scheduler: &mut dyn NotificationScheduler,
    enabled: bool,
    time: NaiveTime,
) -> Result<()> {
    scheduler.cancel(&[DAILY_SYMPTOM_REMINDER_ID.to_string()])?;
    if enabled {
        scheduler.register(&[triggers::daily_symptom_reminder(time)])?;
    }
    Ok(())
}

/// Registered reminders, keyed by identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderRegistry {
    entries: BTreeMap<String, TriggerDescriptor>,
}

impl ReminderRegistry {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, identifier: &str) -> Option<&TriggerDescriptor> {
        self.entries.get(identifier)
    }

    /// All reminders in time-of-day order.
    pub fn list(&self) -> Vec<&TriggerDescriptor> {
        let mut all: Vec<&TriggerDescriptor> = self.entries.values().collect();
        all.sort_by_key(|d| (d.trigger.hour, d.trigger.minute, d.identifier.as_str()));
        all
    }

    /// Reminders whose trigger matches `date`. Descriptors carry no end date, so
    /// a remedy's reminders keep matching after its recurrence ends until
    /// `Journal::resync_reminders` retires them.
    pub fn firing_on(&self, date: NaiveDate) -> Vec<&TriggerDescriptor> {
        self.list()
            .into_iter()
            .filter(|d| d.trigger.fires_on(date))
            .collect()
    }

    pub fn owned_by(&self, handles: &[String]) -> Vec<&TriggerDescriptor> {
        self.list()
            .into_iter()
            .filter(|d| handles.contains(&d.identifier))
            .collect()
    }
}

impl NotificationScheduler for ReminderRegistry {
    fn register(&mut self, requests: &[TriggerDescriptor]) -> Result<()> {
        for request in requests {
            self.entries
                .insert(request.identifier.clone(), request.clone());
        }
        Ok(())
    }

    fn cancel(&mut self, identifiers: &[String]) -> Result<()> {
        for identifier in identifiers {
            self.entries.remove(identifier);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::potency::Potency;
    use crate::schedule::recurrence::{Recurrence, RecurrencePlan};
    use chrono::NaiveDateTime;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl NotificationScheduler for Recorder {
        fn register(&mut self, requests: &[TriggerDescriptor]) -> Result<()> {
            self.calls.push(format!("register {}", requests.len()));
            Ok(())
        }

        fn cancel(&mut self, identifiers: &[String]) -> Result<()> {
            self.calls.push(format!("cancel {}", identifiers.len()));
            Ok(())
        }
    }

    fn at(m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn recurring(recurrence: Recurrence) -> Remedy {
        let mut remedy =
            Remedy::log("Nux vomica", Potency::C30, None, at(1, 3, 7), at(1, 3, 7)).unwrap();
        remedy.set_recurrence(Some(RecurrencePlan::new(recurrence, at(2, 1, 0))));
        remedy
    }

    #[test]
    fn test_reschedule_cancels_old_handles_first() {
        let mut remedy = recurring(Recurrence::multiple_times_per_day(4, 6));
        let mut recorder = Recorder::default();

        reschedule(&mut remedy, &mut recorder).unwrap();
        assert_eq!(recorder.calls, vec!["register 4"]);
        assert_eq!(remedy.notification_handles.len(), 4);

        reschedule(&mut remedy, &mut recorder).unwrap();
        assert_eq!(recorder.calls, vec!["register 4", "cancel 4", "register 4"]);
    }

    #[test]
    fn test_registry_replaces_schedule() {
        let mut remedy = recurring(Recurrence::multiple_times_per_day(3, 8));
        let mut registry = ReminderRegistry::default();

        reschedule(&mut remedy, &mut registry).unwrap();
        let first = remedy.notification_handles.clone();
        reschedule(&mut remedy, &mut registry).unwrap();

        assert_eq!(registry.len(), 3);
        assert!(first.iter().all(|id| registry.get(id).is_none()));
        assert_eq!(registry.owned_by(&remedy.notification_handles).len(), 3);
    }

    #[test]
    fn test_retire_clears_everything() {
        let mut remedy = recurring(Recurrence::Weekly);
        let mut registry = ReminderRegistry::default();
        reschedule(&mut remedy, &mut registry).unwrap();
        assert_eq!(registry.len(), 1);

        let plan = plan_retirement(&remedy);
        assert_eq!(plan.cancel, remedy.notification_handles);
        assert!(plan.register.is_empty());

        retire(&mut remedy, &mut registry).unwrap();
        assert!(registry.is_empty());
        assert!(remedy.notification_handles.is_empty());
    }

    #[test]
    fn test_dropping_recurrence_cancels_reminders() {
        let mut remedy = recurring(Recurrence::Daily);
        let mut registry = ReminderRegistry::default();
        reschedule(&mut remedy, &mut registry).unwrap();

        remedy.set_recurrence(None);
        reschedule(&mut remedy, &mut registry).unwrap();
        assert!(registry.is_empty());
        assert!(remedy.notification_handles.is_empty());
    }

    #[test]
    fn test_firing_on_respects_weekday() {
        let mut remedy = recurring(Recurrence::Weekly); // Jan 3 2024 is a Wednesday
        let mut registry = ReminderRegistry::default();
        reschedule(&mut remedy, &mut registry).unwrap();
        sync_daily_symptom_reminder(&mut registry, true, NaiveTime::from_hms_opt(20, 0, 0).unwrap())
            .unwrap();

        let wednesday = registry.firing_on(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        assert_eq!(wednesday.len(), 2);
        assert_eq!(wednesday[0].trigger.hour, 7);
        let thursday = registry.firing_on(NaiveDate::from_ymd_opt(2024, 1, 11).unwrap());
        assert_eq!(thursday.len(), 1);
        assert_eq!(thursday[0].identifier, DAILY_SYMPTOM_REMINDER_ID);
    }

    #[test]
    fn test_daily_reminder_sync_replaces_and_disables() {
        let mut registry = ReminderRegistry::default();
        let eight = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        let evening = NaiveTime::from_hms_opt(21, 30, 0).unwrap();

        sync_daily_symptom_reminder(&mut registry, true, eight).unwrap();
        sync_daily_symptom_reminder(&mut registry, true, evening).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.list()[0].trigger.hour, 21);

        sync_daily_symptom_reminder(&mut registry, false, evening).unwrap();
        assert!(registry.is_empty());
    }
}
