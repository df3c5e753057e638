use crate::error::JournalError;
use crate::models::symptom::clean_notes;
use crate::schedule::duration::DurationUnit;
use crate::schedule::potency::Potency;
use crate::schedule::recurrence::{self, RecurrencePlan};
use crate::schedule::triggers::{self, ReminderContent, TriggerDescriptor};
use crate::schedule::window::{WaitWindow, WindowEdit};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Remedy {
    pub id: Uuid,
    pub name: String,
    pub potency: Potency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_potency: Option<String>,
    pub taken_at: NaiveDateTime,
    /// May precede `taken_at`.
    pub prescribed_at: NaiveDateTime,
    pub wait_value: i64,
    pub wait_unit: DurationUnit,
    /// Never before `taken_at`.
    pub due_at: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(
        default,
        with = "recurrence::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub recurrence: Option<RecurrencePlan>,
    /// Identifiers of the reminders currently registered for this remedy.
    #[serde(default)]
    pub notification_handles: Vec<String>,
}

impl Remedy {
    /// A freshly taken remedy with the potency's default wait period.
    pub fn log(
        name: &str,
        potency: Potency,
        custom_potency: Option<String>,
        taken_at: NaiveDateTime,
        prescribed_at: NaiveDateTime,
    ) -> Result<Self, JournalError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(JournalError::EmptyName("Remedy"));
        }
        let custom_potency = validate_custom_potency(potency, custom_potency)?;

        let window = WaitWindow::for_potency(taken_at, potency);
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            potency,
            custom_potency,
            taken_at: window.taken_at,
            prescribed_at,
            wait_value: window.value,
            wait_unit: window.unit,
            due_at: window.due_at,
            notes: None,
            recurrence: None,
            notification_handles: Vec::new(),
        })
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = clean_notes(notes);
        self
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = clean_notes(notes);
    }

    pub fn display_potency(&self) -> &str {
        match (&self.potency, &self.custom_potency) {
            (Potency::Other, Some(custom)) => custom.as_str(),
            (potency, _) => potency.as_str(),
        }
    }

    /// Change the potency. The wait window resets to the new potency's default.
    pub fn set_potency(
        &mut self,
        potency: Potency,
        custom_potency: Option<String>,
    ) -> Result<(), JournalError> {
        self.custom_potency = validate_custom_potency(potency, custom_potency)?;
        self.potency = potency;
        self.apply_window(WindowEdit::Potency(potency));
        Ok(())
    }

    pub fn window(&self) -> WaitWindow {
        WaitWindow {
            taken_at: self.taken_at,
            value: self.wait_value,
            unit: self.wait_unit,
            due_at: self.due_at.max(self.taken_at),
        }
    }

    /// Run one edit through the wait window and store the result.
    ///
    /// Moving `taken_at` past the recurrence end pulls the end along.
    pub fn apply_window(&mut self, edit: WindowEdit) {
        let window = self.window().apply(edit);
        self.taken_at = window.taken_at;
        self.wait_value = window.value;
        self.wait_unit = window.unit;
        self.due_at = window.due_at;
        if let Some(plan) = self.recurrence.as_mut() {
            plan.ends_at = plan.ends_at.max(self.taken_at);
        }
    }

    pub fn is_active_at(&self, at: NaiveDateTime) -> bool {
        self.window().contains(at)
    }

    pub fn is_active(&self, now: NaiveDateTime) -> bool {
        now <= self.due_at
    }

    /// The end date is raised to `taken_at` when it precedes it.
    pub fn set_recurrence(&mut self, plan: Option<RecurrencePlan>) {
        self.recurrence = plan.map(|mut plan| {
            plan.ends_at = plan.ends_at.max(self.taken_at);
            plan
        });
    }

    pub fn has_occurrence_on(&self, date: NaiveDate) -> bool {
        recurrence::has_occurrence_on(self.taken_at, self.recurrence.as_ref(), date)
    }

    pub fn occurrences_between(&self, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
        recurrence::occurrences_between(self.taken_at, self.recurrence.as_ref(), from, to)
    }

    pub fn wait_period_seconds(&self) -> i64 {
        (self.window().due_at - self.taken_at).num_seconds()
    }

    pub fn trigger_schedule(&self) -> Vec<TriggerDescriptor> {
        triggers::generate_trigger_schedule(
            self.taken_at,
            self.recurrence.as_ref(),
            ReminderContent {
                name: &self.name,
                potency: self.display_potency(),
            },
        )
    }
}

fn validate_custom_potency(
    potency: Potency,
    custom_potency: Option<String>,
) -> Result<Option<String>, JournalError> {
    let custom_potency = clean_notes(custom_potency);
    match (potency, custom_potency) {
        (Potency::Other, None) => Err(JournalError::MissingCustomPotency),
        (Potency::Other, custom) => Ok(custom),
        // Only meaningful for custom potencies
        (_, _) => Ok(None),
    }
}
