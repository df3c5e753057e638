use crate::error::JournalError;
use crate::models::{Remedy, Symptom};
use crate::reminders::{self, ReminderRegistry};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;
use uuid::Uuid;

pub const JOURNAL_VERSION: &str = "1.0.0";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Journal {
    pub version: String,
    #[serde(default)]
    pub symptoms: Vec<Symptom>,
    #[serde(default)]
    pub remedies: Vec<Remedy>,
    #[serde(default)]
    pub reminders: ReminderRegistry,
}

impl Default for Journal {
    fn default() -> Self {
        Self {
            version: JOURNAL_VERSION.to_string(),
            symptoms: Vec::new(),
            remedies: Vec::new(),
            reminders: ReminderRegistry::default(),
        }
    }
}

impl Journal {
    /// Read a journal. A missing or blank file is an empty journal.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = match fs::read(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("Cannot read journal {}", path.display()));
            }
        };

        if raw.iter().all(u8::is_ascii_whitespace) {
            tracing::debug!(path = %path.display(), "blank journal, starting empty");
            return Ok(Self::default());
        }
        serde_json::from_slice(&raw)
            .with_context(|| format!("Journal {} is not valid JSON", path.display()))
    }

    /// Write the journal beside `path`, flush it to disk, then swap it in.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create {}", parent.display()))?;
        }

        let staged = path.with_extension("json.partial");
        let mut out = BufWriter::new(
            File::create(&staged).with_context(|| format!("Cannot write {}", staged.display()))?,
        );
        serde_json::to_writer_pretty(&mut out, self).context("Failed to encode journal")?;
        out.flush()?;
        out.get_ref().sync_all()?;
        fs::rename(&staged, path)
            .with_context(|| format!("Cannot replace journal {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            symptoms = self.symptoms.len(),
            remedies = self.remedies.len(),
            "saved journal"
        );
        Ok(())
    }

    pub fn add_symptom(&mut self, symptom: Symptom) -> &Symptom {
        self.symptoms.push(symptom);
        &self.symptoms[self.symptoms.len() - 1]
    }

    pub fn symptom(&self, id: &str) -> Result<&Symptom, JournalError> {
        let index = find_index(&self.symptoms, id, |s| s.id, JournalError::SymptomNotFound)?;
        Ok(&self.symptoms[index])
    }

    pub fn symptom_mut(&mut self, id: &str) -> Result<&mut Symptom, JournalError> {
        let index = find_index(&self.symptoms, id, |s| s.id, JournalError::SymptomNotFound)?;
        Ok(&mut self.symptoms[index])
    }

    pub fn remove_symptom(&mut self, id: &str) -> Result<Symptom, JournalError> {
        let index = find_index(&self.symptoms, id, |s| s.id, JournalError::SymptomNotFound)?;
        Ok(self.symptoms.remove(index))
    }

    /// Store a remedy and register its reminders.
    pub fn add_remedy(&mut self, mut remedy: Remedy) -> Result<&Remedy> {
        reminders::reschedule(&mut remedy, &mut self.reminders)?;
        self.remedies.push(remedy);
        Ok(&self.remedies[self.remedies.len() - 1])
    }

    pub fn remedy(&self, id: &str) -> Result<&Remedy, JournalError> {
        let index = find_index(&self.remedies, id, |r| r.id, JournalError::RemedyNotFound)?;
        Ok(&self.remedies[index])
    }

    /// Edit a remedy in place, then regenerate its reminders.
    pub fn update_remedy<F>(&mut self, id: &str, edit: F) -> Result<&Remedy>
    where
        F: FnOnce(&mut Remedy) -> Result<()>,
    {
        let index = find_index(&self.remedies, id, |r| r.id, JournalError::RemedyNotFound)?;
        let remedy = &mut self.remedies[index];
        edit(remedy)?;
        reminders::reschedule(remedy, &mut self.reminders)?;
        Ok(&self.remedies[index])
    }

    /// Remove a remedy and cancel every reminder it owns.
    pub fn remove_remedy(&mut self, id: &str) -> Result<Remedy> {
        let index = find_index(&self.remedies, id, |r| r.id, JournalError::RemedyNotFound)?;
        let mut remedy = self.remedies.remove(index);
        reminders::retire(&mut remedy, &mut self.reminders)?;
        Ok(remedy)
    }

    /// Regenerate reminders for every remedy whose recurrence is still running on
    /// `today`. Remedies whose recurrence ended before `today` lose their
    /// reminders. Returns how many were registered.
    pub fn resync_reminders(&mut self, today: NaiveDate) -> Result<usize> {
        for remedy in &mut self.remedies {
            let ended = remedy
                .recurrence
                .as_ref()
                .is_some_and(|plan| plan.ends_at.date() < today);
            if ended {
                reminders::retire(remedy, &mut self.reminders)?;
            } else {
                reminders::reschedule(remedy, &mut self.reminders)?;
            }
        }
        Ok(self
            .remedies
            .iter()
            .map(|r| r.notification_handles.len())
            .sum())
    }

    /// Distinct remedy names the user has logged before.
    pub fn remedy_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.remedies.iter().map(|r| r.name.clone()).collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Position of the entry whose id equals `id` or starts with it.
fn find_index<T>(
    items: &[T],
    id: &str,
    id_of: impl Fn(&T) -> Uuid,
    not_found: fn(String) -> JournalError,
) -> Result<usize, JournalError> {
    let needle = id.trim().to_ascii_lowercase();
    if needle.is_empty() {
        return Err(not_found(id.to_string()));
    }

    let mut matches = items
        .iter()
        .enumerate()
        .filter(|(_, item)| id_of(item).to_string().starts_with(&needle))
        .map(|(index, _)| index);

    match (matches.next(), matches.next()) {
        (Some(index), None) => Ok(index),
        (Some(_), Some(_)) => Err(JournalError::AmbiguousId(id.to_string())),
        (None, _) => Err(not_found(id.to_string())),
    }
}

/// Exclusive advisory lock on the journal's lock file, released on drop.
struct JournalLock {
    file: File,
}

impl JournalLock {
    fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("Cannot open lock file {}", path.display()))?;
        file.lock_exclusive()
            .with_context(|| format!("Cannot lock {}", path.display()))?;
        tracing::debug!(path = %path.display(), "journal locked");
        Ok(Self { file })
    }
}

impl Drop for JournalLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(error = %e, "failed to release journal lock");
        }
    }
}

/// Load the journal under the lock, run `edit`, and save only if it succeeded.
pub fn with_journal_lock<F, R>(lock_path: &Path, journal_path: &Path, edit: F) -> Result<R>
where
    F: FnOnce(&mut Journal) -> Result<R>,
{
    let _lock = JournalLock::acquire(lock_path)?;
    let mut journal = Journal::load(journal_path)?;
    let outcome = edit(&mut journal)?;
    journal.save(journal_path)?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use crate::schedule::potency::Potency;
    use crate::schedule::recurrence::{Recurrence, RecurrencePlan};
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn weekly_remedy() -> Remedy {
        let mut remedy = Remedy::log("Pulsatilla", Potency::C200, None, at(1, 8), at(1, 8)).unwrap();
        remedy.set_recurrence(Some(RecurrencePlan::new(Recurrence::Weekly, at(31, 0))));
        remedy
    }

    #[test]
    fn test_lookup_by_prefix() {
        let mut journal = Journal::default();
        let symptom = Symptom::new("Nausea", Severity::Mild, at(1, 9), None).unwrap();
        let id = symptom.id.to_string();
        journal.add_symptom(symptom);

        assert_eq!(journal.symptom(&id[..8]).unwrap().name, "Nausea");
        assert_eq!(
            journal.symptom("zzzz").unwrap_err(),
            JournalError::SymptomNotFound("zzzz".into())
        );
        assert!(journal.symptom("").is_err());
    }

    #[test]
    fn test_ambiguous_prefix() {
        let mut journal = Journal::default();
        for _ in 0..40 {
            journal.add_symptom(Symptom::new("Nausea", Severity::Mild, at(1, 9), None).unwrap());
        }
        // 40 random ids cannot all start with different hex digits
        let ambiguous = "0123456789abcdef"
            .chars()
            .map(|c| c.to_string())
            .find(|p| matches!(journal.symptom(p), Err(JournalError::AmbiguousId(_))));
        assert!(ambiguous.is_some());
    }

    #[test]
    fn test_remedy_lifecycle_keeps_reminders_in_step() {
        let mut journal = Journal::default();
        let id = journal.add_remedy(weekly_remedy()).unwrap().id.to_string();
        assert_eq!(journal.reminders.len(), 1);

        journal
            .update_remedy(&id, |r| {
                r.set_recurrence(Some(RecurrencePlan::new(
                    Recurrence::multiple_times_per_day(3, 4),
                    at(31, 0),
                )));
                Ok(())
            })
            .unwrap();
        assert_eq!(journal.reminders.len(), 3);

        let removed = journal.remove_remedy(&id).unwrap();
        assert_eq!(removed.name, "Pulsatilla");
        assert!(journal.reminders.is_empty());
        assert!(journal.remedies.is_empty());
    }

    #[test]
    fn test_failed_edit_leaves_reminders() {
        let mut journal = Journal::default();
        let id = journal.add_remedy(weekly_remedy()).unwrap().id.to_string();
        let result = journal.update_remedy(&id, |_| anyhow::bail!("nope"));
        assert!(result.is_err());
        assert_eq!(journal.reminders.len(), 1);
    }

    #[test]
    fn test_resync_retires_ended_recurrences() {
        let mut journal = Journal::default();
        let id = journal.add_remedy(weekly_remedy()).unwrap().id.to_string();
        assert_eq!(journal.reminders.len(), 1);

        let last_day = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();
        assert_eq!(journal.resync_reminders(last_day).unwrap(), 1);
        assert_eq!(journal.reminders.len(), 1);

        let after = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(journal.resync_reminders(after).unwrap(), 0);
        assert!(journal.reminders.is_empty());
        assert!(journal.remedy(&id).unwrap().notification_handles.is_empty());
        assert!(journal.remedy(&id).unwrap().recurrence.is_some());
    }

    #[test]
    fn test_remedy_names_deduplicated() {
        let mut journal = Journal::default();
        journal.add_remedy(weekly_remedy()).unwrap();
        journal.add_remedy(weekly_remedy()).unwrap();
        assert_eq!(journal.remedy_names(), vec!["Pulsatilla".to_string()]);
    }
}
