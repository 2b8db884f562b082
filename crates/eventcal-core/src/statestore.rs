use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::column::DataSet;
use crate::view_state::{MemoryStore, PropertyBag, PropertyStore};

/// Persisted properties kept in a JSON file: `{ object: { property: value } }`.
///
/// Every replace rewrites the whole file atomically; memory follows only
/// once the write succeeded.
#[derive(Debug)]
pub struct StateFile {
    pub path: PathBuf,
    objects: MemoryStore,
}

impl StateFile {
    #[tracing::instrument(skip(path))]
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let objects = if path.exists() {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed reading {}", path.display()))?;
            if raw.trim().is_empty() {
                MemoryStore::new()
            } else {
                serde_json::from_str(&raw)
                    .with_context(|| format!("failed parsing {}", path.display()))?
            }
        } else {
            if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create {}", dir.display()))?;
            }
            MemoryStore::new()
        };

        info!(state = %path.display(), "opened state file");
        Ok(Self {
            path: path.to_path_buf(),
            objects,
        })
    }

    /// Save `next` and adopt it only once it is on disk.
    fn save_and_swap(&mut self, next: MemoryStore) -> anyhow::Result<()> {
        write_atomic(&self.path, &next)?;
        self.objects = next;
        Ok(())
    }
}

#[tracing::instrument(skip(objects))]
fn write_atomic(path: &Path, objects: &MemoryStore) -> anyhow::Result<()> {
    debug!(file = %path.display(), "saving state atomically");
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    let serialized = serde_json::to_string_pretty(objects)?;
    writeln!(temp, "{serialized}")?;
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;
    Ok(())
}

impl PropertyStore for StateFile {
    fn get(&self, object: &str, property: &str) -> Option<String> {
        self.objects.get(object, property)
    }

    fn replace(&mut self, object: &str, properties: PropertyBag) -> anyhow::Result<()> {
        let mut next = self.objects.clone();
        next.replace(object, properties)?;
        self.save_and_swap(next)
            .with_context(|| format!("failed to save {object}"))
    }

    fn replace_all(&mut self, objects: BTreeMap<String, PropertyBag>) -> anyhow::Result<()> {
        let count = objects.len();
        let mut next = self.objects.clone();
        next.replace_all(objects)?;
        self.save_and_swap(next)
            .with_context(|| format!("failed to save {count} state objects"))
    }
}

/// Columns exported by the host as JSON (`{"columns": [...]}`).
#[tracing::instrument(skip(path))]
pub fn load_dataset(path: &Path) -> anyhow::Result<DataSet> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading {}", path.display()))?;
    let dataset: DataSet = serde_json::from_str(&raw)
        .with_context(|| format!("failed parsing {}", path.display()))?;
    debug!(columns = dataset.columns.len(), "loaded dataset");
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{StateFile, load_dataset};
    use crate::view_state::{
        DATE_OBJECT, DATE_PROPERTY, PropertyStore, StagedWrites, SupportedView, VIEW_OBJECT,
        VIEW_PROPERTY, retrieve_date, select_view, write_property,
    };

    #[test]
    fn replace_persists_across_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("state.json");

        let mut state = StateFile::open(&path).expect("open");
        write_property(&mut state, VIEW_OBJECT, VIEW_PROPERTY, "agendaDay").expect("write");

        let reopened = StateFile::open(&path).expect("reopen");
        assert_eq!(
            reopened.get(VIEW_OBJECT, VIEW_PROPERTY).as_deref(),
            Some("agendaDay")
        );
    }

    #[test]
    fn staged_objects_land_in_one_save() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        let mut state = StateFile::open(&path).expect("open");
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).expect("date");

        let mut staged = StagedWrites::new(&mut state);
        select_view(&mut staged, SupportedView::Day).expect("stage view");
        retrieve_date(&mut staged, today, None).expect("stage date");
        staged.commit().expect("commit");

        let reopened = StateFile::open(&path).expect("reopen");
        assert_eq!(reopened.get(VIEW_OBJECT, VIEW_PROPERTY).as_deref(), Some("agendaDay"));
        assert_eq!(reopened.get(DATE_OBJECT, DATE_PROPERTY).as_deref(), Some("may 1, 2024"));
    }

    #[test]
    fn failed_save_leaves_state_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        let mut state = StateFile::open(&path).expect("open");
        // A directory in the file's place makes the final rename fail.
        std::fs::create_dir(&path).expect("block state path");
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).expect("date");

        let mut staged = StagedWrites::new(&mut state);
        select_view(&mut staged, SupportedView::Week).expect("stage view");
        retrieve_date(&mut staged, today, None).expect("stage date");
        assert!(staged.commit().is_err());

        assert_eq!(state.get(VIEW_OBJECT, VIEW_PROPERTY), None);
        assert_eq!(state.get(DATE_OBJECT, DATE_PROPERTY), None);
        assert!(path.is_dir());
    }

    #[test]
    fn malformed_state_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        std::fs::write(&path, "[1, 2").expect("write");

        assert!(StateFile::open(&path).is_err());
    }

    #[test]
    fn loads_host_columns() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data.json");
        std::fs::write(
            &path,
            r#"{"columns": [
                {"displayName": "Start", "type": "dateTime", "roles": ["StartDate"],
                 "values": ["2024-01-01", null]},
                {"displayName": "Event", "type": "text", "roles": ["events"],
                 "values": ["Kickoff", "Review"]}
            ]}"#,
        )
        .expect("write");

        let dataset = load_dataset(&path).expect("dataset");
        assert_eq!(dataset.columns.len(), 2);
        assert_eq!(dataset.columns[0].len(), 2);
        assert!(dataset.columns[0].value(1).is_none());
    }
}
