use std::collections::BTreeMap;
use std::path::Path;

use super::category::{IdPattern, RemoteId};
use super::error::{MirrorError, io_err};
use super::paths::is_tombstone;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveIndex {
    slots: BTreeMap<RemoteId, String>,
}

impl ArchiveIndex {
    pub async fn scan(details_dir: &Path, pattern: IdPattern) -> Result<Self, MirrorError> {
        let mut entries = tokio::fs::read_dir(details_dir)
            .await
            .map_err(|err| io_err(details_dir, err))?;
        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| io_err(details_dir, err))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|err| io_err(entry.path(), err))?;
            if !file_type.is_file() {
                continue;
            }
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }
        Ok(Self::from_names(names, pattern))
    }

    pub fn from_names<I>(names: I, pattern: IdPattern) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut names: Vec<String> = names.into_iter().collect();
        names.sort();

        let mut slots: BTreeMap<RemoteId, String> = BTreeMap::new();
        for name in names {
            let Some(id) = pattern.parse_file_name(&name) else {
                continue;
            };
            match slots.get(&id) {
                None => {
                    slots.insert(id, name);
                }
                Some(existing) => {
                    // A live slot wins over a tombstone.
                    let replace = is_tombstone(existing) && !is_tombstone(&name);
                    let (kept, ignored) = if replace {
                        (name.clone(), existing.clone())
                    } else {
                        (existing.clone(), name.clone())
                    };
                    tracing::warn!(%id, %kept, %ignored, "several archive slots share one id");
                    if replace {
                        slots.insert(id, name);
                    }
                }
            }
        }
        Self { slots }
    }

    pub fn get(&self, id: &RemoteId) -> Option<&str> {
        self.slots.get(id).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RemoteId, &str)> {
        self.slots.iter().map(|(id, name)| (id, name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
