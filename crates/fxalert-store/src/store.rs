//! The JSON-file alert store.

use directories::ProjectDirs;
use fxalert_types::{AlertLevel, DeltaId, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

use crate::{Result, StoreError};

/// Chat user identifier.
pub type UserId = i64;

/// Per-user preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    /// Point distance used to regenerate delta pairs after one fires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<i64>,
}

impl UserSettings {
    fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserRecord {
    #[serde(default)]
    alerts: Vec<AlertLevel>,
    #[serde(default)]
    settings: UserSettings,
}

impl UserRecord {
    fn is_empty(&self) -> bool {
        self.alerts.is_empty() && self.settings.is_default()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    users: BTreeMap<UserId, UserRecord>,
}

impl Document {
    fn drop_if_empty(&mut self, user: UserId) {
        if self.users.get(&user).is_some_and(UserRecord::is_empty) {
            self.users.remove(&user);
        }
    }
}

/// Alert levels and settings for every user, persisted to one JSON file.
///
/// Every mutation is applied in memory first and then the whole document is
/// rewritten. A failed write is reported but the in-memory change is kept.
/// One lock guards both the map and the file.
#[derive(Debug)]
pub struct AlertStore {
    path: PathBuf,
    document: RwLock<Document>,
}

impl AlertStore {
    /// Opens the store at `path`.
    ///
    /// A missing file is created (along with its parent directory) when
    /// `create` is true. An empty file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing and `create` is false, or if
    /// it cannot be read, created or parsed.
    pub fn open(path: impl Into<PathBuf>, create: bool) -> Result<Self> {
        let path = path.into();

        if create && !path.exists() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| StoreError::CreateDir {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
            let store = Self {
                path,
                document: RwLock::new(Document::default()),
            };
            store.persist(&store.read())?;
            info!(path = %store.path.display(), "created alert store");
            return Ok(store);
        }

        let content = fs::read_to_string(&path).map_err(|e| StoreError::ReadFile {
            path: path.clone(),
            source: e,
        })?;
        let document = if content.trim().is_empty() {
            Document::default()
        } else {
            serde_json::from_str(&content).map_err(|e| StoreError::ParseJson {
                path: path.clone(),
                source: e,
            })?
        };
        info!(path = %path.display(), users = document.users.len(), "loaded alert store");

        Ok(Self {
            path,
            document: RwLock::new(document),
        })
    }

    /// Returns the default location of the store file.
    ///
    /// - Linux: `~/.local/share/fxalert/db.json`
    /// - macOS: `~/Library/Application Support/fxalert/db.json`
    /// - Windows: `C:\Users\<User>\AppData\Roaming\fxalert\db.json`
    ///
    /// Falls back to `~/.fxalert/db.json`.
    #[must_use]
    pub fn default_path() -> PathBuf {
        ProjectDirs::from("", "", "fxalert")
            .map_or_else(dirs_fallback, |proj_dirs| proj_dirs.data_dir().to_path_buf())
            .join("db.json")
    }

    /// Returns the store file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Adds levels for `user`, skipping ones already stored.
    ///
    /// Correlated levels are added all or nothing: if any level of a delta
    /// pair is already stored, every level sharing its id is skipped.
    ///
    /// Returns how many were added.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    pub fn add(&self, user: UserId, entries: impl IntoIterator<Item = AlertLevel>) -> Result<usize> {
        let entries: Vec<AlertLevel> = entries.into_iter().collect();
        let mut document = self.write();
        let record = document.users.entry(user).or_default();
        let stored = |entry: &AlertLevel, alerts: &[AlertLevel]| {
            alerts.iter().any(|a| a.same_level(entry))
        };
        let blocked: HashSet<DeltaId> = entries
            .iter()
            .filter(|e| stored(e, &record.alerts))
            .filter_map(|e| e.delta_id)
            .collect();

        let mut added = 0;
        for entry in entries {
            if entry.delta_id.is_some_and(|id| blocked.contains(&id)) {
                debug!(user, alert = %entry, "other half of delta pair already stored");
                continue;
            }
            if stored(&entry, &record.alerts) {
                debug!(user, alert = %entry, "alert already stored");
                continue;
            }
            record.alerts.push(entry);
            added += 1;
        }
        document.drop_if_empty(user);
        if added == 0 {
            return Ok(0);
        }
        self.persist(&document)?;
        Ok(added)
    }

    /// Deletes the level matching `level`.
    ///
    /// Deleting a level that is not stored is a no-op returning `false`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    pub fn delete(&self, user: UserId, level: &AlertLevel) -> Result<bool> {
        let removed = self.remove_where(user, |a| a.same_level(level))?;
        Ok(!removed.is_empty())
    }

    /// Deletes every level for `symbol`, returning what was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    pub fn delete_key(&self, user: UserId, symbol: &Symbol) -> Result<Vec<AlertLevel>> {
        self.remove_where(user, |a| &a.symbol == symbol)
    }

    /// Deletes every level tagged with `delta_id`, returning what was
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    pub fn delete_correlated(&self, user: UserId, delta_id: DeltaId) -> Result<Vec<AlertLevel>> {
        self.remove_where(user, |a| a.delta_id == Some(delta_id))
    }

    /// Deletes every level matching `predicate`, returning what was removed.
    ///
    /// The file is only rewritten when something was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    pub fn remove_where(
        &self,
        user: UserId,
        mut predicate: impl FnMut(&AlertLevel) -> bool,
    ) -> Result<Vec<AlertLevel>> {
        let mut document = self.write();
        let Some(record) = document.users.get_mut(&user) else {
            return Ok(Vec::new());
        };
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut record.alerts)
            .into_iter()
            .partition(|a| predicate(a));
        record.alerts = kept;
        if removed.is_empty() {
            return Ok(removed);
        }
        document.drop_if_empty(user);
        self.persist(&document)?;
        Ok(removed)
    }

    /// Returns the levels stored for `user` in insertion order.
    #[must_use]
    pub fn list(&self, user: UserId) -> Vec<AlertLevel> {
        self.read()
            .users
            .get(&user)
            .map(|r| r.alerts.clone())
            .unwrap_or_default()
    }

    /// Returns every user with stored alerts or settings, ascending.
    #[must_use]
    pub fn list_all_user_ids(&self) -> Vec<UserId> {
        self.read().users.keys().copied().collect()
    }

    /// Returns the settings of `user`, or defaults for unknown users.
    #[must_use]
    pub fn user_settings(&self, user: UserId) -> UserSettings {
        self.read()
            .users
            .get(&user)
            .map(|r| r.settings.clone())
            .unwrap_or_default()
    }

    /// Replaces the settings of `user`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    pub fn set_user_settings(&self, user: UserId, settings: UserSettings) -> Result<()> {
        let mut document = self.write();
        document.users.entry(user).or_default().settings = settings;
        document.drop_if_empty(user);
        self.persist(&document)
    }

    fn persist(&self, document: &Document) -> Result<()> {
        let json = serde_json::to_string_pretty(document)?;
        fs::write(&self.path, json).map_err(|e| StoreError::WriteFile {
            path: self.path.clone(),
            source: e,
        })?;
        debug!(path = %self.path.display(), users = document.users.len(), "saved alert store");
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, Document> {
        self.document.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Document> {
        self.document.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fallback for determining the data directory.
fn dirs_fallback() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".fxalert")
}
