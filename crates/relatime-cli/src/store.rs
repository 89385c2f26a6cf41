//! Per-user settings: timezone and which expression families to look for.
//!
//! Timezones are validated before they are stored and kept as
//! `iana:<name>` or `custom:<offset>`, so a named zone and a fixed offset
//! with the same current offset stay distinguishable.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use relatime_engine::{ParseModes, Zone};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to encode settings: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("Unknown setting '{0}' (expected timezone, absolute or relative)")]
    UnknownKey(String),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: Key, reason: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;

// ── Keys ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Key {
    Timezone,
    Absolute,
    Relative,
}

impl Key {
    pub const ALL: [Key; 3] = [Key::Timezone, Key::Absolute, Key::Relative];
}

impl FromStr for Key {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "timezone" | "tz" => Ok(Key::Timezone),
            "absolute" => Ok(Key::Absolute),
            "relative" => Ok(Key::Relative),
            _ => Err(StoreError::UnknownKey(s.to_string())),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Timezone => f.write_str("timezone"),
            Key::Absolute => f.write_str("absolute"),
            Key::Relative => f.write_str("relative"),
        }
    }
}

// ── Settings ────────────────────────────────────────────────────────────────

/// Everything stored for one user. Unset fields fall back to the global
/// configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absolute: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative: Option<bool>,
}

impl UserSettings {
    pub fn get(&self, key: Key) -> Option<String> {
        match key {
            Key::Timezone => self.timezone.clone(),
            Key::Absolute => self.absolute.map(|b| b.to_string()),
            Key::Relative => self.relative.map(|b| b.to_string()),
        }
    }

    /// Validate and store `value`, or clear the setting when it is `None`.
    pub fn set(&mut self, key: Key, value: Option<&str>) -> Result<()> {
        match key {
            Key::Timezone => self.timezone = value.map(encode_timezone).transpose()?,
            Key::Absolute => self.absolute = value.map(|v| parse_flag(key, v)).transpose()?,
            Key::Relative => self.relative = value.map(|v| parse_flag(key, v)).transpose()?,
        }
        Ok(())
    }

    /// The stored timezone, if any and still valid.
    pub fn zone(&self) -> Option<Zone> {
        let stored = self.timezone.as_deref()?;
        let raw = stored
            .strip_prefix("iana:")
            .or_else(|| stored.strip_prefix("custom:"))
            .unwrap_or(stored);
        Zone::parse(raw).ok()
    }

    /// `base` with any stored family switches applied.
    pub fn modes(&self, base: ParseModes) -> ParseModes {
        ParseModes {
            absolute: self.absolute.unwrap_or(base.absolute),
            relative: self.relative.unwrap_or(base.relative),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &UserSettings::default()
    }
}

fn encode_timezone(value: &str) -> Result<String> {
    let zone = Zone::parse(value).map_err(|e| StoreError::InvalidValue {
        key: Key::Timezone,
        reason: e.to_string(),
    })?;
    Ok(match zone {
        Zone::Named(tz) => format!("iana:{}", tz.name()),
        Zone::Fixed(offset) => format!("custom:{offset}"),
    })
}

fn parse_flag(key: Key, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(StoreError::InvalidValue {
            key,
            reason: format!("'{value}' is not a boolean"),
        }),
    }
}

// ── Stores ──────────────────────────────────────────────────────────────────

/// Where per-user settings live.
pub trait ConfigStore {
    fn load(&self, user: &str) -> Result<UserSettings>;
    fn save(&mut self, user: &str, settings: UserSettings) -> Result<()>;

    /// The requested settings for `user`; unset ones map to `None`.
    fn get(&self, user: &str, keys: &[Key]) -> Result<BTreeMap<Key, Option<String>>> {
        let settings = self.load(user)?;
        Ok(keys.iter().map(|&key| (key, settings.get(key))).collect())
    }

    /// Validate and store one setting. `None` clears it.
    fn set(&mut self, user: &str, key: Key, value: Option<&str>) -> Result<()> {
        let mut settings = self.load(user)?;
        settings.set(key, value)?;
        self.save(user, settings)
    }
}

/// Settings held in memory only.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: BTreeMap<String, UserSettings>,
}

#[cfg(test)]
impl ConfigStore for MemoryStore {
    fn load(&self, user: &str) -> Result<UserSettings> {
        Ok(self.users.get(user).cloned().unwrap_or_default())
    }

    fn save(&mut self, user: &str, settings: UserSettings) -> Result<()> {
        if settings.is_empty() {
            self.users.remove(user);
        } else {
            self.users.insert(user.to_string(), settings);
        }
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UsersFile {
    #[serde(default)]
    users: BTreeMap<String, UserSettings>,
}

/// Settings kept in a TOML file, one table per user id.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    users: BTreeMap<String, UserSettings>,
}

impl FileStore {
    pub const FILE_NAME: &'static str = "users.toml";

    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let users = match fs::read_to_string(&path) {
            Ok(contents) => {
                let file: UsersFile =
                    toml::from_str(&contents).map_err(|source| StoreError::Decode {
                        path: path.clone(),
                        source,
                    })?;
                file.users
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        tracing::debug!("Loaded {} user(s) from {}", users.len(), path.display());
        Ok(Self { path, users })
    }

    fn write(&self) -> Result<()> {
        let io_error = |source: io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let file = UsersFile {
            users: self.users.clone(),
        };
        let contents = toml::to_string_pretty(&file)?;
        fs::write(&self.path, contents).map_err(io_error)
    }
}

impl ConfigStore for FileStore {
    fn load(&self, user: &str) -> Result<UserSettings> {
        Ok(self.users.get(user).cloned().unwrap_or_default())
    }

    fn save(&mut self, user: &str, settings: UserSettings) -> Result<()> {
        if settings.is_empty() {
            self.users.remove(user);
        } else {
            self.users.insert(user.to_string(), settings);
        }
        self.write()?;
        tracing::debug!(user, path = %self.path.display(), "saved user settings");
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_str() {
        assert_eq!("Timezone".parse::<Key>().unwrap(), Key::Timezone);
        assert_eq!("tz".parse::<Key>().unwrap(), Key::Timezone);
        assert_eq!("relative".parse::<Key>().unwrap(), Key::Relative);
        let err = "colour".parse::<Key>().unwrap_err();
        assert!(matches!(err, StoreError::UnknownKey(ref k) if k == "colour"));
    }

    #[test]
    fn test_timezone_is_validated_and_tagged() {
        let mut store = MemoryStore::default();
        store.set("42", Key::Timezone, Some("Europe/London")).unwrap();
        let got = store.get("42", &[Key::Timezone]).unwrap();
        assert_eq!(got[&Key::Timezone].as_deref(), Some("iana:Europe/London"));

        store.set("42", Key::Timezone, Some("+05:30")).unwrap();
        let got = store.get("42", &[Key::Timezone]).unwrap();
        assert_eq!(got[&Key::Timezone].as_deref(), Some("custom:+05:30"));
        assert_eq!(
            store.load("42").unwrap().zone().map(|z| z.to_string()),
            Some("UTC+05:30".to_string())
        );

        let err = store.set("42", Key::Timezone, Some("Mars/Base")).unwrap_err();
        assert!(matches!(err, StoreError::InvalidValue { key: Key::Timezone, .. }));
        // A rejected value leaves the previous one in place.
        assert!(store.load("42").unwrap().zone().is_some());
    }

    #[test]
    fn test_flags_and_modes() {
        let mut store = MemoryStore::default();
        store.set("7", Key::Absolute, Some("off")).unwrap();
        let settings = store.load("7").unwrap();
        assert_eq!(settings.modes(ParseModes::ALL), ParseModes::RELATIVE);
        assert!(store.set("7", Key::Relative, Some("maybe")).is_err());
    }

    #[test]
    fn test_get_reports_unset_keys() {
        let store = MemoryStore::default();
        let got = store.get("nobody", &Key::ALL).unwrap();
        assert_eq!(got.len(), 3);
        assert!(got.values().all(Option::is_none));
    }

    #[test]
    fn test_clearing_last_setting_forgets_user() {
        let mut store = MemoryStore::default();
        store.set("1", Key::Relative, Some("true")).unwrap();
        store.set("1", Key::Relative, None).unwrap();
        assert!(store.users.is_empty());
    }

    #[test]
    fn test_file_store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(FileStore::FILE_NAME);

        let mut store = FileStore::open(&path).unwrap();
        store.set("1001", Key::Timezone, Some("America/Chicago")).unwrap();
        store.set("1001", Key::Relative, Some("false")).unwrap();
        store.set("2002", Key::Timezone, Some("UTC-8")).unwrap();

        let reopened = FileStore::open(&path).unwrap();
        let settings = reopened.load("1001").unwrap();
        assert_eq!(settings.timezone.as_deref(), Some("iana:America/Chicago"));
        assert_eq!(settings.relative, Some(false));
        assert_eq!(settings.absolute, None);
        assert_eq!(
            reopened.load("2002").unwrap().timezone.as_deref(),
            Some("custom:-08:00")
        );
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FileStore::FILE_NAME);
        fs::write(&path, "[users.1\ntimezone =").unwrap();
        assert!(matches!(FileStore::open(&path), Err(StoreError::Decode { .. })));
    }
}
