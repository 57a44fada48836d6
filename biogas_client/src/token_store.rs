use std::{
    collections::{BTreeMap, HashMap},
    fmt, fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use keyring::Entry;
use tempfile::NamedTempFile;

use crate::ClientResult;

/// The fixed names session state is persisted under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageKey {
    AccessToken,
    RefreshToken,
    User,
    CurrentInstitution,
}

impl StorageKey {
    pub const ALL: [StorageKey; 4] = [
        StorageKey::AccessToken,
        StorageKey::RefreshToken,
        StorageKey::User,
        StorageKey::CurrentInstitution,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StorageKey::AccessToken => "authToken",
            StorageKey::RefreshToken => "refreshToken",
            StorageKey::User => "user",
            StorageKey::CurrentInstitution => "institucionActual",
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durable key-value storage for session state. No validation of values.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: StorageKey) -> ClientResult<Option<String>>;
    fn set(&self, key: StorageKey, value: &str) -> ClientResult<()>;
    fn remove(&self, key: StorageKey) -> ClientResult<()>;

    fn clear(&self, keys: &[StorageKey]) -> ClientResult<()> {
        for key in keys {
            self.remove(*key)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    values: Mutex<HashMap<StorageKey, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<StorageKey, String>> {
        match self.values.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: StorageKey) -> ClientResult<Option<String>> {
        Ok(self.values().get(&key).cloned())
    }

    fn set(&self, key: StorageKey, value: &str) -> ClientResult<()> {
        self.values().insert(key, value.to_owned());
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> ClientResult<()> {
        self.values().remove(&key);
        Ok(())
    }
}

/// Flat JSON object on disk, `{"authToken": "...", ...}`.
///
/// Every write replaces the whole file through a uniquely named sibling temp
/// file, so a crash never leaves a half-written document behind. The file is
/// only readable by its owner.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> ClientResult<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> ClientResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        // NamedTempFile is created with mode 0600 on unix.
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&serde_json::to_vec_pretty(values)?)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|err| err.error)?;
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) -> ClientResult<()> {
        let _guard = match self.lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut values = self.read_all()?;
        apply(&mut values);
        self.write_all(&values)
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: StorageKey) -> ClientResult<Option<String>> {
        let _guard = match self.lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(self.read_all()?.remove(key.as_str()))
    }

    fn set(&self, key: StorageKey, value: &str) -> ClientResult<()> {
        self.update(|values| {
            values.insert(key.as_str().to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: StorageKey) -> ClientResult<()> {
        self.update(|values| {
            values.remove(key.as_str());
        })
    }

    fn clear(&self, keys: &[StorageKey]) -> ClientResult<()> {
        self.update(|values| {
            for key in keys {
                values.remove(key.as_str());
            }
        })
    }
}

/// One OS keyring entry per key, under `<prefix>:<key>`.
#[derive(Clone, Debug)]
pub struct KeyringTokenStore {
    service: String,
    account_prefix: String,
}

impl KeyringTokenStore {
    pub fn new(service: impl Into<String>, account_prefix: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            account_prefix: account_prefix.into(),
        }
    }

    fn account_for_key(&self, key: StorageKey) -> String {
        format!("{}:{key}", self.account_prefix)
    }

    fn entry_for_key(&self, key: StorageKey) -> ClientResult<Entry> {
        Ok(Entry::new(&self.service, &self.account_for_key(key))?)
    }
}

impl TokenStore for KeyringTokenStore {
    fn get(&self, key: StorageKey) -> ClientResult<Option<String>> {
        let entry = self.entry_for_key(key)?;
        match entry.get_password() {
            Ok(raw) => Ok(Some(raw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: StorageKey, value: &str) -> ClientResult<()> {
        self.entry_for_key(key)?.set_password(value)?;
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> ClientResult<()> {
        let entry = self.entry_for_key(key)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, StorageKey, TokenStore};

    #[test]
    fn storage_keys_use_fixed_wire_names() {
        let names: Vec<&str> = StorageKey::ALL.iter().map(|key| key.as_str()).collect();
        assert_eq!(
            names,
            vec!["authToken", "refreshToken", "user", "institucionActual"]
        );
    }

    #[test]
    fn memory_store_round_trips_and_clears() {
        let store = MemoryTokenStore::new();
        store.set(StorageKey::AccessToken, "A1").expect("set");
        store.set(StorageKey::RefreshToken, "R1").expect("set");
        store
            .set(StorageKey::CurrentInstitution, "unal")
            .expect("set");

        assert_eq!(
            store.get(StorageKey::AccessToken).expect("get").as_deref(),
            Some("A1")
        );

        store
            .clear(&[StorageKey::AccessToken, StorageKey::RefreshToken])
            .expect("clear");
        assert!(store.get(StorageKey::AccessToken).expect("get").is_none());
        assert!(store.get(StorageKey::RefreshToken).expect("get").is_none());
        assert_eq!(
            store
                .get(StorageKey::CurrentInstitution)
                .expect("get")
                .as_deref(),
            Some("unal")
        );
    }

    #[test]
    fn file_store_reads_missing_file_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTokenStore::new(dir.path().join("nested").join("session.json"));

        assert!(store.get(StorageKey::AccessToken).expect("get").is_none());
        store.remove(StorageKey::User).expect("remove on empty store");
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");

        let store = FileTokenStore::new(&path);
        store.set(StorageKey::AccessToken, "A1").expect("set");
        store.set(StorageKey::RefreshToken, "R1").expect("set");
        drop(store);

        let reopened = FileTokenStore::new(&path);
        assert_eq!(
            reopened
                .get(StorageKey::RefreshToken)
                .expect("get")
                .as_deref(),
            Some("R1")
        );

        let raw = fs::read_to_string(&path).expect("file exists");
        let parsed: serde_json::Value = serde_json::from_str(&raw).expect("json file");
        assert_eq!(parsed["authToken"], "A1");

        reopened
            .clear(&[StorageKey::AccessToken, StorageKey::RefreshToken])
            .expect("clear");
        assert!(reopened.get(StorageKey::AccessToken).expect("get").is_none());

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .expect("read dir")
            .map(|entry| entry.expect("dir entry").file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("session.json")]);
    }

    #[cfg(unix)]
    #[test]
    fn file_store_is_private_to_its_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        let store = FileTokenStore::new(&path);
        store.set(StorageKey::RefreshToken, "R1").expect("set");
        store.set(StorageKey::AccessToken, "A1").expect("rewrite");

        let mode = fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o077, 0, "session file mode {mode:o}");
    }

    #[test]
    fn keyring_accounts_are_prefixed_per_key() {
        let store = KeyringTokenStore::new("biogas", "session");
        assert_eq!(
            store.account_for_key(StorageKey::RefreshToken),
            "session:refreshToken"
        );
    }
}
