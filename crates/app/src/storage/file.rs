//! File-backed storage.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use super::{Storage, StorageError};

/// Key-value store with one file per key under a data directory — the
/// client-side analogue of the web client's local storage.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Creates the store, creating the data directory when missing.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();

        fs::create_dir_all(&dir)?;

        Ok(Self { dir })
    }

    /// The data directory this store writes to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys come from a fixed layout plus backend-issued user ids; map
        // anything outside the filename-safe set to '-'.
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '-'
                }
            })
            .collect();

        self.dir.join(file_name)
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::write(self.path_for(key), value)?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_values() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let storage = FileStorage::new(dir.path()).expect("storage should initialize");

        assert_eq!(storage.get("accessToken").expect("get should succeed"), None);

        storage
            .put("accessToken", "token-1")
            .expect("put should succeed");

        assert_eq!(
            storage.get("accessToken").expect("get should succeed"),
            Some("token-1".to_string())
        );

        storage.remove("accessToken").expect("remove should succeed");

        assert_eq!(storage.get("accessToken").expect("get should succeed"), None);
    }

    #[test]
    fn removing_a_missing_key_is_not_an_error() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let storage = FileStorage::new(dir.path()).expect("storage should initialize");

        storage.remove("never-stored").expect("remove should succeed");
    }

    #[test]
    fn keys_with_unsafe_characters_stay_distinct_files() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let storage = FileStorage::new(dir.path()).expect("storage should initialize");

        storage.put("cart_user/1", "a").expect("put should succeed");
        storage.put("cart_user_1", "b").expect("put should succeed");

        // '/' maps onto '-', not onto '_': the two keys must not collide.
        assert_eq!(
            storage.get("cart_user/1").expect("get should succeed"),
            Some("a".to_string())
        );
        assert_eq!(
            storage.get("cart_user_1").expect("get should succeed"),
            Some("b".to_string())
        );
    }
}
