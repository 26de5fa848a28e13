//! Key-value persistence for the document buffer.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::PersistenceError;

/// A string-to-string store that outlives the session.
pub trait KeyValueStore {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if the backing storage cannot be
    /// written.
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;

    /// Short human-readable description for the status bar.
    fn describe(&self) -> String;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        (**self).set(key, value)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
