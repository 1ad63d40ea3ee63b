//! Process-wide handle table.
//!
//! A handle is an opaque integer that stands in for a native value the host
//! cannot hold directly. Handles come from a counter that starts at 1 and is
//! never rewound, so 0 is always the null handle and a stale handle can only
//! miss, never alias a newer value.
//!
//! This file is self-contained (std only): its text is embedded verbatim into
//! every generated shim.

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

pub type Handle = i64;

/// Never issued by [`HandleRegistry::allocate`].
pub const NULL_HANDLE: Handle = 0;

/// Tagged outcome of a failed lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleError {
    NotFound {
        handle: Handle,
    },
    TypeMismatch {
        handle: Handle,
        expected: &'static str,
        found: &'static str,
    },
}

impl fmt::Display for HandleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandleError::NotFound { handle } => write!(f, "handle {} not found", handle),
            HandleError::TypeMismatch {
                handle,
                expected,
                found,
            } => write!(
                f,
                "handle {} holds {}, expected {}",
                handle, found, expected
            ),
        }
    }
}

impl std::error::Error for HandleError {}

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
    refs: usize,
}

struct Table {
    next: Handle,
    entries: HashMap<Handle, Entry>,
}

/// Maps handles to type-erased native values.
///
/// Every operation takes the single table lock once, so a `resolve` racing an
/// `allocate` sees either the table before the insert or the complete entry.
pub struct HandleRegistry {
    table: Mutex<Table>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self {
            table: Mutex::new(Table {
                next: NULL_HANDLE + 1,
                entries: HashMap::new(),
            }),
        }
    }

    /* Entries are only ever inserted or removed whole, so a poisoned table is still consistent */
    fn lock(&self) -> MutexGuard<'_, Table> {
        self.table
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stores `value` and returns a handle that was never issued before.
    /// The entry starts with one reference.
    pub fn allocate<T: Any + Send + Sync>(&self, value: T) -> Handle {
        let mut table = self.lock();
        let handle = table.next;
        table.next += 1;
        table.entries.insert(
            handle,
            Entry {
                value: Arc::new(value),
                type_name: type_name::<T>(),
                refs: 1,
            },
        );
        handle
    }

    /// Looks up `handle` and checks that it stores a `T`.
    pub fn resolve<T: Any + Send + Sync>(&self, handle: Handle) -> Result<Arc<T>, HandleError> {
        let (value, found) = {
            let table = self.lock();
            match table.entries.get(&handle) {
                Some(entry) => (Arc::clone(&entry.value), entry.type_name),
                None => return Err(HandleError::NotFound { handle }),
            }
        };
        value.downcast::<T>().map_err(|_| HandleError::TypeMismatch {
            handle,
            expected: type_name::<T>(),
            found,
        })
    }

    /// Adds a reference to `handle`, returning the new count.
    pub fn retain(&self, handle: Handle) -> Result<usize, HandleError> {
        let mut table = self.lock();
        match table.entries.get_mut(&handle) {
            Some(entry) => {
                entry.refs += 1;
                Ok(entry.refs)
            }
            None => Err(HandleError::NotFound { handle }),
        }
    }

    /// Drops a reference to `handle`, removing the entry when none remain.
    /// Returns the remaining count.
    pub fn release(&self, handle: Handle) -> Result<usize, HandleError> {
        let mut table = self.lock();
        let remaining = match table.entries.get_mut(&handle) {
            Some(entry) => {
                entry.refs -= 1;
                entry.refs
            }
            None => return Err(HandleError::NotFound { handle }),
        };
        if remaining == 0 {
            table.entries.remove(&handle);
        }
        Ok(remaining)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.lock().entries.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HandleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.lock();
        f.debug_struct("HandleRegistry")
            .field("live", &table.entries.len())
            .field("next", &table.next)
            .finish()
    }
}
