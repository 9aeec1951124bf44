use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::RegistryError;
use crate::fault;
use crate::object::{ObjectError, ObjectFactory, RemoteObject};
use crate::value::{CallArgs, ObjectIndex, Value};

pub struct RegistryEntry {
    index: ObjectIndex,
    kind: Arc<str>,
    object: Box<dyn RemoteObject>,
}

impl RegistryEntry {
    pub fn index(&self) -> ObjectIndex {
        self.index
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn object(&self) -> &dyn RemoteObject {
        self.object.as_ref()
    }
}

/// Owner-side store of every live object of one kind.
///
/// Entries are keyed by an index that only ever grows, so destroying one
/// entry leaves every other handle valid. Iteration follows creation order.
pub struct Registry {
    kind: Arc<str>,
    factory: Box<dyn ObjectFactory>,
    entries: BTreeMap<ObjectIndex, RegistryEntry>,
    next_index: u64,
    current: Option<ObjectIndex>,
}

impl Registry {
    pub fn new(kind: impl Into<Arc<str>>, factory: impl ObjectFactory) -> Self {
        Self {
            kind: kind.into(),
            factory: Box::new(factory),
            entries: BTreeMap::new(),
            next_index: 0,
            current: None,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, index: ObjectIndex) -> bool {
        self.entries.contains_key(&index)
    }

    /// Live indices in creation order.
    pub fn indices(&self) -> impl Iterator<Item = ObjectIndex> + '_ {
        self.entries.keys().copied()
    }

    pub fn get(&self, index: ObjectIndex) -> Option<&RegistryEntry> {
        self.entries.get(&index)
    }

    pub fn current(&self) -> Option<ObjectIndex> {
        self.current
    }

    pub fn set_current(&mut self, index: ObjectIndex) -> Result<(), RegistryError> {
        if !self.contains(index) {
            return Err(self.not_found(index));
        }
        self.current = Some(index);
        Ok(())
    }

    pub fn create(&mut self, args: CallArgs) -> Result<ObjectIndex, RegistryError> {
        let index = ObjectIndex(self.next_index);
        let object = self
            .factory
            .create(index, args)
            .map_err(|source| RegistryError::Factory {
                kind: self.kind.to_string(),
                source,
            })?;
        self.next_index += 1;
        self.entries.insert(
            index,
            RegistryEntry {
                index,
                kind: Arc::clone(&self.kind),
                object,
            },
        );
        self.current = Some(index);
        debug!(kind = %self.kind, %index, live = self.entries.len(), "registry entry created");
        Ok(index)
    }

    pub fn read(&self, index: ObjectIndex, names: &[String]) -> Result<Vec<Value>, RegistryError> {
        let entry = self.entry(index)?;
        names
            .iter()
            .map(|name| {
                entry
                    .object
                    .get_attr(name)
                    .map_err(|source| self.object_error(index, source))
            })
            .collect()
    }

    pub fn write(
        &mut self,
        index: ObjectIndex,
        name: &str,
        value: Value,
    ) -> Result<(), RegistryError> {
        let kind = Arc::clone(&self.kind);
        let entry = self.entry_mut(index)?;
        entry
            .object
            .set_attr(name, value)
            .map_err(|source| RegistryError::Object {
                kind: kind.to_string(),
                index,
                source,
            })
    }

    pub fn invoke(
        &mut self,
        index: ObjectIndex,
        method: &str,
        args: CallArgs,
    ) -> Result<Value, RegistryError> {
        let kind = Arc::clone(&self.kind);
        let entry = self.entry_mut(index)?;
        entry
            .object
            .call_method(method, args)
            .map_err(|source| RegistryError::Object {
                kind: kind.to_string(),
                index,
                source,
            })
    }

    /// Runs the teardown hook, then removes the entry.
    ///
    /// If `current` pointed at the removed entry it falls back to the newest
    /// remaining one.
    pub fn destroy(&mut self, index: ObjectIndex) -> Result<(), RegistryError> {
        let mut entry = self
            .entries
            .remove(&index)
            .ok_or_else(|| self.not_found(index))?;
        if self.current == Some(index) {
            self.current = self.entries.keys().next_back().copied();
        }
        let outcome = fault::guard(|| entry.object.teardown());
        debug!(kind = %self.kind, %index, live = self.entries.len(), "registry entry destroyed");
        outcome.map_err(|message| RegistryError::Panicked {
            kind: self.kind.to_string(),
            operation: "teardown",
            message,
        })
    }

    /// Tears down every live entry once, oldest first, and returns how many
    /// entries were removed.
    pub fn destroy_all(&mut self) -> usize {
        let entries = std::mem::take(&mut self.entries);
        self.current = None;
        let count = entries.len();
        for (index, mut entry) in entries {
            if let Err(message) = fault::guard(|| entry.object.teardown()) {
                warn!(kind = %self.kind, %index, %message, "teardown panicked");
            }
        }
        count
    }

    fn entry(&self, index: ObjectIndex) -> Result<&RegistryEntry, RegistryError> {
        self.entries.get(&index).ok_or_else(|| self.not_found(index))
    }

    fn entry_mut(&mut self, index: ObjectIndex) -> Result<&mut RegistryEntry, RegistryError> {
        match self.entries.get_mut(&index) {
            Some(entry) => Ok(entry),
            None => Err(RegistryError::NotFound {
                kind: self.kind.to_string(),
                index,
            }),
        }
    }

    fn not_found(&self, index: ObjectIndex) -> RegistryError {
        RegistryError::NotFound {
            kind: self.kind.to_string(),
            index,
        }
    }

    fn object_error(&self, index: ObjectIndex, source: ObjectError) -> RegistryError {
        RegistryError::Object {
            kind: self.kind.to_string(),
            index,
            source,
        }
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        if !self.entries.is_empty() {
            let count = self.destroy_all();
            debug!(kind = %self.kind, count, "registry dropped with live entries");
        }
    }
}
