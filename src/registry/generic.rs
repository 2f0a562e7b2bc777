use crate::registry::error::{RegistryError, RegistryResult};
use std::collections::HashMap;

/// Name-keyed table of constructors of one kind
///
/// `T` is normally an unsized `dyn Fn(..)` type; see
/// [`ReceiverConstructor`](crate::registry::api::ReceiverConstructor).
pub struct Registry<T: ?Sized> {
    kind: &'static str,
    constructors: HashMap<String, Box<T>>,
}

impl<T: ?Sized> std::fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("kind", &self.kind)
            .field("names", &self.list())
            .finish()
    }
}

impl<T: ?Sized> Registry<T> {
    /// Create an empty registry; `kind` is used in error messages
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            constructors: HashMap::new(),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Add a constructor under `name`. Names are unique.
    pub fn register(&mut self, name: impl Into<String>, constructor: Box<T>) -> RegistryResult<()> {
        let name = name.into();
        if self.constructors.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered {
                kind: self.kind,
                name,
            });
        }
        self.constructors.insert(name, constructor);
        Ok(())
    }

    /// Look up the constructor registered under `name`
    pub fn constructor(&self, name: &str) -> RegistryResult<&T> {
        self.constructors
            .get(name)
            .map(|constructor| constructor.as_ref())
            .ok_or_else(|| RegistryError::NotRegistered {
                kind: self.kind,
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered names, sorted
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.constructors.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}
