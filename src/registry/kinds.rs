//! Concrete registries for receivers and scanners

use crate::core::config::Configuration;
use crate::receiver::api::{ReceiverResult, TargetReceiver};
use crate::registry::builtin::{BuiltinReceiver, BuiltinScanner};
use crate::registry::error::{RegistryError, RegistryResult};
use crate::registry::generic::Registry;
use crate::scanner::api::{ScanResult, Scanner};
use std::path::Path;

/// Builds a receiver bound to `(target, output directory)`
pub type ReceiverConstructor = dyn Fn(&Configuration, &str, &Path) -> ReceiverResult<Box<dyn TargetReceiver>>
    + Send
    + Sync;

/// Builds a scanner
pub type ScannerConstructor = dyn Fn(&Configuration) -> ScanResult<Box<dyn Scanner>> + Send + Sync;

pub type ReceiverRegistry = Registry<ReceiverConstructor>;
pub type ScannerRegistry = Registry<ScannerConstructor>;

impl Registry<ReceiverConstructor> {
    pub fn receivers() -> Self {
        Registry::new("receiver")
    }

    /// A receiver registry holding every builtin receiver
    pub fn with_builtins() -> RegistryResult<Self> {
        let mut registry = Self::receivers();
        for entry in inventory::iter::<BuiltinReceiver>() {
            log::debug!("Registering builtin receiver: {}", entry.name);
            registry.register_receiver(entry.name, entry.constructor)?;
        }
        Ok(registry)
    }

    pub fn register_receiver<F>(&mut self, name: impl Into<String>, constructor: F) -> RegistryResult<()>
    where
        F: Fn(&Configuration, &str, &Path) -> ReceiverResult<Box<dyn TargetReceiver>>
            + Send
            + Sync
            + 'static,
    {
        self.register(name, Box::new(constructor))
    }

    /// Construct the receiver registered under `name` for one target.
    ///
    /// A constructor failure is returned with the constructor's own message.
    pub fn get(
        &self,
        name: &str,
        config: &Configuration,
        target: &str,
        output_dir: &Path,
    ) -> RegistryResult<Box<dyn TargetReceiver>> {
        let constructor = self.constructor(name)?;
        constructor(config, target, output_dir).map_err(|e| RegistryError::Construction {
            kind: self.kind(),
            name: name.to_string(),
            source: Box::new(e),
        })
    }
}

impl Registry<ScannerConstructor> {
    pub fn scanners() -> Self {
        Registry::new("scanner")
    }

    /// A scanner registry holding every builtin scanner
    pub fn with_builtins() -> RegistryResult<Self> {
        let mut registry = Self::scanners();
        for entry in inventory::iter::<BuiltinScanner>() {
            log::debug!("Registering builtin scanner: {}", entry.name);
            registry.register_scanner(entry.name, entry.constructor)?;
        }
        Ok(registry)
    }

    pub fn register_scanner<F>(&mut self, name: impl Into<String>, constructor: F) -> RegistryResult<()>
    where
        F: Fn(&Configuration) -> ScanResult<Box<dyn Scanner>> + Send + Sync + 'static,
    {
        self.register(name, Box::new(constructor))
    }

    pub fn get(&self, name: &str, config: &Configuration) -> RegistryResult<Box<dyn Scanner>> {
        let constructor = self.constructor(name)?;
        constructor(config).map_err(|e| RegistryError::Construction {
            kind: self.kind(),
            name: name.to_string(),
            source: Box::new(e),
        })
    }
}
