//! Registry API

pub use crate::registry::builtin::{BuiltinReceiver, BuiltinScanner};
pub use crate::registry::error::{RegistryError, RegistryResult};
pub use crate::registry::generic::Registry;
pub use crate::registry::kinds::{
    ReceiverConstructor, ReceiverRegistry, ScannerConstructor, ScannerRegistry,
};
