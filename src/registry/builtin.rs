//! Builtin receiver and scanner registration
//!
//! Builtins submit an entry with `builtin_receiver!` or `builtin_scanner!`
//! next to their implementation; the entries are collected at link time and
//! loaded by `with_builtins`.

use crate::core::config::Configuration;
use crate::receiver::api::{ReceiverResult, TargetReceiver};
use crate::scanner::api::{ScanResult, Scanner};
use std::path::Path;

pub struct BuiltinReceiver {
    pub name: &'static str,
    pub constructor: fn(&Configuration, &str, &Path) -> ReceiverResult<Box<dyn TargetReceiver>>,
}

pub struct BuiltinScanner {
    pub name: &'static str,
    pub constructor: fn(&Configuration) -> ScanResult<Box<dyn Scanner>>,
}

inventory::collect!(BuiltinReceiver);
inventory::collect!(BuiltinScanner);

#[macro_export]
macro_rules! builtin_receiver {
    ($name:expr, $constructor:expr) => {
        inventory::submit!($crate::registry::api::BuiltinReceiver {
            name: $name,
            constructor: $constructor
        });
    };
}

#[macro_export]
macro_rules! builtin_scanner {
    ($name:expr, $constructor:expr) => {
        inventory::submit!($crate::registry::api::BuiltinScanner {
            name: $name,
            constructor: $constructor
        });
    };
}
