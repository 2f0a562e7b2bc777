//! Scanner API

pub use crate::scanner::error::{ScanError, ScanResult};
pub use crate::scanner::filecontent::{walk, FileContentScanner, SCANNER_NAME as FILECONTENT};
pub use crate::scanner::traits::Scanner;
