//! Task areas: the named directories under the storage root
//!
//! The area a task directory lives in is the authoritative lifecycle
//! position. `cache` is auxiliary and holds per-task snapshot content.

use super::error::StoreError;
use std::str::FromStr;
use strum_macros::{AsRefStr, Display, EnumIter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Area {
    New,
    Queue,
    Processing,
    Done,
    Failed,
    Cache,
}

impl Area {
    /// Areas a published task can occupy, in lifecycle order
    pub const LIFECYCLE: [Area; 4] = [Area::Queue, Area::Processing, Area::Done, Area::Failed];

    /// Directory name under the storage root
    pub fn dir_name(&self) -> &'static str {
        match self {
            Area::New => "new",
            Area::Queue => "queue",
            Area::Processing => "processing",
            Area::Done => "done",
            Area::Failed => "failed",
            Area::Cache => "cache",
        }
    }
}

impl FromStr for Area {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Area::New),
            "queue" => Ok(Area::Queue),
            "processing" => Ok(Area::Processing),
            "done" => Ok(Area::Done),
            "failed" => Ok(Area::Failed),
            "cache" => Ok(Area::Cache),
            other => Err(StoreError::InvalidArea(other.to_string())),
        }
    }
}
