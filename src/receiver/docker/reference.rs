//! Container image references
//!
//! Accepts the canonical `[domain[:port]/]path[:tag][@digest]` form. Names
//! are taken as written: no default registry or `library/` namespace is
//! added.

use crate::receiver::error::{ReceiverError, ReceiverResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

const NAME_MAX_LENGTH: usize = 255;

/// Tag pulled when a reference names neither a tag nor a digest
pub const DEFAULT_TAG: &str = "latest";

static REFERENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    let alphanumeric = "[a-z0-9]+";
    let separator = "(?:[._]|__|-+)";
    let path_component = format!("{alphanumeric}(?:{separator}{alphanumeric})*");
    let domain_component = "(?:[a-zA-Z0-9]|[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9])";
    let domain = format!(r"{domain_component}(?:\.{domain_component})*(?::[0-9]+)?");
    let name = format!("(?:{domain}/)?{path_component}(?:/{path_component})*");
    let tag = r"[\w][\w.-]{0,127}";
    let digest = "[A-Za-z][A-Za-z0-9]*(?:[-_+.][A-Za-z][A-Za-z0-9]*)*:[0-9a-fA-F]{32,}";

    Regex::new(&format!(
        "^(?P<name>{name})(?::(?P<tag>{tag}))?(?:@(?P<digest>{digest}))?$"
    ))
    .expect("image reference regex should compile")
});

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference {
    name: String,
    tag: Option<String>,
    digest: Option<String>,
}

impl ImageReference {
    pub fn parse(reference: &str) -> ReceiverResult<Self> {
        let invalid = |reason: &str| ReceiverError::InvalidReference {
            reference: reference.to_string(),
            reason: reason.to_string(),
        };

        if reference.is_empty() {
            return Err(invalid("reference is empty"));
        }

        let Some(captures) = REFERENCE_REGEX.captures(reference) else {
            if REFERENCE_REGEX.is_match(&reference.to_lowercase()) {
                return Err(invalid("repository name must be lowercase"));
            }
            return Err(invalid("invalid reference format"));
        };

        let name = captures["name"].to_string();
        if name.len() > NAME_MAX_LENGTH {
            return Err(invalid("repository name must not be more than 255 characters"));
        }

        Ok(Self {
            name,
            tag: captures.name("tag").map(|m| m.as_str().to_string()),
            digest: captures.name("digest").map(|m| m.as_str().to_string()),
        })
    }

    /// Repository name including any registry domain
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    /// The reference with [`DEFAULT_TAG`] filled in when it names no version
    pub fn pinned(&self) -> Self {
        let mut pinned = self.clone();
        if pinned.tag.is_none() && pinned.digest.is_none() {
            pinned.tag = Some(DEFAULT_TAG.to_string());
        }
        pinned
    }
}

impl FromStr for ImageReference {
    type Err = ReceiverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}
