// Compound identifiers for sub-resources.
//
// Backends and frontends: `<lbId>#<name>`. Backend servers:
// `<lbId>-<backend>-<name>`. Frontend bindings: `<lbId>#<frontend>#<name>`.
// Snapshots: `<diskId>#<label>`.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

fn parse_parent(text: &str, id: &str) -> Result<u64, CoreError> {
    text.parse()
        .map_err(|_| CoreError::validation(format!("malformed id {id:?}: {text:?} is not a numeric parent id")))
}

fn non_empty<'a>(part: Option<&'a str>, id: &str) -> Result<&'a str, CoreError> {
    part.filter(|p| !p.is_empty())
        .ok_or_else(|| CoreError::validation(format!("malformed id {id:?}")))
}

/// A named child of a numeric parent, written `<parent>#<name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildId {
    pub parent: u64,
    pub name: String,
}

impl ChildId {
    pub fn new(parent: u64, name: impl Into<String>) -> Self {
        Self {
            parent,
            name: name.into(),
        }
    }
}

impl fmt::Display for ChildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.parent, self.name)
    }
}

impl FromStr for ChildId {
    type Err = CoreError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        let mut parts = id.splitn(2, '#');
        let parent = parse_parent(non_empty(parts.next(), id)?, id)?;
        let name = non_empty(parts.next(), id)?;
        Ok(Self::new(parent, name))
    }
}

/// Backend server: `<lbId>-<backend>-<name>`.
///
/// Parsing splits on the first two dashes, so only the server name may
/// itself contain dashes. Callers prefer the stored attributes when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerId {
    pub lb_id: u64,
    pub backend: String,
    pub name: String,
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.lb_id, self.backend, self.name)
    }
}

impl FromStr for ServerId {
    type Err = CoreError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        let mut parts = id.splitn(3, '-');
        let lb_id = parse_parent(non_empty(parts.next(), id)?, id)?;
        let backend = non_empty(parts.next(), id)?.to_owned();
        let name = non_empty(parts.next(), id)?.to_owned();
        Ok(Self {
            lb_id,
            backend,
            name,
        })
    }
}

/// Frontend binding: `<lbId>#<frontend>#<name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingId {
    pub lb_id: u64,
    pub frontend: String,
    pub name: String,
}

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}#{}", self.lb_id, self.frontend, self.name)
    }
}

impl FromStr for BindingId {
    type Err = CoreError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        let mut parts = id.splitn(3, '#');
        let lb_id = parse_parent(non_empty(parts.next(), id)?, id)?;
        let frontend = non_empty(parts.next(), id)?.to_owned();
        let name = non_empty(parts.next(), id)?.to_owned();
        Ok(Self {
            lb_id,
            frontend,
            name,
        })
    }
}
