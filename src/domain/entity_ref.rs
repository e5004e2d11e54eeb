//! Typed reference to a catalogue entity of some kind

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::entity::EntityId;
use crate::domain::error::DomainError;

/// Reference to an entity of a given kind, written `KIND/ID`, e.g. `APPLICATION/12`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: String,
    pub id: EntityId,
}

impl EntityRef {
    pub fn new(kind: impl Into<String>, id: impl Into<EntityId>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

/// Both kind and id must be present and non-empty.
impl FromStr for EntityRef {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once('/')
            .ok_or_else(|| DomainError::NotAnEntityRef(s.to_string()))?;
        let (kind, id) = (kind.trim(), id.trim());
        if kind.is_empty() || id.is_empty() || id.contains('/') {
            return Err(DomainError::NotAnEntityRef(s.to_string()));
        }
        let id: EntityId = id
            .parse()
            .map_err(|_| DomainError::NotAnEntityRef(s.to_string()))?;
        Ok(Self::new(kind, id))
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}
