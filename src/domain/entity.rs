//! Domain entities: flat records carrying an optional parent reference

use std::fmt;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::domain::error::{DomainError, DomainResult};

/// A flat input record that can be placed in a hierarchy.
///
/// Everything besides the identifier and the parent reference is payload the
/// builder never looks at.
pub trait Entity {
    type Id: Clone + Eq + Hash + Debug + Display;

    /// Identifier, unique within one input set.
    fn id(&self) -> &Self::Id;

    /// Identifier of the parent entity, `None` for a root.
    fn parent_id(&self) -> Option<&Self::Id>;

    /// Human readable name used when rendering trees.
    fn label(&self) -> String {
        self.id().to_string()
    }
}

/// Identifier of a catalogue record: JSON integers and strings are both in use.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Number(i64),
    Text(String),
}

impl EntityId {
    /// Read an identifier from a JSON value. `null` and other kinds yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(EntityId::Number),
            Value::String(s) => Some(EntityId::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Number(n) => write!(f, "{}", n),
            EntityId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Integer-looking input parses as `Number`, anything else as `Text`.
impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse::<i64>()
            .map(EntityId::Number)
            .unwrap_or_else(|_| EntityId::Text(s.to_string())))
    }
}

impl From<i64> for EntityId {
    fn from(n: i64) -> Self {
        EntityId::Number(n)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        EntityId::Text(s.to_string())
    }
}

/// Names of the record fields holding identifier, parent reference and label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FieldNames {
    pub id: String,
    pub parent: String,
    pub label: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            id: "id".into(),
            parent: "parentId".into(),
            label: "name".into(),
        }
    }
}

/// JSON-backed catalogue record.
///
/// Keeps the complete input object as payload, so serializing a record
/// reproduces its input.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: EntityId,
    parent_id: Option<EntityId>,
    label: Option<String>,
    payload: Map<String, Value>,
}

impl Record {
    /// Build a record from one element of an input array.
    ///
    /// # Arguments
    /// * `position` - index of the element in its input, used in errors
    /// * `value` - the element; must be a JSON object with a usable identifier
    /// * `fields` - which fields to read id, parent and label from
    pub fn from_value(position: usize, value: Value, fields: &FieldNames) -> DomainResult<Self> {
        let payload = match value {
            Value::Object(map) => map,
            other => {
                return Err(DomainError::InvalidRecord {
                    position,
                    message: format!("expected an object, found {}", kind_of(&other)),
                })
            }
        };

        let id = payload
            .get(&fields.id)
            .and_then(EntityId::from_value)
            .ok_or_else(|| DomainError::InvalidRecord {
                position,
                message: format!("missing or unusable '{}' field", fields.id),
            })?;
        // Only a missing or null parent means "no parent"
        let parent_id = match payload.get(&fields.parent) {
            None | Some(Value::Null) => None,
            Some(value) => Some(EntityId::from_value(value).ok_or_else(|| {
                DomainError::InvalidRecord {
                    position,
                    message: format!(
                        "unusable '{}' value: {}",
                        fields.parent,
                        kind_of(value)
                    ),
                }
            })?),
        };
        let label = payload
            .get(&fields.label)
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            id,
            parent_id,
            label,
            payload,
        })
    }

    /// Record without payload beyond id and parent, keyed with the default field names.
    pub fn new(id: impl Into<EntityId>, parent_id: Option<EntityId>) -> Self {
        let id = id.into();
        let fields = FieldNames::default();
        let mut payload = Map::new();
        payload.insert(fields.id, serde_json::to_value(&id).unwrap_or(Value::Null));
        if let Some(parent) = &parent_id {
            payload.insert(fields.parent, serde_json::to_value(parent).unwrap_or(Value::Null));
        }
        Self {
            id,
            parent_id,
            label: None,
            payload,
        }
    }

    /// Look up a payload field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.payload.get(field)
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }
}

/// Parse every element of an input array, failing on the first bad record.
pub fn records_from_values(values: Vec<Value>, fields: &FieldNames) -> DomainResult<Vec<Record>> {
    values
        .into_iter()
        .enumerate()
        .map(|(position, value)| Record::from_value(position, value, fields))
        .collect()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl Entity for Record {
    type Id = EntityId;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn parent_id(&self) -> Option<&EntityId> {
        self.parent_id.as_ref()
    }

    fn label(&self) -> String {
        self.label.clone().unwrap_or_else(|| self.id.to_string())
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.payload.serialize(serializer)
    }
}
