//! Declarative query plans: a YAML/JSON description of a query that is
//! replayed onto a [`QueryBuilder`] by name.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::split_path;
use crate::error::{OdexError, Result};
use crate::query::{QueryBuilder, SortDirection, WhereFilter};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OperatorRef {
    Index(usize),
    Name(String),
}

impl From<&str> for OperatorRef {
    fn from(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse() {
            Ok(index) => Self::Index(index),
            Err(_) => Self::Name(raw.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFilter")]
pub struct FilterSpec {
    /// `Nav/Prop`, relative to the plan's entity.
    pub path: String,
    pub op: OperatorRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFilter {
    Inline(String),
    Full {
        path: String,
        op: OperatorRef,
        #[serde(default)]
        value: Option<ScalarValue>,
    },
}

/// Filter values may be written as plain YAML scalars (`value: 3`).
#[derive(Deserialize)]
#[serde(untagged)]
enum ScalarValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl ScalarValue {
    fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Int(n) => n.to_string(),
            Self::Float(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

impl TryFrom<RawFilter> for FilterSpec {
    type Error = OdexError;

    fn try_from(raw: RawFilter) -> Result<Self> {
        match raw {
            RawFilter::Inline(text) => text.parse(),
            RawFilter::Full { path, op, value } => Ok(Self {
                path,
                op,
                value: value.map(ScalarValue::into_string),
            }),
        }
    }
}

/// `path|op|value`; the value may be omitted for operators without input.
impl FromStr for FilterSpec {
    type Err = OdexError;

    fn from_str(raw: &str) -> Result<Self> {
        let mut parts = raw.splitn(3, '|');
        let path = parts.next().unwrap_or_default().trim();
        let op = parts.next().unwrap_or_default().trim();
        if path.is_empty() || op.is_empty() {
            return Err(OdexError::InvalidPlan(format!(
                "filter '{raw}' must look like path|operator|value"
            )));
        }
        Ok(Self {
            path: path.to_string(),
            op: OperatorRef::from(op),
            value: parts.next().map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawOrder")]
pub struct OrderSpec {
    pub property: String,
    pub descending: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOrder {
    Inline(String),
    Full {
        property: String,
        #[serde(default)]
        descending: bool,
    },
}

impl TryFrom<RawOrder> for OrderSpec {
    type Error = OdexError;

    fn try_from(raw: RawOrder) -> Result<Self> {
        match raw {
            RawOrder::Inline(text) => text.parse(),
            RawOrder::Full {
                property,
                descending,
            } => Ok(Self {
                property,
                descending,
            }),
        }
    }
}

/// `Name`, `Name desc`, `Name asc` or `Name:desc`.
impl FromStr for OrderSpec {
    type Err = OdexError;

    fn from_str(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let (property, direction) = match trimmed.split_once(':') {
            Some((property, direction)) => (property.trim(), Some(direction.trim())),
            None => match trimmed.split_once(char::is_whitespace) {
                Some((property, direction)) => (property, Some(direction.trim())),
                None => (trimmed, None),
            },
        };
        if property.is_empty() {
            return Err(OdexError::InvalidPlan(format!("empty order-by term '{raw}'")));
        }
        let descending = match direction.map(str::to_ascii_lowercase).as_deref() {
            None | Some("asc") | Some("ascending") => false,
            Some("desc") | Some("descending") => true,
            Some(other) => {
                return Err(OdexError::InvalidPlan(format!(
                    "unknown sort direction '{other}'"
                )));
            }
        };
        Ok(Self {
            property: property.to_string(),
            descending,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryPlan {
    pub entity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
    #[serde(default)]
    pub order_by: Vec<OrderSpec>,
    #[serde(default)]
    pub select: Vec<String>,
    #[serde(default)]
    pub expand: Vec<String>,
}

impl QueryPlan {
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_yaml_str(&fs::read_to_string(path)?)
    }

    /// Select the plan's entity on `builder` and replay every option.
    pub fn apply(&self, builder: &mut QueryBuilder) -> Result<()> {
        let entity = builder.catalog().resolve_entity(&self.entity)?;
        builder.select_entity(entity)?;
        if self.top.is_some() {
            builder.set_top(self.top);
        }
        if self.skip.is_some() {
            builder.set_skip(self.skip);
        }

        for spec in &self.filters {
            let steps = builder
                .catalog()
                .resolve_path(entity, &split_path(&spec.path))?;
            let family = builder.family_for(&steps)?;
            let operator = match &spec.op {
                OperatorRef::Index(index) => family.operator(*index).map(|_| *index)?,
                OperatorRef::Name(name) => family.find_operator(name)?,
            };
            let id = builder.next_filter_id();
            builder.add_or_update_filter(WhereFilter {
                id,
                path: steps,
                operator,
                value: spec.value.clone(),
            })?;
        }

        for order in &self.order_by {
            let item = builder.catalog().find_item(entity, &order.property)?;
            let direction = if order.descending {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            };
            builder.set_order_by(item.id, Some(direction))?;
        }
        for name in &self.select {
            let item = builder.catalog().find_item(entity, name)?;
            builder.set_select(item.id, true)?;
        }
        for name in &self.expand {
            let item = builder.catalog().find_item(entity, name)?;
            builder.set_expand(item.id, true)?;
        }

        debug!(entity = %self.entity, filters = self.filters.len(), "applied query plan");
        Ok(())
    }
}
