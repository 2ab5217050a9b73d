//! Result payloads: normalising the service's JSON envelopes into rows and
//! laying rows out as (nested) tables.

use chrono::DateTime;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{OdexError, Result};

const METADATA_FIELD: &str = "__metadata";

/// Pull the row list out of whichever envelope the service used.
pub fn normalize_rows(payload: &Value) -> Result<Vec<Value>> {
    match payload {
        Value::Null => Ok(Vec::new()),
        Value::Array(rows) => Ok(rows.clone()),
        Value::Object(map) => {
            if let Some(Value::Array(rows)) = map.get("results") {
                return Ok(rows.clone());
            }
            if let Some(d) = map.get("d") {
                return Ok(match d {
                    Value::Array(rows) => rows.clone(),
                    Value::Object(inner) => match inner.get("results") {
                        Some(Value::Array(rows)) => rows.clone(),
                        _ => vec![d.clone()],
                    },
                    Value::Null => Vec::new(),
                    _ => return Err(OdexError::UnknownResultsFormat),
                });
            }
            if let Some(Value::Array(rows)) = map.get("value") {
                return Ok(rows.clone());
            }
            Ok(vec![payload.clone()])
        }
        _ => Err(OdexError::UnknownResultsFormat),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultPage {
    pub rows: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

impl ResultPage {
    pub fn from_payload(payload: &Value) -> Result<Self> {
        let rows = normalize_rows(payload)?;
        let next_link = lookup(payload, &["__next", "@odata.nextLink", "odata.nextLink"])
            .and_then(Value::as_str)
            .map(str::to_string);
        let total_count = lookup(payload, &["__count", "@odata.count", "odata.count"])
            .and_then(|v| match v {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            });
        Ok(Self {
            rows,
            next_link,
            total_count,
        })
    }
}

/// First of `keys` found on the payload or on its `d` envelope.
fn lookup<'a>(payload: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let scopes = [Some(payload), payload.get("d")];
    scopes
        .into_iter()
        .flatten()
        .find_map(|scope| keys.iter().find_map(|key| scope.get(*key)))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub name: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRow {
    pub cells: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ResultTable>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultTable {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub columns: Vec<String>,
    pub rows: Vec<ResultRow>,
}

impl ResultTable {
    pub fn build(rows: &[Value], title: Option<&str>) -> Self {
        let columns: Vec<String> = rows
            .first()
            .and_then(Value::as_object)
            .map(|first| {
                first
                    .iter()
                    .filter(|(name, value)| name.as_str() != METADATA_FIELD && is_cell(value))
                    .map(|(name, _)| name.clone())
                    .collect()
            })
            .unwrap_or_default();

        let rows = rows
            .iter()
            .filter_map(Value::as_object)
            .map(|row| build_row(row, &columns))
            .collect();

        Self {
            title: title.map(str::to_string),
            columns,
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_links(&self) -> bool {
        self.rows.iter().any(|r| !r.links.is_empty())
    }
}

fn is_cell(value: &Value) -> bool {
    matches!(
        value,
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)
    )
}

fn build_row(row: &Map<String, Value>, columns: &[String]) -> ResultRow {
    let cells = columns
        .iter()
        .map(|column| row.get(column).map(display_value).unwrap_or_default())
        .collect();

    let mut links = Vec::new();
    let mut children = Vec::new();
    for (name, value) in row {
        if name == METADATA_FIELD {
            continue;
        }
        if let Some(uri) = value
            .get("__deferred")
            .and_then(|d| d.get("uri"))
            .and_then(Value::as_str)
        {
            links.push(Link {
                name: name.clone(),
                uri: uri.to_string(),
            });
        } else if let Some(expanded) = expanded_rows(value) {
            children.push(ResultTable::build(&expanded, Some(name)));
        }
    }

    ResultRow {
        cells,
        links,
        children,
    }
}

/// Rows of an expanded navigation, if `value` is one.
fn expanded_rows(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::Object(map) => match map.get("results") {
            Some(Value::Array(rows)) => Some(rows.clone()),
            _ if map.contains_key(METADATA_FIELD) => Some(vec![value.clone()]),
            _ => None,
        },
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => {
            Some(items.clone())
        }
        _ => None,
    }
}

pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => parse_json_date(s).unwrap_or_else(|| s.clone()),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => String::new(),
    }
}

/// `/Date(1704164645000)/` or `/Date(1704164645000+0060)/` as `Tue Jan 02 2024`.
fn parse_json_date(raw: &str) -> Option<String> {
    let inner = raw.strip_prefix("/Date(")?.strip_suffix(")/")?;
    let end = inner
        .char_indices()
        .skip(1)
        .find(|(_, c)| *c == '+' || *c == '-')
        .map(|(i, _)| i)
        .unwrap_or(inner.len());
    let millis: i64 = inner[..end].parse().ok()?;
    let time = DateTime::from_timestamp_millis(millis)?;
    Some(time.format("%a %b %d %Y").to_string())
}
