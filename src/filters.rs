//! Filter families and `$filter` clause rendering.
//!
//! A family is chosen from a property's Edm type and owns a fixed table of
//! operators. Each operator carries a template where `{0}` stands for the
//! property path and `{1}` for the prepared value.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::catalog::PathSegment;
use crate::error::{OdexError, Result};
use crate::relative::{RELATIVE_DATE_LABELS, resolve_datetime_input};

pub const NOT_QUERYABLE: &str = "You are not able to query on this property.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "options", rename_all = "snake_case")]
pub enum InputKind {
    None,
    Choice(&'static [&'static str]),
    Int,
    Double,
    Guid,
    Text,
}

/// How the value maps onto the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Expansion {
    Single,
    /// `;` separated values, one clause each, joined with `or`.
    AnyOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilterOperator {
    pub display_name: &'static str,
    pub template: &'static str,
    pub input: InputKind,
    pub expansion: Expansion,
}

const fn op(display_name: &'static str, template: &'static str, input: InputKind) -> FilterOperator {
    FilterOperator {
        display_name,
        template,
        input,
        expansion: Expansion::Single,
    }
}

const BOOLEAN_OPERATORS: &[FilterOperator] = &[
    op("is true", "{0} eq true", InputKind::None),
    op("is false", "{0} eq false", InputKind::None),
];

const FLOATING_POINT_OPERATORS: &[FilterOperator] = &[
    op("round equals", "round({0}) eq {1}", InputKind::Int),
    op("floor equals", "floor({0}) eq {1}", InputKind::Int),
    op("ceiling equals", "ceiling({0}) eq {1}", InputKind::Int),
    op("equals", "{0} eq {1}", InputKind::Double),
    op("not equals", "{0} ne {1}", InputKind::Double),
    op("greater than", "{0} gt {1}", InputKind::Double),
    op("greater than or equal to", "{0} ge {1}", InputKind::Double),
    op("less than", "{0} lt {1}", InputKind::Double),
    op("less than or equal to", "{0} le {1}", InputKind::Double),
];

const INTEGER_OPERATORS: &[FilterOperator] = &[
    op("equals", "{0} eq {1}", InputKind::Int),
    op("not equals", "{0} ne {1}", InputKind::Int),
    op("greater than", "{0} gt {1}", InputKind::Int),
    op("greater than or equal to", "{0} ge {1}", InputKind::Int),
    op("less than", "{0} lt {1}", InputKind::Int),
    op("less than or equal to", "{0} le {1}", InputKind::Int),
];

const DATE_TIME_OPERATORS: &[FilterOperator] = &[
    op("before", "{0} le datetime'{1}'", InputKind::Choice(RELATIVE_DATE_LABELS)),
    op("after", "{0} ge datetime'{1}'", InputKind::Choice(RELATIVE_DATE_LABELS)),
    op("year equals", "year({0}) eq {1}", InputKind::Int),
    op("month number equals", "month({0}) eq {1}", InputKind::Int),
    op("day number equals", "day({0}) eq {1}", InputKind::Int),
    op("hour equals", "hour({0}) eq {1}", InputKind::Int),
    op("minute equals", "minute({0}) eq {1}", InputKind::Int),
    op("second equals", "second({0}) eq {1}", InputKind::Int),
];

const GUID_OPERATORS: &[FilterOperator] = &[
    op("equals", "{0} eq guid'{1}'", InputKind::Guid),
    op("not equals", "{0} ne guid'{1}'", InputKind::Guid),
];

const STRING_OPERATORS: &[FilterOperator] = &[
    op("equals", "{0} eq '{1}'", InputKind::Text),
    op("not equals", "{0} ne '{1}'", InputKind::Text),
    FilterOperator {
        display_name: "in (; separated)",
        template: "{0} eq '{1}'",
        input: InputKind::Text,
        expansion: Expansion::AnyOf,
    },
    op("case-insensitive equals", "tolower({0}) eq tolower('{1}')", InputKind::Text),
    op("case-insensitive does not equal", "tolower({0}) ne tolower('{1}')", InputKind::Text),
    op("starts with", "startswith({0}, '{1}') eq true", InputKind::Text),
    op("does not start with", "startswith({0}, '{1}') eq false", InputKind::Text),
    op("ends with", "endswith({0}, '{1}') eq true", InputKind::Text),
    op("does not end with", "endswith({0}, '{1}') eq false", InputKind::Text),
    op("contains", "substringof('{1}', {0}) eq true", InputKind::Text),
    op("has length", "length({0}) eq {1}", InputKind::Int),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterFamily {
    Null,
    Boolean,
    FloatingPoint,
    Integer,
    DateTime,
    Guid,
    String,
}

impl FilterFamily {
    pub fn for_edm_type(edm_type: &str) -> Self {
        match edm_type {
            "Edm.Boolean" => Self::Boolean,
            "Edm.Decimal" | "Edm.Single" | "Edm.Double" => Self::FloatingPoint,
            "Edm.Byte" | "Edm.SByte" | "Edm.Int16" | "Edm.Int32" | "Edm.Int64" => Self::Integer,
            "Edm.Time" | "Edm.DateTime" | "Edm.DateTimeOffset" => Self::DateTime,
            "Edm.Guid" => Self::Guid,
            "Edm.String" => Self::String,
            _ => Self::Null,
        }
    }

    pub fn operators(self) -> &'static [FilterOperator] {
        match self {
            Self::Null => &[],
            Self::Boolean => BOOLEAN_OPERATORS,
            Self::FloatingPoint => FLOATING_POINT_OPERATORS,
            Self::Integer => INTEGER_OPERATORS,
            Self::DateTime => DATE_TIME_OPERATORS,
            Self::Guid => GUID_OPERATORS,
            Self::String => STRING_OPERATORS,
        }
    }

    pub fn is_queryable(self) -> bool {
        self != Self::Null
    }

    pub fn operator(self, index: usize) -> Result<&'static FilterOperator> {
        if !self.is_queryable() {
            return Err(OdexError::PropertyNotQueryable(NOT_QUERYABLE.to_string()));
        }
        self.operators()
            .get(index)
            .ok_or_else(|| OdexError::OperatorNotFound {
                family: self.to_string(),
                operator: index.to_string(),
            })
    }

    /// Look an operator up by index or by display name (case-insensitive).
    pub fn find_operator(self, name_or_index: &str) -> Result<usize> {
        if !self.is_queryable() {
            return Err(OdexError::PropertyNotQueryable(NOT_QUERYABLE.to_string()));
        }
        let wanted = name_or_index.trim();
        if let Ok(index) = wanted.parse::<usize>() {
            return self.operator(index).map(|_| index);
        }
        self.operators()
            .iter()
            .position(|op| op.display_name.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| OdexError::OperatorNotFound {
                family: self.to_string(),
                operator: wanted.to_string(),
            })
    }
}

impl std::fmt::Display for FilterFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::FloatingPoint => "floating point",
            Self::Integer => "integer",
            Self::DateTime => "date/time",
            Self::Guid => "guid",
            Self::String => "string",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub encode_url_components: bool,
    pub now: DateTime<Utc>,
}

/// Render one where clause for the property at the end of `segments`.
pub fn render_where(
    family: FilterFamily,
    operator: usize,
    segments: &[PathSegment],
    value: Option<&str>,
    options: &RenderOptions,
) -> Result<String> {
    let filter = family.operator(operator)?;
    if segments.is_empty() {
        return Err(OdexError::EmptyPath);
    }

    match filter.expansion {
        Expansion::Single => {
            let prepared = prepare_value(filter.input, value.unwrap_or(""), options)?;
            Ok(assemble(segments, None, 0, &|path: &str| fill(filter.template, path, &prepared)))
        }
        Expansion::AnyOf => {
            let mut clauses = Vec::new();
            for part in value.unwrap_or("").split(';') {
                let prepared = prepare_value(filter.input, part.trim(), options)?;
                clauses.push(assemble(segments, None, 0, &|path: &str| {
                    fill(filter.template, path, &prepared)
                }));
            }
            if clauses.len() == 1 {
                Ok(clauses.remove(0))
            } else {
                Ok(format!("({})", clauses.join(" or ")))
            }
        }
    }
}

fn fill(template: &str, path: &str, value: &str) -> String {
    template.replace("{0}", path).replace("{1}", value)
}

/// `x`, `y`, `z`, then `x3`, `x4`, ...
pub fn lambda_variable(depth: usize) -> String {
    match depth {
        0 => "x".to_string(),
        1 => "y".to_string(),
        2 => "z".to_string(),
        n => format!("x{n}"),
    }
}

fn assemble(
    segments: &[PathSegment],
    prefix: Option<&str>,
    depth: usize,
    clause: &dyn Fn(&str) -> String,
) -> String {
    let hops = segments.len().saturating_sub(1);
    let join = |part: &[PathSegment]| {
        let names: Vec<&str> = part.iter().map(|s| s.name.as_str()).collect();
        match prefix {
            Some(var) => format!("{var}/{}", names.join("/")),
            None => names.join("/"),
        }
    };

    match segments[..hops].iter().position(|s| s.collection) {
        None => clause(&join(segments)),
        Some(at) => {
            let variable = lambda_variable(depth);
            let inner = assemble(&segments[at + 1..], Some(&variable), depth + 1, clause);
            format!("{}/any({variable}: {inner})", join(&segments[..=at]))
        }
    }
}

fn prepare_value(input: InputKind, raw: &str, options: &RenderOptions) -> Result<String> {
    let value = match input {
        InputKind::None => return Ok(String::new()),
        InputKind::Choice(_) => resolve_datetime_input(raw, options.now)?,
        InputKind::Int => raw
            .trim()
            .parse::<i64>()
            .map(|n| n.to_string())
            .map_err(|_| invalid("an integer", raw))?,
        InputKind::Double => {
            let trimmed = raw.trim();
            match trimmed.parse::<f64>() {
                Ok(n) if n.is_finite() => trimmed.to_string(),
                _ => return Err(invalid("a number", raw)),
            }
        }
        InputKind::Guid => Uuid::parse_str(raw.trim())
            .map(|g| g.hyphenated().to_string())
            .map_err(|_| invalid("a GUID", raw))?,
        InputKind::Text => raw.to_string(),
    };

    let escaped = value.replace('\'', "''");
    if options.encode_url_components {
        Ok(encode_uri_component(&escaped))
    } else {
        Ok(escaped)
    }
}

fn invalid(expected: &str, value: &str) -> OdexError {
    OdexError::InvalidFilterValue {
        expected: expected.to_string(),
        value: value.to_string(),
    }
}

/// Percent-encode everything outside `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
pub fn encode_uri_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
