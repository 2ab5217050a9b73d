//! The `$metadata` document in the JSON shape produced by DataJS' metadata
//! handler (`{ "version": ..., "dataServices": { "schema": [...] } }`).

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub version: Option<String>,
    pub data_services: DataServices,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DataServices {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_service_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_data_service_version: Option<String>,
    #[serde(default)]
    pub schema: Vec<Schema>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entity_type: Vec<EntityType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub complex_type: Vec<ComplexType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub association: Vec<Association>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entity_container: Vec<EntityContainer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotations>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EntityType {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_type: Option<String>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub r#abstract: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Key>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub property: Vec<Property>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub navigation_property: Vec<NavigationProperty>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Key {
    #[serde(default)]
    pub property_ref: Vec<PropertyRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PropertyRef {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Property {
    pub name: String,
    #[serde(rename = "type")]
    pub edm_type: String,
    #[serde(
        default,
        deserialize_with = "flexible_opt_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub nullable: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NavigationProperty {
    pub name: String,
    pub relationship: String,
    pub from_role: String,
    pub to_role: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ComplexType {
    pub name: String,
    #[serde(default)]
    pub property: Vec<Property>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Association {
    pub name: String,
    #[serde(default)]
    pub end: Vec<AssociationEnd>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssociationEnd {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub multiplicity: Multiplicity,
    pub role: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Multiplicity {
    #[serde(rename = "0..1")]
    ZeroOrOne,
    #[serde(rename = "1")]
    One,
    #[serde(rename = "*")]
    Many,
}

impl Multiplicity {
    pub fn is_collection(self) -> bool {
        matches!(self, Self::Many)
    }
}

impl std::fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroOrOne => write!(f, "0..1"),
            Self::One => write!(f, "1"),
            Self::Many => write!(f, "*"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EntityContainer {
    pub name: String,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_default_entity_container: bool,
    #[serde(default)]
    pub entity_set: Vec<EntitySet>,
    #[serde(default)]
    pub association_set: Vec<AssociationSet>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub function_import: Vec<FunctionImport>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EntitySet {
    pub name: String,
    pub entity_type: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AssociationSet {
    pub name: String,
    pub association: String,
    #[serde(default)]
    pub end: Vec<AssociationSetEnd>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssociationSetEnd {
    pub role: String,
    pub entity_set: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FunctionImport {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_set: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameter: Vec<Property>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Annotations {
    pub target: String,
    #[serde(default)]
    pub value_annotation: Vec<ValueAnnotation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ValueAnnotation {
    pub term: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string: Option<String>,
}

impl Metadata {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

/// DataJS keeps CSDL attribute values as strings (`"abstract": "true"`),
/// hand-written documents tend to use real booleans.
#[derive(Deserialize)]
#[serde(untagged)]
enum BoolOrString {
    Bool(bool),
    Text(String),
}

impl BoolOrString {
    fn into_bool(self) -> bool {
        match self {
            Self::Bool(b) => b,
            Self::Text(s) => s.trim().eq_ignore_ascii_case("true"),
        }
    }
}

fn flexible_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(BoolOrString::deserialize(deserializer)?.into_bool())
}

fn flexible_opt_bool<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BoolOrString>::deserialize(deserializer)?.map(BoolOrString::into_bool))
}
