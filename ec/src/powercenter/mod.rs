//! PowerCenter repository model
//!
//! A flattened view of a PowerCenter XML export: the source, target and
//! transformation definitions of every folder plus the mappings that wire
//! them together. Produced by [`parse_repository`].

mod parser;

pub use parser::{ParseError, parse_repository};

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Placeholder used when the export does not carry a value
pub const UNKNOWN: &str = "Unknown";

/// Kind of a parsed component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Source,
    Target,
    Transformation,
}

impl ComponentKind {
    /// XML element defining a component of this kind
    pub fn element(&self) -> &'static str {
        match self {
            Self::Source => "SOURCE",
            Self::Target => "TARGET",
            Self::Transformation => "TRANSFORMATION",
        }
    }

    /// XML element defining one field of a component of this kind
    pub fn field_element(&self) -> &'static str {
        match self {
            Self::Source => "SOURCEFIELD",
            Self::Target => "TARGETFIELD",
            Self::Transformation => "TRANSFORMFIELD",
        }
    }

    pub(crate) fn from_element(tag: &[u8]) -> Option<Self> {
        match tag {
            b"SOURCE" => Some(Self::Source),
            b"TARGET" => Some(Self::Target),
            b"TRANSFORMATION" => Some(Self::Transformation),
            _ => None,
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Source => "source",
            Self::Target => "target",
            Self::Transformation => "transformation",
        };
        write!(f, "{}", name)
    }
}

/// A column of a source/target or a port of a transformation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub datatype: Option<String>,
    /// Raw `PORTTYPE` attribute (transformation ports only)
    pub port_type: Option<String>,
}

impl Field {
    fn has_direction(&self, direction: &str) -> bool {
        self.port_type
            .as_deref()
            .is_some_and(|p| p.split('/').any(|part| part.trim().eq_ignore_ascii_case(direction)))
    }

    /// `INPUT` and `INPUT/OUTPUT` ports
    pub fn is_input(&self) -> bool {
        self.has_direction("INPUT")
    }

    /// `OUTPUT` and `INPUT/OUTPUT` ports
    pub fn is_output(&self) -> bool {
        self.has_direction("OUTPUT")
    }
}

/// A source, target or transformation definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedComponent {
    pub name: String,
    pub kind: ComponentKind,
    /// Element attributes in document order
    pub attributes: IndexMap<String, String>,
    pub fields: Vec<Field>,
}

impl ParsedComponent {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// `DATABASETYPE` for sources/targets, `TYPE` for transformations
    pub fn component_type(&self) -> &str {
        let key = match self.kind {
            ComponentKind::Transformation => "TYPE",
            _ => "DATABASETYPE",
        };
        self.attribute(key).unwrap_or(UNKNOWN)
    }

    /// Owner schema the table lives in
    pub fn connection(&self) -> &str {
        self.attribute("OWNERNAME").unwrap_or(UNKNOWN)
    }

    pub fn description(&self) -> &str {
        self.attribute("DESCRIPTION").unwrap_or_default()
    }

    pub fn columns(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn input_ports(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.is_input())
            .map(|f| f.name.as_str())
            .collect()
    }

    pub fn output_ports(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.is_output())
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Compact JSON view used in prompts and API responses
    pub fn to_json(&self) -> serde_json::Value {
        match self.kind {
            ComponentKind::Transformation => json!({
                "name": self.name,
                "type": self.component_type(),
                "description": self.description(),
                "input_ports": self.input_ports(),
                "output_ports": self.output_ports(),
            }),
            _ => json!({
                "name": self.name,
                "type": self.component_type(),
                "connection": self.connection(),
                "columns": self.columns(),
            }),
        }
    }
}

/// A field-level link inside a mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connector {
    pub from_instance: String,
    pub from_field: String,
    pub to_instance: String,
    pub to_field: String,
}

/// A mapping definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    pub name: String,
    pub description: String,
    pub is_valid: bool,
    /// Objects referenced through `SHORTCUT` elements
    pub shortcuts: Vec<String>,
    pub connectors: Vec<Connector>,
}

/// Everything extracted from one PowerCenter export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedRepository {
    pub repository_name: String,
    pub version: String,
    /// `REPOSITORY_VERSION` of the `POWERMART` root
    pub repository_version: Option<String>,
    pub creation_date: Option<String>,
    pub folders: Vec<String>,
    pub sources: Vec<ParsedComponent>,
    pub targets: Vec<ParsedComponent>,
    pub transformations: Vec<ParsedComponent>,
    pub mappings: Vec<Mapping>,
}

impl ParsedRepository {
    /// All components, sources first, then transformations, then targets
    pub fn components(&self) -> impl Iterator<Item = &ParsedComponent> {
        self.sources
            .iter()
            .chain(self.transformations.iter())
            .chain(self.targets.iter())
    }

    pub fn find(&self, name: &str) -> Option<&ParsedComponent> {
        self.components().find(|c| c.name == name)
    }

    pub fn sources_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.sources.iter().map(ParsedComponent::to_json).collect())
    }

    pub fn targets_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.targets.iter().map(ParsedComponent::to_json).collect())
    }

    pub fn transformations_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.transformations.iter().map(ParsedComponent::to_json).collect())
    }

    /// Repository summary returned to API clients
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "repository_name": self.repository_name,
            "version": self.version,
            "repository_version": self.repository_version,
            "creation_date": self.creation_date,
            "folders": self.folders,
            "sources": self.sources_json(),
            "targets": self.targets_json(),
            "transformations": self.transformations_json(),
            "mappings": self.mappings,
        })
    }
}
