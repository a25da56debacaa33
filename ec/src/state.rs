//! WorkflowState - the record threaded through the pipeline stages

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::pipeline::dependencies_of;
use crate::powercenter::ParsedRepository;

/// Ordered `from -> to` pair of component names
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub from: String,
    pub to: String,
}

impl DependencyEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl std::fmt::Display for DependencyEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// Analysis of one transformation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformationAnalysis {
    pub name: String,
    #[serde(rename = "type")]
    pub transformation_type: String,
    pub business_purpose: String,
    pub input_fields: Vec<String>,
    pub output_fields: Vec<String>,
    pub transformation_logic: String,
}

/// Accumulated state of one analysis run
///
/// Each stage reads the fields filled by the stages before it and fills its
/// own. Created once per run and dropped afterwards.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkflowState {
    pub session_id: String,
    pub session_folder: PathBuf,
    pub xml_content: String,

    /// Set by `parse_xml`
    pub parsed: Option<ParsedRepository>,

    /// Set by `analyze_workflow`
    pub analyses: Vec<TransformationAnalysis>,
    /// Raw analysis text returned by the LLM adapter
    pub llm_analysis: String,

    /// Set by `map_dependencies`
    pub dependencies: Vec<DependencyEdge>,

    /// Set by `summarize`
    pub summary: String,
    /// Markdown report rendered by `summarize`
    pub report: String,

    /// Non-fatal problems hit along the way
    pub warnings: Vec<String>,
}

impl WorkflowState {
    pub fn new(session_id: impl Into<String>, session_folder: impl Into<PathBuf>, xml_content: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            session_folder: session_folder.into(),
            xml_content: xml_content.into(),
            ..Default::default()
        }
    }

    /// Upstream components of every parsed component
    ///
    /// Empty until `parse_xml` has run.
    pub fn dependency_view(&self) -> IndexMap<String, Vec<String>> {
        match &self.parsed {
            Some(parsed) => dependencies_of(parsed, &self.dependencies),
            None => IndexMap::new(),
        }
    }

    pub fn warn(&mut self, warning: impl Into<String>) {
        let warning = warning.into();
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }
}
