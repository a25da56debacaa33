//! The four-stage analysis pipeline
//!
//! `parse_xml -> analyze_workflow -> map_dependencies -> summarize`, run
//! strictly in order over one [`WorkflowState`]. Only `parse_xml` can abort
//! a run; LLM problems degrade to mock text and are recorded as warnings.

mod analyze;
mod dependencies;
mod parse;
mod summarize;

pub use analyze::{analyze_workflow, mock_analysis};
pub use dependencies::{dependencies_of, derive_edges, map_dependencies};
pub use parse::parse_xml;
pub use summarize::{mock_summary, summarize};

use thiserror::Error;
use tracing::{debug, info};

use crate::llm::LlmAdapter;
use crate::powercenter::ParseError;
use crate::prompts::PromptLoader;
use crate::state::WorkflowState;

/// Errors that abort a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("XML parsing failed: {0}")]
    Parse(#[from] ParseError),

    #[error("{stage} requires parsed XML but parse_xml has not run")]
    MissingStructure { stage: Stage },
}

/// A pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    ParseXml,
    AnalyzeWorkflow,
    MapDependencies,
    Summarize,
}

impl Stage {
    /// Every stage in execution order
    pub const ALL: [Stage; 4] = [
        Stage::ParseXml,
        Stage::AnalyzeWorkflow,
        Stage::MapDependencies,
        Stage::Summarize,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::ParseXml => "parse_xml",
            Self::AnalyzeWorkflow => "analyze_workflow",
            Self::MapDependencies => "map_dependencies",
            Self::Summarize => "summarize",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Runs the stages in order
pub struct Pipeline {
    llm: LlmAdapter,
    prompts: PromptLoader,
}

impl Pipeline {
    pub fn new(llm: LlmAdapter, prompts: PromptLoader) -> Self {
        Self { llm, prompts }
    }

    /// Pipeline that never calls out to a model
    pub fn mock() -> Self {
        Self::new(LlmAdapter::mock(), PromptLoader::embedded_only())
    }

    pub fn is_mock(&self) -> bool {
        self.llm.is_mock()
    }

    /// Run every stage over `state`
    pub async fn run(&self, mut state: WorkflowState) -> Result<WorkflowState, PipelineError> {
        debug!(session_id = %state.session_id, "Pipeline::run: called");
        for stage in Stage::ALL {
            state = self.run_stage(stage, state).await?;
        }
        info!(
            session_id = %state.session_id,
            edges = state.dependencies.len(),
            warnings = state.warnings.len(),
            "Pipeline finished"
        );
        Ok(state)
    }

    /// Run a single stage
    pub async fn run_stage(&self, stage: Stage, state: WorkflowState) -> Result<WorkflowState, PipelineError> {
        info!("Running stage {}", stage);
        let result = match stage {
            Stage::ParseXml => parse_xml(state),
            Stage::AnalyzeWorkflow => analyze_workflow(state, &self.llm, &self.prompts).await,
            Stage::MapDependencies => map_dependencies(state),
            Stage::Summarize => summarize(state, &self.llm, &self.prompts).await,
        };
        match &result {
            Ok(_) => debug!("Stage {} complete", stage),
            Err(e) => tracing::error!("Stage {} failed: {}", stage, e),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::generate_sample_xml;

    #[test]
    fn test_stage_order() {
        let names: Vec<_> = Stage::ALL.iter().map(Stage::name).collect();
        assert_eq!(names, vec!["parse_xml", "analyze_workflow", "map_dependencies", "summarize"]);
    }

    #[tokio::test]
    async fn test_mock_run_fills_every_field() {
        let state = WorkflowState::new("s1", "sessions/s1", generate_sample_xml());
        let state = Pipeline::mock().run(state).await.unwrap();

        let parsed = state.parsed.as_ref().unwrap();
        assert_eq!(parsed.repository_name, "SALES_DW_REPO");
        assert_eq!(state.analyses.len(), 3);
        assert_eq!(state.llm_analysis, "Mock analysis for 3 transformations");
        assert_eq!(state.dependencies.len(), 6);
        assert_eq!(state.summary, "Mock workflow summary for SALES_DW_REPO with 3 transformations");
        assert!(state.report.contains("## Executive Summary"));
        assert!(state.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_xml_aborts() {
        let state = WorkflowState::new("s1", "sessions/s1", "<POWERMART><REPOSITORY>");
        let result = Pipeline::mock().run(state).await;
        assert!(matches!(result, Err(PipelineError::Parse(_))));
    }

    #[tokio::test]
    async fn test_stage_out_of_order_is_rejected() {
        let state = WorkflowState::new("s1", "sessions/s1", generate_sample_xml());
        let result = Pipeline::mock().run_stage(Stage::Summarize, state).await;
        assert!(matches!(
            result,
            Err(PipelineError::MissingStructure {
                stage: Stage::Summarize
            })
        ));
    }
}
