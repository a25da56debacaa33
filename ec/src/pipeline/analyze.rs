//! analyze_workflow stage

use tracing::{debug, info};

use super::{PipelineError, Stage};
use crate::llm::LlmAdapter;
use crate::powercenter::ParsedRepository;
use crate::prompts::{AnalyzePromptContext, PromptLoader};
use crate::state::{TransformationAnalysis, WorkflowState};

/// Canned analysis text used in mock mode
pub fn mock_analysis(transformation_count: usize) -> String {
    format!("Mock analysis for {} transformations", transformation_count)
}

/// Ask the model about the parsed transformations and record one analysis each
pub async fn analyze_workflow(
    mut state: WorkflowState,
    llm: &LlmAdapter,
    prompts: &PromptLoader,
) -> Result<WorkflowState, PipelineError> {
    debug!("analyze_workflow: called");
    let parsed = state.parsed.as_ref().ok_or(PipelineError::MissingStructure {
        stage: Stage::AnalyzeWorkflow,
    })?;
    let fallback = mock_analysis(parsed.transformations.len());

    let prompt = AnalyzePromptContext::new(parsed).and_then(|ctx| prompts.analyze_prompt(&ctx));
    let (text, warning) = match prompt {
        Ok(prompt) => {
            let reply = llm.ask(&prompt, fallback).await;
            let warning = reply.warning(Stage::AnalyzeWorkflow.name());
            (reply.text, warning)
        }
        Err(e) => (fallback, Some(format!("analyze_workflow prompt could not be rendered: {}", e))),
    };

    let analyses = analyses_for(parsed, &text);
    info!(count = analyses.len(), "Analyzed transformations");

    state.analyses = analyses;
    state.llm_analysis = text;
    if let Some(warning) = warning {
        state.warn(warning);
    }
    Ok(state)
}

/// One analysis per transformation, in document order
fn analyses_for(parsed: &ParsedRepository, logic: &str) -> Vec<TransformationAnalysis> {
    parsed
        .transformations
        .iter()
        .map(|t| {
            let transformation_type = t.component_type().to_string();
            TransformationAnalysis {
                name: t.name.clone(),
                business_purpose: format!("Data transformation of type {}", transformation_type),
                transformation_type,
                input_fields: t.input_ports().into_iter().map(String::from).collect(),
                output_fields: t.output_ports().into_iter().map(String::from).collect(),
                transformation_logic: logic.to_string(),
            }
        })
        .collect()
}
