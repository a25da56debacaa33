//! summarize stage

use chrono::Local;
use tracing::{debug, info};

use super::{PipelineError, Stage};
use crate::llm::LlmAdapter;
use crate::prompts::{PromptLoader, SummaryPromptContext};
use crate::report;
use crate::state::WorkflowState;

/// Canned summary text used in mock mode
pub fn mock_summary(repository_name: &str, transformation_count: usize) -> String {
    format!(
        "Mock workflow summary for {} with {} transformations",
        repository_name, transformation_count
    )
}

/// Produce the executive summary and the markdown report
pub async fn summarize(
    mut state: WorkflowState,
    llm: &LlmAdapter,
    prompts: &PromptLoader,
) -> Result<WorkflowState, PipelineError> {
    debug!("summarize: called");
    let parsed = state.parsed.as_ref().ok_or(PipelineError::MissingStructure {
        stage: Stage::Summarize,
    })?;
    let fallback = mock_summary(&parsed.repository_name, state.analyses.len());
    let view = state.dependency_view();

    let prompt = SummaryPromptContext::new(parsed, &state.analyses, &view).and_then(|ctx| prompts.summary_prompt(&ctx));
    let (summary, warning) = match prompt {
        Ok(prompt) => {
            let reply = llm.ask(&prompt, fallback).await;
            let warning = reply.warning(Stage::Summarize.name());
            (reply.text, warning)
        }
        Err(e) => (fallback, Some(format!("summarize prompt could not be rendered: {}", e))),
    };

    state.summary = summary;
    if let Some(warning) = warning {
        state.warn(warning);
    }
    state.report = report::render(&state, Local::now());
    info!(summary_len = state.summary.len(), "Summarized workflow");
    Ok(state)
}
