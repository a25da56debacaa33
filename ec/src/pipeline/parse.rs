//! parse_xml stage

use tracing::{debug, info};

use super::PipelineError;
use crate::powercenter::parse_repository;
use crate::state::WorkflowState;

/// Parse `xml_content` into the repository structure
pub fn parse_xml(mut state: WorkflowState) -> Result<WorkflowState, PipelineError> {
    debug!(bytes = state.xml_content.len(), "parse_xml: called");
    let parsed = parse_repository(&state.xml_content)?;
    info!(
        repository = %parsed.repository_name,
        sources = parsed.sources.len(),
        targets = parsed.targets.len(),
        transformations = parsed.transformations.len(),
        mappings = parsed.mappings.len(),
        "Parsed PowerCenter XML"
    );
    state.parsed = Some(parsed);
    Ok(state)
}
