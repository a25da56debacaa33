//! map_dependencies stage
//!
//! Edges come from the mappings' `CONNECTOR` elements when there are any.
//! Otherwise they are inferred from field names: a source feeds a
//! transformation whose input ports share a column name, and a
//! transformation feeds a target whose columns share an output port name.

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, info};

use super::{PipelineError, Stage};
use crate::powercenter::ParsedRepository;
use crate::state::{DependencyEdge, WorkflowState};

/// Derive dependency edges from the parsed structure
pub fn map_dependencies(mut state: WorkflowState) -> Result<WorkflowState, PipelineError> {
    debug!("map_dependencies: called");
    let parsed = state.parsed.as_ref().ok_or(PipelineError::MissingStructure {
        stage: Stage::MapDependencies,
    })?;
    let edges = derive_edges(parsed);
    info!(edges = edges.len(), "Mapped dependencies");
    state.dependencies = edges;
    Ok(state)
}

/// Distinct edges in a stable order; a pure function of `parsed`
pub fn derive_edges(parsed: &ParsedRepository) -> Vec<DependencyEdge> {
    let has_connectors = parsed.mappings.iter().any(|m| !m.connectors.is_empty());
    let edges = if has_connectors {
        debug!("derive_edges: using connectors");
        connector_edges(parsed)
    } else {
        debug!("derive_edges: inferring from field names");
        inferred_edges(parsed)
    };
    edges.into_iter().collect()
}

fn connector_edges(parsed: &ParsedRepository) -> IndexSet<DependencyEdge> {
    parsed
        .mappings
        .iter()
        .flat_map(|m| m.connectors.iter())
        .filter(|c| c.from_instance != c.to_instance)
        .map(|c| DependencyEdge::new(&c.from_instance, &c.to_instance))
        .collect()
}

fn inferred_edges(parsed: &ParsedRepository) -> IndexSet<DependencyEdge> {
    let mut edges = IndexSet::new();

    for source in &parsed.sources {
        let columns = source.columns();
        for transformation in &parsed.transformations {
            if transformation.input_ports().iter().any(|p| columns.contains(p)) {
                edges.insert(DependencyEdge::new(&source.name, &transformation.name));
            }
        }
    }

    for transformation in &parsed.transformations {
        let outputs = transformation.output_ports();
        for target in &parsed.targets {
            if target.columns().iter().any(|c| outputs.contains(c)) {
                edges.insert(DependencyEdge::new(&transformation.name, &target.name));
            }
        }
    }

    edges
}

/// Upstream components of every parsed component
///
/// Keys follow sources, transformations, targets in document order; each
/// list follows edge order.
pub fn dependencies_of(parsed: &ParsedRepository, edges: &[DependencyEdge]) -> IndexMap<String, Vec<String>> {
    parsed
        .components()
        .map(|component| {
            let upstream: IndexSet<&str> = edges
                .iter()
                .filter(|e| e.to == component.name)
                .map(|e| e.from.as_str())
                .collect();
            (
                component.name.clone(),
                upstream.into_iter().map(String::from).collect(),
            )
        })
        .collect()
}
