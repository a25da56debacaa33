//! WorkflowExtractor - one analysis run end to end
//!
//! Creates the session folder, runs the pipeline, renders the diagram and
//! writes the report. Shared by the CLI and the HTTP server.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use eyre::{Context, Result};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::diagram::write_diagram;
use crate::llm::LlmAdapter;
use crate::pipeline::Pipeline;
use crate::powercenter::ParsedRepository;
use crate::prompts::PromptLoader;
use crate::report;
use crate::session::Session;
use crate::state::{DependencyEdge, TransformationAnalysis, WorkflowState};

/// Everything a finished run produced
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    pub session_id: String,
    pub session_folder: PathBuf,
    pub repository: ParsedRepository,
    pub analyses: Vec<TransformationAnalysis>,
    pub edges: Vec<DependencyEdge>,
    /// Upstream components of every parsed component
    pub dependencies: IndexMap<String, Vec<String>>,
    pub summary: String,
    pub warnings: Vec<String>,
    pub report_path: PathBuf,
    /// Absent when the diagram could not be rendered
    pub diagram_path: Option<PathBuf>,
}

pub struct WorkflowExtractor {
    pipeline: Pipeline,
    sessions_dir: PathBuf,
}

impl WorkflowExtractor {
    pub fn new(config: &Config) -> Self {
        debug!("WorkflowExtractor::new: called");
        let llm = LlmAdapter::from_config(&config.llm);
        let prompts = PromptLoader::new(&config.output.prompts_dir);
        Self::with_pipeline(Pipeline::new(llm, prompts), &config.output.sessions_dir)
    }

    pub fn with_pipeline(pipeline: Pipeline, sessions_dir: impl Into<PathBuf>) -> Self {
        Self {
            pipeline,
            sessions_dir: sessions_dir.into(),
        }
    }

    pub fn is_mock(&self) -> bool {
        self.pipeline.is_mock()
    }

    pub fn sessions_dir(&self) -> &Path {
        &self.sessions_dir
    }

    /// Analyze the XML file at `path`
    pub async fn extract_file(&self, path: impl AsRef<Path>) -> Result<ExtractionResult> {
        let path = path.as_ref();
        debug!(path = %path.display(), "extract_file: called");
        let xml = tokio::fs::read_to_string(path)
            .await
            .context(format!("Failed to read XML file {}", path.display()))?;
        self.extract_content(xml).await
    }

    /// Analyze XML text
    ///
    /// A parse failure is returned as a [`crate::pipeline::PipelineError`]
    /// that callers can recover with `downcast_ref`. Filesystem work and PNG
    /// encoding run on the blocking pool.
    pub async fn extract_content(&self, xml: impl Into<String>) -> Result<ExtractionResult> {
        let root = self.sessions_dir.clone();
        let session = tokio::task::spawn_blocking(move || Session::create(root))
            .await
            .context("Session creation task failed")??;

        let state = WorkflowState::new(&session.id, &session.folder, xml);
        let state = self.pipeline.run(state).await?;

        tokio::task::spawn_blocking(move || write_artifacts(session, state))
            .await
            .context("Artifact task failed")?
    }
}

/// Write the diagram and report of a finished run
fn write_artifacts(session: Session, mut state: WorkflowState) -> Result<ExtractionResult> {
    let diagram_path = match write_diagram(&session.folder) {
        Ok(path) => Some(path),
        Err(e) => {
            state.warn(format!("Could not create graph visualization: {}", e));
            state.report = report::render(&state, Local::now());
            None
        }
    };

    let report_path = session.report_path();
    fs::write(&report_path, &state.report).context(format!("Failed to write {}", report_path.display()))?;
    info!("Markdown report saved to {}", report_path.display());

    let dependencies = state.dependency_view();
    let repository = state
        .parsed
        .ok_or_else(|| eyre::eyre!("pipeline finished without parsed structure"))?;

    Ok(ExtractionResult {
        session_id: session.id,
        session_folder: session.folder,
        repository,
        analyses: state.analyses,
        edges: state.dependencies,
        dependencies,
        summary: state.summary,
        warnings: state.warnings,
        report_path,
        diagram_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineError;
    use crate::sample::{generate_sample_xml, write_sample};
    use crate::session::list_sessions;
    use tempfile::TempDir;

    fn extractor(dir: &TempDir) -> WorkflowExtractor {
        WorkflowExtractor::with_pipeline(Pipeline::mock(), dir.path().join("sessions"))
    }

    #[tokio::test]
    async fn test_extract_writes_artifacts() {
        let dir = TempDir::new().unwrap();
        let result = extractor(&dir).extract_content(generate_sample_xml()).await.unwrap();

        assert_eq!(result.repository.repository_name, "SALES_DW_REPO");
        assert_eq!(result.analyses.len(), 3);
        assert_eq!(result.summary, "Mock workflow summary for SALES_DW_REPO with 3 transformations");
        assert!(result.warnings.is_empty());

        let report = fs::read_to_string(&result.report_path).unwrap();
        assert!(report.contains(&result.session_id));
        assert!(result.diagram_path.as_ref().unwrap().exists());
        assert!(result.session_folder.join("workflow_diagram.mmd").exists());

        let sessions = list_sessions(dir.path().join("sessions")).unwrap();
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].has_summary && sessions[0].has_diagram);
    }

    #[tokio::test]
    async fn test_extract_file() {
        let dir = TempDir::new().unwrap();
        let xml_path = dir.path().join("sample.xml");
        write_sample(&xml_path).unwrap();

        let result = extractor(&dir).extract_file(&xml_path).await.unwrap();
        assert_eq!(result.edges.len(), 6);
        assert_eq!(result.dependencies.len(), 6);
    }

    #[tokio::test]
    async fn test_parse_error_is_downcastable() {
        let dir = TempDir::new().unwrap();
        let err = extractor(&dir).extract_content("<POWERMART><REPOSITORY>").await.unwrap_err();
        assert!(matches!(err.downcast_ref::<PipelineError>(), Some(PipelineError::Parse(_))));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_concurrent_extractions_on_single_thread() {
        let dir = TempDir::new().unwrap();
        let extractor = extractor(&dir);

        let (first, second) = tokio::join!(
            extractor.extract_content(generate_sample_xml()),
            extractor.extract_content(generate_sample_xml())
        );
        let (first, second) = (first.unwrap(), second.unwrap());

        assert_ne!(first.session_id, second.session_id);
        assert!(first.report_path.exists() && second.report_path.exists());
        assert_eq!(list_sessions(dir.path().join("sessions")).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = extractor(&dir).extract_file(dir.path().join("none.xml")).await.unwrap_err();
        assert!(err.to_string().contains("Failed to read XML file"));
    }
}
