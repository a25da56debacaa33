//! Prompt Loader
//!
//! Loads prompt templates from an override directory or falls back to the
//! embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};

use super::embedded;
use crate::powercenter::ParsedRepository;
use crate::state::TransformationAnalysis;

/// Template used by the `analyze_workflow` stage
pub const ANALYZE_TEMPLATE: &str = "analyze";

/// Template used by the `summarize` stage
pub const SUMMARIZE_TEMPLATE: &str = "summarize";

/// Context for the transformation analysis prompt
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzePromptContext {
    /// Sources as pretty-printed JSON
    pub sources: String,
    pub targets: String,
    pub transformations: String,
}

impl AnalyzePromptContext {
    pub fn new(parsed: &ParsedRepository) -> Result<Self> {
        Ok(Self {
            sources: serde_json::to_string_pretty(&parsed.sources_json())?,
            targets: serde_json::to_string_pretty(&parsed.targets_json())?,
            transformations: serde_json::to_string_pretty(&parsed.transformations_json())?,
        })
    }
}

/// Context for the executive summary prompt
#[derive(Debug, Clone, Serialize)]
pub struct SummaryPromptContext {
    pub repository_name: String,
    pub source_count: usize,
    pub target_count: usize,
    pub transformation_count: usize,
    /// Transformation analyses as pretty-printed JSON
    pub transformations: String,
    /// Dependency view as pretty-printed JSON
    pub dependencies: String,
}

impl SummaryPromptContext {
    pub fn new(
        parsed: &ParsedRepository,
        analyses: &[TransformationAnalysis],
        dependencies: &IndexMap<String, Vec<String>>,
    ) -> Result<Self> {
        Ok(Self {
            repository_name: parsed.repository_name.clone(),
            source_count: parsed.sources.len(),
            target_count: parsed.targets.len(),
            transformation_count: analyses.len(),
            transformations: serde_json::to_string_pretty(analyses)?,
            dependencies: serde_json::to_string_pretty(dependencies)?,
        })
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// User override directory (e.g., `.etl-cognition/prompts/`)
    user_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader that prefers `{dir}/{name}.pmt` when the directory exists
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        debug!(dir = %dir.display(), "PromptLoader::new: called");
        Self {
            hbs: Self::engine(),
            user_dir: if dir.is_dir() { Some(dir.to_path_buf()) } else { None },
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        Self {
            hbs: Self::engine(),
            user_dir: None,
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        // prompt payloads are JSON, not HTML
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks the override directory first, then the embedded copy.
    fn load_template(&self, name: &str) -> Result<String> {
        if let Some(ref user_dir) = self.user_dir {
            let path = user_dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!("Loading prompt from user override: {:?}", path);
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read user prompt {}: {}", path.display(), e));
            }
        }

        if let Some(content) = embedded::get_embedded(name) {
            debug!("Using embedded prompt: {}", name);
            return Ok(content.to_string());
        }

        Err(eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String> {
        let template = self.load_template(template_name)?;
        info!("Rendering template '{}'", template_name);

        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }

    pub fn analyze_prompt(&self, context: &AnalyzePromptContext) -> Result<String> {
        self.render(ANALYZE_TEMPLATE, context)
    }

    pub fn summary_prompt(&self, context: &SummaryPromptContext) -> Result<String> {
        self.render(SUMMARIZE_TEMPLATE, context)
    }
}
