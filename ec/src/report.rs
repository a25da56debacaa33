//! Markdown report written to `workflow_summary.md`

use chrono::{DateTime, TimeZone};

use crate::powercenter::{ParsedComponent, UNKNOWN};
use crate::state::WorkflowState;

/// File name of the report inside a session folder
pub const REPORT_FILE: &str = "workflow_summary.md";

/// Render the report for a finished (or partially finished) run
pub fn render<Tz>(state: &WorkflowState, generated_at: DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let timestamp = generated_at.format("%Y-%m-%d %H:%M:%S").to_string();
    let parsed = state.parsed.as_ref();
    let repository_name = parsed.map_or(UNKNOWN, |p| p.repository_name.as_str());
    let version = parsed.map_or(UNKNOWN, |p| p.version.as_str());

    let mut md = String::new();
    md.push_str(&format!(
        "# PowerCenter Workflow Analysis Report\n\n\
         **Session ID:** {}  \n\
         **Generated:** {}  \n\
         **Repository:** {}\n\n\
         ---\n\n\
         ## Executive Summary\n\n\
         {}\n\n\
         ---\n\n\
         ## Repository Information\n\n\
         - **Repository Name:** {}\n\
         - **Version:** {}\n\
         - **Total Sources:** {}\n\
         - **Total Targets:** {}\n\
         - **Total Transformations:** {}\n\
         - **Total Mappings:** {}\n\n\
         ---\n\n",
        state.session_id,
        timestamp,
        repository_name,
        state.summary,
        repository_name,
        version,
        parsed.map_or(0, |p| p.sources.len()),
        parsed.map_or(0, |p| p.targets.len()),
        state.analyses.len(),
        parsed.map_or(0, |p| p.mappings.len()),
    ));

    md.push_str("## Data Sources\n\n");
    for (i, source) in parsed.map_or(&[][..], |p| &p.sources[..]).iter().enumerate() {
        table_section(&mut md, i + 1, source);
    }

    md.push_str("## Data Targets\n\n");
    for (i, target) in parsed.map_or(&[][..], |p| &p.targets[..]).iter().enumerate() {
        table_section(&mut md, i + 1, target);
    }

    md.push_str("## Transformations\n\n");
    for (i, analysis) in state.analyses.iter().enumerate() {
        md.push_str(&format!(
            "### {}. {}\n\n\
             - **Type:** {}\n\
             - **Business Purpose:** {}\n\
             - **Input Fields:** {}\n\
             - **Output Fields:** {}\n\
             - **Transformation Logic:** {}\n\n",
            i + 1,
            analysis.name,
            analysis.transformation_type,
            analysis.business_purpose,
            analysis.input_fields.join(", "),
            analysis.output_fields.join(", "),
            analysis.transformation_logic,
        ));
    }

    md.push_str("## Data Dependencies\n\n");
    for (component, upstream) in state.dependency_view() {
        if upstream.is_empty() {
            md.push_str(&format!("- **{}** has no dependencies\n", component));
        } else {
            md.push_str(&format!("- **{}** depends on: {}\n", component, upstream.join(", ")));
        }
    }

    if !state.warnings.is_empty() {
        md.push_str("\n## Errors and Warnings\n\n");
        for warning in &state.warnings {
            md.push_str(&format!("- {}\n", warning));
        }
    }

    md.push_str(&format!(
        "\n---\n\n*Report generated by etl-cognition on {}*\n",
        timestamp
    ));
    md
}

fn table_section(md: &mut String, index: usize, component: &ParsedComponent) {
    md.push_str(&format!(
        "### {}. {}\n\n\
         - **Type:** {}\n\
         - **Connection:** {}\n\
         - **Columns:** {}\n\n",
        index,
        component.name,
        component.component_type(),
        component.connection(),
        component.columns().join(", "),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;
    use crate::sample::generate_sample_xml;
    use chrono::Utc;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
    }

    #[tokio::test]
    async fn test_report_sections() {
        let state = WorkflowState::new("20240301_0930_beef", "sessions/x", generate_sample_xml());
        let state = Pipeline::mock().run(state).await.unwrap();
        let md = render(&state, fixed_time());

        assert!(md.starts_with("# PowerCenter Workflow Analysis Report"));
        assert!(md.contains("**Session ID:** 20240301_0930_beef"));
        assert!(md.contains("**Generated:** 2024-03-01 09:30:00"));
        assert!(md.contains("- **Total Sources:** 2"));
        assert!(md.contains("- **Total Transformations:** 3"));
        assert!(md.contains("### 1. SRC_CUSTOMERS"));
        assert!(md.contains("- **Connection:** DW_SCHEMA"));
        assert!(md.contains("- **Business Purpose:** Data transformation of type Aggregator"));
        assert!(md.contains("- **SRC_ORDERS** has no dependencies"));
        assert!(md.contains("- **AGG_ORDER_SUMMARY** depends on: SRC_ORDERS"));
        assert!(!md.contains("## Errors and Warnings"));
        assert!(md.trim_end().ends_with("2024-03-01 09:30:00*"));
    }

    #[tokio::test]
    async fn test_report_lists_one_entry_per_line() {
        let state = WorkflowState::new("s", "s", generate_sample_xml());
        let mut state = Pipeline::mock().run(state).await.unwrap();
        state.warn("first");
        state.warn("second");
        let md = render(&state, fixed_time());

        assert!(md.contains(
            "## Data Dependencies\n\n- **SRC_CUSTOMERS** has no dependencies\n- **SRC_ORDERS** has no dependencies\n"
        ));
        assert!(md.contains("## Errors and Warnings\n\n- first\n- second\n\n---"));
    }

    #[test]
    fn test_report_without_parsed_structure() {
        let mut state = WorkflowState::new("s", "s", "");
        state.warn("diagram failed");
        let md = render(&state, fixed_time());

        assert!(md.contains("**Repository:** Unknown"));
        assert!(md.contains("- **Total Sources:** 0"));
        assert!(md.contains("## Errors and Warnings\n\n- diagram failed"));
    }
}
