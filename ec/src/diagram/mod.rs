//! Pipeline topology diagram
//!
//! The topology is fixed: `__start__`, the four stages in order, `__end__`.
//! It is written as a PNG and as Mermaid source next to it.

mod font;
mod render;

pub use render::{encode_png, render_chain};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::pipeline::Stage;

/// PNG file name inside a session folder
pub const DIAGRAM_FILE: &str = "workflow_diagram.png";

/// Mermaid source file name inside a session folder
pub const MERMAID_FILE: &str = "workflow_diagram.mmd";

pub const START: &str = "__start__";
pub const END: &str = "__end__";

#[derive(Debug, Error)]
pub enum DiagramError {
    #[error("Failed to encode diagram: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Node labels in flow order
pub fn nodes() -> Vec<&'static str> {
    let mut nodes = Vec::with_capacity(Stage::ALL.len() + 2);
    nodes.push(START);
    nodes.extend(Stage::ALL.iter().map(Stage::name));
    nodes.push(END);
    nodes
}

/// Mermaid `graph TD` source of the topology
pub fn to_mermaid() -> String {
    let nodes = nodes();
    let mut out = String::from("graph TD\n");
    for node in &nodes {
        if node.starts_with("__") {
            out.push_str(&format!("    {}([{}])\n", node, node));
        } else {
            out.push_str(&format!("    {}[{}]\n", node, node));
        }
    }
    for pair in nodes.windows(2) {
        out.push_str(&format!("    {} --> {}\n", pair[0], pair[1]));
    }
    out
}

/// PNG bytes of the topology
pub fn render_png() -> Result<Vec<u8>, DiagramError> {
    debug!("render_png: called");
    Ok(encode_png(&render_chain(&nodes()))?)
}

/// Write the PNG and the Mermaid source into `folder`, returning the PNG path
pub fn write_diagram(folder: impl AsRef<Path>) -> Result<PathBuf, DiagramError> {
    let folder = folder.as_ref();
    debug!(folder = %folder.display(), "write_diagram: called");

    let png_path = folder.join(DIAGRAM_FILE);
    let png = render_png()?;
    fs::write(&png_path, png).map_err(|source| DiagramError::Io {
        path: png_path.clone(),
        source,
    })?;

    let mermaid_path = folder.join(MERMAID_FILE);
    fs::write(&mermaid_path, to_mermaid()).map_err(|source| DiagramError::Io {
        path: mermaid_path.clone(),
        source,
    })?;

    info!("Workflow diagram saved to {}", png_path.display());
    Ok(png_path)
}
