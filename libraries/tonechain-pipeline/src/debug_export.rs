/// Debug export - Graphviz dump of the graph topology, rendered with `dot`
use crate::graph::ProcessingGraph;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// File name of the DOT dump
pub const DOT_FILE_NAME: &str = "pipeline.dot";

/// File name of the rendered PDF
pub const PDF_FILE_NAME: &str = "pipeline.pdf";

/// Files an export produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    /// DOT file, when it could be written
    pub dot_path: Option<PathBuf>,
    /// Rendered PDF, when the renderer ran successfully
    pub pdf_path: Option<PathBuf>,
}

/// Writes the topology to disk and renders it
///
/// Every failure is logged and swallowed: exporting never affects a run.
#[derive(Debug, Clone)]
pub struct GraphExporter {
    dot_program: PathBuf,
    directory: PathBuf,
}

impl Default for GraphExporter {
    fn default() -> Self {
        Self::new(PathBuf::from("dot"), std::env::temp_dir())
    }
}

impl GraphExporter {
    /// Exporter writing into `directory` and rendering with `dot_program`
    pub fn new(dot_program: PathBuf, directory: PathBuf) -> Self {
        Self {
            dot_program,
            directory,
        }
    }

    /// Where the DOT file goes
    pub fn dot_path(&self) -> PathBuf {
        self.directory.join(DOT_FILE_NAME)
    }

    /// Where the PDF goes
    pub fn pdf_path(&self) -> PathBuf {
        self.directory.join(PDF_FILE_NAME)
    }

    /// Dump `graph` and try to render it
    pub fn export(&self, graph: &ProcessingGraph) -> ExportReport {
        let dot_path = self.dot_path();
        if let Err(e) = std::fs::write(&dot_path, graph.to_dot()) {
            tracing::warn!("Failed to write {}: {}", dot_path.display(), e);
            return ExportReport::default();
        }
        tracing::debug!("Wrote pipeline graph to {}", dot_path.display());

        let pdf_path = self.pdf_path();
        let rendered = self.render(&dot_path, &pdf_path);
        ExportReport {
            dot_path: Some(dot_path),
            pdf_path: rendered.then_some(pdf_path),
        }
    }

    fn render(&self, dot_path: &Path, pdf_path: &Path) -> bool {
        let output = Command::new(&self.dot_program)
            .arg("-Tpdf")
            .arg("-o")
            .arg(pdf_path)
            .arg(dot_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output();

        match output {
            Ok(output) if output.status.success() => {
                tracing::info!("Rendered pipeline graph to {}", pdf_path.display());
                true
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                tracing::warn!("{} failed: {}", self.dot_program.display(), stderr.trim());
                false
            }
            Err(e) => {
                tracing::warn!("Could not run {}: {}", self.dot_program.display(), e);
                false
            }
        }
    }
}

/// Export to the temporary directory with the system `dot`
pub fn export(graph: &ProcessingGraph) -> ExportReport {
    GraphExporter::default().export(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::assemble;
    use tonechain_core::PipelineConfig;

    fn graph() -> ProcessingGraph {
        let mut config = PipelineConfig::default();
        config.low_pass.enabled = true;
        assemble(config).unwrap()
    }

    #[test]
    fn test_missing_renderer_still_writes_dot() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = GraphExporter::new(
            PathBuf::from("tonechain-no-such-renderer"),
            dir.path().to_path_buf(),
        );

        let report = exporter.export(&graph());
        assert_eq!(report.dot_path, Some(dir.path().join(DOT_FILE_NAME)));
        assert_eq!(report.pdf_path, None);

        let dot = std::fs::read_to_string(dir.path().join(DOT_FILE_NAME)).unwrap();
        assert!(dot.contains("audiocheblimit0"));
        assert!(dot.contains("wavenc0:src -> filesink0:sink"));
    }

    #[test]
    fn test_unwritable_directory_reports_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = GraphExporter::new(PathBuf::from("dot"), dir.path().join("missing"));

        assert_eq!(exporter.export(&graph()), ExportReport::default());
    }
}
