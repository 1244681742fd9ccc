use std::path::Path;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use gamewright_artifacts::ArtifactStore;
use gamewright_core::traits::{AgentExecutor, AgentRequest};
use gamewright_core::types::{FileDisposition, FileKind, FileSpec, GeneratedFile};

use crate::parse::strip_code_fence;
use crate::roles::developer_role;

/// Outcome of one fan-out pass over a file plan.
#[derive(Debug, Clone)]
pub struct FanOutReport {
    pub files: Vec<GeneratedFile>,
}

impl FanOutReport {
    pub fn written(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.disposition, FileDisposition::Written { .. }))
            .count()
    }

    /// Entries whose content never hit disk, keyed by the original filename.
    pub fn memory_only(&self) -> impl Iterator<Item = &GeneratedFile> {
        self.files
            .iter()
            .filter(|f| matches!(f.disposition, FileDisposition::MemoryOnly { .. }))
    }

    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "Generated {} of {} planned files.",
            self.written(),
            self.files.len()
        )];
        for file in &self.files {
            let note = match &file.disposition {
                FileDisposition::Written { path } => format!("written to {}", path),
                FileDisposition::DirectoryCreated { path } => format!("directory at {}", path),
                FileDisposition::MemoryOnly { reason } => format!("kept in memory ({})", reason),
                FileDisposition::Failed => "generation failed".to_string(),
            };
            lines.push(format!(
                "- {} [{}] {}",
                file.filename, file.responsible_unit, note
            ));
        }
        lines.join("\n")
    }
}

/// Concurrent per-file generation with a completion barrier.
///
/// Every spec gets its own generation task; tasks run with no ordering
/// guarantee and no cross-task cancellation, and the write pass starts
/// only after all of them resolved. The coordinator alone touches the
/// store, so no shared state is mutated from worker tasks.
pub struct FanOutWriter {
    executor: Arc<dyn AgentExecutor>,
    store: ArtifactStore,
}

impl FanOutWriter {
    pub fn new(executor: Arc<dyn AgentExecutor>, store: ArtifactStore) -> Self {
        Self { executor, store }
    }

    pub async fn run(&self, specs: &[FileSpec]) -> FanOutReport {
        info!(files = specs.len(), "Fanning out file generation");

        // One task per spec; a failure resolves to None for that entry only.
        let tasks = specs.iter().map(|spec| self.generate(spec));
        let generated: Vec<Option<String>> = join_all(tasks).await;

        let mut files = Vec::with_capacity(specs.len());
        for (spec, content) in specs.iter().zip(generated) {
            files.push(self.place(spec, content).await);
        }
        FanOutReport { files }
    }

    async fn generate(&self, spec: &FileSpec) -> Option<String> {
        let kind = FileKind::classify(&spec.filename);
        let request = AgentRequest::new(
            developer_role(kind),
            format!(
                "Write the complete contents of `{}`. Purpose: {}. Content guidelines: {}. \
                 Respond with the raw file contents only, no commentary.",
                spec.filename, spec.purpose, spec.content_guidelines
            ),
        )
        .with_input("filename", spec.filename.clone())
        .with_input("dependencies", spec.dependencies.join(", "));

        match self.executor.execute(request).await {
            Ok(text) => Some(strip_code_fence(&text).to_string()),
            Err(e) => {
                warn!(file = %spec.filename, error = %e, "File generation failed");
                None
            }
        }
    }

    /// Decide what to do with one generated entry. Never aborts the stage:
    /// escaping paths and write failures degrade to memory-only retention.
    async fn place(&self, spec: &FileSpec, content: Option<String>) -> GeneratedFile {
        let kind = FileKind::classify(&spec.filename);
        let unit = kind.responsible_unit().to_string();

        let Some(content) = content else {
            return GeneratedFile {
                filename: spec.filename.clone(),
                kind,
                content: String::new(),
                responsible_unit: unit,
                disposition: FileDisposition::Failed,
            };
        };

        let disposition = if is_directory_spec(&spec.filename) {
            match self.store.ensure_dir(&spec.filename).await {
                Ok(path) => FileDisposition::DirectoryCreated {
                    path: path.display().to_string(),
                },
                Err(e) => {
                    warn!(file = %spec.filename, error = %e, "Directory creation failed");
                    FileDisposition::MemoryOnly {
                        reason: e.to_string(),
                    }
                }
            }
        } else {
            match self.store.write_text(&spec.filename, &content).await {
                Ok(path) => {
                    debug!(file = %spec.filename, "File written");
                    FileDisposition::Written {
                        path: path.display().to_string(),
                    }
                }
                Err(e) => {
                    warn!(file = %spec.filename, error = %e, "Write skipped, content kept in memory");
                    FileDisposition::MemoryOnly {
                        reason: e.to_string(),
                    }
                }
            }
        };

        GeneratedFile {
            filename: spec.filename.clone(),
            kind,
            content,
            responsible_unit: unit,
            disposition,
        }
    }
}

/// A spec that denotes a directory rather than a file.
fn is_directory_spec(filename: &str) -> bool {
    filename.ends_with('/')
        || filename.ends_with('\\')
        || Path::new(filename).file_name().is_none()
}
