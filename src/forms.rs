//! Input forms for the analysis and comparison flows.
//!
//! The runner does no validation; these forms check prerequisites before a
//! job is submitted. Only file names and sizes are read.

use crate::model::{AnalysisOption, FileInfo, JobKind, JobRequest, RunnerConfig};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ACCEPTED_EXTENSIONS: &[&str] = &["fasta", "fa", "fas"];
pub const MIN_COMPARE_FILES: usize = 2;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("select a sequence file to analyze")]
    NoFile,
    #[error("select at least {need} files to compare ({got} selected)")]
    NotEnoughFiles { need: usize, got: usize },
    #[error("unsupported file type: {0} (expected .fasta, .fa or .fas)")]
    UnsupportedExtension(String),
    #[error("cannot read {}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read display information for a selected file.
pub fn inspect_file(path: &Path) -> Result<FileInfo, FormError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let accepted = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| ACCEPTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
    if !accepted {
        return Err(FormError::UnsupportedExtension(name));
    }

    let meta = std::fs::metadata(path).map_err(|source| FormError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(FileInfo {
        name,
        size: meta.len(),
    })
}

#[derive(Debug, Clone)]
pub struct AnalysisForm {
    pub file: Option<PathBuf>,
    pub reference: Option<PathBuf>,
    pub options: Vec<AnalysisOption>,
}

impl Default for AnalysisForm {
    fn default() -> Self {
        Self {
            file: None,
            reference: None,
            options: vec![AnalysisOption::Nucleotide, AnalysisOption::Gc],
        }
    }
}

impl AnalysisForm {
    #[cfg_attr(not(feature = "tui"), allow(dead_code))]
    pub fn toggle_option(&mut self, option: AnalysisOption) {
        if let Some(pos) = self.options.iter().position(|o| *o == option) {
            self.options.remove(pos);
        } else {
            self.options.push(option);
        }
    }

    pub fn submit(&self, config: RunnerConfig) -> Result<JobRequest, FormError> {
        let path = self.file.as_deref().ok_or(FormError::NoFile)?;
        let file = inspect_file(path)?;
        let reference = self.reference.as_deref().map(inspect_file).transpose()?;
        let request = JobRequest {
            kind: JobKind::Analysis,
            files: vec![file],
            reference,
            options: self.options.clone(),
            config,
        };
        if let Some(warning) = request.warning() {
            log::warn!("{warning}");
        }
        Ok(request)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CompareForm {
    pub files: Vec<PathBuf>,
}

impl CompareForm {
    #[cfg_attr(not(feature = "tui"), allow(dead_code))]
    pub fn remove_file(&mut self, index: usize) {
        if index < self.files.len() {
            self.files.remove(index);
        }
    }

    pub fn ready(&self) -> bool {
        self.files.len() >= MIN_COMPARE_FILES
    }

    pub fn submit(&self, config: RunnerConfig) -> Result<JobRequest, FormError> {
        if !self.ready() {
            return Err(FormError::NotEnoughFiles {
                need: MIN_COMPARE_FILES,
                got: self.files.len(),
            });
        }
        let files = self
            .files
            .iter()
            .map(|p| inspect_file(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(JobRequest {
            kind: JobKind::Comparison,
            files,
            reference: None,
            options: Vec::new(),
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fasta(dir: &tempfile::TempDir, name: &str, bytes: usize) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&vec![b'A'; bytes]).unwrap();
        path
    }

    #[test]
    fn inspect_reads_only_name_and_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = fasta(&dir, "covid_variant.FASTA", 2048);
        let info = inspect_file(&path).unwrap();
        assert_eq!(info.name, "covid_variant.FASTA");
        assert_eq!(info.size, 2048);
        assert_eq!(info.size_label(), "2.0 KB");
    }

    #[test]
    fn inspect_rejects_other_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = fasta(&dir, "notes.txt", 10);
        assert!(matches!(
            inspect_file(&path),
            Err(FormError::UnsupportedExtension(name)) if name == "notes.txt"
        ));
    }

    #[test]
    fn inspect_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = inspect_file(&dir.path().join("gone.fa")).unwrap_err();
        assert!(matches!(err, FormError::Unreadable { .. }));
    }

    #[test]
    fn analysis_needs_a_file() {
        let form = AnalysisForm::default();
        assert!(matches!(
            form.submit(RunnerConfig::default()),
            Err(FormError::NoFile)
        ));
    }

    #[test]
    fn analysis_submits_file_reference_and_options() {
        let dir = tempfile::tempdir().unwrap();
        let mut form = AnalysisForm {
            file: Some(fasta(&dir, "sample.fa", 100)),
            reference: Some(fasta(&dir, "ref.fas", 300)),
            ..Default::default()
        };
        form.toggle_option(AnalysisOption::Gc);
        form.toggle_option(AnalysisOption::Mutation);

        let req = form.submit(JobKind::Analysis.default_config()).unwrap();
        assert_eq!(req.kind, JobKind::Analysis);
        assert_eq!(req.files.len(), 1);
        assert_eq!(req.reference.as_ref().map(|r| r.size), Some(300));
        assert_eq!(
            req.options,
            vec![AnalysisOption::Nucleotide, AnalysisOption::Mutation]
        );
    }

    #[test]
    fn compare_needs_two_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut form = CompareForm {
            files: vec![fasta(&dir, "a.fa", 1)],
        };
        assert!(matches!(
            form.submit(RunnerConfig::default()),
            Err(FormError::NotEnoughFiles { need: 2, got: 1 })
        ));

        form.files.push(fasta(&dir, "b.fasta", 2));
        let req = form.submit(JobKind::Comparison.default_config()).unwrap();
        assert_eq!(req.kind, JobKind::Comparison);
        assert_eq!(
            req.files.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
            ["a.fa", "b.fasta"]
        );

        form.remove_file(0);
        form.remove_file(5);
        assert!(!form.ready());
    }
}
