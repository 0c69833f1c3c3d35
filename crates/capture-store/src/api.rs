use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{StoreErrKind, StoreError};
use crate::fs::{layout, listing, sweep, writer};
use crate::model::{CaptureFile, CaptureFormat};
use crate::policy::RetentionPolicy;
use crate::SweepReport;

/// Capture directory handle shared by the orchestrator and the API layer.
#[derive(Clone, Debug)]
pub struct CaptureStore {
    root: PathBuf,
    policy: RetentionPolicy,
}

impl CaptureStore {
    pub fn new(root: impl Into<PathBuf>, policy: RetentionPolicy) -> Self {
        Self {
            root: root.into(),
            policy,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    pub fn ensure_root(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn staging_path(&self) -> PathBuf {
        layout::staging_path(&self.root)
    }

    pub fn path_of(&self, file: &CaptureFile) -> PathBuf {
        layout::capture_path(&self.root, file)
    }

    pub fn persist(&self, file: &CaptureFile, data: &[u8]) -> Result<PathBuf, StoreError> {
        Ok(writer::write_capture(&self.root, file, data)?)
    }

    pub fn sweep(&self) -> Result<SweepReport, StoreError> {
        Ok(sweep::sweep_dir(&self.root, self.policy)?)
    }

    /// Captures newest-first, optionally narrowed to one stream and format.
    pub fn list(
        &self,
        name: Option<&str>,
        format: Option<CaptureFormat>,
    ) -> Result<Vec<CaptureFile>, StoreError> {
        Ok(listing::list_captures(&self.root, name, format)?)
    }

    pub fn latest(&self, name: &str) -> Result<Option<CaptureFile>, StoreError> {
        Ok(self.list(Some(name), None)?.into_iter().next())
    }

    /// Resolves a listed capture by file name.
    pub fn find(&self, file_name: &str) -> Result<CaptureFile, StoreError> {
        let not_found = || StoreError::from(StoreErrKind::NotFound(file_name.to_string()));
        let capture = CaptureFile::parse(file_name).map_err(|_| not_found())?;
        if self.path_of(&capture).is_file() {
            Ok(capture)
        } else {
            Err(not_found())
        }
    }
}
