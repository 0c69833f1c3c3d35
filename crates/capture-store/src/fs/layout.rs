use std::path::{Path, PathBuf};

use crate::model::{CaptureFile, STAGING_FILE_NAME};

pub fn capture_path(root: &Path, file: &CaptureFile) -> PathBuf {
    root.join(file.file_name())
}

pub fn staging_path(root: &Path) -> PathBuf {
    root.join(STAGING_FILE_NAME)
}
