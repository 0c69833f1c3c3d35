use std::fs;
use std::io;
use std::path::Path;

use crate::model::{CaptureFile, CaptureFormat};

/// Reads the directory once and returns every entry that names a capture.
///
/// A missing directory lists as empty.
pub fn scan_dir(root: &Path) -> io::Result<Vec<CaptureFile>> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };
    let mut captures = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if let Ok(capture) = CaptureFile::parse(&name) {
            captures.push(capture);
        }
    }
    Ok(captures)
}

/// Captures filtered by stream name and format, newest first.
pub fn list_captures(
    root: &Path,
    name: Option<&str>,
    format: Option<CaptureFormat>,
) -> io::Result<Vec<CaptureFile>> {
    let mut captures: Vec<CaptureFile> = scan_dir(root)?
        .into_iter()
        .filter(|c| name.map_or(true, |n| c.name == n))
        .filter(|c| format.map_or(true, |f| c.format == f))
        .collect();
    captures.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| b.file_name().cmp(&a.file_name()))
    });
    Ok(captures)
}
