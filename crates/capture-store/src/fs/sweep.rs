use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use tracing::{debug, info};

use crate::model::{CaptureFile, CaptureFormat};
use crate::policy::RetentionPolicy;

use super::{layout, listing, writer};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub staging_removed: bool,
    pub removed: Vec<CaptureFile>,
}

impl SweepReport {
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }
}

/// Retention pass over `root`.
///
/// Deletes the staging file, then keeps the `keep_count` newest captures of
/// every (name, format) pair. Only files present in the single listing taken
/// at the start are candidates, so captures written mid-sweep survive.
pub fn sweep_dir(root: &Path, policy: RetentionPolicy) -> io::Result<SweepReport> {
    let mut report = SweepReport::default();
    if !root.exists() {
        return Ok(report);
    }

    let staging = layout::staging_path(root);
    if writer::remove_file(&staging)? {
        debug!(target: "capture-store", path = %staging.display(), "deleted staging file");
        report.staging_removed = true;
    }

    let mut streams: BTreeMap<(String, CaptureFormat), Vec<CaptureFile>> = BTreeMap::new();
    for capture in listing::scan_dir(root)? {
        streams
            .entry((capture.name.clone(), capture.format))
            .or_default()
            .push(capture);
    }

    let keep = policy.keep_count();
    for ((name, format), mut captures) in streams {
        if captures.len() <= keep {
            continue;
        }
        captures.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.file_name().cmp(&b.file_name()))
        });
        let excess = captures.len() - keep;
        info!(
            target: "capture-store",
            name = %name,
            format = %format,
            "deleting {}/{} capture files",
            excess,
            captures.len()
        );
        for capture in captures.into_iter().take(excess) {
            let path = layout::capture_path(root, &capture);
            if writer::remove_file(&path)? {
                debug!(target: "capture-store", path = %path.display(), "deleted capture file");
                report.removed.push(capture);
            }
        }
    }
    Ok(report)
}
