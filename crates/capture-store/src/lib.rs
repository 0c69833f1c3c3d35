//! Capture files on disk: naming, listing and keep-count retention.

pub mod api;
pub mod errors;
pub mod fs;
pub mod model;
pub mod policy;

pub use api::CaptureStore;
pub use errors::{StoreErrKind, StoreError};
pub use fs::sweep::SweepReport;
pub use model::{CaptureFile, CaptureFormat, STAGING_FILE_NAME};
pub use policy::RetentionPolicy;
