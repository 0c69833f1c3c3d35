mod router;
mod state;

pub use router::build_router;
pub use state::{AppState, ServiceCaller, SERVICE_CALL_DEADLINE};
