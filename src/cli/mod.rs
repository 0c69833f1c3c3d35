pub mod app;
pub mod call;
pub mod capture;
pub mod commands;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod list;
pub mod runtime;
pub mod serve;
pub mod version;

pub use app::run;
pub use context::CliContext;
pub use env::CliArgs;
