pub mod layout;
pub mod listing;
pub mod sweep;
pub mod writer;
