mod api_types;
mod client;
mod history;

pub use api_types::{
    error_message, is_success, AuthStatus, CommandOutcome, CommitOutcome, VersionRecord,
    CONNECTION_ERROR, UNKNOWN_ERROR,
};
pub use client::DraftClient;
pub use history::{filter_for_basename, HistoryList};
