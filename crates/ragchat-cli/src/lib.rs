//! Terminal interface for ragchat

mod commands;
mod ui;

pub use commands::ChatCommand;
pub use ui::{
    display_banner, excerpt, handle_input_with_history, print_help, print_history,
    print_ingest_report, print_reply, print_sources, print_status, token_notice,
};

// Re-export core types
pub use ragchat_core::{Error, Result};
