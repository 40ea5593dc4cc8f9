//! # Paperstack CLI
//!
//! The binary is intentionally thin: the CLI lives in `src/cli/`, while this file only
//! invokes `cli::run()` and handles process termination.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/paperstack-cli/src/cli/)                 │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - Logging, runtime and dispatch (commands.rs)              │
//! │  - Terminal rendering (render.rs)                           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (crates/paperstack/src/api.rs)                   │
//! │  - Document ids and 1-based page numbers → pages            │
//! │  - Returns structured `CmdResult` values                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything from `api.rs` inward is UI agnostic. The CLI owns argument parsing,
//! logging setup, Ctrl-C handling, rendering and exit codes.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {:#}", e);
        let hint = e
            .downcast_ref::<paperstack::PaperError>()
            .and_then(cli::error_hint);
        if let Some(hint) = hint {
            eprintln!("{}", hint);
        }
        std::process::exit(1);
    }
}
