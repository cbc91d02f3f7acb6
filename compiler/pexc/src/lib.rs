//! Pex command-line driver.
//!
//! Argument parsing and command handlers live here so they can be tested
//! without spawning the binary; `main.rs` only dispatches and prints.

pub mod args;
pub mod commands;

use std::sync::Once;

/// Environment variable switching the log output to an indented tree.
pub const LOG_TREE_VAR: &str = "PEX_LOG_TREE";

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Nothing is installed unless `RUST_LOG` is
/// set, e.g. `RUST_LOG=pex_eval=debug`. With `PEX_LOG_TREE=1` spans are
/// rendered as a tree, which helps when following nested `%{...}`
/// evaluation.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_err() {
            return;
        }
        let filter = EnvFilter::from_default_env();
        let tree = std::env::var(LOG_TREE_VAR).is_ok_and(|v| v == "1");
        if tree {
            tracing_subscriber::registry()
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_writer(std::io::stderr),
                )
                .with(filter)
                .init();
        } else {
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(std::io::stderr),
                )
                .with(filter)
                .init();
        }
    });
}
