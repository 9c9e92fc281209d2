//! cli
//!
//! Command-line interface layer for the `prosc` binary.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Build a shell over a directory transport and delegate to it
//! - Print the resulting tree for inspection
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap, boots a
//! [`crate::shell::Shell`], and renders the outcome; all application
//! behavior lives in the shell.

pub mod args;

pub use args::{Cli, Command};

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::dom::{Node, NodeSpec};
use crate::shell::Shell;
use crate::transport::DirTransport;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run {
            document,
            root,
            navigate,
            json,
        } => {
            let text = tokio::fs::read_to_string(&document)
                .await
                .with_context(|| format!("failed to read '{}'", document.display()))?;
            let spec = NodeSpec::from_json(&text)
                .with_context(|| format!("failed to parse '{}'", document.display()))?;
            let app_root = Node::from_spec(&spec);

            let name = app_root
                .attribute("name")
                .or_else(|| {
                    document
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                })
                .unwrap_or_else(|| "app".to_string());

            // Documents referenced by the app resolve against the document's
            // directory unless an explicit root is given.
            let doc_dir = root.or_else(|| document.parent().map(|p| p.to_path_buf()));
            let transport = DirTransport::new(doc_dir.unwrap_or_default());

            let shell = Shell::builder(name, Arc::new(transport))
                .root(app_root)
                .build();
            shell
                .initialize()
                .await
                .context("application bootstrap failed")?;

            if let Some(page) = navigate {
                shell
                    .navigate(page.as_str())
                    .await
                    .with_context(|| format!("failed to navigate to '{page}'"))?;
            }

            if json {
                println!("{}", shell.root().to_spec().to_json());
            } else {
                print!("{}", shell.root());
            }
            Ok(())
        }
    }
}
