//! respack - load resource packages in dependency order
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Packages are binary files (`*.rpk`) holding a TOML descriptor and a
//! tree of typed content. A package that names dependencies is held back
//! until every dependency has been loaded, in whatever order the files are
//! given on the command line.
//!
//! # Directory Layout
//!
//! ```text
//! ~/.respack/
//! └── config.toml   # usage mode, search paths, strict mode
//! ```

pub mod cmd;
pub mod config;
pub mod ui;

use clap::{Parser, Subcommand};
use respack_schema::UsageMode;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "respack")]
#[command(author, version, about = "respack - load resource packages in dependency order")]
pub struct Cli {
    /// Config file (default: $RESPACK_HOME/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// How loaded packages will be used: data-only or instance-class
    #[arg(long, global = true)]
    pub usage: Option<UsageMode>,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load package files and report what registered and what is still waiting
    Load {
        /// Package files or directories (default: search_paths from config)
        paths: Vec<PathBuf>,
        /// Fail if any package is still waiting for a dependency
        #[arg(long)]
        strict: bool,
    },
    /// Show the descriptor and content of a package file
    Inspect {
        /// Package file
        file: PathBuf,
    },
    /// Build a package file from a TOML manifest
    Pack {
        /// Manifest with name, dependencies and class_names
        manifest: PathBuf,
        /// Output package file
        #[arg(short, long)]
        output: PathBuf,
        /// Wrap the package in a zstd frame
        #[arg(long)]
        compress: bool,
    },
}
