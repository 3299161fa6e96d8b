//! CLI argument definitions for the Garrison binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Garrison fleet account configuration kernel
#[derive(Parser, Debug)]
#[command(name = "garrison")]
#[command(about = "Garrison: validate and manage fleet account configuration")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the db directory, resolve every host and report problems
    Check(CheckArgs),
    /// Re-save the db directory, archiving the previous generation
    Save(SaveArgs),
}

/// Arguments for the check command
#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Db directory holding users.json, groups.json, includes/ and configs/
    #[arg(short, long, env = "GARRISON_DB")]
    pub db_dir: Option<PathBuf>,

    /// Acting identity (defaults to $USER)
    #[arg(short, long, env = "USER")]
    pub user: String,

    /// Print every host, not just hosts with problems
    #[arg(short, long)]
    pub verbose: bool,
}

/// Arguments for the save command
#[derive(clap::Args, Debug)]
pub struct SaveArgs {
    /// Db directory holding users.json, groups.json, includes/ and configs/
    #[arg(short, long, env = "GARRISON_DB")]
    pub db_dir: Option<PathBuf>,

    /// Acting identity (defaults to $USER)
    #[arg(short, long, env = "USER")]
    pub user: String,
}
