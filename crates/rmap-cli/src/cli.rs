use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "rmap",
    about = "rmap: inspect and maintain a record store",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML file with host, port and database
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true)]
    pub host: Option<String>,

    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Database index
    #[arg(long, global = true)]
    pub db: Option<i64>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List record keys matching a glob pattern
    Keys(KeysArgs),
    /// Print every field of a record
    Show(ShowArgs),
    /// Delete a record
    Delete(DeleteArgs),
    /// Print the effective connection config
    Config,
}

#[derive(Args, Debug)]
pub struct KeysArgs {
    #[arg(default_value = "*")]
    pub pattern: String,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    pub key: String,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    pub key: String,
}
