use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "arkiv", about = "Inspect and maintain an Arkiv storage directory", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML storage configuration (backend, basePath)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage base directory; overrides the configured one and selects the disk backend
    #[arg(short, long, global = true)]
    pub base_path: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show record types and record counts
    Stats,
    /// Print a record as JSON
    Read(ReadArgs),
    /// Print a page of records as JSON
    List(ListArgs),
    /// Show links to and from a record
    Links(RecordArgs),
    /// Print the storage terms of a record
    Terms(RecordArgs),
    /// Delete a record
    Delete(RecordArgs),
    /// Store, fetch, or delete binary streams
    #[command(subcommand)]
    Blob(BlobCommand),
}

#[derive(Args)]
pub struct RecordArgs {
    pub record_type: String,
    pub id: String,
}

#[derive(Args)]
pub struct ReadArgs {
    pub record_type: String,
    pub id: String,
    /// Treat the type as abstract and search every implementing type
    #[arg(long = "abstract")]
    pub search_implementing: bool,
}

#[derive(Args)]
pub struct ListArgs {
    pub record_type: String,
    /// Equality condition KEY=VALUE; repeat to require several
    #[arg(short = 'w', long = "where", value_name = "KEY=VALUE")]
    pub conditions: Vec<String>,
    /// First position to return (1-based)
    #[arg(long)]
    pub from: Option<u64>,
    /// Last position to return (inclusive)
    #[arg(long)]
    pub to: Option<u64>,
}

#[derive(Args)]
pub struct BlobArgs {
    pub data_divider: String,
    pub record_type: String,
    pub id: String,
    pub representation: String,
}

#[derive(Subcommand)]
pub enum BlobCommand {
    /// Store a file as a stream
    Put {
        #[command(flatten)]
        blob: BlobArgs,
        file: PathBuf,
    },
    /// Write a stream to a file, or stdout
    Get {
        #[command(flatten)]
        blob: BlobArgs,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Delete a stream
    Rm {
        #[command(flatten)]
        blob: BlobArgs,
    },
}
