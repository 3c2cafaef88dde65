//! Command-line driver for inspecting leaf frames.
//!
//! Usage:
//!   frame_cli --keys 10,20,30 find 25 --mode inclusive --policy lower
//!   frame_cli --keys 10,20,30,40,50 seek 25 --hint 0
//!   frame_cli --keys 3,1,2 dump
//!
//! Set `RUST_LOG=btree_frame=trace` to see slot-level events.

use std::path::PathBuf;
use std::process::exit;

use btree_frame::{
    BTreeFrame, FindTupleMode, FrameConfig, MultiComparator, NoExactMatchPolicy, OwnedTuple,
    Result, SlotPage,
};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "frame_cli", about = "Build a leaf frame from integer keys and search it")]
struct Cli {
    /// JSON frame configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Page size in bytes (overrides the configuration file)
    #[arg(long)]
    page_size: Option<usize>,

    /// Integer keys to insert, in insertion order
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    keys: Vec<i32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bounded binary search
    Find {
        #[arg(allow_hyphen_values = true)]
        key: i32,
        #[arg(long, value_enum, default_value_t = Mode::Exact)]
        mode: Mode,
        #[arg(long, value_enum, default_value_t = Policy::Higher)]
        policy: Policy,
    },
    /// Exponential search from a hint
    Seek {
        #[arg(allow_hyphen_values = true)]
        key: i32,
        #[arg(long, default_value_t = 0)]
        hint: usize,
    },
    /// Print the frame as JSON
    Dump,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Mode {
    Exact,
    Inclusive,
    Exclusive,
    ErrorIfExists,
}

impl From<Mode> for FindTupleMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Exact => FindTupleMode::Exact,
            Mode::Inclusive => FindTupleMode::Inclusive,
            Mode::Exclusive => FindTupleMode::Exclusive,
            Mode::ErrorIfExists => FindTupleMode::ExclusiveErrorIfExists,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Policy {
    Higher,
    Lower,
}

impl From<Policy> for NoExactMatchPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Higher => NoExactMatchPolicy::PreferHigherKey,
            Policy::Lower => NoExactMatchPolicy::PreferLowerKey,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => FrameConfig::load(path)?,
        None => FrameConfig::default(),
    };
    if let Some(size) = cli.page_size {
        config = config.page_size(size);
    }

    let cmp = MultiComparator::ints(1);
    let mut frame = BTreeFrame::new(&config)?;
    for &k in &cli.keys {
        frame.insert_sorted(&OwnedTuple::new().with_i32(k), &cmp)?;
    }
    tracing::debug!(tuples = frame.tuple_count(), free = frame.free_space(), "frame built");

    match cli.command {
        Command::Find { key, mode, policy } => {
            let result = frame.find(&OwnedTuple::new().with_i32(key), &cmp, mode.into(), policy.into())?;
            println!("{:?} (raw {})", result, result.to_raw());
        }
        Command::Seek { key, hint } => {
            let result = frame.find_from_hint(&OwnedTuple::new().with_i32(key), &cmp, hint)?;
            println!("{:?} (signed {})", result, result.to_signed());
        }
        Command::Dump => {
            println!("{}", frame.dump_json()?);
        }
    }

    Ok(())
}

fn main() {
    init_tracing();
    if let Err(e) = run(Cli::parse()) {
        eprintln!("ERROR: {}", e);
        exit(1);
    }
}
