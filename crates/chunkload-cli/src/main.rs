mod constructor;
mod errors;
mod logging;
mod parser;
mod runner;
mod writer;

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};

/// Output format for load results
#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    /// Print results to standard output (human-readable)
    Stdout,
    /// Output results in JSON format
    Json,
}

/// Policy for chunk files left over from an earlier split
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OnExisting {
    /// Delete stale chunks of the same source first
    Replace,
    /// Stop without writing anything
    Fail,
}

#[derive(ClapArgs, Debug, Default)]
struct SplitArgs {
    /// Source file to split
    #[arg(long, value_name = "FILE")]
    source: Option<String>,

    /// Directory receiving the chunk files
    #[arg(long, value_name = "DIR")]
    dest: Option<String>,

    /// Maximum number of data lines per chunk
    #[arg(long, value_name = "N")]
    lines: Option<usize>,

    /// What to do with chunks left by a previous split
    #[arg(long, value_enum)]
    on_existing: Option<OnExisting>,

    /// Do not write the JSON manifest next to the chunks
    #[arg(long)]
    no_manifest: bool,
}

#[derive(ClapArgs, Debug, Default)]
struct LoadArgs {
    /// Directory holding the chunk files
    #[arg(long, value_name = "DIR")]
    dir: Option<String>,

    /// Size of the worker pool
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Rows per Arrow decode batch
    #[arg(long, value_name = "N")]
    batch_size: Option<usize>,

    /// Fail on the first malformed row instead of skipping it
    #[arg(long)]
    strict: bool,

    /// Keep loading when a chunk fails and report it at the end
    #[arg(long)]
    keep_going: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split a large file into chunk files
    Split(SplitArgs),
    /// Load every chunk file of a directory in parallel
    Load(LoadArgs),
    /// Split, then load the resulting chunks
    Run {
        #[command(flatten)]
        split: SplitArgs,
        #[command(flatten)]
        load: LoadArgs,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Split(_) => "split",
            Command::Load(_) => "load",
            Command::Run { .. } => "run",
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "chunkload",
    version,
    about = "chunkload - split large CSV files and load the chunks in parallel",
    long_about = "chunkload splits a large delimited file into fixed-size chunk files, each \
                  carrying the original header, and loads a directory of chunks into a single \
                  in-memory Arrow table using a fixed-size worker pool. It reports the load time \
                  and the memory used by every column.\n\n\
                  Example usage:\n  \
                  chunkload --config lab.toml run\n  \
                  chunkload split --source data.csv --dest chunks --lines 1000000\n  \
                  chunkload load --dir chunks --workers 16"
)]
struct Args {
    /// Path to a TOML configuration file; command-line flags take precedence
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Output format for the report
    #[arg(short, long, value_enum, default_value = "stdout", global = true)]
    output: OutputFormat,

    /// Where to write the JSON report (file or directory); stdout if omitted
    #[arg(long, value_name = "PATH", global = true)]
    report_path: Option<PathBuf>,

    /// Enable debug mode with detailed error chains
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let args = Args::parse();
    let debug = args.debug;
    logging::init(debug);

    match runner::run(args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(err) => {
            if debug || std::env::var("RUST_BACKTRACE").is_ok() {
                eprintln!("Error: {:?}", err);
            } else {
                eprintln!("Error: {:#}", err);
                eprintln!("\nHint: Run with --debug flag for detailed error chains");
            }
            std::process::exit(1);
        }
    }
}
