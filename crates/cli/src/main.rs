use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use spojka::graph::{GraphBuilder, Profile};
use spojka::gtfs::Gtfs;
use spojka::report;
use spojka::tt::{BatchConfig, collect_tt_files, decode_batch};
use std::{path::PathBuf, process, time::Duration};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "spojka-cli",
    about = "Decode TT timetable files and build transit travel-time graphs"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode one TT file or every *.tt file in a directory.
    DecodeTt {
        /// A .tt file or a directory containing them.
        path: PathBuf,
        /// Output directory for per-file JSON and stats.json.
        #[arg(long, default_value = "decoded_tt")]
        out: PathBuf,
        /// Decode worker threads; 0 picks one per core.
        #[arg(long, default_value_t = 0)]
        workers: usize,
        /// Per-file decode budget in seconds.
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
    /// Build the aggregated travel-time graph from a GTFS feed.
    BuildGraph {
        /// GTFS directory or .zip archive.
        #[arg(long)]
        gtfs: PathBuf,
        /// Service slice, e.g. monday:07-08.
        #[arg(long, default_value = "monday:07-08")]
        profile: Profile,
        /// Output graph JSON path.
        #[arg(long)]
        out: PathBuf,
    },
    /// Print aggregate statistics for a decode output directory.
    Report {
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let cli = Cli::parse();

    match cli.command {
        Command::DecodeTt {
            path,
            out,
            workers,
            timeout_secs,
        } => decode_tt(path, out, workers, timeout_secs),
        Command::BuildGraph { gtfs, profile, out } => build_graph(gtfs, profile, out),
        Command::Report { dir } => {
            let report = report::load(&dir)
                .with_context(|| format!("failed reading report from {}", dir.display()))?;
            print!("{}", report.render());
            Ok(())
        }
    }
}

fn decode_tt(path: PathBuf, out: PathBuf, workers: usize, timeout_secs: u64) -> Result<()> {
    let files = collect_tt_files(&path)
        .with_context(|| format!("failed listing {}", path.display()))?;
    if files.is_empty() {
        bail!("no .tt files found in {}", path.display());
    }
    info!(files = files.len(), out = %out.display(), "decoding");

    let mut config = BatchConfig::new(&out);
    config.workers = workers;
    config.timeout = Duration::from_secs(timeout_secs);

    let result = decode_batch(&files, &config).context("batch decode failed")?;
    for report in &result.reports {
        println!("{}", report.status_line());
    }
    println!(
        "{}/{} succeeded ({}%), {} degraded, {} failed",
        result.stats.succeeded,
        result.stats.total,
        result.stats.success_rate(),
        result.stats.degraded,
        result.stats.failed,
    );

    if result.stats.succeeded == 0 {
        process::exit(1);
    }
    Ok(())
}

fn build_graph(gtfs_path: PathBuf, profile: Profile, out: PathBuf) -> Result<()> {
    let mut gtfs = Gtfs::new()
        .from_path(&gtfs_path)
        .with_context(|| format!("failed opening GTFS source {}", gtfs_path.display()))?;

    let graph = GraphBuilder::new(profile)
        .with_source(gtfs_path.display().to_string())
        .build(&mut gtfs)
        .context("graph build failed")?;
    graph
        .write(&out)
        .with_context(|| format!("failed writing {}", out.display()))?;

    println!(
        "{}: {} stops, {} edges, {} routes with headway",
        out.display(),
        graph.metadata.parent_stations,
        graph.metadata.directed_edges,
        graph.metadata.routes_with_headway,
    );
    Ok(())
}
