use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Result, bail};
use clap::Parser;
use log::LevelFilter;

use mailthreads::{ArchiveDir, Config, EmlWriter, JsonAggregates, NullSink, RecordSink};

#[derive(Parser, Debug)]
#[command(
    name = "mailthreads",
    version,
    about = "Split mailing-list text archives into emails and build reply thread graphs"
)]
struct Args {
    /// Configuration file (defaults to <config dir>/mailthreads/config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory containing <year>-<Month>.txt archives
    #[arg(long, value_name = "DIR")]
    archive_root: Option<String>,

    /// Output directory for .eml files and thread JSON
    #[arg(short, long, value_name = "DIR")]
    output: Option<String>,

    #[arg(long)]
    from_year: Option<u16>,

    #[arg(long)]
    to_year: Option<u16>,

    /// Derive the year range from archive files found under the archive root
    #[arg(long)]
    discover: bool,

    /// Only build thread statistics; do not write .eml files
    #[arg(long)]
    no_emails: bool,

    /// Process one year at a time
    #[arg(long)]
    sequential: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.as_str()))
        .format_timestamp(None)
        .init();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    if let Some(root) = args.archive_root {
        config.archive_root = root;
    }
    if let Some(output) = args.output {
        config.output_dir = output;
    }
    if let Some(year) = args.from_year {
        config.start_year = year;
    }
    if let Some(year) = args.to_year {
        config.end_year = year;
    }
    if args.no_emails {
        config.write_emails = false;
    }
    if args.sequential {
        config.parallel = false;
    }

    let archives = ArchiveDir::new(config.archive_root());
    if !archives.root().is_dir() {
        bail!("Archive directory not found: {}", archives.root().display());
    }

    if args.discover {
        let units = archives.discover();
        match (units.first(), units.last()) {
            (Some(&(first, _)), Some(&(last, _))) => {
                log::info!("found {} archives from {first} to {last}", units.len());
                config.start_year = first;
                config.end_year = last;
            }
            _ => bail!("No <year>-<Month>.txt archives under {}", archives.root().display()),
        }
    }

    if config.start_year > config.end_year {
        bail!(
            "Empty year range: {} > {}",
            config.start_year,
            config.end_year
        );
    }

    let output_dir = config.output_dir();
    let eml_writer = EmlWriter::new(&output_dir);
    let records: &dyn RecordSink = if config.write_emails {
        &eml_writer
    } else {
        &NullSink
    };
    let mut aggregates = JsonAggregates::new(&output_dir);

    let start = Instant::now();
    let summaries = mailthreads::run(
        &archives,
        config.years(),
        records,
        &mut aggregates,
        config.parallel,
    )?;

    let threads: usize = summaries.iter().map(|s| s.thread_count()).sum();
    let replies: u64 = summaries.iter().map(|s| s.reply_count()).sum();
    println!(
        "Processed {} years in {:?}: {} threads, {} replies",
        summaries.len(),
        start.elapsed(),
        threads,
        replies
    );

    Ok(())
}
