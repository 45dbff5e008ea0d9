use clap::{Parser, Subcommand};
use healthkit_core::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "hkseries")]
#[command(about = "Per-workout time series from a health data export", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Worker threads (default: one per CPU)
    #[arg(long, global = true)]
    threads: Option<usize>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build series for every workout and write them out
    Build {
        /// Tag dump (JSON Lines) produced from export.xml
        #[arg(long)]
        input: PathBuf,

        /// Output directory (default from config)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Keep series entries that share a timestamp
        #[arg(long)]
        keep_duplicates: bool,

        /// Only use these sources for series (repeatable)
        #[arg(long = "source")]
        sources: Vec<String>,

        /// Group record types by substring containment
        #[arg(long)]
        substring_match: bool,
    },

    /// Load a tag dump and report what it contains
    Inspect {
        /// Tag dump (JSON Lines) produced from export.xml
        #[arg(long)]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    healthkit_core::logging::init(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if cli.threads.is_some() {
        config.pipeline.threads = cli.threads;
    }
    tracing::debug!("Pipeline config: {:?}", config.pipeline);

    match cli.command {
        Commands::Build {
            input,
            out_dir,
            keep_duplicates,
            sources,
            substring_match,
        } => {
            if keep_duplicates {
                config.pipeline.remove_duplicates = false;
            }
            if !sources.is_empty() {
                config.pipeline.sources = sources;
            }
            if substring_match {
                config.pipeline.substring_match = true;
            }
            let out_dir = out_dir.unwrap_or_else(|| config.output.out_dir.clone());
            cmd_build(&input, &out_dir, &config)
        }
        Commands::Inspect { input } => cmd_inspect(&input, &config),
    }
}

fn cmd_build(input: &Path, out_dir: &Path, config: &Config) -> Result<()> {
    let pool = config.pipeline.pool_config();
    let options = config.pipeline.series_options()?;
    let progress = LogProgress::default();

    let dump = read_tag_dump(input)?;
    let records = load_records(&dump.records, &pool, &progress)?;
    let workouts = load_workouts(&dump.workouts, &pool, &progress)?;

    let mut bundles = build_all_workout_series(&workouts, &records, &pool, &options, &progress)?;
    bundles.sort_by_key(|b| b.workout.start_date());

    std::fs::create_dir_all(out_dir)?;
    let mut rows = 0;
    for (index, bundle) in bundles.iter().enumerate() {
        let path = out_dir.join(export::series_file_name(index, &bundle.workout));
        rows += export::write_series_csv(bundle, &path)?;
    }

    let summary_path = out_dir.join("summary.json");
    export::write_summary_json(&export::summarize(&bundles), &summary_path)?;

    println!("✓ Built series for {} workouts", bundles.len());
    println!("  Records: {}", records.len());
    println!("  Series rows: {}", rows);
    println!("  Output: {}", out_dir.display());

    Ok(())
}

fn cmd_inspect(input: &Path, config: &Config) -> Result<()> {
    let pool = config.pipeline.pool_config();
    let progress = NoProgress;

    let dump = read_tag_dump(input)?;
    let records = load_records(&dump.records, &pool, &progress)?;
    let workouts = load_workouts(&dump.workouts, &pool, &progress)?;

    let mut types: BTreeMap<&str, usize> = BTreeMap::new();
    let mut sources: BTreeMap<&str, usize> = BTreeMap::new();
    for record in &records {
        *types.entry(record.rec_type()).or_default() += 1;
        *sources.entry(record.source_name()).or_default() += 1;
    }

    println!("Records: {}", records.len());
    println!("Workouts: {}", workouts.len());
    if dump.skipped > 0 {
        println!("Other tags: {}", dump.skipped);
    }

    println!();
    println!("Record types:");
    for (rec_type, count) in &types {
        println!("  {:<50} {}", rec_type, count);
    }

    println!();
    println!("Sources:");
    for (source, count) in &sources {
        println!("  {:<50} {}", source, count);
    }

    if let (Some(first), Some(last)) = (
        workouts.iter().map(|w| w.start_date()).min(),
        workouts.iter().map(|w| w.end_date()).max(),
    ) {
        println!();
        println!("Workouts span {} to {}", first.to_rfc3339(), last.to_rfc3339());
    }

    Ok(())
}
