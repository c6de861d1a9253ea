use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use barscan::tools::{dataset_iter, dataset_root_from_env, load_image, load_input};
use barscan::{logger, Block, ExecutionMode, Preprocessing, ScanConfig, Scanner};
use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "barscan", version, about = "Multi-backend barcode and QR scanner")]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a single image and print the JSON report
    Scan {
        #[arg(long)]
        image: PathBuf,
        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// parallel or sequential
        #[arg(long)]
        mode: Option<ExecutionMode>,
        /// Block as decoder:preprocessing, repeatable; replaces configured Blocks
        #[arg(long = "block")]
        blocks: Vec<Block>,
        #[arg(long)]
        pretty: bool,
    },
    /// Scan every image under a directory as one batch
    Batch {
        #[arg(long)]
        root: Option<PathBuf>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Write the grayscale image a decoder would see
    Preprocess {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        method: Preprocessing,
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => logger::level_from_env(LevelFilter::Warn),
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if let Err(err) = logger::init_with_level(level) {
        eprintln!("failed to install logger: {err}");
    }

    let outcome = match cli.command {
        Command::Scan {
            image,
            config,
            mode,
            blocks,
            pretty,
        } => scan_cmd(&image, config.as_deref(), mode, blocks, pretty),
        Command::Batch { root, limit, config } => batch_cmd(root, limit, config.as_deref()),
        Command::Preprocess { image, method, out } => preprocess_cmd(&image, method, &out),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

type CmdResult = Result<(), Box<dyn std::error::Error>>;

fn load_config(path: Option<&Path>) -> Result<ScanConfig, barscan::ConfigError> {
    let config = match path {
        Some(path) => ScanConfig::from_path(path)?,
        None => ScanConfig::default(),
    };
    config.with_env_overrides()
}

fn scan_cmd(
    image: &Path,
    config: Option<&Path>,
    mode: Option<ExecutionMode>,
    blocks: Vec<Block>,
    pretty: bool,
) -> CmdResult {
    let mut config = load_config(config)?;
    if let Some(mode) = mode {
        config.mode = mode;
    }
    if !blocks.is_empty() {
        config.blocks = blocks;
    }

    let scanner = Scanner::with_config(config)?;
    let input = load_input(image)?;

    let start = Instant::now();
    let report = scanner.scan(&input)?;
    log::info!("{} scanned in {:.2?}", image.display(), start.elapsed());

    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(())
}

fn batch_cmd(root: Option<PathBuf>, limit: Option<usize>, config: Option<&Path>) -> CmdResult {
    let root = root.unwrap_or_else(dataset_root_from_env);
    let paths: Vec<_> = dataset_iter(&root, limit).collect();
    if paths.is_empty() {
        println!("No images found under {}", root.display());
        return Ok(());
    }

    let scanner = Scanner::with_config(load_config(config)?)?;
    let inputs = paths.iter().map(load_input).collect::<Result<Vec<_>, _>>()?;

    let start = Instant::now();
    let reports = scanner.scan_batch(&inputs)?;
    let elapsed = start.elapsed();

    let mut with_codes = 0usize;
    for (path, report) in paths.iter().zip(&reports) {
        if !report.detections.is_empty() {
            with_codes += 1;
        }
        let values: Vec<_> = report.detections.iter().map(|d| d.value.as_str()).collect();
        println!("{}: {} codes {:?}", path.display(), values.len(), values);
    }

    println!();
    println!("Images: {}", reports.len());
    println!(
        "With codes: {} ({:.2}%)",
        with_codes,
        with_codes as f64 / reports.len() as f64 * 100.0
    );
    println!(
        "Total: {:.2?}, avg {:.2} ms/image",
        elapsed,
        elapsed.as_secs_f64() * 1000.0 / reports.len() as f64
    );
    Ok(())
}

fn preprocess_cmd(image: &Path, method: Preprocessing, out: &Path) -> CmdResult {
    let source = load_image(image)?;
    let gray = method.transform(&source)?;
    gray.save(out)?;
    println!(
        "{} -> {} ({}, {}x{})",
        image.display(),
        out.display(),
        method,
        gray.width(),
        gray.height()
    );
    Ok(())
}
