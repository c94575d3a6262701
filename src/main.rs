use anyhow::anyhow;
use anyhow::bail;
use anyhow::Context as _;
use anyhow::Result;
use clap::Parser;
use data_sweeper::cleaner::deduplicate;
use data_sweeper::cleaner::impute_missing;
use data_sweeper::encode;
use data_sweeper::projector::project;
use data_sweeper::FileSession;
use data_sweeper::SweeperConfig;
use data_sweeper::TableFormat;
use data_sweeper::Upload;
use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "data-sweeper", version, about = "Clean and convert CSV and Excel files")]
struct Cli {
    /// Input files (.csv or .xlsx)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Remove rows that duplicate an earlier row
    #[arg(long)]
    dedupe: bool,

    /// Fill missing numeric values with the column mean
    #[arg(long)]
    impute: bool,

    /// Columns to keep, in output order (comma separated)
    #[arg(long, value_delimiter = ',')]
    columns: Option<Vec<String>>,

    /// Output format: csv or xlsx
    #[arg(long, default_value = "csv")]
    to: TableFormat,

    /// Directory the converted files are written to
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Print the first rows of each cleaned table (defaults to the configured row count)
    #[arg(long, num_args = 0..=1)]
    preview: Option<Option<usize>>,

    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = SweeperConfig::load_or_default(cli.config.as_deref()).context("Failed to load configuration")?;
    init_logging(&config.logging.level)?;

    let failures = run(&cli, &config)?;
    if failures > 0 {
        tracing::warn!(failed = failures, total = cli.files.len(), "some files were not converted");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Converts every input file and returns how many of them failed.
fn run(cli: &Cli, config: &SweeperConfig) -> Result<usize> {
    let names = input_names(&cli.files)?;
    std::fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("Failed to create output directory '{}'", cli.out_dir.display()))?;

    let mut session = FileSession::new();
    let mut failures = 0usize;
    for (path, name) in cli.files.iter().zip(names) {
        match process_file(&mut session, path, name, cli, config) {
            Ok(output) => println!("{} -> {}", path.display(), output.display()),
            Err(error) => {
                failures += 1;
                tracing::error!(file = %path.display(), "{error:#}");
            }
        }
    }
    Ok(failures)
}

/// Returns the file name of each input.
/// Session entries and outputs are keyed by file name, so names must be distinct.
fn input_names(files: &[PathBuf]) -> Result<Vec<&str>> {
    let mut sources = HashMap::<&str, &Path>::with_capacity(files.len());
    let mut names = Vec::with_capacity(files.len());
    for path in files {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| anyhow!("Invalid file name '{}'", path.display()))?;
        if let Some(first) = sources.insert(name, path) {
            bail!("'{}' and '{}' share the file name '{name}'", first.display(), path.display());
        }
        names.push(name);
    }
    Ok(names)
}

fn init_logging(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).with_context(|| format!("Invalid log level '{level}'"))?,
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    Ok(())
}

/// Runs the requested operations on one file and writes the converted output.
fn process_file(
    session: &mut FileSession,
    path: &Path,
    name: &str,
    cli: &Cli,
    config: &SweeperConfig,
) -> Result<PathBuf> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read '{}'", path.display()))?;
    let upload = Upload::new(name, bytes);
    let identity = upload.identity();

    let table = session.open(&upload, &config.decode).with_context(|| format!("Failed to decode '{name}'"))?;
    println!(
        "{}: {} rows x {} columns ({:.1} KiB)",
        name,
        table.row_count(),
        table.column_count(),
        upload.size_kib()
    );

    if cli.dedupe {
        session.update(&identity, deduplicate)?;
    }
    if cli.impute {
        session.update(&identity, impute_missing)?;
    }
    if let Some(columns) = &cli.columns {
        session.apply(&identity, |table| project(table, columns))?;
    }

    let table = session
        .get(&identity)
        .ok_or_else(|| anyhow!("'{name}' is no longer in the session"))?;
    if let Some(rows) = cli.preview {
        print!("{}", table.preview(rows.unwrap_or(config.preview.rows)));
    }

    let encoded = encode(table, cli.to, &config.encode).with_context(|| format!("Failed to encode '{name}'"))?;
    let output = cli.out_dir.join(identity.download_name(cli.to));
    if is_same_file(path, &output) {
        bail!("Refusing to overwrite input file '{}'", path.display());
    }
    std::fs::write(&output, &encoded.bytes).with_context(|| format!("Failed to write '{}'", output.display()))?;
    tracing::info!(file = %output.display(), media_type = encoded.media_type, "wrote converted file");
    Ok(output)
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
