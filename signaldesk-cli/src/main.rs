//! SignalDesk CLI — scan a watch-list and print trading signals.
//!
//! Commands:
//! - `scan` — evaluate every symbol of a watch-list and print the results
//! - `preset` — print a named preset as TOML
//! - `check-config` — validate an engine config file

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use signaldesk_core::data::{
    CircuitBreaker, CsvProvider, DataProvider, DataSource, SymbolMapping, SyntheticProvider,
    YahooProvider,
};
use signaldesk_core::domain::{parse_watchlist, WatchlistFormat};
use signaldesk_core::{EngineConfig, Preset, SignalResult};
use signaldesk_runner::{
    write_csv, write_json, RankBy, ScanOptions, ScanReport, ScanStatus, Scanner,
};

#[derive(Parser)]
#[command(
    name = "signaldesk",
    about = "SignalDesk CLI — technical signals for a stock watch-list"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a watch-list and print one signal per symbol.
    Scan {
        /// Watch-list text: `code[|name[|sector]]` entries separated by commas or newlines.
        #[arg(long)]
        watchlist: Option<String>,

        /// Read the watch-list from a file instead.
        #[arg(long, conflicts_with = "watchlist")]
        watchlist_file: Option<PathBuf>,

        /// Path to a TOML engine config.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Named preset: swing, trend, momentum, support. Defaults to swing.
        #[arg(long, conflicts_with = "config")]
        preset: Option<String>,

        /// Bar source: yahoo, csv, synthetic.
        #[arg(long, default_value = "yahoo")]
        source: String,

        /// Directory of `<code>.csv` files for `--source csv`.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Benchmark code for relative strength.
        #[arg(long)]
        benchmark: Option<String>,

        /// Result order: input, score, relative.
        #[arg(long, default_value = "input")]
        rank: String,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Write output to a file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Bars requested per symbol.
        #[arg(long, default_value_t = 120)]
        lookback: usize,

        /// Per-symbol fetch deadline in seconds.
        #[arg(long, default_value_t = 10)]
        timeout_secs: u64,

        /// Session cache time-to-live in seconds.
        #[arg(long, default_value_t = 300)]
        ttl_secs: u64,

        /// Accept any ticker, not only six-digit exchange codes.
        #[arg(long, default_value_t = false)]
        any_symbol: bool,

        /// Evaluate symbols one at a time.
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },
    /// Print a named preset as TOML.
    Preset {
        /// swing, trend, momentum or support.
        name: String,
    },
    /// Validate an engine config file.
    CheckConfig { file: PathBuf },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("signaldesk=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            watchlist,
            watchlist_file,
            config,
            preset,
            source,
            data_dir,
            benchmark,
            rank,
            format,
            output,
            lookback,
            timeout_secs,
            ttl_secs,
            any_symbol,
            sequential,
        } => {
            let text = match (watchlist, watchlist_file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading watch-list {}", path.display()))?,
                (None, None) => bail!("one of --watchlist or --watchlist-file is required"),
            };
            let format_rules = if any_symbol {
                WatchlistFormat::any_symbol()
            } else {
                WatchlistFormat::default()
            };
            let entries = parse_watchlist(&text, &format_rules);
            if entries.is_empty() {
                bail!("watch-list contains no valid codes");
            }

            let engine_config = load_config(config.as_deref(), preset.as_deref())?;
            let rank: RankBy = rank.parse().map_err(anyhow::Error::msg)?;
            let source: DataSource = source.parse()?;
            let provider = build_provider(source, &data_dir, timeout_secs)?;
            let options = ScanOptions {
                lookback,
                timeout_secs,
                cache_ttl_secs: ttl_secs,
                parallel: !sequential,
                benchmark,
            };

            let scanner = Scanner::new(engine_config, provider, options)?;
            let report = scanner.scan(&entries, None)?;
            let status = report.status();

            match output {
                Some(path) => {
                    let file = std::fs::File::create(&path)
                        .with_context(|| format!("creating {}", path.display()))?;
                    render(&report, rank, format, std::io::BufWriter::new(file))?;
                    tracing::info!(path = %path.display(), "report written");
                }
                None => render(&report, rank, format, std::io::stdout().lock())?,
            }

            if status == ScanStatus::NoUsableResults {
                eprintln!("WARNING: no symbol produced a usable result");
                std::process::exit(2);
            }
            Ok(())
        }
        Commands::Preset { name } => {
            let preset: Preset = name.parse()?;
            print!("{}", preset.to_config().to_toml()?);
            Ok(())
        }
        Commands::CheckConfig { file } => {
            let config = EngineConfig::from_file(&file)?;
            println!(
                "OK: {} ({} factors, fingerprint {})",
                file.display(),
                config.factors.len(),
                config.fingerprint()
            );
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>, preset: Option<&str>) -> Result<EngineConfig> {
    match (path, preset) {
        (Some(path), _) => Ok(EngineConfig::from_file(path)?),
        (None, Some(name)) => Ok(name.parse::<Preset>()?.to_config()),
        (None, None) => Ok(Preset::Swing.to_config()),
    }
}

fn build_provider(
    source: DataSource,
    data_dir: &Path,
    timeout_secs: u64,
) -> Result<Arc<dyn DataProvider>> {
    let provider: Arc<dyn DataProvider> = match source {
        DataSource::Yahoo => {
            let breaker = Arc::new(CircuitBreaker::default_provider());
            let yahoo = YahooProvider::new(breaker, Duration::from_secs(timeout_secs))?
                .with_mapping(SymbolMapping::AShare);
            Arc::new(yahoo)
        }
        DataSource::Csv => {
            let csv = CsvProvider::new(data_dir);
            if !csv.is_available() {
                bail!("data directory does not exist: {}", data_dir.display());
            }
            Arc::new(csv)
        }
        DataSource::Synthetic => {
            eprintln!("WARNING: using SYNTHETIC data; results are not market signals");
            Arc::new(SyntheticProvider::ending_today())
        }
    };
    Ok(provider)
}

fn render<W: Write>(
    report: &ScanReport,
    rank: RankBy,
    format: OutputFormat,
    mut out: W,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            write_json(report, &mut out)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => write_csv(rank.apply(report), &mut out)?,
        OutputFormat::Table => print_table(report, rank, &mut out)?,
    }
    out.flush()?;
    Ok(())
}

fn fmt_opt(value: Option<f64>, scale: f64, suffix: &str) -> String {
    match value {
        Some(v) => format!("{:.2}{suffix}", v * scale),
        None => "-".into(),
    }
}

fn print_table<W: Write>(report: &ScanReport, rank: RankBy, out: &mut W) -> Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "=== Scan Result ({} of {} symbols) ===",
        report.results.len(),
        report.requested
    )?;
    if let Some(bench) = &report.benchmark {
        writeln!(
            out,
            "Benchmark:      {} {}",
            bench.symbol,
            fmt_opt(bench.period_return, 100.0, "%")
        )?;
    }
    writeln!(out, "Ranking:        {rank}")?;
    writeln!(out, "Config:         {}", report.config_fingerprint)?;
    writeln!(out)?;
    writeln!(
        out,
        "{:<8} {:<14} {:>10} {:>8} {:>8} {:>6}  {:<16} {:>10}  Tags",
        "Symbol", "Name", "Price", "Chg%", "Rel%", "Score", "Recommendation", "Stop"
    )?;
    writeln!(out, "{}", "-".repeat(100))?;

    for r in rank.apply(report) {
        print_row(r, out)?;
    }

    if !report.excluded.is_empty() {
        writeln!(out)?;
        writeln!(out, "--- Excluded ---")?;
        for ex in &report.excluded {
            writeln!(out, "{:<8} {:<14} {}", ex.symbol, ex.name, ex.reason)?;
        }
    }
    if !report.skipped.is_empty() {
        writeln!(out, "Skipped: {}", report.skipped.join(", "))?;
    }
    writeln!(out)?;
    Ok(())
}

fn print_row<W: Write>(r: &SignalResult, out: &mut W) -> Result<()> {
    // A breach is shown against the stop that was in force.
    let stop = match (r.active_stop, r.stop_loss) {
        (Some(active), _) if r.stop_breached => format!("{active:.2}!"),
        (_, Some(stop)) => format!("{stop:.2}"),
        _ => "-".into(),
    };
    let name: String = r.name.chars().take(14).collect();
    writeln!(
        out,
        "{:<8} {:<14} {:>10.2} {:>8} {:>8} {:>6}  {:<16} {:>10}  {}",
        r.symbol,
        name,
        r.last_price,
        fmt_opt(r.change_pct, 1.0, ""),
        fmt_opt(r.relative_return.or(r.period_return), 100.0, ""),
        r.score,
        r.recommendation.label(),
        stop,
        r.tags().join(", ")
    )?;
    Ok(())
}
