//! Movers CLI binary.
//!
//! Ranks the best and worst S&P 500 price performers between two dates.

mod integration;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use integration::cache_manager::{open_cache, resolve_cache_path};
use integration::data_pipeline::{
    DEFAULT_CONCURRENCY, FetchConfig, PipelineError, fetch_price_series, validate_range,
};
use movers::universe::normalize_symbol;
use movers::{ConstituentDirectory, DEFAULT_LIMIT, GicsSector, Ranking, ReturnRanker};
use movers_data::{ConstituentSource, CsvConstituentSource, YahooQuoteProvider};
use movers_output::{ExportFormat, Exporter, RankingReport};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "movers")]
#[command(about = "Movers: top and bottom S&P 500 performers over a date range", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank constituents by price return between two trading days
    Rank(RankArgs),

    /// Show the constituent list
    Universe {
        /// Filter by GICS sector
        #[arg(long)]
        sector: Option<String>,

        /// List all sectors
        #[arg(long)]
        list_sectors: bool,

        /// Read constituents from a local CSV instead of the public list
        #[arg(long)]
        constituents: Option<PathBuf>,
    },

    /// Inspect or clear the quote cache
    Cache {
        /// Show cache statistics
        #[arg(long)]
        stats: bool,

        /// Delete all cached quotes
        #[arg(long)]
        clear: bool,

        /// Only clear quotes for this symbol
        #[arg(long, requires = "clear")]
        symbol: Option<String>,

        /// Cache database location
        #[arg(long)]
        cache_path: Option<PathBuf>,
    },
}

#[derive(Args)]
struct RankArgs {
    /// First trading day (YYYY-MM-DD)
    #[arg(long, default_value = "2024-08-08")]
    start: NaiveDate,

    /// Last trading day (YYYY-MM-DD)
    #[arg(long, default_value = "2024-08-09")]
    end: NaiveDate,

    /// Entries in each of the top and bottom lists
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    count: usize,

    /// Output format [default: from the --output extension, else text]
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Write the result to a file instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Read constituents from a local CSV instead of the public list
    #[arg(long)]
    constituents: Option<PathBuf>,

    /// Maximum number of concurrent price requests
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Disable caching (always fetch fresh data)
    #[arg(long)]
    no_cache: bool,

    /// Force refresh cached data
    #[arg(long)]
    refresh: bool,

    /// Cache database location
    #[arg(long)]
    cache_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Aligned text tables
    Text,
    /// Markdown tables
    Markdown,
    /// CSV rows tagged with list and rank
    Csv,
    /// Pretty-printed JSON
    Json,
}

impl OutputFormat {
    /// Formats written through the exporter.
    const fn export_format(self) -> Option<ExportFormat> {
        match self {
            Self::Csv => Some(ExportFormat::Csv),
            Self::Json => Some(ExportFormat::PrettyJson),
            Self::Text | Self::Markdown => None,
        }
    }

    /// Format implied by a file extension, for the exported formats.
    fn from_extension(ext: &str) -> Option<Self> {
        [Self::Csv, Self::Json].into_iter().find(|format| {
            format
                .export_format()
                .is_some_and(|e| e.extension().eq_ignore_ascii_case(ext))
        })
    }

    /// Pick the explicit format, or infer csv/json from the output file name.
    fn resolve(explicit: Option<Self>, output: Option<&Path>) -> Self {
        let inferred = || Self::from_extension(output?.extension()?.to_str()?);
        explicit.or_else(inferred).unwrap_or(Self::Text)
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("warn,movers=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,movers=info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), PipelineError> {
    match cli.command {
        Commands::Rank(args) => rank_performers(args).await?,
        Commands::Universe {
            sector,
            list_sectors,
            constituents,
        } => {
            if list_sectors {
                list_all_sectors();
            } else {
                show_universe(sector, constituents.as_deref()).await?;
            }
        }
        Commands::Cache {
            stats,
            clear,
            symbol,
            cache_path,
        } => manage_cache(stats, clear, symbol.as_deref(), cache_path.as_deref())?,
    }

    Ok(())
}

async fn load_directory(path: Option<&Path>) -> Result<ConstituentDirectory, PipelineError> {
    let source = match path {
        Some(path) => CsvConstituentSource::from_file(path),
        None => CsvConstituentSource::new()?,
    };

    eprint!("Loading constituents from {}...", source.describe());
    match source.fetch().await {
        Ok(directory) => {
            eprintln!(" ✓ ({} constituents)", directory.len());
            Ok(directory)
        }
        Err(e) => {
            eprintln!(" ✗");
            Err(e.into())
        }
    }
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("█▓░"));
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Fetching price data...");
    pb
}

async fn rank_performers(args: RankArgs) -> Result<(), PipelineError> {
    // Checked before any network access.
    validate_range(args.start, args.end)?;
    if args.count == 0 {
        return Err(PipelineError::InvalidArgument(
            "--count must be at least 1".to_string(),
        ));
    }

    let directory = load_directory(args.constituents.as_deref()).await?;
    let symbols = directory.symbols();

    let config = FetchConfig {
        use_cache: !args.no_cache,
        force_refresh: args.refresh,
        concurrency: args.concurrency,
    };

    let cache = if config.use_cache {
        let path = resolve_cache_path(args.cache_path.as_deref());
        match open_cache(&path) {
            Ok(cache) => {
                tracing::debug!(path = %path.display(), "using quote cache");
                Some(cache)
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "quote cache unavailable; continuing without it"
                );
                None
            }
        }
    } else {
        None
    };

    let provider = YahooQuoteProvider::new()?;
    let pb = progress_bar(symbols.len());

    let report = match fetch_price_series(
        &provider,
        &symbols,
        args.start,
        args.end,
        &config,
        cache.as_ref(),
        Some(&pb),
    )
    .await
    {
        Ok(report) => {
            pb.finish_with_message(format!(
                "Fetched {} stocks ({} cached, {} unavailable)",
                report.series.len(),
                report.from_cache,
                report.failures.len()
            ));
            report
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            return Err(e);
        }
    };

    let matrix = report.to_matrix();
    let ranking = ReturnRanker::new()
        .with_limit(args.count)
        .rank(&matrix, &directory, args.start, args.end)?;

    if ranking.is_empty() {
        tracing::warn!("no constituent had usable prices on both dates");
    }

    let format = OutputFormat::resolve(args.format, args.output.as_deref());
    match args.output {
        Some(path) => {
            write_output(&ranking, args.count, format, &path)?;
            eprintln!("Wrote results to {}", path.display());
        }
        None => print!("{}", render(&ranking, args.count, format)?),
    }

    Ok(())
}

fn write_output(
    ranking: &Ranking,
    count: usize,
    format: OutputFormat,
    path: &Path,
) -> Result<(), PipelineError> {
    match format.export_format() {
        Some(export) => ranking.export_to_file(path, export)?,
        None => std::fs::write(path, render(ranking, count, format)?)?,
    }
    Ok(())
}

fn render(
    ranking: &Ranking,
    count: usize,
    format: OutputFormat,
) -> Result<String, PipelineError> {
    let report = RankingReport::with_count(ranking, count);
    let rendered = match format {
        OutputFormat::Text => report.to_ascii_table(),
        OutputFormat::Markdown => report.to_markdown(),
        OutputFormat::Csv => ranking.export_to_string(ExportFormat::Csv)?,
        OutputFormat::Json => {
            let mut json = ranking.export_to_string(ExportFormat::PrettyJson)?;
            json.push('\n');
            json
        }
    };
    Ok(rendered)
}

async fn show_universe(
    sector_filter: Option<String>,
    constituents: Option<&Path>,
) -> Result<(), PipelineError> {
    let directory = load_directory(constituents).await?;

    println!("S&P 500 Universe");
    println!("================\n");

    if let Some(sector_name) = sector_filter {
        let sector: GicsSector = sector_name.parse().map_err(PipelineError::InvalidArgument)?;
        let members = directory.in_sector(sector);

        println!("Sector: {}", sector);
        println!("Constituents: {}\n", members.len());

        for member in members {
            println!("  {:<8} {:<40} {}", member.symbol, member.name, member.industry);
        }
    } else {
        let sector_counts = directory.sector_counts();
        let classified: usize = sector_counts.values().sum();

        println!("Total constituents: {}\n", directory.len());
        println!("Breakdown by sector:");

        for sector in GicsSector::ALL {
            let count = sector_counts.get(&sector).unwrap_or(&0);
            println!("  {:30} {:3} stocks", sector.name(), count);
        }
        if classified < directory.len() {
            println!("  {:30} {:3} stocks", "Unclassified", directory.len() - classified);
        }
    }

    Ok(())
}

fn list_all_sectors() {
    println!("GICS Sectors:");
    println!("=============\n");

    for sector in GicsSector::ALL {
        println!("{:2} - {}", sector.code(), sector.name());
    }
}

fn manage_cache(
    stats: bool,
    clear: bool,
    symbol: Option<&str>,
    cache_path: Option<&Path>,
) -> Result<(), PipelineError> {
    let path = resolve_cache_path(cache_path);
    let cache = open_cache(&path)?;

    println!("Cache location: {}", path.display());

    if clear {
        match symbol {
            Some(raw) => {
                let symbol = normalize_symbol(raw)?;
                cache.clear_symbol(&symbol)?;
                println!("Cleared cached quotes for {}.", symbol);
            }
            None => {
                cache.clear_all()?;
                println!("Cache cleared.");
            }
        }
        if !stats {
            return Ok(());
        }
    }

    let stats = cache.get_stats()?;
    println!(
        "Cached data: {} quotes for {} symbols",
        stats.total_quotes, stats.unique_symbols
    );
    if let (Some(first), Some(last)) = (stats.first_date, stats.last_date) {
        println!("Date span: {} to {}", first, last);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use movers::{Constituent, PriceSeries, ReturnRecord};
    use movers_data::frame::series_to_frame;
    use rstest::rstest;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, day).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_rank_defaults() {
        let cli = Cli::parse_from(["movers", "rank"]);
        let Commands::Rank(args) = cli.command else {
            panic!("expected rank command");
        };
        assert_eq!(args.start, d(8));
        assert_eq!(args.end, d(9));
        assert_eq!(args.count, DEFAULT_LIMIT);
        assert_eq!(args.format, None);
        assert_eq!(args.concurrency, DEFAULT_CONCURRENCY);
        assert!(!args.no_cache);
    }

    #[test]
    fn test_rank_rejects_bad_date() {
        assert!(Cli::try_parse_from(["movers", "rank", "--start", "08/08/2024"]).is_err());
    }

    fn sample_ranking() -> Ranking {
        let record = ReturnRecord::new(
            &Constituent::new("A", "Alpha Corp", "Energy", "Oil & Gas Drilling"),
            10.0,
        );
        Ranking {
            start: d(8),
            end: d(9),
            top: vec![record.clone()],
            bottom: vec![record],
        }
    }

    #[test]
    fn test_render_formats() {
        let ranking = sample_ranking();

        let text = render(&ranking, 1, OutputFormat::Text).unwrap();
        assert!(text.contains("Top 1 Performers from 2024-08-08 to 2024-08-09"));

        let markdown = render(&ranking, 1, OutputFormat::Markdown).unwrap();
        assert!(markdown.contains("## Bottom 1 Performers"));

        let csv = render(&ranking, 1, OutputFormat::Csv).unwrap();
        assert!(csv.starts_with("list,rank,symbol"));

        let json = render(&ranking, 1, OutputFormat::Json).unwrap();
        assert!(json.ends_with("}\n"));
    }

    #[rstest]
    #[case(None, Some("movers.csv"), OutputFormat::Csv)]
    #[case(None, Some("out/MOVERS.JSON"), OutputFormat::Json)]
    #[case(None, Some("movers.md"), OutputFormat::Text)]
    #[case(None, None, OutputFormat::Text)]
    #[case(Some(OutputFormat::Markdown), Some("movers.csv"), OutputFormat::Markdown)]
    fn test_output_format_resolution(
        #[case] explicit: Option<OutputFormat>,
        #[case] output: Option<&str>,
        #[case] expected: OutputFormat,
    ) {
        let resolved = OutputFormat::resolve(explicit, output.map(Path::new));
        assert_eq!(resolved, expected);
    }

    #[test]
    fn test_write_output_uses_exporter_for_csv() {
        let ranking = sample_ranking();
        let path = std::env::temp_dir().join("movers_bin_output_test.csv");

        write_output(&ranking, 1, OutputFormat::Csv, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(written, ranking.export_to_string(ExportFormat::Csv).unwrap());
        assert!(written.contains("top,1,A,Alpha Corp,"));
    }

    #[test]
    fn test_clear_single_symbol() {
        let name = format!("movers_clear_{}.db", process::id());
        let path = std::env::temp_dir().join(name);
        std::fs::remove_file(&path).ok();
        {
            let cache = open_cache(&path).unwrap();
            for symbol in ["AAPL", "BRK-B"] {
                let series = PriceSeries::from_points(symbol, [(d(8), 1.0), (d(9), 2.0)]);
                let frame = series_to_frame(&series).unwrap();
                cache.put_quotes(&frame, d(8), d(9)).unwrap();
            }
        }

        manage_cache(false, true, Some("brk.b"), Some(&path)).unwrap();

        let cache = open_cache(&path).unwrap();
        assert!(cache.has_quotes("AAPL", d(8), d(9)).unwrap());
        assert!(!cache.has_quotes("BRK-B", d(8), d(9)).unwrap());
        assert_eq!(cache.get_stats().unwrap().unique_symbols, 1);
        drop(cache);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_clear_symbol_requires_clear() {
        assert!(Cli::try_parse_from(["movers", "cache", "--symbol", "AAPL"]).is_err());
    }

    #[tokio::test]
    async fn test_rank_reversed_range_is_rejected() {
        let cli = Cli::parse_from([
            "movers",
            "rank",
            "--start",
            "2024-08-09",
            "--end",
            "2024-08-08",
            "--constituents",
            "/nonexistent/constituents.csv",
        ]);
        let Commands::Rank(args) = cli.command else {
            panic!("expected rank command");
        };

        // The missing constituent file is never touched.
        let result = rank_performers(args).await;
        assert!(matches!(
            result,
            Err(PipelineError::Rank(movers::RankError::InvalidRange { .. }))
        ));
    }
}
