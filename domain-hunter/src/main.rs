//! Domain Hunter CLI Application
//!
//! A command-line interface for tracking domain registration, registrar and
//! expiry. Lookups cascade through RDAP, WHOIS proxies and DNS; results are
//! kept in a local JSON cache that the reporting views read from.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use domain_hunter_lib::{
    get_all_known_tlds, load_env_config, parse_duration_string, ConfigManager, DomainHunter,
    DomainRecord, RegistryDirectory, ResolveConfig,
};
use std::path::{Path, PathBuf};
use std::process;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Cache location used when neither flags, environment nor config name one.
const DEFAULT_CACHE_FILE: &str = "data/domains.json";

/// CLI arguments for domain-hunter
#[derive(Parser, Debug)]
#[command(name = "domain-hunter")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Track domain registration, registrar and expiry via RDAP, WHOIS and DNS")]
#[command(
    long_about = "Track domain registration, registrar and expiry.\n\nEach domain is resolved through RDAP first, JSON WHOIS proxies second and a DNS probe last. Results are cached for 24 hours in a local JSON file, which the --stats, --expiring and --list views report on."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Domain names to look up (or to forget with --forget)
    #[arg(value_name = "DOMAINS", help_heading = "Domain Selection")]
    pub domains: Vec<String>,

    /// Input file with domains (one per line, # starts a comment)
    #[arg(
        short = 'f',
        long = "file",
        value_name = "FILE",
        help_heading = "Domain Selection"
    )]
    pub file: Option<String>,

    /// Output results in JSON format
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Output results in CSV format
    #[arg(long = "csv", help_heading = "Output Format")]
    pub csv: bool,

    /// Show cached domains expiring within DAYS days
    #[arg(long = "expiring", value_name = "DAYS", help_heading = "Reports")]
    pub expiring: Option<u32>,

    /// Show statistics over the cached domains
    #[arg(long = "stats", help_heading = "Reports")]
    pub stats: bool,

    /// List every cached domain
    #[arg(long = "list", help_heading = "Reports")]
    pub list: bool,

    /// List TLDs with a known registry RDAP endpoint
    #[arg(long = "list-tlds", help_heading = "Reports")]
    pub list_tlds: bool,

    /// Remove the given domains from the cache
    #[arg(long = "forget", help_heading = "Cache")]
    pub forget: bool,

    /// Remove every cached domain
    #[arg(long = "clear-cache", help_heading = "Cache")]
    pub clear_cache: bool,

    /// Write every cached domain to FILE as JSON ("-" for stdout)
    #[arg(long = "export", value_name = "FILE", help_heading = "Cache")]
    pub export: Option<String>,

    /// Merge the domains of an exported FILE into the cache
    #[arg(long = "import", value_name = "FILE", help_heading = "Cache")]
    pub import: Option<String>,

    /// Cache file location (default: data/domains.json)
    #[arg(long = "cache-file", value_name = "FILE", help_heading = "Cache")]
    pub cache_file: Option<String>,

    /// Disable the WHOIS proxy fallback
    #[arg(long = "no-whois", help_heading = "Protocol")]
    pub no_whois: bool,

    /// Timeout for RDAP and WHOIS requests (e.g. "10s", "500ms")
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Protocol")]
    pub timeout: Option<String>,

    /// Delay between upstream lookups in milliseconds (default: 500)
    #[arg(long = "pacing-ms", value_name = "MS", help_heading = "Protocol")]
    pub pacing_ms: Option<u64>,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Show detailed debug information and error messages
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

impl Args {
    /// Whether a report or cache command was requested instead of lookups.
    fn report_mode(&self) -> bool {
        self.expiring.is_some()
            || self.stats
            || self.list
            || self.list_tlds
            || self.clear_cache
            || self.export.is_some()
            || self.import.is_some()
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    init_logging(&args);
    debug!(version = env!("CARGO_PKG_VERSION"), "domain-hunter starting");

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// `RUST_LOG` wins; otherwise `--debug`, `--verbose` or warnings only.
/// Logs go to stderr so stdout stays machine-readable.
fn init_logging(args: &Args) {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if args.debug => EnvFilter::new("debug"),
        Err(_) if args.verbose => EnvFilter::new("info"),
        Err(_) => EnvFilter::new("warn"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    if args.json && args.csv {
        return Err("Cannot specify multiple output formats (--json, --csv)".to_string());
    }

    let reports = [
        args.expiring.is_some(),
        args.stats,
        args.list,
        args.list_tlds,
        args.clear_cache,
        args.forget,
        args.export.is_some(),
        args.import.is_some(),
    ]
    .iter()
    .filter(|&&x| x)
    .count();
    if reports > 1 {
        return Err(
            "Use only one of: --expiring, --stats, --list, --list-tlds, --forget, --clear-cache, --export, --import"
                .to_string(),
        );
    }

    let has_input = !args.domains.is_empty() || args.file.is_some();

    if args.report_mode() && has_input {
        return Err("Report and cache commands do not take domain names".to_string());
    }

    if args.forget && !has_input {
        return Err("--forget needs the domain names to remove".to_string());
    }

    if !args.report_mode() && !has_input {
        return Err(
            "You must specify domain names, a file with --file, or a report such as --stats"
                .to_string(),
        );
    }

    if let Some(timeout) = &args.timeout {
        match parse_duration_string(timeout) {
            Some(duration) if !duration.is_zero() => {}
            _ => {
                return Err(format!(
                    "Invalid timeout '{}'. Use format like '500ms', '5s', '2m'",
                    timeout
                ))
            }
        }
    }

    Ok(())
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(&args)?;

    if args.list_tlds {
        let tlds = if config.rdap_overrides.is_empty() {
            get_all_known_tlds()
        } else {
            RegistryDirectory::with_overrides(&config.rdap_overrides).known_tlds()
        };
        return display_tlds(&tlds, &args);
    }

    let hunter = DomainHunter::from_config(&config).await?;

    if args.clear_cache {
        let removed = hunter.clear().await?;
        ui::print_notice(&format!("Removed {} cached domain(s)", removed));
        return Ok(());
    }

    if let Some(target) = &args.export {
        let document = hunter.export_json().await?;
        if target == "-" {
            println!("{}", document);
        } else {
            std::fs::write(target, document)
                .map_err(|e| format!("Failed to write export file {}: {}", target, e))?;
            ui::print_notice(&format!("Exported cache to {}", target));
        }
        return Ok(());
    }

    if let Some(source) = &args.import {
        let content = std::fs::read_to_string(source)
            .map_err(|e| format!("Failed to read import file {}: {}", source, e))?;
        let imported = hunter.import_json(&content).await?;
        ui::print_notice(&format!("Imported {} domain(s) from {}", imported, source));
        return Ok(());
    }

    if args.stats {
        let stats = hunter.stats().await?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            ui::print_stats(&stats);
        }
        return Ok(());
    }

    if let Some(days) = args.expiring {
        let records = hunter.expiring_soon(i64::from(days)).await?;
        if !args.json && !args.csv {
            ui::print_expiring(&records, days);
            return Ok(());
        }
        return display_records(&records, &args);
    }

    if args.list {
        let records = hunter.list_all().await?;
        return display_records(&records, &args);
    }

    let domains = collect_domains(&args)?;

    if args.forget {
        for domain in &domains {
            let removed = hunter.forget(domain).await?;
            ui::print_forgotten(domain, removed);
        }
        return Ok(());
    }

    run_lookups(&hunter, &domains, &args).await
}

async fn run_lookups(
    hunter: &DomainHunter,
    domains: &[String],
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let streaming = !args.json && !args.csv;

    let bulk = hunter
        .lookup_bulk_with(domains, |position, total, record| {
            if streaming {
                let counter = (total > 1).then_some((position, total));
                ui::print_record(record, counter, args.debug);
            }
        })
        .await;

    info!(total = bulk.total, elapsed = ?start.elapsed(), "lookups finished");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&bulk)?);
    } else if args.csv {
        display_csv_records(&bulk.results);
    } else if bulk.total > 1 {
        ui::print_summary(&bulk.results, start.elapsed());
    }

    Ok(())
}

/// Layer configuration: defaults, config file, `DH_*` environment, flags.
fn build_config(args: &Args) -> Result<ResolveConfig, Box<dyn std::error::Error>> {
    let env_config = load_env_config();

    let explicit = args
        .config
        .as_ref()
        .map(PathBuf::from)
        .or_else(|| env_config.config.clone());
    let file_config = ConfigManager::new().load(explicit.as_deref())?;

    let mut config = file_config.apply_to(ResolveConfig::default());
    config = env_config.apply_to(config);
    config = apply_cli_args_to_config(config, args);

    if config.cache_file.is_none() {
        config.cache_file = Some(PathBuf::from(DEFAULT_CACHE_FILE));
    }

    debug!(
        http_timeout = ?config.http_timeout,
        pacing = ?config.pacing_interval,
        whois_fallback = config.enable_whois_fallback,
        cache_file = ?config.cache_file,
        "effective configuration"
    );
    Ok(config)
}

fn apply_cli_args_to_config(mut config: ResolveConfig, args: &Args) -> ResolveConfig {
    if args.no_whois {
        config.enable_whois_fallback = false;
    }
    if let Some(timeout) = args.timeout.as_deref().and_then(parse_duration_string) {
        config.http_timeout = timeout;
    }
    if let Some(pacing_ms) = args.pacing_ms {
        config.pacing_interval = Duration::from_millis(pacing_ms);
    }
    if let Some(path) = &args.cache_file {
        config.cache_file = Some(PathBuf::from(path));
    }
    config
}

/// Domains from the positional arguments followed by the input file.
fn collect_domains(args: &Args) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let mut domains = args.domains.clone();
    if let Some(file) = &args.file {
        domains.extend(read_domains_from_file(Path::new(file))?);
    }
    Ok(domains)
}

/// One domain per line; blank lines and `#` comments are skipped.
fn read_domains_from_file(path: &Path) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()).into());
    }

    let content = std::fs::read_to_string(path)?;
    let domains = parse_domain_lines(&content);

    if domains.is_empty() {
        return Err("No valid domains found in the file.".into());
    }

    info!(count = domains.len(), path = %path.display(), "read domains from file");
    Ok(domains)
}

fn parse_domain_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| {
            let domain_part = line.split('#').next().unwrap_or("").trim();
            (!domain_part.is_empty()).then(|| domain_part.to_string())
        })
        .collect()
}

fn display_records(records: &[DomainRecord], args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(records)?);
    } else if args.csv {
        display_csv_records(records);
    } else {
        ui::print_record_table(records);
    }
    Ok(())
}

fn display_tlds(tlds: &[String], args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(tlds)?);
    } else {
        ui::print_tlds(tlds);
    }
    Ok(())
}

const CSV_HEADER: &str = "domain,available,hasDNS,expirationDate,daysLeft,registrar,method,lastChecked";

/// Display results in CSV format
fn display_csv_records(records: &[DomainRecord]) {
    println!("{}", CSV_HEADER);
    for record in records {
        println!("{}", csv_row(record));
    }
}

fn csv_row(record: &DomainRecord) -> String {
    let available = match record.available.as_bool() {
        Some(true) => "true",
        Some(false) => "false",
        None => "unknown",
    };
    let expiration = record
        .expiration_date
        .map(|d| d.to_rfc3339())
        .unwrap_or_default();
    let days_left = record.days_left.map(|d| d.to_string()).unwrap_or_default();

    [
        csv_field(&record.domain),
        available.to_string(),
        record.has_dns.to_string(),
        expiration,
        days_left,
        csv_field(record.registrar.as_deref().unwrap_or("")),
        record.method.to_string(),
        record.last_checked.to_rfc3339(),
    ]
    .join(",")
}

/// Quote a CSV field when it contains a separator, quote or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
