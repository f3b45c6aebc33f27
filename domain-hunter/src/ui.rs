//! Terminal display logic for the domain-hunter CLI.
//!
//! Colored result lines, report tables and summaries. Everything here
//! writes to stdout; logs and errors stay on stderr.

use console::{pad_str, style, Alignment};
use domain_hunter_lib::{Availability, CacheStats, DomainRecord, ResolutionMethod};
use std::time::Duration;

const DOMAIN_WIDTH: usize = 30;

// ── Single result line ───────────────────────────────────────────────────────

/// Format and print a single domain record with colors and alignment.
///
/// If `counter` is Some((current, total)), a progress prefix like `[3/8]` is shown.
pub fn print_record(record: &DomainRecord, counter: Option<(usize, usize)>, debug: bool) {
    let padded_domain = pad_str(&record.domain, DOMAIN_WIDTH, Alignment::Left, Some(".."));

    let prefix = match counter {
        Some((cur, total)) => format!("{} ", style(format!("[{}/{}]", cur, total)).dim()),
        None => String::new(),
    };

    let status = match record.available {
        Availability::Available => style("AVAILABLE").green().bold(),
        Availability::Taken => style("TAKEN").red().bold(),
        Availability::Unknown => style("UNKNOWN").yellow(),
    };

    println!(
        "  {}{}  {}  {}",
        prefix,
        style(&padded_domain).white(),
        status,
        style(describe(record)).dim(),
    );

    if debug {
        println!(
            "    {} via {} at {}",
            style("└─").dim(),
            record.method,
            record.last_checked.to_rfc3339(),
        );
    }
}

/// Short human description of what a record knows.
pub fn describe(record: &DomainRecord) -> String {
    match record.method {
        ResolutionMethod::Error => "(lookup failed)".to_string(),
        ResolutionMethod::Dns if record.has_dns => "(resolves, no registry data)".to_string(),
        ResolutionMethod::Dns => "(no registry data, no DNS)".to_string(),
        ResolutionMethod::Rdap | ResolutionMethod::Whois => {
            let mut parts = Vec::new();
            if let Some(expiry) = format_expiry(record) {
                parts.push(expiry);
            }
            if let Some(registrar) = &record.registrar {
                parts.push(format!("Registrar: {}", registrar));
            }
            parts.join("  ")
        }
    }
}

/// `Expires: 2030-01-02 (42 days)`, or `Expired: ...` once `daysLeft <= 0`.
pub fn format_expiry(record: &DomainRecord) -> Option<String> {
    let date = record.expiration_date?.format("%Y-%m-%d");
    Some(match record.days_left {
        Some(days) if days <= 0 => format!("Expired: {} ({} days ago)", date, -days),
        Some(1) => format!("Expires: {} (1 day)", date),
        Some(days) => format!("Expires: {} ({} days)", date, days),
        None => format!("Expires: {}", date),
    })
}

// ── Summaries and reports ────────────────────────────────────────────────────

/// Print the final summary bar with colored counts.
pub fn print_summary(records: &[DomainRecord], duration: Duration) {
    let total = records.len();
    let count = |wanted: Availability| records.iter().filter(|r| r.available == wanted).count();

    println!(
        "  {}",
        style("────────────────────────────────────────────────────").dim()
    );
    println!(
        "  {} domain{} in {:.1}s  {}  {}  {}  {}  {}  {}",
        style(total).bold(),
        if total == 1 { "" } else { "s" },
        duration.as_secs_f64(),
        style("|").dim(),
        style(format!("{} available", count(Availability::Available))).green(),
        style("|").dim(),
        style(format!("{} taken", count(Availability::Taken))).red(),
        style("|").dim(),
        style(format!("{} unknown", count(Availability::Unknown))).yellow(),
    );
}

pub fn print_stats(stats: &CacheStats) {
    println!("{}", style("Cached domains").bold());
    print_stat_line("Total", stats.total, None);
    print_stat_line("Available", stats.available, Some(Availability::Available));
    print_stat_line("Taken", stats.taken, Some(Availability::Taken));
    print_stat_line("Unknown", stats.unknown, Some(Availability::Unknown));
    print_stat_line("Premium names", stats.premium, None);
    println!();
    println!("{}", style("Expiry").bold());
    print_stat_line("Expired", stats.expired, None);
    print_stat_line("Within 30 days", stats.expiring_30, None);
    print_stat_line("Within 31-90 days", stats.expiring_90, None);
    print_stat_line("Stale (older than TTL)", stats.stale, None);
}

fn print_stat_line(label: &str, value: usize, tone: Option<Availability>) {
    let label = pad_str(label, 24, Alignment::Left, None);
    let value = match tone {
        Some(Availability::Available) => style(value).green(),
        Some(Availability::Taken) => style(value).red(),
        Some(Availability::Unknown) => style(value).yellow(),
        None => style(value).bold(),
    };
    println!("  {}{}", label, value);
}

/// Print the records expiring within `days`, soonest first.
pub fn print_expiring(records: &[DomainRecord], days: u32) {
    if records.is_empty() {
        println!("No cached domains expire within {} days.", days);
        return;
    }

    println!(
        "{}",
        style(format!(
            "{} domain{} expiring within {} days",
            records.len(),
            if records.len() == 1 { "" } else { "s" },
            days
        ))
        .bold()
    );
    for record in records {
        let left = record.days_left.unwrap_or_default();
        let left_str = format!("{:>4} days", left);
        let left_styled = if left <= 7 {
            style(left_str).red().bold()
        } else if left <= 30 {
            style(left_str).yellow()
        } else {
            style(left_str).white()
        };
        println!(
            "  {}  {}  {}",
            pad_str(&record.domain, DOMAIN_WIDTH, Alignment::Left, Some("..")),
            left_styled,
            style(record.registrar.as_deref().unwrap_or("")).dim(),
        );
    }
}

/// Print every record, one colored line each.
pub fn print_record_table(records: &[DomainRecord]) {
    if records.is_empty() {
        println!("The cache is empty.");
        return;
    }
    for record in records {
        print_record(record, None, false);
    }
}

pub fn print_tlds(tlds: &[String]) {
    println!(
        "{} {}",
        style(tlds.len()).bold(),
        style("TLDs with a known registry RDAP endpoint:").dim()
    );
    for chunk in tlds.chunks(10) {
        println!("  {}", chunk.join(" "));
    }
}

pub fn print_forgotten(domain: &str, removed: bool) {
    if removed {
        println!("  {}  {}", style("removed").green(), domain);
    } else {
        println!("  {}  {}", style("not cached").dim(), domain);
    }
}

pub fn print_notice(message: &str) {
    println!("{}", style(message).bold());
}

// ── Tests ────────────────────────────────────────────────────────────────────
