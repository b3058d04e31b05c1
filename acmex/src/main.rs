//! acmex: Command-line tool for browsing the certificates held in an ACME
//! resolver store.

mod server;

use acmex_lib::{AttachmentKind, CertificateEntry, CertificateInfo, Store};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use serde::Serialize;
use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "acmex",
    about = "Browse, download and inspect certificates from an ACME store",
    long_about = "acmex reads the JSON store written by a reverse proxy's ACME\n\
                  resolver and lists the certificates it holds, exports their\n\
                  PEM chain and private key, and decodes the X.509 fields.\n\n\
                  The store is read fresh on every command and every HTTP request;\n\
                  acmex never writes to it.",
    after_help = "EXAMPLES:\n\
                  \n  acmex --store acme.json list\
                  \n  acmex --store acme.json list --expiring-within 30d\
                  \n  acmex --store acme.json show example.com\
                  \n  acmex --store acme.json export example.com fullchain -o fullchain.pem\
                  \n  RESOLVER_PATH=acme.json acmex serve --listen 127.0.0.1:8088"
)]
struct Cli {
    /// Path of the ACME store JSON file
    #[arg(long, short, env = "RESOLVER_PATH", value_name = "PATH")]
    store: PathBuf,
    /// Enable debug logging (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the domains that have certificates
    #[command(after_help = "EXPIRY WINDOW:\n\
                      \n  --expiring-within takes a bare number of seconds or a span such as\
                      \n  30d, 2w or 1month. Entries that cannot be inspected are always shown.\
                      \n\nEXAMPLES:\n\
                      \n  acmex list\
                      \n  acmex list --details --json\
                      \n  acmex list --expiring-within 2w")]
    List {
        /// Inspect every leaf certificate and show its expiry
        #[arg(long)]
        details: bool,
        /// Only show certificates that expire within DURATION (implies --details)
        #[arg(long, value_name = "DURATION")]
        expiring_within: Option<String>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Write a certificate chain or private key exactly as stored
    Export {
        /// Primary domain of the certificate
        domain: String,
        /// What to export
        kind: ExportKind,
        /// Output file. Writes to stdout if omitted.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Decode the certificate chain of a domain
    Show {
        /// Primary domain of the certificate
        domain: String,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
        /// Show every extension and the signature bytes
        #[arg(long)]
        all: bool,
    },
    /// Serve the store over HTTP
    Serve {
        /// Address to listen on
        #[arg(long, env = "ACMEX_LISTEN", default_value = "0.0.0.0:8088")]
        listen: SocketAddr,
    },
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum ExportKind {
    Fullchain,
    Key,
}

impl From<ExportKind> for AttachmentKind {
    fn from(kind: ExportKind) -> Self {
        match kind {
            ExportKind::Fullchain => AttachmentKind::Fullchain,
            ExportKind::Key => AttachmentKind::Key,
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn load_store(path: &Path) -> Result<Store> {
    acmex_lib::read_store(path).with_context(|| format!("Failed to load {}", path.display()))
}

fn require_entry<'a>(store: &'a Store, domain: &str) -> Result<&'a CertificateEntry> {
    acmex_lib::find_certificate(store, domain)?
        .with_context(|| format!("No certificate for domain '{}'", domain))
}

/// Parse the `--expiring-within` window.
///
/// A bare number counts seconds; anything else goes through humantime
/// ("30d", "2w", "1month", "1d12h").
fn parse_window(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(raw)
        .with_context(|| format!("Invalid --expiring-within window '{}'", raw))
}

/// One row of `list` output.
#[derive(Debug, Serialize)]
struct ListRow {
    domain: String,
    sans: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expiry: Option<Expiry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct Expiry {
    not_after: String,
    relative: String,
    days_remaining: i64,
    seconds_remaining: i64,
}

/// Inspect the leaf certificate of an entry.
fn leaf_of(entry: &CertificateEntry, now: OffsetDateTime) -> Result<CertificateInfo, String> {
    let pem = acmex_lib::extract_chain_pem(entry).map_err(|e| e.to_string())?;
    acmex_lib::inspect(&pem, now)
        .map_err(|e| e.to_string())?
        .into_iter()
        .next()
        .ok_or_else(|| "empty certificate chain".to_string())
}

/// Build list rows; with `details`, every entry is inspected in parallel.
fn list_rows(entries: &[CertificateEntry], details: bool, now: OffsetDateTime) -> Vec<ListRow> {
    entries
        .par_iter()
        .map(|entry| {
            let mut row = ListRow {
                domain: entry.domain.main.clone(),
                sans: entry.domain.sans().to_vec(),
                expiry: None,
                error: None,
            };
            if details {
                match leaf_of(entry, now) {
                    Ok(leaf) => {
                        let not_after = leaf.validity.not_after;
                        row.expiry = Some(Expiry {
                            seconds_remaining: not_after.timestamp - now.unix_timestamp(),
                            days_remaining: leaf.validity.days_remaining,
                            not_after: not_after.iso8601,
                            relative: not_after.relative,
                        });
                    }
                    Err(e) => {
                        tracing::warn!(domain = %entry.domain.main, error = %e, "cannot inspect certificate");
                        row.error = Some(e);
                    }
                }
            }
            row
        })
        .collect()
}

/// Keep rows whose leaf expires within `window`; rows that failed to
/// inspect are kept so that corruption is not silently hidden.
fn expiring_within(rows: Vec<ListRow>, window: Duration) -> Vec<ListRow> {
    let limit = i64::try_from(window.as_secs()).unwrap_or(i64::MAX);
    rows.into_iter()
        .filter(|row| match &row.expiry {
            Some(expiry) => expiry.seconds_remaining <= limit,
            None => row.error.is_some(),
        })
        .collect()
}

fn print_rows(rows: &[ListRow], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(rows)?);
        return Ok(());
    }
    for row in rows {
        let mut line = row.domain.clone();
        if !row.sans.is_empty() {
            line.push_str(&format!(" [{}]", row.sans.join(", ")));
        }
        if let Some(expiry) = &row.expiry {
            line.push_str(&format!(
                ": expires {} ({})",
                expiry.not_after, expiry.relative
            ));
        }
        if let Some(err) = &row.error {
            line.push_str(&format!(": ERROR ({})", err));
        }
        println!("{}", line);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::List {
            details,
            expiring_within: window,
            json,
        } => {
            let store = load_store(&cli.store)?;
            let entries = acmex_lib::list_certificates(&store)?;
            let window = window.as_deref().map(parse_window).transpose()?;

            let now = OffsetDateTime::now_utc();
            let mut rows = list_rows(entries, *details || window.is_some(), now);
            if let Some(window) = window {
                rows = expiring_within(rows, window);
            }
            print_rows(&rows, *json)?;
        }
        Commands::Export {
            domain,
            kind,
            output,
        } => {
            let store = load_store(&cli.store)?;
            let entry = require_entry(&store, domain)?;
            let kind = AttachmentKind::from(*kind);
            let content = kind.extract(entry)?;

            match output {
                Some(path) => {
                    std::fs::write(path, content.as_bytes())
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    tracing::info!(%domain, %kind, path = %path.display(), "exported");
                }
                None => {
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(content.as_bytes())?;
                    stdout.flush()?;
                }
            }
        }
        Commands::Show { domain, json, all } => {
            let store = load_store(&cli.store)?;
            let entry = require_entry(&store, domain)?;
            let pem = acmex_lib::extract_chain_pem(entry)?;
            let certs = acmex_lib::inspect_now(&pem)?;

            if *json {
                println!("{}", acmex_lib::to_json(&certs)?);
            } else {
                print!("{}", acmex_lib::display_chain(&certs, *all));
            }
        }
        Commands::Serve { listen } => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to start async runtime")?;
            runtime.block_on(server::run(cli.store.clone(), *listen))?;
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn fixture_store() -> Store {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../tests/data/acme.json");
        acmex_lib::read_store(&path).unwrap()
    }

    /// 2026-10-18T00:00:00Z
    fn reference_time() -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_792_281_600).unwrap()
    }

    // ---- --expiring-within ----

    #[test]
    fn window_accepts_renewal_horizons() {
        let day = 86_400;
        let cases = [
            ("0", 0),
            ("86400", day),
            (" 30d ", 30 * day),
            ("2w", 14 * day),
            ("1d12h", day + 12 * 3600),
        ];
        for (raw, secs) in cases {
            assert_eq!(
                parse_window(raw).unwrap(),
                Duration::from_secs(secs),
                "{:?}",
                raw
            );
        }
    }

    #[test]
    fn window_errors_name_the_flag() {
        for raw in ["", "   ", "-7d", "soon", "30 fortnights"] {
            let err = parse_window(raw).unwrap_err();
            assert!(err.to_string().contains("--expiring-within"), "{:?}", raw);
        }
    }

    // ---- list ----

    #[test]
    fn list_without_details_skips_inspection() {
        let store = fixture_store();
        let entries = acmex_lib::list_certificates(&store).unwrap();
        let rows = list_rows(entries, false, reference_time());

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].domain, "example.com");
        assert_eq!(rows[0].sans, vec!["www.example.com", "api.example.com"]);
        assert!(rows.iter().all(|r| r.expiry.is_none() && r.error.is_none()));
    }

    #[test]
    fn list_details_reports_leaf_expiry_and_corruption() {
        let store = fixture_store();
        let entries = acmex_lib::list_certificates(&store).unwrap();
        let rows = list_rows(entries, true, reference_time());

        let leaf = rows[0].expiry.as_ref().unwrap();
        assert_eq!(leaf.not_after, "2026-10-30T00:00:00Z");
        assert_eq!(leaf.relative, "in 12 days");
        assert_eq!(leaf.days_remaining, 12);

        // other.example.org carries the CA certificate only
        assert_eq!(
            rows[1].expiry.as_ref().unwrap().not_after,
            "2034-01-01T00:00:00Z"
        );
        assert!(rows[2].error.as_ref().unwrap().contains("corrupt"));
    }

    #[test]
    fn expiring_filter_keeps_soon_and_broken() {
        let store = fixture_store();
        let entries = acmex_lib::list_certificates(&store).unwrap();
        let rows = list_rows(entries, true, reference_time());

        let kept = expiring_within(rows, parse_window("30d").unwrap());
        let domains: Vec<&str> = kept.iter().map(|r| r.domain.as_str()).collect();
        assert_eq!(domains, vec!["example.com", "corrupt.example.net"]);
    }

    #[test]
    fn zero_window_keeps_only_broken_entries() {
        let store = fixture_store();
        let entries = acmex_lib::list_certificates(&store).unwrap();
        let rows = list_rows(entries, true, reference_time());

        let kept = expiring_within(rows, Duration::ZERO);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].domain, "corrupt.example.net");
    }

    #[test]
    fn require_entry_reports_unknown_domain() {
        let store = fixture_store();
        let err = require_entry(&store, "missing.example").unwrap_err();
        assert!(err.to_string().contains("missing.example"));
    }
}
