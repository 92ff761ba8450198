//! certlapse: confirm that a certificate chains to a trusted root, ignoring expiry.

use anyhow::{Context, Result};
use certlapse_lib::{
    parse_pem_chain, resolve_purpose, verify, CertPool, Certificate, ExtKeyUsage,
    VerificationReport, VerifyOptions,
};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "certlapse",
    about = "Verify X.509 certificate chains without checking validity dates",
    long_about = "certlapse builds every chain from a leaf certificate to a trusted root,\n\
                  checks basic constraints, extended key usage and the hostname, and\n\
                  never rejects a certificate for being expired or not yet valid.\n\
                  Use it to confirm a rotated certificate is trustworthy while its\n\
                  validity window and the system clock disagree.",
    after_help = "EXAMPLES:\n\
                  \n  certlapse verify chain.pem\
                  \n  certlapse verify --hostname www.example.com chain.pem\
                  \n  certlapse verify --CAfile ca.pem --untrusted int.pem leaf.pem\
                  \n  cat chain.pem | certlapse verify --json"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a certificate chain against a trust store (exit 0 = valid, 2 = fail)
    #[command(
        after_help = "FILE is a PEM bundle with the leaf certificate first, followed by\n\
                      intermediates, or a single DER certificate. Uses the system trust\n\
                      store unless --CAfile or --CApath is given.\n\
                      \nPURPOSE VALUES:\n\
                      \n  sslserver      TLS server authentication (default)\
                      \n  sslclient      TLS client authentication\
                      \n  smimesign      S/MIME email protection\
                      \n  codesign       Code signing\
                      \n  timestampsign  Time stamping\
                      \n  ocsphelper     OCSP signing\
                      \n  any            Any Extended Key Usage\
                      \n  <OID>          Custom OID (e.g., 1.3.6.1.5.5.7.3.8)\
                      \n\nEXAMPLES:\n\
                      \n  certlapse verify chain.pem\
                      \n  certlapse verify --purpose sslclient --purpose sslserver chain.pem\
                      \n  certlapse verify --show-chain --CApath /etc/ssl/certs chain.pem"
    )]
    Verify {
        /// PEM file with the certificate chain. Reads from stdin if omitted.
        file: Option<PathBuf>,
        /// Hostname or IP address to verify against the leaf certificate's SAN
        #[arg(long)]
        hostname: Option<String>,
        /// PEM file containing trusted CA certificates
        #[arg(long = "CAfile", visible_alias = "ca-file", value_name = "FILE")]
        ca_file: Option<PathBuf>,
        /// Directory of trusted CA certificates in PEM format
        #[arg(long = "CApath", visible_alias = "ca-path", value_name = "DIR")]
        ca_path: Option<PathBuf>,
        /// PEM file with additional untrusted intermediate certificates
        #[arg(long, value_name = "FILE")]
        untrusted: Option<PathBuf>,
        /// Acceptable EKU purpose; repeat to accept several (default: sslserver)
        #[arg(long, value_name = "PURPOSE")]
        purpose: Vec<String>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
        /// Display every certificate of each verified chain
        #[arg(long)]
        show_chain: bool,
    },
}

/// Maximum size for certificate inputs (10 MiB).
const MAX_INPUT_BYTES: u64 = 10 * 1024 * 1024;

fn read_input(file: Option<&PathBuf>) -> Result<Vec<u8>> {
    match file {
        Some(path) => {
            let meta = std::fs::metadata(path)
                .with_context(|| format!("Failed to stat file: {}", path.display()))?;
            if meta.len() > MAX_INPUT_BYTES {
                anyhow::bail!(
                    "File too large ({} bytes, max {} bytes): {}",
                    meta.len(),
                    MAX_INPUT_BYTES,
                    path.display()
                );
            }
            std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))
        }
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .take(MAX_INPUT_BYTES)
                .read_to_end(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

/// Split the input into DER certificates, leaf first.
fn split_chain(input: &[u8]) -> Result<Vec<Vec<u8>>> {
    if input.windows(10).any(|w| w == b"-----BEGIN") {
        Ok(parse_pem_chain(input)?)
    } else if input.is_empty() {
        anyhow::bail!("No certificate in input")
    } else {
        Ok(vec![input.to_vec()])
    }
}

fn parse_purposes(names: &[String]) -> Result<Vec<ExtKeyUsage>> {
    names
        .iter()
        .map(|name| {
            resolve_purpose(name).with_context(|| {
                format!(
                    "Unknown purpose '{}' (expected sslserver, sslclient, smimesign, \
                     smimeencrypt, codesign, timestampsign, ocsphelper, any, or an OID)",
                    name
                )
            })
        })
        .collect()
}

/// Build the root pool from --CAfile/--CApath, or `None` for the system store.
fn load_roots(
    ca_file: Option<&PathBuf>,
    ca_path: Option<&PathBuf>,
) -> Result<Option<Arc<CertPool>>> {
    if ca_file.is_none() && ca_path.is_none() {
        return Ok(None);
    }
    let mut roots = CertPool::new();
    if let Some(path) = ca_file {
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read CA file: {}", path.display()))?;
        let added = roots
            .add_pem_bundle(&data)
            .with_context(|| format!("Failed to parse CA file: {}", path.display()))?;
        tracing::debug!(path = %path.display(), added, "loaded CA file");
    }
    if let Some(dir) = ca_path {
        let added = roots
            .add_pem_directory(dir)
            .with_context(|| format!("Failed to read CA directory: {}", dir.display()))?;
        tracing::debug!(path = %dir.display(), added, "loaded CA directory");
    }
    if roots.is_empty() {
        anyhow::bail!("No trusted certificates found in --CAfile/--CApath");
    }
    Ok(Some(Arc::new(roots)))
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs() as i64)
}

/// Print a verification report (JSON, text valid, or text invalid).
fn print_report(
    label: &str,
    report: &VerificationReport,
    json: bool,
    show_chain: bool,
) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else if report.is_valid {
        println!("{}: {}", label, report);
        if show_chain {
            for (i, chain) in report.chains.iter().enumerate() {
                println!("chain {}:", i);
                for info in chain {
                    let lapsed = if info.outside_validity {
                        " (outside validity window)"
                    } else {
                        ""
                    };
                    println!(
                        "  depth {}: subject = {}, issuer = {}{}",
                        info.depth, info.subject, info.issuer, lapsed
                    );
                }
            }
        }
    } else {
        eprintln!("{}: {}", label, report);
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Verify {
            file,
            hostname,
            ca_file,
            ca_path,
            untrusted,
            purpose,
            json,
            show_chain,
        } => {
            let input = read_input(file.as_ref())?;
            let label = file
                .as_ref()
                .map_or("stdin".to_string(), |f| f.display().to_string());

            let certs_der = split_chain(&input)?;
            let (leaf_der, rest) = certs_der
                .split_first()
                .context("No certificate in input")?;
            let leaf = Certificate::from_der(leaf_der).context("Failed to parse leaf certificate")?;

            let mut intermediates = CertPool::new();
            for der in rest {
                intermediates
                    .add_der(der)
                    .context("Failed to parse intermediate certificate")?;
            }
            if let Some(path) = untrusted {
                let data = std::fs::read(path)
                    .with_context(|| format!("Failed to read untrusted file: {}", path.display()))?;
                intermediates
                    .add_pem_bundle(&data)
                    .with_context(|| {
                        format!("Failed to parse untrusted file: {}", path.display())
                    })?;
            }

            let options = VerifyOptions {
                dns_name: hostname.clone().unwrap_or_default(),
                intermediates,
                roots: load_roots(ca_file.as_ref(), ca_path.as_ref())?,
                key_usages: parse_purposes(purpose)?,
            };

            let outcome = verify(&leaf, &options);
            let report = VerificationReport::new(&leaf, &outcome, unix_now());
            print_report(&label, &report, *json, *show_chain)?;
            if !report.is_valid {
                std::process::exit(2);
            }
        }
    }

    Ok(())
}
