//! rft — resumable file transfer over a pre-shared-key TCP session.
//!
//! This binary owns argument parsing, tracing init, and turning library
//! `Result`s into process exit codes. Everything that actually moves
//! bytes lives in `rft-net` / `rft-transfer` / `rft-checksum`.

use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use rft_core::{Config, Verb};
use rft_net::Listener;
use rft_progress::Reporter;
use rft_transfer::interact::StdinPrompt;

const DEFAULT_PORT: u16 = 14605;

fn print_usage() {
    println!("Usage: rft -k <key> -f <path> [-a <addr> -m get|put] [options]");
    println!();
    println!("Mode");
    println!("  (no -a)                  Run as listener (server mode)");
    println!("  -a <addr> -m get|put     Connect to <addr> and GET or PUT <path>");
    println!();
    println!("Options");
    println!("  -p <port>                TCP port (default: {})", DEFAULT_PORT);
    println!("  -f <path>                Target file path");
    println!("  -k <key>                 Pre-shared secret, sent in plaintext");
    println!("  -m get|put               Client mode: direction of transfer");
    println!("      --hashlog            Persist/consult a <path>.hashlog side-file");
    println!("  -q, --quiet              Suppress the progress reporter");
    println!("  -h, --help               Show this message");
    println!();
    println!("Examples:");
    println!("  rft -k secret -f incoming.iso --hashlog");
    println!("  rft -a 10.0.0.5 -p 14605 -k secret -f incoming.iso -m get");
    println!("  rft -a 10.0.0.5 -k secret -f outgoing.iso -m put");
}

struct Args {
    addr: Option<String>,
    port: u16,
    file: Option<PathBuf>,
    key: Option<String>,
    mode: Option<Verb>,
    hashlog: bool,
    quiet: bool,
}

fn parse_args() -> Result<Args> {
    let mut addr = None;
    let mut port = DEFAULT_PORT;
    let mut file = None;
    let mut key = None;
    let mut mode = None;
    let mut hashlog = false;
    let mut quiet = false;

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let mut i = 0;
    while i < argv.len() {
        match argv[i].as_str() {
            "-a" => {
                i += 1;
                addr = argv.get(i).cloned().filter(|s| !s.is_empty());
            }
            "-p" => {
                i += 1;
                port = argv
                    .get(i)
                    .context("-p requires a value")?
                    .parse()
                    .context("-p must be a number")?;
            }
            "-f" => {
                i += 1;
                file = Some(PathBuf::from(
                    argv.get(i).context("-f requires a value")?,
                ));
            }
            "-k" => {
                i += 1;
                key = argv.get(i).cloned();
            }
            "-m" => {
                i += 1;
                let value = argv.get(i).context("-m requires get or put")?;
                mode = Some(match value.to_ascii_lowercase().as_str() {
                    "get" => Verb::Get,
                    "put" => Verb::Put,
                    other => bail!("unknown mode {:?}, expected get or put", other),
                });
            }
            "--hashlog" => hashlog = true,
            "-q" | "--quiet" => quiet = true,
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            other => bail!("unknown option: {}", other),
        }
        i += 1;
    }

    Ok(Args {
        addr,
        port,
        file,
        key,
        mode,
        hashlog,
        quiet,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = parse_args()?;

    let mut config = Config::load().unwrap_or_default();
    config.port = args.port;
    if args.hashlog {
        config.hash_log_enabled = true;
    }

    let key = args.key.context("-k <key> is required")?;

    let result = match args.addr {
        // Server mode: the filename is supplied per-session by the
        // client during the handshake, so `-f` is not required here.
        // Only in client mode, where it names the local file to GET
        // into or PUT from.
        None => run_server(&key, &config).await,
        Some(addr) => {
            let mode = args.mode.context("-m get|put is required in client mode")?;
            let file = args.file.context("-f <path> is required in client mode")?;
            run_client(&addr, &key, mode, &file, &config, args.quiet).await
        }
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("rft: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run_server(key: &str, config: &Config) -> Result<()> {
    let bind_addr = SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), config.port);
    let listener = Listener::bind(bind_addr, key.to_string())
        .await
        .context("failed to bind listener")?;
    tracing::info!(port = config.port, "rft listening");
    listener.run(config).await.context("listener exited")?;
    Ok(())
}

async fn run_client(
    addr: &str,
    key: &str,
    mode: Verb,
    file: &PathBuf,
    config: &Config,
    quiet: bool,
) -> Result<()> {
    let socket_addr: SocketAddr = format!("{}:{}", addr, config.port)
        .parse()
        .with_context(|| format!("invalid address {:?}", addr))?;

    let filename = file.to_string_lossy().into_owned();
    let mut prompt = StdinPrompt;
    let mut reporter = Reporter::new(quiet);

    let result = rft_net::dial(
        socket_addr,
        key,
        mode,
        &filename,
        file,
        config,
        &mut prompt,
        &mut reporter,
    )
    .await;
    reporter.finish();

    match result {
        Ok(()) => Ok(()),
        Err(rft_core::Error::AuthFailed) => {
            eprintln!("Bad key");
            std::process::exit(1);
        }
        Err(rft_core::Error::SourceMissing) => {
            eprintln!("rft: remote file is missing");
            std::process::exit(1);
        }
        Err(rft_core::Error::OverwriteDeclined) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
