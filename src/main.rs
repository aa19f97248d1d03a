use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use dnwalk::{Cache, Resolution, Resolver, ResolverConfig};

#[derive(Parser)]
#[command(name = "dnwalk")]
#[command(version)]
#[command(about = "Resolve a domain name to an IPv4 address over the DNS wire protocol")]
struct Cli {
    /// Domain name to resolve
    domain: Option<String>,

    /// Skip the cache lookup (answers are still cached)
    #[arg(long)]
    nocache: bool,

    /// Resolve recursively starting at the root server
    #[arg(long)]
    trace: bool,

    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Root server address
    #[arg(long, value_name = "IP")]
    root: Option<Ipv4Addr>,

    /// Upstream resolver address
    #[arg(long, value_name = "IP")]
    upstream: Option<Ipv4Addr>,

    /// Cache database path
    #[arg(long, value_name = "PATH")]
    cache_path: Option<PathBuf>,

    /// Read deadline per reply, in milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn resolver_config(&self) -> anyhow::Result<ResolverConfig> {
        let mut config = match &self.config {
            Some(path) => ResolverConfig::load(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => ResolverConfig::default(),
        };

        if let Some(root) = self.root {
            config.root_server = root;
        }
        if let Some(upstream) = self.upstream {
            config.upstream = upstream;
        }
        if let Some(cache_path) = &self.cache_path {
            config.cache_path = cache_path.clone();
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.read_timeout_ms = timeout_ms;
        }

        Ok(config)
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let Some(domain) = cli.domain.as_deref() else {
        println!("{}", Cli::command().render_usage());
        return Ok(ExitCode::SUCCESS);
    };

    init_logging(cli.verbose);

    let config = cli.resolver_config()?;
    let cache = Cache::open(&config.cache_path)
        .with_context(|| format!("opening cache at {}", config.cache_path.display()))?;
    let resolver = Resolver::with_udp(cache, config);

    let code = match resolver.resolve(domain, cli.trace, !cli.nocache).await {
        Ok(Resolution::Address { address, .. }) => {
            println!("{address}");
            ExitCode::SUCCESS
        }
        Ok(Resolution::NoRecord) => {
            println!("no record found");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    };

    resolver.into_cache().close().context("closing cache")?;

    Ok(code)
}
