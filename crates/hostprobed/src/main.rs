//! hostprobed - runs one collection pass of the hostprobe collectors.
//!
//! Stands in for the host agent: builds collector configs from the command
//! line, runs every enabled collector once and writes the samples to stdout.
//! Logs go to stderr.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::io::{self, Write};
use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, ValueEnum};
use serde_json::{Map, Value, json};
use tracing::{Level, debug, error, info};
use tracing_subscriber::EnvFilter;

use hostprobe_core::collector::memcached::SocketTransport;
use hostprobe_core::collector::{Collector, MemcachedCollector, RealFs, SolrCollector};
use hostprobe_core::config::{MemcachedConfig, SolrConfig};
use hostprobe_core::sample::{MetricSample, SampleBuffer};

/// Output format for samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// `<path> <value> <timestamp> <classification>` per line.
    Text,
    /// One JSON object per line.
    Json,
}

/// Runs one pass of the hostprobe collectors.
#[derive(Parser)]
#[command(name = "hostprobed", about = "Host metrics collector plugins", version)]
struct Args {
    /// Enable the memcached collector. Disable with --memcached=false.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    memcached: bool,

    /// memcached endpoint, `[alias@]host[:port]` or `[alias@]/path/to/socket`.
    /// Repeatable. Defaults to localhost:11211.
    #[arg(long = "host", value_name = "ENDPOINT")]
    hosts: Vec<String>,

    /// Comma-separated stats fields to publish. Publishes everything when unset.
    #[arg(long, value_delimiter = ',')]
    publish: Option<Vec<String>>,

    /// Connect/read/write timeout in milliseconds.
    #[arg(long, default_value = "5000", env = "HOSTPROBE_TIMEOUT_MS")]
    timeout_ms: u64,

    /// Path to /proc filesystem (for testing/mocking).
    #[arg(long, default_value = "/proc")]
    proc_path: String,

    /// Enable the Solr collector.
    #[arg(long)]
    solr: bool,

    /// Solr host.
    #[arg(long, default_value = "localhost")]
    solr_host: String,

    /// Solr port. Repeatable. Defaults to 8983.
    #[arg(long = "solr-port", value_name = "PORT")]
    solr_ports: Vec<u16>,

    /// Comma-separated Solr stat groups (jvm, threads).
    #[arg(long, value_delimiter = ',')]
    solr_stats: Option<Vec<String>>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber on stderr.
/// `RUST_LOG` overrides the level chosen by -v/-q.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("hostprobed={},hostprobe_core={}", level, level))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Builds the memcached config value the way the agent would hand it over.
fn memcached_section(args: &Args) -> Value {
    let mut section = Map::new();
    if !args.hosts.is_empty() {
        section.insert("hosts".into(), json!(args.hosts));
    }
    if let Some(ref publish) = args.publish {
        section.insert("publish".into(), json!(publish));
    }
    section.insert("timeout_ms".into(), json!(args.timeout_ms));
    Value::Object(section)
}

fn solr_section(args: &Args) -> Value {
    let mut section = Map::new();
    section.insert("host".into(), json!(args.solr_host));
    if !args.solr_ports.is_empty() {
        section.insert("port".into(), json!(args.solr_ports));
    }
    if let Some(ref stats) = args.solr_stats {
        section.insert("stats".into(), json!(stats));
    }
    section.insert("timeout_ms".into(), json!(args.timeout_ms));
    Value::Object(section)
}

/// Builds every enabled collector. Configuration errors are fatal.
fn build_collectors(args: &Args) -> Result<Vec<Box<dyn Collector>>, String> {
    let mut collectors: Vec<Box<dyn Collector>> = Vec::new();

    if args.memcached {
        let config =
            MemcachedConfig::from_value(&memcached_section(args)).map_err(|e| e.to_string())?;
        info!("memcached collector: {} host(s)", config.hosts.len());
        let transport = SocketTransport::new(config.timeout);
        collectors.push(Box::new(MemcachedCollector::new(
            RealFs::new(),
            transport,
            &args.proc_path,
            config,
        )));
    } else {
        debug!("memcached collector: disabled");
    }

    if args.solr {
        let config = SolrConfig::from_value(&solr_section(args)).map_err(|e| e.to_string())?;
        info!("solr collector: {} port(s) on {}", config.ports.len(), config.host);
        let collector = SolrCollector::from_config(config).map_err(|e| e.to_string())?;
        collectors.push(Box::new(collector));
    } else {
        debug!("solr collector: disabled");
    }

    Ok(collectors)
}

fn write_sample(
    out: &mut impl Write,
    format: Format,
    namespace: &str,
    sample: &MetricSample,
    timestamp: i64,
) -> io::Result<()> {
    let path = format!("{}.{}", namespace, sample.key);
    match format {
        Format::Text => writeln!(
            out,
            "{} {} {} {}",
            path, sample.value, timestamp, sample.classification
        ),
        Format::Json => {
            let line = json!({
                "path": path,
                "value": sample.value,
                "classification": sample.classification,
                "timestamp": timestamp,
            });
            writeln!(out, "{}", line)
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    info!(
        "hostprobed {} ({}) starting",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_SHA")
    );

    let mut collectors = match build_collectors(&args) {
        Ok(collectors) => collectors,
        Err(e) => {
            error!("invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let timestamp = Utc::now().timestamp();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut failed = false;

    for collector in collectors.iter_mut() {
        let mut buffer = SampleBuffer::new();
        if let Err(e) = collector.collect(&mut buffer) {
            error!(collector = collector.name(), error = %e, "collection pass failed");
            failed = true;
            continue;
        }

        let name = collector.name();
        info!(collector = name, samples = buffer.len(), "collection pass done");
        for sample in buffer.iter() {
            if let Err(e) = write_sample(&mut out, args.format, name, sample, timestamp) {
                error!(error = %e, "failed to write samples");
                return ExitCode::FAILURE;
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
