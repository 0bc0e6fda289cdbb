//! CLI for dishstat: packet-loss statistics from a Starlink user terminal.

mod commands;

use clap::{Args, Parser, Subcommand};
use dishstat_core::DEFAULT_TARGET;

#[derive(Parser)]
#[command(name = "dishstat")]
#[command(about = "dishstat: packet-loss statistics and status from a Starlink user terminal")]
#[command(version = dishstat_core::VERSION)]
struct Cli {
    /// Log debug detail to stderr; `ping-stats` also prints a labelled report instead of CSV
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where to get terminal data from.
#[derive(Args)]
struct SourceArgs {
    /// Read a saved grpcurl JSON response from FILE ("-" for stdin) instead of the dish
    #[arg(long, value_name = "FILE")]
    json: Option<String>,

    /// Dish gRPC address
    #[arg(long, default_value = DEFAULT_TARGET)]
    target: String,
}

/// How much history to look at.
#[derive(Args)]
struct WindowArgs {
    /// Number of most recent samples to use; negative means all
    #[arg(short, long, default_value_t = 3600, allow_negative_numbers = true)]
    samples: i64,

    /// Use all valid samples
    #[arg(short, long)]
    all: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ping drop stats (and optionally run lengths) over recent history, as one CSV row
    PingStats {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        window: WindowArgs,

        /// Include ping drop run-length stats
        #[arg(short, long)]
        run_lengths: bool,

        /// Print the CSV header instead of fetching data
        #[arg(short = 'H', long)]
        header: bool,
    },

    /// Per-sample history, one CSV row per second
    Bulk {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        window: WindowArgs,

        /// Only samples after this counter (the end_counter of a previous run)
        #[arg(long)]
        start: Option<u64>,

        /// Print the CSV header instead of fetching data
        #[arg(short = 'H', long)]
        header: bool,
    },

    /// Current status, obstruction wedges, and alerts as one CSV row
    Status {
        #[command(flatten)]
        source: SourceArgs,

        /// Print the CSV header instead of fetching data
        #[arg(short = 'H', long)]
        header: bool,
    },

    /// Poll status periodically and write it to InfluxDB until Ctrl+C
    Influx {
        /// Dish gRPC address
        #[arg(long, default_value = DEFAULT_TARGET)]
        target: String,

        /// InfluxDB host
        #[arg(long, default_value = "localhost")]
        host: String,

        /// InfluxDB port
        #[arg(long, default_value_t = 8086)]
        port: u16,

        /// InfluxDB database
        #[arg(long, default_value = "dishstats")]
        database: String,

        /// InfluxDB user
        #[arg(long)]
        username: Option<String>,

        /// InfluxDB password
        #[arg(long)]
        password: Option<String>,

        /// Connect to InfluxDB over HTTPS
        #[arg(long)]
        ssl: bool,

        /// Time between polls (e.g. "30s", "5m", "100ms")
        #[arg(long, default_value = "30s")]
        interval: String,

        /// Polls between writes to InfluxDB
        #[arg(long, default_value_t = 6)]
        commit_every: usize,

        /// Also record ping drop and run-length stats each poll
        #[arg(long)]
        ping_stats: bool,

        #[command(flatten)]
        window: WindowArgs,

        /// Poll once, write, and exit
        #[arg(long)]
        once: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    match cli.command {
        Commands::PingStats {
            source,
            window,
            run_lengths,
            header,
        } => commands::ping_stats::run(commands::ping_stats::PingStatsConfig {
            json: source.json.as_deref(),
            target: &source.target,
            samples: commands::sample_count(window.samples, window.all),
            run_lengths,
            header,
            verbose: cli.verbose,
        }),
        Commands::Bulk {
            source,
            window,
            start,
            header,
        } => commands::bulk::run(
            source.json.as_deref(),
            &source.target,
            commands::sample_count(window.samples, window.all),
            start,
            header,
        ),
        Commands::Status { source, header } => {
            commands::status::run(source.json.as_deref(), &source.target, header)
        }
        Commands::Influx {
            target,
            host,
            port,
            database,
            username,
            password,
            ssl,
            interval,
            commit_every,
            ping_stats,
            window,
            once,
        } => commands::influx::run(commands::influx::InfluxCommandConfig {
            target: &target,
            host,
            port,
            database,
            username,
            password,
            ssl,
            interval: &interval,
            commit_every,
            ping_stats,
            samples: commands::sample_count(window.samples, window.all),
            once,
        }),
    }
}
