use clap::{ArgAction, Parser};
use kvstress_bench::config::{
    BenchConfig, DEFAULT_CLIENTS, DEFAULT_KEY, DEFAULT_POOL_SIZE, DEFAULT_REQUESTS,
};
use kvstress_bench::dispatcher;
use kvstress_bench::histogram::DEFAULT_CEILING_MS;
use kvstress_bench::partition::RemainderPolicy;
use kvstress_bench::report::Report;
use kvstress_client::{ConnectionPool, RedisDialer};
use kvstress_common::{OpKind, StressError, Target, DEFAULT_HOST, DEFAULT_PORT};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "kvstress",
    about = "Latency benchmark for set and sorted-set commands",
    disable_help_flag = true
)]
struct Args {
    /// Server hostname
    #[arg(short = 'h', long, default_value = DEFAULT_HOST)]
    host: String,

    /// Server port
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Password for AUTH
    #[arg(short = 'a', long, env = "KVSTRESS_PASSWORD")]
    password: Option<String>,

    /// Database number to SELECT
    #[arg(long, default_value_t = 0)]
    db: i64,

    /// Operation: sadd | srem | sismember | zadd | zrem | zrank | zscore.
    /// Run zadd before zrank/zscore/zrem, otherwise they hit an empty key.
    #[arg(short = 't', long, default_value = "zadd")]
    op: String,

    /// Total number of requests
    #[arg(short = 'n', long, default_value_t = DEFAULT_REQUESTS)]
    requests: u64,

    /// Idle connections kept in the pool
    #[arg(short = 'z', long, default_value_t = DEFAULT_POOL_SIZE)]
    pool_size: usize,

    /// Number of parallel clients
    #[arg(short = 'c', long, default_value_t = DEFAULT_CLIENTS)]
    clients: usize,

    /// Set/sorted-set key; members are this key followed by the request index
    #[arg(short = 'k', long, default_value = DEFAULT_KEY)]
    key: String,

    /// Latencies at or above this many milliseconds are counted as slow
    #[arg(long, default_value_t = DEFAULT_CEILING_MS)]
    ceiling_ms: u64,

    /// Run the requests left over by uneven division instead of dropping them
    #[arg(long)]
    spread_remainder: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

impl Args {
    fn to_config(&self) -> Result<BenchConfig, StressError> {
        let op = OpKind::from_name(&self.op).ok_or_else(|| StressError::UnknownOp(self.op.clone()))?;
        let config = BenchConfig {
            target: Target {
                host: self.host.clone(),
                port: self.port,
                password: self.password.clone(),
                db: self.db,
            },
            op,
            total_requests: self.requests,
            concurrency: self.clients,
            pool_size: self.pool_size,
            key: self.key.clone(),
            ceiling_ms: self.ceiling_ms,
            remainder: if self.spread_remainder {
                RemainderPolicy::Spread
            } else {
                RemainderPolicy::Drop
            },
        };
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let config = args.to_config().unwrap_or_else(|e| {
        eprintln!("{e}");
        if matches!(e, StressError::UnknownOp(_)) {
            eprintln!("Valid operations: {}", OpKind::ALL.map(|op| op.as_name()).join(", "));
        }
        process::exit(3);
    });

    let dialer = RedisDialer::new(&config.target).unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(3);
    });

    let pool = ConnectionPool::connect(dialer, config.pool_size)
        .await
        .unwrap_or_else(|e| {
            eprintln!("{e}");
            process::exit(3);
        });

    let summary = dispatcher::execute(&pool, &config).await.unwrap_or_else(|e| {
        eprintln!("Run aborted: {e}");
        process::exit(1);
    });

    let report = Report::from_summary(&summary);
    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Failed to encode report: {e}");
                process::exit(1);
            }
        }
    } else {
        print!("{report}");
    }
}
