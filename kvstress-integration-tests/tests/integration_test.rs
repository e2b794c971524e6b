use kvstress_bench::config::BenchConfig;
use kvstress_bench::dispatcher;
use kvstress_bench::report::Report;
use kvstress_client::{ConnectionPool, RedisDialer};
use kvstress_common::{OpKind, StressError, Target};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

const RUN_TIMEOUT: Duration = Duration::from_secs(60);

/// Commands seen by the fake server, excluding connection setup.
#[derive(Default)]
struct Recorded(Mutex<Vec<Vec<String>>>);

impl Recorded {
    fn push(&self, command: Vec<String>) {
        self.0.lock().push(command);
    }

    fn all(&self) -> Vec<Vec<String>> {
        self.0.lock().clone()
    }
}

/// Start a server that answers every command with `:1`, or with an error
/// reply when an argument equals `fail_on`.
async fn start_fake_server(fail_on: Option<&'static str>) -> (SocketAddr, Arc<Recorded>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let recorded = Arc::new(Recorded::default());

    let seen = Arc::clone(&recorded);
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else { return };
            let seen = Arc::clone(&seen);
            tokio::spawn(async move {
                serve(stream, seen, fail_on).await;
            });
        }
    });

    (addr, recorded)
}

async fn serve(stream: TcpStream, seen: Arc<Recorded>, fail_on: Option<&'static str>) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    while let Some(command) = read_command(&mut reader).await {
        let is_setup = command.first().is_some_and(|name| name.eq_ignore_ascii_case("CLIENT"));
        let reply: &[u8] = if fail_on.is_some_and(|bad| command.iter().any(|a| a == bad)) {
            b"-ERR injected failure\r\n"
        } else if is_setup {
            b"+OK\r\n"
        } else {
            b":1\r\n"
        };
        if !is_setup {
            seen.push(command);
        }
        if write_half.write_all(reply).await.is_err() {
            return;
        }
    }
}

/// Read one RESP array of bulk strings; `None` on EOF or malformed input.
async fn read_command(reader: &mut BufReader<OwnedReadHalf>) -> Option<Vec<String>> {
    let count: usize = read_line(reader).await?.strip_prefix('*')?.parse().ok()?;
    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        let len: usize = read_line(reader).await?.strip_prefix('$')?.parse().ok()?;
        let mut buf = vec![0u8; len + 2];
        reader.read_exact(&mut buf).await.ok()?;
        buf.truncate(len);
        args.push(String::from_utf8(buf).ok()?);
    }
    Some(args)
}

async fn read_line(reader: &mut BufReader<OwnedReadHalf>) -> Option<String> {
    let mut line = String::new();
    let n = reader.read_line(&mut line).await.ok()?;
    if n == 0 {
        return None;
    }
    Some(line.trim_end().to_string())
}

fn config_for(addr: SocketAddr, op: OpKind, total_requests: u64, concurrency: usize) -> BenchConfig {
    BenchConfig {
        target: Target::new(addr.ip().to_string(), addr.port()),
        total_requests,
        concurrency,
        pool_size: 2,
        key: "itest".to_string(),
        ..BenchConfig::new(op)
    }
}

async fn run(config: &BenchConfig) -> kvstress_common::Result<dispatcher::RunSummary> {
    let dialer = RedisDialer::new(&config.target)?;
    let pool = ConnectionPool::connect(dialer, config.pool_size).await?;
    timeout(RUN_TIMEOUT, dispatcher::execute(&pool, config))
        .await
        .expect("run did not finish within 60 seconds")
}

#[tokio::test]
async fn test_full_run_against_store() {
    let (addr, seen) = start_fake_server(None).await;
    let config = config_for(addr, OpKind::Sadd, 100, 4);

    let summary = run(&config).await.expect("run failed");
    assert_eq!(summary.histogram.total(), 100);
    assert_eq!(summary.dropped_requests, 0);

    let commands = seen.all();
    assert_eq!(commands.len(), 100);
    assert!(commands.iter().all(|c| c[0] == "SADD" && c[1] == "itest"));
    let mut members: Vec<String> = commands.iter().map(|c| c[2].clone()).collect();
    members.sort();
    members.dedup();
    assert_eq!(members.len(), 100);

    let text = Report::from_summary(&summary).to_string();
    assert!(text.starts_with("================== sadd =================\n"));
    let last = text.lines().filter(|l| l.contains("% <= ")).last().unwrap();
    assert!(last.starts_with("100.00% <= "), "last percentile line was {last:?}");
}

#[tokio::test]
async fn test_zadd_run_drops_remainder() {
    let (addr, seen) = start_fake_server(None).await;
    let config = config_for(addr, OpKind::Zadd, 7, 3);

    let summary = run(&config).await.unwrap();
    assert_eq!(summary.histogram.total(), 6);
    assert_eq!(summary.dropped_requests, 1);

    let commands = seen.all();
    assert_eq!(commands.len(), 6);
    assert!(commands.iter().all(|c| c[0] == "ZADD" && c[2] == c[3].trim_start_matches("itest")));
    assert!(!commands.iter().any(|c| c[3] == "itest6"));
}

#[tokio::test]
async fn test_error_reply_aborts_run() {
    let (addr, _seen) = start_fake_server(Some("itest5")).await;
    let config = config_for(addr, OpKind::Zrank, 20, 2);

    match run(&config).await {
        Err(StressError::Command { op, member, reason }) => {
            assert_eq!(op, OpKind::Zrank);
            assert_eq!(member, "itest5");
            assert!(reason.contains("injected failure"), "reason was {reason:?}");
        }
        other => panic!("expected Command error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_store_fails_before_work() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = BenchConfig {
        target: Target::new("127.0.0.1", port),
        ..BenchConfig::new(OpKind::Sadd)
    };

    let result = run(&config).await;
    assert!(matches!(result, Err(StressError::Connect { .. })));
}
