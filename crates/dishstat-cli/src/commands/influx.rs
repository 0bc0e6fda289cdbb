//! `dishstat influx`: poll the dish and write status points to InfluxDB.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use dishstat_core::timestamp::unix_now;
use dishstat_core::{
    DishClient, Error, GrpcurlSource, InfluxConfig, PointSink, PollConfig, SampleCount,
    StatusPoller,
};

use super::{fail, parse_duration};

pub struct InfluxCommandConfig<'a> {
    pub target: &'a str,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ssl: bool,
    pub interval: &'a str,
    pub commit_every: usize,
    pub ping_stats: bool,
    pub samples: SampleCount,
    pub once: bool,
}

/// InfluxDB v1 `/write` endpoint, driven from a private single-threaded
/// runtime so the polling loop itself stays synchronous.
struct HttpSink {
    runtime: tokio::runtime::Runtime,
    client: reqwest::Client,
    url: String,
    config: InfluxConfig,
}

impl HttpSink {
    fn new(config: &InfluxConfig) -> Result<Self, String> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| format!("cannot start runtime: {e}"))?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| format!("cannot build HTTP client: {e}"))?;
        Ok(Self {
            runtime,
            client,
            url: config.write_url(),
            config: config.clone(),
        })
    }
}

impl PointSink for HttpSink {
    fn write_lines(&mut self, lines: &[String]) -> dishstat_core::Result<()> {
        let mut request = self
            .client
            .post(&self.url)
            .query(&self.config.write_query())
            .body(lines.join("\n"));
        if let Some(user) = &self.config.username {
            request = request.basic_auth(user, self.config.password.as_deref());
        }
        self.runtime.block_on(async move {
            let response = request
                .send()
                .await
                .map_err(|e| Error::Sink(e.to_string()))?;
            let status = response.status();
            if status.is_success() {
                return Ok(());
            }
            let body = response.text().await.unwrap_or_default();
            Err(Error::Sink(format!("HTTP {status}: {}", body.trim())))
        })
    }
}

pub fn run(config: InfluxCommandConfig<'_>) {
    let interval = parse_duration(config.interval).unwrap_or_else(|e| fail("--interval", e));

    let influx = InfluxConfig {
        host: config.host,
        port: config.port,
        database: config.database,
        username: config.username,
        password: config.password,
        ssl: config.ssl,
        ..InfluxConfig::default()
    };
    let sink = HttpSink::new(&influx).unwrap_or_else(|e| fail("InfluxDB client", e));

    let poll = PollConfig {
        interval,
        commit_every: config.commit_every.max(1),
        samples: config.samples,
        ping_stats: config.ping_stats,
    };
    let client = DishClient::new(GrpcurlSource::new(config.target));
    log::info!(
        "polling {} every {}ms, writing to {} database {} every {} polls",
        client.describe(),
        interval.as_millis(),
        influx.write_url(),
        influx.database,
        poll.commit_every
    );
    let mut poller = StatusPoller::new(client, sink, poll);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    }) {
        log::warn!("cannot install Ctrl+C handler: {e}");
    }

    while running.load(Ordering::SeqCst) {
        let report = poller.poll_once(unix_now());
        if !report.reachable {
            log::debug!("dish unreachable this cycle");
        }
        if config.once {
            break;
        }

        let deadline = Instant::now() + interval;
        while Instant::now() < deadline && running.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(50));
        }
    }

    // Flush on exit.
    match poller.flush() {
        Ok(n) => log::info!("flushed {n} points"),
        Err(e) => fail("failed to write", e),
    }
}
