//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::{ConfigOverrides, SourceConfig};
use crate::engine::{PollLoop, PollOutcome, PollStats};
use crate::error::Result;
use crate::http::HttpClient;
use crate::output::{JsonLinesSink, RecordMapper, RecordSink};
use crate::pagination::IssueFetcher;
use crate::state::{format_instant, CursorStore, FileCursorStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;
        debug!(config = ?config, "Configuration loaded");

        match self.cli.command {
            Commands::Run => self.run_loop(&config).await,
            Commands::Poll => self.poll(&config).await,
            Commands::Check => self.check(&config).await,
            Commands::State => self.state(&config).await,
            Commands::Reset => self.reset(&config).await,
        }
    }

    /// Load configuration: YAML file, then flags, then environment
    fn load_config(&self) -> Result<SourceConfig> {
        let base = match &self.cli.config {
            Some(path) => SourceConfig::from_file(path)?,
            None => SourceConfig::default(),
        };

        let config = base
            .overlay(ConfigOverrides {
                owner: self.cli.owner.clone(),
                repository: self.cli.repository.clone(),
                topic: self.cli.topic.clone(),
                state_file: self.cli.state.clone(),
                output: self.cli.output.clone(),
            })
            .with_env_token();

        config.validate()?;
        Ok(config)
    }

    /// Poll until Ctrl-C
    async fn run_loop(&self, config: &SourceConfig) -> Result<()> {
        let mut poll = build_poll_loop(config).await?;

        let cancel = CancellationToken::new();
        let signal = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Stop requested, finishing current cycle");
                signal.cancel();
            }
        });

        let stats = poll.run(cancel).await?;
        self.output_message(&stats_message(&stats));
        Ok(())
    }

    /// Single fetch cycle
    async fn poll(&self, config: &SourceConfig) -> Result<()> {
        let mut poll = build_poll_loop(config).await?;
        let outcome = poll.poll_once().await?;
        self.output_message(&outcome_message(&outcome));
        Ok(())
    }

    /// Check access to the repository
    async fn check(&self, config: &SourceConfig) -> Result<()> {
        let partition = config.partition();
        info!(partition = %partition, "Checking repository access");

        let client = HttpClient::with_auth(config.http_client_config(), config.auth_config())?;

        match client.get(&partition.repository_path()).await {
            Ok(_) => {
                self.output_message(&json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "SUCCEEDED",
                        "message": format!("Repository {partition} is accessible")
                    }
                }));
            }
            Err(e) => {
                self.output_message(&json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "FAILED",
                        "message": format!("Connection failed: {e}")
                    }
                }));
            }
        }

        Ok(())
    }

    /// Print the persisted cursor
    async fn state(&self, config: &SourceConfig) -> Result<()> {
        let store = FileCursorStore::open(&config.state_file)?;
        let partition = config.partition();
        let offset = store.load(&partition).await?;

        self.output_message(&json!({
            "type": "STATE",
            "partition": partition.partition_id(),
            "offset": offset,
        }));
        Ok(())
    }

    /// Forget the persisted cursor
    async fn reset(&self, config: &SourceConfig) -> Result<()> {
        let store = FileCursorStore::open(&config.state_file)?;
        let partition = config.partition();
        let removed = store.clear(&partition).await?;

        info!(partition = %partition, removed, "Cursor reset");
        self.output_message(&json!({
            "type": "STATE_RESET",
            "partition": partition.partition_id(),
            "removed": removed,
        }));
        Ok(())
    }

    /// Output a status message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Wire the poll loop for a validated configuration
pub(crate) async fn build_poll_loop(config: &SourceConfig) -> Result<PollLoop> {
    let client = HttpClient::with_auth(config.http_client_config(), config.auth_config())?;
    let gate = client.gate().clone();
    let fetcher = IssueFetcher::new(client, config.page_size);

    let store = FileCursorStore::open(&config.state_file)?;
    let sink: Box<dyn RecordSink> = match &config.output {
        Some(path) => Box::new(JsonLinesSink::append(path).await?),
        None => Box::new(JsonLinesSink::stdout()),
    };

    let mut poll = PollLoop::new(
        config.partition(),
        RecordMapper::new(config.topic.clone()),
        Box::new(fetcher),
        sink,
        Arc::new(store),
    )
    .with_config(config.poll_config()?)
    .with_gate(gate);

    poll.resume().await?;
    Ok(poll)
}

fn outcome_message(outcome: &PollOutcome) -> Value {
    json!({
        "type": "POLL_OUTCOME",
        "records": outcome.records,
        "full": outcome.full,
        "cursor": {
            "since": format_instant(&outcome.cursor.since),
            "page": outcome.cursor.page,
        },
        "delay_ms": outcome.delay.as_millis() as u64,
    })
}

fn stats_message(stats: &PollStats) -> Value {
    json!({
        "type": "POLL_STATS",
        "pages_fetched": stats.pages_fetched,
        "empty_pages": stats.empty_pages,
        "records_emitted": stats.records_emitted,
        "rate_limited": stats.rate_limited,
        "transient_errors": stats.transient_errors,
    })
}
