use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, ValueEnum};
use serde::Deserialize;

use mock_publisher::{Encoding, HeaderLayout};

use super::error::ProtoMockError;

pub const DEFAULT_CONFIG: &str = "proto-mock.toml";
const DEFAULT_PERIOD_SECS: f64 = 0.1;
const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 7400;

// ═══════════════════════════════════════════════════════════════
//  Config file (TOML)
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub schema: Option<PathBuf>,
    pub message: Option<String>,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub channel: Option<String>,
    pub period: Option<f64>,
    pub count: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    #[serde(default)]
    pub header: HeaderLayout,
    #[serde(default)]
    pub bus: BusConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BusConfig {
    pub kind: Option<BusKind>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub encoding: Option<Encoding>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BusKind {
    /// Keep deliveries in memory, report the count at exit.
    Memory,
    /// Print each delivery as one text line.
    #[default]
    Stdout,
    /// Length-prefixed frames to host:port.
    Tcp,
}

pub fn load_config(path: &str) -> Result<Config, ProtoMockError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ProtoMockError::Config(format!("cannot read config {path}: {e}")))?;
    toml::from_str(&content).map_err(|e| ProtoMockError::Config(format!("bad config {path}: {e}")))
}

// ═══════════════════════════════════════════════════════════════
//  CLI args
// ═══════════════════════════════════════════════════════════════

#[derive(Args, Clone, Debug)]
pub struct CommonArgs {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG, env = "PROTO_MOCK_CONFIG")]
    pub config: String,

    /// Schema file: `.toml` registry or a protobuf descriptor set
    #[arg(long, global = true)]
    pub schema: Option<PathBuf>,

    /// Fully qualified (or unambiguous short) message name
    #[arg(long, global = true)]
    pub message: Option<String>,
}

#[derive(Args, Clone, Debug, Default)]
pub struct GenerateArgs {
    /// Where to write the template (default: <Message>_template.txt)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Clone, Debug, Default)]
pub struct PublishArgs {
    /// Edited template to publish (default: <Message>_template.txt)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Channel to publish on
    #[arg(long)]
    pub channel: Option<String>,

    /// Seconds between deliveries; 0 or less waits for Enter before each one
    #[arg(long, allow_negative_numbers = true)]
    pub period: Option<f64>,

    /// Stop after this many deliveries
    #[arg(long)]
    pub count: Option<u64>,

    /// Bus to publish through
    #[arg(long, value_enum)]
    pub bus: Option<BusKind>,

    /// TCP bus host
    #[arg(long)]
    pub host: Option<String>,

    /// TCP bus port
    #[arg(long)]
    pub port: Option<u16>,

    /// Payload encoding for the TCP bus: text, binary or json
    #[arg(long)]
    pub encoding: Option<Encoding>,
}

// ═══════════════════════════════════════════════════════════════
//  Effective: merged config
// ═══════════════════════════════════════════════════════════════

/// Final settings after the merge: defaults < config file < env/CLI.
#[derive(Debug)]
pub struct Effective {
    pub schema: PathBuf,
    pub message: Option<String>,
    pub output: Option<PathBuf>,
    pub input: Option<PathBuf>,
    pub channel: Option<String>,
    pub period: f64,
    pub count: Option<u64>,
    pub poll_interval: Duration,
    pub header: HeaderLayout,
    pub bus: BusKind,
    pub host: String,
    pub port: u16,
    pub encoding: Encoding,
}

impl Effective {
    pub fn new(args: &CommonArgs) -> Result<Self, ProtoMockError> {
        let cfg = match load_config(&args.config) {
            Ok(c) => c,
            Err(e) => {
                if Path::new(&args.config).exists() || args.config != DEFAULT_CONFIG {
                    return Err(e);
                }
                Config::default()
            }
        };
        Self::merge(args, cfg)
    }

    pub fn merge(args: &CommonArgs, cfg: Config) -> Result<Self, ProtoMockError> {
        let schema = args
            .schema
            .clone()
            .or(cfg.schema)
            .ok_or_else(|| ProtoMockError::Usage("--schema is required (or `schema` in the config file)".into()))?;

        Ok(Self {
            schema,
            message: args.message.clone().or(cfg.message),
            output: cfg.output,
            input: cfg.input,
            channel: cfg.channel,
            period: cfg.period.unwrap_or(DEFAULT_PERIOD_SECS),
            count: cfg.count,
            poll_interval: Duration::from_millis(cfg.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS)),
            header: cfg.header,
            bus: cfg.bus.kind.unwrap_or_default(),
            host: cfg.bus.host.unwrap_or_else(|| DEFAULT_HOST.into()),
            port: cfg.bus.port.unwrap_or(DEFAULT_PORT),
            encoding: cfg.bus.encoding.unwrap_or_default(),
        })
    }

    pub fn with_generate(mut self, args: &GenerateArgs) -> Self {
        self.output = args.output.clone().or(self.output);
        self
    }

    pub fn with_publish(mut self, args: &PublishArgs) -> Self {
        self.input = args.input.clone().or(self.input);
        self.channel = args.channel.clone().or(self.channel);
        self.period = args.period.unwrap_or(self.period);
        self.count = args.count.or(self.count);
        self.bus = args.bus.unwrap_or(self.bus);
        self.host = args.host.clone().unwrap_or(self.host);
        self.port = args.port.unwrap_or(self.port);
        self.encoding = args.encoding.unwrap_or(self.encoding);
        self
    }
}
