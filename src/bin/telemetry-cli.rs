use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

use http_telemetry::config::{load_config, TelemetryConfig};
use http_telemetry::record::{
    Environment, HeaderSnapshot, RequestDescriptor, ResponseDescriptor, TelemetryRecord,
};
use http_telemetry::reporter::Reporter;

#[derive(Parser)]
#[command(name = "telemetry-cli")]
#[command(about = "Operator tools for the http-telemetry interceptor", long_about = None)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the config file and print the effective settings
    Check,
    /// Send one synthetic record to the configured collector
    SendSample,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => TelemetryConfig::default(),
    };

    match cli.command {
        Commands::Check => {
            println!("Configuration OK");
            println!("{}", toml::to_string_pretty(&redacted(&config))?);
        }
        Commands::SendSample => {
            let reporter = Reporter::new(&config.reporter, &config.credentials)?;
            let record = sample_record(&config);

            let started = Instant::now();
            match reporter.send(&record).await {
                Ok(()) => println!(
                    "Delivered sample record to {} in {:?}",
                    reporter.endpoint(),
                    started.elapsed()
                ),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

fn redacted(config: &TelemetryConfig) -> TelemetryConfig {
    let mut config = config.clone();
    if !config.credentials.api_key.is_empty() {
        config.credentials.api_key = "********".to_string();
    }
    config
}

fn sample_record(config: &TelemetryConfig) -> TelemetryRecord {
    let request = RequestDescriptor {
        timestamp: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        ip: "127.0.0.1".to_string(),
        url: "http://localhost/telemetry-cli/sample".to_string(),
        user_agent: "telemetry-cli".to_string(),
        method: "GET".to_string(),
        headers: HeaderSnapshot::new(),
        body: serde_json::Value::Null,
        size: 0.0,
    };
    let response = ResponseDescriptor {
        headers: HeaderSnapshot::new(),
        code: 200,
        size: 0.0,
        load_time: 0,
        body: serde_json::json!({ "sample": true }),
    };

    TelemetryRecord::new(
        &config.credentials,
        &Environment::detect(),
        "HTTP/1.1",
        request,
        response,
        Vec::new(),
    )
}
