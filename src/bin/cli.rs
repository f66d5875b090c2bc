//! Chemledger CLI
//!
//! Command-line client for a running Chemledger API:
//! - Append readings (as the ledger owner)
//! - Look up and filter records
//! - Compute averages and summaries
//! - Export records and check status

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

const IDENTITY_HEADER: &str = "x-ledger-identity";

#[derive(Parser)]
#[command(name = "chemledger")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Append-only ledger for chemical measurements")]
#[command(long_about = "Chemledger records sensor readings from a single authorized gateway.\nQuery them by time range, average any field, and watch for low stock.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:8090", global = true)]
    pub api_url: String,

    /// Identity sent with write requests
    #[arg(long, default_value = "sensor-gateway", global = true)]
    pub identity: String,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Append a reading
    Append {
        /// Timestamp (default: now). Supports: "now", RFC 3339, Unix seconds
        #[arg(short, long)]
        time: Option<String>,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        temperature: i64,
        #[arg(long, default_value_t = 0)]
        humidity: u64,
        #[arg(long, default_value_t = 0)]
        density: u64,
        #[arg(long, default_value_t = 0)]
        conductivity: u64,
        #[arg(long, default_value_t = 0)]
        weight: u64,
        #[arg(long, default_value_t = 0)]
        volume: u64,
        #[arg(long, default_value_t = 0)]
        ph: u64,
        #[arg(long, default_value_t = 0)]
        color: u64,
        /// Available stock
        #[arg(short, long, default_value_t = 0)]
        stock: u64,
        /// NORMAL, EMPTY, CORRUPTED or UNDEFINED
        #[arg(long, default_value = "UNDEFINED")]
        state: String,
        /// FILL, EMPTY or NONE
        #[arg(long, default_value = "NONE")]
        action: String,
        /// Opaque integrity tag
        #[arg(long)]
        tag: Option<String>,
    },

    /// Show one record
    Get {
        index: usize,
        /// Project onto an older schema (v1, v2)
        #[arg(long)]
        schema: Option<String>,
    },

    /// Number of records
    Count,

    /// Oldest records
    First {
        #[arg(short, default_value_t = 10)]
        n: usize,
    },

    /// Newest records
    Last {
        #[arg(short, default_value_t = 10)]
        n: usize,
    },

    /// Records in a time range, optionally filtered
    Range {
        #[arg(long, allow_hyphen_values = true)]
        start: Option<i64>,
        #[arg(long, allow_hyphen_values = true)]
        end: Option<i64>,
        #[arg(long)]
        state: Option<String>,
        #[arg(long)]
        action: Option<String>,
    },

    /// Integer mean of a field over a time range
    Average {
        /// Field name (temperature, humidity, ..., stock)
        field: String,
        #[arg(long, allow_hyphen_values = true)]
        start: Option<i64>,
        #[arg(long, allow_hyphen_values = true)]
        end: Option<i64>,
    },

    /// Count, sum, min, max and mean of a field
    Summary {
        field: String,
        #[arg(long, allow_hyphen_values = true)]
        start: Option<i64>,
        #[arg(long, allow_hyphen_values = true)]
        end: Option<i64>,
    },

    /// Export records
    Export {
        /// csv or ndjson
        #[arg(long = "as", default_value = "csv")]
        export_format: String,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show server status
    Status,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let api = format!("{}/api/v1", cli.api_url.trim_end_matches('/'));

    match cli.command {
        Commands::Append {
            time,
            temperature,
            humidity,
            density,
            conductivity,
            weight,
            volume,
            ph,
            color,
            stock,
            state,
            action,
            tag,
        } => {
            let timestamp = parse_timestamp(time.as_deref())?;

            let body = serde_json::json!({
                "timestamp": timestamp,
                "temperature": temperature,
                "humidity": humidity,
                "density": density,
                "conductivity": conductivity,
                "weight": weight,
                "volume": volume,
                "ph": ph,
                "color": color,
                "available_stock": stock,
                "state": state.to_uppercase(),
                "action": action.to_uppercase(),
                "integrity_tag": tag,
            });

            let response = client
                .post(format!("{}/records", api))
                .header(IDENTITY_HEADER, &cli.identity)
                .json(&body)
                .send()
                .await?;
            let result = read_json(response).await?;

            println!(
                "Appended record #{} at {}",
                result["index"].as_u64().unwrap_or(0),
                timestamp
            );
            if result["low_inventory"].as_bool().unwrap_or(false) {
                println!("Low inventory: stock {} is below the alert threshold", stock);
            }
        }

        Commands::Get { index, schema } => {
            let url = match schema {
                Some(schema) => format!("{}/records/{}/view/{}", api, index, schema),
                None => format!("{}/records/{}", api, index),
            };
            let record = read_json(client.get(url).send().await?).await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else if let Some(fields) = record.as_object() {
                for (key, value) in fields {
                    println!("{:<16} {}", key, display_value(value));
                }
            }
        }

        Commands::Count => {
            let result = read_json(client.get(format!("{}/records/count", api)).send().await?).await?;
            println!("{}", result["count"].as_u64().unwrap_or(0));
        }

        Commands::First { n } => {
            let url = format!("{}/records/first?n={}", api, n);
            let records = read_json(client.get(url).send().await?).await?;
            print_records(&records, &cli.format)?;
        }

        Commands::Last { n } => {
            let url = format!("{}/records/last?n={}", api, n);
            let records = read_json(client.get(url).send().await?).await?;
            print_records(&records, &cli.format)?;
        }

        Commands::Range {
            start,
            end,
            state,
            action,
        } => {
            let mut query: Vec<(&str, String)> = Vec::new();
            if let Some(start) = start {
                query.push(("start", start.to_string()));
            }
            if let Some(end) = end {
                query.push(("end", end.to_string()));
            }
            if let Some(state) = state {
                query.push(("state", state));
            }
            if let Some(action) = action {
                query.push(("action", action));
            }

            let response = client
                .get(format!("{}/records", api))
                .query(&query)
                .send()
                .await?;
            let result = read_json(response).await?;
            print_records(&result["records"], &cli.format)?;
        }

        Commands::Average { field, start, end } => {
            let query = bounds_query(&field, start, end);
            let response = client
                .get(format!("{}/aggregate/average", api))
                .query(&query)
                .send()
                .await?;
            let result = read_json(response).await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", display_value(&result["average"]));
            }
        }

        Commands::Summary { field, start, end } => {
            let query = bounds_query(&field, start, end);
            let response = client
                .get(format!("{}/aggregate/summary", api))
                .query(&query)
                .send()
                .await?;
            let result = read_json(response).await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                for key in ["field", "count", "sum", "min", "max", "mean"] {
                    println!("{:<8} {}", key, display_value(&result[key]));
                }
            }
        }

        Commands::Export {
            export_format,
            output,
        } => {
            let response = client
                .get(format!("{}/export", api))
                .query(&[("format", export_format.as_str())])
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                bail!("Export failed ({}): {}", status, text);
            }

            let data = response.text().await?;

            match output {
                Some(path) => {
                    std::fs::write(&path, &data)
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    println!("Exported to {:?}", path);
                }
                None => {
                    print!("{}", data);
                }
            }
        }

        Commands::Status => {
            let response = client
                .get(format!("{}/health", cli.api_url.trim_end_matches('/')))
                .send()
                .await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let health: serde_json::Value = resp.json().await?;

                    println!("Chemledger v{}", env!("CARGO_PKG_VERSION"));
                    println!();
                    println!(
                        "API Status: {}",
                        health["status"].as_str().unwrap_or("unknown")
                    );
                    println!();
                    println!("Ledger:");
                    println!("  Records: {}", health["records"].as_u64().unwrap_or(0));
                    println!(
                        "  Durable: {}",
                        health["durable"].as_bool().unwrap_or(false)
                    );
                    println!(
                        "  Stream clients: {}",
                        health["ws_connections"].as_u64().unwrap_or(0)
                    );

                    if let Some(uptime) = health["uptime_seconds"].as_u64() {
                        println!();
                        println!("Uptime: {}", format_duration(uptime));
                    }
                }
                Ok(resp) => {
                    bail!("API returned error: {}", resp.status());
                }
                Err(e) => {
                    eprintln!("Cannot connect to Chemledger API at {}", cli.api_url);
                    eprintln!();
                    eprintln!("Make sure the Chemledger API server is running:");
                    eprintln!("  cargo run --bin chemledger-api");
                    return Err(e.into());
                }
            }
        }

        Commands::Config { output } => {
            let config = chemledger::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

/// Decode a JSON body, turning API errors into a readable message
async fn read_json(response: reqwest::Response) -> anyhow::Result<serde_json::Value> {
    let status = response.status();
    let body: serde_json::Value = response
        .json()
        .await
        .with_context(|| format!("Invalid response body ({})", status))?;

    if !status.is_success() {
        let code = body["error"]["code"].as_str().unwrap_or("ERROR");
        let message = body["error"]["message"].as_str().unwrap_or("request failed");
        bail!("{} ({}): {}", code, status, message);
    }

    Ok(body)
}

fn bounds_query(field: &str, start: Option<i64>, end: Option<i64>) -> Vec<(&'static str, String)> {
    let mut query = vec![("field", field.to_string())];
    if let Some(start) = start {
        query.push(("start", start.to_string()));
    }
    if let Some(end) = end {
        query.push(("end", end.to_string()));
    }
    query
}

fn parse_timestamp(time: Option<&str>) -> anyhow::Result<i64> {
    match time {
        None | Some("now") => Ok(Utc::now().timestamp()),
        Some(s) => {
            if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
                Ok(dt.timestamp())
            } else if let Ok(ts) = s.parse::<i64>() {
                Ok(ts)
            } else {
                bail!("Invalid timestamp format: {}", s)
            }
        }
    }
}

fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

fn print_records(records: &serde_json::Value, format: &str) -> anyhow::Result<()> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    let rows = match records.as_array() {
        Some(rows) if !rows.is_empty() => rows,
        _ => {
            println!("No records");
            return Ok(());
        }
    };

    println!(
        "{:<20} {:>8} {:>8} {:>8} {:>8} {:<10} {:<6}",
        "Time", "Temp", "Humid", "Weight", "Stock", "State", "Action"
    );
    println!("{}", "-".repeat(74));

    for row in rows {
        let ts = row["timestamp"].as_i64().unwrap_or(0);
        let date = chrono::DateTime::from_timestamp(ts, 0)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| ts.to_string());

        println!(
            "{:<20} {:>8} {:>8} {:>8} {:>8} {:<10} {:<6}",
            date,
            display_value(&row["temperature"]),
            display_value(&row["humidity"]),
            display_value(&row["weight"]),
            display_value(&row["available_stock"]),
            display_value(&row["state"]),
            display_value(&row["action"]),
        );
    }

    Ok(())
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}
