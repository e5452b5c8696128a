//! Gate scanner
//!
//! Line-oriented stand-in for the dashboard's scanner screen. Each line on
//! stdin is either a ticket code to validate or a command:
//!
//! ```text
//! :stats          ticket and fraud counters
//! :capacity       venue utilization
//! :recent         newest check-ins
//! :fraud          newest fraud alerts
//! :search <q>     find tickets by name, email or id
//! :types          used/total per ticket type
//! :metrics        Prometheus metrics
//! :quit           exit
//! ```
//!
//! # Usage
//!
//! ```bash
//! SCAN_LATENCY_MS=0 cargo run --bin scanner
//! ```

use std::sync::Arc;
use std::time::Duration;
use ticket_guard::presentation::StatusPresentation;
use ticket_guard::{
    Config, Dataset, GuardEnvironment, QrCode, ScanInputError, TicketGuard, ValidationResult,
};
use ticket_guard_core::environment::{RandomIdGenerator, SystemClock};
use ticket_guard_runtime::metrics::MetricsExporter;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long to wait for metric effects on exit
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ticket_guard=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("🎫 Starting gate scanner...");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(
        dataset = ?config.gate.dataset,
        entrance = %config.gate.entrance,
        capacity = config.gate.venue_capacity.get(),
        policy = ?config.gate.invalid_scan_policy,
        "Configuration loaded"
    );

    // Metrics
    let mut exporter = MetricsExporter::new();
    exporter.install()?;
    ticket_guard::metrics::register_business_metrics();

    // Gate state
    let dataset = match &config.gate.dataset {
        Some(path) => Dataset::from_path(path)?,
        None => Dataset::seed()?,
    };
    let state = dataset.into_state()?;
    tracing::info!(
        tickets = state.tickets.len(),
        used = state.tickets.used_count(),
        "✓ Dataset loaded"
    );

    let env = config.apply_to(GuardEnvironment::new(
        Arc::new(SystemClock),
        Arc::new(RandomIdGenerator),
    ));
    let guard = TicketGuard::new(state, env);

    tracing::info!("🎫 Scanner ready. Type a ticket code or :quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line.split_once(' ').unwrap_or((line, "")) {
            (":quit" | ":q", _) => break,
            (":stats", _) => print_json(&guard.stats().await)?,
            (":capacity", _) => {
                let info = guard.capacity_info(config.gate.venue_capacity).await;
                let look = info.status.presentation();
                println!(
                    "{} {} {}/{} ({}%), {} remaining",
                    look.icon.glyph(),
                    look.label,
                    info.current_attendance,
                    info.capacity,
                    info.percentage,
                    info.remaining
                );
            },
            (":recent", _) => print_json(
                &guard
                    .recent_check_ins(config.dashboard.recent_check_ins_limit)
                    .await,
            )?,
            (":fraud", _) => {
                print_json(&guard.fraud_alerts(config.dashboard.fraud_alerts_limit).await)?;
            },
            (":search", query) => print_json(&guard.search(query.trim()).await)?,
            (":types", _) => print_json(&guard.tickets_by_type().await)?,
            (":metrics", _) => match exporter.render() {
                Some(text) => println!("{text}"),
                None => println!("metrics recorder not installed"),
            },
            (command, _) if command.starts_with(':') => {
                println!("unknown command {command}");
            },
            _ => match QrCode::parse(line) {
                Ok(qr_code) => {
                    // Camera and decoder time
                    tokio::time::sleep(config.scanner.scan_latency()).await;
                    let result = guard.validate(qr_code).await?;
                    print_result(&result);
                },
                Err(ScanInputError::Blank) => {},
            },
        }
    }

    tracing::info!("Shutting down gracefully...");
    guard.shutdown(SHUTDOWN_TIMEOUT).await?;
    Ok(())
}

fn print_result(result: &ValidationResult) {
    let StatusPresentation { icon, label, .. } = result.status.presentation();
    println!("{} {label}: {}", icon.glyph(), result.message);

    if let Some(ticket) = &result.ticket {
        println!(
            "  {} {} <{}> [{}]",
            ticket.id, ticket.attendee_name, ticket.email, ticket.ticket_type
        );
    }
    if let Some(entry) = &result.fraud_log {
        println!("  fraud {} ({})", entry.id, entry.reason.as_str());
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
