//! Scripted end-to-end run of one engagement.

use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, Utc};
use clap::Args;
use lure_application::{InboundMessage, SessionOrchestrator};
use lure_core::callback::CallbackTransport;
use lure_core::config::EngagementConfig;
use lure_core::random::SeededSource;
use lure_core::reply::PlatformKind;
use lure_execution::SessionEvent;
use lure_infrastructure::InMemorySessionStore;
use lure_interaction::{DryRunTransport, HttpCallbackTransport, TacticReplyGenerator};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

/// Adversary messages used when no script file is given.
const DEFAULT_SCRIPT: &[&str] = &[
    "Dear customer, this is SBI fraud department. Your account will be blocked today due to KYC pending.",
    "Madam please verify immediately, otherwise legal action will be taken. Call 9876543210 for help.",
    "Share the OTP you received to complete verification. It is urgent.",
    "To stop the block pay Rs 4999 refundable fee to sbi.verify@ybl",
    "Or do bank transfer to account 123456789012 IFSC SBIN0001234",
    "Install AnyDesk so our officer can fix your account: https://sbi-kyc-update.in/verify",
    "Why are you not replying? Your account will be frozen in 1 hour.",
];

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Scam-type tag supplied by the upstream classifier
    #[arg(long, default_value = "bank_fraud")]
    scam_type: String,

    /// Platform the conversation happens on (sms, whatsapp, email)
    #[arg(long, default_value = "sms")]
    platform: String,

    /// Seed for every random draw, making the run reproducible
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// File with one adversary message per line
    #[arg(long)]
    script: Option<PathBuf>,

    /// Deliver the final report to the configured endpoint instead of logging it
    #[arg(long)]
    send: bool,

    /// Print the final report JSON
    #[arg(long)]
    show_report: bool,

    /// Stream the session's structured log events as JSON lines
    #[arg(long)]
    pub events: bool,
}

/// Prints every session event captured since the last call.
fn drain_events(events: &mut Option<UnboundedReceiver<SessionEvent>>) -> Result<()> {
    let Some(receiver) = events else {
        return Ok(());
    };
    while let Ok(event) = receiver.try_recv() {
        println!("{}", format_event(&event)?);
    }
    Ok(())
}

fn format_event(event: &SessionEvent) -> Result<String> {
    Ok(format!("     ~ {}", serde_json::to_string(event)?))
}

fn load_script(path: Option<&PathBuf>) -> Result<Vec<String>> {
    let Some(path) = path else {
        return Ok(DEFAULT_SCRIPT.iter().map(|line| line.to_string()).collect());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;
    let lines: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();
    anyhow::ensure!(!lines.is_empty(), "Script {} has no messages", path.display());
    Ok(lines)
}

pub async fn run(
    config_path: Option<PathBuf>,
    args: SimulateArgs,
    mut events: Option<UnboundedReceiver<SessionEvent>>,
) -> Result<()> {
    let config: EngagementConfig = super::config::load(config_path).await?;
    let script = load_script(args.script.as_ref())?;

    let dry_run = DryRunTransport::new();
    let transport: Arc<dyn CallbackTransport> = if args.send {
        Arc::new(HttpCallbackTransport::from_config(&config.callback).context("Failed to build HTTP client")?)
    } else {
        Arc::new(dry_run.clone())
    };

    let orchestrator = SessionOrchestrator::new(
        Arc::new(InMemorySessionStore::new()),
        transport,
        Arc::new(TacticReplyGenerator::new()),
        config,
    )
    .with_draw_source(Arc::new(SeededSource::new(args.seed)));

    let session_id = format!("sim-{}", Uuid::new_v4());
    let platform = PlatformKind::from_tag(&args.platform);
    let mut clock = Utc::now();
    tracing::info!(session_id = %session_id, seed = args.seed, send = args.send, "Simulation started");
    let mut reported = None;

    for (n, text) in script.iter().enumerate() {
        let outcome = orchestrator
            .handle_inbound(InboundMessage {
                session_id: session_id.clone(),
                scam_type: (n == 0).then(|| args.scam_type.clone()),
                platform,
                text: text.clone(),
                timestamp: clock,
            })
            .await?;
        if outcome.created {
            let summary = orchestrator.summary(&session_id).await?;
            println!("session {} as {} ({})", session_id, summary.persona_name, args.scam_type);
        }

        println!();
        println!("[{:>2}] adversary: {}", outcome.turn_index, text);
        for item in &outcome.new_items {
            println!("     + {}: {}", item.category, item.value);
        }
        if let Some(transition) = &outcome.transition {
            println!("     state {} -> {} ({})", transition.from, transition.to, transition.reason);
        }

        let reply = orchestrator.compose_reply(&session_id, outcome.turn_index).await?;
        drain_events(&mut events)?;
        println!(
            "     persona ({:.0}s later, {}): {}",
            outcome.reply_delay.as_secs_f64(),
            outcome.availability,
            reply.text
        );
        clock += ChronoDuration::from_std(outcome.reply_delay).unwrap_or_else(|_| ChronoDuration::zero())
            + ChronoDuration::seconds(30);

        if outcome.eligibility.is_some() {
            if let Some(callback) = orchestrator.finalize_if_eligible(&session_id).await? {
                drain_events(&mut events)?;
                println!("     report {} after {} attempt(s)", callback.status, callback.attempts);
                if callback.is_success() {
                    reported = Some(callback);
                    break;
                }
            }
        }
    }

    if reported.is_none() {
        orchestrator.kill(&session_id).await?;
        match orchestrator.finalize(&session_id).await {
            Ok(callback) => println!("report {} after {} attempt(s)", callback.status, callback.attempts),
            Err(error) => println!("report not submitted: {error}"),
        }
        drain_events(&mut events)?;
    }

    let summary = orchestrator.summary(&session_id).await?;
    println!();
    println!(
        "final: state {} status {} turns {} items {} completeness {:.2}",
        summary.state,
        summary.status,
        summary.total_turns,
        summary.intelligence_count,
        summary.completeness_score
    );

    if args.show_report {
        for report in dry_run.delivered().await {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
