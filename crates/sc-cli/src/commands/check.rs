//! Check command: fetch the presence timeline and report shift violations.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, SecondsFormat, Utc};
use clap::Args;
use sc_core::{
    AgentId, AgentTimeline, Analysis, PresenceEvent, TimeRange, Violation, ViolationKind, analyze,
};
use sc_zendesk::{TimelineFetcher, ZendeskClient, fallback_label, resolve_labels};
use serde::Serialize;

use crate::Config;
use crate::commands::range::RangeSpec;

const NOTIFICATION_TITLE: &str = "Shift Check";

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Range to check: `this`, `prev`, or `START_END` (e.g. 2025-03-03_2025-03-10).
    pub range: RangeSpec,

    /// Write raw, grouped and violation data to the configured dump file.
    #[arg(long)]
    pub dump: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &CheckArgs, config: &Config) -> Result<()> {
    config
        .compliance
        .validate()
        .context("invalid compliance settings")?;

    let range = args
        .range
        .resolve(Local::now(), config.week_start)
        .context("invalid range")?;
    writeln!(
        writer,
        "📅 Checking from {} to {}",
        format_timestamp(range.start),
        format_timestamp(range.end)
    )?;

    let credentials = config.credentials().map_err(|missing| {
        anyhow::anyhow!(
            "missing Zendesk credentials: set {} (environment or config.toml)",
            missing.join(", ")
        )
    })?;
    let client = ZendeskClient::new(credentials).context("failed to create Zendesk client")?;
    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;

    let fetcher = TimelineFetcher::new(&client);
    let events = runtime
        .block_on(fetcher.fetch(&range))
        .context("failed to fetch agent timeline")?;
    tracing::info!(
        pages = fetcher.pages_fetched(),
        events = events.len(),
        "timeline fetched"
    );

    let analysis = analyze(&events, &range, &config.compliance);

    if args.dump {
        write_dump(&config.dump_path, &range, &events, &analysis)?;
        tracing::info!(path = %config.dump_path.display(), "wrote diagnostic dump");
    }

    let labels = runtime.block_on(resolve_labels(&client, &analysis.violating_agents()));
    render_report(writer, &analysis.violations, &labels)?;

    if config.notify {
        notify("Schedule check completed");
    }

    Ok(())
}

/// Writes one line per violation, or a single all-clear line.
pub fn render_report<W: Write>(
    writer: &mut W,
    violations: &[Violation],
    labels: &BTreeMap<AgentId, String>,
) -> std::io::Result<()> {
    if violations.is_empty() {
        writeln!(writer, "✅ No shift violations detected.")?;
        return Ok(());
    }

    writeln!(writer, "⏰ Shift violations:")?;
    for violation in violations {
        let label = labels
            .get(&violation.agent_id)
            .cloned()
            .unwrap_or_else(|| fallback_label(violation.agent_id));
        writeln!(writer, "👤 {label} — {}", describe(violation))?;
    }
    Ok(())
}

/// Human-readable sentence for a violation's flag combination.
fn describe(violation: &Violation) -> String {
    let arrived = format_timestamp(violation.actual_start);
    let expected_start = format_timestamp(violation.expected_start);
    let left = format_timestamp(violation.actual_end);
    let expected_end = format_timestamp(violation.expected_end);

    let late = || format!("appeared at {arrived}, expected by {expected_start}");
    let too_early =
        || format!("appeared too early at {arrived}, shift starts at {expected_start}");
    let left_early = || format!("left early at {left}, shift ends at {expected_end}");

    let clauses = match violation.kind() {
        ViolationKind::Late => vec![late()],
        ViolationKind::TooEarly => vec![too_early()],
        ViolationKind::LeftEarly => vec![left_early()],
        ViolationKind::LateAndLeftEarly => vec![late(), left_early()],
        ViolationKind::TooEarlyAndLeftEarly => vec![too_early(), left_early()],
        ViolationKind::LateAndTooEarly => vec![late(), too_early()],
        ViolationKind::LateTooEarlyAndLeftEarly => vec![late(), too_early(), left_early()],
    };
    let sentence = clauses.join("; ");

    if violation.session_open {
        format!("{sentence} (no sign-off recorded)")
    } else {
        sentence
    }
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[derive(Serialize)]
struct Dump<'a> {
    range: &'a TimeRange,
    raw: &'a [PresenceEvent],
    grouped: &'a BTreeMap<AgentId, AgentTimeline>,
    sessions: &'a BTreeMap<AgentId, Vec<sc_core::Session>>,
    violations: &'a [Violation],
}

/// Writes the diagnostic dump as pretty JSON.
pub fn write_dump(
    path: &Path,
    range: &TimeRange,
    raw: &[PresenceEvent],
    analysis: &Analysis,
) -> Result<()> {
    let dump = Dump {
        range,
        raw,
        grouped: &analysis.timelines,
        sessions: &analysis.sessions,
        violations: &analysis.violations,
    };
    let json = serde_json::to_string_pretty(&dump).context("failed to serialize dump")?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Best-effort desktop notification. Failures are logged and ignored.
fn notify(message: &str) {
    if !cfg!(target_os = "macos") {
        tracing::debug!("desktop notifications are only supported on macOS");
        return;
    }

    let script = format!("display notification \"{message}\" with title \"{NOTIFICATION_TITLE}\"");
    match Command::new("osascript").arg("-e").arg(script).status() {
        Ok(status) if status.success() => {}
        Ok(status) => tracing::warn!(%status, "notification command failed"),
        Err(err) => tracing::warn!(error = %err, "failed to run osascript"),
    }
}
