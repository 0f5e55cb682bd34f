//! `gather` CLI — solve group availability from a JSON group description.
//!
//! Useful for replaying real group data outside the web application when
//! debugging availability questions.
//!
//! ## Usage
//!
//! ```sh
//! # Shared availability windows for a group file
//! gather solve -i group.json --day 2026-03-16
//!
//! # Same, as JSON
//! gather solve -i group.json --day 2026-03-16 --json
//!
//! # One member's merged busy and free spans for the day
//! gather free -i group.json --member ana --day 2026-03-16
//!
//! # Reads from stdin when -i is omitted
//! cat group.json | gather solve --day 2026-03-16
//! ```
//!
//! Group file format:
//!
//! ```json
//! {
//!   "members": [
//!     {
//!       "name": "ana",
//!       "busy": [{"start": "2026-03-16T09:00:00Z", "end": "2026-03-16T10:00:00Z"}],
//!       "sleep": {"start": "23:00", "end": "07:00"}
//!     }
//!   ]
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::io::{self, Read};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use gather_engine::interval::{day_bounds, free_within, merge_overlapping, TimeSpan};
use gather_engine::{
    AvailabilityEngine, BusyInterval, EngineConfig, MemberId, MemoryMemberData, MemoryWindowStore,
    SleepWindow,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "gather", version, about = "Group availability solver")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute shared availability windows for the whole group
    Solve {
        /// Input group file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Target day, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        day: Option<NaiveDate>,
        /// Reference IANA timezone defining the day bounds
        #[arg(long, default_value = "UTC")]
        timezone: String,
        /// Minimum number of simultaneously free members
        #[arg(long, default_value_t = 2)]
        min_members: usize,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show one member's merged busy and free spans for the day
    Free {
        /// Input group file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Member name as it appears in the group file
        #[arg(long)]
        member: String,
        /// Target day, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        day: Option<NaiveDate>,
        /// Reference IANA timezone defining the day bounds
        #[arg(long, default_value = "UTC")]
        timezone: String,
    },
}

// ── Group file format ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct GroupFile {
    members: Vec<MemberEntry>,
}

#[derive(Deserialize)]
struct MemberEntry {
    name: String,
    #[serde(default)]
    busy: Vec<BusyEntry>,
    #[serde(default)]
    sleep: Option<SleepEntry>,
}

#[derive(Deserialize)]
struct BusyEntry {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct SleepEntry {
    start: String,
    end: String,
}

#[derive(Serialize)]
struct WindowOut {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    participants: Vec<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Solve {
            input,
            day,
            timezone,
            min_members,
            json,
        } => solve(input.as_deref(), day, &timezone, min_members, json),
        Commands::Free {
            input,
            member,
            day,
            timezone,
        } => free(input.as_deref(), &member, day, &timezone),
    }
}

fn solve(
    input: Option<&str>,
    day: Option<NaiveDate>,
    timezone: &str,
    min_members: usize,
    json: bool,
) -> Result<()> {
    let group_file = read_group(input)?;
    let tz = parse_tz(timezone)?;
    let day = day.unwrap_or_else(|| Utc::now().date_naive());

    let (names, data, group) = build_fixture(&group_file)?;
    let requester = *names
        .keys()
        .next()
        .context("group file contains no members")?;

    let config = EngineConfig {
        reference_tz: tz,
        min_members,
    };
    let engine = AvailabilityEngine::new(config, data, MemoryWindowStore::new());
    engine
        .recalculate(group, day)
        .with_context(|| format!("computing availability for {day}"))?;
    let windows = engine.group_availability(group, day, requester)?;

    if json {
        let out: Vec<WindowOut> = windows
            .iter()
            .map(|w| WindowOut {
                start: w.start,
                end: w.end,
                participants: w
                    .participants
                    .iter()
                    .map(|id| names[id].clone())
                    .collect(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if windows.is_empty() {
        println!("no shared windows on {day}");
        return Ok(());
    }
    for w in &windows {
        let participants: Vec<&str> = w.participants.iter().map(|id| names[id].as_str()).collect();
        println!(
            "{} .. {}  ({} min)  [{}]",
            w.start.to_rfc3339(),
            w.end.to_rfc3339(),
            (w.end - w.start).num_minutes(),
            participants.join(", ")
        );
    }
    Ok(())
}

fn free(input: Option<&str>, member: &str, day: Option<NaiveDate>, timezone: &str) -> Result<()> {
    let group_file = read_group(input)?;
    let tz = parse_tz(timezone)?;
    let day = day.unwrap_or_else(|| Utc::now().date_naive());

    let entry = group_file
        .members
        .iter()
        .find(|m| m.name == member)
        .with_context(|| format!("no member named '{member}' in the group file"))?;

    let (start, end) = day_bounds(day, tz)?;
    let window = TimeSpan::new(start, end);

    // Surface malformed entries instead of letting the merge drop them; a
    // debugging view that hides bad input defeats its purpose.
    let mut spans: Vec<TimeSpan> = Vec::with_capacity(entry.busy.len());
    for b in &entry.busy {
        if b.end < b.start {
            bail!(
                "member '{member}' has an inverted busy interval: {} .. {}",
                b.start.to_rfc3339(),
                b.end.to_rfc3339()
            );
        }
        spans.push(TimeSpan::new(b.start, b.end));
    }
    if let Some(sleep) = &entry.sleep {
        spans.extend(parse_sleep(sleep)?.to_absolute(start, end));
    }
    let busy = merge_overlapping(spans);
    let free = free_within(&busy, window);

    println!("busy:");
    for s in &busy {
        println!("  {} .. {}", s.start.to_rfc3339(), s.end.to_rfc3339());
    }
    println!("free:");
    for s in &free {
        println!("  {} .. {}", s.start.to_rfc3339(), s.end.to_rfc3339());
    }
    Ok(())
}

/// Build the in-memory fixture data source from the group file, assigning an
/// id to each named member.
fn build_fixture(
    group_file: &GroupFile,
) -> Result<(HashMap<MemberId, String>, MemoryMemberData, Uuid)> {
    let mut names: HashMap<MemberId, String> = HashMap::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let group = Uuid::new_v4();

    let mut member_ids = Vec::with_capacity(group_file.members.len());
    let mut data = MemoryMemberData::new();

    for entry in &group_file.members {
        if !seen.insert(entry.name.as_str()) {
            bail!("duplicate member name '{}' in the group file", entry.name);
        }
        let id = Uuid::new_v4();
        names.insert(id, entry.name.clone());
        member_ids.push(id);

        data = data.with_busy(entry.busy.iter().map(|b| BusyInterval {
            owner: id,
            start: b.start,
            end: b.end,
        }));
        if let Some(sleep) = &entry.sleep {
            data = data.with_sleep(id, parse_sleep(sleep)?);
        }
    }

    data = data.with_group(group, &member_ids);
    Ok((names, data, group))
}

fn parse_sleep(entry: &SleepEntry) -> Result<SleepWindow> {
    Ok(SleepWindow::new(
        parse_time(&entry.start)?,
        parse_time(&entry.end)?,
    ))
}

fn parse_time(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .with_context(|| format!("invalid time of day '{s}' (expected HH:MM)"))
}

fn parse_tz(timezone: &str) -> Result<Tz> {
    timezone
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid IANA timezone '{timezone}'"))
}

fn read_group(input: Option<&str>) -> Result<GroupFile> {
    let raw = match input {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("reading group file from stdin")?;
            buf
        }
    };
    serde_json::from_str(&raw).context("parsing group file")
}
