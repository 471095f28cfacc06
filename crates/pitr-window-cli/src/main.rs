use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use pitr_window::calendar::parse_day;
use pitr_window::{
    allowed_ranges_for_day, allowed_ranges_label, can_go_next, can_go_previous,
    is_day_within_window, month_grid, parse_timestamp, restore_target_time, to_iso_string,
    AllowedRange, CalendarDay, CalendarMonth, Candidate, PitrError, PitrWindow, RecoveryGap,
    RecoveryInterval, Timeline, WeekStartDay, WindowOptions, WindowStatus,
    DEFAULT_MERGE_TOLERANCE_MS,
};

#[derive(Parser)]
#[command(
    name = "pitr-window",
    about = "Inspect point-in-time recovery windows and check restore targets",
    version
)]
struct Cli {
    /// Maximum gap in milliseconds still treated as continuous
    #[arg(long, global = true, default_value_t = DEFAULT_MERGE_TOLERANCE_MS)]
    merge_tolerance_ms: i64,

    /// First day of the week in calendar output
    #[arg(long, global = true, value_enum, default_value_t = WeekStart::Monday)]
    week_start: WeekStart,

    /// Log filter used when RUST_LOG is unset (e.g. "debug", "pitr_window=trace")
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the merged recovery timeline
    Timeline(InputArgs),
    /// Check whether an instant is recoverable and print the restore target
    Validate(ValidateArgs),
    /// Print the recoverable ranges within one UTC day
    Day(DayArgs),
    /// Print the calendar grid and navigation bounds for one month
    Month(MonthArgs),
}

#[derive(Args)]
struct InputArgs {
    /// Window descriptor JSON file (reads stdin when omitted or "-")
    input: Option<PathBuf>,
}

#[derive(Args)]
struct ValidateArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Candidate timestamp; UTC is assumed when no offset is given
    #[arg(long, conflicts_with_all = ["date", "time"])]
    at: Option<String>,

    /// Candidate day (YYYY-MM-DD), combined with --time
    #[arg(long)]
    date: Option<String>,

    /// Candidate time of day (HH:MM:SS), default midnight; each field is
    /// clamped to its range
    #[arg(long, requires = "date")]
    time: Option<String>,
}

#[derive(Args)]
struct DayArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Day to inspect (YYYY-MM-DD)
    #[arg(long)]
    date: String,
}

#[derive(Args)]
struct MonthArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Month to display (YYYY-MM); defaults to the month of the latest recoverable time
    #[arg(long)]
    month: Option<String>,

    /// Selected day (YYYY-MM-DD)
    #[arg(long)]
    selected: Option<String>,

    /// Day to flag as today (YYYY-MM-DD); defaults to the current UTC date
    #[arg(long)]
    today: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum WeekStart {
    Monday,
    Sunday,
}

impl From<WeekStart> for WeekStartDay {
    fn from(value: WeekStart) -> Self {
        match value {
            WeekStart::Monday => WeekStartDay::Monday,
            WeekStart::Sunday => WeekStartDay::Sunday,
        }
    }
}

// ── Output shapes ───────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TimelineReport<'a> {
    available: bool,
    status: WindowStatus,
    reported_status: Option<&'a str>,
    unavailable_reason: Option<&'a str>,
    earliest: Option<String>,
    latest: Option<String>,
    intervals: &'a [RecoveryInterval],
    gaps: Vec<RecoveryGap>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidateReport {
    candidate: String,
    is_valid: bool,
    message: Option<String>,
    restore_target: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DayReport {
    date: NaiveDate,
    in_range: bool,
    ranges: Vec<AllowedRange>,
    label: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MonthReport {
    month: String,
    can_go_previous: bool,
    can_go_next: bool,
    days: Vec<CalendarDay>,
}

// ── Commands ────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let options = WindowOptions {
        merge_tolerance_ms: cli.merge_tolerance_ms,
        week_start: cli.week_start.into(),
    };

    match &cli.command {
        Command::Timeline(args) => {
            let window = read_window(args)?;
            let timeline = window.timeline(&options);
            print_json(&timeline_report(&window, &timeline))
        }
        Command::Validate(args) => {
            let window = read_window(&args.input)?;
            let timeline = window.timeline(&options);
            let report = validate_report(args, &timeline)?;
            let is_valid = report.is_valid;
            print_json(&report)?;
            if !is_valid {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Day(args) => {
            let window = read_window(&args.input)?;
            let timeline = window.timeline(&options);
            let date = parse_day(&args.date)?;
            let ranges = allowed_ranges_for_day(date, &timeline);
            print_json(&DayReport {
                date,
                in_range: is_day_within_window(date, &timeline),
                label: allowed_ranges_label(&ranges),
                ranges,
            })
        }
        Command::Month(args) => {
            let window = read_window(&args.input)?;
            let timeline = window.timeline(&options);
            print_json(&month_report(args, &timeline, options.week_start)?)
        }
    }
}

fn timeline_report<'a>(window: &'a PitrWindow, timeline: &'a Timeline) -> TimelineReport<'a> {
    TimelineReport {
        available: window.available,
        status: timeline.status(),
        reported_status: window.status.as_deref(),
        unavailable_reason: window.unavailable_reason.as_deref(),
        earliest: timeline.earliest().map(to_iso_string),
        latest: timeline.latest().map(to_iso_string),
        intervals: timeline.intervals(),
        gaps: timeline.gaps(),
    }
}

fn validate_report(args: &ValidateArgs, timeline: &Timeline) -> Result<ValidateReport> {
    let candidate = match (&args.at, &args.date) {
        (Some(at), _) => {
            parse_timestamp(at).ok_or_else(|| anyhow!("cannot parse timestamp '{at}'"))?
        }
        (None, Some(date)) => {
            let day = parse_day(date)?;
            let mut fields = args.time.as_deref().unwrap_or("00:00:00").splitn(3, ':');
            let hour = fields.next().unwrap_or("");
            let minute = fields.next().unwrap_or("");
            let second = fields.next().unwrap_or("");
            Candidate::from_text_fields(day, hour, minute, second).instant()
        }
        (None, None) => match Candidate::default_for(timeline) {
            Some(candidate) => candidate.instant(),
            None => bail!("no candidate given and the window holds no recoverable whole second"),
        },
    };

    let (restore_target, message) = match restore_target_time(candidate, timeline) {
        Ok(target) => (Some(target), None),
        Err(PitrError::NotRecoverable(message)) => (None, Some(message)),
        Err(e) => return Err(e.into()),
    };
    Ok(ValidateReport {
        candidate: to_iso_string(candidate),
        is_valid: restore_target.is_some(),
        message,
        restore_target,
    })
}

fn month_report(
    args: &MonthArgs,
    timeline: &Timeline,
    week_start: WeekStartDay,
) -> Result<MonthReport> {
    let today = match &args.today {
        Some(s) => parse_day(s)?,
        None => Utc::now().date_naive(),
    };
    let displayed = match (&args.month, timeline.latest()) {
        (Some(s), _) => CalendarMonth::parse(s)?,
        (None, Some(latest)) => CalendarMonth::containing_instant(latest),
        (None, None) => CalendarMonth::containing(today),
    };
    let selected = args.selected.as_deref().map(parse_day).transpose()?;

    Ok(MonthReport {
        month: displayed.to_string(),
        can_go_previous: can_go_previous(displayed, timeline),
        can_go_next: can_go_next(displayed, timeline),
        days: month_grid(displayed, timeline, selected, today, week_start),
    })
}

// ── Plumbing ────────────────────────────────────────────────────────────────

fn init_tracing(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}

fn read_window(args: &InputArgs) -> Result<PitrWindow> {
    let json = match &args.input {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };
    tracing::debug!(bytes = json.len(), "read window descriptor");
    PitrWindow::from_json(&json).context("failed to decode window descriptor")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{out}");
    Ok(())
}
