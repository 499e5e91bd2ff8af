use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use pilltrack_core::session::{CURRENT_USER_KEY, NOTIFICATIONS_ENABLED_KEY};
use pilltrack_core::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pilltrack")]
#[command(about = "Medication course tracking and dose reminders", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Act as this user instead of the logged-in one
    #[arg(long, global = true)]
    user: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Set the current user
    Login {
        /// User identifier
        user: String,
    },

    /// Add a medication course
    Add {
        /// Display name
        #[arg(long)]
        name: String,

        /// Interval hours component
        #[arg(long, default_value_t = 0)]
        hours: u32,

        /// Interval minutes component
        #[arg(long, default_value_t = 0)]
        minutes: u32,

        /// Free-text notes
        #[arg(long, default_value = "")]
        notes: String,

        /// Pill colour (yellow, red, green, blue, pink, cyan)
        #[arg(long)]
        color: Option<String>,

        /// Anchor instant for the dose grid (RFC 3339, defaults to now)
        #[arg(long)]
        anchor: Option<String>,

        /// Course start (RFC 3339, defaults to now)
        #[arg(long)]
        start: Option<String>,

        /// Course end (RFC 3339)
        #[arg(long)]
        end: Option<String>,

        /// Disable reminders for this pill
        #[arg(long)]
        no_notifications: bool,
    },

    /// List pills with next dose and remaining time
    List,

    /// Edit fields of an existing pill
    Edit {
        /// Pill id
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        hours: Option<u32>,

        #[arg(long)]
        minutes: Option<u32>,

        #[arg(long)]
        notes: Option<String>,

        #[arg(long)]
        color: Option<String>,

        #[arg(long)]
        anchor: Option<String>,

        #[arg(long)]
        end: Option<String>,

        /// Enable or disable reminders (true/false)
        #[arg(long)]
        notifications: Option<bool>,
    },

    /// Remove a pill
    Remove {
        /// Pill id
        id: String,
    },

    /// Run one evaluation tick: dispatch due reminders, delete expired courses
    Check,

    /// Poll repeatedly, running a check on each tick
    Watch {
        /// Run a single tick and exit
        #[arg(long)]
        once: bool,
    },

    /// Roll the reminder log up into the CSV history
    Rollup {
        /// Remove processed log files afterwards
        #[arg(long)]
        cleanup: bool,
    },

    /// Turn all reminders on or off for this device
    Notifications {
        /// "on" or "off"
        state: String,
    },
}

fn main() -> Result<()> {
    pilltrack_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    std::fs::create_dir_all(&data_dir)?;

    let mut session = FileSessionStore::new(&data_dir);

    match cli.command {
        Commands::Login { user } => {
            session.set(CURRENT_USER_KEY, &user)?;
            println!("Logged in as {}", user);
            Ok(())
        }
        Commands::Add {
            name,
            hours,
            minutes,
            notes,
            color,
            anchor,
            start,
            end,
            no_notifications,
        } => {
            let user = resolve_user(cli.user, &session)?;
            cmd_add(
                &data_dir,
                &user,
                name,
                hours,
                minutes,
                notes,
                color,
                anchor,
                start,
                end,
                no_notifications,
            )
        }
        Commands::List => {
            let user = resolve_user(cli.user, &session)?;
            cmd_list(&data_dir, &user)
        }
        Commands::Edit {
            id,
            name,
            hours,
            minutes,
            notes,
            color,
            anchor,
            end,
            notifications,
        } => {
            let user = resolve_user(cli.user, &session)?;
            cmd_edit(
                &data_dir,
                &user,
                &id,
                name,
                hours,
                minutes,
                notes,
                color,
                anchor,
                end,
                notifications,
            )
        }
        Commands::Remove { id } => {
            let user = resolve_user(cli.user, &session)?;
            let mut store = JsonStore::new(&data_dir);
            store.delete(&user, &id)?;
            println!("Removed pill {}", id);
            Ok(())
        }
        Commands::Check => {
            let user = resolve_user(cli.user, &session)?;
            cmd_check(&data_dir, &user, &session, &config)
        }
        Commands::Watch { once } => {
            let user = resolve_user(cli.user, &session)?;
            cmd_watch(&data_dir, &user, &session, &config, once)
        }
        Commands::Rollup { cleanup } => cmd_rollup(&data_dir, cleanup),
        Commands::Notifications { state } => {
            let value = match state.as_str() {
                "on" => "true",
                "off" => "false",
                other => {
                    return Err(Error::Other(format!(
                        "expected 'on' or 'off', got '{}'",
                        other
                    )))
                }
            };
            session.set(NOTIFICATIONS_ENABLED_KEY, value)?;
            println!("Notifications turned {}", state);
            Ok(())
        }
    }
}

/// Pick the acting user: --user flag, then the session store
fn resolve_user(flag: Option<String>, session: &FileSessionStore) -> Result<String> {
    if let Some(user) = flag {
        return Ok(user);
    }

    session.get(CURRENT_USER_KEY)?.ok_or_else(|| {
        Error::Other("no user logged in; run `pilltrack login <user>` or pass --user".into())
    })
}

#[allow(clippy::too_many_arguments)]
fn cmd_add(
    data_dir: &PathBuf,
    user: &str,
    name: String,
    hours: u32,
    minutes: u32,
    notes: String,
    color: Option<String>,
    anchor: Option<String>,
    start: Option<String>,
    end: Option<String>,
    no_notifications: bool,
) -> Result<()> {
    let mut store = JsonStore::new(data_dir);
    let now = Utc::now();

    // Next display slot: one past the current maximum, first pill gets 1
    let existing = store.list(user)?;
    let order = existing.iter().map(|p| p.order).max().unwrap_or(0) + 1;

    let mut pill = Pill::new(name, now, order);
    pill.interval_hours = hours;
    pill.interval_minutes = minutes;
    pill.notes = notes;
    pill.notifications_enabled = !no_notifications;

    if let Some(ref c) = color {
        pill.color = parse_color(c)?;
    }
    if let Some(ref a) = anchor {
        pill.anchor = parse_timestamp(a)?;
    }
    if let Some(ref s) = start {
        pill.start_date = parse_timestamp(s)?;
    }
    if let Some(ref e) = end {
        pill.end_date = Some(parse_timestamp(e)?);
    }

    let id = store.create(user, pill)?;
    println!("✓ Added pill {}", id);
    Ok(())
}

fn cmd_list(data_dir: &PathBuf, user: &str) -> Result<()> {
    let store = JsonStore::new(data_dir);
    let pills = store.list(user)?;

    if pills.is_empty() {
        println!("No pills tracked for {}.", user);
        return Ok(());
    }

    let now = Utc::now();
    for pill in &pills {
        let id = pill.id.as_deref().unwrap_or("-");

        if is_expired(pill, now) {
            println!("  {}  {}  [course ended]", id, pill.name);
            continue;
        }

        let next = next_dose_time(pill, now)?;
        let remaining = remaining_time(pill, now)?;
        let bell = if pill.notifications_enabled { "" } else { "  (muted)" };

        println!(
            "  {}  {}  next dose {}  in {}{}",
            id,
            pill.name,
            next.to_rfc3339(),
            remaining,
            bell
        );
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_edit(
    data_dir: &PathBuf,
    user: &str,
    id: &str,
    name: Option<String>,
    hours: Option<u32>,
    minutes: Option<u32>,
    notes: Option<String>,
    color: Option<String>,
    anchor: Option<String>,
    end: Option<String>,
    notifications: Option<bool>,
) -> Result<()> {
    let mut store = JsonStore::new(data_dir);

    let pills = store.list(user)?;
    let mut pill = pills
        .into_iter()
        .find(|p| p.id.as_deref() == Some(id))
        .ok_or_else(|| Error::Store(format!("no pill with id {} for user {}", id, user)))?;

    if let Some(name) = name {
        pill.name = name;
    }
    if let Some(hours) = hours {
        pill.interval_hours = hours;
    }
    if let Some(minutes) = minutes {
        pill.interval_minutes = minutes;
    }
    if let Some(notes) = notes {
        pill.notes = notes;
    }
    if let Some(ref c) = color {
        pill.color = parse_color(c)?;
    }
    if let Some(ref a) = anchor {
        pill.anchor = parse_timestamp(a)?;
    }
    if let Some(ref e) = end {
        pill.end_date = Some(parse_timestamp(e)?);
    }
    if let Some(enabled) = notifications {
        pill.notifications_enabled = enabled;
    }

    store.update(user, id, pill)?;
    println!("✓ Updated pill {}", id);
    Ok(())
}

fn cmd_check(
    data_dir: &PathBuf,
    user: &str,
    session: &FileSessionStore,
    config: &Config,
) -> Result<()> {
    run_tick(data_dir, user, session, config, Utc::now())
}

fn cmd_watch(
    data_dir: &PathBuf,
    user: &str,
    session: &FileSessionStore,
    config: &Config,
    once: bool,
) -> Result<()> {
    let cadence = std::time::Duration::from_secs(config.reminder.poll_interval_secs);

    loop {
        run_tick(data_dir, user, session, config, Utc::now())?;

        if once {
            return Ok(());
        }

        std::thread::sleep(cadence);
    }
}

/// One polling tick: evaluate, dispatch due reminders, delete expired courses
fn run_tick(
    data_dir: &PathBuf,
    user: &str,
    session: &FileSessionStore,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<()> {
    let mut store = JsonStore::new(data_dir);
    let pills = store.list(user)?;

    let outcome = evaluate(&pills, now, &config.reminder.title);

    // Device-wide switch gates every per-pill reminder
    let device_notifications = session
        .get(NOTIFICATIONS_ENABLED_KEY)?
        .map(|v| v == "true")
        .unwrap_or(true);

    if device_notifications {
        let log_path = data_dir.join("reminders").join("reminders.log");
        let mut sink = JsonlSink::new(&log_path);
        for request in &outcome.due {
            sink.dispatch(request)?;
            println!("🔔 {}: {}", request.title, request.body);
        }
    } else if !outcome.due.is_empty() {
        tracing::info!(
            "Suppressed {} due reminders (notifications off)",
            outcome.due.len()
        );
    }

    for pill in &outcome.expired {
        if let Some(ref id) = pill.id {
            store.delete(user, id)?;
        }
        println!("Course ended: you are done with {}.", pill.name);
    }

    Ok(())
}

fn cmd_rollup(data_dir: &PathBuf, cleanup: bool) -> Result<()> {
    let log_dir = data_dir.join("reminders");
    let log_path = log_dir.join("reminders.log");
    let csv_path = data_dir.join("reminders.csv");

    if !log_path.exists() {
        println!("No reminder log found - nothing to roll up.");
        return Ok(());
    }

    let count = pilltrack_core::export::log_to_csv_and_archive(&log_path, &csv_path)?;

    println!("✓ Rolled up {} reminders to CSV", count);
    println!("  CSV: {}", csv_path.display());

    if cleanup {
        let cleaned = pilltrack_core::export::cleanup_processed_logs(&log_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed log files", cleaned);
        }
    }

    Ok(())
}

fn parse_color(s: &str) -> Result<PillColor> {
    PillColor::parse(s).ok_or_else(|| {
        let names: Vec<_> = PillColor::all()
            .iter()
            .map(|c| c.name().to_lowercase())
            .collect();
        Error::Other(format!(
            "unknown colour '{}'; expected one of: {}",
            s,
            names.join(", ")
        ))
    })
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Other(format!("invalid timestamp '{}': {}", s, e)))
}
