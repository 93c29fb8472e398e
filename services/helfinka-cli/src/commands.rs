//! Sub-commands
//!
//! Each command is a thin call into the client and session crates; output
//! goes to stdout, diagnostics to the tracing subscriber.

use anyhow::{bail, Context as _};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use clap::{Parser, Subcommand};
use helfinka_client::HttpClient;
use helfinka_session::{NoteTagHistory, SessionManager, Theme, ThemePreference};
use helfinka_types::{
    add_tag, BpData, DatePreset, DateRange, EntryData, EntryType, HealthEntry, MedAction, MedData,
    NoteData, PasswordChange, ProfileUpdate, WeightData, WeightUnit,
};

#[derive(Parser, Debug)]
#[command(name = "helfinka", author, version, about = "Personal health diary")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and remember the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "HELFINKA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// End the session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Check the service is reachable
    Hello,
    /// Show the deployed API version
    Version,
    /// List entries in a date range
    List {
        /// Only entries of this type (BP, WEIGHT, MED, NOTE)
        #[arg(long = "type")]
        entry_type: Option<EntryType>,
        /// Quick range ending today: 3d, 7d, 14d, 28d, 3m, 12m
        #[arg(long, conflicts_with_all = ["from", "to"])]
        preset: Option<DatePreset>,
        /// First local day (YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,
        /// Last local day (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
    },
    /// Record a new entry
    Add {
        /// Observation time (RFC 3339), defaults to now
        #[arg(long, global = true)]
        at: Option<DateTime<Utc>>,
        #[command(subcommand)]
        entry: NewEntry,
    },
    /// Delete an entry by its timestamp and type
    Delete {
        #[arg(long)]
        timestamp: String,
        #[arg(long = "type")]
        entry_type: EntryType,
    },
    /// Change email and/or display name
    Profile {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        display_name: Option<String>,
    },
    /// Change password
    Password {
        #[arg(long, env = "HELFINKA_OLD_PASSWORD", hide_env_values = true)]
        old: String,
        #[arg(long, env = "HELFINKA_NEW_PASSWORD", hide_env_values = true)]
        new: String,
        #[arg(long, env = "HELFINKA_CONFIRM_PASSWORD", hide_env_values = true)]
        confirm: String,
    },
    /// Suggest note tags
    Tags {
        /// Tags already chosen, left out of the suggestions
        #[arg(long = "selected")]
        selected: Vec<String>,
    },
    /// Show or change the colour theme
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },
}

#[derive(Subcommand, Debug)]
pub enum NewEntry {
    /// Blood pressure
    Bp {
        #[arg(long)]
        systolic: i32,
        #[arg(long)]
        diastolic: i32,
        #[arg(long)]
        heart_rate: i32,
        #[arg(long)]
        context: Option<String>,
    },
    /// Body weight
    Weight {
        #[arg(long)]
        value: f64,
        #[arg(long, default_value = "kg")]
        unit: WeightUnit,
    },
    /// Medication change
    Med {
        #[arg(long)]
        name: String,
        #[arg(long)]
        dosage: String,
        #[arg(long)]
        frequency: String,
        /// PRESCRIBED or STOPPED
        #[arg(long)]
        action: MedAction,
    },
    /// Free-text note
    Note {
        #[arg(long)]
        text: String,
        /// Tag to attach; repeatable
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ThemeAction {
    /// Switch between light and dark
    Toggle,
    /// Use the light theme
    Light,
    /// Use the dark theme
    Dark,
}

/// Everything a command may need
pub struct App {
    pub client: HttpClient,
    pub session: SessionManager,
    pub tags: NoteTagHistory,
    pub theme: ThemePreference,
}

pub async fn run(command: Command, app: &App) -> anyhow::Result<()> {
    match command {
        Command::Login { email, password } => {
            let user = app
                .session
                .login(&email, &password)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("Logged in as {} <{}>", user.display_name, user.email);
        }
        Command::Logout => {
            app.session.logout().await;
            println!("Logged out");
        }
        Command::Whoami => match app.session.current_user() {
            Some(user) => println!("{} <{}> ({})", user.display_name, user.email, user.id),
            None => println!("Not logged in"),
        },
        Command::Hello => {
            let hello = app.client.auth().hello().await?;
            println!("{}", hello.message);
        }
        Command::Version => {
            let info = app.client.auth().version().await?;
            println!("{} ({}, built {})", info.version, info.environment, info.built);
        }
        Command::List {
            entry_type,
            preset,
            from,
            to,
        } => {
            require_session(app)?;
            let range = resolve_range(preset, from, to, Local::now().date_naive())?;
            let entries = match entry_type {
                Some(entry_type) => app.client.entries().list_by_type(entry_type, &range).await,
                None => app.client.entries().list(&range).await,
            }
            .map_err(|e| anyhow::anyhow!(e.user_message()))?;

            if entries.is_empty() {
                println!("No entries");
            }
            for entry in &entries {
                println!("{}", describe(entry, &Local));
            }
        }
        Command::Add { at, entry } => {
            require_session(app)?;
            let data = build_entry(entry)?;
            let tags = match &data {
                EntryData::Note(note) => note.tags.clone(),
                _ => Vec::new(),
            };
            let entry_type = data.entry_type();

            app.client
                .entries()
                .create(data, at.unwrap_or_else(Utc::now))
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            if !tags.is_empty() {
                app.tags.record(&tags);
            }
            println!("Recorded {entry_type} entry");
        }
        Command::Delete {
            timestamp,
            entry_type,
        } => {
            require_session(app)?;
            app.client
                .entries()
                .delete(&timestamp, entry_type)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("Deleted {entry_type} entry at {timestamp}");
        }
        Command::Profile {
            email,
            display_name,
        } => {
            let current = app.session.current_user().context("Not logged in")?;
            let email = email.unwrap_or_else(|| current.email.clone());
            let display_name = display_name.unwrap_or_else(|| current.display_name.clone());

            let Some(update) = ProfileUpdate::diff(&current, &email, &display_name) else {
                println!("Nothing to update");
                return Ok(());
            };
            let user = app
                .client
                .users()
                .update_profile(&current.id, update)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            app.session.update_user(user.clone());
            println!("Profile updated: {} <{}>", user.display_name, user.email);
        }
        Command::Password { old, new, confirm } => {
            let current = app.session.current_user().context("Not logged in")?;
            let change = PasswordChange::with_confirmation(old, new, &confirm)?;
            app.client
                .users()
                .update_password(&current.id, change)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("Password changed");
        }
        Command::Tags { selected } => {
            let mut normalized = Vec::new();
            for tag in &selected {
                add_tag(&mut normalized, tag);
            }
            for tag in app.tags.suggestions(&normalized) {
                println!("{tag}");
            }
        }
        Command::Theme { action } => {
            let theme = match action {
                None => app.theme.get(),
                Some(ThemeAction::Toggle) => app.theme.toggle(),
                Some(ThemeAction::Light) => set_theme(app, Theme::Light),
                Some(ThemeAction::Dark) => set_theme(app, Theme::Dark),
            };
            println!("{theme}");
        }
    }

    Ok(())
}

fn require_session(app: &App) -> anyhow::Result<()> {
    if !app.session.is_authenticated() {
        bail!("Not logged in. Run `helfinka login` first.");
    }
    Ok(())
}

fn set_theme(app: &App, theme: Theme) -> Theme {
    app.theme.set(theme);
    theme
}

/// Preset, explicit days, or the last 7 days
pub fn resolve_range(
    preset: Option<DatePreset>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> anyhow::Result<DateRange> {
    match (preset, from, to) {
        (Some(preset), _, _) => Ok(DateRange::preset(preset, today, &Local)),
        (None, Some(from), Some(to)) => Ok(DateRange::from_local_dates(from, to, &Local)?),
        (None, None, None) => Ok(DateRange::preset(DatePreset::SevenDays, today, &Local)),
        _ => bail!("--from and --to must be given together"),
    }
}

/// Turn command-line fields into a payload; validation happens on create
pub fn build_entry(entry: NewEntry) -> anyhow::Result<EntryData> {
    let data = match entry {
        NewEntry::Bp {
            systolic,
            diastolic,
            heart_rate,
            context,
        } => EntryData::Bp(BpData {
            systolic,
            diastolic,
            heart_rate,
            context,
        }),
        NewEntry::Weight { value, unit } => EntryData::Weight(WeightData { value, unit }),
        NewEntry::Med {
            name,
            dosage,
            frequency,
            action,
        } => EntryData::Med(MedData {
            name,
            dosage,
            frequency,
            action,
        }),
        NewEntry::Note { text, tags: raw } => {
            let mut tags = Vec::new();
            for tag in &raw {
                if !add_tag(&mut tags, tag) {
                    tracing::debug!(tag = %tag, "Skipping blank or repeated tag");
                }
            }
            EntryData::Note(NoteData { text, tags })
        }
    };
    Ok(data)
}

/// One-line summary of an entry
/// One-line summary of an entry, with its time shown in `tz`
pub fn describe<Tz: TimeZone>(entry: &HealthEntry, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let detail = match &entry.data {
        EntryData::Bp(bp) => {
            let mut line = format!("{}/{} mmHg, {} bpm", bp.systolic, bp.diastolic, bp.heart_rate);
            if let Some(context) = &bp.context {
                line.push_str(&format!(" ({context})"));
            }
            line
        }
        EntryData::Weight(weight) => format!("{} {}", weight.value, weight.unit),
        EntryData::Med(med) => format!(
            "{} {} {}, {}",
            med.action, med.name, med.dosage, med.frequency
        ),
        EntryData::Note(note) if note.tags.is_empty() => note.text.clone(),
        EntryData::Note(note) => format!("{} [{}]", note.text, note.tags.join(", ")),
    };
    let when = match entry.recorded_at() {
        Some(at) => at.with_timezone(tz).format("%Y-%m-%d %H:%M").to_string(),
        None => entry.timestamp.clone(),
    };
    format!("{}  {:<6}  {}", when, entry.entry_type().as_str(), detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use helfinka_types::stored_item;

    fn parse(args: &[&str]) -> Command {
        Cli::try_parse_from(args).unwrap().command
    }

    #[test]
    fn test_parse_list_preset() {
        match parse(&["helfinka", "list", "--type", "BP", "--preset", "3m"]) {
            Command::List {
                entry_type, preset, ..
            } => {
                assert_eq!(entry_type, Some(EntryType::Bp));
                assert_eq!(preset, Some(DatePreset::ThreeMonths));
            }
            other => panic!("Expected List, got: {:?}", other),
        }
    }

    #[test]
    fn test_list_range_flags_conflict() {
        assert!(Cli::try_parse_from(["helfinka", "list", "--from", "2024-01-01"]).is_err());
        assert!(Cli::try_parse_from([
            "helfinka", "list", "--preset", "7d", "--from", "2024-01-01", "--to", "2024-01-02"
        ])
        .is_err());
    }

    #[test]
    fn test_resolve_range() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();

        let range = resolve_range(None, None, None, today).unwrap();
        assert_eq!(range, DateRange::preset(DatePreset::SevenDays, today, &Local));

        let from = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let range = resolve_range(None, Some(from), Some(today), today).unwrap();
        assert_eq!(range, DateRange::from_local_dates(from, today, &Local).unwrap());

        assert!(resolve_range(None, Some(today), Some(from), today).is_err());
    }

    #[test]
    fn test_build_note_normalises_tags() {
        let entry = match parse(&[
            "helfinka", "add", "note", "--text", "rough night", "--tag", "low mood", "--tag",
            "LOW_MOOD", "--tag", "insomnia",
        ]) {
            Command::Add { entry, .. } => entry,
            other => panic!("Expected Add, got: {:?}", other),
        };

        match build_entry(entry).unwrap() {
            EntryData::Note(note) => assert_eq!(note.tags, ["LOW_MOOD", "INSOMNIA"]),
            other => panic!("Expected note, got: {:?}", other),
        }
    }

    #[test]
    fn test_parse_weight_and_med() {
        match parse(&["helfinka", "add", "weight", "--value", "72.5"]) {
            Command::Add {
                entry: NewEntry::Weight { value, unit },
                at: None,
            } => {
                assert_eq!(value, 72.5);
                assert_eq!(unit, WeightUnit::Kg);
            }
            other => panic!("Expected weight, got: {:?}", other),
        }

        assert!(Cli::try_parse_from([
            "helfinka", "add", "med", "--name", "X", "--dosage", "1", "--frequency", "daily",
            "--action", "paused"
        ])
        .is_err());
    }

    #[test]
    fn test_describe_entries() {
        let item = stored_item(
            "USER#u-1",
            "2024-01-02T03:04:05.000Z",
            &EntryData::Bp(BpData {
                systolic: 120,
                diastolic: 80,
                heart_rate: 60,
                context: Some("morning".to_string()),
            }),
        );
        let entry = helfinka_types::decode_entry(&item).unwrap();
        assert_eq!(
            describe(&entry, &Utc),
            "2024-01-02 03:04  BP      120/80 mmHg, 60 bpm (morning)"
        );

        let plus_two = chrono::FixedOffset::east_opt(2 * 3600).unwrap();
        assert!(describe(&entry, &plus_two).starts_with("2024-01-02 05:04  BP"));
    }
}
