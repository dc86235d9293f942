#[macro_use]
extern crate log;

use std::{io, sync::Arc, time::Duration};

use anyhow::bail;
use chrono::{DateTime, Local, NaiveDateTime, TimeDelta, Utc};
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use dotenv::dotenv;
use sleeptime::{
    ActivityStatus, DatabaseHandler, HttpHealthExporter, SleepTime, SyncOutcome,
    algo::{SleepWindow, helpers::format_hm::FormatHM},
    types::{ActivitySource, SleepPeriod, SleepSettings},
};
use tokio::sync::Notify;

#[derive(Parser)]
pub struct SleepTimeCli {
    #[arg(env, long, default_value = "sqlite://sleeptime.db?mode=rwc")]
    pub database_url: String,
    /// Shortest gap between activity, in hours, that counts as sleep
    #[arg(env, long, default_value_t = SleepSettings::DEFAULT_MIN_SLEEP_HOURS)]
    pub min_sleep_hours: f64,
    /// Hour at which the sleep window opens
    #[arg(env = "SLEEP_WINDOW_START", long, default_value_t = SleepSettings::DEFAULT_WINDOW_START)]
    pub window_start: u32,
    /// Hour at which the sleep window closes
    #[arg(env = "SLEEP_WINDOW_END", long, default_value_t = SleepSettings::DEFAULT_WINDOW_END)]
    pub window_end: u32,
    #[arg(env, long, default_value_t = true, action = ArgAction::Set)]
    pub health_sync_enabled: bool,
    #[clap(subcommand)]
    pub subcommand: SleepTimeCommand,
}

impl SleepTimeCli {
    fn settings(&self) -> SleepSettings {
        SleepSettings {
            min_sleep_hours: self.min_sleep_hours,
            window_start: self.window_start,
            window_end: self.window_end,
            health_sync_enabled: self.health_sync_enabled,
        }
    }
}

#[derive(Subcommand)]
pub enum SleepTimeCommand {
    ///
    /// Record that the app was opened, then look for sleep
    ///
    Open,
    ///
    /// Record a single activity timestamp
    ///
    Record {
        #[arg(long, default_value_t = ActivitySource::Foreground)]
        source: ActivitySource,
    },
    ///
    /// Record a background refresh timestamp
    ///
    Refresh,
    ///
    /// Record a background refresh timestamp periodically until interrupted
    ///
    Watch {
        #[arg(long, default_value_t = 30)]
        interval_minutes: u64,
    },
    ///
    /// Detect sleep from recent activity
    ///
    Detect,
    ///
    /// Show how much activity is recorded and the latest sleep
    ///
    Status,
    ///
    /// List detected sleep
    ///
    History {
        #[arg(long, default_value_t = 30)]
        days: i64,
    },
    ///
    /// Export sleep to the health store
    ///
    Sync {
        #[arg(long, env)]
        health_export_url: Option<String>,
        #[arg(long, env)]
        health_export_token: Option<String>,
        /// Export every period not exported yet instead of only the latest
        #[arg(long, conflicts_with = "start")]
        all: bool,
        /// Export the period starting in this minute, e.g. "2024-01-01 22:00"
        #[arg(long, value_parser = parse_local_minute)]
        start: Option<DateTime<Utc>>,
    },
    ///
    /// Generate shell completions
    ///
    Completions { shell: Shell },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(error) = dotenv() {
        println!("{}", error);
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .filter_module("sqlx::query", log::LevelFilter::Off)
        .filter_module("sea_orm_migration::migrator", log::LevelFilter::Off)
        .init();

    let cli = SleepTimeCli::parse();

    if let SleepTimeCommand::Completions { shell } = cli.subcommand {
        let mut command = SleepTimeCli::command();
        clap_complete::generate(shell, &mut command, "sleeptime", &mut io::stdout());
        return Ok(());
    }

    let settings = cli.settings();
    settings.validate()?;

    let db_handler = DatabaseHandler::new(cli.database_url).await;
    let app = SleepTime::new(db_handler, settings);

    match cli.subcommand {
        SleepTimeCommand::Open => {
            app.record_activity(ActivitySource::Foreground).await?;
            let detected = app.detect_sleep().await?;
            match detected.iter().max_by_key(|p| p.duration()) {
                Some(longest) => println!(
                    "Sleep detected! {} of sleep recorded.",
                    longest.duration().format_hm()
                ),
                None => println!("No sleep found in recent activity."),
            }
            Ok(())
        }
        SleepTimeCommand::Record { source } => {
            let activity = app.record_activity(source).await?;
            println!(
                "Recorded {} activity at {}",
                activity.source,
                activity.date.with_timezone(&Local).format_hm()
            );
            Ok(())
        }
        SleepTimeCommand::Refresh => {
            app.record_activity(ActivitySource::BackgroundRefresh).await?;
            Ok(())
        }
        SleepTimeCommand::Watch { interval_minutes } => {
            let stop = Arc::new(Notify::new());
            let handler_stop = stop.clone();
            ctrlc::set_handler(move || handler_stop.notify_one())?;

            let period = Duration::from_secs(interval_minutes.max(1) * 60);
            let mut interval = tokio::time::interval(period);
            info!(
                "recording background activity every {interval_minutes} minutes, sleep window {}",
                SleepWindow::new(app.settings.window_start, app.settings.window_end)
            );
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let refresh = app.record_activity(ActivitySource::BackgroundRefresh).await;
                        if let Err(error) = refresh {
                            error!("{}", error);
                        }
                    }
                    _ = stop.notified() => break,
                }
            }

            info!("stopped");
            Ok(())
        }
        SleepTimeCommand::Detect => {
            let detected = app.detect_sleep().await?;
            if detected.is_empty() {
                println!("No new sleep detected");
            }
            for period in &detected {
                print_period(period, false);
            }
            Ok(())
        }
        SleepTimeCommand::History { days } => {
            let history = app.history(days).await?;
            if history.is_empty() {
                println!("No sleep recorded in the last {} days", days);
            }
            for period in &history {
                let synced = app.database.is_synced(period).await?;
                print_period(period, synced);
            }
            Ok(())
        }
        SleepTimeCommand::Status => {
            print_status(&app.activity_status().await?);
            match app.database.get_latest_sleep().await? {
                Some(latest) => {
                    print!("Last sleep: ");
                    print_period(&latest, app.database.is_synced(&latest).await?);
                }
                None => println!("No sleep found yet"),
            }
            Ok(())
        }
        SleepTimeCommand::Sync {
            health_export_url,
            health_export_token,
            all,
            start,
        } => {
            let Some(exporter) =
                health_exporter(&app.settings, health_export_url, health_export_token)?
            else {
                println!("Health sync is disabled");
                return Ok(());
            };

            if all {
                let count = app.sync_pending(&exporter).await?;
                println!("Exported {} sleep periods", count);
                return Ok(());
            }

            let outcome = match start {
                Some(start) => {
                    let Some(period) = app
                        .database
                        .get_sleep_period_starting(start, start + TimeDelta::minutes(1))
                        .await?
                    else {
                        bail!("no sleep starts at {}", start.with_timezone(&Local));
                    };
                    app.sync_period(&exporter, &period).await?
                }
                None => app.sync_latest(&exporter).await?,
            };

            match outcome {
                SyncOutcome::Disabled => println!("Health sync is disabled"),
                SyncOutcome::NothingToSync => println!("No sleep to export"),
                SyncOutcome::AlreadySynced(_) => println!("Already exported"),
                SyncOutcome::Synced(period) => {
                    print!("Exported ");
                    print_period(&period, true);
                }
            }
            Ok(())
        }
        SleepTimeCommand::Completions { .. } => Ok(()),
    }
}

/// Export needs an endpoint only while it is enabled.
fn health_exporter(
    settings: &SleepSettings,
    url: Option<String>,
    token: Option<String>,
) -> anyhow::Result<Option<HttpHealthExporter>> {
    if !settings.health_sync_enabled {
        return Ok(None);
    }

    match url {
        Some(url) => Ok(Some(HttpHealthExporter::new(url, token))),
        None => bail!("health sync is enabled but no --health-export-url is set"),
    }
}

/// Parses a minute on the local clock, or any RFC 3339 instant.
fn parse_local_minute(value: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.to_utc());
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))?;
    match naive.and_local_timezone(Local).earliest() {
        Some(local) => Ok(local.to_utc()),
        None => bail!("{value} does not exist on the local clock"),
    }
}

fn print_status(status: &ActivityStatus) {
    match status.last {
        Some(last) => println!(
            "{} activity records, last {} at {} {}",
            status.count,
            last.source,
            last.date.with_timezone(&Local).date_naive(),
            last.date.with_timezone(&Local).format_hm()
        ),
        None => println!("No activity recorded yet"),
    }
}

fn print_period(period: &SleepPeriod, synced: bool) {
    let start = period.start().with_timezone(&Local);
    let end = period.end().with_timezone(&Local);
    println!(
        "{} {} -> {}  {:>7}  {}{}",
        start.date_naive(),
        start.format_hm(),
        end.format_hm(),
        period.duration().format_hm(),
        period.quality(),
        if synced { "  (synced)" } else { "" }
    );
}
