// Weekly Schedule Application
// Main entry point

use std::io::{self, BufRead, Write};
use std::ops::ControlFlow;

use anyhow::{Context, Result};
use chrono::Local;

use weekly_schedule::app::commands::{Command, HELP};
use weekly_schedule::app::render::{render_notice, render_view, status_line};
use weekly_schedule::app::ScheduleApp;
use weekly_schedule::models::settings::AppConfig;
use weekly_schedule::services::schedule::edit::CommitOutcome;
use weekly_schedule::services::settings::{resolve_database_path, ConfigService};
use weekly_schedule::services::storage::{LocalStorage, MemoryStorage, SqliteStorage};
use weekly_schedule::services::sync::channel::{LocalOnlyChannel, RealtimeChannel};
use weekly_schedule::services::sync::firebase::FirebaseChannel;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    log::info!("Starting Weekly Schedule");

    let config_service = ConfigService::from_environment();
    let config = match config_service.load() {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Failed to load config, using defaults: {:#}", e);
            AppConfig::default()
        }
    };

    let mut app = ScheduleApp::from_config(&config, open_channel(&config), open_storage(&config));
    app.start();

    run_shell(&mut app)
}

fn open_storage(config: &AppConfig) -> Box<dyn LocalStorage> {
    let opened = resolve_database_path(config).and_then(|path| {
        SqliteStorage::open(&path.to_string_lossy())
            .with_context(|| format!("Failed to open local storage at {}", path.display()))
    });

    match opened {
        Ok(storage) => Box::new(storage),
        Err(e) => {
            log::warn!("{:#}; changes will not survive a restart", e);
            Box::new(MemoryStorage::new())
        }
    }
}

fn open_channel(config: &AppConfig) -> Box<dyn RealtimeChannel> {
    let Some(settings) = &config.realtime else {
        return Box::new(LocalOnlyChannel);
    };

    match FirebaseChannel::new(settings) {
        Ok(channel) => Box::new(channel),
        Err(e) => {
            log::warn!("Realtime database unavailable: {}", e);
            Box::new(LocalOnlyChannel)
        }
    }
}

fn run_shell(app: &mut ScheduleApp) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    app.pump_sync();
    println!("{}", render_view(&app.view(&Local::now())));
    println!("Type 'help' for commands.");
    flush_notices(app);

    loop {
        print!("> ");
        stdout.flush().context("Failed to flush stdout")?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).context("Failed to read command")? == 0 {
            break;
        }

        if line.trim().is_empty() {
            app.pump_sync();
            flush_notices(app);
            continue;
        }

        let flow = match line.parse::<Command>() {
            Ok(command) => {
                // `sync` pumps on its own so it can report what arrived.
                if command != Command::Sync {
                    app.pump_sync();
                }
                execute(app, command)
            }
            Err(e) => {
                app.pump_sync();
                println!("{}", e);
                ControlFlow::Continue(())
            }
        };

        flush_notices(app);
        if flow.is_break() {
            break;
        }
    }

    log::info!("Weekly Schedule closed");
    Ok(())
}

fn execute(app: &mut ScheduleApp, command: Command) -> ControlFlow<()> {
    match command {
        Command::Show => println!("{}", render_view(&app.view(&Local::now()))),
        Command::Edit => {
            app.enter_edit_mode();
            println!("{}", render_view(&app.view(&Local::now())));
        }
        Command::Open { day, time } => match app.open_modal(day, time) {
            Some(modal) => println!(
                "Editing {} {}: [{}] {}",
                modal.day, modal.time, modal.entry_type, modal.activity
            ),
            None => println!("Enter edit mode first ('edit')."),
        },
        Command::Set {
            day,
            time,
            entry_type,
            activity,
        } => report_commit(app.commit_entry(day, time, &activity, entry_type)),
        Command::Clear { day, time } => report_commit(app.clear_entry(day, time)),
        Command::Close => app.close_modal(),
        Command::Save => {
            if !app.save() {
                println!("Nothing to save; not in edit mode.");
            }
        }
        Command::Cancel => {
            if !app.cancel() {
                println!("Not in edit mode.");
            }
        }
        Command::Status => {
            println!("{}", status_line(&app.view(&Local::now())));
            if let Some(e) = app.sync().last_error() {
                println!("Last sync error: {}", e);
            }
        }
        Command::Sync => {
            let report = app.pump_sync();
            if report.is_empty() {
                println!("No pending updates.");
            }
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => return ControlFlow::Break(()),
    }

    ControlFlow::Continue(())
}

fn report_commit(outcome: CommitOutcome) {
    if outcome == CommitOutcome::Ignored {
        println!("Enter edit mode first ('edit').");
    }
}

fn flush_notices(app: &mut ScheduleApp) {
    for notice in app.take_notices() {
        println!("{}", render_notice(&notice));
    }
}
