/*
 * This file is part of smctool.
 *
 * Copyright (C) 2025 smctool contributors
 *
 * smctool is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * smctool is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with smctool. If not, see <https://www.gnu.org/licenses/>.
 */

use std::io::stdout;

use clap::Parser;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::Terminal;
use tracing::{debug, info};

use smctool::app::App;
use smctool::cli::{Cli, Command};
use smctool::commands::{require_root, run_command};
use smctool::config::{load_config_from, load_saved_config, LoadError, SavedConfig};
use smctool::events::handle_key_event;
use smctool::logger;
use smctool::transport::sim::SimulatedController;
use smctool::transport::{Session, Transport};
use smctool::ui::ui;

fn load_config(cli: &Cli) -> anyhow::Result<SavedConfig> {
    let cfg = match &cli.config {
        Some(path) => match load_config_from(path) {
            Ok(cfg) => cfg,
            Err(LoadError::Missing) => anyhow::bail!("config file {} not found", path.display()),
            Err(LoadError::Invalid(msg)) => anyhow::bail!("config file {}: {}", path.display(), msg),
        },
        None => load_saved_config().map_err(anyhow::Error::msg)?.unwrap_or_default(),
    };
    debug!(?cfg, "configuration loaded");
    Ok(cfg)
}

fn main() {
    let cli = Cli::parse();
    logger::init_tracing(cli.verbose);

    if let Err(err) = run(&cli) {
        eprintln!("error: {:#}", err);
        logger::log_event("fatal_error", serde_json::json!({ "error": format!("{:#}", err) }));
        logger::shutdown_logging();
        std::process::exit(1);
    }
    logger::shutdown_logging();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let cfg = load_config(cli)?;

    if cli.logging {
        match logger::init_logging(cfg.log_path.as_deref()) {
            Some(path) => info!("audit log at {}", path.display()),
            None => eprintln!("warning: could not open an audit log file"),
        }
        logger::log_event("startup", serde_json::json!({
            "args": std::env::args().collect::<Vec<_>>(),
            "simulated": cli.simulate,
        }));
    }

    require_root(&cli.command, cli.simulate)?;

    let session = if cli.simulate {
        Session::simulated(SimulatedController::demo())
    } else {
        Session::open()?
    };

    if cli.command == Command::Monitor {
        return run_monitor(session, &cfg, cli.simulate);
    }

    let mut session = session;
    let mut out = stdout().lock();
    let res = run_command(&cli.command, &mut session, &cfg, cli.json, &mut out);
    debug!(calls = session.call_count(), "command finished");
    session.close();
    res
}

fn run_monitor<T: Transport>(session: Session<T>, cfg: &SavedConfig, simulated: bool) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session, cfg, simulated);
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    res
}

fn run_app<T: Transport>(
    terminal: &mut Terminal<ratatui::backend::CrosstermBackend<std::io::Stdout>>,
    app: &mut App<T>,
) -> anyhow::Result<()> {
    app.refresh();

    loop {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(app.time_to_refresh()).unwrap_or(false) {
            if let Event::Key(key_event) = event::read()? {
                if handle_key_event(app, key_event)? {
                    return Ok(());
                }
            }
        }

        if app.refresh_due() {
            app.refresh();
        }
    }
}
