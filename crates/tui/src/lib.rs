mod app;
mod async_ops;
mod clipboard;
mod theme;
mod ui;
mod views;

use std::fs::OpenOptions;
use std::io::stdout;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use app::{App, Effect, View};
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use pipeline_ui_api_client::{
    ApiClient, ListPollOptions, LiveHandle, LiveOptions, SessionDetailHandle, SessionListHandle,
};
use pipeline_ui_runtime_config::Settings;
use ratatui::prelude::*;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

const TICK: Duration = Duration::from_millis(100);
const LOG_FILE_NAME: &str = "pipeline-ui-tui.log";

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub settings: Settings,
    /// Pipeline to follow live from startup.
    pub watch: Option<String>,
    /// Log destination; defaults to the config directory.
    pub log_file: Option<PathBuf>,
}

/// Background tasks driving the published state the UI renders.
struct Handles {
    client: ApiClient,
    list: SessionListHandle,
    detail: SessionDetailHandle,
    live: LiveHandle,
}

/// Launch the TUI and block until the user quits.
pub fn run(options: RunOptions) -> Result<()> {
    init_file_logging(options.log_file.clone());

    let config = options.settings.to_ui_config();
    let rt = Runtime::new().context("start tokio runtime")?;
    let _guard = rt.enter();

    let client = ApiClient::new(&config).context("build API client")?;
    let polling = &options.settings.polling;
    let handles = Handles {
        list: SessionListHandle::spawn(
            client.clone(),
            ListPollOptions {
                interval: polling.sessions_interval(),
                page_size: polling.page_size,
                ..ListPollOptions::default()
            },
        ),
        detail: SessionDetailHandle::spawn(client.clone(), None, polling.detail_interval()),
        live: LiveHandle::for_client(
            client.clone(),
            options.watch.clone(),
            LiveOptions {
                auto_reconnect: options.settings.live.auto_reconnect,
                reconnect_interval: options.settings.live.reconnect_interval(),
            },
        ),
        client,
    };

    let mut app = App::new(config);
    if options.watch.is_some() {
        app.view = View::Live;
    }
    tracing::info!(server = %app.config.api_base_url, "tui started");

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app, &handles, &rt);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn init_file_logging(path: Option<PathBuf>) {
    let path = match path {
        Some(path) => path,
        None => match pipeline_ui_runtime_config::config_dir() {
            Ok(dir) => dir.join(LOG_FILE_NAME),
            Err(_) => return,
        },
    };
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    // A subscriber installed by the host wins.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
    handles: &Handles,
    rt: &Runtime,
) -> Result<()> {
    let mut list_rx = handles.list.subscribe();
    let mut detail_rx = handles.detail.subscribe();
    let mut live_rx = handles.live.subscribe();
    app.sync_list(list_rx.borrow_and_update().clone());
    app.sync_detail(detail_rx.borrow_and_update().clone());
    app.sync_live(live_rx.borrow_and_update().clone());

    loop {
        // ── Pull published state from the background tasks ───────────
        if list_rx.has_changed().unwrap_or(false) {
            app.sync_list(list_rx.borrow_and_update().clone());
        }
        if detail_rx.has_changed().unwrap_or(false) {
            app.sync_detail(detail_rx.borrow_and_update().clone());
        }
        if live_rx.has_changed().unwrap_or(false) {
            app.sync_live(live_rx.borrow_and_update().clone());
        }

        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(TICK)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.handle_key(key);
        }
        app.on_tick();

        // Effects may queue follow-ups (e.g. refresh after a command result).
        loop {
            let effects = app.drain_effects();
            if effects.is_empty() {
                break;
            }
            for effect in effects {
                apply_effect(effect, app, handles, rt);
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn apply_effect(effect: Effect, app: &mut App, handles: &Handles, rt: &Runtime) {
    match effect {
        Effect::SetPage(page) => handles.list.set_page(page),
        Effect::SetStatus(status) => handles.list.set_status(status),
        Effect::RefreshList => handles.list.refresh(),
        Effect::SelectSession(target) => handles.detail.set_target(target),
        Effect::RefreshDetail => handles.detail.refresh(),
        Effect::Watch(target) => handles.live.set_target(target),
        Effect::LiveConnect => handles.live.connect(),
        Effect::LiveDisconnect => handles.live.disconnect(),
        Effect::LiveClear => handles.live.clear_events(),
        Effect::Api(cmd) => {
            let result = rt.block_on(async_ops::execute(cmd, &handles.client));
            app.apply_command_result(result);
        }
        Effect::Copy { text, what } => {
            let result = clipboard::copy(&text).map_err(|e| format!("{e:#}"));
            app.copy_finished(what, result);
        }
    }
}
