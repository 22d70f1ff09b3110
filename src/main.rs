mod api;
mod app;
mod cli;
mod config;
mod input;
mod model;
mod render;
mod ui;

use anyhow::{Context, Result};
use api::{BackendGateway, read_token_file};
use app::{App, AppCommand, RefreshOutcome};
use clap::Parser;
use cli::CliArgs;
use config::Settings;
use crossterm::event::{Event, EventStream, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use futures::StreamExt;
use model::ResourceKind;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout};
use tokio::sync::mpsc;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::debug;
use tracing_subscriber::EnvFilter;

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(&args.log_filter)?;

    let settings = Settings::resolve(&args)?;
    let token = settings.token_file.as_deref().and_then(read_token_file);
    let gateway = BackendGateway::new(settings.backend_url.clone(), token)?;

    let mut app = App::new(settings.backend_url.clone(), settings.refresh_secs);
    if let Some(source) = &settings.source {
        app.set_status(format!("Loaded config from {source}"));
    }

    run(&mut app, &gateway, &args.export_path).await
}

fn init_tracing(level_filter: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to initialize tracing filter")?;

    // The TUI owns the terminal; log output goes nowhere visible.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::sink)
        .try_init();

    Ok(())
}

async fn run(app: &mut App, gateway: &BackendGateway, export_path: &str) -> Result<()> {
    let mut terminal = init_terminal()?;
    let run_result = run_loop(&mut terminal, app, gateway, export_path).await;
    let restore_result = restore_terminal(&mut terminal);

    match (run_result, restore_result) {
        (Err(run_error), Err(restore_error)) => Err(anyhow::anyhow!(
            "{run_error:#}\nterminal restore error: {restore_error:#}"
        )),
        (Err(error), _) => Err(error),
        (_, Err(error)) => Err(error),
        (Ok(()), Ok(())) => Ok(()),
    }
}

fn init_terminal() -> Result<TuiTerminal> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().context("failed to clear terminal")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut TuiTerminal) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

async fn run_loop(
    terminal: &mut TuiTerminal,
    app: &mut App,
    gateway: &BackendGateway,
    export_path: &str,
) -> Result<()> {
    let (refresh_tx, mut refresh_rx) = mpsc::unbounded_channel::<RefreshOutcome>();
    let mut reader = EventStream::new();

    // The first tick fires immediately and doubles as the initial load.
    let mut ticker = interval(Duration::from_secs(app.refresh_secs()));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        terminal
            .draw(|frame| ui::render(frame, app))
            .context("failed to render terminal frame")?;

        if !app.running() {
            break;
        }

        tokio::select! {
            maybe_event = reader.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        if let Some(action) = input::map_key(app.mode(), key) {
                            debug!("action={action:?}");
                            let command = app.apply_action(action);
                            execute_app_command(app, gateway, &refresh_tx, export_path, command);
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        app.set_status(format!("terminal event error: {error}"));
                    }
                    None => {
                        app.set_status("terminal event stream closed");
                        break;
                    }
                }
            }
            _ = ticker.tick() => {
                start_refresh_cycle(app, gateway, &refresh_tx);
            }
            maybe_outcome = refresh_rx.recv() => {
                if let Some(outcome) = maybe_outcome {
                    app.apply_refresh_outcome(outcome);
                }
            }
        }
    }

    Ok(())
}

fn execute_app_command(
    app: &mut App,
    gateway: &BackendGateway,
    refresh_tx: &mpsc::UnboundedSender<RefreshOutcome>,
    export_path: &str,
    command: AppCommand,
) {
    match command {
        AppCommand::None => {}
        AppCommand::RefreshAll => start_refresh_cycle(app, gateway, refresh_tx),
        AppCommand::ExportReport => export_report(app, export_path),
    }
}

/// Spawns one refresh cycle. The three loaders run strictly in sequence
/// (pods, then services, then events); cycles may overlap and the app
/// drops outcomes from superseded generations.
fn start_refresh_cycle(
    app: &mut App,
    gateway: &BackendGateway,
    refresh_tx: &mpsc::UnboundedSender<RefreshOutcome>,
) {
    let generation = app.begin_refresh_cycle();
    let gateway = gateway.clone();
    let tx = refresh_tx.clone();
    tokio::spawn(async move {
        for kind in ResourceKind::ALL {
            let result = gateway.fetch_table(kind).await;
            let outcome = RefreshOutcome {
                kind,
                generation,
                result,
            };
            if tx.send(outcome).is_err() {
                break;
            }
        }
    });
}

fn export_report(app: &mut App, export_path: &str) {
    let report = render::render_report(&app.export_tables());
    match std::fs::write(export_path, report) {
        Ok(()) => app.set_status(format!("Report written to {export_path}")),
        Err(error) => app.set_status(format!("Report export failed: {error}")),
    }
}
