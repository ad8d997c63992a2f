//! Terminal UI for monitor mode.

mod app;
mod ui;

use std::io;
use std::time::Duration;

use airspy_core::cancel::sleep_or_cancel;
use airspy_core::{CancellationToken, Monitor, MonitorHandle};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::commands::Context;
use app::App;

const TICK: Duration = Duration::from_millis(200);

/// Run the monitor with a full-screen display until the user quits.
pub async fn run(ctx: &Context) -> Result<()> {
    let handle = Monitor::spawn(
        ctx.wifi_scanner(),
        ctx.bluetooth_scanner(),
        ctx.radio_scanner(),
        ctx.config.monitor_settings(),
    )?;
    let mut app = App::new(ctx.config.sudo, ctx.config.handshake.dir.clone());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut app, &handle, &ctx.cancel).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Stopping waits for the scanners to reap their subprocesses.
    println!("Stopping monitor...");
    handle.stop();
    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    handle: &MonitorHandle,
    cancel: &CancellationToken,
) -> Result<()> {
    loop {
        for update in handle.try_iter() {
            app.apply(update);
        }
        app.poll_crack();
        terminal.draw(|f| ui::draw(f, app))?;

        // Drain pending input without blocking the runtime.
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }
        if app.should_quit || sleep_or_cancel(TICK, cancel).await {
            return Ok(());
        }
    }
}
