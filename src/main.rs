mod app;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, MouseEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use app::{App, View};
use mailrhythm::config::Config;
use mailrhythm::logging;
use mailrhythm::mail::{
    DateRange, Direction as MailDirection, MailEvent, MailSource, MaildirSource,
};
use mailrhythm::tables::RawCsvSource;
use ui::{
    render_calendar, render_distribution, render_header, render_help, render_loading,
    render_rhythm, render_trend, render_weekly,
};

#[derive(Parser, Debug)]
#[command(name = "mailrhythm", version, about = "Terminal dashboard for mail activity")]
struct Args {
    /// Account from the config file (defaults to default_account)
    #[arg(short, long)]
    account: Option<String>,

    /// Read events from an exported mail_raw.csv instead of a maildir
    #[arg(long, value_name = "CSV")]
    raw: Option<PathBuf>,

    /// Calendar year to open
    #[arg(short, long)]
    year: Option<i32>,

    /// Parse every file again instead of using the cache
    #[arg(long)]
    no_cache: bool,
}

enum Loader {
    Maildir(MaildirSource),
    Raw(RawCsvSource),
}

enum LoadMessage {
    Progress(usize, usize),
    Done(Result<Vec<MailEvent>>),
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = logging::log_path() {
        if let Err(e) = logging::init_file(&path) {
            eprintln!("Could not open log file {}: {}", path.display(), e);
        }
    }

    let config = Arc::new(Config::load());
    let (loader, label) = build_loader(&args, &config)?;
    tracing::info!(source = %label, "starting dashboard");

    let (tx, rx) = mpsc::channel();
    spawn_loader(loader, config.analysis.date_range(), tx);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, label);
    let result = run(&mut terminal, &mut app, &rx, args.year);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn build_loader(args: &Args, config: &Config) -> Result<(Loader, String)> {
    if let Some(path) = &args.raw {
        return Ok((
            Loader::Raw(RawCsvSource::new(path)),
            path.display().to_string(),
        ));
    }

    let (name, account) = config
        .resolve_account(args.account.as_deref())
        .with_context(|| {
            format!(
                "No account found. Add one to {} or pass --raw <CSV>",
                Config::config_path().display()
            )
        })?;
    let mut source = MaildirSource::from_account(name, account, &config.analysis);
    if args.no_cache {
        source = source.with_cache(None);
    }
    Ok((Loader::Maildir(source), name.to_string()))
}

fn spawn_loader(loader: Loader, range: DateRange, tx: Sender<LoadMessage>) {
    thread::spawn(move || {
        let result = match loader {
            Loader::Maildir(source) => {
                let progress_tx = tx.clone();
                source.scan(&range, move |current, total| {
                    let _ = progress_tx.send(LoadMessage::Progress(current, total));
                })
            }
            Loader::Raw(source) => source.fetch(&range),
        };
        let _ = tx.send(LoadMessage::Done(result));
    });
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    rx: &Receiver<LoadMessage>,
    year: Option<i32>,
) -> Result<()> {
    loop {
        if app.view == View::Loading {
            for message in rx.try_iter() {
                match message {
                    LoadMessage::Progress(current, total) => app.loading = (current, total),
                    LoadMessage::Done(Ok(events)) => {
                        tracing::info!(events = events.len(), "events loaded");
                        app.set_events(events, year);
                    }
                    LoadMessage::Done(Err(e)) => {
                        tracing::error!("load failed: {:#}", e);
                        return Err(e);
                    }
                }
            }
        }

        terminal.draw(|f| render(app, f))?;

        // Poll with timeout so progress updates redraw without input
        if !event::poll(std::time::Duration::from_millis(100))? {
            continue;
        }

        match event::read()? {
            Event::Key(key) => {
                app.clear_status();
                match app.view {
                    View::Loading => {
                        if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                            app.should_quit = true;
                        }
                    }
                    _ => match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
                        KeyCode::Tab => app.next_view(),
                        KeyCode::BackTab => app.previous_view(),
                        KeyCode::Char('1') => app.view = View::Calendar,
                        KeyCode::Char('2') => app.view = View::Rhythm,
                        KeyCode::Char('3') => app.view = View::Trend,
                        KeyCode::Char('4') => app.view = View::Weekly,
                        KeyCode::Char('5') => app.view = View::Distribution,
                        KeyCode::Char(']') => app.next_year(),
                        KeyCode::Char('[') => app.previous_year(),
                        KeyCode::Char('i') => app.toggle_direction(MailDirection::Incoming),
                        KeyCode::Char('o') => app.toggle_direction(MailDirection::Outgoing),
                        KeyCode::Char('w') => app.toggle_work_hours(),
                        KeyCode::Char('d') => app.toggle_weekdays_only(),
                        KeyCode::Char('<') => app.adjust_hours(-1, 0),
                        KeyCode::Char('>') => app.adjust_hours(1, 0),
                        KeyCode::Char('-') => app.adjust_hours(0, -1),
                        KeyCode::Char('+') | KeyCode::Char('=') => app.adjust_hours(0, 1),
                        KeyCode::Char('h') | KeyCode::Left => app.move_cursor(0, -1),
                        KeyCode::Char('l') | KeyCode::Right => app.move_cursor(0, 1),
                        KeyCode::Char('k') | KeyCode::Up => app.move_cursor(-1, 0),
                        KeyCode::Char('j') | KeyCode::Down => app.move_cursor(1, 0),
                        _ => {}
                    },
                }
            }
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollDown => app.move_cursor(0, 1),
                MouseEventKind::ScrollUp => app.move_cursor(0, -1),
                _ => {}
            },
            Event::Resize(_, _) => {
                // Terminal resized - just redraw on next loop iteration
            }
            _ => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn render(app: &App, f: &mut Frame) {
    let area = f.area();
    let config = app.config.clone();
    let theme = &config.theme;

    if app.view == View::Loading {
        render_loading(f, area, app.loading, &app.source_label, theme);
        return;
    }

    // Header, main area and help bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(f, chunks[0], app, theme);

    match app.view {
        View::Calendar => render_calendar(f, chunks[1], app, theme),
        View::Rhythm => render_rhythm(f, chunks[1], &app.rhythm(), theme),
        View::Trend => render_trend(
            f,
            chunks[1],
            &app.trend(),
            config.analysis.trend_window,
            theme,
        ),
        View::Weekly => render_weekly(
            f,
            chunks[1],
            app.year,
            &app.weekly(),
            app.directions,
            config.analysis.label_every,
            theme,
        ),
        View::Distribution => render_distribution(f, chunks[1], &app.distribution(), theme),
        View::Loading => {}
    }

    render_help(
        f,
        chunks[2],
        app.view,
        app.status_message.as_deref(),
        theme,
    );
}
