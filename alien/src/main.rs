//! Alien Planet Console terminal application.
//!
//! Pick a story, build a character, enter a Groq API key, and play.
//!
//! # Headless Mode
//!
//! Run with `--headless` for a line-oriented interface suitable for scripts:
//!
//! ```bash
//! GROQ_API_KEY=gsk_... cargo run -p alien -- --headless --story prison-escape --name Dallas
//! ```
//!
//! Logs go to stderr in headless mode and to `ALIEN_LOG_FILE`
//! (default `alien-console.log`) otherwise. `RUST_LOG` sets the filter.

mod app;
mod events;
mod headless;
mod ui;
mod worker;

use std::fs::File;
use std::io::{self, stdout};
use std::sync::Mutex;
use std::time::Duration;

use alien_core::config::parse_metrics;
use alien_core::{ConfigError, EngineConfig, NarrativeEngine, Session, StoryId, TraitSet};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use app::App;
use events::{handle_event, EventResult};
use ui::render::render;

const DEFAULT_LOG_FILE: &str = "alien-console.log";

#[derive(Parser, Debug)]
#[command(name = "alien")]
#[command(about = "Alien Planet Console: an AI-narrated text adventure")]
#[command(version)]
struct Args {
    /// Run without the TUI, reading actions from stdin
    #[arg(long)]
    headless: bool,

    /// Story to play: space-adventure, prison-escape or plane-crash
    #[arg(long, default_value = "space-adventure")]
    story: String,

    /// Player name; headless mode defaults to "Survivor"
    #[arg(long)]
    name: Option<String>,

    /// Strength, 1 to 10
    #[arg(long, default_value_t = 5, allow_negative_numbers = true)]
    strength: i64,

    /// Intelligence, 1 to 10
    #[arg(long, default_value_t = 5, allow_negative_numbers = true)]
    intelligence: i64,

    /// Agility, 1 to 10
    #[arg(long, default_value_t = 5, allow_negative_numbers = true)]
    agility: i64,

    /// Metrics preset: stress or health
    #[arg(long)]
    metrics: Option<String>,

    /// Model identifier, overriding GROQ_MODEL
    #[arg(long)]
    model: Option<String>,

    /// Seed for metric rolls
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    init_tracing(args.headless)?;
    let config = engine_config(&args)?;

    if args.headless {
        return run_headless(&args, &config).await;
    }

    let mut app = App::new();
    app.story_index = StoryId::ALL
        .iter()
        .position(|s| *s == StoryId::parse(&args.story))
        .unwrap_or(0);
    if let Some(name) = &args.name {
        app.name.set(name.clone());
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, app, &config);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        tracing::error!(error = %e, "console exited with an error");
    }
    result.map_err(Into::into)
}

fn init_tracing(headless: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "alien=info,alien_core=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if headless {
        registry.with(fmt::layer().with_writer(io::stderr)).init();
    } else {
        // The terminal belongs to the UI, so logs go to a file
        let path = std::env::var("ALIEN_LOG_FILE").unwrap_or_else(|_| DEFAULT_LOG_FILE.into());
        let file = File::create(&path)?;
        registry
            .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
            .init();
    }
    Ok(())
}

fn engine_config(args: &Args) -> Result<EngineConfig, ConfigError> {
    let mut config = EngineConfig::from_env()?;
    if let Some(model) = &args.model {
        config = config.with_model(model.clone());
    }
    if let Some(metrics) = &args.metrics {
        config = config.with_metrics(parse_metrics(metrics)?);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    Ok(config)
}

async fn run_headless(args: &Args, config: &EngineConfig) -> anyhow::Result<()> {
    let traits = TraitSet::from_values(args.strength, args.intelligence, args.agility)?;
    let name = args.name.clone().unwrap_or_else(|| "Survivor".to_string());
    let session_config = config.session_config(StoryId::parse(&args.story), name, traits);

    let mut session = Session::new(session_config)?;
    let key = std::env::var("GROQ_API_KEY").map_err(|_| ConfigError::MissingCredential)?;
    session.supply_credential(key)?;

    let engine = NarrativeEngine::from_config(session, config);
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    headless::run_session(&engine, stdin.lock(), &mut stdout).await?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    config: &EngineConfig,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| render(f, &app))?;

        // Poll with a timeout so worker updates are picked up between keys
        if event::poll(Duration::from_millis(100))? {
            let ev = event::read()?;
            match handle_event(&mut app, ev) {
                EventResult::Quit => return Ok(()),
                EventResult::StartSession => {
                    if let Err(e) = app.start_session(config) {
                        tracing::warn!(error = %e, "failed to start session");
                        app.set_status(e.to_string());
                    }
                }
                EventResult::NeedsRedraw | EventResult::Continue => {}
            }
        }

        app.poll_updates();

        if app.should_quit {
            return Ok(());
        }
    }
}
