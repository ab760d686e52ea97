//! `stockroom`: terminal client for the inventory backend.
//!
//! # Usage
//!
//! ```
//! stockroom --endpoint http://localhost:8081/v1/graphql
//! stockroom --config ~/.config/stockroom/stockroom.toml /app/movimientos
//! stockroom --hash-password < password.txt
//! ```

mod app;
mod confirm;
mod form;
mod pages;
mod settings;
mod storage;
mod ui;

use std::{
  fs::File,
  io::{self, BufRead as _},
  path::PathBuf,
  sync::Mutex,
  time::Duration,
};

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use crossterm::{
  event::{self, Event, KeyEventKind},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use settings::{Overrides, Settings};
use stockroom_core::{graphql::GraphqlTransport, session::SessionStore, storage::ClientStorage};
use stockroom_graphql::{
  AuthService, Backend, GraphqlClient, HttpConfig, HttpTransport,
  password::{PasswordPolicy, hash_password},
};
use stockroom_store_sqlite::SqliteStorage;
use storage::StorageBackend;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "stockroom", version, about = "Terminal client for the stockroom inventory")]
struct Args {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE", default_value = "stockroom.toml")]
  config: PathBuf,

  /// GraphQL endpoint (default: http://localhost:8081/v1/graphql).
  #[arg(long, env = "STOCKROOM_ENDPOINT")]
  endpoint: Option<String>,

  /// Hasura admin secret, sent with every request.
  #[arg(long, env = "STOCKROOM_ADMIN_SECRET", hide_env_values = true)]
  admin_secret: Option<String>,

  /// Where the session is kept between runs.
  #[arg(long, value_name = "FILE")]
  storage_path: Option<PathBuf>,

  /// Write logs to this file. Without it nothing is logged, since the
  /// terminal belongs to the UI.
  #[arg(long, value_name = "FILE")]
  log_file: Option<PathBuf>,

  /// Keep the session in memory only.
  #[arg(long)]
  ephemeral: bool,

  /// Print the argon2 hash for a password read from stdin and exit.
  #[arg(long)]
  hash_password: bool,

  /// Route to open first.
  #[arg(default_value = "/app")]
  path: String,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  // Helper mode: hash a password and exit.
  if args.hash_password {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).context("reading password")?;
    let hash = hash_password(line.trim_end_matches(['\r', '\n']))?;
    println!("{hash}");
    return Ok(());
  }

  let settings = Settings::load(&args.config, Overrides {
    endpoint:     args.endpoint,
    admin_secret: args.admin_secret,
    storage_path: args.storage_path,
    log_file:     args.log_file,
  })?;

  init_tracing(&settings)?;

  let transport = HttpTransport::new(HttpConfig {
    endpoint:     settings.endpoint.clone(),
    admin_secret: settings.admin_secret.clone(),
    timeout:      Duration::from_secs(settings.request_timeout_secs),
  })
  .context("building HTTP client")?;
  let client = GraphqlClient::new(transport);

  let storage = if args.ephemeral {
    StorageBackend::Memory(Default::default())
  } else {
    StorageBackend::Sqlite(
      SqliteStorage::open(&settings.storage_path)
        .await
        .with_context(|| format!("opening {}", settings.storage_path.display()))?,
    )
  };

  let policy = if settings.allow_plaintext_passwords {
    PasswordPolicy::allowing_plaintext()
  } else {
    PasswordPolicy::strict()
  };
  let auth = AuthService::new(client.clone(), SessionStore::new(storage), policy);
  let mut app = App::new(Backend::new(client), auth);
  tracing::info!(endpoint = %settings.endpoint, "starting");
  app.start(&args.path).await;

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  let run_result = run_event_loop(&mut terminal, &mut app).await;

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

fn init_tracing(settings: &Settings) -> Result<()> {
  let filter = EnvFilter::builder()
    .with_default_directive(LevelFilter::INFO.into())
    .from_env_lossy();
  let Some(path) = &settings.log_file else {
    return Ok(());
  };
  if let Some(dir) = path.parent()
    && !dir.as_os_str().is_empty()
  {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
  }
  let file = File::options()
    .create(true)
    .append(true)
    .open(path)
    .with_context(|| format!("opening log file {}", path.display()))?;
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_ansi(false)
    .with_writer(Mutex::new(file))
    .init();
  Ok(())
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop<T: GraphqlTransport, S: ClientStorage>(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App<T, S>,
) -> Result<()> {
  loop {
    app.tick();
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Requests that should show a loading state run after the frame above.
    if app.has_pending() {
      app.run_pending().await;
      continue;
    }

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    match maybe_event {
      Some(Event::Key(key)) if key.kind == KeyEventKind::Press => {
        if !app.handle_key(key).await? {
          break;
        }
      }
      // Resize and everything else just redraw on the next iteration.
      _ => {}
    }
  }

  Ok(())
}
