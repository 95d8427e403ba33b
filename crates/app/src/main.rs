use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use phrase_core::model::Language;
use phrase_core::{ALL_LISTS, PhraseStore};
use services::phrase_source::{self, RawCatalog};
use services::playback::spawn;
use services::{
    Clock, EngineConfig, EngineDeps, NoRecognizer, PlaybackHandle, ProgressTracker,
    FallbackSpeechOutput, RecognitionAdapter, RemotePhraseSource, RemoteSourceConfig,
    SettingsService,
};
use storage::repository::Storage;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod console;

use console::{ConsoleSpeech, RecordedAudio, print_events};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    NoPhraseSource,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::NoPhraseSource => {
                write!(f, "no phrase source: pass --phrases <file> or --remote <url>")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

struct Args {
    db_url: String,
    phrases: Option<PathBuf>,
    remote: Option<String>,
    list: Option<String>,
    audio: Option<PathBuf>,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- play  [--db <sqlite_url>] [--phrases <file>] [--remote <url>] [--list <name>] [--audio <dir>]");
    eprintln!("  cargo run -p app -- lists [--phrases <file>] [--remote <url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:phrases.sqlite3");
    eprintln!("  --list keeps the list from the saved settings");
    eprintln!("  --audio unset speaks every phrase with the console voice");
    eprintln!();
    eprintln!("Keys while playing:");
    eprintln!("  <enter>/p play-pause, n next, b back, s stop, 1 say native, 2 say target, q quit");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PHRASE_DB_URL, PHRASE_SOURCE_FILE, PHRASE_ADMIN_URL, PHRASE_LIST, PHRASE_AUDIO_DIR, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Lists,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "lists" => Some(Self::Lists),
            _ => None,
        }
    }
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = non_empty_env("PHRASE_DB_URL")
            .map_or_else(|| normalize_sqlite_url("phrases.sqlite3".into()), normalize_sqlite_url);
        let mut phrases = non_empty_env("PHRASE_SOURCE_FILE").map(PathBuf::from);
        let mut remote = non_empty_env("PHRASE_ADMIN_URL");
        let mut list = non_empty_env("PHRASE_LIST");
        let mut audio = non_empty_env("PHRASE_AUDIO_DIR").map(PathBuf::from);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--phrases" => phrases = Some(PathBuf::from(require_value(args, "--phrases")?)),
                "--remote" => remote = Some(require_value(args, "--remote")?),
                "--list" => list = Some(require_value(args, "--list")?),
                "--audio" => audio = Some(PathBuf::from(require_value(args, "--audio")?)),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if phrases.is_none() && remote.is_none() {
            return Err(ArgsError::NoPhraseSource);
        }

        Ok(Self {
            db_url,
            phrases,
            remote,
            list,
            audio,
        })
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

/// The local file wins when both sources are configured.
async fn load_catalog(args: &Args) -> Result<RawCatalog, Box<dyn std::error::Error>> {
    if let Some(path) = &args.phrases {
        info!(path = %path.display(), "reading phrases from file");
        return Ok(phrase_source::read_file(path).await?);
    }
    let source = RemotePhraseSource::new(
        args.remote
            .clone()
            .map(|url| RemoteSourceConfig { url })
            .or_else(RemoteSourceConfig::from_env),
    );
    info!("fetching phrases from admin endpoint");
    Ok(source.fetch().await?)
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Playing is the default when no subcommand is given.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let mut store = PhraseStore::new();
    phrase_source::load_into(&mut store, load_catalog(&parsed).await?);

    match cmd {
        Command::Lists => {
            println!("{ALL_LISTS} ({})", store.total_len());
            for name in store.categories() {
                println!("{name} ({})", store.category_len(name));
            }
            Ok(())
        }
        Command::Play => play(parsed, store).await,
    }
}

async fn play(args: Args, store: PhraseStore) -> Result<(), Box<dyn std::error::Error>> {
    // Open + migrate SQLite at startup.
    prepare_sqlite_file(&args.db_url)?;
    let storage = Storage::sqlite(&args.db_url).await?;

    let config = EngineConfig::default();
    let settings = SettingsService::new(Arc::clone(&storage.settings));
    if let Some(list) = args.list {
        let mut draft = settings.load().await?.to_draft();
        if draft.list_type != list {
            draft.list_type = list;
            // A different list gets a fresh shuffle.
            draft.random_seed = None;
            settings.save(draft).await?;
        }
    }
    let tracker = ProgressTracker::load(Arc::clone(&storage.progress), Clock::default()).await?;
    let recognition = RecognitionAdapter::with_restart_delay(
        Arc::new(NoRecognizer),
        config.recognition_restart_delay,
    );

    let handle = spawn(
        config,
        EngineDeps {
            store,
            tracker,
            settings,
            speech: Arc::new(FallbackSpeechOutput::new(
                Arc::new(RecordedAudio::new(args.audio)),
                Arc::new(ConsoleSpeech::default()),
            )),
            recognition: Arc::new(recognition),
        },
    )
    .await?;
    let printer = tokio::spawn(print_events(handle.subscribe()));

    let snapshot = handle.snapshot().await?;
    info!(list = %snapshot.list_key, index = snapshot.index, "resuming playback");

    handle.start().await?;
    read_keys(&handle).await?;

    handle.shutdown().await?;
    drop(handle);
    let _ = printer.await;
    Ok(())
}

async fn read_keys(handle: &PlaybackHandle) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let result = match line.trim() {
            "" | "p" => handle.toggle().await,
            "n" => handle.next().await,
            "b" => handle.prev().await,
            "s" => handle.stop().await,
            "1" => handle.speak_current(Language::Native).await,
            "2" => handle.speak_current(Language::Target).await,
            "q" => break,
            other => {
                eprintln!("unknown key: {other}");
                Ok(())
            }
        };
        if let Err(err) = result {
            warn!(error = %err, "command failed");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
