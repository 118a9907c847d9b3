use std::fmt;
use std::sync::Arc;

use quest_core::model::Catalog;
use services::{
    AccountIdentityProvider, Clock, OptionMark, QuestService, QuestSession, QuestView,
};
use storage::repository::Storage;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingCredentials,
    UnknownArg(String),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingCredentials => write!(f, "--email and --password are required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- --email <email> --password <password> [--sign-up] [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:quest.sqlite3");
    eprintln!();
    eprintln!("Environment (.env is loaded first):");
    eprintln!("  QUEST_DB_URL, QUEST_EMAIL, RUST_LOG");
    eprintln!();
    eprintln!("New players pass --sign-up once; later runs sign in with the same password.");
    eprintln!("In game: <n> selects option n, s submits, n(ext) advances, q quits.");
}

struct Args {
    db_url: String,
    email: String,
    password: String,
    sign_up: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let mut db_url = std::env::var("QUEST_DB_URL")
            .ok()
            .map_or_else(|| "sqlite:quest.sqlite3".into(), normalize_sqlite_url);
        let mut email = std::env::var("QUEST_EMAIL").ok();
        let mut password = None;
        let mut sign_up = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--email" => email = Some(require_value(args, "--email")?),
                "--password" => password = Some(require_value(args, "--password")?),
                "--sign-up" => sign_up = true,
                "--help" | "-h" => return Ok(None),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let (Some(email), Some(password)) = (email, password) else {
            return Err(ArgsError::MissingCredentials);
        };

        Ok(Some(Self {
            db_url: normalize_sqlite_url(db_url),
            email,
            password,
            sign_up,
        }))
    }
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

fn render(view: &QuestView) {
    println!();
    println!(
        "Level {}   stars {}   lives {}   {}",
        view.level_number,
        view.stars,
        view.lives,
        view.progress_label()
    );
    println!("{}", view.media);
    println!("{}", view.prompt);
    for option in &view.options {
        let marker = match option.mark {
            OptionMark::Plain => ' ',
            OptionMark::Selected => '>',
            OptionMark::Correct => '+',
            OptionMark::Wrong => 'x',
        };
        println!(" {marker} [{}] {}", option.index + 1, option.label);
    }
    if let Some(feedback) = &view.feedback {
        println!("{}", feedback.headline);
        println!("{}", feedback.detail);
        if let Some(caption) = &view.caption {
            println!("{caption}");
        }
        println!("(type n for {})", view.advance_label);
    } else if view.can_submit {
        println!("(type s to check your answer)");
    }
}

async fn play(
    service: &QuestService,
    session: &mut QuestSession,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        if let Some(view) = QuestView::from_session(service.catalog(), session) {
            render(&view);
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        match input {
            "q" | "quit" | "logout" => break,
            "s" | "submit" => match service.submit(session) {
                Ok(submission) => service.persist(submission.write),
                Err(err) => println!("{err}"),
            },
            "n" | "next" => {
                service.advance(session);
            }
            _ => match input.parse::<usize>() {
                Ok(choice) if choice >= 1 => {
                    if let Err(err) = service.select_option(session, choice - 1) {
                        println!("{err}");
                    }
                }
                _ => println!("unknown command: {input}"),
            },
        }
    }

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let parsed = match Args::parse(&mut argv) {
        Ok(Some(parsed)) => parsed,
        Ok(None) => {
            print_usage();
            return Ok(());
        }
        Err(e) => {
            eprintln!("{e}");
            print_usage();
            return Err(e.into());
        }
    };

    // Storage setup stays in the binary so core/services remain I/O-agnostic.
    prepare_sqlite_file(&parsed.db_url)?;
    let storage = Storage::sqlite(&parsed.db_url).await?;
    tracing::info!(db = %parsed.db_url, "storage ready");

    let service = QuestService::new(
        Clock::system(),
        Catalog::builtin(),
        Arc::new(AccountIdentityProvider::new(Arc::clone(&storage.accounts))),
        Arc::clone(&storage.user_stats),
    );

    let mut session = if parsed.sign_up {
        service.sign_up(&parsed.email, &parsed.password).await?
    } else {
        service.sign_in(&parsed.email, &parsed.password).await?
    };
    println!("Welcome, {}", session.identity().email);

    play(&service, &mut session).await?;
    service.sign_out(session).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "app=info,services=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
