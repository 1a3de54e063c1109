use clap::Parser;
use clap::error::ErrorKind;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tasktalk::cli::{Cli, collect_overrides};
use tasktalk_core::config::{self, Config, Palette, palette_for_theme};
use tasktalk_core::error::AppError;
use tasktalk_core::llm::OpenAiClient;
use tasktalk_core::session::Session;
use tasktalk_core::storage::json_store;
use tasktalk_core::task_store::TaskStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

const INTERACTIVE_HELP: &str = "Tell me what to do with your tasks, for example:
  remind me to buy groceries at 5 PM tomorrow
  what's on my list?
  I finished the groceries
  mark 2 as done
  summarize my tasks
Type exit or quit to leave.";

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config, AppError> {
    let load = config::load_config_with_fallback();
    if let Some(err) = load.error.as_ref() {
        eprintln!("WARNING: using default configuration: {}", err);
    }
    let overrides = collect_overrides(&cli.config_override)?;
    Ok(config::merge_overrides(&load.config, &overrides))
}

fn build_session(cli: &Cli, config: &Config) -> Result<Session, AppError> {
    let api_key = config.llm.api_key().ok_or_else(|| {
        AppError::invalid_input(format!("{} is not set", config.llm.api_key_env))
    })?;

    let store_path = match cli.store.as_ref() {
        Some(path) => path.clone(),
        None => json_store::store_path()?,
    };
    let store = TaskStore::open(&store_path);

    let client = OpenAiClient::new(
        config.llm.base_url.clone(),
        api_key,
        config.llm.model.clone(),
    );
    info!(
        store = %store_path.display(),
        model = %client.model(),
        endpoint = %client.endpoint(),
        "session starting"
    );

    Ok(Session::with_client(
        store,
        Arc::new(client),
        config.llm.temperature,
    ))
}

fn print_prompt(palette: &Palette) -> Result<(), AppError> {
    let mut stdout = io::stdout();
    write!(stdout, "{}", palette.accentize("> ")).map_err(|err| AppError::io(err.to_string()))?;
    stdout.flush().map_err(|err| AppError::io(err.to_string()))
}

async fn run_interactive(session: &mut Session, config: &Config) -> Result<(), AppError> {
    let palette = palette_for_theme(config.theme.as_deref());
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    println!("{}", palette.mutedize("What would you like to do? (type help for examples)"));

    loop {
        print_prompt(&palette)?;
        input.clear();
        let bytes = match stdin_lock.read_line(&mut input) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                eprintln!("WARNING: skipping unreadable input: {}", err);
                continue;
            }
            Err(err) => return Err(AppError::io(err.to_string())),
        };

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            println!("{INTERACTIVE_HELP}");
            continue;
        }

        let utterance = config.expand_alias(line).unwrap_or(line);
        let reply = session.handle(utterance).await;
        println!("{reply}");
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = load_config(&cli)?;
    let mut session = build_session(&cli, &config)?;

    match cli.utterance() {
        Some(utterance) => {
            let utterance = config.expand_alias(&utterance).unwrap_or(&utterance);
            let reply = session.handle(utterance).await;
            println!("{reply}");
            Ok(())
        }
        None => run_interactive(&mut session, &config).await,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_logging();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run(cli).await {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
