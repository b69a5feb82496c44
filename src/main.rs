mod chat;
mod cli;
mod config;
mod console;
mod detect;
mod error;
mod menu;
mod model;
mod repl;
mod session;
mod stream;
mod util;

use std::io::{self, Write};

use clap::Parser;
use cli::CliArgs;
use config::{Config, CONFIG_FILE_NAME, EXAMPLE_FILE_NAME};
use console::TermPrompter;
use error::{is_interrupted, DetectorError, Result};

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

async fn run(args: CliArgs) -> Result<()> {
    let config = Config::load(&args.config_path()).await?;
    let session = session::HttpSession::new(&args.session_config())?;
    let mut prompter = TermPrompter;
    let mut out = io::stdout();

    menu::print_welcome(&mut out)?;
    let endpoint = menu::resolve_endpoint(&config, args.api.as_deref(), &mut prompter, &mut out)?;
    writeln!(out, "\nSelected: {}", endpoint.name)?;
    if !menu::check_key(endpoint, &mut out)? {
        return Ok(());
    }

    let ctx = chat::ChatContext {
        session: &session,
        endpoint,
        config: &config,
    };
    if args.detect {
        chat::run_model_detection(ctx, &mut out).await?;
        return Ok(());
    }
    menu::run_menu(ctx, &mut prompter, &mut out).await
}

fn print_config_help<W: Write>(error: &DetectorError, out: &mut W) -> io::Result<()> {
    tracing::error!("configuration error: {error}");
    let rule = "=".repeat(60);
    writeln!(out, "{rule}")?;
    writeln!(out, "Error: {error}")?;
    writeln!(out, "{rule}")?;
    match error {
        DetectorError::ConfigMissing { .. } => {
            writeln!(out, "To get started:")?;
            writeln!(out, "1. Copy {EXAMPLE_FILE_NAME} to {CONFIG_FILE_NAME}")?;
            writeln!(out, "2. Fill in your API key in {CONFIG_FILE_NAME}")?;
        }
        _ => writeln!(
            out,
            "Fix {CONFIG_FILE_NAME} (see {EXAMPLE_FILE_NAME} for the expected layout)"
        )?,
    }
    writeln!(out, "{rule}")
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing();
    let args = CliArgs::parse();

    let code = match run(args).await {
        Ok(()) => 0,
        Err(error) if is_interrupted(&error) => {
            println!("\n\nExited");
            0
        }
        Err(error) => {
            match error.downcast_ref::<DetectorError>() {
                Some(config_error) if config_error.is_config() => {
                    let _ = print_config_help(config_error, &mut io::stdout());
                }
                _ => tracing::error!("{error:?}"),
            }
            1
        }
    };

    std::process::exit(code);
}
