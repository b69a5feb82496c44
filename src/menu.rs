use std::io::Write;

use crate::chat::{self, ChatContext};
use crate::config::{Config, Endpoint, CONFIG_FILE_NAME};
use crate::console::Prompter;
use crate::error::Result;
use crate::repl::ChatSession;
use crate::util::short_host;

const BANNER: &str = "============================================================";
const RULE: &str = "----------------------------------------";

/// Top-level modes offered after an endpoint is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Detect,
    Chat,
    Exit,
}

impl MenuChoice {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(MenuChoice::Detect),
            "2" => Some(MenuChoice::Chat),
            "3" => Some(MenuChoice::Exit),
            _ => None,
        }
    }
}

pub fn print_welcome<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "\n{BANNER}")?;
    writeln!(out, "Model Detector")?;
    writeln!(out, "{BANNER}")?;
    writeln!(
        out,
        "Identifies the model behind an endpoint from its knowledge cutoff date"
    )?;
    writeln!(out, "(about 95% accurate)")?;
    writeln!(out, "{BANNER}")?;
    Ok(())
}

/// Use `preset` when it names a configured endpoint, otherwise ask.
pub fn resolve_endpoint<'c, P, W>(
    config: &'c Config,
    preset: Option<&str>,
    prompter: &mut P,
    out: &mut W,
) -> Result<&'c Endpoint>
where
    P: Prompter,
    W: Write,
{
    if let Some(name) = preset {
        match config.endpoint(name) {
            Some(endpoint) => return Ok(endpoint),
            None => {
                tracing::warn!("--api `{name}` is not configured; falling back to the menu");
                writeln!(out, "API `{name}` is not configured")?;
            }
        }
    }
    select_endpoint(config, prompter, out)
}

/// List endpoints and read a 1-based index, a name, or blank for the default.
pub fn select_endpoint<'c, P, W>(
    config: &'c Config,
    prompter: &mut P,
    out: &mut W,
) -> Result<&'c Endpoint>
where
    P: Prompter,
    W: Write,
{
    let default = config.default_index();
    let count = config.apis.len();

    writeln!(out, "\nAvailable APIs:")?;
    writeln!(out, "{RULE}")?;
    for (idx, endpoint) in config.apis.iter().enumerate() {
        let mark = if idx == default { " [default]" } else { "" };
        writeln!(
            out,
            "  {}. {} ({}){mark}",
            idx + 1,
            endpoint.name,
            short_host(&endpoint.url)
        )?;
    }
    writeln!(out, "{RULE}")?;

    let prompt = format!("Select API [1-{count}, Enter for default]");
    loop {
        let choice = prompter.read_line(&prompt)?;
        if let Some(endpoint) = pick_endpoint(config, choice.trim()) {
            return Ok(endpoint);
        }
        writeln!(out, "Invalid choice, please try again")?;
    }
}

fn pick_endpoint<'c>(config: &'c Config, choice: &str) -> Option<&'c Endpoint> {
    if choice.is_empty() {
        return config.apis.get(config.default_index());
    }
    match choice.parse::<usize>() {
        Ok(index) => index.checked_sub(1).and_then(|idx| config.apis.get(idx)),
        Err(_) => config.endpoint(choice),
    }
}

/// Report a missing or placeholder key; `false` means the run should stop.
pub fn check_key<W: Write>(endpoint: &Endpoint, out: &mut W) -> Result<bool> {
    if endpoint.has_usable_key() {
        return Ok(true);
    }
    writeln!(out, "\nError: the API key for {} is not configured", endpoint.name)?;
    writeln!(out, "Fill in a valid key in {CONFIG_FILE_NAME}")?;
    Ok(false)
}

/// Offer detection, chat, or exit until one of them has run.
pub async fn run_menu<P, W>(ctx: ChatContext<'_>, prompter: &mut P, out: &mut W) -> Result<()>
where
    P: Prompter,
    W: Write,
{
    writeln!(out, "\nModes:")?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "  1. Detect - identify the model behind this API")?;
    writeln!(out, "  2. Chat   - talk to the model without a system prompt")?;
    writeln!(out, "  3. Exit")?;
    writeln!(out, "{RULE}")?;

    loop {
        let input = prompter.read_line("Select mode [1-3]")?;
        match MenuChoice::parse(&input) {
            Some(MenuChoice::Detect) => {
                chat::run_model_detection(ctx, out).await?;
                let next = prompter.read_line("\nContinue into chat mode? [y/N]")?;
                if next.trim().eq_ignore_ascii_case("y") {
                    ChatSession::default().run(ctx, prompter, out).await?;
                }
                return Ok(());
            }
            Some(MenuChoice::Chat) => {
                return ChatSession::default().run(ctx, prompter, out).await;
            }
            Some(MenuChoice::Exit) => {
                writeln!(out, "Bye!")?;
                return Ok(());
            }
            None => writeln!(out, "Invalid choice, enter 1, 2 or 3")?,
        }
    }
}
