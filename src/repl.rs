use std::io::Write;

use crate::chat::{self, ChatContext, RequestOptions};
use crate::console::Prompter;
use crate::error::{is_interrupted, Result};

const BANNER: &str = "============================================================";

/// One line of chat-mode input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Thinking(bool),
    Show(bool),
    Detect,
    Quit,
    Message(String),
}

impl Command {
    /// Parse a raw input line; blank input yields `None`.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }

        let command = match trimmed.to_lowercase().as_str() {
            "quit" | "exit" | "q" => Command::Quit,
            "thinking on" => Command::Thinking(true),
            "thinking off" => Command::Thinking(false),
            "show on" => Command::Show(true),
            "show off" => Command::Show(false),
            "detect" => Command::Detect,
            _ => Command::Message(trimmed.to_owned()),
        };
        Some(command)
    }
}

/// Context-free chat: every message is a fresh single-turn request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatSession {
    pub reasoning_enabled: bool,
    pub reasoning_visible: bool,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self {
            reasoning_enabled: true,
            reasoning_visible: true,
        }
    }
}

impl ChatSession {
    pub fn options(&self) -> RequestOptions {
        RequestOptions {
            with_thinking: self.reasoning_enabled,
            show_thinking: self.reasoning_visible,
        }
    }

    /// Run until a quit command or an interrupt.
    pub async fn run<P, W>(
        &mut self,
        ctx: ChatContext<'_>,
        prompter: &mut P,
        out: &mut W,
    ) -> Result<()>
    where
        P: Prompter,
        W: Write,
    {
        print_help(out)?;

        loop {
            match self.step(ctx, prompter, out).await {
                Ok(true) => continue,
                Ok(false) => {
                    writeln!(out, "Bye!")?;
                    return Ok(());
                }
                Err(err) if is_interrupted(&err) => {
                    writeln!(out, "\n\nInterrupted")?;
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Handle one input line; `Ok(false)` ends the session.
    async fn step<P, W>(
        &mut self,
        ctx: ChatContext<'_>,
        prompter: &mut P,
        out: &mut W,
    ) -> Result<bool>
    where
        P: Prompter,
        W: Write,
    {
        let line = prompter.read_line("\nyou")?;
        let Some(command) = Command::parse(&line) else {
            return Ok(true);
        };

        match command {
            Command::Quit => return Ok(false),
            Command::Thinking(on) => {
                self.reasoning_enabled = on;
                writeln!(out, "Thinking mode {}", enabled(on))?;
            }
            Command::Show(on) => {
                self.reasoning_visible = on;
                writeln!(out, "Thinking display {}", enabled(on))?;
            }
            Command::Detect => {
                chat::run_model_detection(ctx, out).await?;
            }
            Command::Message(message) => {
                chat::send_request(ctx, &message, self.options(), out).await?;
            }
        }
        Ok(true)
    }
}

fn enabled(on: bool) -> &'static str {
    if on {
        "enabled"
    } else {
        "disabled"
    }
}

fn print_help<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "\n{BANNER}")?;
    writeln!(out, "Chat mode")?;
    writeln!(out, "{BANNER}")?;
    writeln!(
        out,
        "No system prompt and no memory: every message starts a new conversation."
    )?;
    writeln!(out, "Commands:")?;
    writeln!(out, "  thinking on/off - toggle thinking mode (default on)")?;
    writeln!(out, "  show on/off     - toggle thinking display (default on)")?;
    writeln!(out, "  detect          - run model detection")?;
    writeln!(out, "  quit/exit/q     - leave")?;
    writeln!(out, "{BANNER}")?;
    Ok(())
}
