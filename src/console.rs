use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::Context;
use dialoguer::Input;

use crate::error::{DetectorError, Result};

/// Line-oriented operator input.
pub trait Prompter {
    /// Read one line; an interrupt or end of input surfaces as [`DetectorError::Interrupted`].
    fn read_line(&mut self, prompt: &str) -> Result<String>;
}

/// Terminal input through `dialoguer`, plain line reads when stdin is piped.
#[derive(Debug, Default)]
pub struct TermPrompter;

impl Prompter for TermPrompter {
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        // dialoguer draws on stderr and refuses to run unless both ends are a terminal.
        if io::stdin().is_terminal() && io::stderr().is_terminal() {
            return read_interactive(prompt);
        }
        read_plain(&mut io::stdin().lock(), &mut io::stderr(), prompt)
    }
}

fn read_interactive(prompt: &str) -> Result<String> {
    let input = Input::<String>::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text();

    match input {
        Ok(line) => Ok(line),
        Err(dialoguer::Error::IO(err)) if err.kind() == io::ErrorKind::Interrupted => {
            Err(DetectorError::Interrupted.into())
        }
        Err(err) => Err(err.into()),
    }
}

/// Echo `prompt` to `echo` and read one line from `reader`; EOF ends the session.
fn read_plain<R, W>(reader: &mut R, echo: &mut W, prompt: &str) -> Result<String>
where
    R: BufRead,
    W: Write,
{
    write!(echo, "{prompt}: ")?;
    echo.flush()?;

    let mut line = String::new();
    let read = reader
        .read_line(&mut line)
        .context("reading operator input")?;
    if read == 0 {
        return Err(DetectorError::Interrupted.into());
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

#[cfg(test)]
pub(crate) mod scripted {
    use std::collections::VecDeque;

    use super::Prompter;
    use crate::error::{DetectorError, Result};

    /// Replays canned answers, then behaves like an interrupt.
    #[derive(Debug, Default)]
    pub struct ScriptedPrompter {
        lines: VecDeque<String>,
        pub prompts: Vec<String>,
    }

    impl ScriptedPrompter {
        pub fn new(lines: &[&str]) -> Self {
            Self {
                lines: lines.iter().map(|line| (*line).to_owned()).collect(),
                prompts: Vec::new(),
            }
        }

        pub fn remaining(&self) -> usize {
            self.lines.len()
        }
    }

    impl Prompter for ScriptedPrompter {
        fn read_line(&mut self, prompt: &str) -> Result<String> {
            self.prompts.push(prompt.to_owned());
            self.lines
                .pop_front()
                .ok_or_else(|| DetectorError::Interrupted.into())
        }
    }
}
