use std::io::{self, Write};

use crate::model::{ContentBlock, ContentDelta, StreamEvent, Usage};

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";
const RULE: &str = "----------------------------------------";

/// Splits an arbitrarily chunked byte stream into complete lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Append a chunk and drain every line it completes (without `\r\n`/`\n`).
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(decode_line(&line[..pos]));
        }
        lines
    }

    /// Whatever trails the last newline once the body has ended.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        Some(decode_line(&rest))
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let line = String::from_utf8_lossy(bytes);
    line.trim_end_matches('\r').to_owned()
}

/// Whether the consumer should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Done,
}

/// Renders stream events to `out` as they arrive and collects the answer text.
pub struct StreamPrinter<W: Write> {
    out: W,
    show_thinking: bool,
    in_thinking: bool,
    answer: String,
}

impl<W: Write> StreamPrinter<W> {
    pub fn new(out: W, show_thinking: bool) -> Self {
        Self {
            out,
            show_thinking,
            in_thinking: false,
            answer: String::new(),
        }
    }

    /// Feed one raw line of the event stream.
    pub fn handle_line(&mut self, line: &str) -> io::Result<Flow> {
        let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
            return Ok(Flow::Continue);
        };
        if payload == DONE_SENTINEL {
            return Ok(Flow::Done);
        }

        match serde_json::from_str::<StreamEvent>(payload) {
            Ok(event) => self.handle_event(event)?,
            Err(err) => tracing::debug!("skipping unparseable stream line: {err}"),
        }
        Ok(Flow::Continue)
    }

    fn handle_event(&mut self, event: StreamEvent) -> io::Result<()> {
        match event {
            StreamEvent::ContentBlockStart { content_block } => match content_block {
                ContentBlock::Thinking => {
                    self.in_thinking = true;
                    if self.show_thinking {
                        writeln!(self.out, "[thinking]")?;
                        writeln!(self.out, "{RULE}")?;
                    }
                }
                ContentBlock::Text => {
                    if self.in_thinking {
                        self.in_thinking = false;
                        if self.show_thinking {
                            writeln!(self.out, "\n{RULE}")?;
                        }
                    }
                    writeln!(self.out, "\n[answer]")?;
                    writeln!(self.out, "{RULE}")?;
                }
                ContentBlock::Other => {}
            },
            StreamEvent::ContentBlockDelta { delta } => match delta {
                ContentDelta::TextDelta { text } => {
                    write!(self.out, "{text}")?;
                    self.out.flush()?;
                    self.answer.push_str(&text);
                }
                ContentDelta::ThinkingDelta { thinking } => {
                    if self.show_thinking {
                        write!(self.out, "{thinking}")?;
                        self.out.flush()?;
                    }
                }
                ContentDelta::Other => {}
            },
            StreamEvent::MessageStart { message } => {
                if let Some(usage) = message.usage {
                    writeln!(self.out, "[input tokens: {}]", count(&usage.input_tokens))?;
                }
            }
            StreamEvent::MessageDelta { usage } => {
                if let Some(Usage { output_tokens, .. }) = usage {
                    writeln!(self.out, "\n[output tokens: {}]", count(&output_tokens))?;
                }
            }
            StreamEvent::Other => {}
        }
        Ok(())
    }

    /// The accumulated answer; thinking text is never part of it.
    pub fn into_answer(self) -> String {
        self.answer
    }
}

fn count(tokens: &Option<u64>) -> String {
    tokens
        .map(|value| value.to_string())
        .unwrap_or_else(|| "N/A".to_owned())
}
