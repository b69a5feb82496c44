use std::io::{self, Write};

use anyhow::Context;
use futures_util::TryStreamExt;
use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

use crate::config::{Config, Endpoint};
use crate::detect::{self, ModelLabel, CUTOFF_HINTS, PROBE_QUESTION};
use crate::error::{DetectorError, Result};
use crate::model::{build_body, ChatRequest};
use crate::session::{get_headers, HttpSession};
use crate::stream::{Flow, LineBuffer, StreamPrinter};

const BANNER: &str = "============================================================";

/// Everything a request needs that stays fixed for the whole session.
#[derive(Debug, Clone, Copy)]
pub struct ChatContext<'a> {
    pub session: &'a HttpSession,
    pub endpoint: &'a Endpoint,
    pub config: &'a Config,
}

/// Per-request reasoning switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    pub with_thinking: bool,
    pub show_thinking: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            with_thinking: true,
            show_thinking: true,
        }
    }
}

#[derive(Debug, Error)]
enum RequestFailure {
    #[error("request failed [{status}]: {body}")]
    Status { status: StatusCode, body: String },
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    Console(#[from] io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Send `message` and stream the reply to `out`, returning the answer text.
///
/// Server and transport failures are reported to `out` and yield whatever
/// answer text arrived before them (empty when nothing did). The only error
/// returned is an interrupt, or a console that can no longer be written.
pub async fn send_request<W: Write>(
    ctx: ChatContext<'_>,
    message: &str,
    options: RequestOptions,
    out: &mut W,
) -> Result<String> {
    let endpoint = ctx.endpoint;
    writeln!(out, "\n{BANNER}")?;
    writeln!(out, "API: {}", endpoint.name)?;
    writeln!(out, "URL: {}", endpoint.url)?;
    writeln!(out, "Question: {message}")?;
    writeln!(out, "Thinking: {}", on_off(options.with_thinking))?;
    writeln!(out, "{BANNER}\n")?;

    let body = build_body(message, ctx.config, options.with_thinking);
    let mut printer = StreamPrinter::new(&mut *out, options.show_thinking);

    let outcome = tokio::select! {
        result = stream_reply(ctx, &body, &mut printer) => Some(result),
        Ok(()) = tokio::signal::ctrl_c() => None,
    };
    let answer = printer.into_answer();

    match outcome {
        None => {
            writeln!(out, "\n[interrupted]")?;
            return Err(DetectorError::Interrupted.into());
        }
        Some(Ok(())) => writeln!(out, "\n{BANNER}\n")?,
        Some(Err(failure)) => report_failure(&failure, endpoint, out)?,
    }

    Ok(answer)
}

async fn stream_reply<W: Write>(
    ctx: ChatContext<'_>,
    body: &ChatRequest,
    printer: &mut StreamPrinter<W>,
) -> Result<(), RequestFailure> {
    let url = request_url(&ctx.endpoint.url)?;
    let headers = get_headers(&ctx.endpoint.key)?;

    let response = ctx
        .session
        .client()
        .post(url)
        .headers(headers)
        .json(body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await?;
        return Err(RequestFailure::Status { status, body });
    }

    let mut lines = LineBuffer::default();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.try_next().await? {
        for line in lines.push(&chunk) {
            if printer.handle_line(&line)? == Flow::Done {
                return Ok(());
            }
        }
    }
    if let Some(line) = lines.finish() {
        printer.handle_line(&line)?;
    }

    Ok(())
}

fn request_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw).with_context(|| format!("invalid endpoint URL `{raw}`"))?;
    url.query_pairs_mut().append_pair("beta", "true");
    Ok(url)
}

fn report_failure<W: Write>(
    failure: &RequestFailure,
    endpoint: &Endpoint,
    out: &mut W,
) -> io::Result<()> {
    tracing::debug!("request to {} failed: {failure:?}", endpoint.name);
    match failure {
        RequestFailure::Status { status, body } => {
            writeln!(out, "\nRequest failed [{status}]: {body}")
        }
        RequestFailure::Transport(err) if err.is_connect() => writeln!(
            out,
            "\nConnection failed: unable to reach {}",
            endpoint.url
        ),
        RequestFailure::Transport(err) if err.is_timeout() => {
            writeln!(out, "\nRequest timed out")
        }
        other => writeln!(out, "\nRequest error: {other:#}"),
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

/// Ask the knowledge-cutoff probe and print a verdict.
///
/// Returns `None` when the endpoint produced no answer text.
pub async fn run_model_detection<W: Write>(
    ctx: ChatContext<'_>,
    out: &mut W,
) -> Result<Option<ModelLabel>> {
    writeln!(out, "\n{BANNER}")?;
    writeln!(out, "Model detection")?;
    writeln!(out, "{BANNER}")?;
    writeln!(
        out,
        "Asks for the knowledge cutoff date; the date identifies the model."
    )?;
    writeln!(
        out,
        "Asking \"which model are you\" directly is unreliable and is not used."
    )?;
    writeln!(out, "{BANNER}")?;

    let answer = send_request(ctx, PROBE_QUESTION, RequestOptions::default(), out).await?;
    if answer.is_empty() {
        return Ok(None);
    }

    let label = detect::detect_model(&answer);
    writeln!(out, "{BANNER}")?;
    writeln!(out, "Detected: {label}")?;
    if label.is_known() {
        writeln!(out, "Model identified (about 95% accurate)")?;
    } else {
        writeln!(
            out,
            "Could not classify automatically; judge from the answer above:"
        )?;
        for (cutoff, model) in CUTOFF_HINTS {
            writeln!(out, "    {cutoff:<24} -> {model}")?;
        }
    }
    writeln!(out, "{BANNER}")?;

    Ok(Some(label))
}
