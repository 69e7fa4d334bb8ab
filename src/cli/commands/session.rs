//! Line-driven counting session.
//!
//! Input: a bead number marks it, `n`/`p` load more, `q` or EOF quits.

use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver};

use super::super::{Ctx, SessionArgs, parse_bead_id, print_line, render};
use crate::client::{Command, SessionEvent, SessionHandle, spawn_session};
use crate::store::RealtimeStore;
use crate::{Error, Result};

/// Extra wait after the debounce window so the last marks reach the store
/// writer. `close` then waits for those writes.
const FLUSH_MARGIN: Duration = Duration::from_millis(100);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Send(Command),
    Quit,
    Skip,
    Unknown(String),
}

pub(crate) fn handle(ctx: &Ctx, args: SessionArgs) -> Result<()> {
    let store: Arc<dyn RealtimeStore> = Arc::new(ctx.store());
    let session_config = ctx.config.session.session_config();
    let session = spawn_session(store, ctx.fetcher(args.local), session_config)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGTERM, shutdown.clone())?;
    signal_hook::flag::register(signal_hook::consts::SIGINT, shutdown.clone())?;

    let lines = spawn_stdin_reader()?;
    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        crossbeam::select! {
            recv(session.events()) -> msg => match msg {
                Ok(event) => print_event(ctx, &event)?,
                Err(_) => {
                    tracing::warn!("session stopped unexpectedly");
                    return Ok(());
                }
            },
            recv(lines) -> msg => {
                let Ok(line) = msg else {
                    break;
                };
                match parse_input(&line) {
                    Input::Send(command) => session.send(command)?,
                    Input::Quit => break,
                    Input::Skip => {}
                    Input::Unknown(raw) => {
                        print_line(&format!("unknown input: {raw} (bead number, n, p or q)"))?;
                    }
                }
            },
            default(POLL_INTERVAL) => {}
        }
    }

    finish(ctx, session, session_config.debounce)
}

/// Let pending marks persist, then close.
fn finish(ctx: &Ctx, session: SessionHandle, debounce: Duration) -> Result<()> {
    let deadline = Instant::now() + debounce + FLUSH_MARGIN;
    while let Ok(event) = session.events().recv_deadline(deadline) {
        print_event(ctx, &event)?;
    }
    session.close();
    Ok(())
}

fn spawn_stdin_reader() -> Result<Receiver<String>> {
    let (tx, rx) = channel::unbounded();
    std::thread::Builder::new()
        .name("japa-stdin".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })
        .map_err(Error::Io)?;
    Ok(rx)
}

fn parse_input(line: &str) -> Input {
    let trimmed = line.trim();
    match trimmed {
        "" => Input::Skip,
        "q" | "quit" | "exit" => Input::Quit,
        "n" | "next" => Input::Send(Command::FetchNext),
        "p" | "prev" | "previous" => Input::Send(Command::FetchPrevious),
        _ => match parse_bead_id(trimmed) {
            Ok(id) => Input::Send(Command::Click(id)),
            Err(_) => Input::Unknown(trimmed.to_string()),
        },
    }
}

fn print_event(ctx: &Ctx, event: &SessionEvent) -> Result<()> {
    let line = match (event, ctx.json) {
        (SessionEvent::Render(view), true) => {
            serde_json::to_string(&serde_json::json!({ "event": "render", "view": view }))?
        }
        (SessionEvent::Notice(notice), true) => {
            serde_json::to_string(&serde_json::json!({ "event": "notice", "detail": notice }))?
        }
        (SessionEvent::Render(view), false) => render::render_session_view(view),
        (SessionEvent::Notice(notice), false) => render::render_notice(notice),
    };
    print_line(&line)
}
