//! Human renderer for CLI outputs.
//!
//! Pure formatting; handlers gather any extra data needed.

use std::fmt::Write as _;

use crate::api::{ConfigInitOutput, MarkOutput, PageOutput, ServingOutput, StatusOutput};
use crate::client::{ControlState, Notice, PageView, QueryStatus, RenderModel, SessionView};

const BEADS_PER_ROW: usize = 12;

pub fn render_status(status: &StatusOutput) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Store: {}", status.store.display());
    let _ = writeln!(out, "  Done: {} ({} malas)", status.done_count, status.malas);
    if status.rejected > 0 {
        let _ = writeln!(out, "  Skipped {} malformed entries", status.rejected);
    }
    if status.ready {
        let _ = write!(out, "  Resumes at cursor {}", status.resume_cursor);
    } else {
        out.push_str("  Nothing counted yet");
    }
    out
}

pub fn render_mark(mark: &MarkOutput) -> String {
    let mut out = String::new();
    for id in &mark.marked {
        let _ = writeln!(out, "✓ Marked bead {id}");
    }
    for id in &mark.skipped {
        let _ = writeln!(out, "  Bead {id} already done");
    }
    let _ = write!(out, "{} done, {} malas", mark.done_count, mark.malas);
    out
}

pub fn render_page(page: &PageOutput) -> String {
    let mut out = render_model(&page.model);
    out.push('\n');
    out.push_str(&navigation(
        page.previous_cursor.map(|c| c.to_string()),
        page.next_cursor.map(|c| c.to_string()),
    ));
    out
}

pub fn render_session_view(view: &SessionView) -> String {
    if !view.ready {
        return "Waiting for the first recorded bead...".into();
    }
    let mut out = String::new();
    match &view.status {
        QueryStatus::Pending => out.push_str("Loading...\n"),
        QueryStatus::Error(message) => {
            let _ = writeln!(out, "Error: {message}");
        }
        QueryStatus::Success => {}
    }
    out.push_str(&render_model(&view.model));
    out.push('\n');
    let control = |state: &ControlState, key: &str| {
        if state.enabled {
            format!("[{key}] {}", state.label)
        } else {
            state.label.to_string()
        }
    };
    let _ = write!(
        out,
        "{} | {}",
        control(&view.previous, "p"),
        control(&view.next, "n")
    );
    if view.background_fetching {
        out.push_str(" | Background updating...");
    }
    out
}

pub fn render_notice(notice: &Notice) -> String {
    match notice {
        Notice::PersistFailed { id, message } => {
            format!("! Could not save bead {id}: {message}")
        }
        Notice::SubscriptionError { message } => format!("! Live updates failed: {message}"),
        Notice::FetchFailed { cursor, message } => {
            format!("! Could not load page at {cursor}: {message}")
        }
        Notice::MalformedEntries { rejected } => {
            format!("! Ignored {rejected} malformed store entries")
        }
        Notice::AlreadyDone { id } => format!("Bead {id} is already done"),
    }
}

pub fn render_serving(serving: &ServingOutput) -> String {
    let mut out = format!("Serving bead pages on http://{}", serving.addr);
    if serving.response_delay_ms > 0 {
        let _ = write!(out, " (delay {}ms)", serving.response_delay_ms);
    }
    out
}

pub fn render_config_init(init: &ConfigInitOutput) -> String {
    if init.written {
        format!("✓ Wrote default config to {}", init.path.display())
    } else {
        format!("Config already exists at {} (use --force to overwrite)", init.path.display())
    }
}

/// Pages as rows of bead numbers.
///
/// `[n]` is done, `n*` is a milestone, `>n<` is the selection.
fn render_model(model: &RenderModel) -> String {
    let mut out = String::new();
    for page in &model.pages {
        render_page_view(&mut out, page);
    }
    if model.pages.iter().all(|p| p.beads.is_empty()) {
        out.push_str("No beads on this page\n");
    }
    if let Some(selected) = &model.selected {
        let _ = writeln!(out, "Selected: {} ({})", selected.id, selected.name);
    }
    let _ = write!(out, "Done: {}  Malas: {}", model.done_count, model.malas);
    out
}

fn render_page_view(out: &mut String, page: &PageView) {
    if page.beads.is_empty() {
        return;
    }
    let _ = writeln!(out, "Page {}", page.page_number + 1);
    for row in page.beads.chunks(BEADS_PER_ROW) {
        let cells: Vec<String> = row
            .iter()
            .map(|bead| {
                let mut cell = if bead.is_disabled {
                    format!("[{}]", bead.id)
                } else {
                    bead.id.to_string()
                };
                if bead.is_milestone {
                    cell.push('*');
                }
                if bead.is_selected {
                    cell = format!(">{cell}<");
                }
                format!("{cell:>7}")
            })
            .collect();
        let _ = writeln!(out, "{}", cells.join(" ").trim_end());
    }
}

fn navigation(previous: Option<String>, next: Option<String>) -> String {
    let previous = previous.map_or("Nothing to load".to_string(), |c| {
        format!("previous: --cursor {c}")
    });
    let next = next.map_or("Nothing more to load".to_string(), |c| {
        format!("next: --cursor {c}")
    });
    format!("{previous} | {next}")
}
