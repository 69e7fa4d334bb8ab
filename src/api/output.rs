//! CLI output schemas (`--json`).

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Serialize;

use crate::client::RenderModel;
use crate::core::{BeadId, Cursor};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusOutput {
    pub store: PathBuf,
    pub done_count: usize,
    pub malas: usize,
    /// At least one bead has been recorded.
    pub ready: bool,
    /// Cursor a new session starts from.
    pub resume_cursor: Cursor,
    #[serde(skip_serializing_if = "is_zero")]
    pub rejected: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkOutput {
    pub marked: Vec<BeadId>,
    /// Already done before this call.
    pub skipped: Vec<BeadId>,
    pub done_count: usize,
    pub malas: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageOutput {
    pub cursor: Cursor,
    pub next_cursor: Option<Cursor>,
    pub previous_cursor: Option<Cursor>,
    pub model: RenderModel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServingOutput {
    pub addr: SocketAddr,
    pub response_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigInitOutput {
    pub path: PathBuf,
    /// False when a config already existed and was left alone.
    pub written: bool,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}
