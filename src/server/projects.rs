//! Page generation for `GET /api/projects`.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::api::{Project, ProjectsResponse};
use crate::core::{MAX_BEAD, PAGE_SIZE};

/// Page of beads starting at `cursor`, named with the server time `now_ms`.
///
/// Past the last bead the page is empty and only points backwards.
pub fn page_at(cursor: u32, now_ms: u64) -> ProjectsResponse {
    if cursor > MAX_BEAD {
        return ProjectsResponse {
            data: Vec::new(),
            next_id: None,
            previous_id: Some(cursor - PAGE_SIZE),
        };
    }

    let last = cursor.saturating_add(PAGE_SIZE - 1).min(MAX_BEAD);
    let data = (cursor..=last)
        .map(|id| Project {
            id,
            name: format!("Project {id} (server time: {now_ms})"),
        })
        .collect();

    ProjectsResponse {
        data,
        next_id: (last < MAX_BEAD).then_some(last + 1),
        previous_id: (cursor > 0).then(|| cursor.saturating_sub(PAGE_SIZE)),
    }
}

/// Parse a `cursor` query value the lenient way: leading digits count,
/// anything missing, unparsable or negative is 0.
pub fn parse_cursor(raw: Option<&str>) -> u32 {
    let Some(raw) = raw else {
        return 0;
    };
    let raw = raw.trim_start();
    let (negative, rest) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..digits_end];
    if negative || digits.is_empty() {
        return 0;
    }
    // All digits: only overflow can fail.
    digits.parse::<u32>().unwrap_or(u32::MAX)
}

/// Value of the first `cursor` parameter among decoded query pairs.
pub fn cursor_param(params: &[(String, String)]) -> Option<&str> {
    params
        .iter()
        .find(|(key, _)| key == "cursor")
        .map(|(_, value)| value.as_str())
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
