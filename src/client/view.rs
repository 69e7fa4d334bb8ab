//! Merged render model: fetched pages joined with the done set.

use serde::Serialize;

use crate::core::{BeadId, DoneSet, PAGE_SIZE, Page, PageItem};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BeadView {
    pub id: BeadId,
    pub name: String,
    pub is_disabled: bool,
    pub is_selected: bool,
    pub is_milestone: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageView {
    /// First id / page size, or the page's position when it is empty.
    pub page_number: u32,
    pub beads: Vec<BeadView>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RenderModel {
    pub pages: Vec<PageView>,
    pub selected: Option<PageItem>,
    pub done_count: usize,
    pub malas: usize,
}

/// Join pages with the done set and the current selection.
///
/// Pure: the result depends only on the arguments.
pub fn merged_view(pages: &[Page], done: &DoneSet, selected: Option<BeadId>) -> RenderModel {
    let mut selected_item = None;
    let pages = pages
        .iter()
        .enumerate()
        .map(|(index, page)| {
            let page_number = page
                .first_id()
                .map(|id| id.get() / PAGE_SIZE)
                .unwrap_or(index as u32);
            let beads = page
                .items()
                .iter()
                .map(|item| {
                    let is_selected = selected == Some(item.id);
                    if is_selected && selected_item.is_none() {
                        selected_item = Some(item.clone());
                    }
                    BeadView {
                        id: item.id,
                        name: item.name.clone(),
                        is_disabled: done.contains(item.id),
                        is_selected,
                        is_milestone: item.id.is_milestone(),
                    }
                })
                .collect();
            PageView { page_number, beads }
        })
        .collect();

    RenderModel {
        pages,
        selected: selected_item,
        done_count: done.len(),
        malas: done.malas(),
    }
}
