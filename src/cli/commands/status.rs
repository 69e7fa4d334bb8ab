use super::super::{Ctx, print_output, render};
use crate::Result;
use crate::api::StatusOutput;
use crate::core::Cursor;

pub(crate) fn handle(ctx: &Ctx) -> Result<()> {
    let store = ctx.store();
    let (done, rejected) = ctx.load_done(&store)?;
    let output = StatusOutput {
        store: store.path().to_path_buf(),
        done_count: done.len(),
        malas: done.malas(),
        ready: !done.is_empty(),
        resume_cursor: Cursor::resume_from(done.len()),
        rejected,
    };
    print_output(ctx, &output, render::render_status)
}
