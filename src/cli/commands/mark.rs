use super::super::{Ctx, MarkArgs, print_output, render};
use crate::Result;
use crate::api::MarkOutput;
use crate::store::RealtimeStore;

pub(crate) fn handle(ctx: &Ctx, args: MarkArgs) -> Result<()> {
    let store = ctx.store();
    let (mut done, _) = ctx.load_done(&store)?;

    let mut marked = Vec::new();
    let mut skipped = Vec::new();
    for id in args.ids {
        if !done.insert(id) {
            skipped.push(id);
            continue;
        }
        store.append(id)?;
        marked.push(id);
    }

    let output = MarkOutput {
        marked,
        skipped,
        done_count: done.len(),
        malas: done.malas(),
    };
    print_output(ctx, &output, render::render_mark)
}
