use super::super::{Ctx, PageArgs, print_output, render};
use crate::Result;
use crate::api::PageOutput;
use crate::client::merged_view;
use crate::core::Cursor;

pub(crate) fn handle(ctx: &Ctx, args: PageArgs) -> Result<()> {
    let cursor = Cursor(args.cursor);
    let page = ctx.fetcher(args.local).fetch_page(cursor)?;
    let (done, _) = ctx.load_done(&ctx.store())?;

    let output = PageOutput {
        cursor,
        next_cursor: page.next_cursor(),
        previous_cursor: page.previous_cursor(),
        model: merged_view(std::slice::from_ref(&page), &done, None),
    };
    print_output(ctx, &output, render::render_page)
}
