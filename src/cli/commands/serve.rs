use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::super::{Ctx, ServeArgs, print_output, render};
use crate::Result;
use crate::api::ServingOutput;
use crate::server;

pub(crate) fn handle(ctx: &Ctx, args: ServeArgs) -> Result<()> {
    let mut config = ctx.config.server.server_config();
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }
    if let Some(delay_ms) = args.delay_ms {
        config.response_delay = Duration::from_millis(delay_ms);
    }
    let delay_ms = config.response_delay.as_millis() as u64;

    let shutdown = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGTERM, shutdown.clone())?;
    signal_hook::flag::register(signal_hook::consts::SIGINT, shutdown.clone())?;

    let server = server::start(config)?;
    let serving = ServingOutput {
        addr: server.addr(),
        response_delay_ms: delay_ms,
    };
    print_output(ctx, &serving, render::render_serving)?;

    while !shutdown.load(Ordering::Relaxed) {
        std::thread::sleep(Duration::from_millis(100));
    }

    tracing::info!("shutting down page server");
    server.shutdown();
    Ok(())
}
