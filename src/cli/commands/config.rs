use super::super::{ConfigAction, ConfigArgs, Ctx, print_line, print_output, render};
use crate::Result;
use crate::api::ConfigInitOutput;
use crate::config::{self, Config, ConfigError};

pub(crate) fn handle(ctx: &Ctx, args: ConfigArgs) -> Result<()> {
    match args.action {
        ConfigAction::Show => show(ctx),
        ConfigAction::Init { force } => init(ctx, force),
    }
}

fn show(ctx: &Ctx) -> Result<()> {
    if ctx.json {
        return print_line(&serde_json::to_string_pretty(&ctx.config)?);
    }
    let rendered = toml::to_string_pretty(&ctx.config).map_err(ConfigError::from)?;
    print_line(rendered.trim_end())
}

fn init(ctx: &Ctx, force: bool) -> Result<()> {
    let path = config::config_path();
    let written = force || !path.exists();
    if written {
        config::write_config(&path, &Config::default())?;
        tracing::info!(path = %path.display(), "wrote default config");
    }
    print_output(ctx, &ConfigInitOutput { path, written }, render::render_config_init)
}
