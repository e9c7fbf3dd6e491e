//! Config command - show or initialize configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::CacheResult;
use crate::ui::{self, UiContext};

/// Execute the config command
pub fn execute(
    args: ConfigArgs,
    config: &Config,
    manager: &ConfigManager,
    ctx: &UiContext,
) -> CacheResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force, ctx)?,
    }

    Ok(())
}

fn show_config(config: &Config) -> CacheResult<()> {
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn init_config(manager: &ConfigManager, force: bool, ctx: &UiContext) -> CacheResult<()> {
    let path = manager.path();
    if manager.init(force)? {
        ui::step_ok(
            ctx,
            &format!("Configuration initialized at {}", path.display()),
        );
    } else {
        ui::step_warn(
            ctx,
            &format!(
                "Config already exists at {} (use --force to overwrite)",
                path.display()
            ),
        );
    }
    Ok(())
}
