//! Fetch and image commands - resolve a URL to a cached local file

use crate::cache::{DownloadCache, HttpTransport};
use crate::cli::args::{FetchArgs, ImageArgs};
use crate::config::Config;
use crate::error::CacheResult;
use crate::ui::{self, ProgressTransport, UiContext};
use std::path::Path;
use tracing::debug;

fn build_cache(config: &Config, ctx: &UiContext) -> DownloadCache<ProgressTransport<HttpTransport>> {
    let http = HttpTransport::new(&config.http);
    DownloadCache::from_config(config, ProgressTransport::new(http, ctx.clone()))
}

fn report(ctx: &UiContext, path: &Path) {
    ui::step_ok(ctx, "Artifact ready");
    println!("{}", path.display());
}

/// Execute the fetch command
pub fn execute(args: FetchArgs, config: &Config, ctx: &UiContext) -> CacheResult<()> {
    debug!("Fetching {} into category {}", args.url, args.category);
    let cache = build_cache(config, ctx);
    let path = cache.fetch(&args.url, &args.category)?;
    report(ctx, &path);
    Ok(())
}

/// Execute the image command
pub fn image(args: ImageArgs, config: &Config, ctx: &UiContext) -> CacheResult<()> {
    let cache = build_cache(config, ctx);
    ui::step_info(ctx, &format!("Obtaining image file from '{}'", args.url));
    let path = cache.fetch_image(&args.url)?;
    report(ctx, &path);
    Ok(())
}
