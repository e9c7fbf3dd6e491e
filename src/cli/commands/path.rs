//! Path command - print the directory backing a category

use crate::cache::CacheDirResolver;
use crate::cli::args::PathArgs;
use crate::config::Config;
use crate::error::CacheResult;

/// Execute the path command
pub fn execute(args: PathArgs, config: &Config) -> CacheResult<()> {
    let dir = CacheDirResolver::from_config(&config.cache).resolve(&args.category)?;
    println!("{}", dir.display());
    Ok(())
}
