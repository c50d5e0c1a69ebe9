//! Tool cache inspection and cleanup

use console::Style;

use super::SystemServices;
use crate::cli::{CacheArgs, CacheSubcommand};
use crate::config::Config;
use crate::error::Result;
use crate::toolcache::{
    CacheState, DotnetToolInstaller, NugetFeed, ProvisionRequest, ToolCache, ToolSentinel,
};

pub fn run(args: CacheArgs, config: &Config) -> Result<()> {
    let system = SystemServices::new(config)?;
    let services = system.services();
    let feed = NugetFeed::new(
        services.transport,
        &config.nuget_feed,
        crate::operations::retry_policy(config),
    );
    let installer = DotnetToolInstaller::new(services.runner);
    let cache = ToolCache::new(
        config.cache_root.clone(),
        config.package_id.as_deref(),
        &feed,
        &installer,
        services.emitter,
    );

    match args.command.unwrap_or(CacheSubcommand::Show) {
        CacheSubcommand::Show => show(&cache),
        CacheSubcommand::Clear => {
            if cache.clear()? {
                println!("Removed {}", cache.tool_root().display());
            } else {
                println!("Tool cache is already empty.");
            }
            Ok(())
        }
    }
}

fn show(cache: &ToolCache<'_>) -> Result<()> {
    let (state, sentinel) = cache.inspect(&ProvisionRequest::default())?;
    let bold = Style::new().bold();

    println!("{}", bold.apply_to("Tool cache:"));
    println!("  Location: {}", cache.tool_root().display());
    println!("  Package: {}", cache.package_id());
    println!("  Sentinel: {}", cache.sentinel_path().display());
    println!("  State: {}", describe(&state));

    match sentinel {
        Some(sentinel) => print_sentinel(&sentinel),
        None => {
            println!();
            println!("Run 'albt run provision' to provision the compiler.");
        }
    }
    Ok(())
}

fn describe(state: &CacheState) -> String {
    match state {
        CacheState::Invalid(reason) => {
            format!("{} ({reason})", Style::new().yellow().apply_to(state.name()))
        }
        CacheState::Valid(_) => Style::new().green().apply_to(state.name()).to_string(),
        CacheState::Missing => state.name().to_string(),
    }
}

fn print_sentinel(sentinel: &ToolSentinel) {
    println!("  Compiler: {}", sentinel.compiler_version);
    println!("  Runtime: {}", sentinel.runtime);
    println!("  Executable: {}", sentinel.tool_path.display());
    println!(
        "  Installed: {} ({})",
        sentinel.timestamp_utc, sentinel.installation_type
    );
}
