//! Config inspection command

use std::path::Path;

use anyhow::Result;

use stevedore::Settings;

/// Print the resolved settings plus the paths they derive to
pub fn cmd_config(config_path: &Path, json: bool) -> Result<()> {
    let settings = Settings::load_or_default(config_path)?;
    let root = settings.install_root.trim_end_matches('/');

    if json {
        let value = serde_json::json!({
            "settings": settings,
            "derived": {
                "current_symlink": format!("{root}/current"),
                "previous_symlink": format!("{root}/previous"),
                "deploys_dir": format!("{root}/deploys"),
                "bundles_dir": format!("{root}/bundles"),
            },
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Settings ({}):", config_path.display());
    println!("  remote_user         = {}", settings.remote_user);
    println!("  install_root        = {}", settings.install_root);
    println!(
        "  local_bundles_dir   = {}",
        settings.local_bundles_dir.display()
    );
    println!("  health_check_port   = {}", settings.health_check_port);
    println!("  health_check_path   = {}", settings.health_check_path);
    println!("  warmup_secs         = {}", settings.warmup_secs);
    println!("  tunnel_timeout_secs = {}", settings.tunnel_timeout_secs);
    println!("  app_service         = {}", settings.app_service);
    println!("  proxy_service       = {}", settings.proxy_service);
    println!("  runtime_bin_dir     = {}", settings.runtime_bin_dir);
    println!();
    println!("Derived paths:");
    println!("  current  -> {root}/current");
    println!("  previous -> {root}/previous");
    println!("  deploys  -> {root}/deploys");
    println!("  bundles  -> {root}/bundles");

    Ok(())
}
