//! Config command - inspect the effective configuration

use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::config::{Settings, SettingsManager};

/// Show the effective settings, token masked
pub fn show(settings: &Settings, path: Option<&Path>) -> Result<()> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => SettingsManager::settings_path()?,
    };
    let source = if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found, using defaults)", path.display())
    };

    println!("{}", "Drive gateway configuration".bold());
    println!("  Config file:    {}", source.dimmed());
    println!("  API base:       {}", settings.api_base.cyan());
    println!("  Upload base:    {}", settings.upload_base.cyan());
    println!("  Timeout:        {}s", settings.timeout_secs);
    println!("  Max download:   {} bytes", settings.max_download_bytes);
    println!("  Access token:   {}", mask_token(settings.access_token.as_deref()));
    Ok(())
}

fn mask_token(token: Option<&str>) -> String {
    match token {
        Some(t) if t.len() > 8 => {
            let prefix: String = t.chars().take(4).collect();
            format!("{}…", prefix).green().to_string()
        }
        Some(t) if !t.is_empty() => "set".green().to_string(),
        _ => "not set".yellow().to_string(),
    }
}
