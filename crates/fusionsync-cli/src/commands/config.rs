use std::path::Path;

use fusionsync_core::config::DEFAULT_HOST;
use fusionsync_core::util::{is_http_url, normalize_text_option};

use crate::cli::ConfigCommands;
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init { host, no_activate } => {
            let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
            let name = init_profile(&mut config, global_profile, host, no_activate)?;
            let path = config.save().map_err(CliError::Config)?;
            print_initialized(&config, &name, &path);
            Ok(())
        }
    }
}

/// Apply `config init` to an in-memory config and return the profile name.
pub fn init_profile(
    config: &mut CliProfilesConfig,
    profile_name: Option<&str>,
    host: Option<String>,
    no_activate: bool,
) -> Result<String, CliError> {
    let profile_name = config.resolve_profile_name(profile_name);
    let existing_host = config.profile(&profile_name).and_then(|profile| profile.host());

    let host = match normalize_text_option(host) {
        Some(host) => normalize_host(host)?,
        None => existing_host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
    };

    config.profile_mut_or_default(&profile_name).host = Some(host);
    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }
    Ok(profile_name)
}

pub fn normalize_host(host: String) -> Result<String, CliError> {
    if !is_http_url(&host) {
        return Err(CliError::Config(
            "host must include http:// or https://".to_string(),
        ));
    }
    Ok(host.trim_end_matches('/').to_string())
}

fn print_initialized(config: &CliProfilesConfig, name: &str, path: &Path) {
    let host = config
        .profile(name)
        .and_then(|profile| profile.host())
        .unwrap_or_default();
    println!("Profile '{name}' ({host}) initialized at {}", path.display());
}
