use std::path::PathBuf;

use fusionsync_core::api::FusionAuthClient;
use fusionsync_core::config::ClientConfig;
use fusionsync_core::mapping::{MappingTable, Section};
use fusionsync_core::ResourceKind;

use crate::cli::RemoteArgs;
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

/// Build an API client from flags, environment and the active profile.
pub fn connect(remote: RemoteArgs, profile: Option<&str>) -> Result<FusionAuthClient, CliError> {
    let profile_host = CliProfilesConfig::load()
        .map_err(CliError::Config)?
        .host_for(profile);
    let config = ClientConfig::from_env(remote.key, remote.host, profile_host)?;
    tracing::debug!(host = %config.host, "resolved server");
    Ok(config.client()?)
}

/// Directory argument or the kind's default.
pub fn resource_dir(explicit: Option<PathBuf>, kind: ResourceKind) -> PathBuf {
    explicit.unwrap_or_else(|| PathBuf::from(kind.default_dir()))
}

/// Mapping table for a tree-synced kind, limited to `sections` when given.
pub fn mapping_table(kind: ResourceKind, sections: &[Section]) -> Result<MappingTable, CliError> {
    let table = MappingTable::for_kind(kind).ok_or_else(|| {
        CliError::Config(format!("{} is not synced as a directory tree", kind.label()))
    })?;
    if sections.is_empty() {
        Ok(table)
    } else {
        Ok(table.restrict(sections))
    }
}
