// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Inventory configuration.
//!
//! The configuration mirrors the YAML document accepted by `tinv --config`.
//! Every key is optional; unset values fall back to the conventional
//! `<inventory_path>/targets` and `<inventory_path>/classes` layout.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    backend::BackendKind,
    error::{self, Error},
    naming::{DEFAULT_JOINER, NameStrategy},
};

/// Inventory root used when none is configured.
pub const DEFAULT_INVENTORY_PATH: &str = "inventory";

/// Settings controlling where targets are discovered and how they render.
///
/// # Examples
///
/// ```
/// use std::path::Path;
///
/// use target_inventory::{BackendKind, InventoryConfig};
///
/// let yaml = r#"
/// inventory_path: ./inventory
/// compose_target_name: true
/// backend: plain
/// "#;
/// let config: InventoryConfig = serde_yaml::from_str(yaml,).expect("valid configuration",);
/// assert_eq!(config.targets_path(), Path::new("./inventory/targets"));
/// assert_eq!(config.backend, BackendKind::Plain);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize,)]
#[serde(deny_unknown_fields)]
pub struct InventoryConfig
{
    /// Root directory holding `targets/` and `classes/`.
    #[serde(default = "default_inventory_path")]
    pub inventory_path: PathBuf,

    /// Explicit targets directory overriding `<inventory_path>/targets`.
    #[serde(default)]
    pub targets_path: Option<PathBuf,>,

    /// Explicit classes directory overriding `<inventory_path>/classes`.
    #[serde(default)]
    pub classes_path: Option<PathBuf,>,

    /// Build target names from the whole relative path.
    #[serde(default, alias = "compose-target-name")]
    pub compose_target_name: bool,

    /// Character joining path components in composed names.
    #[serde(default = "default_joiner")]
    pub name_joiner: char,

    /// Backend used to render targets.
    #[serde(default)]
    pub backend: BackendKind,
}

impl Default for InventoryConfig
{
    fn default() -> Self
    {
        Self {
            inventory_path:      default_inventory_path(),
            targets_path:        None,
            classes_path:        None,
            compose_target_name: false,
            name_joiner:         DEFAULT_JOINER,
            backend:             BackendKind::default(),
        }
    }
}

impl InventoryConfig
{
    /// Creates a configuration rooted at `inventory_path`.
    pub fn new(inventory_path: impl Into<PathBuf,>,) -> Self
    {
        Self {
            inventory_path: inventory_path.into(), ..Self::default()
        }
    }

    /// Directory scanned for target definitions.
    pub fn targets_path(&self,) -> PathBuf
    {
        self.targets_path.clone().unwrap_or_else(|| self.inventory_path.join("targets",),)
    }

    /// Directory holding class definitions, read only by backends.
    pub fn classes_path(&self,) -> PathBuf
    {
        self.classes_path.clone().unwrap_or_else(|| self.inventory_path.join("classes",),)
    }

    /// Name strategy selected by `compose_target_name`.
    pub fn name_strategy(&self,) -> NameStrategy
    {
        NameStrategy::from_flag(self.compose_target_name, self.name_joiner,)
    }
}

fn default_inventory_path() -> PathBuf
{
    PathBuf::from(DEFAULT_INVENTORY_PATH,)
}

fn default_joiner() -> char
{
    DEFAULT_JOINER
}

/// Loads the configuration from a YAML file.
///
/// # Errors
///
/// Returns [`Error::Io`] when the file cannot be read and [`Error::Parse`]
/// when it is not a valid configuration document.
pub fn load_config(path: &Path,) -> Result<InventoryConfig, Error,>
{
    let contents = fs::read_to_string(path,).map_err(|source| error::io_error(path, source,),)?;
    parse_config(&contents,)
}

/// Parses the configuration from a YAML string. An empty document yields the
/// defaults.
///
/// # Errors
///
/// Propagates [`Error::Parse`] when the YAML cannot be decoded.
pub fn parse_config(contents: &str,) -> Result<InventoryConfig, Error,>
{
    if contents.trim().is_empty() {
        return Ok(InventoryConfig::default(),);
    }
    Ok(serde_yaml::from_str(contents,)?,)
}
