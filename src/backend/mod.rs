// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Render backends.
//!
//! A backend receives a batch of unrendered [`TargetRecord`]s and fills in
//! their parameters, classes, applications and exports. The inventory never
//! passes an already rendered record and never renders the same target from
//! two threads at once, so implementations need no bookkeeping of their own.

mod plain;
mod yaml;

use std::{fs, path::Path, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

pub use self::{plain::PlainBackend, yaml::YamlBackend};
use crate::{
    config::InventoryConfig,
    error::{self, Error},
    target::TargetRecord,
};

/// Capability implemented by every render backend.
pub trait RenderBackend: Send + Sync
{
    /// Renders every record of `batch` in place.
    ///
    /// An empty batch is a no-op. When `ignore_class_not_found` is set,
    /// references to undefined classes are skipped instead of failing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a malformed class graph and
    /// [`Error::InvalidTarget`] when a target references an undefined class.
    /// Records of a failed batch may be partially written; the inventory
    /// restores them.
    fn render(
        &self,
        batch: &mut [&mut TargetRecord],
        ignore_class_not_found: bool,
    ) -> Result<(), Error,>;
}

impl<B,> RenderBackend for Arc<B,>
where
    B: RenderBackend + ?Sized,
{
    fn render(
        &self,
        batch: &mut [&mut TargetRecord],
        ignore_class_not_found: bool,
    ) -> Result<(), Error,>
    {
        (**self).render(batch, ignore_class_not_found,)
    }
}

/// Backends selectable through configuration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind
{
    /// Resolve classes from the classes directory and deep-merge them.
    #[default]
    Yaml,
    /// Copy each definition file verbatim without resolving classes.
    Plain,
}

impl BackendKind
{
    /// Builds the backend for the paths in `config`.
    pub fn build(self, config: &InventoryConfig,) -> Box<dyn RenderBackend,>
    {
        match self {
            Self::Yaml => Box::new(YamlBackend::new(config.targets_path(), config.classes_path(),),),
            Self::Plain => Box::new(PlainBackend::new(config.targets_path(),),),
        }
    }
}

/// Shape shared by target and class definition files.
#[derive(Debug, Default, Clone, PartialEq, Deserialize,)]
#[serde(default)]
pub(crate) struct Definition
{
    pub classes:      Vec<String,>,
    pub applications: Vec<String,>,
    pub parameters:   Mapping,
    pub exports:      Vec<Value,>,
}

impl Definition
{
    /// Decodes a definition; empty and null documents yield the default.
    pub(crate) fn parse(contents: &str,) -> Result<Self, serde_yaml::Error,>
    {
        if contents.trim().is_empty() {
            return Ok(Self::default(),);
        }
        let document: Option<Self,> = serde_yaml::from_str(contents,)?;
        Ok(document.unwrap_or_default(),)
    }
}

/// Reads the definition file of `record` below `targets_path`.
///
/// Decoding failures are reported as [`Error::InvalidTarget`] naming the
/// target.
pub(crate) fn read_target_definition(
    targets_path: &Path,
    record: &TargetRecord,
) -> Result<Definition, Error,>
{
    let path = targets_path.join(&record.path,);
    let contents = fs::read_to_string(&path,).map_err(|source| error::io_error(&path, source,),)?;
    Definition::parse(&contents,).map_err(|source| {
        Error::invalid_target(
            record.name.as_str(),
            format!("failed to parse {}: {source}", record.path.display()),
        )
    },)
}
