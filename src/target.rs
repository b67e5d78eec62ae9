// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Record describing a single discovered target.

use std::path::PathBuf;

use serde::Serialize;
use serde_yaml::{Mapping, Value};

/// Render progress of a [`TargetRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default,)]
pub enum RenderState
{
    /// Discovered, parameters not resolved yet.
    #[default]
    Unrendered,
    /// Currently handed to the backend.
    Rendering,
    /// Resolved by the backend. An empty parameter mapping is still rendered.
    Rendered,
}

/// One target discovered under the targets root.
///
/// Records are created unrendered during discovery and filled in exactly once
/// by a [`RenderBackend`](crate::RenderBackend). Only the rendered content is
/// serialized; `name`, `path` and `state` describe provenance.
#[derive(Debug, Clone, PartialEq, Serialize,)]
pub struct TargetRecord
{
    /// Unique target name.
    #[serde(skip)]
    pub name:         String,
    /// Definition file, relative to the targets root.
    #[serde(skip)]
    pub path:         PathBuf,
    /// Resolved parameters, empty until rendered.
    pub parameters:   Mapping,
    /// Classes the target includes, in resolution order.
    pub classes:      Vec<String,>,
    /// Applications enabled for the target.
    pub applications: Vec<String,>,
    /// Values exported by the target.
    pub exports:      Vec<Value,>,
    /// Render progress.
    #[serde(skip)]
    pub state:        RenderState,
}

impl TargetRecord
{
    /// Creates an unrendered record.
    pub fn new(name: impl Into<String,>, path: impl Into<PathBuf,>,) -> Self
    {
        Self {
            name:         name.into(),
            path:         path.into(),
            parameters:   Mapping::new(),
            classes:      Vec::new(),
            applications: Vec::new(),
            exports:      Vec::new(),
            state:        RenderState::Unrendered,
        }
    }

    /// Reports whether the backend has resolved this record.
    pub fn is_rendered(&self,) -> bool
    {
        self.state == RenderState::Rendered
    }
}
