// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Derivation of target names from definition file paths.
//!
//! Only files carrying one of [`TARGET_EXTENSIONS`] describe targets. The
//! name is either the bare file stem ([`NameStrategy::Compact`]) or the whole
//! relative path with separators replaced by a joiner
//! ([`NameStrategy::Composed`]), which keeps same-named files in different
//! directories apart.

use std::path::{Component, Path};

/// File extensions recognised as target definitions.
pub const TARGET_EXTENSIONS: [&str; 2] = ["yml", "yaml"];

/// Joiner used by composed names unless configured otherwise.
pub const DEFAULT_JOINER: char = '.';

/// Strategy used to turn a definition file path into a target name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default,)]
pub enum NameStrategy
{
    /// Use the file stem, discarding directories.
    #[default]
    Compact,
    /// Use the relative path without extension, joined with `joiner`.
    Composed
    {
        /// Character placed between path components.
        joiner: char,
    },
}

impl NameStrategy
{
    /// Selects the strategy from the `compose_target_name` flag.
    pub fn from_flag(compose: bool, joiner: char,) -> Self
    {
        if compose { Self::Composed { joiner, } } else { Self::Compact }
    }

    /// Derives the target name for `relative`, a path below the targets
    /// root.
    ///
    /// Returns `None` when the file does not carry a recognised extension or
    /// when no name can be derived from it.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    ///
    /// use target_inventory::NameStrategy;
    ///
    /// let path = Path::new("prod/web.yml",);
    /// assert_eq!(NameStrategy::Compact.derive(path,).as_deref(), Some("web"));
    /// let composed = NameStrategy::Composed { joiner: '.', };
    /// assert_eq!(composed.derive(path,).as_deref(), Some("prod.web"));
    /// assert!(NameStrategy::Compact.derive(Path::new("README.md"),).is_none());
    /// ```
    pub fn derive(self, relative: &Path,) -> Option<String,>
    {
        if !has_target_extension(relative,) {
            return None;
        }

        let stem = relative.file_stem()?.to_str()?;
        if stem.is_empty() {
            return None;
        }

        match self {
            Self::Compact => Some(stem.to_owned(),),
            Self::Composed {
                joiner,
            } => {
                let mut name = String::with_capacity(relative.as_os_str().len(),);
                if let Some(parent,) = relative.parent() {
                    for component in parent.components() {
                        if let Component::Normal(part,) = component {
                            name.push_str(part.to_str()?,);
                            name.push(joiner,);
                        }
                    }
                }
                name.push_str(stem,);
                Some(name,)
            }
        }
    }
}

/// Reports whether `path` ends in one of [`TARGET_EXTENSIONS`].
pub fn has_target_extension(path: &Path,) -> bool
{
    path.extension()
        .and_then(|extension| extension.to_str(),)
        .is_some_and(|extension| TARGET_EXTENSIONS.contains(&extension,),)
}
