#![allow(non_shorthand_field_patterns)]
#![doc = "Error handling primitives shared across the inventory crate."]
// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! The derive emitted by [`masterror::Error`] expands pattern matches that
//! trigger the `non_shorthand_field_patterns` lint. The lint is disabled for
//! the module to keep the generated implementations warning-free.
//!
//! Every failure the inventory can report is a variant of [`Error`]. Callers
//! that only care about the broad class of a failure (discovery, backend
//! validation, a broken target) use [`Error::category`].

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf}
};

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Duplicate target names or requested targets that do not exist.
    Discovery,
    /// The backend found a structurally invalid class graph.
    Validation,
    /// The backend found a target referencing something undefined.
    Target,
    /// Filesystem, decoding or encoding failures.
    Io
}

/// Unified error type returned by the inventory, its backends and the CLI.
#[derive(Debug, masterror::Error)]
pub enum Error {
    /// Two definition files resolve to the same target name.
    #[error(
        "conflicting targets {name}: {first} and {second}. Consider using '--compose-target-name'"
    )]
    DuplicateTarget {
        /// Name both files resolve to.
        name:   String,
        /// Path of the file registered first, relative to the targets root.
        first:  String,
        /// Path of the conflicting file, relative to the targets root.
        second: String
    },
    /// One or more requested targets are absent from the registry.
    #[error("targets not found: {names:?}")]
    TargetsNotFound {
        /// Every requested name missing from the registry.
        names: BTreeSet<String>
    },
    /// The backend rejected the class graph.
    #[error("inventory validation error: {message}")]
    Validation {
        /// Human readable message describing the validation problem.
        message: String
    },
    /// The backend rejected a single target.
    #[error("invalid target {target}: {message}")]
    InvalidTarget {
        /// Name of the offending target.
        target:  String,
        /// Human readable message describing the problem.
        message: String
    },
    /// Wraps I/O errors that occur while reading inventory files.
    #[error("failed to read {path:?}: {source}")]
    Io {
        /// Location of the file or directory.
        path:   PathBuf,
        /// Underlying I/O error.
        source: std::io::Error
    },
    /// Wraps errors raised while walking the targets tree.
    #[error("failed to scan targets directory: {source}")]
    Walk {
        /// Underlying traversal error.
        source: walkdir::Error
    },
    /// Wraps YAML decoding errors.
    #[error("failed to parse inventory document: {source}")]
    Parse {
        /// Source decoding error from serde_yaml.
        source: serde_yaml::Error
    },
    /// Wraps serialization errors when writing CLI output.
    #[error("failed to serialize output: {source}")]
    Serialize {
        /// Underlying serialization error.
        source: serde_json::Error
    }
}

impl Error {
    /// Constructs a validation error from the provided displayable value.
    ///
    /// # Parameters
    ///
    /// * `message` - Human-readable description of the validation failure.
    pub fn validation<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Validation {
            message: message.into()
        }
    }

    /// Constructs an invalid target error for `target`.
    pub fn invalid_target<T, M>(target: T, message: M) -> Self
    where
        T: Into<String>,
        M: Into<String>
    {
        Self::InvalidTarget {
            target:  target.into(),
            message: message.into()
        }
    }

    /// Constructs a lookup error from the missing names.
    pub fn targets_not_found<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>
    {
        Self::TargetsNotFound {
            names: names.into_iter().map(Into::into).collect()
        }
    }

    /// Returns the broad category the error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::DuplicateTarget { .. } | Self::TargetsNotFound { .. } => {
                ErrorCategory::Discovery
            }
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::InvalidTarget { .. } => ErrorCategory::Target,
            Self::Io { .. } | Self::Walk { .. } | Self::Parse { .. } | Self::Serialize { .. } => {
                ErrorCategory::Io
            }
        }
    }

    /// Formats the error for diagnostics without the variant name.
    ///
    /// The returned string matches the [`std::fmt::Display`] implementation
    /// and is what the CLI prints before exiting.
    pub fn to_display_string(&self) -> String {
        format!("{self}")
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(source: serde_yaml::Error) -> Self {
        Self::Parse {
            source
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Serialize {
            source
        }
    }
}

impl From<walkdir::Error> for Error {
    fn from(source: walkdir::Error) -> Self {
        Self::Walk {
            source
        }
    }
}

/// Creates an [`Error::Io`] variant capturing the failing path and source.
///
/// # Parameters
///
/// * `path` - Location of the file that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorCategory};

    #[test]
    fn validation_constructor_populates_message() {
        let error = Error::validation("class cycle");
        match error {
            Error::Validation {
                ref message
            } => {
                assert_eq!(message, "class cycle");
            }
            other => panic!("expected validation error, got {other:?}")
        }
    }

    #[test]
    fn duplicate_target_mentions_both_paths_and_remedy() {
        let error = Error::DuplicateTarget {
            name:   "a".to_owned(),
            first:  "a.yml".to_owned(),
            second: "sub/a.yml".to_owned()
        };
        let message = error.to_display_string();
        assert!(message.contains("a.yml"));
        assert!(message.contains("sub/a.yml"));
        assert!(message.contains("--compose-target-name"));
    }

    #[test]
    fn targets_not_found_collects_unique_names() {
        let error = Error::targets_not_found(["b", "a", "b"]);
        match error {
            Error::TargetsNotFound {
                ref names
            } => {
                let collected: Vec<_> = names.iter().map(String::as_str).collect();
                assert_eq!(collected, ["a", "b"]);
            }
            other => panic!("expected lookup error, got {other:?}")
        }
        assert_eq!(error.to_string(), r#"targets not found: {"a", "b"}"#);
    }

    #[test]
    fn categories_follow_taxonomy() {
        assert_eq!(Error::targets_not_found(["x"]).category(), ErrorCategory::Discovery);
        assert_eq!(Error::validation("bad").category(), ErrorCategory::Validation);
        assert_eq!(Error::invalid_target("t", "missing class").category(), ErrorCategory::Target);

        let io = super::io_error(
            std::path::Path::new("/tmp/inventory"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing")
        );
        assert_eq!(io.category(), ErrorCategory::Io);
    }

    #[test]
    fn io_error_helper_wraps_path_and_source() {
        let path = std::path::Path::new("/tmp/targets");
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error = super::io_error(path, io_error);

        match error {
            Error::Io {
                path: ref stored_path,
                ref source
            } => {
                assert_eq!(stored_path, path);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected io error, got {other:?}")
        }
    }

    #[test]
    fn serde_yaml_conversion_maps_to_parse_variant() {
        let error = serde_yaml::from_str::<usize>("not-a-number").unwrap_err();
        let mapped: Error = error.into();
        assert!(matches!(mapped, Error::Parse { .. }));
        assert_eq!(mapped.category(), ErrorCategory::Io);
    }
}
