// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Backend copying definition files verbatim.

use std::path::PathBuf;

use tracing::debug;

use super::{RenderBackend, read_target_definition};
use crate::{error::Error, target::TargetRecord};

/// Fills records with the sections of their own definition file. Class
/// names are recorded but never resolved.
#[derive(Debug, Clone,)]
pub struct PlainBackend
{
    targets_path: PathBuf,
}

impl PlainBackend
{
    /// Creates a backend reading definitions below `targets_path`.
    pub fn new(targets_path: impl Into<PathBuf,>,) -> Self
    {
        Self {
            targets_path: targets_path.into(),
        }
    }
}

impl RenderBackend for PlainBackend
{
    fn render(&self, batch: &mut [&mut TargetRecord], _: bool,) -> Result<(), Error,>
    {
        for record in batch.iter_mut() {
            let definition = read_target_definition(&self.targets_path, record,)?;
            debug!("rendering {} from {}", record.name, record.path.display());
            record.parameters = definition.parameters;
            record.classes = definition.classes;
            record.applications = definition.applications;
            record.exports = definition.exports;
        }
        Ok((),)
    }
}

#[cfg(test)]
mod tests
{
    use std::fs;

    use serde_yaml::Value;
    use tempfile::tempdir;

    use super::PlainBackend;
    use crate::{Error, RenderBackend, TargetRecord};

    #[test]
    fn copies_sections_without_resolving_classes()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        fs::write(
            temp.path().join("web.yml",),
            "classes: [undefined]\napplications: [nginx]\nparameters:\n  port: 80\n",
        )
        .expect("failed to write target",);

        let backend = PlainBackend::new(temp.path(),);
        let mut record = TargetRecord::new("web", "web.yml",);
        backend.render(&mut [&mut record], false,).expect("render failed",);

        assert_eq!(record.classes, ["undefined"]);
        assert_eq!(record.applications, ["nginx"]);
        assert_eq!(record.parameters.get("port"), Some(&Value::from(80)));
    }

    #[test]
    fn malformed_definition_names_the_target()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        fs::write(temp.path().join("web.yml",), "parameters: [unclosed\n",)
            .expect("failed to write target",);

        let backend = PlainBackend::new(temp.path(),);
        let mut record = TargetRecord::new("web", "web.yml",);
        let error = backend.render(&mut [&mut record], false,).unwrap_err();
        match error {
            Error::InvalidTarget {
                target, ..
            } => assert_eq!(target, "web"),
            other => panic!("expected invalid target error, got {other:?}"),
        }
    }
}
