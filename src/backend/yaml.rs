// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Backend resolving class includes and deep-merging their parameters.
//!
//! Class `a.b` lives at `<classes>/a/b.yml` or `<classes>/a/b/init.yml`
//! (either extension). A class's own includes are applied before it, each
//! class at most once per target, and the target's own sections last.
//! Mappings merge recursively, sequences concatenate, and any other value
//! is replaced by the later one. No interpolation is performed.

use std::{
    collections::{HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
};

use rayon::prelude::*;
use serde_yaml::{Mapping, Value};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::{Definition, RenderBackend, read_target_definition};
use crate::{
    error::{self, Error},
    naming::has_target_extension,
    target::TargetRecord,
};

const INIT_STEM: &str = "init";

/// Backend resolving classes from a classes directory.
#[derive(Debug, Clone,)]
pub struct YamlBackend
{
    targets_path: PathBuf,
    classes_path: PathBuf,
}

impl YamlBackend
{
    /// Creates a backend reading targets and classes from the given roots.
    pub fn new(targets_path: impl Into<PathBuf,>, classes_path: impl Into<PathBuf,>,) -> Self
    {
        Self {
            targets_path: targets_path.into(), classes_path: classes_path.into(),
        }
    }
}

impl RenderBackend for YamlBackend
{
    fn render(
        &self,
        batch: &mut [&mut TargetRecord],
        ignore_class_not_found: bool,
    ) -> Result<(), Error,>
    {
        if batch.is_empty() {
            return Ok((),);
        }

        let classes = ClassIndex::load(&self.classes_path,)?;
        debug!("rendering {} targets against {} classes", batch.len(), classes.len());

        batch.par_iter_mut().try_for_each(|record| -> Result<(), Error,> {
            let definition = read_target_definition(&self.targets_path, record,)?;
            let resolved = Resolver::new(&classes, &record.name, ignore_class_not_found,)
                .resolve(definition,)?;
            record.parameters = resolved.parameters;
            record.classes = resolved.classes;
            record.applications = resolved.applications;
            record.exports = resolved.exports;
            Ok((),)
        },)
    }
}

/// Every class definition found below the classes root, keyed by name.
#[derive(Debug, Default,)]
struct ClassIndex
{
    classes: HashMap<String, Definition,>,
}

impl ClassIndex
{
    /// Loads and parses all class files. A missing root yields an empty
    /// index.
    fn load(root: &Path,) -> Result<Self, Error,>
    {
        if !root.is_dir() {
            debug!("no classes directory at {}", root.display());
            return Ok(Self::default(),);
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root,).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() || !has_target_extension(path,) {
                continue;
            }
            let relative = path.strip_prefix(root,).unwrap_or(path,);
            if let Some(name,) = class_name(relative,) {
                files.push((name, path.to_path_buf(),),);
            }
        }

        let parsed = files
            .into_par_iter()
            .map(|(name, path,)| -> Result<_, Error,> {
                let contents =
                    fs::read_to_string(&path,).map_err(|source| error::io_error(&path, source,),)?;
                let definition = Definition::parse(&contents,).map_err(|source| {
                    Error::validation(format!("class {name} in {}: {source}", path.display()),)
                },)?;
                Ok((name, path, definition,),)
            },)
            .collect::<Result<Vec<_,>, Error,>>()?;

        let mut classes = HashMap::with_capacity(parsed.len(),);
        let mut origins: HashMap<String, PathBuf,> = HashMap::with_capacity(parsed.len(),);
        for (name, path, definition,) in parsed {
            if let Some(previous,) = origins.get(&name,) {
                return Err(Error::validation(format!(
                    "class {name} is defined by both {} and {}",
                    previous.display(),
                    path.display()
                ),),);
            }
            origins.insert(name.clone(), path,);
            classes.insert(name, definition,);
        }

        Ok(Self {
            classes,
        },)
    }

    fn get(&self, name: &str,) -> Option<&Definition,>
    {
        self.classes.get(name,)
    }

    fn len(&self,) -> usize
    {
        self.classes.len()
    }
}

/// Maps `a/b.yml` and `a/b/init.yml` to `a.b`.
fn class_name(relative: &Path,) -> Option<String,>
{
    let mut parts: Vec<&str,> = Vec::new();
    if let Some(parent,) = relative.parent() {
        for component in parent.iter() {
            parts.push(component.to_str()?,);
        }
    }
    let stem = relative.file_stem()?.to_str()?;
    if stem != INIT_STEM || parts.is_empty() {
        parts.push(stem,);
    }
    Some(parts.join(".",),)
}

/// Accumulated result of resolving one target.
#[derive(Debug, Default,)]
struct Resolved
{
    parameters:   Mapping,
    classes:      Vec<String,>,
    applications: Vec<String,>,
    exports:      Vec<Value,>,
}

struct Resolver<'index,>
{
    index:    &'index ClassIndex,
    target:   &'index str,
    ignore:   bool,
    applied:  HashSet<String,>,
    stack:    Vec<String,>,
    resolved: Resolved,
}

impl<'index,> Resolver<'index,>
{
    fn new(index: &'index ClassIndex, target: &'index str, ignore: bool,) -> Self
    {
        Self {
            index,
            target,
            ignore,
            applied: HashSet::new(),
            stack: Vec::new(),
            resolved: Resolved::default(),
        }
    }

    fn resolve(mut self, definition: Definition,) -> Result<Resolved, Error,>
    {
        for class in &definition.classes {
            self.apply_class(class,)?;
        }
        self.merge(definition,);
        Ok(self.resolved,)
    }

    fn apply_class(&mut self, name: &str,) -> Result<(), Error,>
    {
        if self.applied.contains(name,) {
            return Ok((),);
        }
        if self.stack.iter().any(|entry| entry == name,) {
            return Err(Error::validation(format!(
                "class cycle detected: {} -> {name}",
                self.stack.join(" -> ")
            ),),);
        }

        let index = self.index;
        let Some(definition,) = index.get(name,) else {
            if self.ignore {
                warn!("target {}: class {name} not found, skipping", self.target);
                return Ok((),);
            }
            return Err(Error::invalid_target(self.target, format!("class {name} not found"),),);
        };

        self.stack.push(name.to_owned(),);
        for parent in &definition.classes {
            self.apply_class(parent,)?;
        }
        self.stack.pop();

        self.applied.insert(name.to_owned(),);
        self.resolved.classes.push(name.to_owned(),);
        self.merge(definition.clone(),);
        Ok((),)
    }

    fn merge(&mut self, definition: Definition,)
    {
        merge_mappings(&mut self.resolved.parameters, definition.parameters,);
        for application in definition.applications {
            if !self.resolved.applications.contains(&application,) {
                self.resolved.applications.push(application,);
            }
        }
        self.resolved.exports.extend(definition.exports,);
    }
}

/// Deep-merges `overlay` into `base`.
fn merge_mappings(base: &mut Mapping, overlay: Mapping,)
{
    for (key, incoming,) in overlay {
        let replacement = match (base.get_mut(&key,), incoming,) {
            (Some(Value::Mapping(existing,),), Value::Mapping(incoming,),) => {
                merge_mappings(existing, incoming,);
                None
            }
            (Some(Value::Sequence(existing,),), Value::Sequence(incoming,),) => {
                existing.extend(incoming,);
                None
            }
            (_, incoming,) => Some(incoming,),
        };
        if let Some(value,) = replacement {
            base.insert(key, value,);
        }
    }
}

#[cfg(test)]
mod tests
{
    use std::{fs, path::Path};

    use serde_yaml::{Mapping, Value};
    use tempfile::{TempDir, tempdir};

    use super::{YamlBackend, class_name, merge_mappings};
    use crate::{Error, ErrorCategory, RenderBackend, TargetRecord};

    fn write(root: &Path, relative: &str, contents: &str,)
    {
        let path = root.join(relative,);
        if let Some(parent,) = path.parent() {
            fs::create_dir_all(parent,).expect("failed to create directories",);
        }
        fs::write(path, contents,).expect("failed to write file",);
    }

    fn inventory() -> TempDir
    {
        let temp = tempdir().expect("failed to create tempdir",);
        write(
            temp.path(),
            "classes/common.yml",
            "applications: [base]\nparameters:\n  region: eu\n  labels: [common]\n  \
             db:\n    port: 5432\n    host: localhost\n",
        );
        write(
            temp.path(),
            "classes/web/init.yml",
            "classes: [common]\napplications: [nginx, base]\nparameters:\n  labels: [web]\n  \
             db:\n    host: web-db\n",
        );
        write(temp.path(), "classes/cycle/a.yaml", "classes: [cycle.b]\n",);
        write(temp.path(), "classes/cycle/b.yaml", "classes: [cycle.a]\n",);
        temp
    }

    fn render_one(temp: &TempDir, target: &str, ignore: bool,) -> Result<TargetRecord, Error,>
    {
        write(temp.path(), "targets/t.yml", target,);
        let backend =
            YamlBackend::new(temp.path().join("targets",), temp.path().join("classes",),);
        let mut record = TargetRecord::new("t", "t.yml",);
        backend.render(&mut [&mut record], ignore,)?;
        Ok(record,)
    }

    #[test]
    fn class_names_follow_directory_layout()
    {
        assert_eq!(class_name(Path::new("common.yml")).as_deref(), Some("common"));
        assert_eq!(class_name(Path::new("web/init.yml")).as_deref(), Some("web"));
        assert_eq!(class_name(Path::new("a/b/c.yaml")).as_deref(), Some("a.b.c"));
        assert_eq!(class_name(Path::new("init.yml")).as_deref(), Some("init"));
    }

    #[test]
    fn merges_classes_depth_first_with_target_last()
    {
        let temp = inventory();
        let record = render_one(
            &temp,
            "classes: [web]\nparameters:\n  db:\n    port: 6432\n  replicas: 3\n",
            false,
        )
        .expect("render failed",);

        assert_eq!(record.classes, ["common", "web"]);
        assert_eq!(record.applications, ["base", "nginx"]);

        let expected: Mapping = serde_yaml::from_str(
            "region: eu\nlabels: [common, web]\ndb:\n  port: 6432\n  host: web-db\nreplicas: 3\n",
        )
        .expect("valid expectation",);
        assert_eq!(record.parameters, expected);
    }

    #[test]
    fn class_included_twice_is_applied_once()
    {
        let temp = inventory();
        let record =
            render_one(&temp, "classes: [common, web, common]\n", false,).expect("render failed",);
        assert_eq!(record.classes, ["common", "web"]);
        assert_eq!(
            record.parameters.get("labels"),
            Some(&serde_yaml::from_str::<Value,>("[common, web]").expect("valid labels"))
        );
    }

    #[test]
    fn missing_class_is_a_target_error()
    {
        let temp = inventory();
        let error = render_one(&temp, "classes: [absent]\n", false,).unwrap_err();
        assert_eq!(error.category(), ErrorCategory::Target);
        assert!(error.to_string().contains("absent"));
    }

    #[test]
    fn missing_class_is_skipped_when_ignored()
    {
        let temp = inventory();
        let record = render_one(&temp, "classes: [absent, common]\n", true,)
            .expect("render should skip missing class",);
        assert_eq!(record.classes, ["common"]);
        assert_eq!(record.parameters.get("region"), Some(&Value::from("eu")));
    }

    #[test]
    fn class_cycle_is_a_validation_error()
    {
        let temp = inventory();
        let error = render_one(&temp, "classes: [cycle.a]\n", true,).unwrap_err();
        match error {
            Error::Validation {
                ref message,
            } => assert!(message.contains("cycle.a -> cycle.b -> cycle.a")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn ambiguous_class_files_are_rejected()
    {
        let temp = inventory();
        write(temp.path(), "classes/web.yml", "parameters: {}\n",);
        let error = render_one(&temp, "classes: []\n", false,).unwrap_err();
        assert_eq!(error.category(), ErrorCategory::Validation);
    }

    #[test]
    fn renders_without_classes_directory()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let record =
            render_one(&temp, "parameters:\n  a: 1\n", false,).expect("render failed",);
        assert_eq!(record.parameters.get("a"), Some(&Value::from(1)));
        assert!(record.classes.is_empty());
    }

    #[test]
    fn scalars_replace_and_sequences_concatenate()
    {
        let mut base: Mapping =
            serde_yaml::from_str("a: 1\nlist: [x]\nnested: {k: v}\n",).expect("valid base",);
        let overlay: Mapping =
            serde_yaml::from_str("a: {now: map}\nlist: [y]\nnested: {j: w}\n",)
                .expect("valid overlay",);
        merge_mappings(&mut base, overlay,);

        let expected: Mapping = serde_yaml::from_str(
            "a: {now: map}\nlist: [x, y]\nnested: {k: v, j: w}\n",
        )
        .expect("valid expectation",);
        assert_eq!(base, expected);
    }
}
