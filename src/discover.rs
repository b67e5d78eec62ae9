// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Discovery of target definition files.
//!
//! Walks the targets root and turns every recognised definition file into an
//! unrendered [`TargetRecord`]. Two files resolving to the same name abort
//! the scan; nothing is ever merged or overwritten.

use std::{
    collections::{HashMap, hash_map::Entry},
    fs,
    path::Path,
};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::{
    error::{self, Error},
    naming::{NameStrategy, has_target_extension},
    target::TargetRecord,
};

/// Scans `root` recursively and returns one unrendered record per target.
///
/// Directory entries are visited in file-name order, so the returned records
/// and any collision report are deterministic.
///
/// # Errors
///
/// Returns [`Error::Io`] when `root` cannot be read, [`Error::Walk`] when a
/// nested entry cannot be traversed, and [`Error::DuplicateTarget`] when two
/// files resolve to the same name under `strategy`.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// use target_inventory::{NameStrategy, scan_targets};
///
/// # fn example() -> Result<(), target_inventory::Error> {
/// let records = scan_targets(Path::new("inventory/targets",), NameStrategy::Compact,)?;
/// for record in records {
///     println!("{} <- {}", record.name, record.path.display());
/// }
/// # Ok(())
/// # }
/// ```
pub fn scan_targets(root: &Path, strategy: NameStrategy,) -> Result<Vec<TargetRecord,>, Error,>
{
    let metadata = fs::metadata(root,).map_err(|source| error::io_error(root, source,),)?;
    if !metadata.is_dir() {
        return Err(error::io_error(
            root,
            std::io::Error::new(std::io::ErrorKind::NotADirectory, "targets path is not a directory",),
        ),);
    }

    let mut records: Vec<TargetRecord,> = Vec::new();
    let mut seen: HashMap<String, usize,> = HashMap::new();

    for entry in WalkDir::new(root,).sort_by_file_name() {
        let entry = entry?;
        if !entry.path().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(root,).unwrap_or(entry.path(),);
        if !has_target_extension(relative,) {
            debug!(
                "ignoring {}: targets have to be .yml or .yaml files",
                relative.display()
            );
            continue;
        }
        let Some(name,) = strategy.derive(relative,) else {
            warn!(
                "ignoring {}: no target name in a file name that is empty or not UTF-8",
                relative.display()
            );
            continue;
        };

        match seen.entry(name,) {
            Entry::Occupied(occupied,) => {
                let existing = &records[*occupied.get()];
                return Err(Error::DuplicateTarget {
                    name:   occupied.key().clone(),
                    first:  existing.path.display().to_string(),
                    second: relative.display().to_string(),
                },);
            }
            Entry::Vacant(vacant,) => {
                debug!("discovered target {} at {}", vacant.key(), relative.display());
                records.push(TargetRecord::new(vacant.key().clone(), relative,),);
                vacant.insert(records.len() - 1,);
            }
        }
    }

    info!("discovered {} targets under {}", records.len(), root.display());
    Ok(records,)
}
