// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! The target registry: discovery, lookup and lazy render dispatch.
//!
//! # Locking
//!
//! The registry map sits behind a [`RwLock`]. Discovery runs under the write
//! lock and re-checks the initialised flag once it holds it, so concurrent
//! first callers scan the targets directory exactly once.
//!
//! Every record has its own [`Mutex`]. A render locks all records of the
//! requested subset in name order and keeps them locked across the backend
//! call, which makes the unrendered check and the dispatch one step and keeps
//! at most one render per target in flight. The registry lock is never
//! acquired while a record lock is held.
//!
//! # Failed renders
//!
//! A batch is all-or-nothing: when the backend fails or panics, every record
//! of the batch is restored to the content it had before the call and stays
//! unrendered. The backend error is returned unchanged.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::{Mutex, RwLock};
use serde_yaml::Mapping;
use tracing::{debug, info, warn};

use crate::{
    backend::RenderBackend,
    config::InventoryConfig,
    discover::scan_targets,
    error::Error,
    naming::NameStrategy,
    target::{RenderState, TargetRecord},
};

type Slot = Arc<Mutex<TargetRecord,>,>;

#[derive(Default,)]
struct Registry
{
    targets:     BTreeMap<String, Slot,>,
    initialised: bool,
}

/// Registry of targets discovered under the targets directory.
///
/// The inventory is `Send + Sync`; share it across threads behind an
/// [`Arc`].
///
/// # Example
///
/// ```no_run
/// use target_inventory::{Inventory, InventoryConfig};
///
/// # fn example() -> Result<(), target_inventory::Error> {
/// let inventory = Inventory::new(&InventoryConfig::new("inventory",),);
/// let parameters = inventory.get_parameters("web", false,)?;
/// println!("{parameters:?}");
/// # Ok(())
/// # }
/// ```
pub struct Inventory
{
    targets_path: PathBuf,
    classes_path: PathBuf,
    strategy:     NameStrategy,
    backend:      Box<dyn RenderBackend,>,
    registry:     RwLock<Registry,>,
}

impl std::fmt::Debug for Inventory
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_,>,) -> std::fmt::Result
    {
        let registry = self.registry.read();
        f.debug_struct("Inventory",)
            .field("targets_path", &self.targets_path,)
            .field("classes_path", &self.classes_path,)
            .field("strategy", &self.strategy,)
            .field("initialised", &registry.initialised,)
            .field("targets", &registry.targets.len(),)
            .finish_non_exhaustive()
    }
}

impl Inventory
{
    /// Creates an inventory using the backend selected in `config`.
    pub fn new(config: &InventoryConfig,) -> Self
    {
        Self::with_backend(config, config.backend.build(config,),)
    }

    /// Creates an inventory rendering through a caller-supplied backend.
    pub fn with_backend(config: &InventoryConfig, backend: Box<dyn RenderBackend,>,) -> Self
    {
        Self {
            targets_path: config.targets_path(),
            classes_path: config.classes_path(),
            strategy: config.name_strategy(),
            backend,
            registry: RwLock::new(Registry::default(),),
        }
    }

    /// Directory scanned for target definitions.
    pub fn targets_path(&self,) -> &Path
    {
        &self.targets_path
    }

    /// Directory holding class definitions.
    pub fn classes_path(&self,) -> &Path
    {
        &self.classes_path
    }

    /// Reports whether discovery has completed.
    pub fn is_initialised(&self,) -> bool
    {
        self.registry.read().initialised
    }

    /// Number of registered targets.
    pub fn len(&self,) -> usize
    {
        self.registry.read().targets.len()
    }

    /// Reports whether no target is registered.
    pub fn is_empty(&self,) -> bool
    {
        self.registry.read().targets.is_empty()
    }

    /// Names of all registered targets, sorted. Does not trigger discovery.
    pub fn names(&self,) -> Vec<String,>
    {
        self.registry.read().targets.keys().cloned().collect()
    }

    /// Discovers targets unless discovery already completed.
    ///
    /// Returns the final initialised state. On failure the registry is left
    /// untouched and a later call scans again.
    ///
    /// # Errors
    ///
    /// Propagates discovery errors from [`scan_targets`], including
    /// [`Error::DuplicateTarget`].
    pub fn initialise(&self,) -> Result<bool, Error,>
    {
        if self.registry.read().initialised {
            return Ok(true,);
        }

        let mut registry = self.registry.write();
        if registry.initialised {
            return Ok(true,);
        }

        let records = scan_targets(&self.targets_path, self.strategy,)?;
        for record in records {
            registry.targets.insert(record.name.clone(), Arc::new(Mutex::new(record,),),);
        }
        registry.initialised = true;
        info!("inventory initialised with {} targets", registry.targets.len());
        Ok(true,)
    }

    /// Scans again and registers targets added since the last scan.
    ///
    /// Known targets whose file is unchanged keep their record, rendered or
    /// not. Targets whose file disappeared are kept. Nothing is registered
    /// unless the whole scan succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateTarget`] when a new file resolves to the name
    /// of a known target defined by another file, and propagates scan errors.
    pub fn reinitialise(&self,) -> Result<bool, Error,>
    {
        let mut registry = self.registry.write();
        let records = scan_targets(&self.targets_path, self.strategy,)?;

        let mut fresh = Vec::new();
        for record in records {
            match registry.targets.get(&record.name,) {
                Some(slot,) => {
                    let existing = slot.lock();
                    if existing.path != record.path {
                        return Err(Error::DuplicateTarget {
                            name:   record.name,
                            first:  existing.path.display().to_string(),
                            second: record.path.display().to_string(),
                        },);
                    }
                }
                None => fresh.push(record,),
            }
        }

        info!("reinitialise registered {} new targets", fresh.len());
        for record in fresh {
            registry.targets.insert(record.name.clone(), Arc::new(Mutex::new(record,),),);
        }
        registry.initialised = true;
        Ok(true,)
    }

    /// Renders the requested targets and returns the whole registry.
    ///
    /// An empty `names` slice selects every target. Unrendered targets of the
    /// selection are rendered in one backend batch; `ignore_missing` is also
    /// forwarded to the backend as its `ignore_class_not_found` flag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TargetsNotFound`] listing every missing name unless
    /// `ignore_missing` is set, in which case missing names are dropped from
    /// the selection. Discovery and backend errors propagate unchanged.
    pub fn get_targets<S,>(
        &self,
        names: &[S],
        ignore_missing: bool,
    ) -> Result<BTreeMap<String, TargetRecord,>, Error,>
    where
        S: AsRef<str,>,
    {
        let slots = self.select(names, ignore_missing,)?;
        self.render_slots(&slots, ignore_missing,)?;
        Ok(self.targets(),)
    }

    /// Renders and returns a single target.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TargetsNotFound`] when `name` is not registered, even
    /// with `ignore_missing` set: the flag only affects class lookups here.
    pub fn get_target(&self, name: &str, ignore_missing: bool,) -> Result<TargetRecord, Error,>
    {
        let slots = self.select(&[name], ignore_missing,)?;
        self.render_slots(&slots, ignore_missing,)?;
        slots
            .first()
            .map(|slot| slot.lock().clone(),)
            .ok_or_else(|| Error::targets_not_found([name],),)
    }

    /// Index-by-name accessor, equivalent to `get_target(name, false)`.
    ///
    /// # Errors
    ///
    /// See [`Inventory::get_target`].
    pub fn get(&self, name: &str,) -> Result<TargetRecord, Error,>
    {
        self.get_target(name, false,)
    }

    /// Returns the rendered parameters of one target.
    ///
    /// # Errors
    ///
    /// See [`Inventory::get_target`].
    pub fn get_parameters(&self, name: &str, ignore_missing: bool,) -> Result<Mapping, Error,>
    {
        self.get_target(name, ignore_missing,).map(|target| target.parameters,)
    }

    /// Returns the rendered parameters of several targets keyed by name.
    ///
    /// Every requested name is paired with its own record; an empty `names`
    /// slice selects every target. Names dropped through `ignore_missing` are
    /// absent from the result.
    ///
    /// # Errors
    ///
    /// See [`Inventory::get_targets`].
    pub fn get_parameters_many<S,>(
        &self,
        names: &[S],
        ignore_missing: bool,
    ) -> Result<BTreeMap<String, Mapping,>, Error,>
    where
        S: AsRef<str,>,
    {
        let slots = self.select(names, ignore_missing,)?;
        self.render_slots(&slots, ignore_missing,)?;
        Ok(slots
            .iter()
            .map(|slot| {
                let record = slot.lock();
                (record.name.clone(), record.parameters.clone(),)
            },)
            .collect(),)
    }

    /// Reserved for migrating inventories between on-disk formats. Nothing
    /// needs migrating yet.
    ///
    /// # Errors
    ///
    /// Never fails currently.
    pub fn migrate(&self,) -> Result<(), Error,>
    {
        debug!("no migration required for {}", self.targets_path.display());
        Ok((),)
    }

    /// Resolves `names` to record slots in name order, discovering first if
    /// needed.
    fn select<S,>(&self, names: &[S], ignore_missing: bool,) -> Result<Vec<Slot,>, Error,>
    where
        S: AsRef<str,>,
    {
        self.initialise()?;
        let registry = self.registry.read();

        if names.is_empty() {
            return Ok(registry.targets.values().cloned().collect(),);
        }

        let requested: BTreeSet<&str,> = names.iter().map(AsRef::as_ref,).collect();
        let mut found = Vec::with_capacity(requested.len(),);
        let mut missing = BTreeSet::new();
        for name in requested {
            match registry.targets.get(name,) {
                Some(slot,) => found.push(Arc::clone(slot,),),
                None => {
                    missing.insert(name.to_owned(),);
                }
            }
        }

        if !missing.is_empty() {
            if !ignore_missing {
                return Err(Error::TargetsNotFound {
                    names: missing,
                },);
            }
            debug!("ignoring missing targets: {:?}", missing);
        }

        Ok(found,)
    }

    /// Renders every unrendered record among `slots` in a single batch.
    fn render_slots(&self, slots: &[Slot], ignore_class_not_found: bool,) -> Result<(), Error,>
    {
        let mut guards: Vec<_,> = slots.iter().map(|slot| slot.lock(),).collect();
        let mut batch: Vec<&mut TargetRecord,> = guards
            .iter_mut()
            .filter(|guard| guard.state == RenderState::Unrendered,)
            .map(|guard| &mut **guard,)
            .collect();

        if batch.is_empty() {
            return Ok((),);
        }

        let originals: Vec<TargetRecord,> = batch.iter().map(|record| (**record).clone(),).collect();
        for record in batch.iter_mut() {
            record.state = RenderState::Rendering;
        }
        let mut rollback = Rollback {
            batch,
            originals: Some(originals,),
        };

        debug!("rendering batch of {} targets", rollback.batch.len());
        match self.backend.render(&mut rollback.batch[..], ignore_class_not_found,) {
            Ok((),) => {
                rollback.originals = None;
                for record in rollback.batch.iter_mut() {
                    record.state = RenderState::Rendered;
                }
                Ok((),)
            }
            Err(error,) => {
                warn!("render of {} targets failed: {}", rollback.batch.len(), error);
                Err(error,)
            }
        }
    }
    /// Current registry contents. Does not trigger discovery or rendering.
    pub fn targets(&self,) -> BTreeMap<String, TargetRecord,>
    {
        let registry = self.registry.read();
        registry.targets.iter().map(|(name, slot,)| (name.clone(), slot.lock().clone(),),).collect()
    }
}

/// Restores a batch to its pre-render content on drop unless disarmed.
///
/// Covers both a backend error and a backend panic: record locks are released
/// during unwinding without poisoning, so the records must already be
/// unrendered again by then.
struct Rollback<'a,>
{
    batch:     Vec<&'a mut TargetRecord,>,
    originals: Option<Vec<TargetRecord,>,>,
}

impl Drop for Rollback<'_,>
{
    fn drop(&mut self,)
    {
        if let Some(originals,) = self.originals.take() {
            for (record, original,) in self.batch.iter_mut().zip(originals,) {
                **record = original;
            }
        }
    }
}
