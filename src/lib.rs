//! Inventory of configuration-management targets.
//!
//! Targets are YAML definition files below `<inventory>/targets`. The
//! [`Inventory`] discovers them by name, resolves requested targets lazily
//! through a pluggable [`RenderBackend`], and hands out their rendered
//! parameters. Name collisions are detected at discovery time and are always
//! fatal.
//!
//! ```no_run
//! use target_inventory::{Inventory, InventoryConfig};
//!
//! # fn example() -> Result<(), target_inventory::Error> {
//! let mut config = InventoryConfig::new("inventory",);
//! config.compose_target_name = true;
//! let inventory = Inventory::new(&config,);
//! for (name, target,) in inventory.get_targets::<&str,>(&[], false,)? {
//!     println!("{name}: {} classes", target.classes.len());
//! }
//! # Ok(())
//! # }
//! ```

mod backend;
mod config;
mod discover;
mod error;
mod inventory;
mod naming;
mod target;

pub use backend::{BackendKind, PlainBackend, RenderBackend, YamlBackend};
pub use config::{DEFAULT_INVENTORY_PATH, InventoryConfig, load_config, parse_config};
pub use discover::scan_targets;
pub use error::{Error, ErrorCategory, io_error};
pub use inventory::Inventory;
pub use naming::{DEFAULT_JOINER, NameStrategy, TARGET_EXTENSIONS, has_target_extension};
pub use target::{RenderState, TargetRecord};
