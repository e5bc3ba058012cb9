//! # cmdb-store
//!
//! Reference persistence for the CMDB metamodel.
//!
//! - `MemoryStore`: a thread-safe in-memory `MetaStore` with lazy queries
//! - `trail`: append-only JSONL operation log and the replayer that rebuilds
//!   a store from it
//! - `Catalog`: saves with referential integrity, business-key uniqueness,
//!   and instance validation against model-derived schemas
//!
//! # Usage
//!
//! ```no_run
//! use cmdb_config::CmdbConfig;
//! use cmdb_core::metamodel::{Classification, ClassificationDef, Model};
//! use cmdb_store::{Catalog, MemoryStore};
//!
//! let config = CmdbConfig::load().expect("config");
//! let catalog = Catalog::new(MemoryStore::open(&config.store).expect("store"));
//!
//! let mut net = ClassificationDef::new("net_device", "Network devices");
//! catalog.save_classification(&mut net).expect("save");
//! let mut switch = net.create_model();
//! switch.set_object_id("switch");
//! catalog.save_model(&mut switch).expect("save");
//! ```

mod catalog;
mod error;
mod memory;
pub mod trail;

pub use catalog::Catalog;
pub use error::StoreError;
pub use memory::MemoryStore;
pub use trail::{RebuildSummary, TrailReplayer, TrailWriter};
