mod engine;
mod error;
mod item_catalog;
mod types;

pub use engine::{Engine, Session, decode, encode};
pub use error::{CoreError, CoreErrorCode};
pub use item_catalog::{EMPTY_SLOT, ItemCatalog, ItemKind, SlotClass, parse_item_code};
pub use types::{
    Abilities, Ability, Characteristic, Characteristics, CrewMember, Equipment, ItemCatalogEntry,
    MAX_CASH, MAX_HP, MAX_LIGHT_ENERGY, MAX_RANK, MAX_SHIP_SOFTWARE, MAX_STAT, MIN_RESOURCE, Party,
    SaveModel, ShipSoftware, ShipSystem, Validation, domain_max, domain_min,
};
