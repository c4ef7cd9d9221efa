use serde::{Deserialize, Serialize};

use crate::codec::FieldValue;
use crate::layout::{CREW_COUNT, CrewField, FieldId, INVENTORY_SLOTS, ONHAND_WEAPON_SLOTS};

use super::error::{CoreError, CoreErrorCode};
use super::item_catalog::EMPTY_SLOT;

// Editing limits. Decoding accepts anything that fits the field width; only
// setters enforce these.
pub const MAX_CASH: u32 = 0x00FF_FFFF;
pub const MAX_LIGHT_ENERGY: u32 = 255;
pub const MAX_SHIP_SOFTWARE: u32 = 255;
pub const MAX_RANK: u32 = 255;
pub const MAX_HP: u32 = 255;
/// 20 is "perfect" in game, the engine tolerates up to 254.
pub const MAX_STAT: u32 = 254;
/// Cash, light energy, hp and ship software can be lowered to 1 but not 0.
pub const MIN_RESOURCE: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipSystem {
    Move,
    Target,
    Engine,
    Laser,
}

impl ShipSystem {
    pub const ALL: [ShipSystem; 4] = [Self::Move, Self::Target, Self::Engine, Self::Laser];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Target => "target",
            Self::Engine => "engine",
            Self::Laser => "laser",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.key() == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Characteristic {
    Strength,
    Stamina,
    Dexterity,
    Comprehend,
    Charisma,
}

impl Characteristic {
    pub const ALL: [Characteristic; 5] = [
        Self::Strength,
        Self::Stamina,
        Self::Dexterity,
        Self::Comprehend,
        Self::Charisma,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Strength => "strength",
            Self::Stamina => "stamina",
            Self::Dexterity => "dexterity",
            Self::Comprehend => "comprehend",
            Self::Charisma => "charisma",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ability {
    Contact,
    Edged,
    Projectile,
    Blaster,
    Tactics,
    Recon,
    Gunnery,
    AtvRepair,
    Mining,
    Athletics,
    Observation,
    Bribery,
}

impl Ability {
    pub const ALL: [Ability; 12] = [
        Self::Contact,
        Self::Edged,
        Self::Projectile,
        Self::Blaster,
        Self::Tactics,
        Self::Recon,
        Self::Gunnery,
        Self::AtvRepair,
        Self::Mining,
        Self::Athletics,
        Self::Observation,
        Self::Bribery,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::Edged => "edged",
            Self::Projectile => "projectile",
            Self::Blaster => "blaster",
            Self::Tactics => "tactics",
            Self::Recon => "recon",
            Self::Gunnery => "gunnery",
            Self::AtvRepair => "atv_repair",
            Self::Mining => "mining",
            Self::Athletics => "athletics",
            Self::Observation => "observation",
            Self::Bribery => "bribery",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.key() == key)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Party {
    pub cash: u32,
    pub light_energy: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShipSoftware {
    #[serde(rename = "move")]
    pub move_level: u8,
    pub target: u8,
    pub engine: u8,
    pub laser: u8,
}

impl ShipSoftware {
    pub fn get(&self, system: ShipSystem) -> u8 {
        match system {
            ShipSystem::Move => self.move_level,
            ShipSystem::Target => self.target,
            ShipSystem::Engine => self.engine,
            ShipSystem::Laser => self.laser,
        }
    }

    pub fn get_mut(&mut self, system: ShipSystem) -> &mut u8 {
        match system {
            ShipSystem::Move => &mut self.move_level,
            ShipSystem::Target => &mut self.target,
            ShipSystem::Engine => &mut self.engine,
            ShipSystem::Laser => &mut self.laser,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Characteristics {
    pub strength: u8,
    pub stamina: u8,
    pub dexterity: u8,
    pub comprehend: u8,
    pub charisma: u8,
}

impl Characteristics {
    pub fn get(&self, which: Characteristic) -> u8 {
        match which {
            Characteristic::Strength => self.strength,
            Characteristic::Stamina => self.stamina,
            Characteristic::Dexterity => self.dexterity,
            Characteristic::Comprehend => self.comprehend,
            Characteristic::Charisma => self.charisma,
        }
    }

    pub fn get_mut(&mut self, which: Characteristic) -> &mut u8 {
        match which {
            Characteristic::Strength => &mut self.strength,
            Characteristic::Stamina => &mut self.stamina,
            Characteristic::Dexterity => &mut self.dexterity,
            Characteristic::Comprehend => &mut self.comprehend,
            Characteristic::Charisma => &mut self.charisma,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Abilities {
    pub contact: u8,
    pub edged: u8,
    pub projectile: u8,
    pub blaster: u8,
    pub tactics: u8,
    pub recon: u8,
    pub gunnery: u8,
    pub atv_repair: u8,
    pub mining: u8,
    pub athletics: u8,
    pub observation: u8,
    pub bribery: u8,
}

impl Abilities {
    pub fn get(&self, which: Ability) -> u8 {
        match which {
            Ability::Contact => self.contact,
            Ability::Edged => self.edged,
            Ability::Projectile => self.projectile,
            Ability::Blaster => self.blaster,
            Ability::Tactics => self.tactics,
            Ability::Recon => self.recon,
            Ability::Gunnery => self.gunnery,
            Ability::AtvRepair => self.atv_repair,
            Ability::Mining => self.mining,
            Ability::Athletics => self.athletics,
            Ability::Observation => self.observation,
            Ability::Bribery => self.bribery,
        }
    }

    pub fn get_mut(&mut self, which: Ability) -> &mut u8 {
        match which {
            Ability::Contact => &mut self.contact,
            Ability::Edged => &mut self.edged,
            Ability::Projectile => &mut self.projectile,
            Ability::Blaster => &mut self.blaster,
            Ability::Tactics => &mut self.tactics,
            Ability::Recon => &mut self.recon,
            Ability::Gunnery => &mut self.gunnery,
            Ability::AtvRepair => &mut self.atv_repair,
            Ability::Mining => &mut self.mining,
            Ability::Athletics => &mut self.athletics,
            Ability::Observation => &mut self.observation,
            Ability::Bribery => &mut self.bribery,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Equipment {
    pub armor: u8,
    pub weapon: u8,
    pub onhand_weapons: [u8; ONHAND_WEAPON_SLOTS],
    pub inventory: [u8; INVENTORY_SLOTS],
}

impl Default for Equipment {
    fn default() -> Self {
        Self {
            armor: EMPTY_SLOT,
            weapon: EMPTY_SLOT,
            onhand_weapons: [EMPTY_SLOT; ONHAND_WEAPON_SLOTS],
            inventory: [EMPTY_SLOT; INVENTORY_SLOTS],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CrewMember {
    pub name: String,
    pub rank: u8,
    pub hp: u8,
    pub characteristics: Characteristics,
    pub abilities: Abilities,
    pub equipment: Equipment,
}

/// Decoded contents of one save file.
///
/// Holds plain values only; it keeps no reference to the bytes it was decoded
/// from. Crew members are stored zero-based but addressed 1..=5 everywhere in
/// the public API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SaveModel {
    pub party: Party,
    pub ship: ShipSoftware,
    pub crew: [CrewMember; CREW_COUNT],
}

impl SaveModel {
    /// Crew member by 1-based slot number.
    pub fn member(&self, member: usize) -> Option<&CrewMember> {
        member.checked_sub(1).and_then(|i| self.crew.get(i))
    }

    pub fn member_mut(&mut self, member: usize) -> Option<&mut CrewMember> {
        member.checked_sub(1).and_then(|i| self.crew.get_mut(i))
    }

    /// Current value of `field`, or `None` if its crew index or slot is out of
    /// range.
    pub fn get(&self, field: FieldId) -> Option<FieldValue> {
        let value = match field {
            FieldId::Cash => FieldValue::Unsigned(self.party.cash),
            FieldId::LightEnergy => FieldValue::Unsigned(self.party.light_energy.into()),
            FieldId::Ship(system) => FieldValue::Unsigned(self.ship.get(system).into()),
            FieldId::Crew { member, field } => {
                let crew = self.member(member)?;
                match field {
                    CrewField::Name => FieldValue::Text(crew.name.clone()),
                    CrewField::Rank => FieldValue::Unsigned(crew.rank.into()),
                    CrewField::Hp => FieldValue::Unsigned(crew.hp.into()),
                    CrewField::Characteristic(c) => {
                        FieldValue::Unsigned(crew.characteristics.get(c).into())
                    }
                    CrewField::Ability(a) => FieldValue::Unsigned(crew.abilities.get(a).into()),
                    CrewField::Armor => FieldValue::Item(crew.equipment.armor),
                    CrewField::Weapon => FieldValue::Item(crew.equipment.weapon),
                    CrewField::OnHandWeapon(slot) => {
                        FieldValue::Item(*crew.equipment.onhand_weapons.get(slot)?)
                    }
                    CrewField::Inventory(slot) => {
                        FieldValue::Item(*crew.equipment.inventory.get(slot)?)
                    }
                }
            }
        };
        Some(value)
    }

    /// Stores `value` without any policy checks beyond shape and
    /// representability in the model's own types.
    pub(crate) fn put(&mut self, field: FieldId, value: FieldValue) -> Result<(), CoreError> {
        let out_of_range = || {
            CoreError::new(
                CoreErrorCode::IndexOutOfRange,
                format!("field {field} does not exist in this model"),
            )
        };
        let mismatch = |value: &FieldValue| {
            CoreError::new(
                CoreErrorCode::Layout,
                format!("{} value cannot be stored in {field}", value.kind_name()),
            )
        };

        match (field, value) {
            (FieldId::Cash, FieldValue::Unsigned(v)) => self.party.cash = v,
            (FieldId::LightEnergy, FieldValue::Unsigned(v)) => {
                self.party.light_energy = narrow(field, v)?
            }
            (FieldId::Ship(system), FieldValue::Unsigned(v)) => {
                *self.ship.get_mut(system) = narrow(field, v)?
            }
            (FieldId::Crew { member, field: crew_field }, value) => {
                let crew = self.member_mut(member).ok_or_else(out_of_range)?;
                match (crew_field, value) {
                    (CrewField::Name, FieldValue::Text(name)) => crew.name = name,
                    (CrewField::Rank, FieldValue::Unsigned(v)) => crew.rank = narrow(field, v)?,
                    (CrewField::Hp, FieldValue::Unsigned(v)) => crew.hp = narrow(field, v)?,
                    (CrewField::Characteristic(c), FieldValue::Unsigned(v)) => {
                        *crew.characteristics.get_mut(c) = narrow(field, v)?
                    }
                    (CrewField::Ability(a), FieldValue::Unsigned(v)) => {
                        *crew.abilities.get_mut(a) = narrow(field, v)?
                    }
                    (CrewField::Armor, FieldValue::Item(code)) => crew.equipment.armor = code,
                    (CrewField::Weapon, FieldValue::Item(code)) => crew.equipment.weapon = code,
                    (CrewField::OnHandWeapon(slot), FieldValue::Item(code)) => {
                        *crew
                            .equipment
                            .onhand_weapons
                            .get_mut(slot)
                            .ok_or_else(out_of_range)? = code
                    }
                    (CrewField::Inventory(slot), FieldValue::Item(code)) => {
                        *crew
                            .equipment
                            .inventory
                            .get_mut(slot)
                            .ok_or_else(out_of_range)? = code
                    }
                    (_, other) => return Err(mismatch(&other)),
                }
            }
            (_, other) => return Err(mismatch(&other)),
        }
        Ok(())
    }
}

/// Documented upper bound for an integer field. `None` for text and item
/// fields.
pub fn domain_max(field: FieldId) -> Option<u32> {
    match field {
        FieldId::Cash => Some(MAX_CASH),
        FieldId::LightEnergy => Some(MAX_LIGHT_ENERGY),
        FieldId::Ship(_) => Some(MAX_SHIP_SOFTWARE),
        FieldId::Crew { field, .. } => match field {
            CrewField::Rank => Some(MAX_RANK),
            CrewField::Hp => Some(MAX_HP),
            CrewField::Characteristic(_) | CrewField::Ability(_) => Some(MAX_STAT),
            _ => None,
        },
    }
}

pub fn domain_min(field: FieldId) -> u32 {
    match field {
        FieldId::Cash | FieldId::LightEnergy | FieldId::Ship(_) => MIN_RESOURCE,
        FieldId::Crew {
            field: CrewField::Hp,
            ..
        } => MIN_RESOURCE,
        FieldId::Crew { .. } => 0,
    }
}

fn narrow(field: FieldId, value: u32) -> Result<u8, CoreError> {
    u8::try_from(value).map_err(|_| {
        CoreError::new(
            CoreErrorCode::ValueOutOfRange,
            format!("value {value} does not fit {field} (max 255)"),
        )
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ItemCatalogEntry {
    pub code: u8,
    pub name: &'static str,
    pub kind: super::item_catalog::ItemKind,
}

/// Outcome of the file-integrity gate. `reason` is empty iff `valid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub valid: bool,
    pub reason: String,
}

impl Validation {
    pub fn ok() -> Self {
        Self {
            valid: true,
            reason: String::new(),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: reason.into(),
        }
    }
}
