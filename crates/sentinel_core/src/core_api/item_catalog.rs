use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use serde::Serialize;

use super::error::{CoreError, CoreErrorCode};
use super::types::ItemCatalogEntry;

/// Reserved code meaning "nothing in this slot".
pub const EMPTY_SLOT: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Misc,
    Weapon,
    Armor,
    Ammo,
    Empty,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Misc => "misc",
            Self::Weapon => "weapon",
            Self::Armor => "armor",
            Self::Ammo => "ammo",
            Self::Empty => "empty",
        }
    }
}

/// Equipment slot category governing which codes a slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotClass {
    Armor,
    Weapon,
    OnHandWeapon,
    Inventory,
}

impl SlotClass {
    pub const ALL: [SlotClass; 4] = [
        Self::Armor,
        Self::Weapon,
        Self::OnHandWeapon,
        Self::Inventory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Armor => "armor",
            Self::Weapon => "weapon",
            Self::OnHandWeapon => "on-hand weapon",
            Self::Inventory => "inventory",
        }
    }

    /// Slot membership. The empty sentinel is only accepted where a slot may
    /// legitimately hold nothing: on-hand weapons and inventory.
    pub fn accepts(&self, kind: ItemKind) -> bool {
        match self {
            Self::Armor => kind == ItemKind::Armor,
            Self::Weapon => kind == ItemKind::Weapon,
            Self::OnHandWeapon => matches!(kind, ItemKind::Weapon | ItemKind::Empty),
            Self::Inventory => matches!(kind, ItemKind::Misc | ItemKind::Ammo | ItemKind::Empty),
        }
    }
}

impl fmt::Display for SlotClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct KnownItem {
    code: u8,
    name: &'static str,
    kind: ItemKind,
}

#[rustfmt::skip]
const KNOWN_ITEMS: &[KnownItem] = &[
    // Miscellaneous
    KnownItem { code: 0x00, name: "Burbulator",       kind: ItemKind::Misc },
    KnownItem { code: 0x01, name: "EA Passcard",      kind: ItemKind::Misc },
    KnownItem { code: 0x02, name: "Trinoculars",      kind: ItemKind::Misc },
    KnownItem { code: 0x03, name: "Arisian Lens",     kind: ItemKind::Misc },
    KnownItem { code: 0x05, name: "Energy Ball",      kind: ItemKind::Misc },
    KnownItem { code: 0x07, name: "Book",             kind: ItemKind::Misc },
    KnownItem { code: 0x20, name: "Tesselator",       kind: ItemKind::Misc },
    KnownItem { code: 0x21, name: "Nanobot",          kind: ItemKind::Misc },
    KnownItem { code: 0x22, name: "Mark V Teng",      kind: ItemKind::Misc },
    KnownItem { code: 0x23, name: "Vadroxon",         kind: ItemKind::Misc },
    KnownItem { code: 0x39, name: "Holophones",       kind: ItemKind::Misc },
    KnownItem { code: 0x3A, name: "Vax Grapher",      kind: ItemKind::Misc },
    KnownItem { code: 0x3B, name: "Antique Yoyo",     kind: ItemKind::Misc },
    KnownItem { code: 0x3C, name: "Cryoscope",        kind: ItemKind::Misc },
    KnownItem { code: 0x3D, name: "Cyberdisk",        kind: ItemKind::Misc },
    KnownItem { code: 0x3E, name: "Szart Needle",     kind: ItemKind::Misc },
    KnownItem { code: 0x3F, name: "Knarlybar",        kind: ItemKind::Misc },

    // Natural weapons
    KnownItem { code: 0x08, name: "Hands",            kind: ItemKind::Weapon },
    KnownItem { code: 0x1C, name: "Claws",            kind: ItemKind::Weapon },
    KnownItem { code: 0x1D, name: "Teeth",            kind: ItemKind::Weapon },
    KnownItem { code: 0x1E, name: "Thrasher",         kind: ItemKind::Weapon },
    KnownItem { code: 0x1F, name: "Acid Breath",      kind: ItemKind::Weapon },

    // Melee
    KnownItem { code: 0x09, name: "Powerfist",        kind: ItemKind::Weapon },
    KnownItem { code: 0x0A, name: "Sonic Mace",       kind: ItemKind::Weapon },
    KnownItem { code: 0x0B, name: "Gyro Pike",        kind: ItemKind::Weapon },
    KnownItem { code: 0x0C, name: "Neuron Flail",     kind: ItemKind::Weapon },
    KnownItem { code: 0x0D, name: "Dagger",           kind: ItemKind::Weapon },
    KnownItem { code: 0x0E, name: "Cryo Cutlas",      kind: ItemKind::Weapon },
    KnownItem { code: 0x0F, name: "Power Axe",        kind: ItemKind::Weapon },
    KnownItem { code: 0x10, name: "Energy Blade",     kind: ItemKind::Weapon },
    KnownItem { code: 0x11, name: "Edge Spinner",     kind: ItemKind::Weapon },

    // Projectile
    KnownItem { code: 0x12, name: "Auto Pistol",      kind: ItemKind::Weapon },
    KnownItem { code: 0x13, name: "Shotgun",          kind: ItemKind::Weapon },
    KnownItem { code: 0x14, name: "Hyperuzi",         kind: ItemKind::Weapon },
    KnownItem { code: 0x15, name: "AK 4700",          kind: ItemKind::Weapon },
    KnownItem { code: 0x16, name: "Gauss Rifle",      kind: ItemKind::Weapon },

    // Energy
    KnownItem { code: 0x17, name: "Thermocaster",     kind: ItemKind::Weapon },
    KnownItem { code: 0x18, name: "Hand Laser",       kind: ItemKind::Weapon },
    KnownItem { code: 0x19, name: "LR Laser",         kind: ItemKind::Weapon },
    KnownItem { code: 0x1A, name: "Plasma Gun",       kind: ItemKind::Weapon },
    KnownItem { code: 0x1B, name: "Neutron Gun",      kind: ItemKind::Weapon },
    KnownItem { code: 0x37, name: "Nerf Cannon",      kind: ItemKind::Weapon },

    // Armor
    KnownItem { code: 0x04, name: "Mysterious Armor", kind: ItemKind::Armor },
    KnownItem { code: 0x06, name: "Ancient Armor",    kind: ItemKind::Armor },
    KnownItem { code: 0x24, name: "Uniform",          kind: ItemKind::Armor },
    KnownItem { code: 0x25, name: "Flight Jacket",    kind: ItemKind::Armor },
    KnownItem { code: 0x26, name: "Steel Mesh",       kind: ItemKind::Armor },
    KnownItem { code: 0x27, name: "Flak Jacket",      kind: ItemKind::Armor },
    KnownItem { code: 0x28, name: "Laser Reflec",     kind: ItemKind::Armor },
    KnownItem { code: 0x29, name: "Combat Armor",     kind: ItemKind::Armor },
    KnownItem { code: 0x2A, name: "Thick Skin",       kind: ItemKind::Armor },
    KnownItem { code: 0x2B, name: "Rough Skin",       kind: ItemKind::Armor },
    KnownItem { code: 0x2C, name: "Thick Fur",        kind: ItemKind::Armor },
    KnownItem { code: 0x2D, name: "Carbon Armor",     kind: ItemKind::Armor },
    KnownItem { code: 0x2E, name: "Civilian Clothes", kind: ItemKind::Armor },
    KnownItem { code: 0x2F, name: "Special",          kind: ItemKind::Armor },
    KnownItem { code: 0x38, name: "Kevlar Suit",      kind: ItemKind::Armor },

    // Ammunition and power cells
    KnownItem { code: 0x30, name: "Auto Clip",        kind: ItemKind::Ammo },
    KnownItem { code: 0x31, name: "Shotgun Pack",     kind: ItemKind::Ammo },
    KnownItem { code: 0x32, name: "Hyperuzi Mag",     kind: ItemKind::Ammo },
    KnownItem { code: 0x33, name: "Gauss Rifle Mag",  kind: ItemKind::Ammo },
    KnownItem { code: 0x34, name: "AK 4700 Mag",      kind: ItemKind::Ammo },
    KnownItem { code: 0x35, name: "Therm Pak",        kind: ItemKind::Ammo },
    KnownItem { code: 0x36, name: "Crysprism",        kind: ItemKind::Ammo },

    KnownItem { code: EMPTY_SLOT, name: "Empty Slot", kind: ItemKind::Empty },
];

static BUILTIN: LazyLock<ItemCatalog> = LazyLock::new(|| {
    let entries = KNOWN_ITEMS
        .iter()
        .map(|item| {
            (
                item.code,
                ItemCatalogEntry {
                    code: item.code,
                    name: item.name,
                    kind: item.kind,
                },
            )
        })
        .collect();
    ItemCatalog { entries }
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemCatalog {
    entries: BTreeMap<u8, ItemCatalogEntry>,
}

impl ItemCatalog {
    pub fn builtin() -> &'static ItemCatalog {
        &BUILTIN
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, code: u8) -> Option<&ItemCatalogEntry> {
        self.entries.get(&code)
    }

    pub fn entries(&self) -> impl Iterator<Item = &ItemCatalogEntry> {
        self.entries.values()
    }

    /// Display name for `code`. Undocumented codes get a placeholder so a
    /// decoded save can always be shown.
    pub fn name_of(&self, code: u8) -> String {
        match self.get(code) {
            Some(entry) => entry.name.to_string(),
            None => format!("Unknown 0x{code:02X}"),
        }
    }

    pub fn is_valid_for(&self, code: u8, slot: SlotClass) -> bool {
        self.get(code).is_some_and(|entry| slot.accepts(entry.kind))
    }

    pub fn check(&self, code: u8, slot: SlotClass) -> Result<(), CoreError> {
        if self.is_valid_for(code, slot) {
            return Ok(());
        }
        Err(CoreError::new(
            CoreErrorCode::InvalidItemCode,
            format!(
                "item code 0x{code:02X} ({}) is not valid for the {slot} slot",
                self.name_of(code)
            ),
        ))
    }

    /// Every code a slot of this class accepts, in code order.
    pub fn codes_for(&self, slot: SlotClass) -> Vec<u8> {
        self.entries
            .values()
            .filter(|entry| slot.accepts(entry.kind))
            .map(|entry| entry.code)
            .collect()
    }
}

/// Parses a user-supplied item code: `2F`, `0x2F` or `0X2F`.
pub fn parse_item_code(text: &str) -> Result<u8, CoreError> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u8::from_str_radix(digits, 16).map_err(|_| {
        CoreError::new(
            CoreErrorCode::InvalidItemCode,
            format!("invalid item code {text:?}, expected a hex byte such as 2F or 0x2F"),
        )
    })
}
