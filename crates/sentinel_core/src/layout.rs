//! Address table for the `gameX.fm` save format.
//!
//! Every editable value has a fixed offset and width. Crew records share one
//! template and differ only by their base offset.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::codec::MAX_UNSIGNED_WIDTH;
use crate::core_api::{
    Ability, Characteristic, CoreError, CoreErrorCode, ShipSystem, SlotClass,
};

pub const SIGNATURE: &[u8] = b"Sentinel";
pub const SIGNATURE_OFFSET: usize = 0x2E81;

pub const PARTY_CASH_OFFSET: usize = 0x0040;
pub const PARTY_CASH_WIDTH: usize = 3;
pub const PARTY_LIGHT_ENERGY_OFFSET: usize = 0x0043;
pub const SHIP_SOFTWARE_OFFSET: usize = 0x0050;

pub const CREW_COUNT: usize = 5;
pub const CREW_BASE: usize = 0x0200;
pub const CREW_STRIDE: usize = 0x0080;
pub const CREW_NAME_LENGTH: usize = 10;
pub const ONHAND_WEAPON_SLOTS: usize = 3;
pub const INVENTORY_SLOTS: usize = 8;

// Offsets inside one crew record.
const REC_NAME: usize = 0;
const REC_RANK: usize = REC_NAME + CREW_NAME_LENGTH;
const REC_HP: usize = REC_RANK + 1;
const REC_CHARACTERISTICS: usize = REC_HP + 1;
const REC_ABILITIES: usize = REC_CHARACTERISTICS + Characteristic::ALL.len();
const REC_ARMOR: usize = REC_ABILITIES + Ability::ALL.len();
const REC_WEAPON: usize = REC_ARMOR + 1;
const REC_ONHAND: usize = REC_WEAPON + 1;
const REC_INVENTORY: usize = REC_ONHAND + ONHAND_WEAPON_SLOTS;
pub const CREW_RECORD_LEN: usize = REC_INVENTORY + INVENTORY_SLOTS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        (self.start..self.end).contains(&offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    UnsignedInt,
    PaddedText { length: usize },
    ItemCode(SlotClass),
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::UnsignedInt => "integer",
            Self::PaddedText { .. } => "text",
            Self::ItemCode(_) => "item code",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub offset: usize,
    pub width: usize,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn unsigned(offset: usize, width: usize) -> Self {
        Self {
            offset,
            width,
            kind: FieldKind::UnsignedInt,
        }
    }

    pub fn text(offset: usize, length: usize) -> Self {
        Self {
            offset,
            width: length,
            kind: FieldKind::PaddedText { length },
        }
    }

    pub fn item(offset: usize, slot: SlotClass) -> Self {
        Self {
            offset,
            width: 1,
            kind: FieldKind::ItemCode(slot),
        }
    }

    pub fn range(&self) -> ByteRange {
        ByteRange {
            start: self.offset,
            end: self.offset.saturating_add(self.width),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrewField {
    Name,
    Rank,
    Hp,
    Characteristic(Characteristic),
    Ability(Ability),
    Armor,
    Weapon,
    /// Zero-based on-hand weapon slot.
    OnHandWeapon(usize),
    /// Zero-based inventory slot.
    Inventory(usize),
}

impl CrewField {
    /// Every field of one crew record, in record order.
    pub fn all() -> impl Iterator<Item = CrewField> {
        [Self::Name, Self::Rank, Self::Hp]
            .into_iter()
            .chain(Characteristic::ALL.into_iter().map(Self::Characteristic))
            .chain(Ability::ALL.into_iter().map(Self::Ability))
            .chain([Self::Armor, Self::Weapon])
            .chain((0..ONHAND_WEAPON_SLOTS).map(Self::OnHandWeapon))
            .chain((0..INVENTORY_SLOTS).map(Self::Inventory))
    }

    pub fn slot_class(&self) -> Option<SlotClass> {
        match self {
            Self::Armor => Some(SlotClass::Armor),
            Self::Weapon => Some(SlotClass::Weapon),
            Self::OnHandWeapon(_) => Some(SlotClass::OnHandWeapon),
            Self::Inventory(_) => Some(SlotClass::Inventory),
            _ => None,
        }
    }

    fn slot_in_range(&self) -> Result<(), CoreError> {
        let (slot, count, label) = match *self {
            Self::OnHandWeapon(slot) => (slot, ONHAND_WEAPON_SLOTS, "on-hand weapon"),
            Self::Inventory(slot) => (slot, INVENTORY_SLOTS, "inventory"),
            _ => return Ok(()),
        };
        if slot >= count {
            return Err(CoreError::new(
                CoreErrorCode::IndexOutOfRange,
                format!("invalid {label} slot {slot}, expected 0..={}", count - 1),
            ));
        }
        Ok(())
    }

    /// Spec of this field inside a record starting at `base`.
    fn spec_at(&self, base: usize) -> FieldSpec {
        match *self {
            Self::Name => FieldSpec::text(base + REC_NAME, CREW_NAME_LENGTH),
            Self::Rank => FieldSpec::unsigned(base + REC_RANK, 1),
            Self::Hp => FieldSpec::unsigned(base + REC_HP, 1),
            Self::Characteristic(c) => FieldSpec::unsigned(base + REC_CHARACTERISTICS + c.index(), 1),
            Self::Ability(a) => FieldSpec::unsigned(base + REC_ABILITIES + a.index(), 1),
            Self::Armor => FieldSpec::item(base + REC_ARMOR, SlotClass::Armor),
            Self::Weapon => FieldSpec::item(base + REC_WEAPON, SlotClass::Weapon),
            Self::OnHandWeapon(slot) => {
                FieldSpec::item(base + REC_ONHAND + slot, SlotClass::OnHandWeapon)
            }
            Self::Inventory(slot) => FieldSpec::item(base + REC_INVENTORY + slot, SlotClass::Inventory),
        }
    }
}

impl fmt::Display for CrewField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => f.write_str("name"),
            Self::Rank => f.write_str("rank"),
            Self::Hp => f.write_str("hp"),
            Self::Characteristic(c) => write!(f, "characteristics.{}", c.key()),
            Self::Ability(a) => write!(f, "abilities.{}", a.key()),
            Self::Armor => f.write_str("equipment.armor"),
            Self::Weapon => f.write_str("equipment.weapon"),
            Self::OnHandWeapon(slot) => write!(f, "equipment.onhand_weapons[{slot}]"),
            Self::Inventory(slot) => write!(f, "equipment.inventory[{slot}]"),
        }
    }
}

/// Logical identifier of one field in the save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    Cash,
    LightEnergy,
    Ship(ShipSystem),
    /// `member` is 1-based.
    Crew { member: usize, field: CrewField },
}

impl FieldId {
    pub fn crew(member: usize, field: CrewField) -> Self {
        Self::Crew { member, field }
    }

    pub fn slot_class(&self) -> Option<SlotClass> {
        match self {
            Self::Crew { field, .. } => field.slot_class(),
            _ => None,
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cash => f.write_str("party.cash"),
            Self::LightEnergy => f.write_str("party.light_energy"),
            Self::Ship(system) => write!(f, "ship.{}", system.key()),
            Self::Crew { member, field } => write!(f, "crew[{member}].{field}"),
        }
    }
}

impl FromStr for FieldId {
    type Err = CoreError;

    /// Parses the dotted form, e.g. `crew[3].abilities.gunnery`. Index values
    /// are not range checked here; [`AddressTable::resolve`] does that.
    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let unknown = || {
            CoreError::new(
                CoreErrorCode::UnknownField,
                format!("unknown field {path:?}"),
            )
        };

        let (head, rest) = path.split_once('.').ok_or_else(unknown)?;
        match split_index(head).ok_or_else(unknown)? {
            ("party", None) => match rest {
                "cash" => Ok(Self::Cash),
                "light_energy" => Ok(Self::LightEnergy),
                _ => Err(unknown()),
            },
            ("ship", None) => ShipSystem::from_key(rest).map(Self::Ship).ok_or_else(unknown),
            ("crew", Some(member)) => {
                let field = parse_crew_field(rest).ok_or_else(unknown)?;
                Ok(Self::Crew { member, field })
            }
            _ => Err(unknown()),
        }
    }
}

fn parse_crew_field(rest: &str) -> Option<CrewField> {
    match rest {
        "name" => return Some(CrewField::Name),
        "rank" => return Some(CrewField::Rank),
        "hp" => return Some(CrewField::Hp),
        _ => {}
    }
    let (group, leaf) = rest.split_once('.')?;
    match (group, split_index(leaf)?) {
        ("characteristics", (key, None)) => {
            Characteristic::from_key(key).map(CrewField::Characteristic)
        }
        ("abilities", (key, None)) => Ability::from_key(key).map(CrewField::Ability),
        ("equipment", ("armor", None)) => Some(CrewField::Armor),
        ("equipment", ("weapon", None)) => Some(CrewField::Weapon),
        ("equipment", ("onhand_weapons", Some(slot))) => Some(CrewField::OnHandWeapon(slot)),
        ("equipment", ("inventory", Some(slot))) => Some(CrewField::Inventory(slot)),
        _ => None,
    }
}

/// Splits `name[3]` into `("name", Some(3))` and `name` into `("name", None)`.
fn split_index(segment: &str) -> Option<(&str, Option<usize>)> {
    let Some((name, tail)) = segment.split_once('[') else {
        return Some((segment, None));
    };
    let index = tail.strip_suffix(']')?.parse().ok()?;
    Some((name, Some(index)))
}

/// Start of the record for 1-based `member`, or `None` outside 1..=5.
pub fn crew_base(member: usize) -> Option<usize> {
    let index = member.checked_sub(1).filter(|&i| i < CREW_COUNT)?;
    Some(CREW_BASE + index * CREW_STRIDE)
}

#[derive(Debug, Clone)]
pub struct AddressTable {
    entries: Vec<(FieldId, FieldSpec)>,
    index: HashMap<FieldId, usize>,
    reserved: Vec<ByteRange>,
}

static STANDARD: LazyLock<AddressTable> = LazyLock::new(|| {
    AddressTable::new(standard_entries(), vec![signature_range()])
        .unwrap_or_else(|e| panic!("built-in address table is invalid: {e}"))
});

impl AddressTable {
    /// Builds a table, rejecting malformed specs and any two ranges (fields or
    /// `reserved`) that share a byte.
    pub fn new(entries: Vec<(FieldId, FieldSpec)>, reserved: Vec<ByteRange>) -> io::Result<Self> {
        let mut index = HashMap::with_capacity(entries.len());
        for (position, (field, spec)) in entries.iter().enumerate() {
            validate_spec(field, spec)?;
            if index.insert(*field, position).is_some() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("field {field} declared twice"),
                ));
            }
        }

        let mut ranges: Vec<(String, ByteRange)> = entries
            .iter()
            .map(|(field, spec)| (field.to_string(), spec.range()))
            .chain(reserved.iter().map(|r| ("reserved".to_string(), *r)))
            .collect();
        ranges.sort_by_key(|(_, range)| range.start);
        for pair in ranges.windows(2) {
            let (prev_name, prev) = &pair[0];
            let (next_name, next) = &pair[1];
            if next.start < prev.end {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "layout overlap: {prev_name} {:#06x}..{:#06x} and {next_name} {:#06x}..{:#06x}",
                        prev.start, prev.end, next.start, next.end
                    ),
                ));
            }
        }

        Ok(Self {
            entries,
            index,
            reserved,
        })
    }

    pub fn standard() -> &'static AddressTable {
        &STANDARD
    }

    pub fn entries(&self) -> &[(FieldId, FieldSpec)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One past the highest byte any field or reserved range touches.
    pub fn extent(&self) -> usize {
        self.entries
            .iter()
            .map(|(_, spec)| spec.range())
            .chain(self.reserved.iter().copied())
            .map(|range| range.end)
            .max()
            .unwrap_or(0)
    }

    pub fn resolve(&self, field: FieldId) -> Result<FieldSpec, CoreError> {
        if let FieldId::Crew { member, field } = field {
            if !(1..=CREW_COUNT).contains(&member) {
                return Err(CoreError::new(
                    CoreErrorCode::IndexOutOfRange,
                    format!("invalid crew member {member}, expected 1..={CREW_COUNT}"),
                ));
            }
            field.slot_in_range()?;
        }

        self.index
            .get(&field)
            .map(|&position| self.entries[position].1)
            .ok_or_else(|| {
                CoreError::new(
                    CoreErrorCode::UnknownField,
                    format!("field {field} is not declared in this layout"),
                )
            })
    }

    pub fn resolve_path(&self, path: &str) -> Result<(FieldId, FieldSpec), CoreError> {
        let field: FieldId = path.parse()?;
        let spec = self.resolve(field)?;
        Ok((field, spec))
    }
}

pub fn signature_range() -> ByteRange {
    ByteRange {
        start: SIGNATURE_OFFSET,
        end: SIGNATURE_OFFSET + SIGNATURE.len(),
    }
}

fn validate_spec(field: &FieldId, spec: &FieldSpec) -> io::Result<()> {
    if spec.offset.checked_add(spec.width).is_none() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "invalid spec for {field}: offset {:#x} plus width {} overflows",
                spec.offset, spec.width
            ),
        ));
    }
    let consistent = match spec.kind {
        FieldKind::UnsignedInt => (1..=MAX_UNSIGNED_WIDTH).contains(&spec.width),
        FieldKind::PaddedText { length } => length > 0 && length == spec.width,
        FieldKind::ItemCode(_) => spec.width == 1,
    };
    if consistent {
        return Ok(());
    }
    Err(io::Error::new(
        io::ErrorKind::InvalidData,
        format!(
            "invalid spec for {field}: {} field with width {}",
            spec.kind.name(),
            spec.width
        ),
    ))
}

fn standard_entries() -> Vec<(FieldId, FieldSpec)> {
    let mut entries = vec![
        (
            FieldId::Cash,
            FieldSpec::unsigned(PARTY_CASH_OFFSET, PARTY_CASH_WIDTH),
        ),
        (
            FieldId::LightEnergy,
            FieldSpec::unsigned(PARTY_LIGHT_ENERGY_OFFSET, 1),
        ),
    ];
    for (i, system) in ShipSystem::ALL.into_iter().enumerate() {
        entries.push((
            FieldId::Ship(system),
            FieldSpec::unsigned(SHIP_SOFTWARE_OFFSET + i, 1),
        ));
    }
    for member in 1..=CREW_COUNT {
        let base = CREW_BASE + (member - 1) * CREW_STRIDE;
        for field in CrewField::all() {
            entries.push((FieldId::Crew { member, field }, field.spec_at(base)));
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_builds_and_covers_every_crew_field() {
        let table = AddressTable::standard();
        let per_member = CrewField::all().count();
        assert_eq!(per_member, 33);
        assert_eq!(table.len(), 2 + 4 + CREW_COUNT * per_member);
        assert_eq!(table.extent(), SIGNATURE_OFFSET + SIGNATURE.len());
    }

    #[test]
    fn crew_records_fit_inside_their_stride() {
        assert!(CREW_RECORD_LEN <= CREW_STRIDE);
        let last = crew_base(CREW_COUNT).unwrap() + CREW_RECORD_LEN;
        assert!(last <= SIGNATURE_OFFSET);
    }

    #[test]
    fn crew_base_is_none_outside_the_crew() {
        assert_eq!(crew_base(0), None);
        assert_eq!(crew_base(CREW_COUNT + 1), None);
        assert_eq!(crew_base(1), Some(CREW_BASE));
    }

    #[test]
    fn specs_whose_end_overflows_are_rejected() {
        let entries = vec![(FieldId::Cash, FieldSpec::unsigned(usize::MAX - 1, 3))];
        let err = AddressTable::new(entries, Vec::new()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("overflows"));

        let text = vec![(
            FieldId::crew(1, CrewField::Name),
            FieldSpec::text(usize::MAX, CREW_NAME_LENGTH),
        )];
        assert!(AddressTable::new(text, Vec::new()).is_err());
    }

    #[test]
    fn overlapping_entries_are_rejected_at_build_time() {
        let entries = vec![
            (FieldId::Cash, FieldSpec::unsigned(0x10, 3)),
            (FieldId::LightEnergy, FieldSpec::unsigned(0x12, 1)),
        ];
        let err = AddressTable::new(entries, Vec::new()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("overlap"));
    }

    #[test]
    fn fields_may_not_overlap_reserved_ranges() {
        let entries = vec![(FieldId::Cash, FieldSpec::unsigned(0x10, 3))];
        let reserved = vec![ByteRange {
            start: 0x0F,
            end: 0x11,
        }];
        assert!(AddressTable::new(entries, reserved).is_err());
    }

    #[test]
    fn inconsistent_widths_are_rejected() {
        let zero = vec![(FieldId::Cash, FieldSpec::unsigned(0x10, 0))];
        assert!(AddressTable::new(zero, Vec::new()).is_err());

        let wide_item = vec![(
            FieldId::crew(1, CrewField::Armor),
            FieldSpec {
                offset: 0,
                width: 2,
                kind: FieldKind::ItemCode(SlotClass::Armor),
            },
        )];
        assert!(AddressTable::new(wide_item, Vec::new()).is_err());
    }

    #[test]
    fn split_index_handles_plain_and_indexed_segments() {
        assert_eq!(split_index("crew[4]"), Some(("crew", Some(4))));
        assert_eq!(split_index("party"), Some(("party", None)));
        assert_eq!(split_index("crew[x]"), None);
        assert_eq!(split_index("crew[2"), None);
    }
}
