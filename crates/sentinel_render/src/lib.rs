use std::fmt::Write as _;

use sentinel_core::codec::FieldValue;
use sentinel_core::core_api::{
    Ability, Characteristic, CrewMember, ItemCatalog, SaveModel, ShipSystem, SlotClass,
};
use sentinel_core::layout::FieldId;
use serde_json::{Map as JsonMap, Value as JsonValue};

const RULE_WIDTH: usize = 40;
const STAT_LABEL_WIDTH: usize = 13;
const ITEM_NAME_WIDTH: usize = 18;

pub fn render_json_full(model: &SaveModel) -> JsonValue {
    let catalog = ItemCatalog::builtin();
    let mut out = JsonMap::new();

    let mut party = JsonMap::new();
    party.insert("cash".to_string(), JsonValue::from(model.party.cash));
    party.insert(
        "light_energy".to_string(),
        JsonValue::from(model.party.light_energy),
    );
    out.insert("party".to_string(), JsonValue::Object(party));

    let mut ship = JsonMap::new();
    for system in ShipSystem::ALL {
        ship.insert(
            system.key().to_string(),
            JsonValue::from(model.ship.get(system)),
        );
    }
    out.insert("ship".to_string(), JsonValue::Object(ship));

    out.insert(
        "crew".to_string(),
        JsonValue::Array(
            model
                .crew
                .iter()
                .enumerate()
                .map(|(i, member)| crew_to_json(catalog, i + 1, member))
                .collect(),
        ),
    );

    JsonValue::Object(out)
}

/// One key per requested field, in request order. Fields outside the model
/// render as `null`.
pub fn render_json_selected(model: &SaveModel, fields: &[FieldId]) -> JsonValue {
    let catalog = ItemCatalog::builtin();
    let mut out = JsonMap::new();
    for field in fields {
        let value = model
            .get(*field)
            .map_or(JsonValue::Null, |v| field_value_to_json(catalog, &v));
        out.insert(field.to_string(), value);
    }
    JsonValue::Object(out)
}

/// Plain value for `--get`: numbers and names as-is, items as
/// `[0x29] Combat Armor`.
pub fn render_field_value(model: &SaveModel, field: FieldId) -> String {
    match model.get(field) {
        Some(FieldValue::Unsigned(v)) => v.to_string(),
        Some(FieldValue::Text(text)) => text,
        Some(FieldValue::Item(code)) => item_label(ItemCatalog::builtin(), code),
        None => String::new(),
    }
}

/// Human readable dump of the whole save, or of one crew member.
pub fn render_inspector_text(model: &SaveModel, member: Option<usize>) -> String {
    let catalog = ItemCatalog::builtin();
    let mut out = String::new();

    if member.is_none() {
        writeln!(&mut out, "Party").expect("writing to String cannot fail");
        writeln!(&mut out, "{}", "-".repeat(RULE_WIDTH)).expect("writing to String cannot fail");
        writeln!(&mut out, "        Cash: {}", model.party.cash)
            .expect("writing to String cannot fail");
        writeln!(&mut out, "Light energy: {}", model.party.light_energy)
            .expect("writing to String cannot fail");
        writeln!(&mut out).expect("writing to String cannot fail");

        writeln!(&mut out, "Ship software").expect("writing to String cannot fail");
        writeln!(&mut out, "{}", "-".repeat(RULE_WIDTH)).expect("writing to String cannot fail");
        for system in ShipSystem::ALL {
            writeln!(
                &mut out,
                "{:>6}: {}",
                system.key().to_ascii_uppercase(),
                model.ship.get(system)
            )
            .expect("writing to String cannot fail");
        }
    }

    for (i, crew) in model.crew.iter().enumerate() {
        let number = i + 1;
        if member.is_some_and(|m| m != number) {
            continue;
        }
        if !out.is_empty() {
            writeln!(&mut out).expect("writing to String cannot fail");
        }
        write_crew_member(&mut out, catalog, number, crew);
    }

    out
}

/// Catalog listing, optionally restricted to the codes one slot accepts.
pub fn render_item_list(slot: Option<SlotClass>) -> String {
    let catalog = ItemCatalog::builtin();
    let mut out = String::new();
    let codes: Vec<u8> = match slot {
        Some(slot) => catalog.codes_for(slot),
        None => catalog.entries().map(|entry| entry.code).collect(),
    };
    for code in codes {
        let Some(entry) = catalog.get(code) else {
            continue;
        };
        writeln!(
            &mut out,
            "0x{:02x}  {:<width$}  {}",
            entry.code,
            entry.name,
            entry.kind.as_str(),
            width = ITEM_NAME_WIDTH
        )
        .expect("writing to String cannot fail");
    }
    out
}

fn write_crew_member(out: &mut String, catalog: &ItemCatalog, number: usize, crew: &CrewMember) {
    writeln!(out, "Crew member {number}: {}", crew.name).expect("writing to String cannot fail");
    writeln!(out, "{}", "=".repeat(RULE_WIDTH)).expect("writing to String cannot fail");
    writeln!(out, "Rank: {}  HP: {}", crew.rank, crew.hp).expect("writing to String cannot fail");

    writeln!(out, "\nCharacteristics:").expect("writing to String cannot fail");
    for which in Characteristic::ALL {
        writeln!(
            out,
            "  {:<width$}{:>3}",
            characteristic_label(which),
            crew.characteristics.get(which),
            width = STAT_LABEL_WIDTH
        )
        .expect("writing to String cannot fail");
    }

    writeln!(out, "\nAbilities:").expect("writing to String cannot fail");
    for which in Ability::ALL {
        writeln!(
            out,
            "  {:<width$}{:>3}",
            ability_label(which),
            crew.abilities.get(which),
            width = STAT_LABEL_WIDTH
        )
        .expect("writing to String cannot fail");
    }

    let equipment = &crew.equipment;
    writeln!(out).expect("writing to String cannot fail");
    writeln!(out, "Equipped Armor: {}", item_label(catalog, equipment.armor))
        .expect("writing to String cannot fail");
    writeln!(out, "Equipped Weapon: {}", item_label(catalog, equipment.weapon))
        .expect("writing to String cannot fail");

    writeln!(out, "\nOn-hand Weapons:").expect("writing to String cannot fail");
    writeln!(out, "{}", "-".repeat(RULE_WIDTH)).expect("writing to String cannot fail");
    for (slot, &code) in equipment.onhand_weapons.iter().enumerate() {
        writeln!(out, "{slot}) {}", item_label(catalog, code))
            .expect("writing to String cannot fail");
    }

    writeln!(out, "\nInventory:").expect("writing to String cannot fail");
    writeln!(out, "{}", "-".repeat(RULE_WIDTH)).expect("writing to String cannot fail");
    for (slot, &code) in equipment.inventory.iter().enumerate() {
        writeln!(out, "{slot}) {}", item_label(catalog, code))
            .expect("writing to String cannot fail");
    }
}

fn crew_to_json(catalog: &ItemCatalog, number: usize, crew: &CrewMember) -> JsonValue {
    let mut m = JsonMap::new();
    m.insert("member".to_string(), JsonValue::from(number));
    m.insert("name".to_string(), JsonValue::String(crew.name.clone()));
    m.insert("rank".to_string(), JsonValue::from(crew.rank));
    m.insert("hp".to_string(), JsonValue::from(crew.hp));

    let mut characteristics = JsonMap::new();
    for which in Characteristic::ALL {
        characteristics.insert(
            which.key().to_string(),
            JsonValue::from(crew.characteristics.get(which)),
        );
    }
    m.insert(
        "characteristics".to_string(),
        JsonValue::Object(characteristics),
    );

    let mut abilities = JsonMap::new();
    for which in Ability::ALL {
        abilities.insert(
            which.key().to_string(),
            JsonValue::from(crew.abilities.get(which)),
        );
    }
    m.insert("abilities".to_string(), JsonValue::Object(abilities));

    let equipment = &crew.equipment;
    let mut gear = JsonMap::new();
    gear.insert("armor".to_string(), item_to_json(catalog, equipment.armor));
    gear.insert("weapon".to_string(), item_to_json(catalog, equipment.weapon));
    gear.insert(
        "onhand_weapons".to_string(),
        JsonValue::Array(
            equipment
                .onhand_weapons
                .iter()
                .map(|&code| item_to_json(catalog, code))
                .collect(),
        ),
    );
    gear.insert(
        "inventory".to_string(),
        JsonValue::Array(
            equipment
                .inventory
                .iter()
                .map(|&code| item_to_json(catalog, code))
                .collect(),
        ),
    );
    m.insert("equipment".to_string(), JsonValue::Object(gear));

    JsonValue::Object(m)
}

fn field_value_to_json(catalog: &ItemCatalog, value: &FieldValue) -> JsonValue {
    match value {
        FieldValue::Unsigned(v) => JsonValue::from(*v),
        FieldValue::Text(text) => JsonValue::String(text.clone()),
        FieldValue::Item(code) => item_to_json(catalog, *code),
    }
}

fn item_to_json(catalog: &ItemCatalog, code: u8) -> JsonValue {
    let mut m = JsonMap::new();
    m.insert("code".to_string(), JsonValue::String(format!("0x{code:02x}")));
    m.insert("name".to_string(), JsonValue::String(catalog.name_of(code)));
    JsonValue::Object(m)
}

fn item_label(catalog: &ItemCatalog, code: u8) -> String {
    format!("[0x{code:02x}] {}", catalog.name_of(code))
}

fn characteristic_label(which: Characteristic) -> &'static str {
    match which {
        Characteristic::Strength => "Strength",
        Characteristic::Stamina => "Stamina",
        Characteristic::Dexterity => "Dexterity",
        Characteristic::Comprehend => "Comprehend",
        Characteristic::Charisma => "Charisma",
    }
}

fn ability_label(which: Ability) -> &'static str {
    match which {
        Ability::Contact => "Contact",
        Ability::Edged => "Edged",
        Ability::Projectile => "Projectile",
        Ability::Blaster => "Blaster",
        Ability::Tactics => "Tactics",
        Ability::Recon => "Recon",
        Ability::Gunnery => "Gunnery",
        Ability::AtvRepair => "ATV Repair",
        Ability::Mining => "Mining",
        Ability::Athletics => "Athletics",
        Ability::Observation => "Observation",
        Ability::Bribery => "Bribery",
    }
}
