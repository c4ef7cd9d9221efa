use std::fs;
use std::path::{Path, PathBuf};

use sentinel_core::backup::backup_path;
use sentinel_core::codec::FieldValue;
use sentinel_core::core_api::{
    Ability, Characteristic, CoreErrorCode, EMPTY_SLOT, Engine, MAX_STAT, SaveModel, ShipSystem,
    decode, encode,
};
use sentinel_core::layout::{
    AddressTable, CREW_NAME_LENGTH, CrewField, FieldId, PARTY_CASH_OFFSET, SIGNATURE,
    SIGNATURE_OFFSET, crew_base,
};
use tempfile::TempDir;

/// 12,000 bytes of varied filler with the signature in place. Name fields end
/// up holding non-ASCII bytes, which must survive an untouched round trip.
fn synthetic_save() -> Vec<u8> {
    let mut bytes: Vec<u8> = (0..12_000u32).map(|i| (i * 31 % 251) as u8).collect();
    bytes[SIGNATURE_OFFSET..SIGNATURE_OFFSET + SIGNATURE.len()].copy_from_slice(SIGNATURE);
    bytes
}

fn write_save(dir: &Path, bytes: &[u8]) -> PathBuf {
    let path = dir.join("gamea.fm");
    fs::write(&path, bytes).expect("failed to write fixture");
    path
}

fn changed_offsets(before: &[u8], after: &[u8]) -> Vec<usize> {
    before
        .iter()
        .zip(after)
        .enumerate()
        .filter(|(_, (a, b))| a != b)
        .map(|(offset, _)| offset)
        .collect()
}

#[test]
fn decode_then_encode_reproduces_the_buffer() {
    let original = synthetic_save();
    let table = AddressTable::standard();

    let model = decode(&original, table).unwrap();
    let mut bytes = original.clone();
    encode(&model, table, &mut bytes).unwrap();
    assert_eq!(bytes, original);

    let mut blank = vec![0u8; original.len()];
    encode(&model, table, &mut blank).unwrap();
    assert_eq!(decode(&blank, table).unwrap(), model);
}

#[test]
fn failed_encode_leaves_the_buffer_untouched() {
    let original = synthetic_save();
    let table = AddressTable::standard();

    let mut model = decode(&original, table).unwrap();
    model.crew[0].rank = 9;
    model.crew[4].name = "Zoë".to_string();

    let mut bytes = original.clone();
    let err = encode(&model, table, &mut bytes).unwrap_err();
    assert_eq!(err.code, CoreErrorCode::InvalidText);
    assert!(err.message.starts_with("crew[5].name"), "{}", err.message);
    assert_eq!(changed_offsets(&original, &bytes), Vec::<usize>::new());
}

#[test]
fn model_survives_a_json_round_trip() {
    let model = decode(&synthetic_save(), AddressTable::standard()).unwrap();

    let json = serde_json::to_string(&model).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value["ship"].get("move").is_some());
    assert_eq!(value["crew"].as_array().map(Vec::len), Some(5));

    let back: SaveModel = serde_json::from_str(&json).unwrap();
    assert_eq!(back, model);

    let mut extra = value;
    extra["party"]["gold"] = serde_json::Value::from(1);
    assert!(serde_json::from_value::<SaveModel>(extra).is_err());
}

#[test]
fn unmodified_session_writes_identical_bytes() {
    let original = synthetic_save();
    let session = Engine::new().open_bytes(&original).unwrap();

    assert!(!session.is_modified());
    assert_eq!(session.to_bytes_unmodified(), original);
    assert_eq!(session.to_bytes_modified().unwrap(), original);
}

#[test]
fn decode_of_a_truncated_buffer_fails_whole() {
    let original = synthetic_save();
    let err = decode(&original[..0x300], AddressTable::standard()).unwrap_err();
    assert_eq!(err.code, CoreErrorCode::TruncatedRead);

    let model = decode(&original, AddressTable::standard()).unwrap();
    let mut short = vec![0u8; 0x300];
    let err = encode(&model, AddressTable::standard(), &mut short).unwrap_err();
    assert_eq!(err.code, CoreErrorCode::TruncatedRead);
    assert!(short.iter().all(|&b| b == 0));
}

#[test]
fn cash_round_trips_and_touches_only_its_three_bytes() {
    let original = synthetic_save();
    let mut session = Engine::new().open_bytes(&original).unwrap();

    session.set_cash(999_999).unwrap();
    assert!(session.is_modified());
    let bytes = session.to_bytes_modified().unwrap();
    assert_eq!(
        &bytes[PARTY_CASH_OFFSET..PARTY_CASH_OFFSET + 3],
        &[0x3F, 0x42, 0x0F]
    );
    for offset in changed_offsets(&original, &bytes) {
        assert!((PARTY_CASH_OFFSET..PARTY_CASH_OFFSET + 3).contains(&offset));
    }

    let reopened = Engine::new().open_bytes(&bytes).unwrap();
    assert_eq!(reopened.model().party.cash, 999_999);
}

#[test]
fn cash_past_three_bytes_is_a_range_error() {
    let mut session = Engine::new().open_bytes(synthetic_save()).unwrap();
    let before = session.model().clone();

    session.set_cash(16_777_215).unwrap();
    let err = session.set_cash(16_777_216).unwrap_err();
    assert_eq!(err.code, CoreErrorCode::ValueOutOfRange);
    assert!(err.is_local());
    assert_eq!(session.model().party.cash, 16_777_215);
    assert_eq!(session.model().crew, before.crew);
}

#[test]
fn resources_cannot_be_set_to_zero() {
    let mut session = Engine::new().open_bytes(synthetic_save()).unwrap();
    let before = session.model().clone();

    let err = session.set_cash(0).unwrap_err();
    assert_eq!(err.code, CoreErrorCode::ValueOutOfRange);
    assert!(err.message.ends_with("(1..=16777215)"), "{}", err.message);
    for err in [
        session.set_light_energy(0).unwrap_err(),
        session.set_ship_software(ShipSystem::Move, 0).unwrap_err(),
        session.set_hp(3, 0).unwrap_err(),
    ] {
        assert_eq!(err.code, CoreErrorCode::ValueOutOfRange);
        assert!(err.is_local());
    }
    assert_eq!(session.model(), &before);

    session.set_cash(1).unwrap();
    session.set_hp(3, 1).unwrap();
    session.set_rank(3, 0).unwrap();
    session.set_ability(3, Ability::Mining, 0).unwrap();
    assert_eq!(session.model().party.cash, 1);
    assert_eq!(session.model().crew[2].hp, 1);
}

#[test]
fn stats_are_capped_below_the_byte_maximum() {
    let mut session = Engine::new().open_bytes(synthetic_save()).unwrap();

    session.set_ability(2, Ability::Gunnery, MAX_STAT).unwrap();
    let err = session
        .set_ability(2, Ability::Gunnery, MAX_STAT + 1)
        .unwrap_err();
    assert_eq!(err.code, CoreErrorCode::ValueOutOfRange);
    assert_eq!(session.model().crew[1].abilities.gunnery, 254);

    let err = session
        .set_characteristic(5, Characteristic::Charisma, 255)
        .unwrap_err();
    assert_eq!(err.code, CoreErrorCode::ValueOutOfRange);

    session.set_hp(1, 255).unwrap();
    assert_eq!(
        session.set_hp(1, 256).unwrap_err().code,
        CoreErrorCode::ValueOutOfRange
    );
    session.set_ship_software(ShipSystem::Laser, 200).unwrap();
    session.set_light_energy(255).unwrap();
    assert_eq!(session.model().ship.laser, 200);
    assert_eq!(session.model().party.light_energy, 255);
}

#[test]
fn name_is_space_padded_to_the_field_length() {
    let original = synthetic_save();
    let mut session = Engine::new().open_bytes(&original).unwrap();

    session.set_name(1, "Zara").unwrap();
    let bytes = session.to_bytes_modified().unwrap();
    let base = crew_base(1).unwrap();
    assert_eq!(&bytes[base..base + CREW_NAME_LENGTH], b"Zara      ");
    for offset in changed_offsets(&original, &bytes) {
        assert!((base..base + CREW_NAME_LENGTH).contains(&offset));
    }
}

#[test]
fn names_must_be_short_ascii() {
    let mut session = Engine::new().open_bytes(synthetic_save()).unwrap();
    let before = session.model().crew[0].name.clone();

    let err = session.set_name(1, "Maximilianus").unwrap_err();
    assert_eq!(err.code, CoreErrorCode::StringTooLong);
    let err = session.set_name(1, "Zoë").unwrap_err();
    assert_eq!(err.code, CoreErrorCode::InvalidText);

    assert_eq!(session.model().crew[0].name, before);
    assert!(!session.is_modified());
}

#[test]
fn armor_slot_rejects_a_weapon_without_mutating() {
    let mut session = Engine::new().open_bytes(synthetic_save()).unwrap();
    let before = session.model().clone();

    let err = session.set_armor(1, 0x18).unwrap_err();
    assert_eq!(err.code, CoreErrorCode::InvalidItemCode);
    assert_eq!(session.model(), &before);

    session.set_armor(1, 0x29).unwrap();
    assert_eq!(session.model().crew[0].equipment.armor, 0x29);
}

#[test]
fn only_optional_slots_can_be_emptied() {
    let mut session = Engine::new().open_bytes(synthetic_save()).unwrap();

    assert_eq!(
        session.set_armor(2, EMPTY_SLOT).unwrap_err().code,
        CoreErrorCode::InvalidItemCode
    );
    assert_eq!(
        session.set_weapon(2, EMPTY_SLOT).unwrap_err().code,
        CoreErrorCode::InvalidItemCode
    );
    session.set_onhand_weapon(2, 0, EMPTY_SLOT).unwrap();
    session.set_inventory_item(2, 7, EMPTY_SLOT).unwrap();
    session.set_inventory_item(2, 6, 0x31).unwrap();

    let equipment = &session.model().crew[1].equipment;
    assert_eq!(equipment.onhand_weapons[0], EMPTY_SLOT);
    assert_eq!(equipment.inventory[6], 0x31);
    assert_eq!(equipment.inventory[7], EMPTY_SLOT);
}

#[test]
fn out_of_range_members_and_slots_are_rejected() {
    let mut session = Engine::new().open_bytes(synthetic_save()).unwrap();
    let before = session.model().clone();

    assert_eq!(
        session.set_rank(6, 1).unwrap_err().code,
        CoreErrorCode::IndexOutOfRange
    );
    assert_eq!(
        session.set_rank(0, 1).unwrap_err().code,
        CoreErrorCode::IndexOutOfRange
    );
    assert_eq!(
        session.set_inventory_item(1, 8, 0x00).unwrap_err().code,
        CoreErrorCode::IndexOutOfRange
    );
    assert_eq!(
        session.set_onhand_weapon(1, 3, 0x18).unwrap_err().code,
        CoreErrorCode::IndexOutOfRange
    );
    assert_eq!(session.model(), &before);
}

#[test]
fn generic_setter_checks_value_kind() {
    let mut session = Engine::new().open_bytes(synthetic_save()).unwrap();

    let field: FieldId = "crew[3].equipment.inventory[5]".parse().unwrap();
    session.set_field(field, FieldValue::Item(0x22)).unwrap();
    assert_eq!(session.get(field).unwrap(), FieldValue::Item(0x22));

    let err = session
        .set_field(FieldId::Cash, FieldValue::Text("lots".into()))
        .unwrap_err();
    assert_eq!(err.code, CoreErrorCode::Layout);

    let err = session
        .set_field(
            FieldId::crew(1, CrewField::Rank),
            FieldValue::Item(0x10),
        )
        .unwrap_err();
    assert_eq!(err.code, CoreErrorCode::Layout);
}

#[test]
fn setting_a_value_back_clears_the_modified_flag() {
    let mut session = Engine::new().open_bytes(synthetic_save()).unwrap();
    let cash = session.model().party.cash;

    session.set_cash(cash ^ 1).unwrap();
    assert!(session.is_modified());
    session.set_cash(cash).unwrap();
    assert!(!session.is_modified());
}

#[test]
fn save_backs_up_once_and_writes_in_place() {
    let dir = TempDir::new().unwrap();
    let original = synthetic_save();
    let path = write_save(dir.path(), &original);

    let mut session = Engine::new().open_path(&path).unwrap();
    assert!(!backup_path(&path).exists());

    session.set_cash(1234).unwrap();
    session.save().unwrap();
    assert_eq!(fs::read(backup_path(&path)).unwrap(), original);
    assert!(!session.is_modified());

    session.set_name(4, "Ortega").unwrap();
    session.save().unwrap();
    assert_eq!(fs::read(backup_path(&path)).unwrap(), original);

    let reloaded = Engine::new().load(&path).unwrap();
    assert_eq!(reloaded.party.cash, 1234);
    assert_eq!(reloaded.crew[3].name, "Ortega");
    assert_eq!(fs::read(&path).unwrap().len(), original.len());
}

#[test]
fn failed_backup_does_not_block_saving() {
    let dir = TempDir::new().unwrap();
    let path = write_save(dir.path(), &synthetic_save());
    fs::create_dir(backup_path(&path)).unwrap();

    let mut session = Engine::new().open_path(&path).unwrap();
    session.set_cash(77).unwrap();
    session.save().unwrap();

    assert!(backup_path(&path).is_dir());
    assert_eq!(Engine::new().load(&path).unwrap().party.cash, 77);
}

#[test]
fn open_for_edit_backs_up_before_any_change() {
    let dir = TempDir::new().unwrap();
    let original = synthetic_save();
    let path = write_save(dir.path(), &original);

    let mut session = Engine::new().open_for_edit(&path).unwrap();
    assert_eq!(fs::read(backup_path(&path)).unwrap(), original);

    session.set_hp(2, 77).unwrap();
    session.save().unwrap();
    assert_eq!(fs::read(backup_path(&path)).unwrap(), original);
    assert_eq!(Engine::new().load(&path).unwrap().crew[1].hp, 77);
}

#[test]
fn engine_save_rewrites_only_modelled_fields() {
    let dir = TempDir::new().unwrap();
    let original = synthetic_save();
    let path = write_save(dir.path(), &original);
    let engine = Engine::new();

    let mut model = engine.load(&path).unwrap();
    model.crew[4].rank = 9;
    engine.save(&path, &model).unwrap();

    let written = fs::read(&path).unwrap();
    let rank_offset = AddressTable::standard()
        .resolve(FieldId::crew(5, CrewField::Rank))
        .unwrap()
        .offset;
    assert_eq!(changed_offsets(&original, &written), vec![rank_offset]);
    assert_eq!(written[rank_offset], 9);
    assert_eq!(fs::read(backup_path(&path)).unwrap(), original);
}

#[test]
fn save_to_leaves_the_source_untouched() {
    let dir = TempDir::new().unwrap();
    let original = synthetic_save();
    let path = write_save(dir.path(), &original);
    let out = dir.path().join("edited.fm");

    let mut session = Engine::new().open_path(&path).unwrap();
    session.set_light_energy(42).unwrap();
    session.save_to(&out).unwrap();

    assert_eq!(fs::read(&path).unwrap(), original);
    assert!(!backup_path(&path).exists());
    assert_eq!(fs::read(&out).unwrap()[0x43], 42);
}

#[test]
fn byte_sessions_cannot_save_in_place() {
    let mut session = Engine::new().open_bytes(synthetic_save()).unwrap();
    session.set_cash(5).unwrap();
    let err = session.save().unwrap_err();
    assert_eq!(err.code, CoreErrorCode::Io);
    assert!(session.path().is_none());
}
