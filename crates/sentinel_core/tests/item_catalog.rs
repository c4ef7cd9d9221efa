use sentinel_core::core_api::{
    CoreErrorCode, EMPTY_SLOT, ItemCatalog, ItemKind, SlotClass, parse_item_code,
};

#[test]
fn builtin_catalog_names_documented_codes() {
    let catalog = ItemCatalog::builtin();
    assert!(!catalog.is_empty());
    assert_eq!(catalog.name_of(0x18), "Hand Laser");
    assert_eq!(catalog.name_of(0x29), "Combat Armor");
    assert_eq!(catalog.name_of(0x30), "Auto Clip");
    assert_eq!(catalog.name_of(EMPTY_SLOT), "Empty Slot");
    assert_eq!(catalog.get(0x37).map(|e| e.kind), Some(ItemKind::Weapon));
}

#[test]
fn undocumented_codes_get_a_placeholder_name() {
    let catalog = ItemCatalog::builtin();
    assert!(catalog.get(0x40).is_none());
    assert_eq!(catalog.name_of(0x40), "Unknown 0x40");
    assert_eq!(catalog.name_of(0xA7), "Unknown 0xA7");
}

#[test]
fn equipped_slots_accept_only_their_own_kind() {
    let catalog = ItemCatalog::builtin();
    assert!(catalog.is_valid_for(0x29, SlotClass::Armor));
    assert!(!catalog.is_valid_for(0x18, SlotClass::Armor));
    assert!(catalog.is_valid_for(0x18, SlotClass::Weapon));
    assert!(!catalog.is_valid_for(0x29, SlotClass::Weapon));
    assert!(!catalog.is_valid_for(0x30, SlotClass::Weapon));
}

#[test]
fn empty_sentinel_is_only_valid_where_a_slot_may_be_empty() {
    let catalog = ItemCatalog::builtin();
    assert!(!catalog.is_valid_for(EMPTY_SLOT, SlotClass::Armor));
    assert!(!catalog.is_valid_for(EMPTY_SLOT, SlotClass::Weapon));
    assert!(catalog.is_valid_for(EMPTY_SLOT, SlotClass::OnHandWeapon));
    assert!(catalog.is_valid_for(EMPTY_SLOT, SlotClass::Inventory));
}

#[test]
fn inventory_holds_misc_and_ammunition_but_not_gear() {
    let catalog = ItemCatalog::builtin();
    let codes = catalog.codes_for(SlotClass::Inventory);
    assert!(codes.contains(&0x00));
    assert!(codes.contains(&0x36));
    assert!(codes.contains(&EMPTY_SLOT));
    assert!(!codes.contains(&0x18));
    assert!(!codes.contains(&0x29));
    assert!(codes.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn unknown_codes_are_valid_nowhere() {
    let catalog = ItemCatalog::builtin();
    for slot in SlotClass::ALL {
        assert!(!catalog.is_valid_for(0x40, slot), "{slot}");
    }
}

#[test]
fn check_names_the_slot_in_its_error() {
    let err = ItemCatalog::builtin()
        .check(0x18, SlotClass::Armor)
        .unwrap_err();
    assert_eq!(err.code, CoreErrorCode::InvalidItemCode);
    assert!(err.message.contains("Hand Laser"), "{}", err.message);
    assert!(err.message.contains("armor"), "{}", err.message);
}

#[test]
fn item_codes_parse_with_or_without_prefix() {
    assert_eq!(parse_item_code("2F").unwrap(), 0x2F);
    assert_eq!(parse_item_code("0x2f").unwrap(), 0x2F);
    assert_eq!(parse_item_code("0XFF").unwrap(), 0xFF);
    assert_eq!(parse_item_code(" 18 ").unwrap(), 0x18);

    for bad in ["", "0x", "100", "zz", "-1"] {
        let err = parse_item_code(bad).unwrap_err();
        assert_eq!(err.code, CoreErrorCode::InvalidItemCode, "{bad:?}");
    }
}
