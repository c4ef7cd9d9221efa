use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::backup;
use crate::codec::{self, CodecError, FieldValue};
use crate::layout::{AddressTable, CrewField, FieldId, FieldKind, FieldSpec};
use crate::validation;

use super::error::{CoreError, CoreErrorCode};
use super::item_catalog::ItemCatalog;
use super::types::{
    Ability, Characteristic, SaveModel, ShipSystem, Validation, domain_max, domain_min,
};

#[derive(Debug, Clone, Copy)]
pub struct Engine {
    table: &'static AddressTable,
    catalog: &'static ItemCatalog,
}

/// An opened save: the bytes it was read from plus the editable model.
#[derive(Debug)]
pub struct Session {
    path: Option<PathBuf>,
    original: Vec<u8>,
    baseline: SaveModel,
    model: SaveModel,
    backed_up: bool,
    table: &'static AddressTable,
    catalog: &'static ItemCatalog,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            table: AddressTable::standard(),
            catalog: ItemCatalog::builtin(),
        }
    }

    pub fn table(&self) -> &'static AddressTable {
        self.table
    }

    pub fn catalog(&self) -> &'static ItemCatalog {
        self.catalog
    }

    pub fn validate(&self, path: &Path) -> Validation {
        validation::validate(path)
    }

    /// Validates and decodes `path`. Nothing is written until the session is
    /// saved.
    pub fn open_path(&self, path: &Path) -> Result<Session, CoreError> {
        validation::check(path)?;
        let bytes = fs::read(path)?;
        self.session_from(bytes, Some(path.to_path_buf()))
    }

    /// Like [`Engine::open_path`], but snapshots the file to `.bak` first.
    pub fn open_for_edit(&self, path: &Path) -> Result<Session, CoreError> {
        validation::check(path)?;
        backup::backup(path);
        let bytes = fs::read(path)?;
        let mut session = self.session_from(bytes, Some(path.to_path_buf()))?;
        session.backed_up = true;
        Ok(session)
    }

    pub fn open_bytes<B: AsRef<[u8]>>(&self, bytes: B) -> Result<Session, CoreError> {
        let bytes = bytes.as_ref();
        validation::check_bytes(bytes)?;
        self.session_from(bytes.to_vec(), None)
    }

    pub fn load(&self, path: &Path) -> Result<SaveModel, CoreError> {
        self.open_path(path).map(Session::into_model)
    }

    /// Writes `model` over the file at `path`, keeping every byte the table
    /// does not describe. The file is backed up before it is replaced.
    pub fn save(&self, path: &Path, model: &SaveModel) -> Result<(), CoreError> {
        validation::check(path)?;
        let mut bytes = fs::read(path)?;
        encode(model, self.table, &mut bytes)?;
        backup::backup(path);
        fs::write(path, &bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "save written");
        Ok(())
    }

    fn session_from(&self, bytes: Vec<u8>, path: Option<PathBuf>) -> Result<Session, CoreError> {
        let model = decode(&bytes, self.table)?;
        Ok(Session {
            path,
            original: bytes,
            baseline: model.clone(),
            model,
            backed_up: false,
            table: self.table,
            catalog: self.catalog,
        })
    }
}

/// Reads every field of `table` out of `buf`. Any failure aborts the whole
/// decode.
pub fn decode(buf: &[u8], table: &AddressTable) -> Result<SaveModel, CoreError> {
    let mut model = SaveModel::default();
    for (field, spec) in table.entries() {
        let value = codec::read_field(buf, spec).map_err(|e| field_error(*field, e))?;
        model.put(*field, value)?;
    }
    debug!(fields = table.len(), bytes = buf.len(), "decoded save model");
    Ok(model)
}

/// Writes every field of `model` into `buf`. Only representability is
/// checked here, so anything [`decode`] produced encodes back unchanged.
/// On error `buf` is left exactly as it was.
pub fn encode(model: &SaveModel, table: &AddressTable, buf: &mut [u8]) -> Result<(), CoreError> {
    let extent = table.extent();
    if buf.len() < extent {
        return Err(CoreError::new(
            CoreErrorCode::TruncatedRead,
            format!("buffer is {} bytes, layout needs {extent}", buf.len()),
        ));
    }
    let mut scratch = buf.to_vec();
    encode_into(model, table, &mut scratch)?;
    buf.copy_from_slice(&scratch);
    debug!(fields = table.len(), bytes = buf.len(), "encoded save model");
    Ok(())
}

fn encode_into(model: &SaveModel, table: &AddressTable, buf: &mut [u8]) -> Result<(), CoreError> {
    for (field, spec) in table.entries() {
        let value = model.get(*field).ok_or_else(|| {
            CoreError::new(
                CoreErrorCode::IndexOutOfRange,
                format!("model has no value for {field}"),
            )
        })?;
        // Bytes that already decode to the model value stay as they are, so
        // undecodable name bytes survive a save that did not touch the name.
        if codec::read_field(buf, spec).is_ok_and(|current| current == value) {
            continue;
        }
        codec::write_field(buf, spec, &value).map_err(|e| field_error(*field, e))?;
    }
    Ok(())
}

fn field_error(field: FieldId, err: CodecError) -> CoreError {
    let base = CoreError::from(err);
    CoreError::new(base.code, format!("{field}: {}", base.message))
}

impl Session {
    pub fn model(&self) -> &SaveModel {
        &self.model
    }

    pub fn into_model(self) -> SaveModel {
        self.model
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_modified(&self) -> bool {
        self.model != self.baseline
    }

    pub fn get(&self, field: FieldId) -> Result<FieldValue, CoreError> {
        self.table.resolve(field)?;
        self.model.get(field).ok_or_else(|| {
            CoreError::new(
                CoreErrorCode::IndexOutOfRange,
                format!("field {field} does not exist in this model"),
            )
        })
    }

    pub fn to_bytes_unmodified(&self) -> Vec<u8> {
        self.original.clone()
    }

    pub fn to_bytes_modified(&self) -> Result<Vec<u8>, CoreError> {
        let mut bytes = self.original.clone();
        encode(&self.model, self.table, &mut bytes)?;
        Ok(bytes)
    }

    /// Writes the edited model back to the file it was opened from. The first
    /// save of a session backs the file up.
    pub fn save(&mut self) -> Result<(), CoreError> {
        let path = self.path.clone().ok_or_else(|| {
            CoreError::new(
                CoreErrorCode::Io,
                "session was opened from bytes and has no file to save to",
            )
        })?;
        validation::check(&path)?;
        let bytes = self.to_bytes_modified()?;
        if !self.backed_up {
            backup::backup(&path);
            self.backed_up = true;
        }
        fs::write(&path, &bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "save written");

        self.original = bytes;
        self.baseline = self.model.clone();
        Ok(())
    }

    /// Writes the edited model to `path`, leaving the source file alone.
    pub fn save_to(&self, path: &Path) -> Result<(), CoreError> {
        let bytes = self.to_bytes_modified()?;
        fs::write(path, &bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "save written");
        Ok(())
    }

    /// Checks `value` against the field's width, documented bounds, text
    /// rules and slot class, then stores it. A rejected value leaves the model
    /// untouched.
    pub fn set_field(&mut self, field: FieldId, value: FieldValue) -> Result<(), CoreError> {
        let spec = self.table.resolve(field)?;
        check_edit(self.catalog, field, &spec, &value)?;
        self.model.put(field, value)?;
        debug!(%field, "field updated");
        Ok(())
    }

    pub fn set_cash(&mut self, value: u32) -> Result<(), CoreError> {
        self.set_field(FieldId::Cash, FieldValue::Unsigned(value))
    }

    pub fn set_light_energy(&mut self, value: u32) -> Result<(), CoreError> {
        self.set_field(FieldId::LightEnergy, FieldValue::Unsigned(value))
    }

    pub fn set_ship_software(&mut self, system: ShipSystem, value: u32) -> Result<(), CoreError> {
        self.set_field(FieldId::Ship(system), FieldValue::Unsigned(value))
    }

    pub fn set_name(&mut self, member: usize, name: &str) -> Result<(), CoreError> {
        self.set_field(
            FieldId::crew(member, CrewField::Name),
            FieldValue::Text(name.to_string()),
        )
    }

    pub fn set_rank(&mut self, member: usize, value: u32) -> Result<(), CoreError> {
        self.set_field(FieldId::crew(member, CrewField::Rank), FieldValue::Unsigned(value))
    }

    pub fn set_hp(&mut self, member: usize, value: u32) -> Result<(), CoreError> {
        self.set_field(FieldId::crew(member, CrewField::Hp), FieldValue::Unsigned(value))
    }

    pub fn set_characteristic(
        &mut self,
        member: usize,
        which: Characteristic,
        value: u32,
    ) -> Result<(), CoreError> {
        self.set_field(
            FieldId::crew(member, CrewField::Characteristic(which)),
            FieldValue::Unsigned(value),
        )
    }

    pub fn set_ability(&mut self, member: usize, which: Ability, value: u32) -> Result<(), CoreError> {
        self.set_field(
            FieldId::crew(member, CrewField::Ability(which)),
            FieldValue::Unsigned(value),
        )
    }

    pub fn set_armor(&mut self, member: usize, code: u8) -> Result<(), CoreError> {
        self.set_field(FieldId::crew(member, CrewField::Armor), FieldValue::Item(code))
    }

    pub fn set_weapon(&mut self, member: usize, code: u8) -> Result<(), CoreError> {
        self.set_field(FieldId::crew(member, CrewField::Weapon), FieldValue::Item(code))
    }

    pub fn set_onhand_weapon(&mut self, member: usize, slot: usize, code: u8) -> Result<(), CoreError> {
        self.set_field(
            FieldId::crew(member, CrewField::OnHandWeapon(slot)),
            FieldValue::Item(code),
        )
    }

    pub fn set_inventory_item(&mut self, member: usize, slot: usize, code: u8) -> Result<(), CoreError> {
        self.set_field(
            FieldId::crew(member, CrewField::Inventory(slot)),
            FieldValue::Item(code),
        )
    }
}

fn check_edit(
    catalog: &ItemCatalog,
    field: FieldId,
    spec: &FieldSpec,
    value: &FieldValue,
) -> Result<(), CoreError> {
    match (spec.kind, value) {
        (FieldKind::UnsignedInt, FieldValue::Unsigned(v)) => {
            let width_max = codec::max_for_width(spec.width)?;
            let max = domain_max(field).map_or(width_max, |m| m.min(width_max));
            let min = domain_min(field);
            if !(min..=max).contains(v) {
                return Err(CoreError::new(
                    CoreErrorCode::ValueOutOfRange,
                    format!("value {v} is out of range for {field} ({min}..={max})"),
                ));
            }
            Ok(())
        }
        (FieldKind::PaddedText { length }, FieldValue::Text(text)) => {
            if !text.is_ascii() {
                return Err(field_error(
                    field,
                    CodecError::NonAsciiText {
                        value: text.clone(),
                    },
                ));
            }
            if text.len() > length {
                return Err(field_error(
                    field,
                    CodecError::StringTooLong {
                        value: text.clone(),
                        actual: text.len(),
                        length,
                    },
                ));
            }
            Ok(())
        }
        (FieldKind::ItemCode(slot), FieldValue::Item(code)) => catalog.check(*code, slot),
        (kind, other) => Err(field_error(
            field,
            CodecError::KindMismatch {
                expected: kind.name(),
                found: other.kind_name(),
            },
        )),
    }
}
