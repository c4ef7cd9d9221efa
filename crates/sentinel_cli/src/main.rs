use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use sentinel_core::codec::FieldValue;
use sentinel_core::core_api::{
    CoreError, CoreErrorCode, Engine, SaveModel, Session, SlotClass, parse_item_code,
};
use sentinel_core::layout::{FieldId, FieldKind};
use sentinel_render::{
    render_field_value, render_inspector_text, render_item_list, render_json_full,
    render_json_selected,
};
use serde_json::Value as JsonValue;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "sentinel_core=warn";

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ItemListArg {
    All,
    Armor,
    Weapon,
    Onhand,
    Inventory,
}

impl ItemListArg {
    fn slot(self) -> Option<SlotClass> {
        match self {
            Self::All => None,
            Self::Armor => Some(SlotClass::Armor),
            Self::Weapon => Some(SlotClass::Weapon),
            Self::Onhand => Some(SlotClass::OnHandWeapon),
            Self::Inventory => Some(SlotClass::Inventory),
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(value_name = "GAMEX.FM", required_unless_present = "list_items")]
    path: Option<PathBuf>,
    /// Validate the file and exit.
    #[arg(long)]
    check: bool,
    /// Print one field by dotted path, e.g. crew[2].abilities.gunnery.
    #[arg(long = "get", value_name = "FIELD")]
    get: Vec<String>,
    #[arg(long)]
    json: bool,
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u8).range(1..=5))]
    member: Option<u8>,
    /// Set a field, e.g. crew[1].equipment.armor=0x29. May be repeated.
    #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
    set: Vec<(String, String)>,
    #[arg(long = "set-cash", value_name = "N", allow_hyphen_values = true)]
    set_cash: Option<i64>,
    #[arg(long = "set-light-energy", value_name = "N", allow_hyphen_values = true)]
    set_light_energy: Option<i64>,
    /// Write the edited save here instead of over the input.
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    #[arg(
        long = "list-items",
        value_name = "SLOT",
        num_args = 0..=1,
        default_missing_value = "all"
    )]
    list_items: Option<ItemListArg>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Some(list) = cli.list_items {
        print!("{}", render_item_list(list.slot()));
        return;
    }

    let Some(path) = cli.path.clone() else {
        eprintln!("a save file path is required");
        process::exit(2);
    };
    let engine = Engine::new();

    if cli.check {
        let result = engine.validate(&path);
        if result.valid {
            println!("valid");
            return;
        }
        eprintln!("Error: {}", result.reason);
        process::exit(1);
    }

    let edits = collect_edits(&cli).unwrap_or_else(|e| {
        eprintln!("Error: {}", e.message);
        process::exit(1);
    });
    if edits.is_empty() && cli.output.is_some() {
        eprintln!("--output requires at least one --set flag");
        process::exit(2);
    }

    let mut session = engine.open_path(&path).unwrap_or_else(|e| {
        eprintln!("Error: {}", e.message);
        process::exit(1);
    });

    let requested = cli
        .get
        .iter()
        .map(|raw| {
            engine
                .table()
                .resolve_path(raw)
                .map(|(field, _)| field)
        })
        .collect::<Result<Vec<FieldId>, CoreError>>()
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e.message);
            process::exit(1);
        });

    if !edits.is_empty() {
        apply_edits(&mut session, &edits).unwrap_or_else(|e| {
            eprintln!("Error applying edit: {}", e.message);
            process::exit(1);
        });
        let written = match &cli.output {
            Some(out_path) => session.save_to(out_path).map(|()| out_path.clone()),
            None => session.save().map(|()| path.clone()),
        };
        let written = written.unwrap_or_else(|e| {
            eprintln!("Error writing save: {}", e.message);
            process::exit(1);
        });
        if requested.is_empty() && !cli.json {
            println!("Wrote edited save to {}", written.display());
            return;
        }
    }

    let member = cli.member.map(usize::from);
    let model = session.model();

    if cli.json {
        let json = json_output(model, &requested, member);
        let rendered = serde_json::to_string_pretty(&json).unwrap_or_else(|e| {
            eprintln!("Error rendering JSON output: {e}");
            process::exit(1);
        });
        println!("{rendered}");
        return;
    }

    if !requested.is_empty() {
        for field in &requested {
            println!("{field}={}", render_field_value(model, *field));
        }
        return;
    }

    print!("{}", render_inspector_text(model, member));
}

fn json_output(model: &SaveModel, requested: &[FieldId], member: Option<usize>) -> JsonValue {
    if !requested.is_empty() {
        return render_json_selected(model, requested);
    }
    let full = render_json_full(model);
    match member {
        Some(n) => full["crew"][n - 1].clone(),
        None => full,
    }
}

/// Turns every `--set*` flag into a typed edit, rejecting unknown paths and
/// unparsable values before the save is opened.
fn collect_edits(cli: &Cli) -> Result<Vec<(FieldId, FieldValue)>, CoreError> {
    let table = Engine::new().table();
    let mut edits = Vec::new();

    if let Some(cash) = cli.set_cash {
        edits.push((FieldId::Cash, unsigned_value(FieldId::Cash, cash)?));
    }
    if let Some(energy) = cli.set_light_energy {
        edits.push((
            FieldId::LightEnergy,
            unsigned_value(FieldId::LightEnergy, energy)?,
        ));
    }
    for (raw_field, raw_value) in &cli.set {
        let (field, spec) = table.resolve_path(raw_field)?;
        let value = match spec.kind {
            FieldKind::UnsignedInt => {
                let number = raw_value.trim().parse::<i64>().map_err(|_| {
                    CoreError::new(
                        CoreErrorCode::ValueOutOfRange,
                        format!("{field} expects a whole number, got {raw_value:?}"),
                    )
                })?;
                unsigned_value(field, number)?
            }
            FieldKind::PaddedText { .. } => FieldValue::Text(raw_value.clone()),
            FieldKind::ItemCode(_) => FieldValue::Item(parse_item_code(raw_value)?),
        };
        edits.push((field, value));
    }
    Ok(edits)
}

/// Applies edits in flag order. The first rejected edit aborts the whole
/// invocation before anything is written, so the file either gets every
/// requested edit or none of them.
fn apply_edits(session: &mut Session, edits: &[(FieldId, FieldValue)]) -> Result<(), CoreError> {
    for (field, value) in edits {
        session.set_field(*field, value.clone())?;
        debug!(%field, "applied edit");
    }
    Ok(())
}

fn unsigned_value(field: FieldId, value: i64) -> Result<FieldValue, CoreError> {
    u32::try_from(value).map(FieldValue::Unsigned).map_err(|_| {
        CoreError::new(
            CoreErrorCode::ValueOutOfRange,
            format!("value {value} is out of range for {field}"),
        )
    })
}

fn parse_assignment(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((field, assigned)) if !field.trim().is_empty() => {
            Ok((field.trim().to_string(), assigned.to_string()))
        }
        _ => Err(format!(
            "invalid assignment '{value}', expected FIELD=VALUE"
        )),
    }
}
