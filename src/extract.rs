//! Data dump extraction for recipes and items
//!
//! The dump is a JSON array of `{ "NativeClass": ..., "Classes": [...] }`
//! groups. Each class instance is a flat bag of properties; recipe ingredient
//! and product lists are serialized object literals such as
//! `((ItemClass=BlueprintGeneratedClass'"/Game/.../Desc_OreIron.Desc_OreIron_C"',Amount=1))`
//! which are picked apart with regular expressions.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::CatalogError;
use crate::models::{Item, ItemRate, Recipe};

pub const RECIPE_CLASS: &str = "FGRecipe";

/// One class instance: normalized id plus its raw properties.
#[derive(Debug, Clone, PartialEq)]
pub struct DumpInstance {
    pub id: String,
    pub properties: Map<String, Value>,
}

impl DumpInstance {
    fn text(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DumpClass {
    pub name: String,
    pub instances: Vec<DumpInstance>,
}

/// Class name → instance id → property bag, in dump order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataDump {
    pub classes: Vec<DumpClass>,
}

#[derive(Debug, Deserialize)]
struct RawGroup {
    #[serde(rename = "NativeClass")]
    native_class: String,
    #[serde(rename = "Classes")]
    classes: Vec<Map<String, Value>>,
}

impl DataDump {
    pub fn class(&self, name: &str) -> Option<&DumpClass> {
        self.classes.iter().find(|c| c.name == name)
    }

    /// Merge a raw dump value (the top-level JSON array) into this dump.
    pub fn merge_value(&mut self, file: &Path, value: Value) -> Result<(), CatalogError> {
        let groups: Vec<RawGroup> =
            serde_json::from_value(value).map_err(|e| CatalogError::Shape {
                file: file.to_path_buf(),
                detail: e.to_string(),
            })?;

        for group in groups {
            let class_name = normalize(
                group
                    .native_class
                    .rsplit('.')
                    .next()
                    .unwrap_or(&group.native_class),
            );

            let idx = match self.classes.iter().position(|c| c.name == class_name) {
                Some(idx) => idx,
                None => {
                    self.classes.push(DumpClass {
                        name: class_name.clone(),
                        instances: Vec::new(),
                    });
                    self.classes.len() - 1
                }
            };
            let class = &mut self.classes[idx];

            for properties in group.classes {
                let Some(raw_id) = properties.get("ClassName").and_then(Value::as_str) else {
                    return Err(CatalogError::Shape {
                        file: file.to_path_buf(),
                        detail: format!("instance of {class_name} without ClassName"),
                    });
                };
                let instance = DumpInstance {
                    id: normalize(raw_id),
                    properties,
                };
                match class.instances.iter_mut().find(|i| i.id == instance.id) {
                    Some(existing) => *existing = instance,
                    None => class.instances.push(instance),
                }
            }
        }

        Ok(())
    }

    pub fn from_value(value: Value) -> Result<Self, CatalogError> {
        let mut dump = Self::default();
        dump.merge_value(Path::new("<memory>"), value)?;
        Ok(dump)
    }

    /// Load a single dump file, or every `*.json` file below a directory.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let mut dump = Self::default();
        for file in find_dump_files(path)? {
            let text = read_dump_text(&file)?;
            let value: Value = serde_json::from_str(&text).map_err(|source| CatalogError::Json {
                file: file.clone(),
                source,
            })?;
            dump.merge_value(&file, value)?;
            debug!(file = %file.display(), "merged dump file");
        }
        Ok(dump)
    }
}

/// Find dump files: the path itself, or all `*.json` files below it in path order.
pub fn find_dump_files(path: &Path) -> Result<Vec<PathBuf>, CatalogError> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| CatalogError::Io(e.into()))?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

/// Game dumps ship as UTF-16 LE with a byte order mark; accept that as well as UTF-8.
fn read_dump_text(file: &Path) -> Result<String, CatalogError> {
    let bytes = fs::read(file)?;
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16(&units).map_err(|e| CatalogError::Shape {
            file: file.to_path_buf(),
            detail: e.to_string(),
        });
    }
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes);
    String::from_utf8(bytes.to_vec()).map_err(|e| CatalogError::Shape {
        file: file.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Strip everything but ASCII letters and digits.
pub fn normalize(input: &str) -> String {
    input.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// Compiled patterns for property strings.
pub struct PropertyParser {
    group: Regex,
    item: Regex,
    amount: Regex,
    class_ref: Regex,
}

impl PropertyParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            // A parenthesized group with no nested parentheses
            group: Regex::new(r"\([^()]+\)")?,
            // Last dotted segment of the ItemClass path: Desc_OreIron_C
            item: Regex::new(r"ItemClass=[^,]*\.([A-Za-z0-9_]+)")?,
            amount: Regex::new(r"Amount=\s*(-?[0-9]*\.?[0-9]+(?:[eE][-+]?[0-9]+)?)")?,
            class_ref: Regex::new(r"\.([A-Za-z0-9_]+)")?,
        })
    }

    /// Parse every `(ItemClass=...,Amount=N)` group into a per-minute rate.
    ///
    /// A group missing either field fails the whole record. Zero amounts are dropped.
    pub fn item_rates(
        &self,
        record: &str,
        input: &str,
        seconds_per_cycle: f64,
    ) -> Result<Vec<ItemRate>, CatalogError> {
        let mut rates = Vec::new();
        for group in self.group.find_iter(input) {
            let group = group.as_str();
            let item = self
                .item
                .captures(group)
                .map(|cap| normalize(&cap[1]))
                .filter(|item| !item.is_empty())
                .ok_or_else(|| CatalogError::malformed(record, format!("no item in {group}")))?;
            let amount: f64 = self
                .amount
                .captures(group)
                .and_then(|cap| cap[1].parse().ok())
                .ok_or_else(|| CatalogError::malformed(record, format!("no amount in {group}")))?;

            if amount < 0.0 {
                return Err(CatalogError::malformed(
                    record,
                    format!("negative amount in {group}"),
                ));
            }
            if amount == 0.0 {
                continue;
            }

            rates.push(ItemRate {
                item,
                rate: amount * 60.0 / seconds_per_cycle,
            });
        }
        Ok(rates)
    }

    /// Normalized class references in a `mProducedIn`-style list, in order.
    pub fn class_refs(&self, input: &str) -> Vec<String> {
        input
            .split(',')
            .filter_map(|path| self.class_ref.captures_iter(path).last())
            .map(|cap| normalize(&cap[1]))
            .filter(|id| !id.is_empty())
            .collect()
    }
}

/// Items, recipes and counters extracted from a dump.
#[derive(Debug, Default)]
pub struct Extracted {
    pub items: Vec<Item>,
    pub recipes: Vec<Recipe>,
    pub stats: ExtractStats,
}

fn is_item_class(name: &str) -> bool {
    name.contains("Descriptor") || name.starts_with("FGAmmoType")
}

fn is_buildable_class(name: &str) -> bool {
    name.starts_with("FGBuildable")
}

fn display_name(instance: &DumpInstance) -> String {
    instance
        .text("mDisplayName")
        .filter(|name| !name.is_empty())
        .map_or_else(|| instance.id.clone(), str::to_string)
}

/// Derive items and recipes from a dump. Any malformed recipe aborts extraction.
pub fn extract(dump: &DataDump) -> Result<Extracted, CatalogError> {
    let parser = PropertyParser::new()
        .map_err(|e| CatalogError::malformed("<patterns>", e.to_string()))?;
    let mut out = Extracted::default();

    for class in dump.classes.iter().filter(|c| is_item_class(&c.name)) {
        for instance in &class.instances {
            if out.items.iter().any(|i| i.id == instance.id) {
                continue;
            }
            out.items.push(Item {
                id: instance.id.clone(),
                name: display_name(instance),
            });
        }
    }

    let buildables: Vec<&DumpInstance> = dump
        .classes
        .iter()
        .filter(|c| is_buildable_class(&c.name))
        .flat_map(|c| c.instances.iter())
        .collect();

    if let Some(recipes) = dump.class(RECIPE_CLASS) {
        for instance in &recipes.instances {
            let recipe = parse_recipe(&parser, instance, &buildables)?;
            if recipe.requires.is_empty() && recipe.produces.is_empty() {
                out.stats.empty += 1;
            }
            if recipe.produced_in.is_none() {
                out.stats.without_building += 1;
            }
            out.recipes.push(recipe);
        }
    }

    out.stats.items = out.items.len();
    out.stats.recipes = out.recipes.len();
    info!("{}", out.stats);
    Ok(out)
}

fn parse_recipe(
    parser: &PropertyParser,
    instance: &DumpInstance,
    buildables: &[&DumpInstance],
) -> Result<Recipe, CatalogError> {
    let id = &instance.id;
    let require = |key: &str| {
        instance
            .text(key)
            .ok_or_else(|| CatalogError::malformed(id, format!("missing {key}")))
    };

    let name = require("mDisplayName")?.to_string();
    let ingredients = require("mIngredients")?;
    let products = require("mProduct")?;
    let duration_text = require("mManufactoringDuration")?;
    let duration: f64 = duration_text
        .trim()
        .parse()
        .map_err(|_| CatalogError::malformed(id, format!("bad duration {duration_text:?}")))?;
    if !duration.is_finite() || duration <= 0.0 {
        return Err(CatalogError::malformed(
            id,
            format!("non-positive duration {duration}"),
        ));
    }

    let produced_in = instance
        .text("mProducedIn")
        .and_then(|text| produced_in(parser, text, buildables));

    Ok(Recipe {
        id: id.clone(),
        name,
        requires: parser.item_rates(id, ingredients, duration)?,
        produces: parser.item_rates(id, products, duration)?,
        produced_in,
    })
}

/// First referenced machine: a known buildable (by display name), else any `Build_` class.
fn produced_in(
    parser: &PropertyParser,
    text: &str,
    buildables: &[&DumpInstance],
) -> Option<String> {
    let refs = parser.class_refs(text);
    refs.iter()
        .find_map(|r| buildables.iter().find(|b| &b.id == r).map(|b| display_name(b)))
        .or_else(|| refs.into_iter().find(|r| r.starts_with("Build")))
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractStats {
    pub items: usize,
    pub recipes: usize,
    pub empty: usize,
    pub without_building: usize,
}

impl std::fmt::Display for ExtractStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Extracted {} items and {} recipes. Empty: {}, No building: {}",
            self.items, self.recipes, self.empty, self.without_building
        )
    }
}
