//! Built-in sample dump for trying the planner without game data

use serde_json::{Value, json};

use crate::catalog::Catalog;
use crate::error::CatalogError;
use crate::extract::{DataDump, ExtractStats};

const ITEM_CLASS: &str = "/Script/CoreUObject.Class'/Script/FactoryGame.FGItemDescriptor'";
const RESOURCE_CLASS: &str = "/Script/CoreUObject.Class'/Script/FactoryGame.FGResourceDescriptor'";
const MANUFACTURER_CLASS: &str =
    "/Script/CoreUObject.Class'/Script/FactoryGame.FGBuildableManufacturer'";
const RECIPE_CLASS: &str = "/Script/CoreUObject.Class'/Script/FactoryGame.FGRecipe'";

fn item_ref(path: &str, name: &str, amount: f64) -> String {
    format!(
        "(ItemClass=BlueprintGeneratedClass'\"/Game/FactoryGame/Resource/{path}/Desc_{name}.Desc_{name}_C\"',Amount={amount})"
    )
}

fn item_list(entries: &[(&str, &str, f64)]) -> String {
    let groups: Vec<String> = entries
        .iter()
        .map(|&(path, name, amount)| item_ref(path, name, amount))
        .collect();
    format!("({})", groups.join(","))
}

fn building_ref(name: &str) -> String {
    format!(
        "(\"/Game/FactoryGame/Buildable/Factory/{name}/Build_{name}.Build_{name}_C\")"
    )
}

fn recipe(
    class: &str,
    name: &str,
    ingredients: &[(&str, &str, f64)],
    products: &[(&str, &str, f64)],
    seconds: f64,
    machine: &str,
) -> Value {
    json!({
        "ClassName": format!("Recipe_{class}_C"),
        "mDisplayName": name,
        "mIngredients": item_list(ingredients),
        "mProduct": item_list(products),
        "mManufactoringDuration": format!("{seconds:.6}"),
        "mProducedIn": building_ref(machine),
    })
}

fn descriptor(name: &str, display: &str) -> Value {
    json!({ "ClassName": format!("Desc_{name}_C"), "mDisplayName": display })
}

/// A small slice of an iron and copper production chain in dump format.
pub fn sample_dump_value() -> Value {
    const ORE: &str = "RawResources/OreIron";
    const COPPER_ORE: &str = "RawResources/OreCopper";
    const LIMESTONE: &str = "RawResources/Stone";

    json!([
        {
            "NativeClass": RESOURCE_CLASS,
            "Classes": [
                descriptor("OreIron", "Iron Ore"),
                descriptor("OreCopper", "Copper Ore"),
                descriptor("Stone", "Limestone"),
            ]
        },
        {
            "NativeClass": ITEM_CLASS,
            "Classes": [
                descriptor("IronIngot", "Iron Ingot"),
                descriptor("IronPlate", "Iron Plate"),
                descriptor("IronRod", "Iron Rod"),
                descriptor("IronScrew", "Screw"),
                descriptor("IronPlateReinforced", "Reinforced Iron Plate"),
                descriptor("CopperIngot", "Copper Ingot"),
                descriptor("Wire", "Wire"),
                descriptor("Cable", "Cable"),
                descriptor("Cement", "Concrete"),
            ]
        },
        {
            "NativeClass": MANUFACTURER_CLASS,
            "Classes": [
                { "ClassName": "Build_SmelterMk1_C", "mDisplayName": "Smelter" },
                { "ClassName": "Build_ConstructorMk1_C", "mDisplayName": "Constructor" },
                { "ClassName": "Build_AssemblerMk1_C", "mDisplayName": "Assembler" },
            ]
        },
        {
            "NativeClass": RECIPE_CLASS,
            "Classes": [
                recipe("IngotIron", "Iron Ingot", &[(ORE, "OreIron", 1.0)], &[("Parts/IronIngot", "IronIngot", 1.0)], 2.0, "SmelterMk1"),
                recipe("IronPlate", "Iron Plate", &[("Parts/IronIngot", "IronIngot", 3.0)], &[("Parts/IronPlate", "IronPlate", 2.0)], 6.0, "ConstructorMk1"),
                recipe("IronRod", "Iron Rod", &[("Parts/IronIngot", "IronIngot", 1.0)], &[("Parts/IronRod", "IronRod", 1.0)], 4.0, "ConstructorMk1"),
                recipe("Screw", "Screw", &[("Parts/IronRod", "IronRod", 1.0)], &[("Parts/IronScrew", "IronScrew", 4.0)], 6.0, "ConstructorMk1"),
                recipe("IronPlateReinforced", "Reinforced Iron Plate", &[("Parts/IronPlate", "IronPlate", 6.0), ("Parts/IronScrew", "IronScrew", 12.0)], &[("Parts/IronPlateReinforced", "IronPlateReinforced", 1.0)], 12.0, "AssemblerMk1"),
                recipe("IngotCopper", "Copper Ingot", &[(COPPER_ORE, "OreCopper", 1.0)], &[("Parts/CopperIngot", "CopperIngot", 1.0)], 2.0, "SmelterMk1"),
                recipe("Wire", "Wire", &[("Parts/CopperIngot", "CopperIngot", 1.0)], &[("Parts/Wire", "Wire", 2.0)], 4.0, "ConstructorMk1"),
                recipe("Cable", "Cable", &[("Parts/Wire", "Wire", 2.0)], &[("Parts/Cable", "Cable", 1.0)], 2.0, "ConstructorMk1"),
                recipe("Concrete", "Concrete", &[(LIMESTONE, "Stone", 3.0)], &[("Parts/Cement", "Cement", 1.0)], 4.0, "ConstructorMk1"),
                {
                    "ClassName": "Recipe_IronPlate_Handcraft_C",
                    "mDisplayName": "Iron Plate (hand)",
                    "mIngredients": item_list(&[("Parts/IronIngot", "IronIngot", 3.0)]),
                    "mProduct": item_list(&[("Parts/IronPlate", "IronPlate", 2.0)]),
                    "mManufactoringDuration": "6.000000",
                    "mProducedIn": "(\"/Script/FactoryGame.FGWorkBench\")"
                },
            ]
        }
    ])
}

pub fn sample_dump() -> Result<DataDump, CatalogError> {
    DataDump::from_value(sample_dump_value())
}

pub fn sample_catalog() -> Result<(Catalog, ExtractStats), CatalogError> {
    Catalog::from_dump(&sample_dump()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_catalog_derives_rates() {
        let (catalog, stats) = sample_catalog().unwrap();
        assert_eq!(stats.recipes, 10);
        assert_eq!(stats.without_building, 1);

        let plate = catalog.recipe("RecipeIronPlateC").unwrap();
        assert_eq!(plate.requires[0].item, "DescIronIngotC");
        assert_eq!(plate.requires[0].rate, 30.0);
        assert_eq!(plate.produces[0].rate, 20.0);
        assert_eq!(plate.produced_in.as_deref(), Some("Constructor"));

        let reinforced = catalog.recipe("RecipeIronPlateReinforcedC").unwrap();
        assert_eq!(reinforced.requires.len(), 2);
        assert_eq!(reinforced.produces[0].rate, 5.0);

        assert_eq!(catalog.display_name("DescIronScrewC"), "Screw");
    }
}
