//! Builders for tests: small recipes, buildings and factories without a data dump.

use crate::catalog::Catalog;
use crate::models::{Building, Connection, Factory, Item, ItemRate, Position, Recipe};
use crate::port::Port;

fn rates(items: &[(&str, f64)]) -> Vec<ItemRate> {
    items
        .iter()
        .map(|&(item, rate)| ItemRate {
            item: item.to_string(),
            rate,
        })
        .collect()
}

/// A machine recipe (produced in a "Constructor").
pub fn recipe(id: &str, requires: &[(&str, f64)], produces: &[(&str, f64)]) -> Recipe {
    Recipe {
        id: id.to_string(),
        name: id.to_string(),
        requires: rates(requires),
        produces: rates(produces),
        produced_in: Some("Constructor".to_string()),
    }
}

/// A recipe without a production location (build gun, workbench).
pub fn hand_recipe(id: &str, requires: &[(&str, f64)], produces: &[(&str, f64)]) -> Recipe {
    Recipe {
        produced_in: None,
        ..recipe(id, requires, produces)
    }
}

pub fn building(id: &str, count: f64, recipe: Recipe) -> Building {
    Building {
        id: id.to_string(),
        count,
        recipe,
        position: Position::default(),
    }
}

/// Connection from `from`'s output port to `to`'s input port for `item`.
pub fn link(id: &str, from: &str, to: &str, item: &str) -> Connection {
    Connection {
        id: id.to_string(),
        source: Port::output(from, item),
        target: Port::input(to, item),
    }
}

pub fn factory(buildings: Vec<Building>, connections: Vec<Connection>) -> Factory {
    Factory {
        buildings,
        connections,
        ..Factory::new("test-factory")
    }
}

pub fn catalog_with_items(items: &[(&str, &str)]) -> Catalog {
    Catalog::new(
        items
            .iter()
            .map(|&(id, name)| Item {
                id: id.to_string(),
                name: name.to_string(),
            })
            .collect(),
        Vec::new(),
    )
}

/// Small iron production chain: ore → ingot → plate / rod → screw.
pub fn iron_catalog() -> Catalog {
    Catalog::new(
        [
            ("OreIron", "Iron Ore"),
            ("IronIngot", "Iron Ingot"),
            ("IronPlate", "Iron Plate"),
            ("IronRod", "Iron Rod"),
            ("Screw", "Screw"),
            ("ReinforcedPlate", "Reinforced Iron Plate"),
        ]
        .into_iter()
        .map(|(id, name)| Item {
            id: id.to_string(),
            name: name.to_string(),
        })
        .collect(),
        vec![
            hand_recipe("RecipeIronPlateHand", &[("IronIngot", 3.0)], &[("IronPlate", 2.0)]),
            recipe("RecipeIngotIron", &[("OreIron", 30.0)], &[("IronIngot", 30.0)]),
            recipe("RecipeIronPlateC", &[("IronIngot", 30.0)], &[("IronPlate", 20.0)]),
            recipe("RecipeIronRod", &[("IronIngot", 15.0)], &[("IronRod", 15.0)]),
            recipe("RecipeScrew", &[("IronRod", 10.0)], &[("Screw", 40.0)]),
            recipe(
                "RecipeReinforcedPlate",
                &[("IronPlate", 30.0), ("Screw", 60.0)],
                &[("ReinforcedPlate", 5.0)],
            ),
        ],
    )
}
