//! Read-only item and recipe dictionaries
//!
//! Built once at startup and shared by reference (usually through an `Arc`)
//! with the matcher, the mutation engine and the report.

use std::collections::HashMap;
use std::path::Path;

use crate::error::CatalogError;
use crate::extract::{self, DataDump, ExtractStats};
use crate::models::{Item, Recipe};
use crate::port::Direction;

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<Item>,
    recipes: Vec<Recipe>,
    item_index: HashMap<String, usize>,
    recipe_index: HashMap<String, usize>,
}

impl Catalog {
    /// Later duplicates of an id replace earlier ones but keep the first position.
    pub fn new(items: Vec<Item>, recipes: Vec<Recipe>) -> Self {
        let mut catalog = Self::default();
        for item in items {
            match catalog.item_index.get(&item.id) {
                Some(&idx) => catalog.items[idx] = item,
                None => {
                    catalog.item_index.insert(item.id.clone(), catalog.items.len());
                    catalog.items.push(item);
                }
            }
        }
        for recipe in recipes {
            match catalog.recipe_index.get(&recipe.id) {
                Some(&idx) => catalog.recipes[idx] = recipe,
                None => {
                    catalog
                        .recipe_index
                        .insert(recipe.id.clone(), catalog.recipes.len());
                    catalog.recipes.push(recipe);
                }
            }
        }
        catalog
    }

    pub fn from_dump(dump: &DataDump) -> Result<(Self, ExtractStats), CatalogError> {
        let extracted = extract::extract(dump)?;
        Ok((
            Self::new(extracted.items, extracted.recipes),
            extracted.stats,
        ))
    }

    pub fn load(path: &Path) -> Result<(Self, ExtractStats), CatalogError> {
        Self::from_dump(&DataDump::load(path)?)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.item_index.get(id).map(|&idx| &self.items[idx])
    }

    /// Human label for an item, or the raw id when the catalog does not know it.
    pub fn display_name<'a>(&'a self, item_id: &'a str) -> &'a str {
        self.item(item_id).map_or(item_id, |item| item.name.as_str())
    }

    /// All recipes in catalog order.
    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn recipe(&self, id: &str) -> Option<&Recipe> {
        self.recipe_index.get(id).map(|&idx| &self.recipes[idx])
    }

    /// Recipes listing the item on the given side, in catalog order.
    pub fn recipes_with<'a>(
        &'a self,
        direction: Direction,
        item_id: &'a str,
    ) -> impl Iterator<Item = &'a Recipe> + 'a {
        self.recipes
            .iter()
            .filter(move |r| r.has_item(direction, item_id))
    }

    pub fn producers_of<'a>(&'a self, item_id: &'a str) -> impl Iterator<Item = &'a Recipe> + 'a {
        self.recipes_with(Direction::Output, item_id)
    }

    pub fn consumers_of<'a>(&'a self, item_id: &'a str) -> impl Iterator<Item = &'a Recipe> + 'a {
        self.recipes_with(Direction::Input, item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemRate;

    fn recipe(id: &str, requires: &[&str], produces: &[&str]) -> Recipe {
        let rates = |items: &[&str]| {
            items
                .iter()
                .map(|item| ItemRate {
                    item: item.to_string(),
                    rate: 10.0,
                })
                .collect()
        };
        Recipe {
            id: id.to_string(),
            name: id.to_string(),
            requires: rates(requires),
            produces: rates(produces),
            produced_in: Some("Constructor".to_string()),
        }
    }

    fn catalog() -> Catalog {
        Catalog::new(
            vec![Item {
                id: "IronPlate".to_string(),
                name: "Iron Plate".to_string(),
            }],
            vec![
                recipe("Plate", &["IronIngot"], &["IronPlate"]),
                recipe("Rod", &["IronIngot"], &["IronRod"]),
                recipe("Screw", &["IronRod"], &["Screw"]),
            ],
        )
    }

    #[test]
    fn display_name_falls_back_to_id() {
        let catalog = catalog();
        assert_eq!(catalog.display_name("IronPlate"), "Iron Plate");
        assert_eq!(catalog.display_name("Mystery"), "Mystery");
    }

    #[test]
    fn recipes_keep_catalog_order() {
        let binding = catalog();
        let ids: Vec<&str> = binding.recipes().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["Plate", "Rod", "Screw"]);
    }

    #[test]
    fn recipe_lookup() {
        let catalog = catalog();
        assert_eq!(catalog.recipe("Rod").unwrap().produces[0].item, "IronRod");
        assert!(catalog.recipe("Nope").is_none());
    }

    #[test]
    fn producers_and_consumers() {
        let catalog = catalog();
        let consumers: Vec<&str> = catalog
            .consumers_of("IronIngot")
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(consumers, vec!["Plate", "Rod"]);
        assert_eq!(catalog.producers_of("Screw").count(), 1);
    }

    #[test]
    fn duplicate_recipe_ids_keep_first_position() {
        let catalog = Catalog::new(
            Vec::new(),
            vec![
                recipe("A", &[], &["X"]),
                recipe("B", &[], &["Y"]),
                recipe("A", &[], &["Z"]),
            ],
        );
        assert_eq!(catalog.recipes().len(), 2);
        assert_eq!(catalog.recipes()[0].produces[0].item, "Z");
    }
}
