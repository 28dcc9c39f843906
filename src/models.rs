//! Data models for recipes, buildings and factories

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::port::{Direction, Port};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
}

/// An item flowing at a fixed rate, in units per minute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRate {
    pub item: String,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub requires: Vec<ItemRate>,
    pub produces: Vec<ItemRate>,
    #[serde(default)]
    pub produced_in: Option<String>, // None = not craftable in a machine
}

impl Recipe {
    /// Rates on one side of the recipe: requirements for inputs, products for outputs.
    pub fn rates(&self, direction: Direction) -> &[ItemRate] {
        match direction {
            Direction::Input => &self.requires,
            Direction::Output => &self.produces,
        }
    }

    pub fn rate(&self, direction: Direction, item: &str) -> Option<f64> {
        self.rates(direction)
            .iter()
            .find(|r| r.item == item)
            .map(|r| r.rate)
    }

    pub fn has_item(&self, direction: Direction, item: &str) -> bool {
        self.rates(direction).iter().any(|r| r.item == item)
    }

    /// True if the recipe runs in a building rather than by hand or build gun.
    pub fn is_machine_recipe(&self) -> bool {
        self.produced_in.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// A recipe instance with a (possibly fractional) number of parallel machines.
///
/// The recipe is stored by value so a factory snapshot can be evaluated
/// without a catalog at hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: String,
    pub count: f64,
    pub recipe: Recipe,
    #[serde(default)]
    pub position: Position,
}

impl Building {
    /// Effective rate for an item on one side: `count × rate`, zero if the recipe lacks it.
    pub fn throughput(&self, direction: Direction, item: &str) -> f64 {
        self.recipe
            .rate(direction, item)
            .map_or(0.0, |rate| self.count * rate)
    }

    /// Every port implied by the current recipe, inputs first.
    pub fn ports(&self) -> impl Iterator<Item = Port> + '_ {
        [Direction::Input, Direction::Output]
            .into_iter()
            .flat_map(move |direction| {
                self.recipe
                    .rates(direction)
                    .iter()
                    .map(move |r| Port::new(self.id.clone(), direction, r.item.clone()))
            })
    }

    pub fn has_port(&self, port: &Port) -> bool {
        port.building == self.id && self.recipe.has_item(port.direction, &port.item)
    }
}

/// A directed link from an output port to an input port for one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    pub source: Port,
    pub target: Port,
}

impl Connection {
    pub fn item(&self) -> &str {
        &self.source.item
    }

    pub fn touches(&self, building_id: &str) -> bool {
        self.source.building == building_id || self.target.building == building_id
    }
}

/// Last numbers handed out for generated building and connection ids.
///
/// Only ever increases, so an id freed by a removal is never issued again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdSequence {
    pub building: u64,
    pub connection: u64,
}

/// The unit of persistence and the snapshot the flow allocator runs on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Factory {
    pub id: String,
    pub name: String,
    pub buildings: Vec<Building>,
    pub connections: Vec<Connection>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(default)]
    pub issued_ids: IdSequence,
}

impl Factory {
    pub const DEFAULT_NAME: &'static str = "Untitled factory";

    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Self::DEFAULT_NAME.to_string(),
            buildings: Vec::new(),
            connections: Vec::new(),
            updated_at: now(),
            issued_ids: IdSequence::default(),
        }
    }

    pub fn building(&self, id: &str) -> Option<&Building> {
        self.buildings.iter().find(|b| b.id == id)
    }

    pub(crate) fn building_mut(&mut self, id: &str) -> Option<&mut Building> {
        self.buildings.iter_mut().find(|b| b.id == id)
    }

    pub fn connection(&self, id: &str) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == id)
    }

    /// True if the port is the source or target of at least one connection.
    pub fn is_connected(&self, port: &Port) -> bool {
        self.connections
            .iter()
            .any(|c| &c.source == port || &c.target == port)
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = now();
    }
}

/// Current time truncated to milliseconds, so snapshots survive an RFC 3339 round trip.
pub(crate) fn now() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_millisecond(now.millisecond()).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smelter() -> Recipe {
        Recipe {
            id: "RecipeIngotIronC".to_string(),
            name: "Iron Ingot".to_string(),
            requires: vec![ItemRate {
                item: "DescOreIronC".to_string(),
                rate: 30.0,
            }],
            produces: vec![ItemRate {
                item: "DescIronIngotC".to_string(),
                rate: 30.0,
            }],
            produced_in: Some("Smelter".to_string()),
        }
    }

    #[test]
    fn throughput_scales_with_count() {
        let building = Building {
            id: "b1".to_string(),
            count: 2.5,
            recipe: smelter(),
            position: Position::default(),
        };
        assert_eq!(building.throughput(Direction::Output, "DescIronIngotC"), 75.0);
        assert_eq!(building.throughput(Direction::Input, "DescIronIngotC"), 0.0);
    }

    #[test]
    fn ports_list_inputs_before_outputs() {
        let building = Building {
            id: "b1".to_string(),
            count: 1.0,
            recipe: smelter(),
            position: Position::default(),
        };
        let ports: Vec<Port> = building.ports().collect();
        assert_eq!(
            ports,
            vec![
                Port::input("b1", "DescOreIronC"),
                Port::output("b1", "DescIronIngotC"),
            ]
        );
    }

    #[test]
    fn new_factory_is_empty() {
        let factory = Factory::new("f1");
        assert_eq!(factory.name, Factory::DEFAULT_NAME);
        assert!(factory.buildings.is_empty());
        assert!(factory.connections.is_empty());
    }
}
