//! Per-port flow report for a factory

use crate::allocator::{self, UnconnectedTotal};
use crate::catalog::Catalog;
use crate::config::ResidualPolicy;
use crate::models::Factory;
use crate::port::{self, Direction, Port};

/// One recipe port with its nominal and allocated rate.
#[derive(Debug, Clone, PartialEq)]
pub struct PortLine {
    pub port: Port,
    pub item_name: String,
    /// `count × rate` from the recipe.
    pub nominal: f64,
    /// Delivered (inputs) or claimed (outputs) amount.
    pub flow: f64,
    pub connected: bool,
}

impl PortLine {
    /// Positive when an input is short of supply or an output is not fully used.
    pub fn imbalance(&self) -> f64 {
        self.nominal - self.flow
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildingLine {
    pub id: String,
    pub recipe_name: String,
    pub produced_in: Option<String>,
    pub count: f64,
    pub ports: Vec<PortLine>,
}

/// Summary of a factory's allocation
#[derive(Debug, Clone, PartialEq)]
pub struct FactoryReport {
    pub name: String,
    pub buildings: Vec<BuildingLine>,
    pub unconnected: Vec<(String, UnconnectedTotal)>,
}

/// Generate a report of every building's ports and the unconnected totals
pub fn summarize_factory(
    factory: &Factory,
    catalog: &Catalog,
    policy: ResidualPolicy,
) -> FactoryReport {
    let allocation = allocator::allocate(factory, policy);

    let buildings = factory
        .buildings
        .iter()
        .map(|building| BuildingLine {
            id: building.id.clone(),
            recipe_name: building.recipe.name.clone(),
            produced_in: building.recipe.produced_in.clone(),
            count: building.count,
            ports: building
                .ports()
                .map(|port| PortLine {
                    item_name: catalog.display_name(&port.item).to_string(),
                    nominal: building.throughput(port.direction, &port.item),
                    flow: allocation.flow(&port),
                    connected: factory.is_connected(&port),
                    port,
                })
                .collect(),
        })
        .collect();

    let unconnected = allocator::aggregate_unconnected(factory, catalog)
        .into_iter()
        .map(|total| (catalog.display_name(&total.item).to_string(), total))
        .collect();

    FactoryReport {
        name: factory.name.clone(),
        buildings,
        unconnected,
    }
}

impl std::fmt::Display for FactoryReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== {} ===", self.name)?;

        for building in &self.buildings {
            writeln!(f)?;
            match &building.produced_in {
                Some(machine) => writeln!(
                    f,
                    "{:.2}x {} in {} [{}]",
                    building.count, building.recipe_name, machine, building.id
                )?,
                None => writeln!(
                    f,
                    "{:.2}x {} [{}]",
                    building.count, building.recipe_name, building.id
                )?,
            }

            for line in &building.ports {
                let arrow = match line.port.direction {
                    Direction::Input => "<-",
                    Direction::Output => "->",
                };
                let status = if !line.connected {
                    "unconnected".to_string()
                } else if line.imbalance() > 1e-9 {
                    format!("{:.2} /min short", line.imbalance())
                } else if line.imbalance() < -1e-9 {
                    format!("{:.2} /min over", -line.imbalance())
                } else {
                    "ok".to_string()
                };
                writeln!(
                    f,
                    "  {} {:<28} {:>8.2} / {:>8.2} /min  {:<20} {}",
                    arrow,
                    line.item_name,
                    line.flow,
                    line.nominal,
                    status,
                    port::encode(&line.port)
                )?;
            }
        }

        if !self.unconnected.is_empty() {
            writeln!(f)?;
            writeln!(f, "Unconnected:")?;
            for (name, total) in &self.unconnected {
                let side = if total.direction.is_input() {
                    "needs"
                } else {
                    "makes"
                };
                writeln!(f, "  {} {} @ {:.2} /min", side, name, total.amount)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn report_marks_shortfalls_and_unconnected_ports() {
        let catalog = iron_catalog();
        let factory = factory(
            vec![
                building("S", 0.5, catalog.recipe("RecipeIngotIron").unwrap().clone()),
                building("P", 1.0, catalog.recipe("RecipeIronPlateC").unwrap().clone()),
            ],
            vec![link("c1", "S", "P", "IronIngot")],
        );
        let report = summarize_factory(&factory, &catalog, ResidualPolicy::default());

        let plate_input = &report.buildings[1].ports[0];
        assert_eq!(plate_input.flow, 15.0);
        assert_eq!(plate_input.imbalance(), 15.0);

        let names: Vec<&str> = report.unconnected.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Iron Ore", "Iron Plate"]);

        let text = report.to_string();
        assert!(text.contains("15.00 /min short"));
        assert!(text.contains("needs Iron Ore @ 15.00 /min"));
        assert!(text.contains("makes Iron Plate @ 20.00 /min"));
    }
}
