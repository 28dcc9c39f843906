//! Flow allocation over a factory snapshot
//!
//! Producers are served in building order and each producer walks its
//! outgoing connections in connection order, handing every consumer as much
//! as it still needs (first fit). Results therefore depend on the order of
//! both lists.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::debug;

use crate::catalog::Catalog;
use crate::config::ResidualPolicy;
use crate::models::Factory;
use crate::port::{Direction, Port};

/// Result of one allocation pass.
#[derive(Debug, Clone, Default)]
pub struct Allocation {
    /// Indexed like `Factory::connections`.
    connections: Vec<f64>,
    inbound: HashMap<Port, f64>,
    outbound: HashMap<Port, f64>,
    surplus: HashMap<Port, f64>,
}

impl Allocation {
    /// Delivered amount for an input port, claimed amount for an output port.
    pub fn flow(&self, port: &Port) -> f64 {
        let map = match port.direction {
            Direction::Input => &self.inbound,
            Direction::Output => &self.outbound,
        };
        map.get(port).copied().unwrap_or(0.0)
    }

    /// Amount carried by the connection at `index` in the factory's list.
    pub fn connection(&self, index: usize) -> f64 {
        self.connections.get(index).copied().unwrap_or(0.0)
    }

    pub fn connections(&self) -> &[f64] {
        &self.connections
    }

    /// Producer output nobody claimed. Always zero for producers with a
    /// connection under [`ResidualPolicy::DumpOnLastConsumer`].
    pub fn surplus(&self, port: &Port) -> f64 {
        self.surplus.get(port).copied().unwrap_or(0.0)
    }
}

/// Run the greedy first-fit pass over the whole factory.
pub fn allocate(factory: &Factory, policy: ResidualPolicy) -> Allocation {
    let mut alloc = Allocation {
        connections: vec![0.0; factory.connections.len()],
        ..Allocation::default()
    };

    for producer in &factory.buildings {
        for produced in &producer.recipe.produces {
            let item = produced.item.as_str();
            let port = Port::output(producer.id.clone(), item);
            let total = producer.count * produced.rate;
            let mut available = total;
            let mut last: Option<usize> = None;

            for (idx, conn) in factory.connections.iter().enumerate() {
                if conn.source != port
                    || conn.target.direction != Direction::Input
                    || conn.target.item != item
                {
                    continue;
                }
                let Some(target) = factory.building(&conn.target.building) else {
                    continue;
                };

                let wanted = target.throughput(Direction::Input, item);
                let received = alloc.inbound.entry(conn.target.clone()).or_default();
                let amount = (wanted - *received).max(0.0).min(available);
                *received += amount;
                available -= amount;
                alloc.connections[idx] += amount;
                last = Some(idx);
            }

            if let (ResidualPolicy::DumpOnLastConsumer, Some(idx)) = (policy, last) {
                if available > 0.0 {
                    let target = factory.connections[idx].target.clone();
                    *alloc.inbound.entry(target).or_default() += available;
                    alloc.connections[idx] += available;
                    available = 0.0;
                }
            }

            *alloc.outbound.entry(port.clone()).or_default() += total - available;
            if available > 0.0 {
                *alloc.surplus.entry(port).or_default() += available;
            }
        }
    }

    debug!(
        factory = %factory.id,
        connections = factory.connections.len(),
        "allocated flows"
    );
    alloc
}

/// Flow through a single port. See [`Allocation::flow`].
pub fn available_flow(factory: &Factory, port: &Port, policy: ResidualPolicy) -> f64 {
    allocate(factory, policy).flow(port)
}

/// Every recipe port that is neither the source nor the target of a connection.
///
/// Ordered by building, inputs before outputs, then recipe order.
pub fn unconnected_ports(factory: &Factory) -> Vec<Port> {
    let mut ports: Vec<Port> = Vec::new();
    for building in &factory.buildings {
        for port in building.ports() {
            if !factory.is_connected(&port) && !ports.contains(&port) {
                ports.push(port);
            }
        }
    }
    ports
}

/// Total required or produced amount over unconnected ports for one item and side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnconnectedTotal {
    pub item: String,
    pub direction: Direction,
    pub amount: f64,
}

/// Sum unconnected port amounts by (item, direction): inputs first, then by display name.
pub fn aggregate_unconnected(factory: &Factory, catalog: &Catalog) -> Vec<UnconnectedTotal> {
    let mut totals: BTreeMap<(Direction, String), f64> = BTreeMap::new();
    for port in unconnected_ports(factory) {
        let Some(building) = factory.building(&port.building) else {
            continue;
        };
        let amount = building.throughput(port.direction, &port.item);
        *totals.entry((port.direction, port.item)).or_default() += amount;
    }

    let mut totals: Vec<UnconnectedTotal> = totals
        .into_iter()
        .map(|((direction, item), amount)| UnconnectedTotal {
            item,
            direction,
            amount,
        })
        .collect();
    totals.sort_by(|a, b| {
        a.direction
            .cmp(&b.direction)
            .then_with(|| catalog.display_name(&a.item).cmp(catalog.display_name(&b.item)))
            .then_with(|| a.item.cmp(&b.item))
    });
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    /// A makes 2 iron per machine; B and C each need 3.
    fn fan_out(producer_count: f64) -> Factory {
        factory(
            vec![
                building("A", producer_count, recipe("Mine", &[], &[("Iron", 2.0)])),
                building("B", 1.0, recipe("Plate", &[("Iron", 3.0)], &[("Plate", 1.0)])),
                building("C", 1.0, recipe("Plate", &[("Iron", 3.0)], &[("Plate", 1.0)])),
            ],
            vec![link("ab", "A", "B", "Iron"), link("ac", "A", "C", "Iron")],
        )
    }

    #[test]
    fn first_consumer_claims_everything_it_can() {
        let factory = fan_out(1.0);
        let policy = ResidualPolicy::DumpOnLastConsumer;
        assert_eq!(available_flow(&factory, &Port::input("B", "Iron"), policy), 2.0);
        assert_eq!(available_flow(&factory, &Port::input("C", "Iron"), policy), 0.0);
        assert_eq!(available_flow(&factory, &Port::output("A", "Iron"), policy), 2.0);
    }

    #[test]
    fn second_consumer_gets_the_remainder() {
        let factory = fan_out(2.0);
        let alloc = allocate(&factory, ResidualPolicy::DumpOnLastConsumer);
        assert_eq!(alloc.flow(&Port::input("B", "Iron")), 3.0);
        assert_eq!(alloc.flow(&Port::input("C", "Iron")), 1.0);
        assert_eq!(alloc.connections(), &[3.0, 1.0]);
    }

    #[test]
    fn connection_order_decides_who_is_served() {
        let mut factory = fan_out(1.0);
        factory.connections.reverse();
        let alloc = allocate(&factory, ResidualPolicy::DumpOnLastConsumer);
        assert_eq!(alloc.flow(&Port::input("B", "Iron")), 0.0);
        assert_eq!(alloc.flow(&Port::input("C", "Iron")), 2.0);
    }

    #[test]
    fn leftover_is_dumped_on_last_consumer() {
        // 8 iron for two consumers needing 3 each: C ends up with 5.
        let factory = fan_out(4.0);
        let alloc = allocate(&factory, ResidualPolicy::DumpOnLastConsumer);
        assert_eq!(alloc.flow(&Port::input("B", "Iron")), 3.0);
        assert_eq!(alloc.flow(&Port::input("C", "Iron")), 5.0);
        assert_eq!(alloc.flow(&Port::output("A", "Iron")), 8.0);
        assert_eq!(alloc.surplus(&Port::output("A", "Iron")), 0.0);
    }

    #[test]
    fn leftover_can_be_reported_as_surplus() {
        let factory = fan_out(4.0);
        let alloc = allocate(&factory, ResidualPolicy::ReportSurplus);
        assert_eq!(alloc.flow(&Port::input("C", "Iron")), 3.0);
        assert_eq!(alloc.flow(&Port::output("A", "Iron")), 6.0);
        assert_eq!(alloc.surplus(&Port::output("A", "Iron")), 2.0);
    }

    #[test]
    fn producers_share_a_consumer_in_building_order() {
        let factory = factory(
            vec![
                building("M1", 1.0, recipe("Mine", &[], &[("Iron", 2.0)])),
                building("M2", 1.0, recipe("Mine", &[], &[("Iron", 2.0)])),
                building("S", 1.0, recipe("Smelt", &[("Iron", 3.0)], &[])),
            ],
            vec![link("c2", "M2", "S", "Iron"), link("c1", "M1", "S", "Iron")],
        );
        let alloc = allocate(&factory, ResidualPolicy::ReportSurplus);
        // M1 comes first in the building list even though its link is listed second.
        assert_eq!(alloc.connections(), &[1.0, 2.0]);
        assert_eq!(alloc.flow(&Port::input("S", "Iron")), 3.0);
        assert_eq!(alloc.surplus(&Port::output("M2", "Iron")), 1.0);
    }

    #[test]
    fn unconnected_input_receives_nothing() {
        let factory = fan_out(1.0);
        assert_eq!(
            available_flow(&factory, &Port::input("B", "Copper"), ResidualPolicy::default()),
            0.0
        );
    }

    #[test]
    fn dangling_connections_are_ignored() {
        let factory = factory(
            vec![building("A", 1.0, recipe("Mine", &[], &[("Iron", 2.0)]))],
            vec![link("ghost", "A", "Gone", "Iron")],
        );
        let alloc = allocate(&factory, ResidualPolicy::DumpOnLastConsumer);
        assert_eq!(alloc.connection(0), 0.0);
        assert_eq!(alloc.surplus(&Port::output("A", "Iron")), 2.0);
    }

    #[test]
    fn unconnected_ports_skip_linked_ones() {
        let factory = fan_out(1.0);
        assert_eq!(
            unconnected_ports(&factory),
            vec![Port::output("B", "Plate"), Port::output("C", "Plate")]
        );
    }

    #[test]
    fn aggregate_groups_and_sorts() {
        let smelt = recipe("Smelt", &[("Zinc", 1.0), ("Coal", 1.5)], &[("Alloy", 4.0)]);
        let factory = factory(
            vec![
                building("S", 2.0, smelt.clone()),
                building("T", 1.0, smelt),
            ],
            Vec::new(),
        );
        let catalog = catalog_with_items(&[("Zinc", "A zinc"), ("Coal", "Coal")]);
        let totals = aggregate_unconnected(&factory, &catalog);
        let summary: Vec<(&str, Direction, f64)> = totals
            .iter()
            .map(|t| (t.item.as_str(), t.direction, t.amount))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Zinc", Direction::Input, 3.0),
                ("Coal", Direction::Input, 4.5),
                ("Alloy", Direction::Output, 12.0),
            ]
        );
    }
}
