//! Factory graph mutations
//!
//! Every operation takes the current snapshot and returns a new one; the
//! input is never modified, so a rejected edit leaves the caller's factory
//! exactly as it was.

use tracing::debug;

use crate::catalog::Catalog;
use crate::config::PlannerConfig;
use crate::error::FactoryError;
use crate::matcher;
use crate::models::{Building, Connection, Factory, Position, Recipe};
use crate::port::{Direction, Port};

/// Next `<prefix>-N` above the last issued number that is not already taken.
/// Advances `last` past the returned number.
fn next_id(prefix: &str, last: &mut u64, taken: impl Fn(&str) -> bool) -> String {
    loop {
        *last += 1;
        let id = format!("{prefix}-{last}");
        if !taken(&id) {
            return id;
        }
    }
}

fn validate_count(count: f64) -> Result<f64, FactoryError> {
    if count.is_finite() && count > 0.0 {
        Ok(count)
    } else {
        Err(FactoryError::InvalidCount(count))
    }
}

fn require_building<'a>(factory: &'a Factory, id: &str) -> Result<&'a Building, FactoryError> {
    factory
        .building(id)
        .ok_or_else(|| FactoryError::UnknownBuilding(id.to_string()))
}

/// Add a building running `recipe`. Without a position it is placed diagonally
/// below the last building.
pub fn add_building(
    factory: &Factory,
    recipe: &Recipe,
    position: Option<Position>,
    count: f64,
    config: &PlannerConfig,
) -> Result<(Factory, String), FactoryError> {
    let count = validate_count(count)?;
    let position = position.unwrap_or_else(|| {
        factory.buildings.last().map_or_else(Position::default, |last| {
            last.position.offset(config.add_offset_x, config.add_offset_y)
        })
    });

    let mut next = factory.clone();
    let id = next_id("building", &mut next.issued_ids.building, |id| {
        factory.building(id).is_some()
    });

    next.buildings.push(Building {
        id: id.clone(),
        count,
        recipe: recipe.clone(),
        position,
    });
    next.touch();

    debug!(factory = %factory.id, building = %id, recipe = %recipe.id, "added building");
    Ok((next, id))
}

pub fn set_building_count(
    factory: &Factory,
    building_id: &str,
    count: f64,
) -> Result<Factory, FactoryError> {
    require_building(factory, building_id)?;
    let count = validate_count(count)?;

    let mut next = factory.clone();
    if let Some(building) = next.building_mut(building_id) {
        building.count = count;
    }
    next.touch();
    Ok(next)
}

/// Swap a building's recipe and drop every connection whose item the new
/// recipe no longer carries on that side.
pub fn set_recipe(
    factory: &Factory,
    building_id: &str,
    recipe_id: &str,
    catalog: &Catalog,
) -> Result<Factory, FactoryError> {
    require_building(factory, building_id)?;
    let recipe = catalog
        .recipe(recipe_id)
        .ok_or_else(|| FactoryError::UnknownRecipe(recipe_id.to_string()))?;

    let still_valid = |port: &Port| {
        port.building != building_id || recipe.has_item(port.direction, &port.item)
    };

    let mut next = factory.clone();
    let before = next.connections.len();
    next.connections
        .retain(|c| still_valid(&c.source) && still_valid(&c.target));
    if let Some(building) = next.building_mut(building_id) {
        building.recipe = recipe.clone();
    }
    next.touch();

    debug!(
        building = building_id,
        recipe = recipe_id,
        removed = before - next.connections.len(),
        "changed recipe"
    );
    Ok(next)
}

/// Link an output port to an input port for the same item. Parallel links
/// between the same ports are allowed.
pub fn connect(
    factory: &Factory,
    source: Port,
    target: Port,
) -> Result<(Factory, String), FactoryError> {
    if source.direction != Direction::Output || target.direction != Direction::Input {
        return Err(FactoryError::InvalidDirection {
            from: source,
            to: target,
        });
    }
    if source.item != target.item {
        return Err(FactoryError::ItemMismatch {
            source_item: source.item,
            target_item: target.item,
        });
    }
    for port in [&source, &target] {
        if !require_building(factory, &port.building)?.has_port(port) {
            return Err(FactoryError::UnknownPort(port.clone()));
        }
    }

    let mut next = factory.clone();
    let id = next_id("connection", &mut next.issued_ids.connection, |id| {
        factory.connection(id).is_some()
    });

    debug!(connection = %id, %source, %target, "connected");
    next.connections.push(Connection {
        id: id.clone(),
        source,
        target,
    });
    next.touch();
    Ok((next, id))
}

/// Remove a connection. Unknown ids are ignored so replayed events are harmless.
pub fn disconnect(factory: &Factory, connection_id: &str) -> Factory {
    if factory.connection(connection_id).is_none() {
        return factory.clone();
    }
    let mut next = factory.clone();
    next.connections.retain(|c| c.id != connection_id);
    next.touch();
    next
}

/// Remove a building together with every connection touching it.
pub fn remove_building(factory: &Factory, building_id: &str) -> Result<Factory, FactoryError> {
    require_building(factory, building_id)?;
    let mut next = factory.clone();
    next.buildings.retain(|b| b.id != building_id);
    next.connections.retain(|c| !c.touches(building_id));
    next.touch();
    Ok(next)
}

pub fn move_building(
    factory: &Factory,
    building_id: &str,
    position: Position,
) -> Result<Factory, FactoryError> {
    require_building(factory, building_id)?;
    let mut next = factory.clone();
    if let Some(building) = next.building_mut(building_id) {
        building.position = position;
    }
    next.touch();
    Ok(next)
}

pub fn rename(factory: &Factory, name: &str) -> Factory {
    let mut next = factory.clone();
    next.name = name.to_string();
    next.touch();
    next
}

/// Turn a connection dragged from `dragged` into empty space into a new
/// building plus one connection.
///
/// The new building gets the matcher's pick for the dragged item and sits at
/// the cursor; when dragging from an input it is shifted left by one node
/// width so its output faces the port. Returns `None`, leaving the factory
/// untouched, when the port does not exist, its building's recipe is not a
/// valid machine recipe, or no recipe carries the item.
pub fn auto_extend(
    factory: &Factory,
    dragged: &Port,
    cursor: Position,
    catalog: &Catalog,
    config: &PlannerConfig,
) -> Option<(Factory, String)> {
    let origin = factory.building(&dragged.building)?;
    if !origin.has_port(dragged) {
        debug!(port = %dragged, "dragged port does not exist");
        return None;
    }
    if !matcher::is_valid(&origin.recipe) {
        debug!(port = %dragged, recipe = %origin.recipe.id, "dragged from an invalid recipe");
        return None;
    }

    let desired_are_outputs = dragged.direction == Direction::Output;
    let recipe = matcher::best_recipe(
        catalog,
        origin.recipe.rates(dragged.direction),
        desired_are_outputs,
        &dragged.item,
        &config.fallback_recipe,
    )?;

    let side = dragged.direction.opposite();
    if !recipe.has_item(side, &dragged.item) {
        debug!(port = %dragged, recipe = %recipe.id, "no recipe carries the dragged item");
        return None;
    }

    let position = match dragged.direction {
        Direction::Output => cursor,
        Direction::Input => cursor.offset(-config.node_width, 0.0),
    };
    let (next, id) = add_building(factory, recipe, Some(position), 1.0, config).ok()?;

    let fresh = Port::new(id.clone(), side, dragged.item.clone());
    let (source, target) = match dragged.direction {
        Direction::Output => (dragged.clone(), fresh),
        Direction::Input => (fresh, dragged.clone()),
    };
    let (next, _) = connect(&next, source, target).ok()?;
    Some((next, id))
}
