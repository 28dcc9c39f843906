//! Recipe matching for auto-filled buildings
//!
//! A left fold over the catalog with a pairwise preference, seeded with a
//! fallback recipe. Cheap and explainable rather than optimal.

use crate::catalog::Catalog;
use crate::models::{ItemRate, Recipe};
use crate::port::Direction;

/// Which side of a candidate is compared against the desired rates.
///
/// Rates taken from a building's outputs are matched against the candidate's
/// inputs, and the other way round.
fn relevant_side(desired_are_outputs: bool) -> Direction {
    if desired_are_outputs {
        Direction::Input
    } else {
        Direction::Output
    }
}

/// Recipes without a machine or without any rates rank below every valid one.
pub(crate) fn is_valid(recipe: &Recipe) -> bool {
    recipe.is_machine_recipe() && !(recipe.requires.is_empty() && recipe.produces.is_empty())
}

fn common_items(recipe: &Recipe, side: Direction, desired: &[ItemRate]) -> usize {
    recipe
        .rates(side)
        .iter()
        .filter(|r| desired.iter().any(|d| d.item == r.item))
        .count()
}

/// True if `candidate` should replace `current` as the best match so far.
fn prefers(
    candidate: &Recipe,
    current: &Recipe,
    side: Direction,
    desired: &[ItemRate],
    required_item: &str,
) -> bool {
    match (is_valid(candidate), is_valid(current)) {
        (true, false) => return true,
        (false, true) => return false,
        _ => {}
    }

    match (
        candidate.has_item(side, required_item),
        current.has_item(side, required_item),
    ) {
        (true, false) => true,
        // Strictly more: ties stay with the earlier recipe.
        (true, true) => {
            common_items(candidate, side, desired) > common_items(current, side, desired)
        }
        _ => false,
    }
}

/// Pick the recipe for a building that will attach to `required_item`.
///
/// `desired` are the rates of the building being extended; `desired_are_outputs`
/// says whether they are its products. Returns `None` only for an empty catalog.
pub fn best_recipe<'a>(
    catalog: &'a Catalog,
    desired: &[ItemRate],
    desired_are_outputs: bool,
    required_item: &str,
    fallback: &str,
) -> Option<&'a Recipe> {
    let seed = catalog
        .recipe(fallback)
        .or_else(|| catalog.recipes().first())?;
    let side = relevant_side(desired_are_outputs);

    Some(catalog.recipes().iter().fold(seed, |best, candidate| {
        if prefers(candidate, best, side, desired, required_item) {
            candidate
        } else {
            best
        }
    }))
}
