//! Cross-product enumeration of a parameter grid.

use tg_types::{ParamAssignment, ParamGrid, SchemaError};

/// Enumerate every assignment of `grid`.
///
/// Parameters are folded in one at a time: each partial assignment built so
/// far is cloned once per candidate of the next parameter. The first parameter
/// therefore varies slowest and the last one fastest. An empty grid yields a
/// single empty assignment.
pub fn parameter_grid(grid: &ParamGrid) -> Result<Vec<ParamAssignment>, SchemaError> {
    let total = grid.combinations()?;

    let mut result: Vec<ParamAssignment> = vec![ParamAssignment::new()];
    for axis in &grid.parameters {
        let mut next = Vec::with_capacity(result.len() * axis.values.len());
        for existing in &result {
            for value in &axis.values {
                let mut combo = existing.clone();
                combo.insert(axis.name.clone(), value.clone());
                next.push(combo);
            }
        }
        result = next;
    }

    debug_assert_eq!(result.len(), total);
    Ok(result)
}
