//! Hyperparameter values, grids and assignments.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::errors::SchemaError;

/// A concrete candidate value for one hyperparameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParamValue {
    /// Short type name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Str(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:?}"),
            Self::Str(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        Self::Float(v.into())
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// One choice of value for every parameter of a grid.
pub type ParamAssignment = BTreeMap<String, ParamValue>;

/// Render an assignment as `{alpha: 0.1, beta: "x"}`.
pub fn format_assignment(assignment: &ParamAssignment) -> String {
    let body = assignment
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{body}}}")
}

/// A single grid dimension: a parameter name and its ordered candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamAxis {
    pub name: String,
    pub values: Vec<ParamValue>,
}

/// The hyperparameter grid, kept in insertion order.
///
/// Serialized as a JSON-style map of name to candidate list. Validation is
/// deferred to [`ParamGrid::validate`] so a malformed grid loaded from a
/// document surfaces as a [`SchemaError`] rather than a parse failure.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParamGrid {
    pub parameters: Vec<ParamAxis>,
}

impl ParamGrid {
    pub fn new() -> Self {
        Self {
            parameters: Vec::new(),
        }
    }

    pub fn add<V: Into<ParamValue>>(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.parameters.push(ParamAxis {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|p| p.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Check that names are non-empty and unique and that every parameter
    /// has at least one candidate.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut seen = HashSet::new();
        for param in &self.parameters {
            if param.name.is_empty() {
                return Err(SchemaError::EmptyName);
            }
            if !seen.insert(param.name.as_str()) {
                return Err(SchemaError::DuplicateParameter {
                    parameter: param.name.clone(),
                });
            }
            if param.values.is_empty() {
                return Err(SchemaError::EmptyCandidates {
                    parameter: param.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Number of assignments in the cross product.
    pub fn combinations(&self) -> Result<usize, SchemaError> {
        self.validate()?;
        self.parameters.iter().try_fold(1usize, |total, param| {
            total
                .checked_mul(param.values.len())
                .ok_or(SchemaError::TooManyCombinations)
        })
    }
}

impl<N: Into<String>> FromIterator<(N, Vec<ParamValue>)> for ParamGrid {
    fn from_iter<I: IntoIterator<Item = (N, Vec<ParamValue>)>>(iter: I) -> Self {
        Self {
            parameters: iter
                .into_iter()
                .map(|(name, values)| ParamAxis {
                    name: name.into(),
                    values,
                })
                .collect(),
        }
    }
}

impl Serialize for ParamGrid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.parameters.len()))?;
        for param in &self.parameters {
            map.serialize_entry(&param.name, &param.values)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ParamGrid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GridVisitor;

        impl<'de> Visitor<'de> for GridVisitor {
            type Value = ParamGrid;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of parameter name to candidate values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ParamGrid, A::Error> {
                let mut parameters = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, values)) = access.next_entry::<String, Vec<ParamValue>>()? {
                    parameters.push(ParamAxis { name, values });
                }
                Ok(ParamGrid { parameters })
            }
        }

        deserializer.deserialize_map(GridVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_values_from_json() {
        let grid: ParamGrid = serde_json::from_str(
            r#"{"alpha": [0.1, 1.0], "depth": [3, 5, 7], "solver": ["lbfgs"]}"#,
        )
        .unwrap();

        assert_eq!(grid.parameters.len(), 3);
        let alpha = &grid.parameters[0];
        assert_eq!(alpha.name, "alpha");
        assert_eq!(alpha.values, vec![ParamValue::Float(0.1), ParamValue::Float(1.0)]);
        let depth = grid.parameters.iter().find(|p| p.name == "depth").unwrap();
        assert_eq!(depth.values[0], ParamValue::Int(3));
        let solver = grid.parameters.iter().find(|p| p.name == "solver").unwrap();
        assert_eq!(solver.values[0].as_str(), Some("lbfgs"));
    }

    #[test]
    fn grid_round_trips_through_json() {
        let grid = ParamGrid::new()
            .add("alpha", [0.5, 2.0])
            .add("kernel", ["rbf", "linear"]);
        let json = serde_json::to_string(&grid).unwrap();
        let back: ParamGrid = serde_json::from_str(&json).unwrap();
        assert_eq!(grid, back);
    }

    #[test]
    fn combinations_is_product_of_lengths() {
        let grid = ParamGrid::new()
            .add("a", [1, 2, 3])
            .add("b", [0.1, 0.2])
            .add("c", ["x", "y", "z", "w"]);
        assert_eq!(grid.combinations(), Ok(24));
        assert_eq!(ParamGrid::new().combinations(), Ok(1));
    }

    #[test]
    fn combinations_overflow_is_a_schema_error() {
        // four axes of 2^16 candidates multiply to 2^64
        let values: Vec<ParamValue> = (0..1i64 << 16).map(ParamValue::Int).collect();
        let grid = (0..4)
            .map(|i| (format!("p{i}"), values.clone()))
            .collect::<ParamGrid>();
        assert_eq!(grid.combinations(), Err(SchemaError::TooManyCombinations));

        let single = ParamGrid::new().add("p0", values);
        assert_eq!(single.combinations(), Ok(1 << 16));
    }

    #[test]
    fn validate_rejects_empty_candidates() {
        let grid = ParamGrid::new().add("a", [1]).add("b", Vec::<i64>::new());
        assert_eq!(
            grid.validate(),
            Err(SchemaError::EmptyCandidates {
                parameter: "b".to_string()
            })
        );
    }

    #[test]
    fn validate_rejects_duplicate_names() {
        let grid = ParamGrid::new().add("a", [1]).add("a", [2]);
        assert_eq!(
            grid.validate(),
            Err(SchemaError::DuplicateParameter {
                parameter: "a".to_string()
            })
        );
    }

    #[test]
    fn validate_rejects_empty_name() {
        let grid = ParamGrid::new().add("", [1]);
        assert_eq!(grid.validate(), Err(SchemaError::EmptyName));
    }

    #[test]
    fn format_assignment_is_sorted_and_quoted() {
        let mut assignment = ParamAssignment::new();
        assignment.insert("beta".to_string(), ParamValue::from("y"));
        assignment.insert("alpha".to_string(), ParamValue::from(1.0));
        assert_eq!(format_assignment(&assignment), r#"{alpha: 1.0, beta: "y"}"#);
    }

    #[test]
    fn value_accessors() {
        assert_eq!(ParamValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(ParamValue::Int(3).as_i64(), Some(3));
        assert_eq!(ParamValue::Float(0.5).as_i64(), None);
        assert_eq!(ParamValue::from(0.25f32), ParamValue::Float(0.25));
        assert_eq!(ParamValue::from("x").kind(), "string");
    }
}
