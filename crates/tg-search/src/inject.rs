//! Name-based parameter injection into statically typed estimators.
//!
//! Each estimator type registers a table of typed setters once, keyed by
//! parameter name. Applying an assignment looks every name up in that table,
//! converts values to the field's own representation and only then writes
//! them, so a failed injection leaves the estimator untouched.

use num_traits::{Float, NumCast, PrimInt};
use std::collections::BTreeMap;
use std::fmt;

use tg_types::{ConfigurationError, ParamAssignment, ParamValue};

type Assign<E> = Box<dyn FnOnce(&mut E)>;
type Resolve<E> = Box<dyn Fn(&ParamValue) -> Option<Assign<E>> + Send + Sync>;

struct ParamSetter<E> {
    expected: &'static str,
    resolve: Resolve<E>,
}

/// Registered setters for one estimator type.
pub struct ParamSetters<E> {
    estimator: &'static str,
    setters: BTreeMap<String, ParamSetter<E>>,
}

impl<E: 'static> ParamSetters<E> {
    pub fn new() -> Self {
        let full = std::any::type_name::<E>();
        Self {
            estimator: full.rsplit("::").next().unwrap_or(full),
            setters: BTreeMap::new(),
        }
    }

    /// Floating-point field. Accepts `Int` and `Float` values, converted to `T`.
    /// A finite value that overflows `T` is rejected.
    pub fn float<T, F>(self, name: &str, set: F) -> Self
    where
        T: Float + 'static,
        F: Fn(&mut E, T) + Copy + Send + Sync + 'static,
    {
        self.register(name, "float", move |value| {
            let source = value.as_f64()?;
            let converted = match value {
                ParamValue::Int(v) => <T as NumCast>::from(*v)?,
                _ => <T as NumCast>::from(source)?,
            };
            if source.is_finite() && !converted.is_finite() {
                return None;
            }
            Some(Box::new(move |estimator: &mut E| set(estimator, converted)) as Assign<E>)
        })
    }

    /// Integer field. Accepts only `Int` values that fit in `T`.
    pub fn int<T, F>(self, name: &str, set: F) -> Self
    where
        T: PrimInt + Send + 'static,
        F: Fn(&mut E, T) + Copy + Send + Sync + 'static,
    {
        self.register(name, "int", move |value| {
            let converted = <T as NumCast>::from(value.as_i64()?)?;
            Some(Box::new(move |estimator: &mut E| set(estimator, converted)) as Assign<E>)
        })
    }

    /// String field. Accepts only `Str` values.
    pub fn text<F>(self, name: &str, set: F) -> Self
    where
        F: Fn(&mut E, String) + Copy + Send + Sync + 'static,
    {
        self.register(name, "string", move |value| {
            let converted = value.as_str()?.to_string();
            Some(Box::new(move |estimator: &mut E| set(estimator, converted)) as Assign<E>)
        })
    }

    fn register(
        mut self,
        name: &str,
        expected: &'static str,
        resolve: impl Fn(&ParamValue) -> Option<Assign<E>> + Send + Sync + 'static,
    ) -> Self {
        self.setters.insert(
            name.to_string(),
            ParamSetter {
                expected,
                resolve: Box::new(resolve),
            },
        );
        self
    }

    /// Registered parameter names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.setters.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.setters.contains_key(name)
    }

    /// Apply every value of `assignment` to `estimator`, or none of them.
    pub fn apply(
        &self,
        estimator: &mut E,
        assignment: &ParamAssignment,
    ) -> Result<(), ConfigurationError> {
        let mut pending = Vec::with_capacity(assignment.len());
        for (name, value) in assignment {
            let setter =
                self.setters
                    .get(name)
                    .ok_or_else(|| ConfigurationError::UnknownParameter {
                        estimator: self.estimator.to_string(),
                        parameter: name.clone(),
                    })?;
            let assign =
                (setter.resolve)(value).ok_or_else(|| ConfigurationError::TypeMismatch {
                    estimator: self.estimator.to_string(),
                    parameter: name.clone(),
                    expected: setter.expected.to_string(),
                    value: value.clone(),
                })?;
            pending.push(assign);
        }

        for assign in pending {
            assign(estimator);
        }
        Ok(())
    }
}

impl<E: 'static> Default for ParamSetters<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for ParamSetters<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamSetters")
            .field("estimator", &self.estimator)
            .field("parameters", &self.setters.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Estimators whose hyperparameters can be set by name.
///
/// Implementations usually build their table once:
///
/// ```
/// use std::sync::OnceLock;
/// use tg_search::{Configurable, ParamSetters};
///
/// #[derive(Clone, Default)]
/// struct Ridge {
///     alpha: f64,
/// }
///
/// impl Configurable for Ridge {
///     fn param_setters() -> &'static ParamSetters<Self> {
///         static SETTERS: OnceLock<ParamSetters<Ridge>> = OnceLock::new();
///         SETTERS.get_or_init(|| ParamSetters::new().float("alpha", |r: &mut Ridge, v: f64| r.alpha = v))
///     }
/// }
/// ```
pub trait Configurable: Sized + 'static {
    fn param_setters() -> &'static ParamSetters<Self>;
}

/// Set every parameter of `assignment` on `estimator`.
pub fn set_params<E: Configurable>(
    estimator: &mut E,
    assignment: &ParamAssignment,
) -> Result<(), ConfigurationError> {
    E::param_setters().apply(estimator, assignment)
}
