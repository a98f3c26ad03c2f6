use std::fmt;

use indexmap::IndexMap;
use log::debug;

use partscope_core::{identifier::Id, unit::UnitTable};

use super::{Builtin, builtins};
use crate::config::EvaluationConfig;

/// Everything an [`Evaluator`](super::Evaluator) needs besides the model:
/// the unit table, the built-in function table and evaluation limits.
///
/// An environment is built once from configuration and handed to every
/// evaluator explicitly.
///
/// # Examples
///
/// ```
/// # use partscope::{config::EvaluationConfig, eval::Environment};
/// let env = Environment::new(&EvaluationConfig::default());
/// assert!(env.quantities());
/// assert!(env.has_function("count"));
/// assert!(!env.has_function("simulate"));
/// ```
#[derive(Clone)]
pub struct Environment {
    quantities: bool,
    max_depth: usize,
    units: UnitTable,
    functions: IndexMap<Id, Builtin>,
}

impl Environment {
    /// Builds an environment from the standard unit table extended with the
    /// configured conversions.
    pub fn new(config: &EvaluationConfig) -> Self {
        let mut units = UnitTable::standard();
        for (symbol, conversion) in config.units() {
            units.insert(symbol.clone(), conversion.clone());
        }

        let functions = builtins::standard();
        debug!(
            quantities = config.quantities(),
            max_depth = config.max_depth(),
            units = units.len(),
            functions = functions.len();
            "Evaluation environment created"
        );

        Self {
            quantities: config.quantities(),
            max_depth: config.max_depth(),
            units,
            functions,
        }
    }

    /// Whether quantity literals keep their units.
    pub fn quantities(&self) -> bool {
        self.quantities
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn units(&self) -> &UnitTable {
        &self.units
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(&Id::new(name))
    }

    /// Names of the built-in functions, in table order.
    pub fn function_names(&self) -> impl Iterator<Item = String> + '_ {
        self.functions.keys().map(Id::to_string)
    }

    pub(crate) fn function(&self, name: Id) -> Option<Builtin> {
        self.functions.get(&name).copied()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(&EvaluationConfig::default())
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("quantities", &self.quantities)
            .field("max_depth", &self.max_depth)
            .field("units", &self.units)
            .field("functions", &self.function_names().collect::<Vec<_>>())
            .finish()
    }
}
