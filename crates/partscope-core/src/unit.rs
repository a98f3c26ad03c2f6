//! Physical units attached to quantity values.
//!
//! A [`Unit`] is a product of unit symbols raised to integer exponents, kept
//! in canonical (sorted, zero-free) form so two units are compatible exactly
//! when they compare equal. A [`UnitTable`] maps derived symbols onto a base
//! symbol with a scale factor (`g = 0.001 kg`), which lets `5 [kg] + 200 [g]`
//! be evaluated.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::Deserialize;
use thiserror::Error;

/// Errors raised while reading a unit expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    #[error("empty unit expression")]
    Empty,

    #[error("invalid unit symbol `{0}`")]
    InvalidSymbol(String),

    #[error("invalid exponent `{0}`")]
    InvalidExponent(String),
}

/// A product of unit symbols with integer exponents.
///
/// # Examples
///
/// ```
/// use partscope_core::unit::Unit;
///
/// let speed: Unit = "m/s".parse().unwrap();
/// let time: Unit = "s".parse().unwrap();
/// assert_eq!(speed.mul(&time), Some("m".parse().unwrap()));
/// assert_eq!(speed.to_string(), "m/s");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Unit {
    factors: BTreeMap<String, i32>,
}

impl Unit {
    /// The unit of a plain number.
    pub fn dimensionless() -> Self {
        Self::default()
    }

    /// A single symbol with exponent one.
    pub fn symbol(symbol: impl Into<String>) -> Self {
        let mut factors = BTreeMap::new();
        factors.insert(symbol.into(), 1);
        Self { factors }
    }

    pub fn is_dimensionless(&self) -> bool {
        self.factors.is_empty()
    }

    /// Iterates `(symbol, exponent)` pairs in canonical order.
    pub fn factors(&self) -> impl Iterator<Item = (&str, i32)> {
        self.factors.iter().map(|(symbol, exp)| (symbol.as_str(), *exp))
    }

    /// The product of two units, or `None` if an exponent overflows.
    pub fn mul(&self, other: &Unit) -> Option<Unit> {
        let mut result = self.clone();
        for (symbol, exp) in &other.factors {
            result.add_factor(symbol, *exp)?;
        }
        Some(result)
    }

    /// The quotient of two units, or `None` if an exponent overflows.
    pub fn div(&self, other: &Unit) -> Option<Unit> {
        let mut result = self.clone();
        for (symbol, exp) in &other.factors {
            result.add_factor(symbol, exp.checked_neg()?)?;
        }
        Some(result)
    }

    /// Multiplies every exponent by `n`, or `None` if one overflows.
    pub fn powi(&self, n: i32) -> Option<Unit> {
        if n == 0 {
            return Some(Unit::dimensionless());
        }
        let factors = self
            .factors
            .iter()
            .map(|(symbol, exp)| exp.checked_mul(n).map(|exp| (symbol.clone(), exp)))
            .collect::<Option<_>>()?;
        Some(Unit { factors })
    }

    /// Takes the square root, if every exponent is even.
    pub fn sqrt(&self) -> Option<Unit> {
        if self.factors.values().any(|exp| exp % 2 != 0) {
            return None;
        }
        let factors = self
            .factors
            .iter()
            .map(|(symbol, exp)| (symbol.clone(), exp / 2))
            .collect();
        Some(Unit { factors })
    }

    fn add_factor(&mut self, symbol: &str, exp: i32) -> Option<()> {
        let current = self.factors.get(symbol).copied().unwrap_or(0);
        match current.checked_add(exp)? {
            0 => {
                self.factors.remove(symbol);
            }
            sum => {
                self.factors.insert(symbol.to_owned(), sum);
            }
        }
        Some(())
    }
}

impl FromStr for Unit {
    type Err = UnitError;

    /// Reads expressions such as `kg`, `m/s`, `kg*m/s^2` or `m^-1`.
    ///
    /// Everything after the first `/` is in the denominator.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        if text.is_empty() {
            return Err(UnitError::Empty);
        }

        let mut unit = Unit::dimensionless();
        for (position, group) in text.split('/').enumerate() {
            let sign: i32 = if position == 0 { 1 } else { -1 };
            for term in group.split('*') {
                let term = term.trim();
                let (symbol, exp) = match term.split_once('^') {
                    Some((symbol, exp)) => {
                        let exp = exp
                            .trim()
                            .parse::<i32>()
                            .map_err(|_| UnitError::InvalidExponent(exp.to_owned()))?;
                        (symbol.trim(), exp)
                    }
                    None => (term, 1),
                };
                // `1/s` spells a pure denominator
                if symbol == "1" && exp == 1 {
                    continue;
                }
                if symbol.is_empty()
                    || !symbol
                        .chars()
                        .all(|c| c.is_alphabetic() || c == '_' || c == '°' || c == '%')
                {
                    return Err(UnitError::InvalidSymbol(symbol.to_owned()));
                }
                sign.checked_mul(exp)
                    .and_then(|exp| unit.add_factor(symbol, exp))
                    .ok_or_else(|| UnitError::InvalidExponent(term.to_owned()))?;
            }
        }
        Ok(unit)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.factors.is_empty() {
            return write!(f, "1");
        }

        let numerator: Vec<_> = self
            .factors
            .iter()
            .filter(|(_, exp)| **exp > 0)
            .map(|(symbol, exp)| (symbol, exp.unsigned_abs()))
            .collect();
        let denominator: Vec<_> = self
            .factors
            .iter()
            .filter(|(_, exp)| **exp < 0)
            .map(|(symbol, exp)| (symbol, exp.unsigned_abs()))
            .collect();

        if numerator.is_empty() {
            write!(f, "1")?;
        } else {
            write_terms(f, &numerator)?;
        }
        if !denominator.is_empty() {
            write!(f, "/")?;
            write_terms(f, &denominator)?;
        }
        Ok(())
    }
}

fn write_terms(f: &mut fmt::Formatter<'_>, terms: &[(&String, u32)]) -> fmt::Result {
    for (idx, (symbol, exp)) in terms.iter().enumerate() {
        if idx > 0 {
            write!(f, "*")?;
        }
        if *exp == 1 {
            write!(f, "{symbol}")?;
        } else {
            write!(f, "{symbol}^{exp}")?;
        }
    }
    Ok(())
}

/// Scale of a derived symbol relative to a base symbol.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Conversion {
    /// Multiplier from the derived symbol to `base`.
    pub factor: f64,
    /// The symbol this one is expressed in.
    pub base: String,
}

impl Conversion {
    pub fn new(factor: f64, base: impl Into<String>) -> Self {
        Self {
            factor,
            base: base.into(),
        }
    }
}

/// Table of derived unit symbols.
///
/// Only one level of indirection is applied: a base symbol is never looked
/// up again.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitTable {
    conversions: BTreeMap<String, Conversion>,
}

impl UnitTable {
    /// An empty table; only identical units are compatible.
    pub fn new() -> Self {
        Self::default()
    }

    /// Common SI prefixes and time units over `kg`, `m`, `s`, `W`, `N`, `J`.
    pub fn standard() -> Self {
        let mut table = Self::new();
        for (symbol, factor, base) in [
            ("g", 1e-3, "kg"),
            ("mg", 1e-6, "kg"),
            ("t", 1e3, "kg"),
            ("mm", 1e-3, "m"),
            ("cm", 1e-2, "m"),
            ("km", 1e3, "m"),
            ("ms", 1e-3, "s"),
            ("min", 60.0, "s"),
            ("h", 3600.0, "s"),
            ("kW", 1e3, "W"),
            ("MW", 1e6, "W"),
            ("kN", 1e3, "N"),
            ("kJ", 1e3, "J"),
            ("MJ", 1e6, "J"),
        ] {
            table.insert(symbol, Conversion::new(factor, base));
        }
        table
    }

    pub fn insert(&mut self, symbol: impl Into<String>, conversion: Conversion) {
        self.conversions.insert(symbol.into(), conversion);
    }

    pub fn len(&self) -> usize {
        self.conversions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversions.is_empty()
    }

    /// Expresses `unit` in base symbols, returning the scale factor and the
    /// normalised unit. `None` if merging symbols overflows an exponent.
    pub fn normalize(&self, unit: &Unit) -> Option<(f64, Unit)> {
        let mut factor = 1.0;
        let mut normalized = Unit::dimensionless();
        for (symbol, exp) in unit.factors() {
            match self.conversions.get(symbol) {
                Some(conversion) => {
                    factor *= conversion.factor.powi(exp);
                    normalized.add_factor(&conversion.base, exp)?;
                }
                None => normalized.add_factor(symbol, exp)?,
            }
        }
        Some((factor, normalized))
    }

    /// Returns the factor that converts a value in `from` into `to`, or
    /// `None` if the units measure different dimensions.
    pub fn conversion_factor(&self, from: &Unit, to: &Unit) -> Option<f64> {
        if from == to {
            return Some(1.0);
        }
        let (from_factor, from_base) = self.normalize(from)?;
        let (to_factor, to_base) = self.normalize(to)?;
        (from_base == to_base).then(|| from_factor / to_factor)
    }
}
