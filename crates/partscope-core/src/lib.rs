//! Partscope Core Types
//!
//! This crate provides the foundational types shared by the Partscope loader
//! and evaluator:
//!
//! - **Identifiers**: string-interned names and qualified paths ([`identifier::Id`])
//! - **Model**: the immutable element graph ([`model::Model`], [`model::ModelBuilder`])
//! - **Expressions**: defining expressions of features ([`expr::Expr`])
//! - **Units**: unit algebra and conversion tables ([`unit::Unit`], [`unit::UnitTable`])
//! - **Values**: evaluation results ([`value::Value`])

pub mod expr;
pub mod identifier;
pub mod model;
pub mod unit;
pub mod value;
