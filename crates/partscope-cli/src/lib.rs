//! Partscope CLI library
//!
//! This module contains the core CLI logic for the Partscope model tool.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Command};

use std::{
    fs::{self, File},
    io::{self, Write},
};

use log::info;

use partscope::{PartscopeError, Workbench, model::Model, value::Value};

/// Run the Partscope CLI application, writing command output to stdout.
///
/// # Errors
///
/// Returns `PartscopeError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Parsing errors, including warnings when they are treated as errors
/// - Unknown element or feature names
/// - Evaluation and report errors
pub fn run(args: &Args) -> Result<(), PartscopeError> {
    let stdout = io::stdout();
    execute(args, &mut stdout.lock())
}

/// Run the CLI application with command output going to `out`.
///
/// Reports written to a file named by `--output` bypass `out`.
pub fn execute(args: &Args, out: &mut impl Write) -> Result<(), PartscopeError> {
    info!(input_path = args.input; "Processing model");

    let app_config = config::load_config(args.config.as_ref())?;
    let source = fs::read_to_string(&args.input)?;

    let workbench = Workbench::new(app_config)?;
    let loaded = workbench.load(&source)?;
    let model = loaded.model();

    match &args.command {
        Command::Comments { output } => {
            let entries = match output {
                Some(path) => workbench.comments_report(model, File::create(path)?)?,
                None => workbench.comments_report(model, &mut *out)?,
            };
            info!(entries = entries; "Comments exported");
        }
        Command::Docs { output } => {
            let entries = match output {
                Some(path) => workbench.documentation_report(model, File::create(path)?)?,
                None => workbench.documentation_report(model, &mut *out)?,
            };
            info!(entries = entries; "Documentation exported");
        }
        Command::Locales => {
            let missing = workbench.missing_locales(model);
            for entry in &missing {
                writeln!(out, "{}: {}", entry.qualified_name, entry.missing.join(", "))?;
            }
            info!(elements = missing.len(); "Locale check finished");
        }
        Command::Eval {
            element,
            feature,
            scope,
            all,
        } => {
            if *all {
                for (name, value) in workbench.evaluate_all(model, element)? {
                    writeln!(out, "{name} = {}", render(model, &value))?;
                }
            } else if let Some(feature) = feature {
                let value = workbench.evaluate(model, element, feature, scope.as_deref())?;
                writeln!(out, "{feature} = {}", render(model, &value))?;
            }
        }
    }

    Ok(())
}

/// Composites print as the path of the element they stand for.
fn render(model: &Model, value: &Value) -> String {
    match value {
        Value::CompositeRef(composite) => model.path_of(composite.element),
        _ => value.to_string(),
    }
}
