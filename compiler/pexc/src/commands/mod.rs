//! Command handlers for the `pex` CLI.
//!
//! Handlers return a [`Report`] instead of printing, so `main` owns the
//! streams and tests can inspect the output.

use std::fmt;

use pex_eval::{
    escape, eval, function_names, matching_regexp, operator, operator_symbols, CompiledFormula,
    DiagnosticSink, EntryKind, EnvironmentProvider, EvalContext, EvalDiagnostic, OperatorFlags,
    ParamSet, ProviderChain, ScopeFilter, TypedValue,
};

use pex_value::{parse_number, Number};

use crate::args::{parse_options, ArgError, Options};

/// Output of one command: lines for stdout and diagnostics for stderr.
#[derive(Debug, Default)]
pub struct Report {
    pub lines: Vec<String>,
    pub diagnostics: Vec<EvalDiagnostic>,
}

#[derive(Debug)]
pub enum CommandError {
    Args(ArgError),
    /// A command needing positional arguments got none; holds its usage.
    MissingInput(&'static str),
    InvalidRegex(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Args(e) => write!(f, "{e}"),
            CommandError::MissingInput(usage) => write!(f, "missing input\nUsage: {usage}"),
            CommandError::InvalidRegex(e) => write!(f, "cannot build regex: {e}"),
        }
    }
}

impl std::error::Error for CommandError {}

impl From<ArgError> for CommandError {
    fn from(e: ArgError) -> Self {
        CommandError::Args(e)
    }
}

/// Every command the binary knows, with its usage line.
pub const COMMANDS: &[(&str, &str)] = &[
    ("eval", "pex eval [options] <expression>..."),
    ("rpn", "pex rpn [options] <formula>..."),
    ("infix", "pex infix [--dialect <name>] <formula>..."),
    ("escape", "pex escape <text>..."),
    ("regexp", "pex regexp <expression>..."),
    ("keys", "pex keys [options]"),
    ("functions", "pex functions"),
    ("operators", "pex operators"),
];

fn usage(command: &str) -> &'static str {
    COMMANDS
        .iter()
        .find(|(name, _)| *name == command)
        .map_or("pex help", |(_, usage)| usage)
}

/// Run `command` with the arguments that follow it. `None` for an
/// unknown command.
pub fn dispatch(command: &str, args: &[String]) -> Option<Result<Report, CommandError>> {
    let handler: fn(&Options) -> Result<Report, CommandError> = match command {
        "eval" => eval_expressions,
        "rpn" => eval_formulas,
        "infix" => infix_formulas,
        "escape" => escape_texts,
        "regexp" => expression_regexps,
        "keys" => list_keys,
        "functions" => |_| Ok(list_functions()),
        "operators" => |_| Ok(list_operators()),
        _ => return None,
    };
    Some(parse_options(args).map_err(CommandError::from).and_then(|options| handler(&options)))
}

fn require_input<'o>(options: &'o Options, command: &str) -> Result<&'o [String], CommandError> {
    if options.positional.is_empty() {
        Err(CommandError::MissingInput(usage(command)))
    } else {
        Ok(&options.positional)
    }
}

/// Build the providers and context described by `options` and run `f`
/// with them. Diagnostics raised inside `f` end up in the report.
fn with_context(options: &Options, f: impl FnOnce(&EvalContext<'_>, &mut Report)) -> Report {
    let params: ParamSet = options
        .params
        .iter()
        .map(|(k, v)| (k.as_str(), param_value(v)))
        .collect();
    let environment = EnvironmentProvider::new();
    let mut chain = ProviderChain::new().with(&params);
    if options.use_env {
        chain.push(&environment);
    }
    let sink = DiagnosticSink::new();
    let mut ctx = EvalContext::new(&chain).with_diagnostics(&sink);
    if let Some(scope) = &options.scope {
        ctx = ctx.with_scope_filter(ScopeFilter::parse(scope));
    }

    let mut report = Report::default();
    f(&ctx, &mut report);
    report.diagnostics.extend(sink.take());
    report
}

/// `<type>: <text>`, or the bare text with `--raw`.
fn render(value: &TypedValue, raw: bool) -> String {
    if raw {
        value.as_text().into_owned()
    } else {
        format!("{}: {}", value.type_name(), value.as_text())
    }
}

/// A command-line parameter value: a number when it reads as one, text
/// (and so a percent-expression) otherwise.
fn param_value(text: &str) -> TypedValue {
    parse_number(text).map_or_else(|| TypedValue::text(text), Number::into_value)
}

/// `pex eval`: evaluate each argument as a percent-expression.
pub fn eval_expressions(options: &Options) -> Result<Report, CommandError> {
    let inputs = require_input(options, "eval")?;
    Ok(with_context(options, |ctx, report| {
        for expr in inputs {
            tracing::debug!(expr = expr.as_str(), "evaluating expression");
            report.lines.push(render(&eval(expr, ctx), options.raw));
        }
    }))
}

/// `pex rpn`: compile and evaluate each argument as a formula.
pub fn eval_formulas(options: &Options) -> Result<Report, CommandError> {
    let inputs = require_input(options, "rpn")?;
    Ok(with_context(options, |ctx, report| {
        for source in inputs {
            let formula = CompiledFormula::new(source, options.dialect);
            let value = formula.eval(ctx, TypedValue::Null);
            report.lines.push(render(&value, options.raw));
            // Invalid formulas that still produced a value report nothing on
            // their own.
            if let Some(sink) = ctx.diagnostics() {
                let seen = sink.snapshot();
                for error in formula.errors() {
                    if !seen.contains(error) {
                        sink.push(error.clone());
                    }
                }
            }
        }
    }))
}

/// `pex infix`: print each formula in infix notation.
pub fn infix_formulas(options: &Options) -> Result<Report, CommandError> {
    let inputs = require_input(options, "infix")?;
    let mut report = Report::default();
    for source in inputs {
        let formula = CompiledFormula::new(source, options.dialect);
        report.lines.push(formula.to_infix());
        report.diagnostics.extend(formula.errors().iter().cloned());
    }
    Ok(report)
}

/// `pex escape`: print each argument escaped for use as a literal.
pub fn escape_texts(options: &Options) -> Result<Report, CommandError> {
    let inputs = require_input(options, "escape")?;
    Ok(Report {
        lines: inputs.iter().map(|text| escape(text)).collect(),
        diagnostics: Vec::new(),
    })
}

/// `pex regexp`: print the regex matching every value of each expression.
pub fn expression_regexps(options: &Options) -> Result<Report, CommandError> {
    let inputs = require_input(options, "regexp")?;
    let lines = inputs
        .iter()
        .map(|expr| {
            matching_regexp(expr)
                .map(|re| re.as_str().to_owned())
                .map_err(|e| CommandError::InvalidRegex(e.to_string()))
        })
        .collect::<Result<_, _>>()?;
    Ok(Report {
        lines,
        diagnostics: Vec::new(),
    })
}

/// `pex keys`: keys visible under the options' scope filter.
pub fn list_keys(options: &Options) -> Result<Report, CommandError> {
    Ok(with_context(options, |ctx, report| {
        if let Some(provider) = ctx.provider() {
            report.lines.extend(provider.param_keys(ctx));
        }
    }))
}

/// `pex functions`: registered function names.
pub fn list_functions() -> Report {
    let lines = function_names()
        .into_iter()
        .map(|(name, kind)| match kind {
            EntryKind::Prefix => name,
            EntryKind::Exact => format!("{name} (exact)"),
        })
        .collect();
    Report {
        lines,
        diagnostics: Vec::new(),
    }
}

/// `pex operators`: operator table, one operator per line.
pub fn list_operators() -> Report {
    let lines = operator_symbols()
        .into_iter()
        .filter_map(|symbol| operator(&symbol))
        .map(|op| {
            let mut line = format!(
                "{:<12} arity {}  precedence {:>2}",
                op.symbol(),
                op.arity(),
                op.precedence()
            );
            for (flag, name) in [
                (OperatorFlags::RIGHT_TO_LEFT, "right-to-left"),
                (OperatorFlags::LAZY, "lazy"),
                (OperatorFlags::STACK, "stack"),
                (OperatorFlags::REGEXP_OPERAND, "regexp"),
            ] {
                if op.flags().contains(flag) {
                    line.push_str("  ");
                    line.push_str(name);
                }
            }
            line
        })
        .collect();
    Report {
        lines,
        diagnostics: Vec::new(),
    }
}

#[cfg(test)]
mod tests;
