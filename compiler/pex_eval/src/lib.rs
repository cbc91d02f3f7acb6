//! Pex Eval - percent-expression evaluator and RPN formula engine.
//!
//! This crate provides:
//! - the percent-expression evaluator (`%key`, `%{key}`, `%[scope]key`,
//!   `%%`) with its cycle guard
//! - the `=function` registry and the built-in text, regex, hash,
//!   encoding, date and lookup functions
//! - the parameter provider trait and stock providers
//! - RPN formulas: compiled once, evaluated with lazy ternaries and
//!   short-circuit logic, printable as infix
//! - bounded regex and formula caches
//!
//! # Example
//!
//! ```text
//! let params: ParamSet = [("name", "world"), ("greeting", "hello %name")].into_iter().collect();
//! let ctx = EvalContext::new(&params);
//! eval("%{=upper:%greeting}", &ctx)          // "HELLO WORLD"
//! eval("%{=rpn,'2,'3,*}", &ctx)              // Signed64(6)
//! ```
//!
//! # Failure model
//!
//! Evaluation never fails. Missing keys, malformed input, overflow and bad
//! regexes produce Null (or the caller's default) and an [`EvalDiagnostic`]
//! that is logged through `tracing` and collected by the context's
//! [`DiagnosticSink`], if any.
//!
//! # Concurrency
//!
//! Compiled formulas and the function/operator registries are shared
//! between threads. Contexts and caches are per evaluation and per thread.

mod cache;
mod context;
mod diagnostics;
mod external;
mod functions;
mod percent;
mod provider;
mod rpn;

pub use cache::{
    cached_formula, cached_regex, with_thread_caches, BoundedCache, CacheConfig, CacheStats, Caches,
    EvictionPolicy, FORMULA_CACHE_SIZE_VAR, REGEX_CACHE_SIZE_VAR,
};
pub use context::{EvalContext, ScopeFilter};
pub use diagnostics::{
    cycle_detected, invalid_regex, malformed_expression, numeric_overflow, unresolved_variable,
    DiagnosticKind, DiagnosticSink, EvalDiagnostic,
};
pub use external::{
    external_params, external_params_names, register_external_params, unregister_external_params,
    SharedProvider,
};
pub use functions::{function_names, register_exact_function, register_function, PercentFunction};
pub use percent::{
    escape, eval, eval_function, eval_key, eval_key_or, eval_or, eval_text, is_independent,
    matching_regexp, split_args,
};
pub use provider::{EnvironmentProvider, FnProvider, ParamSet, ParamsProvider, ProviderChain};
pub use rpn::{
    operator, operator_symbols, params_formula, register_operator, BinaryFn, CompiledFormula,
    CustomOperator, FormulaDialect, OperatorDefinition, OperatorFlags, TernaryFn, UnaryFn,
};

pub use pex_trie::EntryKind;
pub use pex_value::{Timestamp, TypedValue, ValueType};
