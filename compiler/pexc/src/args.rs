//! Command-line options shared by the evaluation commands.

use std::fmt;

use pex_eval::FormulaDialect;

/// Options accepted after the command name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    /// `-p key=value`, in command-line order. Values are percent-expressions.
    pub params: Vec<(String, String)>,
    /// `--scope a,b`: scope filter of the evaluation context.
    pub scope: Option<String>,
    /// `--dialect`: formula dialect for `rpn` and `infix`.
    pub dialect: FormulaDialect,
    /// `--env`: fall back to environment variables for unknown keys.
    pub use_env: bool,
    /// `--raw`: print values without their type.
    pub raw: bool,
    /// Remaining arguments.
    pub positional: Vec<String>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            params: Vec::new(),
            scope: None,
            dialect: FormulaDialect::RpnWithPercents,
            use_env: false,
            raw: false,
            positional: Vec::new(),
        }
    }
}

/// Why the command line could not be parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArgError {
    MissingValue(String),
    BadParam(String),
    UnknownDialect(String),
    UnknownFlag(String),
}

impl fmt::Display for ArgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgError::MissingValue(flag) => write!(f, "`{flag}` needs a value"),
            ArgError::BadParam(param) => write!(f, "expected key=value, found `{param}`"),
            ArgError::UnknownDialect(name) => {
                write!(f, "unknown dialect `{name}` (expected percent, rpn or rpn-percents)")
            }
            ArgError::UnknownFlag(flag) => write!(f, "unknown option `{flag}`"),
        }
    }
}

impl std::error::Error for ArgError {}

/// Parse everything after the command name.
///
/// Flags and positional arguments may be interleaved; `--` ends flag
/// parsing so expressions starting with `-` can be passed.
pub fn parse_options(args: &[String]) -> Result<Options, ArgError> {
    let mut options = Options::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if let Some((flag, inline)) = split_inline(arg) {
            let mut value = || {
                inline
                    .map(str::to_owned)
                    .or_else(|| iter.next().cloned())
                    .ok_or_else(|| ArgError::MissingValue(flag.to_owned()))
            };
            match flag {
                "-p" | "--param" => {
                    let param = value()?;
                    let Some((key, val)) = param.split_once('=') else {
                        return Err(ArgError::BadParam(param));
                    };
                    if key.is_empty() {
                        return Err(ArgError::BadParam(param));
                    }
                    options.params.push((key.to_owned(), val.to_owned()));
                }
                "--scope" => options.scope = Some(value()?),
                "--dialect" => {
                    let name = value()?;
                    options.dialect =
                        FormulaDialect::from_name(&name).ok_or(ArgError::UnknownDialect(name))?;
                }
                "--env" => options.use_env = true,
                "-r" | "--raw" => options.raw = true,
                "--" => {
                    options.positional.extend(iter.by_ref().cloned());
                }
                _ => return Err(ArgError::UnknownFlag(arg.clone())),
            }
        } else {
            options.positional.push(arg.clone());
        }
    }
    Ok(options)
}

/// `--flag=value` → (`--flag`, Some(value)); `-x` → (`-x`, None); a
/// positional argument → None. A lone `-` is positional.
fn split_inline(arg: &str) -> Option<(&str, Option<&str>)> {
    if !arg.starts_with('-') || arg == "-" {
        return None;
    }
    if arg.starts_with("--") {
        if let Some((flag, value)) = arg.split_once('=') {
            return Some((flag, Some(value)));
        }
    }
    Some((arg, None))
}
