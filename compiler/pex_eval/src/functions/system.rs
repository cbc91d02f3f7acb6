//! Functions reading the outside world: clock, environment, external
//! parameter sets, random identifiers.

use std::fmt::{self, Write as _};

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Duration, FixedOffset, Local, SecondsFormat, TimeZone, Utc};
use pex_value::TypedValue;

use super::{raw_args, text_args};
use crate::context::EvalContext;
use crate::diagnostics::malformed_expression;
use crate::external::external_params;
use crate::percent;

/// `=date[:format[:relative[:timezone]]]`
///
/// - format: `iso` (default), `ms1970`, `s1970`, `rfc2822`, or a strftime
///   pattern
/// - relative: offsets applied to now, e.g. `-1d+2h`, `+30min`
/// - timezone: `local` (default), `utc`/`Z`, or a fixed offset `+02:00`
pub(super) fn date(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    let args = text_args(key, matched, ctx);
    let format = args.first().map_or("", String::as_str);
    let relative = args.get(1).map_or("", String::as_str);
    let zone = args.get(2).map_or("", |z| z.trim());

    let Some(delta) = parse_relative(relative) else {
        ctx.report(malformed_expression(relative, "invalid relative date"));
        return TypedValue::Null;
    };
    let Some(now) = Utc::now().checked_add_signed(delta) else {
        ctx.report(malformed_expression(relative, "relative date out of range"));
        return TypedValue::Null;
    };
    let rendered = match zone {
        "" | "local" => render(&now.with_timezone(&Local), format),
        "utc" | "UTC" | "Z" => render(&now, format),
        offset => match offset.parse::<FixedOffset>() {
            Ok(tz) => render(&now.with_timezone(&tz), format),
            Err(_) => {
                ctx.report(malformed_expression(offset, "invalid timezone"));
                return TypedValue::Null;
            }
        },
    };
    match rendered {
        Some(text) => text.into(),
        None => {
            ctx.report(malformed_expression(format, "invalid date format"));
            TypedValue::Null
        }
    }
}

fn render<Tz>(dt: &DateTime<Tz>, format: &str) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    match format {
        "" | "iso" => Some(dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
        "ms1970" => Some(dt.timestamp_millis().to_string()),
        "s1970" => Some(dt.timestamp().to_string()),
        "rfc2822" => Some(dt.to_rfc2822()),
        pattern => {
            let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
            if items.iter().any(|item| matches!(item, Item::Error)) {
                return None;
            }
            let mut out = String::new();
            write!(out, "{}", dt.format_with_items(items.into_iter())).ok()?;
            Some(out)
        }
    }
}

/// Sum of signed offsets like `-1d+2h30min`. Units: `ms`, `s`, `min`,
/// `h`, `d`, `w`. An empty string is no offset.
fn parse_relative(text: &str) -> Option<Duration> {
    let mut rest = text.trim();
    let mut total = Duration::zero();
    let mut sign = 1i64;
    while !rest.is_empty() {
        if let Some(r) = rest.strip_prefix('+') {
            sign = 1;
            rest = r;
        } else if let Some(r) = rest.strip_prefix('-') {
            sign = -1;
            rest = r;
        }
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return None;
        }
        let amount: i64 = rest[..digits].parse().ok()?;
        rest = &rest[digits..];
        let unit_len = rest.bytes().take_while(u8::is_ascii_alphabetic).count();
        let unit = &rest[..unit_len];
        rest = &rest[unit_len..];
        let amount = amount.checked_mul(sign)?;
        let step = match unit {
            "ms" => Duration::try_milliseconds(amount)?,
            "s" | "" => Duration::try_seconds(amount)?,
            "min" => Duration::try_minutes(amount)?,
            "h" => Duration::try_hours(amount)?,
            "d" => Duration::try_days(amount)?,
            "w" => Duration::try_weeks(amount)?,
            _ => return None,
        };
        total = total.checked_add(&step)?;
    }
    Some(total)
}

/// `=env:NAME[:default]`: process environment variable.
pub(super) fn env(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    let args = raw_args(key, matched);
    let Some(name) = args.first() else {
        return TypedValue::Null;
    };
    let name = percent::eval_text(name, ctx);
    match std::env::var(&name) {
        Ok(value) => value.into(),
        Err(_) => args.get(1).map_or(TypedValue::Null, |d| percent::eval(d, ctx)),
    }
}

/// `=ext:set:key[:default]`: value of `key` in a registered external
/// parameter set, evaluated in that set's own context.
pub(super) fn ext(key: &str, ctx: &EvalContext<'_>, matched: usize) -> TypedValue {
    let args = raw_args(key, matched);
    let (Some(set), Some(param)) = (args.first(), args.get(1)) else {
        return TypedValue::Null;
    };
    let set = percent::eval_text(set, ctx);
    let param = percent::eval_text(param, ctx);
    let found = external_params(&set).and_then(|provider| {
        let inner = ctx.nested_for_variable(&format!("=ext:{set}:{param}"));
        let inner = inner.with_provider(&*provider);
        provider.param_value(&param, &inner)
    });
    match found {
        Some(value) => value,
        None => args.get(2).map_or(TypedValue::Null, |d| percent::eval(d, ctx)),
    }
}

/// `=uuid`: random version 4 UUID, hyphenated.
pub(super) fn uuid(_key: &str, _ctx: &EvalContext<'_>, _matched: usize) -> TypedValue {
    uuid::Uuid::new_v4().hyphenated().to_string().into()
}
