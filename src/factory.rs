//! Builders for common expression shapes.
//!
//! Comparison builders put a freshly built path on the left and the given
//! value, unchanged, on the right. Every builder comes in three flavours:
//! object paths (`match_exp`), database paths (`match_db_exp`) and primary-key
//! paths (`match_db_id_exp`).
//!
//! ```
//! use qualex::factory::{and_exp, greater_exp, like_exp, match_exp};
//!
//! let expr = and_exp([
//!     match_exp("artistName", "Picasso").unwrap(),
//!     greater_exp("paintingArray.estimatedPrice", 3000).unwrap(),
//!     like_exp("paintingArray.paintingTitle", "G%", None).unwrap(),
//! ])
//! .unwrap();
//!
//! assert_eq!(
//!     expr.to_string(),
//!     r#"artistName = "Picasso" and paintingArray.estimatedPrice > 3000 and paintingArray.paintingTitle like "G%""#
//! );
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{
    alias::AliasConflictError,
    ast::{BinOp, Expr, LikeOp, Path, PathKind},
    parser::{ParseError, parse},
    transform::BindError,
    value::Value,
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FactoryError {
    #[error(transparent)]
    Path(#[from] AliasConflictError),

    #[error("'{0}' cannot be used as an escape character")]
    InvalidEscape(char),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Bind(#[from] BindError),
}

pub type Result<T, E = FactoryError> = std::result::Result<T, E>;

/// Separator in [`match_all_exp`] paths marking where each value gets its
/// own join.
pub const SPLIT_SEPARATOR: char = '|';

static SPLIT_ALIAS_ID: AtomicUsize = AtomicUsize::new(0);

/// Numbering for the aliases [`match_all_exp_with`] creates. Labels from one
/// generator never repeat, so expressions split with the same generator can
/// be joined without sharing a relationship copy. A fresh generator makes
/// the labels, and so the printed form, reproducible.
#[derive(Debug, Default)]
pub struct SplitAliases {
    next: usize,
}

impl SplitAliases {
    pub fn new() -> Self {
        SplitAliases::default()
    }

    fn next_base(&mut self) -> String {
        let base = split_alias_base(self.next);
        self.next += 1;
        base
    }
}

fn split_alias_base(id: usize) -> String {
    format!("split{}_", id)
}

/// Escape characters tried in order by the pattern helpers.
const ESCAPE_CANDIDATES: [char; 13] = [
    '!', '#', '@', '^', '~', '$', '&', '*', '+', '=', '|', '/', '\\',
];

// ========================================
// Leaves and joins
// ========================================

pub fn path_exp(path: &str) -> Result<Expr> {
    Ok(Expr::Path(Path::with_kind(PathKind::Object, path)?))
}

pub fn db_path_exp(path: &str) -> Result<Expr> {
    Ok(Expr::Path(Path::with_kind(PathKind::Db, path)?))
}

pub fn db_id_path_exp(path: &str) -> Result<Expr> {
    Ok(Expr::Path(Path::with_kind(PathKind::DbId, path)?))
}

pub fn exp_true() -> Expr {
    Expr::True
}

pub fn exp_false() -> Expr {
    Expr::False
}

/// Expression node for a value: a list becomes a LIST node, anything else a
/// scalar.
pub fn wrap_scalar(value: impl Into<Value>) -> Expr {
    match value.into() {
        Value::List(items) => Expr::List(items.into_iter().map(wrap_scalar).collect()),
        other => Expr::Scalar(other),
    }
}

/// Parse `text` and bind its parameters by position.
///
/// ```
/// use qualex::factory::exp;
///
/// let e = exp("artistName in ($ap, $bp)", &["a".into(), "b".into()]).unwrap();
/// assert_eq!(e.to_string(), r#"artistName in ("a", "b")"#);
/// ```
pub fn exp(text: &str, positional: &[Value]) -> Result<Expr> {
    let parsed = parse(text)?;
    if positional.is_empty() && parsed.param_names().is_empty() {
        return Ok(parsed);
    }
    Ok(parsed.params_positional(positional)?)
}

/// Join under AND: `None` for no expressions, the expression itself for one,
/// one AND node over all of them otherwise.
pub fn and_exp(exprs: impl IntoIterator<Item = Expr>) -> Option<Expr> {
    join(exprs, Expr::And)
}

/// Join under OR, folding like [`and_exp`].
pub fn or_exp(exprs: impl IntoIterator<Item = Expr>) -> Option<Expr> {
    join(exprs, Expr::Or)
}

fn join(exprs: impl IntoIterator<Item = Expr>, wrap: fn(Vec<Expr>) -> Expr) -> Option<Expr> {
    let mut exprs: Vec<Expr> = exprs.into_iter().collect();
    match exprs.len() {
        0 => None,
        1 => exprs.pop(),
        _ => Some(wrap(exprs)),
    }
}

// ========================================
// Comparisons
// ========================================

fn compare(kind: PathKind, path: &str, op: BinOp, value: Value) -> Result<Expr> {
    Ok(Expr::binary(
        op,
        Expr::Path(Path::with_kind(kind, path)?),
        wrap_scalar(value),
    ))
}

macro_rules! comparison_builders {
    ($($(#[$doc:meta])* $op:path => $obj:ident, $db:ident, $db_id:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $obj(path: &str, value: impl Into<Value>) -> Result<Expr> {
                compare(PathKind::Object, path, $op, value.into())
            }

            pub fn $db(path: &str, value: impl Into<Value>) -> Result<Expr> {
                compare(PathKind::Db, path, $op, value.into())
            }

            pub fn $db_id(path: &str, value: impl Into<Value>) -> Result<Expr> {
                compare(PathKind::DbId, path, $op, value.into())
            }
        )*
    };
}

comparison_builders! {
    /// `path = value`
    BinOp::Equal => match_exp, match_db_exp, match_db_id_exp;
    /// `path != value`. Over a to-many path this is true when any related
    /// value differs, so it is not the complement of [`match_exp`].
    BinOp::NotEqual => no_match_exp, no_match_db_exp, no_match_db_id_exp;
    /// `path < value`
    BinOp::LessThan => less_exp, less_db_exp, less_db_id_exp;
    /// `path <= value`
    BinOp::LessEqual => less_or_equal_exp, less_or_equal_db_exp, less_or_equal_db_id_exp;
    /// `path > value`
    BinOp::GreaterThan => greater_exp, greater_db_exp, greater_db_id_exp;
    /// `path >= value`
    BinOp::GreaterEqual => greater_or_equal_exp, greater_or_equal_db_exp, greater_or_equal_db_id_exp;
}

// ========================================
// Membership and ranges
// ========================================

fn membership<V: Into<Value>>(
    kind: PathKind,
    path: &str,
    values: impl IntoIterator<Item = V>,
    negated: bool,
) -> Result<Expr> {
    let path = Expr::Path(Path::with_kind(kind, path)?);
    let items: Vec<Expr> = values.into_iter().map(wrap_scalar).collect();
    if items.is_empty() {
        return Ok(if negated { Expr::True } else { Expr::False });
    }
    let op = if negated { BinOp::NotIn } else { BinOp::In };
    Ok(Expr::binary(op, path, Expr::List(items)))
}

/// `path in (values...)`; an empty collection yields the FALSE constant.
pub fn in_exp<V: Into<Value>>(path: &str, values: impl IntoIterator<Item = V>) -> Result<Expr> {
    membership(PathKind::Object, path, values, false)
}

pub fn in_db_exp<V: Into<Value>>(path: &str, values: impl IntoIterator<Item = V>) -> Result<Expr> {
    membership(PathKind::Db, path, values, false)
}

pub fn in_db_id_exp<V: Into<Value>>(
    path: &str,
    values: impl IntoIterator<Item = V>,
) -> Result<Expr> {
    membership(PathKind::DbId, path, values, false)
}

/// `path not in (values...)`; an empty collection yields the TRUE constant.
pub fn not_in_exp<V: Into<Value>>(path: &str, values: impl IntoIterator<Item = V>) -> Result<Expr> {
    membership(PathKind::Object, path, values, true)
}

pub fn not_in_db_exp<V: Into<Value>>(
    path: &str,
    values: impl IntoIterator<Item = V>,
) -> Result<Expr> {
    membership(PathKind::Db, path, values, true)
}

pub fn not_in_db_id_exp<V: Into<Value>>(
    path: &str,
    values: impl IntoIterator<Item = V>,
) -> Result<Expr> {
    membership(PathKind::DbId, path, values, true)
}

fn range(kind: PathKind, path: &str, lower: Value, upper: Value, negated: bool) -> Result<Expr> {
    Ok(Expr::Between {
        negated,
        operand: Box::new(Expr::Path(Path::with_kind(kind, path)?)),
        lower: Box::new(wrap_scalar(lower)),
        upper: Box::new(wrap_scalar(upper)),
    })
}

pub fn between_exp(path: &str, lower: impl Into<Value>, upper: impl Into<Value>) -> Result<Expr> {
    range(PathKind::Object, path, lower.into(), upper.into(), false)
}

pub fn between_db_exp(path: &str, lower: impl Into<Value>, upper: impl Into<Value>) -> Result<Expr> {
    range(PathKind::Db, path, lower.into(), upper.into(), false)
}

pub fn between_db_id_exp(
    path: &str,
    lower: impl Into<Value>,
    upper: impl Into<Value>,
) -> Result<Expr> {
    range(PathKind::DbId, path, lower.into(), upper.into(), false)
}

pub fn not_between_exp(path: &str, lower: impl Into<Value>, upper: impl Into<Value>) -> Result<Expr> {
    range(PathKind::Object, path, lower.into(), upper.into(), true)
}

pub fn not_between_db_exp(
    path: &str,
    lower: impl Into<Value>,
    upper: impl Into<Value>,
) -> Result<Expr> {
    range(PathKind::Db, path, lower.into(), upper.into(), true)
}

pub fn not_between_db_id_exp(
    path: &str,
    lower: impl Into<Value>,
    upper: impl Into<Value>,
) -> Result<Expr> {
    range(PathKind::DbId, path, lower.into(), upper.into(), true)
}

// ========================================
// Multi-value matching
// ========================================

/// Require `path` to match every value.
///
/// A `|` in place of a `.` splits the join at that point: each value then
/// gets its own auto-aliased copy of the relationship after the separator,
/// so "has a painting titled A and a painting titled B" can be expressed.
///
/// ```
/// use qualex::factory::match_all_exp;
/// use qualex::ExprKind;
///
/// let e = match_all_exp("paintingArray|toGallery.galleryName", ["A", "B"]).unwrap();
/// assert_eq!(e.kind(), ExprKind::And);
///
/// let empty: [&str; 0] = [];
/// assert_eq!(match_all_exp("paintingArray", empty).unwrap().kind(), ExprKind::True);
/// ```
///
/// Split aliases are numbered process-wide, so labels differ between calls.
/// Use [`match_all_exp_with`] for reproducible labels.
pub fn match_all_exp<V: Into<Value>>(path: &str, values: impl IntoIterator<Item = V>) -> Result<Expr> {
    split_match_all(path, values, || {
        split_alias_base(SPLIT_ALIAS_ID.fetch_add(1, Ordering::Relaxed))
    })
}

/// [`match_all_exp`] drawing split aliases from `aliases`.
///
/// ```
/// use qualex::factory::{match_all_exp_with, SplitAliases};
///
/// let e = match_all_exp_with(&mut SplitAliases::new(), "|paintingArray", [11, 12]).unwrap();
/// assert_eq!(
///     e.to_string(),
///     "paintingArray#split0_0 = 11 and paintingArray#split0_1 = 12"
/// );
/// ```
pub fn match_all_exp_with<V: Into<Value>>(
    aliases: &mut SplitAliases,
    path: &str,
    values: impl IntoIterator<Item = V>,
) -> Result<Expr> {
    split_match_all(path, values, || aliases.next_base())
}

fn split_match_all<V: Into<Value>>(
    path: &str,
    values: impl IntoIterator<Item = V>,
    alias_base: impl FnOnce() -> String,
) -> Result<Expr> {
    let values: Vec<Value> = values.into_iter().map(Into::into).collect();
    if values.is_empty() {
        return Ok(Expr::True);
    }

    let split = path
        .find(SPLIT_SEPARATOR)
        .filter(|&at| at + SPLIT_SEPARATOR.len_utf8() < path.len());

    let mut matches = Vec::with_capacity(values.len());
    match split {
        Some(at) => {
            let before = &path[..at];
            let rest = &path[at + SPLIT_SEPARATOR.len_utf8()..];
            let (chunk, after) = match rest.split_once('.') {
                Some((chunk, after)) => (chunk, Some(after)),
                None => (rest, None),
            };

            let alias_base = alias_base();
            for (i, value) in values.into_iter().enumerate() {
                let mut raw = String::new();
                if !before.is_empty() {
                    raw.push_str(before);
                    raw.push('.');
                }
                raw.push_str(&format!("{}#{}{}", chunk, alias_base, i));
                if let Some(after) = after {
                    raw.push('.');
                    raw.push_str(after);
                }
                matches.push(compare(PathKind::Object, &raw, BinOp::Equal, value)?);
            }
        }
        None => {
            for value in values {
                matches.push(compare(PathKind::Object, path, BinOp::Equal, value)?);
            }
        }
    }

    // `values` is non-empty, so the join always produces an expression
    Ok(and_exp(matches).unwrap_or(Expr::True))
}

fn match_pairs<K, V>(
    pairs: impl IntoIterator<Item = (K, V)>,
    op: BinOp,
    wrap: fn(Vec<Expr>) -> Option<Expr>,
) -> Result<Option<Expr>>
where
    K: AsRef<str>,
    V: Into<Value>,
{
    let exprs = pairs
        .into_iter()
        .map(|(path, value)| compare(PathKind::Object, path.as_ref(), op, value.into()))
        .collect::<Result<Vec<_>>>()?;
    Ok(wrap(exprs))
}

/// One `path <op> value` per pair, joined by AND.
pub fn match_all_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>, op: BinOp) -> Result<Option<Expr>>
where
    K: AsRef<str>,
    V: Into<Value>,
{
    match_pairs(pairs, op, |exprs| and_exp(exprs))
}

/// One `path <op> value` per pair, joined by OR.
pub fn match_any_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>, op: BinOp) -> Result<Option<Expr>>
where
    K: AsRef<str>,
    V: Into<Value>,
{
    match_pairs(pairs, op, |exprs| or_exp(exprs))
}

// ========================================
// Pattern matching
// ========================================

fn pattern(kind: PathKind, path: &str, op: LikeOp, value: Value, escape: Option<char>) -> Result<Expr> {
    if let Some(c @ '?') = escape {
        return Err(FactoryError::InvalidEscape(c));
    }
    Ok(Expr::Like {
        op,
        operand: Box::new(Expr::Path(Path::with_kind(kind, path)?)),
        pattern: Box::new(wrap_scalar(value)),
        escape,
    })
}

macro_rules! like_builders {
    ($($(#[$doc:meta])* $op:path => $obj:ident, $db:ident, $db_id:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $obj(path: &str, value: impl Into<Value>, escape: Option<char>) -> Result<Expr> {
                pattern(PathKind::Object, path, $op, value.into(), escape)
            }

            pub fn $db(path: &str, value: impl Into<Value>, escape: Option<char>) -> Result<Expr> {
                pattern(PathKind::Db, path, $op, value.into(), escape)
            }

            pub fn $db_id(path: &str, value: impl Into<Value>, escape: Option<char>) -> Result<Expr> {
                pattern(PathKind::DbId, path, $op, value.into(), escape)
            }
        )*
    };
}

like_builders! {
    /// `path like value`. The escape character cannot be `?`.
    LikeOp::Like => like_exp, like_db_exp, like_db_id_exp;
    LikeOp::NotLike => not_like_exp, not_like_db_exp, not_like_db_id_exp;
    LikeOp::LikeIgnoreCase => like_ignore_case_exp, like_ignore_case_db_exp, like_ignore_case_db_id_exp;
    LikeOp::NotLikeIgnoreCase => not_like_ignore_case_exp, not_like_ignore_case_db_exp, not_like_ignore_case_db_id_exp;
}

/// Pick an escape character for `literal`: `None` if it contains no
/// wildcard, otherwise the first candidate that does not occur in it.
pub fn escape_for(literal: &str) -> Option<char> {
    if !literal.contains(['%', '_']) {
        return None;
    }
    let escape = ESCAPE_CANDIDATES
        .into_iter()
        .chain((0xE000..=0xF8FF).filter_map(char::from_u32))
        .find(|c| !literal.contains(*c));
    log::debug!("escape character {:?} selected for {:?}", escape, literal);
    escape
}

/// Escape the wildcards in `literal`, returning the pattern body and the
/// escape character used.
///
/// ```
/// use qualex::factory::escape_wildcards;
///
/// assert_eq!(escape_wildcards("a%bc"), ("a!%bc".to_string(), Some('!')));
/// assert_eq!(escape_wildcards("a_!bc"), ("a#_!bc".to_string(), Some('#')));
/// assert_eq!(escape_wildcards("abc"), ("abc".to_string(), None));
/// ```
pub fn escape_wildcards(literal: &str) -> (String, Option<char>) {
    let Some(escape) = escape_for(literal) else {
        return (literal.to_string(), None);
    };
    let mut body = String::with_capacity(literal.len() + 2);
    for c in literal.chars() {
        if c == '%' || c == '_' {
            body.push(escape);
        }
        body.push(c);
    }
    (body, Some(escape))
}

fn affix(path: &str, literal: &str, prefix: &str, suffix: &str, op: LikeOp) -> Result<Expr> {
    let (body, escape) = escape_wildcards(literal);
    pattern(
        PathKind::Object,
        path,
        op,
        Value::String(format!("{}{}{}", prefix, body, suffix)),
        escape,
    )
}

/// `path like "%literal%"`, with wildcards in `literal` escaped.
pub fn contains_exp(path: &str, literal: &str) -> Result<Expr> {
    affix(path, literal, "%", "%", LikeOp::Like)
}

pub fn starts_with_exp(path: &str, literal: &str) -> Result<Expr> {
    affix(path, literal, "", "%", LikeOp::Like)
}

pub fn ends_with_exp(path: &str, literal: &str) -> Result<Expr> {
    affix(path, literal, "%", "", LikeOp::Like)
}

pub fn contains_ignore_case_exp(path: &str, literal: &str) -> Result<Expr> {
    affix(path, literal, "%", "%", LikeOp::LikeIgnoreCase)
}

pub fn starts_with_ignore_case_exp(path: &str, literal: &str) -> Result<Expr> {
    affix(path, literal, "", "%", LikeOp::LikeIgnoreCase)
}

pub fn ends_with_ignore_case_exp(path: &str, literal: &str) -> Result<Expr> {
    affix(path, literal, "%", "", LikeOp::LikeIgnoreCase)
}

// ========================================
// Functions
// ========================================

fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Function {
        name: name.to_string(),
        args,
    }
}

pub fn upper_exp(arg: Expr) -> Expr {
    call("upper", vec![arg])
}

pub fn lower_exp(arg: Expr) -> Expr {
    call("lower", vec![arg])
}

pub fn trim_exp(arg: Expr) -> Expr {
    call("trim", vec![arg])
}

pub fn length_exp(arg: Expr) -> Expr {
    call("length", vec![arg])
}

pub fn concat_exp(args: impl IntoIterator<Item = Expr>) -> Expr {
    call("concat", args.into_iter().collect())
}

/// `substring(arg, offset, length)` with a 1-based offset.
pub fn substring_exp(arg: Expr, offset: i64, length: i64) -> Expr {
    call(
        "substring",
        vec![arg, Expr::scalar(offset), Expr::scalar(length)],
    )
}

/// 1-based position of `needle` in `arg`, 0 when absent.
pub fn locate_exp(needle: &str, arg: Expr) -> Expr {
    call("locate", vec![Expr::scalar(needle), arg])
}

pub fn abs_exp(arg: Expr) -> Expr {
    call("abs", vec![arg])
}

pub fn sqrt_exp(arg: Expr) -> Expr {
    call("sqrt", vec![arg])
}

pub fn mod_exp(arg: Expr, divisor: impl Into<Value>) -> Expr {
    call("mod", vec![arg, wrap_scalar(divisor)])
}

// ========================================
// Aggregates
// ========================================

/// `count()`: the number of rows.
pub fn count_all_exp() -> Expr {
    call("count", vec![])
}

/// Number of non-null values of `arg`.
pub fn count_exp(arg: Expr) -> Expr {
    call("count", vec![arg])
}

pub fn count_distinct_exp(arg: Expr) -> Expr {
    call("countDistinct", vec![arg])
}

pub fn min_exp(arg: Expr) -> Expr {
    call("min", vec![arg])
}

pub fn max_exp(arg: Expr) -> Expr {
    call("max", vec![arg])
}

pub fn avg_exp(arg: Expr) -> Expr {
    call("avg", vec![arg])
}

pub fn sum_exp(arg: Expr) -> Expr {
    call("sum", vec![arg])
}

// ========================================
// Dates and times
// ========================================

pub fn current_date_exp() -> Expr {
    call("currentDate", vec![])
}

pub fn current_time_exp() -> Expr {
    call("currentTime", vec![])
}

pub fn current_timestamp_exp() -> Expr {
    call("currentTimestamp", vec![])
}

pub fn year_exp(arg: Expr) -> Expr {
    call("year", vec![arg])
}

pub fn month_exp(arg: Expr) -> Expr {
    call("month", vec![arg])
}

pub fn week_exp(arg: Expr) -> Expr {
    call("week", vec![arg])
}

pub fn day_of_year_exp(arg: Expr) -> Expr {
    call("dayOfYear", vec![arg])
}

/// Day of the month, 1 to 31.
pub fn day_of_month_exp(arg: Expr) -> Expr {
    call("dayOfMonth", vec![arg])
}

pub fn day_of_week_exp(arg: Expr) -> Expr {
    call("dayOfWeek", vec![arg])
}

pub fn hour_exp(arg: Expr) -> Expr {
    call("hour", vec![arg])
}

pub fn minute_exp(arg: Expr) -> Expr {
    call("minute", vec![arg])
}

pub fn second_exp(arg: Expr) -> Expr {
    call("second", vec![arg])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExprKind;

    #[test]
    fn join_folding() {
        assert_eq!(and_exp([]), None);

        let single = match_exp("a", 1).unwrap();
        assert_eq!(and_exp([single.clone()]), Some(single.clone()));

        let joined = or_exp([single.clone(), single.clone(), single]).unwrap();
        assert_eq!(joined.kind(), ExprKind::Or);
        assert_eq!(joined.operand_count(), 3);
    }

    #[test]
    fn empty_membership_folds() {
        let none: Vec<i64> = vec![];
        assert_eq!(in_exp("a", none.clone()).unwrap(), Expr::False);
        assert_eq!(not_in_exp("a", none).unwrap(), Expr::True);
    }

    #[test]
    fn db_flavours() {
        let e = match_db_exp("ARTIST_NAME", "x").unwrap();
        assert_eq!(e.operands()[0].kind(), ExprKind::DbPath);
        let e = in_db_id_exp("ARTIST_ID", [1, 2]).unwrap();
        assert_eq!(e.operands()[0].kind(), ExprKind::DbIdPath);
    }

    #[test]
    fn question_mark_escape_is_rejected() {
        assert_eq!(
            like_exp("a", "x?%", Some('?')),
            Err(FactoryError::InvalidEscape('?'))
        );
    }

    #[test]
    fn escape_selection_avoids_literal_content() {
        assert_eq!(escape_for("abc"), None);
        assert_eq!(escape_for("a%bc"), Some('!'));
        assert_eq!(escape_for("a_!bc"), Some('#'));
        let all: String = ESCAPE_CANDIDATES.iter().collect::<String>() + "%";
        let chosen = escape_for(&all).unwrap();
        assert!(!all.contains(chosen));
    }

    #[test]
    fn contains_wraps_and_escapes() {
        let e = contains_exp("name", "50%").unwrap();
        assert_eq!(e.to_string(), r#"name like "%50!%%" escape "!""#);

        let e = starts_with_ignore_case_exp("name", "pic").unwrap();
        assert_eq!(e.to_string(), r#"name likeIgnoreCase "pic%""#);
    }

    #[test]
    fn split_creates_one_alias_per_value() {
        let e = match_all_exp("paintingArray|toGallery.galleryName", ["A", "B"]).unwrap();
        let Expr::And(children) = &e else {
            panic!("expected AND, got {:?}", e.kind());
        };
        let labels: Vec<String> = children
            .iter()
            .map(|c| match c.operands()[0] {
                Expr::Path(p) => p.path_string(),
                other => panic!("expected path, got {:?}", other.kind()),
            })
            .collect();
        assert_eq!(labels.len(), 2);
        assert_ne!(labels[0], labels[1]);
        assert!(labels[0].starts_with("paintingArray.split"));
        assert!(labels[0].ends_with("_0.galleryName"));
    }

    #[test]
    fn match_all_without_split() {
        let e = match_all_exp("a", [1]).unwrap();
        assert_eq!(e, match_exp("a", 1).unwrap());
    }

    #[test]
    fn pairs() {
        let e = match_any_pairs([("a", 1), ("b", 2)], BinOp::GreaterThan)
            .unwrap()
            .unwrap();
        assert_eq!(e.to_string(), "a > 1 or b > 2");
        let none: Vec<(&str, i64)> = vec![];
        assert_eq!(match_all_pairs(none, BinOp::Equal).unwrap(), None);
    }

    #[test]
    fn exp_binds_positionally() {
        let e = exp("a = $x and b = $y", &[1.into(), "q".into()]).unwrap();
        assert_eq!(e.to_string(), r#"a = 1 and b = "q""#);
    }

    #[test]
    fn function_builders() {
        let e = substring_exp(path_exp("artistName").unwrap(), 1, 3);
        assert_eq!(e.to_string(), "substring(artistName, 1, 3)");
        let e = mod_exp(path_exp("estimatedPrice").unwrap(), 7);
        assert_eq!(e.to_string(), "mod(estimatedPrice, 7)");
    }
}
