use std::cmp::Ordering;

use rust_decimal::{Decimal, MathematicalOps, prelude::FromPrimitive};

use crate::{
    accessor::{AccessError, EnumResolver, PropertyAccessor, PropertyKind},
    alias::AliasConflictError,
    ast::{BinOp, EnumRef, Expr, LikeOp, Path, Segment, UnOp},
    like::LikePattern,
    value::Value,
};

/// Errors that can occur during evaluation.
///
/// Absent data is never an error: a null in the middle of a path yields null
/// and comparisons against null yield false.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// Type mismatch or invalid operation for the given type
    #[error("type error: {0}")]
    TypeError(String),

    #[error("unknown property '{0}'")]
    UnknownProperty(String),

    #[error("cannot resolve enum:{0}")]
    UnresolvedEnum(String),

    /// A to-many path used where a single value is required
    #[error("illegal fan-out: {0}")]
    IllegalFanOut(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    /// Date and time functions have no in-memory value type to work on
    #[error("{0}() can only be rendered, not evaluated in memory")]
    NotEvaluable(String),

    #[error("parameter ${0} is not bound")]
    UnboundParameter(String),

    /// Failure reported by the host object model
    #[error(transparent)]
    Collaborator(#[from] AccessError),

    #[error(transparent)]
    Alias(#[from] AliasConflictError),
}

impl EvalError {
    fn type_error(msg: impl Into<String>) -> Self {
        EvalError::TypeError(msg.into())
    }
}

/// Result of evaluating an operand: a single value, or the sequence produced
/// by navigating a to-many relationship.
#[derive(Debug, Clone)]
enum Operand {
    One(Value),
    Many(Vec<Value>),
}

impl Operand {
    fn into_value(self) -> Value {
        match self {
            Operand::One(v) => v,
            Operand::Many(items) => Value::List(items),
        }
    }

    /// Exactly one value, or an error naming `context` if this is a fan-out.
    fn single(self, context: &str) -> Result<Value, EvalError> {
        match self {
            Operand::One(v) => Ok(v),
            Operand::Many(_) => Err(EvalError::IllegalFanOut(format!(
                "to-many path cannot be used as an operand of {}",
                context
            ))),
        }
    }

    /// True if `test` holds for the value, or for any value of a fan-out.
    /// An empty fan-out yields `when_empty`.
    fn any(
        &self,
        when_empty: bool,
        mut test: impl FnMut(&Value) -> Result<bool, EvalError>,
    ) -> Result<bool, EvalError> {
        match self {
            Operand::One(v) => test(v),
            Operand::Many(items) => {
                if items.is_empty() {
                    return Ok(when_empty);
                }
                for item in items {
                    if test(item)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

/// One navigation step from a single object.
enum Step {
    Value(Value),
    /// A to-one relationship with no target
    Missing,
    Many(Vec<Value>),
}

/// Evaluates expressions against host objects.
///
/// Property reads and relationship navigation go through the supplied
/// [`PropertyAccessor`]. The evaluator holds no state between calls.
///
/// # Examples
///
/// ```
/// use qualex::{parse, Evaluator, Value};
/// use qualex::json::JsonObjectModel;
/// use serde_json::json;
///
/// let artist = JsonObjectModel::object(json!({
///     "artistName": "Picasso",
///     "paintingArray": [
///         {"paintingTitle": "Guernica", "estimatedPrice": 20000},
///         {"paintingTitle": "La Vie", "estimatedPrice": 4000}
///     ]
/// }));
///
/// let model = JsonObjectModel::new();
/// let evaluator = Evaluator::new(&model);
///
/// let expr = parse("paintingArray.estimatedPrice > 10000").unwrap();
/// assert!(evaluator.matches(&expr, &artist).unwrap());
/// ```
pub struct Evaluator<'a> {
    accessor: &'a dyn PropertyAccessor,
    enums: Option<&'a dyn EnumResolver>,
}

impl<'a> Evaluator<'a> {
    pub fn new(accessor: &'a dyn PropertyAccessor) -> Self {
        Evaluator {
            accessor,
            enums: None,
        }
    }

    pub fn with_enums(mut self, enums: &'a dyn EnumResolver) -> Self {
        self.enums = Some(enums);
        self
    }

    /// Evaluate `expr` against `subject`.
    ///
    /// A list subject is evaluated element by element and yields the list of
    /// results. A to-many path yields the list of values it reaches.
    pub fn evaluate(&self, expr: &Expr, subject: &Value) -> Result<Value, EvalError> {
        match subject {
            Value::List(items) => items
                .iter()
                .map(|item| self.evaluate(expr, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            _ => Ok(self.eval_operand(expr, subject)?.into_value()),
        }
    }

    /// Evaluate `expr` as a condition. A list subject matches when any of its
    /// elements does.
    pub fn matches(&self, expr: &Expr, subject: &Value) -> Result<bool, EvalError> {
        match subject {
            Value::List(items) => {
                for item in items {
                    if self.matches(expr, item)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            _ => Ok(self.eval_operand(expr, subject)?.into_value().as_bool()),
        }
    }

    /// Subjects matching `expr`, in order.
    pub fn filter<'v>(&self, expr: &Expr, subjects: &'v [Value]) -> Result<Vec<&'v Value>, EvalError> {
        let mut matched = Vec::new();
        for subject in subjects {
            if self.matches(expr, subject)? {
                matched.push(subject);
            }
        }
        Ok(matched)
    }

    /// First subject matching `expr`.
    pub fn first<'v>(&self, expr: &Expr, subjects: &'v [Value]) -> Result<Option<&'v Value>, EvalError> {
        for subject in subjects {
            if self.matches(expr, subject)? {
                return Ok(Some(subject));
            }
        }
        Ok(None)
    }

    fn eval_operand(&self, expr: &Expr, subject: &Value) -> Result<Operand, EvalError> {
        match expr {
            Expr::Path(path) => self.eval_path(path, subject),
            Expr::Scalar(v) => Ok(Operand::One(v.clone())),
            Expr::Enum(e) => self.resolve_enum(e).map(Operand::One),
            Expr::Param(name) => Err(EvalError::UnboundParameter(name.clone())),
            Expr::True => Ok(Operand::One(Value::Boolean(true))),
            Expr::False => Ok(Operand::One(Value::Boolean(false))),
            Expr::UnaryOp { op, operand } => {
                let value = self.eval_operand(operand, subject)?;
                self.apply_unop(*op, value).map(Operand::One)
            }
            Expr::BinaryOp { op, left, right } => {
                let left = self.eval_operand(left, subject)?;
                let right = self.eval_operand(right, subject)?;
                self.apply_binop(*op, left, right).map(Operand::One)
            }
            Expr::Like {
                op,
                operand,
                pattern,
                escape,
            } => {
                let operand = self.eval_operand(operand, subject)?;
                let pattern = self.eval_operand(pattern, subject)?.single("like")?;
                self.apply_like(*op, operand, &pattern, *escape)
                    .map(|b| Operand::One(Value::Boolean(b)))
            }
            Expr::Between {
                negated,
                operand,
                lower,
                upper,
            } => {
                let operand = self.eval_operand(operand, subject)?;
                let lower = self.eval_operand(lower, subject)?.single("between")?;
                let upper = self.eval_operand(upper, subject)?.single("between")?;
                self.apply_between(*negated, operand, &lower, &upper)
                    .map(|b| Operand::One(Value::Boolean(b)))
            }
            Expr::And(children) => {
                for child in children {
                    if !self.eval_operand(child, subject)?.into_value().as_bool() {
                        return Ok(Operand::One(Value::Boolean(false)));
                    }
                }
                Ok(Operand::One(Value::Boolean(true)))
            }
            Expr::Or(children) => {
                for child in children {
                    if self.eval_operand(child, subject)?.into_value().as_bool() {
                        return Ok(Operand::One(Value::Boolean(true)));
                    }
                }
                Ok(Operand::One(Value::Boolean(false)))
            }
            Expr::Function { name, args } if is_aggregate(name) => {
                let values = match args.as_slice() {
                    [] => None,
                    [arg] => Some(self.eval_operand(arg, subject)?),
                    _ => {
                        return Err(EvalError::type_error(format!(
                            "{}() takes at most one argument, got {}",
                            name,
                            args.len()
                        )));
                    }
                };
                self.aggregate(name, values).map(Operand::One)
            }
            Expr::Function { name, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.eval_operand(arg, subject)?.single(name))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call_function(name, args).map(Operand::One)
            }
            Expr::List(items) => items
                .iter()
                .map(|item| Ok(self.eval_operand(item, subject)?.into_value()))
                .collect::<Result<Vec<_>, EvalError>>()
                .map(|values| Operand::One(Value::List(values))),
        }
    }

    fn resolve_enum(&self, e: &EnumRef) -> Result<Value, EvalError> {
        self.enums
            .and_then(|enums| enums.resolve_enum_member(&e.type_name, &e.member))
            .ok_or_else(|| EvalError::UnresolvedEnum(e.qualified()))
    }

    // ========================================
    // Paths
    // ========================================

    fn eval_path(&self, path: &Path, subject: &Value) -> Result<Operand, EvalError> {
        let mut state = Operand::One(subject.clone());

        for segment in path.segments() {
            state = match state {
                // A null before the end of the path makes the whole path null
                Operand::One(Value::Null) => return Ok(Operand::One(Value::Null)),
                Operand::One(current) => match self.step(&current, segment)? {
                    Step::Value(v) => Operand::One(v),
                    Step::Missing => Operand::One(Value::Null),
                    Step::Many(items) => {
                        log::trace!("fan-out at '{}': {} object(s)", segment.name, items.len());
                        Operand::Many(items)
                    }
                },
                Operand::Many(items) => {
                    let mut reached = Vec::with_capacity(items.len());
                    for item in items {
                        if item.is_null() {
                            reached.push(item);
                            continue;
                        }
                        match self.step(&item, segment)? {
                            Step::Value(v) => reached.push(v),
                            Step::Missing if segment.outer => reached.push(Value::Null),
                            Step::Missing => {}
                            Step::Many(more) => reached.extend(more),
                        }
                    }
                    Operand::Many(reached)
                }
            };
        }
        Ok(state)
    }

    fn step(&self, current: &Value, segment: &Segment) -> Result<Step, EvalError> {
        let object = match current {
            Value::Object(o) => o,
            other => {
                return Err(EvalError::type_error(format!(
                    "cannot read '{}' from {}",
                    segment.name,
                    other.type_name()
                )));
            }
        };

        match self.accessor.property_kind(object, &segment.name) {
            None => Err(EvalError::UnknownProperty(segment.name.clone())),
            Some(PropertyKind::Attribute) => {
                if let Some(alias) = &segment.alias {
                    return Err(AliasConflictError::NonRelationship {
                        alias: alias.clone(),
                        segment: segment.name.clone(),
                    }
                    .into());
                }
                Ok(Step::Value(self.accessor.read_attribute(object, &segment.name)?))
            }
            Some(PropertyKind::ToOne) => Ok(
                match self.accessor.navigate_to_one(object, &segment.name)? {
                    Some(target) => Step::Value(Value::Object(target)),
                    None => Step::Missing,
                },
            ),
            Some(PropertyKind::ToMany) => Ok(Step::Many(
                self.accessor
                    .navigate_to_many(object, &segment.name)?
                    .into_iter()
                    .map(Value::Object)
                    .collect(),
            )),
        }
    }

    // ========================================
    // Operators
    // ========================================

    fn apply_unop(&self, op: UnOp, operand: Operand) -> Result<Value, EvalError> {
        match op {
            UnOp::Not => Ok(Value::Boolean(!operand.into_value().as_bool())),
            UnOp::Negate => match operand.single("negation")? {
                Value::Null => Ok(Value::Null),
                Value::Integer(n) => Ok(n
                    .checked_neg()
                    .map(Value::Integer)
                    .unwrap_or_else(|| Value::Decimal(-Decimal::from(n)))),
                Value::Decimal(d) => Ok(Value::Decimal(-d)),
                Value::Float(n) => Ok(Value::Float(-n)),
                v => Err(EvalError::type_error(format!("cannot negate {}", v.type_name()))),
            },
            UnOp::BitNot => match operand.single("bitwise not")? {
                Value::Null => Ok(Value::Null),
                v => v
                    .as_i64()
                    .map(|n| Value::Integer(!n))
                    .ok_or_else(|| {
                        EvalError::type_error(format!("cannot complement {}", v.type_name()))
                    }),
            },
        }
    }

    fn apply_binop(&self, op: BinOp, left: Operand, right: Operand) -> Result<Value, EvalError> {
        match op {
            BinOp::Add | BinOp::Subtract | BinOp::Multiply | BinOp::Divide => {
                let l = left.single(op.symbol())?;
                let r = right.single(op.symbol())?;
                arithmetic(op, &l, &r)
            }
            BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor | BinOp::ShiftLeft | BinOp::ShiftRight => {
                let l = left.single(op.symbol())?;
                let r = right.single(op.symbol())?;
                bitwise(op, &l, &r)
            }
            BinOp::Equal => left
                .any(false, |l| right.any(false, |r| Ok(self.values_equal(l, r))))
                .map(Value::Boolean),
            // Not the complement of Equal over a fan-out: true when the
            // collection is empty or any element differs
            BinOp::NotEqual => left
                .any(true, |l| right.any(true, |r| Ok(!self.values_equal(l, r))))
                .map(Value::Boolean),
            BinOp::LessThan | BinOp::GreaterThan | BinOp::LessEqual | BinOp::GreaterEqual => left
                .any(false, |l| right.any(false, |r| self.ordered(op, l, r)))
                .map(Value::Boolean),
            BinOp::In => {
                let candidates = in_candidates(right.single("in")?);
                left.any(false, |l| {
                    Ok(!l.is_null() && candidates.iter().any(|c| self.values_equal(l, c)))
                })
                .map(Value::Boolean)
            }
            BinOp::NotIn => {
                let candidates = in_candidates(right.single("not in")?);
                left.any(true, |l| {
                    Ok(!l.is_null() && !candidates.iter().any(|c| self.values_equal(l, c)))
                })
                .map(Value::Boolean)
            }
        }
    }

    fn apply_like(
        &self,
        op: LikeOp,
        operand: Operand,
        pattern: &Value,
        escape: Option<char>,
    ) -> Result<bool, EvalError> {
        let pattern = match pattern {
            Value::Null => return Ok(false),
            Value::String(s) => s,
            v => {
                return Err(EvalError::type_error(format!(
                    "like pattern must be a string, got {}",
                    v.type_name()
                )));
            }
        };
        let compiled = LikePattern::compile(pattern, escape, op.ignores_case())
            .map_err(|e| EvalError::type_error(format!("invalid like pattern: {e}")))?;

        let negated = op.is_negated();
        operand.any(negated, |v| {
            let text = match v {
                Value::Null => return Ok(false),
                Value::String(s) => s.clone(),
                Value::Integer(_) | Value::Decimal(_) | Value::Float(_) | Value::Boolean(_) => {
                    v.to_string()
                }
                other => {
                    return Err(EvalError::type_error(format!(
                        "cannot match {} against a like pattern",
                        other.type_name()
                    )));
                }
            };
            Ok(compiled.is_match(&text) != negated)
        })
    }

    fn apply_between(
        &self,
        negated: bool,
        operand: Operand,
        lower: &Value,
        upper: &Value,
    ) -> Result<bool, EvalError> {
        if matches!(operand, Operand::One(Value::Null)) {
            return Ok(false);
        }
        let within = operand.any(false, |v| {
            Ok(self.ordered(BinOp::GreaterEqual, v, lower)?
                && self.ordered(BinOp::LessEqual, v, upper)?)
        })?;
        Ok(within != negated)
    }

    // ========================================
    // Comparison
    // ========================================

    /// Null-safe equality. Objects compare by the accessor's identity
    /// judgment; an object equals a scalar that is its identity.
    fn values_equal(&self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::Object(x), Value::Object(y)) => self.accessor.identity_equals(x, y),
            (Value::Object(o), scalar) | (scalar, Value::Object(o)) => self
                .accessor
                .extract_identity(o)
                .map(|id| !id.is_null() && self.values_equal(&id, scalar))
                .unwrap_or(false),
            (Value::List(x), Value::List(y)) => {
                x.len() == y.len() && x.iter().zip(y).all(|(a, b)| self.values_equal(a, b))
            }
            (a, b) if a.is_number() && b.is_number() => {
                compare_numbers(a, b) == Some(Ordering::Equal)
            }
            (a, b) => a == b,
        }
    }

    fn ordered(&self, op: BinOp, a: &Value, b: &Value) -> Result<bool, EvalError> {
        if a.is_null() || b.is_null() {
            self.accessor.null_comparison(op)?;
            return Ok(false);
        }
        let ordering = compare_values(a, b).ok_or_else(|| {
            EvalError::type_error(format!(
                "cannot compare {} {} {}",
                a.type_name(),
                op.symbol(),
                b.type_name()
            ))
        })?;
        Ok(match op {
            BinOp::LessThan => ordering == Ordering::Less,
            BinOp::GreaterThan => ordering == Ordering::Greater,
            BinOp::LessEqual => ordering != Ordering::Greater,
            BinOp::GreaterEqual => ordering != Ordering::Less,
            _ => unreachable!("not an ordering operator: {:?}", op),
        })
    }

    // ========================================
    // Functions
    // ========================================

    /// Fold the values of a to-many operand. Nulls are skipped; an empty
    /// input gives 0 for the counts and null otherwise. Without an argument
    /// the subject itself is the single row, so `count()` is 1.
    fn aggregate(&self, name: &str, operand: Option<Operand>) -> Result<Value, EvalError> {
        let Some(operand) = operand else {
            return match name {
                "count" => Ok(Value::Integer(1)),
                _ => Err(EvalError::type_error(format!("{}() requires an argument", name))),
            };
        };
        let values: Vec<Value> = match operand {
            Operand::Many(items) | Operand::One(Value::List(items)) => items,
            Operand::One(value) => vec![value],
        }
        .into_iter()
        .filter(|v| !v.is_null())
        .collect();

        match name {
            "count" => Ok(Value::Integer(values.len() as i64)),
            "countDistinct" => {
                let mut distinct: Vec<&Value> = Vec::new();
                for value in &values {
                    if !distinct.iter().any(|seen| self.values_equal(seen, value)) {
                        distinct.push(value);
                    }
                }
                Ok(Value::Integer(distinct.len() as i64))
            }
            "min" | "max" => {
                let wanted = if name == "min" { Ordering::Less } else { Ordering::Greater };
                let mut best: Option<Value> = None;
                for value in values {
                    best = Some(match best {
                        None => value,
                        Some(current) => {
                            let ordering = compare_values(&value, &current).ok_or_else(|| {
                                EvalError::type_error(format!(
                                    "{}() cannot compare {} and {}",
                                    name,
                                    value.type_name(),
                                    current.type_name()
                                ))
                            })?;
                            if ordering == wanted { value } else { current }
                        }
                    });
                }
                Ok(best.unwrap_or(Value::Null))
            }
            "sum" | "avg" => {
                let count = values.len();
                let mut total: Option<Value> = None;
                for value in values {
                    if !value.is_number() {
                        return Err(number_required(name, &value));
                    }
                    total = Some(match total {
                        None => value,
                        Some(sum) => arithmetic(BinOp::Add, &sum, &value)?,
                    });
                }
                match (name, total) {
                    (_, None) => Ok(Value::Null),
                    ("avg", Some(sum)) => arithmetic(BinOp::Divide, &sum, &Value::Integer(count as i64)),
                    (_, Some(sum)) => Ok(sum),
                }
            }
            _ => Err(EvalError::UnknownFunction(name.to_string())),
        }
    }

    fn call_function(&self, name: &str, args: Vec<Value>) -> Result<Value, EvalError> {
        let arity = |n: usize| {
            if args.len() == n {
                Ok(())
            } else {
                Err(EvalError::type_error(format!(
                    "{}() takes {} argument(s), got {}",
                    name,
                    n,
                    args.len()
                )))
            }
        };

        match name {
            "upper" | "lower" | "trim" | "length" => {
                arity(1)?;
                let s = match &args[0] {
                    Value::Null => return Ok(Value::Null),
                    Value::String(s) => s,
                    v => return Err(string_required(name, v)),
                };
                Ok(match name {
                    "upper" => Value::String(s.to_uppercase()),
                    "lower" => Value::String(s.to_lowercase()),
                    "trim" => Value::String(s.trim().to_string()),
                    _ => Value::Integer(s.chars().count() as i64),
                })
            }
            "concat" => {
                if args.iter().any(Value::is_null) {
                    return Ok(Value::Null);
                }
                let mut out = String::new();
                for arg in &args {
                    match arg {
                        Value::Object(_) | Value::List(_) | Value::Bytes(_) => {
                            return Err(string_required(name, arg));
                        }
                        v => out.push_str(&v.to_string()),
                    }
                }
                Ok(Value::String(out))
            }
            "substring" => {
                arity(3)?;
                let s = match &args[0] {
                    Value::Null => return Ok(Value::Null),
                    Value::String(s) => s,
                    v => return Err(string_required(name, v)),
                };
                let (start, len) = match (args[1].as_i64(), args[2].as_i64()) {
                    (Some(start), Some(len)) => (start, len),
                    _ => {
                        return Err(EvalError::type_error(
                            "substring() offset and length must be numbers",
                        ));
                    }
                };
                let skip = (start.max(1) - 1) as usize;
                let take = len.max(0) as usize;
                Ok(Value::String(s.chars().skip(skip).take(take).collect()))
            }
            "locate" => {
                arity(2)?;
                match (&args[0], &args[1]) {
                    (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
                    (Value::String(needle), Value::String(haystack)) => {
                        let position = haystack
                            .find(needle.as_str())
                            .map(|byte| haystack[..byte].chars().count() as i64 + 1)
                            .unwrap_or(0);
                        Ok(Value::Integer(position))
                    }
                    (a, b) => Err(EvalError::type_error(format!(
                        "locate() requires strings, got {} and {}",
                        a.type_name(),
                        b.type_name()
                    ))),
                }
            }
            "abs" => {
                arity(1)?;
                match &args[0] {
                    Value::Null => Ok(Value::Null),
                    Value::Integer(n) => Ok(n
                        .checked_abs()
                        .map(Value::Integer)
                        .unwrap_or_else(|| Value::Decimal(Decimal::from(*n).abs()))),
                    Value::Decimal(d) => Ok(Value::Decimal(d.abs())),
                    Value::Float(n) => Ok(Value::Float(n.abs())),
                    v => Err(number_required(name, v)),
                }
            }
            "sqrt" => {
                arity(1)?;
                match &args[0] {
                    Value::Null => Ok(Value::Null),
                    Value::Decimal(d) => d
                        .sqrt()
                        .map(Value::Decimal)
                        .ok_or_else(|| EvalError::type_error("sqrt() of a negative number")),
                    v => match v.as_f64() {
                        Some(n) if n >= 0.0 => Ok(Value::Float(n.sqrt())),
                        Some(_) => Err(EvalError::type_error("sqrt() of a negative number")),
                        None => Err(number_required(name, v)),
                    },
                }
            }
            "mod" => {
                arity(2)?;
                match (&args[0], &args[1]) {
                    (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
                    (Value::Integer(a), Value::Integer(b)) => {
                        if *b == 0 {
                            return Err(EvalError::DivisionByZero);
                        }
                        Ok(Value::Integer(a.wrapping_rem(*b)))
                    }
                    (a, b) => match (to_decimal(a), to_decimal(b)) {
                        (Some(_), Some(d)) if d.is_zero() => Err(EvalError::DivisionByZero),
                        (Some(x), Some(y)) if !matches!(a, Value::Float(_)) && !matches!(b, Value::Float(_)) => {
                            Ok(Value::Decimal(x % y))
                        }
                        _ => match (a.as_f64(), b.as_f64()) {
                            (Some(_), Some(y)) if y == 0.0 => Err(EvalError::DivisionByZero),
                            (Some(x), Some(y)) => Ok(Value::Float(x % y)),
                            _ => Err(number_required(name, if a.is_number() { b } else { a })),
                        },
                    },
                }
            }
            "currentDate" | "currentTime" | "currentTimestamp" | "year" | "month" | "week"
            | "dayOfYear" | "dayOfMonth" | "dayOfWeek" | "hour" | "minute" | "second" => {
                Err(EvalError::NotEvaluable(name.to_string()))
            }
            _ => Err(EvalError::UnknownFunction(name.to_string())),
        }
    }
}

fn is_aggregate(name: &str) -> bool {
    matches!(name, "count" | "countDistinct" | "min" | "max" | "sum" | "avg")
}

fn string_required(function: &str, got: &Value) -> EvalError {
    EvalError::type_error(format!(
        "{}() requires a string, got {}",
        function,
        got.type_name()
    ))
}

fn number_required(function: &str, got: &Value) -> EvalError {
    EvalError::type_error(format!(
        "{}() requires a number, got {}",
        function,
        got.type_name()
    ))
}

/// Values an `in` operand is checked against.
fn in_candidates(right: Value) -> Vec<Value> {
    match right {
        Value::List(items) => items,
        single => vec![single],
    }
}

fn to_decimal(v: &Value) -> Option<Decimal> {
    match v {
        Value::Integer(n) => Some(Decimal::from(*n)),
        Value::Decimal(d) => Some(*d),
        Value::Float(n) => Decimal::from_f64(*n),
        _ => None,
    }
}

fn compare_numbers(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => Some(x.cmp(y)),
        (Value::Float(_), _) | (_, Value::Float(_)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        _ => Some(to_decimal(a)?.cmp(&to_decimal(b)?)),
    }
}

fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (a, b) if a.is_number() && b.is_number() => compare_numbers(a, b),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Boolean(x), Value::Boolean(y)) => Some(x.cmp(y)),
        (Value::Bytes(x), Value::Bytes(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Numeric rank used for promotion: Integer < Decimal < Float.
fn rank(v: &Value) -> Option<u8> {
    match v {
        Value::Integer(_) => Some(0),
        Value::Decimal(_) => Some(1),
        Value::Float(_) => Some(2),
        _ => None,
    }
}

fn arithmetic(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }
    let (Some(lr), Some(rr)) = (rank(left), rank(right)) else {
        return Err(EvalError::type_error(format!(
            "cannot apply '{}' to {} and {}",
            op.symbol(),
            left.type_name(),
            right.type_name()
        )));
    };

    match lr.max(rr) {
        0 => {
            if let (Value::Integer(a), Value::Integer(b)) = (left, right) {
                let exact = match op {
                    BinOp::Add => a.checked_add(*b),
                    BinOp::Subtract => a.checked_sub(*b),
                    BinOp::Multiply => a.checked_mul(*b),
                    _ => {
                        if *b == 0 {
                            return Err(EvalError::DivisionByZero);
                        }
                        // Inexact integer division continues as a decimal
                        match a.checked_rem(*b) {
                            Some(0) => a.checked_div(*b),
                            _ => None,
                        }
                    }
                };
                if let Some(n) = exact {
                    return Ok(Value::Integer(n));
                }
            }
            decimal_arithmetic(op, left, right)
        }
        1 => decimal_arithmetic(op, left, right),
        _ => float_arithmetic(op, left, right),
    }
}

fn decimal_arithmetic(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let (Some(a), Some(b)) = (to_decimal(left), to_decimal(right)) else {
        return float_arithmetic(op, left, right);
    };
    let result = match op {
        BinOp::Add => a.checked_add(b),
        BinOp::Subtract => a.checked_sub(b),
        BinOp::Multiply => a.checked_mul(b),
        _ => {
            if b.is_zero() {
                return Err(EvalError::DivisionByZero);
            }
            a.checked_div(b).map(|d| d.normalize())
        }
    };
    match result {
        Some(d) => Ok(Value::Decimal(d)),
        // Out of decimal range
        None => float_arithmetic(op, left, right),
    }
}

fn float_arithmetic(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
        return Err(EvalError::type_error(format!(
            "cannot apply '{}' to {} and {}",
            op.symbol(),
            left.type_name(),
            right.type_name()
        )));
    };
    Ok(Value::Float(match op {
        BinOp::Add => a + b,
        BinOp::Subtract => a - b,
        BinOp::Multiply => a * b,
        _ => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            a / b
        }
    }))
}

fn bitwise(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }
    let (Some(a), Some(b)) = (left.as_i64(), right.as_i64()) else {
        return Err(EvalError::type_error(format!(
            "cannot apply '{}' to {} and {}",
            op.symbol(),
            left.type_name(),
            right.type_name()
        )));
    };
    // Shift distances use the low six bits, as for 64-bit two's complement
    let distance = (b & 63) as u32;
    Ok(Value::Integer(match op {
        BinOp::BitAnd => a & b,
        BinOp::BitOr => a | b,
        BinOp::BitXor => a ^ b,
        BinOp::ShiftLeft => a.wrapping_shl(distance),
        _ => a.wrapping_shr(distance),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Value {
        Value::Decimal(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn integer_overflow_promotes_to_decimal() {
        let result = arithmetic(BinOp::Add, &Value::Integer(i64::MAX), &Value::Integer(1)).unwrap();
        assert_eq!(result, Value::Decimal(Decimal::from(i64::MAX) + Decimal::ONE));
    }

    #[test]
    fn inexact_integer_division_is_decimal() {
        assert_eq!(
            arithmetic(BinOp::Divide, &Value::Integer(7), &Value::Integer(2)).unwrap(),
            dec("3.5")
        );
        assert_eq!(
            arithmetic(BinOp::Divide, &Value::Integer(6), &Value::Integer(2)).unwrap(),
            Value::Integer(3)
        );
    }

    #[test]
    fn decimal_arithmetic_is_exact() {
        let r = arithmetic(BinOp::Subtract, &dec("1"), &dec("0.1")).unwrap();
        let r = arithmetic(BinOp::Subtract, &r, &dec("0.2")).unwrap();
        assert_eq!(r, dec("0.7"));
    }

    #[test]
    fn float_wins_promotion() {
        assert_eq!(
            arithmetic(BinOp::Multiply, &Value::Integer(2), &Value::Float(3.5)).unwrap(),
            Value::Float(7.0)
        );
    }

    #[test]
    fn null_propagates_through_arithmetic() {
        assert_eq!(
            arithmetic(BinOp::Add, &Value::Null, &Value::Integer(1)).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(
            arithmetic(BinOp::Divide, &Value::Integer(1), &Value::Integer(0)),
            Err(EvalError::DivisionByZero)
        );
        assert_eq!(
            arithmetic(BinOp::Divide, &dec("1.5"), &dec("0.0")),
            Err(EvalError::DivisionByZero)
        );
    }

    #[test]
    fn shifts_mask_distance() {
        assert_eq!(
            bitwise(BinOp::ShiftLeft, &Value::Integer(1), &Value::Integer(64)).unwrap(),
            Value::Integer(1)
        );
        assert_eq!(
            bitwise(BinOp::ShiftRight, &Value::Integer(-8), &Value::Integer(1)).unwrap(),
            Value::Integer(-4)
        );
    }

    #[test]
    fn mixed_number_comparison() {
        assert_eq!(
            compare_numbers(&Value::Integer(2), &dec("2.00")),
            Some(Ordering::Equal)
        );
        assert_eq!(
            compare_numbers(&Value::Float(2.5), &Value::Integer(3)),
            Some(Ordering::Less)
        );
    }
}
