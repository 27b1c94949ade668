//! Filter condition expressions.
//!
//! [`Expr`] is the condition tree a planner hands to an index when asking
//! whether (and how) the index can serve a filter. It is deliberately small:
//! attribute accesses on a query variable, constants, comparisons, boolean
//! connectives, IN lists and opaque function calls.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A constant value in a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    /// Null value.
    Null,
    /// Boolean value.
    Boolean(bool),
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit floating point number.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Array of constants.
    Array(Vec<Literal>),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// A query variable, such as the `e` in `FOR e IN edges`.
///
/// Variables are identified by `id`; the name is for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variable {
    /// Planner-assigned identifier.
    pub id: u32,
    /// Name as written in the query.
    pub name: String,
}

impl Variable {
    /// Create a variable.
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `AND`
    And,
    /// `OR`
    Or,
    /// `LIKE`
    Like,
}

impl BinaryOp {
    /// The operator with its operands swapped, for comparisons.
    ///
    /// `a < b` is `b > a`; boolean connectives and `LIKE` have no mirror.
    #[must_use]
    pub const fn mirror(self) -> Option<Self> {
        match self {
            Self::Eq => Some(Self::Eq),
            Self::NotEq => Some(Self::NotEq),
            Self::Lt => Some(Self::Gt),
            Self::LtEq => Some(Self::GtEq),
            Self::Gt => Some(Self::Lt),
            Self::GtEq => Some(Self::LtEq),
            Self::And | Self::Or | Self::Like => None,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Like => "LIKE",
        };
        f.write_str(s)
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `NOT`
    Not,
    /// Arithmetic negation.
    Neg,
}

/// A node of a filter condition tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// A constant.
    Literal(Literal),

    /// A bind parameter with the value it was bound to.
    Parameter {
        /// Parameter name, without the leading `@`.
        name: String,
        /// The bound value.
        value: Literal,
    },

    /// Attribute access on a query variable, e.g. `e._from`.
    Attribute {
        /// The variable being accessed.
        variable: Variable,
        /// Attribute name.
        name: String,
    },

    /// A binary operation.
    BinaryOp {
        /// Left operand.
        left: Box<Expr>,
        /// The operator.
        op: BinaryOp,
        /// Right operand.
        right: Box<Expr>,
    },

    /// A unary operation.
    UnaryOp {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
    },

    /// `expr [NOT] IN [list]`.
    InList {
        /// The tested expression.
        expr: Box<Expr>,
        /// Candidate values.
        list: Vec<Expr>,
        /// Whether this is `NOT IN`.
        negated: bool,
    },

    /// A function call the index layer treats as opaque.
    Function {
        /// Function name.
        name: String,
        /// Arguments.
        args: Vec<Expr>,
    },
}

impl Expr {
    // ========== Leaves ==========

    /// Creates a literal string expression.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Literal(Literal::String(value.into()))
    }

    /// Creates a literal integer expression.
    #[must_use]
    pub const fn integer(value: i64) -> Self {
        Self::Literal(Literal::Integer(value))
    }

    /// Creates a literal float expression.
    #[must_use]
    pub const fn float(value: f64) -> Self {
        Self::Literal(Literal::Float(value))
    }

    /// Creates a literal boolean expression.
    #[must_use]
    pub const fn boolean(value: bool) -> Self {
        Self::Literal(Literal::Boolean(value))
    }

    /// Creates a literal null expression.
    #[must_use]
    pub const fn null() -> Self {
        Self::Literal(Literal::Null)
    }

    /// Creates a bound parameter.
    #[must_use]
    pub fn param(name: impl Into<String>, value: Literal) -> Self {
        Self::Parameter { name: name.into(), value }
    }

    /// Creates an attribute access on `variable`.
    #[must_use]
    pub fn attribute(variable: &Variable, name: impl Into<String>) -> Self {
        Self::Attribute { variable: variable.clone(), name: name.into() }
    }

    // ========== Operations ==========

    fn binary(self, op: BinaryOp, other: Self) -> Self {
        Self::BinaryOp { left: Box::new(self), op, right: Box::new(other) }
    }

    /// Creates an AND expression.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        self.binary(BinaryOp::And, other)
    }

    /// Creates an OR expression.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        self.binary(BinaryOp::Or, other)
    }

    /// Creates an equality expression.
    #[must_use]
    pub fn eq(self, other: Self) -> Self {
        self.binary(BinaryOp::Eq, other)
    }

    /// Creates a not-equal expression.
    #[must_use]
    pub fn not_eq(self, other: Self) -> Self {
        self.binary(BinaryOp::NotEq, other)
    }

    /// Creates a less-than expression.
    #[must_use]
    pub fn lt(self, other: Self) -> Self {
        self.binary(BinaryOp::Lt, other)
    }

    /// Creates a less-than-or-equal expression.
    #[must_use]
    pub fn lt_eq(self, other: Self) -> Self {
        self.binary(BinaryOp::LtEq, other)
    }

    /// Creates a greater-than expression.
    #[must_use]
    pub fn gt(self, other: Self) -> Self {
        self.binary(BinaryOp::Gt, other)
    }

    /// Creates a greater-than-or-equal expression.
    #[must_use]
    pub fn gt_eq(self, other: Self) -> Self {
        self.binary(BinaryOp::GtEq, other)
    }

    /// Creates a LIKE expression.
    #[must_use]
    pub fn like(self, pattern: Self) -> Self {
        self.binary(BinaryOp::Like, pattern)
    }

    /// Creates a NOT expression.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::UnaryOp { op: UnaryOp::Not, operand: Box::new(self) }
    }

    /// Creates an IN list expression.
    #[must_use]
    pub fn in_list(self, list: Vec<Self>, negated: bool) -> Self {
        Self::InList { expr: Box::new(self), list, negated }
    }

    /// Creates a function call.
    #[must_use]
    pub fn function(name: impl Into<String>, args: Vec<Self>) -> Self {
        Self::Function { name: name.into(), args }
    }

    /// Folds a sequence of expressions with AND. Returns `None` when empty.
    #[must_use]
    pub fn conjunction(exprs: impl IntoIterator<Item = Self>) -> Option<Self> {
        exprs.into_iter().reduce(Self::and)
    }

    /// Folds a sequence of expressions with OR. Returns `None` when empty.
    #[must_use]
    pub fn disjunction(exprs: impl IntoIterator<Item = Self>) -> Option<Self> {
        exprs.into_iter().reduce(Self::or)
    }

    // ========== Inspection ==========

    /// The constant this node evaluates to, for literals and bound parameters.
    #[must_use]
    pub const fn constant_value(&self) -> Option<&Literal> {
        match self {
            Self::Literal(lit) | Self::Parameter { value: lit, .. } => Some(lit),
            _ => None,
        }
    }

    /// Returns `true` for literals and bound parameters.
    #[must_use]
    pub const fn is_constant(&self) -> bool {
        self.constant_value().is_some()
    }

    /// Returns `true` if this is an access of attribute `name` on `variable`.
    #[must_use]
    pub fn is_attribute_of(&self, variable: &Variable, name: &str) -> bool {
        matches!(self, Self::Attribute { variable: v, name: n } if v == variable && n == name)
    }

    /// Splits nested ANDs into their members, left to right.
    #[must_use]
    pub fn conjuncts(&self) -> Vec<&Self> {
        self.flatten(BinaryOp::And)
    }

    /// Splits nested ORs into their branches, left to right.
    #[must_use]
    pub fn disjuncts(&self) -> Vec<&Self> {
        self.flatten(BinaryOp::Or)
    }

    /// Owned variant of [`Expr::conjuncts`].
    #[must_use]
    pub fn into_conjuncts(self) -> Vec<Self> {
        let mut out = Vec::new();
        self.flatten_into(BinaryOp::And, &mut out);
        out
    }

    fn flatten(&self, connective: BinaryOp) -> Vec<&Self> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Self::BinaryOp { left, op, right } if *op == connective => {
                    stack.push(right);
                    stack.push(left);
                }
                other => out.push(other),
            }
        }
        out
    }

    fn flatten_into(self, connective: BinaryOp, out: &mut Vec<Self>) {
        match self {
            Self::BinaryOp { left, op, right } if op == connective => {
                left.flatten_into(connective, out);
                right.flatten_into(connective, out);
            }
            other => out.push(other),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(lit) => write!(f, "{lit}"),
            Self::Parameter { name, .. } => write!(f, "@{name}"),
            Self::Attribute { variable, name } => write!(f, "{variable}.{name}"),
            Self::BinaryOp { left, op, right } => write!(f, "({left} {op} {right})"),
            Self::UnaryOp { op, operand } => match op {
                UnaryOp::Not => write!(f, "NOT {operand}"),
                UnaryOp::Neg => write!(f, "-{operand}"),
            },
            Self::InList { expr, list, negated } => {
                write!(f, "{expr} ")?;
                if *negated {
                    write!(f, "NOT ")?;
                }
                write!(f, "IN [")?;
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Function { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}
