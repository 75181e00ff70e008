//! SQL expressions.
//!
//! A closed tagged union of every expression kind the engine renders. The
//! tree is immutable once built; rendering never mutates a node.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::alias::AliasRef;
use crate::stmt::{OrderItem, SelectQuery};
use crate::types::SqlType;

/// A scalar literal, always rendered as inlined escaped text.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Byte(u8),
    I16(i16),
    I32(i32),
    I64(i64),
    Decimal(Decimal),
    Double(f64),
    DateTime(jiff::civil::DateTime),
    DateTimeOffset(jiff::Timestamp),
    Guid(Uuid),
    Text(String),
    Bytes(Vec<u8>),
    Xml(String),
}

impl Literal {
    /// The logical type of this literal, `None` for an untyped NULL.
    pub fn sql_type(&self) -> Option<SqlType> {
        match self {
            Literal::Null => None,
            Literal::Bool(_) => Some(SqlType::Bool),
            Literal::Byte(_) => Some(SqlType::Byte),
            Literal::I16(_) => Some(SqlType::Int16),
            Literal::I32(_) => Some(SqlType::Int32),
            Literal::I64(_) => Some(SqlType::Int64),
            Literal::Decimal(_) => Some(SqlType::Decimal { spec: None }),
            Literal::Double(_) => Some(SqlType::Double),
            Literal::DateTime(_) => Some(SqlType::DateTime),
            Literal::DateTimeOffset(_) => Some(SqlType::DateTimeOffset),
            Literal::Guid(_) => Some(SqlType::Guid),
            Literal::Text(_) => Some(SqlType::Text { len: None }),
            Literal::Bytes(_) => Some(SqlType::Blob { len: None }),
            Literal::Xml(_) => Some(SqlType::Xml),
        }
    }
}

/// A column reference, optionally qualified by a table name or alias.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub source: Option<AliasRef>,
    pub name: String,
}

impl ColumnRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            source: None,
            name: name.into(),
        }
    }

    pub fn qualified(source: impl Into<AliasRef>, name: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            name: name.into(),
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "<>",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl ArithOp {
    pub fn as_str(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Mod => "%",
        }
    }

    /// True for `*`, `/` and `%`, which parenthesize nested `+`/`-`.
    pub(crate) fn binds_tighter(self) -> bool {
        matches!(self, ArithOp::Mul | ArithOp::Div | ArithOp::Mod)
    }
}

/// Bitwise operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOp {
    And,
    Or,
    Xor,
}

impl BitOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BitOp::And => "&",
            BitOp::Or => "|",
            BitOp::Xor => "^",
        }
    }
}

/// Units for date arithmetic and date difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateUnit {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

/// The right-hand side of an IN predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum InSet {
    List(Vec<Expr>),
    Query(Box<SelectQuery>),
}

/// One WHEN/THEN arm of a CASE expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseWhen {
    pub when: Expr,
    pub then: Expr,
}

impl CaseWhen {
    pub fn new(when: Expr, then: Expr) -> Self {
        Self { when, then }
    }
}

/// The function part of a window expression.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowFunc {
    RowNumber,
    Rank,
    DenseRank,
    /// An aggregate applied over a window, e.g. `SUM(x) OVER (...)`.
    Agg { name: String, args: Vec<Expr> },
}

impl WindowFunc {
    /// Ranking functions are meaningless without an ORDER BY in the window.
    pub(crate) fn requires_order(&self) -> bool {
        matches!(
            self,
            WindowFunc::RowNumber | WindowFunc::Rank | WindowFunc::DenseRank
        )
    }
}

/// A SQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Column(ColumnRef),
    /// `*`, only meaningful inside call arguments such as `COUNT(*)`
    Star,
    Cmp {
        op: CmpOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// n-ary AND; must have at least one operand
    And(Vec<Expr>),
    /// n-ary OR; must have at least one operand
    Or(Vec<Expr>),
    Not(Box<Expr>),
    Arith {
        op: ArithOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Bit {
        op: BitOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    BitNot(Box<Expr>),
    Like {
        expr: Box<Expr>,
        pattern: Box<Expr>,
    },
    In {
        expr: Box<Expr>,
        set: InSet,
    },
    IsNull {
        expr: Box<Expr>,
        negated: bool,
    },
    Exists(Box<SelectQuery>),
    /// A scalar subquery
    Subquery(Box<SelectQuery>),
    Case {
        whens: Vec<CaseWhen>,
        else_: Option<Box<Expr>>,
    },
    Cast {
        expr: Box<Expr>,
        ty: SqlType,
    },
    /// A built-in function call; the name is validated before emission
    Call {
        name: String,
        args: Vec<Expr>,
    },
    Window {
        func: WindowFunc,
        partition_by: Vec<Expr>,
        order_by: Vec<OrderItem>,
    },
    DateAdd {
        unit: DateUnit,
        amount: Box<Expr>,
        date: Box<Expr>,
    },
    DateDiff {
        unit: DateUnit,
        start: Box<Expr>,
        end: Box<Expr>,
    },
}

// Convenience constructors
impl Expr {
    pub fn literal(lit: impl Into<Literal>) -> Self {
        Expr::Literal(lit.into())
    }

    pub fn null() -> Self {
        Expr::Literal(Literal::Null)
    }

    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column(ColumnRef::new(name))
    }

    pub fn qualified_column(source: impl Into<AliasRef>, name: impl Into<String>) -> Self {
        Expr::Column(ColumnRef::qualified(source, name))
    }

    pub fn call(name: impl Into<String>, args: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Call {
            name: name.into(),
            args: args.into_iter().collect(),
        }
    }

    pub fn count_star() -> Self {
        Expr::call("COUNT", [Expr::Star])
    }

    fn cmp(self, op: CmpOp, other: Expr) -> Self {
        Expr::Cmp {
            op,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    pub fn eq(self, other: Expr) -> Self {
        self.cmp(CmpOp::Eq, other)
    }

    pub fn ne(self, other: Expr) -> Self {
        self.cmp(CmpOp::Ne, other)
    }

    pub fn lt(self, other: Expr) -> Self {
        self.cmp(CmpOp::Lt, other)
    }

    pub fn le(self, other: Expr) -> Self {
        self.cmp(CmpOp::Le, other)
    }

    pub fn gt(self, other: Expr) -> Self {
        self.cmp(CmpOp::Gt, other)
    }

    pub fn ge(self, other: Expr) -> Self {
        self.cmp(CmpOp::Ge, other)
    }

    /// Create an AND expression, flattening an existing AND left operand.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut items) => {
                items.push(other);
                Expr::And(items)
            }
            first => Expr::And(vec![first, other]),
        }
    }

    /// Create an OR expression, flattening an existing OR left operand.
    pub fn or(self, other: Expr) -> Self {
        match self {
            Expr::Or(mut items) => {
                items.push(other);
                Expr::Or(items)
            }
            first => Expr::Or(vec![first, other]),
        }
    }

    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    fn arith(self, op: ArithOp, other: Expr) -> Self {
        Expr::Arith {
            op,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    pub fn add(self, other: Expr) -> Self {
        self.arith(ArithOp::Add, other)
    }

    pub fn sub(self, other: Expr) -> Self {
        self.arith(ArithOp::Sub, other)
    }

    pub fn mul(self, other: Expr) -> Self {
        self.arith(ArithOp::Mul, other)
    }

    pub fn div(self, other: Expr) -> Self {
        self.arith(ArithOp::Div, other)
    }

    pub fn like(self, pattern: Expr) -> Self {
        Expr::Like {
            expr: Box::new(self),
            pattern: Box::new(pattern),
        }
    }

    pub fn in_list(self, items: impl IntoIterator<Item = Expr>) -> Self {
        Expr::In {
            expr: Box::new(self),
            set: InSet::List(items.into_iter().collect()),
        }
    }

    pub fn in_query(self, query: SelectQuery) -> Self {
        Expr::In {
            expr: Box::new(self),
            set: InSet::Query(Box::new(query)),
        }
    }

    pub fn is_null(self) -> Self {
        Expr::IsNull {
            expr: Box::new(self),
            negated: false,
        }
    }

    pub fn is_not_null(self) -> Self {
        Expr::IsNull {
            expr: Box::new(self),
            negated: true,
        }
    }

    pub fn cast(self, ty: SqlType) -> Self {
        Expr::Cast {
            expr: Box::new(self),
            ty,
        }
    }

    pub fn exists(query: SelectQuery) -> Self {
        Expr::Exists(Box::new(query))
    }

    pub fn subquery(query: SelectQuery) -> Self {
        Expr::Subquery(Box::new(query))
    }

    pub fn date_add(unit: DateUnit, amount: Expr, date: Expr) -> Self {
        Expr::DateAdd {
            unit,
            amount: Box::new(amount),
            date: Box::new(date),
        }
    }

    pub fn date_diff(unit: DateUnit, start: Expr, end: Expr) -> Self {
        Expr::DateDiff {
            unit,
            start: Box::new(start),
            end: Box::new(end),
        }
    }
}

// Literal conversions, so builder calls can pass plain Rust values.
impl From<bool> for Literal {
    fn from(v: bool) -> Self {
        Literal::Bool(v)
    }
}

impl From<u8> for Literal {
    fn from(v: u8) -> Self {
        Literal::Byte(v)
    }
}

impl From<i16> for Literal {
    fn from(v: i16) -> Self {
        Literal::I16(v)
    }
}

impl From<i32> for Literal {
    fn from(v: i32) -> Self {
        Literal::I32(v)
    }
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Literal::I64(v)
    }
}

impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Literal::Double(v)
    }
}

impl From<Decimal> for Literal {
    fn from(v: Decimal) -> Self {
        Literal::Decimal(v)
    }
}

impl From<Uuid> for Literal {
    fn from(v: Uuid) -> Self {
        Literal::Guid(v)
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Literal::Text(v.to_string())
    }
}

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Literal::Text(v)
    }
}

impl From<jiff::civil::DateTime> for Literal {
    fn from(v: jiff::civil::DateTime) -> Self {
        Literal::DateTime(v)
    }
}

impl From<jiff::Timestamp> for Literal {
    fn from(v: jiff::Timestamp) -> Self {
        Literal::DateTimeOffset(v)
    }
}
