use crate::error::Span;
use smallvec::SmallVec;

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Null(Span),
    Bool(bool, Span),
    Number(f64, Span),
    String(String, Span),
    Template {
        parts: SmallVec<[TemplatePart; 4]>,
        span: Span,
    },
    Identifier(String, Span),
    Array(Vec<Expression>, Span),
    Object(Vec<ObjectEntry>, Span),
    Call {
        callee: Box<Expression>,
        args: Vec<Expression>,
        span: Span,
    },
    Member {
        object: Box<Expression>,
        property: String,
        span: Span,
    },
    Index {
        object: Box<Expression>,
        index: Box<Expression>,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expression>,
        span: Span,
    },
    Binary {
        left: Box<Expression>,
        op: BinaryOp,
        right: Box<Expression>,
        span: Span,
    },
    Logical {
        left: Box<Expression>,
        op: LogicalOp,
        right: Box<Expression>,
        span: Span,
    },
    Conditional {
        condition: Box<Expression>,
        then_expr: Box<Expression>,
        else_expr: Box<Expression>,
        span: Span,
    },
}

impl Expression {
    pub fn span(&self) -> &Span {
        match self {
            Expression::Null(span)
            | Expression::Bool(_, span)
            | Expression::Number(_, span)
            | Expression::String(_, span)
            | Expression::Identifier(_, span)
            | Expression::Array(_, span)
            | Expression::Object(_, span) => span,
            Expression::Template { span, .. }
            | Expression::Call { span, .. }
            | Expression::Member { span, .. }
            | Expression::Index { span, .. }
            | Expression::Unary { span, .. }
            | Expression::Binary { span, .. }
            | Expression::Logical { span, .. }
            | Expression::Conditional { span, .. } => span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Literal(String),
    Expression(Box<Expression>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectEntry {
    pub key: PropertyKey,
    pub value: Expression,
    pub span: Span,
}

/// How an object literal names a property: `a: 1` and `'a': 1` are both
/// `Named`, `[expr]: 1` is `Computed`.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    Named(String),
    Computed(Expression),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Nullish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Minus,
    Plus,
}
