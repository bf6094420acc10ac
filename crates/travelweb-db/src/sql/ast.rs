//! Statement tree for the supported SQL subset.

use crate::core::{ColumnDescriptor, SqlValue};

/// A value slot: positional parameter or inline literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// `?` placeholder, 0-based in order of appearance.
    Param(usize),
    /// Inline literal.
    Literal(SqlValue),
}

impl Operand {
    /// Resolve against positional parameters.
    pub fn resolve(&self, params: &[SqlValue]) -> SqlValue {
        match self {
            Operand::Param(i) => params.get(*i).cloned().unwrap_or(SqlValue::Null),
            Operand::Literal(v) => v.clone(),
        }
    }
}

/// Comparison operator in a WHERE condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    NotEq,
    Gt,
    Lt,
    Ge,
    Le,
    Like,
    In,
}

/// `column <op> operand(s)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub op: Operator,
    /// One operand, or several for `IN (...)`.
    pub operands: Vec<Operand>,
}

/// SELECT list.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// `*`
    All,
    /// `COUNT(*) [AS alias]`
    Count { alias: String },
    /// `col [AS alias], ...` as `(column, output name)` pairs.
    Columns(Vec<(String, String)>),
}

/// `ORDER BY column [ASC|DESC]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub projection: Projection,
    pub table: String,
    pub conditions: Vec<Condition>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<Operand>,
    pub offset: Option<Operand>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: String,
    pub columns: Vec<String>,
    pub values: Vec<Operand>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table: String,
    pub assignments: Vec<(String, Operand)>,
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub table: String,
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub table: String,
    pub if_not_exists: bool,
    pub columns: Vec<ColumnDescriptor>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropTable {
    pub table: String,
    pub if_exists: bool,
}

/// One parsed statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(Select),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
    CreateTable(CreateTable),
    DropTable(DropTable),
    /// `PRAGMA table_info(name)`
    TableInfo(String),
}

impl Statement {
    /// Whether executing the statement can change stored data.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Statement::Select(_) | Statement::TableInfo(_))
    }

    /// Number of positional parameters the statement expects.
    pub fn param_count(&self) -> usize {
        fn count<'a>(ops: impl Iterator<Item = &'a Operand>) -> usize {
            ops.filter(|op| matches!(op, Operand::Param(_))).count()
        }
        fn in_conditions(conditions: &[Condition]) -> usize {
            count(conditions.iter().flat_map(|c| c.operands.iter()))
        }

        match self {
            Statement::Select(s) => {
                in_conditions(&s.conditions) + count(s.limit.iter()) + count(s.offset.iter())
            }
            Statement::Insert(i) => count(i.values.iter()),
            Statement::Update(u) => {
                count(u.assignments.iter().map(|(_, op)| op)) + in_conditions(&u.conditions)
            }
            Statement::Delete(d) => in_conditions(&d.conditions),
            Statement::CreateTable(_) | Statement::DropTable(_) | Statement::TableInfo(_) => 0,
        }
    }

    /// Short statement kind for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Statement::Select(_) => "SELECT",
            Statement::Insert(_) => "INSERT",
            Statement::Update(_) => "UPDATE",
            Statement::Delete(_) => "DELETE",
            Statement::CreateTable(_) => "CREATE TABLE",
            Statement::DropTable(_) => "DROP TABLE",
            Statement::TableInfo(_) => "PRAGMA table_info",
        }
    }
}
