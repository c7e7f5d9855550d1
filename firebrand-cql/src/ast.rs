//! Statement syntax tree and its textual rendering.

use crate::{CqlError, CqlResult};
use firebrand_types::ColumnValue;
use std::collections::BTreeMap;
use std::fmt;

/// Words that cannot be used as bare identifiers.
pub(crate) const KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "AND", "LIMIT", "COUNT", "KEY", "IN", "UPDATE", "SET", "DELETE",
    "TRUE", "FALSE",
];

pub(crate) fn is_keyword(word: &str) -> bool {
    KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(word))
}

/// A complete statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(SelectStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub projection: Projection,
    pub family: String,
    pub relations: Vec<Relation>,
    pub limit: Option<u64>,
}

/// What a select returns for each matching row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    All,
    Count,
    Columns(Vec<String>),
}

/// One `subject op term` clause of a `WHERE`.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub subject: Subject,
    pub operator: Operator,
    /// Exactly one term, except for `IN` which takes one or more.
    pub terms: Vec<Term>,
}

impl Relation {
    /// `subject op value`.
    pub fn new(subject: Subject, operator: Operator, value: ColumnValue) -> Self {
        Self {
            subject,
            operator,
            terms: vec![Term::Literal(value)],
        }
    }

    /// `subject IN (values...)`.
    pub fn within(subject: Subject, values: Vec<ColumnValue>) -> Self {
        Self {
            subject,
            operator: Operator::In,
            terms: values.into_iter().map(Term::Literal).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    /// The row key.
    Key,
    Column(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl Operator {
    /// Returns true if `ordering` (row value compared to the term) satisfies
    /// this operator. `In` is handled by the caller.
    #[must_use]
    pub fn accepts(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::{Equal, Greater, Less};
        match self {
            Self::Eq | Self::In => ordering == Equal,
            Self::Gt => ordering == Greater,
            Self::Gte => ordering != Less,
            Self::Lt => ordering == Less,
            Self::Lte => ordering != Greater,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Literal(ColumnValue),
    Placeholder(String),
}

impl Term {
    /// Returns the literal, or `None` for an unbound placeholder.
    #[must_use]
    pub const fn literal(&self) -> Option<&ColumnValue> {
        match self {
            Self::Literal(v) => Some(v),
            Self::Placeholder(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub family: String,
    pub assignments: Vec<Assignment>,
    pub relations: Vec<Relation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub operation: AssignOp,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssignOp {
    /// `col = term`
    Set(Term),
    /// `col = col + n` (negative for `-`)
    Increment(i64),
}

/// `DELETE FROM` removes whole rows; with columns it removes only those.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub columns: Vec<String>,
    pub family: String,
    pub relations: Vec<Relation>,
}

impl Statement {
    /// Names of all placeholders, in order of appearance.
    #[must_use]
    pub fn placeholders(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.for_each_term(&mut |term| {
            if let Term::Placeholder(name) = term {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        });
        names
    }

    /// Returns a copy of the statement with every placeholder replaced.
    pub fn bind(&self, params: &BTreeMap<String, ColumnValue>) -> CqlResult<Self> {
        let mut bound = self.clone();
        let mut missing = None;
        bound.for_each_term_mut(&mut |term| {
            if let Term::Placeholder(name) = term {
                match params.get(name.as_str()) {
                    Some(value) => *term = Term::Literal(value.clone()),
                    None => {
                        missing.get_or_insert_with(|| name.clone());
                    }
                }
            }
        });
        match missing {
            Some(name) => Err(CqlError::UnboundParameter(name)),
            None => Ok(bound),
        }
    }

    /// Column family the statement targets.
    #[must_use]
    pub fn family(&self) -> &str {
        match self {
            Self::Select(s) => &s.family,
            Self::Update(u) => &u.family,
            Self::Delete(d) => &d.family,
        }
    }

    fn for_each_term(&self, f: &mut impl FnMut(&Term)) {
        let relations = match self {
            Self::Select(s) => &s.relations,
            Self::Update(u) => {
                for a in &u.assignments {
                    if let AssignOp::Set(term) = &a.operation {
                        f(term);
                    }
                }
                &u.relations
            }
            Self::Delete(d) => &d.relations,
        };
        relations.iter().flat_map(|r| &r.terms).for_each(f);
    }

    fn for_each_term_mut(&mut self, f: &mut impl FnMut(&mut Term)) {
        let relations = match self {
            Self::Select(s) => &mut s.relations,
            Self::Update(u) => {
                for a in &mut u.assignments {
                    if let AssignOp::Set(term) = &mut a.operation {
                        f(term);
                    }
                }
                &mut u.relations
            }
            Self::Delete(d) => &mut d.relations,
        };
        relations.iter_mut().flat_map(|r| &mut r.terms).for_each(f);
    }
}

// ── Rendering ────────────────────────────────────────────────────

/// Renders an identifier, quoting it when it is not a plain word.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    let mut chars = name.chars();
    let plain = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !is_keyword(name);
    if plain {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

fn write_literal(f: &mut fmt::Formatter<'_>, value: &ColumnValue) -> fmt::Result {
    match value {
        ColumnValue::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
        ColumnValue::Int(v) => write!(f, "{v}"),
        ColumnValue::Long(v) | ColumnValue::Timestamp(v) | ColumnValue::Counter(v) => {
            write!(f, "{v}")
        }
        ColumnValue::Double(v) => write!(f, "{v:?}"),
        ColumnValue::Boolean(v) => write!(f, "{v}"),
        ColumnValue::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(v) => write_literal(f, v),
            Self::Placeholder(name) => write!(f, ":{name}"),
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key => f.write_str("KEY"),
            Self::Column(name) => f.write_str(&quote_identifier(name)),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Eq => "=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::In => "IN",
        })
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.subject, self.operator)?;
        if self.operator == Operator::In {
            f.write_str("(")?;
            write_list(f, &self.terms)?;
            f.write_str(")")
        } else {
            write_list(f, &self.terms)
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_where(f: &mut fmt::Formatter<'_>, relations: &[Relation]) -> fmt::Result {
    for (i, relation) in relations.iter().enumerate() {
        f.write_str(if i == 0 { " WHERE " } else { " AND " })?;
        write!(f, "{relation}")?;
    }
    Ok(())
}

fn write_columns(f: &mut fmt::Formatter<'_>, columns: &[String]) -> fmt::Result {
    let quoted: Vec<String> = columns.iter().map(|c| quote_identifier(c)).collect();
    write_list(f, &quoted)
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select(s) => {
                f.write_str("SELECT ")?;
                match &s.projection {
                    Projection::All => f.write_str("*")?,
                    Projection::Count => f.write_str("COUNT(*)")?,
                    Projection::Columns(columns) => write_columns(f, columns)?,
                }
                write!(f, " FROM {}", quote_identifier(&s.family))?;
                write_where(f, &s.relations)?;
                if let Some(limit) = s.limit {
                    write!(f, " LIMIT {limit}")?;
                }
                Ok(())
            }
            Self::Update(u) => {
                write!(f, "UPDATE {} SET ", quote_identifier(&u.family))?;
                for (i, a) in u.assignments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    let column = quote_identifier(&a.column);
                    match &a.operation {
                        AssignOp::Set(term) => write!(f, "{column} = {term}")?,
                        AssignOp::Increment(n) if *n < 0 => {
                            write!(f, "{column} = {column} - {}", n.unsigned_abs())?;
                        }
                        AssignOp::Increment(n) => write!(f, "{column} = {column} + {n}")?,
                    }
                }
                write_where(f, &u.relations)
            }
            Self::Delete(d) => {
                f.write_str("DELETE ")?;
                if !d.columns.is_empty() {
                    write_columns(f, &d.columns)?;
                    f.write_str(" ")?;
                }
                write!(f, "FROM {}", quote_identifier(&d.family))?;
                write_where(f, &d.relations)
            }
        }
    }
}
