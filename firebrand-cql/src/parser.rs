//! Recursive-descent parser producing [`Statement`]s.

use crate::ast::{
    AssignOp, Assignment, DeleteStatement, Operator, Projection, Relation, SelectStatement,
    Statement, Subject, Term, UpdateStatement, is_keyword,
};
use crate::lexer::{Token, tokenize};
use crate::{CqlError, CqlResult};
use firebrand_types::ColumnValue;

/// Parses one statement. A trailing `;` is accepted.
pub fn parse(source: &str) -> CqlResult<Statement> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: source.len(),
    };
    let statement = parser.statement()?;
    parser.eat(&Token::Semicolon);
    if let Some((token, position)) = parser.tokens.get(parser.pos) {
        return Err(CqlError::Syntax {
            position: *position,
            message: format!("unexpected trailing {token:?}"),
        });
    }
    Ok(statement)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |(_, p)| *p)
    }

    fn error<T>(&self, message: impl Into<String>) -> CqlResult<T> {
        Err(CqlError::Syntax {
            position: self.position(),
            message: message.into(),
        })
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token, what: &str) -> CqlResult<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            self.error(format!("expected {what}"))
        }
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        if self.peek().is_some_and(|t| t.is_keyword(kw)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, kw: &str) -> CqlResult<()> {
        if self.eat_keyword(kw) {
            Ok(())
        } else {
            self.error(format!("expected {kw}"))
        }
    }

    fn statement(&mut self) -> CqlResult<Statement> {
        if self.eat_keyword("SELECT") {
            self.select().map(Statement::Select)
        } else if self.eat_keyword("UPDATE") {
            self.update().map(Statement::Update)
        } else if self.eat_keyword("DELETE") {
            self.delete().map(Statement::Delete)
        } else {
            self.error("expected SELECT, UPDATE or DELETE")
        }
    }

    fn select(&mut self) -> CqlResult<SelectStatement> {
        let projection = if self.eat(&Token::Star) {
            Projection::All
        } else if self.peek().is_some_and(|t| t.is_keyword("COUNT")) {
            self.pos += 1;
            self.expect(&Token::LParen, "`(`")?;
            self.expect(&Token::Star, "`*`")?;
            self.expect(&Token::RParen, "`)`")?;
            Projection::Count
        } else {
            Projection::Columns(self.identifier_list()?)
        };
        self.expect_keyword("FROM")?;
        let family = self.identifier()?;
        let relations = self.where_clause(false)?;
        let limit = if self.eat_keyword("LIMIT") {
            match self.advance() {
                Some(Token::Int(n)) => Some(n),
                _ => {
                    self.pos = self.pos.saturating_sub(1);
                    return self.error("expected row limit");
                }
            }
        } else {
            None
        };
        Ok(SelectStatement {
            projection,
            family,
            relations,
            limit,
        })
    }

    fn update(&mut self) -> CqlResult<UpdateStatement> {
        let family = self.identifier()?;
        self.expect_keyword("SET")?;
        let mut assignments = vec![self.assignment()?];
        while self.eat(&Token::Comma) {
            assignments.push(self.assignment()?);
        }
        let relations = self.where_clause(true)?;
        Ok(UpdateStatement {
            family,
            assignments,
            relations,
        })
    }

    fn assignment(&mut self) -> CqlResult<Assignment> {
        let column = self.identifier()?;
        self.expect(&Token::Eq, "`=`")?;
        // `col = col + n` when the right-hand side starts with the same column.
        let save = self.pos;
        if let Ok(name) = self.identifier() {
            if name == column {
                let negative = match self.advance() {
                    Some(Token::Plus) => false,
                    Some(Token::Minus) => true,
                    _ => {
                        self.pos = self.pos.saturating_sub(1);
                        return self.error("expected `+` or `-`");
                    }
                };
                let amount = self.integer(negative)?;
                return Ok(Assignment {
                    column,
                    operation: AssignOp::Increment(amount),
                });
            }
            self.pos = save;
            return self.error("expected a value or a self-increment");
        }
        self.pos = save;
        let term = self.term()?;
        Ok(Assignment {
            column,
            operation: AssignOp::Set(term),
        })
    }

    fn delete(&mut self) -> CqlResult<DeleteStatement> {
        let columns = if self.peek().is_some_and(|t| t.is_keyword("FROM")) {
            Vec::new()
        } else {
            self.identifier_list()?
        };
        self.expect_keyword("FROM")?;
        let family = self.identifier()?;
        let relations = self.where_clause(true)?;
        Ok(DeleteStatement {
            columns,
            family,
            relations,
        })
    }

    /// Parses an optional `WHERE`. Updates and deletes require one that
    /// addresses rows by key.
    fn where_clause(&mut self, by_key: bool) -> CqlResult<Vec<Relation>> {
        let mut relations = Vec::new();
        if self.eat_keyword("WHERE") {
            relations.push(self.relation()?);
            while self.eat_keyword("AND") {
                relations.push(self.relation()?);
            }
        }
        if by_key {
            let keyed = relations.len() == 1
                && relations[0].subject == Subject::Key
                && matches!(relations[0].operator, Operator::Eq | Operator::In);
            if !keyed {
                return self.error("expected WHERE KEY = term or WHERE KEY IN (...)");
            }
        }
        Ok(relations)
    }

    fn relation(&mut self) -> CqlResult<Relation> {
        let subject = if self.eat_keyword("KEY") {
            Subject::Key
        } else {
            Subject::Column(self.identifier()?)
        };
        let operator = match self.advance() {
            Some(Token::Eq) => Operator::Eq,
            Some(Token::Gt) => Operator::Gt,
            Some(Token::Gte) => Operator::Gte,
            Some(Token::Lt) => Operator::Lt,
            Some(Token::Lte) => Operator::Lte,
            Some(t) if t.is_keyword("IN") => Operator::In,
            _ => {
                self.pos = self.pos.saturating_sub(1);
                return self.error("expected a comparison operator");
            }
        };
        let terms = if operator == Operator::In {
            self.expect(&Token::LParen, "`(`")?;
            let mut terms = vec![self.term()?];
            while self.eat(&Token::Comma) {
                terms.push(self.term()?);
            }
            self.expect(&Token::RParen, "`)`")?;
            terms
        } else {
            vec![self.term()?]
        };
        Ok(Relation {
            subject,
            operator,
            terms,
        })
    }

    fn term(&mut self) -> CqlResult<Term> {
        let negative = self.eat(&Token::Minus);
        let value = match self.peek().cloned() {
            Some(Token::Int(_)) => ColumnValue::Long(self.integer(negative)?),
            Some(Token::Float(f)) => {
                self.pos += 1;
                ColumnValue::Double(if negative { -f } else { f })
            }
            _ if negative => return self.error("expected a number after `-`"),
            Some(Token::Str(s)) => {
                self.pos += 1;
                ColumnValue::Text(s)
            }
            Some(Token::Hex(bytes)) => {
                self.pos += 1;
                ColumnValue::Bytes(bytes)
            }
            Some(Token::Placeholder(name)) => {
                self.pos += 1;
                return Ok(Term::Placeholder(name));
            }
            Some(t) if t.is_keyword("TRUE") => {
                self.pos += 1;
                ColumnValue::Boolean(true)
            }
            Some(t) if t.is_keyword("FALSE") => {
                self.pos += 1;
                ColumnValue::Boolean(false)
            }
            _ => return self.error("expected a literal or placeholder"),
        };
        Ok(Term::Literal(value))
    }

    fn integer(&mut self, negative: bool) -> CqlResult<i64> {
        let Some(Token::Int(magnitude)) = self.peek().cloned() else {
            return self.error("expected an integer");
        };
        let signed = if negative {
            -i128::from(magnitude)
        } else {
            i128::from(magnitude)
        };
        match i64::try_from(signed) {
            Ok(v) => {
                self.pos += 1;
                Ok(v)
            }
            Err(_) => self.error("integer out of range"),
        }
    }

    fn identifier(&mut self) -> CqlResult<String> {
        match self.peek().cloned() {
            Some(Token::Word(w)) if !is_keyword(&w) => {
                self.pos += 1;
                Ok(w)
            }
            Some(Token::QuotedIdent(name)) => {
                self.pos += 1;
                Ok(name)
            }
            _ => self.error("expected an identifier"),
        }
    }

    fn identifier_list(&mut self) -> CqlResult<Vec<String>> {
        let mut names = vec![self.identifier()?];
        while self.eat(&Token::Comma) {
            names.push(self.identifier()?);
        }
        Ok(names)
    }
}
