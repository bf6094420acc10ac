//! Recursive-descent parser producing [`Statement`] trees.
//!
//! Anything outside the supported grammar is a [`ParseError`]; callers turn
//! that into an "unsupported statement" outcome rather than a hard failure.

use thiserror::Error;

use crate::core::{ColumnDescriptor, SqlValue};

use super::ast::*;
use super::lexer::{tokenize, Token, TokenKind};

/// Statement is outside the supported grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ParseError(pub String);

type ParseResult<T> = std::result::Result<T, ParseError>;

/// Words that can never be bare identifiers.
const RESERVED: &[&str] = &[
    "SELECT", "FROM", "WHERE", "ORDER", "BY", "LIMIT", "OFFSET", "AND", "OR", "SET", "VALUES",
    "INSERT", "UPDATE", "DELETE", "INTO", "AS", "GROUP", "HAVING", "JOIN",
];

/// Column-constraint keywords that end a column's type in CREATE TABLE.
const CONSTRAINT_WORDS: &[&str] = &[
    "NOT",
    "NULL",
    "DEFAULT",
    "PRIMARY",
    "AUTO_INCREMENT",
    "AUTOINCREMENT",
    "UNIQUE",
    "REFERENCES",
    "CHECK",
    "COLLATE",
    "COMMENT",
    "ON",
    "GENERATED",
    "KEY",
    "CONSTRAINT",
    "CHARACTER",
    "CHARSET",
];

/// Words that open a table-level constraint in CREATE TABLE.
const TABLE_CONSTRAINT_WORDS: &[&str] = &[
    "PRIMARY",
    "UNIQUE",
    "KEY",
    "INDEX",
    "CONSTRAINT",
    "FOREIGN",
    "CHECK",
    "FULLTEXT",
];

/// Parse one statement.
pub fn parse(sql: &str) -> ParseResult<Statement> {
    let tokens = tokenize(sql).map_err(ParseError)?;
    let mut parser = Parser {
        src: sql,
        tokens,
        pos: 0,
        params: 0,
    };
    parser.statement()
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    params: usize,
}

impl<'a> Parser<'a> {
    fn statement(&mut self) -> ParseResult<Statement> {
        let first = match self.peek() {
            Some(TokenKind::Word(w)) => w.to_ascii_uppercase(),
            Some(_) => return Err(self.error("expected a statement keyword")),
            None => return Err(ParseError("empty statement".into())),
        };

        let stmt = match first.as_str() {
            "SELECT" => Statement::Select(self.select()?),
            "INSERT" => Statement::Insert(self.insert()?),
            "UPDATE" => Statement::Update(self.update()?),
            "DELETE" => Statement::Delete(self.delete()?),
            "CREATE" => Statement::CreateTable(self.create_table()?),
            "DROP" => Statement::DropTable(self.drop_table()?),
            "PRAGMA" => Statement::TableInfo(self.pragma()?),
            other => return Err(ParseError(format!("unsupported statement kind: {}", other))),
        };

        self.finish()?;
        Ok(stmt)
    }

    fn select(&mut self) -> ParseResult<Select> {
        self.expect_keyword("SELECT")?;
        let projection = self.projection()?;
        self.expect_keyword("FROM")?;
        let table = self.identifier()?;
        let conditions = self.where_clause()?;

        let mut order_by = None;
        if self.eat_keyword("ORDER") {
            self.expect_keyword("BY")?;
            let column = self.identifier()?;
            let descending = if self.eat_keyword("DESC") {
                true
            } else {
                self.eat_keyword("ASC");
                false
            };
            order_by = Some(OrderBy { column, descending });
        }

        let (mut limit, mut offset) = (None, None);
        if self.eat_keyword("LIMIT") {
            let first = self.operand()?;
            if self.eat(&TokenKind::Comma) {
                // MySQL `LIMIT offset, count`
                offset = Some(first);
                limit = Some(self.operand()?);
            } else {
                limit = Some(first);
                if self.eat_keyword("OFFSET") {
                    offset = Some(self.operand()?);
                }
            }
        }

        Ok(Select {
            projection,
            table,
            conditions,
            order_by,
            limit,
            offset,
        })
    }

    fn projection(&mut self) -> ParseResult<Projection> {
        if self.eat(&TokenKind::Star) {
            return Ok(Projection::All);
        }

        if self.peek_keyword("COUNT") && self.peek_at(1) == Some(&TokenKind::LParen) {
            self.pos += 2;
            self.expect(TokenKind::Star, "'*' in COUNT(*)")?;
            self.expect(TokenKind::RParen, "')'")?;
            let alias = if self.eat_keyword("AS") {
                self.identifier()?
            } else {
                "COUNT(*)".to_string()
            };
            return Ok(Projection::Count { alias });
        }

        let mut columns = Vec::new();
        loop {
            let column = self.identifier()?;
            let alias = if self.eat_keyword("AS") {
                self.identifier()?
            } else {
                column.clone()
            };
            columns.push((column, alias));
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(Projection::Columns(columns))
    }

    fn insert(&mut self) -> ParseResult<Insert> {
        self.expect_keyword("INSERT")?;
        self.expect_keyword("INTO")?;
        let table = self.identifier()?;

        self.expect(TokenKind::LParen, "'(' before column list")?;
        let mut columns = vec![self.identifier()?];
        while self.eat(&TokenKind::Comma) {
            columns.push(self.identifier()?);
        }
        self.expect(TokenKind::RParen, "')' after column list")?;

        self.expect_keyword("VALUES")?;
        self.expect(TokenKind::LParen, "'(' before values")?;
        let mut values = vec![self.operand()?];
        while self.eat(&TokenKind::Comma) {
            values.push(self.operand()?);
        }
        self.expect(TokenKind::RParen, "')' after values")?;

        if columns.len() != values.len() {
            return Err(ParseError(format!(
                "INSERT into {} names {} columns but supplies {} values",
                table,
                columns.len(),
                values.len()
            )));
        }

        Ok(Insert {
            table,
            columns,
            values,
        })
    }

    fn update(&mut self) -> ParseResult<Update> {
        self.expect_keyword("UPDATE")?;
        let table = self.identifier()?;
        self.expect_keyword("SET")?;

        let mut assignments = Vec::new();
        loop {
            let column = self.identifier()?;
            self.expect(TokenKind::Cmp("="), "'=' in SET")?;
            assignments.push((column, self.operand()?));
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }

        let conditions = self.where_clause()?;
        if conditions.is_empty() {
            return Err(ParseError(format!("UPDATE {} without a WHERE clause", table)));
        }

        Ok(Update {
            table,
            assignments,
            conditions,
        })
    }

    fn delete(&mut self) -> ParseResult<Delete> {
        self.expect_keyword("DELETE")?;
        self.expect_keyword("FROM")?;
        let table = self.identifier()?;
        let conditions = self.where_clause()?;
        Ok(Delete { table, conditions })
    }

    fn create_table(&mut self) -> ParseResult<CreateTable> {
        self.expect_keyword("CREATE")?;
        self.expect_keyword("TABLE")?;
        let if_not_exists = if self.eat_keyword("IF") {
            self.expect_keyword("NOT")?;
            self.expect_keyword("EXISTS")?;
            true
        } else {
            false
        };
        let table = self.identifier()?;

        self.expect(TokenKind::LParen, "'(' after table name")?;
        let mut items: Vec<Vec<Token>> = vec![Vec::new()];
        let mut depth = 0usize;
        loop {
            let token = self
                .next()
                .ok_or_else(|| ParseError(format!("unterminated column list for {}", table)))?;
            match token.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen if depth == 0 => break,
                TokenKind::RParen => depth -= 1,
                TokenKind::Comma if depth == 0 => {
                    items.push(Vec::new());
                    continue;
                }
                _ => {}
            }
            if let Some(current) = items.last_mut() {
                current.push(token);
            }
        }

        let mut columns: Vec<ColumnDescriptor> = Vec::new();
        let mut table_pk: Vec<String> = Vec::new();
        for item in items.iter().filter(|item| !item.is_empty()) {
            if TABLE_CONSTRAINT_WORDS.iter().any(|w| item[0].is_keyword(w)) {
                if item.iter().any(|t| t.is_keyword("PRIMARY")) {
                    table_pk.extend(parenthesized_names(item));
                }
                continue;
            }
            columns.push(self.column_definition(item)?);
        }

        for column in columns.iter_mut() {
            if table_pk.contains(&column.name) {
                column.is_primary_key = true;
                column.nullable = false;
            }
        }

        // Table options (ENGINE=..., DEFAULT CHARSET=...) are ignored.
        while self.peek().is_some() && self.peek() != Some(&TokenKind::Semicolon) {
            self.pos += 1;
        }

        Ok(CreateTable {
            table,
            if_not_exists,
            columns,
        })
    }

    fn column_definition(&self, item: &[Token]) -> ParseResult<ColumnDescriptor> {
        let name = match &item[0].kind {
            TokenKind::Word(w) | TokenKind::Quoted(w) => w.clone(),
            other => return Err(ParseError(format!("expected column name, found {:?}", other))),
        };

        let type_end = item[1..]
            .iter()
            .position(|t| CONSTRAINT_WORDS.iter().any(|w| t.is_keyword(w)))
            .map(|p| p + 1)
            .unwrap_or(item.len());
        let native_type = if type_end > 1 {
            self.src[item[1].span.start..item[type_end - 1].span.end].to_string()
        } else {
            String::new()
        };

        let mut column = ColumnDescriptor::new(name, native_type);
        let mut i = type_end;
        while i < item.len() {
            let token = &item[i];
            if token.is_keyword("NOT") && item.get(i + 1).is_some_and(|t| t.is_keyword("NULL")) {
                column.nullable = false;
                i += 2;
                continue;
            }
            if token.is_keyword("PRIMARY") {
                column.is_primary_key = true;
                column.nullable = false;
                // SQLite: INTEGER PRIMARY KEY aliases the rowid
                if column.native_type.eq_ignore_ascii_case("INTEGER") {
                    column.auto_increment = true;
                }
            } else if token.is_keyword("AUTO_INCREMENT") || token.is_keyword("AUTOINCREMENT") {
                column.auto_increment = true;
            } else if token.is_keyword("ON") {
                // ON UPDATE CURRENT_TIMESTAMP
                i += 3;
                continue;
            } else if token.is_keyword("DEFAULT") {
                let (literal, next) = self.default_literal(item, i + 1)?;
                column.default_value = Some(literal);
                i = next;
                continue;
            }
            i += 1;
        }

        Ok(column)
    }

    /// Slice the DEFAULT expression starting at `item[start]` verbatim.
    fn default_literal(&self, item: &[Token], start: usize) -> ParseResult<(String, usize)> {
        let first = item
            .get(start)
            .ok_or_else(|| ParseError("DEFAULT without a value".into()))?;

        let mut end = start + 1;
        let opens_group = first.kind == TokenKind::LParen
            || item.get(start + 1).map(|t| &t.kind) == Some(&TokenKind::LParen);
        if opens_group {
            let mut depth = 0usize;
            let mut j = start;
            while j < item.len() {
                match item[j].kind {
                    TokenKind::LParen => depth += 1,
                    TokenKind::RParen => {
                        depth = depth.saturating_sub(1);
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
                j += 1;
            }
            end = (j + 1).min(item.len());
        }

        let text = self.src[first.span.start..item[end - 1].span.end].to_string();
        Ok((text, end))
    }

    fn drop_table(&mut self) -> ParseResult<DropTable> {
        self.expect_keyword("DROP")?;
        self.expect_keyword("TABLE")?;
        let if_exists = if self.eat_keyword("IF") {
            self.expect_keyword("EXISTS")?;
            true
        } else {
            false
        };
        let table = self.identifier()?;
        Ok(DropTable { table, if_exists })
    }

    fn pragma(&mut self) -> ParseResult<String> {
        self.expect_keyword("PRAGMA")?;
        if !self.eat_keyword("table_info") {
            return Err(self.error("only PRAGMA table_info is supported"));
        }
        self.expect(TokenKind::LParen, "'(' after table_info")?;
        let table = match self.peek() {
            Some(TokenKind::Str(s)) => {
                let s = s.clone();
                self.pos += 1;
                s
            }
            _ => self.identifier()?,
        };
        self.expect(TokenKind::RParen, "')'")?;
        Ok(table)
    }

    fn where_clause(&mut self) -> ParseResult<Vec<Condition>> {
        let mut conditions = Vec::new();
        if !self.eat_keyword("WHERE") {
            return Ok(conditions);
        }
        loop {
            conditions.push(self.condition()?);
            if !(self.eat_keyword("AND") || self.eat_keyword("OR")) {
                break;
            }
        }
        Ok(conditions)
    }

    fn condition(&mut self) -> ParseResult<Condition> {
        let column = self.identifier()?;

        let cmp = match self.peek() {
            Some(TokenKind::Cmp(cmp)) => Some(*cmp),
            _ => None,
        };

        let op = if let Some(cmp) = cmp {
            self.pos += 1;
            match cmp {
                "=" => Operator::Eq,
                "!=" | "<>" => Operator::NotEq,
                ">" => Operator::Gt,
                "<" => Operator::Lt,
                ">=" => Operator::Ge,
                _ => Operator::Le,
            }
        } else if self.eat_keyword("LIKE") {
            Operator::Like
        } else if self.eat_keyword("IN") {
            self.expect(TokenKind::LParen, "'(' after IN")?;
            let mut operands = vec![self.operand()?];
            while self.eat(&TokenKind::Comma) {
                operands.push(self.operand()?);
            }
            self.expect(TokenKind::RParen, "')' after IN list")?;
            return Ok(Condition {
                column,
                op: Operator::In,
                operands,
            });
        } else {
            return Err(self.error("expected a comparison operator"));
        };

        Ok(Condition {
            column,
            op,
            operands: vec![self.operand()?],
        })
    }

    fn operand(&mut self) -> ParseResult<Operand> {
        let token = self
            .next()
            .ok_or_else(|| ParseError("expected a value, found end of statement".into()))?;
        let value = match token.kind {
            TokenKind::Param => {
                let index = self.params;
                self.params += 1;
                return Ok(Operand::Param(index));
            }
            TokenKind::Number(n) => number_literal(&n)?,
            TokenKind::Str(s) => SqlValue::Text(s),
            TokenKind::Word(w) if w.eq_ignore_ascii_case("NULL") => SqlValue::Null,
            TokenKind::Word(w) if w.eq_ignore_ascii_case("TRUE") => SqlValue::Bool(true),
            TokenKind::Word(w) if w.eq_ignore_ascii_case("FALSE") => SqlValue::Bool(false),
            other => return Err(ParseError(format!("expected a value, found {:?}", other))),
        };
        Ok(Operand::Literal(value))
    }

    /// Bare, quoted or dotted (`db.table`) identifier; the last segment wins.
    fn identifier(&mut self) -> ParseResult<String> {
        let mut name = self.identifier_segment()?;
        while self.peek() == Some(&TokenKind::Dot) {
            self.pos += 1;
            name = self.identifier_segment()?;
        }
        Ok(name)
    }

    fn identifier_segment(&mut self) -> ParseResult<String> {
        match self.peek().cloned() {
            Some(TokenKind::Quoted(name)) => {
                self.pos += 1;
                Ok(name)
            }
            Some(TokenKind::Word(word))
                if !RESERVED.iter().any(|r| word.eq_ignore_ascii_case(r)) =>
            {
                self.pos += 1;
                Ok(word)
            }
            _ => Err(self.error("expected an identifier")),
        }
    }

    fn finish(&mut self) -> ParseResult<()> {
        while self.eat(&TokenKind::Semicolon) {}
        if self.peek().is_some() {
            return Err(self.error("unexpected trailing input"));
        }
        Ok(())
    }

    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn peek_at(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| &t.kind)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        self.tokens
            .get(self.pos)
            .is_some_and(|t| t.is_keyword(keyword))
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> ParseResult<()> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {}", keyword)))
        }
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> ParseResult<()> {
        if self.eat(&kind) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {}", what)))
        }
    }

    fn error(&self, message: &str) -> ParseError {
        match self.tokens.get(self.pos) {
            Some(token) => ParseError(format!(
                "{} near '{}'",
                message,
                &self.src[token.span.clone()]
            )),
            None => ParseError(format!("{} at end of statement", message)),
        }
    }
}

fn number_literal(text: &str) -> ParseResult<SqlValue> {
    if !text.contains('.') {
        if let Ok(i) = text.parse::<i64>() {
            return Ok(SqlValue::Int(i));
        }
    }
    text.parse::<f64>()
        .map(SqlValue::Float)
        .map_err(|_| ParseError(format!("invalid number '{}'", text)))
}

/// Names inside the first parenthesized group of a constraint item.
fn parenthesized_names(item: &[Token]) -> Vec<String> {
    item.iter()
        .skip_while(|t| t.kind != TokenKind::LParen)
        .skip(1)
        .take_while(|t| t.kind != TokenKind::RParen)
        .filter_map(|t| match &t.kind {
            TokenKind::Word(w) | TokenKind::Quoted(w) => Some(w.clone()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(sql: &str) -> Select {
        match parse(sql).unwrap() {
            Statement::Select(s) => s,
            other => panic!("expected SELECT, got {:?}", other),
        }
    }

    #[test]
    fn test_select_with_everything() {
        let s = select(
            "SELECT * FROM blogs WHERE status = ? AND views > 10 ORDER BY created_at DESC LIMIT ? OFFSET ?",
        );
        assert_eq!(s.projection, Projection::All);
        assert_eq!(s.table, "blogs");
        assert_eq!(s.conditions.len(), 2);
        assert_eq!(s.conditions[0].operands, vec![Operand::Param(0)]);
        assert_eq!(
            s.conditions[1].operands,
            vec![Operand::Literal(SqlValue::Int(10))]
        );
        assert_eq!(
            s.order_by,
            Some(OrderBy {
                column: "created_at".into(),
                descending: true
            })
        );
        assert_eq!(s.limit, Some(Operand::Param(1)));
        assert_eq!(s.offset, Some(Operand::Param(2)));
    }

    #[test]
    fn test_mysql_limit_offset_form() {
        let s = select("SELECT id FROM videos LIMIT 10, 5");
        assert_eq!(s.offset, Some(Operand::Literal(SqlValue::Int(10))));
        assert_eq!(s.limit, Some(Operand::Literal(SqlValue::Int(5))));
    }

    #[test]
    fn test_count_and_columns() {
        let s = select("SELECT COUNT(*) AS total FROM `page_views`;");
        assert_eq!(
            s.projection,
            Projection::Count {
                alias: "total".into()
            }
        );
        let s = select("SELECT b.id, title AS name FROM travel.blogs");
        assert_eq!(s.table, "blogs");
        assert_eq!(
            s.projection,
            Projection::Columns(vec![
                ("id".into(), "id".into()),
                ("title".into(), "name".into())
            ])
        );
    }

    #[test]
    fn test_in_and_like() {
        let s = select("SELECT * FROM users WHERE id IN (?, ?, 3) OR email LIKE '%@x.com'");
        assert_eq!(s.conditions[0].op, Operator::In);
        assert_eq!(s.conditions[0].operands.len(), 3);
        assert_eq!(s.conditions[1].op, Operator::Like);
    }

    #[test]
    fn test_insert() {
        let stmt = parse("INSERT INTO blogs (title, views, draft) VALUES (?, 0, NULL)").unwrap();
        assert_eq!(stmt.param_count(), 1);
        match stmt {
            Statement::Insert(i) => {
                assert_eq!(i.columns, vec!["title", "views", "draft"]);
                assert_eq!(i.values[2], Operand::Literal(SqlValue::Null));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_insert_arity_mismatch() {
        assert!(parse("INSERT INTO blogs (a, b) VALUES (?)").is_err());
    }

    #[test]
    fn test_update_params_in_order() {
        match parse("UPDATE blogs SET title = ?, views = ? WHERE id = ?").unwrap() {
            Statement::Update(u) => {
                assert_eq!(u.assignments[0].1, Operand::Param(0));
                assert_eq!(u.assignments[1].1, Operand::Param(1));
                assert_eq!(u.conditions[0].operands[0], Operand::Param(2));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_update_requires_where() {
        assert!(parse("UPDATE blogs SET title = ?").is_err());
    }

    #[test]
    fn test_create_table_mysql() {
        let sql = "CREATE TABLE IF NOT EXISTS users (
            id INT AUTO_INCREMENT PRIMARY KEY,
            email VARCHAR(255) NOT NULL UNIQUE,
            role ENUM('admin','editor') DEFAULT 'editor',
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
            score DECIMAL(10,2) DEFAULT 0.00,
            INDEX idx_email (email)
        ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4";
        match parse(sql).unwrap() {
            Statement::CreateTable(c) => {
                assert!(c.if_not_exists);
                assert_eq!(c.columns.len(), 5);
                assert!(c.columns[0].is_primary_key && c.columns[0].auto_increment);
                assert_eq!(c.columns[1].native_type, "VARCHAR(255)");
                assert!(!c.columns[1].nullable);
                assert_eq!(c.columns[2].native_type, "ENUM('admin','editor')");
                assert_eq!(c.columns[2].default_value.as_deref(), Some("'editor'"));
                assert_eq!(
                    c.columns[3].default_value.as_deref(),
                    Some("CURRENT_TIMESTAMP")
                );
                assert_eq!(c.columns[4].native_type, "DECIMAL(10,2)");
                assert_eq!(c.columns[4].default_value.as_deref(), Some("0.00"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_create_table_composite_key() {
        let sql = "CREATE TABLE likes (user_id INTEGER NOT NULL, blog_id INTEGER NOT NULL, PRIMARY KEY (user_id, blog_id))";
        match parse(sql).unwrap() {
            Statement::CreateTable(c) => {
                assert!(c.columns.iter().all(|col| col.is_primary_key));
                assert!(c.columns.iter().all(|col| !col.auto_increment));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_sqlite_integer_primary_key_autoincrements() {
        match parse("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)").unwrap() {
            Statement::CreateTable(c) => assert!(c.columns[0].auto_increment),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_drop_and_pragma() {
        assert_eq!(
            parse("DROP TABLE IF EXISTS blogs").unwrap(),
            Statement::DropTable(DropTable {
                table: "blogs".into(),
                if_exists: true
            })
        );
        assert_eq!(
            parse("PRAGMA table_info(videos)").unwrap(),
            Statement::TableInfo("videos".into())
        );
    }

    #[test]
    fn test_unsupported_shapes() {
        for sql in [
            "",
            "SHOW TABLES",
            "SELECT * FROM a JOIN b ON a.id = b.a_id",
            "SELECT * FROM blogs GROUP BY status",
            "ALTER TABLE blogs ADD COLUMN x INT",
            "SELECT * FROM blogs WHERE (id = 1)",
        ] {
            assert!(parse(sql).is_err(), "should reject: {}", sql);
        }
    }
}
