//! In-process table store that executes parsed statements.
//!
//! Shared by the emulated, file and memory adapters. Each table is a list
//! of records plus an auto-increment counter; declared columns are kept as
//! metadata when schema tracking is on and never enforced.
//!
//! Execution rules:
//! - SELECT applies only the first WHERE condition, then ORDER BY, then
//!   LIMIT/OFFSET
//! - INSERT assigns `id` from the counter when absent and stamps
//!   `created_at`/`updated_at`
//! - UPDATE applies the first SET assignment where the first equality
//!   condition matches
//! - DELETE removes rows matching the first equality condition
//! - `id`/`*_id` columns coerce numeric text to integers

mod document;
mod eval;

pub use document::{StoreDocument, TableIndex};

use std::borrow::Cow;
use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use tracing::{debug, warn};

use crate::core::{ColumnDescriptor, QueryResult, Record, SqlValue};
use crate::error::{DbError, Result};
use crate::sql::{
    CreateTable, Delete, DropTable, Insert, Operand, Operator, Projection, Select, Statement,
    Update,
};

/// Virtual catalog table listing every stored table.
pub const CATALOG_TABLE: &str = "sqlite_master";

/// Result of interpreting one statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Rows produced by a read.
    Rows(Vec<Record>),
    /// Counters produced by a write.
    Write(QueryResult),
    /// The statement is outside what the store can execute.
    Unsupported(String),
}

#[derive(Debug, Clone)]
struct Table {
    rows: Vec<Record>,
    next_id: i64,
    columns: Vec<ColumnDescriptor>,
}

impl Default for Table {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            next_id: 1,
            columns: Vec::new(),
        }
    }
}

/// Named tables of records.
#[derive(Debug, Clone, Default)]
pub struct TableStore {
    tables: BTreeMap<String, Table>,
    track_schema: bool,
}

impl TableStore {
    /// Empty store. With `track_schema`, CREATE TABLE column definitions are
    /// recorded for introspection.
    pub fn new(track_schema: bool) -> Self {
        Self {
            tables: BTreeMap::new(),
            track_schema,
        }
    }

    /// Rebuild a store from its persisted document.
    ///
    /// A `nextId` at or below the largest stored id is raised past it.
    pub fn from_document(doc: StoreDocument, track_schema: bool) -> Self {
        let StoreDocument {
            data,
            indexes,
            mut schema,
            ..
        } = doc;
        let mut tables = BTreeMap::new();

        for (name, rows) in data {
            let max_id = rows
                .iter()
                .filter_map(|r| r.get("id").and_then(SqlValue::as_i64))
                .max()
                .unwrap_or(0);
            let stored = indexes.get(&name).map(|i| i.next_id).unwrap_or(1);
            if stored <= max_id {
                warn!(
                    "{}: stored nextId {} is not above max id {}, advancing",
                    name, stored, max_id
                );
            }
            let columns = if track_schema {
                schema.remove(&name).unwrap_or_default()
            } else {
                Vec::new()
            };
            tables.insert(
                name,
                Table {
                    rows,
                    next_id: stored.max(max_id.saturating_add(1)),
                    columns,
                },
            );
        }

        if track_schema {
            for (name, columns) in schema {
                tables.entry(name).or_insert_with(|| Table {
                    columns,
                    ..Table::default()
                });
            }
        }

        Self {
            tables,
            track_schema,
        }
    }

    /// Snapshot the store as a document stamped with the current time.
    pub fn to_document(&self) -> StoreDocument {
        let mut doc = StoreDocument {
            last_modified: Some(timestamp()),
            ..StoreDocument::default()
        };
        for (name, table) in &self.tables {
            doc.data.insert(name.clone(), table.rows.clone());
            doc.indexes.insert(
                name.clone(),
                TableIndex {
                    next_id: table.next_id,
                },
            );
            if !table.columns.is_empty() {
                doc.schema.insert(name.clone(), table.columns.clone());
            }
        }
        doc
    }

    /// Table names, sorted.
    pub fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    /// Number of stored records, `None` when the table does not exist.
    pub fn row_count(&self, table: &str) -> Option<usize> {
        self.tables.get(table).map(|t| t.rows.len())
    }

    /// Next id the table will assign.
    pub fn next_id(&self, table: &str) -> Option<i64> {
        self.tables.get(table).map(|t| t.next_id)
    }

    /// Declared columns, or columns inferred from stored records when none
    /// were declared.
    pub fn describe(&self, table: &str) -> Option<Vec<ColumnDescriptor>> {
        let table = self.tables.get(table)?;
        if !table.columns.is_empty() {
            return Some(table.columns.clone());
        }
        Some(infer_columns(&table.rows))
    }

    /// Evaluate a read-only statement.
    pub fn evaluate(&self, stmt: &Statement, params: &[SqlValue]) -> Result<Outcome> {
        check_params(stmt, params)?;
        match stmt {
            Statement::Select(select) => self.select(select, params),
            Statement::TableInfo(table) => Ok(Outcome::Rows(self.table_info(table))),
            other => Ok(Outcome::Unsupported(format!(
                "{} changes data and must go through execute",
                other.kind()
            ))),
        }
    }

    /// Apply a statement, mutating the store.
    pub fn apply(&mut self, stmt: &Statement, params: &[SqlValue]) -> Result<Outcome> {
        check_params(stmt, params)?;
        match stmt {
            Statement::Insert(insert) => self.insert(insert, params).map(Outcome::Write),
            Statement::Update(update) => self.update(update, params),
            Statement::Delete(delete) => Ok(self.delete(delete, params)),
            Statement::CreateTable(create) => self.create_table(create).map(Outcome::Write),
            Statement::DropTable(drop) => self.drop_table(drop).map(Outcome::Write),
            Statement::Select(_) | Statement::TableInfo(_) => self.evaluate(stmt, params),
        }
    }

    fn select(&self, select: &Select, params: &[SqlValue]) -> Result<Outcome> {
        let source: Cow<'_, [Record]> = if select.table.eq_ignore_ascii_case(CATALOG_TABLE) {
            Cow::Owned(self.catalog_rows())
        } else {
            match self.tables.get(&select.table) {
                Some(table) => Cow::Borrowed(table.rows.as_slice()),
                None => Cow::Owned(Vec::new()),
            }
        };

        if select.conditions.len() > 1 {
            debug!(
                "{}: applying the first of {} WHERE conditions",
                select.table,
                select.conditions.len()
            );
        }

        let mut rows: Vec<&Record> = source
            .iter()
            .filter(|r| {
                select
                    .conditions
                    .first()
                    .map_or(true, |c| eval::matches(r, c, params))
            })
            .collect();

        if let Projection::Count { alias } = &select.projection {
            let count = Record::new().with(alias.clone(), rows.len() as i64);
            return Ok(Outcome::Rows(vec![count]));
        }

        if let Some(order) = &select.order_by {
            let null = SqlValue::Null;
            rows.sort_by(|a, b| {
                let ord = eval::order(
                    a.get(&order.column).unwrap_or(&null),
                    b.get(&order.column).unwrap_or(&null),
                );
                if order.descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }

        let offset = bound(select.offset.as_ref(), params, "OFFSET")?.unwrap_or(0);
        let limit = bound(select.limit.as_ref(), params, "LIMIT")?.unwrap_or(usize::MAX);
        let page = rows.into_iter().skip(offset).take(limit);

        let records = match &select.projection {
            Projection::Columns(columns) => page.map(|r| r.project(columns)).collect(),
            _ => page.cloned().collect(),
        };
        Ok(Outcome::Rows(records))
    }

    fn insert(&mut self, insert: &Insert, params: &[SqlValue]) -> Result<QueryResult> {
        let values: Vec<(String, SqlValue)> = insert
            .columns
            .iter()
            .zip(&insert.values)
            .map(|(column, op)| (column.clone(), eval::coerce_for_column(column, op.resolve(params))))
            .collect();

        let table = self.tables.entry(insert.table.clone()).or_insert_with(|| {
            debug!("{}: created implicitly by INSERT", insert.table);
            Table::default()
        });

        let id = match values.iter().find(|(c, _)| c == "id").map(|(_, v)| v) {
            Some(v) if !v.is_null() => v.as_i64().map(SqlValue::Int).unwrap_or_else(|| v.clone()),
            _ => SqlValue::Int(table.next_id),
        };

        if table
            .rows
            .iter()
            .any(|r| r.get("id").is_some_and(|existing| eval::equals(existing, &id)))
        {
            return Err(DbError::query(
                format!("INSERT INTO {}", insert.table),
                format!("UNIQUE constraint failed: {}.id ({})", insert.table, id),
            ));
        }

        let mut record = Record::new().with("id", id.clone());
        for (column, value) in values {
            if column != "id" {
                record.set(column, value);
            }
        }
        let now = timestamp();
        for stamp in ["created_at", "updated_at"] {
            if record.get(stamp).map_or(true, SqlValue::is_null) {
                record.set(stamp, now.clone());
            }
        }

        let insert_id = match id {
            SqlValue::Int(n) => {
                table.next_id = table.next_id.max(n.saturating_add(1));
                u64::try_from(n).unwrap_or(0)
            }
            _ => 0,
        };
        table.rows.push(record);

        Ok(QueryResult {
            affected_rows: 1,
            insert_id,
            changed_rows: 0,
        })
    }

    fn update(&mut self, update: &Update, params: &[SqlValue]) -> Result<Outcome> {
        let Some(condition) = update.conditions.iter().find(|c| c.op == Operator::Eq) else {
            return Ok(Outcome::Unsupported(format!(
                "UPDATE {} needs an equality WHERE condition",
                update.table
            )));
        };
        let Some((column, operand)) = update.assignments.first() else {
            return Ok(Outcome::Unsupported(format!(
                "UPDATE {} has no SET assignment",
                update.table
            )));
        };
        if update.assignments.len() > 1 {
            debug!(
                "{}: applying the first of {} SET assignments",
                update.table,
                update.assignments.len()
            );
        }

        let Some(table) = self.tables.get_mut(&update.table) else {
            return Ok(Outcome::Write(QueryResult::default()));
        };

        let value = eval::coerce_for_column(column, operand.resolve(params));

        // Ids stay unique: the new id may only land on one row and must not
        // belong to a row outside the match.
        if column == "id" && !value.is_null() {
            let (matched, others): (Vec<&Record>, Vec<&Record>) = table
                .rows
                .iter()
                .partition(|r| eval::matches(r, condition, params));
            let taken = others
                .iter()
                .any(|r| r.get("id").is_some_and(|existing| eval::equals(existing, &value)));
            if taken || matched.len() > 1 {
                return Err(DbError::query(
                    format!("UPDATE {}", update.table),
                    format!("UNIQUE constraint failed: {}.id ({})", update.table, value),
                ));
            }
        }
        let now = SqlValue::Text(timestamp());
        let mut result = QueryResult::default();

        for record in table.rows.iter_mut() {
            if !eval::matches(record, condition, params) {
                continue;
            }
            result.affected_rows += 1;
            let unchanged = record
                .get(column)
                .is_some_and(|old| eval::same_value(old, &value));
            if unchanged {
                continue;
            }
            result.changed_rows += 1;
            record.set(column.clone(), value.clone());
            if column != "updated_at" {
                record.set("updated_at", now.clone());
            }
        }

        if column == "id" {
            if let Some(n) = value.as_i64() {
                table.next_id = table.next_id.max(n.saturating_add(1));
            }
        }

        Ok(Outcome::Write(result))
    }

    fn delete(&mut self, delete: &Delete, params: &[SqlValue]) -> Outcome {
        let condition = delete.conditions.iter().find(|c| c.op == Operator::Eq);
        if condition.is_none() && !delete.conditions.is_empty() {
            return Outcome::Unsupported(format!(
                "DELETE FROM {} needs an equality WHERE condition",
                delete.table
            ));
        }

        let Some(table) = self.tables.get_mut(&delete.table) else {
            return Outcome::Write(QueryResult::default());
        };

        let before = table.rows.len();
        match condition {
            Some(c) => table.rows.retain(|r| !eval::matches(r, c, params)),
            None => table.rows.clear(),
        }
        Outcome::Write(QueryResult::affected((before - table.rows.len()) as u64))
    }

    fn create_table(&mut self, create: &CreateTable) -> Result<QueryResult> {
        if let Some(existing) = self.tables.get_mut(&create.table) {
            if !create.if_not_exists {
                return Err(DbError::query(
                    format!("CREATE TABLE {}", create.table),
                    format!("table {} already exists", create.table),
                ));
            }
            // A table created implicitly by INSERT picks up its declared columns.
            if self.track_schema && existing.columns.is_empty() {
                existing.columns = create.columns.clone();
            }
            return Ok(QueryResult::default());
        }

        let columns = if self.track_schema {
            create.columns.clone()
        } else {
            Vec::new()
        };
        self.tables.insert(
            create.table.clone(),
            Table {
                columns,
                ..Table::default()
            },
        );
        Ok(QueryResult::default())
    }

    fn drop_table(&mut self, drop: &DropTable) -> Result<QueryResult> {
        if self.tables.remove(&drop.table).is_none() && !drop.if_exists {
            return Err(DbError::query(
                format!("DROP TABLE {}", drop.table),
                format!("no such table: {}", drop.table),
            ));
        }
        Ok(QueryResult::default())
    }

    /// `PRAGMA table_info` rows; empty for an unknown table.
    fn table_info(&self, table: &str) -> Vec<Record> {
        self.describe(table)
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(cid, column)| {
                Record::new()
                    .with("cid", cid as i64)
                    .with("name", column.name)
                    .with("type", column.native_type)
                    .with("notnull", i64::from(!column.nullable))
                    .with("dflt_value", column.default_value)
                    .with("pk", i64::from(column.is_primary_key))
            })
            .collect()
    }

    fn catalog_rows(&self) -> Vec<Record> {
        self.tables
            .iter()
            .enumerate()
            .map(|(i, (name, table))| {
                Record::new()
                    .with("type", "table")
                    .with("name", name.clone())
                    .with("tbl_name", name.clone())
                    .with("rootpage", (i + 2) as i64)
                    .with("sql", render_ddl(name, &table.columns))
            })
            .collect()
    }
}

fn check_params(stmt: &Statement, params: &[SqlValue]) -> Result<()> {
    let expected = stmt.param_count();
    if params.len() < expected {
        return Err(DbError::query(
            stmt.kind(),
            format!(
                "statement expects {} parameters, {} supplied",
                expected,
                params.len()
            ),
        ));
    }
    Ok(())
}

fn bound(operand: Option<&Operand>, params: &[SqlValue], clause: &str) -> Result<Option<usize>> {
    let Some(operand) = operand else {
        return Ok(None);
    };
    let value = operand.resolve(params);
    value
        .as_i64()
        .and_then(|n| usize::try_from(n).ok())
        .map(Some)
        .ok_or_else(|| {
            DbError::query(
                clause,
                format!("{} must be a non-negative integer, got {}", clause, value),
            )
        })
}

fn infer_columns(rows: &[Record]) -> Vec<ColumnDescriptor> {
    let mut columns: Vec<ColumnDescriptor> = Vec::new();
    for record in rows {
        for (name, value) in record.iter() {
            match columns.iter_mut().find(|c| c.name == name) {
                Some(column) if column.native_type.is_empty() => {
                    column.native_type = inferred_type(value).to_string();
                }
                Some(_) => {}
                None if name == "id" => {
                    columns.push(ColumnDescriptor::new(name, "INTEGER").primary_key());
                }
                None => columns.push(ColumnDescriptor::new(name, inferred_type(value))),
            }
        }
    }
    for column in columns.iter_mut().filter(|c| c.native_type.is_empty()) {
        column.native_type = "TEXT".to_string();
    }
    columns
}

fn inferred_type(value: &SqlValue) -> &'static str {
    match value {
        SqlValue::Null => "",
        SqlValue::Int(_) | SqlValue::UInt(_) | SqlValue::Bool(_) => "INTEGER",
        SqlValue::Float(_) => "REAL",
        SqlValue::Bytes(_) => "BLOB",
        _ => "TEXT",
    }
}

fn render_ddl(table: &str, columns: &[ColumnDescriptor]) -> SqlValue {
    if columns.is_empty() {
        return SqlValue::Null;
    }
    let defs: Vec<String> = columns
        .iter()
        .map(|c| {
            let mut def = format!("{} {}", c.name, c.native_type);
            if c.is_primary_key {
                def.push_str(" PRIMARY KEY");
            } else if !c.nullable {
                def.push_str(" NOT NULL");
            }
            def
        })
        .collect();
    SqlValue::Text(format!("CREATE TABLE {} ({})", table, defs.join(", ")))
}

/// Current UTC time, RFC 3339 with milliseconds.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::parse;

    fn run(store: &mut TableStore, sql: &str, params: &[SqlValue]) -> Outcome {
        store.apply(&parse(sql).unwrap(), params).unwrap()
    }

    fn rows(store: &TableStore, sql: &str, params: &[SqlValue]) -> Vec<Record> {
        match store.evaluate(&parse(sql).unwrap(), params).unwrap() {
            Outcome::Rows(rows) => rows,
            other => panic!("expected rows, got {:?}", other),
        }
    }

    fn write(store: &mut TableStore, sql: &str, params: &[SqlValue]) -> QueryResult {
        match run(store, sql, params) {
            Outcome::Write(result) => result,
            other => panic!("expected write, got {:?}", other),
        }
    }

    fn seeded_blogs(n: i64) -> TableStore {
        let mut store = TableStore::new(true);
        for i in 1..=n {
            write(
                &mut store,
                "INSERT INTO blogs (title, status) VALUES (?, ?)",
                &[
                    SqlValue::Text(format!("Post {}", i)),
                    SqlValue::from(if i % 2 == 0 { "published" } else { "draft" }),
                ],
            );
        }
        store
    }

    #[test]
    fn test_insert_assigns_next_id_and_stamps() {
        let mut store = TableStore::new(false);
        let result = write(
            &mut store,
            "INSERT INTO users (email) VALUES (?)",
            &["a@example.com".into()],
        );
        assert_eq!(result.insert_id, 1);
        assert_eq!(result.affected_rows, 1);
        assert_eq!(store.next_id("users"), Some(2));

        let all = rows(&store, "SELECT * FROM users", &[]);
        let cols: Vec<&str> = all[0].columns().collect();
        assert_eq!(cols, vec!["id", "email", "created_at", "updated_at"]);
        let stamp = all[0].get("created_at").and_then(SqlValue::as_str).unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[test]
    fn test_insert_id_equals_previous_next_id() {
        let mut store = seeded_blogs(3);
        let before = store.next_id("blogs").unwrap();
        let result = write(
            &mut store,
            "INSERT INTO blogs (title) VALUES ('x')",
            &[],
        );
        assert_eq!(result.insert_id as i64, before);
        assert_eq!(store.next_id("blogs"), Some(before + 1));
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let mut store = seeded_blogs(3);
        write(&mut store, "DELETE FROM blogs WHERE id = ?", &[SqlValue::Int(3)]);
        let result = write(&mut store, "INSERT INTO blogs (title) VALUES ('y')", &[]);
        assert_eq!(result.insert_id, 4);
    }

    #[test]
    fn test_explicit_id_advances_counter() {
        let mut store = TableStore::new(false);
        write(
            &mut store,
            "INSERT INTO videos (id, title) VALUES (?, ?)",
            &["10".into(), "Alps".into()],
        );
        assert_eq!(store.next_id("videos"), Some(11));
        let err = store
            .apply(
                &parse("INSERT INTO videos (id) VALUES (10)").unwrap(),
                &[],
            )
            .unwrap_err();
        assert!(err.to_string().contains("UNIQUE"));
    }

    #[test]
    fn test_pagination_returns_rows_eleven_to_twenty() {
        let store = seeded_blogs(25);
        let page = rows(
            &store,
            "SELECT * FROM blogs ORDER BY id ASC LIMIT ? OFFSET ?",
            &[SqlValue::Int(10), SqlValue::Int(10)],
        );
        let ids: Vec<i64> = page
            .iter()
            .filter_map(|r| r.get("id").and_then(SqlValue::as_i64))
            .collect();
        assert_eq!(ids, (11..=20).collect::<Vec<_>>());
    }

    #[test]
    fn test_only_first_condition_applies() {
        let store = seeded_blogs(4);
        let found = rows(
            &store,
            "SELECT * FROM blogs WHERE status = ? AND id = ?",
            &["published".into(), SqlValue::Int(999)],
        );
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_id_coercion_on_where() {
        let store = seeded_blogs(3);
        let found = rows(&store, "SELECT title FROM blogs WHERE id = ?", &["2".into()]);
        assert_eq!(found, vec![Record::new().with("title", "Post 2")]);
    }

    #[test]
    fn test_order_desc_and_count() {
        let store = seeded_blogs(5);
        let top = rows(&store, "SELECT id FROM blogs ORDER BY id DESC LIMIT 2", &[]);
        assert_eq!(top[0].get("id"), Some(&SqlValue::Int(5)));
        assert_eq!(top[1].get("id"), Some(&SqlValue::Int(4)));

        let count = rows(
            &store,
            "SELECT COUNT(*) AS total FROM blogs WHERE status = 'draft'",
            &[],
        );
        assert_eq!(count[0].get("total"), Some(&SqlValue::Int(3)));
    }

    #[test]
    fn test_update_counts_changed_rows() {
        let mut store = seeded_blogs(4);
        let result = write(
            &mut store,
            "UPDATE blogs SET status = ? WHERE status = ?",
            &["published".into(), "published".into()],
        );
        assert_eq!(result.affected_rows, 2);
        assert_eq!(result.changed_rows, 0);

        let result = write(
            &mut store,
            "UPDATE blogs SET title = ? WHERE id = ?",
            &["Renamed".into(), SqlValue::Int(1)],
        );
        assert_eq!(result.affected_rows, 1);
        assert_eq!(result.changed_rows, 1);
        let row = rows(&store, "SELECT * FROM blogs WHERE id = 1", &[]);
        assert_eq!(row[0].get("title"), Some(&SqlValue::from("Renamed")));
    }

    #[test]
    fn test_update_without_equality_is_unsupported() {
        let mut store = seeded_blogs(2);
        let outcome = run(
            &mut store,
            "UPDATE blogs SET title = 'x' WHERE id > 0",
            &[],
        );
        assert!(matches!(outcome, Outcome::Unsupported(_)));
    }

    #[test]
    fn test_delete_all_without_where() {
        let mut store = seeded_blogs(3);
        let result = write(&mut store, "DELETE FROM blogs", &[]);
        assert_eq!(result.affected_rows, 3);
        assert_eq!(store.row_count("blogs"), Some(0));
        assert!(store.contains("blogs"));
    }

    #[test]
    fn test_write_on_read_path_is_unsupported() {
        let store = TableStore::new(false);
        let outcome = store
            .evaluate(&parse("DELETE FROM blogs").unwrap(), &[])
            .unwrap();
        assert!(matches!(outcome, Outcome::Unsupported(_)));
    }

    #[test]
    fn test_missing_params_is_query_error() {
        let store = TableStore::new(false);
        let err = store
            .evaluate(&parse("SELECT * FROM blogs WHERE id = ?").unwrap(), &[])
            .unwrap_err();
        assert!(matches!(err, DbError::Query { .. }));
    }

    #[test]
    fn test_create_drop_lifecycle() {
        let mut store = TableStore::new(true);
        let create = "CREATE TABLE videos (id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT NOT NULL)";
        write(&mut store, create, &[]);
        assert!(store.apply(&parse(create).unwrap(), &[]).is_err());
        write(
            &mut store,
            "CREATE TABLE IF NOT EXISTS videos (id INTEGER PRIMARY KEY)",
            &[],
        );
        assert_eq!(store.describe("videos").unwrap().len(), 2);

        write(&mut store, "DROP TABLE videos", &[]);
        assert!(!store.contains("videos"));
        assert!(store
            .apply(&parse("DROP TABLE videos").unwrap(), &[])
            .is_err());
        write(&mut store, "DROP TABLE IF EXISTS videos", &[]);
    }

    #[test]
    fn test_table_info_declared_and_inferred() {
        let mut store = TableStore::new(true);
        write(
            &mut store,
            "CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT NOT NULL DEFAULT '')",
            &[],
        );
        let info = rows(&store, "PRAGMA table_info(users)", &[]);
        assert_eq!(info.len(), 2);
        assert_eq!(info[1].get("notnull"), Some(&SqlValue::Int(1)));
        assert_eq!(info[1].get("dflt_value"), Some(&SqlValue::from("''")));

        let mut memory = TableStore::new(false);
        write(
            &mut memory,
            "INSERT INTO page_views (path, ms) VALUES ('/', 1.5)",
            &[],
        );
        let columns = memory.describe("page_views").unwrap();
        let types: Vec<&str> = columns.iter().map(|c| c.native_type.as_str()).collect();
        assert_eq!(types, vec!["INTEGER", "TEXT", "REAL", "TEXT", "TEXT"]);
        assert!(columns[0].is_primary_key);
    }

    #[test]
    fn test_catalog_table() {
        let mut store = seeded_blogs(1);
        write(&mut store, "CREATE TABLE videos (id INTEGER PRIMARY KEY)", &[]);
        let names = rows(
            &store,
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
            &[],
        );
        assert_eq!(
            names,
            vec![
                Record::new().with("name", "blogs"),
                Record::new().with("name", "videos")
            ]
        );
    }

    #[test]
    fn test_document_round_trip_repairs_next_id() {
        let store = seeded_blogs(3);
        let mut doc = store.to_document();
        assert!(doc.last_modified.is_some());
        assert!(doc.integrity_problems().is_empty());

        doc.indexes.insert("blogs".into(), TableIndex { next_id: 1 });
        let restored = TableStore::from_document(doc, true);
        assert_eq!(restored.next_id("blogs"), Some(4));
        assert_eq!(restored.row_count("blogs"), Some(3));
    }

    #[test]
    fn test_pagination_without_order_keeps_insertion_order() {
        let mut store = seeded_blogs(25);
        // An explicit id out of sequence shows the order is insertion, not id.
        write(
            &mut store,
            "INSERT INTO blogs (id, title) VALUES (?, ?)",
            &[SqlValue::Int(100), "Late".into()],
        );
        write(&mut store, "DELETE FROM blogs WHERE id = ?", &[SqlValue::Int(12)]);

        let ids = |sql: &str| -> Vec<i64> {
            rows(&store, sql, &[])
                .iter()
                .filter_map(|r| r.get("id").and_then(SqlValue::as_i64))
                .collect()
        };
        assert_eq!(
            ids("SELECT * FROM blogs LIMIT 10 OFFSET 10"),
            vec![11, 13, 14, 15, 16, 17, 18, 19, 20, 21]
        );
        assert_eq!(
            ids("SELECT * FROM blogs LIMIT 5 OFFSET 21"),
            vec![23, 24, 25, 100]
        );
    }

    #[test]
    fn test_update_rejects_duplicate_id() {
        let mut store = TableStore::new(false);
        write(&mut store, "INSERT INTO t (name) VALUES ('a')", &[]);
        write(&mut store, "INSERT INTO t (name) VALUES ('b')", &[]);

        let err = store
            .apply(&parse("UPDATE t SET id = 1 WHERE id = 2").unwrap(), &[])
            .unwrap_err();
        assert!(matches!(err, DbError::Query { .. }));
        assert!(err.to_string().contains("UNIQUE"));
        assert_eq!(rows(&store, "SELECT * FROM t WHERE id = 1", &[]).len(), 1);
        assert_eq!(rows(&store, "SELECT * FROM t WHERE id = 2", &[]).len(), 1);

        // Several rows matched by a non-id column cannot share one id.
        write(&mut store, "UPDATE t SET name = 'same' WHERE id = 2", &[]);
        write(&mut store, "UPDATE t SET name = 'same' WHERE id = 1", &[]);
        assert!(store
            .apply(&parse("UPDATE t SET id = 7 WHERE name = 'same'").unwrap(), &[])
            .is_err());

        // Moving a row to a free id is fine.
        let result = write(&mut store, "UPDATE t SET id = 9 WHERE id = 2", &[]);
        assert_eq!(result.changed_rows, 1);
        assert_eq!(store.next_id("t"), Some(10));
    }

    #[test]
    fn test_explicit_null_timestamps_are_stamped() {
        let mut store = TableStore::new(false);
        write(
            &mut store,
            "INSERT INTO videos (title, created_at, updated_at) VALUES (?, ?, NULL)",
            &["Fjords".into(), SqlValue::Null],
        );
        let all = rows(&store, "SELECT * FROM videos", &[]);
        for stamp in ["created_at", "updated_at"] {
            let value = all[0].get(stamp).and_then(SqlValue::as_str).unwrap();
            assert!(chrono::DateTime::parse_from_rfc3339(value).is_ok(), "{}", stamp);
        }
    }

    #[test]
    fn test_document_with_max_id_loads() {
        let doc: StoreDocument = serde_json::from_str(
            r#"{"data":{"blogs":[{"id":9223372036854775807,"title":"Edge"}]},"indexes":{"blogs":{"nextId":1}}}"#,
        )
        .unwrap();
        let mut store = TableStore::from_document(doc, false);
        assert_eq!(store.next_id("blogs"), Some(i64::MAX));
        assert_eq!(store.row_count("blogs"), Some(1));

        // No ids left: the counter lands on the existing row.
        let err = store
            .apply(&parse("INSERT INTO blogs (title) VALUES ('next')").unwrap(), &[])
            .unwrap_err();
        assert!(matches!(err, DbError::Query { .. }));
    }
}
