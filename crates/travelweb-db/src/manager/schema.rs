//! Application tables and sample content.
//!
//! Tables are declared once in MySQL types and rendered for the current
//! backend's dialect through the type mapper.

use crate::config::Dialect;
use crate::core::{ColumnDescriptor, Record, TableDefinition};
use crate::typemap::{build_create_table, mapper_for, quote_ident};

fn timestamps() -> [ColumnDescriptor; 2] {
    [
        ColumnDescriptor::new("created_at", "timestamp")
            .not_null()
            .default("CURRENT_TIMESTAMP"),
        ColumnDescriptor::new("updated_at", "timestamp")
            .not_null()
            .default("CURRENT_TIMESTAMP"),
    ]
}

fn with_timestamps(name: &str, mut columns: Vec<ColumnDescriptor>) -> TableDefinition {
    columns.extend(timestamps());
    TableDefinition::new(name, columns)
}

/// The site's tables, in creation order.
pub fn tables() -> Vec<TableDefinition> {
    vec![
        with_timestamps(
            "users",
            vec![
                ColumnDescriptor::new("id", "int(11)").primary_key(),
                ColumnDescriptor::new("username", "varchar(50)").not_null(),
                ColumnDescriptor::new("email", "varchar(255)").not_null(),
                ColumnDescriptor::new("display_name", "varchar(100)"),
                ColumnDescriptor::new("role", "enum('reader','editor','admin')")
                    .not_null()
                    .default("reader"),
            ],
        ),
        with_timestamps(
            "blogs",
            vec![
                ColumnDescriptor::new("id", "int(11)").primary_key(),
                ColumnDescriptor::new("title", "varchar(255)").not_null(),
                ColumnDescriptor::new("slug", "varchar(255)").not_null(),
                ColumnDescriptor::new("excerpt", "text"),
                ColumnDescriptor::new("content", "longtext"),
                ColumnDescriptor::new("author_id", "int(11)"),
                ColumnDescriptor::new("destination", "varchar(100)"),
                ColumnDescriptor::new("language", "varchar(5)")
                    .not_null()
                    .default("en"),
                ColumnDescriptor::new("status", "enum('draft','published','archived')")
                    .not_null()
                    .default("draft"),
                ColumnDescriptor::new("published_at", "datetime"),
            ],
        ),
        with_timestamps(
            "videos",
            vec![
                ColumnDescriptor::new("id", "int(11)").primary_key(),
                ColumnDescriptor::new("title", "varchar(255)").not_null(),
                ColumnDescriptor::new("description", "text"),
                ColumnDescriptor::new("url", "varchar(500)").not_null(),
                ColumnDescriptor::new("thumbnail_url", "varchar(500)"),
                ColumnDescriptor::new("duration_seconds", "int(11)"),
                ColumnDescriptor::new("destination", "varchar(100)"),
                ColumnDescriptor::new("language", "varchar(5)")
                    .not_null()
                    .default("en"),
                ColumnDescriptor::new("view_count", "int(11)")
                    .not_null()
                    .default("0"),
            ],
        ),
        with_timestamps(
            "page_views",
            vec![
                ColumnDescriptor::new("id", "bigint(20)").primary_key(),
                ColumnDescriptor::new("path", "varchar(500)").not_null(),
                ColumnDescriptor::new("referrer", "varchar(500)"),
                ColumnDescriptor::new("user_agent", "varchar(500)"),
                ColumnDescriptor::new("ip_address", "varchar(45)"),
                ColumnDescriptor::new("user_id", "int(11)"),
            ],
        ),
    ]
}

/// CREATE TABLE statement for `table` in `dialect`.
pub fn create_table_sql(table: &TableDefinition, dialect: Dialect) -> String {
    let mapper = mapper_for(Dialect::Mysql, dialect);
    let columns: Vec<_> = table.columns.iter().map(|c| mapper.map_column(c)).collect();
    build_create_table(dialect, &table.name, &columns, &table.primary_key())
}

/// Parameterized INSERT for one record.
pub fn insert_sql(dialect: Dialect, table: &str, record: &Record) -> String {
    let columns: Vec<String> = record.columns().map(|c| quote_ident(dialect, c)).collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(dialect, table),
        columns.join(", "),
        placeholders
    )
}

/// Starter content per table. Tables without sample rows are omitted.
pub fn sample_rows() -> Vec<(&'static str, Vec<Record>)> {
    vec![
        (
            "users",
            vec![Record::new()
                .with("username", "editor")
                .with("email", "editor@travelweb.example")
                .with("display_name", "Site Editor")
                .with("role", "admin")],
        ),
        (
            "blogs",
            vec![
                blog(
                    "Three Days in Lisbon",
                    "three-days-in-lisbon",
                    "Lisbon",
                    "Trams, tiles and the best pastel de nata stops.",
                ),
                blog(
                    "Hiking the Dolomites",
                    "hiking-the-dolomites",
                    "Dolomites",
                    "Hut-to-hut routes for the first alpine summer.",
                ),
                blog(
                    "Kyoto in Autumn",
                    "kyoto-in-autumn",
                    "Kyoto",
                    "Where to see the maples without the crowds.",
                ),
            ],
        ),
        (
            "videos",
            vec![
                video("Sunrise over Cappadocia", "Cappadocia", 184),
                video("Street Food in Bangkok", "Bangkok", 421),
            ],
        ),
    ]
}

fn blog(title: &str, slug: &str, destination: &str, excerpt: &str) -> Record {
    Record::new()
        .with("title", title)
        .with("slug", slug)
        .with("excerpt", excerpt)
        .with("author_id", 1)
        .with("destination", destination)
        .with("language", "en")
        .with("status", "published")
}

fn video(title: &str, destination: &str, duration: i64) -> Record {
    let slug = title.to_lowercase().replace(' ', "-");
    Record::new()
        .with("title", title)
        .with("url", format!("https://media.travelweb.example/videos/{}.mp4", slug))
        .with("duration_seconds", duration)
        .with("destination", destination)
        .with("language", "en")
}
