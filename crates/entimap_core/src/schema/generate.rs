//! DDL generation from entity metadata.

use crate::meta::{EntityMeta, PropertyMeta, SortOrder};
use entimap_session::{
    ColumnMetadata, SchemaDdl, SchemaObject, TableMetadata, ViewMetadata,
};
use tracing::debug;

/// Generates the DDL for an entity's table or materialized view.
///
/// Column order in the emitted DDL is exactly: partition keys in declared
/// order, clustering keys in declared order, then the remaining stored
/// columns. The order is a correctness requirement for clustering
/// semantics, not a style choice.
#[must_use]
pub fn generate_ddl(meta: &EntityMeta) -> SchemaDdl {
    debug!(entity = meta.type_name(), "generating DDL");
    match meta.view_base() {
        Some((_, base_table)) => view_ddl(meta, base_table),
        None => table_ddl(meta),
    }
}

fn table_ddl(meta: &EntityMeta) -> SchemaDdl {
    let mut lines = Vec::new();
    for column in meta.all_columns() {
        lines.push(format!("    {} {}", column.name(), column.cql_type().cql_name()));
    }
    lines.push(format!("    PRIMARY KEY {}", primary_key(meta)));

    let mut cql = format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
        meta.qualified_name(),
        lines.join(",\n")
    );
    if let Some(clause) = clustering_order(meta) {
        cql.push_str(&format!(" WITH CLUSTERING ORDER BY ({clause})"));
    }

    let mut table = TableMetadata::new(meta.keyspace(), meta.target_name());
    table.columns = column_images(meta);

    SchemaDdl {
        cql,
        object: SchemaObject::Table(table),
    }
}

fn view_ddl(meta: &EntityMeta, base_table: &str) -> SchemaDdl {
    let projection = meta
        .all_columns()
        .iter()
        .map(|c| c.name())
        .collect::<Vec<_>>()
        .join(", ");
    let not_null = meta
        .key_columns()
        .iter()
        .map(|c| format!("{} IS NOT NULL", c.name()))
        .collect::<Vec<_>>()
        .join(" AND ");

    let cql = format!(
        "CREATE MATERIALIZED VIEW IF NOT EXISTS {} AS\nSELECT {projection} FROM {}.{base_table}\nWHERE {not_null}\nPRIMARY KEY {}",
        meta.qualified_name(),
        meta.keyspace(),
        primary_key(meta)
    );

    let mut view = ViewMetadata::new(meta.keyspace(), meta.target_name(), base_table);
    view.columns = column_images(meta);

    SchemaDdl {
        cql,
        object: SchemaObject::View(view),
    }
}

/// Renders `(pk...)` or `((pk...), ck...)`.
fn primary_key(meta: &EntityMeta) -> String {
    let partition = meta
        .partition_keys()
        .iter()
        .map(PropertyMeta::name)
        .collect::<Vec<_>>()
        .join(", ");
    let clustering = meta
        .clustering_keys()
        .iter()
        .map(PropertyMeta::name)
        .collect::<Vec<_>>()
        .join(", ");

    if clustering.is_empty() {
        format!("({partition})")
    } else {
        format!("(({partition}), {clustering})")
    }
}

/// Renders the clustering-order clause, when any key deviates from ASC.
fn clustering_order(meta: &EntityMeta) -> Option<String> {
    let descending = meta
        .clustering_keys()
        .iter()
        .any(|c| c.clustering_order() == SortOrder::Descending);
    if !descending {
        return None;
    }
    Some(
        meta.clustering_keys()
            .iter()
            .map(|c| format!("{} {}", c.name(), c.clustering_order().cql_keyword()))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

fn column_images(meta: &EntityMeta) -> Vec<ColumnMetadata> {
    meta.all_columns()
        .into_iter()
        .filter_map(|property| {
            property.column_kind().map(|kind| {
                ColumnMetadata::new(property.name(), property.cql_type().clone(), kind)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapperOptions;
    use crate::descriptor::{EntityDescriptor, PropertyDescriptor};
    use crate::parse::{parse_entity, resolve_pending, ParsingContext};
    use entimap_session::CqlType;
    use std::collections::HashMap;

    struct Post;
    struct PostsByTitle;

    fn post() -> EntityDescriptor {
        EntityDescriptor::table::<Post>("posts", module_path!())
            .in_keyspace("app")
            .with_property(PropertyDescriptor::partition_key("author", CqlType::Uuid, 0))
            .with_property(PropertyDescriptor::partition_key("year", CqlType::Int, 1))
            .with_property(
                PropertyDescriptor::clustering_key("created_at", CqlType::Timestamp, 0)
                    .descending(),
            )
            .with_property(PropertyDescriptor::clustering_key("id", CqlType::TimeUuid, 1))
            .with_property(PropertyDescriptor::static_column("author_bio", CqlType::Text))
            .with_property(PropertyDescriptor::regular("title", CqlType::Text))
            .with_property(PropertyDescriptor::computed(
                "title_writetime",
                CqlType::BigInt,
                "writetime",
                vec!["title"],
            ))
    }

    fn parse(descriptor: &EntityDescriptor) -> EntityMeta {
        let options = MapperOptions::new().scan_package(module_path!());
        parse_entity(&mut ParsingContext::new(), descriptor, &options).unwrap()
    }

    #[test]
    fn table_ddl_column_order() {
        let ddl = generate_ddl(&parse(&post()));

        let author = ddl.cql.find("author uuid").unwrap();
        let year = ddl.cql.find("year int").unwrap();
        let created = ddl.cql.find("created_at timestamp").unwrap();
        let id = ddl.cql.find("id timeuuid").unwrap();
        let bio = ddl.cql.find("author_bio text").unwrap();
        let title = ddl.cql.find("title text").unwrap();

        // Partition keys, clustering keys, then the remaining columns.
        assert!(author < year && year < created && created < id && id < bio && bio < title);
    }

    #[test]
    fn table_ddl_primary_key_and_ordering() {
        let ddl = generate_ddl(&parse(&post()));
        assert!(ddl.cql.contains("PRIMARY KEY ((author, year), created_at, id)"));
        assert!(ddl
            .cql
            .contains("WITH CLUSTERING ORDER BY (created_at DESC, id ASC)"));
    }

    #[test]
    fn computed_columns_left_out_of_ddl() {
        let ddl = generate_ddl(&parse(&post()));
        assert!(!ddl.cql.contains("title_writetime"));

        match ddl.object {
            SchemaObject::Table(table) => assert!(table.column("title_writetime").is_none()),
            SchemaObject::View(_) => panic!("expected a table image"),
        }
    }

    #[test]
    fn no_clustering_order_clause_when_all_ascending() {
        struct Flat;
        let descriptor = EntityDescriptor::table::<Flat>("flat", module_path!())
            .in_keyspace("app")
            .with_property(PropertyDescriptor::partition_key("id", CqlType::Uuid, 0))
            .with_property(PropertyDescriptor::clustering_key("seq", CqlType::Int, 0));
        let ddl = generate_ddl(&parse(&descriptor));
        assert!(!ddl.cql.contains("CLUSTERING ORDER"));
        assert!(ddl.cql.contains("PRIMARY KEY ((id), seq)"));
    }

    #[test]
    fn view_ddl_selects_from_base() {
        let options = MapperOptions::new().scan_package(module_path!());
        let mut ctx = ParsingContext::new();
        let mut drafts = HashMap::new();

        let view_descriptor = EntityDescriptor::view::<PostsByTitle, Post>(
            "posts_by_title",
            module_path!(),
        )
        .in_keyspace("app")
        .with_property(PropertyDescriptor::partition_key("title", CqlType::Text, 0))
        .with_property(PropertyDescriptor::clustering_key("author", CqlType::Uuid, 0))
        .with_property(PropertyDescriptor::clustering_key("year", CqlType::Int, 1))
        .with_property(PropertyDescriptor::clustering_key(
            "created_at",
            CqlType::Timestamp,
            2,
        ))
        .with_property(PropertyDescriptor::clustering_key("id", CqlType::TimeUuid, 3));

        for descriptor in [post(), view_descriptor] {
            let meta = parse_entity(&mut ctx, &descriptor, &options).unwrap();
            drafts.insert(meta.type_id(), meta);
        }
        resolve_pending(&ctx, &mut drafts, &options).unwrap();

        let view_meta = &drafts[&std::any::TypeId::of::<PostsByTitle>()];
        let ddl = generate_ddl(view_meta);

        assert!(ddl.cql.starts_with("CREATE MATERIALIZED VIEW IF NOT EXISTS app.posts_by_title"));
        assert!(ddl.cql.contains("FROM app.posts"));
        assert!(ddl.cql.contains("title IS NOT NULL"));
        assert!(ddl.cql.contains("PRIMARY KEY ((title), author, year, created_at, id)"));

        match ddl.object {
            SchemaObject::View(view) => assert_eq!(view.base_table, "posts"),
            SchemaObject::Table(_) => panic!("expected a view image"),
        }
    }
}
