//! Fixture entities and session catalogs.
//!
//! The fixtures model a small blog: `User` and `Post` tables, a
//! `PostsByTitle` materialized view, and a `PageView` counter table.
//! [`fixture_keyspace`] builds the matching live-schema catalog so
//! bootstrap validation passes out of the box.

use entimap_core::{
    Entity, EntityDescriptor, EntitySerializer, MapperError, MapperResult, PropertyDescriptor,
    SerializerFactory, StaticScanner,
};
use entimap_session::{
    ColumnKind, ColumnMetadata, ConsistencyLevel, CqlValue, CqlType, InMemorySession,
    KeyspaceMetadata, TableMetadata, ViewMetadata,
};
use std::any::{Any, TypeId};
use std::sync::Arc;
use uuid::Uuid;

/// A user of the fixture blog.
#[derive(Debug, Clone)]
pub struct User {
    /// Partition key.
    pub id: Uuid,
    /// Unique email address.
    pub email: String,
    /// Display name.
    pub name: String,
}

impl Entity for User {
    fn descriptor() -> EntityDescriptor {
        EntityDescriptor::table::<Self>("users", module_path!())
            .in_keyspace("blog")
            .with_property(PropertyDescriptor::partition_key("id", CqlType::Uuid, 0))
            .with_property(PropertyDescriptor::regular("email", CqlType::Text))
            .with_property(PropertyDescriptor::regular("name", CqlType::Text))
    }
}

/// A blog post, clustered by creation time under its author.
#[derive(Debug, Clone)]
pub struct Post {
    /// Partition key: the authoring user.
    pub author_id: Uuid,
    /// First clustering key, newest first.
    pub created_at: i64,
    /// Second clustering key.
    pub id: Uuid,
    /// Static per-author biography.
    pub author_bio: String,
    /// Post title.
    pub title: String,
    /// Post body.
    pub body: String,
    /// Join reference to the editing user.
    pub editor_id: Uuid,
}

impl Entity for Post {
    fn descriptor() -> EntityDescriptor {
        EntityDescriptor::table::<Self>("posts", module_path!())
            .in_keyspace("blog")
            .read_consistency(ConsistencyLevel::LocalQuorum)
            .write_consistency(ConsistencyLevel::Quorum)
            .with_property(PropertyDescriptor::partition_key("author_id", CqlType::Uuid, 0))
            .with_property(
                PropertyDescriptor::clustering_key("created_at", CqlType::Timestamp, 0)
                    .descending(),
            )
            .with_property(PropertyDescriptor::clustering_key("id", CqlType::TimeUuid, 1))
            .with_property(PropertyDescriptor::static_column("author_bio", CqlType::Text))
            .with_property(PropertyDescriptor::regular("title", CqlType::Text))
            .with_property(
                PropertyDescriptor::regular("body", CqlType::Text)
                    .with_read_consistency(ConsistencyLevel::One),
            )
            .with_property(PropertyDescriptor::join::<User>("editor_id", CqlType::Uuid))
            .with_property(PropertyDescriptor::computed(
                "body_writetime",
                CqlType::BigInt,
                "writetime",
                vec!["body"],
            ))
    }
}

/// Read-only projection of posts keyed by title.
#[derive(Debug, Clone)]
pub struct PostsByTitle;

impl Entity for PostsByTitle {
    fn descriptor() -> EntityDescriptor {
        EntityDescriptor::view::<Self, Post>("posts_by_title", module_path!())
            .in_keyspace("blog")
            .with_property(PropertyDescriptor::partition_key("title", CqlType::Text, 0))
            .with_property(PropertyDescriptor::clustering_key("author_id", CqlType::Uuid, 0))
            .with_property(
                PropertyDescriptor::clustering_key("created_at", CqlType::Timestamp, 1)
                    .descending(),
            )
            .with_property(PropertyDescriptor::clustering_key("id", CqlType::TimeUuid, 2))
    }
}

/// Page-hit counters for the fixture blog.
#[derive(Debug, Clone)]
pub struct PageView {
    /// Partition key: the page path.
    pub page: String,
    /// Hit counter delta.
    pub hits: i64,
}

impl Entity for PageView {
    fn descriptor() -> EntityDescriptor {
        EntityDescriptor::table::<Self>("page_views", module_path!())
            .in_keyspace("blog")
            .with_property(PropertyDescriptor::partition_key("page", CqlType::Text, 0))
            .with_property(PropertyDescriptor::counter("hits"))
    }
}

/// Returns the namespace root the fixture entities live under.
#[must_use]
pub fn fixture_package() -> String {
    module_path!().to_string()
}

/// Returns a scanner with every fixture entity registered.
#[must_use]
pub fn fixture_scanner() -> StaticScanner {
    StaticScanner::new()
        .register::<User>()
        .register::<Post>()
        .register::<PostsByTitle>()
        .register::<PageView>()
}

/// Builds the live `blog` keyspace matching the fixture entities.
#[must_use]
pub fn fixture_keyspace() -> KeyspaceMetadata {
    let users = TableMetadata::new("blog", "users")
        .with_column(ColumnMetadata::new("id", CqlType::Uuid, ColumnKind::PartitionKey))
        .with_column(ColumnMetadata::new("email", CqlType::Text, ColumnKind::Regular))
        .with_column(ColumnMetadata::new("name", CqlType::Text, ColumnKind::Regular));

    let posts = TableMetadata::new("blog", "posts")
        .with_column(ColumnMetadata::new("author_id", CqlType::Uuid, ColumnKind::PartitionKey))
        .with_column(ColumnMetadata::new(
            "created_at",
            CqlType::Timestamp,
            ColumnKind::Clustering,
        ))
        .with_column(ColumnMetadata::new("id", CqlType::TimeUuid, ColumnKind::Clustering))
        .with_column(ColumnMetadata::new("author_bio", CqlType::Text, ColumnKind::Static))
        .with_column(ColumnMetadata::new("title", CqlType::Text, ColumnKind::Regular))
        .with_column(ColumnMetadata::new("body", CqlType::Text, ColumnKind::Regular))
        .with_column(ColumnMetadata::new("editor_id", CqlType::Uuid, ColumnKind::Regular));

    let posts_by_title = ViewMetadata::new("blog", "posts_by_title", "posts")
        .with_column(ColumnMetadata::new("title", CqlType::Text, ColumnKind::PartitionKey))
        .with_column(ColumnMetadata::new("author_id", CqlType::Uuid, ColumnKind::Clustering))
        .with_column(ColumnMetadata::new(
            "created_at",
            CqlType::Timestamp,
            ColumnKind::Clustering,
        ))
        .with_column(ColumnMetadata::new("id", CqlType::TimeUuid, ColumnKind::Clustering));

    let page_views = TableMetadata::new("blog", "page_views")
        .with_column(ColumnMetadata::new("page", CqlType::Text, ColumnKind::PartitionKey))
        .with_column(ColumnMetadata::new("hits", CqlType::Counter, ColumnKind::Regular));

    KeyspaceMetadata::new("blog")
        .with_table(users)
        .with_table(posts)
        .with_view(posts_by_title)
        .with_table(page_views)
}

/// Returns an in-memory session pre-seeded with the fixture catalog.
#[must_use]
pub fn fixture_session() -> InMemorySession {
    InMemorySession::new().with_keyspace(fixture_keyspace())
}

/// Serializer factory covering the fixture entity types.
#[derive(Debug, Default)]
pub struct FixtureSerializerFactory;

impl SerializerFactory for FixtureSerializerFactory {
    fn serializer(&self, entity: TypeId) -> Option<Arc<dyn EntitySerializer>> {
        if entity == TypeId::of::<User>() {
            Some(Arc::new(UserSerializer))
        } else if entity == TypeId::of::<Post>() {
            Some(Arc::new(PostSerializer))
        } else if entity == TypeId::of::<PageView>() {
            Some(Arc::new(PageViewSerializer))
        } else {
            None
        }
    }
}

struct UserSerializer;

impl EntitySerializer for UserSerializer {
    fn insert_values(&self, entity: &dyn Any) -> MapperResult<Vec<CqlValue>> {
        let user = downcast::<User>(entity)?;
        Ok(vec![
            CqlValue::Uuid(user.id),
            CqlValue::Text(user.email.clone()),
            CqlValue::Text(user.name.clone()),
        ])
    }

    fn key_values(&self, entity: &dyn Any) -> MapperResult<Vec<CqlValue>> {
        let user = downcast::<User>(entity)?;
        Ok(vec![CqlValue::Uuid(user.id)])
    }
}

struct PostSerializer;

impl EntitySerializer for PostSerializer {
    fn insert_values(&self, entity: &dyn Any) -> MapperResult<Vec<CqlValue>> {
        let post = downcast::<Post>(entity)?;
        Ok(vec![
            CqlValue::Uuid(post.author_id),
            CqlValue::Timestamp(post.created_at),
            CqlValue::Uuid(post.id),
            CqlValue::Text(post.author_bio.clone()),
            CqlValue::Text(post.title.clone()),
            CqlValue::Text(post.body.clone()),
            CqlValue::Uuid(post.editor_id),
        ])
    }

    fn key_values(&self, entity: &dyn Any) -> MapperResult<Vec<CqlValue>> {
        let post = downcast::<Post>(entity)?;
        Ok(vec![
            CqlValue::Uuid(post.author_id),
            CqlValue::Timestamp(post.created_at),
            CqlValue::Uuid(post.id),
        ])
    }
}

struct PageViewSerializer;

impl EntitySerializer for PageViewSerializer {
    fn insert_values(&self, entity: &dyn Any) -> MapperResult<Vec<CqlValue>> {
        let view = downcast::<PageView>(entity)?;
        // The counter mutation template binds the delta first, then the key.
        Ok(vec![
            CqlValue::Counter(view.hits),
            CqlValue::Text(view.page.clone()),
        ])
    }

    fn key_values(&self, entity: &dyn Any) -> MapperResult<Vec<CqlValue>> {
        let view = downcast::<PageView>(entity)?;
        Ok(vec![CqlValue::Text(view.page.clone())])
    }
}

fn downcast<T: 'static>(entity: &dyn Any) -> MapperResult<&T> {
    entity.downcast_ref::<T>().ok_or_else(|| {
        MapperError::configuration(format!(
            "fixture serializer received an unexpected instance type, expected {}",
            std::any::type_name::<T>()
        ))
    })
}

/// Sample user instance.
#[must_use]
pub fn sample_user() -> User {
    User {
        id: Uuid::new_v4(),
        email: "ada@example.org".into(),
        name: "Ada".into(),
    }
}

/// Sample post instance authored by the given user.
#[must_use]
pub fn sample_post(author: &User) -> Post {
    Post {
        author_id: author.id,
        created_at: 1_700_000_000_000,
        id: Uuid::new_v4(),
        author_bio: "Writes about column families".into(),
        title: "On Clustering Order".into(),
        body: "Partition keys first.".into(),
        editor_id: author.id,
    }
}
