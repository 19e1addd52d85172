use crate::{
    access::{PUBLIC, Visibility},
    error::ApiError,
    models::{Document, DocumentChanges, NewDocument, NewUser, Role, User, UserChanges},
    pagination::Page,
    search,
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

pub const EMAIL_TAKEN: &str = "This email already exists!";
pub const TITLE_TAKEN: &str = "Sorry, this title already exists!";

/// RepoError
///
/// Persistence failures. Unique-constraint violations are surfaced as `Conflict`
/// carrying the user-facing message; everything else stays a raw `sqlx::Error`.
#[derive(Error, Debug)]
pub enum RepoError {
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for RepoError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                let message = match db.constraint() {
                    Some(c) if c.contains("email") => EMAIL_TAKEN,
                    Some(c) if c.contains("title") => TITLE_TAKEN,
                    _ => "This resource already exists!",
                };
                return RepoError::Conflict(message.to_string());
            }
        }
        RepoError::Database(e)
    }
}

impl From<RepoError> for ApiError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Conflict(message) => ApiError::Conflict(message),
            RepoError::Database(e) => ApiError::Database(e),
        }
    }
}

/// Paged
///
/// One window of a listing plus the size of the whole filtered collection.
#[derive(Debug, Clone)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: i64,
}

/// DocumentFilter
///
/// Everything a document listing can be narrowed by. Built by the handlers from the
/// requester's identity, the optional owner in the path and the optional search term.
#[derive(Debug, Clone)]
pub struct DocumentFilter {
    pub visibility: Visibility,
    pub owner_id: Option<i32>,
    /// Sanitized search term, matched case-insensitively against the title.
    pub title_contains: Option<String>,
}

impl DocumentFilter {
    pub fn visible(visibility: Visibility) -> Self {
        Self {
            visibility,
            owner_id: None,
            title_contains: None,
        }
    }

    pub fn owned_by(mut self, user_id: i32) -> Self {
        self.owner_id = Some(user_id);
        self
    }

    pub fn title_contains(mut self, term: impl Into<String>) -> Self {
        self.title_contains = Some(term.into());
        self
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.visibility.permits(document)
            && self.owner_id.is_none_or(|id| document.user_id == id)
            && self
                .title_contains
                .as_deref()
                .is_none_or(|term| search::contains_term(&document.title, term))
    }
}

/// Repository Trait
///
/// The persistence contract the handlers depend on. `Send + Sync + async_trait` make
/// the trait object (`Arc<dyn Repository>`) shareable across Axum's tasks.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn create_user(&self, user: NewUser) -> Result<User, RepoError>;
    async fn find_user(&self, id: i32) -> Result<Option<User>, RepoError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
    async fn list_users(&self, page: Page) -> Result<Paged<User>, RepoError>;
    // Case-insensitive substring match on full name or email.
    async fn search_users(&self, term: &str, page: Page) -> Result<Paged<User>, RepoError>;
    // Partial update; `Ok(None)` when the user does not exist.
    async fn update_user(&self, id: i32, changes: UserChanges) -> Result<Option<User>, RepoError>;
    // Cascades to the user's documents. `Ok(false)` when nothing was deleted.
    async fn delete_user(&self, id: i32) -> Result<bool, RepoError>;

    // --- Documents ---
    async fn create_document(&self, document: NewDocument) -> Result<Document, RepoError>;
    async fn find_document(&self, id: i32) -> Result<Option<Document>, RepoError>;
    // Newest first.
    async fn list_documents(
        &self,
        filter: &DocumentFilter,
        page: Page,
    ) -> Result<Paged<Document>, RepoError>;
    async fn update_document(
        &self,
        id: i32,
        changes: DocumentChanges,
    ) -> Result<Option<Document>, RepoError>;
    async fn delete_document(&self, id: i32) -> Result<bool, RepoError>;

    // --- Roles ---
    async fn list_roles(&self) -> Result<Vec<Role>, RepoError>;
    async fn role_exists(&self, name: &str) -> Result<bool, RepoError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const USER_COLUMNS: &str = "id, full_name, email, password_hash, role, created_at, updated_at";
const DOCUMENT_COLUMNS: &str =
    "id, title, content, owner, access_type, user_id, created_at, updated_at";

/// PostgresRepository
///
/// The `Repository` backed by PostgreSQL. Queries are built at runtime (`query_as`,
/// `QueryBuilder`) with every value bound, never interpolated.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// push_document_filter
///
/// Renders a `DocumentFilter` as a WHERE clause. Shared by the count and the page
/// query so both always describe the same collection.
fn push_document_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &DocumentFilter) {
    builder.push(" WHERE TRUE");

    if let Visibility::Restricted { user_id, role } = &filter.visibility {
        builder.push(" AND (access_type = ");
        builder.push_bind(PUBLIC);
        builder.push(" OR access_type = ");
        builder.push_bind(role.clone());
        builder.push(" OR user_id = ");
        builder.push_bind(*user_id);
        builder.push(")");
    }

    if let Some(owner_id) = filter.owner_id {
        builder.push(" AND user_id = ");
        builder.push_bind(owner_id);
    }

    if let Some(term) = &filter.title_contains {
        builder.push(" AND title ILIKE ");
        builder.push_bind(search::like_pattern(term));
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn create_user(&self, user: NewUser) -> Result<User, RepoError> {
        let query = format!(
            "INSERT INTO users (full_name, email, password_hash, role) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        let created = sqlx::query_as::<_, User>(&query)
            .bind(user.full_name)
            .bind(user.email)
            .bind(user.password_hash)
            .bind(user.role)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn find_user(&self, id: i32) -> Result<Option<User>, RepoError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn list_users(&self, page: Page) -> Result<Paged<User>, RepoError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        let query = format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id ASC LIMIT $1 OFFSET $2"
        );
        let items = sqlx::query_as::<_, User>(&query)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(Paged { items, total })
    }

    /// search_users
    ///
    /// The same bound pattern is matched against both columns with `ILIKE`.
    async fn search_users(&self, term: &str, page: Page) -> Result<Paged<User>, RepoError> {
        let pattern = search::like_pattern(term);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE full_name ILIKE $1 OR email ILIKE $1",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let query = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE full_name ILIKE $1 OR email ILIKE $1 \
             ORDER BY id ASC LIMIT $2 OFFSET $3"
        );
        let items = sqlx::query_as::<_, User>(&query)
            .bind(&pattern)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(Paged { items, total })
    }

    /// update_user
    ///
    /// `COALESCE` keeps every column whose change is `None`.
    async fn update_user(&self, id: i32, changes: UserChanges) -> Result<Option<User>, RepoError> {
        let query = format!(
            "UPDATE users \
             SET full_name = COALESCE($2, full_name), \
                 email = COALESCE($3, email), \
                 password_hash = COALESCE($4, password_hash), \
                 role = COALESCE($5, role), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(changes.full_name)
            .bind(changes.email)
            .bind(changes.password_hash)
            .bind(changes.role)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn delete_user(&self, id: i32) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_document(&self, document: NewDocument) -> Result<Document, RepoError> {
        let query = format!(
            "INSERT INTO documents (title, content, owner, access_type, user_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {DOCUMENT_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Document>(&query)
            .bind(document.title)
            .bind(document.content)
            .bind(document.owner)
            .bind(document.access_type)
            .bind(document.user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn find_document(&self, id: i32) -> Result<Option<Document>, RepoError> {
        let query = format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1");
        let document = sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(document)
    }

    /// list_documents
    ///
    /// Two statements over the same filter: a COUNT for the metadata and the page itself.
    async fn list_documents(
        &self,
        filter: &DocumentFilter,
        page: Page,
    ) -> Result<Paged<Document>, RepoError> {
        let mut count: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM documents");
        push_document_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {DOCUMENT_COLUMNS} FROM documents"));
        push_document_filter(&mut select, filter);
        select.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        select.push_bind(page.limit);
        select.push(" OFFSET ");
        select.push_bind(page.offset);

        let items = select
            .build_query_as::<Document>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Paged { items, total })
    }

    async fn update_document(
        &self,
        id: i32,
        changes: DocumentChanges,
    ) -> Result<Option<Document>, RepoError> {
        let query = format!(
            "UPDATE documents \
             SET title = COALESCE($2, title), \
                 content = COALESCE($3, content), \
                 access_type = COALESCE($4, access_type), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {DOCUMENT_COLUMNS}"
        );
        let document = sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .bind(changes.title)
            .bind(changes.content)
            .bind(changes.access_type)
            .fetch_optional(&self.pool)
            .await?;
        Ok(document)
    }

    async fn delete_document(&self, id: i32) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_roles(&self) -> Result<Vec<Role>, RepoError> {
        let roles = sqlx::query_as::<_, Role>("SELECT id, name FROM roles ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(roles)
    }

    async fn role_exists(&self, name: &str) -> Result<bool, RepoError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM roles WHERE name = $1)")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

// --- In-Memory Implementation ---

/// Roles every fresh `MemoryRepository` starts with, matching the migration seed.
pub const SEED_ROLES: [&str; 3] = ["admin", "user", "editor"];

#[derive(Default)]
struct MemoryStore {
    users: Vec<User>,
    documents: Vec<Document>,
    roles: Vec<Role>,
    next_user_id: i32,
    next_document_id: i32,
}

/// MemoryRepository
///
/// A `Repository` held in process memory. Enforces the same unique email/title rules
/// and cascade delete as the Postgres schema. Selected in local mode when no
/// `DATABASE_URL` is configured, and used as the backing store by the test-suite.
pub struct MemoryRepository {
    store: RwLock<MemoryStore>,
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRepository {
    pub fn new() -> Self {
        let roles = SEED_ROLES
            .iter()
            .zip(1..)
            .map(|(name, id)| Role {
                id,
                name: name.to_string(),
            })
            .collect();

        Self {
            store: RwLock::new(MemoryStore {
                roles,
                next_user_id: 1,
                next_document_id: 1,
                ..MemoryStore::default()
            }),
        }
    }
}

fn window<T: Clone>(items: &[T], page: Page) -> Paged<T> {
    let (start, end) = page.bounds(items.len());
    Paged {
        items: items[start..end].to_vec(),
        total: items.len() as i64,
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create_user(&self, user: NewUser) -> Result<User, RepoError> {
        let mut store = self.store.write().await;
        if store.users.iter().any(|u| u.email == user.email) {
            return Err(RepoError::Conflict(EMAIL_TAKEN.to_string()));
        }

        let now = Utc::now();
        let created = User {
            id: store.next_user_id,
            full_name: user.full_name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        store.next_user_id += 1;
        store.users.push(created.clone());
        Ok(created)
    }

    async fn find_user(&self, id: i32) -> Result<Option<User>, RepoError> {
        let store = self.store.read().await;
        Ok(store.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let store = self.store.read().await;
        Ok(store.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self, page: Page) -> Result<Paged<User>, RepoError> {
        let store = self.store.read().await;
        Ok(window(&store.users, page))
    }

    async fn search_users(&self, term: &str, page: Page) -> Result<Paged<User>, RepoError> {
        let store = self.store.read().await;
        let hits: Vec<User> = store
            .users
            .iter()
            .filter(|u| search::contains_term(&u.full_name, term) || search::contains_term(&u.email, term))
            .cloned()
            .collect();
        Ok(window(&hits, page))
    }

    async fn update_user(&self, id: i32, changes: UserChanges) -> Result<Option<User>, RepoError> {
        let mut store = self.store.write().await;
        if let Some(email) = &changes.email {
            if store.users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(RepoError::Conflict(EMAIL_TAKEN.to_string()));
            }
        }

        let Some(user) = store.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(full_name) = changes.full_name {
            user.full_name = full_name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: i32) -> Result<bool, RepoError> {
        let mut store = self.store.write().await;
        let before = store.users.len();
        store.users.retain(|u| u.id != id);
        if store.users.len() == before {
            return Ok(false);
        }
        store.documents.retain(|d| d.user_id != id);
        Ok(true)
    }

    async fn create_document(&self, document: NewDocument) -> Result<Document, RepoError> {
        let mut store = self.store.write().await;
        if store.documents.iter().any(|d| d.title == document.title) {
            return Err(RepoError::Conflict(TITLE_TAKEN.to_string()));
        }

        let now = Utc::now();
        let created = Document {
            id: store.next_document_id,
            title: document.title,
            content: document.content,
            owner: document.owner,
            access_type: document.access_type,
            user_id: document.user_id,
            created_at: now,
            updated_at: now,
        };
        store.next_document_id += 1;
        store.documents.push(created.clone());
        Ok(created)
    }

    async fn find_document(&self, id: i32) -> Result<Option<Document>, RepoError> {
        let store = self.store.read().await;
        Ok(store.documents.iter().find(|d| d.id == id).cloned())
    }

    async fn list_documents(
        &self,
        filter: &DocumentFilter,
        page: Page,
    ) -> Result<Paged<Document>, RepoError> {
        let store = self.store.read().await;
        // Insertion order is id order; newest first means walking it backwards.
        let hits: Vec<Document> = store
            .documents
            .iter()
            .rev()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect();
        Ok(window(&hits, page))
    }

    async fn update_document(
        &self,
        id: i32,
        changes: DocumentChanges,
    ) -> Result<Option<Document>, RepoError> {
        let mut store = self.store.write().await;
        if let Some(title) = &changes.title {
            if store.documents.iter().any(|d| d.id != id && &d.title == title) {
                return Err(RepoError::Conflict(TITLE_TAKEN.to_string()));
            }
        }

        let Some(document) = store.documents.iter_mut().find(|d| d.id == id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            document.title = title;
        }
        if let Some(content) = changes.content {
            document.content = content;
        }
        if let Some(access_type) = changes.access_type {
            document.access_type = access_type;
        }
        document.updated_at = Utc::now();
        Ok(Some(document.clone()))
    }

    async fn delete_document(&self, id: i32) -> Result<bool, RepoError> {
        let mut store = self.store.write().await;
        let before = store.documents.len();
        store.documents.retain(|d| d.id != id);
        Ok(store.documents.len() < before)
    }

    async fn list_roles(&self) -> Result<Vec<Role>, RepoError> {
        let store = self.store.read().await;
        Ok(store.roles.clone())
    }

    async fn role_exists(&self, name: &str) -> Result<bool, RepoError> {
        let store = self.store.read().await;
        Ok(store.roles.iter().any(|r| r.name == name))
    }
}
