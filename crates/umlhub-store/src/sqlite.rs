//! `SQLite` backend built on sqlx.
//!
//! Records live in the `diagrams` table; search documents live in the FTS5
//! table `search_documents`, keyed by `rowid` = record id. Both share one
//! pool but nothing links them.
//!
//! The store traits are synchronous while sqlx is async. [`SqliteDatabase`]
//! captures the runtime handle at connect time and blocks on it, so trait
//! methods must be called outside the async executor (from
//! `tokio::task::spawn_blocking` or a plain thread).

use std::collections::HashMap;
use std::future::Future;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tokio::runtime::Handle;
use umlhub_model::{ContentHash, Cursor, DiagramId, DiagramType, IndexedDiagram, NewDiagram};

use crate::error::{ErrorStatus, StoreError, StoreErrorKind};
use crate::store::{DiagramStore, Page, SearchIndex};

const BACKEND: &str = "Sqlite";

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS diagrams (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        origin_url TEXT NOT NULL,
        source TEXT NOT NULL,
        content_hash TEXT NOT NULL,
        diagram_type TEXT NOT NULL,
        svg TEXT NOT NULL,
        png_base64 TEXT NOT NULL,
        ascii TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_diagrams_content_hash ON diagrams (content_hash)",
    "CREATE INDEX IF NOT EXISTS idx_diagrams_origin_url ON diagrams (origin_url)",
    "CREATE INDEX IF NOT EXISTS idx_diagrams_type_id ON diagrams (diagram_type, id)",
    "CREATE VIRTUAL TABLE IF NOT EXISTS search_documents USING fts5(document)",
];

const SELECT_DIAGRAM: &str = "SELECT id, origin_url, source, content_hash, diagram_type, svg, png_base64, ascii FROM diagrams";

fn sqlx_error(err: sqlx::Error) -> StoreError {
    let (kind, status) = match &err {
        sqlx::Error::PoolTimedOut => (StoreErrorKind::Timeout, ErrorStatus::Temporary),
        sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            (StoreErrorKind::Unavailable, ErrorStatus::Persistent)
        }
        sqlx::Error::RowNotFound => (StoreErrorKind::NotFound, ErrorStatus::Permanent),
        sqlx::Error::Configuration(_) => (StoreErrorKind::InvalidQuery, ErrorStatus::Permanent),
        _ => (StoreErrorKind::Other, ErrorStatus::Permanent),
    };
    StoreError::new(kind)
        .with_status(status)
        .with_backend(BACKEND)
        .with_source(err)
}

fn diagram_from_row(row: &SqliteRow) -> Result<IndexedDiagram, sqlx::Error> {
    let diagram_type: String = row.try_get("diagram_type")?;
    let content_hash: String = row.try_get("content_hash")?;
    Ok(IndexedDiagram {
        id: DiagramId::new(row.try_get("id")?),
        origin_url: row.try_get("origin_url")?,
        source: row.try_get("source")?,
        content_hash: ContentHash::from_hex(content_hash),
        diagram_type: diagram_type.parse().unwrap_or(DiagramType::Unknown),
        svg: row.try_get("svg")?,
        png_base64: row.try_get("png_base64")?,
        ascii: row.try_get("ascii")?,
    })
}

fn cursor_position(cursor: Option<Cursor>) -> i64 {
    cursor.map_or(0, |c| i64::try_from(c.position()).unwrap_or(i64::MAX))
}

fn limit_param(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// Split terms into alphanumeric tokens, quote each as an FTS5 string and AND
/// them together. Tokens are cut the way [`MemorySearchIndex`] cuts them, so a
/// punctuation-only term such as `->` contributes nothing.
///
/// [`MemorySearchIndex`]: crate::MemorySearchIndex
fn fts5_query(terms: &[&str]) -> Option<String> {
    let quoted: Vec<String> = terms
        .iter()
        .flat_map(|t| t.split(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{t}\""))
        .collect();
    (!quoted.is_empty()).then(|| quoted.join(" AND "))
}

/// Shared `SQLite` pool plus the runtime used to drive it.
#[derive(Debug, Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
    handle: Handle,
}

impl SqliteDatabase {
    /// Open (creating if missing) the database at `url` and apply the schema.
    ///
    /// Must be awaited inside a tokio runtime; that runtime later drives the
    /// synchronous store methods.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the URL is invalid, the database cannot be
    /// opened, or the schema cannot be applied.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(sqlx_error)?
            .create_if_missing(true);

        // Every connection to an in-memory database is a separate database.
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(4)
        }
        .connect_with(options)
        .await
        .map_err(sqlx_error)?;

        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(sqlx_error)?;
        }

        tracing::info!(url = %url, "Opened SQLite database");

        Ok(Self {
            pool,
            handle: Handle::current(),
        })
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.handle.block_on(future)
    }

    /// Record store backed by this database.
    #[must_use]
    pub fn store(&self) -> SqliteStore {
        SqliteStore { db: self.clone() }
    }

    /// Search index backed by this database.
    #[must_use]
    pub fn search_index(&self) -> SqliteSearchIndex {
        SqliteSearchIndex { db: self.clone() }
    }
}

/// [`DiagramStore`] over the `diagrams` table.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db: SqliteDatabase,
}

impl DiagramStore for SqliteStore {
    fn insert(&self, diagram: NewDiagram) -> Result<DiagramId, StoreError> {
        let result = self.db.block_on(
            sqlx::query(
                "INSERT INTO diagrams (origin_url, source, content_hash, diagram_type, svg, png_base64, ascii)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&diagram.origin_url)
            .bind(&diagram.source)
            .bind(diagram.content_hash.as_str())
            .bind(diagram.diagram_type.as_str())
            .bind(&diagram.svg)
            .bind(&diagram.png_base64)
            .bind(&diagram.ascii)
            .execute(&self.db.pool),
        );
        let result = result.map_err(sqlx_error)?;
        Ok(DiagramId::new(result.last_insert_rowid()))
    }

    fn find_by_hash(&self, hash: &ContentHash) -> Result<Option<DiagramId>, StoreError> {
        let id: Option<i64> = self
            .db
            .block_on(
                sqlx::query_scalar::<_, i64>("SELECT id FROM diagrams WHERE content_hash = ? LIMIT 1")
                    .bind(hash.as_str())
                    .fetch_optional(&self.db.pool),
            )
            .map_err(sqlx_error)?;
        Ok(id.map(DiagramId::new))
    }

    fn delete_by_origin(&self, origin_url: &str) -> Result<Vec<DiagramId>, StoreError> {
        let ids: Vec<i64> = self
            .db
            .block_on(
                sqlx::query_scalar::<_, i64>("DELETE FROM diagrams WHERE origin_url = ? RETURNING id")
                    .bind(origin_url)
                    .fetch_all(&self.db.pool),
            )
            .map_err(sqlx_error)?;
        let mut ids: Vec<DiagramId> = ids.into_iter().map(DiagramId::new).collect();
        ids.sort_unstable();
        Ok(ids)
    }

    fn list(
        &self,
        filter: Option<DiagramType>,
        cursor: Option<Cursor>,
        limit: usize,
    ) -> Result<Page<IndexedDiagram>, StoreError> {
        let after = cursor_position(cursor);
        let rows = self
            .db
            .block_on(async {
                match filter {
                    Some(ty) => {
                        sqlx::query(&format!(
                            "{SELECT_DIAGRAM} WHERE diagram_type = ? AND id > ? ORDER BY id LIMIT ?"
                        ))
                        .bind(ty.as_str())
                        .bind(after)
                        .bind(limit_param(limit))
                        .fetch_all(&self.db.pool)
                        .await
                    }
                    None => {
                        sqlx::query(&format!("{SELECT_DIAGRAM} WHERE id > ? ORDER BY id LIMIT ?"))
                            .bind(after)
                            .bind(limit_param(limit))
                            .fetch_all(&self.db.pool)
                            .await
                    }
                }
            })
            .map_err(sqlx_error)?;

        let items = rows
            .iter()
            .map(diagram_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(sqlx_error)?;

        Ok(Page::new(items, limit, |items| {
            let last = items.last()?;
            u64::try_from(last.id.get()).ok().map(Cursor::new)
        }))
    }

    fn get(&self, id: DiagramId) -> Result<Option<IndexedDiagram>, StoreError> {
        let row = self
            .db
            .block_on(
                sqlx::query(&format!("{SELECT_DIAGRAM} WHERE id = ?"))
                    .bind(id.get())
                    .fetch_optional(&self.db.pool),
            )
            .map_err(sqlx_error)?;
        row.as_ref()
            .map(diagram_from_row)
            .transpose()
            .map_err(sqlx_error)
    }

    fn get_many(&self, ids: &[DiagramId]) -> Result<Vec<IndexedDiagram>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("{SELECT_DIAGRAM} WHERE id IN ({placeholders})");
        let rows = self
            .db
            .block_on(async {
                let mut query = sqlx::query(&sql);
                for id in ids {
                    query = query.bind(id.get());
                }
                query.fetch_all(&self.db.pool).await
            })
            .map_err(sqlx_error)?;

        let mut by_id: HashMap<DiagramId, IndexedDiagram> = rows
            .iter()
            .map(|row| diagram_from_row(row).map(|d| (d.id, d)))
            .collect::<Result<_, _>>()
            .map_err(sqlx_error)?;

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }
}

/// [`SearchIndex`] over the FTS5 `search_documents` table.
#[derive(Debug, Clone)]
pub struct SqliteSearchIndex {
    db: SqliteDatabase,
}

impl SearchIndex for SqliteSearchIndex {
    fn put(&self, id: DiagramId, document: &str) -> Result<(), StoreError> {
        self.db
            .block_on(async {
                let mut tx = self.db.pool.begin().await?;
                sqlx::query("DELETE FROM search_documents WHERE rowid = ?")
                    .bind(id.get())
                    .execute(&mut *tx)
                    .await?;
                sqlx::query("INSERT INTO search_documents (rowid, document) VALUES (?, ?)")
                    .bind(id.get())
                    .bind(document)
                    .execute(&mut *tx)
                    .await?;
                tx.commit().await
            })
            .map_err(sqlx_error)
    }

    fn remove(&self, id: DiagramId) -> Result<(), StoreError> {
        self.db
            .block_on(
                sqlx::query("DELETE FROM search_documents WHERE rowid = ?")
                    .bind(id.get())
                    .execute(&self.db.pool),
            )
            .map(|_| ())
            .map_err(sqlx_error)
    }

    fn search(
        &self,
        terms: &[&str],
        cursor: Option<Cursor>,
        limit: usize,
    ) -> Result<Page<DiagramId>, StoreError> {
        let Some(query) = fts5_query(terms) else {
            return Ok(Page::empty());
        };

        let offset = cursor_position(cursor);
        let ids: Vec<i64> = self
            .db
            .block_on(
                sqlx::query_scalar::<_, i64>(
                    "SELECT rowid FROM search_documents WHERE search_documents MATCH ?
                     ORDER BY rowid LIMIT ? OFFSET ?",
                )
                .bind(&query)
                .bind(limit_param(limit))
                .bind(offset)
                .fetch_all(&self.db.pool),
            )
            .map_err(sqlx_error)?;

        let hits: Vec<DiagramId> = ids.into_iter().map(DiagramId::new).collect();
        let next = offset.saturating_add(limit_param(hits.len()));
        Ok(Page::new(hits, limit, |_| {
            u64::try_from(next).ok().map(Cursor::new)
        }))
    }
}
