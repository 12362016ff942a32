//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::state::SiteStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{
    IndexRecord, IndexWrite, LemmaRecord, LemmaUpsert, NewPage, PageRecord, Posting, SiteRecord,
};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const SITE_COLUMNS: &str = "id, url, name, status, status_time, last_error";
const PAGE_COLUMNS: &str = "id, site_id, path, code, content";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn site_from_row(row: &Row<'_>) -> rusqlite::Result<SiteRecord> {
    let status: String = row.get(3)?;
    let status_time: String = row.get(4)?;
    let status_time = DateTime::parse_from_rfc3339(&status_time)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    Ok(SiteRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        name: row.get(2)?,
        status: SiteStatus::from_db_string(&status).unwrap_or(SiteStatus::Failed),
        status_time,
        last_error: row.get(5)?,
    })
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<PageRecord> {
    Ok(PageRecord {
        id: row.get(0)?,
        site_id: row.get(1)?,
        path: row.get(2)?,
        code: row.get(3)?,
        content: row.get(4)?,
    })
}

fn lemma_from_row(row: &Row<'_>) -> rusqlite::Result<LemmaRecord> {
    Ok(LemmaRecord {
        id: row.get(0)?,
        site_id: row.get(1)?,
        lemma: row.get(2)?,
        frequency: row.get(3)?,
    })
}

fn index_from_row(row: &Row<'_>) -> rusqlite::Result<IndexRecord> {
    Ok(IndexRecord {
        id: row.get(0)?,
        page_id: row.get(1)?,
        lemma_id: row.get(2)?,
        ranking: row.get(3)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Site Management =====

    fn insert_site(
        &mut self,
        url: &str,
        name: &str,
        status: SiteStatus,
    ) -> StorageResult<SiteRecord> {
        let now = Utc::now();
        self.conn.execute(
            "INSERT INTO sites (url, name, status, status_time) VALUES (?1, ?2, ?3, ?4)",
            params![url, name, status.to_db_string(), now.to_rfc3339()],
        )?;

        Ok(SiteRecord {
            id: self.conn.last_insert_rowid(),
            url: url.to_string(),
            name: name.to_string(),
            status,
            status_time: now,
            last_error: None,
        })
    }

    fn find_site_by_url(&self, url: &str) -> StorageResult<Option<SiteRecord>> {
        let site = self
            .conn
            .query_row(
                &format!("SELECT {} FROM sites WHERE url = ?1", SITE_COLUMNS),
                params![url],
                site_from_row,
            )
            .optional()?;
        Ok(site)
    }

    fn get_site(&self, site_id: i64) -> StorageResult<SiteRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM sites WHERE id = ?1", SITE_COLUMNS),
                params![site_id],
                site_from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::SiteNotFound(format!("Site ID {}", site_id)))
    }

    fn list_sites(&self) -> StorageResult<Vec<SiteRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM sites ORDER BY id", SITE_COLUMNS))?;
        let sites = stmt
            .query_map([], site_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sites)
    }

    fn update_site_status(
        &mut self,
        site_id: i64,
        status: SiteStatus,
        last_error: Option<&str>,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE sites SET status = ?1, status_time = ?2, last_error = ?3 WHERE id = ?4",
            params![status.to_db_string(), now, last_error, site_id],
        )?;

        if updated == 0 {
            return Err(StorageError::SiteNotFound(format!("Site ID {}", site_id)));
        }
        Ok(())
    }

    fn touch_site(&mut self, site_id: i64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE sites SET status_time = ?1 WHERE id = ?2",
            params![now, site_id],
        )?;
        Ok(())
    }

    fn delete_site_by_url(&mut self, url: &str) -> StorageResult<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM sites WHERE url = ?1", params![url])?;
        Ok(deleted > 0)
    }

    // ===== Page Management =====

    fn insert_page_if_absent(&mut self, page: &NewPage) -> StorageResult<Option<PageRecord>> {
        let inserted = self.conn.execute(
            "INSERT INTO pages (site_id, path, code, content) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(site_id, path) DO NOTHING",
            params![page.site_id, page.path, page.code, page.content],
        )?;

        if inserted == 0 {
            return Ok(None);
        }

        Ok(Some(PageRecord {
            id: self.conn.last_insert_rowid(),
            site_id: page.site_id,
            path: page.path.clone(),
            code: page.code,
            content: page.content.clone(),
        }))
    }

    fn find_page(&self, site_id: i64, path: &str) -> StorageResult<Option<PageRecord>> {
        let page = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM pages WHERE site_id = ?1 AND path = ?2",
                    PAGE_COLUMNS
                ),
                params![site_id, path],
                page_from_row,
            )
            .optional()?;
        Ok(page)
    }

    fn get_page(&self, page_id: i64) -> StorageResult<PageRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM pages WHERE id = ?1", PAGE_COLUMNS),
                params![page_id],
                page_from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::PageNotFound(format!("Page ID {}", page_id)))
    }

    fn update_page(&mut self, page_id: i64, code: u16, content: &str) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE pages SET code = ?1, content = ?2 WHERE id = ?3",
            params![code, content, page_id],
        )?;

        if updated == 0 {
            return Err(StorageError::PageNotFound(format!("Page ID {}", page_id)));
        }
        Ok(())
    }

    fn count_pages(&self, site_id: Option<i64>) -> StorageResult<u64> {
        let count: i64 = match site_id {
            Some(id) => self.conn.query_row(
                "SELECT COUNT(*) FROM pages WHERE site_id = ?1",
                params![id],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?,
        };
        Ok(count as u64)
    }

    // ===== Lemma Management =====

    fn upsert_lemma(
        &mut self,
        site_id: i64,
        lemma: &str,
        bump_existing: bool,
    ) -> StorageResult<LemmaUpsert> {
        let created = self.conn.execute(
            "INSERT INTO lemmas (site_id, lemma, frequency) VALUES (?1, ?2, 1)
             ON CONFLICT(site_id, lemma) DO NOTHING",
            params![site_id, lemma],
        )? > 0;

        let bumped = !created
            && bump_existing
            && self.conn.execute(
                "UPDATE lemmas SET frequency = frequency + 1 WHERE site_id = ?1 AND lemma = ?2",
                params![site_id, lemma],
            )? > 0;

        let record = self
            .find_lemma(site_id, lemma)?
            .ok_or_else(|| StorageError::Database(format!("lemma '{}' vanished", lemma)))?;

        Ok(LemmaUpsert {
            record,
            created,
            bumped,
        })
    }

    fn find_lemma(&self, site_id: i64, lemma: &str) -> StorageResult<Option<LemmaRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, site_id, lemma, frequency FROM lemmas WHERE site_id = ?1 AND lemma = ?2",
                params![site_id, lemma],
                lemma_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn count_lemmas(&self, site_id: Option<i64>) -> StorageResult<u64> {
        let count: i64 = match site_id {
            Some(id) => self.conn.query_row(
                "SELECT COUNT(*) FROM lemmas WHERE site_id = ?1",
                params![id],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM lemmas", [], |row| row.get(0))?,
        };
        Ok(count as u64)
    }

    // ===== Index Management =====

    fn upsert_index(
        &mut self,
        page_id: i64,
        lemma_id: i64,
        ranking: u32,
    ) -> StorageResult<IndexWrite> {
        let created = self.conn.execute(
            "INSERT INTO search_index (page_id, lemma_id, ranking) VALUES (?1, ?2, ?3)
             ON CONFLICT(page_id, lemma_id) DO NOTHING",
            params![page_id, lemma_id, ranking],
        )?;
        if created > 0 {
            return Ok(IndexWrite::Created);
        }

        let updated = self.conn.execute(
            "UPDATE search_index SET ranking = ?3
             WHERE page_id = ?1 AND lemma_id = ?2 AND ranking <> ?3",
            params![page_id, lemma_id, ranking],
        )?;
        if updated > 0 {
            Ok(IndexWrite::Updated)
        } else {
            Ok(IndexWrite::Unchanged)
        }
    }

    fn find_index(&self, page_id: i64, lemma_id: i64) -> StorageResult<Option<IndexRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, page_id, lemma_id, ranking FROM search_index
                 WHERE page_id = ?1 AND lemma_id = ?2",
                params![page_id, lemma_id],
                index_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn indexes_for_page(&self, page_id: i64) -> StorageResult<Vec<IndexRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, page_id, lemma_id, ranking FROM search_index WHERE page_id = ?1 ORDER BY id",
        )?;
        let records = stmt
            .query_map(params![page_id], index_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn postings(&self, lemma_id: i64) -> StorageResult<Vec<Posting>> {
        let mut stmt = self.conn.prepare(
            "SELECT page_id, ranking FROM search_index WHERE lemma_id = ?1 ORDER BY page_id",
        )?;
        let postings = stmt
            .query_map(params![lemma_id], |row| {
                Ok(Posting {
                    page_id: row.get(0)?,
                    ranking: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(postings)
    }
}
