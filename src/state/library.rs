use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::data::{Slide, SlideId, SlideRecord};
use crate::error::{Result, SlideError};

/// The persistence operations the viewer and the CRUD surface depend on.
pub trait SlideRepository {
    /// Store a new slide and return its identifier
    fn create_slide(&mut self, record: &SlideRecord) -> Result<SlideId>;

    /// All slides in insertion order
    fn list_slides(&self) -> Result<Vec<Slide>>;

    /// Overwrite both fields of an existing slide
    fn update_slide(&mut self, id: SlideId, record: &SlideRecord) -> Result<()>;

    /// Remove a slide
    fn delete_slide(&mut self, id: SlideId) -> Result<()>;
}

/// The SlideLibrary manages the SQLite slide catalog.
///
/// The connection is owned by the library: it is opened by [`SlideLibrary::open`]
/// and released by [`SlideLibrary::close`] or when the library is dropped.
pub struct SlideLibrary {
    conn: Connection,
    db_path: Option<PathBuf>,
}

impl SlideLibrary {
    /// Open (or create) the catalog at `db_path`.
    ///
    /// The parent directory is created if it does not exist yet.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&db_path)?;
        info!("Slide catalog opened at {}", db_path.display());

        let library = SlideLibrary {
            conn,
            db_path: Some(db_path),
        };
        library.init_schema()?;
        Ok(library)
    }

    /// Open a throwaway catalog that lives only as long as the library.
    pub fn open_in_memory() -> Result<Self> {
        let library = SlideLibrary {
            conn: Connection::open_in_memory()?,
            db_path: None,
        };
        library.init_schema()?;
        Ok(library)
    }

    /// Create tables and indexes if they don't exist.
    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS slides (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                image_path      TEXT NOT NULL,
                description     TEXT NOT NULL,
                created_at      INTEGER NOT NULL,
                updated_at      INTEGER NOT NULL
            )",
            [],
        )?;

        // Folder import checks paths before inserting
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_slides_image_path
             ON slides(image_path)",
            [],
        )?;

        debug!("Slide catalog schema initialized");
        Ok(())
    }

    /// Path of the database file, `None` for in-memory catalogs
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub fn slide_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM slides", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    pub fn get_slide(&self, id: SlideId) -> Result<Option<Slide>> {
        let slide = self
            .conn
            .query_row(
                "SELECT id, image_path, description FROM slides WHERE id = ?1",
                params![id.get()],
                |row| {
                    Ok(Slide {
                        id: SlideId::new(row.get(0)?),
                        record: SlideRecord::new(row.get::<_, String>(1)?, row.get::<_, String>(2)?),
                    })
                },
            )
            .optional()?;
        Ok(slide)
    }

    /// Every image path currently in the catalog
    pub fn image_paths(&self) -> Result<HashSet<String>> {
        let mut stmt = self.conn.prepare("SELECT image_path FROM slides")?;
        let paths = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<HashSet<String>>>()?;
        Ok(paths)
    }

    /// Insert several slides in one transaction, returning their identifiers
    pub fn insert_many<'a, I>(&mut self, records: I) -> Result<Vec<SlideId>>
    where
        I: IntoIterator<Item = &'a SlideRecord>,
    {
        let now = Utc::now().timestamp();
        let tx = self.conn.transaction()?;
        let mut ids = Vec::new();
        {
            let mut stmt = tx.prepare(
                "INSERT INTO slides (image_path, description, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3)",
            )?;
            for record in records {
                stmt.execute(params![record.image_path, record.description, now])?;
                ids.push(SlideId::new(tx.last_insert_rowid()));
            }
        }
        tx.commit()?;

        info!("Inserted {} slides", ids.len());
        Ok(ids)
    }

    /// Release the connection, reporting any error from SQLite.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, err)| SlideError::from(err))?;
        debug!("Slide catalog closed");
        Ok(())
    }
}

impl SlideRepository for SlideLibrary {
    fn create_slide(&mut self, record: &SlideRecord) -> Result<SlideId> {
        let now = Utc::now().timestamp();
        self.conn.execute(
            "INSERT INTO slides (image_path, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)",
            params![record.image_path, record.description, now],
        )?;

        let id = SlideId::new(self.conn.last_insert_rowid());
        debug!(%id, "created slide");
        Ok(id)
    }

    fn list_slides(&self) -> Result<Vec<Slide>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, image_path, description FROM slides ORDER BY id ASC")?;

        let slide_iter = stmt.query_map([], |row| {
            Ok(Slide {
                id: SlideId::new(row.get(0)?),
                record: SlideRecord {
                    image_path: row.get(1)?,
                    description: row.get(2)?,
                },
            })
        })?;

        let mut slides = Vec::new();
        for slide in slide_iter {
            slides.push(slide?);
        }

        Ok(slides)
    }

    fn update_slide(&mut self, id: SlideId, record: &SlideRecord) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE slides SET image_path = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
            params![
                record.image_path,
                record.description,
                Utc::now().timestamp(),
                id.get()
            ],
        )?;

        if changed == 0 {
            return Err(SlideError::NotFound(id.to_string()));
        }
        debug!(%id, "updated slide");
        Ok(())
    }

    fn delete_slide(&mut self, id: SlideId) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM slides WHERE id = ?1", params![id.get()])?;

        if changed == 0 {
            return Err(SlideError::NotFound(id.to_string()));
        }
        debug!(%id, "deleted slide");
        Ok(())
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for SlideLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlideLibrary")
            .field("db_path", &self.db_path)
            .finish()
    }
}
