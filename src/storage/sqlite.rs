//! SQLite storage implementation

use super::{PeopleSink, schema};
use crate::Result;
use crate::person::Person;
use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How long a commit waits on another connection's write lock.
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// SQLite-backed storage for people.
///
/// The store holds no open connection. Every operation opens its own session
/// and closes it when done, so overlapping batch commits each get an isolated
/// transaction and SQLite serializes their writes.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteStore {
    /// Open a database file (creates it and its parent directory if needed)
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let store = Self {
            path,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        };
        store.connect()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a new session against the database file
    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        Ok(conn)
    }

    /// Create the schema if absent
    pub fn create_schema(&self) -> Result<()> {
        let conn = self.connect()?;
        for stmt in schema::all_schema_statements() {
            conn.execute(stmt, [])?;
        }
        Ok(())
    }

    // ========== People Operations ==========

    /// Insert people in a single transaction.
    ///
    /// Plain INSERT: storing an id that already exists fails the whole batch.
    pub fn insert_people(&self, people: &[Person]) -> Result<usize> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(&format!(
                "INSERT INTO people ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                schema::PEOPLE_COLUMNS
            ))?;

            for person in people {
                stmt.execute(params![
                    person.id,
                    person.name,
                    person.birth_year,
                    person.eye_color,
                    person.gender,
                    person.hair_color,
                    person.height,
                    person.mass,
                    person.skin_color,
                    person.homeworld,
                    person.films,
                    person.species,
                    person.starships,
                    person.vehicles,
                ])?;
            }
        }
        tx.commit()?;
        Ok(people.len())
    }

    /// Get a person by id
    pub fn get_person(&self, id: u32) -> Result<Option<Person>> {
        let conn = self.connect()?;
        conn.query_row(
            &format!("SELECT {} FROM people WHERE id = ?1", schema::PEOPLE_COLUMNS),
            params![id],
            row_to_person,
        )
        .optional()
        .map_err(Into::into)
    }

    /// List people ordered by id
    pub fn list_people(&self, limit: usize) -> Result<Vec<Person>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM people ORDER BY id LIMIT ?1",
            schema::PEOPLE_COLUMNS
        ))?;

        let people = stmt
            .query_map(params![limit as i64], row_to_person)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(people)
    }

    /// Count all people
    pub fn count_people(&self) -> Result<usize> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM people", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Aggregate statistics over the people table
    pub fn stats(&self) -> Result<PeopleStats> {
        let conn = self.connect()?;
        conn.query_row(
            r#"
            SELECT COUNT(*),
                   COUNT(DISTINCT NULLIF(homeworld, '')),
                   SUM(CASE WHEN films != '' THEN 1 ELSE 0 END),
                   MIN(id),
                   MAX(id)
            FROM people
            "#,
            [],
            |row| {
                Ok(PeopleStats {
                    people: row.get::<_, i64>(0)? as usize,
                    homeworlds: row.get::<_, i64>(1)? as usize,
                    with_films: row.get::<_, Option<i64>>(2)?.unwrap_or(0) as usize,
                    min_id: row.get(3)?,
                    max_id: row.get(4)?,
                })
            },
        )
        .map_err(Into::into)
    }

    /// Release the database: let SQLite refresh planner statistics, then close.
    pub fn shutdown(self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch("PRAGMA optimize;")?;
        conn.close().map_err(|(_, e)| e)?;
        tracing::debug!("closed database {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl PeopleSink for SqliteStore {
    async fn create_schema_if_absent(&self) -> Result<()> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.create_schema()).await?
    }

    async fn insert_batch(&self, people: Vec<Person>) -> Result<usize> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.insert_people(&people)).await?
    }
}

/// Helper to convert a row to a Person
fn row_to_person(row: &rusqlite::Row) -> rusqlite::Result<Person> {
    Ok(Person {
        id: row.get(0)?,
        name: row.get(1)?,
        birth_year: row.get(2)?,
        eye_color: row.get(3)?,
        gender: row.get(4)?,
        hair_color: row.get(5)?,
        height: row.get(6)?,
        mass: row.get(7)?,
        skin_color: row.get(8)?,
        homeworld: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
        films: row.get::<_, Option<String>>(10)?.unwrap_or_default(),
        species: row.get::<_, Option<String>>(11)?.unwrap_or_default(),
        starships: row.get::<_, Option<String>>(12)?.unwrap_or_default(),
        vehicles: row.get::<_, Option<String>>(13)?.unwrap_or_default(),
    })
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct PeopleStats {
    pub people: usize,
    /// Distinct non-empty homeworld names
    pub homeworlds: usize,
    pub with_films: usize,
    pub min_id: Option<u32>,
    pub max_id: Option<u32>,
}

impl std::fmt::Display for PeopleStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  People: {}", self.people)?;
        writeln!(f, "  Homeworlds: {}", self.homeworlds)?;
        writeln!(f, "  With films: {}", self.with_films)?;
        match (self.min_id, self.max_id) {
            (Some(min), Some(max)) => writeln!(f, "  Ids: {}..={}", min, max),
            _ => writeln!(f, "  Ids: none"),
        }
    }
}
