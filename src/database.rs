use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::model::{validate_taskname, NewTodo, Todo};
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("unable to open database: {0}")]
    Connection(#[source] rusqlite::Error),
    #[error("unable to create schema: {0}")]
    Schema(#[source] rusqlite::Error),
    #[error("record not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Query(#[source] rusqlite::Error),
    #[error("{0}")]
    Write(#[source] rusqlite::Error),
}

pub type SqlResult<T> = std::result::Result<T, DatabaseError>;

const SCHEMA_TODOS: &str = "CREATE TABLE IF NOT EXISTS todos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    taskname VARCHAR(200) NOT NULL CHECK (length(taskname) BETWEEN 1 AND 200),
    completed BOOLEAN NOT NULL DEFAULT 0,
    created DATETIME NOT NULL
)";
const SELECT_TODO: &str = "SELECT id, taskname, completed, created FROM todos WHERE id = ?1";
const SELECT_RECENT: &str =
    "SELECT id, taskname, completed, created FROM todos ORDER BY created DESC, id ASC LIMIT ?1";
const INSERT_TODO: &str = "INSERT INTO todos (taskname, completed, created) VALUES (?1, ?2, ?3)";
const UPDATE_TODO: &str = "UPDATE todos SET taskname = ?2, completed = ?3 WHERE id = ?1";
const DELETE_TODO: &str = "DELETE FROM todos WHERE id = ?1";

/// Typed CRUD over the `todos` table.
///
/// Every failure is returned as-is; implementations never retry.
pub trait TodoStore: Send + Sync {
    fn fetch_todo(&self, id: i64) -> SqlResult<Todo>;

    /// Newest first, at most `limit` records. Equal timestamps keep insertion order.
    fn fetch_recent(&self, limit: usize) -> SqlResult<Vec<Todo>>;

    fn add_todo(&self, todo: NewTodo) -> SqlResult<Todo>;

    /// Overwrites the mutable columns of an existing row. Never inserts.
    fn update_todo(&self, todo: &Todo) -> SqlResult<Todo>;

    fn delete_todo(&self, id: i64) -> SqlResult<()>;
}

/// SQLite backed store. Statements are serialized on the single connection;
/// nothing is held between calls.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

pub fn open_db(path: impl AsRef<Path>) -> SqlResult<SqliteStore> {
    let path = path.as_ref();
    let conn = Connection::open(path).map_err(DatabaseError::Connection)?;
    debug!(path = %path.display(), "opened database");
    SqliteStore::with_connection(conn)
}

impl SqliteStore {
    pub fn open_in_memory() -> SqlResult<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::Connection)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> SqlResult<Self> {
        init_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic mid-statement leaves nothing half-written on the connection.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn init_db(conn: &Connection) -> SqlResult<()> {
    conn.execute(SCHEMA_TODOS, params![]).map_err(DatabaseError::Schema)?;
    Ok(())
}

fn todo_from_row(row: &Row<'_>) -> rusqlite::Result<Todo> {
    Ok(Todo {
        id: row.get(0)?,
        taskname: row.get(1)?,
        completed: row.get(2)?,
        created: row.get(3)?,
    })
}

fn select_one(conn: &Connection, id: i64) -> SqlResult<Todo> {
    match conn.query_row(SELECT_TODO, params![id], todo_from_row) {
        Ok(todo) => Ok(todo),
        Err(rusqlite::Error::QueryReturnedNoRows) => Err(DatabaseError::NotFound),
        Err(e) => Err(DatabaseError::Query(e)),
    }
}

impl TodoStore for SqliteStore {
    fn fetch_todo(&self, id: i64) -> SqlResult<Todo> {
        select_one(&self.conn(), id)
    }

    fn fetch_recent(&self, limit: usize) -> SqlResult<Vec<Todo>> {
        let conn = self.conn();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = conn.prepare(SELECT_RECENT).map_err(DatabaseError::Query)?;
        let rows = stmt
            .query_map(params![limit], todo_from_row)
            .map_err(DatabaseError::Query)?;

        let todos = rows
            .collect::<rusqlite::Result<Vec<Todo>>>()
            .map_err(DatabaseError::Query)?;
        Ok(todos)
    }

    fn add_todo(&self, todo: NewTodo) -> SqlResult<Todo> {
        validate_taskname(&todo.taskname).map_err(DatabaseError::Validation)?;
        let created = todo.created.unwrap_or_else(Utc::now);

        let conn = self.conn();
        conn.execute(INSERT_TODO, params![todo.taskname, todo.completed, created])
            .map_err(DatabaseError::Write)?;

        Ok(Todo {
            id: conn.last_insert_rowid(),
            taskname: todo.taskname,
            completed: todo.completed,
            created,
        })
    }

    fn update_todo(&self, todo: &Todo) -> SqlResult<Todo> {
        validate_taskname(&todo.taskname).map_err(DatabaseError::Validation)?;

        let conn = self.conn();
        let changed = conn
            .execute(UPDATE_TODO, params![todo.id, todo.taskname, todo.completed])
            .map_err(DatabaseError::Write)?;
        if changed == 0 {
            return Err(DatabaseError::NotFound);
        }

        // `created` is never written, so read back what is actually stored.
        select_one(&conn, todo.id)
    }

    fn delete_todo(&self, id: i64) -> SqlResult<()> {
        let changed = self
            .conn()
            .execute(DELETE_TODO, params![id])
            .map_err(DatabaseError::Write)?;
        if changed == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }
}
