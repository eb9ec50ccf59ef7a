// SqliteStore — rusqlite backend implementing the Store trait.
//
// Connection is !Sync, so it sits in a tokio Mutex. Each method locks,
// does synchronous rusqlite work, and returns; the guard is never held
// across an .await.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{Case, CaseSubmission};
use super::traits::Store;
use crate::post::{Platform, Post};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Wrap an already-opened connection with the schema in place.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn submit_case(&self, case: &CaseSubmission) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::insert_case(&conn, case)
    }

    async fn get_case(&self, id: i64) -> Result<Option<Case>> {
        let conn = self.conn.lock().await;
        super::queries::get_case(&conn, id)
    }

    async fn recent_cases(&self, limit: u32) -> Result<Vec<Case>> {
        let conn = self.conn.lock().await;
        super::queries::recent_cases(&conn, limit)
    }

    async fn case_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::case_count(&conn)
    }

    async fn case_file(&self, id: i64) -> Result<Option<Vec<u8>>> {
        let conn = self.conn.lock().await;
        super::queries::case_file(&conn, id)
    }

    async fn save_posts(&self, posts: &[Post]) -> Result<usize> {
        let conn = self.conn.lock().await;
        super::queries::upsert_posts(&conn, posts)
    }

    async fn recent_posts(&self, limit: u32) -> Result<Vec<Post>> {
        let conn = self.conn.lock().await;
        super::queries::recent_posts(&conn, limit)
    }

    async fn post_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::post_count(&conn)
    }

    async fn get_post(&self, platform: Platform, id: &str) -> Result<Option<Post>> {
        let conn = self.conn.lock().await;
        super::queries::get_post(&conn, platform, id)
    }
}
