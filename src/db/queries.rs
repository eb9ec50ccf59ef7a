// Database queries — CRUD for cases and the harvested-post archive.
//
// All SQL lives here; the rest of the crate goes through these functions
// or the Store trait.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::models::{Case, CaseSubmission, EvidenceType, FlagReason};
use crate::post::{Platform, Post};

// --- Cases ---

/// Validate and store a case. Returns the new case id.
pub fn insert_case(conn: &Connection, case: &CaseSubmission) -> Result<i64> {
    case.validate()?;
    conn.execute(
        "INSERT INTO cases (platform, url, evidence_type, file_bytes, post_text,
                            image_match_url, reason, notes, submitted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, datetime('now'))",
        params![
            case.platform.trim(),
            case.url.trim(),
            case.evidence_type.as_str(),
            case.file_bytes,
            case.post_text,
            case.image_match_url,
            case.reason.as_str(),
            case.notes,
        ],
    )
    .context("Failed to insert case")?;
    Ok(conn.last_insert_rowid())
}

const CASE_COLUMNS: &str = "id, platform, url, evidence_type, length(file_bytes), post_text,
                            image_match_url, reason, notes, submitted_at";

fn row_to_case(row: &Row<'_>) -> rusqlite::Result<Case> {
    let evidence: String = row.get(3)?;
    let reason: String = row.get(7)?;
    let file_size: Option<i64> = row.get(4)?;
    Ok(Case {
        id: row.get(0)?,
        platform: row.get(1)?,
        url: row.get(2)?,
        // Unknown labels can only come from hand-edited rows
        evidence_type: EvidenceType::from_db(&evidence).unwrap_or(EvidenceType::PostText),
        file_size: file_size.map(|n| n.max(0) as u64),
        post_text: row.get(5)?,
        image_match_url: row.get(6)?,
        reason: FlagReason::from_db(&reason).unwrap_or(FlagReason::Other),
        notes: row.get(8)?,
        submitted_at: row.get(9)?,
    })
}

pub fn get_case(conn: &Connection, id: i64) -> Result<Option<Case>> {
    let sql = format!("SELECT {CASE_COLUMNS} FROM cases WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let case = stmt.query_row(params![id], row_to_case).optional()?;
    Ok(case)
}

/// Most recent cases first.
pub fn recent_cases(conn: &Connection, limit: u32) -> Result<Vec<Case>> {
    let sql = format!("SELECT {CASE_COLUMNS} FROM cases ORDER BY id DESC LIMIT ?1");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![limit], row_to_case)?;

    let mut cases = Vec::new();
    for row in rows {
        cases.push(row?);
    }
    Ok(cases)
}

/// Load the raw evidence file for a case, if one was attached.
pub fn case_file(conn: &Connection, id: i64) -> Result<Option<Vec<u8>>> {
    let mut stmt = conn.prepare("SELECT file_bytes FROM cases WHERE id = ?1")?;
    let result: Option<Option<Vec<u8>>> = stmt.query_row(params![id], |row| row.get(0)).optional()?;
    Ok(result.flatten())
}

pub fn case_count(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM cases", [], |row| row.get(0))?;
    Ok(count)
}

// --- Harvested posts ---

/// Archive posts, replacing any earlier copy with the same (platform, id).
/// Returns how many rows were written.
pub fn upsert_posts(conn: &Connection, posts: &[Post]) -> Result<usize> {
    let mut stmt = conn.prepare(
        "INSERT INTO harvested_posts (platform, id, username, content, timestamp,
                                      engagement, url, source, title, community, harvested_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, datetime('now'))
         ON CONFLICT(platform, id) DO UPDATE SET
            username = ?3,
            content = ?4,
            timestamp = ?5,
            engagement = ?6,
            url = ?7,
            source = ?8,
            title = ?9,
            community = ?10,
            harvested_at = datetime('now')",
    )?;

    let mut written = 0;
    for post in posts {
        written += stmt.execute(params![
            post.platform.as_str(),
            post.id,
            post.username,
            post.content,
            post.timestamp.to_rfc3339(),
            // SQLite integers are signed
            i64::try_from(post.engagement).unwrap_or(i64::MAX),
            post.url,
            post.source,
            post.title,
            post.community,
        ])?;
    }
    Ok(written)
}

fn row_to_post(row: &Row<'_>) -> rusqlite::Result<Post> {
    let platform: String = row.get(0)?;
    let timestamp: String = row.get(4)?;
    let engagement: i64 = row.get(5)?;
    Ok(Post {
        platform: platform.parse::<Platform>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, e.into())
        })?,
        id: row.get(1)?,
        username: row.get(2)?,
        content: row.get(3)?,
        timestamp: DateTime::parse_from_rfc3339(&timestamp)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, e.into())
            })?,
        engagement: engagement.max(0) as u64,
        url: row.get(6)?,
        source: row.get(7)?,
        title: row.get(8)?,
        community: row.get(9)?,
    })
}

/// Archived posts, newest first.
pub fn recent_posts(conn: &Connection, limit: u32) -> Result<Vec<Post>> {
    let mut stmt = conn.prepare(
        "SELECT platform, id, username, content, timestamp, engagement, url, source, title, community
         FROM harvested_posts
         ORDER BY timestamp DESC
         LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit], row_to_post)?;

    let mut posts = Vec::new();
    for row in rows {
        posts.push(row?);
    }
    Ok(posts)
}

pub fn post_count(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM harvested_posts", [], |row| row.get(0))?;
    Ok(count)
}

/// Look up one archived post.
pub fn get_post(conn: &Connection, platform: Platform, id: &str) -> Result<Option<Post>> {
    let mut stmt = conn.prepare(
        "SELECT platform, id, username, content, timestamp, engagement, url, source, title, community
         FROM harvested_posts WHERE platform = ?1 AND id = ?2",
    )?;
    let post = stmt
        .query_row(params![platform.as_str(), id], row_to_post)
        .optional()?;
    Ok(post)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::create_tables;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    fn text_case() -> CaseSubmission {
        CaseSubmission {
            platform: "Twitter".to_string(),
            url: "https://x.com/someone/status/1".to_string(),
            evidence_type: EvidenceType::PostText,
            file_bytes: None,
            post_text: Some("The moon landing was staged in a basement".to_string()),
            image_match_url: None,
            reason: FlagReason::Misinformation,
            notes: None,
        }
    }

    #[test]
    fn test_insert_and_get_case() {
        let conn = test_db();
        let id = insert_case(&conn, &text_case()).unwrap();
        let case = get_case(&conn, id).unwrap().unwrap();
        assert_eq!(case.platform, "Twitter");
        assert_eq!(case.evidence_type, EvidenceType::PostText);
        assert_eq!(case.reason, FlagReason::Misinformation);
        assert!(case.file_size.is_none());
    }

    #[test]
    fn test_invalid_case_is_not_stored() {
        let conn = test_db();
        let mut case = text_case();
        case.post_text = Some("   ".to_string());
        assert!(insert_case(&conn, &case).is_err());
        assert_eq!(case_count(&conn).unwrap(), 0);
    }

    #[test]
    fn test_get_missing_case() {
        let conn = test_db();
        assert!(get_case(&conn, 42).unwrap().is_none());
    }
}
