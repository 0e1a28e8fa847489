use std::io::ErrorKind;
use std::path::Path;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use tracing::{debug, info, warn};

use super::Database;
use crate::error::StoreError;
use crate::models::report::{join_weak_areas, split_weak_areas, DATE_FORMAT};
use crate::models::{DevanagariScores, Language, LatinScores, NewReport, Report, Scores};

const REPORT_COLUMNS: &str = "SELECT r.id, r.user_id, r.image_path, r.processed_path, r.overall,
        r.weak_areas, r.language, r.created_at,
        l.neatness, l.spacing, l.consistency,
        d.shirorekha, d.matra, d.samanta
     FROM reports r
     LEFT JOIN latin_scores l ON l.report_id = r.id
     LEFT JOIN devanagari_scores d ON d.report_id = r.id";

fn corrupt(field: &str, value: impl Into<String>) -> StoreError {
    StoreError::Corrupt {
        field: field.to_string(),
        value: value.into(),
    }
}

fn score_column(row: &Row, column: &str, report_id: i64) -> Result<f64, StoreError> {
    let value: Option<f64> = row.get(column)?;
    value.ok_or_else(|| corrupt(column, format!("missing for report {report_id}")))
}

fn row_to_report(row: &Row) -> Result<Report, StoreError> {
    let id: i64 = row.get("id")?;
    let language: String = row.get("language")?;
    let weak_areas: String = row.get("weak_areas")?;
    let created_at: String = row.get("created_at")?;

    let language: Language = language
        .parse()
        .map_err(|_| corrupt("language", language.clone()))?;

    let scores = match language {
        Language::English => Scores::English(LatinScores {
            neatness: score_column(row, "neatness", id)?,
            spacing: score_column(row, "spacing", id)?,
            consistency: score_column(row, "consistency", id)?,
        }),
        Language::Devanagari => Scores::Devanagari(DevanagariScores {
            shirorekha: score_column(row, "shirorekha", id)?,
            matra: score_column(row, "matra", id)?,
            samanta: score_column(row, "samanta", id)?,
        }),
    };

    Ok(Report {
        id,
        user_id: row.get("user_id")?,
        image_path: row.get("image_path")?,
        processed_path: row.get("processed_path")?,
        scores,
        overall: row.get("overall")?,
        weak_areas: split_weak_areas(&weak_areas).map_err(|v| corrupt("weak_areas", v))?,
        created_at: NaiveDateTime::parse_from_str(&created_at, DATE_FORMAT)
            .map_err(|_| corrupt("created_at", created_at.clone()))?,
    })
}

fn query_reports(
    conn: &Connection,
    filter: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<Report>, StoreError> {
    let sql = format!("{REPORT_COLUMNS} {filter}");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params)?;

    let mut reports = Vec::new();
    while let Some(row) = rows.next()? {
        reports.push(row_to_report(row)?);
    }
    Ok(reports)
}

fn query_report(
    conn: &Connection,
    filter: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Option<Report>, StoreError> {
    Ok(query_reports(conn, filter, params)?.into_iter().next())
}

fn insert_scores(conn: &Connection, report_id: i64, scores: &Scores) -> Result<(), StoreError> {
    match scores {
        Scores::English(s) => conn.execute(
            "INSERT INTO latin_scores (report_id, neatness, spacing, consistency)
             VALUES (?1, ?2, ?3, ?4)",
            params![report_id, s.neatness, s.spacing, s.consistency],
        )?,
        Scores::Devanagari(s) => conn.execute(
            "INSERT INTO devanagari_scores (report_id, shirorekha, matra, samanta)
             VALUES (?1, ?2, ?3, ?4)",
            params![report_id, s.shirorekha, s.matra, s.samanta],
        )?,
    };
    Ok(())
}

/// Remove a file, treating an already missing file as success.
fn remove_file_best_effort(path: &str) {
    if path.is_empty() {
        return;
    }
    match std::fs::remove_file(Path::new(path)) {
        Ok(()) => debug!("Removed {}", path),
        Err(err) if err.kind() == ErrorKind::NotFound => debug!("{} already gone", path),
        Err(err) => warn!("Failed to remove {}: {}", path, err),
    }
}

impl Database {
    /// Persist a report, or return the existing one for the same user and image.
    pub async fn create_report(&self, new: NewReport) -> Result<Report, StoreError> {
        self.execute(move |conn| {
            let tx = conn.transaction()?;

            if let Some(existing) = query_report(
                &tx,
                "WHERE r.user_id = ?1 AND r.image_path = ?2",
                params![new.user_id, new.image_path],
            )? {
                debug!("Reusing report {} for {}", existing.id, new.image_path);
                tx.commit()?;
                return Ok(existing);
            }

            tx.execute(
                "INSERT INTO reports (user_id, image_path, processed_path, overall, weak_areas, language, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    new.user_id,
                    new.image_path,
                    new.processed_path,
                    new.overall,
                    join_weak_areas(&new.weak_areas),
                    new.scores.language().as_str(),
                    new.created_at.format(DATE_FORMAT).to_string(),
                ],
            )?;
            let report_id = tx.last_insert_rowid();
            insert_scores(&tx, report_id, &new.scores)?;

            let report = query_report(&tx, "WHERE r.id = ?1", params![report_id])?
                .ok_or_else(|| StoreError::NotFound(format!("report {report_id}")))?;
            tx.commit()?;

            info!("Created report {} for user {}", report.id, report.user_id);
            Ok(report)
        })
        .await
    }

    pub async fn get_report(&self, report_id: i64) -> Result<Option<Report>, StoreError> {
        self.execute(move |conn| query_report(conn, "WHERE r.id = ?1", params![report_id]))
            .await
    }

    /// Look up the report a user already has for an image.
    pub async fn find_report(
        &self,
        user_id: i64,
        image_path: &str,
    ) -> Result<Option<Report>, StoreError> {
        let image_path = image_path.to_string();
        self.execute(move |conn| {
            query_report(
                conn,
                "WHERE r.user_id = ?1 AND r.image_path = ?2",
                params![user_id, image_path],
            )
        })
        .await
    }

    /// All reports of a user, oldest first.
    pub async fn list_reports_for_user(&self, user_id: i64) -> Result<Vec<Report>, StoreError> {
        self.execute(move |conn| {
            query_reports(
                conn,
                "WHERE r.user_id = ?1 ORDER BY r.created_at ASC, r.id ASC",
                params![user_id],
            )
        })
        .await
    }

    /// Delete a report owned by `owner_id` together with its image files.
    ///
    /// Missing files are ignored; the row is removed either way.
    pub async fn delete_report(&self, report_id: i64, owner_id: i64) -> Result<Report, StoreError> {
        self.execute(move |conn| {
            let report = query_report(
                conn,
                "WHERE r.id = ?1 AND r.user_id = ?2",
                params![report_id, owner_id],
            )?
            .ok_or_else(|| StoreError::NotFound(format!("report {report_id}")))?;

            remove_file_best_effort(&report.image_path);
            remove_file_best_effort(&report.processed_path);

            conn.execute(
                "DELETE FROM reports WHERE id = ?1 AND user_id = ?2",
                params![report_id, owner_id],
            )?;

            info!("Deleted report {} of user {}", report_id, owner_id);
            Ok(report)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::scoring::assess_scores;
    use crate::models::Criterion;
    use crate::store::test_support::temp_database;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 15, 0)
            .unwrap()
    }

    fn new_report(
        user_id: i64,
        image_path: &str,
        scores: Scores,
        created_at: NaiveDateTime,
    ) -> NewReport {
        let assessment = assess_scores(scores);
        NewReport {
            user_id,
            image_path: image_path.to_string(),
            processed_path: format!("processed_{image_path}"),
            scores,
            overall: assessment.overall,
            weak_areas: assessment.weak_areas,
            created_at,
        }
    }

    fn latin(neatness: f64) -> Scores {
        Scores::English(LatinScores {
            neatness,
            spacing: 80.0,
            consistency: 70.0,
        })
    }

    async fn user(db: &Database, email: &str) -> i64 {
        db.create_user("Test".into(), email.into(), "hash".into())
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_create_is_idempotent_per_user_and_image() {
        let (_dir, db) = temp_database();
        let uid = user(&db, "a@example.com").await;

        let first = db
            .create_report(new_report(uid, "uploads/a.png", latin(90.0), at(1, 9)))
            .await
            .unwrap();
        let second = db
            .create_report(new_report(uid, "uploads/a.png", latin(10.0), at(2, 9)))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.scores, latin(90.0));
        assert_eq!(db.list_reports_for_user(uid).await.unwrap().len(), 1);

        let other = user(&db, "b@example.com").await;
        let theirs = db
            .create_report(new_report(other, "uploads/a.png", latin(50.0), at(1, 9)))
            .await
            .unwrap();
        assert_ne!(theirs.id, first.id);
    }

    #[tokio::test]
    async fn test_round_trip_devanagari() {
        let (_dir, db) = temp_database();
        let uid = user(&db, "d@example.com").await;

        let scores = Scores::Devanagari(DevanagariScores {
            shirorekha: 30.0,
            matra: 10.0,
            samanta: 50.0,
        });
        let created = db
            .create_report(new_report(uid, "uploads/dev.jpg", scores, at(5, 14)))
            .await
            .unwrap();

        let loaded = db.get_report(created.id).await.unwrap().unwrap();
        assert_eq!(loaded.scores, scores);
        assert_eq!(loaded.overall, 30.0);
        assert_eq!(
            loaded.weak_areas,
            vec![Criterion::Shirorekha, Criterion::Matra, Criterion::Samanta]
        );
        assert_eq!(loaded.date(), "2024-03-05 14:15");
        assert_eq!(loaded.language(), Language::Devanagari);

        let found = db.find_report(uid, "uploads/dev.jpg").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(db.find_report(uid, "uploads/other.jpg").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_is_oldest_first() {
        let (_dir, db) = temp_database();
        let uid = user(&db, "l@example.com").await;

        db.create_report(new_report(uid, "c.png", latin(70.0), at(9, 8))).await.unwrap();
        db.create_report(new_report(uid, "a.png", latin(60.0), at(1, 8))).await.unwrap();
        db.create_report(new_report(uid, "b.png", latin(65.0), at(4, 8))).await.unwrap();

        let paths: Vec<String> = db
            .list_reports_for_user(uid)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.image_path)
            .collect();
        assert_eq!(paths, vec!["a.png", "b.png", "c.png"]);
    }

    #[tokio::test]
    async fn test_delete_removes_row_and_files() {
        let (dir, db) = temp_database();
        let uid = user(&db, "x@example.com").await;

        let original = dir.path().join("scan.png");
        let processed = dir.path().join("processed_scan.png");
        std::fs::write(&original, b"png").unwrap();
        std::fs::write(&processed, b"png").unwrap();

        let mut new = new_report(uid, original.to_str().unwrap(), latin(88.0), at(2, 10));
        new.processed_path = processed.to_str().unwrap().to_string();
        let report = db.create_report(new).await.unwrap();

        let deleted = db.delete_report(report.id, uid).await.unwrap();
        assert_eq!(deleted.id, report.id);
        assert!(!original.exists());
        assert!(!processed.exists());
        assert!(db.get_report(report.id).await.unwrap().is_none());

        let orphans: i64 = db
            .execute(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM latin_scores", [], |row| row.get(0))?)
            })
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn test_delete_with_missing_files() {
        let (dir, db) = temp_database();
        let uid = user(&db, "m@example.com").await;

        let missing = dir.path().join("gone.png");
        let report = db
            .create_report(new_report(uid, missing.to_str().unwrap(), latin(75.0), at(3, 10)))
            .await
            .unwrap();

        db.delete_report(report.id, uid).await.unwrap();
        assert!(db.get_report(report.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_requires_owner() {
        let (_dir, db) = temp_database();
        let owner = user(&db, "o@example.com").await;
        let stranger = user(&db, "s@example.com").await;

        let report = db
            .create_report(new_report(owner, "mine.png", latin(75.0), at(3, 10)))
            .await
            .unwrap();

        let result = db.delete_report(report.id, stranger).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert!(matches!(db.delete_report(9999, owner).await, Err(StoreError::NotFound(_))));
        assert!(db.get_report(report.id).await.unwrap().is_some());
    }
}
