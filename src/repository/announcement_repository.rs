use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{
        Announcement, AnnouncementFilter, AnnouncementMetadata, AnnouncementType,
        PublicationStatus,
    },
    error::{AppError, Result},
    repository::AnnouncementRepository,
};

#[derive(FromRow)]
struct AnnouncementRow {
    id: String,
    company_id: String,
    author_id: String,
    title: String,
    content: String,
    announcement_type: String,
    status: String,
    metadata: String,
    published_at: Option<NaiveDateTime>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

const COLUMNS: &str = "id, company_id, author_id, title, content, announcement_type, \
                       status, metadata, published_at, created_at, updated_at";

pub struct SqliteAnnouncementRepository {
    pool: SqlitePool,
}

impl SqliteAnnouncementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_announcement(row: AnnouncementRow) -> Result<Announcement> {
        let announcement_type = Self::parse_type(&row.announcement_type)?;
        Ok(Announcement {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            company_id: Uuid::parse_str(&row.company_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            author_id: Uuid::parse_str(&row.author_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            title: row.title,
            content: row.content,
            announcement_type,
            status: Self::parse_status(&row.status)?,
            metadata: AnnouncementMetadata::from_json(announcement_type, &row.metadata)?,
            published_at: row
                .published_at
                .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn parse_type(s: &str) -> Result<AnnouncementType> {
        AnnouncementType::parse(s)
            .ok_or_else(|| AppError::Database(format!("Invalid announcement type: {}", s)))
    }

    fn parse_status(s: &str) -> Result<PublicationStatus> {
        PublicationStatus::parse(s)
            .ok_or_else(|| AppError::Database(format!("Invalid publication status: {}", s)))
    }
}

#[async_trait]
impl AnnouncementRepository for SqliteAnnouncementRepository {
    async fn create(&self, announcement: Announcement) -> Result<Announcement> {
        let metadata_json = announcement.metadata.to_json()?;
        let published_at_naive = announcement.published_at.map(|dt| dt.naive_utc());
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO announcements (
                id, company_id, author_id, title, content, announcement_type,
                status, metadata, published_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(announcement.id.to_string())
        .bind(announcement.company_id.to_string())
        .bind(announcement.author_id.to_string())
        .bind(&announcement.title)
        .bind(&announcement.content)
        .bind(announcement.announcement_type.as_str())
        .bind(announcement.status.as_str())
        .bind(&metadata_json)
        .bind(published_at_naive)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(announcement.id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created announcement".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Announcement>> {
        let row = sqlx::query_as::<_, AnnouncementRow>(&format!(
            "SELECT {} FROM announcements WHERE id = ?",
            COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_announcement(r)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, filter: &AnnouncementFilter) -> Result<Vec<Announcement>> {
        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM announcements WHERE 1 = 1",
            COLUMNS
        ));

        if let Some(company_id) = filter.company_id {
            query.push(" AND company_id = ").push_bind(company_id.to_string());
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(announcement_type) = filter.announcement_type {
            query
                .push(" AND announcement_type = ")
                .push_bind(announcement_type.as_str());
        }

        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);

        let rows: Vec<AnnouncementRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_announcement).collect()
    }

    async fn update_guarded(
        &self,
        id: Uuid,
        expected_status: PublicationStatus,
        expected_updated_at: DateTime<Utc>,
        announcement: &Announcement,
    ) -> Result<Option<Announcement>> {
        let metadata_json = announcement.metadata.to_json()?;
        let published_at_naive = announcement.published_at.map(|dt| dt.naive_utc());
        let now = Utc::now().naive_utc();

        // The status + updated_at predicate makes the read-modify-write
        // atomic: a concurrent transition bumps updated_at, so the losing
        // writer matches zero rows.
        let result = sqlx::query(
            r#"
            UPDATE announcements
            SET title = ?, content = ?, status = ?, metadata = ?,
                published_at = ?, updated_at = ?
            WHERE id = ? AND status = ? AND updated_at = ?
            "#,
        )
        .bind(&announcement.title)
        .bind(&announcement.content)
        .bind(announcement.status.as_str())
        .bind(&metadata_json)
        .bind(published_at_naive)
        .bind(now)
        .bind(id.to_string())
        .bind(expected_status.as_str())
        .bind(expected_updated_at.naive_utc())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_id(id).await
    }

    async fn delete_guarded(&self, id: Uuid, expected_status: PublicationStatus) -> Result<bool> {
        let result = sqlx::query("DELETE FROM announcements WHERE id = ? AND status = ?")
            .bind(id.to_string())
            .bind(expected_status.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
