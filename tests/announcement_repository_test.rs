use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use herald::{
    domain::{
        Announcement, AnnouncementFilter, AnnouncementMetadata, AnnouncementType,
        GeneralMetadata, MaintenanceMetadata, PublicationStatus, Urgency,
    },
    repository::{AnnouncementRepository, SqliteAnnouncementRepository},
};

async fn setup() -> anyhow::Result<SqliteAnnouncementRepository> {
    let pool = SqlitePool::connect(":memory:").await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(SqliteAnnouncementRepository::new(pool))
}

fn general_announcement(company_id: Uuid, status: PublicationStatus) -> Announcement {
    let now = Utc::now();
    Announcement {
        id: Uuid::new_v4(),
        company_id,
        author_id: Uuid::new_v4(),
        title: "Service update".to_string(),
        content: "We shipped a new dashboard.".to_string(),
        announcement_type: AnnouncementType::General,
        status,
        metadata: AnnouncementMetadata::General(GeneralMetadata {
            urgency: Urgency::Medium,
            affected_services: vec!["api".to_string()],
            scheduled_for: None,
        }),
        published_at: None,
        created_at: now,
        updated_at: now,
    }
}

fn maintenance_announcement(company_id: Uuid) -> Announcement {
    let now = Utc::now();
    let start = now + Duration::days(1);
    Announcement {
        id: Uuid::new_v4(),
        company_id,
        author_id: Uuid::new_v4(),
        title: "Database maintenance".to_string(),
        content: "Primary failover.".to_string(),
        announcement_type: AnnouncementType::Maintenance,
        status: PublicationStatus::Draft,
        metadata: AnnouncementMetadata::Maintenance(MaintenanceMetadata {
            urgency: Urgency::High,
            scheduled_start: start,
            scheduled_end: start + Duration::hours(2),
            is_emergency: false,
            affected_services: vec!["api".to_string(), "dashboard".to_string()],
            scheduled_for: None,
            actual_start: None,
            actual_end: None,
        }),
        published_at: None,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn test_create_and_find_round_trips_metadata() -> anyhow::Result<()> {
    let repo = setup().await?;
    let company_id = Uuid::new_v4();

    let announcement = maintenance_announcement(company_id);
    let created = repo.create(announcement.clone()).await?;

    assert_eq!(created.id, announcement.id);
    assert_eq!(created.metadata, announcement.metadata);

    let found = repo.find_by_id(announcement.id).await?.unwrap();
    assert_eq!(found.title, announcement.title);
    assert_eq!(found.announcement_type, AnnouncementType::Maintenance);
    assert_eq!(found.metadata, announcement.metadata);

    Ok(())
}

#[tokio::test]
async fn test_find_missing_returns_none() -> anyhow::Result<()> {
    let repo = setup().await?;
    assert!(repo.find_by_id(Uuid::new_v4()).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_list_filters_by_company_status_and_type() -> anyhow::Result<()> {
    let repo = setup().await?;
    let company_a = Uuid::new_v4();
    let company_b = Uuid::new_v4();

    repo.create(general_announcement(company_a, PublicationStatus::Draft))
        .await?;
    repo.create(general_announcement(company_a, PublicationStatus::Published))
        .await?;
    repo.create(maintenance_announcement(company_a)).await?;
    repo.create(general_announcement(company_b, PublicationStatus::Published))
        .await?;

    let by_company = repo
        .list(&AnnouncementFilter {
            company_id: Some(company_a),
            limit: 50,
            ..Default::default()
        })
        .await?;
    assert_eq!(by_company.len(), 3);

    let published = repo
        .list(&AnnouncementFilter {
            company_id: Some(company_a),
            status: Some(PublicationStatus::Published),
            limit: 50,
            ..Default::default()
        })
        .await?;
    assert_eq!(published.len(), 1);

    let maintenance = repo
        .list(&AnnouncementFilter {
            announcement_type: Some(AnnouncementType::Maintenance),
            limit: 50,
            ..Default::default()
        })
        .await?;
    assert_eq!(maintenance.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_list_respects_limit_and_offset() -> anyhow::Result<()> {
    let repo = setup().await?;
    let company_id = Uuid::new_v4();

    for _ in 0..5 {
        repo.create(general_announcement(company_id, PublicationStatus::Draft))
            .await?;
    }

    let page = repo
        .list(&AnnouncementFilter {
            company_id: Some(company_id),
            limit: 2,
            offset: 0,
            ..Default::default()
        })
        .await?;
    assert_eq!(page.len(), 2);

    let rest = repo
        .list(&AnnouncementFilter {
            company_id: Some(company_id),
            limit: 10,
            offset: 4,
            ..Default::default()
        })
        .await?;
    assert_eq!(rest.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_update_guarded_succeeds_with_fresh_guard() -> anyhow::Result<()> {
    let repo = setup().await?;
    let created = repo
        .create(general_announcement(Uuid::new_v4(), PublicationStatus::Draft))
        .await?;

    let mut updated = created.clone();
    updated.status = PublicationStatus::Published;
    updated.published_at = Some(Utc::now());

    let saved = repo
        .update_guarded(created.id, PublicationStatus::Draft, created.updated_at, &updated)
        .await?
        .unwrap();

    assert_eq!(saved.status, PublicationStatus::Published);
    assert!(saved.published_at.is_some());
    assert!(saved.updated_at > created.updated_at);

    Ok(())
}

#[tokio::test]
async fn test_update_guarded_returns_none_on_stale_guard() -> anyhow::Result<()> {
    let repo = setup().await?;
    let created = repo
        .create(general_announcement(Uuid::new_v4(), PublicationStatus::Draft))
        .await?;

    // First writer wins.
    let mut first = created.clone();
    first.status = PublicationStatus::Published;
    first.published_at = Some(Utc::now());
    repo.update_guarded(created.id, PublicationStatus::Draft, created.updated_at, &first)
        .await?
        .unwrap();

    // Second writer still holds the stale snapshot.
    let mut second = created.clone();
    second.title = "Too late".to_string();
    let lost = repo
        .update_guarded(created.id, PublicationStatus::Draft, created.updated_at, &second)
        .await?;
    assert!(lost.is_none());

    // The winner's write is intact.
    let fresh = repo.find_by_id(created.id).await?.unwrap();
    assert_eq!(fresh.status, PublicationStatus::Published);
    assert_eq!(fresh.title, created.title);

    Ok(())
}

#[tokio::test]
async fn test_delete_guarded_checks_status() -> anyhow::Result<()> {
    let repo = setup().await?;
    let created = repo
        .create(general_announcement(Uuid::new_v4(), PublicationStatus::Draft))
        .await?;

    // Wrong expected status matches nothing.
    assert!(!repo.delete_guarded(created.id, PublicationStatus::Published).await?);
    assert!(repo.find_by_id(created.id).await?.is_some());

    assert!(repo.delete_guarded(created.id, PublicationStatus::Draft).await?);
    assert!(repo.find_by_id(created.id).await?.is_none());

    Ok(())
}
