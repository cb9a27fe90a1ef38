use chrono::{Duration, Utc};
use clap::Parser;
use fake::faker::company::en::{Buzzword, CatchPhrase, CompanyName};
use fake::faker::lorem::en::Paragraph;
use fake::Fake;
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

use herald::{
    domain::{
        Announcement, AnnouncementMetadata, AnnouncementType, GeneralMetadata,
        MaintenanceMetadata, PublicationStatus, Urgency,
    },
    repository::{AnnouncementRepository, SqliteAnnouncementRepository},
};

/// Populates a Herald database with fake companies and announcements.
#[derive(Parser)]
struct Args {
    /// Number of companies to seed
    #[arg(long, default_value_t = 3)]
    companies: usize,

    /// Announcements per company
    #[arg(long, default_value_t = 8)]
    per_company: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("🌱 Starting database seeding...");

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:herald.db".to_string());

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    println!("📋 Running migrations...");
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    let announcement_repo = SqliteAnnouncementRepository::new(db_pool.clone());

    for _ in 0..args.companies {
        let company_id = Uuid::new_v4();
        let admin_id = Uuid::new_v4();
        let company_name: String = CompanyName().fake();
        println!("🏢 Seeding {} ({})", company_name, company_id);

        for i in 0..args.per_company {
            let announcement = fake_announcement(company_id, admin_id, i);
            announcement_repo.create(announcement).await?;
        }
    }

    println!("✅ Seeding complete");

    Ok(())
}

fn fake_announcement(company_id: Uuid, author_id: Uuid, index: usize) -> Announcement {
    let now = Utc::now();
    let maintenance = index % 3 == 0;

    let (announcement_type, metadata) = if maintenance {
        let start = now + Duration::days((index as i64 % 7) + 1);
        (
            AnnouncementType::Maintenance,
            AnnouncementMetadata::Maintenance(MaintenanceMetadata {
                urgency: [Urgency::Low, Urgency::Medium, Urgency::High][index % 3],
                scheduled_start: start,
                scheduled_end: start + Duration::hours(2),
                is_emergency: index % 5 == 0,
                affected_services: vec![Buzzword().fake(), Buzzword().fake()],
                scheduled_for: None,
                actual_start: None,
                actual_end: None,
            }),
        )
    } else {
        (
            AnnouncementType::General,
            AnnouncementMetadata::General(GeneralMetadata {
                urgency: [Urgency::Low, Urgency::Medium, Urgency::High, Urgency::Critical]
                    [index % 4],
                affected_services: Vec::new(),
                scheduled_for: None,
            }),
        )
    };

    // Leave some in draft, publish the rest.
    let published = index % 2 == 0;
    let (status, published_at) = if published {
        (
            PublicationStatus::Published,
            Some(now - Duration::days(index as i64)),
        )
    } else {
        (PublicationStatus::Draft, None)
    };

    Announcement {
        id: Uuid::new_v4(),
        company_id,
        author_id,
        title: CatchPhrase().fake(),
        content: Paragraph(2..4).fake(),
        announcement_type,
        status,
        metadata,
        published_at,
        created_at: now,
        updated_at: now,
    }
}
