use crate::{
    entities::gift::{self, Entity as GiftEntity},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, Set};
use std::sync::Arc;
use tracing::{info, instrument};

/// Seed data for the built-in catalog. Also the client-side display fallback
/// when the listing endpoint is unreachable.
#[derive(Debug, Clone, Copy)]
pub struct DefaultGift {
    pub id: &'static str,
    pub name: &'static str,
    pub price: i64,
    pub remaining: i32,
    pub total: i32,
}

pub const DEFAULT_GIFTS: [DefaultGift; 4] = [
    DefaultGift {
        id: "durov_stand_001",
        name: "Durov Stand",
        price: 1,
        remaining: 120,
        total: 500,
    },
    DefaultGift {
        id: "telegatruck_002",
        name: "Telegatruck",
        price: 500,
        remaining: 80,
        total: 300,
    },
    DefaultGift {
        id: "joy_stick_003",
        name: "Joy Stick",
        price: 1200,
        remaining: 50,
        total: 200,
    },
    DefaultGift {
        id: "gram_pods_004",
        name: "Gram Pods",
        price: 900,
        remaining: 75,
        total: 400,
    },
];

/// Service for the gift catalog: listing, per-gift status, and seeding.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Lists all gifts with their current availability.
    #[instrument(skip(self))]
    pub async fn list_gifts(&self) -> Result<Vec<gift::Model>, ServiceError> {
        let gifts = GiftEntity::find()
            .order_by_asc(gift::Column::CreatedAt)
            .order_by_asc(gift::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(gifts)
    }

    /// Looks up a single gift.
    #[instrument(skip(self))]
    pub async fn get_gift(&self, gift_id: &str) -> Result<Option<gift::Model>, ServiceError> {
        let gift = GiftEntity::find_by_id(gift_id.to_string())
            .one(&*self.db)
            .await?;
        Ok(gift)
    }

    /// Current `{remaining, total}` for one gift. Used by clients to refresh
    /// availability at purchase-modal open time, since their catalog snapshot
    /// may be stale.
    #[instrument(skip(self))]
    pub async fn gift_status(&self, gift_id: &str) -> Result<gift::Model, ServiceError> {
        self.get_gift(gift_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Gift {} not found", gift_id)))
    }

    /// Inserts the built-in catalog when the gifts table is empty. Called at
    /// startup; a no-op on every later boot.
    #[instrument(skip(self))]
    pub async fn seed_default_catalog(&self) -> Result<usize, ServiceError> {
        let existing = GiftEntity::find().count(&*self.db).await?;
        if existing > 0 {
            return Ok(0);
        }

        let now = Utc::now();
        let rows: Vec<gift::ActiveModel> = DEFAULT_GIFTS
            .iter()
            .map(|g| gift::ActiveModel {
                id: Set(g.id.to_string()),
                name: Set(g.name.to_string()),
                price: Set(g.price),
                remaining_quantity: Set(g.remaining),
                total_quantity: Set(g.total),
                created_at: Set(now),
                updated_at: Set(None),
            })
            .collect();

        let seeded = rows.len();
        GiftEntity::insert_many(rows).exec(&*self.db).await?;

        info!(gifts = seeded, "seeded default catalog");
        self.event_sender
            .send_or_log(Event::CatalogSeeded { gifts: seeded })
            .await;

        Ok(seeded)
    }
}
