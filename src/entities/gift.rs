use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A scarce, priced digital collectible. `remaining_quantity` is the only
/// column mutated after seeding, and only by a successful purchase commit.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "gifts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    /// Price in the smallest currency unit, always positive
    pub price: i64,
    pub remaining_quantity: i32,
    pub total_quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ownership_record::Entity")]
    OwnershipRecords,
}

impl Related<super::ownership_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OwnershipRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Availability as the `[remaining, total]` pair the listing endpoint
    /// exposes.
    pub fn availability(&self) -> [i32; 2] {
        [self.remaining_quantity, self.total_quantity]
    }

    pub fn is_available(&self) -> bool {
        self.remaining_quantity > 0
    }
}
