use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One record per successful purchase commit. Immutable once written; the
/// unique `transaction_id` makes the commit operation idempotent.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ownership_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub buyer_id: String,
    pub gift_id: String,
    #[sea_orm(unique)]
    pub transaction_id: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub purchased_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::gift::Entity",
        from = "Column::GiftId",
        to = "super::gift::Column::Id"
    )]
    Gift,
}

impl Related<super::gift::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Gift.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Name shown in the activity feed: username when set, otherwise the
    /// first name, otherwise a placeholder.
    pub fn display_name(&self) -> String {
        self.username
            .clone()
            .or_else(|| self.first_name.clone())
            .unwrap_or_else(|| "anonymous".to_string())
    }
}
