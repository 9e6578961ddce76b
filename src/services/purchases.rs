use crate::{
    entities::{
        gift::{self, Entity as GiftEntity},
        ownership_record::{self, Entity as OwnershipRecordEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Input for a purchase commit: a confirmed payment to be turned into an
/// inventory decrement plus an ownership record.
#[derive(Debug, Clone)]
pub struct CommitPurchaseCommand {
    pub transaction_id: String,
    pub gift_id: String,
    pub buyer_id: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Result of a successful (or idempotently replayed) commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    pub record_id: Uuid,
    pub gift_id: String,
    pub transaction_id: String,
    pub remaining_quantity: i32,
    /// True when this transaction id had already been recorded and the prior
    /// result was returned instead of decrementing again.
    pub duplicate: bool,
}

/// Denormalized projection of an ownership record for the activity feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub username: String,
    pub gift_name: String,
    pub gift_id: String,
    pub purchased_at: DateTime<Utc>,
}

/// The authoritative purchase ledger. All inventory mutation goes through
/// [`PurchaseService::commit`]; clients never decrement on their own say-so.
#[derive(Clone)]
pub struct PurchaseService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl PurchaseService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Converts a paid invoice into an inventory decrement plus an ownership
    /// record, exactly once per transaction id.
    ///
    /// The decrement is a conditional `UPDATE .. WHERE remaining_quantity > 0`
    /// inside a transaction, so concurrent commits racing for the last unit
    /// resolve to exactly one winner; the loser gets `OutOfStock`. Commits on
    /// different gifts touch different rows and do not block each other.
    #[instrument(skip(self), fields(transaction_id = %cmd.transaction_id, gift_id = %cmd.gift_id))]
    pub async fn commit(&self, cmd: CommitPurchaseCommand) -> Result<PurchaseReceipt, ServiceError> {
        if cmd.transaction_id.is_empty() || cmd.gift_id.is_empty() || cmd.buyer_id.is_empty() {
            return Err(ServiceError::InvalidInput(
                "transaction_id, gift_id and buyer_id are required".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        // Idempotent replay protection: a retried confirmation for an already
        // recorded transaction returns the prior result, with no decrement.
        if let Some(existing) = OwnershipRecordEntity::find()
            .filter(ownership_record::Column::TransactionId.eq(cmd.transaction_id.clone()))
            .one(&txn)
            .await?
        {
            let remaining = Self::current_remaining(&txn, &existing.gift_id).await?;
            txn.commit().await?;
            self.event_sender
                .send_or_log(Event::DuplicateCommit {
                    transaction_id: cmd.transaction_id.clone(),
                })
                .await;
            return Ok(PurchaseReceipt {
                record_id: existing.id,
                gift_id: existing.gift_id,
                transaction_id: existing.transaction_id,
                remaining_quantity: remaining,
                duplicate: true,
            });
        }

        // Atomic test-and-decrement. rows_affected == 0 means either the gift
        // does not exist or the last unit is gone.
        let update = GiftEntity::update_many()
            .col_expr(
                gift::Column::RemainingQuantity,
                Expr::col(gift::Column::RemainingQuantity).sub(1),
            )
            .col_expr(gift::Column::UpdatedAt, Expr::value(Some(Utc::now())))
            .filter(gift::Column::Id.eq(cmd.gift_id.clone()))
            .filter(gift::Column::RemainingQuantity.gt(0))
            .exec(&txn)
            .await?;

        if update.rows_affected == 0 {
            let gift_exists = GiftEntity::find_by_id(cmd.gift_id.clone())
                .one(&txn)
                .await?
                .is_some();
            txn.rollback().await?;

            if !gift_exists {
                return Err(ServiceError::NotFound(format!(
                    "Gift {} not found",
                    cmd.gift_id
                )));
            }

            self.event_sender
                .send_or_log(Event::PurchaseRejected {
                    gift_id: cmd.gift_id.clone(),
                    transaction_id: cmd.transaction_id.clone(),
                    reason: "out_of_stock".to_string(),
                })
                .await;
            return Err(ServiceError::OutOfStock(cmd.gift_id));
        }

        let record = ownership_record::ActiveModel {
            id: Set(Uuid::new_v4()),
            buyer_id: Set(cmd.buyer_id.clone()),
            gift_id: Set(cmd.gift_id.clone()),
            transaction_id: Set(cmd.transaction_id.clone()),
            username: Set(cmd.username.clone()),
            first_name: Set(cmd.first_name.clone()),
            last_name: Set(cmd.last_name.clone()),
            purchased_at: Set(Utc::now()),
        };

        let inserted = match record.insert(&txn).await {
            Ok(model) => model,
            Err(err) if is_unique_violation(&err) => {
                // A concurrent replay of the same transaction id won the
                // insert race. Roll our decrement back and resolve to the
                // committed record.
                txn.rollback().await?;
                return self.resolve_replayed(&cmd.transaction_id).await;
            }
            Err(err) => {
                warn!("ownership insert failed after decrement: {}", err);
                txn.rollback().await?;
                return Err(ServiceError::PersistenceError(err.to_string()));
            }
        };

        let remaining = Self::current_remaining(&txn, &cmd.gift_id).await?;

        txn.commit()
            .await
            .map_err(|err| ServiceError::PersistenceError(err.to_string()))?;

        info!(remaining_quantity = remaining, "purchase committed");
        self.event_sender
            .send_or_log(Event::GiftPurchased {
                gift_id: cmd.gift_id.clone(),
                buyer_id: cmd.buyer_id,
                transaction_id: cmd.transaction_id.clone(),
                remaining_quantity: remaining,
            })
            .await;

        Ok(PurchaseReceipt {
            record_id: inserted.id,
            gift_id: cmd.gift_id,
            transaction_id: cmd.transaction_id,
            remaining_quantity: remaining,
            duplicate: false,
        })
    }

    /// Recent successful purchases across all buyers, newest first.
    #[instrument(skip(self))]
    pub async fn recent_purchases(&self, limit: u64) -> Result<Vec<ActivityEntry>, ServiceError> {
        let rows = OwnershipRecordEntity::find()
            .find_also_related(GiftEntity)
            .order_by_desc(ownership_record::Column::PurchasedAt)
            .limit(limit)
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(record, gift)| ActivityEntry {
                id: record.id,
                username: record.display_name(),
                gift_name: gift
                    .map(|g| g.name)
                    .unwrap_or_else(|| record.gift_id.clone()),
                gift_id: record.gift_id,
                purchased_at: record.purchased_at,
            })
            .collect())
    }

    /// Total ownership records for one gift. Test and diagnostics surface for
    /// the "never exceeds total_quantity" invariant.
    pub async fn ownership_count(&self, gift_id: &str) -> Result<u64, ServiceError> {
        use sea_orm::PaginatorTrait;
        let count = OwnershipRecordEntity::find()
            .filter(ownership_record::Column::GiftId.eq(gift_id))
            .count(&*self.db)
            .await?;
        Ok(count)
    }

    async fn current_remaining<C: ConnectionTrait>(
        conn: &C,
        gift_id: &str,
    ) -> Result<i32, ServiceError> {
        let gift = GiftEntity::find_by_id(gift_id.to_string()).one(conn).await?;
        Ok(gift.map(|g| g.remaining_quantity).unwrap_or(0))
    }

    /// Resolves a commit that lost the unique-index race to the record the
    /// winner committed.
    async fn resolve_replayed(&self, transaction_id: &str) -> Result<PurchaseReceipt, ServiceError> {
        let existing = OwnershipRecordEntity::find()
            .filter(ownership_record::Column::TransactionId.eq(transaction_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "transaction {} hit a unique violation but no record exists",
                    transaction_id
                ))
            })?;

        let remaining = Self::current_remaining(&*self.db, &existing.gift_id).await?;
        self.event_sender
            .send_or_log(Event::DuplicateCommit {
                transaction_id: transaction_id.to_string(),
            })
            .await;

        Ok(PurchaseReceipt {
            record_id: existing.id,
            gift_id: existing.gift_id,
            transaction_id: existing.transaction_id,
            remaining_quantity: remaining,
            duplicate: true,
        })
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
