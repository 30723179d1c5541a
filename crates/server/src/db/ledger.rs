//! Append-only audit ledger of issued coupons.

use std::future::Future;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use proximity_core::{CouponId, UserId};

use super::RepositoryError;

/// Durable record of every coupon handed to a user.
pub trait AuditLedger: Send + Sync {
    /// Record that `coupons` were issued to `user` at `at`, all or nothing.
    fn append(
        &self,
        user: UserId,
        coupons: &[CouponId],
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// `PostgreSQL` ledger over `proximity.user_coupon`.
#[derive(Clone)]
pub struct PgAuditLedger {
    pool: PgPool,
}

impl PgAuditLedger {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl AuditLedger for PgAuditLedger {
    #[instrument(skip(self, coupons), fields(user_id = %user, count = coupons.len()))]
    async fn append(
        &self,
        user: UserId,
        coupons: &[CouponId],
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        if coupons.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for coupon in coupons {
            sqlx::query(
                "INSERT INTO proximity.user_coupon (user_id, coupon_id, issued_at)
                 VALUES ($1, $2, $3)",
            )
            .bind(user)
            .bind(coupon)
            .bind(at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(())
    }
}
