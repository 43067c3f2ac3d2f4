use async_trait::async_trait;
use couponry_core::store::{CouponStore, Result};
use couponry_core::{CodePattern, Coupon, CouponCode, PromotionId, StoreError};
use jiff::Timestamp;
use sqlx::{MySqlPool, Row};
use tracing::debug;

/// MySQL implementation of the coupon store contract.
///
/// Codes are unique through the `uk_promotion_coupons_code` index; the
/// table uses a binary NO PAD collation so codes differing only in case or
/// in trailing spaces are distinct. A batch is written inside one transaction, so a unique
/// violation on any member rolls back the whole batch.
#[derive(Debug, Clone)]
pub struct MySqlCouponStore {
    pool: MySqlPool,
}

impl MySqlCouponStore {
    /// Creates a store from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a store by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

fn now_unix_seconds() -> i64 {
    Timestamp::now().as_second()
}

fn parse_expires_at(seconds: Option<i64>) -> Result<Option<Timestamp>> {
    seconds
        .map(|value| {
            Timestamp::from_second(value).map_err(|e| {
                StoreError::InvalidData(format!("invalid expires_at timestamp '{}': {e}", value))
            })
        })
        .transpose()
}

/// Escapes `LIKE` wildcards so affixes are matched literally.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn like_pattern(pattern: &CodePattern) -> String {
    format!(
        "{}%{}",
        escape_like(pattern.prefix.as_deref().unwrap_or_default()),
        escape_like(pattern.suffix.as_deref().unwrap_or_default())
    )
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StoreError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StoreError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StoreError::InvalidData(message),
        _ => StoreError::Query(message),
    }
}

#[async_trait]
impl CouponStore for MySqlCouponStore {
    async fn count_matching(&self, pattern: &CodePattern) -> Result<u64> {
        let full_length = u32::try_from(pattern.full_length()).map_err(|_| {
            StoreError::Query(format!("code length {} is too large", pattern.full_length()))
        })?;

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM promotion_coupons
            WHERE CHAR_LENGTH(code) = ?
              AND code LIKE ?
            "#,
        )
        .bind(full_length)
        .bind(like_pattern(pattern))
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        u64::try_from(count)
            .map_err(|_| StoreError::InvalidData(format!("negative coupon count {count}")))
    }

    async fn find_by_code(&self, code: &CouponCode) -> Result<Option<Coupon>> {
        let row = sqlx::query(
            r#"
            SELECT code, promotion_id, usage_limit, expires_at
            FROM promotion_coupons
            WHERE code = ?
            LIMIT 1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let code: String = row.try_get("code").map_err(map_sqlx_error)?;
        let promotion_id: i64 = row.try_get("promotion_id").map_err(map_sqlx_error)?;
        let usage_limit: Option<u32> = row.try_get("usage_limit").map_err(map_sqlx_error)?;
        let expires_at_raw: Option<i64> = row.try_get("expires_at").map_err(map_sqlx_error)?;

        Ok(Some(Coupon::new(
            PromotionId::new(promotion_id),
            CouponCode::new(code),
            usage_limit,
            parse_expires_at(expires_at_raw)?,
        )))
    }

    async fn save_all(&self, coupons: &[Coupon]) -> Result<()> {
        let created_at = now_unix_seconds();
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        for coupon in coupons {
            let result = sqlx::query(
                r#"
                INSERT INTO promotion_coupons (code, promotion_id, usage_limit, expires_at, created_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(coupon.code().as_str())
            .bind(coupon.promotion().get())
            .bind(coupon.usage_limit())
            .bind(coupon.expires_at().map(|ts| ts.as_second()))
            .bind(created_at)
            .execute(&mut *tx)
            .await;

            // dropping `tx` without commit rolls the batch back
            match result {
                Ok(_) => {}
                Err(err) if is_unique_violation(&err) => {
                    debug!(code = %coupon.code(), "coupon batch rejected by unique index");
                    return Err(StoreError::Conflict(coupon.code().to_string()));
                }
                Err(err) => return Err(map_sqlx_error(err)),
            }
        }

        tx.commit().await.map_err(map_sqlx_error)
    }
}
