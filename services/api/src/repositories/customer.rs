use anyhow::Result;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::{debug, info};

use crate::models::Customer;

fn map_customer(row: &PgRow) -> Customer {
    Customer {
        user_id: row.get("user_id"),
        telefono: row.get("telefono"),
        fecha_registro: row.get("fecha_registro"),
    }
}

/// Customer profile repository
#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Profile for a user, if one exists
    pub async fn find(&self, user_id: i64) -> Result<Option<Customer>> {
        let row = sqlx::query(
            "SELECT user_id, telefono, fecha_registro FROM customers WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_customer))
    }

    /// Profile for a user, created empty on first access
    ///
    /// Concurrent callers converge on the same row.
    pub async fn get_or_create(&self, user_id: i64) -> Result<Customer> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO customers (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted > 0 {
            info!("Created customer profile for user {}", user_id);
        }

        self.find(user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Customer profile for user {} vanished", user_id))
    }

    /// Replace the stored phone number
    pub async fn update_phone(&self, user_id: i64, telefono: &str) -> Result<Customer> {
        debug!("Updating phone for user {}", user_id);

        let row = sqlx::query(
            r#"
            INSERT INTO customers (user_id, telefono)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET telefono = EXCLUDED.telefono
            RETURNING user_id, telefono, fecha_registro
            "#,
        )
        .bind(user_id)
        .bind(telefono)
        .fetch_one(&self.pool)
        .await?;

        Ok(map_customer(&row))
    }
}
