//! Membership repository
//!
//! A customer holds at most one active membership. The database enforces it
//! with a partial unique index; [`MembershipRepository::activate`] keeps it
//! by retiring the previous membership in the same transaction.

use anyhow::Result;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;

use crate::models::{ActiveMembership, Membership, MembershipTier, NewMembership};

fn map_membership(row: &PgRow) -> Membership {
    Membership {
        id: row.get("id"),
        customer_id: row.get("customer_id"),
        tipo: row.get("tipo"),
        fecha_inicio: row.get("fecha_inicio"),
        fecha_vencimiento: row.get("fecha_vencimiento"),
        activa: row.get("activa"),
        precio_pagado: row.get("precio_pagado"),
    }
}

fn map_tier(row: &PgRow) -> MembershipTier {
    MembershipTier {
        codigo: row.get("codigo"),
        nombre: row.get("nombre"),
        tarifa_base: row.get("tarifa_base"),
        tarifa_por_km: row.get("tarifa_por_km"),
        tarifa_minima: row.get("tarifa_minima"),
        precio: row.get("precio"),
    }
}

#[derive(Clone)]
pub struct MembershipRepository {
    pool: PgPool,
}

impl MembershipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The customer's active membership joined with its tier
    pub async fn find_active(&self, customer_id: i64) -> Result<Option<ActiveMembership>> {
        let row = sqlx::query(
            r#"
            SELECT m.id, m.customer_id, m.tipo, m.fecha_inicio, m.fecha_vencimiento,
                   m.activa, m.precio_pagado,
                   t.codigo, t.nombre, t.tarifa_base, t.tarifa_por_km, t.tarifa_minima,
                   t.precio
            FROM memberships m
            JOIN membership_tiers t ON t.codigo = m.tipo
            WHERE m.customer_id = $1 AND m.activa
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| ActiveMembership {
            membership: map_membership(&row),
            tier: map_tier(&row),
        }))
    }

    /// Every tier on offer, cheapest first
    pub async fn list_tiers(&self) -> Result<Vec<MembershipTier>> {
        let rows = sqlx::query(
            r#"
            SELECT codigo, nombre, tarifa_base, tarifa_por_km, tarifa_minima, precio
            FROM membership_tiers
            ORDER BY precio ASC, codigo ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(map_tier).collect())
    }

    /// Start a membership, retiring any currently active one
    ///
    /// Memberships are sold from the admin site, which owns this write path.
    // no HTTP route sells memberships; only the admin side and tests call this
    #[cfg_attr(not(test), allow(dead_code))]
    pub async fn activate(&self, new_membership: &NewMembership) -> Result<Membership> {
        let mut tx = self.pool.begin().await?;

        // serialise activations for the same customer
        sqlx::query("SELECT user_id FROM customers WHERE user_id = $1 FOR UPDATE")
            .bind(new_membership.customer_id)
            .fetch_one(&mut *tx)
            .await?;

        let retired = sqlx::query(
            "UPDATE memberships SET activa = FALSE WHERE customer_id = $1 AND activa",
        )
        .bind(new_membership.customer_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let row = sqlx::query(
            r#"
            INSERT INTO memberships
                (customer_id, tipo, fecha_inicio, fecha_vencimiento, activa, precio_pagado)
            VALUES ($1, $2, $3, $4, TRUE, $5)
            RETURNING id, customer_id, tipo, fecha_inicio, fecha_vencimiento, activa,
                      precio_pagado
            "#,
        )
        .bind(new_membership.customer_id)
        .bind(&new_membership.tipo)
        .bind(new_membership.fecha_inicio)
        .bind(new_membership.fecha_vencimiento)
        .bind(new_membership.precio_pagado)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let membership = map_membership(&row);
        info!(
            customer_id = membership.customer_id,
            tipo = %membership.tipo,
            retired,
            "Membership activated"
        );
        Ok(membership)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;
    use crate::repositories::UserRepository;
    use crate::repositories::test_support::{migrated_pool, unique_username};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_activate_keeps_a_single_active_membership() {
        let pool = migrated_pool().await;
        let users = UserRepository::new(pool.clone());
        let memberships = MembershipRepository::new(pool);

        let (user, _) = users
            .create_with_customer(
                &NewUser {
                    username: unique_username("socio"),
                    email: "socio@example.com".to_string(),
                    first_name: String::new(),
                    last_name: String::new(),
                    password: "Remolque2024".to_string(),
                },
                "",
            )
            .await
            .unwrap();

        assert!(memberships.find_active(user.id).await.unwrap().is_none());

        let tiers = memberships.list_tiers().await.unwrap();
        assert!(tiers.len() >= 2);

        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        for tier in &tiers[..2] {
            memberships
                .activate(&NewMembership {
                    customer_id: user.id,
                    tipo: tier.codigo.clone(),
                    fecha_inicio: start,
                    fecha_vencimiento: end,
                    precio_pagado: Decimal::ZERO,
                })
                .await
                .unwrap();
        }

        let active = memberships.find_active(user.id).await.unwrap().unwrap();
        assert_eq!(active.membership.tipo, tiers[1].codigo);
        assert_eq!(active.tier, tiers[1]);
    }
}
