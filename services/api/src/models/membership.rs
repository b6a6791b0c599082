//! Membership tiers and customer memberships

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::customer::CustomerResponse;
use super::tariff::Tariff;

/// Paid tier granting a non-default tariff
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MembershipTier {
    pub codigo: String,
    pub nombre: String,
    pub tarifa_base: Decimal,
    pub tarifa_por_km: Decimal,
    pub tarifa_minima: Decimal,
    pub precio: Decimal,
}

impl MembershipTier {
    /// Fares granted by this tier
    pub fn tariff(&self) -> Tariff {
        Tariff::new(self.tarifa_base, self.tarifa_por_km, self.tarifa_minima)
    }
}

/// Membership entity
#[derive(Debug, Clone, PartialEq)]
pub struct Membership {
    pub id: i64,
    pub customer_id: i64,
    pub tipo: String,
    pub fecha_inicio: NaiveDate,
    pub fecha_vencimiento: NaiveDate,
    pub activa: bool,
    pub precio_pagado: Decimal,
}

/// An active membership together with its tier
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveMembership {
    pub membership: Membership,
    pub tier: MembershipTier,
}

/// Payload for activating a membership
// built by the admin side; see `MembershipRepository::activate`
#[cfg_attr(not(test), allow(dead_code))]
#[derive(Debug, Clone)]
pub struct NewMembership {
    pub customer_id: i64,
    pub tipo: String,
    pub fecha_inicio: NaiveDate,
    pub fecha_vencimiento: NaiveDate,
    pub precio_pagado: Decimal,
}

/// Body of `GET /membresia` when a membership is active
#[derive(Debug, Clone, Serialize)]
pub struct MembershipResponse {
    pub id: i64,
    pub cliente: CustomerResponse,
    pub tipo: String,
    pub tipo_display: String,
    pub fecha_inicio: NaiveDate,
    pub fecha_vencimiento: NaiveDate,
    pub activa: bool,
    pub precio_pagado: Decimal,
    pub tiene_membresia: bool,
}

impl MembershipResponse {
    pub fn new(active: &ActiveMembership, cliente: CustomerResponse) -> Self {
        let membership = &active.membership;
        Self {
            id: membership.id,
            cliente,
            tipo: membership.tipo.clone(),
            tipo_display: active.tier.nombre.clone(),
            fecha_inicio: membership.fecha_inicio,
            fecha_vencimiento: membership.fecha_vencimiento,
            activa: membership.activa,
            precio_pagado: membership.precio_pagado,
            tiene_membresia: true,
        }
    }
}
