//! Tariff resolution and request pricing

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{ActiveMembership, Tariff};

/// Fares that apply to a customer
///
/// An active membership's tier wins outright; otherwise the public default
/// applies. The two are never mixed.
pub fn resolve_tariff(active: Option<&ActiveMembership>, default: &Tariff) -> Tariff {
    match active {
        Some(active) if active.membership.activa => active.tier.tariff(),
        _ => *default,
    }
}

/// Total cost of a request
///
/// `max(base + distance * per_km, minimum)` when a non-zero distance is
/// known, the minimum fare otherwise. Rounded half-up to cents, never below
/// the minimum fare.
pub fn compute_cost(tariff: &Tariff, distance_km: Option<Decimal>) -> Decimal {
    let cost = match distance_km {
        Some(distance) if !distance.is_zero() => {
            let by_distance = tariff.base_fare + distance * tariff.per_km_fare;
            by_distance.max(tariff.minimum_fare)
        }
        _ => tariff.minimum_fare,
    };

    cost.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .max(tariff.minimum_fare)
}
