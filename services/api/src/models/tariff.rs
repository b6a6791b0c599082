//! Fare triple applied when pricing a service request

use rust_decimal::Decimal;
use serde::Serialize;

/// Base, per-kilometre and minimum fares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tariff {
    #[serde(rename = "tarifa_base")]
    pub base_fare: Decimal,
    #[serde(rename = "tarifa_por_km")]
    pub per_km_fare: Decimal,
    #[serde(rename = "tarifa_minima")]
    pub minimum_fare: Decimal,
}

impl Tariff {
    pub fn new(base_fare: Decimal, per_km_fare: Decimal, minimum_fare: Decimal) -> Self {
        Self {
            base_fare,
            per_km_fare,
            minimum_fare,
        }
    }
}

/// Body of `GET /tarifas`
#[derive(Debug, Clone, Serialize)]
pub struct TariffResponse {
    #[serde(flatten)]
    pub tariff: Tariff,
    /// Tier code when the fares come from an active membership
    pub tipo_membresia: Option<String>,
    pub tiene_membresia: bool,
}
