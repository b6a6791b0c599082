//! Tow / roadside-assistance service requests

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::text_enum;

text_enum! {
    /// Vehicle class offered by the booking form
    pub enum VehicleType {
        Car => ("auto", "Auto"),
        Pickup => ("camioneta", "Camioneta"),
        Suv => ("suv", "SUV"),
        Motorcycle => ("moto", "Moto"),
    }
}

text_enum! {
    /// How the customer intends to pay
    pub enum PaymentMethod {
        Cash => ("efectivo", "Efectivo"),
        BankTransfer => ("transferencia", "Transferencia"),
        MercadoPago => ("mercadopago", "Mercado Pago"),
    }
}

text_enum! {
    /// Kind of service requested; selects the notification template
    pub enum ServiceCategory {
        Towing => ("grua", "Servicio de grúa"),
        Assistance => ("asistencia", "Asistencia mecánica"),
    }
}

text_enum! {
    /// Lifecycle of a request
    ///
    /// `pendiente → confirmada → en_proceso → completada`, and any
    /// non-terminal state may move to `cancelada`.
    pub enum RequestStatus {
        Pending => ("pendiente", "Pendiente"),
        Confirmed => ("confirmada", "Confirmada"),
        InProgress => ("en_proceso", "En proceso"),
        Completed => ("completada", "Completada"),
        Cancelled => ("cancelada", "Cancelada"),
    }
}

impl Default for ServiceCategory {
    fn default() -> Self {
        ServiceCategory::Towing
    }
}

/// Rejected status change
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move a request from {from} to {to}")]
pub struct InvalidTransition {
    pub from: RequestStatus,
    pub to: RequestStatus,
}

impl RequestStatus {
    /// Statuses reachable in one step
    pub fn next_states(&self) -> &'static [RequestStatus] {
        use RequestStatus::*;
        match self {
            Pending => &[Confirmed, Cancelled],
            Confirmed => &[InProgress, Cancelled],
            InProgress => &[Completed, Cancelled],
            Completed | Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        self.next_states().contains(&next)
    }

    /// Validate a move to `next`, returning the new status
    pub fn transition_to(self, next: RequestStatus) -> Result<RequestStatus, InvalidTransition> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

/// Persisted service request
#[derive(Debug, Clone, Serialize)]
pub struct ServiceRequest {
    pub id: i64,
    pub numero_orden: String,
    pub cliente: i64,
    pub direccion_origen: String,
    pub direccion_destino: String,
    pub fecha_servicio: Option<DateTime<Utc>>,
    pub tipo_vehiculo: VehicleType,
    pub marca_vehiculo: String,
    pub modelo_vehiculo: String,
    pub placa_vehiculo: String,
    pub descripcion_problema: String,
    pub estado: RequestStatus,
    pub metodo_pago: PaymentMethod,
    pub costo_total: Decimal,
    pub fecha_solicitud: DateTime<Utc>,
    pub fecha_confirmacion: Option<DateTime<Utc>>,
    pub distancia_km: Option<Decimal>,
    pub tipo_servicio_categoria: ServiceCategory,
}

/// Request submission body
///
/// Every field is optional at the JSON level so that missing or mistyped
/// values are reported per field instead of as a body rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateServiceRequest {
    pub direccion_origen: Option<String>,
    pub direccion_destino: Option<String>,
    pub fecha_servicio: Option<String>,
    pub tipo_vehiculo: Option<String>,
    pub marca_vehiculo: Option<String>,
    pub modelo_vehiculo: Option<String>,
    pub placa_vehiculo: Option<String>,
    pub descripcion_problema: Option<String>,
    pub metodo_pago: Option<String>,
    pub distancia_km: Option<serde_json::Value>,
    pub tipo_servicio_categoria: Option<String>,
}

/// Validated submission, ready to be priced and stored
#[derive(Debug, Clone, PartialEq)]
pub struct NewServiceRequest {
    pub direccion_origen: String,
    pub direccion_destino: String,
    pub fecha_servicio: Option<DateTime<Utc>>,
    pub tipo_vehiculo: VehicleType,
    pub marca_vehiculo: String,
    pub modelo_vehiculo: String,
    pub placa_vehiculo: String,
    pub descripcion_problema: String,
    pub metodo_pago: PaymentMethod,
    pub distancia_km: Option<Decimal>,
    pub tipo_servicio_categoria: ServiceCategory,
}

/// Contact details of the requesting customer
#[derive(Debug, Clone, Serialize)]
pub struct ClientInfo {
    pub nombre: String,
    pub telefono: String,
    pub email: String,
}

/// Service request as returned to its owner
#[derive(Debug, Clone, Serialize)]
pub struct ServiceRequestResponse {
    #[serde(flatten)]
    pub request: ServiceRequest,
    pub cliente_info: ClientInfo,
    pub estado_display: &'static str,
}

impl ServiceRequestResponse {
    pub fn new(request: ServiceRequest, cliente_info: ClientInfo) -> Self {
        let estado_display = request.estado.label();
        Self {
            request,
            cliente_info,
            estado_display,
        }
    }
}
