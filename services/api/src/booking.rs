//! Service request creation
//!
//! validate → order number → tariff → cost → persist → notify

use chrono::Utc;
use rand::RngCore;
use tracing::info;

use crate::{
    error::{ApiResult, internal},
    models::{CreateServiceRequest, ServiceRequest, Tariff, User},
    notifications::{NotificationHub, RequestCreated},
    pricing::{compute_cost, resolve_tariff},
    repositories::{MembershipRepository, ServiceRequestRepository},
    validation::validate_service_request,
};

/// `GR` + UTC timestamp + 8 random uppercase hex digits
pub fn generate_order_number() -> String {
    format!(
        "GR{}{:08X}",
        Utc::now().format("%Y%m%d%H%M%S"),
        rand::thread_rng().next_u32()
    )
}

/// Collaborators the creation flow needs
pub struct Booking<'a> {
    pub memberships: &'a MembershipRepository,
    pub requests: &'a ServiceRequestRepository,
    pub hub: &'a NotificationHub,
    pub default_tariff: &'a Tariff,
}

impl Booking<'_> {
    /// Validate, price and store a request, then queue the admin notification
    ///
    /// The stored request is returned whatever happens to the notification.
    pub async fn create_service_request(
        &self,
        user: &User,
        payload: CreateServiceRequest,
    ) -> ApiResult<ServiceRequest> {
        let new_request = validate_service_request(payload)?;

        let numero_orden = generate_order_number();
        let active = self
            .memberships
            .find_active(user.id)
            .await
            .map_err(internal("Failed to load membership"))?;
        let tariff = resolve_tariff(active.as_ref(), self.default_tariff);
        let costo_total = compute_cost(&tariff, new_request.distancia_km);

        let request = self
            .requests
            .create(user.id, &numero_orden, &new_request, costo_total)
            .await
            .map_err(internal("Failed to store service request"))?;

        info!(
            numero_orden = %request.numero_orden,
            costo_total = %request.costo_total,
            categoria = %request.tipo_servicio_categoria,
            "Service request created"
        );

        self.hub.publish(RequestCreated {
            request: request.clone(),
            customer_name: user.display_name(),
            username: user.username.clone(),
        });

        Ok(request)
    }
}
