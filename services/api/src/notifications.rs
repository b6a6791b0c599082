//! Admin notifications for newly created service requests
//!
//! Request creation publishes a [`RequestCreated`] event on a bounded queue
//! and returns immediately. A single [`NotificationWorker`] drains the queue,
//! renders the message and makes one delivery attempt. Nothing on this path
//! can fail or roll back the stored request.

pub mod format;
pub mod telegram;

use rust_decimal::prelude::ToPrimitive;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{info, warn};

use crate::models::{ServiceCategory, ServiceRequest};

pub use format::NotificationFields;
pub use telegram::{MessageSender, TelegramClient, TelegramConfig};

/// Shown in place of an empty problem description on towing requests
const DEFAULT_TOWING_COMMENT: &str = "Solicitud desde app móvil";

/// A request was stored and the admins should hear about it
#[derive(Debug, Clone)]
pub struct RequestCreated {
    pub request: ServiceRequest,
    pub customer_name: String,
    pub username: String,
}

impl RequestCreated {
    /// Template values for this event
    pub fn fields(&self, admin_base_url: &str) -> NotificationFields {
        let request = &self.request;
        let descripcion = Some(request.descripcion_problema.clone()).filter(|d| !d.trim().is_empty());

        let (tipo_problema, comentarios) = match request.tipo_servicio_categoria {
            ServiceCategory::Towing => (
                None,
                descripcion.or_else(|| Some(DEFAULT_TOWING_COMMENT.to_string())),
            ),
            ServiceCategory::Assistance => (descripcion, None),
        };

        NotificationFields {
            numero_orden: Some(request.numero_orden.clone()),
            nombre: Some(self.customer_name.clone()),
            username: Some(self.username.clone()),
            marca_vehiculo: Some(request.marca_vehiculo.clone()),
            modelo_vehiculo: Some(request.modelo_vehiculo.clone()),
            tipo_vehiculo: Some(request.tipo_vehiculo.as_str().to_string()),
            direccion_origen: Some(request.direccion_origen.clone()),
            direccion_destino: Some(request.direccion_destino.clone()),
            costo_total: request.costo_total.trunc().to_i64(),
            metodo_pago: Some(request.metodo_pago.as_str().to_string()),
            fecha_servicio: request
                .fecha_servicio
                .map(|fecha| fecha.format("%d/%m/%Y %H:%M").to_string()),
            estado: Some(request.estado.as_str().to_string()),
            tipo_problema,
            comentarios,
            admin_url: Some(format!(
                "{}/admin/grua_app/solicitudservicio/{}/change/",
                admin_base_url.trim_end_matches('/'),
                request.id
            )),
        }
    }

    /// Finished message text
    pub fn render(&self, admin_base_url: &str) -> String {
        format::format_notification(
            self.request.tipo_servicio_categoria,
            &self.fields(admin_base_url),
        )
    }
}

/// Publishing side of the notification queue
#[derive(Clone)]
pub struct NotificationHub {
    tx: mpsc::Sender<RequestCreated>,
}

impl NotificationHub {
    /// Create a hub and the receiver its worker will drain
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<RequestCreated>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Queue an event without waiting
    ///
    /// Returns whether the event was queued. A full or closed queue is
    /// logged and otherwise ignored.
    pub fn publish(&self, event: RequestCreated) -> bool {
        let numero_orden = event.request.numero_orden.clone();
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(%numero_orden, "Notification queue full, dropping admin notification");
                false
            }
            Err(TrySendError::Closed(_)) => {
                warn!(%numero_orden, "Notification worker stopped, dropping admin notification");
                false
            }
        }
    }
}

/// Consumes queued events and delivers them
pub struct NotificationWorker {
    rx: mpsc::Receiver<RequestCreated>,
    sender: Arc<dyn MessageSender>,
    admin_base_url: String,
}

impl NotificationWorker {
    pub fn new(
        rx: mpsc::Receiver<RequestCreated>,
        sender: Arc<dyn MessageSender>,
        admin_base_url: impl Into<String>,
    ) -> Self {
        Self {
            rx,
            sender,
            admin_base_url: admin_base_url.into(),
        }
    }

    /// Deliver a single event; one attempt, no retry
    pub async fn handle(&self, event: &RequestCreated) -> bool {
        let message = event.render(&self.admin_base_url);
        let delivered = self.sender.send(&message).await;
        if delivered {
            info!(numero_orden = %event.request.numero_orden, "Admin notified");
        } else {
            warn!(numero_orden = %event.request.numero_orden, "Admin notification not delivered");
        }
        delivered
    }

    /// Run until every hub handle is dropped
    pub async fn run(mut self) {
        info!("Notification worker started");
        while let Some(event) = self.rx.recv().await {
            self.handle(&event).await;
        }
        info!("Notification worker stopped");
    }
}
