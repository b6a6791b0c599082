//! Service request repository

use anyhow::{Context, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgPool, Row, postgres::PgRow};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{InvalidTransition, NewServiceRequest, RequestStatus, ServiceRequest};

const REQUEST_COLUMNS: &str = r#"
    id, numero_orden, cliente_id, direccion_origen, direccion_destino, fecha_servicio,
    tipo_vehiculo, marca_vehiculo, modelo_vehiculo, placa_vehiculo, descripcion_problema,
    estado, metodo_pago, costo_total, fecha_solicitud, fecha_confirmacion, distancia_km,
    tipo_servicio_categoria
"#;

fn map_request(row: &PgRow) -> Result<ServiceRequest> {
    let tipo_vehiculo: String = row.get("tipo_vehiculo");
    let estado: String = row.get("estado");
    let metodo_pago: String = row.get("metodo_pago");
    let categoria: String = row.get("tipo_servicio_categoria");

    Ok(ServiceRequest {
        id: row.get("id"),
        numero_orden: row.get("numero_orden"),
        cliente: row.get("cliente_id"),
        direccion_origen: row.get("direccion_origen"),
        direccion_destino: row.get("direccion_destino"),
        fecha_servicio: row.get("fecha_servicio"),
        tipo_vehiculo: tipo_vehiculo.parse().context("stored tipo_vehiculo")?,
        marca_vehiculo: row.get("marca_vehiculo"),
        modelo_vehiculo: row.get("modelo_vehiculo"),
        placa_vehiculo: row.get("placa_vehiculo"),
        descripcion_problema: row.get("descripcion_problema"),
        estado: estado.parse().context("stored estado")?,
        metodo_pago: metodo_pago.parse().context("stored metodo_pago")?,
        costo_total: row.get("costo_total"),
        fecha_solicitud: row.get("fecha_solicitud"),
        fecha_confirmacion: row.get("fecha_confirmacion"),
        distancia_km: row.get("distancia_km"),
        tipo_servicio_categoria: categoria.parse().context("stored tipo_servicio_categoria")?,
    })
}

/// Why a status change did not happen
#[derive(Debug, Error)]
pub enum StatusUpdateError {
    #[error("service request not found")]
    NotFound,

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    /// The row changed status between the read and the write
    #[error("service request status changed concurrently")]
    Conflict,

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct ServiceRequestRepository {
    pool: PgPool,
}

impl ServiceRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Store a new request in `pendiente` status
    pub async fn create(
        &self,
        cliente_id: i64,
        numero_orden: &str,
        request: &NewServiceRequest,
        costo_total: Decimal,
    ) -> Result<ServiceRequest> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO service_requests (
                numero_orden, cliente_id, direccion_origen, direccion_destino, fecha_servicio,
                tipo_vehiculo, marca_vehiculo, modelo_vehiculo, placa_vehiculo,
                descripcion_problema, estado, metodo_pago, costo_total, distancia_km,
                tipo_servicio_categoria
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(numero_orden)
        .bind(cliente_id)
        .bind(&request.direccion_origen)
        .bind(&request.direccion_destino)
        .bind(request.fecha_servicio)
        .bind(request.tipo_vehiculo.as_str())
        .bind(&request.marca_vehiculo)
        .bind(&request.modelo_vehiculo)
        .bind(&request.placa_vehiculo)
        .bind(&request.descripcion_problema)
        .bind(RequestStatus::Pending.as_str())
        .bind(request.metodo_pago.as_str())
        .bind(costo_total)
        .bind(request.distancia_km)
        .bind(request.tipo_servicio_categoria.as_str())
        .fetch_one(&self.pool)
        .await?;

        let created = map_request(&row)?;
        info!(
            numero_orden = %created.numero_orden,
            cliente_id,
            "Service request stored"
        );
        Ok(created)
    }

    /// A customer's requests, newest first
    pub async fn list_for_customer(&self, cliente_id: i64) -> Result<Vec<ServiceRequest>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM service_requests
            WHERE cliente_id = $1
            ORDER BY fecha_solicitud DESC, id DESC
            "#
        ))
        .bind(cliente_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_request).collect()
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<ServiceRequest>> {
        let row = sqlx::query(&format!(
            "SELECT {REQUEST_COLUMNS} FROM service_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_request).transpose()
    }

    /// Move a request to `next` if the lifecycle allows it
    ///
    /// The write only applies while the row still holds the status that was
    /// checked. Entering `confirmada` stamps `fecha_confirmacion`.
    pub async fn update_status(
        &self,
        id: i64,
        next: RequestStatus,
    ) -> Result<ServiceRequest, StatusUpdateError> {
        let current = self
            .find_by_id(id)
            .await?
            .ok_or(StatusUpdateError::NotFound)?;

        current.estado.transition_to(next)?;

        let fecha_confirmacion = match next {
            RequestStatus::Confirmed => Some(Utc::now()),
            _ => current.fecha_confirmacion,
        };

        let row = sqlx::query(&format!(
            r#"
            UPDATE service_requests
            SET estado = $3, fecha_confirmacion = $4
            WHERE id = $1 AND estado = $2
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(current.estado.as_str())
        .bind(next.as_str())
        .bind(fecha_confirmacion)
        .fetch_optional(&self.pool)
        .await
        .map_err(anyhow::Error::from)?;

        let Some(row) = row else {
            return Err(StatusUpdateError::Conflict);
        };

        debug!(id, from = %current.estado, to = %next, "Service request status changed");
        Ok(map_request(&row)?)
    }
}
