//! Input validation utilities
//!
//! Validators collect every problem into a [`FieldErrors`] map keyed by field
//! name instead of stopping at the first one.

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::models::{CreateServiceRequest, NewServiceRequest, NewUser, ServiceCategory};

pub const REQUIRED: &str = "Este campo es requerido.";
pub const BLANK: &str = "Este campo no puede estar en blanco.";

const ADDRESS_MAX_LEN: usize = 255;
const VEHICLE_FIELD_MAX_LEN: usize = 50;
const PLATE_MAX_LEN: usize = 10;
const NAME_MAX_LEN: usize = 150;
const PHONE_MAX_LEN: usize = 20;
const DISTANCE_MAX_DECIMALS: u32 = 2;

/// Per-field validation messages
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Ok(value)` when no error was recorded
    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

#[cfg(test)]
impl FieldErrors {
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }
}

fn max_length_message(max: usize) -> String {
    format!("Asegúrese de que este campo no tenga más de {} caracteres.", max)
}

fn invalid_choice_message(value: &str) -> String {
    format!("\"{}\" no es una elección válida.", value)
}

/// Trimmed, non-blank text bounded by `max` characters
fn required_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    max: usize,
) -> String {
    match value.as_deref().map(str::trim) {
        None => {
            errors.add(field, REQUIRED);
            String::new()
        }
        Some("") => {
            errors.add(field, BLANK);
            String::new()
        }
        Some(text) => {
            if text.chars().count() > max {
                errors.add(field, max_length_message(max));
            }
            text.to_string()
        }
    }
}

/// Trimmed text, empty when absent
fn optional_text(errors: &mut FieldErrors, field: &str, value: Option<String>, max: usize) -> String {
    let text = value.as_deref().map(str::trim).unwrap_or_default();
    if text.chars().count() > max {
        errors.add(field, max_length_message(max));
    }
    text.to_string()
}

fn required_choice<T: FromStr>(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
) -> Option<T> {
    match value.as_deref().map(str::trim) {
        None | Some("") => {
            errors.add(field, REQUIRED);
            None
        }
        Some(text) => match text.parse() {
            Ok(choice) => Some(choice),
            Err(_) => {
                errors.add(field, invalid_choice_message(text));
                None
            }
        },
    }
}

/// Distance in kilometres; accepts JSON numbers and numeric strings
pub fn parse_distance(value: Option<&serde_json::Value>) -> Result<Option<Decimal>, String> {
    let raw = match value {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(serde_json::Value::String(s)) => s.trim().to_string(),
        Some(_) => return Err("Se requiere un número válido.".to_string()),
    };

    let distance = Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map_err(|_| "Se requiere un número válido.".to_string())?;

    if distance.is_sign_negative() && !distance.is_zero() {
        return Err("Asegúrese de que este valor sea mayor o igual a 0.".to_string());
    }
    if distance > Decimal::new(999_999, 2) {
        return Err("Asegúrese de que este valor sea menor o igual a 9999.99.".to_string());
    }
    if distance.normalize().scale() > DISTANCE_MAX_DECIMALS {
        return Err(format!(
            "Asegúrese de que no haya más de {} decimales.",
            DISTANCE_MAX_DECIMALS
        ));
    }

    Ok(Some(distance))
}

/// Service date; RFC 3339, or a naive timestamp taken as UTC
pub fn parse_service_date(value: &str) -> Result<DateTime<Utc>, String> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| "Formato de fecha y hora incorrecto.".to_string())
}

/// Validate a service request submission
pub fn validate_service_request(
    payload: CreateServiceRequest,
) -> Result<NewServiceRequest, FieldErrors> {
    let mut errors = FieldErrors::default();

    let categoria = match payload.tipo_servicio_categoria.as_deref().map(str::trim) {
        None | Some("") => ServiceCategory::default(),
        Some(text) => text.parse().unwrap_or_else(|_| {
            errors.add("tipo_servicio_categoria", invalid_choice_message(text));
            ServiceCategory::default()
        }),
    };

    let direccion_origen = required_text(
        &mut errors,
        "direccion_origen",
        payload.direccion_origen,
        ADDRESS_MAX_LEN,
    );
    let direccion_destino = match categoria {
        ServiceCategory::Towing => required_text(
            &mut errors,
            "direccion_destino",
            payload.direccion_destino,
            ADDRESS_MAX_LEN,
        ),
        ServiceCategory::Assistance => optional_text(
            &mut errors,
            "direccion_destino",
            payload.direccion_destino,
            ADDRESS_MAX_LEN,
        ),
    };

    let tipo_vehiculo = required_choice(&mut errors, "tipo_vehiculo", payload.tipo_vehiculo);
    let metodo_pago = required_choice(&mut errors, "metodo_pago", payload.metodo_pago);

    let marca_vehiculo = required_text(
        &mut errors,
        "marca_vehiculo",
        payload.marca_vehiculo,
        VEHICLE_FIELD_MAX_LEN,
    );
    let modelo_vehiculo = required_text(
        &mut errors,
        "modelo_vehiculo",
        payload.modelo_vehiculo,
        VEHICLE_FIELD_MAX_LEN,
    );
    let placa_vehiculo = optional_text(
        &mut errors,
        "placa_vehiculo",
        payload.placa_vehiculo,
        PLATE_MAX_LEN,
    )
    .to_uppercase();
    let descripcion_problema = payload
        .descripcion_problema
        .map(|text| text.trim().to_string())
        .unwrap_or_default();

    let distancia_km = parse_distance(payload.distancia_km.as_ref()).unwrap_or_else(|message| {
        errors.add("distancia_km", message);
        None
    });

    let fecha_servicio = match payload.fecha_servicio.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(text) => parse_service_date(text)
            .map_err(|message| errors.add("fecha_servicio", message))
            .ok(),
    };

    match (tipo_vehiculo, metodo_pago) {
        (Some(tipo_vehiculo), Some(metodo_pago)) => errors.into_result(NewServiceRequest {
            direccion_origen,
            direccion_destino,
            fecha_servicio,
            tipo_vehiculo,
            marca_vehiculo,
            modelo_vehiculo,
            placa_vehiculo,
            descripcion_problema,
            metodo_pago,
            distancia_km,
            tipo_servicio_categoria: categoria,
        }),
        _ => Err(errors),
    }
}

/// Validate username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err(REQUIRED.to_string());
    }

    if username.chars().count() > NAME_MAX_LEN {
        return Err(max_length_message(NAME_MAX_LEN));
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[\w.@+-]+$").expect("Failed to compile username regex"));

    if !regex.is_match(username) {
        return Err(
            "Ingrese un nombre de usuario válido. Solo letras, números y los caracteres @/./+/-/_."
                .to_string(),
        );
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err(REQUIRED.to_string());
    }

    if email.len() > 254 {
        return Err(max_length_message(254));
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Introduzca una dirección de correo electrónico válida.".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str, username: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err(REQUIRED.to_string());
    }

    if password.chars().count() < 8 {
        return Err("La contraseña debe tener al menos 8 caracteres.".to_string());
    }

    if password.chars().count() > 128 {
        return Err(max_length_message(128));
    }

    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err("La contraseña no puede ser completamente numérica.".to_string());
    }

    if !username.is_empty() && password.to_lowercase().contains(&username.to_lowercase()) {
        return Err("La contraseña es demasiado similar al nombre de usuario.".to_string());
    }

    Ok(())
}

/// Validate phone number; empty is allowed
pub fn validate_phone(phone: &str) -> Result<(), String> {
    if phone.chars().count() > PHONE_MAX_LEN {
        return Err(max_length_message(PHONE_MAX_LEN));
    }

    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = PHONE_REGEX
        .get_or_init(|| Regex::new(r"^\+?[0-9 ()-]*$").expect("Failed to compile phone regex"));

    if !regex.is_match(phone) {
        return Err("Introduzca un número de teléfono válido.".to_string());
    }

    Ok(())
}

/// Registration body
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub telefono: Option<String>,
}

/// Validate a registration, returning the user to create and the phone number
pub fn validate_registration(payload: RegisterRequest) -> Result<(NewUser, String), FieldErrors> {
    let mut errors = FieldErrors::default();

    let username = payload.username.unwrap_or_default().trim().to_string();
    if let Err(message) = validate_username(&username) {
        errors.add("username", message);
    }

    let email = payload.email.unwrap_or_default().trim().to_lowercase();
    if let Err(message) = validate_email(&email) {
        errors.add("email", message);
    }

    let password = payload.password.unwrap_or_default();
    if let Err(message) = validate_password(&password, &username) {
        errors.add("password", message);
    }

    let first_name = optional_text(&mut errors, "first_name", payload.first_name, NAME_MAX_LEN);
    let last_name = optional_text(&mut errors, "last_name", payload.last_name, NAME_MAX_LEN);

    let telefono = payload.telefono.unwrap_or_default().trim().to_string();
    if let Err(message) = validate_phone(&telefono) {
        errors.add("telefono", message);
    }

    errors.into_result((
        NewUser {
            username,
            email,
            first_name,
            last_name,
            password,
        },
        telefono,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaymentMethod, VehicleType};
    use serde_json::json;

    fn towing_payload() -> CreateServiceRequest {
        serde_json::from_value(json!({
            "direccion_origen": "A",
            "direccion_destino": "B",
            "distancia_km": 10,
            "tipo_vehiculo": "auto",
            "marca_vehiculo": "Toyota",
            "modelo_vehiculo": "Yaris",
            "metodo_pago": "efectivo"
        }))
        .unwrap()
    }

    #[test]
    fn test_valid_towing_request() {
        let request = validate_service_request(towing_payload()).unwrap();
        assert_eq!(request.tipo_vehiculo, VehicleType::Car);
        assert_eq!(request.metodo_pago, PaymentMethod::Cash);
        assert_eq!(request.distancia_km, Some(Decimal::from(10)));
        assert_eq!(request.tipo_servicio_categoria, ServiceCategory::Towing);
        assert_eq!(request.placa_vehiculo, "");
        assert_eq!(request.fecha_servicio, None);
    }

    #[test]
    fn test_empty_payload_lists_every_required_field() {
        let errors = validate_service_request(CreateServiceRequest::default()).unwrap_err();
        for field in [
            "direccion_origen",
            "direccion_destino",
            "tipo_vehiculo",
            "marca_vehiculo",
            "modelo_vehiculo",
            "metodo_pago",
        ] {
            assert_eq!(errors.get(field), Some(&[REQUIRED.to_string()][..]), "{field}");
        }
        assert!(!errors.contains("distancia_km"));
    }

    #[test]
    fn test_assistance_does_not_need_destination() {
        let payload = CreateServiceRequest {
            direccion_destino: None,
            tipo_servicio_categoria: Some("asistencia".to_string()),
            ..towing_payload()
        };
        let request = validate_service_request(payload).unwrap();
        assert_eq!(request.tipo_servicio_categoria, ServiceCategory::Assistance);
        assert_eq!(request.direccion_destino, "");
    }

    #[test]
    fn test_invalid_choices_and_blank_fields() {
        let payload = CreateServiceRequest {
            tipo_vehiculo: Some("camion".to_string()),
            metodo_pago: Some("bitcoin".to_string()),
            marca_vehiculo: Some("   ".to_string()),
            ..towing_payload()
        };
        let errors = validate_service_request(payload).unwrap_err();
        assert_eq!(
            errors.get("tipo_vehiculo").unwrap()[0],
            "\"camion\" no es una elección válida."
        );
        assert!(errors.contains("metodo_pago"));
        assert_eq!(errors.get("marca_vehiculo").unwrap()[0], BLANK);
    }

    #[test]
    fn test_plate_is_bounded_and_uppercased() {
        let payload = CreateServiceRequest {
            placa_vehiculo: Some(" ab-cd 12 ".to_string()),
            ..towing_payload()
        };
        assert_eq!(validate_service_request(payload).unwrap().placa_vehiculo, "AB-CD 12");

        let payload = CreateServiceRequest {
            placa_vehiculo: Some("ABCDEFGHIJK".to_string()),
            ..towing_payload()
        };
        assert!(validate_service_request(payload).unwrap_err().contains("placa_vehiculo"));
    }

    #[test]
    fn test_distance_parsing() {
        assert_eq!(parse_distance(None), Ok(None));
        assert_eq!(parse_distance(Some(&json!(null))), Ok(None));
        assert_eq!(parse_distance(Some(&json!(""))), Ok(None));
        assert_eq!(parse_distance(Some(&json!(12.5))), Ok(Some(Decimal::new(125, 1))));
        assert_eq!(parse_distance(Some(&json!("7.25"))), Ok(Some(Decimal::new(725, 2))));
        assert_eq!(parse_distance(Some(&json!(0))), Ok(Some(Decimal::ZERO)));
        assert!(parse_distance(Some(&json!(-1))).is_err());
        assert!(parse_distance(Some(&json!("diez"))).is_err());
        assert!(parse_distance(Some(&json!(true))).is_err());
        assert!(parse_distance(Some(&json!(10000))).is_err());
        assert!(parse_distance(Some(&json!("1.234"))).is_err());
    }

    #[test]
    fn test_service_date_formats() {
        let from_app = parse_service_date("2025-03-01T14:30:00.000Z").unwrap();
        assert_eq!(from_app.to_rfc3339(), "2025-03-01T14:30:00+00:00");

        let with_offset = parse_service_date("2025-03-01T11:30:00-03:00").unwrap();
        assert_eq!(with_offset, from_app);

        assert_eq!(parse_service_date("2025-03-01T14:30").unwrap(), from_app);
        assert!(parse_service_date("mañana").is_err());

        let payload = CreateServiceRequest {
            fecha_servicio: Some("ayer".to_string()),
            ..towing_payload()
        };
        assert!(validate_service_request(payload).unwrap_err().contains("fecha_servicio"));
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("jperez").is_ok());
        assert!(validate_username("j.perez+grua@cl").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("juan perez").is_err());
        assert!(validate_username(&"a".repeat(151)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("cliente@gruastyle.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("cliente@").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("Remolque2024", "jperez").is_ok());
        assert!(validate_password("corta", "jperez").is_err());
        assert!(validate_password("12345678", "jperez").is_err());
        assert!(validate_password("xxJPEREZxx", "jperez").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("").is_ok());
        assert!(validate_phone("+56 9 1234 5678").is_ok());
        assert!(validate_phone("llámame").is_err());
        assert!(validate_phone(&"9".repeat(21)).is_err());
    }

    #[test]
    fn test_registration_collects_all_problems() {
        let errors = validate_registration(RegisterRequest {
            username: Some("con espacio".to_string()),
            email: Some("no-email".to_string()),
            password: Some("123".to_string()),
            ..Default::default()
        })
        .unwrap_err();

        assert!(errors.contains("username"));
        assert!(errors.contains("email"));
        assert!(errors.contains("password"));
        assert!(!errors.contains("telefono"));
    }

    #[test]
    fn test_registration_defaults_phone_to_empty() {
        let (user, telefono) = validate_registration(RegisterRequest {
            username: Some("mgonzalez".to_string()),
            email: Some("M.Gonzalez@Example.com".to_string()),
            password: Some("Remolque2024".to_string()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(telefono, "");
        assert_eq!(user.email, "m.gonzalez@example.com");
        assert_eq!(user.first_name, "");
    }
}
