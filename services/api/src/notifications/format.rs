//! Admin notification templates
//!
//! Pure text formatting. Every field is optional; missing or blank values
//! render as placeholder text. Output is Telegram HTML, so interpolated
//! values are escaped.

use crate::models::ServiceCategory;

/// Flat set of values interpolated into a notification
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationFields {
    pub numero_orden: Option<String>,
    pub nombre: Option<String>,
    pub username: Option<String>,
    pub marca_vehiculo: Option<String>,
    pub modelo_vehiculo: Option<String>,
    pub tipo_vehiculo: Option<String>,
    pub direccion_origen: Option<String>,
    pub direccion_destino: Option<String>,
    pub costo_total: Option<i64>,
    pub metodo_pago: Option<String>,
    pub fecha_servicio: Option<String>,
    pub estado: Option<String>,
    pub tipo_problema: Option<String>,
    pub comentarios: Option<String>,
    pub admin_url: Option<String>,
}

/// Escaped value, or the placeholder when absent or blank
fn value_or(value: &Option<String>, placeholder: &str) -> String {
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => escape_html(text),
        _ => placeholder.to_string(),
    }
}

/// Title-cased escaped value, or the title-cased placeholder
fn titled(value: &Option<String>, placeholder: &str) -> String {
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => escape_html(&title_case(text)),
        _ => title_case(placeholder),
    }
}

/// Escape the characters Telegram's HTML parse mode treats as markup
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Integer with comma thousands separators
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// Capitalise the first letter of every word, lowercase the rest
pub fn title_case(text: &str) -> String {
    let mut titled = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                titled.extend(c.to_uppercase());
            } else {
                titled.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            titled.push(c);
            at_word_start = true;
        }
    }
    titled
}

fn header(fields: &NotificationFields, service: &str) -> Vec<String> {
    vec![
        "🚨 <b>NUEVA SOLICITUD URGENTE</b>".to_string(),
        "🆔 <b>Orden:</b>".to_string(),
        value_or(&fields.numero_orden, "No disponible"),
        format!("🔧 <b>Servicio:</b> {}", service),
        String::new(),
        format!("👤 <b>Cliente:</b> {}", value_or(&fields.nombre, "No especificado")),
        format!("📱 <b>Usuario:</b> @{}", value_or(&fields.username, "No especificado")),
        format!(
            "🚗 <b>Vehículo:</b> {} {}",
            value_or(&fields.marca_vehiculo, ""),
            value_or(&fields.modelo_vehiculo, "")
        )
        .trim_end()
        .to_string(),
        format!("🔧 <b>Tipo:</b> {}", value_or(&fields.tipo_vehiculo, "No especificado")),
    ]
}

fn billing(fields: &NotificationFields) -> Vec<String> {
    let metodo_pago = titled(&fields.metodo_pago, "No especificado");
    let estado = titled(&fields.estado, "Pendiente");

    vec![
        String::new(),
        format!(
            "💰 <b>Valor:</b> ${}",
            group_thousands(fields.costo_total.unwrap_or(0))
        ),
        format!("💳 <b>Pago:</b> {}", metodo_pago),
        format!(
            "⏰ <b>Fecha Servicio:</b> {}",
            value_or(&fields.fecha_servicio, "No especificada")
        ),
        format!("📋 <b>Estado:</b> {}", estado),
        String::new(),
    ]
}

fn footer(fields: &NotificationFields) -> Vec<String> {
    vec![
        String::new(),
        format!(
            "🔗 <a href=\"{}\">Ver en Admin</a>",
            value_or(&fields.admin_url, "#")
        ),
    ]
}

/// Message for a towing request
pub fn format_towing_notification(fields: &NotificationFields) -> String {
    let mut lines = header(fields, "SERVICIO DE GRÚA");
    lines.push(format!(
        "📍 <b>Origen:</b> {}",
        value_or(&fields.direccion_origen, "No especificada")
    ));
    lines.push(format!(
        "🎯 <b>Destino:</b> {}",
        value_or(&fields.direccion_destino, "No especificado")
    ));
    lines.extend(billing(fields));
    lines.push(format!(
        "📝 <b>Problema:</b> {}",
        value_or(&fields.comentarios, "Solicitud de servicio de grúa")
    ));
    lines.extend(footer(fields));
    lines.join("\n")
}

/// Message for a mechanical-assistance request
pub fn format_assistance_notification(fields: &NotificationFields) -> String {
    let mut lines = header(fields, "ASISTENCIA MECÁNICA");
    lines.push(format!(
        "📍 <b>Origen:</b> {}",
        value_or(&fields.direccion_origen, "No especificada")
    ));
    lines.extend(billing(fields));
    lines.push(format!(
        "📝 <b>Problema:</b> {} - {}",
        value_or(&fields.tipo_problema, "No especificado"),
        value_or(&fields.comentarios, "Sin comentarios")
    ));
    lines.extend(footer(fields));
    lines.join("\n")
}

/// Pick the template matching the request category
pub fn format_notification(category: ServiceCategory, fields: &NotificationFields) -> String {
    match category {
        ServiceCategory::Towing => format_towing_notification(fields),
        ServiceCategory::Assistance => format_assistance_notification(fields),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_fields() -> NotificationFields {
        NotificationFields {
            numero_orden: Some("GR20250301143000AB12CD34".to_string()),
            nombre: Some("Juan Pérez".to_string()),
            username: Some("jperez".to_string()),
            marca_vehiculo: Some("Toyota".to_string()),
            modelo_vehiculo: Some("Yaris".to_string()),
            tipo_vehiculo: Some("auto".to_string()),
            direccion_origen: Some("Av. Providencia 123".to_string()),
            direccion_destino: Some("Taller Central".to_string()),
            costo_total: Some(1_234_567),
            metodo_pago: Some("efectivo".to_string()),
            fecha_servicio: Some("01/03/2025 14:30".to_string()),
            estado: Some("pendiente".to_string()),
            tipo_problema: Some("Batería".to_string()),
            comentarios: Some("No arranca".to_string()),
            admin_url: Some("https://admin.example/solicitud/1/".to_string()),
        }
    }

    #[test]
    fn test_towing_template() {
        let message = format_towing_notification(&full_fields());
        let expected = [
            "🚨 <b>NUEVA SOLICITUD URGENTE</b>",
            "🆔 <b>Orden:</b>",
            "GR20250301143000AB12CD34",
            "🔧 <b>Servicio:</b> SERVICIO DE GRÚA",
            "",
            "👤 <b>Cliente:</b> Juan Pérez",
            "📱 <b>Usuario:</b> @jperez",
            "🚗 <b>Vehículo:</b> Toyota Yaris",
            "🔧 <b>Tipo:</b> auto",
            "📍 <b>Origen:</b> Av. Providencia 123",
            "🎯 <b>Destino:</b> Taller Central",
            "",
            "💰 <b>Valor:</b> $1,234,567",
            "💳 <b>Pago:</b> Efectivo",
            "⏰ <b>Fecha Servicio:</b> 01/03/2025 14:30",
            "📋 <b>Estado:</b> Pendiente",
            "",
            "📝 <b>Problema:</b> No arranca",
            "",
            "🔗 <a href=\"https://admin.example/solicitud/1/\">Ver en Admin</a>",
        ]
        .join("\n");
        assert_eq!(message, expected);
    }

    #[test]
    fn test_assistance_template_has_no_destination() {
        let message = format_assistance_notification(&full_fields());
        assert!(message.contains("🔧 <b>Servicio:</b> ASISTENCIA MECÁNICA"));
        assert!(!message.contains("Destino"));
        assert!(message.contains("📝 <b>Problema:</b> Batería - No arranca"));
    }

    #[test]
    fn test_missing_fields_render_placeholders() {
        let message = format_towing_notification(&NotificationFields::default());
        assert!(message.contains("🆔 <b>Orden:</b>\nNo disponible"));
        assert!(message.contains("👤 <b>Cliente:</b> No especificado"));
        assert!(message.contains("🚗 <b>Vehículo:</b>\n"));
        assert!(message.contains("📍 <b>Origen:</b> No especificada"));
        assert!(message.contains("🎯 <b>Destino:</b> No especificado"));
        assert!(message.contains("💰 <b>Valor:</b> $0"));
        assert!(message.contains("💳 <b>Pago:</b> No Especificado"));
        assert!(message.contains("⏰ <b>Fecha Servicio:</b> No especificada"));
        assert!(message.contains("📋 <b>Estado:</b> Pendiente"));
        assert!(message.contains("📝 <b>Problema:</b> Solicitud de servicio de grúa"));
        assert!(message.contains("<a href=\"#\">"));

        let message = format_assistance_notification(&NotificationFields::default());
        assert!(message.contains("📝 <b>Problema:</b> No especificado - Sin comentarios"));
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let fields = NotificationFields {
            nombre: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(format_towing_notification(&fields).contains("Cliente:</b> No especificado"));
    }

    #[test]
    fn test_user_text_is_escaped() {
        let fields = NotificationFields {
            comentarios: Some("<b>ruido</b> & humo".to_string()),
            ..full_fields()
        };
        let message = format_towing_notification(&fields);
        assert!(message.contains("&lt;b&gt;ruido&lt;/b&gt; &amp; humo"));
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(10000), "10,000");
        assert_eq!(group_thousands(123456789), "123,456,789");
        assert_eq!(group_thousands(-8000), "-8,000");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("efectivo"), "Efectivo");
        assert_eq!(title_case("en_proceso"), "En_Proceso");
        assert_eq!(title_case("MERCADO pago"), "Mercado Pago");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_format_notification_dispatches_on_category() {
        let fields = full_fields();
        assert_eq!(
            format_notification(ServiceCategory::Towing, &fields),
            format_towing_notification(&fields)
        );
        assert_eq!(
            format_notification(ServiceCategory::Assistance, &fields),
            format_assistance_notification(&fields)
        );
    }
}
