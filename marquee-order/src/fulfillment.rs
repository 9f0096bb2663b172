use marquee_core::repository::TicketCodeGenerator;
use marquee_core::{CoreError, CoreResult};

/// Encodes a booking number into the scannable payload shown on the
/// confirmation page. The payload is what a gate scanner decodes; rendering
/// it as an actual QR image is a presentation concern that lives elsewhere.
#[derive(Default)]
pub struct BookingCodeGenerator;

impl BookingCodeGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl TicketCodeGenerator for BookingCodeGenerator {
    fn generate(&self, booking_number: &str) -> CoreResult<String> {
        if booking_number.trim().is_empty() {
            return Err(CoreError::Internal(
                "cannot encode an empty booking number".to_string(),
            ));
        }
        let payload = serde_json::json!({
            "format": "QR",
            "booking_number": booking_number,
        });
        serde_json::to_string(&payload)
            .map_err(|err| CoreError::Internal(format!("unable to generate ticket code: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_carries_the_booking_number() {
        let code = BookingCodeGenerator::new().generate("BK-1234").unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&code).unwrap();
        assert_eq!(parsed["booking_number"], "BK-1234");
        assert_eq!(parsed["format"], "QR");
    }

    #[test]
    fn blank_booking_number_is_an_internal_error() {
        let err = BookingCodeGenerator::new().generate("  ").unwrap_err();
        assert!(matches!(err, CoreError::Internal(_)));
    }
}
