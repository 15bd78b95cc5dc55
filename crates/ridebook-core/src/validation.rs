//! # Input Validation
//!
//! Field checks for trip requests and sign-in credentials.
//!
//! ## Trip Request Checks
//! ```text
//! TripRequest ──► pickup / drop      non-blank, ≤ MAX_LOCATION_LEN
//!             ──► date + time        parse in service offset, not in the past
//!             ──► vehicle_class      enumerated (InvalidVehicleClass)
//!             ──► ValidatedTrip
//! ```
//!
//! "Not in the past" compares against the start of the current minute, so a
//! pickup time equal to the current `HH:MM` is accepted.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};

use crate::error::{CoreResult, ValidationError};
use crate::types::{TripRequest, ValidatedTrip, VehicleClass};
use crate::{MAX_LOCATION_LEN, MAX_SEARCH_LEN, MIN_PASSWORD_LEN, OTP_CODE_LEN};

/// Country code prepended to bare 10-digit mobile numbers.
const DEFAULT_COUNTRY_CODE: &str = "+91";

// =============================================================================
// Trip Fields
// =============================================================================

/// Trims a pickup or drop location and checks it is non-blank and bounded.
pub fn validate_location(field: &str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::required(field));
    }
    if trimmed.chars().count() > MAX_LOCATION_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_LOCATION_LEN,
        });
    }

    Ok(trimmed.to_string())
}

fn parse_date(date: &str) -> Result<NaiveDate, ValidationError> {
    let date = date.trim();
    if date.is_empty() {
        return Err(ValidationError::required("date"));
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| ValidationError::invalid_format("date", "expected YYYY-MM-DD"))
}

fn parse_time(time: &str) -> Result<NaiveTime, ValidationError> {
    let time = time.trim();
    if time.is_empty() {
        return Err(ValidationError::required("time"));
    }
    NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .map_err(|_| ValidationError::invalid_format("time", "expected HH:MM"))
}

/// Resolves a local pickup date and time to a UTC instant.
///
/// ## Errors
/// - `Required` / `InvalidFormat` for blank or malformed input
/// - `InPast` when the instant is before the start of `now`'s minute
pub fn parse_schedule(
    date: &str,
    time: &str,
    offset: FixedOffset,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, ValidationError> {
    let naive = parse_date(date)?.and_time(parse_time(time)?);

    let local = offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| ValidationError::invalid_format("time", "ambiguous local time"))?;
    let scheduled = local.with_timezone(&Utc);

    let minute_start = now
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now);

    if scheduled < minute_start {
        return Err(ValidationError::InPast {
            field: "scheduled_at".to_string(),
        });
    }

    Ok(scheduled)
}

/// Validates a whole trip request.
///
/// Field errors are reported before the vehicle class is looked at, so a form
/// with a blank pickup and an unknown class reports the pickup.
pub fn validate_trip_request(
    request: &TripRequest,
    offset: FixedOffset,
    now: DateTime<Utc>,
) -> CoreResult<ValidatedTrip> {
    let pickup = validate_location("pickup", &request.pickup)?;
    let drop = validate_location("drop", &request.drop)?;
    let scheduled_at = parse_schedule(&request.date, &request.time, offset, now)?;
    let vehicle_class: VehicleClass = request.vehicle_class.parse()?;

    Ok(ValidatedTrip {
        pickup,
        drop,
        scheduled_at,
        vehicle_class,
    })
}

/// Bounds the length of a dashboard search term. The term is returned as
/// typed; matching is a plain substring check.
pub fn validate_search_query(query: &str) -> Result<String, ValidationError> {
    if query.chars().count() > MAX_SEARCH_LEN {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: MAX_SEARCH_LEN,
        });
    }
    Ok(query.to_string())
}

// =============================================================================
// Credentials
// =============================================================================

/// Minimal shape check: one `@`, non-empty local part, dotted domain.
///
/// Returns the address lowercased.
pub fn validate_email(email: &str) -> Result<String, ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::required("email"));
    }

    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| ValidationError::invalid_format("email", "missing @"))?;

    let domain_ok = !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.');

    if local.is_empty() || !domain_ok || email.chars().any(char::is_whitespace) {
        return Err(ValidationError::invalid_format("email", "not an email address"));
    }

    Ok(email.to_lowercase())
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::required("password"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

/// Normalizes a phone number to E.164.
///
/// Spaces and dashes are dropped. A bare 10-digit number gets the default
/// country code, the way the sign-in form does it.
pub fn normalize_phone(phone: &str) -> Result<String, ValidationError> {
    let compact: String = phone
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();

    if compact.is_empty() {
        return Err(ValidationError::required("phone"));
    }

    let e164 = if compact.starts_with('+') {
        compact
    } else if compact.len() == 10 {
        format!("{}{}", DEFAULT_COUNTRY_CODE, compact)
    } else {
        return Err(ValidationError::invalid_format(
            "phone",
            "include the country code, e.g. +91XXXXXXXXXX",
        ));
    };

    validate_phone(&e164)?;
    Ok(e164)
}

/// Checks `+` followed by 8 to 15 digits.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits = phone
        .strip_prefix('+')
        .ok_or_else(|| ValidationError::invalid_format("phone", "must start with +"))?;

    if !(8..=15).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::invalid_format(
            "phone",
            "expected + followed by 8-15 digits",
        ));
    }
    Ok(())
}

/// Checks a one-time code is exactly `OTP_CODE_LEN` digits.
pub fn validate_otp_code(code: &str) -> Result<(), ValidationError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(ValidationError::required("code"));
    }
    if code.len() != OTP_CODE_LEN || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::invalid_format(
            "code",
            format!("expected {} digits", OTP_CODE_LEN),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(330 * 60).unwrap()
    }

    fn now() -> DateTime<Utc> {
        // 2026-03-01 10:30:45 IST
        Utc.with_ymd_and_hms(2026, 3, 1, 5, 0, 45).unwrap()
    }

    fn request() -> TripRequest {
        TripRequest {
            pickup: "  Haridwar  ".to_string(),
            drop: "Dehradun Airport".to_string(),
            date: "2026-03-02".to_string(),
            time: "10:00".to_string(),
            vehicle_class: "standard".to_string(),
        }
    }

    #[test]
    fn test_valid_trip() {
        let trip = validate_trip_request(&request(), ist(), now()).unwrap();
        assert_eq!(trip.pickup, "Haridwar");
        assert_eq!(trip.vehicle_class, VehicleClass::Standard);
        // 10:00 IST = 04:30 UTC
        assert_eq!(
            trip.scheduled_at,
            Utc.with_ymd_and_hms(2026, 3, 2, 4, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_blank_locations_rejected() {
        let req = TripRequest {
            pickup: "   ".to_string(),
            ..request()
        };
        assert!(matches!(
            validate_trip_request(&req, ist(), now()),
            Err(CoreError::Validation(ValidationError::Required { ref field })) if field == "pickup"
        ));

        let req = TripRequest {
            drop: String::new(),
            ..request()
        };
        assert!(validate_trip_request(&req, ist(), now()).is_err());

        let long = "x".repeat(MAX_LOCATION_LEN + 1);
        assert!(matches!(
            validate_location("drop", &long),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_unknown_vehicle_class() {
        let req = TripRequest {
            vehicle_class: "tuk-tuk".to_string(),
            ..request()
        };
        assert!(matches!(
            validate_trip_request(&req, ist(), now()),
            Err(CoreError::InvalidVehicleClass(_))
        ));
    }

    #[test]
    fn test_schedule_past_and_current_minute() {
        // Same minute as now (10:30 IST) is accepted
        assert!(parse_schedule("2026-03-01", "10:30", ist(), now()).is_ok());
        // One minute earlier is rejected
        assert!(matches!(
            parse_schedule("2026-03-01", "10:29", ist(), now()),
            Err(ValidationError::InPast { .. })
        ));
        assert!(matches!(
            parse_schedule("2025-12-31", "23:59", ist(), now()),
            Err(ValidationError::InPast { .. })
        ));
    }

    #[test]
    fn test_schedule_formats() {
        assert!(parse_schedule("2026-03-02", "09:15:30", ist(), now()).is_ok());
        assert!(matches!(
            parse_schedule("02/03/2026", "09:15", ist(), now()),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            parse_schedule("2026-03-02", "9am", ist(), now()),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            parse_schedule("", "09:15", ist(), now()),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_search_query() {
        assert_eq!(validate_search_query("  abc ").unwrap(), "  abc ");
        assert!(validate_search_query(&"q".repeat(MAX_SEARCH_LEN + 1)).is_err());
    }

    #[test]
    fn test_email() {
        assert_eq!(validate_email(" Rider@Example.com ").unwrap(), "rider@example.com");
        assert!(validate_email("").is_err());
        assert!(validate_email("rider.example.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("rider@localhost").is_err());
        assert!(validate_email("a@b@c.com").is_err());
    }

    #[test]
    fn test_password() {
        assert!(validate_password("secret").is_ok());
        assert!(matches!(
            validate_password("abc"),
            Err(ValidationError::TooShort { min: 6, .. })
        ));
        assert!(validate_password("").is_err());
    }

    #[test]
    fn test_phone() {
        assert_eq!(normalize_phone("98765 43210").unwrap(), "+919876543210");
        assert_eq!(normalize_phone("+1-415-555-0100").unwrap(), "+14155550100");
        assert!(normalize_phone("12345").is_err());
        assert!(normalize_phone("").is_err());
        assert!(validate_phone("+12").is_err());
        assert!(validate_phone("+91abc").is_err());
    }

    #[test]
    fn test_otp_code() {
        assert!(validate_otp_code("123456").is_ok());
        assert!(validate_otp_code("12345").is_err());
        assert!(validate_otp_code("12a456").is_err());
    }
}
