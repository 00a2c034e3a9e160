//! Type coercion and by-name field mapping.

use crate::error::DecodeError;
use crate::schema::{FieldKind, FloatWidth, IntWidth, Scalar, Schema};

/// Outcome of mapping one raw field onto a record.
#[derive(Debug)]
pub enum FieldFailure {
    /// Schema mismatch; the whole decode must stop.
    Fatal(DecodeError),
    /// Bad value in this row only; record it and keep going.
    Coercion(String),
}

/// Convert `raw` into a scalar of `kind`.
///
/// Unsupported kinds are rejected by [`map_field`] before reaching here;
/// called directly they produce a coercion message.
pub fn coerce(raw: &str, kind: FieldKind) -> Result<Scalar, String> {
    match kind {
        FieldKind::Text => Ok(Scalar::Text(raw.to_string())),
        FieldKind::Signed(width) => parse_signed(raw, width).map(Scalar::Signed),
        FieldKind::Unsigned(width) => parse_unsigned(raw, width).map(Scalar::Unsigned),
        FieldKind::Float(width) => parse_float(raw, width).map(Scalar::Float),
        FieldKind::Bool => parse_bool(raw).map(Scalar::Bool),
        FieldKind::Unsupported(name) => Err(format!("no coercion for type {}", name)),
    }
}

fn parse_signed(raw: &str, width: IntWidth) -> Result<i64, String> {
    let parsed = match width {
        IntWidth::W8 => raw.parse::<i8>().map(i64::from),
        IntWidth::W16 => raw.parse::<i16>().map(i64::from),
        IntWidth::W32 => raw.parse::<i32>().map(i64::from),
        IntWidth::W64 => raw.parse::<i64>(),
    };
    parsed.map_err(|e| format!("cannot parse '{}' as i{}: {}", raw, width.bits(), e))
}

fn parse_unsigned(raw: &str, width: IntWidth) -> Result<u64, String> {
    if raw.starts_with('+') {
        return Err(format!("cannot parse '{}' as u{}: sign not allowed", raw, width.bits()));
    }
    let parsed = match width {
        IntWidth::W8 => raw.parse::<u8>().map(u64::from),
        IntWidth::W16 => raw.parse::<u16>().map(u64::from),
        IntWidth::W32 => raw.parse::<u32>().map(u64::from),
        IntWidth::W64 => raw.parse::<u64>(),
    };
    parsed.map_err(|e| format!("cannot parse '{}' as u{}: {}", raw, width.bits(), e))
}

fn parse_float(raw: &str, width: FloatWidth) -> Result<f64, String> {
    let parsed = match width {
        FloatWidth::F32 => raw.parse::<f32>().map(f64::from),
        FloatWidth::F64 => raw.parse::<f64>(),
    };
    let value =
        parsed.map_err(|e| format!("cannot parse '{}' as f{}: {}", raw, width.bits(), e))?;
    if !value.is_finite() && !is_non_finite_literal(raw) {
        return Err(format!("cannot parse '{}' as f{}: value out of range", raw, width.bits()));
    }
    Ok(value)
}

fn is_non_finite_literal(raw: &str) -> bool {
    let unsigned = raw.strip_prefix(&['+', '-'][..]).unwrap_or(raw);
    matches!(
        unsigned.to_ascii_lowercase().as_str(),
        "inf" | "infinity" | "nan"
    )
}

fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(format!("cannot parse '{}' as bool", raw)),
    }
}

/// Look up `name` on the schema and write the coerced `raw` value into
/// `record`.
pub fn map_field<R>(
    schema: &Schema<R>,
    record: &mut R,
    name: &str,
    raw: &str,
) -> Result<(), FieldFailure> {
    let def = schema.field(name).ok_or_else(|| {
        FieldFailure::Fatal(DecodeError::UnknownField {
            type_name: schema.type_name().to_string(),
            field: name.to_string(),
        })
    })?;

    let kind = def.kind();
    if !kind.is_supported() {
        return Err(FieldFailure::Fatal(DecodeError::UnsupportedType {
            field: name.to_string(),
            kind: kind.to_string(),
        }));
    }

    let value = coerce(raw, kind).map_err(FieldFailure::Coercion)?;
    if def.assign(record, value) {
        Ok(())
    } else {
        Err(FieldFailure::Fatal(DecodeError::UnsupportedType {
            field: name.to_string(),
            kind: kind.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Record;

    crate::wmic_record! {
        #[derive(Debug)]
        struct Probe {
            label: String => "Label",
            small: i8 => "Small",
            port: u16 => "Port",
            ratio: f32 => "Ratio",
            enabled: bool => "Enabled",
            items: Vec<u8> => "Items",
        }
    }

    #[test]
    fn test_signed_range_is_width_aware() {
        assert_eq!(
            coerce("127", FieldKind::Signed(IntWidth::W8)).unwrap(),
            Scalar::Signed(127)
        );
        assert!(coerce("128", FieldKind::Signed(IntWidth::W8)).is_err());
        assert_eq!(
            coerce("-9000000000", FieldKind::Signed(IntWidth::W64)).unwrap(),
            Scalar::Signed(-9_000_000_000)
        );
    }

    #[test]
    fn test_unsigned_rejects_negative_and_overflow() {
        assert!(coerce("-1", FieldKind::Unsigned(IntWidth::W32)).is_err());
        assert!(coerce("65536", FieldKind::Unsigned(IntWidth::W16)).is_err());
        assert_eq!(
            coerce("18446744073709551615", FieldKind::Unsigned(IntWidth::W64)).unwrap(),
            Scalar::Unsigned(u64::MAX)
        );
    }

    #[test]
    fn test_unsigned_rejects_plus_sign() {
        assert!(coerce("+5", FieldKind::Unsigned(IntWidth::W32)).is_err());
        assert!(coerce("+0", FieldKind::Unsigned(IntWidth::W8)).is_err());
        assert_eq!(
            coerce("+5", FieldKind::Signed(IntWidth::W32)).unwrap(),
            Scalar::Signed(5)
        );
    }

    #[test]
    fn test_float_overflow_is_an_error() {
        assert!(coerce("1e39", FieldKind::Float(FloatWidth::F32)).is_err());
        assert!(coerce("1e400", FieldKind::Float(FloatWidth::F64)).is_err());
        assert!(coerce("-1e400", FieldKind::Float(FloatWidth::F64)).is_err());
        assert_eq!(
            coerce("1e38", FieldKind::Float(FloatWidth::F32)).unwrap(),
            Scalar::Float(f64::from(1e38f32))
        );
    }

    #[test]
    fn test_float_non_finite_literals() {
        assert_eq!(
            coerce("+Inf", FieldKind::Float(FloatWidth::F64)).unwrap(),
            Scalar::Float(f64::INFINITY)
        );
        assert_eq!(
            coerce("-infinity", FieldKind::Float(FloatWidth::F32)).unwrap(),
            Scalar::Float(f64::NEG_INFINITY)
        );
        match coerce("NaN", FieldKind::Float(FloatWidth::F64)).unwrap() {
            Scalar::Float(n) => assert!(n.is_nan()),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_float_and_bool() {
        assert_eq!(
            coerce("2.5", FieldKind::Float(FloatWidth::F64)).unwrap(),
            Scalar::Float(2.5)
        );
        assert!(coerce("two", FieldKind::Float(FloatWidth::F32)).is_err());
        assert_eq!(coerce("TRUE", FieldKind::Bool).unwrap(), Scalar::Bool(true));
        assert_eq!(coerce("f", FieldKind::Bool).unwrap(), Scalar::Bool(false));
        assert!(coerce("yes", FieldKind::Bool).is_err());
    }

    #[test]
    fn test_text_is_verbatim() {
        assert_eq!(
            coerce(" a=b ", FieldKind::Text).unwrap(),
            Scalar::Text(" a=b ".to_string())
        );
    }

    #[test]
    fn test_map_field_sets_value() {
        let mut probe = Probe::default();
        map_field(Probe::schema(), &mut probe, "Port", "8080").unwrap();
        map_field(Probe::schema(), &mut probe, "Ratio", "0.5").unwrap();
        map_field(Probe::schema(), &mut probe, "Enabled", "True").unwrap();
        map_field(Probe::schema(), &mut probe, "Label", "eth0").unwrap();
        assert_eq!(probe.port, 8080);
        assert_eq!(probe.ratio, 0.5);
        assert!(probe.enabled);
        assert_eq!(probe.label, "eth0");
    }

    #[test]
    fn test_map_field_bad_value_is_recoverable() {
        let mut probe = Probe::default();
        let err = map_field(Probe::schema(), &mut probe, "Small", "300").unwrap_err();
        assert!(matches!(err, FieldFailure::Coercion(_)));
        assert_eq!(probe.small, 0);
    }

    #[test]
    fn test_map_field_unknown_name_is_fatal() {
        let mut probe = Probe::default();
        let err = map_field(Probe::schema(), &mut probe, "port", "1").unwrap_err();
        match err {
            FieldFailure::Fatal(DecodeError::UnknownField { field, .. }) => {
                assert_eq!(field, "port")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_map_field_unsupported_kind_is_fatal() {
        let mut probe = Probe::default();
        let err = map_field(Probe::schema(), &mut probe, "Items", "1,2").unwrap_err();
        match err {
            FieldFailure::Fatal(DecodeError::UnsupportedType { field, kind }) => {
                assert_eq!(field, "Items");
                assert_eq!(kind, "list");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
