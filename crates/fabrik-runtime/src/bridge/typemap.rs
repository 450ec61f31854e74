//! IEC 61131 to OPC UA scalar type mapping.

use smol_str::SmolStr;

use crate::error::RuntimeError;
use crate::ua::{UaTypeId, UaVariant};
use crate::value::{IecType, IecValue};

/// Mapping per the PLCopen OPC UA information model, Table 26, indexed by
/// IEC type code.
const UA_TYPE_FOR_IEC: [UaTypeId; IecType::COUNT] = [
    UaTypeId::Variant,  // ANY
    UaTypeId::Boolean,  // BOOL
    UaTypeId::SByte,    // SINT
    UaTypeId::Int16,    // INT
    UaTypeId::Int32,    // DINT
    UaTypeId::Int64,    // LINT
    UaTypeId::Byte,     // USINT
    UaTypeId::UInt16,   // UINT
    UaTypeId::UInt32,   // UDINT
    UaTypeId::UInt64,   // ULINT
    UaTypeId::Byte,     // BYTE
    UaTypeId::UInt16,   // WORD
    UaTypeId::UInt32,   // DWORD
    UaTypeId::UInt64,   // LWORD
    UaTypeId::DateTime, // DATE
    UaTypeId::DateTime, // TIME_OF_DAY
    UaTypeId::DateTime, // DATE_AND_TIME
    UaTypeId::Double,   // TIME
    UaTypeId::Float,    // REAL
    UaTypeId::Double,   // LREAL
    UaTypeId::String,   // STRING
    UaTypeId::String,   // WSTRING
];

/// OPC UA builtin type for an IEC scalar type.
#[must_use]
pub fn ua_type_for(ty: IecType) -> UaTypeId {
    UA_TYPE_FOR_IEC[ty.code() as usize]
}

/// OPC UA builtin type for a raw IEC type code, bounds-checked.
///
/// Codes beyond the scalar table (derived, enumerated, subrange, array and
/// struct types) are unsupported.
pub fn ua_type_for_code(code: u16) -> Result<UaTypeId, RuntimeError> {
    UA_TYPE_FOR_IEC
        .get(code as usize)
        .copied()
        .ok_or(RuntimeError::UnsupportedType(code))
}

/// Convert an IEC scalar into the variant written to the address space.
///
/// `TIME` is carried as fractional milliseconds in a `Double`.
#[must_use]
pub fn ua_variant_for(value: &IecValue) -> UaVariant {
    match value {
        IecValue::Bool(v) => UaVariant::Boolean(*v),
        IecValue::SInt(v) => UaVariant::SByte(*v),
        IecValue::Int(v) => UaVariant::Int16(*v),
        IecValue::DInt(v) => UaVariant::Int32(*v),
        IecValue::LInt(v) => UaVariant::Int64(*v),
        IecValue::USInt(v) => UaVariant::Byte(*v),
        IecValue::UInt(v) => UaVariant::UInt16(*v),
        IecValue::UDInt(v) => UaVariant::UInt32(*v),
        IecValue::ULInt(v) => UaVariant::UInt64(*v),
        IecValue::Byte(v) => UaVariant::Byte(*v),
        IecValue::Word(v) => UaVariant::UInt16(*v),
        IecValue::DWord(v) => UaVariant::UInt32(*v),
        IecValue::LWord(v) => UaVariant::UInt64(*v),
        IecValue::Date(v) => UaVariant::DateTime(*v),
        IecValue::TimeOfDay(v) => UaVariant::DateTime(*v),
        IecValue::DateAndTime(v) => UaVariant::DateTime(*v),
        IecValue::Time(nanos) => UaVariant::Double(*nanos as f64 / 1_000_000.0),
        IecValue::Real(v) => UaVariant::Float(*v),
        IecValue::LReal(v) => UaVariant::Double(*v),
        IecValue::String(v) => UaVariant::String(v.clone()),
        IecValue::WString(v) => UaVariant::String(SmolStr::new(v)),
    }
}

/// Convert a variant back into an IEC scalar of the expected type.
///
/// Mismatched type tags are rejected, never coerced.
pub fn iec_value_from(variant: &UaVariant, expected: IecType) -> Result<IecValue, RuntimeError> {
    let value = match (expected, variant) {
        (IecType::Bool, UaVariant::Boolean(v)) => IecValue::Bool(*v),
        (IecType::SInt, UaVariant::SByte(v)) => IecValue::SInt(*v),
        (IecType::Int, UaVariant::Int16(v)) => IecValue::Int(*v),
        (IecType::DInt, UaVariant::Int32(v)) => IecValue::DInt(*v),
        (IecType::LInt, UaVariant::Int64(v)) => IecValue::LInt(*v),
        (IecType::USInt, UaVariant::Byte(v)) => IecValue::USInt(*v),
        (IecType::UInt, UaVariant::UInt16(v)) => IecValue::UInt(*v),
        (IecType::UDInt, UaVariant::UInt32(v)) => IecValue::UDInt(*v),
        (IecType::ULInt, UaVariant::UInt64(v)) => IecValue::ULInt(*v),
        (IecType::Byte, UaVariant::Byte(v)) => IecValue::Byte(*v),
        (IecType::Word, UaVariant::UInt16(v)) => IecValue::Word(*v),
        (IecType::DWord, UaVariant::UInt32(v)) => IecValue::DWord(*v),
        (IecType::LWord, UaVariant::UInt64(v)) => IecValue::LWord(*v),
        (IecType::Date, UaVariant::DateTime(v)) => IecValue::Date(*v),
        (IecType::TimeOfDay, UaVariant::DateTime(v)) => IecValue::TimeOfDay(*v),
        (IecType::DateAndTime, UaVariant::DateTime(v)) => IecValue::DateAndTime(*v),
        (IecType::Time, UaVariant::Double(ms)) => IecValue::Time((ms * 1_000_000.0) as i64),
        (IecType::Real, UaVariant::Float(v)) => IecValue::Real(*v),
        (IecType::LReal, UaVariant::Double(v)) => IecValue::LReal(*v),
        (IecType::String, UaVariant::String(v)) => IecValue::String(v.clone()),
        (IecType::WString, UaVariant::String(v)) => IecValue::WString(v.to_string()),
        _ => return Err(RuntimeError::TypeMismatch),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_scalar_maps_to_its_table_entry() {
        for ty in IecType::ALL.into_iter().skip(1) {
            let value = IecValue::default_for(ty).expect("concrete default");
            assert_eq!(ua_variant_for(&value).type_id(), ua_type_for(ty));
        }
    }

    #[test]
    fn any_maps_to_variant() {
        assert_eq!(ua_type_for(IecType::Any), UaTypeId::Variant);
    }

    #[test]
    fn codes_past_the_table_are_unsupported() {
        assert!(ua_type_for_code(IecType::COUNT as u16 - 1).is_ok());
        assert_eq!(
            ua_type_for_code(IecType::COUNT as u16),
            Err(RuntimeError::UnsupportedType(IecType::COUNT as u16))
        );
        assert!(ua_type_for_code(u16::MAX).is_err());
    }

    #[test]
    fn read_back_rejects_mismatched_tags() {
        assert_eq!(
            iec_value_from(&UaVariant::Int32(7), IecType::DInt),
            Ok(IecValue::DInt(7))
        );
        assert_eq!(
            iec_value_from(&UaVariant::Int32(7), IecType::Int),
            Err(RuntimeError::TypeMismatch)
        );
        assert_eq!(
            iec_value_from(&UaVariant::Boolean(true), IecType::DInt),
            Err(RuntimeError::TypeMismatch)
        );
    }

    #[test]
    fn time_travels_as_fractional_milliseconds() {
        let variant = ua_variant_for(&IecValue::Time(1_500_000));
        assert_eq!(variant, UaVariant::Double(1.5));
        assert_eq!(
            iec_value_from(&variant, IecType::Time),
            Ok(IecValue::Time(1_500_000))
        );
    }
}
