//! IEC 61131 scalar values.

#![allow(missing_docs)]

use smol_str::SmolStr;

/// IEC 61131 scalar type codes.
///
/// The discriminants follow the PLCopen OPC UA information-model mapping
/// table order; derived, enumerated, subrange, array and struct types are
/// not representable here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum IecType {
    Any = 0,
    Bool,
    SInt,
    Int,
    DInt,
    LInt,
    USInt,
    UInt,
    UDInt,
    ULInt,
    Byte,
    Word,
    DWord,
    LWord,
    Date,
    TimeOfDay,
    DateAndTime,
    Time,
    Real,
    LReal,
    String,
    WString,
}

impl IecType {
    /// Number of supported scalar type codes.
    pub const COUNT: usize = 22;

    /// All supported scalar types, in type-code order.
    pub const ALL: [IecType; Self::COUNT] = [
        IecType::Any,
        IecType::Bool,
        IecType::SInt,
        IecType::Int,
        IecType::DInt,
        IecType::LInt,
        IecType::USInt,
        IecType::UInt,
        IecType::UDInt,
        IecType::ULInt,
        IecType::Byte,
        IecType::Word,
        IecType::DWord,
        IecType::LWord,
        IecType::Date,
        IecType::TimeOfDay,
        IecType::DateAndTime,
        IecType::Time,
        IecType::Real,
        IecType::LReal,
        IecType::String,
        IecType::WString,
    ];

    /// Numeric type code of this type.
    #[must_use]
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Look a type up by its numeric code, bounds-checked.
    #[must_use]
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }
}

/// Runtime representation of an IEC 61131 scalar value.
///
/// `Time` carries nanoseconds; the date/time kinds carry milliseconds since
/// the Unix epoch.
#[derive(Debug, Clone, PartialEq)]
pub enum IecValue {
    Bool(bool),

    SInt(i8),
    Int(i16),
    DInt(i32),
    LInt(i64),

    USInt(u8),
    UInt(u16),
    UDInt(u32),
    ULInt(u64),

    Byte(u8),
    Word(u16),
    DWord(u32),
    LWord(u64),

    Date(i64),
    TimeOfDay(i64),
    DateAndTime(i64),
    Time(i64),

    Real(f32),
    LReal(f64),

    String(SmolStr),
    WString(String),
}

impl IecValue {
    /// The type code of this value.
    #[must_use]
    pub fn iec_type(&self) -> IecType {
        match self {
            IecValue::Bool(_) => IecType::Bool,
            IecValue::SInt(_) => IecType::SInt,
            IecValue::Int(_) => IecType::Int,
            IecValue::DInt(_) => IecType::DInt,
            IecValue::LInt(_) => IecType::LInt,
            IecValue::USInt(_) => IecType::USInt,
            IecValue::UInt(_) => IecType::UInt,
            IecValue::UDInt(_) => IecType::UDInt,
            IecValue::ULInt(_) => IecType::ULInt,
            IecValue::Byte(_) => IecType::Byte,
            IecValue::Word(_) => IecType::Word,
            IecValue::DWord(_) => IecType::DWord,
            IecValue::LWord(_) => IecType::LWord,
            IecValue::Date(_) => IecType::Date,
            IecValue::TimeOfDay(_) => IecType::TimeOfDay,
            IecValue::DateAndTime(_) => IecType::DateAndTime,
            IecValue::Time(_) => IecType::Time,
            IecValue::Real(_) => IecType::Real,
            IecValue::LReal(_) => IecType::LReal,
            IecValue::String(_) => IecType::String,
            IecValue::WString(_) => IecType::WString,
        }
    }

    /// Initial value for a data point of the given type.
    ///
    /// `ANY` has no concrete default and yields `None`.
    #[must_use]
    pub fn default_for(ty: IecType) -> Option<Self> {
        let value = match ty {
            IecType::Any => return None,
            IecType::Bool => IecValue::Bool(false),
            IecType::SInt => IecValue::SInt(0),
            IecType::Int => IecValue::Int(0),
            IecType::DInt => IecValue::DInt(0),
            IecType::LInt => IecValue::LInt(0),
            IecType::USInt => IecValue::USInt(0),
            IecType::UInt => IecValue::UInt(0),
            IecType::UDInt => IecValue::UDInt(0),
            IecType::ULInt => IecValue::ULInt(0),
            IecType::Byte => IecValue::Byte(0),
            IecType::Word => IecValue::Word(0),
            IecType::DWord => IecValue::DWord(0),
            IecType::LWord => IecValue::LWord(0),
            IecType::Date => IecValue::Date(0),
            IecType::TimeOfDay => IecValue::TimeOfDay(0),
            IecType::DateAndTime => IecValue::DateAndTime(0),
            IecType::Time => IecValue::Time(0),
            IecType::Real => IecValue::Real(0.0),
            IecType::LReal => IecValue::LReal(0.0),
            IecType::String => IecValue::String(SmolStr::default()),
            IecType::WString => IecValue::WString(String::new()),
        };
        Some(value)
    }
}

impl From<bool> for IecValue {
    fn from(value: bool) -> Self {
        IecValue::Bool(value)
    }
}

impl From<i16> for IecValue {
    fn from(value: i16) -> Self {
        IecValue::Int(value)
    }
}

impl From<i32> for IecValue {
    fn from(value: i32) -> Self {
        IecValue::DInt(value)
    }
}

impl From<i64> for IecValue {
    fn from(value: i64) -> Self {
        IecValue::LInt(value)
    }
}

impl From<f32> for IecValue {
    fn from(value: f32) -> Self {
        IecValue::Real(value)
    }
}

impl From<f64> for IecValue {
    fn from(value: f64) -> Self {
        IecValue::LReal(value)
    }
}

impl From<&str> for IecValue {
    fn from(value: &str) -> Self {
        IecValue::String(SmolStr::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_codes_round_trip() {
        for ty in IecType::ALL {
            assert_eq!(IecType::from_code(ty.code()), Some(ty));
        }
        assert_eq!(IecType::from_code(IecType::COUNT as u16), None);
    }

    #[test]
    fn defaults_match_their_type() {
        for ty in IecType::ALL.into_iter().skip(1) {
            let value = IecValue::default_for(ty).expect("concrete default");
            assert_eq!(value.iec_type(), ty);
        }
        assert_eq!(IecValue::default_for(IecType::Any), None);
    }
}
