//! Dynamic values carried through conversion expressions.
//!
//! A [`Value`] is the runtime form of every [`DataType`]: one variant per
//! primitive, `Structured` for named reference types and `Null` for the
//! absent sentinel shared by optional and reference types.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::ConvertError;
use crate::types::DataType;

/// Possible values flowing through a conversion.
///
/// # Examples
///
/// ```
/// use mapping_schema::{DataType, Value};
///
/// let v = Value::I32(42);
/// assert_eq!(v.cast(&DataType::I64).unwrap(), Value::I64(42));
/// assert!(Value::Null.cast(&DataType::I32).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// `bool`.
    Bool(bool),
    /// `i8`.
    I8(i8),
    /// `i16`.
    I16(i16),
    /// `i32`.
    I32(i32),
    /// `i64`.
    I64(i64),
    /// `u8`.
    U8(u8),
    /// `u16`.
    U16(u16),
    /// `u32`.
    U32(u32),
    /// `u64`.
    U64(u64),
    /// `f32`.
    F32(f32),
    /// `f64`.
    F64(f64),
    /// A string.
    String(String),
    /// A `chrono::NaiveDateTime`.
    DateTime(NaiveDateTime),
    /// A `chrono::DateTime<FixedOffset>`.
    DateTimeOffset(DateTime<FixedOffset>),
    /// An opaque structured payload.
    Structured(serde_json::Value),
    /// The absent sentinel.
    Null,
}

impl Value {
    /// Whether this is the absent sentinel.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The string payload, if any.
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// The boolean payload, if any.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns a human-readable kind name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::I8(_) => "i8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::String(_) => "string",
            Self::DateTime(_) => "date_time",
            Self::DateTimeOffset(_) => "date_time_offset",
            Self::Structured(_) => "structured",
            Self::Null => "null",
        }
    }

    /// Whether this value is a legal inhabitant of `ty`.
    #[must_use]
    pub fn fits(&self, ty: &DataType) -> bool {
        match (self, ty) {
            (Self::Null, ty) => ty.accepts_null(),
            (value, DataType::Optional(inner)) => value.fits(inner),
            (Self::Bool(_), DataType::Bool)
            | (Self::I8(_), DataType::I8)
            | (Self::I16(_), DataType::I16)
            | (Self::I32(_), DataType::I32)
            | (Self::I64(_), DataType::I64)
            | (Self::U8(_), DataType::U8)
            | (Self::U16(_), DataType::U16)
            | (Self::U32(_), DataType::U32)
            | (Self::U64(_), DataType::U64)
            | (Self::F32(_), DataType::F32)
            | (Self::F64(_), DataType::F64)
            | (Self::String(_), DataType::String)
            | (Self::DateTime(_), DataType::DateTime)
            | (Self::DateTimeOffset(_), DataType::DateTimeOffset)
            | (Self::Structured(_), DataType::Named(_)) => true,
            _ => false,
        }
    }

    /// Converts this value to `to` the way a cast node does.
    ///
    /// Wrapping into an optional keeps present values present and absent
    /// values absent. Unwrapping an absent optional fails. Numeric values
    /// are cast with `as` semantics.
    ///
    /// # Errors
    ///
    /// [`ConvertError::NullValue`] when an absent value meets a type that
    /// cannot hold it, [`ConvertError::TypeMismatch`] when no cast exists.
    pub fn cast(self, to: &DataType) -> Result<Self, ConvertError> {
        if let DataType::Optional(inner) = to {
            return if self.is_null() { Ok(self) } else { self.cast(inner) };
        }

        if self.is_null() {
            return if to.accepts_null() {
                Ok(self)
            } else {
                Err(ConvertError::NullValue { ty: to.clone() })
            };
        }

        if self.fits(to) {
            return Ok(self);
        }

        if to.is_numeric() {
            if let Some(cast) = self.cast_numeric(to) {
                return Ok(cast);
            }
        }

        if let (Self::DateTime(dt), DataType::DateTimeOffset) = (&self, to) {
            return Ok(Self::DateTimeOffset(dt.and_utc().fixed_offset()));
        }

        Err(ConvertError::TypeMismatch {
            expected: to.clone(),
            value_kind: self.type_name(),
        })
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    fn cast_numeric(&self, to: &DataType) -> Option<Self> {
        macro_rules! cast_to {
            ($v:expr) => {
                match to {
                    DataType::I8 => Self::I8($v as i8),
                    DataType::I16 => Self::I16($v as i16),
                    DataType::I32 => Self::I32($v as i32),
                    DataType::I64 => Self::I64($v as i64),
                    DataType::U8 => Self::U8($v as u8),
                    DataType::U16 => Self::U16($v as u16),
                    DataType::U32 => Self::U32($v as u32),
                    DataType::U64 => Self::U64($v as u64),
                    DataType::F32 => Self::F32($v as f32),
                    DataType::F64 => Self::F64($v as f64),
                    _ => return None,
                }
            };
        }

        let cast = match *self {
            Self::I8(v) => cast_to!(v),
            Self::I16(v) => cast_to!(v),
            Self::I32(v) => cast_to!(v),
            Self::I64(v) => cast_to!(v),
            Self::U8(v) => cast_to!(v),
            Self::U16(v) => cast_to!(v),
            Self::U32(v) => cast_to!(v),
            Self::U64(v) => cast_to!(v),
            Self::F32(v) => cast_to!(v),
            Self::F64(v) => cast_to!(v),
            _ => return None,
        };
        Some(cast)
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::I8(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::U8(v) => write!(f, "{v}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::DateTime(v) => write!(f, "{v}"),
            Self::DateTimeOffset(v) => write!(f, "{v}"),
            Self::Structured(v) => write!(f, "{v}"),
            Self::Null => write!(f, "null"),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Self::Structured(v)
    }
}
