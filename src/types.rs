//! Runtime type descriptors.
//!
//! Conversions are keyed by a pair of [`DataType`]s discovered at runtime.
//! The [`Mappable`] trait bridges statically known Rust types to those
//! descriptors and to the dynamic [`Value`] representation.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::ConvertError;
use crate::value::Value;

/// A type the conversion engine can reason about.
///
/// # Examples
///
/// ```
/// use mapping_schema::DataType;
///
/// let nullable = DataType::optional(DataType::I32);
/// assert!(nullable.is_optional());
/// assert_eq!(nullable.underlying(), &DataType::I32);
///
/// // Reference types are nullable on their own and are never wrapped.
/// assert_eq!(DataType::optional(DataType::String), DataType::String);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "of", rename_all = "snake_case")]
pub enum DataType {
    /// `bool`.
    Bool,
    /// `i8`.
    I8,
    /// `i16`.
    I16,
    /// `i32`.
    I32,
    /// `i64`.
    I64,
    /// `u8`.
    U8,
    /// `u16`.
    U16,
    /// `u32`.
    U32,
    /// `u64`.
    U64,
    /// `f32`.
    F32,
    /// `f64`.
    F64,
    /// UTF-8 string; absent strings are null.
    String,
    /// Date and time without offset.
    DateTime,
    /// Date and time with a fixed UTC offset.
    DateTimeOffset,
    /// An application reference type, identified by name.
    Named(String),
    /// Nullable wrapper around a value type.
    Optional(Box<DataType>),
}

impl DataType {
    /// Wraps a value type into its optional form.
    ///
    /// Reference types and already optional types are returned unchanged.
    #[must_use]
    pub fn optional(inner: Self) -> Self {
        if inner.is_optional() || inner.is_reference() {
            inner
        } else {
            Self::Optional(Box::new(inner))
        }
    }

    /// Creates a named reference type.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Whether this is the optional wrapper.
    pub const fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_))
    }

    /// Reference-like types may hold the absent sentinel without being optional.
    pub const fn is_reference(&self) -> bool {
        matches!(self, Self::String | Self::Named(_))
    }

    /// Value types that can never be absent.
    pub const fn is_primitive(&self) -> bool {
        !self.is_optional() && !self.is_reference()
    }

    /// Signed and unsigned integer types.
    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::I8 | Self::I16 | Self::I32 | Self::I64 | Self::U8 | Self::U16 | Self::U32 | Self::U64
        )
    }

    /// Floating-point types.
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Integer and floating-point types.
    pub const fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Whether a value of this type can be absent.
    pub const fn accepts_null(&self) -> bool {
        self.is_optional() || self.is_reference()
    }

    /// The type with one optional wrapper removed, or `self` otherwise.
    #[must_use]
    pub fn underlying(&self) -> &Self {
        match self {
            Self::Optional(inner) => inner,
            other => other,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::I8 => write!(f, "i8"),
            Self::I16 => write!(f, "i16"),
            Self::I32 => write!(f, "i32"),
            Self::I64 => write!(f, "i64"),
            Self::U8 => write!(f, "u8"),
            Self::U16 => write!(f, "u16"),
            Self::U32 => write!(f, "u32"),
            Self::U64 => write!(f, "u64"),
            Self::F32 => write!(f, "f32"),
            Self::F64 => write!(f, "f64"),
            Self::String => write!(f, "String"),
            Self::DateTime => write!(f, "DateTime"),
            Self::DateTimeOffset => write!(f, "DateTimeOffset"),
            Self::Named(name) => write!(f, "{name}"),
            Self::Optional(inner) => write!(f, "Option<{inner}>"),
        }
    }
}

/// A statically known Rust type the schema can convert from or to.
///
/// Implement this for application types to use them with the generic entry
/// points of [`MappingSchema`](crate::MappingSchema). Application structs are
/// usually mapped to [`DataType::Named`] and carried as
/// [`Value::Structured`].
pub trait Mappable: Sized + 'static {
    /// The runtime descriptor of this type.
    fn data_type() -> DataType;

    /// Moves the value into its dynamic representation.
    fn into_value(self) -> Value;

    /// Reads the value back from its dynamic representation.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::TypeMismatch`] when the value has another shape
    /// and [`ConvertError::NullValue`] when an absent value reaches a type that
    /// cannot hold one.
    fn from_value(value: Value) -> Result<Self, ConvertError>;
}

fn mismatch<T: Mappable>(value: &Value) -> ConvertError {
    if value.is_null() {
        ConvertError::NullValue { ty: T::data_type() }
    } else {
        ConvertError::TypeMismatch {
            expected: T::data_type(),
            value_kind: value.type_name(),
        }
    }
}

macro_rules! mappable {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Mappable for $ty {
                fn data_type() -> DataType {
                    DataType::$variant
                }

                fn into_value(self) -> Value {
                    Value::$variant(self)
                }

                fn from_value(value: Value) -> Result<Self, ConvertError> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => Err(mismatch::<Self>(&other)),
                    }
                }
            }
        )*
    };
}

mappable! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => String,
    NaiveDateTime => DateTime,
    DateTime<FixedOffset> => DateTimeOffset,
}

impl<T: Mappable> Mappable for Option<T> {
    fn data_type() -> DataType {
        DataType::optional(T::data_type())
    }

    fn into_value(self) -> Value {
        self.map_or(Value::Null, Mappable::into_value)
    }

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_wraps_value_types_only() {
        assert_eq!(
            DataType::optional(DataType::I32),
            DataType::Optional(Box::new(DataType::I32))
        );
        assert_eq!(DataType::optional(DataType::String), DataType::String);
        assert_eq!(
            DataType::optional(DataType::named("Customer")),
            DataType::named("Customer")
        );

        let once = DataType::optional(DataType::I64);
        assert_eq!(DataType::optional(once.clone()), once);
    }

    #[test]
    fn test_underlying() {
        let opt = DataType::optional(DataType::U8);
        assert_eq!(opt.underlying(), &DataType::U8);
        assert_eq!(DataType::U8.underlying(), &DataType::U8);
        assert_eq!(DataType::String.underlying(), &DataType::String);
    }

    #[test]
    fn test_classification() {
        assert!(DataType::I32.is_primitive());
        assert!(DataType::DateTime.is_primitive());
        assert!(!DataType::String.is_primitive());
        assert!(DataType::String.is_reference());
        assert!(DataType::named("X").accepts_null());
        assert!(DataType::optional(DataType::Bool).accepts_null());
        assert!(!DataType::Bool.accepts_null());
        assert!(DataType::U64.is_integer());
        assert!(DataType::F32.is_float());
        assert!(!DataType::Bool.is_numeric());
    }

    #[test]
    fn test_display() {
        assert_eq!(DataType::I32.to_string(), "i32");
        assert_eq!(DataType::optional(DataType::F64).to_string(), "Option<f64>");
        assert_eq!(DataType::named("Order").to_string(), "Order");
    }

    #[test]
    fn test_option_mapping() {
        assert_eq!(<Option<i32>>::data_type(), DataType::optional(DataType::I32));
        assert_eq!(<Option<String>>::data_type(), DataType::String);

        assert_eq!(Some(5i32).into_value(), Value::I32(5));
        assert_eq!(None::<i32>.into_value(), Value::Null);
        assert_eq!(<Option<i32>>::from_value(Value::Null).unwrap(), None);
        assert_eq!(<Option<i32>>::from_value(Value::I32(3)).unwrap(), Some(3));
    }

    #[test]
    fn test_from_value_errors() {
        let err = i32::from_value(Value::Null).unwrap_err();
        assert_eq!(err, ConvertError::NullValue { ty: DataType::I32 });

        let err = i32::from_value(Value::String("1".into())).unwrap_err();
        assert!(matches!(err, ConvertError::TypeMismatch { value_kind: "string", .. }));
    }

    #[test]
    fn test_serialization() {
        let ty = DataType::optional(DataType::DateTime);
        let json = serde_json::to_string(&ty).unwrap();
        let back: DataType = serde_json::from_str(&json).unwrap();
        assert_eq!(ty, back);
    }
}
