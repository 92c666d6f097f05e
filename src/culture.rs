//! Culture-specific formatting of numbers and dates.
//!
//! A [`FormatProfile`] describes how numbers and date-times are written as
//! text for one culture. [`CultureFormat`] is implemented by every type the
//! schema's bulk culture registration wires up.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConvertError};
use crate::types::Mappable;

/// Formatting conventions of a culture.
///
/// # Examples
///
/// ```
/// use mapping_schema::FormatProfile;
///
/// let de = FormatProfile::invariant()
///     .with_name("de-DE")
///     .with_decimal_separator(",")
///     .with_group_separator(".");
/// assert_eq!(de.decimal_separator, ",");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatProfile {
    /// Culture name, reported in parse errors.
    pub name: String,

    /// Separator between integral and fractional digits.
    pub decimal_separator: String,

    /// Digit group separator accepted (and ignored) when parsing floats.
    pub group_separator: String,

    /// Sign written in front of negative numbers.
    pub negative_sign: String,

    /// chrono pattern for date-times without offset.
    pub date_time_pattern: String,

    /// chrono pattern for date-times with offset.
    pub date_time_offset_pattern: String,
}

impl FormatProfile {
    /// The culture-neutral profile.
    #[must_use]
    pub fn invariant() -> Self {
        Self {
            name: "invariant".to_string(),
            decimal_separator: ".".to_string(),
            group_separator: ",".to_string(),
            negative_sign: "-".to_string(),
            date_time_pattern: "%m/%d/%Y %H:%M:%S".to_string(),
            date_time_offset_pattern: "%m/%d/%Y %H:%M:%S %:z".to_string(),
        }
    }

    /// Sets the culture name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the decimal separator.
    #[must_use]
    pub fn with_decimal_separator(mut self, separator: impl Into<String>) -> Self {
        self.decimal_separator = separator.into();
        self
    }

    /// Sets the digit group separator.
    #[must_use]
    pub fn with_group_separator(mut self, separator: impl Into<String>) -> Self {
        self.group_separator = separator.into();
        self
    }

    /// Sets the negative sign.
    #[must_use]
    pub fn with_negative_sign(mut self, sign: impl Into<String>) -> Self {
        self.negative_sign = sign.into();
        self
    }

    /// Sets the chrono pattern for date-times without offset.
    #[must_use]
    pub fn with_date_time_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.date_time_pattern = pattern.into();
        self
    }

    /// Sets the chrono pattern for date-times with offset.
    #[must_use]
    pub fn with_date_time_offset_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.date_time_offset_pattern = pattern.into();
        self
    }

    /// Loads and validates a profile from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidFormatProfile`] on malformed JSON or on a
    /// profile that fails [`FormatProfile::validate`].
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        let profile: Self = serde_json::from_str(s).map_err(|e| ConfigError::InvalidFormatProfile {
            reason: format!("deserialize profile: {e}"),
        })?;
        profile.validate()?;
        Ok(profile)
    }

    /// Checks that the separators are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidFormatProfile`] when the decimal separator
    /// or negative sign is empty, or the decimal and group separators collide.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.decimal_separator.is_empty() {
            return Err(ConfigError::InvalidFormatProfile {
                reason: "decimal separator cannot be empty".to_string(),
            });
        }
        if self.negative_sign.is_empty() {
            return Err(ConfigError::InvalidFormatProfile {
                reason: "negative sign cannot be empty".to_string(),
            });
        }
        if self.decimal_separator == self.group_separator {
            return Err(ConfigError::InvalidFormatProfile {
                reason: format!(
                    "decimal and group separators are both '{}'",
                    self.decimal_separator
                ),
            });
        }
        Ok(())
    }

    fn parse_error<T: Mappable>(&self, input: &str, reason: impl ToString) -> ConvertError {
        ConvertError::Format {
            input: input.to_string(),
            ty: T::data_type(),
            profile: self.name.clone(),
            reason: reason.to_string(),
        }
    }

    /// Rewrites culture text into the form Rust's parsers accept.
    fn normalize_number(&self, s: &str, allow_groups: bool) -> String {
        let mut text = s.trim().to_string();
        if allow_groups && !self.group_separator.is_empty() {
            text = text.replace(&self.group_separator, "");
        }
        if let Some(rest) = text.strip_prefix(&self.negative_sign) {
            text = format!("-{rest}");
        }
        if self.decimal_separator != "." {
            text = text.replace(&self.decimal_separator, ".");
        }
        text
    }

    fn localize_number(&self, text: &str) -> String {
        let (sign, digits) = match text.strip_prefix('-') {
            Some(rest) => (self.negative_sign.as_str(), rest),
            None => ("", text),
        };
        let digits = if self.decimal_separator == "." {
            digits.to_string()
        } else {
            digits.replace('.', &self.decimal_separator)
        };
        format!("{sign}{digits}")
    }
}

impl Default for FormatProfile {
    fn default() -> Self {
        Self::invariant()
    }
}

/// A type with a culture-aware text form.
pub trait CultureFormat: Mappable + Send + Sync {
    /// Writes the value using the profile's conventions.
    fn format(&self, profile: &FormatProfile) -> String;

    /// Reads a value written with the profile's conventions.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Format`] on malformed input.
    fn parse(s: &str, profile: &FormatProfile) -> Result<Self, ConvertError>;
}

macro_rules! integer_format {
    ($($ty:ty),* $(,)?) => {
        $(
            impl CultureFormat for $ty {
                fn format(&self, profile: &FormatProfile) -> String {
                    profile.localize_number(&self.to_string())
                }

                fn parse(s: &str, profile: &FormatProfile) -> Result<Self, ConvertError> {
                    profile
                        .normalize_number(s, false)
                        .parse::<$ty>()
                        .map_err(|e| profile.parse_error::<$ty>(s, e))
                }
            }
        )*
    };
}

macro_rules! float_format {
    ($($ty:ty),* $(,)?) => {
        $(
            impl CultureFormat for $ty {
                fn format(&self, profile: &FormatProfile) -> String {
                    profile.localize_number(&self.to_string())
                }

                fn parse(s: &str, profile: &FormatProfile) -> Result<Self, ConvertError> {
                    profile
                        .normalize_number(s, true)
                        .parse::<$ty>()
                        .map_err(|e| profile.parse_error::<$ty>(s, e))
                }
            }
        )*
    };
}

integer_format!(i8, i16, i32, i64, u8, u16, u32, u64);
float_format!(f32, f64);

impl CultureFormat for NaiveDateTime {
    fn format(&self, profile: &FormatProfile) -> String {
        self.format(&profile.date_time_pattern).to_string()
    }

    fn parse(s: &str, profile: &FormatProfile) -> Result<Self, ConvertError> {
        Self::parse_from_str(s.trim(), &profile.date_time_pattern)
            .map_err(|e| profile.parse_error::<Self>(s, e))
    }
}

impl CultureFormat for DateTime<FixedOffset> {
    fn format(&self, profile: &FormatProfile) -> String {
        self.format(&profile.date_time_offset_pattern).to_string()
    }

    fn parse(s: &str, profile: &FormatProfile) -> Result<Self, ConvertError> {
        Self::parse_from_str(s.trim(), &profile.date_time_offset_pattern)
            .map_err(|e| profile.parse_error::<Self>(s, e))
    }
}
