//! Bulk registration of culture-aware text conversions.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDateTime};

use super::MappingSchema;
use crate::culture::{CultureFormat, FormatProfile};
use crate::error::ConfigError;
use crate::expr::{ConvertExpression, Expr, Function};
use crate::types::{DataType, Mappable};

impl MappingSchema {
    /// Registers text conversions for every numeric and date-time type using
    /// `profile`.
    ///
    /// For each type `T` this schema gains `T -> String`,
    /// `Option<T> -> String`, `String -> T` and `String -> Option<T>`. Absent
    /// inputs map to the schema's default of the target type.
    ///
    /// The integer types, `f32`, `f64`, `NaiveDateTime` and
    /// `DateTime<FixedOffset>` are covered. There is no decimal type, so no
    /// decimal conversions are registered; use `f64` for fractional values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidFormatProfile`] if `profile` fails
    /// validation. Nothing is registered in that case.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapping_schema::{FormatProfile, MappingSchema};
    ///
    /// let schema = MappingSchema::new();
    /// let profile = FormatProfile::invariant()
    ///     .with_decimal_separator(",")
    ///     .with_group_separator(".");
    /// schema.set_culture_formatting(&profile)?;
    ///
    /// let to_text = schema.get_converter::<f64, String>()?;
    /// assert_eq!(to_text.convert(2.5)?, "2,5");
    /// # Ok::<(), mapping_schema::MappingError>(())
    /// ```
    pub fn set_culture_formatting(&self, profile: &FormatProfile) -> Result<(), ConfigError> {
        profile.validate()?;
        let profile = Arc::new(profile.clone());

        self.register_culture::<i8>(&profile)?;
        self.register_culture::<i16>(&profile)?;
        self.register_culture::<i32>(&profile)?;
        self.register_culture::<i64>(&profile)?;
        self.register_culture::<u8>(&profile)?;
        self.register_culture::<u16>(&profile)?;
        self.register_culture::<u32>(&profile)?;
        self.register_culture::<u64>(&profile)?;
        self.register_culture::<f32>(&profile)?;
        self.register_culture::<f64>(&profile)?;
        self.register_culture::<NaiveDateTime>(&profile)?;
        self.register_culture::<DateTime<FixedOffset>>(&profile)?;

        tracing::info!(profile = %profile.name, "registered culture conversions");
        Ok(())
    }

    fn register_culture<T: CultureFormat>(&self, profile: &Arc<FormatProfile>) -> Result<(), ConfigError> {
        let ty = T::data_type();
        let optional = DataType::optional(ty.clone());

        let p = Arc::clone(profile);
        let format = Function::unary(format!("format_{ty}"), move |v: T| v.format(&p));
        let p = Arc::clone(profile);
        let parse = Function::try_unary(format!("parse_{ty}"), move |s: String| T::parse(&s, &p));

        let to_text = ConvertExpression::build(ty.clone(), "v", |v| Expr::call(format.clone(), vec![v]));
        self.set_convert_expression_for(ty.clone(), DataType::String, to_text, true)?;

        let optional_to_text = ConvertExpression::build(optional.clone(), "v", |v| {
            Expr::call(format.clone(), vec![Expr::convert(v, ty.clone())])
        });
        self.set_convert_expression_for(optional.clone(), DataType::String, optional_to_text, true)?;

        let from_text = ConvertExpression::build(DataType::String, "s", |s| Expr::call(parse.clone(), vec![s]));
        self.set_convert_expression_for(DataType::String, ty.clone(), from_text, true)?;

        let optional_from_text = ConvertExpression::build(DataType::String, "s", |s| {
            Expr::convert(Expr::call(parse, vec![s]), optional.clone())
        });
        self.set_convert_expression_for(DataType::String, optional, optional_from_text, true)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::error::ConvertError;

    fn german() -> FormatProfile {
        FormatProfile::invariant()
            .with_name("de-DE")
            .with_decimal_separator(",")
            .with_group_separator(".")
            .with_date_time_pattern("%d.%m.%Y %H:%M:%S")
    }

    #[test]
    fn test_registers_four_rules_per_type() {
        let schema = MappingSchema::with_parents(&[]);
        schema.set_culture_formatting(&FormatProfile::invariant()).unwrap();
        // 12 types, 4 directions each.
        assert_eq!(schema.own_layer().converters().len(), 48);
    }

    #[test]
    fn test_number_round_trip() {
        let schema = MappingSchema::new();
        schema.set_culture_formatting(&german()).unwrap();

        let to_text = schema.get_converter::<f64, String>().unwrap();
        assert_eq!(to_text.convert(-1.25).unwrap(), "-1,25");

        let from_text = schema.get_converter::<String, f64>().unwrap();
        assert_eq!(from_text.convert("1.000,5".to_string()).unwrap(), 1000.5);
    }

    #[test]
    fn test_optional_directions() {
        let schema = MappingSchema::new();
        schema.set_culture_formatting(&FormatProfile::invariant()).unwrap();

        let to_text = schema.get_converter::<Option<i64>, String>().unwrap();
        assert_eq!(to_text.convert(Some(-3)).unwrap(), "-3");
        assert_eq!(to_text.convert(None).unwrap(), "");

        let from_text = schema.get_converter::<String, Option<u16>>().unwrap();
        assert_eq!(from_text.convert("8".to_string()).unwrap(), Some(8));
        let f = schema
            .converter_for(&DataType::String, &DataType::optional(DataType::U16))
            .unwrap();
        assert!(f(&crate::value::Value::Null).unwrap().is_null());
    }

    #[test]
    fn test_date_time_uses_profile_pattern() {
        let schema = MappingSchema::new();
        schema.set_culture_formatting(&german()).unwrap();

        let dt = NaiveDate::from_ymd_opt(2023, 7, 4)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        let to_text = schema.get_converter::<NaiveDateTime, String>().unwrap();
        assert_eq!(to_text.convert(dt).unwrap(), "04.07.2023 08:30:00");

        let from_text = schema.get_converter::<String, NaiveDateTime>().unwrap();
        assert_eq!(from_text.convert("04.07.2023 08:30:00".to_string()).unwrap(), dt);
    }

    #[test]
    fn test_parse_failure_is_format_error() {
        let schema = MappingSchema::new();
        schema.set_culture_formatting(&german()).unwrap();
        let from_text = schema.get_converter::<String, i32>().unwrap();
        let err = from_text.convert("zwölf".to_string()).unwrap_err();
        assert!(matches!(err, ConvertError::Format { ref profile, .. } if profile == "de-DE"));
    }

    #[test]
    fn test_invalid_profile_registers_nothing() {
        let schema = MappingSchema::with_parents(&[]);
        let bad = FormatProfile::invariant().with_decimal_separator("");
        assert!(schema.set_culture_formatting(&bad).is_err());
        assert!(schema.own_layer().converters().is_empty());
    }
}
