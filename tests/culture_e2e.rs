use chrono::{DateTime, FixedOffset};
use mapping_schema::{ConvertError, DataType, FormatProfile, MappingSchema, Value};

const FRENCH: &str = r#"{
    "name": "fr-FR",
    "decimal_separator": ",",
    "group_separator": " ",
    "negative_sign": "-",
    "date_time_pattern": "%d/%m/%Y %H:%M:%S",
    "date_time_offset_pattern": "%d/%m/%Y %H:%M:%S %:z"
}"#;

#[test]
fn profile_loaded_from_json_drives_conversions() {
    let profile = FormatProfile::from_json(FRENCH).unwrap();
    let schema = MappingSchema::new();
    schema.set_culture_formatting(&profile).unwrap();

    let to_text = schema.get_converter::<f32, String>().unwrap();
    assert_eq!(to_text.convert(0.5).unwrap(), "0,5");

    let from_text = schema.get_converter::<String, f64>().unwrap();
    assert_eq!(from_text.convert("12 345,25".to_string()).unwrap(), 12345.25);
}

#[test]
fn culture_rules_are_inherited_by_child_schemas() {
    let base = MappingSchema::new();
    base.set_culture_formatting(&FormatProfile::invariant()).unwrap();

    let child = MappingSchema::with_parents(&[&base]);
    child.set_default_value(-1i32);

    let parse = child.get_converter::<String, i32>().unwrap();
    assert_eq!(parse.convert("17".to_string()).unwrap(), 17);

    // A null string takes the child's default, not the built-in zero.
    let dynamic = child.converter_for(&DataType::String, &DataType::I32).unwrap();
    assert_eq!(dynamic(&Value::Null).unwrap(), Value::I32(-1));
}

#[test]
fn child_profile_overrides_parent_profile() {
    let base = MappingSchema::new();
    base.set_culture_formatting(&FormatProfile::invariant()).unwrap();

    let child = MappingSchema::with_parents(&[&base]);
    let german = FormatProfile::invariant()
        .with_name("de-DE")
        .with_decimal_separator(",")
        .with_group_separator(".");
    child.set_culture_formatting(&german).unwrap();

    assert_eq!(child.get_converter::<f64, String>().unwrap().convert(1.5).unwrap(), "1,5");
    assert_eq!(base.get_converter::<f64, String>().unwrap().convert(1.5).unwrap(), "1.5");
}

#[test]
fn date_time_offset_round_trip() {
    let schema = MappingSchema::new();
    schema.set_culture_formatting(&FormatProfile::invariant()).unwrap();

    let value: DateTime<FixedOffset> = DateTime::parse_from_rfc3339("2022-03-04T05:06:07-05:00").unwrap();
    let text = schema
        .get_converter::<DateTime<FixedOffset>, String>()
        .unwrap()
        .convert(value)
        .unwrap();
    assert_eq!(text, "03/04/2022 05:06:07 -05:00");

    let back = schema
        .get_converter::<String, Option<DateTime<FixedOffset>>>()
        .unwrap()
        .convert(text)
        .unwrap();
    assert_eq!(back, Some(value));
}

#[test]
fn malformed_input_names_the_profile() {
    let schema = MappingSchema::new();
    schema.set_culture_formatting(&FormatProfile::invariant()).unwrap();

    let err = schema
        .get_converter::<String, u8>()
        .unwrap()
        .convert("-1".to_string())
        .unwrap_err();
    let ConvertError::Format { ty, profile, .. } = err else {
        panic!("expected a format error");
    };
    assert_eq!(ty, DataType::U8);
    assert_eq!(profile, "invariant");
}

#[test]
fn invalid_profiles_are_rejected() {
    assert!(FormatProfile::from_json(r#"{"name": "x"}"#).is_err());

    let schema = MappingSchema::new();
    let clash = FormatProfile::invariant().with_decimal_separator(",");
    assert!(schema.set_culture_formatting(&clash).is_err());
}
