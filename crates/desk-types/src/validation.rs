//! Configuration validation utilities.
//!
//! Implementation sections of the configuration are kept as raw TOML values
//! until the implementation is built. Each implementation describes the shape
//! it accepts with a [`Schema`], and the schema is checked before the
//! implementation is constructed.

use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	/// Error that occurs when a required field is missing.
	#[error("Missing required field: {0}")]
	MissingField(String),
	/// Error that occurs when a field has an invalid value.
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	/// Error that occurs when field type is incorrect.
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
}

/// Represents the type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	/// An integer value with optional inclusive bounds.
	Integer { min: Option<i64>, max: Option<i64> },
	/// A decimal number, given either as a TOML number or as a string such
	/// as `"100.25"`. Must not be negative.
	Price,
	/// A table with arbitrary keys whose values all share one type.
	Map(Box<FieldType>),
}

/// A named field in a configuration schema.
#[derive(Debug)]
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
}

impl Field {
	/// Creates a new field with the given name and type.
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
		}
	}
}

/// Validation schema for a TOML table.
///
/// Required fields must be present; optional fields are only checked when
/// present. Unknown keys are ignored.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	/// Creates a new schema with required and optional fields.
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates a TOML value against this schema.
	///
	/// # Errors
	///
	/// Returns an error if the value is not a table, a required field is
	/// missing or a field has the wrong type. Errors from map entries carry
	/// the dotted path of the failing entry.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "table".to_string(),
				actual: config.type_str().to_string(),
			})?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
			validate_field_type(&field.name, value, &field.field_type)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				validate_field_type(&field.name, value, &field.field_type)?;
			}
		}

		Ok(())
	}
}

/// Parses a price given as a TOML string or number.
///
/// Floats go through their shortest decimal representation so that `0.1`
/// in a config file becomes exactly `0.1`.
pub fn parse_price(value: &toml::Value) -> Result<Decimal, String> {
	let parsed = match value {
		toml::Value::String(s) => Decimal::from_str(s.trim()).map_err(|e| e.to_string())?,
		toml::Value::Integer(i) => Decimal::from(*i),
		toml::Value::Float(f) => Decimal::from_str(&f.to_string()).map_err(|e| e.to_string())?,
		other => return Err(format!("expected a number, got {}", other.type_str())),
	};

	if parsed.is_sign_negative() && !parsed.is_zero() {
		return Err(format!("price {} must not be negative", parsed));
	}
	Ok(parsed)
}

fn type_mismatch(field_name: &str, expected: &str, value: &toml::Value) -> ValidationError {
	ValidationError::TypeMismatch {
		field: field_name.to_string(),
		expected: expected.to_string(),
		actual: value.type_str().to_string(),
	}
}

/// Validates that a value matches the expected field type, recursing into
/// map entries.
fn validate_field_type(
	field_name: &str,
	value: &toml::Value,
	expected_type: &FieldType,
) -> Result<(), ValidationError> {
	match expected_type {
		FieldType::Integer { min, max } => {
			let int_val = value
				.as_integer()
				.ok_or_else(|| type_mismatch(field_name, "integer", value))?;

			if let Some(min_val) = min {
				if int_val < *min_val {
					return Err(ValidationError::InvalidValue {
						field: field_name.to_string(),
						message: format!("Value {} is less than minimum {}", int_val, min_val),
					});
				}
			}

			if let Some(max_val) = max {
				if int_val > *max_val {
					return Err(ValidationError::InvalidValue {
						field: field_name.to_string(),
						message: format!("Value {} is greater than maximum {}", int_val, max_val),
					});
				}
			}
		},
		FieldType::Price => {
			if !(value.is_str() || value.is_integer() || value.is_float()) {
				return Err(type_mismatch(field_name, "price", value));
			}
			parse_price(value).map_err(|message| ValidationError::InvalidValue {
				field: field_name.to_string(),
				message,
			})?;
		},
		FieldType::Map(inner_type) => {
			let table = value
				.as_table()
				.ok_or_else(|| type_mismatch(field_name, "table", value))?;

			for (key, item) in table {
				validate_field_type(&format!("{}.{}", field_name, key), item, inner_type)?;
			}
		},
	}

	Ok(())
}

/// A configuration schema that can validate TOML values.
///
/// Implementations return one of these so the builder can check their
/// section of the configuration.
pub trait ConfigSchema: Send + Sync {
	/// Validates a TOML configuration value against this schema.
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn mock_schema() -> Schema {
		Schema::new(
			vec![Field::new("prices", FieldType::Map(Box::new(FieldType::Price)))],
			vec![
				Field::new(
					"latency_ms",
					FieldType::Integer {
						min: Some(0),
						max: Some(60_000),
					},
				),
				Field::new("fallback_price", FieldType::Price),
			],
		)
	}

	#[test]
	fn test_valid_config() {
		let config: toml::Value = toml::from_str(
			r#"
latency_ms = 5
fallback_price = "1.0"
[prices]
BTCUSDT = "100"
ETHUSDT = 3000
SOLUSDT = 150.5
"#,
		)
		.unwrap();

		assert!(mock_schema().validate(&config).is_ok());
	}

	#[test]
	fn test_missing_required_field() {
		let config: toml::Value = toml::from_str("latency_ms = 5").unwrap();
		let err = mock_schema().validate(&config).unwrap_err();
		assert!(matches!(err, ValidationError::MissingField(ref f) if f == "prices"));
	}

	#[test]
	fn test_map_entry_path_in_error() {
		let config: toml::Value = toml::from_str(
			r#"
[prices]
BTCUSDT = "not-a-number"
"#,
		)
		.unwrap();

		let err = mock_schema().validate(&config).unwrap_err();
		match err {
			ValidationError::InvalidValue { field, .. } => assert_eq!(field, "prices.BTCUSDT"),
			other => panic!("unexpected error: {other}"),
		}
	}

	#[test]
	fn test_integer_bounds() {
		let config: toml::Value = toml::from_str(
			r#"
latency_ms = -1
[prices]
"#,
		)
		.unwrap();

		let err = mock_schema().validate(&config).unwrap_err();
		assert!(err.to_string().contains("less than minimum"));
	}

	#[test]
	fn test_parse_price() {
		assert_eq!(
			parse_price(&toml::Value::String("100".into())).unwrap(),
			Decimal::from(100)
		);
		assert_eq!(
			parse_price(&toml::Value::Float(0.1)).unwrap(),
			Decimal::from_str("0.1").unwrap()
		);
		assert!(parse_price(&toml::Value::Integer(-5)).is_err());
		assert!(parse_price(&toml::Value::Boolean(true)).is_err());
	}
}
