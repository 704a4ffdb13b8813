//! Output format conversion for decoded records.

use std::str::FromStr;

use serde_json::Value;

use crate::error::ConversionError;
use crate::mapping::Record;
use crate::Result;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    String,
    Xml,
}

impl FromStr for OutputFormat {
    type Err = ConversionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "json" => Ok(OutputFormat::Json),
            "string" => Ok(OutputFormat::String),
            "xml" => Ok(OutputFormat::Xml),
            other => Err(ConversionError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }
}

/// Convert a record into the requested format.
///
/// `json` returns the record object unchanged, `string` its compact JSON
/// text, `xml` a `<root>` document with one element per field.
pub fn convert_output_format(record: &Record, format: OutputFormat) -> Result<Value> {
    let converted = match format {
        OutputFormat::Json => Value::Object(record.clone()),
        OutputFormat::String => Value::String(Value::Object(record.clone()).to_string()),
        OutputFormat::Xml => Value::String(record_to_xml(record)?),
    };
    Ok(converted)
}

/// Same as [`convert_output_format`] with the format given by name.
pub fn convert_output_format_named(record: &Record, format: &str) -> Result<Value> {
    let format = format.parse::<OutputFormat>()?;
    convert_output_format(record, format)
}

fn record_to_xml(record: &Record) -> std::result::Result<String, ConversionError> {
    let mut xml = String::from("<?xml version=\"1.0\" ?>\n<root>\n");
    for (key, value) in record {
        if !is_xml_name(key) {
            return Err(ConversionError::InvalidElementName { name: key.clone() });
        }
        let text = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        xml.push_str(&format!("\t<{key}>{}</{key}>\n", escape_text(&text)));
    }
    xml.push_str("</root>\n");
    Ok(xml)
}

fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    !name.to_ascii_lowercase().starts_with("xml")
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;
    use serde_json::json;

    fn record() -> Record {
        json!({"name": "Jo & Co", "age": 30, "tags": ["a"]})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn json_is_unchanged() {
        let converted = convert_output_format(&record(), OutputFormat::Json).unwrap();
        assert_eq!(converted, Value::Object(record()));
    }

    #[test]
    fn string_is_json_text() {
        let converted = convert_output_format(&record(), OutputFormat::String).unwrap();
        assert_eq!(
            converted,
            json!(r#"{"name":"Jo & Co","age":30,"tags":["a"]}"#)
        );
    }

    #[test]
    fn xml_renders_every_field() {
        let converted = convert_output_format(&record(), OutputFormat::Xml).unwrap();
        let xml = converted.as_str().unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" ?>\n<root>\n"));
        assert!(xml.contains("\t<name>Jo &amp; Co</name>\n"));
        assert!(xml.contains("\t<age>30</age>\n"));
        assert!(xml.contains("\t<tags>[\"a\"]</tags>\n"));
        assert!(xml.ends_with("</root>\n"));
    }

    #[test]
    fn xml_rejects_invalid_element_names() {
        let record = json!({"1st": "x"}).as_object().cloned().unwrap();
        let err = convert_output_format(&record, OutputFormat::Xml).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Conversion(ConversionError::InvalidElementName { .. })
        ));
    }

    #[test]
    fn unknown_format_names_the_identifier() {
        let err = convert_output_format_named(&record(), "yaml").unwrap_err();
        match err {
            RegistryError::Conversion(ConversionError::UnsupportedFormat { format }) => {
                assert_eq!(format, "yaml")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
