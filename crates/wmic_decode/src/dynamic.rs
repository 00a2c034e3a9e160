//! Records whose fields are only known at runtime.

use crate::schema::{FieldKind, Scalar, Schema};
use serde_json::{Map, Value};

/// Field values stored by schema position.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicRecord {
    values: Vec<Option<Scalar>>,
}

impl DynamicRecord {
    /// Record with every field at its kind's zero value.
    pub fn zeroed(schema: &Schema<DynamicRecord>) -> Self {
        Self {
            values: schema.fields().iter().map(|f| f.kind().zero()).collect(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&Scalar> {
        self.values.get(index).and_then(|v| v.as_ref())
    }

    /// Render as a JSON object in schema order.
    pub fn to_json(&self, schema: &Schema<DynamicRecord>) -> Value {
        let mut map = Map::new();
        for (idx, field) in schema.fields().iter().enumerate() {
            let value = self
                .get(idx)
                .and_then(|v| serde_json::to_value(v).ok())
                .unwrap_or(Value::Null);
            map.insert(field.name().to_string(), value);
        }
        Value::Object(map)
    }
}

/// Build a runtime schema from `Name:kind` specs (kind defaults to string).
pub fn dynamic_schema<S: AsRef<str>>(
    type_name: &str,
    specs: &[S],
) -> Result<Schema<DynamicRecord>, String> {
    let mut builder = Schema::builder(type_name);
    for (idx, spec) in specs.iter().enumerate() {
        let spec = spec.as_ref();
        let (name, kind) = match spec.split_once(':') {
            Some((name, kind)) => (name.trim(), kind.parse::<FieldKind>()?),
            None => (spec.trim(), FieldKind::Text),
        };
        if name.is_empty() {
            return Err(format!("Field spec '{}' has no name", spec));
        }
        builder = builder.raw_field(name, kind, move |record: &mut DynamicRecord, value| {
            match record.values.get_mut(idx) {
                Some(slot) => {
                    *slot = Some(value);
                    true
                }
                None => false,
            }
        });
    }
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::map_field;
    use serde_json::json;

    #[test]
    fn test_dynamic_schema_and_json() {
        let schema = dynamic_schema("Win32_Process", &["Name", "ProcessId:u32", "Threads:i64"])
            .unwrap();
        let mut record = DynamicRecord::zeroed(&schema);
        map_field(&schema, &mut record, "Name", "System").unwrap();
        map_field(&schema, &mut record, "ProcessId", "4").unwrap();
        assert_eq!(
            record.to_json(&schema),
            json!({"Name": "System", "ProcessId": 4, "Threads": 0})
        );
    }

    #[test]
    fn test_dynamic_schema_rejects_bad_kind() {
        let err = dynamic_schema("X", &["Size:decimal"]).unwrap_err();
        assert!(err.contains("Invalid field kind"));
        assert!(dynamic_schema("X", &[":u8"]).is_err());
    }
}
