//! Record decoder: framed rows in, typed records out.

use crate::coerce::{map_field, FieldFailure};
use crate::error::{RecordError, Result};
use crate::framer::RowFramer;
use crate::schema::{Record, Schema};
use tracing::debug;

/// Successfully decoded records plus the recoverable field errors met on
/// the way. Records appear in input order; a record with field errors is
/// still present with the failed fields left at their zero value.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<R> {
    pub records: Vec<R>,
    pub field_errors: Vec<RecordError>,
}

impl<R> Decoded<R> {
    pub fn is_clean(&self) -> bool {
        self.field_errors.is_empty()
    }

    /// Move the records into `out`, replacing its contents. `E` may be the
    /// record itself or an owning wrapper such as `Box<R>`.
    pub fn into_collection<E: From<R>>(self, out: &mut Vec<E>) -> Vec<RecordError> {
        out.clear();
        out.reserve_exact(self.records.len());
        out.extend(self.records.into_iter().map(E::from));
        self.field_errors
    }
}

/// Decode `text` against an explicit schema, creating each destination
/// record with `new_record`.
///
/// A fatal mapping error returns immediately and drops every record
/// decoded so far.
pub fn decode_with<R, F>(
    framer: &dyn RowFramer,
    schema: &Schema<R>,
    class: &str,
    text: &str,
    mut new_record: F,
) -> Result<Decoded<R>>
where
    F: FnMut() -> R,
{
    let rows = framer.frame(class, text)?;
    let mut records = Vec::with_capacity(rows.len());
    let mut field_errors = Vec::new();

    for row in rows {
        let mut record = new_record();
        for (name, raw) in &row.fields {
            match map_field(schema, &mut record, name, raw) {
                Ok(()) => {}
                Err(FieldFailure::Coercion(message)) => {
                    debug!(class, field = %name, row = row.number, %message, "Field coercion failed");
                    field_errors.push(RecordError {
                        class: class.to_string(),
                        field: name.clone(),
                        row: row.number,
                        message,
                    });
                }
                Err(FieldFailure::Fatal(err)) => return Err(err),
            }
        }
        records.push(record);
    }

    debug!(
        class,
        records = records.len(),
        field_errors = field_errors.len(),
        "Decoded upstream output"
    );
    Ok(Decoded {
        records,
        field_errors,
    })
}

/// Decode `text` into records of a statically described type.
pub fn decode<R: Record>(framer: &dyn RowFramer, class: &str, text: &str) -> Result<Decoded<R>> {
    decode_with(framer, R::schema(), class, text, R::default)
}

/// Decode into a caller-owned collection.
///
/// On success `out` holds exactly one element per framed row. On a fatal
/// error `out` is left empty.
pub fn decode_into<R, E>(
    framer: &dyn RowFramer,
    class: &str,
    text: &str,
    out: &mut Vec<E>,
) -> Result<Vec<RecordError>>
where
    R: Record,
    E: From<R>,
{
    match decode::<R>(framer, class, text) {
        Ok(decoded) => Ok(decoded.into_collection(out)),
        Err(err) => {
            out.clear();
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use crate::framer::{DelimitedFramer, KeyValueFramer};

    crate::wmic_record! {
        #[derive(Debug, Clone, PartialEq)]
        struct Person {
            name: String => "Name",
            age: i32 => "Age",
        }
    }

    #[test]
    fn test_decode_key_value_example() {
        let text = "Name=Alice\nAge=30\n\nName=Bob\nAge=not-a-number\n";
        let decoded = decode::<Person>(&KeyValueFramer, "Person", text).unwrap();
        assert_eq!(
            decoded.records,
            vec![
                Person { name: "Alice".to_string(), age: 30 },
                Person { name: "Bob".to_string(), age: 0 },
            ]
        );
        assert_eq!(decoded.field_errors.len(), 1);
        let err = &decoded.field_errors[0];
        assert_eq!(err.class, "Person");
        assert_eq!(err.field, "Age");
        assert_eq!(err.row, 2);
        assert!(!decoded.is_clean());
    }

    #[test]
    fn test_decode_delimited_example() {
        let text = "Name,Age\n\"Carol\",\"41\"\n";
        let decoded = decode::<Person>(&DelimitedFramer::new(), "Person", text).unwrap();
        assert_eq!(
            decoded.records,
            vec![Person { name: "Carol".to_string(), age: 41 }]
        );
        assert!(decoded.is_clean());
    }

    #[test]
    fn test_unknown_field_discards_everything() {
        let text = "Name=Alice\nAge=30\n\nName=Bob\nAge=5\nHeight=180\n";
        let mut out = vec![Person::default()];
        let err = decode_into::<Person, Person>(&KeyValueFramer, "Person", text, &mut out)
            .unwrap_err();
        assert!(matches!(err, DecodeError::UnknownField { ref field, .. } if field == "Height"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_decode_into_boxed_elements() {
        let text = "Name=A\n\nName=B\n\nName=C";
        let mut out: Vec<Box<Person>> = Vec::new();
        let errors = decode_into::<Person, _>(&KeyValueFramer, "Person", text, &mut out).unwrap();
        assert!(errors.is_empty());
        let names: Vec<&str> = out.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_decode_into_replaces_existing_contents() {
        let mut out = vec![Person::default(); 5];
        decode_into::<Person, Person>(&KeyValueFramer, "Person", "Name=A\n", &mut out).unwrap();
        assert_eq!(out.len(), 1);
    }
}
