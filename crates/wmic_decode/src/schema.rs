//! Record schema descriptors.
//!
//! A schema is the ordered list of named, typed fields a decoded record
//! exposes. Lookup is by exact, case-sensitive column name. Each field
//! carries an assign closure so the decoder can write a coerced value
//! without knowing the concrete record type.

use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Integer widths supported by the coercer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

impl IntWidth {
    pub fn bits(self) -> u32 {
        match self {
            IntWidth::W8 => 8,
            IntWidth::W16 => 16,
            IntWidth::W32 => 32,
            IntWidth::W64 => 64,
        }
    }
}

/// Floating point precisions supported by the coercer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatWidth {
    F32,
    F64,
}

impl FloatWidth {
    pub fn bits(self) -> u32 {
        match self {
            FloatWidth::F32 => 32,
            FloatWidth::F64 => 64,
        }
    }
}

/// Declared kind of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// UTF-8 text, assigned verbatim
    Text,
    /// Signed base-10 integer
    Signed(IntWidth),
    /// Unsigned base-10 integer
    Unsigned(IntWidth),
    /// Floating point
    Float(FloatWidth),
    /// Boolean
    Bool,
    /// A declared type with no coercion rule (lists, nested records, ...)
    Unsupported(&'static str),
}

impl FieldKind {
    /// Value a field of this kind holds before anything is assigned.
    pub fn zero(self) -> Option<Scalar> {
        match self {
            FieldKind::Text => Some(Scalar::Text(String::new())),
            FieldKind::Signed(_) => Some(Scalar::Signed(0)),
            FieldKind::Unsigned(_) => Some(Scalar::Unsigned(0)),
            FieldKind::Float(_) => Some(Scalar::Float(0.0)),
            FieldKind::Bool => Some(Scalar::Bool(false)),
            FieldKind::Unsupported(_) => None,
        }
    }

    pub fn is_supported(self) -> bool {
        !matches!(self, FieldKind::Unsupported(_))
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Text => write!(f, "string"),
            FieldKind::Signed(w) => write!(f, "i{}", w.bits()),
            FieldKind::Unsigned(w) => write!(f, "u{}", w.bits()),
            FieldKind::Float(w) => write!(f, "f{}", w.bits()),
            FieldKind::Bool => write!(f, "bool"),
            FieldKind::Unsupported(name) => write!(f, "{}", name),
        }
    }
}

impl FromStr for FieldKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "string" | "text" | "str" => Ok(FieldKind::Text),
            "i8" => Ok(FieldKind::Signed(IntWidth::W8)),
            "i16" => Ok(FieldKind::Signed(IntWidth::W16)),
            "i32" | "int" => Ok(FieldKind::Signed(IntWidth::W32)),
            "i64" => Ok(FieldKind::Signed(IntWidth::W64)),
            "u8" => Ok(FieldKind::Unsigned(IntWidth::W8)),
            "u16" => Ok(FieldKind::Unsigned(IntWidth::W16)),
            "u32" | "uint" => Ok(FieldKind::Unsigned(IntWidth::W32)),
            "u64" => Ok(FieldKind::Unsigned(IntWidth::W64)),
            "f32" => Ok(FieldKind::Float(FloatWidth::F32)),
            "f64" | "float" | "double" => Ok(FieldKind::Float(FloatWidth::F64)),
            "bool" | "boolean" => Ok(FieldKind::Bool),
            _ => Err(format!(
                "Invalid field kind: '{}'. Expected: string, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, bool.",
                s
            )),
        }
    }
}

/// A coerced field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    Bool(bool),
}

impl Serialize for Scalar {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Scalar::Text(s) => serializer.serialize_str(s),
            Scalar::Signed(n) => serializer.serialize_i64(*n),
            Scalar::Unsigned(n) => serializer.serialize_u64(*n),
            Scalar::Float(n) => serializer.serialize_f64(*n),
            Scalar::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

/// Rust types that can back a record field.
pub trait FieldValue: Sized {
    const KIND: FieldKind;

    /// Convert a coerced scalar into this type. `None` means the scalar
    /// does not fit, which only happens for unsupported kinds.
    fn from_scalar(value: Scalar) -> Option<Self>;
}

impl FieldValue for String {
    const KIND: FieldKind = FieldKind::Text;

    fn from_scalar(value: Scalar) -> Option<Self> {
        match value {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl FieldValue for bool {
    const KIND: FieldKind = FieldKind::Bool;

    fn from_scalar(value: Scalar) -> Option<Self> {
        match value {
            Scalar::Bool(b) => Some(b),
            _ => None,
        }
    }
}

macro_rules! impl_signed_field {
    ($($ty:ty => $width:ident),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                const KIND: FieldKind = FieldKind::Signed(IntWidth::$width);

                fn from_scalar(value: Scalar) -> Option<Self> {
                    match value {
                        Scalar::Signed(n) => <$ty>::try_from(n).ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

macro_rules! impl_unsigned_field {
    ($($ty:ty => $width:ident),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                const KIND: FieldKind = FieldKind::Unsigned(IntWidth::$width);

                fn from_scalar(value: Scalar) -> Option<Self> {
                    match value {
                        Scalar::Unsigned(n) => <$ty>::try_from(n).ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_signed_field!(i8 => W8, i16 => W16, i32 => W32, i64 => W64);
impl_unsigned_field!(u8 => W8, u16 => W16, u32 => W32, u64 => W64);

impl FieldValue for f32 {
    const KIND: FieldKind = FieldKind::Float(FloatWidth::F32);

    fn from_scalar(value: Scalar) -> Option<Self> {
        match value {
            Scalar::Float(n) => Some(n as f32),
            _ => None,
        }
    }
}

impl FieldValue for f64 {
    const KIND: FieldKind = FieldKind::Float(FloatWidth::F64);

    fn from_scalar(value: Scalar) -> Option<Self> {
        match value {
            Scalar::Float(n) => Some(n),
            _ => None,
        }
    }
}

impl<T> FieldValue for Vec<T> {
    const KIND: FieldKind = FieldKind::Unsupported("list");

    fn from_scalar(_value: Scalar) -> Option<Self> {
        None
    }
}

type AssignFn<R> = Box<dyn Fn(&mut R, Scalar) -> bool + Send + Sync>;

/// One named, typed field of a record.
pub struct FieldDef<R> {
    name: String,
    kind: FieldKind,
    assign: AssignFn<R>,
}

impl<R> FieldDef<R> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Write a coerced value into `record`. Returns false if the value
    /// does not fit the field.
    pub fn assign(&self, record: &mut R, value: Scalar) -> bool {
        (self.assign)(record, value)
    }
}

impl<R> fmt::Debug for FieldDef<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Ordered field list for a record type.
pub struct Schema<R> {
    type_name: String,
    fields: Vec<FieldDef<R>>,
    index: HashMap<String, usize>,
}

impl<R> Schema<R> {
    pub fn builder(type_name: impl Into<String>) -> SchemaBuilder<R> {
        SchemaBuilder {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &[FieldDef<R>] {
        &self.fields
    }

    /// Case-sensitive lookup by column name.
    pub fn field(&self, name: &str) -> Option<&FieldDef<R>> {
        self.index.get(name).map(|idx| &self.fields[*idx])
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<R> fmt::Debug for Schema<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .finish()
    }
}

pub struct SchemaBuilder<R> {
    type_name: String,
    fields: Vec<FieldDef<R>>,
}

impl<R: 'static> SchemaBuilder<R> {
    /// Add a field backed by a concrete Rust type.
    pub fn field<T: FieldValue + 'static>(
        self,
        name: impl Into<String>,
        access: fn(&mut R) -> &mut T,
    ) -> Self {
        self.raw_field(name, T::KIND, move |record: &mut R, value| {
            match T::from_scalar(value) {
                Some(v) => {
                    *access(record) = v;
                    true
                }
                None => false,
            }
        })
    }

    /// Add a field whose kind and storage are only known at runtime.
    pub fn raw_field<F>(mut self, name: impl Into<String>, kind: FieldKind, assign: F) -> Self
    where
        F: Fn(&mut R, Scalar) -> bool + Send + Sync + 'static,
    {
        self.fields.push(FieldDef {
            name: name.into(),
            kind,
            assign: Box::new(assign),
        });
        self
    }

    /// Later duplicates of a name shadow earlier ones.
    pub fn build(self) -> Schema<R> {
        let index = self
            .fields
            .iter()
            .enumerate()
            .map(|(idx, f)| (f.name.clone(), idx))
            .collect();
        Schema {
            type_name: self.type_name,
            fields: self.fields,
            index,
        }
    }
}

/// A record type with a static schema.
pub trait Record: Default + 'static {
    fn schema() -> &'static Schema<Self>;
}

#[doc(hidden)]
#[macro_export]
macro_rules! __wmic_column_name {
    ($field:ident) => {
        stringify!($field)
    };
    ($field:ident, $column:literal) => {
        $column
    };
}

/// Declare a record struct and implement [`Record`] for it.
///
/// ```
/// wmic_decode::wmic_record! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct Process {
///         pub name: String => "Name",
///         pub process_id: u32 => "ProcessId",
///     }
/// }
///
/// use wmic_decode::Record;
/// let names: Vec<&str> = Process::schema().field_names().collect();
/// assert_eq!(names, vec!["Name", "ProcessId"]);
/// ```
#[macro_export]
macro_rules! wmic_record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $ty:ty $(=> $column:literal)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Default)]
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $ty,
            )*
        }

        impl $crate::schema::Record for $name {
            fn schema() -> &'static $crate::schema::Schema<Self> {
                static SCHEMA: $crate::__private::Lazy<$crate::schema::Schema<$name>> =
                    $crate::__private::Lazy::new(|| {
                        $crate::schema::Schema::builder(stringify!($name))
                            $(
                                .field::<$ty>(
                                    $crate::__wmic_column_name!($field $(, $column)?),
                                    |record: &mut $name| &mut record.$field,
                                )
                            )*
                            .build()
                    });
                &SCHEMA
            }
        }
    };
}
