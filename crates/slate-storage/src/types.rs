//! Element types, polymorphic cells, and the identifiers used across the
//! storage layer.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Index of a column within a table (and of a segment within a chunk).
pub type ColumnId = u16;
/// Index of a chunk within a table.
pub type ChunkId = u32;
/// Row index within a single chunk.
pub type ChunkOffset = u32;
/// Index into a dictionary segment's sorted dictionary.
pub type ValueId = u32;

/// Sentinel for "no value id", e.g. a bound search that ran past the end of
/// the dictionary. Narrower attribute vectors store it as their own width
/// maximum (see [`crate::AttributeVector`]).
pub const INVALID_VALUE_ID: ValueId = ValueId::MAX;
/// By convention, NULL cells are encoded with the invalid value id.
pub const NULL_VALUE_ID: ValueId = INVALID_VALUE_ID;

pub const INVALID_CHUNK_ID: ChunkId = ChunkId::MAX;
pub const INVALID_CHUNK_OFFSET: ChunkOffset = ChunkOffset::MAX;

/// Position of a single row: which chunk, and which row within that chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowId {
    pub chunk_id: ChunkId,
    pub chunk_offset: ChunkOffset,
}

/// The distinguished row id a reference segment resolves to NULL.
pub const NULL_ROW_ID: RowId = RowId {
    chunk_id: INVALID_CHUNK_ID,
    chunk_offset: INVALID_CHUNK_OFFSET,
};

impl RowId {
    pub fn is_null(self) -> bool {
        self == NULL_ROW_ID
    }
}

/// Ordered sequence of row ids; the payload of a reference segment.
pub type PosList = Vec<RowId>;

/// The closed set of column element types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Int,
    Long,
    Float,
    Double,
    String,
}

impl DataType {
    /// Resolve one of the accepted type names (`"int"`, `"long"`, `"float"`,
    /// `"double"`, `"string"`).
    pub fn from_name(name: &str) -> Result<Self, StorageError> {
        match name {
            "int" => Ok(Self::Int),
            "long" => Ok(Self::Long),
            "float" => Ok(Self::Float),
            "double" => Ok(Self::Double),
            "string" => Ok(Self::String),
            _ => Err(StorageError::UnknownType {
                name: name.to_owned(),
            }),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A polymorphic cell: one of the five supported element types, or NULL.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The element type of this cell, or `None` for NULL.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Self::Null => None,
            Self::Int(_) => Some(DataType::Int),
            Self::Long(_) => Some(DataType::Long),
            Self::Float(_) => Some(DataType::Float),
            Self::Double(_) => Some(DataType::Double),
            Self::String(_) => Some(DataType::String),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for i32 {}
    impl Sealed for i64 {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
    impl Sealed for String {}
}

/// One of the five supported column element types.
///
/// The trait carries everything the type-generic storage and scan code needs:
/// the runtime [`DataType`] tag, conversion to and from polymorphic cells,
/// and a total order. The total order is what dictionaries are sorted and
/// searched by; for the float types it is `total_cmp`, so NaN has a defined
/// slot instead of poisoning sort and binary search.
pub trait ColumnValue:
    sealed::Sealed + Clone + fmt::Debug + Default + Send + Sync + 'static
{
    const DATA_TYPE: DataType;

    /// Extract a typed value from a cell. The cell must carry exactly this
    /// element type; anything else (including NULL) is a type mismatch.
    fn from_value(value: &Value) -> Result<Self, StorageError>;

    fn into_value(self) -> Value;

    fn total_cmp(&self, other: &Self) -> Ordering;
}

macro_rules! impl_column_value {
    ($T:ty, $variant:ident, |$a:ident, $b:ident| $cmp:expr) => {
        impl ColumnValue for $T {
            const DATA_TYPE: DataType = DataType::$variant;

            fn from_value(value: &Value) -> Result<Self, StorageError> {
                match value {
                    Value::$variant(v) => Ok(v.clone()),
                    other => Err(StorageError::TypeMismatch {
                        expected: Self::DATA_TYPE,
                        value: other.clone(),
                    }),
                }
            }

            fn into_value(self) -> Value {
                Value::$variant(self)
            }

            fn total_cmp(&self, other: &Self) -> Ordering {
                let ($a, $b) = (self, other);
                $cmp
            }
        }
    };
}

impl_column_value!(i32, Int, |a, b| a.cmp(b));
impl_column_value!(i64, Long, |a, b| a.cmp(b));
impl_column_value!(f32, Float, |a, b| a.total_cmp(b));
impl_column_value!(f64, Double, |a, b| a.total_cmp(b));
impl_column_value!(String, String, |a, b| a.cmp(b));

/// Dispatch a type-generic body on a runtime [`DataType`].
///
/// The body is instantiated once per supported element type; each arm is
/// monomorphic. `$T` names the element type inside the body:
///
/// ```
/// use slate_storage::{with_data_type, DataType};
///
/// let data_type = DataType::Long;
/// let size = with_data_type!(data_type, T => std::mem::size_of::<T>());
/// assert_eq!(size, 8);
/// ```
#[macro_export]
macro_rules! with_data_type {
    ($data_type:expr, $T:ident => $body:expr) => {
        match $data_type {
            $crate::DataType::Int => {
                type $T = i32;
                $body
            }
            $crate::DataType::Long => {
                type $T = i64;
                $body
            }
            $crate::DataType::Float => {
                type $T = f32;
                $body
            }
            $crate::DataType::Double => {
                type $T = f64;
                $body
            }
            $crate::DataType::String => {
                type $T = ::std::string::String;
                $body
            }
        }
    };
}
