//! The tagged segment variant: every column slice is a value segment, a
//! dictionary segment, or a reference segment, behind one read interface.

use std::sync::Arc;

use crate::dictionary_segment::DictionarySegment;
use crate::error::StorageError;
use crate::reference_segment::ReferenceSegment;
use crate::types::{ChunkOffset, DataType, Value};
use crate::value_segment::ValueSegment;

/// Shared handle to a typed [`ValueSegment`], with the element type lifted
/// into the variant tag.
#[derive(Clone, Debug)]
pub enum ValueSegmentRef {
    Int(Arc<ValueSegment<i32>>),
    Long(Arc<ValueSegment<i64>>),
    Float(Arc<ValueSegment<f32>>),
    Double(Arc<ValueSegment<f64>>),
    String(Arc<ValueSegment<String>>),
}

/// Shared handle to a typed [`DictionarySegment`].
#[derive(Clone, Debug)]
pub enum DictionarySegmentRef {
    Int(Arc<DictionarySegment<i32>>),
    Long(Arc<DictionarySegment<i64>>),
    Float(Arc<DictionarySegment<f32>>),
    Double(Arc<DictionarySegment<f64>>),
    String(Arc<DictionarySegment<String>>),
}

/// One column slice of one chunk, in whichever representation it currently
/// has. The set of variants is closed, so all dispatch is a plain `match`.
#[derive(Clone, Debug)]
pub enum Segment {
    Value(ValueSegmentRef),
    Dictionary(DictionarySegmentRef),
    Reference(Arc<ReferenceSegment>),
}

/// Dispatch a type-generic body on the typed segment inside a
/// [`ValueSegmentRef`]. `$seg` binds the `Arc<ValueSegment<T>>` in each arm.
#[macro_export]
macro_rules! with_value_segment {
    ($segment:expr, $seg:ident => $body:expr) => {
        match $segment {
            $crate::ValueSegmentRef::Int($seg) => $body,
            $crate::ValueSegmentRef::Long($seg) => $body,
            $crate::ValueSegmentRef::Float($seg) => $body,
            $crate::ValueSegmentRef::Double($seg) => $body,
            $crate::ValueSegmentRef::String($seg) => $body,
        }
    };
}

/// Dispatch a type-generic body on the typed segment inside a
/// [`DictionarySegmentRef`].
#[macro_export]
macro_rules! with_dictionary_segment {
    ($segment:expr, $seg:ident => $body:expr) => {
        match $segment {
            $crate::DictionarySegmentRef::Int($seg) => $body,
            $crate::DictionarySegmentRef::Long($seg) => $body,
            $crate::DictionarySegmentRef::Float($seg) => $body,
            $crate::DictionarySegmentRef::Double($seg) => $body,
            $crate::DictionarySegmentRef::String($seg) => $body,
        }
    };
}

impl ValueSegmentRef {
    /// A fresh, empty segment for the given element type.
    pub fn new(data_type: DataType, nullable: bool) -> Self {
        match data_type {
            DataType::Int => Self::Int(Arc::new(ValueSegment::new(nullable))),
            DataType::Long => Self::Long(Arc::new(ValueSegment::new(nullable))),
            DataType::Float => Self::Float(Arc::new(ValueSegment::new(nullable))),
            DataType::Double => Self::Double(Arc::new(ValueSegment::new(nullable))),
            DataType::String => Self::String(Arc::new(ValueSegment::new(nullable))),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Self::Int(_) => DataType::Int,
            Self::Long(_) => DataType::Long,
            Self::Float(_) => DataType::Float,
            Self::Double(_) => DataType::Double,
            Self::String(_) => DataType::String,
        }
    }

    pub fn size(&self) -> usize {
        with_value_segment!(self, seg => seg.size())
    }

    pub fn check_append(&self, value: &Value) -> Result<(), StorageError> {
        with_value_segment!(self, seg => seg.check_append(value))
    }

    pub fn append(&self, value: &Value) -> Result<(), StorageError> {
        with_value_segment!(self, seg => seg.append(value))
    }

    pub fn at(&self, offset: ChunkOffset) -> Result<Value, StorageError> {
        with_value_segment!(self, seg => seg.at(offset))
    }

    pub fn estimate_memory_usage(&self) -> usize {
        with_value_segment!(self, seg => seg.estimate_memory_usage())
    }

    /// Build the dictionary-encoded equivalent of this segment.
    pub fn compress(&self) -> DictionarySegmentRef {
        match self {
            Self::Int(seg) => {
                DictionarySegmentRef::Int(Arc::new(DictionarySegment::from_value_segment(seg)))
            }
            Self::Long(seg) => {
                DictionarySegmentRef::Long(Arc::new(DictionarySegment::from_value_segment(seg)))
            }
            Self::Float(seg) => {
                DictionarySegmentRef::Float(Arc::new(DictionarySegment::from_value_segment(seg)))
            }
            Self::Double(seg) => {
                DictionarySegmentRef::Double(Arc::new(DictionarySegment::from_value_segment(seg)))
            }
            Self::String(seg) => {
                DictionarySegmentRef::String(Arc::new(DictionarySegment::from_value_segment(seg)))
            }
        }
    }
}

impl DictionarySegmentRef {
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Int(_) => DataType::Int,
            Self::Long(_) => DataType::Long,
            Self::Float(_) => DataType::Float,
            Self::Double(_) => DataType::Double,
            Self::String(_) => DataType::String,
        }
    }

    pub fn size(&self) -> usize {
        with_dictionary_segment!(self, seg => seg.size())
    }

    pub fn at(&self, offset: ChunkOffset) -> Result<Value, StorageError> {
        with_dictionary_segment!(self, seg => seg.at(offset))
    }

    pub fn unique_values_count(&self) -> usize {
        with_dictionary_segment!(self, seg => seg.unique_values_count())
    }

    pub fn estimate_memory_usage(&self) -> usize {
        with_dictionary_segment!(self, seg => seg.estimate_memory_usage())
    }
}

impl Segment {
    /// Number of rows in this segment.
    pub fn size(&self) -> usize {
        match self {
            Self::Value(seg) => seg.size(),
            Self::Dictionary(seg) => seg.size(),
            Self::Reference(seg) => seg.size(),
        }
    }

    /// The cell at `offset` as a polymorphic value, whatever the
    /// representation.
    pub fn at(&self, offset: ChunkOffset) -> Result<Value, StorageError> {
        match self {
            Self::Value(seg) => seg.at(offset),
            Self::Dictionary(seg) => seg.at(offset),
            Self::Reference(seg) => seg.at(offset),
        }
    }

    pub fn estimate_memory_usage(&self) -> usize {
        match self {
            Self::Value(seg) => seg.estimate_memory_usage(),
            Self::Dictionary(seg) => seg.estimate_memory_usage(),
            Self::Reference(seg) => seg.estimate_memory_usage(),
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference(_))
    }
}

impl<T> From<Arc<ValueSegment<T>>> for Segment
where
    ValueSegmentRef: From<Arc<ValueSegment<T>>>,
{
    fn from(segment: Arc<ValueSegment<T>>) -> Self {
        Self::Value(segment.into())
    }
}

macro_rules! impl_segment_from {
    ($T:ty, $variant:ident) => {
        impl From<Arc<ValueSegment<$T>>> for ValueSegmentRef {
            fn from(segment: Arc<ValueSegment<$T>>) -> Self {
                Self::$variant(segment)
            }
        }

        impl From<Arc<DictionarySegment<$T>>> for DictionarySegmentRef {
            fn from(segment: Arc<DictionarySegment<$T>>) -> Self {
                Self::$variant(segment)
            }
        }
    };
}

impl_segment_from!(i32, Int);
impl_segment_from!(i64, Long);
impl_segment_from!(f32, Float);
impl_segment_from!(f64, Double);
impl_segment_from!(String, String);
