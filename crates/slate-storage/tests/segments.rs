use std::sync::Arc;

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use slate_storage::{
    AttributeVector, DictionarySegment, ReferenceSegment, RowId, StorageError, Table, Value,
    ValueSegment, INVALID_VALUE_ID, NULL_ROW_ID, NULL_VALUE_ID,
};

fn string_segment_with_null() -> ValueSegment<String> {
    let segment = ValueSegment::<String>::new(true);
    for name in ["Bill", "Steve", "Alexander", "Steve", "Hasso", "Bill"] {
        segment.append(&Value::from(name)).unwrap();
    }
    segment.append(&Value::Null).unwrap();
    segment
}

#[test]
fn value_segment_append_and_read() {
    let segment = ValueSegment::<i32>::new(false);
    segment.append(&Value::Int(4)).unwrap();
    segment.append(&Value::Int(6)).unwrap();

    assert_eq!(segment.size(), 2);
    assert!(!segment.is_nullable());
    assert_eq!(segment.get(0).unwrap(), 4);
    assert_eq!(segment.at(1).unwrap(), Value::Int(6));
    assert_eq!(segment.values(), vec![4, 6]);
    assert_eq!(
        segment.at(2),
        Err(StorageError::OutOfBounds { index: 2, len: 2 })
    );
}

#[test]
fn value_segment_rejects_mismatched_cells() {
    let segment = ValueSegment::<i32>::new(false);
    assert_eq!(
        segment.append(&Value::from("four")),
        Err(StorageError::TypeMismatch {
            expected: slate_storage::DataType::Int,
            value: Value::from("four"),
        })
    );
    assert_eq!(segment.append(&Value::Null), Err(StorageError::NotNullable));
    assert_eq!(segment.size(), 0);
}

#[test]
fn value_segment_null_handling() {
    let segment = string_segment_with_null();

    assert_eq!(segment.size(), 7);
    assert!(segment.is_null(6).unwrap());
    assert!(!segment.is_null(0).unwrap());
    assert_eq!(segment.get(6), Err(StorageError::NullAccess { offset: 6 }));
    assert_eq!(segment.get_typed_value(6).unwrap(), None);
    assert_eq!(segment.at(6).unwrap(), Value::Null);
    assert_eq!(
        segment.null_values().unwrap(),
        vec![false, false, false, false, false, false, true]
    );
}

#[test]
fn non_nullable_segment_has_no_null_bitmap() {
    let segment = ValueSegment::<i64>::new(false);
    segment.append(&Value::Long(1)).unwrap();
    assert_eq!(segment.null_values(), Err(StorageError::NotNullable));
    assert!(!segment.is_null(0).unwrap());
}

#[test]
fn dictionary_compression_of_string_segment() {
    let dict_segment = DictionarySegment::from_value_segment(&string_segment_with_null());

    assert_eq!(dict_segment.size(), 7);
    assert_eq!(dict_segment.unique_values_count(), 4);
    assert_eq!(
        dict_segment.dictionary(),
        &["Alexander", "Bill", "Hasso", "Steve"]
    );
    assert_eq!(dict_segment.value_of_value_id(1).unwrap(), "Bill");
    assert_eq!(
        dict_segment.value_of_value_id(4),
        Err(StorageError::InvalidValueId {
            value_id: 4,
            unique_values: 4,
        })
    );

    assert_eq!(dict_segment.get(0).unwrap(), "Bill");
    assert_eq!(dict_segment.at(0).unwrap(), Value::from("Bill"));

    // Four distinct values fit the narrowest attribute vector.
    assert_eq!(dict_segment.attribute_vector().width(), 1);
    assert_eq!(dict_segment.null_value_id(), 255);
    assert_eq!(dict_segment.attribute_vector().get(6).unwrap(), 255);
    assert_eq!(dict_segment.get_typed_value(6).unwrap(), None);
    assert_eq!(
        dict_segment.get(6),
        Err(StorageError::NullAccess { offset: 6 })
    );
}

#[test]
fn dictionary_compression_keeps_defaults_distinct_from_null() {
    let segment = ValueSegment::<String>::new(true);
    segment.append(&Value::from("")).unwrap();

    let dict_segment = DictionarySegment::from_value_segment(&segment);
    assert_eq!(dict_segment.get(0).unwrap(), "");
    assert_eq!(dict_segment.unique_values_count(), 1);
}

#[test]
fn dictionary_memory_estimate_counts_dictionary_and_attribute_vector() {
    let segment = ValueSegment::<f64>::new(false);
    for value in [2.3, 1.2, 2.3] {
        segment.append(&Value::Double(value)).unwrap();
    }

    let dict_segment = DictionarySegment::from_value_segment(&segment);
    assert_eq!(dict_segment.unique_values_count(), 2);
    assert_eq!(
        dict_segment.estimate_memory_usage(),
        2 * std::mem::size_of::<f64>() + 3
    );
}

#[test]
fn dictionary_bound_search() {
    let segment = ValueSegment::<i32>::new(false);
    for value in (0..=10).step_by(2) {
        segment.append(&Value::Int(value)).unwrap();
    }
    let dict_segment = DictionarySegment::from_value_segment(&segment);

    assert_eq!(dict_segment.lower_bound(&4), 2);
    assert_eq!(dict_segment.upper_bound(&4), 3);
    assert_eq!(dict_segment.lower_bound(&5), 3);
    assert_eq!(dict_segment.upper_bound(&5), 3);
    assert_eq!(dict_segment.lower_bound(&15), INVALID_VALUE_ID);
    assert_eq!(dict_segment.upper_bound(&15), INVALID_VALUE_ID);

    assert_eq!(dict_segment.lower_bound_value(&Value::Int(4)).unwrap(), 2);
    assert_eq!(dict_segment.upper_bound_value(&Value::Int(4)).unwrap(), 3);
    assert_eq!(
        dict_segment.lower_bound_value(&Value::from("4")),
        Err(StorageError::TypeMismatch {
            expected: slate_storage::DataType::Int,
            value: Value::from("4"),
        })
    );
}

#[test]
fn attribute_vector_width_tracks_cardinality() {
    let segment = ValueSegment::<i32>::new(false);
    for value in 0..255 {
        segment.append(&Value::Int(value)).unwrap();
    }
    let dict_segment = DictionarySegment::from_value_segment(&segment);
    assert_eq!(dict_segment.unique_values_count(), 255);
    assert_eq!(dict_segment.attribute_vector().width(), 1);

    // One more distinct value would collide with the u8 null sentinel, so
    // 256 entries need 16-bit ids.
    segment.append(&Value::Int(255)).unwrap();
    let dict_segment = DictionarySegment::from_value_segment(&segment);
    assert_eq!(dict_segment.unique_values_count(), 256);
    assert_eq!(dict_segment.attribute_vector().width(), 2);
    assert_eq!(dict_segment.null_value_id(), u16::MAX as u32);
}

#[test]
fn attribute_vector_get_set_bounds_and_overflow() {
    let mut vector = AttributeVector::from_value_ids(&[0, 1, 2, NULL_VALUE_ID], 3).unwrap();
    assert_eq!(vector.width(), 1);
    assert_eq!(vector.len(), 4);
    assert_eq!(vector.get(1).unwrap(), 1);
    assert_eq!(vector.get(3).unwrap(), 255);
    assert_eq!(
        vector.get(4),
        Err(StorageError::OutOfBounds { index: 4, len: 4 })
    );

    vector.set(1, 2).unwrap();
    assert_eq!(vector.get(1).unwrap(), 2);
    vector.set(1, NULL_VALUE_ID).unwrap();
    assert_eq!(vector.get(1).unwrap(), 255);
    assert_eq!(
        vector.set(1, 300),
        Err(StorageError::Overflow { value_id: 300 })
    );
    assert_eq!(
        vector.set(9, 0),
        Err(StorageError::OutOfBounds { index: 9, len: 4 })
    );

    assert_eq!(
        AttributeVector::from_value_ids(&[500], 3),
        Err(StorageError::Overflow { value_id: 500 })
    );
}

fn two_column_table() -> Arc<Table> {
    let mut table = Table::new(10);
    table.add_column("id", "int", false).unwrap();
    table.add_column("name", "string", true).unwrap();
    table.append(&[Value::Int(1), Value::from("one")]).unwrap();
    table.append(&[Value::Int(2), Value::Null]).unwrap();
    table.append(&[Value::Int(3), Value::from("three")]).unwrap();
    Arc::new(table)
}

#[test]
fn reference_segment_delegates_reads() {
    let table = two_column_table();
    let pos_list = Arc::new(vec![
        RowId {
            chunk_id: 0,
            chunk_offset: 2,
        },
        RowId {
            chunk_id: 0,
            chunk_offset: 0,
        },
        NULL_ROW_ID,
    ]);

    let names = ReferenceSegment::new(Arc::clone(&table), 1, Arc::clone(&pos_list));
    assert_eq!(names.size(), 3);
    assert_eq!(names.at(0).unwrap(), Value::from("three"));
    assert_eq!(names.at(1).unwrap(), Value::from("one"));
    assert_eq!(names.at(2).unwrap(), Value::Null);
    assert_eq!(
        names.at(3),
        Err(StorageError::OutOfBounds { index: 3, len: 3 })
    );

    let ids = ReferenceSegment::new(Arc::clone(&table), 0, pos_list);
    assert_eq!(ids.at(0).unwrap(), Value::Int(3));
    assert_eq!(ids.referenced_column_id(), 0);
    assert!(Arc::ptr_eq(ids.referenced_table(), &table));
}

#[test]
fn reference_segment_reads_through_compressed_chunks() {
    let table = two_column_table();
    let pos_list = Arc::new(vec![RowId {
        chunk_id: 0,
        chunk_offset: 1,
    }]);
    let names = ReferenceSegment::new(Arc::clone(&table), 1, pos_list);

    assert_eq!(names.at(0).unwrap(), Value::Null);
    table.compress_chunk(0).unwrap();
    assert_eq!(names.at(0).unwrap(), Value::Null);
}

proptest! {
    // Compressing a segment and reading it back cell by cell yields the
    // original cells, nulls included, and the dictionary stays strictly
    // ascending.
    #[test]
    fn dictionary_round_trip(cells in prop::collection::vec(prop::option::of(any::<i32>()), 0..200)) {
        let segment = ValueSegment::<i32>::new(true);
        for cell in &cells {
            let value = match cell {
                Some(v) => Value::Int(*v),
                None => Value::Null,
            };
            segment.append(&value).unwrap();
        }

        let dict_segment = DictionarySegment::from_value_segment(&segment);
        prop_assert_eq!(dict_segment.size(), cells.len());
        for (offset, cell) in cells.iter().enumerate() {
            prop_assert_eq!(dict_segment.get_typed_value(offset as u32).unwrap(), *cell);
        }

        let dictionary = dict_segment.dictionary();
        prop_assert!(dictionary.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
