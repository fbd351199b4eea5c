use std::sync::Arc;
use std::thread;
use std::time::Duration;

use pretty_assertions::assert_eq;

use slate_storage::{Chunk, DataType, Segment, StorageError, Table, Value, ValueSegment};

fn sample_table() -> Table {
    let mut table = Table::new(2);
    table.add_column("col_1", "int", false).unwrap();
    table.add_column("col_2", "string", true).unwrap();
    table
}

#[test]
fn chunks_are_assembled_segment_by_segment() {
    let ints = Arc::new(ValueSegment::<i32>::new(false));
    let names = Arc::new(ValueSegment::<String>::new(false));
    for (id, name) in [(4, "Hello,"), (6, "world"), (3, "!")] {
        ints.append(&Value::Int(id)).unwrap();
        names.append(&Value::from(name)).unwrap();
    }

    let mut chunk = Chunk::new();
    assert_eq!(chunk.size(), 0);
    chunk.add_segment(ints.into()).unwrap();
    chunk.add_segment(names.into()).unwrap();
    assert_eq!(chunk.column_count(), 2);
    assert_eq!(chunk.size(), 3);

    chunk.append(&[Value::Int(2), Value::from("two")]).unwrap();
    assert_eq!(chunk.size(), 4);
    assert_eq!(chunk.segment(0).unwrap().size(), 4);
    assert_eq!(chunk.segment(1).unwrap().at(3).unwrap(), Value::from("two"));

    assert_eq!(
        chunk.append(&[]),
        Err(StorageError::Arity {
            expected: 2,
            actual: 0,
        })
    );
    assert_eq!(chunk.size(), 4);

    // Both segments here are non-nullable, so a NULL in the second column
    // rejects the row without touching the first.
    assert_eq!(
        chunk.append(&[Value::Int(9), Value::Null]),
        Err(StorageError::NotNullable)
    );
    assert_eq!(chunk.segment(0).unwrap().size(), 4);
    assert_eq!(chunk.segment(1).unwrap().size(), 4);
    assert!(matches!(
        chunk.segment(2),
        Err(StorageError::InvalidColumnId { column_id: 2, .. })
    ));
}

#[test]
fn appends_roll_over_into_new_chunks() {
    let table = sample_table();
    assert_eq!(table.chunk_count(), 1);

    table.append(&[Value::Int(4), Value::from("Hello,")]).unwrap();
    table.append(&[Value::Int(6), Value::from("world")]).unwrap();
    table.append(&[Value::Int(3), Value::from("!")]).unwrap();

    assert_eq!(table.chunk_count(), 2);
    assert_eq!(table.row_count(), 3);
    assert_eq!(table.get_chunk(0).unwrap().size(), 2);
    assert_eq!(table.get_chunk(1).unwrap().size(), 1);
    assert!(matches!(
        table.get_chunk(7),
        Err(StorageError::InvalidChunkId { chunk_id: 7, .. })
    ));
}

#[test]
fn append_validates_arity_and_types() {
    let table = sample_table();
    assert_eq!(
        table.append(&[Value::Int(1)]),
        Err(StorageError::Arity {
            expected: 2,
            actual: 1,
        })
    );
    assert!(matches!(
        table.append(&[Value::from("x"), Value::from("y")]),
        Err(StorageError::TypeMismatch {
            expected: DataType::Int,
            ..
        })
    ));

    // A mismatch in a later column must not leave earlier columns one cell
    // longer: the whole row is rejected.
    assert!(matches!(
        table.append(&[Value::Int(1), Value::Int(2)]),
        Err(StorageError::TypeMismatch {
            expected: DataType::String,
            ..
        })
    ));
    let chunk = table.get_chunk(0).unwrap();
    assert_eq!(chunk.segment(0).unwrap().size(), 0);
    assert_eq!(chunk.segment(1).unwrap().size(), 0);
    assert_eq!(table.row_count(), 0);

    table.append(&[Value::Int(7), Value::Null]).unwrap();
    assert_eq!(table.row_count(), 1);
}

#[test]
fn schema_introspection() {
    let table = sample_table();

    assert_eq!(table.column_count(), 2);
    assert_eq!(table.column_names(), ["col_1", "col_2"]);
    assert_eq!(table.column_name(0).unwrap(), "col_1");
    assert_eq!(table.column_type(0).unwrap(), DataType::Int);
    assert_eq!(table.column_type(1).unwrap(), DataType::String);
    assert!(!table.column_nullable(0).unwrap());
    assert!(table.column_nullable(1).unwrap());
    assert_eq!(table.column_id_by_name("col_2").unwrap(), 1);
    assert_eq!(table.target_chunk_size(), 2);

    assert!(matches!(
        table.column_name(7),
        Err(StorageError::InvalidColumnId { column_id: 7, .. })
    ));
    assert!(matches!(
        table.column_id_by_name("no_such_column"),
        Err(StorageError::InvalidColumnName { .. })
    ));
}

#[test]
fn add_column_requires_an_empty_table() {
    let mut table = sample_table();
    table.append(&[Value::Int(1), Value::Null]).unwrap();
    assert_eq!(
        table.add_column("col_3", "double", false),
        Err(StorageError::NotEmpty)
    );
}

#[test]
fn add_column_rejects_unknown_types_and_duplicate_names() {
    let mut table = Table::new(2);
    assert_eq!(
        table.add_column("col_1", "text", false),
        Err(StorageError::UnknownType {
            name: "text".to_owned(),
        })
    );
    table.add_column("col_1", "int", false).unwrap();
    assert_eq!(
        table.add_column("col_1", "long", false),
        Err(StorageError::InvalidColumnName {
            name: "col_1".to_owned(),
        })
    );
}

fn cell(table: &Table, chunk_id: u32, column_id: u16, offset: u32) -> Value {
    table
        .get_chunk(chunk_id)
        .unwrap()
        .segment(column_id)
        .unwrap()
        .at(offset)
        .unwrap()
}

#[test]
fn compress_chunk_swaps_in_dictionary_segments() {
    let table = sample_table();
    table.append(&[Value::Int(4), Value::from("Hello,")]).unwrap();
    table.append(&[Value::Int(6), Value::from("world")]).unwrap();
    table.append(&[Value::Int(3), Value::Null]).unwrap();

    // Readers holding the chunk keep their view across the swap.
    let before = table.get_chunk(0).unwrap();

    table.compress_chunk(0).unwrap();
    let after = table.get_chunk(0).unwrap();
    assert!(matches!(after.segment(0).unwrap(), Segment::Dictionary(_)));
    assert!(matches!(after.segment(1).unwrap(), Segment::Dictionary(_)));
    assert!(matches!(before.segment(0).unwrap(), Segment::Value(_)));

    assert_eq!(table.row_count(), 3);
    assert_eq!(cell(&table, 0, 0, 0), Value::Int(4));
    assert_eq!(cell(&table, 0, 1, 1), Value::from("world"));
    assert_eq!(cell(&table, 1, 0, 0), Value::Int(3));
    assert_eq!(cell(&table, 1, 1, 0), Value::Null);
}

#[test]
fn compressing_the_tail_opens_a_fresh_chunk_first() {
    let table = sample_table();
    table.append(&[Value::Int(1), Value::from("a")]).unwrap();
    assert_eq!(table.chunk_count(), 1);

    table.compress_chunk(0).unwrap();
    assert_eq!(table.chunk_count(), 2);

    // The compressed chunk no longer takes rows; the fresh tail does.
    table.append(&[Value::Int(2), Value::from("b")]).unwrap();
    assert_eq!(table.get_chunk(0).unwrap().size(), 1);
    assert_eq!(table.get_chunk(1).unwrap().size(), 1);
    assert_eq!(cell(&table, 1, 0, 0), Value::Int(2));
}

#[test]
fn compress_chunk_validates_the_chunk_id() {
    let table = sample_table();
    assert!(matches!(
        table.compress_chunk(3),
        Err(StorageError::InvalidChunkId { chunk_id: 3, .. })
    ));
}

#[test]
fn compressing_a_compressed_chunk_fails() {
    let table = sample_table();
    table.append(&[Value::Int(1), Value::from("a")]).unwrap();
    table.compress_chunk(0).unwrap();
    assert_eq!(
        table.compress_chunk(0),
        Err(StorageError::NotValueSegment)
    );
}

#[test]
fn concurrent_compression_and_append() {
    let mut table = Table::new(11_111);
    table.add_column("value", "int", false).unwrap();
    let table = Arc::new(table);
    for row in 0..10_000 {
        table.append(&[Value::Int(row)]).unwrap();
    }

    let compressor = {
        let table = Arc::clone(&table);
        thread::spawn(move || table.compress_chunk(0))
    };
    let appender = {
        let table = Arc::clone(&table);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            table.append(&[Value::Int(42)])
        })
    };
    compressor.join().unwrap().unwrap();
    appender.join().unwrap().unwrap();

    assert_eq!(table.row_count(), 10_001);
    assert!(matches!(
        table.get_chunk(0).unwrap().segment(0).unwrap(),
        Segment::Dictionary(_)
    ));

    let mut values = Vec::new();
    for chunk_id in 0..table.chunk_count() as u32 {
        let chunk = table.get_chunk(chunk_id).unwrap();
        let segment = chunk.segment(0).unwrap();
        for offset in 0..segment.size() as u32 {
            values.push(segment.at(offset).unwrap());
        }
    }
    assert_eq!(values.len(), 10_001);
    assert!(values.contains(&Value::Int(42)));
}
