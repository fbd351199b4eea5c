use std::sync::Arc;
use std::time::Instant;

use slate_ops::{CmpOp, GetTable, Operator, TableScan};
use slate_storage::{Catalog, Table, Value};

fn main() {
    let rows: usize = std::env::var("ROWS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(1_000_000);

    let mut table = Table::new(65_535);
    table
        .add_column("category", "string", false)
        .expect("fresh table accepts columns");
    table
        .add_column("value", "int", true)
        .expect("fresh table accepts columns");

    let categories: Vec<String> = (0..1024).map(|i| format!("C{i:04}")).collect();

    let start_build = Instant::now();
    let table = Arc::new(table);
    for i in 0..rows {
        let value = if i % 100 == 0 {
            Value::Null
        } else {
            Value::Int((i % 1000) as i32)
        };
        table
            .append(&[
                Value::from(categories[i % categories.len()].as_str()),
                value,
            ])
            .expect("append should succeed");
    }
    println!("build time: {:?}", start_build.elapsed());

    let start_compress = Instant::now();
    for chunk_id in 0..table.chunk_count() as u32 {
        table
            .compress_chunk(chunk_id)
            .expect("value chunks compress");
    }
    println!("compress time: {:?}", start_compress.elapsed());

    let catalog = Arc::new(Catalog::new());
    catalog
        .add_table("events", table)
        .expect("name is unused");

    let get_table = Arc::new(GetTable::new(Arc::clone(&catalog), "events"));
    get_table.execute().expect("table is registered");

    let start_scan = Instant::now();
    let scan = TableScan::new(get_table, 1, CmpOp::Gte, Value::Int(900));
    scan.execute().expect("scan should succeed");
    let output = scan.output().expect("scan has executed");
    println!("scan matches: {}", output.row_count());
    println!("scan time: {:?}", start_scan.elapsed());

    // Scan the scan: the second filter runs over reference segments and
    // still points its output at the base table.
    let start_rescan = Instant::now();
    let rescan = TableScan::new(
        Arc::new(scan),
        0,
        CmpOp::Eq,
        Value::from("C0000"),
    );
    rescan.execute().expect("rescan should succeed");
    let narrowed = rescan.output().expect("rescan has executed");
    println!("rescan matches: {}", narrowed.row_count());
    println!("rescan time: {:?}", start_rescan.elapsed());
}
