//! End-to-end tests: build a block, serialize it, parse it back, and read it.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use strata_block::{
    utils, AnyDataBlock, BlockError, BlockType, ColumnDataType, DataBlock, DataBlockBuilder,
    DataSchema, MetadataKey, RowDataBlock, Value,
};
use strata_common::QueryErrorCode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Sketch {
    registers: Vec<u8>,
    precision: u8,
}

fn wide_schema() -> DataSchema {
    DataSchema::new(vec![
        ("i".to_string(), ColumnDataType::Int),
        ("l".to_string(), ColumnDataType::Long),
        ("f".to_string(), ColumnDataType::Float),
        ("d".to_string(), ColumnDataType::Double),
        ("b".to_string(), ColumnDataType::Boolean),
        ("ts".to_string(), ColumnDataType::Timestamp),
        ("s".to_string(), ColumnDataType::String),
        ("ds".to_string(), ColumnDataType::DictString),
        ("raw".to_string(), ColumnDataType::Bytes),
        ("obj".to_string(), ColumnDataType::Object),
        ("ia".to_string(), ColumnDataType::IntArray),
        ("la".to_string(), ColumnDataType::LongArray),
        ("fa".to_string(), ColumnDataType::FloatArray),
        ("da".to_string(), ColumnDataType::DoubleArray),
        ("sa".to_string(), ColumnDataType::StringArray),
    ])
}

fn wide_rows() -> Vec<Vec<Value>> {
    let sketch = Value::object(&Sketch {
        registers: vec![1, 2, 3],
        precision: 12,
    })
    .expect("Failed to encode object");
    vec![
        vec![
            Value::Int(-1),
            Value::Long(1 << 40),
            Value::Float(0.5),
            Value::Double(2.25),
            Value::Boolean(true),
            Value::Timestamp(1_700_000_000_000),
            Value::from("héllo"),
            Value::from("us"),
            Value::Bytes(vec![0, 255]),
            sketch,
            Value::IntArray(vec![1, 2, 3]),
            Value::LongArray(vec![i64::MIN, i64::MAX]),
            Value::FloatArray(vec![1.5]),
            Value::DoubleArray(vec![]),
            Value::StringArray(vec!["a".into(), "".into(), "ccc".into()]),
        ],
        vec![
            Value::Null,
            Value::Long(0),
            Value::Null,
            Value::Double(-0.5),
            Value::Boolean(false),
            Value::Null,
            Value::Null,
            Value::from("eu"),
            Value::Null,
            Value::Null,
            Value::Null,
            Value::LongArray(vec![]),
            Value::Null,
            Value::DoubleArray(vec![3.0, 4.0]),
            Value::Null,
        ],
        vec![
            Value::Int(42),
            Value::Null,
            Value::Float(-1.0),
            Value::Null,
            Value::Null,
            Value::Timestamp(0),
            Value::from(""),
            Value::from("us"),
            Value::Bytes(vec![]),
            Value::Null,
            Value::IntArray(vec![]),
            Value::Null,
            Value::FloatArray(vec![2.0, 3.0]),
            Value::Null,
            Value::StringArray(vec![]),
        ],
    ]
}

fn build(block_type: BlockType, rows: Vec<Vec<Value>>) -> AnyDataBlock {
    let mut builder = DataBlockBuilder::new(block_type, wide_schema())
        .with_metadata(MetadataKey::NumDocsScanned, rows.len())
        .with_metadata(MetadataKey::TimeUsedMs, 17)
        .with_exception(QueryErrorCode::SegmentMissing, "segment_3 missing");
    for row in rows {
        builder.add_row(row).expect("Failed to add row");
    }
    builder.build().expect("Failed to build block")
}

#[test]
fn test_roundtrip_both_layouts() {
    for block_type in [BlockType::Row, BlockType::Columnar] {
        let block = build(block_type, wide_rows());
        let received = utils::from_bytes(block.to_bytes().expect("Failed to serialize block")).expect("Failed to parse block");

        assert_eq!(received, block);
        assert_eq!(received.block_type(), block_type);
        assert_eq!(received.num_rows(), 3);
        assert_eq!(received.num_columns(), 15);
        assert_eq!(received.rows().expect("Failed to read rows"), wide_rows());
        assert_eq!(received.metadata()["numDocsScanned"], "3");
        assert_eq!(received.exceptions()[&235], "segment_3 missing");
    }
}

#[test]
fn test_roundtrip_empty_rows() {
    for block_type in [BlockType::Row, BlockType::Columnar] {
        let block = build(block_type, Vec::new());
        let received = utils::from_bytes(block.to_bytes().expect("Failed to serialize block")).expect("Failed to parse block");
        assert_eq!(received, block);
        assert_eq!(received.num_rows(), 0);
        assert_eq!(received.schema(), Some(&wide_schema()));
        assert!(received.rows().expect("Failed to read rows").is_empty());
    }
}

#[test]
fn test_layouts_agree_on_cells() {
    let row = build(BlockType::Row, wide_rows());
    let columnar = build(BlockType::Columnar, wide_rows());

    assert_ne!(
        row.base().fixed_size_data(),
        columnar.base().fixed_size_data()
    );
    assert_eq!(row.row_width(), columnar.row_width());
    for row_id in 0..3 {
        assert_eq!(
            row.get_row(row_id).expect("row layout"),
            columnar.get_row(row_id).expect("columnar layout")
        );
    }
}

#[test]
fn test_typed_accessors() {
    let block = utils::from_bytes(build(BlockType::Row, wide_rows()).to_bytes().expect("Failed to serialize block"))
        .expect("Failed to parse block");

    assert_eq!(block.get_int(0, 0).unwrap(), -1);
    assert_eq!(block.get_long(0, 1).unwrap(), 1 << 40);
    assert_eq!(block.get_float(0, 2).unwrap(), 0.5);
    assert_eq!(block.get_double(1, 3).unwrap(), -0.5);
    assert!(block.get_boolean(0, 4).unwrap());
    assert_eq!(block.get_timestamp(0, 5).unwrap(), 1_700_000_000_000);
    assert_eq!(block.get_string(0, 6).unwrap(), "héllo");
    assert_eq!(block.get_string(1, 7).unwrap(), "eu");
    assert_eq!(&block.get_bytes(0, 8).unwrap()[..], &[0, 255]);
    let sketch: Sketch = block.get_object(0, 9).unwrap();
    assert_eq!(sketch.precision, 12);
    assert_eq!(block.get_int_array(0, 10).unwrap(), vec![1, 2, 3]);
    assert_eq!(block.get_long_array(0, 11).unwrap(), vec![i64::MIN, i64::MAX]);
    assert_eq!(block.get_float_array(2, 12).unwrap(), vec![2.0, 3.0]);
    assert_eq!(block.get_double_array(1, 13).unwrap(), vec![3.0, 4.0]);
    assert_eq!(
        block.get_string_array(0, 14).unwrap(),
        vec!["a".to_string(), String::new(), "ccc".to_string()]
    );

    assert!(matches!(
        block.get_int(0, 1),
        Err(BlockError::TypeMismatch {
            col_id: 1,
            actual: ColumnDataType::Long,
            ..
        })
    ));
    assert!(matches!(
        block.get_string_array(0, 10),
        Err(BlockError::TypeMismatch { .. })
    ));
}

#[test]
fn test_null_bitmaps_after_roundtrip() {
    let block = utils::from_bytes(build(BlockType::Columnar, wide_rows()).to_bytes().expect("Failed to serialize block"))
        .expect("Failed to parse block");

    let ints = block.null_row_ids(0).unwrap().expect("null info present");
    assert_eq!(ints.iter().collect::<Vec<_>>(), vec![1]);

    let dict = block.null_row_ids(7).unwrap().expect("null info present");
    assert!(dict.is_empty());

    let objects = block.null_row_ids(9).unwrap().expect("null info present");
    assert_eq!(objects.iter().collect::<Vec<_>>(), vec![1, 2]);

    assert_eq!(block.get_row(1).unwrap()[0], Value::Null);
    assert!(matches!(
        block.null_row_ids(15),
        Err(BlockError::OutOfRange { col_id: 15, .. })
    ));
}

#[test]
fn test_int_string_scenario() {
    let schema = DataSchema::new(vec![
        ("intCol".to_string(), ColumnDataType::Int),
        ("stringCol".to_string(), ColumnDataType::String),
    ]);
    let mut builder = DataBlockBuilder::row(schema);
    builder.add_row(vec![Value::Int(7), Value::from("a")]).unwrap();
    builder.add_row(vec![Value::Int(9), Value::from("bb")]).unwrap();
    let bytes = builder.build().unwrap().to_bytes().expect("Failed to serialize block");

    let block = RowDataBlock::from_bytes(bytes).expect("Failed to parse row block");

    let position = block.position_fixed(1, 0).unwrap();
    let raw = &block.base().fixed_size_data()[position..position + 4];
    assert_eq!(i32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]), 9);

    let (offset, length) = block.position_variable(0, 1).unwrap();
    let payload = &block.base().variable_size_data()[offset..offset + length];
    assert_eq!(std::str::from_utf8(payload).unwrap(), "a");
}

#[test]
fn test_metadata_only_scenario() {
    let source = DataBlockBuilder::row(wide_schema())
        .with_exception(1i32, "timeout")
        .build()
        .unwrap();
    let meta = source.to_metadata_only();

    let received = utils::from_bytes(meta.to_bytes().expect("Failed to serialize block")).expect("Failed to parse block");
    assert_eq!(received.num_rows(), 0);
    assert!(received.schema().is_none());
    assert_eq!(received.exceptions()[&1], "timeout");
}

#[test]
fn test_projections_partition_block() {
    for block_type in [BlockType::Row, BlockType::Columnar] {
        let block = build(block_type, wide_rows());
        let meta = block.to_metadata_only();
        let data = block.to_data_only();

        assert_eq!(meta.block_type(), block_type);
        assert_eq!(meta.metadata(), block.metadata());
        assert_eq!(meta.exceptions(), block.exceptions());
        assert_eq!(meta.num_rows(), 0);
        assert!(meta.schema().is_none());
        assert_eq!(meta.row_width(), 0);
        assert!(meta.column_offsets().is_empty());

        assert_eq!(data.block_type(), block_type);
        assert!(data.metadata().is_empty());
        assert!(data.exceptions().is_empty());
        assert_eq!(data.schema(), block.schema());
        assert_eq!(data.dictionary(), block.dictionary());
        assert_eq!(data.base().fixed_size_data(), block.base().fixed_size_data());
        assert_eq!(data.base().variable_size_data(), block.base().variable_size_data());
        assert_eq!(data.column_offsets(), block.column_offsets());
        assert_eq!(data.row_width(), block.row_width());

        let received = utils::from_bytes(data.to_bytes().expect("Failed to serialize block"))
            .expect("Failed to parse block");
        assert_eq!(received.block_type(), block_type);
        assert_eq!(received.rows().unwrap(), wide_rows());

        let received = utils::from_bytes(meta.to_bytes().expect("Failed to serialize block"))
            .expect("Failed to parse block");
        assert_eq!(received.block_type(), block_type);
        assert_eq!(received.exceptions(), block.exceptions());
        assert!(received.schema().is_none());
    }
}

#[test]
fn test_columnar_data_projection_keeps_widths() {
    let block = build(BlockType::Columnar, wide_rows());
    let columnar = block.as_columnar().expect("Expected a columnar block");
    let data = columnar.to_data_only();
    assert_eq!(data.column_widths(), columnar.column_widths());
    assert_eq!(data.column_offsets(), columnar.column_offsets());
    assert_eq!(data.row_width(), wide_schema().row_width());

    let meta = columnar.to_metadata_only();
    assert!(meta.column_widths().is_empty());
    assert_eq!(meta.row_width(), 0);
}

#[test]
fn test_out_of_range_positions() {
    let block = build(BlockType::Row, wide_rows());
    assert!(matches!(
        block.position_fixed(3, 0),
        Err(BlockError::OutOfRange {
            row_id: 3,
            num_rows: 3,
            ..
        })
    ));
    assert!(matches!(
        block.position_fixed(0, 15),
        Err(BlockError::OutOfRange {
            col_id: 15,
            num_columns: 15,
            ..
        })
    ));
    assert!(matches!(block.get_row(3), Err(BlockError::OutOfRange { .. })));
    assert!(block.get_int(9, 0).unwrap_err().is_programming_error());
}

#[test]
fn test_error_block_roundtrip() {
    let mut exceptions = BTreeMap::new();
    exceptions.insert(QueryErrorCode::QueryExecution.code(), "boom".to_string());
    exceptions.insert(QueryErrorCode::Internal.code(), "bad state".to_string());
    let block = utils::error_block_from(exceptions.clone());

    let received = utils::from_bytes(block.to_bytes().expect("Failed to serialize block")).unwrap();
    assert_eq!(received.exceptions(), &exceptions);
    assert!(utils::is_error_block(&received));
    assert!(received.as_row().is_some());
}

#[test]
fn test_concurrent_readers() {
    let bytes: Bytes = build(BlockType::Row, wide_rows()).to_bytes().expect("Failed to serialize block");
    let block = Arc::new(utils::from_bytes(bytes.clone()).unwrap());

    thread::scope(|scope| {
        for _ in 0..4 {
            let block = Arc::clone(&block);
            let bytes = bytes.clone();
            scope.spawn(move || {
                for _ in 0..50 {
                    assert_eq!(block.get_string(0, 6).unwrap(), "héllo");
                    assert_eq!(block.rows().unwrap(), wide_rows());
                    let parsed = utils::from_bytes(bytes.clone()).unwrap();
                    assert_eq!(parsed.get_int(2, 0).unwrap(), 42);
                }
            });
        }
    });
}
