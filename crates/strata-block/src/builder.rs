//! Builds data blocks from typed rows.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use bytes::{BufMut, BytesMut};
use roaring::RoaringBitmap;
use strata_common::config::DataBlockConfig;

use crate::block::{AnyDataBlock, BaseDataBlock, BlockType, DictionaryMap};
use crate::codec::{put_string, ObjectSerDe, ROARING_BITMAP_SER_DE};
use crate::error::{BlockError, BlockResult};
use crate::schema::{ColumnDataType, DataSchema};
use crate::value::Value;

/// Accumulates rows and encodes them into a row or columnar block.
///
/// # Example
///
/// ```rust
/// use strata_block::{ColumnDataType, DataBlock, DataBlockBuilder, DataSchema, MetadataKey, Value};
///
/// let schema = DataSchema::new(vec![
///     ("city".to_string(), ColumnDataType::DictString),
///     ("visits".to_string(), ColumnDataType::Long),
/// ]);
/// let mut builder = DataBlockBuilder::columnar(schema)
///     .with_metadata(MetadataKey::NumDocsScanned, 2);
/// builder.add_row(vec![Value::from("oslo"), Value::Long(3)]).unwrap();
/// builder.add_row(vec![Value::from("oslo"), Value::Null]).unwrap();
///
/// let block = builder.build().unwrap();
/// assert_eq!(block.get_string(1, 0).unwrap(), "oslo");
/// assert_eq!(block.dictionary()["city"].len(), 1);
/// assert!(block.null_row_ids(1).unwrap().unwrap().contains(1));
/// ```
#[derive(Debug, Clone)]
pub struct DataBlockBuilder {
    block_type: BlockType,
    schema: Arc<DataSchema>,
    config: DataBlockConfig,
    rows: Vec<Vec<Value>>,
    dictionary: DictionaryMap,
    metadata: BTreeMap<String, String>,
    exceptions: BTreeMap<i32, String>,
}

impl DataBlockBuilder {
    /// Creates a builder for the given layout.
    pub fn new(block_type: BlockType, schema: impl Into<Arc<DataSchema>>) -> Self {
        Self {
            block_type,
            schema: schema.into(),
            config: DataBlockConfig::default(),
            rows: Vec::new(),
            dictionary: DictionaryMap::new(),
            metadata: BTreeMap::new(),
            exceptions: BTreeMap::new(),
        }
    }

    /// Creates a row-major builder.
    pub fn row(schema: impl Into<Arc<DataSchema>>) -> Self {
        Self::new(BlockType::Row, schema)
    }

    /// Creates a column-major builder.
    pub fn columnar(schema: impl Into<Arc<DataSchema>>) -> Self {
        Self::new(BlockType::Columnar, schema)
    }

    /// Sets the configuration. Only `null_handling_enabled` and
    /// `max_block_size` affect building.
    pub fn with_config(mut self, config: DataBlockConfig) -> Self {
        self.config = config;
        self
    }

    /// Seeds the dictionary of a column. Values not found in it are given
    /// new codes above the largest existing one.
    pub fn with_dictionary(
        mut self,
        column: impl Into<String>,
        entries: BTreeMap<i32, String>,
    ) -> Self {
        self.dictionary.insert(column.into(), entries);
        self
    }

    /// Adds a metadata entry.
    pub fn with_metadata(mut self, key: impl AsRef<str>, value: impl ToString) -> Self {
        self.metadata
            .insert(key.as_ref().to_string(), value.to_string());
        self
    }

    /// Adds an exception.
    pub fn with_exception(mut self, code: impl Into<i32>, message: impl Into<String>) -> Self {
        self.exceptions.insert(code.into(), message.into());
        self
    }

    /// Number of rows added so far.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Appends a row after checking it against the schema.
    pub fn add_row(&mut self, row: Vec<Value>) -> BlockResult<()> {
        if self.schema.is_empty() {
            return Err(BlockError::invalid_row("schema has no columns"));
        }
        if row.len() != self.schema.size() {
            return Err(BlockError::invalid_row(format!(
                "expected {} values, got {}",
                self.schema.size(),
                row.len()
            )));
        }
        for ((name, ty), value) in self.schema.columns().zip(&row) {
            if !value.fits(ty) {
                return Err(BlockError::invalid_row(format!(
                    "column '{}' of type {} cannot hold a {} value",
                    name,
                    ty,
                    value.type_name()
                )));
            }
        }
        self.rows.push(row);
        Ok(())
    }

    /// Encodes the accumulated rows.
    pub fn build(self) -> BlockResult<AnyDataBlock> {
        let num_rows = self.rows.len();
        let num_columns = self.schema.size();
        let row_width = self.schema.row_width();

        let mut encoders: Vec<Option<DictionaryEncoder>> = self
            .schema
            .columns()
            .map(|(name, ty)| {
                (ty == ColumnDataType::DictString)
                    .then(|| DictionaryEncoder::new(self.dictionary.get(name)))
            })
            .collect();

        let mut writer = RegionWriter {
            fixed: BytesMut::with_capacity(num_rows * row_width + num_columns * 8),
            variable: BytesMut::new(),
        };
        match self.block_type {
            BlockType::Row => {
                for row in &self.rows {
                    for (col_id, value) in row.iter().enumerate() {
                        writer.put_value(&self.schema, col_id, value, &mut encoders)?;
                    }
                }
            }
            BlockType::Columnar => {
                for col_id in 0..num_columns {
                    for row in &self.rows {
                        writer.put_value(&self.schema, col_id, &row[col_id], &mut encoders)?;
                    }
                }
            }
        }

        if self.config.null_handling_enabled {
            for col_id in 0..num_columns {
                let nulls: RoaringBitmap = self
                    .rows
                    .iter()
                    .enumerate()
                    .filter(|(_, row)| row[col_id].is_null())
                    .map(|(row_id, _)| row_id as u32)
                    .collect();
                if nulls.is_empty() {
                    writer.fixed.put_i32(0);
                    writer.fixed.put_i32(0);
                } else {
                    let bytes = ROARING_BITMAP_SER_DE.serialize(&nulls)?;
                    writer.put_payload(&bytes)?;
                }
            }
        }

        let size = writer.fixed.len() + writer.variable.len();
        if size > self.config.max_block_size {
            return Err(BlockError::BlockTooLarge {
                size,
                max: self.config.max_block_size,
            });
        }

        let mut dictionary = self.dictionary;
        for ((name, _), encoder) in self.schema.columns().zip(encoders) {
            if let Some(encoder) = encoder {
                dictionary.insert(name.to_string(), encoder.entries);
            }
        }

        tracing::debug!(
            "Built {} data block: {} rows, {} fixed bytes, {} variable bytes",
            self.block_type,
            num_rows,
            writer.fixed.len(),
            writer.variable.len()
        );

        let base = BaseDataBlock::new(
            num_rows,
            Some(self.schema),
            dictionary,
            writer.fixed.freeze(),
            writer.variable.freeze(),
        )?
        .with_metadata_and_exceptions(self.metadata, self.exceptions);
        Ok(AnyDataBlock::from_base(self.block_type, base))
    }
}

/// Assigns dictionary codes to the values of one column.
///
/// New values get codes above the largest seeded code. `next_code` is
/// `None` once `i32::MAX` has been handed out.
#[derive(Debug)]
struct DictionaryEncoder {
    entries: BTreeMap<i32, String>,
    codes: HashMap<String, i32>,
    next_code: Option<i32>,
}

impl DictionaryEncoder {
    fn new(seed: Option<&BTreeMap<i32, String>>) -> Self {
        let entries = seed.cloned().unwrap_or_default();
        let codes = entries
            .iter()
            .map(|(code, value)| (value.clone(), *code))
            .collect();
        let next_code = entries
            .keys()
            .next_back()
            .map_or(Some(0), |code| code.checked_add(1));
        Self {
            entries,
            codes,
            next_code,
        }
    }

    fn encode(&mut self, value: &str) -> BlockResult<i32> {
        if let Some(code) = self.codes.get(value) {
            return Ok(*code);
        }
        let code = self.next_code.ok_or_else(|| {
            BlockError::invalid_row(format!(
                "dictionary code space exhausted, cannot encode '{}'",
                value
            ))
        })?;
        self.next_code = code.checked_add(1);
        self.codes.insert(value.to_string(), code);
        self.entries.insert(code, value.to_string());
        Ok(code)
    }
}

struct RegionWriter {
    fixed: BytesMut,
    variable: BytesMut,
}

impl RegionWriter {
    /// Appends `payload` to the variable region and its pointer pair to the
    /// fixed region.
    fn put_payload(&mut self, payload: &[u8]) -> BlockResult<()> {
        let offset = pointer_field(self.variable.len())?;
        let length = pointer_field(payload.len())?;
        self.fixed.put_i32(offset);
        self.fixed.put_i32(length);
        self.variable.extend_from_slice(payload);
        Ok(())
    }

    fn put_value(
        &mut self,
        schema: &DataSchema,
        col_id: usize,
        value: &Value,
        encoders: &mut [Option<DictionaryEncoder>],
    ) -> BlockResult<()> {
        let ty = schema
            .column_type(col_id)
            .ok_or_else(|| BlockError::invalid_row(format!("no column {}", col_id)))?;

        if ty == ColumnDataType::DictString {
            let text = match value {
                Value::String(s) => s.as_str(),
                _ => "",
            };
            let code = match encoders[col_id].as_mut() {
                Some(encoder) => encoder.encode(text)?,
                None => 0,
            };
            self.fixed.put_i32(code);
            return Ok(());
        }

        match value {
            Value::Null if ty.is_variable_width() => self.put_payload(&[])?,
            Value::Null => self.fixed.put_bytes(0, ty.fixed_width()),
            Value::Int(v) => self.fixed.put_i32(*v),
            Value::Long(v) | Value::Timestamp(v) => self.fixed.put_i64(*v),
            Value::Float(v) => self.fixed.put_f32(*v),
            Value::Double(v) => self.fixed.put_f64(*v),
            Value::Boolean(v) => self.fixed.put_i32(i32::from(*v)),
            Value::String(s) => self.put_payload(s.as_bytes())?,
            Value::Bytes(b) | Value::Object(b) => self.put_payload(b)?,
            Value::IntArray(v) => {
                let mut buf = BytesMut::with_capacity(v.len() * 4);
                v.iter().for_each(|x| buf.put_i32(*x));
                self.put_payload(&buf)?;
            }
            Value::LongArray(v) => {
                let mut buf = BytesMut::with_capacity(v.len() * 8);
                v.iter().for_each(|x| buf.put_i64(*x));
                self.put_payload(&buf)?;
            }
            Value::FloatArray(v) => {
                let mut buf = BytesMut::with_capacity(v.len() * 4);
                v.iter().for_each(|x| buf.put_f32(*x));
                self.put_payload(&buf)?;
            }
            Value::DoubleArray(v) => {
                let mut buf = BytesMut::with_capacity(v.len() * 8);
                v.iter().for_each(|x| buf.put_f64(*x));
                self.put_payload(&buf)?;
            }
            Value::StringArray(v) => {
                let mut buf = BytesMut::new();
                v.iter().try_for_each(|s| put_string(&mut buf, s))?;
                self.put_payload(&buf)?;
            }
        }
        Ok(())
    }
}

/// Pointer pair fields are i32 on the wire.
fn pointer_field(len: usize) -> BlockResult<i32> {
    i32::try_from(len).map_err(|_| BlockError::BlockTooLarge {
        size: len,
        max: i32::MAX as usize,
    })
}
