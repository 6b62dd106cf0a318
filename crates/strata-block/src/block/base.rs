//! Framing shared by every data block layout.
//!
//! `BaseDataBlock` owns everything that does not depend on how rows are
//! arranged in the fixed-size region: the schema, dictionary, metadata,
//! exceptions, both byte regions, and their serialization. Layouts only
//! decide where a `(row, column)` slot lives.

use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};
use roaring::RoaringBitmap;
use strata_common::config::DataBlockConfig;
use strata_common::constants::{INT_BYTES, POINTER_PAIR_BYTES};

use crate::codec::{put_len, put_region, put_string, ObjectSerDe, WireReader, ROARING_BITMAP_SER_DE};
use crate::error::{BlockError, BlockResult};
use crate::schema::{ColumnDataType, DataSchema};
use crate::utils;

/// Column name to (dictionary code to string value).
pub type DictionaryMap = BTreeMap<String, BTreeMap<i32, String>>;

/// Layout-independent state of a data block.
///
/// Once constructed the block is immutable. Both regions are reference
/// counted `Bytes`, so clones and projections share the underlying buffers
/// and every read hands out an independent slice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaseDataBlock {
    num_rows: u32,
    schema: Option<Arc<DataSchema>>,
    dictionary: DictionaryMap,
    metadata: BTreeMap<String, String>,
    exceptions: BTreeMap<i32, String>,
    fixed_size_data: Bytes,
    variable_size_data: Bytes,
}

impl BaseDataBlock {
    /// Creates a data-only block from raw regions.
    ///
    /// An empty schema is treated as no schema. Fails if rows are declared
    /// without a schema, or if the fixed-size region is too short to hold
    /// `num_rows` rows.
    pub fn new(
        num_rows: usize,
        schema: Option<Arc<DataSchema>>,
        dictionary: DictionaryMap,
        fixed_size_data: Bytes,
        variable_size_data: Bytes,
    ) -> BlockResult<Self> {
        let num_rows = u32::try_from(num_rows)
            .map_err(|_| BlockError::malformed(format!("{} rows exceeds u32", num_rows)))?;
        let block = Self {
            num_rows,
            schema: schema.filter(|s| !s.is_empty()),
            dictionary,
            metadata: BTreeMap::new(),
            exceptions: BTreeMap::new(),
            fixed_size_data,
            variable_size_data,
        };
        block.validate()?;
        Ok(block)
    }

    /// Creates a metadata-only block: no schema, no rows, no regions.
    pub fn metadata_only(
        metadata: BTreeMap<String, String>,
        exceptions: BTreeMap<i32, String>,
    ) -> Self {
        Self {
            metadata,
            exceptions,
            ..Self::default()
        }
    }

    /// Creates a block with a schema and zero rows.
    pub(crate) fn empty(schema: Arc<DataSchema>) -> Self {
        Self {
            schema: Some(schema).filter(|s| !s.is_empty()),
            ..Self::default()
        }
    }

    /// Attaches metadata and exceptions to a data-only block.
    pub(crate) fn with_metadata_and_exceptions(
        mut self,
        metadata: BTreeMap<String, String>,
        exceptions: BTreeMap<i32, String>,
    ) -> Self {
        self.metadata = metadata;
        self.exceptions = exceptions;
        self
    }

    fn validate(&self) -> BlockResult<()> {
        match &self.schema {
            None if self.num_rows > 0 => Err(BlockError::malformed(format!(
                "{} rows without a schema",
                self.num_rows
            ))),
            Some(schema) => {
                let needed = self.num_rows as usize * schema.row_width();
                if self.fixed_size_data.len() < needed {
                    return Err(BlockError::length_mismatch(
                        "fixed-size region",
                        format!(
                            "{} rows of {} bytes need {} bytes, region has {}",
                            self.num_rows,
                            schema.row_width(),
                            needed,
                            self.fixed_size_data.len()
                        ),
                    ));
                }
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.num_rows as usize
    }

    /// Number of columns (zero without a schema).
    pub fn num_columns(&self) -> usize {
        self.schema.as_ref().map_or(0, |s| s.size())
    }

    /// Block schema, if this block carries data.
    pub fn schema(&self) -> Option<&DataSchema> {
        self.schema.as_deref()
    }

    /// Shared handle to the schema.
    pub fn schema_ref(&self) -> Option<&Arc<DataSchema>> {
        self.schema.as_ref()
    }

    /// Dictionaries of dictionary-encoded string columns.
    pub fn dictionary(&self) -> &DictionaryMap {
        &self.dictionary
    }

    /// Execution statistics.
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Error code to message for failures carried as data.
    pub fn exceptions(&self) -> &BTreeMap<i32, String> {
        &self.exceptions
    }

    /// The fixed-size region.
    pub fn fixed_size_data(&self) -> &Bytes {
        &self.fixed_size_data
    }

    /// The variable-size region.
    pub fn variable_size_data(&self) -> &Bytes {
        &self.variable_size_data
    }

    /// Returns true if the block carries no schema and no rows.
    pub fn is_metadata_only(&self) -> bool {
        self.schema.is_none() && self.num_rows == 0
    }

    /// Copies metadata and exceptions into a new block with no data.
    pub(crate) fn metadata_projection(&self) -> Self {
        Self::metadata_only(self.metadata.clone(), self.exceptions.clone())
    }

    /// Copies schema, dictionary, and regions into a new block with empty
    /// metadata and exceptions.
    pub(crate) fn data_projection(&self) -> Self {
        Self {
            num_rows: self.num_rows,
            schema: self.schema.clone(),
            dictionary: self.dictionary.clone(),
            metadata: BTreeMap::new(),
            exceptions: BTreeMap::new(),
            fixed_size_data: self.fixed_size_data.clone(),
            variable_size_data: self.variable_size_data.clone(),
        }
    }

    // =========================================================================
    // Positional reads
    // =========================================================================

    /// Fails unless `row_id` and `col_id` address a cell of this block.
    pub(crate) fn check_position(&self, row_id: usize, col_id: usize) -> BlockResult<()> {
        if row_id >= self.num_rows() || col_id >= self.num_columns() {
            return Err(BlockError::OutOfRange {
                row_id,
                col_id,
                num_rows: self.num_rows(),
                num_columns: self.num_columns(),
            });
        }
        Ok(())
    }

    pub(crate) fn column_type(&self, col_id: usize) -> BlockResult<ColumnDataType> {
        self.schema
            .as_ref()
            .and_then(|s| s.column_type(col_id))
            .ok_or(BlockError::OutOfRange {
                row_id: 0,
                col_id,
                num_rows: self.num_rows(),
                num_columns: self.num_columns(),
            })
    }

    pub(crate) fn read_fixed<const N: usize>(&self, position: usize) -> BlockResult<[u8; N]> {
        let end = position + N;
        if end > self.fixed_size_data.len() {
            return Err(BlockError::truncated(
                "fixed-size region",
                end,
                self.fixed_size_data.len(),
            ));
        }
        let mut raw = [0u8; N];
        raw.copy_from_slice(&self.fixed_size_data[position..end]);
        Ok(raw)
    }

    pub(crate) fn read_i32(&self, position: usize) -> BlockResult<i32> {
        self.read_fixed::<INT_BYTES>(position).map(i32::from_be_bytes)
    }

    pub(crate) fn read_pointer_pair(&self, position: usize) -> BlockResult<(i32, i32)> {
        let offset = self.read_i32(position)?;
        let length = self.read_i32(position + INT_BYTES)?;
        Ok((offset, length))
    }

    /// Turns a pointer pair into a byte range of the variable-size region.
    pub(crate) fn resolve_pointer(&self, offset: i32, length: i32) -> BlockResult<Range<usize>> {
        let out_of_bounds = || BlockError::PointerOutOfBounds {
            offset,
            length,
            region_len: self.variable_size_data.len(),
        };
        let start = usize::try_from(offset).map_err(|_| out_of_bounds())?;
        let len = usize::try_from(length).map_err(|_| out_of_bounds())?;
        let end = start.checked_add(len).ok_or_else(out_of_bounds)?;
        if end > self.variable_size_data.len() {
            return Err(out_of_bounds());
        }
        Ok(start..end)
    }

    /// Looks up a dictionary-encoded value.
    pub(crate) fn dictionary_value(&self, col_id: usize, code: i32) -> BlockResult<String> {
        let column = self
            .schema
            .as_ref()
            .and_then(|s| s.column_name(col_id))
            .unwrap_or_default();
        self.dictionary
            .get(column)
            .and_then(|entries| entries.get(&code))
            .cloned()
            .ok_or_else(|| BlockError::MissingDictionary {
                column: column.to_string(),
                code,
            })
    }

    /// Reads the null bitmap of one column.
    ///
    /// The pointer pair for column `col_id` lives right after all row data,
    /// at `num_rows * row_width + col_id * 8`. The outcome is three-way:
    ///
    /// - `Ok(None)`: the fixed-size region ends before that position, so
    ///   the producer never serialized null information for this block;
    /// - `Ok(Some(empty))`: null information is present and the column has
    ///   no nulls (length 0);
    /// - `Ok(Some(rows))`: the decoded set of null row ids.
    pub(crate) fn null_row_ids(
        &self,
        row_width: usize,
        col_id: usize,
    ) -> BlockResult<Option<RoaringBitmap>> {
        if col_id >= self.num_columns() {
            return Err(BlockError::OutOfRange {
                row_id: 0,
                col_id,
                num_rows: self.num_rows(),
                num_columns: self.num_columns(),
            });
        }

        let position = self.num_rows() * row_width + col_id * POINTER_PAIR_BYTES;
        if position >= self.fixed_size_data.len() {
            tracing::trace!("No null information for column {}", col_id);
            return Ok(None);
        }

        let (offset, length) = self.read_pointer_pair(position)?;
        if length == 0 {
            return Ok(Some(RoaringBitmap::new()));
        }
        let range = self.resolve_pointer(offset, length)?;
        ROARING_BITMAP_SER_DE
            .deserialize(&self.variable_size_data[range])
            .map(Some)
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    fn serialized_size_hint(&self) -> usize {
        let strings: usize = self
            .metadata
            .iter()
            .map(|(k, v)| 8 + k.len() + v.len())
            .chain(self.exceptions.values().map(|m| 8 + m.len()))
            .sum();
        64 + strings + self.fixed_size_data.len() + self.variable_size_data.len()
    }

    /// Serializes the block, stamping `version_tag` in the header.
    ///
    /// Fails with [`BlockError::BlockTooLarge`] if a count, string, or
    /// region does not fit its `u32` length prefix.
    pub(crate) fn serialize(&self, version_tag: u32) -> BlockResult<Bytes> {
        let mut buf = BytesMut::with_capacity(self.serialized_size_hint());

        // Header
        buf.put_u32(version_tag);
        buf.put_u32(self.num_rows);

        // Schema
        match &self.schema {
            Some(schema) => {
                put_len(&mut buf, schema.size())?;
                for (name, ty) in schema.columns() {
                    put_string(&mut buf, name)?;
                    buf.put_u32(ty.code());
                }
            }
            None => buf.put_u32(0),
        }

        // Dictionary
        put_len(&mut buf, self.dictionary.len())?;
        for (column, entries) in &self.dictionary {
            put_string(&mut buf, column)?;
            put_len(&mut buf, entries.len())?;
            for (code, value) in entries {
                buf.put_i32(*code);
                put_string(&mut buf, value)?;
            }
        }

        // Metadata
        put_len(&mut buf, self.metadata.len())?;
        for (key, value) in &self.metadata {
            put_string(&mut buf, key)?;
            put_string(&mut buf, value)?;
        }

        // Exceptions
        put_len(&mut buf, self.exceptions.len())?;
        for (code, message) in &self.exceptions {
            buf.put_i32(*code);
            put_string(&mut buf, message)?;
        }

        // Regions
        put_region(&mut buf, &self.fixed_size_data)?;
        put_region(&mut buf, &self.variable_size_data)?;

        Ok(buf.freeze())
    }

    /// Parses a serialized block, returning its version tag and framing.
    ///
    /// The tag is checked before anything else is read. The input must
    /// contain exactly one block: trailing bytes are rejected.
    pub(crate) fn deserialize(bytes: Bytes, config: &DataBlockConfig) -> BlockResult<(u32, Self)> {
        if bytes.len() > config.max_block_size {
            return Err(BlockError::BlockTooLarge {
                size: bytes.len(),
                max: config.max_block_size,
            });
        }

        let mut reader = WireReader::new(bytes, config.max_string_length);

        let version_tag = reader.get_u32("header")?;
        utils::check_version_tag(version_tag)?;
        let num_rows = reader.get_u32("header")?;

        // Each column needs a name length and a type code.
        let num_columns = reader.get_count("schema", 2 * INT_BYTES)?;
        let schema = if num_columns == 0 {
            None
        } else {
            let mut columns = Vec::with_capacity(num_columns);
            for _ in 0..num_columns {
                let name = reader.get_string("schema")?;
                let ty = ColumnDataType::from_code(reader.get_u32("schema")?)?;
                columns.push((name, ty));
            }
            Some(Arc::new(DataSchema::new(columns)))
        };

        let num_dictionaries = reader.get_count("dictionary", 2 * INT_BYTES)?;
        let mut dictionary = DictionaryMap::new();
        for _ in 0..num_dictionaries {
            let column = reader.get_string("dictionary")?;
            let num_entries = reader.get_count("dictionary", 2 * INT_BYTES)?;
            let mut entries = BTreeMap::new();
            for _ in 0..num_entries {
                let code = reader.get_i32("dictionary")?;
                let value = reader.get_string("dictionary")?;
                entries.insert(code, value);
            }
            dictionary.insert(column, entries);
        }

        let num_metadata = reader.get_count("metadata", 2 * INT_BYTES)?;
        let mut metadata = BTreeMap::new();
        for _ in 0..num_metadata {
            let key = reader.get_string("metadata")?;
            let value = reader.get_string("metadata")?;
            metadata.insert(key, value);
        }

        let num_exceptions = reader.get_count("exceptions", 2 * INT_BYTES)?;
        let mut exceptions = BTreeMap::new();
        for _ in 0..num_exceptions {
            let code = reader.get_i32("exceptions")?;
            let message = reader.get_string("exceptions")?;
            exceptions.insert(code, message);
        }

        let fixed_size_data = reader.get_region("fixed-size region")?;
        let variable_size_data = reader.get_region("variable-size region")?;

        if reader.remaining() > 0 {
            return Err(BlockError::TrailingBytes {
                remaining: reader.remaining(),
            });
        }

        let block = Self {
            num_rows,
            schema,
            dictionary,
            metadata,
            exceptions,
            fixed_size_data,
            variable_size_data,
        };
        block.validate()?;
        Ok((version_tag, block))
    }
}
