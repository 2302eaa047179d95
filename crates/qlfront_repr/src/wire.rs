//! Row wire format.
//!
//! A serialized row block is a big-endian `i32` row count followed by every
//! value of every row, each prefixed with an `i32` byte length. A length of
//! `-1` encodes a null. Collections nest the same framing: an `i32` element
//! count followed by length-prefixed elements.
//!
//! The payload carries no type information. Decoding needs the schema the
//! rows were written with, and a [`TypeResolver`] for user-defined types.
use std::str;

use bytes::{Buf, BufMut, BytesMut};
use chrono::{DateTime, Utc};
use tracing::trace;
use uuid::Uuid;

use crate::datatype::{DataType, TypeResolver};
use crate::errors::{ReprError, Result};
use crate::row::{Row, RowBlock};
use crate::scalar::ScalarValue;
use crate::schema::Schema;

const NULL_LEN: i32 = -1;

impl RowBlock {
    /// Serialize all rows into `buf`.
    pub fn serialize(&self, types: &dyn TypeResolver, buf: &mut BytesMut) -> Result<()> {
        put_len(buf, self.num_rows())?;
        for row in self.rows() {
            for (val, col) in row.iter().zip(self.schema().columns()) {
                encode_value(buf, val, &col.datatype, types)?;
            }
        }
        Ok(())
    }

    /// Deserialize rows written with `schema`.
    ///
    /// The payload must be consumed exactly, leftover bytes are an error.
    pub fn deserialize(schema: Schema, types: &dyn TypeResolver, data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        let num_rows = cursor.read_len()?;
        trace!(num_rows, num_bytes = data.len(), "deserializing row block");

        // Every value carries at least a 4 byte length, so the count can be
        // checked against the payload before any row is built.
        let min_row_bytes = 4 * schema.num_columns();
        let fits = match min_row_bytes {
            0 => num_rows == 0,
            n => num_rows <= cursor.remaining() / n,
        };
        if !fits {
            return Err(ReprError::InvalidRowCount {
                num_rows,
                num_columns: schema.num_columns(),
                remaining: cursor.remaining(),
            });
        }

        let mut block = RowBlock::new(schema);
        for _ in 0..num_rows {
            let row = block
                .schema()
                .columns()
                .iter()
                .map(|col| decode_value(&mut cursor, &col.datatype, types))
                .collect::<Result<Row>>()?;
            block.push_row(row)?;
        }

        if cursor.remaining() != 0 {
            return Err(ReprError::TrailingBytes(cursor.remaining()));
        }

        Ok(block)
    }
}

fn put_len(buf: &mut BytesMut, len: usize) -> Result<()> {
    let len = i32::try_from(len).map_err(|_| ReprError::ValueTooLarge(len))?;
    buf.put_i32(len);
    Ok(())
}

/// Write a length-prefixed value.
fn encode_value(
    buf: &mut BytesMut,
    val: &ScalarValue,
    datatype: &DataType,
    types: &dyn TypeResolver,
) -> Result<()> {
    if val.is_null() {
        buf.put_i32(NULL_LEN);
        return Ok(());
    }

    // Reserve the length, patched once the value is written.
    let len_pos = buf.len();
    buf.put_i32(0);
    encode_value_not_null(buf, val, datatype, types)?;

    let len = buf.len() - len_pos - 4;
    let len = i32::try_from(len).map_err(|_| ReprError::ValueTooLarge(len))?;
    buf[len_pos..len_pos + 4].copy_from_slice(&len.to_be_bytes());

    Ok(())
}

fn encode_value_not_null(
    buf: &mut BytesMut,
    val: &ScalarValue,
    datatype: &DataType,
    types: &dyn TypeResolver,
) -> Result<()> {
    match (val, datatype) {
        (ScalarValue::Boolean(v), DataType::Boolean) => buf.put_u8(*v as u8),
        (ScalarValue::Int8(v), DataType::Int8) => buf.put_i8(*v),
        (ScalarValue::Int16(v), DataType::Int16) => buf.put_i16(*v),
        (ScalarValue::Int32(v), DataType::Int32) => buf.put_i32(*v),
        (ScalarValue::Int64(v), DataType::Int64) => buf.put_i64(*v),
        (ScalarValue::Float(v), DataType::Float) => buf.put_f32(*v),
        (ScalarValue::Double(v), DataType::Double) => buf.put_f64(*v),
        (ScalarValue::Text(v), DataType::Text) => buf.put_slice(v.as_bytes()),
        (ScalarValue::Binary(v), DataType::Binary) => buf.put_slice(v),
        (ScalarValue::Timestamp(v), DataType::Timestamp) => buf.put_i64(v.timestamp_millis()),
        (ScalarValue::Uuid(v), DataType::Uuid) => buf.put_slice(v.as_bytes()),
        (ScalarValue::List(vals), DataType::List(elem))
        | (ScalarValue::Set(vals), DataType::Set(elem)) => {
            put_len(buf, vals.len())?;
            for val in vals {
                encode_value(buf, val, elem, types)?;
            }
        }
        (ScalarValue::Map(entries), DataType::Map(key_type, value_type)) => {
            put_len(buf, entries.len())?;
            for (key, value) in entries {
                encode_value(buf, key, key_type, types)?;
                encode_value(buf, value, value_type, types)?;
            }
        }
        (ScalarValue::UserDefined(fields), DataType::UserDefined { keyspace, name }) => {
            let def = types.resolve_user_type(keyspace, name).ok_or_else(|| {
                ReprError::UnknownUserType {
                    keyspace: keyspace.clone(),
                    name: name.clone(),
                }
            })?;
            if def.fields.len() != fields.len() {
                return Err(ReprError::InvalidValue {
                    datatype: datatype.clone(),
                    reason: format!(
                        "expected {} fields, got {}",
                        def.fields.len(),
                        fields.len()
                    ),
                });
            }
            for (field, (_, field_type)) in fields.iter().zip(&def.fields) {
                encode_value(buf, field, field_type, types)?;
            }
        }
        (_, datatype) => {
            return Err(ReprError::TypeMismatch {
                column: format!("{val:?}"),
                expected: datatype.clone(),
            });
        }
    }
    Ok(())
}

/// Read a length-prefixed value.
fn decode_value(
    cursor: &mut Cursor<'_>,
    datatype: &DataType,
    types: &dyn TypeResolver,
) -> Result<ScalarValue> {
    let len = cursor.read_i32()?;
    if len == NULL_LEN {
        return Ok(ScalarValue::Null);
    }
    if len < 0 {
        return Err(ReprError::InvalidLength(len));
    }

    let data = cursor.take_bytes(len as usize)?;
    if let Some(width) = datatype.fixed_width() {
        if data.len() != width {
            return Err(ReprError::InvalidValue {
                datatype: datatype.clone(),
                reason: format!("expected {width} bytes, got {}", data.len()),
            });
        }
    }

    let mut value = Cursor::new(data);
    let decoded = match datatype {
        DataType::Boolean => ScalarValue::Boolean(value.get_u8() != 0),
        DataType::Int8 => ScalarValue::Int8(value.get_i8()),
        DataType::Int16 => ScalarValue::Int16(value.get_i16()),
        DataType::Int32 => ScalarValue::Int32(value.get_i32()),
        DataType::Int64 => ScalarValue::Int64(value.get_i64()),
        DataType::Float => ScalarValue::Float(value.get_f32()),
        DataType::Double => ScalarValue::Double(value.get_f64()),
        DataType::Text => {
            ScalarValue::Text(str::from_utf8(value.take_bytes(data.len())?)?.to_string())
        }
        DataType::Binary => ScalarValue::Binary(value.take_bytes(data.len())?.to_vec()),
        DataType::Timestamp => {
            let millis = value.get_i64();
            let ts = DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
                ReprError::InvalidValue {
                    datatype: datatype.clone(),
                    reason: format!("timestamp out of range: {millis}"),
                }
            })?;
            ScalarValue::Timestamp(ts)
        }
        DataType::Uuid => {
            let bytes = value.take_bytes(data.len())?;
            let uuid = Uuid::from_slice(bytes).map_err(|e| ReprError::InvalidValue {
                datatype: datatype.clone(),
                reason: e.to_string(),
            })?;
            ScalarValue::Uuid(uuid)
        }
        DataType::List(elem) => ScalarValue::List(decode_elements(&mut value, elem, types)?),
        DataType::Set(elem) => ScalarValue::Set(decode_elements(&mut value, elem, types)?),
        DataType::Map(key_type, value_type) => {
            let count = value.read_len()?;
            let mut entries = Vec::with_capacity(count.min(value.remaining()));
            for _ in 0..count {
                let key = decode_value(&mut value, key_type, types)?;
                let val = decode_value(&mut value, value_type, types)?;
                entries.push((key, val));
            }
            ScalarValue::Map(entries)
        }
        DataType::UserDefined { keyspace, name } => {
            let def = types.resolve_user_type(keyspace, name).ok_or_else(|| {
                ReprError::UnknownUserType {
                    keyspace: keyspace.clone(),
                    name: name.clone(),
                }
            })?;
            let fields = def
                .fields
                .iter()
                .map(|(_, field_type)| decode_value(&mut value, field_type, types))
                .collect::<Result<Vec<_>>>()?;
            ScalarValue::UserDefined(fields)
        }
    };

    // Nested values must fill their declared length.
    if value.remaining() != 0 {
        return Err(ReprError::InvalidValue {
            datatype: datatype.clone(),
            reason: format!("{} unread bytes", value.remaining()),
        });
    }

    Ok(decoded)
}

fn decode_elements(
    cursor: &mut Cursor<'_>,
    elem: &DataType,
    types: &dyn TypeResolver,
) -> Result<Vec<ScalarValue>> {
    let count = cursor.read_len()?;
    // Don't trust the count for the allocation, every element takes at least
    // 4 bytes.
    let mut vals = Vec::with_capacity(count.min(cursor.remaining() / 4));
    for _ in 0..count {
        vals.push(decode_value(cursor, elem, types)?);
    }
    Ok(vals)
}

/// Bounds-checked reader over a payload.
#[derive(Debug)]
struct Cursor<'a> {
    buf: &'a [u8],
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Cursor { buf }
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.buf.len() < needed {
            return Err(ReprError::Truncated {
                needed,
                remaining: self.buf.len(),
            });
        }
        Ok(())
    }

    fn read_i32(&mut self) -> Result<i32> {
        self.ensure(4)?;
        Ok(self.get_i32())
    }

    /// Read a non-negative count.
    fn read_len(&mut self) -> Result<usize> {
        let len = self.read_i32()?;
        if len < 0 {
            return Err(ReprError::InvalidLength(len));
        }
        Ok(len as usize)
    }

    fn take_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let (data, rest) = self.buf.split_at(n);
        self.buf = rest;
        Ok(data)
    }
}

impl Buf for Cursor<'_> {
    fn remaining(&self) -> usize {
        self.buf.len()
    }

    fn chunk(&self) -> &[u8] {
        self.buf
    }

    fn advance(&mut self, cnt: usize) {
        self.buf = &self.buf[cnt..]
    }
}
