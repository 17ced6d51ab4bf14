// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Record, schema and column model.
//!
//! A [`UniversalSketch`](crate::universal::UniversalSketch) summarizes one
//! column of a record stream. This module provides the minimal typed view of
//! that stream: a [`Schema`] names the columns and their fixed byte widths,
//! and a [`Record`] carries one encoded byte string per column. The sketch
//! only ever reads the raw bytes of its tracked column; decoding the other
//! fields is the caller's concern.
//!
//! # Examples
//!
//! ```
//! use unisketch::schema::Column;
//! use unisketch::schema::Record;
//! use unisketch::schema::Schema;
//!
//! let schema = Schema::new(vec![
//!     Column::new("timestamp", 8),
//!     Column::new("src_addr", 4),
//! ]);
//! let column = schema.column("src_addr").unwrap();
//! assert_eq!(column.idx(), 1);
//! assert_eq!(column.width(), 4);
//!
//! let record = Record::new(vec![
//!     1_700_000_000_u64.to_le_bytes().to_vec(),
//!     [10, 0, 0, 1].to_vec(),
//! ]);
//! assert_eq!(record.field(column.idx()), &[10, 0, 0, 1]);
//! ```

/// One column of a record schema: a name and a fixed width in bytes.
///
/// The width drives the layer count of a universal sketch built with
/// accuracy parameters: one layer per bit of the column's domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    idx: usize,
    name: String,
    width: usize,
}

impl Column {
    /// Creates a column with the given name and byte width.
    ///
    /// The column's index is assigned when it is added to a [`Schema`].
    ///
    /// # Panics
    ///
    /// Panics if `width` is 0.
    pub fn new(name: impl Into<String>, width: usize) -> Self {
        assert!(width > 0, "column width must be at least 1 byte");
        Column {
            idx: 0,
            name: name.into(),
            width,
        }
    }

    /// Returns the column's position within its schema.
    pub fn idx(&self) -> usize {
        self.idx
    }

    /// Returns the column's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the column's width in bytes.
    pub fn width(&self) -> usize {
        self.width
    }
}

/// An ordered collection of [`Column`]s describing one record layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// Creates a schema from columns in record order.
    ///
    /// Column indices are assigned from position.
    ///
    /// # Panics
    ///
    /// Panics if `columns` is empty.
    pub fn new(columns: Vec<Column>) -> Self {
        assert!(!columns.is_empty(), "schema must have at least one column");
        let columns = columns
            .into_iter()
            .enumerate()
            .map(|(idx, mut column)| {
                column.idx = idx;
                column
            })
            .collect();
        Schema { columns }
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns the columns in record order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
}

/// One record of a stream: an encoded byte string per column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: Vec<Vec<u8>>,
}

impl Record {
    /// Creates a record from its encoded fields, in schema column order.
    pub fn new(fields: Vec<Vec<u8>>) -> Self {
        Record { fields }
    }

    /// Returns the encoded bytes of the field at `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of range for this record.
    pub fn field(&self, idx: usize) -> &[u8] {
        &self.fields[idx]
    }
}
