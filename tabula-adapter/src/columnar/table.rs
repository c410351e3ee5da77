use tabula_error::{TabulaResult, tabula_bail, tabula_err};
use tabula_format::{FieldFormat, FieldName, UniversalField};

use crate::columnar::graph::FormatCache;
use crate::columnar::node::{ColumnarNode, encode_descriptor};
use crate::columnar::{
    DATA_KEY, FORMAT_ID_KEY, FORMAT_KEY, RECORD_TYPE, is_columnar_node, new_node,
};
use crate::field_index::FieldIndexed;
use crate::generic::GenericFormat;
use crate::raw::{RawArray, RawObject, RawValue};
use crate::table::{MoveTarget, check_merge, move_within};
use crate::{AdapterKind, Table};

/// A table view over a columnar `recordset` node.
///
/// Rows are positional value arrays. Record nodes handed out by [`Table::at`] share the row and
/// the descriptor list with the table, so writing through a record view of a row writes into
/// the table.
#[derive(Debug)]
pub struct ColumnarTable {
    node: ColumnarNode,
    generic: GenericFormat,
}

impl ColumnarTable {
    pub fn new(node: RawObject) -> Self {
        Self {
            node: ColumnarNode::new(node),
            generic: GenericFormat::default(),
        }
    }

    fn count_rows(&self) -> TabulaResult<usize> {
        Ok(self.node.data()?.map(|data| data.len()).unwrap_or_default())
    }

    fn row(&self, index: usize) -> TabulaResult<RawArray> {
        let Some(data) = self.node.data()? else {
            tabula_bail!(IndexOutOfRange: index, 0, 0);
        };
        match data.get(index) {
            Some(RawValue::Array(row)) => Ok(row),
            Some(other) => tabula_bail!(
                InvalidPayloadShape: "row {} is {}, not an array",
                index,
                other.type_name()
            ),
            None => tabula_bail!(IndexOutOfRange: index, 0, data.len()),
        }
    }

    fn all_rows(&self) -> TabulaResult<Vec<RawArray>> {
        (0..self.count_rows()?)
            .map(|index| self.row(index))
            .collect()
    }

    fn record_node(&self, row: RawArray) -> TabulaResult<RawValue> {
        self.node.resolve(&RawValue::Array(row.clone()))?;
        Ok(RawValue::Object(new_node(
            row,
            self.node.descriptors()?,
            RECORD_TYPE,
        )))
    }

    /// The row to store for an incoming record node. The record's fields must match the
    /// table's, unless the table has no format yet and adopts the record's. A row the table
    /// already holds is stored as a copy.
    fn incoming(&self, record: RawValue) -> TabulaResult<RawArray> {
        let record_node = match &record {
            RawValue::Object(object) if is_columnar_node(object) => object.clone(),
            other => tabula_bail!(
                InvalidPayloadShape: "expected a columnar record, got {}",
                other.type_name()
            ),
        };
        let row = match record_node.get(DATA_KEY) {
            Some(RawValue::Array(row)) => row,
            None | Some(RawValue::Null) => RawArray::new(),
            Some(other) => tabula_bail!(
                InvalidPayloadShape: "record data is {}, not an array",
                other.type_name()
            ),
        };
        let record_descriptors = FormatCache::new(record).resolve_node(&record_node)?;
        let record_fields = record_descriptors
            .as_ref()
            .map(FieldIndexed::field_names)
            .unwrap_or_default();

        let descriptors = self.node.descriptors()?;
        if let Some(descriptors) = &descriptors {
            if descriptors.field_names() != record_fields {
                tabula_bail!(
                    InvalidPayloadShape: "record fields [{}] do not match table fields [{}]",
                    record_fields.join(", "),
                    descriptors.field_names().join(", ")
                );
            }
        }

        let row = if self.holds(&row)? {
            self.node.resolve(&RawValue::Array(row.clone()))?;
            row.deep_clone()
        } else {
            row
        };
        let len = record_fields.len();
        row.update(|values| {
            if values.len() < len {
                values.resize(len, RawValue::Null);
            }
        });

        if let (None, Some(record_descriptors)) = (descriptors, record_descriptors) {
            log::trace!("table adopts the format of its first record");
            let table_node = self.node.raw();
            table_node.remove(FORMAT_ID_KEY);
            table_node.insert(FORMAT_KEY, RawValue::Array(record_descriptors.deep_clone()));
        }
        Ok(row)
    }

    /// Whether `row` is one of the table's rows.
    fn holds(&self, row: &RawArray) -> TabulaResult<bool> {
        Ok(self.node.data()?.is_some_and(|data| {
            data.to_vec()
                .iter()
                .any(|stored| stored.as_array().is_some_and(|stored| stored.ptr_eq(row)))
        }))
    }

    /// The descriptor list, created empty if the table has none yet.
    fn descriptors_or_create(&self) -> TabulaResult<RawArray> {
        if let Some(descriptors) = self.node.descriptors()? {
            return Ok(descriptors);
        }
        let descriptors = RawArray::new();
        self.node.raw().remove(FORMAT_ID_KEY);
        self.node
            .raw()
            .insert(FORMAT_KEY, RawValue::Array(descriptors.clone()));
        Ok(descriptors)
    }
}

impl Table for ColumnarTable {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Columnar
    }

    fn data(&self) -> RawValue {
        RawValue::Object(self.node.raw().clone())
    }

    fn fields(&self) -> TabulaResult<Vec<FieldName>> {
        self.node.fields()
    }

    fn count(&self) -> TabulaResult<usize> {
        self.count_rows()
    }

    /// A record node over the row, sharing the row's values and the table's descriptor list.
    fn at(&self, index: usize) -> TabulaResult<RawValue> {
        let row = self.row(index)?;
        self.record_node(row)
    }

    fn add(&mut self, record: RawValue, at: Option<usize>) -> TabulaResult<()> {
        let count = self.count_rows()?;
        let at = at.unwrap_or(count);
        if at > count {
            tabula_bail!(IndexOutOfRange: at, 0, count + 1);
        }
        let row = self.incoming(record)?;
        self.node.data_or_create()?.insert(at, RawValue::Array(row))
    }

    fn remove(&mut self, index: usize) -> TabulaResult<()> {
        match self.node.data()? {
            Some(data) => data.remove(index).map(|_| ()),
            None => tabula_bail!(IndexOutOfRange: index, 0, 0),
        }
    }

    fn replace(&mut self, record: RawValue, index: usize) -> TabulaResult<()> {
        let count = self.count_rows()?;
        if index >= count {
            tabula_bail!(IndexOutOfRange: index, 0, count);
        }
        let row = self.incoming(record)?;
        self.node.data_or_create()?.set(index, RawValue::Array(row))
    }

    fn move_row(&mut self, source: usize, target: MoveTarget) -> TabulaResult<()> {
        match self.node.data()? {
            Some(data) => data.update(|rows| move_within(rows, source, target)),
            None => tabula_bail!(IndexOutOfRange: source, 0, 0),
        }
    }

    /// Copies the donor's values into the acceptor position by position, except at the
    /// position of `key_field`.
    fn merge(&mut self, acceptor: usize, donor: usize, key_field: &str) -> TabulaResult<()> {
        check_merge(acceptor, donor, self.count_rows()?)?;
        let key = self.node.position(key_field)?;
        let len = self.node.fields()?.len();
        let acceptor_row = self.row(acceptor)?;
        let donor_row = self.row(donor)?;
        for position in (0..len).filter(|position| Some(*position) != key) {
            let value = donor_row.get(position).unwrap_or(RawValue::Null);
            acceptor_row.set_padded(position, value)?;
        }
        self.remove(donor)
    }

    fn copy(&mut self, index: usize) -> TabulaResult<RawValue> {
        let row = self.row(index)?;
        self.node.resolve(&RawValue::Array(row.clone()))?;
        let copy = row.deep_clone();
        self.node
            .data_or_create()?
            .insert(index + 1, RawValue::Array(copy.clone()))?;
        self.record_node(copy)
    }

    fn clear(&mut self) -> TabulaResult<()> {
        if let Some(data) = self.node.data()? {
            data.clear();
        }
        Ok(())
    }

    fn add_field(&mut self, format: &FieldFormat, at: Option<usize>) -> TabulaResult<()> {
        let descriptors = self.descriptors_or_create()?;
        if descriptors.field_position(format.name()).is_some() {
            tabula_bail!(DuplicateField: "{}", format.name());
        }
        let len = descriptors.len();
        let at = at.unwrap_or(len);
        if at > len {
            tabula_bail!(IndexOutOfRange: at, 0, len + 1);
        }
        let rows = self.all_rows()?;
        descriptors.insert(at, encode_descriptor(format)?)?;
        descriptors.field_index().invalidate();

        let value = RawValue::from(format.default_value());
        for row in rows {
            row.update(|values| {
                if values.len() < len {
                    values.resize(len, RawValue::Null);
                }
                values.insert(at, value.deep_clone());
            });
        }
        log::trace!("added field {} at {at}", format.name());
        Ok(())
    }

    fn remove_field(&mut self, name: &str) -> TabulaResult<()> {
        let position = self
            .node
            .position(name)?
            .ok_or_else(|| tabula_err!(FieldNotFound: "{}", name))?;
        self.remove_field_at(position)
    }

    fn remove_field_at(&mut self, index: usize) -> TabulaResult<()> {
        let Some(descriptors) = self.node.descriptors()? else {
            tabula_bail!(IndexOutOfRange: index, 0, 0);
        };
        if index >= descriptors.len() {
            tabula_bail!(IndexOutOfRange: index, 0, descriptors.len());
        }
        let rows = self.all_rows()?;
        descriptors.remove(index)?;
        descriptors.field_index().invalidate();
        for row in rows {
            row.update(|values| {
                if index < values.len() {
                    values.remove(index);
                }
            });
        }
        Ok(())
    }

    fn format(&self, name: &str) -> TabulaResult<FieldFormat> {
        self.node.format(name)
    }

    fn shared_format(&mut self, name: &str) -> TabulaResult<&UniversalField> {
        let format = self.node.format(name)?;
        Ok(self.generic.share(&format))
    }
}
