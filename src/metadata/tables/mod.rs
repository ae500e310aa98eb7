//! Metadata table infrastructure.
//!
//! The physical metadata tables are fixed-width row arrays whose column widths
//! depend on heap sizes and on the row counts of the tables they index. This
//! module provides the shared machinery: [`TableId`], [`CodedIndex`] decoding,
//! the [`TableInfo`] width cache, the [`RowReadable`] trait and the generic
//! [`MetadataTable`] container, plus [`row_size_of`] which knows the column
//! layout of every table so that table data offsets can be computed even for
//! tables this crate never materializes.
//!
//! Only the row types test discovery needs are implemented in full:
//! [`TypeDefRaw`], [`MethodDefRaw`] and [`GenericParamRaw`].
//!
//! ## Reference
//! * [ECMA-335 Partition II, Section 22](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

mod codedindex;
mod genericparam;
mod methoddef;
mod tableid;
mod tableinfo;
mod typedef;

use std::marker::PhantomData;

use crate::Result;

pub use codedindex::{CodedIndex, CodedIndexType};
pub use genericparam::GenericParamRaw;
pub use methoddef::MethodDefRaw;
pub use tableid::TableId;
pub use tableinfo::{TableInfo, TableInfoRef, TableRowInfo};
pub use typedef::TypeDefRaw;

/// Trait for types that represent one row of a metadata table.
///
/// Implementations parse a fixed-width row from the raw table data, using the
/// width information in [`TableInfoRef`] to size heap and table indexes. Row
/// ids are 1-based per the CLI specification.
pub trait RowReadable: Sized + Send {
    /// Size in bytes of a single row, given the current index widths.
    fn row_size(sizes: &TableInfoRef) -> u32;

    /// Read one row at `offset`, advancing the offset past it.
    ///
    /// # Errors
    /// Returns an error if the buffer is too small for a complete row.
    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self>;
}

/// Generic container for one metadata table with typed row access.
///
/// Rows are parsed on demand; the container itself only stores the raw bytes
/// and the row geometry.
pub struct MetadataTable<'a, T> {
    data: &'a [u8],
    row_count: u32,
    row_size: u32,
    sizes: TableInfoRef,
    _phantom: PhantomData<T>,
}

impl<'a, T: RowReadable> MetadataTable<'a, T> {
    /// Wrap raw table data.
    ///
    /// ## Arguments
    /// * `data`        - The raw bytes, starting at the table's first row
    /// * `row_count`   - Number of rows in the table
    /// * `sizes`       - Index width information for this tables stream
    #[must_use]
    pub fn new(data: &'a [u8], row_count: u32, sizes: TableInfoRef) -> Self {
        MetadataTable {
            data,
            row_count,
            row_size: T::row_size(&sizes),
            sizes,
            _phantom: PhantomData,
        }
    }

    /// Size in bytes of each row in this table.
    #[must_use]
    pub fn row_size(&self) -> u32 {
        self.row_size
    }

    /// Total number of rows in this table.
    #[must_use]
    pub fn row_count(&self) -> u32 {
        self.row_count
    }

    /// Retrieve a row by its 1-based index.
    ///
    /// Index 0 is the null reference in the metadata format; it and any index
    /// beyond the row count yield `None`.
    #[must_use]
    pub fn get(&self, index: u32) -> Option<T> {
        if index == 0 || self.row_count < index {
            return None;
        }

        T::row_read(
            self.data,
            &mut ((index as usize - 1) * self.row_size as usize),
            index,
            &self.sizes,
        )
        .ok()
    }

    /// Sequential iterator over all rows.
    #[must_use]
    pub fn iter(&'a self) -> TableIterator<'a, T> {
        TableIterator {
            table: self,
            current_row: 0,
            current_offset: 0,
        }
    }
}

impl<'a, T: RowReadable> IntoIterator for &'a MetadataTable<'a, T> {
    type Item = T;
    type IntoIter = TableIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Sequential iterator over the rows of a [`MetadataTable`].
///
/// Rows are parsed lazily; a parse failure ends the iteration.
pub struct TableIterator<'a, T> {
    table: &'a MetadataTable<'a, T>,
    current_row: u32,
    current_offset: usize,
}

impl<'a, T: RowReadable> Iterator for TableIterator<'a, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_row >= self.table.row_count {
            return None;
        }

        match T::row_read(
            self.table.data,
            &mut self.current_offset,
            self.current_row + 1,
            &self.table.sizes,
        ) {
            Ok(row) => {
                self.current_row += 1;
                Some(row)
            }
            Err(_) => None,
        }
    }
}

/// Row size in bytes of any metadata table, given the current index widths.
///
/// Knowing every table's column layout is what allows the tables stream to
/// compute the start offset of each present table, regardless of whether a
/// typed row reader exists for it.
#[must_use]
#[allow(clippy::match_same_arms)]
pub fn row_size_of(table_id: TableId, sizes: &TableInfoRef) -> u32 {
    let str_b = u32::from(sizes.str_bytes());
    let guid_b = u32::from(sizes.guid_bytes());
    let blob_b = u32::from(sizes.blob_bytes());
    let table_b = |id: TableId| u32::from(sizes.table_index_bytes(id));
    let coded_b = |ci: CodedIndexType| u32::from(sizes.coded_index_bytes(ci));

    match table_id {
        TableId::Module => 2 + str_b + 3 * guid_b,
        TableId::TypeRef => coded_b(CodedIndexType::ResolutionScope) + 2 * str_b,
        TableId::TypeDef => TypeDefRaw::row_size(sizes),
        TableId::FieldPtr => table_b(TableId::Field),
        TableId::Field => 2 + str_b + blob_b,
        TableId::MethodPtr => table_b(TableId::MethodDef),
        TableId::MethodDef => MethodDefRaw::row_size(sizes),
        TableId::ParamPtr => table_b(TableId::Param),
        TableId::Param => 4 + str_b,
        TableId::InterfaceImpl => {
            table_b(TableId::TypeDef) + coded_b(CodedIndexType::TypeDefOrRef)
        }
        TableId::MemberRef => coded_b(CodedIndexType::MemberRefParent) + str_b + blob_b,
        TableId::Constant => 2 + coded_b(CodedIndexType::HasConstant) + blob_b,
        TableId::CustomAttribute => {
            coded_b(CodedIndexType::HasCustomAttribute)
                + coded_b(CodedIndexType::CustomAttributeType)
                + blob_b
        }
        TableId::FieldMarshal => coded_b(CodedIndexType::HasFieldMarshal) + blob_b,
        TableId::DeclSecurity => 2 + coded_b(CodedIndexType::HasDeclSecurity) + blob_b,
        TableId::ClassLayout => 6 + table_b(TableId::TypeDef),
        TableId::FieldLayout => 4 + table_b(TableId::Field),
        TableId::StandAloneSig => blob_b,
        TableId::EventMap => table_b(TableId::TypeDef) + table_b(TableId::Event),
        TableId::EventPtr => table_b(TableId::Event),
        TableId::Event => 2 + str_b + coded_b(CodedIndexType::TypeDefOrRef),
        TableId::PropertyMap => table_b(TableId::TypeDef) + table_b(TableId::Property),
        TableId::PropertyPtr => table_b(TableId::Property),
        TableId::Property => 2 + str_b + blob_b,
        TableId::MethodSemantics => {
            2 + table_b(TableId::MethodDef) + coded_b(CodedIndexType::HasSemantics)
        }
        TableId::MethodImpl => {
            table_b(TableId::TypeDef) + 2 * coded_b(CodedIndexType::MethodDefOrRef)
        }
        TableId::ModuleRef => str_b,
        TableId::TypeSpec => blob_b,
        TableId::ImplMap => {
            2 + coded_b(CodedIndexType::MemberForwarded) + str_b + table_b(TableId::ModuleRef)
        }
        TableId::FieldRVA => 4 + table_b(TableId::Field),
        TableId::Assembly => 16 + blob_b + 2 * str_b,
        TableId::AssemblyProcessor => 4,
        TableId::AssemblyOS => 12,
        TableId::AssemblyRef => 12 + 2 * blob_b + 2 * str_b,
        TableId::AssemblyRefProcessor => 4 + table_b(TableId::AssemblyRef),
        TableId::AssemblyRefOS => 12 + table_b(TableId::AssemblyRef),
        TableId::File => 4 + str_b + blob_b,
        TableId::ExportedType => 8 + 2 * str_b + coded_b(CodedIndexType::Implementation),
        TableId::ManifestResource => 8 + str_b + coded_b(CodedIndexType::Implementation),
        TableId::NestedClass => 2 * table_b(TableId::TypeDef),
        TableId::GenericParam => GenericParamRaw::row_size(sizes),
        TableId::MethodSpec => coded_b(CodedIndexType::MethodDefOrRef) + blob_b,
        TableId::GenericParamConstraint => {
            table_b(TableId::GenericParam) + coded_b(CodedIndexType::TypeDefOrRef)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn row_sizes_all_small() {
        let sizes = Arc::new(TableInfo::new_test(&[], false, false, false));

        assert_eq!(row_size_of(TableId::Module, &sizes), 10);
        assert_eq!(row_size_of(TableId::TypeRef, &sizes), 6);
        assert_eq!(row_size_of(TableId::TypeDef, &sizes), 14);
        assert_eq!(row_size_of(TableId::MethodDef, &sizes), 14);
        assert_eq!(row_size_of(TableId::Assembly, &sizes), 22);
        assert_eq!(row_size_of(TableId::GenericParam, &sizes), 8);
        assert_eq!(row_size_of(TableId::CustomAttribute, &sizes), 6);

        // Every table has a non-zero fixed minimum
        for table_id in TableId::iter() {
            assert!(row_size_of(table_id, &sizes) >= 2);
        }
    }

    #[test]
    fn row_sizes_large_heaps() {
        let sizes = Arc::new(TableInfo::new_test(&[], true, true, true));

        assert_eq!(row_size_of(TableId::Module, &sizes), 18);
        assert_eq!(row_size_of(TableId::Field, &sizes), 10);
        assert_eq!(row_size_of(TableId::StandAloneSig, &sizes), 4);
    }
}
