//! Tables stream (`#~`) header and table directory.
//!
//! The `#~` stream starts with a fixed 24-byte header carrying the `valid` and
//! `sorted` bitvectors and the heap-size flags, followed by one `u32` row count
//! per present table and then the packed table rows themselves. This module
//! parses that header, computes every present table's data offset from the row
//! size math in [`crate::metadata::tables`], and hands out typed
//! [`MetadataTable`] views.
//!
//! # Reference
//! - [ECMA-335 II.24.2.6](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use std::sync::Arc;

use crate::{
    file::io::read_le,
    metadata::tables::{row_size_of, MetadataTable, RowReadable, TableId, TableInfo, TableInfoRef},
    Error::OutOfBounds,
    Result,
};

/// Number of addressable table slots (the highest defined table id plus one).
pub(crate) const TABLE_SLOT_COUNT: usize = TableId::GenericParamConstraint as usize + 1;

/// Parsed `#~` stream: header fields plus the location of every present table.
pub struct TablesHeader<'a> {
    /// Major version of the table schema
    pub major_version: u8,
    /// Minor version of the table schema
    pub minor_version: u8,
    /// Bit vector of present tables
    pub valid: u64,
    /// Bit vector of sorted tables
    pub sorted: u64,
    /// Index and heap width information shared by all row readers
    pub info: TableInfoRef,

    data: &'a [u8],
    /// Per-table (data offset, row count); `None` for absent tables
    locations: [Option<(usize, u32)>; TABLE_SLOT_COUNT],
}

impl<'a> TablesHeader<'a> {
    /// Parse the `#~` stream.
    ///
    /// # Arguments
    /// * `data` - The full tables stream, starting at its 24-byte header
    ///
    /// # Errors
    /// Returns an error if the stream is truncated, no table is present, a
    /// `valid` bit names a table this reader does not know, or the declared
    /// rows extend past the end of the stream.
    pub fn from(data: &'a [u8]) -> Result<TablesHeader<'a>> {
        if data.len() < 24 {
            return Err(OutOfBounds);
        }

        let valid_bitvec = read_le::<u64>(&data[8..])?;
        if valid_bitvec == 0 {
            return Err(malformed_error!("No valid rows in any of the tables"));
        }

        // Row counts are stored in bit order; an unknown bit would shift every
        // subsequent count and table offset, so reject it up front.
        for bit in 0..64u8 {
            if valid_bitvec & (1u64 << bit) != 0 && TableId::from_bit(bit).is_none() {
                return Err(malformed_error!("Unknown metadata table id - {:#04x}", bit));
            }
        }

        let info: TableInfoRef = Arc::new(TableInfo::new(data, valid_bitvec)?);

        let mut locations = [None; TABLE_SLOT_COUNT];
        let mut current_offset = (24 + valid_bitvec.count_ones() * 4) as usize;
        for bit in 0..64u8 {
            if valid_bitvec & (1u64 << bit) == 0 {
                continue;
            }

            // Just validated above
            let Some(table_id) = TableId::from_bit(bit) else {
                continue;
            };

            let rows = info.get(table_id).rows;
            if rows == 0 {
                continue;
            }

            let table_size = row_size_of(table_id, &info) as usize * rows as usize;
            if current_offset + table_size > data.len() {
                return Err(OutOfBounds);
            }

            locations[table_id as usize] = Some((current_offset, rows));
            current_offset += table_size;
        }

        Ok(TablesHeader {
            major_version: read_le::<u8>(&data[4..])?,
            minor_version: read_le::<u8>(&data[5..])?,
            valid: valid_bitvec,
            sorted: read_le::<u64>(&data[16..])?,
            info,
            data,
            locations,
        })
    }

    /// Number of tables present in this stream.
    #[must_use]
    pub fn table_count(&self) -> u32 {
        self.valid.count_ones()
    }

    /// Returns `true` if the given table is present with at least one row.
    #[must_use]
    pub fn has_table(&self, table_id: TableId) -> bool {
        self.locations[table_id as usize].is_some()
    }

    /// Row count of the given table, 0 when absent.
    #[must_use]
    pub fn row_count(&self, table_id: TableId) -> u32 {
        self.locations[table_id as usize].map_or(0, |(_, rows)| rows)
    }

    /// Get a typed view over one table, or `None` if the table is absent.
    ///
    /// The type parameter `T` must be the row reader matching `table_id`; a
    /// mismatch misparses rows without memory unsafety.
    #[must_use]
    pub fn table<T: RowReadable>(&self, table_id: TableId) -> Option<MetadataTable<'a, T>> {
        let (offset, rows) = self.locations[table_id as usize]?;
        Some(MetadataTable::new(
            &self.data[offset..],
            rows,
            self.info.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::tables::TypeDefRaw;

    /// Minimal `#~` stream: Module + TypeDef tables, small heaps.
    fn crafted_stream() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&0u32.to_le_bytes()); // reserved
        data.push(2); // major
        data.push(0); // minor
        data.push(0); // heap size flags (all small)
        data.push(1); // reserved
        let valid = (1u64 << TableId::Module as usize) | (1u64 << TableId::TypeDef as usize);
        data.extend_from_slice(&valid.to_le_bytes());
        data.extend_from_slice(&0u64.to_le_bytes()); // sorted
        data.extend_from_slice(&1u32.to_le_bytes()); // Module rows
        data.extend_from_slice(&1u32.to_le_bytes()); // TypeDef rows

        // Module row: generation(2) + name(2) + mvid(2) + encid(2) + encbaseid(2)
        data.extend_from_slice(&[0, 0, 1, 0, 1, 0, 0, 0, 0, 0]);
        // TypeDef row: flags(4) + name(2) + namespace(2) + extends(2) + field_list(2) + method_list(2)
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&[10, 0, 0, 0, 0, 0, 1, 0, 1, 0]);

        data
    }

    #[test]
    fn crafted() {
        let data = crafted_stream();
        let header = TablesHeader::from(&data).unwrap();

        assert_eq!(header.major_version, 2);
        assert_eq!(header.table_count(), 2);
        assert!(header.has_table(TableId::Module));
        assert!(header.has_table(TableId::TypeDef));
        assert!(!header.has_table(TableId::MethodDef));
        assert_eq!(header.row_count(TableId::TypeDef), 1);

        let typedefs = header.table::<TypeDefRaw>(TableId::TypeDef).unwrap();
        let row = typedefs.get(1).unwrap();
        assert_eq!(row.flags, 1);
        assert_eq!(row.type_name, 10);
        assert_eq!(row.method_list, 1);
    }

    #[test]
    fn rejects_empty_bitvec() {
        let mut data = crafted_stream();
        data[8..16].copy_from_slice(&0u64.to_le_bytes());
        assert!(TablesHeader::from(&data).is_err());
    }

    #[test]
    fn rejects_truncated_rows() {
        let data = crafted_stream();
        assert!(TablesHeader::from(&data[..data.len() - 4]).is_err());
    }
}
