use crate::{
    file::io::{read_le_at, read_le_at_dyn},
    metadata::{
        tables::{RowReadable, TableId, TableInfoRef},
        token::Token,
    },
    Result,
};

#[derive(Clone, Debug)]
/// The `MethodDef` table defines the methods of the types in the current module. `TableId` = 0x06
pub struct MethodDefRaw {
    /// `RowID`
    pub rid: u32,
    /// Token
    pub token: Token,
    /// Offset
    pub offset: usize,
    /// the relative virtual address of the method body, 0 for abstract and runtime-provided methods
    pub rva: u32,
    /// a 2-byte bitmask of type `MethodImplAttributes`
    pub impl_flags: u16,
    /// a 2-byte bitmask of type `MethodAttributes`
    pub flags: u16,
    /// an index into the String heap
    pub name: u32,
    /// an index into the Blob heap, pointing to the method signature
    pub signature: u32,
    /// an index into the Param table; it marks the first of a contiguous run of Params owned by this method
    pub param_list: u32,
}

impl RowReadable for MethodDefRaw {
    #[rustfmt::skip]
    fn row_size(sizes: &TableInfoRef) -> u32 {
        u32::from(
            /* rva */           4 +
            /* impl_flags */    2 +
            /* flags */         2 +
            /* name */          sizes.str_bytes() +
            /* signature */     sizes.blob_bytes() +
            /* param_list */    sizes.table_index_bytes(TableId::Param)
        )
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self> {
        Ok(MethodDefRaw {
            rid,
            token: Token::new(0x0600_0000 + rid),
            offset: *offset,
            rva: read_le_at::<u32>(data, offset)?,
            impl_flags: read_le_at::<u16>(data, offset)?,
            flags: read_le_at::<u16>(data, offset)?,
            name: read_le_at_dyn(data, offset, sizes.is_large_str())?,
            signature: read_le_at_dyn(data, offset, sizes.is_large_blob())?,
            param_list: read_le_at_dyn(data, offset, sizes.is_large(TableId::Param))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::metadata::tables::{MetadataTable, TableInfo};

    #[test]
    fn crafted_short() {
        let data = vec![
            0x00, 0x20, 0x00, 0x00, // rva
            0x00, 0x00, // impl_flags
            0x16, 0x00, // flags (public | static)
            0x42, 0x00, // name
            0x07, 0x00, // signature
            0x01, 0x00, // param_list
        ];

        let sizes = Arc::new(TableInfo::new_test(
            &[(TableId::Param, 1)],
            false,
            false,
            false,
        ));
        let table = MetadataTable::<MethodDefRaw>::new(&data, 1, sizes);

        let row = table.get(1).unwrap();
        assert_eq!(row.rid, 1);
        assert_eq!(row.token.value(), 0x06000001);
        assert_eq!(row.rva, 0x2000);
        assert_eq!(row.impl_flags, 0);
        assert_eq!(row.flags, 0x16);
        assert_eq!(row.name, 0x42);
        assert_eq!(row.signature, 0x07);
        assert_eq!(row.param_list, 1);
    }

    #[test]
    fn crafted_long() {
        let data = vec![
            0x00, 0x20, 0x00, 0x00, // rva
            0x01, 0x00, // impl_flags
            0x06, 0x08, // flags
            0x00, 0x00, 0x00, 0x02, // name
            0x00, 0x00, 0x00, 0x03, // signature
            0x00, 0x00, 0x00, 0x04, // param_list
        ];

        let sizes = Arc::new(TableInfo::new_test(
            &[(TableId::Param, u16::MAX as u32 + 2)],
            true,
            true,
            true,
        ));
        let table = MetadataTable::<MethodDefRaw>::new(&data, 1, sizes);

        let row = table.get(1).unwrap();
        assert_eq!(row.impl_flags, 1);
        assert_eq!(row.flags, 0x0806);
        assert_eq!(row.name, 0x02000000);
        assert_eq!(row.signature, 0x03000000);
        assert_eq!(row.param_list, 0x04000000);
    }
}
