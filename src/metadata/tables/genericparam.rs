use crate::{
    file::io::{read_le_at, read_le_at_dyn},
    metadata::{
        tables::{CodedIndex, CodedIndexType, RowReadable, TableInfoRef},
        token::Token,
    },
    Result,
};

#[derive(Clone, Debug)]
/// The `GenericParam` table defines the generic parameters of generic types and methods. `TableId` = 0x2A
pub struct GenericParamRaw {
    /// `RowID`
    pub rid: u32,
    /// Token
    pub token: Token,
    /// Offset
    pub offset: usize,
    /// the 2-byte index of the generic parameter, numbered left-to-right, from zero
    pub number: u16,
    /// a 2-byte bitmask of type `GenericParamAttributes`
    pub flags: u16,
    /// an index into the `TypeDef` or `MethodDef` table, specifying the owner of this parameter; a `TypeOrMethodDef` coded index
    pub owner: CodedIndex,
    /// an index into the String heap
    pub name: u32,
}

impl RowReadable for GenericParamRaw {
    #[rustfmt::skip]
    fn row_size(sizes: &TableInfoRef) -> u32 {
        u32::from(
            /* number */    2 +
            /* flags */     2 +
            /* owner */     sizes.coded_index_bytes(CodedIndexType::TypeOrMethodDef) +
            /* name */      sizes.str_bytes()
        )
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self> {
        Ok(GenericParamRaw {
            rid,
            token: Token::new(0x2A00_0000 + rid),
            offset: *offset,
            number: read_le_at::<u16>(data, offset)?,
            flags: read_le_at::<u16>(data, offset)?,
            owner: CodedIndex::read(data, offset, sizes, CodedIndexType::TypeOrMethodDef)?,
            name: read_le_at_dyn(data, offset, sizes.is_large_str())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::metadata::tables::{MetadataTable, TableId, TableInfo};

    #[test]
    fn crafted_short() {
        let data = vec![
            0x00, 0x00, // number
            0x04, 0x00, // flags
            0x03, 0x00, // owner (row 1, tag 1 = MethodDef)
            0x42, 0x00, // name
        ];

        let sizes = Arc::new(TableInfo::new_test(
            &[(TableId::TypeDef, 1), (TableId::MethodDef, 1)],
            false,
            false,
            false,
        ));
        let table = MetadataTable::<GenericParamRaw>::new(&data, 1, sizes);

        let row = table.get(1).unwrap();
        assert_eq!(row.rid, 1);
        assert_eq!(row.token.value(), 0x2A000001);
        assert_eq!(row.number, 0);
        assert_eq!(row.flags, 4);
        assert_eq!(
            row.owner,
            CodedIndex {
                tag: TableId::MethodDef,
                row: 1,
                token: Token::new(0x06000001),
            }
        );
        assert_eq!(row.name, 0x42);
    }

    #[test]
    fn crafted_type_owner() {
        let data = vec![
            0x01, 0x00, // number
            0x00, 0x00, // flags
            0x04, 0x00, // owner (row 2, tag 0 = TypeDef)
            0x10, 0x00, // name
        ];

        let sizes = Arc::new(TableInfo::new_test(
            &[(TableId::TypeDef, 2), (TableId::MethodDef, 2)],
            false,
            false,
            false,
        ));
        let table = MetadataTable::<GenericParamRaw>::new(&data, 1, sizes);

        let row = table.get(1).unwrap();
        assert_eq!(row.number, 1);
        assert_eq!(row.owner.tag, TableId::TypeDef);
        assert_eq!(row.owner.row, 2);
    }
}
