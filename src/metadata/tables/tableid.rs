use strum::{EnumCount, EnumIter};

/// Identifiers for the metadata tables defined in ECMA-335.
///
/// The numeric values correspond to the table ids as defined in the CLI
/// specification and to the bit positions of the `valid` bitvector in the
/// `#~` stream header.
///
/// ## Reference
/// * [ECMA-335 Partition II, Section 22](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)
#[derive(Clone, Copy, PartialEq, Debug, EnumIter, EnumCount, Eq, Hash)]
pub enum TableId {
    /// `Module` table (0x00) - Information about the current module
    Module = 0x00,
    /// `TypeRef` table (0x01) - References to types in external assemblies
    TypeRef = 0x01,
    /// `TypeDef` table (0x02) - Type definitions of this module
    TypeDef = 0x02,
    /// `FieldPtr` table (0x03) - Field indirection for unoptimized images
    FieldPtr = 0x03,
    /// `Field` table (0x04) - Field definitions
    Field = 0x04,
    /// `MethodPtr` table (0x05) - Method indirection for unoptimized images
    MethodPtr = 0x05,
    /// `MethodDef` table (0x06) - Method definitions
    MethodDef = 0x06,
    /// `ParamPtr` table (0x07) - Parameter indirection for unoptimized images
    ParamPtr = 0x07,
    /// `Param` table (0x08) - Method parameter definitions
    Param = 0x08,
    /// `InterfaceImpl` table (0x09) - Interface implementations by types
    InterfaceImpl = 0x09,
    /// `MemberRef` table (0x0A) - References to external members
    MemberRef = 0x0A,
    /// `Constant` table (0x0B) - Compile-time constant values
    Constant = 0x0B,
    /// `CustomAttribute` table (0x0C) - Custom attribute applications
    CustomAttribute = 0x0C,
    /// `FieldMarshal` table (0x0D) - Marshalling information for fields
    FieldMarshal = 0x0D,
    /// `DeclSecurity` table (0x0E) - Declarative security permissions
    DeclSecurity = 0x0E,
    /// `ClassLayout` table (0x0F) - Memory layout information for types
    ClassLayout = 0x0F,
    /// `FieldLayout` table (0x10) - Explicit field positioning within types
    FieldLayout = 0x10,
    /// `StandAloneSig` table (0x11) - Standalone signatures
    StandAloneSig = 0x11,
    /// `EventMap` table (0x12) - Mapping from types to their events
    EventMap = 0x12,
    /// `EventPtr` table (0x13) - Event indirection for unoptimized images
    EventPtr = 0x13,
    /// `Event` table (0x14) - Event definitions
    Event = 0x14,
    /// `PropertyMap` table (0x15) - Mapping from types to their properties
    PropertyMap = 0x15,
    /// `PropertyPtr` table (0x16) - Property indirection for unoptimized images
    PropertyPtr = 0x16,
    /// `Property` table (0x17) - Property definitions
    Property = 0x17,
    /// `MethodSemantics` table (0x18) - Property and event accessor mappings
    MethodSemantics = 0x18,
    /// `MethodImpl` table (0x19) - Method implementation mappings
    MethodImpl = 0x19,
    /// `ModuleRef` table (0x1A) - References to external modules
    ModuleRef = 0x1A,
    /// `TypeSpec` table (0x1B) - Generic type specifications
    TypeSpec = 0x1B,
    /// `ImplMap` table (0x1C) - P/Invoke implementation mappings
    ImplMap = 0x1C,
    /// `FieldRVA` table (0x1D) - Field relative virtual addresses
    FieldRVA = 0x1D,
    /// `Assembly` table (0x20) - Current assembly metadata
    Assembly = 0x20,
    /// `AssemblyProcessor` table (0x21) - Processor-specific assembly info
    AssemblyProcessor = 0x21,
    /// `AssemblyOS` table (0x22) - OS-specific assembly info
    AssemblyOS = 0x22,
    /// `AssemblyRef` table (0x23) - References to external assemblies
    AssemblyRef = 0x23,
    /// `AssemblyRefProcessor` table (0x24) - Processor info for external assemblies
    AssemblyRefProcessor = 0x24,
    /// `AssemblyRefOS` table (0x25) - OS info for external assemblies
    AssemblyRefOS = 0x25,
    /// `File` table (0x26) - File references within the assembly
    File = 0x26,
    /// `ExportedType` table (0x27) - Types exported from this assembly
    ExportedType = 0x27,
    /// `ManifestResource` table (0x28) - Embedded or linked resources
    ManifestResource = 0x28,
    /// `NestedClass` table (0x29) - Nested class relationships
    NestedClass = 0x29,
    /// `GenericParam` table (0x2A) - Generic parameter definitions
    GenericParam = 0x2A,
    /// `MethodSpec` table (0x2B) - Generic method specifications
    MethodSpec = 0x2B,
    /// `GenericParamConstraint` table (0x2C) - Generic parameter constraints
    GenericParamConstraint = 0x2C,
}

impl TableId {
    /// Maps a bit position of the `valid` bitvector to its table id, `None` for
    /// bit positions no compressed tables stream defines.
    #[must_use]
    pub fn from_bit(bit: u8) -> Option<TableId> {
        use strum::IntoEnumIterator;

        TableId::iter().find(|table_id| *table_id as u8 == bit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bit_roundtrip() {
        use strum::IntoEnumIterator;

        for table_id in TableId::iter() {
            assert_eq!(TableId::from_bit(table_id as u8), Some(table_id));
        }

        // EncLog / EncMap only appear in uncompressed streams
        assert_eq!(TableId::from_bit(0x1E), None);
        assert_eq!(TableId::from_bit(0x1F), None);
        assert_eq!(TableId::from_bit(0x3F), None);
    }
}
