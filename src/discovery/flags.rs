//! Attribute bitmasks used by the discovery predicates.
//!
//! ## Reference
//! * [ECMA-335 Partition II, Section 23.1](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use bitflags::bitflags;

bitflags! {
    /// `TypeAttributes` bits relevant for classifying a type definition.
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct TypeAttributes: u32 {
        /// Mask over the visibility bits; nested visibilities use values 2..=7
        const VISIBILITY_MASK = 0x0000_0007;
        /// Type is public and not nested
        const PUBLIC = 0x0000_0001;
        /// Mask over the class semantics bit
        const CLASS_SEMANTICS_MASK = 0x0000_0020;
        /// Type is an interface
        const INTERFACE = 0x0000_0020;
        /// Type is abstract
        const ABSTRACT = 0x0000_0080;
        /// Type cannot be derived from
        const SEALED = 0x0000_0100;
        /// Name has special meaning to the runtime
        const SPECIAL_NAME = 0x0000_0400;
    }
}

bitflags! {
    /// `MethodAttributes` bits relevant for classifying a method definition.
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct MethodAttributes: u16 {
        /// Mask over the member access bits
        const MEMBER_ACCESS_MASK = 0x0007;
        /// Method is accessible from anywhere
        const PUBLIC = 0x0006;
        /// Method is defined on the type rather than on instances
        const STATIC = 0x0010;
        /// Method is virtual
        const VIRTUAL = 0x0040;
        /// Method has no body
        const ABSTRACT = 0x0400;
        /// Name has special meaning to the runtime
        const SPECIAL_NAME = 0x0800;
    }
}
