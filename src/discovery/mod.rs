//! Test discovery over managed metadata.
//!
//! Walks the `TypeDef` and `MethodDef` tables of a parsed image, classifies
//! "test-like" symbols and derives a stable 128-bit identifier for each hit.
//!
//! A test class is public, not an interface, not generic, not nested, not
//! abstract (unless also sealed, the static-class encoding), and its name
//! ends with the literal suffix `Tests`. A test method is public, static or
//! instance, neither virtual nor abstract, takes no parameters and returns
//! void. The rules replicate a fixed historical contract; they are checked
//! bit-for-bit against the attribute masks in [`flags`] and the method
//! signature blob.
//!
//! # Example
//!
//! ```rust,no_run
//! use testscope::{discovery::Discoverer, file::Image};
//!
//! let image = Image::from_file("tests.dll".as_ref())?;
//! let discoverer = Discoverer::new("executor://demo/v1");
//! for case in discoverer.discover(&image, "tests.dll")? {
//!     println!("{} -> {}", case.fully_qualified_name(), case.id);
//! }
//! # Ok::<(), testscope::Error>(())
//! ```

pub mod flags;

use uguid::Guid;

use crate::{
    discovery::flags::{MethodAttributes, TypeAttributes},
    file::{Image, Parser},
    identity::TestIdProvider,
    metadata::{
        streams::TablesHeader,
        tables::{GenericParamRaw, MetadataTable, MethodDefRaw, TableId, TypeDefRaw},
        token::Token,
        Metadata,
    },
    Result,
};

/// Byte-exact name suffix that marks a test class
const TESTS_SUFFIX: &[u8] = b"Tests";
/// Separator fed between name fragments when deriving identifiers
const DOT: u8 = b'.';
/// ECMA-335 `ELEMENT_TYPE_VOID` signature type code
const ELEMENT_TYPE_VOID: u32 = 0x01;

/// One discovered test case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestCase {
    /// Namespace of the declaring class, empty when the class has none
    pub namespace: String,
    /// Name of the declaring class
    pub class_name: String,
    /// Name of the test method
    pub method_name: String,
    /// Metadata token of the method definition
    pub token: Token,
    /// Stable identifier derived from the executor URI, source path and name fragments
    pub id: Guid,
}

impl TestCase {
    /// `namespace.class.method`, with the namespace segment omitted when the
    /// declaring class has no namespace.
    #[must_use]
    pub fn fully_qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            format!("{}.{}", self.class_name, self.method_name)
        } else {
            format!("{}.{}.{}", self.namespace, self.class_name, self.method_name)
        }
    }
}

/// Discovers test cases in managed images and assigns them stable identifiers.
///
/// The executor URI is the first identifier fragment of every test case; two
/// discoverers with the same URI produce identical ids for identical input.
pub struct Discoverer {
    executor_uri: String,
}

impl Discoverer {
    /// Create a discoverer for the given executor URI.
    #[must_use]
    pub fn new(executor_uri: impl Into<String>) -> Discoverer {
        Discoverer {
            executor_uri: executor_uri.into(),
        }
    }

    /// Discover all test cases in `image`.
    ///
    /// `source` is the path or name the collaborator knows the image by; it
    /// flows into each test case identifier, not into parsing. Images without
    /// an `Assembly` table (plain modules) yield no test cases.
    ///
    /// ## Arguments
    /// * `image`   - The image to walk
    /// * `source`  - The source path of the image, as an identifier fragment
    ///
    /// # Errors
    /// Returns an error if the image carries no managed metadata or the
    /// metadata is malformed.
    pub fn discover(&self, image: &Image, source: &str) -> Result<Vec<TestCase>> {
        let metadata = Metadata::parse(image.metadata()?)?;
        let tables = metadata.tables()?;
        let strings = metadata.strings()?;
        let blob = metadata.blob()?;

        // Plain modules cannot carry tests
        if !tables.has_table(TableId::Assembly) {
            return Ok(Vec::new());
        }

        let Some(type_defs) = tables.table::<TypeDefRaw>(TableId::TypeDef) else {
            return Ok(Vec::new());
        };
        let Some(methods) = tables.table::<MethodDefRaw>(TableId::MethodDef) else {
            return Ok(Vec::new());
        };

        let mut provider = TestIdProvider::new();
        let mut cases = Vec::new();

        for type_def in &type_defs {
            if !is_test_class(type_def.flags) || type_generic_arity(tables, type_def.rid) > 0 {
                continue;
            }

            let class_bytes = strings.get_bytes(type_def.type_name as usize)?;
            if !name_ends_with_tests(class_bytes) {
                continue;
            }

            let namespace_bytes = strings.get_bytes(type_def.type_namespace as usize)?;

            // The method run of this type ends where the next row's run begins
            let method_end = match type_defs.get(type_def.rid + 1) {
                Some(next_row) => next_row.method_list,
                None => methods.row_count() + 1,
            };

            for method_rid in type_def.method_list..method_end {
                let Some(method) = methods.get(method_rid) else {
                    continue;
                };

                if !is_test_method(method.flags) {
                    continue;
                }

                let signature = blob.get(method.signature as usize)?;
                if !signature_is_parameterless_void(signature) {
                    continue;
                }

                let method_bytes = strings.get_bytes(method.name as usize)?;

                provider.append(self.executor_uri.as_bytes());
                provider.append(source.as_bytes());
                provider.append(namespace_bytes);
                provider.append(&[DOT]);
                provider.append(class_bytes);
                provider.append(&[DOT]);
                provider.append(method_bytes);

                cases.push(TestCase {
                    namespace: strings.get(type_def.type_namespace as usize)?.to_string(),
                    class_name: strings.get(type_def.type_name as usize)?.to_string(),
                    method_name: strings.get(method.name as usize)?.to_string(),
                    token: method.token,
                    id: provider.id_and_reset(),
                });
            }
        }

        Ok(cases)
    }
}

/// Number of generic parameters owned by the `TypeDef` row `rid`.
fn type_generic_arity(tables: &TablesHeader<'_>, rid: u32) -> usize {
    match tables.table::<GenericParamRaw>(TableId::GenericParam) {
        Some(generic_params) => generic_params
            .iter()
            .filter(|param| param.owner.tag == TableId::TypeDef && param.owner.row == rid)
            .count(),
        None => 0,
    }
}

/// Attribute half of the test-class predicate.
///
/// Public visibility also rules out nested types, whose visibility values are
/// 2 through 7.
fn is_test_class(raw_flags: u32) -> bool {
    let attributes = TypeAttributes::from_bits_retain(raw_flags);

    (attributes & TypeAttributes::VISIBILITY_MASK) == TypeAttributes::PUBLIC
        && (attributes & TypeAttributes::CLASS_SEMANTICS_MASK) != TypeAttributes::INTERFACE
        && (!attributes.contains(TypeAttributes::ABSTRACT)
            || attributes.contains(TypeAttributes::SEALED))
        && !attributes.contains(TypeAttributes::SPECIAL_NAME)
}

/// Byte-exact comparison of the name tail against `Tests`.
fn name_ends_with_tests(name: &[u8]) -> bool {
    name.len() >= TESTS_SUFFIX.len() && &name[name.len() - TESTS_SUFFIX.len()..] == TESTS_SUFFIX
}

/// Attribute half of the test-method predicate. Static and instance methods
/// both qualify.
fn is_test_method(raw_flags: u16) -> bool {
    let attributes = MethodAttributes::from_bits_retain(raw_flags);

    (attributes & MethodAttributes::MEMBER_ACCESS_MASK) == MethodAttributes::PUBLIC
        && !attributes.contains(MethodAttributes::SPECIAL_NAME)
        && !attributes.contains(MethodAttributes::ABSTRACT)
        && !attributes.contains(MethodAttributes::VIRTUAL)
}

/// Signature half of the test-method predicate: non-generic, default calling
/// convention, zero parameters, void return. A blob too short to decide
/// disqualifies the method instead of failing the discovery pass.
fn signature_is_parameterless_void(signature: &[u8]) -> bool {
    let mut parser = Parser::new(signature);

    let Ok(header) = parser.read_le::<u8>() else {
        return false;
    };
    if header & 0x10 != 0 {
        // generic method signature
        return false;
    }
    if header & 0x0F != 0 {
        // only the default calling convention qualifies
        return false;
    }

    match parser.read_compressed_uint() {
        Ok(0) => {}
        _ => return false,
    }

    matches!(parser.read_compressed_uint(), Ok(ELEMENT_TYPE_VOID))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_predicate() {
        assert!(is_test_class(0x0000_0001)); // public
        assert!(is_test_class(0x0000_0181)); // public abstract sealed (static class)
        assert!(!is_test_class(0x0000_0081)); // public abstract, not sealed
        assert!(!is_test_class(0x0000_0021)); // public interface
        assert!(!is_test_class(0x0000_0401)); // public special name
        assert!(!is_test_class(0x0000_0000)); // internal
        assert!(!is_test_class(0x0000_0002)); // nested public
    }

    #[test]
    fn name_suffix() {
        assert!(name_ends_with_tests(b"FooTests"));
        assert!(name_ends_with_tests(b"Tests"));
        assert!(!name_ends_with_tests(b"FooTest"));
        assert!(!name_ends_with_tests(b"Footests"));
        assert!(!name_ends_with_tests(b"Tes"));
        assert!(!name_ends_with_tests(b""));
    }

    #[test]
    fn method_predicate() {
        assert!(is_test_method(0x0016)); // public static
        assert!(is_test_method(0x0006)); // public instance
        assert!(!is_test_method(0x0013)); // assembly static
        assert!(!is_test_method(0x0046)); // public virtual
        assert!(!is_test_method(0x0406)); // public abstract
        assert!(!is_test_method(0x0806)); // public special name
    }

    #[test]
    fn signature_predicate() {
        assert!(signature_is_parameterless_void(&[0x00, 0x00, 0x01]));
        // static methods omit HASTHIS, instance methods carry 0x20; both pass
        assert!(signature_is_parameterless_void(&[0x20, 0x00, 0x01]));

        assert!(!signature_is_parameterless_void(&[0x10, 0x01, 0x00, 0x01])); // generic
        assert!(!signature_is_parameterless_void(&[0x05, 0x00, 0x01])); // vararg
        assert!(!signature_is_parameterless_void(&[0x00, 0x01, 0x01, 0x08])); // one parameter
        assert!(!signature_is_parameterless_void(&[0x00, 0x00, 0x0E])); // returns string
        assert!(!signature_is_parameterless_void(&[0x00, 0x00])); // truncated
        assert!(!signature_is_parameterless_void(&[]));
    }
}
