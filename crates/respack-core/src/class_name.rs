//! Class-name record: the list of class full names a package provides.
//!
//! Packages that carry a record at [`CLASS_NAME_RECORD_PATH`] are indexed by
//! every name in it, so `get_by_class_name` can find the package that backs
//! a class.

use std::sync::Arc;

use respack_schema::{ContextFreeReader, ContextFreeWriter, FormatError};
use serde::{Deserialize, Serialize};

use crate::resolver::{BinaryResolver, Content, ResolveError, TypeResolver};

/// Type tag of [`ClassNameRecord`] entries.
pub const CLASS_NAME_RECORD_TYPE: &str = "ClassNameRecord";

/// Well-known content path of a package's class-name record.
pub const CLASS_NAME_RECORD_PATH: &str = "Precompiled/ClassNameRecord";

/// Ordered class full names. Duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassNameRecord {
    /// Class full names in declaration order.
    pub class_names: Vec<String>,
}

impl ClassNameRecord {
    /// Build a record from any list of names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            class_names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Encode as a varint count followed by length-prefixed strings.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Postcard`] if serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>, FormatError> {
        let mut writer = ContextFreeWriter::new();
        writer.write(&self.class_names)?;
        Ok(writer.into_bytes())
    }

    /// Decode a record from exactly the bytes [`encode`](Self::encode) produced.
    ///
    /// # Errors
    ///
    /// Returns a [`FormatError`] if the input is truncated, contains invalid
    /// UTF-8, or has bytes left over.
    pub fn decode(bytes: &[u8]) -> Result<Self, FormatError> {
        let mut reader = ContextFreeReader::new(bytes);
        let class_names = reader.read("class names")?;
        reader.finish()?;
        Ok(Self { class_names })
    }
}

/// Binary-only resolver for [`ClassNameRecord`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassNameRecordResolver;

impl TypeResolver for ClassNameRecordResolver {
    fn type_tag(&self) -> &str {
        CLASS_NAME_RECORD_TYPE
    }

    fn as_binary(&self) -> Option<&dyn BinaryResolver> {
        Some(self)
    }
}

impl BinaryResolver for ClassNameRecordResolver {
    fn serialize_precompiled(
        &self,
        path: &str,
        content: &Content,
        out: &mut Vec<u8>,
    ) -> Result<(), ResolveError> {
        let record =
            content
                .downcast_ref::<ClassNameRecord>()
                .ok_or_else(|| ResolveError::TypeMismatch {
                    path: path.to_string(),
                    expected: "ClassNameRecord",
                })?;
        let bytes = record.encode().map_err(|e| ResolveError::Encode {
            path: path.to_string(),
            tag: CLASS_NAME_RECORD_TYPE.to_string(),
            message: e.to_string(),
        })?;
        out.extend_from_slice(&bytes);
        Ok(())
    }

    fn deserialize_precompiled(
        &self,
        path: &str,
        input: &[u8],
        errors: &mut Vec<ResolveError>,
    ) -> Option<Content> {
        match ClassNameRecord::decode(input) {
            Ok(record) => Some(Arc::new(record)),
            Err(e) => {
                errors.push(ResolveError::Decode {
                    path: path.to_string(),
                    tag: CLASS_NAME_RECORD_TYPE.to_string(),
                    message: e.to_string(),
                });
                None
            }
        }
    }
}
