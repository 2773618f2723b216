//! Materialized packages and the precompiled package format.
//!
//! Layout of an encoded package (all integers are varints):
//!
//! ```text
//! [descriptor: len + UTF-8 TOML]
//! [entry count]
//! [entry]*  = [path: len + UTF-8][type tag: len + UTF-8][payload: len + bytes]
//! ```
//!
//! Each payload is produced by the binary resolver for its type tag and is
//! decoded from its own slice, never from the surrounding stream.

use std::any::Any;
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::{Arc, OnceLock};

use respack_schema::{
    Blake3Hash, ContextFreeReader, ContextFreeWriter, Descriptor, FormatError, UsageMode,
};

use crate::class_name::{CLASS_NAME_RECORD_PATH, ClassNameRecord};
use crate::error::ResourceError;
use crate::resolver::{Content, ResolveError, TypeResolverRegistry};

/// One typed value in a package's content tree.
#[derive(Debug, Clone)]
pub struct ContentEntry {
    type_tag: String,
    value: Content,
}

impl ContentEntry {
    /// Type tag the value was decoded with.
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    /// The type-erased value.
    pub fn value(&self) -> &Content {
        &self.value
    }
}

/// A materialized package: descriptor plus content tree.
///
/// Content is never mutated after construction. The usage mode is set once,
/// when the package is first registered.
#[derive(Debug)]
pub struct Package {
    metadata: Descriptor,
    content: BTreeMap<String, ContentEntry>,
    digest: Option<Blake3Hash>,
    usage: OnceLock<UsageMode>,
}

impl Package {
    /// Decode a precompiled package.
    ///
    /// Entries whose type cannot be resolved are skipped and reported in
    /// `errors`; the caller decides whether that is acceptable.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Descriptor`] if the descriptor is missing or
    /// invalid, and [`ResourceError::Format`] if the framing is broken
    /// (truncated values, invalid UTF-8, duplicate paths, trailing bytes).
    pub fn from_precompiled(
        bytes: &[u8],
        registry: &TypeResolverRegistry,
        errors: &mut Vec<ResolveError>,
    ) -> Result<Self, ResourceError> {
        let mut reader = ContextFreeReader::new(bytes);
        let metadata = read_descriptor(&mut reader)?;

        let count: u32 = reader.read("entry count")?;
        let mut content = BTreeMap::new();
        for _ in 0..count {
            let path: String = reader.read("entry path")?;
            let type_tag: String = reader.read("entry type")?;
            let payload = reader.read_bytes("entry payload")?;

            if content.contains_key(&path) {
                return Err(FormatError::DuplicatePath(path).into());
            }
            if let Some(value) = registry.deserialize_precompiled(&path, &type_tag, payload, errors)
            {
                content.insert(path, ContentEntry { type_tag, value });
            }
        }
        reader.finish()?;

        Ok(Self {
            metadata,
            content,
            digest: Some(Blake3Hash::compute(bytes)),
            usage: OnceLock::new(),
        })
    }

    /// Read only the descriptor at the head of an encoded package.
    ///
    /// # Errors
    ///
    /// Same descriptor and framing errors as [`from_precompiled`](Self::from_precompiled).
    pub fn read_descriptor(bytes: &[u8]) -> Result<Descriptor, ResourceError> {
        read_descriptor(&mut ContextFreeReader::new(bytes))
    }

    /// The package descriptor.
    pub fn metadata(&self) -> &Descriptor {
        &self.metadata
    }

    /// Registered name; empty for anonymous packages.
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Whether the package has no name.
    pub fn is_anonymous(&self) -> bool {
        self.metadata.is_anonymous()
    }

    /// Content entry at `path`.
    pub fn get(&self, path: &str) -> Option<&ContentEntry> {
        self.content.get(path)
    }

    /// Content at `path`, if it is a `T`.
    pub fn get_as<T: Any + Send + Sync>(&self, path: &str) -> Option<Arc<T>> {
        let entry = self.content.get(path)?;
        Arc::clone(&entry.value).downcast::<T>().ok()
    }

    /// The class-name record at the well-known path, if any.
    pub fn class_name_record(&self) -> Option<Arc<ClassNameRecord>> {
        self.get_as::<ClassNameRecord>(CLASS_NAME_RECORD_PATH)
    }

    /// Content paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.content.keys().map(String::as_str)
    }

    /// `(path, entry)` pairs in path order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &ContentEntry)> {
        self.content.iter().map(|(path, entry)| (path.as_str(), entry))
    }

    /// Number of content entries.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Whether the content tree is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Digest of the bytes the package was decoded from.
    ///
    /// `None` for packages assembled in memory with [`PackageBuilder::build`].
    pub fn digest(&self) -> Option<&Blake3Hash> {
        self.digest.as_ref()
    }

    /// Usage mode the package was registered with.
    pub fn usage(&self) -> Option<UsageMode> {
        self.usage.get().copied()
    }

    /// Record the usage mode. Returns `false` if one was already recorded.
    pub(crate) fn initialize(&self, usage: UsageMode) -> bool {
        self.usage.set(usage).is_ok()
    }
}

fn read_descriptor(reader: &mut ContextFreeReader<'_>) -> Result<Descriptor, ResourceError> {
    let text: String = reader.read("descriptor")?;
    Ok(Descriptor::parse(&text)?)
}

/// Assembles a package in memory and encodes it.
#[derive(Debug, Clone)]
pub struct PackageBuilder {
    metadata: Descriptor,
    content: BTreeMap<String, ContentEntry>,
}

impl PackageBuilder {
    /// Start a package with the given descriptor.
    pub fn new(metadata: Descriptor) -> Self {
        Self {
            metadata,
            content: BTreeMap::new(),
        }
    }

    /// Add (or replace) the value at `path`, encoded with resolver `type_tag`.
    pub fn insert<T: Any + Send + Sync>(
        mut self,
        path: impl Into<String>,
        type_tag: impl Into<String>,
        value: T,
    ) -> Self {
        self.content.insert(
            path.into(),
            ContentEntry {
                type_tag: type_tag.into(),
                value: Arc::new(value),
            },
        );
        self
    }

    /// Finish as an in-memory package without encoding it.
    pub fn build(self) -> Package {
        Package {
            metadata: self.metadata,
            content: self.content,
            digest: None,
            usage: OnceLock::new(),
        }
    }

    /// Encode the package.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Descriptor`] if the descriptor breaks its
    /// invariants and [`ResourceError::Content`] with every entry that no
    /// registered resolver could encode.
    pub fn to_bytes(&self, registry: &TypeResolverRegistry) -> Result<Vec<u8>, ResourceError> {
        self.metadata.validate()?;

        let mut writer = ContextFreeWriter::new();
        writer.write(self.metadata.to_text()?.as_str())?;
        writer.write(&(self.content.len() as u32))?;

        let mut errors = Vec::new();
        let mut payload = Vec::new();
        for (path, entry) in &self.content {
            payload.clear();
            if let Err(e) =
                registry.serialize_precompiled(path, &entry.type_tag, &entry.value, &mut payload)
            {
                errors.push(e);
                continue;
            }
            writer.write(path.as_str())?;
            writer.write(entry.type_tag.as_str())?;
            writer.write_bytes(&payload)?;
        }

        if !errors.is_empty() {
            return Err(ResourceError::Content(errors));
        }
        Ok(writer.into_bytes())
    }

    /// Encode the package into `out`.
    ///
    /// # Errors
    ///
    /// Same as [`to_bytes`](Self::to_bytes), plus [`ResourceError::Io`] if
    /// writing fails.
    pub fn write_to<W: Write>(
        &self,
        registry: &TypeResolverRegistry,
        mut out: W,
    ) -> Result<(), ResourceError> {
        out.write_all(&self.to_bytes(registry)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_name::CLASS_NAME_RECORD_TYPE;
    use crate::resolver::tests::{MarkupOnly, TextBlob};

    fn registry() -> TypeResolverRegistry {
        let mut registry = TypeResolverRegistry::with_builtins();
        registry.register(TextBlob);
        registry
    }

    fn widgets() -> PackageBuilder {
        PackageBuilder::new(Descriptor::named("widgets").with_dependency("theme"))
            .insert(
                CLASS_NAME_RECORD_PATH,
                CLASS_NAME_RECORD_TYPE,
                ClassNameRecord::new(["ui.Button", "ui.Label"]),
            )
            .insert("strings/title", "Text", "Widgets".to_string())
    }

    #[test]
    fn decodes_what_the_builder_encodes() {
        let registry = registry();
        let bytes = widgets().to_bytes(&registry).unwrap();

        let mut errors = Vec::new();
        let package = Package::from_precompiled(&bytes, &registry, &mut errors).unwrap();
        assert!(errors.is_empty());
        assert_eq!(package.name(), "widgets");
        assert!(package.metadata().dependencies.contains("theme"));
        assert_eq!(
            package.paths().collect::<Vec<_>>(),
            vec![CLASS_NAME_RECORD_PATH, "strings/title"]
        );
        assert_eq!(
            package.class_name_record().unwrap().class_names,
            vec!["ui.Button", "ui.Label"]
        );
        assert_eq!(
            package.get_as::<String>("strings/title").unwrap().as_str(),
            "Widgets"
        );
        assert_eq!(package.get("strings/title").unwrap().type_tag(), "Text");
        assert_eq!(package.digest(), Some(&Blake3Hash::compute(&bytes)));
    }

    #[test]
    fn write_to_emits_the_encoded_bytes() {
        let registry = registry();
        let mut out = Vec::new();
        widgets().write_to(&registry, &mut out).unwrap();
        assert_eq!(out, widgets().to_bytes(&registry).unwrap());

        let package = Package::from_precompiled(&out, &registry, &mut Vec::new()).unwrap();
        assert_eq!(package.name(), "widgets");
        assert_eq!(package.len(), 2);
    }

    #[test]
    fn get_as_checks_the_type() {
        let package = widgets().build();
        assert!(package.get_as::<u32>("strings/title").is_none());
        assert!(package.get_as::<String>("missing").is_none());
        assert!(package.digest().is_none());
    }

    #[test]
    fn descriptor_can_be_read_alone() {
        let bytes = widgets().to_bytes(&registry()).unwrap();
        let descriptor = Package::read_descriptor(&bytes).unwrap();
        assert_eq!(descriptor.name, "widgets");
    }

    #[test]
    fn unknown_types_are_collected_not_fatal() {
        let bytes = widgets().to_bytes(&registry()).unwrap();

        let mut errors = Vec::new();
        let package =
            Package::from_precompiled(&bytes, &TypeResolverRegistry::with_builtins(), &mut errors)
                .unwrap();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ResolveError::UnknownType { ref tag, .. } if tag == "Text"));
        assert!(package.get("strings/title").is_none());
        assert!(package.class_name_record().is_some());
    }

    #[test]
    fn builder_reports_every_unencodable_entry() {
        let mut registry = registry();
        registry.register(MarkupOnly);
        let builder = PackageBuilder::new(Descriptor::anonymous())
            .insert("a", "Markup", "<a/>".to_string())
            .insert("b", "Image", vec![0_u8]);

        match builder.to_bytes(&registry) {
            Err(ResourceError::Content(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected content error, got {other:?}"),
        }
    }

    #[test]
    fn builder_rejects_unnamed_dependencies() {
        let builder = PackageBuilder::new(Descriptor::anonymous().with_dependency("theme"));
        assert!(matches!(
            builder.to_bytes(&registry()),
            Err(ResourceError::Descriptor(_))
        ));
    }

    #[test]
    fn truncated_stream_is_a_format_error() {
        let bytes = widgets().to_bytes(&registry()).unwrap();
        let err = Package::from_precompiled(&bytes[..bytes.len() - 2], &registry(), &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, ResourceError::Format(FormatError::Truncated(_))));
    }

    #[test]
    fn trailing_garbage_is_a_format_error() {
        let mut bytes = widgets().to_bytes(&registry()).unwrap();
        bytes.push(0xFF);
        let err = Package::from_precompiled(&bytes, &registry(), &mut Vec::new()).unwrap_err();
        assert!(matches!(err, ResourceError::Format(FormatError::TrailingBytes(1))));
    }

    #[test]
    fn duplicate_paths_are_rejected() {
        let mut writer = ContextFreeWriter::new();
        writer.write("name = \"dup\"").unwrap();
        writer.write(&2_u32).unwrap();
        for _ in 0..2 {
            writer.write("p").unwrap();
            writer.write("Text").unwrap();
            writer.write_bytes(b"x").unwrap();
        }
        let err = Package::from_precompiled(&writer.into_bytes(), &registry(), &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, ResourceError::Format(FormatError::DuplicatePath(ref p)) if p == "p"));
    }

    #[test]
    fn invalid_descriptor_is_rejected() {
        let mut writer = ContextFreeWriter::new();
        writer.write("name = [").unwrap();
        writer.write(&0_u32).unwrap();
        let err = Package::read_descriptor(&writer.into_bytes()).unwrap_err();
        assert!(matches!(err, ResourceError::Descriptor(_)));
    }

    #[test]
    fn usage_is_recorded_once() {
        let package = widgets().build();
        assert_eq!(package.usage(), None);
        assert!(package.initialize(UsageMode::InstanceClass));
        assert!(!package.initialize(UsageMode::DataOnly));
        assert_eq!(package.usage(), Some(UsageMode::InstanceClass));
    }
}
