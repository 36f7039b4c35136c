use std::collections::HashMap;
use std::fmt::Debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tessel_error::{TesselResult, tessel_bail, tessel_err};
use tessel_schema::ArraySchema;
use url::Url;

/// Name of the schema document inside an array directory.
pub const SCHEMA_FILENAME: &str = "__array_schema.json";

const SCHEMA_FORMAT_VERSION: u32 = 1;

/// Persisted schemas, addressed by URI.
///
/// The URI and its on-disk representation are opaque to everything above the store.
pub trait SchemaStore: Debug + Send + Sync {
    /// Persist `schema` at `uri`. Fails if a schema already exists there.
    fn create(&self, uri: &str, schema: &ArraySchema) -> TesselResult<()>;

    /// Read the schema persisted at `uri`.
    fn load(&self, uri: &str) -> TesselResult<ArraySchema>;

    fn exists(&self, uri: &str) -> TesselResult<bool>;

    /// Delete the schema persisted at `uri`.
    fn remove(&self, uri: &str) -> TesselResult<()>;
}

/// Where a URI points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaUri {
    /// `mem://...`: process-local, lost when the store is dropped.
    Memory(String),
    /// `file://...` or a plain filesystem path: an array directory.
    File(PathBuf),
}

impl SchemaUri {
    pub fn parse(uri: &str) -> TesselResult<Self> {
        if uri.is_empty() {
            tessel_bail!("array URI must not be empty");
        }
        match Url::parse(uri) {
            Ok(url) => match url.scheme() {
                "mem" => Ok(SchemaUri::Memory(url.to_string())),
                "file" => url
                    .to_file_path()
                    .map(SchemaUri::File)
                    .map_err(|()| tessel_err!("invalid file URI '{uri}'")),
                scheme => tessel_bail!("unsupported URI scheme '{scheme}' in '{uri}'"),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) => Ok(SchemaUri::File(PathBuf::from(uri))),
            Err(e) => tessel_bail!("invalid URI '{uri}': {e}"),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct SchemaDocument<S> {
    version: u32,
    schema: S,
}

/// Keeps schemas in process memory.
#[derive(Debug, Default)]
pub struct MemorySchemaStore {
    schemas: RwLock<HashMap<String, ArraySchema>>,
}

impl SchemaStore for MemorySchemaStore {
    fn create(&self, uri: &str, schema: &ArraySchema) -> TesselResult<()> {
        let mut schemas = self.schemas.write();
        if schemas.contains_key(uri) {
            tessel_bail!(SchemaError: "array already exists at '{uri}'");
        }
        schemas.insert(uri.to_string(), schema.clone());
        Ok(())
    }

    fn load(&self, uri: &str) -> TesselResult<ArraySchema> {
        self.schemas
            .read()
            .get(uri)
            .cloned()
            .ok_or_else(|| tessel_err!(SchemaError: "no array schema at '{uri}'"))
    }

    fn exists(&self, uri: &str) -> TesselResult<bool> {
        Ok(self.schemas.read().contains_key(uri))
    }

    fn remove(&self, uri: &str) -> TesselResult<()> {
        self.schemas
            .write()
            .remove(uri)
            .map(|_| ())
            .ok_or_else(|| tessel_err!(SchemaError: "no array schema at '{uri}'"))
    }
}

/// Stores each schema as a JSON document inside the array's directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSchemaStore;

impl FileSchemaStore {
    fn document_path(uri: &str) -> TesselResult<PathBuf> {
        match SchemaUri::parse(uri)? {
            SchemaUri::File(dir) => Ok(dir.join(SCHEMA_FILENAME)),
            SchemaUri::Memory(_) => tessel_bail!("'{uri}' is not a file URI"),
        }
    }

    fn read_document(path: &Path) -> TesselResult<ArraySchema> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tessel_bail!(SchemaError: "no array schema at '{}'", path.display())
            }
            Err(e) => return Err(e.into()),
        };
        let document: SchemaDocument<ArraySchema> = serde_json::from_slice(&bytes)?;
        if document.version != SCHEMA_FORMAT_VERSION {
            tessel_bail!(
                SchemaError: "unsupported array schema format version {} in '{}'",
                document.version,
                path.display()
            );
        }
        Ok(document.schema)
    }
}

impl SchemaStore for FileSchemaStore {
    /// The document is staged in a temporary file next to its final location and moved into
    /// place only if nothing exists there yet, so a reader never sees a partial document.
    fn create(&self, uri: &str, schema: &ArraySchema) -> TesselResult<()> {
        let path = Self::document_path(uri)?;
        let dir = path
            .parent()
            .ok_or_else(|| tessel_err!("'{uri}' does not name an array directory"))?;
        fs::create_dir_all(dir)?;

        let document = SchemaDocument {
            version: SCHEMA_FORMAT_VERSION,
            schema,
        };
        let mut staged = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut staged, &document)?;
        staged.as_file().sync_all()?;

        match staged.persist_noclobber(&path) {
            Ok(_) => Ok(()),
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                tessel_bail!(SchemaError: "array already exists at '{uri}'")
            }
            Err(e) => Err(e.error.into()),
        }
    }

    fn load(&self, uri: &str) -> TesselResult<ArraySchema> {
        Self::read_document(&Self::document_path(uri)?)
    }

    fn exists(&self, uri: &str) -> TesselResult<bool> {
        Ok(Self::document_path(uri)?.is_file())
    }

    fn remove(&self, uri: &str) -> TesselResult<()> {
        let path = Self::document_path(uri)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tessel_bail!(SchemaError: "no array schema at '{uri}'")
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Dispatches on the URI scheme: `mem://` to memory, everything else to the filesystem.
#[derive(Debug, Default)]
pub struct UriSchemaStore {
    memory: MemorySchemaStore,
    file: FileSchemaStore,
}

impl UriSchemaStore {
    fn route(&self, uri: &str) -> TesselResult<&dyn SchemaStore> {
        let store: &dyn SchemaStore = match SchemaUri::parse(uri)? {
            SchemaUri::Memory(_) => &self.memory,
            SchemaUri::File(_) => &self.file,
        };
        Ok(store)
    }
}

impl SchemaStore for UriSchemaStore {
    fn create(&self, uri: &str, schema: &ArraySchema) -> TesselResult<()> {
        self.route(uri)?.create(uri, schema)
    }

    fn load(&self, uri: &str) -> TesselResult<ArraySchema> {
        self.route(uri)?.load(uri)
    }

    fn exists(&self, uri: &str) -> TesselResult<bool> {
        self.route(uri)?.exists(uri)
    }

    fn remove(&self, uri: &str) -> TesselResult<()> {
        self.route(uri)?.remove(uri)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::thread;

    use rstest::rstest;
    use tessel_error::TesselError;
    use tessel_schema::{ArrayType, Attribute, Config, Datatype, Dimension};

    use super::*;

    fn sparse_schema() -> ArraySchema {
        let mut schema = ArraySchema::new(ArrayType::Sparse);
        schema
            .add_dimension(Dimension::new("x", [0u64, 99], Some(10)).unwrap())
            .unwrap();
        schema
            .add_attribute(Attribute::new("v", Datatype::Float64), &Config::default())
            .unwrap();
        schema
    }

    #[rstest]
    #[case("mem://arrays/a", SchemaUri::Memory("mem://arrays/a".to_string()))]
    #[case("file:///tmp/a", SchemaUri::File(PathBuf::from("/tmp/a")))]
    #[case("relative/a", SchemaUri::File(PathBuf::from("relative/a")))]
    fn parse_uris(#[case] uri: &str, #[case] expected: SchemaUri) {
        assert_eq!(SchemaUri::parse(uri).unwrap(), expected);
    }

    #[test]
    fn unsupported_scheme() {
        assert!(SchemaUri::parse("s3://bucket/a").is_err());
        assert!(SchemaUri::parse("").is_err());
    }

    #[test]
    fn memory_round_trip() {
        let store = MemorySchemaStore::default();
        let schema = sparse_schema();
        store.create("mem://a", &schema).unwrap();
        assert!(store.exists("mem://a").unwrap());
        assert_eq!(store.load("mem://a").unwrap(), schema);

        let err = store.create("mem://a", &schema).unwrap_err();
        assert!(matches!(err, TesselError::SchemaError(..)));

        store.remove("mem://a").unwrap();
        assert!(store.load("mem://a").is_err());
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let uri = dir.path().join("array").to_string_lossy().into_owned();
        let store = FileSchemaStore;
        let schema = sparse_schema();

        store.create(&uri, &schema).unwrap();
        assert!(dir.path().join("array").join(SCHEMA_FILENAME).is_file());
        assert_eq!(store.load(&uri).unwrap(), schema);
        assert!(store.create(&uri, &schema).is_err());

        store.remove(&uri).unwrap();
        assert!(!store.exists(&uri).unwrap());
    }

    #[test]
    fn file_rejects_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        let uri = dir.path().to_string_lossy().into_owned();
        FileSchemaStore.create(&uri, &sparse_schema()).unwrap();

        let path = dir.path().join(SCHEMA_FILENAME);
        let mut document: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        document["version"] = serde_json::Value::from(99);
        fs::write(&path, serde_json::to_vec(&document).unwrap()).unwrap();

        let err = FileSchemaStore.load(&uri).unwrap_err();
        assert!(matches!(err, TesselError::SchemaError(..)));
        assert!(err.message().contains("version 99"));
    }

    #[test]
    fn uri_store_routes_by_scheme() {
        let dir = tempfile::tempdir().unwrap();
        let store = UriSchemaStore::default();
        let schema = sparse_schema();
        let file_uri = Url::from_directory_path(dir.path()).unwrap().join("a").unwrap();

        store.create("mem://a", &schema).unwrap();
        store.create(file_uri.as_str(), &schema).unwrap();
        assert!(dir.path().join("a").join(SCHEMA_FILENAME).is_file());
        assert!(store.exists("mem://a").unwrap());
        assert!(!store.exists("mem://b").unwrap());
    }

    #[test]
    fn concurrent_file_creates_have_one_winner() {
        let store = FileSchemaStore;
        let schema = sparse_schema();
        let root = tempfile::tempdir().unwrap();

        for round in 0..50 {
            let dir = root.path().join(format!("array_{round}"));
            let uri = dir.to_string_lossy().into_owned();
            let barrier = Barrier::new(4);
            let (barrier, uri_ref, schema_ref) = (&barrier, uri.as_str(), &schema);
            let created = thread::scope(|s| {
                let workers: Vec<_> = (0..4)
                    .map(|_| {
                        s.spawn(move || {
                            barrier.wait();
                            store.create(uri_ref, schema_ref)
                        })
                    })
                    .collect();
                workers
                    .into_iter()
                    .map(|worker| worker.join().unwrap())
                    .filter(Result::is_ok)
                    .count()
            });

            assert_eq!(created, 1, "round {round}");
            assert_eq!(store.load(&uri).unwrap(), schema);
            let entries = fs::read_dir(&dir).unwrap().count();
            assert_eq!(entries, 1, "staging files left behind in round {round}");
        }
    }
}
