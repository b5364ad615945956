//! Object-store-backed primary store. Blobs are addressable by URL only.

use super::{BlobRef, Location, PersistenceError, PrimaryStore, content_type_for, validate_path_hint};
use crate::remote::ObjectBackend;
use std::sync::Arc;

pub struct BucketStore {
    backend: Arc<dyn ObjectBackend>,
}

impl BucketStore {
    pub fn new(backend: Arc<dyn ObjectBackend>) -> Self {
        Self { backend }
    }
}

impl PrimaryStore for BucketStore {
    fn save(&self, blob: &[u8], path_hint: &str) -> Result<BlobRef, PersistenceError> {
        validate_path_hint(path_hint)?;
        self.backend
            .put_object(path_hint, blob.to_vec(), content_type_for(path_hint))?;
        Ok(BlobRef::new(path_hint))
    }

    fn read(&self, blob: &BlobRef) -> Result<Vec<u8>, PersistenceError> {
        Ok(self.backend.get_object(blob.as_str())?)
    }

    fn path_or_url(&self, blob: &BlobRef) -> Location {
        Location::Url(self.backend.public_url(blob.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::tests::{MockObjectBackend, RecordedOp};

    #[test]
    fn save_puts_object_with_content_type() {
        let backend = Arc::new(MockObjectBackend::new());
        let store = BucketStore::new(backend.clone());
        let blob = store.save(b"png", "uploads/original/a.png").unwrap();
        assert_eq!(blob.as_str(), "uploads/original/a.png");
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Put {
                key: "uploads/original/a.png".into(),
                size: 3,
                content_type: "image/png".into(),
            }]
        );
    }

    #[test]
    fn read_fetches_object() {
        let backend = Arc::new(MockObjectBackend::new());
        let store = BucketStore::new(backend);
        let blob = store.save(b"abc", "k.jpg").unwrap();
        assert_eq!(store.read(&blob).unwrap(), b"abc");
    }

    #[test]
    fn location_is_url() {
        let store = BucketStore::new(Arc::new(MockObjectBackend::new()));
        assert_eq!(
            store.path_or_url(&BlobRef::new("k.jpg")),
            Location::Url("https://mock-bucket.test/k.jpg".into())
        );
    }

    #[test]
    fn transport_failure_is_persistence_error() {
        let store = BucketStore::new(Arc::new(MockObjectBackend::failing()));
        let result = store.save(b"abc", "k.jpg");
        assert!(matches!(result, Err(PersistenceError::Remote(_))));
    }
}
