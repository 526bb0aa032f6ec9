//! In-memory stand-ins for the object store and metadata table

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures::StreamExt;

use crate::db::FileRepository;
use crate::models::{FileRecord, NewFileRecord};
use crate::services::FileService;
use crate::storage::{ObjectInfo, ObjectStore, StorageError, StoredObject};
use crate::AppState;

#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, (Bytes, String)>>,
    failing_stats: Mutex<HashSet<String>>,
    removes_in_flight: AtomicUsize,
    peak_removes: AtomicUsize,
}

impl MemoryObjectStore {
    pub fn insert(&self, key: &str, data: &'static [u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (Bytes::from_static(data), String::new()));
    }

    /// Make `stat_object` fail for `key`
    pub fn fail_stat(&self, key: &str) {
        self.failing_stats.lock().unwrap().insert(key.to_string());
    }

    /// Highest number of `remove_object` calls seen in progress at once
    pub fn peak_concurrent_removes(&self) -> usize {
        self.peak_removes.load(Ordering::SeqCst)
    }

    pub fn contents(&self, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(data, _)| data.to_vec())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn ensure_bucket(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data, content_type.to_string()));
        Ok(())
    }

    async fn stat_object(&self, key: &str) -> Result<Option<ObjectInfo>, StorageError> {
        if self.failing_stats.lock().unwrap().contains(key) {
            return Err(StorageError::DownloadError(format!("stat failed: {}", key)));
        }

        Ok(self
            .objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(data, content_type)| object_info(key, data, content_type)))
    }

    async fn get_object(&self, key: &str) -> Result<StoredObject, StorageError> {
        let (data, content_type) = self
            .objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;

        Ok(StoredObject {
            info: object_info(key, &data, &content_type),
            body: futures::stream::iter(vec![Ok::<_, std::io::Error>(data)]).boxed(),
        })
    }

    async fn remove_object(&self, key: &str) -> Result<(), StorageError> {
        let in_flight = self.removes_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_removes.fetch_max(in_flight, Ordering::SeqCst);

        // Suspend like a network call so concurrent deletes interleave
        tokio::task::yield_now().await;

        self.objects.lock().unwrap().remove(key);
        self.removes_in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

fn object_info(key: &str, data: &Bytes, content_type: &str) -> ObjectInfo {
    ObjectInfo {
        key: key.to_string(),
        size: Some(data.len() as i64),
        content_type: (!content_type.is_empty()).then(|| content_type.to_string()),
    }
}

#[derive(Default)]
pub struct MemoryFileRepository {
    records: Mutex<Vec<FileRecord>>,
}

impl MemoryFileRepository {
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl FileRepository for MemoryFileRepository {
    async fn insert_file(&self, file: &NewFileRecord) -> Result<FileRecord, sqlx::Error> {
        let record = FileRecord {
            id: file.id.clone(),
            name: file.name.clone(),
            original_name: file.original_name.clone(),
            size: file.size,
            content_type: file.content_type.clone(),
            uploaded_at: Utc::now(),
        };
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn list_files(&self) -> Result<Vec<FileRecord>, sqlx::Error> {
        let mut records = self.records.lock().unwrap().clone();
        // Newest insert first when timestamps tie
        records.reverse();
        records.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(records)
    }

    async fn delete_by_name(&self, name: &str) -> Result<u64, sqlx::Error> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|record| record.name != name);
        Ok((before - records.len()) as u64)
    }
}

/// Application state backed by in-memory stores
pub fn memory_state() -> (AppState, Arc<MemoryObjectStore>, Arc<MemoryFileRepository>) {
    let store = Arc::new(MemoryObjectStore::default());
    let repository = Arc::new(MemoryFileRepository::default());
    let state = AppState {
        file_service: Arc::new(FileService::new(store.clone(), repository.clone())),
    };
    (state, store, repository)
}

/// Build a `multipart/form-data` body with a single file part
pub fn multipart_body(
    field: &str,
    filename: &str,
    content_type: &str,
    data: &[u8],
) -> (String, Vec<u8>) {
    let headers = format!(
        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}",
        field, filename, content_type
    );
    encode_part(&headers, data)
}

/// Build a `multipart/form-data` body with a single plain form value
pub fn multipart_field_body(field: &str, value: &[u8]) -> (String, Vec<u8>) {
    let headers = format!("Content-Disposition: form-data; name=\"{}\"", field);
    encode_part(&headers, value)
}

fn encode_part(headers: &str, data: &[u8]) -> (String, Vec<u8>) {
    let boundary = "----file-service-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(format!("{}\r\n\r\n", headers).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    (format!("multipart/form-data; boundary={}", boundary), body)
}
