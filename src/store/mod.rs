//! Record store module
//!
//! In-memory, ordered collection of student records plus the id counter.
//! One lock guards both, so every operation is atomic with respect to the others.

mod error;
mod student;

pub use error::{StoreError, StoreResult};
pub use student::{parse_id, Fields, Student};

use tokio::sync::RwLock;

/// First id handed out by a fresh store
const FIRST_ID: u64 = 1;

struct StoreInner {
    records: Vec<Student>,
    next_id: u64,
}

/// Student record store
pub struct StudentStore {
    inner: RwLock<StoreInner>,
}

impl StudentStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                records: Vec::new(),
                next_id: FIRST_ID,
            }),
        }
    }

    /// Append a new record with the next id
    pub async fn create(&self, fields: Fields) -> Student {
        let mut inner = self.inner.write().await;
        let id = inner.next_id;
        inner.next_id += 1;

        let student = Student::new(id, fields);
        inner.records.push(student.clone());
        student
    }

    /// Snapshot of all records in store order
    pub async fn list_all(&self) -> Vec<Student> {
        self.inner.read().await.records.clone()
    }

    pub async fn get_by_id(&self, id: u64) -> StoreResult<Student> {
        self.inner
            .read()
            .await
            .records
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    /// Replace the whole record in place; fields not resent are dropped
    pub async fn update_by_id(&self, id: u64, fields: Fields) -> StoreResult<Student> {
        let mut inner = self.inner.write().await;
        let slot = inner
            .records
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(StoreError::NotFound(id))?;

        *slot = Student::new(id, fields);
        Ok(slot.clone())
    }

    /// Remove every record with this id, returning how many went away
    pub async fn delete_by_id(&self, id: u64) -> usize {
        let mut inner = self.inner.write().await;
        let before = inner.records.len();
        inner.records.retain(|s| s.id != id);
        before - inner.records.len()
    }

    /// Number of records currently stored
    pub async fn count(&self) -> usize {
        self.inner.read().await.records.len()
    }
}

impl Default for StudentStore {
    fn default() -> Self {
        Self::new()
    }
}
