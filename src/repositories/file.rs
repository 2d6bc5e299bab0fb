use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use super::{ExamStore, StoreError};
use crate::schemas::exam::{Exam, ExamPatch, ExamSummary, NewExam};
use crate::schemas::result::{ResultSet, Submission};
use crate::services::pins;

const EXAMS_DIR: &str = "exams";
const RESULTS_DIR: &str = "results";
const EXAM_PREFIX: &str = "exam_";
const RESULTS_PREFIX: &str = "results_";
const MAX_ID_LEN: usize = 64;

/// JSON documents on local disk.
///
/// Every write goes through a temp file and a rename. Writes touching one exam
/// (update, delete, result append) are serialized by a per-exam lock; PIN
/// allocation is serialized by `publish`.
pub(crate) struct FileStore {
    exams_dir: PathBuf,
    results_dir: PathBuf,
    pin_max_attempts: u32,
    generate_pin: fn() -> String,
    pins: RwLock<HashMap<String, String>>,
    publish: Mutex<()>,
    exam_locks: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl FileStore {
    /// Creates the directory layout if needed and rebuilds the PIN index from
    /// the stored exams.
    pub(crate) async fn open(
        data_dir: impl AsRef<Path>,
        pin_max_attempts: u32,
    ) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref();
        let exams_dir = data_dir.join(EXAMS_DIR);
        let results_dir = data_dir.join(RESULTS_DIR);
        tokio::fs::create_dir_all(&exams_dir).await?;
        tokio::fs::create_dir_all(&results_dir).await?;

        let store = Self {
            exams_dir,
            results_dir,
            pin_max_attempts,
            generate_pin: pins::generate_pin,
            pins: RwLock::new(HashMap::new()),
            publish: Mutex::new(()),
            exam_locks: StdMutex::new(HashMap::new()),
        };

        let exams = store.load_all_exams().await?;
        let mut index = HashMap::with_capacity(exams.len());
        for exam in exams {
            if let Some(previous) = index.insert(exam.pin.clone(), exam.id.clone()) {
                tracing::warn!(
                    pin = %exam.pin,
                    exam_id = %exam.id,
                    previous_exam_id = %previous,
                    "Duplicate PIN on disk; the last exam read wins"
                );
            }
        }
        tracing::info!(
            data_dir = %data_dir.display(),
            exams = index.len(),
            "File store opened"
        );
        *store.pins.write().await = index;

        Ok(store)
    }

    #[cfg(test)]
    pub(crate) fn with_pin_generator(mut self, generate: fn() -> String) -> Self {
        self.generate_pin = generate;
        self
    }

    fn exam_path(&self, id: &str) -> Option<PathBuf> {
        is_safe_id(id).then(|| self.exams_dir.join(format!("{EXAM_PREFIX}{id}.json")))
    }

    fn results_path(&self, id: &str) -> Option<PathBuf> {
        is_safe_id(id).then(|| self.results_dir.join(format!("{RESULTS_PREFIX}{id}.json")))
    }

    async fn lock_exam(&self, id: &str) -> ExamLock<'_> {
        let lock = {
            let mut locks = self.exam_locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(id.to_string()).or_default().clone()
        };
        // Built before waiting so a cancelled wait still prunes the entry.
        let mut held = ExamLock { store: self, id: id.to_string(), guard: None };
        held.guard = Some(lock.lock_owned().await);
        held
    }

    async fn load_all_exams(&self) -> Result<Vec<Exam>, StoreError> {
        let mut exams = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.exams_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if !name.starts_with(EXAM_PREFIX) || !name.ends_with(".json") {
                continue;
            }

            match read_json::<Exam>(&entry.path()).await {
                Ok(Some(exam)) => exams.push(exam),
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(error = %err, file = %name, "Skipping unreadable exam document");
                }
            }
        }

        Ok(exams)
    }
}

#[async_trait]
impl ExamStore for FileStore {
    fn backend(&self) -> &'static str {
        "file"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let metadata = tokio::fs::metadata(&self.exams_dir).await?;
        if !metadata.is_dir() {
            return Err(StoreError::Io(std::io::Error::new(
                ErrorKind::NotFound,
                "exams directory is missing",
            )));
        }
        Ok(())
    }

    async fn insert_exam(
        &self,
        id: &str,
        draft: NewExam,
        now: OffsetDateTime,
    ) -> Result<Exam, StoreError> {
        let path = self.exam_path(id).ok_or_else(|| {
            StoreError::Io(std::io::Error::new(ErrorKind::InvalidInput, "invalid exam id"))
        })?;

        let _publish = self.publish.lock().await;
        let pin = {
            let index = self.pins.read().await;
            pins::allocate_pin(self.pin_max_attempts, self.generate_pin, |pin| {
                index.contains_key(pin)
            })
        }
        .ok_or(StoreError::PinSpaceExhausted(self.pin_max_attempts))?;

        let exam = Exam::from_new(id.to_string(), pin, draft, now);
        write_json_atomic(&path, &exam).await?;
        self.pins.write().await.insert(exam.pin.clone(), exam.id.clone());

        Ok(exam)
    }

    async fn list_exams(&self) -> Result<Vec<ExamSummary>, StoreError> {
        let mut summaries: Vec<ExamSummary> =
            self.load_all_exams().await?.iter().map(Exam::summary).collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    async fn find_exam(&self, id: &str) -> Result<Option<Exam>, StoreError> {
        let Some(path) = self.exam_path(id) else {
            return Ok(None);
        };
        read_json(&path).await
    }

    async fn find_exam_by_pin(&self, pin: &str) -> Result<Option<Exam>, StoreError> {
        let exam_id = self.pins.read().await.get(pin).cloned();
        let Some(exam_id) = exam_id else {
            return Ok(None);
        };

        // The index can briefly point at an exam that is being deleted.
        Ok(self.find_exam(&exam_id).await?.filter(|exam| exam.pin == pin))
    }

    async fn update_exam(
        &self,
        id: &str,
        patch: ExamPatch,
        now: OffsetDateTime,
    ) -> Result<Option<Exam>, StoreError> {
        let Some(path) = self.exam_path(id) else {
            return Ok(None);
        };

        let _guard = self.lock_exam(id).await;
        let Some(mut exam) = read_json::<Exam>(&path).await? else {
            return Ok(None);
        };

        exam.apply(patch, now);
        write_json_atomic(&path, &exam).await?;
        Ok(Some(exam))
    }

    async fn delete_exam(&self, id: &str) -> Result<bool, StoreError> {
        let (Some(exam_path), Some(results_path)) = (self.exam_path(id), self.results_path(id))
        else {
            return Ok(false);
        };

        let _guard = self.lock_exam(id).await;
        let Some(exam) = read_json::<Exam>(&exam_path).await? else {
            return Ok(false);
        };

        tokio::fs::remove_file(&exam_path).await?;
        remove_if_exists(&results_path).await?;

        {
            let mut index = self.pins.write().await;
            if index.get(&exam.pin).is_some_and(|owner| owner == id) {
                index.remove(&exam.pin);
            }
        }

        Ok(true)
    }

    async fn append_result(&self, exam_id: &str, item: Submission) -> Result<bool, StoreError> {
        let (Some(exam_path), Some(results_path)) =
            (self.exam_path(exam_id), self.results_path(exam_id))
        else {
            return Ok(false);
        };

        let _guard = self.lock_exam(exam_id).await;
        if !tokio::fs::try_exists(&exam_path).await? {
            return Ok(false);
        }

        let mut results = read_json::<ResultSet>(&results_path)
            .await?
            .unwrap_or_else(|| ResultSet { exam_id: exam_id.to_string(), items: Vec::new() });
        results.items.push(item);
        write_json_atomic(&results_path, &results).await?;

        Ok(true)
    }

    async fn list_results(&self, exam_id: &str) -> Result<Vec<Submission>, StoreError> {
        let Some(path) = self.results_path(exam_id) else {
            return Ok(Vec::new());
        };
        Ok(read_json::<ResultSet>(&path).await?.map(|set| set.items).unwrap_or_default())
    }
}

/// Held while one exam's documents are read and rewritten. Dropping it also
/// drops the table entry unless another task holds or waits on the same lock.
struct ExamLock<'a> {
    store: &'a FileStore,
    id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ExamLock<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.store.exam_locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks.get(&self.id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&self.id);
        }
    }
}

/// Ids end up in file names, so only plain identifier characters are allowed.
fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ID_LEN
        && id.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, bytes).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}

async fn remove_if_exists(path: &Path) -> Result<(), StoreError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}
