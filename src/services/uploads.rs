//! Upload session: selected files, optimized copies, previews and capacity.
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use thiserror::Error;
use tokio::time::Instant;

use crate::api::FilePart;
use crate::domain::{
    ContentType, FileKey, FileName, OptimizedFile, PhotoId, SelectedFile, UploadedFile,
};
use crate::dto::PreviewDto;
use crate::imaging::{OptimizeError, OptimizeOptions, optimize_async};
use crate::services::queue::SelectionQueue;

/// Maximum number of photos per record, existing ones included.
pub const MAX_PHOTOS: usize = 5;
/// Per-file size ceiling before optimization.
pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;
/// Quiet window for merging rapid selection events.
pub const DEBOUNCE_MS: u64 = 300;
/// Multipart field carrying photos.
pub const PHOTOS_FIELD: &str = "photos";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_photos: usize,
    pub max_file_size: u64,
    pub upload: OptimizeOptions,
    pub preview: OptimizeOptions,
    pub debounce_ms: u64,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_photos: MAX_PHOTOS,
            max_file_size: MAX_FILE_SIZE,
            upload: OptimizeOptions::upload(),
            preview: OptimizeOptions::preview(),
            debounce_ms: DEBOUNCE_MS,
        }
    }
}

/// A selected file that the session refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FileConstraintError {
    #[error("Файл {0} не является изображением.")]
    NotAnImage(FileName),
    #[error("Файл {name} превышает допустимый размер ({limit_mb}MB).")]
    TooLarge { name: FileName, limit_mb: u64 },
    #[error("Вы можете загрузить максимум {max} фотографий.")]
    CapacityExceeded { max: usize, dropped: Vec<FileName> },
}

/// Outcome of one `add_files` batch.
#[derive(Debug, Default)]
pub struct AddFilesReport {
    pub accepted: Vec<FileKey>,
    pub rejected: Vec<FileConstraintError>,
    pub failed: Vec<(FileKey, OptimizeError)>,
}

impl AddFilesReport {
    /// Messages to show the user, in the order they arose.
    pub fn notices(&self) -> Vec<String> {
        self.rejected
            .iter()
            .map(ToString::to_string)
            .chain(
                self.failed
                    .iter()
                    .map(|(key, _)| format!("Не удалось обработать файл {}.", key.name)),
            )
            .collect()
    }
}

/// Render-ready snapshot of the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionView {
    pub count: usize,
    pub capacity: usize,
    pub input_disabled: bool,
    pub previews: Vec<PreviewDto>,
}

/// Files of one form instance, from selection to submission.
#[derive(Debug)]
pub struct UploadSession {
    limits: UploadLimits,
    files: Vec<UploadedFile>,
    optimized: Vec<OptimizedFile>,
    previews: Vec<PreviewDto>,
    existing: Vec<PhotoId>,
    deleted: Vec<PhotoId>,
    queue: SelectionQueue,
}

impl UploadSession {
    pub fn new(limits: UploadLimits) -> Self {
        Self::with_existing(limits, Vec::new())
    }

    /// Session for an edit page that already shows stored photos.
    pub fn with_existing(limits: UploadLimits, existing: Vec<PhotoId>) -> Self {
        Self {
            limits,
            files: Vec::new(),
            optimized: Vec::new(),
            previews: Vec::new(),
            existing,
            deleted: Vec::new(),
            queue: SelectionQueue::new(Duration::from_millis(limits.debounce_ms)),
        }
    }

    pub fn limits(&self) -> &UploadLimits {
        &self.limits
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn optimized(&self) -> &[OptimizedFile] {
        &self.optimized
    }

    pub fn existing(&self) -> &[PhotoId] {
        &self.existing
    }

    pub fn deleted(&self) -> &[PhotoId] {
        &self.deleted
    }

    /// Photos the record will have: kept existing ones plus new uploads.
    pub fn total_count(&self) -> usize {
        self.files.len() + self.existing.len()
    }

    pub fn remaining_slots(&self) -> usize {
        self.limits.max_photos.saturating_sub(self.total_count())
    }

    pub fn contains(&self, key: &FileKey) -> bool {
        self.files.iter().any(|f| &f.key() == key)
    }

    pub fn has_new_files(&self) -> bool {
        !self.files.is_empty()
    }

    pub fn has_photo_changes(&self) -> bool {
        !self.files.is_empty() || !self.deleted.is_empty()
    }

    /// Queue a selection event; files are processed by [`UploadSession::settle`].
    pub fn select(&mut self, files: Vec<SelectedFile>) {
        self.queue.push(files, Instant::now());
    }

    pub fn has_pending_selection(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Wait out the debounce window and process the merged selection.
    pub async fn settle(&mut self) -> Option<AddFilesReport> {
        let batch = self.queue.flush().await?;
        Some(self.add_files(batch).await)
    }

    /// Apply type, duplicate, size and capacity rules, then optimize what was accepted.
    pub async fn add_files(&mut self, selected: Vec<SelectedFile>) -> AddFilesReport {
        let mut report = AddFilesReport::default();
        let mut candidates: Vec<SelectedFile> = Vec::new();

        for file in selected {
            if !file.content_type().is_image() {
                report
                    .rejected
                    .push(FileConstraintError::NotAnImage(file.name().clone()));
                continue;
            }
            let key = file.key();
            if self.contains(&key) || candidates.iter().any(|c| c.key() == key) {
                log::debug!("skipping duplicate {key}");
                continue;
            }
            if file.size() > self.limits.max_file_size {
                report.rejected.push(FileConstraintError::TooLarge {
                    name: file.name().clone(),
                    limit_mb: self.limits.max_file_size / (1024 * 1024),
                });
                continue;
            }
            candidates.push(file);
        }

        let remaining = self.remaining_slots();
        if candidates.len() > remaining {
            let dropped = candidates
                .split_off(remaining)
                .into_iter()
                .map(|f| f.name().clone())
                .collect();
            report.rejected.push(FileConstraintError::CapacityExceeded {
                max: self.limits.max_photos,
                dropped,
            });
        }

        let upload = self.limits.upload;
        let preview = self.limits.preview;
        let mut tasks = FuturesUnordered::new();
        for file in candidates {
            let key = file.key();
            let bytes = file.bytes().clone();
            report.accepted.push(key.clone());
            self.files.push(UploadedFile::from(file));

            tasks.push(async move {
                let (optimized, thumbnail) = tokio::join!(
                    optimize_async(bytes.clone(), upload),
                    optimize_async(bytes, preview)
                );
                (key, optimized, thumbnail)
            });
        }

        while let Some((key, optimized, thumbnail)) = tasks.next().await {
            match optimized {
                Ok(bytes) => self.optimized.push(OptimizedFile {
                    key: key.clone(),
                    bytes,
                }),
                Err(err) => {
                    log::warn!("failed to optimize {key}: {err}");
                    self.files.retain(|f| f.key() != key);
                    report.accepted.retain(|k| k != &key);
                    report.failed.push((key, err));
                    continue;
                }
            }
            match thumbnail {
                Ok(thumb) => self.previews.push(PreviewDto::new(&key, &thumb)),
                Err(err) => log::warn!("failed to build preview for {key}: {err}"),
            }
        }

        log::info!(
            "upload session: {} accepted, {} rejected, {} failed, {} total",
            report.accepted.len(),
            report.rejected.len(),
            report.failed.len(),
            self.total_count()
        );
        report
    }

    /// Drop a new file from uploads, optimized output and previews.
    pub fn remove_file(&mut self, name: &FileName, size: u64) -> bool {
        let key = FileKey::new(name.clone(), size);
        let before = self.files.len();
        self.files.retain(|f| f.key() != key);
        self.optimized.retain(|o| o.key != key);
        self.previews.retain(|p| !p.matches(&key));
        self.files.len() != before
    }

    /// Record that a stored photo was deleted on the backend.
    pub fn mark_existing_deleted(&mut self, photo: PhotoId) -> bool {
        let before = self.existing.len();
        self.existing.retain(|p| *p != photo);
        if self.existing.len() == before {
            return false;
        }
        if !self.deleted.contains(&photo) {
            self.deleted.push(photo);
        }
        true
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            count: self.total_count(),
            capacity: self.limits.max_photos,
            input_disabled: self.total_count() >= self.limits.max_photos,
            previews: self.previews.clone(),
        }
    }

    /// Optimized files as multipart parts, in the order they finished.
    pub fn payload_files(&self) -> Vec<FilePart> {
        self.optimized
            .iter()
            .map(|o| FilePart {
                field: PHOTOS_FIELD.to_string(),
                file_name: o.key.name.as_str().to_string(),
                content_type: ContentType::JPEG.to_string(),
                bytes: o.bytes.clone(),
            })
            .collect()
    }

    /// Forget new files and deletions once the backend has stored them.
    pub fn clear_pending(&mut self) {
        self.files.clear();
        self.optimized.clear();
        self.previews.clear();
        self.deleted.clear();
    }
}
