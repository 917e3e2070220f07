//! Form submission: gating, multipart serialization and response mapping.
use reqwest::Method;
use thiserror::Error;

use crate::api::{ApiError, ApiResult, Backend, MultipartPayload, SubmitRequest};
use crate::domain::{FileName, PetId, PhotoId, ReportId, SelectedFile};
use crate::dto::{ApiResponse, ResponseStatus};
use crate::forms::health::{self, HealthRecord};
use crate::forms::pet::{self, PetDetails};
use crate::forms::report::{self, ReportDetails};
use crate::forms::user::{self, UserProfile};
use crate::forms::{FieldError, FieldSet, FieldState};
use crate::services::uploads::{AddFilesReport, UploadLimits, UploadSession};
use crate::services::{ServiceError, ServiceResult};

/// Multipart field listing stored photos removed during an edit.
pub const DELETED_PHOTOS_FIELD: &str = "deletedPhotoIds";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit,
}

/// Where a form is sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub method: Method,
    pub path: String,
}

impl Endpoint {
    fn post(path: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
        }
    }

    fn patch(path: impl Into<String>) -> Self {
        Self {
            method: Method::PATCH,
            path: path.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FormSubmissionState {
    pub is_uploading: bool,
    pub is_dirty: bool,
}

/// Record that owns the stored photos of an edit form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhotoOwner {
    Pet(PetId),
    Report(ReportId),
}

/// Clears the in-flight flag when the request future is dropped mid-request.
struct InFlightGuard<'a>(&'a mut FormSubmissionState);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.is_uploading = false;
    }
}

/// Why a submission did not produce a confirmation. Display strings are shown to the user.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Отправка уже выполняется")]
    InFlight,
    #[error("Пожалуйста, заполните все поля корректно")]
    Invalid(Vec<(&'static str, String)>),
    #[error("Пожалуйста, добавьте хотя бы одну фотографию")]
    NoPhotos,
    #[error("Пожалуйста, заполните все поля корректно или внесите изменения")]
    NoChanges,
    #[error("Произошла ошибка: {0}")]
    Server(String),
    #[error("Ошибка при отправке данных на сервер")]
    UnexpectedResponse,
    #[error("Сетевая ошибка: {0}")]
    Network(#[source] ApiError),
}

/// Successful submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Confirmation {
    pub message: String,
    pub redirect_url: Option<String>,
}

/// Drives one form instance from first keystroke to backend confirmation.
#[derive(Debug)]
pub struct FormController {
    mode: FormMode,
    endpoint: Endpoint,
    fields: FieldSet,
    uploads: Option<UploadSession>,
    owner: Option<PhotoOwner>,
    success_message: &'static str,
    state: FormSubmissionState,
}

impl FormController {
    fn build(
        mode: FormMode,
        endpoint: Endpoint,
        fields: FieldSet,
        uploads: Option<UploadSession>,
        owner: Option<PhotoOwner>,
        success_message: &'static str,
    ) -> Self {
        Self {
            mode,
            endpoint,
            fields,
            uploads,
            owner,
            success_message,
            state: FormSubmissionState::default(),
        }
    }

    /// "Add pet" page.
    pub fn create_pet(limits: UploadLimits) -> Self {
        Self::build(
            FormMode::Create,
            Endpoint::post("/pets/create_with_photos"),
            pet::create_fields(),
            Some(UploadSession::new(limits)),
            None,
            "Питомец добавлен!",
        )
    }

    /// "Edit pet" page with its stored photos.
    pub fn edit_pet(
        id: PetId,
        details: &PetDetails,
        photos: Vec<PhotoId>,
        limits: UploadLimits,
    ) -> Result<Self, FieldError> {
        Ok(Self::build(
            FormMode::Edit,
            Endpoint::patch(format!("/pets/update_pet_info/{id}")),
            pet::edit_fields(details)?,
            Some(UploadSession::with_existing(limits, photos)),
            Some(PhotoOwner::Pet(id)),
            "Информация о питомце успешно обновлена!",
        ))
    }

    /// "Create report" page.
    pub fn create_report(limits: UploadLimits) -> Self {
        Self::build(
            FormMode::Create,
            Endpoint::post("/reports/create_with_photos"),
            report::create_fields(),
            Some(UploadSession::new(limits)),
            None,
            "Объявление добавлено!",
        )
    }

    /// "Edit report" page with its stored photos.
    pub fn edit_report(
        id: ReportId,
        details: &ReportDetails,
        photos: Vec<PhotoId>,
        limits: UploadLimits,
    ) -> Result<Self, FieldError> {
        Ok(Self::build(
            FormMode::Edit,
            Endpoint::patch(format!("/reports/update_report_info/{id}")),
            report::edit_fields(details)?,
            Some(UploadSession::with_existing(limits, photos)),
            Some(PhotoOwner::Report(id)),
            "Объявление успешно обновлено!",
        ))
    }

    /// Profile page. Takes no photos.
    pub fn edit_profile(profile: &UserProfile) -> Result<Self, FieldError> {
        Ok(Self::build(
            FormMode::Edit,
            Endpoint::patch("/users/update"),
            user::profile_fields(profile)?,
            None,
            None,
            "Данные успешно сохранены!",
        ))
    }

    /// Pet health page. Takes no photos.
    pub fn edit_health(id: PetId, record: &HealthRecord) -> Result<Self, FieldError> {
        Ok(Self::build(
            FormMode::Edit,
            Endpoint::patch(format!("/health/update_pet_health/{id}")),
            health::health_fields(record)?,
            None,
            None,
            "Данные о здоровье питомца обновлены!",
        ))
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn uploads(&self) -> Option<&UploadSession> {
        self.uploads.as_ref()
    }

    pub fn state(&self) -> FormSubmissionState {
        self.state
    }

    pub fn input(
        &mut self,
        key: &str,
        value: impl Into<String>,
    ) -> Result<&FieldState, FieldError> {
        self.state.is_dirty = true;
        self.fields.input(key, value)
    }

    pub fn blur(&mut self, key: &str) -> Result<&FieldState, FieldError> {
        self.state.is_dirty = true;
        self.fields.blur(key)
    }

    /// Pick the pet a report is about.
    pub fn select_pet(&mut self, pet: PetId) -> Result<(), FieldError> {
        self.state.is_dirty = true;
        report::select_pet(&mut self.fields, pet)
    }

    fn uploads_mut(&mut self) -> ServiceResult<&mut UploadSession> {
        self.uploads.as_mut().ok_or(ServiceError::UploadsDisabled)
    }

    pub async fn add_files(&mut self, files: Vec<SelectedFile>) -> ServiceResult<AddFilesReport> {
        let report = self.uploads_mut()?.add_files(files).await;
        self.state.is_dirty = true;
        Ok(report)
    }

    /// Queue a selection event for debounced processing.
    pub fn select_files(&mut self, files: Vec<SelectedFile>) -> ServiceResult<()> {
        self.uploads_mut()?.select(files);
        Ok(())
    }

    /// Process queued selections once the debounce window has passed.
    pub async fn settle(&mut self) -> ServiceResult<Option<AddFilesReport>> {
        let report = self.uploads_mut()?.settle().await;
        if report.is_some() {
            self.state.is_dirty = true;
        }
        Ok(report)
    }

    pub fn remove_file(&mut self, name: &FileName, size: u64) -> bool {
        let removed = self
            .uploads
            .as_mut()
            .is_some_and(|uploads| uploads.remove_file(name, size));
        if removed {
            self.state.is_dirty = true;
        }
        removed
    }

    /// Delete a stored photo on the backend, then drop it from the form.
    pub async fn delete_existing_photo<B: Backend>(
        &mut self,
        backend: &B,
        photo: PhotoId,
    ) -> ServiceResult<()> {
        let owner = self.owner.ok_or(ServiceError::NoPhotoOwner)?;
        if !self.uploads_mut()?.existing().contains(&photo) {
            return Err(ServiceError::UnknownPhoto(photo));
        }

        let reply = match owner {
            PhotoOwner::Pet(pet) => backend.delete_pet_photo(photo, pet).await?,
            PhotoOwner::Report(report) => backend.delete_report_photo(photo, report).await?,
        };
        match reply.status {
            Some(ResponseStatus::Success) => {
                self.uploads_mut()?.mark_existing_deleted(photo);
                self.state.is_dirty = true;
                log::info!("photo {photo} deleted");
                Ok(())
            }
            _ => {
                let message = reply
                    .message
                    .unwrap_or_else(|| "Произошла ошибка при удалении фото".to_string());
                log::warn!("photo {photo} was not deleted: {message}");
                Err(ServiceError::Server(message))
            }
        }
    }

    fn has_changes(&self) -> bool {
        self.fields.has_changes()
            || self
                .uploads
                .as_ref()
                .is_some_and(UploadSession::has_photo_changes)
    }

    fn missing_photos(&self) -> bool {
        self.mode == FormMode::Create
            && self
                .uploads
                .as_ref()
                .is_some_and(|uploads| !uploads.has_new_files())
    }

    /// Whether the submit button is enabled.
    pub fn can_submit(&self) -> bool {
        if self.state.is_uploading || !self.fields.is_valid() || self.missing_photos() {
            return false;
        }
        match self.mode {
            FormMode::Create => true,
            FormMode::Edit => self.has_changes(),
        }
    }

    /// Check the form and build the request. On success the form is in flight
    /// until [`FormController::complete`] is called.
    pub fn prepare(&mut self) -> Result<SubmitRequest, SubmitError> {
        if self.state.is_uploading {
            return Err(SubmitError::InFlight);
        }

        let errors = self.fields.force_validate();
        if !errors.is_empty() {
            return Err(SubmitError::Invalid(errors));
        }
        if self.missing_photos() {
            return Err(SubmitError::NoPhotos);
        }
        if self.mode == FormMode::Edit && !self.has_changes() {
            return Err(SubmitError::NoChanges);
        }

        let mut payload = MultipartPayload {
            texts: self.fields.text_parts(),
            files: Vec::new(),
        };
        if let Some(uploads) = &self.uploads {
            payload.files = uploads.payload_files();
            if self.mode == FormMode::Edit && !uploads.deleted().is_empty() {
                let ids: Vec<i64> = uploads.deleted().iter().map(PhotoId::value).collect();
                payload.texts.push((
                    DELETED_PHOTOS_FIELD.to_string(),
                    serde_json::Value::from(ids).to_string(),
                ));
            }
        }

        self.state.is_uploading = true;
        Ok(SubmitRequest {
            method: self.endpoint.method.clone(),
            path: self.endpoint.path.clone(),
            payload,
        })
    }

    /// Map the backend reply and leave the in-flight state.
    pub fn complete(
        &mut self,
        result: ApiResult<ApiResponse>,
    ) -> Result<Confirmation, SubmitError> {
        self.state.is_uploading = false;

        let reply = result.map_err(|err| {
            log::error!("{} {} failed: {err}", self.endpoint.method, self.endpoint.path);
            SubmitError::Network(err)
        })?;

        match reply.status {
            Some(ResponseStatus::Success) => {
                if self.mode == FormMode::Edit {
                    self.fields.commit();
                    if let Some(uploads) = self.uploads.as_mut() {
                        uploads.clear_pending();
                    }
                }
                self.state.is_dirty = false;
                log::info!("{} {} succeeded", self.endpoint.method, self.endpoint.path);
                Ok(Confirmation {
                    message: reply
                        .message
                        .unwrap_or_else(|| self.success_message.to_string()),
                    redirect_url: reply.redirect_url,
                })
            }
            Some(ResponseStatus::Error) => {
                let message = reply
                    .message
                    .unwrap_or_else(|| "Неизвестная ошибка".to_string());
                log::warn!("server rejected {}: {message}", self.endpoint.path);
                Err(SubmitError::Server(message))
            }
            None => {
                log::warn!("unexpected response from {}", self.endpoint.path);
                Err(SubmitError::UnexpectedResponse)
            }
        }
    }

    /// Validate, send exactly one request and interpret the reply.
    pub async fn submit<B: Backend>(&mut self, backend: &B) -> Result<Confirmation, SubmitError> {
        let request = self.prepare()?;
        let result = {
            let _in_flight = InFlightGuard(&mut self.state);
            backend.send(request).await
        };
        self.complete(result)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::domain::ContentType;
    use crate::imaging::test_images;

    #[derive(Default)]
    struct FakeBackend {
        calls: AtomicUsize,
        requests: Mutex<Vec<SubmitRequest>>,
        deletes: Mutex<Vec<String>>,
        reply: ApiResponse,
        fail_status: Option<u16>,
        hang: bool,
    }

    impl FakeBackend {
        fn replying(reply: ApiResponse) -> Self {
            Self {
                reply,
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn last_request(&self) -> SubmitRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }

        fn respond(&self) -> ApiResult<ApiResponse> {
            match self.fail_status {
                Some(code) => Err(ApiError::Status(code)),
                None => Ok(self.reply.clone()),
            }
        }
    }

    impl Backend for FakeBackend {
        async fn send(&self, request: SubmitRequest) -> ApiResult<ApiResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request);
            if self.hang {
                std::future::pending::<()>().await;
            }
            self.respond()
        }

        async fn delete(&self, path: String) -> ApiResult<ApiResponse> {
            self.deletes.lock().unwrap().push(path);
            self.respond()
        }
    }

    fn photo(name: &str) -> SelectedFile {
        SelectedFile::new(
            FileName::try_from_str(name).unwrap(),
            ContentType::new("image/png"),
            test_images::png(64, 48),
        )
    }

    fn fill_pet(form: &mut FormController) {
        form.input(pet::NAME, "Рекс").unwrap();
        form.input(pet::BREED, "Овчарка").unwrap();
        form.input(pet::AGE, "3").unwrap();
        form.input(pet::COLOR, "Чёрный").unwrap();
        form.input(pet::DESCRIPTION, "Очень добрый и умный пёс").unwrap();
    }

    fn stored_pet() -> PetDetails {
        PetDetails {
            name: "Барсик".into(),
            breed: "Дворняга".into(),
            age: "4".into(),
            color: "Рыжий".into(),
            description: "Ласковый и очень любопытный кот".into(),
        }
    }

    #[tokio::test]
    async fn invalid_form_makes_no_request() {
        let backend = FakeBackend::replying(ApiResponse::success());
        let mut form = FormController::create_pet(UploadLimits::default());

        let err = form.submit(&backend).await.unwrap_err();

        match err {
            SubmitError::Invalid(errors) => assert_eq!(errors.len(), 5),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(backend.calls(), 0);
        assert_eq!(
            form.fields().state(pet::NAME).unwrap().error_message,
            "Это поле обязательно"
        );
        assert!(!form.state().is_uploading);
    }

    #[tokio::test]
    async fn create_without_photos_is_blocked() {
        let backend = FakeBackend::replying(ApiResponse::success());
        let mut form = FormController::create_pet(UploadLimits::default());
        fill_pet(&mut form);
        assert!(!form.can_submit());

        let err = form.submit(&backend).await.unwrap_err();

        assert!(matches!(err, SubmitError::NoPhotos));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn create_pet_sends_one_multipart_request() {
        let backend =
            FakeBackend::replying(ApiResponse::success().with_redirect("/pets/profile/5"));
        let mut form = FormController::create_pet(UploadLimits::default());
        fill_pet(&mut form);
        form.add_files(vec![photo("rex.png")]).await.unwrap();
        assert!(form.can_submit());

        let confirmation = form.submit(&backend).await.unwrap();

        assert_eq!(backend.calls(), 1);
        assert_eq!(confirmation.message, "Питомец добавлен!");
        assert_eq!(confirmation.redirect_url.as_deref(), Some("/pets/profile/5"));

        let request = backend.last_request();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/pets/create_with_photos");
        assert_eq!(request.payload.text("pet_age"), Some("3"));
        assert_eq!(request.payload.text("pet_name"), Some("Рекс"));
        assert_eq!(request.payload.text(DELETED_PHOTOS_FIELD), None);
        assert_eq!(request.payload.files.len(), 1);
        assert_eq!(request.payload.files[0].field, "photos");
        assert_eq!(request.payload.files[0].content_type, "image/jpeg");
        assert!(!form.state().is_uploading);
        assert!(!form.state().is_dirty);
    }

    #[tokio::test]
    async fn server_error_message_is_surfaced() {
        let backend = FakeBackend::replying(ApiResponse::error("Слишком много фото"));
        let mut form = FormController::create_pet(UploadLimits::default());
        fill_pet(&mut form);
        form.add_files(vec![photo("rex.png")]).await.unwrap();

        let err = form.submit(&backend).await.unwrap_err();

        assert!(matches!(&err, SubmitError::Server(msg) if msg == "Слишком много фото"));
        assert_eq!(err.to_string(), "Произошла ошибка: Слишком много фото");
        assert!(!form.state().is_uploading);
        assert!(form.can_submit());
    }

    #[tokio::test]
    async fn malformed_and_failed_responses_clear_in_flight() {
        let mut form = FormController::create_pet(UploadLimits::default());
        fill_pet(&mut form);
        form.add_files(vec![photo("rex.png")]).await.unwrap();

        let backend = FakeBackend::replying(ApiResponse::default());
        let err = form.submit(&backend).await.unwrap_err();
        assert!(matches!(err, SubmitError::UnexpectedResponse));
        assert!(!form.state().is_uploading);

        let backend = FakeBackend {
            fail_status: Some(502),
            ..FakeBackend::default()
        };
        let err = form.submit(&backend).await.unwrap_err();
        assert!(matches!(err, SubmitError::Network(ApiError::Status(502))));
        assert!(!form.state().is_uploading);
    }

    #[tokio::test]
    async fn second_submit_while_in_flight_is_rejected() {
        let backend = FakeBackend::replying(ApiResponse::success());
        let mut form = FormController::create_pet(UploadLimits::default());
        fill_pet(&mut form);
        form.add_files(vec![photo("rex.png")]).await.unwrap();

        let request = form.prepare().unwrap();
        assert!(form.state().is_uploading);
        assert!(!form.can_submit());

        let err = form.submit(&backend).await.unwrap_err();
        assert!(matches!(err, SubmitError::InFlight));
        assert_eq!(backend.calls(), 0);

        let result = backend.send(request).await;
        form.complete(result).unwrap();
        assert_eq!(backend.calls(), 1);
        assert!(!form.state().is_uploading);
    }

    #[tokio::test]
    async fn edit_submits_only_after_a_change() {
        let backend = FakeBackend::replying(ApiResponse::success());
        let mut form = FormController::edit_pet(
            PetId::new(7),
            &stored_pet(),
            vec![],
            UploadLimits::default(),
        )
        .unwrap();
        assert!(!form.can_submit());

        let err = form.submit(&backend).await.unwrap_err();
        assert!(matches!(err, SubmitError::NoChanges));
        assert_eq!(backend.calls(), 0);

        form.input(pet::AGE, "5").unwrap();
        assert!(form.can_submit());
        let confirmation = form.submit(&backend).await.unwrap();

        assert_eq!(backend.calls(), 1);
        assert_eq!(confirmation.message, "Информация о питомце успешно обновлена!");
        let request = backend.last_request();
        assert_eq!(request.method, Method::PATCH);
        assert_eq!(request.path, "/pets/update_pet_info/7");
        assert_eq!(request.payload.text("age"), Some("5"));
        assert!(request.payload.files.is_empty());

        assert!(!form.can_submit());
        assert!(matches!(
            form.submit(&backend).await.unwrap_err(),
            SubmitError::NoChanges
        ));
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn deleted_photo_counts_as_change() {
        let backend = FakeBackend::replying(ApiResponse::success());
        let mut form = FormController::edit_report(
            ReportId::new(3),
            &ReportDetails {
                title: "Нашлась кошка".into(),
                content: "Серая кошка сидит у подъезда".into(),
            },
            vec![PhotoId::new(10), PhotoId::new(11)],
            UploadLimits::default(),
        )
        .unwrap();

        form.delete_existing_photo(&backend, PhotoId::new(11))
            .await
            .unwrap();
        assert_eq!(
            backend.deletes.lock().unwrap().as_slice(),
            ["/reports/photo_delete/11?report_id=3".to_string()]
        );
        assert!(matches!(
            form.delete_existing_photo(&backend, PhotoId::new(11)).await,
            Err(ServiceError::UnknownPhoto(_))
        ));

        form.submit(&backend).await.unwrap();
        let request = backend.last_request();
        assert_eq!(request.path, "/reports/update_report_info/3");
        assert_eq!(request.payload.text(DELETED_PHOTOS_FIELD), Some("[11]"));
        assert!(form.uploads().unwrap().deleted().is_empty());
    }

    #[tokio::test]
    async fn failed_photo_delete_keeps_photo() {
        let backend = FakeBackend::replying(ApiResponse::error("Фото не найдено"));
        let mut form = FormController::edit_pet(
            PetId::new(2),
            &stored_pet(),
            vec![PhotoId::new(9)],
            UploadLimits::default(),
        )
        .unwrap();

        let err = form
            .delete_existing_photo(&backend, PhotoId::new(9))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Server(msg) if msg == "Фото не найдено"));
        assert_eq!(form.uploads().unwrap().existing(), &[PhotoId::new(9)]);
        assert!(!form.can_submit());
    }

    #[tokio::test]
    async fn create_forms_cannot_delete_stored_photos() {
        let backend = FakeBackend::replying(ApiResponse::success());
        let mut form = FormController::create_report(UploadLimits::default());

        assert!(matches!(
            form.delete_existing_photo(&backend, PhotoId::new(1)).await,
            Err(ServiceError::NoPhotoOwner)
        ));
    }

    #[tokio::test]
    async fn profile_form_has_no_uploads() {
        let backend = FakeBackend::replying(ApiResponse::success());
        let mut form = FormController::edit_profile(&UserProfile {
            first_name: "Иван".into(),
            last_name: "Петров".into(),
            phone: "+79001234567".into(),
        })
        .unwrap();

        assert!(matches!(
            form.add_files(vec![photo("me.png")]).await,
            Err(ServiceError::UploadsDisabled)
        ));

        form.input(user::PHONE, "+79007654321").unwrap();
        let confirmation = form.submit(&backend).await.unwrap();
        assert_eq!(confirmation.message, "Данные успешно сохранены!");
        let request = backend.last_request();
        assert_eq!(request.path, "/users/update");
        assert_eq!(request.payload.text("phone"), Some("+79007654321"));
    }

    #[tokio::test]
    async fn removing_last_photo_disables_create_submit() {
        let mut form = FormController::create_pet(UploadLimits::default());
        fill_pet(&mut form);
        let file = photo("rex.png");
        let (name, size) = (file.name().clone(), file.size());
        form.add_files(vec![file]).await.unwrap();
        assert!(form.can_submit());

        assert!(form.remove_file(&name, size));
        assert!(!form.can_submit());
    }

    #[tokio::test]
    async fn health_form_patches_changed_dates() {
        let backend = FakeBackend::replying(ApiResponse::success());
        let mut form =
            FormController::edit_health(PetId::new(4), &HealthRecord::default()).unwrap();
        assert!(!form.can_submit());
        assert!(form.uploads().is_none());

        form.input(health::NEXT_VACCINATION, "2025-06-01").unwrap();
        let confirmation = form.submit(&backend).await.unwrap();

        assert_eq!(confirmation.message, "Данные о здоровье питомца обновлены!");
        let request = backend.last_request();
        assert_eq!(request.method, Method::PATCH);
        assert_eq!(request.path, "/health/update_pet_health/4");
        assert_eq!(request.payload.text("next_vaccination"), Some("2025-06-01"));
        assert_eq!(request.payload.text("last_vaccination"), Some(""));
        assert!(request.payload.files.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_submit_leaves_form_usable() {
        let backend = FakeBackend {
            hang: true,
            ..FakeBackend::replying(ApiResponse::success())
        };
        let mut form = FormController::edit_profile(&UserProfile {
            first_name: "Иван".into(),
            last_name: "Петров".into(),
            phone: "+79001234567".into(),
        })
        .unwrap();
        form.input(user::FIRST_NAME, "Пётр").unwrap();

        let outcome =
            tokio::time::timeout(std::time::Duration::from_secs(30), form.submit(&backend)).await;

        assert!(outcome.is_err());
        assert_eq!(backend.calls(), 1);
        assert!(!form.state().is_uploading);
        assert!(form.can_submit());
        assert!(form.prepare().is_ok());
    }
}
