use crate::error::{SagipError, SagipResult};
use crate::pest::{ControlMethods, NewPest, Pest, PestUpdate};
use crate::state::AppState;
use crate::upload::{UploadStore, UploadedFile};
use axum::extract::rejection::PathRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

/// Fields of the pest create/edit form as sent by the admin client.
#[derive(Debug, Default)]
pub struct PestForm {
    pub pest_name: Option<String>,
    pub tagalog_name: Option<String>,
    pub identifying_marks: Option<String>,
    pub where_to_find: Option<String>,
    pub damage: Option<String>,
    pub life_cycle: Option<String>,
    pub host: Option<String>,
    pub control_methods: Option<String>,
    pub pest_img: Option<UploadedFile>,
    pub life_cycle_img: Option<UploadedFile>,
}

/// Web paths of the images stored for one request.
#[derive(Debug, Clone, Default)]
pub struct StoredImages {
    pub pest_img: Option<String>,
    pub life_cycle_img: Option<String>,
}

impl StoredImages {
    fn paths(&self) -> Vec<String> {
        self.pest_img
            .iter()
            .chain(self.life_cycle_img.iter())
            .cloned()
            .collect()
    }

    async fn discard(&self, uploads: &UploadStore) {
        for path in self.paths() {
            uploads.discard(&path).await;
        }
    }
}

impl PestForm {
    pub async fn from_multipart(mut multipart: Multipart) -> SagipResult<Self> {
        let mut form = PestForm::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if let Some(file_name) = field.file_name().map(str::to_string) {
                let bytes = field.bytes().await?.to_vec();
                // Empty file input
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                let slot = match name.as_str() {
                    "pestImg" => &mut form.pest_img,
                    "lifeCycleImg" => &mut form.life_cycle_img,
                    other => {
                        tracing::warn!("Ignoring unexpected file field {:?}", other);
                        continue;
                    }
                };
                if slot.is_some() {
                    tracing::warn!("Ignoring extra file for field {:?}", name);
                    continue;
                }
                *slot = Some(UploadedFile {
                    field_name: name,
                    file_name,
                    bytes,
                });
                continue;
            }

            let value = field.text().await?;
            let slot = match name.as_str() {
                "pestName" => &mut form.pest_name,
                "tagalogName" => &mut form.tagalog_name,
                "identifyingMarks" => &mut form.identifying_marks,
                "whereToFind" => &mut form.where_to_find,
                "damage" => &mut form.damage,
                "lifeCycle" => &mut form.life_cycle,
                "host" => &mut form.host,
                "controlMethods" => &mut form.control_methods,
                other => {
                    tracing::debug!("Ignoring unknown form field {:?}", other);
                    continue;
                }
            };
            *slot = Some(value);
        }

        Ok(form)
    }

    /// Writes any attached images and returns their web paths.
    pub async fn store_images(&self, uploads: &UploadStore) -> SagipResult<StoredImages> {
        let mut stored = StoredImages::default();
        if let Some(file) = &self.pest_img {
            stored.pest_img = Some(uploads.save(file).await?);
        }
        if let Some(file) = &self.life_cycle_img {
            match uploads.save(file).await {
                Ok(path) => stored.life_cycle_img = Some(path),
                Err(e) => {
                    stored.discard(uploads).await;
                    return Err(e);
                }
            }
        }
        Ok(stored)
    }

    pub fn into_new_pest(self, images: StoredImages) -> SagipResult<NewPest> {
        let pest_name = required_name(self.pest_name)?;
        Ok(NewPest {
            pest_name,
            tagalog_name: self.tagalog_name,
            pest_img: images.pest_img,
            identifying_marks: self.identifying_marks,
            where_to_find: self.where_to_find,
            damage: self.damage,
            life_cycle: self.life_cycle,
            life_cycle_img: images.life_cycle_img,
            host: self.host,
            control_methods: ControlMethods::parse_lenient(self.control_methods.as_deref()),
        })
    }

    pub fn into_update(self, images: StoredImages) -> SagipResult<PestUpdate> {
        let pest_name = self
            .pest_name
            .map(|name| required_name(Some(name)))
            .transpose()?;
        Ok(PestUpdate {
            pest_name,
            tagalog_name: self.tagalog_name,
            pest_img: images.pest_img,
            identifying_marks: self.identifying_marks,
            where_to_find: self.where_to_find,
            damage: self.damage,
            life_cycle: self.life_cycle,
            life_cycle_img: images.life_cycle_img,
            host: self.host,
            control_methods: ControlMethods::parse_lenient(self.control_methods.as_deref()),
        })
    }

    /// Name checks run before any file is written.
    fn validate(&self, creating: bool) -> SagipResult<()> {
        match &self.pest_name {
            Some(name) if name.trim().is_empty() => Err(name_required()),
            None if creating => Err(name_required()),
            _ => Ok(()),
        }
    }
}

fn name_required() -> SagipError {
    SagipError::Validation("pestName is required".to_string())
}

fn required_name(name: Option<String>) -> SagipResult<String> {
    match name {
        Some(name) if !name.trim().is_empty() => Ok(name),
        _ => Err(name_required()),
    }
}

pub async fn list_pests(State(state): State<AppState>) -> SagipResult<Json<Vec<Pest>>> {
    let pests = state.pests.list_pests().await?;
    tracing::info!("Fetched {} pests", pests.len());
    Ok(Json(pests))
}

pub async fn list_hosts(State(state): State<AppState>) -> SagipResult<Json<Vec<String>>> {
    let hosts = state.pests.distinct_hosts().await?;
    Ok(Json(hosts))
}

pub async fn create_pest(
    State(state): State<AppState>,
    multipart: Multipart,
) -> SagipResult<(StatusCode, Json<Value>)> {
    let form = PestForm::from_multipart(multipart).await?;
    form.validate(true)?;

    let images = form.store_images(&state.uploads).await?;
    let written = images.clone();
    let saved = async {
        let pest = form.into_new_pest(images)?;
        let method_count = pest.control_methods.len();
        let id = state.pests.create_pest(pest).await?;
        Ok::<_, SagipError>((id, method_count))
    }
    .await;
    let (id, method_count) = match saved {
        Ok(saved) => saved,
        Err(e) => {
            written.discard(&state.uploads).await;
            return Err(e);
        }
    };

    tracing::info!(id, method_count, "Pest created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Pest added successfully", "id": id })),
    ))
}

pub async fn update_pest(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
    multipart: Multipart,
) -> SagipResult<Json<Value>> {
    let Path(id) = id?;
    let form = PestForm::from_multipart(multipart).await?;
    form.validate(false)?;

    let images = form.store_images(&state.uploads).await?;
    let written = images.clone();
    let saved = async {
        let update = form.into_update(images)?;
        state.pests.update_pest(id, update).await
    }
    .await;
    if let Err(e) = saved {
        // Unknown id or rolled back: nothing references the new files.
        written.discard(&state.uploads).await;
        return Err(e);
    }

    tracing::info!(id, "Pest updated");
    Ok(Json(json!({
        "message": "Pest and control methods updated successfully"
    })))
}

pub async fn delete_pest(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> SagipResult<Json<Value>> {
    let Path(id) = id?;
    if !state.pests.delete_pest(id).await? {
        return Err(SagipError::NotFound("Pest not found".to_string()));
    }

    tracing::info!(id, "Pest deleted");
    Ok(Json(json!({ "message": "Pest deleted successfully" })))
}
