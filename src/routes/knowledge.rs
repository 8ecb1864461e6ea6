use actix_web::{http::header::CONTENT_TYPE, web, HttpRequest, HttpResponse};
use validator::Validate;
use crate::models::{
    CategoryRequest, CreateEntryRequest, EntryFeedbackRequest, EntryUpdate, NewEntry,
    UpdateEntryRequest, UploadQuery, UploadResponse,
};
use crate::routes::{ApiError, AppState, AuthenticatedUser};

/// Configure category and knowledge entry routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/categories", web::get().to(list_categories))
        .route("/categories", web::post().to(create_category))
        .route("/categories/{id}", web::patch().to(rename_category))
        .route("/categories/{id}", web::delete().to(delete_category))
        .route("/categories/{id}/entries", web::get().to(list_category_entries))
        .route("/categories/{id}/entries", web::post().to(create_entry))
        .route("/entries/{id}", web::get().to(get_entry))
        .route("/entries/{id}", web::patch().to(update_entry))
        .route("/entries/{id}", web::delete().to(delete_entry))
        .route("/entries/{id}/feedback", web::post().to(entry_feedback))
        .route("/entries/{id}/photos", web::post().to(upload_entry_photo));
}

async fn list_categories(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let snapshot = state
        .snapshot()
        .await
        .map_err(|e| ApiError::backend("Failed to load categories", e))?;

    Ok(HttpResponse::Ok().json(&snapshot.categories))
}

async fn list_category_entries(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let category_id = path.into_inner();

    let entries = state
        .backend
        .list_entries_by_category(category_id)
        .await
        .map_err(|e| ApiError::backend("Failed to load entries", e))?;

    Ok(HttpResponse::Ok().json(entries))
}

async fn create_category(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<CategoryRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate().map_err(ApiError::validation)?;

    let category = state
        .backend
        .create_category(req.name.trim())
        .await
        .map_err(|e| ApiError::backend("Failed to create category", e))?;

    state.cache.invalidate().await;
    tracing::info!("{} created category {} ({})", user.0.email, category.id, category.name);

    Ok(HttpResponse::Created().json(category))
}

async fn rename_category(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    req: web::Json<CategoryRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate().map_err(ApiError::validation)?;

    let category = state
        .backend
        .rename_category(path.into_inner(), req.name.trim(), &user.0.email)
        .await
        .map_err(|e| ApiError::backend("Failed to rename category", e))?;

    state.cache.invalidate().await;
    tracing::info!("{} renamed category {} to {}", user.0.email, category.id, category.name);

    Ok(HttpResponse::Ok().json(category))
}

/// Delete a category
///
/// DELETE /api/v1/categories/{id}
///
/// Answers 409 while entries still belong to the category.
async fn delete_category(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    state
        .backend
        .delete_category(id)
        .await
        .map_err(|e| ApiError::backend("Failed to delete category", e))?;

    state.cache.invalidate().await;
    tracing::info!("{} deleted category {}", user.0.email, id);

    Ok(HttpResponse::NoContent().finish())
}

/// Add an entry to a category
///
/// POST /api/v1/categories/{id}/entries
async fn create_entry(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    req: web::Json<CreateEntryRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate().map_err(ApiError::validation)?;

    let category_id = path.into_inner();
    let category = state
        .backend
        .get_category(category_id)
        .await
        .map_err(|e| ApiError::backend("Failed to load category", e))?;

    let req = req.into_inner();
    let entry = NewEntry {
        description: req.description,
        solution: req.solution,
        category_id: category.id,
        created_by: user.0.email.clone(),
        last_edited_by: user.0.email,
    };

    let stored = state
        .backend
        .create_entry(&entry)
        .await
        .map_err(|e| ApiError::backend("Failed to create entry", e))?;

    state.cache.invalidate().await;
    tracing::info!("Created entry {} in category {}", stored.id, category.name);

    Ok(HttpResponse::Created().json(stored))
}

async fn get_entry(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let entry = state
        .backend
        .get_entry(path.into_inner())
        .await
        .map_err(|e| ApiError::backend("Failed to load entry", e))?;

    Ok(HttpResponse::Ok().json(entry))
}

async fn update_entry(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    req: web::Json<UpdateEntryRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate().map_err(ApiError::validation)?;

    let req = req.into_inner();
    if req.description.is_none() && req.solution.is_none() {
        return Err(ApiError::bad_request("Nothing to update"));
    }

    let update = EntryUpdate {
        description: req.description,
        solution: req.solution,
        last_edited_by: Some(user.0.email),
        ..EntryUpdate::default()
    };

    let entry = state
        .backend
        .update_entry(path.into_inner(), &update)
        .await
        .map_err(|e| ApiError::backend("Failed to update entry", e))?;

    state.cache.invalidate().await;

    Ok(HttpResponse::Ok().json(entry))
}

async fn delete_entry(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    state
        .backend
        .delete_entry(id)
        .await
        .map_err(|e| ApiError::backend("Failed to delete entry", e))?;

    state.cache.invalidate().await;
    tracing::info!("{} deleted entry {}", user.0.email, id);

    Ok(HttpResponse::NoContent().finish())
}

/// Helpful / not helpful vote; returns the entry with updated counters
async fn entry_feedback(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    req: web::Json<EntryFeedbackRequest>,
) -> Result<HttpResponse, ApiError> {
    let entry = state
        .backend
        .get_entry(path.into_inner())
        .await
        .map_err(|e| ApiError::backend("Failed to load entry", e))?;

    let updated = state
        .backend
        .record_entry_feedback(&entry, req.helpful)
        .await
        .map_err(|e| ApiError::backend("Failed to store feedback", e))?;

    Ok(HttpResponse::Ok().json(updated))
}

/// Upload a photo for an entry
///
/// POST /api/v1/entries/{id}/photos?filename=screenshot.png
///
/// The request body is the raw file.
async fn upload_entry_photo(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    query: web::Query<UploadQuery>,
    http_req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let entry_id = path.into_inner();
    check_upload(&body, state.options.max_upload_bytes)?;

    // Fails with 404 before anything is written to storage
    state
        .backend
        .get_entry(entry_id)
        .await
        .map_err(|e| ApiError::backend("Failed to load entry", e))?;

    let name = object_name(&entry_id.to_string(), &query.filename);
    let public_url = state
        .backend
        .upload(
            &state.options.entry_photos_bucket,
            &name,
            body.to_vec(),
            content_type(&http_req),
        )
        .await
        .map_err(|e| ApiError::backend("Failed to upload photo", e))?;

    state
        .backend
        .add_entry_photo(entry_id, &public_url)
        .await
        .map_err(|e| ApiError::backend("Failed to attach photo", e))?;

    state.cache.invalidate().await;
    tracing::info!("{} attached photo {} to entry {}", user.0.email, name, entry_id);

    Ok(HttpResponse::Created().json(UploadResponse { public_url }))
}

/// Reject empty and oversized uploads
pub(crate) fn check_upload(body: &[u8], max_bytes: usize) -> Result<(), ApiError> {
    if body.is_empty() {
        return Err(ApiError::bad_request("Upload body is empty"));
    }
    if body.len() > max_bytes {
        return Err(ApiError::new(
            actix_web::http::StatusCode::PAYLOAD_TOO_LARGE,
            "Upload too large",
            format!("{} bytes exceeds the limit of {} bytes", body.len(), max_bytes),
        ));
    }
    Ok(())
}

/// Unique object name that keeps the extension of the uploaded file
pub(crate) fn object_name(prefix: &str, filename: &str) -> String {
    let extension = std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase);

    match extension {
        Some(ext) => format!("{}-{}.{}", prefix, uuid::Uuid::new_v4(), ext),
        None => format!("{}-{}", prefix, uuid::Uuid::new_v4()),
    }
}

pub(crate) fn content_type(req: &HttpRequest) -> &str {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream")
}
