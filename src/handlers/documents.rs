use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};

use crate::{
    AppState, access,
    auth::AuthUser,
    error::{ApiError, MessageResponse},
    extractors::{PathId, ValidatedJson},
    models::{
        CreateDocumentRequest, Document, DocumentChanges, DocumentEnvelope, DocumentListResponse,
        DocumentSearchResponse, NewDocument, PageQuery, SearchQuery, UpdateDocumentRequest,
    },
    pagination::PageMeta,
    repository::DocumentFilter,
    search,
};

fn document_not_found() -> ApiError {
    ApiError::NotFound("Sorry, the document does not exist!".to_string())
}

async fn load_document(state: &AppState, id: i32) -> Result<Document, ApiError> {
    state
        .repo
        .find_document(id)
        .await?
        .ok_or_else(document_not_found)
}

fn check_assignable(requester: &AuthUser, access_type: &str) -> Result<(), ApiError> {
    if access::is_assignable_access_type(&requester.role, access_type) {
        Ok(())
    } else {
        Err(ApiError::Validation("Invalid Access Type".to_string()))
    }
}

/// create_document
///
/// [Authenticated Route] Stores a document owned by the requester. `accessType` must be
/// "public", "private", or the requester's own role; titles are unique (409).
#[utoipa::path(
    post,
    path = "/api/v1/documents",
    request_body = CreateDocumentRequest,
    responses(
        (status = 201, description = "Created", body = DocumentEnvelope),
        (status = 400, description = "Invalid input", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = MessageResponse),
        (status = 409, description = "Title taken", body = MessageResponse)
    )
)]
pub async fn create_document(
    requester: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<DocumentEnvelope>), ApiError> {
    check_assignable(&requester, &payload.access_type)?;

    let document = state
        .repo
        .create_document(NewDocument {
            title: payload.title,
            content: payload.content,
            owner: requester.full_name.clone(),
            access_type: payload.access_type,
            user_id: requester.id,
        })
        .await?;

    tracing::info!(user_id = requester.id, document_id = document.id, "document created");

    Ok((
        StatusCode::CREATED,
        Json(DocumentEnvelope {
            message: "Document created successfully".to_string(),
            document,
        }),
    ))
}

/// list_documents
///
/// [Authenticated Route] Paginated documents visible to the requester, newest first.
/// An empty page is still a 200.
#[utoipa::path(
    get,
    path = "/api/v1/documents",
    params(PageQuery),
    responses(
        (status = 200, description = "Documents", body = DocumentListResponse),
        (status = 400, description = "Bad pagination", body = MessageResponse)
    )
)]
pub async fn list_documents(
    requester: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<DocumentListResponse>, ApiError> {
    let page = query.page()?;
    let filter = DocumentFilter::visible(access::Visibility::for_requester(&requester));

    let paged = state.repo.list_documents(&filter, page).await?;
    let meta_data = PageMeta::new(page, paged.items.len(), paged.total);

    Ok(Json(DocumentListResponse {
        documents: paged.items,
        meta_data,
    }))
}

/// get_document
///
/// [Authenticated Route] A single document, subject to the visibility rule.
#[utoipa::path(
    get,
    path = "/api/v1/documents/{id}",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Found", body = DocumentEnvelope),
        (status = 400, description = "Invalid id", body = MessageResponse),
        (status = 403, description = "Not visible to requester", body = MessageResponse),
        (status = 404, description = "Not Found", body = MessageResponse)
    )
)]
pub async fn get_document(
    requester: AuthUser,
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<Json<DocumentEnvelope>, ApiError> {
    let document = load_document(&state, id).await?;
    if !access::can_view_document(&requester, &document) {
        tracing::warn!(user_id = requester.id, document_id = id, "document read denied");
        return Err(ApiError::unauthorized_access());
    }

    Ok(Json(DocumentEnvelope {
        message: "Document found!".to_string(),
        document,
    }))
}

/// update_document
///
/// [Authenticated Route] Partial update, owner only. Keeping the current title is
/// not a conflict; taking another document's title is a 409.
#[utoipa::path(
    put,
    path = "/api/v1/documents/{id}",
    params(("id" = i32, Path, description = "Document ID")),
    request_body = UpdateDocumentRequest,
    responses(
        (status = 200, description = "Updated", body = DocumentEnvelope),
        (status = 400, description = "Invalid input", body = MessageResponse),
        (status = 403, description = "Not the owner", body = MessageResponse),
        (status = 404, description = "Not Found", body = MessageResponse),
        (status = 409, description = "Title taken", body = MessageResponse)
    )
)]
pub async fn update_document(
    requester: AuthUser,
    State(state): State<AppState>,
    PathId(id): PathId,
    ValidatedJson(payload): ValidatedJson<UpdateDocumentRequest>,
) -> Result<Json<DocumentEnvelope>, ApiError> {
    let document = load_document(&state, id).await?;
    if !access::can_update_document(&requester, &document) {
        tracing::warn!(user_id = requester.id, document_id = id, "document update denied");
        return Err(ApiError::unauthorized_access());
    }

    if let Some(access_type) = &payload.access_type {
        check_assignable(&requester, access_type)?;
    }

    let changes = DocumentChanges {
        title: payload.title,
        content: payload.content,
        access_type: payload.access_type,
    };

    let document = state
        .repo
        .update_document(document.id, changes)
        .await?
        .ok_or_else(document_not_found)?;

    Ok(Json(DocumentEnvelope {
        message: "Document Successfully Updated".to_string(),
        document,
    }))
}

/// delete_document
///
/// [Authenticated Route] Owner or admin. Deleting an already-deleted id is a 404.
#[utoipa::path(
    delete,
    path = "/api/v1/documents/{id}",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 400, description = "Invalid id", body = MessageResponse),
        (status = 403, description = "Not owner or admin", body = MessageResponse),
        (status = 404, description = "Not Found", body = MessageResponse)
    )
)]
pub async fn delete_document(
    requester: AuthUser,
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<Json<MessageResponse>, ApiError> {
    let document = load_document(&state, id).await?;
    access::ensure(access::can_delete_document(&requester, &document))?;

    if !state.repo.delete_document(document.id).await? {
        return Err(document_not_found());
    }

    tracing::info!(user_id = requester.id, document_id = id, "document deleted");
    Ok(Json(MessageResponse::new("Document deleted successfully!")))
}

/// search_documents
///
/// [Authenticated Route] Title substring search within the requester's visible set.
#[utoipa::path(
    get,
    path = "/api/v1/search/documents",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matches", body = DocumentSearchResponse),
        (status = 400, description = "Missing keyword", body = MessageResponse),
        (status = 404, description = "No match", body = MessageResponse)
    )
)]
pub async fn search_documents(
    requester: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<DocumentSearchResponse>, ApiError> {
    let term = search::search_term(query.q.as_deref())?;
    let page = query.page()?;

    let filter =
        DocumentFilter::visible(access::Visibility::for_requester(&requester)).title_contains(term);
    let paged = state.repo.list_documents(&filter, page).await?;
    if paged.total == 0 {
        return Err(ApiError::NotFound("No document found!".to_string()));
    }
    let meta_data = PageMeta::new(page, paged.items.len(), paged.total);

    Ok(Json(DocumentSearchResponse {
        message: format!("Number of documents found: {}", paged.total),
        document: paged.items,
        meta_data,
    }))
}
