//! Handlers for the `/block` resource.
//!
//! Block payloads are opaque to the server: text content arrives encrypted
//! and is stored inline; file content arrives encrypted and is stored in
//! the blob store under a server-chosen name. Nothing here inspects bytes.

use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use clipdock_core::error::CoreError;
use clipdock_core::ledger::{check_file_size, Block, BlockDraft, BlockKind};
use clipdock_core::types::BlockId;
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;

use crate::error::{AppError, AppResult};
use crate::response::Ack;
use crate::state::AppState;
use crate::ws::SessionEvent;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateBlockRequest {
    pub session_id: String,
    pub user_id: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteBlockRequest {
    pub session_id: String,
    pub user_id: String,
    pub block_id: BlockId,
}

#[derive(Debug, Serialize)]
pub struct BlockResponse {
    pub block_id: BlockId,
    pub block: Block,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/block/create
///
/// Create a text block carrying an opaque (client-encrypted) payload.
pub async fn create_text_block(
    State(state): State<AppState>,
    Json(input): Json<CreateBlockRequest>,
) -> AppResult<Json<BlockResponse>> {
    let session_id = input.session_id.to_lowercase();
    let handle = state.registry.session(&session_id).await?;

    let block = {
        let mut session = handle.lock().await;
        if !session.is_member(&input.user_id) {
            return Err(AppError::Core(CoreError::Forbidden(
                "User not in session".into(),
            )));
        }

        let draft = BlockDraft::Text {
            content: input.content,
        };
        let block = session
            .ledger
            .append(input.user_id.clone(), draft, state.config.max_upload_bytes)?
            .clone();
        session.touch();
        block
    };

    tracing::info!(session_id = %session_id, block_id = block.id, "Text block created");

    state
        .hub
        .broadcast(
            &session_id,
            &SessionEvent::BlockCreated {
                block: block.clone(),
            },
            Some(&input.user_id),
        )
        .await;

    Ok(Json(BlockResponse {
        block_id: block.id,
        block,
    }))
}

/// POST /api/v1/block/upload
///
/// Upload a file block as a multipart form (`session_id`, `user_id`,
/// `file`). The payload size is checked against the configured limit
/// before a single byte reaches the blob store.
pub async fn upload_file_block(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<BlockResponse>> {
    let mut session_id: Option<String> = None;
    let mut user_id: Option<String> = None;
    let mut file_data: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "session_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                session_id = Some(text.to_lowercase());
            }
            "user_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                user_id = Some(text);
            }
            "file" => {
                let filename = field.file_name().unwrap_or("upload.bin").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                file_data = Some((filename, data.to_vec()));
            }
            _ => {} // ignore unknown fields
        }
    }

    let session_id =
        session_id.ok_or_else(|| AppError::BadRequest("Missing 'session_id' field".into()))?;
    let user_id = user_id.ok_or_else(|| AppError::BadRequest("Missing 'user_id' field".into()))?;
    let (filename, data) =
        file_data.ok_or_else(|| AppError::BadRequest("Missing 'file' field".into()))?;

    // Reject oversized payloads before anything is written.
    check_file_size(data.len() as u64, state.config.max_upload_bytes)?;

    let handle = state.registry.session(&session_id).await?;

    let block = {
        let mut session = handle.lock().await;
        if !session.is_member(&user_id) {
            return Err(AppError::Core(CoreError::Forbidden(
                "User not in session".into(),
            )));
        }

        // The stored name is server-chosen; the original filename only
        // lives in block metadata.
        let ext = std::path::Path::new(&filename)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let stored_name = format!("file_{}{ext}", uuid::Uuid::new_v4());

        state.blobs.save(&session_id, &stored_name, &data).await?;

        let draft = BlockDraft::File {
            filename,
            stored_name,
            size_bytes: data.len() as u64,
        };
        let block = session
            .ledger
            .append(user_id.clone(), draft, state.config.max_upload_bytes)?
            .clone();
        session.touch();
        block
    };

    tracing::info!(
        session_id = %session_id,
        block_id = block.id,
        size_bytes = block.size_bytes.unwrap_or(0),
        "File block uploaded"
    );

    state
        .hub
        .broadcast(
            &session_id,
            &SessionEvent::BlockCreated {
                block: block.clone(),
            },
            Some(&user_id),
        )
        .await;

    Ok(Json(BlockResponse {
        block_id: block.id,
        block,
    }))
}

/// DELETE /api/v1/block/delete
///
/// Delete a block. `block_deleted` is delivered to every connected member,
/// the actor included, so all replicas converge.
pub async fn delete_block(
    State(state): State<AppState>,
    Json(input): Json<DeleteBlockRequest>,
) -> AppResult<Json<Ack>> {
    let session_id = input.session_id.to_lowercase();
    let handle = state.registry.session(&session_id).await?;

    let removed = {
        let mut session = handle.lock().await;
        if !session.is_member(&input.user_id) {
            return Err(AppError::Core(CoreError::Forbidden(
                "User not in session".into(),
            )));
        }
        let removed = session.ledger.remove(input.block_id)?;
        session.touch();
        removed
    };

    if let Some(stored_name) = &removed.stored_name {
        // The block is already gone from the ledger; a failed file removal
        // is only a leaked blob until the session is reclaimed.
        if let Err(e) = state.blobs.delete(&session_id, stored_name).await {
            tracing::warn!(session_id = %session_id, error = %e, "Blob removal failed");
        }
    }

    tracing::info!(session_id = %session_id, block_id = input.block_id, "Block deleted");

    state
        .hub
        .broadcast(
            &session_id,
            &SessionEvent::BlockDeleted {
                block_id: input.block_id,
            },
            None,
        )
        .await;

    Ok(Json(Ack::ok()))
}

/// GET /api/v1/block/download/{session_id}/{block_id}
///
/// Download a block's opaque payload. Text blocks are served from memory,
/// file blocks are streamed from the blob store. Decryption is the
/// client's business.
pub async fn download_block(
    State(state): State<AppState>,
    Path((session_id, block_id)): Path<(String, BlockId)>,
) -> AppResult<Response> {
    let session_id = session_id.to_lowercase();
    let handle = state.registry.session(&session_id).await?;

    let block = {
        let session = handle.lock().await;
        session
            .ledger
            .get(block_id)
            .cloned()
            .ok_or(CoreError::NotFound {
                entity: "Block",
                id: block_id.to_string(),
            })?
    };

    match block.kind {
        BlockKind::Text => {
            let content = block.content.unwrap_or_default();
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "application/octet-stream")
                .header(
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"text_{block_id}.txt\""),
                )
                .body(Body::from(content))
                .map_err(|e| AppError::Internal(e.to_string()))
        }
        BlockKind::File => {
            let stored_name = block
                .stored_name
                .as_deref()
                .ok_or_else(|| AppError::Internal("File block without blob handle".into()))?;
            let path = state.blobs.blob_path(&session_id, stored_name);

            let file = match tokio::fs::File::open(&path).await {
                Ok(file) => file,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(AppError::Core(CoreError::NotFound {
                        entity: "Blob",
                        id: block_id.to_string(),
                    }));
                }
                Err(e) => return Err(AppError::Internal(e.to_string())),
            };

            let filename = block.filename.as_deref().unwrap_or("download.bin");
            let mut builder = Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "application/octet-stream")
                .header(
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{filename}\""),
                );
            if let Some(size) = block.size_bytes {
                builder = builder.header(header::CONTENT_LENGTH, size.to_string());
            }

            builder
                .body(Body::from_stream(ReaderStream::new(file)))
                .map_err(|e| AppError::Internal(e.to_string()))
        }
    }
}
