//! Per-session ordered collection of content blocks.
//!
//! Blocks are append-only with strictly increasing IDs; deletion leaves a
//! gap and the ID is never reused. Content is opaque to this layer -- text
//! payloads are carried inline, file payloads live in the blob store and
//! the ledger holds only the handle plus metadata.

use chrono::Utc;
use serde::Serialize;

use crate::error::CoreError;
use crate::types::{BlockId, Timestamp, UserId};

/// Block kind discriminator, `"text"` or `"file"` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Text,
    File,
}

/// One unit of shared content.
#[derive(Debug, Clone, Serialize)]
pub struct Block {
    pub id: BlockId,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    /// Inline opaque payload (text blocks only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Original filename as uploaded (file blocks only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Payload size in bytes (file blocks only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    /// Blob-store handle within the session directory. Server-side only.
    #[serde(skip)]
    pub stored_name: Option<String>,
    pub created_by: UserId,
    pub created_at: Timestamp,
}

/// Payload for a block about to be appended.
#[derive(Debug)]
pub enum BlockDraft {
    Text {
        content: String,
    },
    File {
        filename: String,
        stored_name: String,
        size_bytes: u64,
    },
}

/// Reject file payloads over the configured limit.
///
/// Callers check this before committing any bytes to the blob store so an
/// oversized upload never leaves a partial write behind.
pub fn check_file_size(size: u64, limit: u64) -> Result<(), CoreError> {
    if size > limit {
        Err(CoreError::PayloadTooLarge { size, limit })
    } else {
        Ok(())
    }
}

/// Ordered, append-only block collection with a monotonic ID counter.
#[derive(Debug, Default)]
pub struct BlockLedger {
    blocks: Vec<Block>,
    next_id: BlockId,
}

impl BlockLedger {
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            next_id: 1,
        }
    }

    /// Append a block, assigning the next ID in the session's sequence.
    ///
    /// File drafts are checked against `max_file_size` and fail with
    /// [`CoreError::PayloadTooLarge`] without consuming an ID.
    pub fn append(
        &mut self,
        created_by: UserId,
        draft: BlockDraft,
        max_file_size: u64,
    ) -> Result<&Block, CoreError> {
        let block = match draft {
            BlockDraft::Text { content } => Block {
                id: self.next_id,
                kind: BlockKind::Text,
                content: Some(content),
                filename: None,
                size_bytes: None,
                stored_name: None,
                created_by,
                created_at: Utc::now(),
            },
            BlockDraft::File {
                filename,
                stored_name,
                size_bytes,
            } => {
                check_file_size(size_bytes, max_file_size)?;
                Block {
                    id: self.next_id,
                    kind: BlockKind::File,
                    content: None,
                    filename: Some(filename),
                    size_bytes: Some(size_bytes),
                    stored_name: Some(stored_name),
                    created_by,
                    created_at: Utc::now(),
                }
            }
        };

        self.next_id += 1;
        self.blocks.push(block);
        Ok(self.blocks.last().expect("just pushed"))
    }

    /// Remove a block by ID, returning it so the caller can reclaim any
    /// associated blob.
    pub fn remove(&mut self, block_id: BlockId) -> Result<Block, CoreError> {
        let idx = self
            .blocks
            .iter()
            .position(|b| b.id == block_id)
            .ok_or(CoreError::NotFound {
                entity: "Block",
                id: block_id.to_string(),
            })?;
        Ok(self.blocks.remove(idx))
    }

    pub fn get(&self, block_id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == block_id)
    }

    /// Insertion-order snapshot of all blocks.
    pub fn list(&self) -> Vec<Block> {
        self.blocks.clone()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterate blocks in insertion order without cloning.
    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }
}
