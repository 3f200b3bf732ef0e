//! Cut job: analysis + tags + target → encoded cut in the object store

use csync_common::models::{parse_tag_map, CutMetadata, JobKind};
use csync_common::timing::format_duration_ms;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::JobContext;
use crate::audio::decode_audio_bytes;
use crate::db::songs;
use crate::error::{Collaborator, CutError, CutResult};
use crate::services::CutRequest;

/// Run the tracked cut job for `song_id`
pub async fn run_cut(ctx: &JobContext, song_id: Uuid) -> CutResult<CutMetadata> {
    ctx.tracker()
        .track(song_id, JobKind::Cut, generate_cut(ctx, song_id))
        .await
}

async fn generate_cut(ctx: &JobContext, song_id: Uuid) -> CutResult<CutMetadata> {
    let song = songs::require_song(&ctx.db, song_id).await?;

    let target_duration_ms = song
        .target_duration_ms
        .ok_or(CutError::MissingTargetDuration(song_id))?;
    let analysis = song
        .analysis
        .clone()
        .ok_or(CutError::MissingAnalysis(song_id))?;

    let (section_tags, unknown) = parse_tag_map(&song.section_tags);
    if !unknown.is_empty() {
        warn!(song_id = %song_id, sections = ?unknown, "Ignoring unknown section tags");
    }

    let bytes = ctx
        .object_store
        .download(&song.storage_path)
        .await
        .map_err(|e| CutError::collaborator(Collaborator::ObjectStore, e))?;
    debug!(song_id = %song_id, bytes = bytes.len(), "Original downloaded");

    let request = CutRequest {
        analysis,
        section_tags,
        target_duration_ms,
    };
    let extension = song.original_extension().map(str::to_string);
    let pipeline = Arc::clone(&ctx.pipeline);
    let normalizer = Arc::clone(&ctx.normalizer);
    let encoder = Arc::clone(&ctx.encoder);
    let content_type = ctx.encoder.content_type();

    let (metadata, encoded) = tokio::task::spawn_blocking(move || -> CutResult<_> {
        let audio = decode_audio_bytes(bytes, extension.as_deref())?;
        let output = pipeline.run(&audio, &request, normalizer.as_ref())?;
        let encoded = encoder
            .encode(&output.buffer)
            .map_err(|e| CutError::collaborator(Collaborator::Encoder, e))?;
        Ok((output.metadata, encoded))
    })
    .await??;

    let cut_path = song.cut_storage_path();
    ctx.object_store
        .upload(&cut_path, encoded, content_type)
        .await
        .map_err(|e| CutError::collaborator(Collaborator::ObjectStore, e))?;

    songs::complete_cut(&ctx.db, song_id, &cut_path, &metadata).await?;

    info!(
        song_id = %song_id,
        path = %cut_path,
        duration = %format_duration_ms(metadata.final_duration_ms),
        target = %format_duration_ms(target_duration_ms),
        "Cut stored"
    );

    Ok(metadata)
}
