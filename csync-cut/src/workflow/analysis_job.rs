//! Analysis job: original upload → structure analysis → record store

use csync_common::models::{AnalysisResult, JobKind};
use tracing::{debug, info};
use uuid::Uuid;

use super::JobContext;
use crate::audio::decode_audio_bytes;
use crate::collaborators::TempFiles;
use crate::db::songs;
use crate::error::{Collaborator, CutError, CutResult};

/// Run the tracked analysis job for `song_id`
pub async fn run_analysis(ctx: &JobContext, song_id: Uuid) -> CutResult<AnalysisResult> {
    ctx.tracker()
        .track(song_id, JobKind::Analysis, analyze_song(ctx, song_id))
        .await
}

async fn analyze_song(ctx: &JobContext, song_id: Uuid) -> CutResult<AnalysisResult> {
    let song = songs::require_song(&ctx.db, song_id).await?;

    let bytes = ctx
        .object_store
        .download(&song.storage_path)
        .await
        .map_err(|e| CutError::collaborator(Collaborator::ObjectStore, e))?;
    debug!(song_id = %song_id, bytes = bytes.len(), "Original downloaded");

    let extension = song.original_extension().unwrap_or("audio").to_string();
    let file_name = format!("original.{}", extension);
    let scratch = TempFiles::new([file_name.as_str()]);
    let local_path = &scratch.paths[0];
    tokio::fs::write(local_path, &bytes)
        .await
        .map_err(|e| CutError::collaborator(Collaborator::Analysis, e))?;

    let analysis = ctx
        .analyzer
        .analyze(local_path)
        .await
        .map_err(|e| CutError::collaborator(Collaborator::Analysis, e))?;

    let original = tokio::task::spawn_blocking(move || {
        decode_audio_bytes(bytes, Some(extension.as_str()))
    })
    .await??;
    let original_duration_ms = original.duration_ms();

    songs::complete_analysis(&ctx.db, song_id, &analysis, original_duration_ms).await?;

    info!(
        song_id = %song_id,
        analyzer = ctx.analyzer.name(),
        sections = analysis.sections.len(),
        bpm = analysis.bpm,
        original_duration_ms = original_duration_ms,
        "Analysis stored"
    );

    Ok(analysis)
}
