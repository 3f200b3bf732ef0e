//! Competition cut pipeline
//!
//! name → score → select → snap → crossfade → tempo → normalize → fade
//!
//! Runs synchronously on a decoded song; callers put it on a blocking
//! thread. Loudness normalization is delegated to the supplied
//! [`Normalizer`] between the tempo and fade steps.

use csync_common::models::{AnalysisResult, CutMetadata, TagMap};
use csync_common::timing::format_duration_ms;

use super::boundary_snapper::snap_to_downbeat;
use super::crossfade_assembler::{crossfade_ms_for_bpm, CrossfadeAssembler};
use super::fade_finisher::{FadeFinisher, FadeSettings};
use super::section_namer::name_sections;
use super::section_scorer::{ScoringWeights, SectionScorer, TagPriorities};
use super::section_selector::select_sections;
use super::tempo_adjuster::{TempoAdjuster, TempoPolicy};
use crate::audio::{AudioBuffer, EnergyProfile};
use crate::collaborators::Normalizer;
use crate::error::{Collaborator, CutError, CutResult};

/// Inputs of one cut assembly
#[derive(Debug, Clone)]
pub struct CutRequest {
    pub analysis: AnalysisResult,
    pub section_tags: TagMap,
    pub target_duration_ms: u64,
}

/// Final audio plus its summary
#[derive(Debug, Clone)]
pub struct CutOutput {
    pub buffer: AudioBuffer,
    pub metadata: CutMetadata,
}

/// Tunable tables of the pipeline
#[derive(Debug, Clone, Default)]
pub struct PipelineSettings {
    pub weights: ScoringWeights,
    pub priorities: TagPriorities,
    pub tempo: TempoPolicy,
    pub fades: FadeSettings,
}

#[derive(Debug, Clone, Default)]
pub struct CutPipeline {
    scorer: SectionScorer,
    assembler: CrossfadeAssembler,
    tempo: TempoAdjuster,
    finisher: FadeFinisher,
}

impl CutPipeline {
    pub fn new(settings: PipelineSettings) -> Self {
        Self {
            scorer: SectionScorer::new(settings.weights, settings.priorities),
            assembler: CrossfadeAssembler::default(),
            tempo: TempoAdjuster::new(settings.tempo),
            finisher: FadeFinisher::new(settings.fades),
        }
    }

    pub fn run(
        &self,
        audio: &AudioBuffer,
        request: &CutRequest,
        normalizer: &dyn Normalizer,
    ) -> CutResult<CutOutput> {
        let analysis = &request.analysis;

        let named = name_sections(&analysis.sections);
        let profile = EnergyProfile::from_buffer(audio);
        let scored = self
            .scorer
            .score_all(&named, &request.section_tags, |start, end| profile.energy(start, end));

        let target_seconds = request.target_duration_ms as f64 / 1000.0;
        let selected = select_sections(&scored, target_seconds)?;

        // Sections that snap to an empty span contribute no audio and are
        // left out of the metadata as well.
        let mut spans = Vec::with_capacity(selected.len());
        let mut sections_used = Vec::with_capacity(selected.len());
        for section in &selected {
            let start_ms = snap_to_downbeat(section.section.start * 1000.0, &analysis.downbeats);
            let end_ms = snap_to_downbeat(section.section.end * 1000.0, &analysis.downbeats);
            let span = audio.slice_ms(start_ms, end_ms);
            if span.is_empty() {
                tracing::warn!(
                    section = section.name(),
                    start_ms = start_ms,
                    end_ms = end_ms,
                    "Section collapsed to an empty span after snapping, dropped"
                );
                continue;
            }
            spans.push(span);
            sections_used.push(section.label().to_string());
        }

        let crossfade_ms = crossfade_ms_for_bpm(analysis.bpm);
        let assembled = self.assembler.assemble(&spans, crossfade_ms)?;
        if assembled.is_empty() {
            return Err(CutError::EmptySelection);
        }

        let adjusted = self.tempo.adjust(assembled, request.target_duration_ms)?;

        let mut buffer = normalizer
            .normalize(&adjusted.buffer)
            .map_err(|e| CutError::collaborator(Collaborator::Normalizer, e))?;

        self.finisher.finish(&mut buffer);

        let metadata = CutMetadata {
            sections_used,
            crossfade_ms,
            tempo_adjustment_pct: adjusted.tempo_adjustment_pct,
            final_duration_ms: buffer.duration_ms(),
        };

        tracing::info!(
            sections = ?metadata.sections_used,
            crossfade_ms = crossfade_ms,
            tempo_adjustment_pct = metadata.tempo_adjustment_pct,
            duration = %format_duration_ms(metadata.final_duration_ms),
            "Cut assembled"
        );

        Ok(CutOutput { buffer, metadata })
    }
}
