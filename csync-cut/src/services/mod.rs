//! Competition cut pipeline components
//!
//! Each step is a small, synchronous unit over plain data; [`CutPipeline`]
//! wires them together in playback-building order.

pub mod boundary_snapper;
pub mod crossfade_assembler;
pub mod cut_pipeline;
pub mod fade_finisher;
pub mod section_namer;
pub mod section_scorer;
pub mod section_selector;
pub mod tempo_adjuster;

pub use boundary_snapper::snap_to_downbeat;
pub use crossfade_assembler::{crossfade_ms_for_bpm, CrossfadeAssembler};
pub use cut_pipeline::{CutOutput, CutPipeline, CutRequest, PipelineSettings};
pub use fade_finisher::{FadeFinisher, FadeSettings};
pub use section_namer::{name_sections, NamedSection};
pub use section_scorer::{ScoredSection, ScoringWeights, SectionScorer, TagPriorities};
pub use section_selector::select_sections;
pub use tempo_adjuster::{TempoAdjuster, TempoAdjustment, TempoDecision, TempoPolicy};
