use anyhow::{Context, Result};
use clap::ValueEnum;
use rvtrail_game::{GeminiNarrator, NarrativeCollaborator, ScriptedNarrator, SilentNarrator};
use serde::{Deserialize, Serialize};

/// Narrator selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarratorKind {
    /// Offline canned events, deterministic per seed
    Scripted,
    /// Never answers; every consult takes the fallback event
    Silent,
    /// Live Gemini calls (needs RVTRAIL_GEMINI_API_KEY)
    Gemini,
}

/// Hands out one narrator per simulated run.
#[derive(Debug, Clone)]
pub enum NarratorSource {
    Scripted,
    Silent,
    Gemini(GeminiNarrator),
}

impl NarratorSource {
    pub fn from_kind(kind: NarratorKind) -> Result<Self> {
        Ok(match kind {
            NarratorKind::Scripted => Self::Scripted,
            NarratorKind::Silent => Self::Silent,
            NarratorKind::Gemini => Self::Gemini(
                GeminiNarrator::from_env().context("failed to configure the Gemini narrator")?,
            ),
        })
    }

    #[must_use]
    pub fn narrator_for(&self, seed: u64) -> Box<dyn NarrativeCollaborator> {
        match self {
            Self::Scripted => Box::new(ScriptedNarrator::new(seed)),
            Self::Silent => Box::new(SilentNarrator),
            Self::Gemini(narrator) => Box::new(narrator.clone()),
        }
    }
}
