//! Per-capability routing facts
//!
//! Each proxied capability differs only in its upstream path and whether it
//! is restricted to the gated provider domain.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Chat,
    ModelTest,
    Embedding,
    Rerank,
    Transcription,
    Speech,
    ImageGeneration,
    VideoSubmit,
    VideoStatus,
}

impl Capability {
    pub const ALL: [Capability; 9] = [
        Capability::Chat,
        Capability::ModelTest,
        Capability::Embedding,
        Capability::Rerank,
        Capability::Transcription,
        Capability::Speech,
        Capability::ImageGeneration,
        Capability::VideoSubmit,
        Capability::VideoStatus,
    ];

    /// Path appended to the provider base URL
    pub fn path(self) -> &'static str {
        match self {
            Capability::Chat | Capability::ModelTest => "/chat/completions",
            Capability::Embedding => "/embeddings",
            Capability::Rerank => "/rerank",
            Capability::Transcription => "/audio/transcriptions",
            Capability::Speech => "/audio/speech",
            Capability::ImageGeneration => "/images/generations",
            Capability::VideoSubmit => "/video/submit",
            Capability::VideoStatus => "/video/status",
        }
    }

    /// Stable label for logs and metrics
    pub fn label(self) -> &'static str {
        match self {
            Capability::Chat => "chat",
            Capability::ModelTest => "model_test",
            Capability::Embedding => "embedding",
            Capability::Rerank => "rerank",
            Capability::Transcription => "transcription",
            Capability::Speech => "speech",
            Capability::ImageGeneration => "image_generation",
            Capability::VideoSubmit => "video_submit",
            Capability::VideoStatus => "video_status",
        }
    }

    /// Human-readable name used in client-facing messages
    pub fn description(self) -> &'static str {
        match self {
            Capability::Chat => "chat completion",
            Capability::ModelTest => "model test",
            Capability::Embedding => "embedding",
            Capability::Rerank => "rerank",
            Capability::Transcription => "audio transcription",
            Capability::Speech => "speech synthesis",
            Capability::ImageGeneration => "image generation",
            Capability::VideoSubmit => "video generation",
            Capability::VideoStatus => "video status",
        }
    }

    /// Only the gated provider exposes these in OpenAI-compatible form.
    pub fn is_provider_gated(self) -> bool {
        matches!(
            self,
            Capability::Transcription
                | Capability::Speech
                | Capability::VideoSubmit
                | Capability::VideoStatus
        )
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
