// Audio module - click synthesis and non-blocking audio output

pub mod click;
pub mod engine_cpal;
pub mod mixer;
pub mod sink;
pub mod stubs;

// Re-export commonly used types for convenience
pub use click::{synthesize, synthesize_click, ClickParams, ClickWaveform, StereoFrame};
pub use engine_cpal::CpalSink;
pub use mixer::{voice_queue, Mixer, VoiceQueue, DEFAULT_MAX_VOICES};
pub use sink::AudioSink;
pub use stubs::RecordingSink;
