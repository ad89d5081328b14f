//! Widgets

pub mod evidence;
pub mod text_block;
pub mod transcript;

pub use evidence::EvidenceView;
pub use text_block::{StyledLine, TextBlock, TextBlockState};
pub use transcript::transcript_lines;
