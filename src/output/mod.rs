//! Output formatting for diffusion analysis summaries.

pub mod json;
pub mod terminal;
