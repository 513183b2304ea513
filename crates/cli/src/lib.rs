//! Terminal host for the scratch book: drafts stand in for untitled buffers.
pub mod drafts;
pub mod editor;
