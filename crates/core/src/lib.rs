//! Core library: content classification, scratch file naming, saving and browsing.

pub mod browse;
pub mod classifier;
pub mod config;
pub mod error;
pub mod naming;
pub mod paths;
pub mod project;
pub mod save;
pub mod session;
pub mod writer;

pub use classifier::{classify, ClassificationResult, ContentKind};
pub use error::{Result, ScratchError};
