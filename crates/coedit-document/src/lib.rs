#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod access;
mod config;
mod create;
mod lifecycle;
mod orchestrator;

pub use access::AccessGate;
pub use coedit_core::{Error, ErrorKind, Result};
pub use config::{
    DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_MAX_FILE_SIZE, DEFAULT_PUBLIC_URL, DocumentConfig,
};
pub use create::{
    CREATABLE_EXTENSIONS, CreateDocument, DEFAULT_EXTENSION, DocumentCreator, creatable_extension,
};
pub use lifecycle::{
    ArtifactManager, DIFF_FILE_NAME, DIFF_MEDIA_TYPE, HISTORY_FILE_NAME, HISTORY_MEDIA_TYPE,
};
pub use orchestrator::{
    ConversionOrchestrator, TEMPLATE_SOURCE_EXTENSION, TEMPLATE_TARGET_EXTENSION,
};
