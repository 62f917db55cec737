#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;
mod health;

pub mod content;
pub mod format;
pub mod permission;
pub mod revision;
pub mod storage;
pub mod types;

pub use error::{BoxedError, Error, ErrorKind, Result};
pub use health::{ServiceHealth, ServiceStatus};
pub use revision::{MAX_KEY_LENGTH, RevisionKey, derive_key};
