//! Zotcli Core Library
//!
//! Core domain logic for the zotcli Zotero client: the hidden-payload note
//! codec, the note translator, the local full-text search index, and the
//! incremental sync coordinator.

pub mod backend;
pub mod codec;
pub mod config;
pub mod convert;
pub mod db;
pub mod error;
pub mod logging;
pub mod records;
pub mod remote;
pub mod sync;
pub mod translate;
