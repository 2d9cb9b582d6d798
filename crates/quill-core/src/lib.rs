//! # quill-core
//!
//! Core types, ID generation, and error types for Quill.
//!
//! This crate provides the foundational types shared across all Quill crates:
//! - Entity DTO structs for the catalog's domain objects (works, people,
//!   relations, articles, notes)
//! - The `Document` storage contract and the immutable `Record` view
//! - Entity kind and action enums
//! - ID prefix constants and the context-scoped id factory
//! - The `UpdateEvent` commit envelope consumed by listeners
//! - Cross-cutting error types

pub mod document;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod event;
pub mod ids;
