//! Utility functions shared across layers.
//!
//! - [`slug`] - URL-safe name generation for stores, descriptions, offerings and categories
//! - [`pagination`] - Offset/limit validation
//! - [`validation`] - Custom validators for `validator` derives

pub mod pagination;
pub mod slug;
pub mod validation;

pub use pagination::Page;
pub use slug::slugify;
