//! Core domain entities of the marketplace catalog.
//!
//! Entities are plain data structures. Shared entities ([`Service`],
//! [`Category`]) are referenced from offerings by natural key (URI and slug
//! name), never by pointer, so a single resolution run holds exactly one
//! instance per key.
//!
//! # Entity Types
//!
//! - [`User`] - A registered marketplace user
//! - [`Store`] - A shop grouping descriptions
//! - [`Description`] - A registered USDL document with its offerings
//! - [`Offering`], [`PricePlan`], [`PriceComponent`] - Offerings and their pricing
//! - [`Service`] - A reusable service unit, keyed by URI
//! - [`Category`] - A classification, keyed by slug name
//! - [`Rating`] - A user's score for an offering
//!
//! Input structs (`Create*`, `Update*`, `New*`) carry `validator` derives.

pub mod category;
pub mod description;
pub mod offering;
pub mod rating;
pub mod service;
pub mod store;
pub mod user;

pub use category::Category;
pub use description::{CreateDescription, Description, UpdateDescription};
pub use offering::{Offering, PriceComponent, PricePlan};
pub use rating::{NewRating, Rating, UpdateRating};
pub use service::Service;
pub use store::{CreateStore, NewStore, Store, UpdateStore};
pub use user::{NewUser, UpdateUser, User};
