//! Drop-in stand-in for the generated project's ORM client.
//!
//! [`generate_mock_client`] returns JavaScript module text that exports a
//! `PrismaClient` lookalike. Every method resolves and never rejects:
//! list reads give `[]`, single reads give `null`, writes echo their input
//! with a synthesized `id`. Unknown model names resolve through a `Proxy`
//! fallback because the project's schema is not known ahead of time.
//!
//! A missing accessor is a hard crash in the sandbox, so the surface is
//! wide on purpose.

pub mod operations;
mod render;

pub use operations::{ModelOperation, Resolution, CLIENT_METHODS, COMMON_MODELS, MODEL_OPERATIONS};
pub use render::generate_mock_client;
