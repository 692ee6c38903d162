//! Supabase REST client: session construction, table selects, and error
//! classification.

pub mod client;
pub mod errors;
pub mod json;
pub mod models;

pub use client::SupabaseClient;
pub use errors::ProbeError;
pub use models::{Credential, Query, Row};
