//! Database entity models for folio-chat.
//!
//! These Sea-ORM entities define the two tables the application owns: the
//! database-backed cache and the user profile store.

/// Key/value cache rows with absolute expiry.
pub mod cache_entry;

/// One preferences profile per user identity.
pub mod user_profile;
