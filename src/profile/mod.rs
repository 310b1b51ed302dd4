//! User profiles: validation, persistence, the compact cached snapshot and the
//! instruction block derived from it.

pub mod compact;
pub mod input;
pub mod instructions;
mod repository;
mod service;

pub use compact::CompactProfile;
pub use input::{ProfileFields, ProfileInput};
pub use instructions::{build_instructions, BEHAVIOR_DIRECTIVES};
pub use repository::ProfileRepository;
pub use service::{ProfileError, ProfileService, ProfileView, UpsertOutcome};
