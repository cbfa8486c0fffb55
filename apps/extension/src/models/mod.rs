pub mod profile;
pub mod resume;

pub use profile::{PersonalInfo, Profile, ProfileField, UnknownField};
pub use resume::{build_resume_record, resolve_path, value_as_text};
