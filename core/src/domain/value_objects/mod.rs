//! Value objects representing immutable domain concepts.

pub mod derived_uid;
pub mod phone_number;
pub mod purpose;

// Re-export commonly used types
pub use derived_uid::DerivedUid;
pub use phone_number::PhoneNumber;
pub use purpose::Purpose;
