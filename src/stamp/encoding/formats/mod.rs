#[cfg(feature = "heif")]
pub mod heif;
pub mod jpeg;
pub mod png;
pub mod webp;
