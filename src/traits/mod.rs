//! Core traits for services.

mod dispose;

pub use dispose::Dispose;
