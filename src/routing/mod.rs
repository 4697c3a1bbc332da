//! Stream routing module.

mod router;

pub use router::match_streams;
