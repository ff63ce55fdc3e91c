pub mod error;
pub mod extract;
pub mod index;
pub mod io;
pub mod pipelines;
pub mod sources;
