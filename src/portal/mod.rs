//! Portal protocol clients.

pub mod srun;

pub use srun::SrunClient;
