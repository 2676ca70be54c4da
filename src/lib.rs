//! Checksum used by cabinet (MS-CAB) archives to protect their CFDATA blocks, plus reading and
//! writing of the blocks themselves.

#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod block;
mod checksum;

pub use checksum::{Checksum, checksum};
