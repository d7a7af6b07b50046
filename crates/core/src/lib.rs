//! Core domain types for batch Simplified-to-Traditional Chinese
//! conversion of PPTX presentations: the character mapper, the error
//! taxonomy, and the batch report types.

pub mod error;
pub mod mapper;
pub mod report;

pub use error::{Error, Result};
pub use mapper::CharacterMapper;
pub use report::{ConversionJob, ConversionReport, Failure};
