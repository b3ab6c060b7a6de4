//! Front-end facing types
//!
//! Text normalization and grapheme-to-phoneme conversion happen in an
//! external front end. This module holds what crosses that boundary: the
//! request the front end produces and the trait it implements.

mod request;

pub use request::{parse_ids, SynthesisRequest, TextFrontend};
