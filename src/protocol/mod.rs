//! HTTP multipart wire protocol
//!
//! Viewers receive a single `HTTP/1.1 200 OK` response whose body never ends:
//! a sequence of JPEG parts, each replacing the previous one. The request is
//! never parsed; connecting is enough to start the stream.

pub mod constants;
pub mod multipart;

pub use constants::{BOUNDARY, PART_CONTENT_TYPE, RESPONSE_HEADER};
pub use multipart::{encode_part, part_header, MultipartError, MultipartReader, Part};
