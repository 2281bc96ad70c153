//! Wire constants for the MJPEG stream

/// Multipart boundary token
pub const BOUNDARY: &str = "frame";

/// Response header sent once per connection, byte-exact
pub const RESPONSE_HEADER: &[u8] =
    b"HTTP/1.1 200 OK\r\nContent-Type: multipart/x-mixed-replace;boundary=frame\r\n\r\n";

/// Content type of every part
pub const PART_CONTENT_TYPE: &str = "image/jpeg";

/// Line terminator used by HTTP framing
pub const CRLF: &[u8] = b"\r\n";

/// Terminates a header block
pub const HEADER_END: &[u8] = b"\r\n\r\n";
