//! Request bodies for upload tests.

use bytes::Bytes;

pub const BOUNDARY: &str = "intake-test-boundary";

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

/// JPEG/JFIF header padded to `len` bytes.
pub fn jpeg(len: usize) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];
    data.resize(len, 0x5A);
    data
}

/// Multipart body from `(content-disposition, content)` pairs.
pub fn multipart_body(parts: &[(String, Vec<u8>)]) -> Bytes {
    let mut body = Vec::new();
    for (disposition, content) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(format!("Content-Disposition: {}\r\n", disposition).as_bytes());
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    Bytes::from(body)
}

/// Body with a single file field.
pub fn file_form(file_name: &str, content: Vec<u8>) -> Bytes {
    multipart_body(&[(
        format!(r#"form-data; name="file"; filename="{}""#, file_name),
        content,
    )])
}
