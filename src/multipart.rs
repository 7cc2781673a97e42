//! Pre-encoded `multipart/form-data` payloads for uploads.
//!
//! The payload is encoded once, up front, so every retry sends the same bytes.

/// A `multipart/form-data` body together with its boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Multipart {
    boundary: String,
    body: Vec<u8>,
}

impl Multipart {
    /// Wraps bytes that are already multipart-encoded with `boundary`.
    pub fn from_encoded(boundary: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            boundary: boundary.into(),
            body: body.into(),
        }
    }

    /// Starts building a payload with a random boundary.
    pub fn builder() -> MultipartBuilder {
        MultipartBuilder {
            boundary: format!("----skreenit-{}", uuid::Uuid::new_v4().simple()),
            body: Vec::new(),
        }
    }

    /// Boundary separating the parts, without the leading `--`.
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Encoded body, sent unchanged on every attempt.
    pub fn as_bytes(&self) -> &[u8] {
        &self.body
    }

    /// Value for the `content-type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }
}

/// Incrementally encodes form fields and files.
#[derive(Debug)]
pub struct MultipartBuilder {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartBuilder {
    /// Adds a plain text field.
    pub fn text(mut self, name: &str, value: impl AsRef<str>) -> Self {
        self.open_part(&format!("form-data; name=\"{}\"", escape(name)), None);
        self.body.extend_from_slice(value.as_ref().as_bytes());
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Adds a file part.
    pub fn file(
        mut self,
        name: &str,
        file_name: &str,
        content_type: &str,
        bytes: impl AsRef<[u8]>,
    ) -> Self {
        let disposition = format!(
            "form-data; name=\"{}\"; filename=\"{}\"",
            escape(name),
            escape(file_name)
        );
        self.open_part(&disposition, Some(content_type));
        self.body.extend_from_slice(bytes.as_ref());
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Appends the closing boundary.
    pub fn finish(mut self) -> Multipart {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        Multipart {
            boundary: self.boundary,
            body: self.body,
        }
    }

    fn open_part(&mut self, disposition: &str, content_type: Option<&str>) {
        self.body
            .extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
        self.body
            .extend_from_slice(format!("Content-Disposition: {disposition}\r\n").as_bytes());
        if let Some(content_type) = content_type {
            self.body
                .extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        self.body.extend_from_slice(b"\r\n");
    }
}

fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace(['\r', '\n'], " ")
}
