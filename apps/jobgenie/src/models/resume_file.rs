use bytes::Bytes;

/// The locally selected resume, held in memory until the next analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeFile {
    pub name: String,
    pub bytes: Bytes,
}

impl ResumeFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// A tailored resume returned by the generation service.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedResume {
    pub url: String,
    pub text: String,
}
