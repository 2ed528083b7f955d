use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-side lifecycle of a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestStatus {
    NotStarted,
    Active,
    Ended,
    #[serde(other)]
    Unknown,
}

impl TestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TestStatus::NotStarted => "NOT_STARTED",
            TestStatus::Active => "ACTIVE",
            TestStatus::Ended => "ENDED",
            TestStatus::Unknown => "UNKNOWN",
        }
    }
}

/// Classroom code + test name, the pair every test endpoint is keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TestRef {
    pub classroom_code: String,
    pub testname: String,
}

impl TestRef {
    pub fn new(classroom_code: impl Into<String>, testname: impl Into<String>) -> Self {
        Self { classroom_code: classroom_code.into(), testname: testname.into() }
    }
}

impl fmt::Display for TestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.classroom_code, self.testname)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ClassroomRef {
    pub code: String,
    #[serde(default)]
    pub classroomname: String,
}

/// Test metadata as returned by `GET /api/classrooms/{code}/tests/{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestDto {
    #[serde(default)]
    pub id: i64,
    pub testname: String,
    pub status: TestStatus,
    pub question_count: usize,
    #[serde(default)]
    pub questions_pdf_path: Option<String>,
    #[serde(default)]
    pub classroom: Option<ClassroomRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub message: Option<String>,
}

/// The paginated question document. Page `i` holds canonical question `i`;
/// the bytes are handed to the renderer untouched.
#[derive(Clone, PartialEq, Eq)]
pub struct QuestionDocument {
    bytes: Vec<u8>,
}

impl QuestionDocument {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for QuestionDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuestionDocument").field("len", &self.bytes.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dto_reads_server_payload() {
        let raw = r#"{
            "id": 7,
            "testname": "Unit 3 Quiz",
            "questionsPdfPath": "uploads/unit3.pdf",
            "correctAnswers": null,
            "status": "ACTIVE",
            "classroom": {"code": "ABC123", "classroomname": "Chemistry", "classroomteacher": null},
            "questionCount": 12
        }"#;

        let dto: TestDto = serde_json::from_str(raw).expect("test dto");
        assert_eq!(dto.status, TestStatus::Active);
        assert_eq!(dto.question_count, 12);
        assert_eq!(dto.classroom.map(|c| c.code).as_deref(), Some("ABC123"));
    }

    #[test]
    fn unrecognised_status_does_not_fail_decoding() {
        let status: TestStatus = serde_json::from_str("\"ARCHIVED\"").expect("status");
        assert_eq!(status, TestStatus::Unknown);
        let status: TestStatus = serde_json::from_str("\"NOT_STARTED\"").expect("status");
        assert_eq!(status, TestStatus::NotStarted);
    }

    #[test]
    fn question_document_debug_hides_bytes() {
        let doc = QuestionDocument::new(vec![1, 2, 3]);
        assert_eq!(format!("{doc:?}"), "QuestionDocument { len: 3 }");
    }
}
