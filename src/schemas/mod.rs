pub mod test;

pub use test::{ApiErrorBody, ClassroomRef, QuestionDocument, TestDto, TestRef, TestStatus};
