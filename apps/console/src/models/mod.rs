pub mod history;
pub mod intake;
pub mod vision;

pub use intake::{ExtractionResult, FieldValue, IntakeRequest, Scalar, UploadFile};
pub use vision::{ProcessedDocument, VisionExtraction, VisionField};
