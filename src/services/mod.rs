pub mod coach_documents;
pub mod factory;
pub mod file_storage;
pub mod inspector;
pub mod orchestrator;
pub mod validator;

pub use coach_documents::CoachDocumentUploadService;
pub use factory::FileValidatorFactory;
pub use file_storage::{sanitize_filename, FileStorageService, StoredFile};
pub use inspector::{
    peek_prefix, ContentSource, FileContentInspector, ImageContentInspector, PdfContentInspector,
};
pub use orchestrator::FileValidationOrchestrator;
pub use validator::{FileValidator, ImageFileValidator, PdfFileValidator, ValidationRules};
