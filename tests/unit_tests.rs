//! Unit tests for individual components

use attest::{
    config::{Config, FileTypeOptions, StorageBackendKind, MIB},
    error::AppError,
    models::{
        normalize_extension, normalize_mime_type, BatchValidationResult, FileCategory, FileUploadResponse,
        RejectionReason, UploadedFile, ValidationOutcome,
    },
    services::{
        sanitize_filename, FileValidationOrchestrator, FileValidator, FileValidatorFactory, ImageFileValidator,
        PdfFileValidator,
    },
    storage::StorageError,
};
use axum::http::StatusCode;
use proptest::prelude::*;
use std::io::Write;
use std::sync::Arc;

const PNG: &[u8] = &[
    0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D', b'R',
];
const JPEG: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01,
];
const GIF: &[u8] = b"GIF89a\x01\x00\x01\x00\x00\x00\x00";
const PDF: &[u8] = b"%PDF-1.7\n1 0 obj\n<< /Type /Catalog >>\nendobj\n";

fn orchestrator(max_file_size: u64, max_total_size: u64) -> FileValidationOrchestrator {
    let factory = FileValidatorFactory::new(&FileTypeOptions::default(), max_file_size);
    FileValidationOrchestrator::new(Arc::new(factory), max_total_size)
}

#[test]
fn test_error_codes() {
    assert_eq!(AppError::InvalidApiKey.error_code(), "INVALID_API_KEY");
    assert_eq!(AppError::RateLimitExceeded.error_code(), "RATE_LIMIT_EXCEEDED");
    assert_eq!(AppError::unsupported("a.txt", "text/plain").error_code(), "UNSUPPORTED_FILE_TYPE");
    assert_eq!(AppError::Cancelled.error_code(), "UPLOAD_CANCELLED");
    assert_eq!(AppError::validation("test").error_code(), "VALIDATION_ERROR");
    assert_eq!(AppError::config("test").error_code(), "CONFIG_ERROR");
    assert_eq!(
        AppError::from(StorageError::UploadFailed("boom".into())).error_code(),
        "STORAGE_FAILURE"
    );
}

#[test]
fn test_error_status_codes() {
    assert_eq!(AppError::InvalidApiKey.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::RateLimitExceeded.status_code(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        AppError::unsupported("a.txt", "text/plain").status_code(),
        StatusCode::UNSUPPORTED_MEDIA_TYPE
    );
    assert_eq!(AppError::MissingFile.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(AppError::Timeout.status_code(), StatusCode::REQUEST_TIMEOUT);
    assert_eq!(AppError::Cancelled.status_code(), StatusCode::REQUEST_TIMEOUT);
}

#[test]
fn test_storage_error_status_mapping() {
    let not_found = AppError::from(StorageError::NotFound("uploads/a.pdf".into()));
    assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

    let bad_path = AppError::from(StorageError::InvalidPath("../etc".into()));
    assert_eq!(bad_path.status_code(), StatusCode::BAD_REQUEST);

    let backend = AppError::from(StorageError::Backend("503".into()));
    assert_eq!(backend.status_code(), StatusCode::BAD_GATEWAY);
}

#[test]
fn test_error_helper_methods() {
    match AppError::invalid_file("broken") {
        AppError::InvalidFile { message } => assert_eq!(message, "broken"),
        _ => panic!("Expected InvalidFile"),
    }

    match AppError::unsupported("notes.txt", "text/plain") {
        AppError::UnsupportedFileType { file_name, content_type } => {
            assert_eq!(file_name, "notes.txt");
            assert_eq!(content_type, "text/plain");
        }
        _ => panic!("Expected UnsupportedFileType"),
    }
}

#[test]
fn test_config_defaults() {
    let config = Config::default();
    assert_eq!(config.server_port, 8080);
    assert_eq!(config.max_file_size_bytes, 10 * MIB);
    assert_eq!(config.max_total_size_bytes, 100 * MIB);
    assert_eq!(config.storage.backend, StorageBackendKind::Local);
    assert_eq!(config.storage.base_path, "uploads");
    assert!(config.validate().is_ok());
    assert_eq!(config.body_limit_bytes() as u64, 101 * MIB);
}

#[test]
fn test_config_validation_rejects_dropbox_without_token() {
    let mut config = Config::default();
    config.storage.backend = StorageBackendKind::Dropbox;
    assert!(config.validate().is_err());

    config.storage.dropbox_access_token = Some("sl.token".to_string());
    assert!(config.validate().is_ok());

    config.max_total_size_bytes = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_api_key_parsing() {
    let mut config = Config::default();
    config.api_keys = Config::parse_api_keys(" valid-key-123 ,another-key,, ");

    assert_eq!(config.api_keys.len(), 2);
    assert!(config.validate_api_key("valid-key-123"));
    assert!(config.validate_api_key("another-key"));
    assert!(!config.validate_api_key("invalid-key"));
    assert!(!config.validate_api_key(""));
}

#[test]
fn test_storage_backend_kind_parsing() {
    assert_eq!("local".parse::<StorageBackendKind>().unwrap(), StorageBackendKind::Local);
    assert_eq!("Dropbox".parse::<StorageBackendKind>().unwrap(), StorageBackendKind::Dropbox);
    assert!("s3".parse::<StorageBackendKind>().is_err());
}

#[test]
fn test_file_type_options_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("file_types.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "[image]").unwrap();
    writeln!(file, "allowed_mime_types = [\" IMAGE/PNG \"]").unwrap();
    writeln!(file, "allowed_extensions = [\".PNG\"]").unwrap();
    drop(file);

    let options = FileTypeOptions::load(Some(path.as_path())).unwrap();

    assert_eq!(options.image.allowed_mime_types, vec!["image/png".to_string()]);
    assert_eq!(options.image.allowed_extensions, vec!["png".to_string()]);
    assert_eq!(options.pdf, FileTypeOptions::default().pdf);
}

#[test]
fn test_file_type_options_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    assert!(FileTypeOptions::load(Some(path.as_path())).is_err());
}

#[test]
fn test_category_resolution() {
    assert_eq!(FileCategory::resolve("image/png", "a.png"), Some(FileCategory::Image));
    assert_eq!(FileCategory::resolve("Application/PDF; charset=binary", "x"), Some(FileCategory::Pdf));
    assert_eq!(
        FileCategory::resolve("application/octet-stream", "scan.PDF"),
        Some(FileCategory::Pdf)
    );
    assert_eq!(FileCategory::resolve("text/plain", "notes.txt"), None);

    assert_eq!(normalize_mime_type("Image/PNG; q=1"), "image/png");
    assert_eq!(normalize_extension("archive.tar.GZ"), "gz");
    assert_eq!(normalize_extension("README"), "");
}

#[test]
fn test_valid_png_is_accepted() {
    let validator = ImageFileValidator::from_options(&FileTypeOptions::default(), MIB);
    let result = validator.validate(&UploadedFile::new("cert.png", "image/png", PNG));

    assert!(result.is_accepted());
    assert_eq!(result.outcome(), ValidationOutcome::Accepted);
    assert!(result.reasons().is_empty());
    assert_eq!(result.category(), FileCategory::Image);
    assert_eq!(result.size(), PNG.len());
}

#[test]
fn test_image_validator_collects_every_reason() {
    let validator = ImageFileValidator::from_options(&FileTypeOptions::default(), 4);
    let result = validator.validate(&UploadedFile::new("notes.txt", "image/bmp", &b"plain text"[..]));

    assert_eq!(result.outcome(), ValidationOutcome::Rejected);
    assert_eq!(
        result.reasons(),
        &[
            RejectionReason::SizeExceeded,
            RejectionReason::ExtensionNotAllowed,
            RejectionReason::MimeTypeNotAllowed,
            RejectionReason::ContentSignatureMismatch,
        ][..]
    );
}

#[test]
fn test_image_with_other_format_signature_is_rejected() {
    let validator = ImageFileValidator::from_options(&FileTypeOptions::default(), MIB);
    let result = validator.validate(&UploadedFile::new("photo.png", "image/png", GIF));

    assert_eq!(result.reasons(), &[RejectionReason::ContentSignatureMismatch][..]);
}

#[test]
fn test_jpg_alias_is_accepted() {
    let validator = ImageFileValidator::from_options(&FileTypeOptions::default(), MIB);
    let mut options = FileTypeOptions::default();
    options.image.allowed_mime_types.push("image/jpg".to_string());
    let lenient = ImageFileValidator::from_options(&options, MIB);

    let file = UploadedFile::new("photo.jpg", "image/jpg", JPEG);
    assert_eq!(validator.validate(&file).reasons(), &[RejectionReason::MimeTypeNotAllowed][..]);
    assert!(lenient.validate(&file).is_accepted());
}

#[test]
fn test_jpeg_bytes_declared_as_pdf_are_rejected() {
    let validator = PdfFileValidator::from_options(&FileTypeOptions::default(), MIB);
    let result = validator.validate(&UploadedFile::new("scan.pdf", "application/pdf", JPEG));

    assert_eq!(result.category(), FileCategory::Pdf);
    assert_eq!(result.reasons(), &[RejectionReason::ContentSignatureMismatch][..]);
}

#[test]
fn test_empty_pdf_fails_signature_check() {
    let validator = PdfFileValidator::from_options(&FileTypeOptions::default(), MIB);
    let result = validator.validate(&UploadedFile::new("empty.pdf", "application/pdf", Vec::new()));

    assert_eq!(result.reasons(), &[RejectionReason::ContentSignatureMismatch][..]);
}

#[test]
fn test_factory_resolves_validators() {
    let factory = FileValidatorFactory::new(&FileTypeOptions::default(), MIB);
    assert_eq!(factory.categories(), vec![FileCategory::Image, FileCategory::Pdf]);

    let image = factory.get_validator(&UploadedFile::new("a.png", "image/png", PNG)).unwrap();
    assert_eq!(image.category(), FileCategory::Image);

    let pdf = factory.get_validator(&UploadedFile::new("a.pdf", "application/pdf", PDF)).unwrap();
    assert_eq!(pdf.category(), FileCategory::Pdf);

    let err = factory
        .get_validator(&UploadedFile::new("notes.txt", "text/plain", &b"hi"[..]))
        .err()
        .unwrap();
    assert_eq!(err.error_code(), "UNSUPPORTED_FILE_TYPE");
}

#[test]
fn test_factory_without_registered_validator() {
    let factory = FileValidatorFactory::empty()
        .with_validator(Arc::new(PdfFileValidator::from_options(&FileTypeOptions::default(), MIB)));

    assert!(factory.lookup(FileCategory::Image).is_none());
    assert!(factory.get_validator(&UploadedFile::new("a.png", "image/png", PNG)).is_err());
    assert!(factory.get_validator(&UploadedFile::new("a.pdf", "application/pdf", PDF)).is_ok());
}

#[test]
fn test_same_type_detection() {
    let orchestrator = orchestrator(MIB, 10 * MIB);
    let png = UploadedFile::new("a.png", "image/png", PNG);
    let jpg = UploadedFile::new("b.jpg", "image/jpeg", JPEG);
    let pdf = UploadedFile::new("c.pdf", "application/pdf", PDF);
    let txt = UploadedFile::new("d.txt", "text/plain", &b"hi"[..]);

    assert!(orchestrator.are_all_files_same_type(&[]).unwrap());
    assert!(orchestrator.are_all_files_same_type(&[png.clone(), jpg]).unwrap());
    assert!(!orchestrator.are_all_files_same_type(&[png.clone(), pdf]).unwrap());
    assert!(orchestrator.are_all_files_same_type(&[png, txt]).is_err());
}

#[test]
fn test_batch_keeps_input_order_and_reports_each_file() {
    let orchestrator = orchestrator(MIB, 10 * MIB);
    let files = vec![
        UploadedFile::new("good.png", "image/png", PNG),
        UploadedFile::new("fake.pdf", "application/pdf", &b"not a pdf"[..]),
        UploadedFile::new("good.pdf", "application/pdf", PDF),
    ];

    let batch = orchestrator.validate_files(&files).unwrap();

    assert!(!batch.is_valid);
    assert_eq!(batch.rejected_count(), 1);
    let names: Vec<&str> = batch.results.iter().map(|r| r.file_name()).collect();
    assert_eq!(names, vec!["good.png", "fake.pdf", "good.pdf"]);
    assert_eq!(batch.results[1].reasons(), &[RejectionReason::ContentSignatureMismatch][..]);
    assert!(batch.batch_reasons.is_empty());
}

#[test]
fn test_batch_over_total_cap_skips_file_inspection() {
    let orchestrator = orchestrator(10 * MIB, 8 * MIB);
    let content = vec![0u8; 5 * MIB as usize];
    let files = vec![
        UploadedFile::new("one.png", "image/png", content.clone()),
        UploadedFile::new("two.png", "image/png", content),
    ];

    let batch = orchestrator.validate_files(&files).unwrap();

    assert!(!batch.is_valid);
    assert!(batch.results.is_empty());
    assert_eq!(batch.batch_reasons, vec![RejectionReason::SizeExceeded]);
    assert_eq!(batch.total_size, 10 * MIB);
}

#[test]
fn test_unsupported_file_fails_whole_batch() {
    let orchestrator = orchestrator(MIB, 10 * MIB);
    let files = vec![
        UploadedFile::new("good.png", "image/png", PNG),
        UploadedFile::new("macro.docm", "application/vnd.ms-word", &b"PK"[..]),
    ];

    let err = orchestrator.validate_files(&files).err().unwrap();
    assert!(matches!(err, AppError::UnsupportedFileType { .. }));
}

#[test]
fn test_upload_response_json_shape() {
    let rejected = BatchValidationResult::rejected_batch(RejectionReason::SizeExceeded, 42);
    let json = serde_json::to_value(FileUploadResponse::from_validation(&rejected)).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["files"].as_array().unwrap().len(), 0);
    assert_eq!(json["batchReasons"][0], "SizeExceeded");

    let orchestrator = orchestrator(MIB, 10 * MIB);
    let batch = orchestrator
        .validate_files(&[UploadedFile::new("a.png", "image/png", PNG)])
        .unwrap();
    let mut response = FileUploadResponse::from_validation(&batch);
    response.files[0] = response.files[0].clone().with_location("http://localhost/a.png".into());

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["success"], true);
    assert!(json.get("batchReasons").is_none());
    assert_eq!(json["files"][0]["filename"], "a.png");
    assert_eq!(json["files"][0]["accepted"], true);
    assert_eq!(json["files"][0]["storedLocation"], "http://localhost/a.png");
}

#[test]
fn test_filename_sanitization() {
    assert_eq!(sanitize_filename("../../etc/passwd").unwrap(), "passwd");
    assert_eq!(sanitize_filename("my report (1).pdf").unwrap(), "my_report__1_.pdf");
    assert_eq!(sanitize_filename("my..file.pdf").unwrap(), "my..file.pdf");
    assert!(sanitize_filename("..").is_err());
    assert!(sanitize_filename("???").is_err());
}

proptest! {
    #[test]
    fn images_are_accepted_only_when_every_check_passes(
        size_ok in any::<bool>(),
        ext_ok in any::<bool>(),
        mime_ok in any::<bool>(),
        signature_ok in any::<bool>(),
        pad in 0usize..512,
    ) {
        let validator = ImageFileValidator::from_options(&FileTypeOptions::default(), 1024);

        // bmp is a real image type that the default allow-list leaves out
        let mime = if mime_ok { "image/png" } else { "image/bmp" };
        let name = if ext_ok { "scan.png" } else { "scan.exe" };
        let mut content = match (signature_ok, mime_ok) {
            (true, true) => PNG.to_vec(),
            (true, false) => b"BM\x3a\x00\x00\x00\x00\x00\x00\x00\x36\x00\x00\x00".to_vec(),
            (false, _) => b"plain text body".to_vec(),
        };
        let target = if size_ok { content.len() + pad } else { 1025 + pad };
        content.resize(target, 0);

        let result = validator.validate(&UploadedFile::new(name, mime, content));

        let failures = [size_ok, ext_ok, mime_ok, signature_ok].iter().filter(|ok| !**ok).count();
        prop_assert_eq!(result.is_accepted(), failures == 0);
        prop_assert_eq!(result.reasons().len(), failures);
    }

    #[test]
    fn foreign_bytes_declared_as_pdf_mismatch(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        prop_assume!(!bytes.starts_with(b"%PDF-"));
        let validator = PdfFileValidator::from_options(&FileTypeOptions::default(), MIB);

        let result = validator.validate(&UploadedFile::new("doc.pdf", "application/pdf", bytes));

        prop_assert!(result.reasons().contains(&RejectionReason::ContentSignatureMismatch));
    }

    #[test]
    fn oversized_pdfs_always_report_size_exceeded(extra in 1usize..4096) {
        let validator = PdfFileValidator::from_options(&FileTypeOptions::default(), 1024);
        let mut content = PDF.to_vec();
        content.resize(1024 + extra, b' ');

        let result = validator.validate(&UploadedFile::new("doc.pdf", "application/pdf", content));

        prop_assert_eq!(result.reasons(), &[RejectionReason::SizeExceeded][..]);
    }

    #[test]
    fn batches_over_cap_never_yield_file_results(sizes in prop::collection::vec(1usize..256, 1..6)) {
        let total: usize = sizes.iter().sum();
        let orchestrator = orchestrator(MIB, total as u64 - 1);
        let files: Vec<UploadedFile> = sizes
            .iter()
            .enumerate()
            .map(|(i, size)| UploadedFile::new(format!("f{}.png", i), "image/png", vec![0u8; *size]))
            .collect();

        let batch = orchestrator.validate_files(&files).unwrap();

        prop_assert!(!batch.is_valid);
        prop_assert!(batch.results.is_empty());
        prop_assert_eq!(batch.batch_reasons, vec![RejectionReason::SizeExceeded]);
    }

    #[test]
    fn accepted_batches_preserve_order(count in 1usize..8) {
        let orchestrator = orchestrator(MIB, 10 * MIB);
        let files: Vec<UploadedFile> = (0..count)
            .map(|i| UploadedFile::new(format!("page-{}.png", i), "image/png", PNG))
            .collect();

        let batch = orchestrator.validate_files(&files).unwrap();

        prop_assert!(batch.is_valid);
        for (i, result) in batch.results.iter().enumerate() {
            let expected = format!("page-{}.png", i);
            prop_assert_eq!(result.file_name(), expected.as_str());
        }
    }
}
