pub mod file_service;

pub use file_service::{base_name, FileService, FileServiceError, FileUpload};
