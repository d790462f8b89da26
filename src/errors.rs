use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("provider error: {0}")] Provider(String),
    #[error("malformed model response: {0}")] Malformed(String),
    #[error("page generation failed for {file_name} after {attempts} attempts")]
    GenerationExhausted { file_name: String, attempts: usize },
    #[error("plan file error: {0}")] Plan(String),
}
