pub mod generator;
pub mod prompts;
pub mod validator;

pub use generator::{GenerateRequest, Generator, LlmGenerator};
pub use validator::{parse_verdict, LlmValidator, ValidateRequest, ValidationMode, Validator};
