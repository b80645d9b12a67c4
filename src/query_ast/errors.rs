#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryAstError {
    #[error("parse error: {0}")] Parse(String),
    #[error("unsupported input: {0}")] Unsupported(&'static str),
}

impl From<sqlparser::parser::ParserError> for QueryAstError { fn from(e: sqlparser::parser::ParserError) -> Self { QueryAstError::Parse(e.to_string()) } }

impl From<sqlparser::tokenizer::TokenizerError> for QueryAstError { fn from(e: sqlparser::tokenizer::TokenizerError) -> Self { QueryAstError::Parse(e.to_string()) } }
