use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntoEntryNameError {
    EmptyName,
    AbsolutePath,
    RelativeComponent,
    UnrepresentableChar,
}

impl std::error::Error for IntoEntryNameError {}

impl fmt::Display for IntoEntryNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl IntoEntryNameError {
    pub fn as_str(&self) -> &str {
        match self {
            IntoEntryNameError::EmptyName => "no name provided",
            IntoEntryNameError::AbsolutePath => "absolute path received as input",
            IntoEntryNameError::RelativeComponent => "`.` or `..` component found in name",
            IntoEntryNameError::UnrepresentableChar => "unrepresentable character found in name",
        }
    }

    pub fn as_io_error(&self) -> std::io::Error {
        use std::io::{Error, ErrorKind};
        Error::new(ErrorKind::InvalidInput, self.as_str())
    }
}
