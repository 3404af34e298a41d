use std::fmt;
use std::path::PathBuf;

mod error;

pub use self::error::IntoEntryNameError;

/// The separator used in entry names, regardless of platform.
pub const NAME_SEP: &str = "/";

/// A validated entry name: one or more `/`-separated components forming a
/// relative path into the bundle.
///
/// Names are rejected rather than normalized. An absolute path, a `.` or
/// `..` component, a backslash or a control character all fail validation,
/// so a name can always be mapped safely onto a file below an unpacked
/// bundle directory.
#[derive(Debug, Clone, PartialOrd, Ord, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct EntryName(pub(crate) String);

fn validate_component(component: &str) -> Result<(), IntoEntryNameError> {
    if component.is_empty() {
        return Err(IntoEntryNameError::EmptyName);
    }
    if component == "." || component == ".." {
        return Err(IntoEntryNameError::RelativeComponent);
    }
    if component
        .chars()
        .any(|c| c == '\\' || c.is_control())
    {
        return Err(IntoEntryNameError::UnrepresentableChar);
    }
    Ok(())
}

impl EntryName {
    pub fn new<S: AsRef<str>>(name: S) -> Result<EntryName, IntoEntryNameError> {
        let name = name.as_ref();

        if name.is_empty() {
            return Err(IntoEntryNameError::EmptyName);
        }
        if name.starts_with(NAME_SEP) {
            return Err(IntoEntryNameError::AbsolutePath);
        }

        for component in name.split(NAME_SEP) {
            validate_component(component)?;
        }

        Ok(EntryName(name.to_string()))
    }

    #[inline(always)]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.split(NAME_SEP)
    }

    /// The name as a relative filesystem path, for unpacked bundles.
    pub fn to_path_buf(&self) -> PathBuf {
        self.iter().collect()
    }

    pub fn filename(&self) -> &str {
        self.0.rsplit(NAME_SEP).next().unwrap_or(&self.0)
    }
}

impl fmt::Display for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for EntryName {
    type Err = IntoEntryNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntryName::new(s)
    }
}
