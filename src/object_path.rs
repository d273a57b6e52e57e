//! Object paths, the names D-Bus gives to remote objects.
//!
//! An [`ObjectPath`] always holds a valid path: it starts with `/`, its
//! segments are separated by single slashes, every segment is made of
//! `[A-Za-z0-9_]` and only the root path `/` ends with a slash.

use std::fmt;
use std::str::FromStr;

use log::warn;

use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectPath(String);

impl ObjectPath {
    /// The root path, `/`.
    pub fn root() -> Self {
        ObjectPath("/".to_owned())
    }

    /// Builds a path from `path`. An invalid path yields the root path
    /// instead; use [`ObjectPath::parse`] to find out about it.
    pub fn new(path: &str) -> Self {
        match Self::parse(path) {
            Ok(path) => path,
            Err(_) => {
                warn!("{:?} is not a valid object path, using /", path);
                Self::root()
            }
        }
    }

    pub fn parse(path: &str) -> Result<Self> {
        if Self::valid_path(path) {
            Ok(ObjectPath(path.to_owned()))
        } else {
            Err(Error::InvalidObjectPath(path.to_owned()))
        }
    }

    /// Appends one segment. Invalid segments are ignored.
    pub fn append(&mut self, element: &str) {
        if !Self::valid_element(element) {
            warn!("{:?} is not a valid object path element, ignoring", element);
            return;
        }
        if self.0.len() != 1 {
            self.0.push('/');
        }
        self.0.push_str(element);
    }

    /// Builder-style [`append`](ObjectPath::append).
    pub fn join(mut self, element: &str) -> Self {
        self.append(element);
        self
    }

    /// Resets to the root path.
    pub fn clear(&mut self) {
        self.0.truncate(1);
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.len() == 1
    }

    pub fn valid_element(element: &str) -> bool {
        !element.is_empty()
            && element
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_')
    }

    pub fn valid_path(path: &str) -> bool {
        if path == "/" {
            return true;
        }
        match path.strip_prefix('/') {
            Some(rest) => rest.split('/').all(Self::valid_element),
            None => false,
        }
    }
}

impl Default for ObjectPath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ObjectPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<&str> for ObjectPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}
