use std::io::ErrorKind;
use std::path::PathBuf;

use crate::io::{HostError, ProgramStore};

// Program store over a directory of raw binaries.
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> DirStore {
        DirStore { root: root.into() }
    }
}

impl ProgramStore for DirStore {
    fn read_program(&self, name: &str) -> Result<Vec<u8>, HostError> {
        std::fs::read(self.root.join(name)).map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                HostError::ProgramNotFound(name.to_string())
            } else {
                HostError::Io(err)
            }
        })
    }
}
