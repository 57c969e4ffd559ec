use std::{
    io::Read,
    path::{Path, PathBuf},
};

use serde::de::DeserializeOwned;

use crate::error::{CliError, CliResult};

/// Reads and deserializes a YAML (or JSON) document from `path`, `-` being stdin.
pub(crate) fn read_input<T: DeserializeOwned>(path: &Path) -> CliResult<T> {
    let contents = if path == Path::new("-") {
        let mut contents = String::new();
        std::io::stdin()
            .read_to_string(&mut contents)
            .map_err(|fail| CliError::ReadInput(PathBuf::from("-"), fail))?;
        contents
    } else {
        std::fs::read_to_string(path).map_err(|fail| CliError::ReadInput(path.to_owned(), fail))?
    };

    serde_yaml::from_str(&contents).map_err(|fail| CliError::ParseInput(path.to_owned(), fail))
}
