//! Conversion of CLI errors into miette reports.

use crate::error::{BuildError, CliError};
use miette::Report;

/// Convert a [`CliError`] into a miette [`Report`].
///
/// Errors that carry diagnostic codes and help keep them.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::UserInput(e) => Report::new(e),
        CliError::Build(e) => build_error_to_miette(e),
        CliError::Config(e) => miette::miette!("Configuration error: {}", e),
        other => miette::miette!("{}", other),
    }
}

/// Convert a [`BuildError`] into a miette [`Report`].
pub fn build_error_to_miette(err: BuildError) -> Report {
    match err {
        BuildError::Optimize(slim_optimize::Error::Loader(e)) | BuildError::Load(e) => {
            Report::new(e)
        }
        BuildError::Optimize(e) => Report::new(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UserInputError;
    use std::path::PathBuf;

    #[test]
    fn test_user_input_keeps_diagnostic_code() {
        let report = cli_error_to_miette(
            UserInputError::InvalidTarget {
                value: "es3".to_string(),
                valid: "node20".to_string(),
            }
            .into(),
        );
        let code = report.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("slim::cli::invalid_target"));
    }

    #[test]
    fn test_loader_error_is_unwrapped() {
        let err: CliError = BuildError::Optimize(slim_optimize::Error::Loader(
            slim_loader::Error::EntryNotFound(PathBuf::from("src/index.ts")),
        ))
        .into();
        let report = cli_error_to_miette(err);
        let code = report.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("slim::loader::entry_not_found"));
    }
}
