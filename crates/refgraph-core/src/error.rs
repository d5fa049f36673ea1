use std::fmt;

/// Machine-readable error codes surfaced by the CLI and by domain errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InputNotFound,
    ConfigParseError,
    RootNotFound,
    RootAmbiguous,
    BuildLogUnreadable,
    ExportDatabaseFailed,
    RenderFailed,
    OutputWriteFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InputNotFound => "E1001",
            Self::ConfigParseError => "E1002",
            Self::RootNotFound => "E2001",
            Self::RootAmbiguous => "E2002",
            Self::BuildLogUnreadable => "E3001",
            Self::ExportDatabaseFailed => "E4001",
            Self::RenderFailed => "E5001",
            Self::OutputWriteFailed => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InputNotFound => "Solution or project directory not found",
            Self::ConfigParseError => "Config file parse error",
            Self::RootNotFound => "Root project not found",
            Self::RootAmbiguous => "Root project name is ambiguous",
            Self::BuildLogUnreadable => "Build log could not be read",
            Self::ExportDatabaseFailed => "Dependency export database failed",
            Self::RenderFailed => "Graph rendering failed",
            Self::OutputWriteFailed => "Output file write failed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InputNotFound => {
                Some("Pass an existing .sln, .slnf or a directory containing .vcxproj files.")
            }
            Self::ConfigParseError => Some("Fix syntax in refgraph.toml and retry."),
            Self::RootNotFound => Some("Run `refgraph stats` or `refgraph query` to list project names."),
            Self::RootAmbiguous => Some("Use a longer part of the project path to disambiguate."),
            Self::BuildLogUnreadable => {
                Some("Enable build timing output (Detailed summary) and save the log as text.")
            }
            Self::ExportDatabaseFailed => Some("Check the database path and write permissions."),
            Self::RenderFailed => Some("Check that Graphviz `dot` is installed or unset render.dot_command."),
            Self::OutputWriteFailed => Some("Check disk space and write permissions."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;
    use std::collections::HashSet;

    const ALL: [ErrorCode; 9] = [
        ErrorCode::InputNotFound,
        ErrorCode::ConfigParseError,
        ErrorCode::RootNotFound,
        ErrorCode::RootAmbiguous,
        ErrorCode::BuildLogUnreadable,
        ErrorCode::ExportDatabaseFailed,
        ErrorCode::RenderFailed,
        ErrorCode::OutputWriteFailed,
        ErrorCode::InternalUnexpected,
    ];

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        for code in ALL {
            let text = code.code();
            assert_eq!(text.len(), 5);
            assert!(text.starts_with('E'));
            assert!(text.chars().skip(1).all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn display_matches_code() {
        assert_eq!(ErrorCode::RootAmbiguous.to_string(), "E2002");
    }
}
