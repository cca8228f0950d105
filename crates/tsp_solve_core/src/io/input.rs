use std::{fmt, fs, io::Read};

use crate::Result;
use crate::options::SolverOptions;

/// Raw TSPLIB text for the solver, read from a file or stdin.
#[derive(Clone, Debug)]
pub struct SolverInput {
    text: String,
    source: String,
}

impl SolverInput {
    pub fn from_options(options: &SolverOptions) -> Result<Self> {
        match options.input_path() {
            Some(path) => Ok(Self {
                text: fs::read_to_string(&path)?,
                source: path.display().to_string(),
            }),
            None => {
                let mut text = String::new();
                std::io::stdin().read_to_string(&mut text)?;
                Ok(Self {
                    text,
                    source: "stdin".to_string(),
                })
            }
        }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: "memory".to_string(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for SolverInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source={} bytes={}", self.source, self.text.len())
    }
}

#[cfg(test)]
mod tests {
    use super::SolverInput;
    use crate::options::SolverOptions;

    #[test]
    fn from_text_keeps_content_verbatim() {
        let input = SolverInput::from_text("DIMENSION: 3\n");
        assert_eq!(input.text(), "DIMENSION: 3\n");
        assert_eq!(input.to_string(), "source=memory bytes=13");
    }

    #[test]
    fn from_options_reports_missing_file_as_io_error() {
        let options = SolverOptions {
            input: "definitely/not/here.tsp".to_string(),
            ..SolverOptions::default()
        };
        let err = SolverInput::from_options(&options).expect_err("missing file should fail");
        assert!(matches!(err, crate::Error::Io(_)));
    }
}
