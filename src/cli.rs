use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

const DEFAULT_OUTPUT: &str = "output";

/// Convert png images to text files with OCR.
#[derive(Parser, Debug)]
#[command(
    name = "gocr",
    version,
    args_conflicts_with_subcommands = true,
    subcommand_negates_reqs = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Single png file to be converted
    #[arg(value_name = "FILE", required = true)]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub opts: Opts,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert every png file in a directory
    Convert {
        /// Directory containing the png files to be converted
        #[arg(value_name = "DIRECTORY")]
        directory: PathBuf,

        #[command(flatten)]
        opts: Opts,
    },
}

#[derive(Args, Debug, Default, Clone)]
pub struct Opts {
    /// Target directory for results
    #[arg(long, value_name = "TARGET")]
    pub target: Option<PathBuf>,

    /// Directory holding the ocr detection and recognition models
    #[arg(long, value_name = "DIR")]
    pub models: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Convert(PathBuf),
    File(PathBuf),
}

impl Cli {
    pub fn target(&self) -> Target {
        match (&self.command, &self.file) {
            (Some(Command::Convert { directory, .. }), _) => {
                Target::Convert(trim_separators(directory))
            }
            (None, Some(file)) => Target::File(file.clone()),
            (None, None) => Target::File(PathBuf::new()),
        }
    }

    pub fn opts(&self) -> &Opts {
        match &self.command {
            Some(Command::Convert { opts, .. }) => opts,
            None => &self.opts,
        }
    }

    /// Where the text files go: `--target` unless it is empty or `.`,
    /// otherwise `output` under the converted directory.
    pub fn output_dir(&self) -> PathBuf {
        match &self.opts().target {
            Some(target) if !target.as_os_str().is_empty() && target != Path::new(".") => {
                target.clone()
            }
            _ => match self.target() {
                Target::Convert(directory) => directory.join(DEFAULT_OUTPUT),
                Target::File(_) => PathBuf::from(DEFAULT_OUTPUT),
            },
        }
    }
}

fn trim_separators(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    let trimmed = s.trim_end_matches(MAIN_SEPARATOR);
    if trimmed.is_empty() {
        // keep the root
        path.to_path_buf()
    } else {
        PathBuf::from(trimmed)
    }
}

/// Whether the engine is expected to handle `file`.
pub fn is_supported(file: &Path) -> bool {
    file.to_string_lossy().ends_with(".png")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("gocr").chain(args.iter().copied()))
    }

    #[test]
    fn test_convert() -> anyhow::Result<()> {
        let cli = parse(&["convert", "scans/"])?;
        assert_eq!(cli.target(), Target::Convert(PathBuf::from("scans")));
        assert_eq!(cli.output_dir(), PathBuf::from("scans").join("output"));
        Ok(())
    }

    #[test]
    fn test_convert_target() -> anyhow::Result<()> {
        let cli = parse(&["convert", "scans", "--target=/custom/out"])?;
        assert_eq!(cli.output_dir(), PathBuf::from("/custom/out"));
        Ok(())
    }

    #[test]
    fn test_dot_target_is_ignored() -> anyhow::Result<()> {
        let cli = parse(&["convert", "scans", "--target=."])?;
        assert_eq!(cli.output_dir(), PathBuf::from("scans").join("output"));
        Ok(())
    }

    #[test]
    fn test_single_file() -> anyhow::Result<()> {
        let cli = parse(&["scan1.png", "--target", "out"])?;
        assert_eq!(cli.target(), Target::File(PathBuf::from("scan1.png")));
        assert_eq!(cli.output_dir(), PathBuf::from("out"));

        let cli = parse(&["scan1.png"])?;
        assert_eq!(cli.output_dir(), PathBuf::from("output"));
        Ok(())
    }

    #[test]
    fn test_models() -> anyhow::Result<()> {
        let cli = parse(&["convert", "scans", "--models", "m"])?;
        assert_eq!(cli.opts().models, Some(PathBuf::from("m")));
        Ok(())
    }

    #[test]
    fn test_help() {
        for flag in ["-h", "--help"] {
            let err = parse(&[flag]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
            assert_eq!(err.exit_code(), 0);
        }
    }

    #[test]
    fn test_invalid() {
        let err = parse(&[]).unwrap_err();
        assert_ne!(err.exit_code(), 0);

        let err = parse(&["convert"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let err = parse(&["scan1.png", "--bogus"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
        assert_ne!(err.exit_code(), 0);
    }

    #[test]
    fn test_is_supported() {
        assert!(is_supported(Path::new("a/scan1.png")));
        assert!(!is_supported(Path::new("scan1.jpg")));
        assert!(!is_supported(Path::new("scan1.PNG")));
    }
}
