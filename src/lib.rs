pub mod cli;
pub mod engine;

use indicatif::{ProgressBar, ProgressStyle};
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub use crate::cli::{Cli, Target};
pub use crate::engine::{OcrClient, OcrError, OcrsClient};

const IMAGE_EXTENSION: &str = "png";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Runs the engine over image files and stores the text next to them.
pub struct Gocr<C> {
    client: C,
    output_dir: PathBuf,
}

impl<C: OcrClient> Gocr<C> {
    pub fn new(client: C, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            output_dir: output_dir.into(),
        }
    }

    pub fn into_client(self) -> C {
        self.client
    }

    pub fn ocr(&mut self, path: &Path) -> Result<String, OcrError> {
        log::debug!("recognizing {:?}", path);
        self.client.set_image(path);
        self.client.recognize_text()
    }

    /// `<output dir>/<file name>.txt`, the original extension included.
    pub fn output_path(&self, input: &Path) -> PathBuf {
        let mut name = input.file_name().unwrap_or_default().to_os_string();
        name.push(".txt");
        self.output_dir.join(name)
    }

    /// Recognizes one file and writes its text. Only an OCR failure is
    /// returned; a failed write is reported and swallowed.
    pub fn convert_file(&mut self, input: &Path) -> Result<()> {
        self.convert_one(input, &|msg| println!("{msg}"))
    }

    /// Converts every image directly inside `dir`, stopping at the first
    /// OCR failure.
    pub fn convert_dir(&mut self, dir: &Path) -> Result<()> {
        let files = list_images(dir);
        println!("Saving images to: {}", self.output_dir.display());
        println!("Processing {} files", files.len());

        let bar = ProgressBar::new(files.len() as u64);
        if let Ok(style) = ProgressStyle::with_template("[{elapsed}] [{bar:40}] {pos}/{len}") {
            bar.set_style(style.progress_chars("#>-"));
        }
        for file in &files {
            bar.inc(1);
            if let Err(err) = self.convert_one(file, &|msg| bar.println(msg)) {
                bar.abandon();
                return Err(err);
            }
        }
        bar.finish();
        println!();
        Ok(())
    }

    fn convert_one(&mut self, input: &Path, report: &dyn Fn(String)) -> Result<()> {
        let text = self.ocr(input)?;
        let output = self.output_path(input);
        if let Err(err) = save_text(&output, &text) {
            log::warn!("{err}");
            report(err.to_string());
        }
        Ok(())
    }
}

/// Image files directly inside `dir`, sorted by name. An unreadable
/// directory is reported and yields no files.
pub fn list_images(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            println!("{} {}", dir.display(), err);
            return Vec::new();
        }
    };
    let mut paths = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| !t.is_dir()).unwrap_or(false))
        .map(|entry| dir.join(entry.file_name()))
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(IMAGE_EXTENSION))
        .collect::<Vec<_>>();
    paths.sort();
    paths
}

/// Writes `text` to `path`, creating missing parent directories.
pub fn save_text(path: &Path, text: &str) -> Result<()> {
    let io_err = |source: std::io::Error| Error::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(io_err)?;
    }
    let mut w = BufWriter::new(
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(io_err)?,
    );
    w.write_all(text.as_bytes()).map_err(io_err)?;
    w.flush().map_err(io_err)?;
    Ok(())
}
