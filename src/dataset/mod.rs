//! Downloading the benchmark datasets.

pub mod fetch;

pub use crate::error::Error;
pub use fetch::*;

use humansize::{format_size, BINARY};
use std::{
    ffi::OsStr,
    fmt, fs,
    io::{self, Write},
    path::{Path, PathBuf},
    str::FromStr,
};

/// The datasets available for downloading.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Dataset {
    /// Mip-NeRF 360
    Mipnerf360,
}

/// A downloadable archive.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct DatasetSource {
    pub name: String,
    pub url: String,
    /// The directory name under the saving directory.
    pub directory: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DownloadOutcome {
    /// The archive is extracted into `directory`.
    Extracted { directory: PathBuf },
    /// The archive format is not supported, so nothing is extracted.
    Skipped { directory: PathBuf },
    /// The transfer from `url` failed.
    Aborted { url: String },
}

/// Fetching, extracting and removing the dataset archives.
#[derive(Clone, Debug)]
pub struct DatasetDownloader<F = HttpFetcher> {
    pub fetcher: F,
    pub save_dir: PathBuf,
}

impl Dataset {
    pub const ALL: [Self; 1] = [Self::Mipnerf360];

    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Mipnerf360 => "mipnerf360",
        }
    }

    pub fn source(&self) -> DatasetSource {
        match self {
            Self::Mipnerf360 => DatasetSource {
                name: self.name().into(),
                url:
                    "http://storage.googleapis.com/gresearch/refraw360/360_v2.zip"
                        .into(),
                directory: "360_v2".into(),
            },
        }
    }
}

impl DatasetSource {
    /// The last segment of the URL path.
    pub fn file_name(&self) -> Result<&str, Error> {
        let path = self.url.split(['?', '#']).next().unwrap_or_default();
        match path.rsplit('/').next() {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(Error::Validation(
                format!("URL of the dataset ({})", self.url),
                "ended with a file name".into(),
            )),
        }
    }
}

impl DatasetDownloader<HttpFetcher> {
    /// Saving to `data` under the current directory.
    pub fn new() -> Result<Self, Error> {
        Ok(Self::with_fetcher(
            HttpFetcher::new()?,
            std::env::current_dir()?.join("data"),
        ))
    }
}

impl<F: Fetch> DatasetDownloader<F> {
    pub fn with_fetcher(
        fetcher: F,
        save_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fetcher,
            save_dir: save_dir.into(),
        }
    }

    #[inline]
    pub fn download(
        &self,
        dataset: Dataset,
    ) -> Result<DownloadOutcome, Error> {
        self.download_source(&dataset.source())
    }

    /// Fetching the archive into `save_dir/<directory>`,
    /// extracting it if it is a zip archive, then removing the archive.
    ///
    /// A failed transfer is not an error, see [`DownloadOutcome::Aborted`].
    /// The local file system errors are returned.
    pub fn download_source(
        &self,
        source: &DatasetSource,
    ) -> Result<DownloadOutcome, Error> {
        let directory = self.save_dir.join(&source.directory);
        let archive_path = directory.join(source.file_name()?);

        fs::create_dir_all(&directory)?;

        log::info!(
            target: "gausplat::trainer::dataset",
            "download > {} > {} > {archive_path:?}",
            source.name,
            source.url,
        );

        let mut writer = io::BufWriter::new(fs::File::create(&archive_path)?);
        let size = match self.fetcher.fetch(&source.url, &mut writer) {
            Ok(size) => size,
            Err(error) => {
                drop(writer);
                log::error!(
                    target: "gausplat::trainer::dataset",
                    "download > {} > {error}",
                    source.url,
                );
                remove_file_if_exists(&archive_path)?;
                return Ok(DownloadOutcome::Aborted {
                    url: source.url.to_owned(),
                });
            },
        };

        writer.flush()?;
        drop(writer);

        log::info!(
            target: "gausplat::trainer::dataset",
            "download > {} > {}",
            source.name,
            format_size(size, BINARY.decimal_places(1)),
        );

        let outcome = if archive_path.extension() == Some(OsStr::new("zip")) {
            extract_zip(&archive_path, &directory).map(|_| {
                DownloadOutcome::Extracted {
                    directory: directory.to_owned(),
                }
            })
        } else {
            log::warn!(
                target: "gausplat::trainer::dataset",
                "download > unsupported archive format > {archive_path:?}",
            );
            Ok(DownloadOutcome::Skipped {
                directory: directory.to_owned(),
            })
        };

        // The archive is always removed.
        fs::remove_file(&archive_path)?;

        outcome
    }
}

fn extract_zip(
    archive_path: &Path,
    directory: &Path,
) -> Result<(), Error> {
    let file = io::BufReader::new(fs::File::open(archive_path)?);
    let mut archive = zip::ZipArchive::new(file)?;

    log::info!(
        target: "gausplat::trainer::dataset",
        "extract_zip > {} entries > {directory:?}",
        archive.len(),
    );

    Ok(archive.extract(directory)?)
}

fn remove_file_if_exists(path: &Path) -> Result<(), Error> {
    match fs::remove_file(path) {
        Err(error) if error.kind() != io::ErrorKind::NotFound => {
            Err(error.into())
        },
        _ => Ok(()),
    }
}

impl FromStr for Dataset {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|dataset| dataset.name().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| {
                Error::Validation(
                    format!("dataset name ({name})"),
                    format!(
                        "one of {:?}",
                        Self::ALL.map(|dataset| dataset.name())
                    ),
                )
            })
    }
}

impl fmt::Display for Dataset {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.name())
    }
}
