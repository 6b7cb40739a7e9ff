pub use super::Error;

use std::{fmt, io, time::Duration};

/// Transferring the resource at a URL.
pub trait Fetch: fmt::Debug {
    /// Writing the resource at `url` to `writer`.
    ///
    /// Returns the number of bytes written.
    fn fetch(
        &self,
        url: &str,
        writer: &mut dyn io::Write,
    ) -> Result<u64, Error>;
}

/// Fetching over HTTP with a blocking client.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    pub client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, Error> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION"),
            ))
            .timeout(None::<Duration>)
            .build()?;

        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(
        &self,
        url: &str,
        writer: &mut dyn io::Write,
    ) -> Result<u64, Error> {
        let mut response = self.client.get(url).send()?.error_for_status()?;

        #[cfg(debug_assertions)]
        log::debug!(
            target: "gausplat::trainer::dataset",
            "HttpFetcher::fetch > {url} > {:?}",
            response.content_length(),
        );

        Ok(response.copy_to(writer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{DatasetDownloader, DatasetSource, DownloadOutcome};
    use std::{io::Read, net::TcpListener, thread};

    /// Answering one request with `response`, returning the URL.
    fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = vec![];
            let mut buffer = [0; 1024];
            while !request.ends_with(b"\r\n\r\n") {
                let count = stream.read(&mut buffer).unwrap();
                if count == 0 {
                    break;
                }
                request.extend_from_slice(&buffer[..count]);
            }
            io::Write::write_all(&mut stream, response.as_bytes()).unwrap();
        });

        format!("http://{address}/360_v2.zip")
    }

    const NOT_FOUND: &str = "HTTP/1.1 404 Not Found\r\n\
        Content-Length: 0\r\n\
        Connection: close\r\n\r\n";

    #[test]
    fn fetch_ok() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\n\
            Content-Length: 7\r\n\
            Connection: close\r\n\r\n\
            garden!",
        );
        let mut body = vec![];

        let size = HttpFetcher::new().unwrap().fetch(&url, &mut body).unwrap();

        assert_eq!(size, 7);
        assert_eq!(body, b"garden!");
    }

    #[test]
    fn fetch_not_found() {
        let url = serve_once(NOT_FOUND);
        let mut body = vec![];

        let result = HttpFetcher::new().unwrap().fetch(&url, &mut body);

        assert!(matches!(result, Err(Error::Http(_))), "{result:?}");
        assert!(body.is_empty());
    }

    #[test]
    fn download_not_found_then_aborted() {
        let url = serve_once(NOT_FOUND);
        let save_dir = tempfile::tempdir().unwrap();
        let downloader = DatasetDownloader::with_fetcher(
            HttpFetcher::new().unwrap(),
            save_dir.path(),
        );

        let outcome = downloader
            .download_source(&DatasetSource {
                name: "test".into(),
                url: url.to_owned(),
                directory: "360_v2".into(),
            })
            .unwrap();

        assert_eq!(outcome, DownloadOutcome::Aborted { url });
        assert!(!save_dir.path().join("360_v2").join("360_v2.zip").exists());
    }
}
