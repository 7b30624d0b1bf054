//! HTTP fetches for the remote feeds.

use std::time::Duration;

use anyhow::{Error, Result};
use reqwest::{Client, StatusCode};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Builds the client shared by every fetch of a run.
pub fn client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?;

    Ok(client)
}

/// Downloads `url` as text. Anything but a 200 is an error.
pub async fn fetch_text(client: &Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::msg(format!("Failed to download {}: {}", url, e)))?;

    if response.status() != StatusCode::OK {
        return Err(Error::msg(format!(
            "Failed to download {}: {}",
            url,
            response.status()
        )));
    }

    let text = response
        .text()
        .await
        .map_err(|e| Error::msg(format!("Failed to read body of {}: {}", url, e)))?;

    Ok(text)
}

/// The last path segment of a URL, used for progress messages.
pub fn file_name(url: &str) -> &str {
    url.rsplit('/').find(|s| !s.is_empty()).unwrap_or(url)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use std::{
        io::{Read, Write},
        net::TcpListener,
        thread,
    };

    use super::*;

    #[test]
    fn should_build_client() {
        assert!(client(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn should_take_file_name_from_url() {
        assert_eq!(file_name("https://ir.eia.gov/ngs/wngsr.json"), "wngsr.json");
        assert_eq!(
            file_name("https://www.cpc.ncep.noaa.gov/"),
            "www.cpc.ncep.noaa.gov"
        );
    }

    #[tokio::test]
    async fn should_fail_on_non_ok_status() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf).unwrap();
            stream
                .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                .unwrap();
        });

        let client = client(Duration::from_secs(5)).unwrap();
        let url = format!("http://{}/wngsr.json", addr);
        let err = fetch_text(&client, &url).await.unwrap_err();

        assert!(err.to_string().contains("404"));
        server.join().unwrap();
    }

    #[tokio::test]
    async fn should_fail_on_unreachable_host() {
        let client = client(Duration::from_millis(500)).unwrap();
        let result = fetch_text(&client, "http://127.0.0.1:9/feed.csv").await;
        assert!(result.is_err());
    }
}
