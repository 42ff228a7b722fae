// src/page/http.rs
// =============================================================================
// Default Renderer: fetches pages over HTTP with reqwest.
//
// Key functionality:
// - Follows redirects and reports the URL the request finally landed on
// - Returns the status code as data (a 404 is not an error here)
// - Maps transport failures (timeout, redirect loop, connect) to FetchError
//
// Pages are fetched as served; JavaScript is not executed, so sites that
// build their sidebar client-side need a browser-backed Renderer instead.
// =============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::{RenderedPage, Renderer};
use crate::error::{ConfigError, FetchError};

// Maximum number of redirects followed before giving up
const MAX_REDIRECTS: usize = 10;

#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    // Builds a renderer whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(concat!("toc-crawler/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn fetch(&self, url: &str) -> Result<RenderedPage, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| categorize_error(url, e))?;

        // response.url() is the final URL after redirects
        let landed_url = response.url().to_string();
        let status = response.status().as_u16();

        let body = response.text().await.map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Ok(RenderedPage {
            landed_url,
            status,
            body,
        })
    }
}

// Categorizes reqwest errors:
// - Network timeout
// - Redirect loop / too many redirects
// - DNS or connection failure
// - anything else
fn categorize_error(url: &str, error: reqwest::Error) -> FetchError {
    let url = url.to_string();

    if error.is_timeout() {
        FetchError::Timeout { url }
    } else if error.is_redirect() {
        FetchError::TooManyRedirects { url }
    } else if error.is_connect() {
        FetchError::Connect {
            url,
            message: error.to_string(),
        }
    } else {
        FetchError::Other {
            url,
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, MockServer};

    fn renderer() -> HttpRenderer {
        HttpRenderer::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_reports_landed_url_after_redirect() {
        let server = MockServer::start_async().await;
        let redirect = server
            .mock_async(|when, then| {
                when.method(GET).path("/docs/old");
                then.status(301).header("location", "/docs/new");
            })
            .await;
        let target = server
            .mock_async(|when, then| {
                when.method(GET).path("/docs/new");
                then.status(200).body("<html><body>new</body></html>");
            })
            .await;

        let page = renderer().fetch(&server.url("/docs/old")).await.unwrap();

        assert_eq!(page.landed_url, server.url("/docs/new"));
        assert_eq!(page.status, 200);
        assert!(page.body.contains("new"));
        redirect.assert_async().await;
        target.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_returns_404_as_data() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/docs/missing");
                then.status(404).body("not found");
            })
            .await;

        let page = renderer().fetch(&server.url("/docs/missing")).await.unwrap();

        assert_eq!(page.status, 404);
        assert_eq!(page.landed_url, server.url("/docs/missing"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_redirect_loop_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/loop");
                then.status(302).header("location", "/loop");
            })
            .await;

        let err = renderer().fetch(&server.url("/loop")).await.unwrap_err();
        assert!(matches!(err, FetchError::TooManyRedirects { .. }));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // nothing listens on port 1
        let err = renderer().fetch("http://127.0.0.1:1/docs").await.unwrap_err();
        assert!(matches!(err, FetchError::Connect { .. }));
        assert_eq!(err.url(), "http://127.0.0.1:1/docs");
    }
}
