use async_trait::async_trait;
use bytes::Bytes;
use http::header;
use http_body_util::{BodyExt, Full, combinators::BoxBody};
use hyper::{Method, Request, Response, StatusCode, body::Incoming, service::service_fn};
use hyper_util::rt::{TokioExecutor, TokioIo};
use std::{
    convert::Infallible,
    io,
    net::{Ipv4Addr, SocketAddr},
    process::{Command, Stdio},
    sync::Arc,
    time::Duration,
};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::{AuthHeader, Error, Result};

/// Serves the console and keeps serving until the process is stopped.
#[async_trait]
pub trait ConsoleLauncher: Send + Sync {
    async fn launch(
        &self,
        endpoint: &str,
        auth_header: Option<&AuthHeader>,
        port: u16,
    ) -> Result<()>;
}

pub trait BrowserOpener: Send + Sync {
    fn open(&self, url: &str) -> io::Result<()>;
}

/// Opens URLs with the platform's default handler.
pub struct SystemBrowser;

impl BrowserOpener for SystemBrowser {
    fn open(&self, url: &str) -> io::Result<()> {
        let mut command = if cfg!(target_os = "macos") {
            Command::new("open")
        } else if cfg!(target_os = "windows") {
            let mut command = Command::new("cmd");
            command.args(["/C", "start", ""]);
            command
        } else {
            Command::new("xdg-open")
        };

        command
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
    }
}

// Pause after a failed accept so a full fd table does not spin the loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

const GRAPHIQL_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>GraphiQL</title>
  <link href="https://unpkg.com/graphiql@1.5.0/graphiql.min.css" rel="stylesheet" />
  <style>
    body { margin: 0; padding: 0; height: 100vh; }
    #graphiql { height: 100vh; }
  </style>
</head>
<body>
  <div id="graphiql"></div>

  <script src="https://unpkg.com/react@17.0.2/umd/react.production.min.js"></script>
  <script src="https://unpkg.com/react-dom@17.0.2/umd/react-dom.production.min.js"></script>
  <script src="https://unpkg.com/graphiql@1.5.0/graphiql.min.js"></script>
  <script>
    const endpoint = __ENDPOINT__;

    function graphQLFetcher(graphQLParams) {
      return fetch(endpoint, {
        method: 'post',
        headers: {
          'Accept': 'application/json',
          'Content-Type': 'application/json',
          __PASS_HEADER__
        },
        body: JSON.stringify(graphQLParams),
      }).then(response => response.json());
    }

    ReactDOM.render(
      React.createElement(GraphiQL, { fetcher: graphQLFetcher }),
      document.getElementById('graphiql')
    );
  </script>
</body>
</html>
"#;

/// Render the console page for `endpoint`. The pass header is spliced into
/// the fetcher's header object as-is.
pub fn render_page(endpoint: &str, auth_header: Option<&AuthHeader>) -> String {
    let endpoint_js = serde_json::to_string(endpoint).unwrap_or_else(|_| "\"\"".to_string());
    let pass_header = auth_header.map(AuthHeader::pass_header).unwrap_or_default();

    GRAPHIQL_HTML
        .replace("__ENDPOINT__", &endpoint_js)
        .replace("__PASS_HEADER__", &pass_header)
}

fn full<T: Into<Bytes>>(value: T) -> BoxBody<Bytes, hyper::Error> {
    Full::new(value.into())
        .map_err(|never| match never {})
        .boxed()
}

fn internal_server_error() -> Response<BoxBody<Bytes, hyper::Error>> {
    let mut response = Response::new(full("Internal Server Error"));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

async fn handle_request(
    req: Request<Incoming>,
    page: Arc<String>,
) -> std::result::Result<Response<BoxBody<Bytes, hyper::Error>>, Infallible> {
    debug!(method = %req.method(), path = req.uri().path(), "Console request");

    let response = match (req.method(), req.uri().path()) {
        (&Method::GET, "/") | (&Method::GET, "/graphiql") => Response::builder()
            .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
            .body(full(page.as_str().to_owned())),

        (&Method::OPTIONS, _) => Response::builder()
            .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
            .header(header::ACCESS_CONTROL_ALLOW_METHODS, "GET, OPTIONS")
            .header(header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type, Authorization")
            .body(full("")),

        _ => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(full("Not Found")),
    };

    Ok(response.unwrap_or_else(|_| internal_server_error()))
}

/// GraphiQL served over a local hyper server.
pub struct GraphiqlConsole {
    browser: Box<dyn BrowserOpener>,
}

impl GraphiqlConsole {
    pub fn new(browser: Box<dyn BrowserOpener>) -> Self {
        GraphiqlConsole { browser }
    }

    pub async fn bind(port: u16) -> Result<TcpListener> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        TcpListener::bind(addr)
            .await
            .map_err(|source| Error::Bind { port, source })
    }

    /// Accept connections forever, one task per connection. A failed accept
    /// is logged and skipped.
    pub async fn serve(listener: TcpListener, page: String) {
        let page = Arc::new(page);

        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(error = %e, "Failed to accept connection");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            };
            let io = TokioIo::new(stream);
            let page = Arc::clone(&page);

            tokio::task::spawn(async move {
                let service = service_fn(move |req| handle_request(req, Arc::clone(&page)));

                if let Err(e) = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                    .serve_connection(io, service)
                    .await
                {
                    error!(%peer, error = %e, "Error processing connection");
                }
            });
        }
    }

    fn open_browser(&self, url: &str) {
        match self.browser.open(url) {
            Ok(()) => debug!(url, "Opened browser"),
            Err(e) => {
                warn!(url, error = %e, "Could not open browser");
                println!("Visit {}", url);
            }
        }
    }
}

impl Default for GraphiqlConsole {
    fn default() -> Self {
        GraphiqlConsole::new(Box::new(SystemBrowser))
    }
}

#[async_trait]
impl ConsoleLauncher for GraphiqlConsole {
    async fn launch(
        &self,
        endpoint: &str,
        auth_header: Option<&AuthHeader>,
        port: u16,
    ) -> Result<()> {
        let listener = Self::bind(port).await?;
        let url = format!("http://localhost:{}", port);

        info!(endpoint, port, authorized = auth_header.is_some(), "GraphiQL server listening");
        println!("GraphiQL running at {}", url);
        self.open_browser(&url);

        Self::serve(listener, render_page(endpoint, auth_header)).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::time::{sleep, timeout};

    struct FailingBrowser {
        attempts: Arc<Mutex<Vec<String>>>,
    }

    impl BrowserOpener for FailingBrowser {
        fn open(&self, url: &str) -> io::Result<()> {
            self.attempts.lock().unwrap().push(url.to_string());
            Err(io::Error::new(io::ErrorKind::NotFound, "no browser"))
        }
    }

    #[test]
    fn page_embeds_endpoint_and_pass_header() {
        let header = AuthHeader::from_id_token("abc123");
        let page = render_page(
            "https://x.appsync-api.us-east-1.amazonaws.com/graphql",
            Some(&header),
        );

        assert!(page.contains(
            r#"const endpoint = "https://x.appsync-api.us-east-1.amazonaws.com/graphql";"#
        ));
        assert!(page.contains(r#""Authorization": "abc123""#));
        assert!(!page.contains("__PASS_HEADER__"));
    }

    #[test]
    fn page_without_header_has_no_authorization() {
        let page = render_page("https://x", None);
        assert!(!page.contains("Authorization"));
        assert!(!page.contains("__ENDPOINT__"));
    }

    #[test]
    fn endpoint_is_escaped_as_a_js_string() {
        let page = render_page(r#"https://x/"quoted""#, None);
        assert!(page.contains(r#"const endpoint = "https://x/\"quoted\"";"#));
    }

    #[test]
    fn browser_failure_is_not_fatal() {
        let attempts = Arc::new(Mutex::new(Vec::new()));
        let console = GraphiqlConsole::new(Box::new(FailingBrowser {
            attempts: Arc::clone(&attempts),
        }));

        console.open_browser("http://localhost:3000");

        assert_eq!(*attempts.lock().unwrap(), vec!["http://localhost:3000".to_string()]);
    }

    #[tokio::test]
    async fn launch_on_occupied_port_is_a_bind_error() {
        let occupied = GraphiqlConsole::bind(0).await.unwrap();
        let port = occupied.local_addr().unwrap().port();
        let attempts = Arc::new(Mutex::new(Vec::new()));
        let console = GraphiqlConsole::new(Box::new(FailingBrowser {
            attempts: Arc::clone(&attempts),
        }));

        let result = timeout(
            Duration::from_secs(5),
            console.launch("https://x/graphql", None, port),
        )
        .await
        .expect("launch should fail immediately");

        assert!(matches!(result, Err(Error::Bind { port: p, .. }) if p == port));
        assert!(attempts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn launch_keeps_serving_after_browser_failure() {
        let port = {
            let free = GraphiqlConsole::bind(0).await.unwrap();
            free.local_addr().unwrap().port()
        };
        let attempts = Arc::new(Mutex::new(Vec::new()));
        let console = GraphiqlConsole::new(Box::new(FailingBrowser {
            attempts: Arc::clone(&attempts),
        }));
        let header = AuthHeader::from_id_token("abc123");

        let fetch_page = async {
            let url = format!("http://127.0.0.1:{}/graphiql", port);
            for _ in 0..50 {
                if let Ok(response) = reqwest::get(&url).await {
                    return response;
                }
                sleep(Duration::from_millis(20)).await;
            }
            panic!("console never answered on port {}", port);
        };

        let response = tokio::select! {
            result = console.launch("https://x/graphql", Some(&header), port) => {
                panic!("console stopped serving: {:?}", result)
            }
            response = fetch_page => response,
        };

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert!(response.text().await.unwrap().contains(r#""Authorization": "abc123""#));
        assert_eq!(
            *attempts.lock().unwrap(),
            vec![format!("http://localhost:{}", port)]
        );
    }

    #[tokio::test]
    async fn serve_outlives_dropped_connections() {
        let listener = GraphiqlConsole::bind(0).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(GraphiqlConsole::serve(listener, render_page("https://x", None)));

        for _ in 0..5 {
            drop(tokio::net::TcpStream::connect(addr).await.unwrap());
        }

        let response = reqwest::get(format!("http://{}/", addr)).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert!(!server.is_finished());
        server.abort();
    }
}
