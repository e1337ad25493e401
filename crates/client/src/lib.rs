use std::path::Path;

use anyhow::{Context, Result, bail};
use futures::TryStreamExt;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use hyper::header::AUTHORIZATION;
use hyper::{Request, StatusCode};
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tokio_util::io::ReaderStream;
use url::Url;

/// Upload `path` to the signing server and return the signing record.
///
/// The file is streamed from disk; it is never read into memory whole.
pub async fn sign_file(server: &str, key: &str, token: &str, path: &Path) -> Result<String> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("opening {}", path.display()))?;
    let body = StreamBody::new(ReaderStream::new(file).map_ok(Frame::data));

    let uri = sign_rpm_uri(server, key)?;
    let request = Request::post(uri.as_str())
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(body)
        .context("building request")?;

    let client = Client::builder(TokioExecutor::new()).build_http();
    let response = client
        .request(request)
        .await
        .with_context(|| format!("sending {uri}"))?;

    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .context("reading response")?
        .to_bytes();
    let text = String::from_utf8_lossy(&bytes).into_owned();

    if status != StatusCode::OK {
        bail!("server returned {status}: {}", text.trim_end());
    }
    Ok(text)
}

fn sign_rpm_uri(server: &str, key: &str) -> Result<Url> {
    let base = format!("{}/", server.trim_end_matches('/'));
    let mut url = Url::parse(&base)
        .and_then(|base| base.join("sign_rpm"))
        .with_context(|| format!("invalid server url {server}"))?;
    url.query_pairs_mut().append_pair("key", key);
    Ok(url)
}
