use crate::error::Error;
use chrono::{NaiveDateTime, Utc};
use http::Response;
use hyper::{body::HttpBody as _, client::HttpConnector, Body, Client};
use hyper_tls::HttpsConnector;
use serde::de::DeserializeOwned;

pub type HttpClient = Client<HttpsConnector<HttpConnector>>;

pub fn make_client() -> HttpClient {
    let https = HttpsConnector::new();
    Client::builder().build::<_, Body>(https)
}

/// Drain a response body into a UTF-8 string.
pub async fn read_body(resp: &mut Response<Body>) -> Result<String, Error> {
    let mut body_bytes: Vec<u8> = vec![];
    while let Some(chunk) = resp.body_mut().data().await {
        body_bytes.extend_from_slice(&chunk?);
    }
    String::from_utf8(body_bytes)
        .map_err(|err| Error::ParamError(format!("Body is not UTF-8: {}", err)))
}

pub async fn parse_body<T>(resp: &mut Response<Body>) -> Result<T, Error>
where
    T: DeserializeOwned,
{
    let body = read_body(resp).await?;
    Ok(serde_json::from_str(&body)?)
}

/// Issue a request bounded by the configured upstream timeout.
pub async fn timed_request(
    client: &HttpClient,
    req: http::Request<Body>,
) -> Result<Response<Body>, Error> {
    let timeout = std::time::Duration::from_secs(crate::config::C.fetch.timeout_secs);
    match tokio::time::timeout(timeout, client.request(req)).await {
        Ok(resp) => Ok(resp?),
        Err(_) => Err(Error::Timeout),
    }
}

pub fn naive_now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Hours elapsed since `then` (UTC), rounded to 0.1h.
/// Upstream clocks may run ahead of ours; negative deltas clamp to 0.
pub fn hours_since(then: NaiveDateTime) -> f64 {
    let delta = naive_now() - then;
    let hours = delta.num_milliseconds() as f64 / 3_600_000.0;
    (hours.max(0.0) * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_hours_since_rounds() {
        let then = naive_now() - Duration::minutes(90);
        assert_eq!(hours_since(then), 1.5);
    }

    #[test]
    fn test_hours_since_clamps_future() {
        let then = naive_now() + Duration::hours(3);
        assert_eq!(hours_since(then), 0.0);
    }
}
