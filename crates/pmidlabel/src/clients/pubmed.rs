//! Client implementation for fetching MEDLINE records from PubMed.
//!
//! Records are requested from the NCBI E-utilities `efetch` endpoint
//! (https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi) with
//! `db=pubmed&retmode=text&rettype=medline`, which returns the record as
//! tagged plain text. Parsing that text is left to [`crate::medline`].
//!
//! # Examples
//!
//! ```no_run
//! use pmidlabel::{clients::PubMedClient, Citation, Config, Pmid};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = PubMedClient::new(&Config::default())?;
//! let pmid: Pmid = "40237684".parse()?;
//!
//! let medline = client.fetch_medline(&pmid).await?;
//! let citation = Citation::from_medline(&medline, &pmid)?;
//! println!("{} {}", citation.venue, citation.year);
//! # Ok(())
//! # }
//! ```

use url::Url;

use super::*;

/// Client for the PubMed `efetch` endpoint.
///
/// A single client is reused for every request of a run. Every request is bound
/// by the configured timeout, so an unresponsive server fails the fetch instead
/// of blocking the caller indefinitely.
#[derive(Debug, Clone)]
pub struct PubMedClient {
  /// Internal web client used to connect to the API.
  client:   reqwest::Client,
  /// The `efetch` URL requests are sent to.
  endpoint: Url,
  /// Extra query parameters identifying this tool to NCBI.
  etiquette: Vec<(&'static str, String)>,
}

impl PubMedClient {
  /// Creates a client from the endpoint, timeout and identification settings
  /// in `config`.
  ///
  /// # Errors
  ///
  /// Returns [`LabelError::InvalidUrl`] if the configured endpoint is not a URL,
  /// or [`LabelError::Network`] if the HTTP client cannot be built.
  pub fn new(config: &Config) -> Result<Self, LabelError> {
    let endpoint = Url::parse(&config.endpoint)?;
    let client = reqwest::Client::builder()
      .user_agent(config.user_agent.as_str())
      .timeout(config.timeout())
      .build()?;

    let etiquette = [("tool", &config.tool), ("email", &config.email)]
      .into_iter()
      .filter_map(|(key, value)| value.clone().map(|value| (key, value)))
      .collect();

    Ok(Self { client, endpoint, etiquette })
  }

  /// The endpoint requests are sent to.
  pub fn endpoint(&self) -> &Url { &self.endpoint }

  /// Fetches the MEDLINE text for `pmid`.
  ///
  /// # Errors
  ///
  /// Returns [`LabelError::Network`] if:
  /// - The request cannot be sent or times out
  /// - E-utilities responds with a non-success status
  /// - The body cannot be read as text
  pub async fn fetch_medline(&self, pmid: &Pmid) -> Result<String, LabelError> {
    let mut query = vec![
      ("db", "pubmed"),
      ("id", pmid.as_str()),
      ("retmode", "text"),
      ("rettype", "medline"),
    ];
    query.extend(self.etiquette.iter().map(|(key, value)| (*key, value.as_str())));

    debug!("Fetching MEDLINE record for {pmid} from {}", self.endpoint);

    let response = self.client.get(self.endpoint.clone()).query(&query).send().await?;
    let status = response.status();
    debug!("E-utilities response status: {status}");

    let text = response.error_for_status()?.text().await?;
    trace!("E-utilities response: {text}");

    Ok(text)
  }
}

#[cfg(test)]
mod tests {
  use mockito::{Matcher, Server};

  use super::*;

  const MEDLINE: &str = "\nPMID- 40237684\nDP  - 2023 Jan\nTA  - J Clin Invest\nAU  - Smith JA\n";

  fn client_for(server: &Server) -> PubMedClient {
    let config = Config { endpoint: format!("{}/efetch.fcgi", server.url()), ..Config::default() };
    PubMedClient::new(&config).unwrap()
  }

  #[traced_test]
  #[tokio::test]
  async fn test_fetch_medline() -> anyhow::Result<()> {
    let mut server = Server::new_async().await;
    let mock = server
      .mock("GET", "/efetch.fcgi")
      .match_query(Matcher::AllOf(vec![
        Matcher::UrlEncoded("db".into(), "pubmed".into()),
        Matcher::UrlEncoded("id".into(), "40237684".into()),
        Matcher::UrlEncoded("retmode".into(), "text".into()),
        Matcher::UrlEncoded("rettype".into(), "medline".into()),
        Matcher::UrlEncoded("tool".into(), "pmidlabel".into()),
      ]))
      .with_status(200)
      .with_header("content-type", "text/plain")
      .with_body(MEDLINE)
      .create_async()
      .await;

    let pmid: Pmid = "40237684".parse()?;
    let text = client_for(&server).fetch_medline(&pmid).await?;

    assert_eq!(text, MEDLINE);
    mock.assert_async().await;
    Ok(())
  }

  #[traced_test]
  #[tokio::test]
  async fn test_error_status() -> anyhow::Result<()> {
    let mut server = Server::new_async().await;
    let _mock = server
      .mock("GET", "/efetch.fcgi")
      .match_query(Matcher::Any)
      .with_status(500)
      .with_body("internal error")
      .create_async()
      .await;

    let pmid: Pmid = "40237684".parse()?;
    let err = client_for(&server).fetch_medline(&pmid).await.unwrap_err();

    match err {
      LabelError::Network(e) => assert_eq!(e.status(), Some(reqwest::StatusCode::INTERNAL_SERVER_ERROR)),
      other => panic!("expected network error, got {other:?}"),
    }
    Ok(())
  }

  #[test]
  fn test_invalid_endpoint() {
    let config = Config { endpoint: "not a url".to_string(), ..Config::default() };
    assert!(matches!(PubMedClient::new(&config), Err(LabelError::InvalidUrl(_))));
  }

  #[tokio::test]
  async fn test_hung_server_times_out() -> anyhow::Result<()> {
    // Accepts the connection, never answers.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
      if let Ok((socket, _)) = listener.accept().await {
        tokio::time::sleep(Duration::from_secs(60)).await;
        drop(socket);
      }
    });

    let config =
      Config { endpoint: format!("http://{addr}/efetch.fcgi"), timeout_secs: 1, ..Config::default() };
    let pmid: Pmid = "40237684".parse()?;

    let started = std::time::Instant::now();
    let result = PubMedClient::new(&config)?.fetch_medline(&pmid).await;

    assert!(started.elapsed() < Duration::from_secs(10));
    match result {
      Err(LabelError::Network(e)) => assert!(e.is_timeout(), "expected a timeout, got {e}"),
      other => panic!("expected network error, got {other:?}"),
    }
    Ok(())
  }

  #[tokio::test]
  async fn test_unreachable_host() -> anyhow::Result<()> {
    // Nothing listens on the discard port.
    let config = Config { endpoint: "http://127.0.0.1:9/efetch.fcgi".to_string(), ..Config::default() };
    let pmid: Pmid = "40237684".parse()?;

    let result = PubMedClient::new(&config)?.fetch_medline(&pmid).await;
    assert!(matches!(result, Err(LabelError::Network(_))));
    Ok(())
  }
}
