use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use super::{SearchReply, SearchService};
use crate::Config;

/// Online DBLP publication search.
///
/// With `format=bib1` the endpoint returns matching records as plain BibTeX
/// text and an empty body when nothing matches, which is exactly the shape
/// the resolver's degradation loop consumes.
pub struct DblpSearch {
    base_url: String,
    max_hits: u32,
    record_format: String,
}

impl DblpSearch {
    pub fn new(base_url: impl Into<String>, max_hits: u32, record_format: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            max_hits,
            record_format: record_format.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.api_base, config.max_hits, &config.record_format)
    }

    /// Build the request URL. The query arrives `+`-joined; each word is
    /// percent-encoded individually so the `+` separators survive intact.
    fn request_url(&self, query: &str) -> String {
        let encoded = query
            .split('+')
            .filter(|word| !word.is_empty())
            .map(|word| urlencoding::encode(word).into_owned())
            .collect::<Vec<_>>()
            .join("+");
        format!(
            "{}?q={}&h={}&format={}&rd=1a",
            self.base_url, encoded, self.max_hits, self.record_format
        )
    }
}

impl SearchService for DblpSearch {
    fn name(&self) -> &str {
        "DBLP"
    }

    fn search<'a>(
        &'a self,
        query: &'a str,
        client: &'a reqwest::Client,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<SearchReply, String>> + Send + 'a>> {
        let url = self.request_url(query);
        Box::pin(async move {
            let resp = client
                .get(&url)
                .timeout(timeout)
                .send()
                .await
                .map_err(|e| e.to_string())?;

            let status = resp.status().as_u16();
            let body = resp.text().await.map_err(|e| e.to_string())?;
            tracing::debug!(status, bytes = body.len(), "dblp reply");
            Ok(SearchReply { status, body })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_url_keeps_plus_separators() {
        let dblp = DblpSearch::new("https://dblp.org/search/publ/api", 5, "bib1");
        assert_eq!(
            dblp.request_url("Smith+Distributed+System"),
            "https://dblp.org/search/publ/api?q=Smith+Distributed+System&h=5&format=bib1&rd=1a"
        );
    }

    #[test]
    fn request_url_encodes_words() {
        let dblp = DblpSearch::new("https://dblp.org/search/publ/api", 5, "bib1");
        assert_eq!(
            dblp.request_url("Venue,+2020"),
            "https://dblp.org/search/publ/api?q=Venue%2C+2020&h=5&format=bib1&rd=1a"
        );
    }

    #[test]
    fn request_url_drops_empty_words() {
        let dblp = DblpSearch::new("https://dblp.org/search/publ/api", 5, "bib1");
        assert_eq!(
            dblp.request_url("a++b"),
            "https://dblp.org/search/publ/api?q=a+b&h=5&format=bib1&rd=1a"
        );
    }

    #[test]
    fn from_config_uses_configured_endpoint() {
        let config = Config {
            api_base: "http://localhost:9999/api".into(),
            max_hits: 3,
            record_format: "bib0".into(),
            ..Config::default()
        };
        let dblp = DblpSearch::from_config(&config);
        assert_eq!(
            dblp.request_url("x"),
            "http://localhost:9999/api?q=x&h=3&format=bib0&rd=1a"
        );
    }
}
