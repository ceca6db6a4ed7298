//! Query degradation loop for bibliography resolution.
//!
//! A query built from a full citation is precise but brittle against layout
//! extraction noise (spacing, punctuation). The resolver therefore degrades
//! length-first, then breadth: the full key list, the list minus its least
//! specific key, then word-level narrowing of whatever remains, until the
//! endpoint answers or the token floor is reached.

use std::time::Duration;

use crate::search::{SearchReply, SearchService};
use crate::{BibResult, Config};

/// Join keys with `+`, collapsing internal whitespace inside each key.
fn build_query(keys: &[String]) -> String {
    keys.iter()
        .map(|key| key.split_whitespace().collect::<Vec<_>>().join("+"))
        .collect::<Vec<_>>()
        .join("+")
}

/// Issue one query, retrying immediately on a non-200 reply or transport
/// failure. Returns the final reply (possibly still non-200) or the final
/// transport error once `max_retries` is exhausted.
async fn issue(
    service: &dyn SearchService,
    client: &reqwest::Client,
    query: &str,
    config: &Config,
) -> Result<SearchReply, String> {
    let timeout = Duration::from_secs(config.http_timeout_secs);
    let mut attempt = 0u32;
    loop {
        match service.search(query, client, timeout).await {
            Ok(reply) if reply.status == 200 => return Ok(reply),
            Ok(reply) => {
                if attempt >= config.max_retries {
                    tracing::debug!(
                        service = service.name(),
                        status = reply.status,
                        "giving up on step after retries"
                    );
                    return Ok(reply);
                }
                tracing::debug!(
                    service = service.name(),
                    status = reply.status,
                    attempt,
                    "retrying non-200 reply"
                );
            }
            Err(err) => {
                if attempt >= config.max_retries {
                    return Err(err);
                }
                tracing::debug!(
                    service = service.name(),
                    error = %err,
                    attempt,
                    "retrying failed request"
                );
            }
        }
        attempt += 1;
    }
}

/// Resolve one citation's key list to a [`BibResult`].
///
/// Only a 200 reply with a non-empty body counts as a hit; a 200 empty body
/// narrows further. A step that exhausts its retries on a non-200 reply is
/// treated as empty and narrowing continues; if the token floor is then
/// reached while the most recent reply was non-200, the result is the
/// server-error sentinel carrying that status.
pub async fn resolve(
    service: &dyn SearchService,
    client: &reqwest::Client,
    keys: &[String],
    config: &Config,
) -> BibResult {
    let mut keys = keys.to_vec();
    if keys.is_empty() {
        return BibResult::NotFound;
    }

    // Most recent final reply status; None after a transport failure.
    let mut last_status: Option<u16> = None;

    // Pass 1: the full key list.
    match issue(service, client, &build_query(&keys), config).await {
        Ok(reply) => {
            if reply.status == 200 && !reply.body.is_empty() {
                return BibResult::Found(reply.body);
            }
            last_status = Some(reply.status);
        }
        Err(err) => {
            tracing::warn!(service = service.name(), error = %err, "full query failed");
        }
    }

    // Pass 2: drop the least specific key (the venue/year tail).
    keys.pop();
    let query = build_query(&keys);
    if !query.is_empty() {
        match issue(service, client, &query, config).await {
            Ok(reply) => {
                if reply.status == 200 && !reply.body.is_empty() {
                    return BibResult::Found(reply.body);
                }
                last_status = Some(reply.status);
            }
            Err(err) => {
                last_status = None;
                tracing::warn!(service = service.name(), error = %err, "query failed");
            }
        }
    }

    // Word-level narrowing of whatever remains.
    let mut words: Vec<&str> = query.split('+').filter(|word| !word.is_empty()).collect();
    loop {
        if words.len() < config.min_query_tokens {
            return match last_status {
                Some(status) if status != 200 => BibResult::ServerError(status),
                _ => BibResult::NotFound,
            };
        }
        let chunk = (words.len() / config.narrow_divisor.max(1)).max(1);
        words.truncate(words.len() - chunk);
        tracing::debug!(
            service = service.name(),
            remaining = words.len(),
            "narrowing query"
        );
        match issue(service, client, &words.join("+"), config).await {
            Ok(reply) => {
                if reply.status == 200 && !reply.body.is_empty() {
                    return BibResult::Found(reply.body);
                }
                last_status = Some(reply.status);
            }
            Err(err) => {
                last_status = None;
                tracing::warn!(service = service.name(), error = %err, "query failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::mock::{MockReply, MockSearch};

    fn keys(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn config() -> Config {
        Config {
            max_retries: 0,
            ..Config::default()
        }
    }

    async fn run(mock: &MockSearch, keys: &[String], config: &Config) -> BibResult {
        let client = reqwest::Client::new();
        resolve(mock, &client, keys, config).await
    }

    #[tokio::test]
    async fn full_query_hit_issues_one_call() {
        let mock = MockSearch::new(MockReply::Hit("@inproceedings{x}".into()));
        let keys = keys(&["Smith", "A Distributed System", "OSDI 2020"]);

        let result = run(&mock, &keys, &config()).await;

        assert_eq!(result, BibResult::Found("@inproceedings{x}".into()));
        assert_eq!(mock.call_count(), 1);
        assert_eq!(
            mock.queries(),
            vec!["Smith+A+Distributed+System+OSDI+2020"]
        );
    }

    #[tokio::test]
    async fn second_pass_drops_last_key() {
        let mock = MockSearch::with_sequence(vec![
            MockReply::Miss,
            MockReply::Hit("@article{y}".into()),
        ]);
        let keys = keys(&["Smith", "A Distributed System", "OSDI 2020"]);

        let result = run(&mock, &keys, &config()).await;

        assert_eq!(result, BibResult::Found("@article{y}".into()));
        assert_eq!(mock.call_count(), 2);
        assert_eq!(mock.queries()[1], "Smith+A+Distributed+System");
    }

    #[tokio::test]
    async fn narrowing_step_finds_record_in_three_calls() {
        let mock = MockSearch::with_sequence(vec![
            MockReply::Miss,
            MockReply::Miss,
            MockReply::Hit("@inproceedings{z}".into()),
        ]);
        let keys = keys(&["Smith", "A Distributed System", "OSDI 2020"]);

        let result = run(&mock, &keys, &config()).await;

        assert_eq!(result, BibResult::Found("@inproceedings{z}".into()));
        assert_eq!(mock.call_count(), 3);
        assert_eq!(mock.queries()[2], "Smith+A+Distributed");
    }

    #[tokio::test]
    async fn token_floor_terminates_with_not_found() {
        let mock = MockSearch::new(MockReply::Miss);
        let keys = keys(&["Smith", "A Distributed System", "OSDI 2020"]);

        let result = run(&mock, &keys, &config()).await;

        assert_eq!(result, BibResult::NotFound);
        // Full, minus-one, and one narrowing step; then the floor stops the loop.
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn single_key_never_enters_narrowing() {
        let mock = MockSearch::new(MockReply::Miss);
        let keys = keys(&["Only Title Here"]);

        let result = run(&mock, &keys, &config()).await;

        assert_eq!(result, BibResult::NotFound);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn empty_key_list_is_not_found_without_calls() {
        let mock = MockSearch::new(MockReply::Hit("unused".into()));

        let result = run(&mock, &[], &config()).await;

        assert_eq!(result, BibResult::NotFound);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn non_200_is_retried_up_to_bound() {
        let mock = MockSearch::new(MockReply::Status(500));
        let config = Config {
            max_retries: 2,
            ..Config::default()
        };
        let keys = keys(&["aa", "bb", "cc", "dd", "ee"]);

        let result = run(&mock, &keys, &config).await;

        assert_eq!(result, BibResult::ServerError(500));
        // Three steps (full, minus-one, one narrowing), each 1 + 2 retries.
        assert_eq!(mock.call_count(), 9);
    }

    #[tokio::test]
    async fn server_error_sentinel_only_at_floor() {
        let mock = MockSearch::with_sequence(vec![
            MockReply::Status(500),
            MockReply::Miss,
            MockReply::Hit("@misc{w}".into()),
        ]);
        let keys = keys(&["aa", "bb", "cc", "dd", "ee"]);

        let result = run(&mock, &keys, &config()).await;

        // The failed step is treated as empty; narrowing continues and hits.
        assert_eq!(result, BibResult::Found("@misc{w}".into()));
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn later_empty_reply_clears_server_error() {
        let mock = MockSearch::with_sequence(vec![
            MockReply::Status(503),
            MockReply::Miss,
            MockReply::Miss,
        ]);
        let keys = keys(&["aa", "bb", "cc", "dd", "ee"]);

        let result = run(&mock, &keys, &config()).await;

        // The most recent reply before the floor was a clean 200.
        assert_eq!(result, BibResult::NotFound);
    }

    #[tokio::test]
    async fn transport_failure_never_becomes_server_error() {
        let mock = MockSearch::new(MockReply::Transport("connection refused".into()));
        let keys = keys(&["aa", "bb", "cc", "dd", "ee"]);

        let result = run(&mock, &keys, &config()).await;

        assert_eq!(result, BibResult::NotFound);
    }

    #[tokio::test]
    async fn narrowing_shrinks_queries_monotonically() {
        let mock = MockSearch::new(MockReply::Miss);
        let keys: Vec<String> = (0..30).map(|i| format!("w{i}")).collect();

        let result = run(&mock, &keys, &config()).await;

        assert_eq!(result, BibResult::NotFound);
        let queries = mock.queries();
        let mut lengths: Vec<usize> = queries
            .iter()
            .map(|q| q.split('+').count())
            .collect();
        // Skip the full pass; from minus-one onward lengths strictly decrease.
        lengths.remove(0);
        assert!(lengths.windows(2).all(|w| w[1] < w[0]), "{lengths:?}");
        // The last issued query is still at or just below the floor.
        assert!(*lengths.last().unwrap() >= 3);
    }
}
