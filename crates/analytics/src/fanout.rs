//! Concurrent fetch over independent sources with partial-failure tolerance.

use futures::future::join_all;
use outreach_backend::BackendResult;
use serde::Serialize;
use std::future::Future;
use tracing::warn;

/// The result of fetching one named source.
#[derive(Debug)]
pub struct SourceOutcome<T> {
    pub source: String,
    pub result: BackendResult<Vec<T>>,
}

/// A source that could not be fetched, as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFailure {
    pub source: String,
    pub error: String,
}

#[derive(Debug)]
pub struct FanIn<T> {
    /// Rows of every successful source, concatenated in source order.
    pub rows: Vec<T>,
    pub failures: Vec<SourceFailure>,
}

impl<T> FanIn<T> {
    pub fn all_failed(&self, sources: usize) -> bool {
        sources > 0 && self.failures.len() == sources
    }
}

/// Run one fetch per source concurrently and keep the order of `sources`.
pub async fn fan_out<S, F, Fut, T>(sources: S, fetch: F) -> Vec<SourceOutcome<T>>
where
    S: IntoIterator,
    S::Item: AsRef<str>,
    F: Fn(String) -> Fut,
    Fut: Future<Output = BackendResult<Vec<T>>>,
{
    let names: Vec<String> = sources.into_iter().map(|s| s.as_ref().to_string()).collect();
    let results = join_all(names.iter().cloned().map(&fetch)).await;
    names
        .into_iter()
        .zip(results)
        .map(|(source, result)| SourceOutcome { source, result })
        .collect()
}

/// Split outcomes into concatenated rows and logged failures.
pub fn fan_in<T>(outcomes: Vec<SourceOutcome<T>>) -> FanIn<T> {
    let mut rows = Vec::new();
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome.result {
            Ok(batch) => rows.extend(batch),
            Err(e) => {
                warn!(
                    source = %outcome.source,
                    error = %e,
                    "Source fetch failed, continuing without it"
                );
                metrics::counter!("backend.partial_failures", "source" => outcome.source.clone())
                    .increment(1);
                failures.push(SourceFailure {
                    error: e.public_message(),
                    source: outcome.source,
                });
            }
        }
    }
    FanIn { rows, failures }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outreach_backend::BackendError;

    #[tokio::test]
    async fn test_partial_failure_keeps_successes_in_order() {
        let outcomes = fan_out(["instantly", "smartlead", "lemlist"], |name| async move {
            match name.as_str() {
                "smartlead" => Err(BackendError::Unavailable("smartlead".to_string())),
                other => Ok(vec![format!("{other}-1"), format!("{other}-2")]),
            }
        })
        .await;
        assert_eq!(outcomes.len(), 3);

        let merged = fan_in(outcomes);
        assert_eq!(
            merged.rows,
            vec!["instantly-1", "instantly-2", "lemlist-1", "lemlist-2"]
        );
        assert_eq!(merged.failures.len(), 1);
        assert_eq!(merged.failures[0].source, "smartlead");
        assert!(!merged.all_failed(3));
    }

    #[tokio::test]
    async fn test_all_failed() {
        let merged = fan_in(
            fan_out(["a", "b"], |name| async move {
                Err::<Vec<u8>, _>(BackendError::Unavailable(name))
            })
            .await,
        );
        assert!(merged.rows.is_empty());
        assert!(merged.all_failed(2));
    }
}
