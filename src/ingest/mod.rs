// src/ingest/mod.rs
pub mod fetch;
pub mod harvest;
pub mod types;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::ingest::harvest::LinkHarvester;
use crate::ingest::types::{HarvestOutcome, ResolvedLinks, SourceEndpoint};
use crate::pace::Pacer;

/// Merge harvest outcomes in the order given. Earlier outcomes win filename
/// collisions; the order is taken literally and never re-sorted.
pub fn merge_outcomes<'a, I>(outcomes: I) -> ResolvedLinks
where
    I: IntoIterator<Item = (&'a SourceEndpoint, HarvestOutcome)>,
{
    let mut links = ResolvedLinks::new();
    for (endpoint, outcome) in outcomes {
        merge_into(&mut links, endpoint, outcome);
    }
    links
}

fn merge_into(links: &mut ResolvedLinks, endpoint: &SourceEndpoint, outcome: HarvestOutcome) {
    let mut added = 0usize;
    let mut shadowed = 0usize;
    let kind = outcome.label();
    for candidate in outcome.into_candidates() {
        if links.insert_if_absent(candidate, &endpoint.name) {
            added += 1;
        } else {
            shadowed += 1;
        }
    }
    tracing::info!(
        target: "harvest",
        source = %endpoint.name,
        outcome = kind,
        added,
        shadowed,
        total = links.len(),
        "merged source"
    );
}

/// Runs a [`LinkHarvester`] over an ordered list of endpoints.
///
/// Fetches may overlap (up to the pacer's slot count) but results are consumed
/// in list order, so the single writer below always sees higher-priority
/// sources first.
pub struct SourceAggregator {
    harvester: LinkHarvester,
    pacer: Pacer,
}

impl SourceAggregator {
    pub fn new(harvester: LinkHarvester, pacer: Pacer) -> Self {
        Self { harvester, pacer }
    }

    pub async fn aggregate(
        &self,
        endpoints: &[SourceEndpoint],
        cancel: &CancellationToken,
    ) -> ResolvedLinks {
        let mut results = stream::iter(endpoints.iter().enumerate())
            .map(|(rank, endpoint)| async move {
                if cancel.is_cancelled() {
                    return (endpoint, HarvestOutcome::Cancelled);
                }
                let outcome = self
                    .pacer
                    .run(cancel, self.harvester.harvest(endpoint, rank))
                    .await;
                (endpoint, outcome)
            })
            .buffered(self.pacer.slots());

        let mut links = ResolvedLinks::new();
        while let Some((endpoint, outcome)) = results.next().await {
            if cancel.is_cancelled() {
                tracing::warn!(target: "harvest", source = %endpoint.name, "run cancelled; stopping source loop");
                break;
            }
            merge_into(&mut links, endpoint, outcome);
        }
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::Candidate;

    fn ep(name: &str) -> SourceEndpoint {
        SourceEndpoint {
            name: name.into(),
            url: format!("https://{name}.test/list"),
        }
    }

    fn links_of(pairs: &[(&str, &str)], rank: usize) -> HarvestOutcome {
        HarvestOutcome::Links(
            pairs
                .iter()
                .map(|(f, u)| Candidate {
                    filename: f.to_string(),
                    url: u.to_string(),
                    source_rank: rank,
                })
                .collect(),
        )
    }

    #[test]
    fn earlier_source_wins_collisions() {
        let a = ep("a");
        let b = ep("b");
        let merged = merge_outcomes(vec![
            (&a, links_of(&[("MyGov May 6, 2025.pdf", "https://a.test/1.pdf")], 0)),
            (
                &b,
                links_of(
                    &[
                        ("MyGov May 6, 2025.pdf", "https://b.test/1.pdf"),
                        ("MyGov May 13, 2025.pdf", "https://b.test/2.pdf"),
                    ],
                    1,
                ),
            ),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get("MyGov May 6, 2025.pdf").unwrap().url, "https://a.test/1.pdf");
        assert_eq!(merged.get("MyGov May 13, 2025.pdf").unwrap().source, "b");
    }

    #[test]
    fn failed_and_empty_sources_contribute_nothing() {
        let a = ep("a");
        let b = ep("b");
        let c = ep("c");
        let merged = merge_outcomes(vec![
            (&a, HarvestOutcome::Failed("timeout".into())),
            (&b, HarvestOutcome::Empty),
            (&c, links_of(&[("MyGov May 6, 2025.pdf", "https://c.test/1.pdf")], 2)),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged.get("MyGov May 6, 2025.pdf").unwrap().source_rank, 2);
    }
}
