//! Confidence propagation along technology relationships

use super::tech_graph::{BoostRule, TechnologyGraph};
use crate::models::detection::{clamp_confidence, TechnologyMatch};
use std::collections::BTreeMap;
use tracing::debug;

/// Run one boosting pass over `matches`.
///
/// Child confidences come from a snapshot taken before the pass, so edge
/// order does not matter and parents introduced here do not boost further.
/// Existing confidences only ever rise. A parent that was not detected is
/// added only when its boosted confidence reaches `min_confidence`.
/// Returns the number of edges that fired.
pub fn apply_boosting(
    matches: &mut BTreeMap<String, TechnologyMatch>,
    graph: &TechnologyGraph,
    min_confidence: f64,
) -> usize {
    let snapshot: Vec<(String, f64)> = matches
        .iter()
        .map(|(name, m)| (name.clone(), m.confidence))
        .collect();
    let mut introduced: BTreeMap<String, TechnologyMatch> = BTreeMap::new();
    let mut fired = 0;

    for (child, confidence) in &snapshot {
        for edge in graph.parents_of(child) {
            let target = match matches.get_mut(&edge.parent) {
                Some(existing) => existing,
                None => introduced
                    .entry(edge.parent.clone())
                    .or_insert_with(|| TechnologyMatch::new(edge.parent.clone(), 0.0)),
            };

            let (boosted, reason) = match edge.boost {
                BoostRule::Match => (
                    target.confidence.max(*confidence),
                    format!("Implied by {} ({:.2})", child, confidence),
                ),
                BoostRule::Multiplier(m) => (
                    target.confidence + confidence * m,
                    format!("Boosted by {} (+{:.2})", child, confidence * m),
                ),
            };
            let boosted = clamp_confidence(boosted).max(target.confidence);
            if boosted > target.confidence {
                debug!(child = %child, parent = %edge.parent, from = target.confidence, to = boosted, "confidence boosted");
            }
            target.confidence = boosted;
            target.add_note(reason);
            fired += 1;
        }
    }

    for (name, candidate) in introduced {
        if candidate.confidence >= min_confidence {
            matches.insert(name, candidate);
        } else {
            debug!(technology = %name, confidence = candidate.confidence, "implied technology below threshold");
        }
    }
    fired
}
