//! Tiered fuzzy matching of a query against discovered checkpoints
//!
//! Queries arrive as full relative paths, bare filenames, extensionless names
//! or fragments. Five progressively looser tiers are tried in order and the
//! first tier with any hit decides the outcome, so a loose partial match can
//! never beat an intended exact one. Within a tier candidates are ranked by
//! `(extension rank, path length, lower path, lower base directory)`.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ResolveError, ResolveResult};
use crate::extensions::ExtensionSet;
use crate::index::CandidateRecord;

/// Matching strategy, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchTier {
    ExactPath,
    ExactFilename,
    ExactStem,
    PartialFilename,
    PartialPath,
}

impl MatchTier {
    pub const ALL: [MatchTier; 5] = [
        MatchTier::ExactPath,
        MatchTier::ExactFilename,
        MatchTier::ExactStem,
        MatchTier::PartialFilename,
        MatchTier::PartialPath,
    ];

    fn accepts(self, query: &MatchQuery, candidate: &NormalizedCandidate) -> bool {
        match self {
            MatchTier::ExactPath => query.path == candidate.path,
            MatchTier::ExactFilename => query.filename == candidate.filename,
            MatchTier::ExactStem => query.stem == candidate.stem,
            MatchTier::PartialFilename => !query.filename.is_empty() && candidate.filename.contains(&query.filename),
            MatchTier::PartialPath => !query.path.is_empty() && candidate.path.contains(&query.path),
        }
    }
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchTier::ExactPath => "exact relative path",
            MatchTier::ExactFilename => "exact filename",
            MatchTier::ExactStem => "base name",
            MatchTier::PartialFilename => "partial filename",
            MatchTier::PartialPath => "partial path",
        };
        write!(f, "{}", name)
    }
}

/// When the top two ranked candidates count as tied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AmbiguityPolicy {
    /// Tied on extension rank and path length
    #[default]
    PreferenceTie,
    /// Tied on every ranking field, including the lexicographic ones
    ExactTie,
}

/// Normalized forms of a user query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchQuery {
    pub raw: String,
    pub path: String,
    pub filename: String,
    pub stem: String,
}

impl MatchQuery {
    pub fn new(raw: &str) -> Self {
        let path = normalize(raw);
        let filename = basename(&path).to_string();
        let stem = split_extension(&filename).0.to_string();
        Self {
            raw: raw.to_string(),
            path,
            filename,
            stem,
        }
    }
}

/// A successful match
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    pub record: CandidateRecord,
    pub tier: MatchTier,
}

struct NormalizedCandidate<'a> {
    record: &'a CandidateRecord,
    path: String,
    filename: String,
    stem: String,
}

impl<'a> NormalizedCandidate<'a> {
    fn new(record: &'a CandidateRecord) -> Self {
        let path = normalize(&record.relative_path);
        let filename = basename(&path).to_string();
        let stem = split_extension(&filename).0.to_string();
        Self {
            record,
            path,
            filename,
            stem,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct RankKey {
    extension_rank: usize,
    path_length: usize,
    lower_path: String,
    lower_base: String,
}

impl RankKey {
    fn new(candidate: &NormalizedCandidate<'_>, preferred: Option<&ExtensionSet>) -> Self {
        let extension_rank = match preferred {
            Some(set) => set.rank(split_extension(&candidate.filename).1),
            None => 0,
        };
        Self {
            extension_rank,
            path_length: candidate.path.chars().count(),
            lower_path: candidate.record.relative_path.to_lowercase(),
            lower_base: candidate.record.base_directory.to_string_lossy().to_lowercase(),
        }
    }

    fn tied(&self, other: &Self, policy: AmbiguityPolicy) -> bool {
        match policy {
            AmbiguityPolicy::PreferenceTie => {
                self.extension_rank == other.extension_rank && self.path_length == other.path_length
            }
            AmbiguityPolicy::ExactTie => self.cmp(other) == Ordering::Equal,
        }
    }
}

/// Resolves queries against a candidate snapshot
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    policy: AmbiguityPolicy,
}

impl Matcher {
    pub fn new(policy: AmbiguityPolicy) -> Self {
        Self { policy }
    }

    /// Find the single best candidate for `query`
    pub fn resolve(
        &self,
        query: &str,
        candidates: &[CandidateRecord],
        preferred: Option<&ExtensionSet>,
    ) -> ResolveResult<Match> {
        let query = MatchQuery::new(query);
        debug!(raw = %query.raw, path = %query.path, filename = %query.filename, stem = %query.stem, candidates = candidates.len(), "Matcher::resolve: called");

        let normalized: Vec<NormalizedCandidate<'_>> = candidates.iter().map(NormalizedCandidate::new).collect();

        for tier in MatchTier::ALL {
            let hits: Vec<&NormalizedCandidate<'_>> = normalized.iter().filter(|c| tier.accepts(&query, c)).collect();
            debug!(%tier, hits = hits.len(), "Matcher::resolve: tier attempted");

            if hits.is_empty() {
                continue;
            }
            return self.pick_best(&query, tier, hits, preferred);
        }

        debug!(raw = %query.raw, "Matcher::resolve: no match in any tier");
        Err(ResolveError::NotFound { query: query.raw })
    }

    fn pick_best(
        &self,
        query: &MatchQuery,
        tier: MatchTier,
        hits: Vec<&NormalizedCandidate<'_>>,
        preferred: Option<&ExtensionSet>,
    ) -> ResolveResult<Match> {
        let mut ranked: Vec<(RankKey, &CandidateRecord)> = hits
            .into_iter()
            .map(|c| (RankKey::new(c, preferred), c.record))
            .collect();
        ranked.sort_by(|a, b| a.0.cmp(&b.0));

        let (best_key, best) = &ranked[0];
        if ranked.len() > 1 && best_key.tied(&ranked[1].0, self.policy) {
            let candidates: Vec<CandidateRecord> = ranked
                .iter()
                .take_while(|(key, _)| best_key.tied(key, self.policy))
                .map(|(_, record)| (*record).clone())
                .collect();
            debug!(%tier, tied = candidates.len(), "Matcher::pick_best: ambiguous");
            return Err(ResolveError::Ambiguous {
                query: query.raw.clone(),
                tier,
                candidates,
            });
        }

        debug!(%tier, path = %best.relative_path, base = ?best.base_directory, "Matcher::pick_best: selected");
        Ok(Match {
            record: (*best).clone(),
            tier,
        })
    }
}

/// Lower-case and convert backslashes to forward slashes
pub fn normalize(s: &str) -> String {
    s.replace('\\', "/").to_lowercase()
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Split `name` into stem and dot-prefixed extension.
///
/// Leading dots do not start an extension: `.hidden` has none.
pub fn split_extension(name: &str) -> (&str, &str) {
    let leading = name.len() - name.trim_start_matches('.').len();
    match name[leading..].rfind('.') {
        Some(idx) => name.split_at(leading + idx),
        None => (name, ""),
    }
}
