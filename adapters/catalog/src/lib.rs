#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Participant catalog loaded from the extracted spreadsheet data.
//!
//! The catalog is a JSON object of groups. Each group lists its workers and,
//! for every worker, how many of each prize their tickets reveal:
//!
//! ```json
//! {
//!   "1": {
//!     "name": "Kowloon East",
//!     "workers": [
//!       { "name": "Wong Kam Wing", "employeeId": "EMP001001",
//!         "prizeCounts": { "$20": 3, "$100 Cash Prize": 1 } }
//!     ]
//!   }
//! }
//! ```
//!
//! Participants are keyed `<group>-<worker>` with all whitespace removed.

use std::{
    collections::BTreeMap,
    fmt, fs,
    path::{Path, PathBuf},
};

use lucky_draw_core::{OutcomeList, OutcomeSource, ParticipantId, PrizeAmount, Selection};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while loading or querying the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("failed to read catalog {path}")]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The catalog is not valid JSON of the expected shape, or uses an unknown prize label.
    #[error("catalog is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    /// Two workers normalise to the same participant key.
    #[error("participant {0} appears more than once")]
    DuplicateParticipant(ParticipantId),
    /// No participant matches the query.
    #[error("no participant matches '{0}'")]
    UnknownParticipant(String),
    /// More than one participant matches the query.
    #[error("'{query}' matches several participants: {}", join_ids(.candidates))]
    AmbiguousParticipant {
        /// Query as provided.
        query: String,
        /// Every participant matching the query.
        candidates: Vec<ParticipantId>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Label {
    Text(String),
    Number(u64),
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => write!(f, "{number}"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawGroup {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    district: Option<String>,
    #[serde(default)]
    id: Option<Label>,
    #[serde(default)]
    workers: Vec<RawWorker>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawWorker {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    employee_id: Option<Label>,
    #[serde(default)]
    tickets: Option<u32>,
    #[serde(default)]
    prize_counts: Option<BTreeMap<PrizeAmount, u32>>,
}

/// One participant of the catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Participant {
    id: ParticipantId,
    display_name: String,
    group: String,
    ticket_count: u32,
    prize_counts: Option<BTreeMap<PrizeAmount, u32>>,
}

impl Participant {
    /// Normalised `<group>-<worker>` key.
    #[must_use]
    pub fn id(&self) -> &ParticipantId {
        &self.id
    }

    /// Name shown to the operator.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Group the participant belongs to.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Number of tickets held.
    #[must_use]
    pub const fn ticket_count(&self) -> u32 {
        self.ticket_count
    }

    /// Pre-computed outcomes in ascending prize order.
    ///
    /// `None` when the catalog only lists a ticket count for the participant.
    #[must_use]
    pub fn outcome_list(&self) -> Option<OutcomeList> {
        let counts = self.prize_counts.as_ref()?;
        Some(
            counts
                .iter()
                .flat_map(|(prize, count)| {
                    std::iter::repeat(*prize).take(usize::try_from(*count).unwrap_or(0))
                })
                .collect(),
        )
    }

    /// Selection record handed to the session controller.
    #[must_use]
    pub fn selection(&self) -> Selection {
        Selection {
            participant: self.id.clone(),
            ticket_count: self.ticket_count,
        }
    }
}

/// Read-only participant catalog.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    participants: BTreeMap<ParticipantId, Participant>,
}

impl Catalog {
    /// Reads and parses the catalog file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json(&contents)?;
        debug!(path = %path.display(), participants = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    /// Parses a catalog from its JSON text.
    pub fn from_json(contents: &str) -> Result<Self, CatalogError> {
        let groups: BTreeMap<String, RawGroup> = serde_json::from_str(contents)?;
        let mut participants = BTreeMap::new();

        for (group_key, group) in groups {
            let group_label = group
                .name
                .clone()
                .or_else(|| group.district.clone())
                .or_else(|| group.id.as_ref().map(Label::to_string))
                .unwrap_or(group_key);

            for worker in group.workers {
                let worker_label = worker
                    .name
                    .clone()
                    .or_else(|| worker.employee_id.as_ref().map(Label::to_string))
                    .unwrap_or_default();
                let id = ParticipantId::new(format!(
                    "{}-{}",
                    normalise(&group_label),
                    normalise(&worker_label)
                ));

                let ticket_count = match &worker.prize_counts {
                    Some(counts) => counts.values().copied().fold(0u32, u32::saturating_add),
                    None => worker.tickets.unwrap_or(0),
                };
                if let (Some(listed), Some(_)) = (worker.tickets, &worker.prize_counts) {
                    if listed != ticket_count {
                        warn!(%id, listed, ticket_count, "ticket count differs from prize counts");
                    }
                }

                let participant = Participant {
                    id: id.clone(),
                    display_name: if worker_label.is_empty() {
                        "Unknown".to_owned()
                    } else {
                        worker_label
                    },
                    group: group_label.clone(),
                    ticket_count,
                    prize_counts: worker.prize_counts,
                };
                if participants.insert(id.clone(), participant).is_some() {
                    return Err(CatalogError::DuplicateParticipant(id));
                }
            }
        }

        Ok(Self { participants })
    }

    /// Number of participants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Reports whether the catalog has no participants.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Participants ordered by key.
    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    /// Participant with exactly the provided key.
    #[must_use]
    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.get(id)
    }

    /// Finds a participant by key, falling back to a unique worker-name match.
    ///
    /// The query is normalised like catalog keys. When no key matches exactly,
    /// the part after the first `-` (or the whole query) must match the worker
    /// part of exactly one key.
    pub fn find(&self, query: &str) -> Result<&Participant, CatalogError> {
        let normalised = normalise(query);
        if let Some(participant) = self.participants.get(&ParticipantId::new(normalised.clone())) {
            return Ok(participant);
        }

        let worker = normalised
            .split_once('-')
            .map_or(normalised.as_str(), |(_, worker)| worker);
        let suffix = format!("-{worker}");
        let matches: Vec<&Participant> = self
            .participants
            .values()
            .filter(|participant| participant.id.as_str().ends_with(&suffix))
            .collect();

        match matches.as_slice() {
            [] => Err(CatalogError::UnknownParticipant(query.to_owned())),
            [single] => Ok(single),
            many => Err(CatalogError::AmbiguousParticipant {
                query: query.to_owned(),
                candidates: many.iter().map(|participant| participant.id.clone()).collect(),
            }),
        }
    }
}

impl OutcomeSource for Catalog {
    fn outcome_list(&self, participant: &ParticipantId) -> Option<OutcomeList> {
        self.participants.get(participant)?.outcome_list()
    }
}

fn join_ids(ids: &[ParticipantId]) -> String {
    ids.iter()
        .map(ParticipantId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn normalise(value: &str) -> String {
    value.split_whitespace().collect()
}
