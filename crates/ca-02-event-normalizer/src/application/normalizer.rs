//! # Event Normalizer
//!
//! Turns raw `LogEntry` values into `NormalizedEvent`s. Pure apart from a
//! drop counter; failures are logged and the log is skipped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use shared_bus::{AdminEvent, NormalizedEvent};
use shared_types::abi::{decode, decode_word, encode_hex, AbiValue};
use shared_types::{AbiError, Address, Hash, LogEntry};
use tracing::{trace, warn};

use crate::domain::{
    EventDescriptor, NormalizeError, CATALOG, CREATE_COMMITTEE, MODIFY_COMMITTEE_INFO,
    REMOVE_COMMITTEE, SET_PERMISSION, TRANSFER,
};

/// Decoded parameters of one log, in declaration order.
struct Params<'a> {
    descriptor: &'static EventDescriptor,
    values: &'a [AbiValue],
}

impl Params<'_> {
    fn get(&self, name: &str) -> Result<&AbiValue, NormalizeError> {
        self.descriptor
            .position(name)
            .and_then(|i| self.values.get(i))
            .ok_or(NormalizeError::Decode {
                event: self.descriptor.name,
                source: AbiError::OutOfBounds {
                    offset: 0,
                    needed: 1,
                    available: self.values.len(),
                },
            })
    }

    fn wrap<T>(&self, result: Result<T, AbiError>) -> Result<T, NormalizeError> {
        result.map_err(|source| NormalizeError::Decode {
            event: self.descriptor.name,
            source,
        })
    }

    fn address(&self, name: &str) -> Result<Address, NormalizeError> {
        self.wrap(self.get(name)?.as_address())
    }

    fn string(&self, name: &str) -> Result<String, NormalizeError> {
        self.wrap(self.get(name)?.as_string())
    }
}

/// Stateless log decoder over the event catalog.
pub struct EventNormalizer {
    by_topic: HashMap<Hash, &'static EventDescriptor>,
    dropped: AtomicU64,
}

impl Default for EventNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl EventNormalizer {
    #[must_use]
    pub fn new() -> Self {
        let by_topic = CATALOG.iter().map(|d| (d.topic(), d)).collect();
        Self {
            by_topic,
            dropped: AtomicU64::new(0),
        }
    }

    /// Number of logs dropped so far.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Descriptor for a signature topic.
    #[must_use]
    pub fn descriptor(&self, topic: &Hash) -> Option<&'static EventDescriptor> {
        self.by_topic.get(topic).copied()
    }

    /// Normalize one log, dropping it on any failure.
    pub fn normalize(&self, log: &LogEntry) -> Option<NormalizedEvent> {
        match self.try_normalize(log) {
            Ok(event) => {
                trace!(event = event.name(), block_number = event.block_number, "Normalized log");
                Some(event)
            }
            Err(error) => {
                self.record_drop(log, &error);
                None
            }
        }
    }

    /// Count and log a rejected log.
    pub fn record_drop(&self, log: &LogEntry, error: &NormalizeError) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        warn!(
            address = %format!("{:#x}", log.address),
            block_number = ?log.block_number,
            reason = error.reason(),
            "Dropping log: {}",
            error
        );
    }

    /// Normalize one log, reporting why it was rejected.
    pub fn try_normalize(&self, log: &LogEntry) -> Result<NormalizedEvent, NormalizeError> {
        if log.removed {
            return Err(NormalizeError::Removed);
        }
        let topic0 = log.topics.first().ok_or(NormalizeError::MissingTopics)?;
        let block_number = log.block_number.ok_or(NormalizeError::MissingBlockNumber)?;

        let event = match self.descriptor(topic0) {
            Some(descriptor) => decode_event(descriptor, log)?,
            None => AdminEvent::Unknown {
                name: encode_hex(topic0.as_bytes()),
            },
        };

        Ok(NormalizedEvent {
            event,
            contract_address: log.address,
            block_number,
            log_index: log.log_index.unwrap_or_default(),
        })
    }
}

fn decode_event(
    descriptor: &'static EventDescriptor,
    log: &LogEntry,
) -> Result<AdminEvent, NormalizeError> {
    if log.topics.len() != descriptor.topic_count() {
        return Err(NormalizeError::TopicCount {
            event: descriptor.name,
            expected: descriptor.topic_count(),
            actual: log.topics.len(),
        });
    }

    let decode_err = |source| NormalizeError::Decode {
        event: descriptor.name,
        source,
    };

    let data_kinds: Vec<_> = descriptor
        .params
        .iter()
        .filter(|p| !p.indexed)
        .map(|p| p.kind)
        .collect();
    let mut data_values = decode(&data_kinds, &log.data).map_err(decode_err)?.into_iter();
    let mut topics = log.topics.iter().skip(1);

    let mut values = Vec::with_capacity(descriptor.params.len());
    for p in descriptor.params {
        let value = if p.indexed {
            let topic = topics.next().ok_or(NormalizeError::TopicCount {
                event: descriptor.name,
                expected: descriptor.topic_count(),
                actual: log.topics.len(),
            })?;
            decode_word(p.kind, topic.as_bytes()).map_err(decode_err)?
        } else {
            data_values.next().ok_or(decode_err(AbiError::OutOfBounds {
                offset: 0,
                needed: data_kinds.len(),
                available: log.data.len(),
            }))?
        };
        values.push(value);
    }

    let params = Params {
        descriptor,
        values: &values,
    };

    let event = match descriptor.name {
        name if name == CREATE_COMMITTEE.name => {
            let finance = params.address("financeAddress")?;
            AdminEvent::CreateCommittee {
                committee_address: params.address("committeeAddress")?,
                voting_address: params.address("votingAddress")?,
                finance_address: (!finance.is_zero()).then_some(finance),
                name: params.string("name")?,
                description: params.string("description")?,
            }
        }
        name if name == MODIFY_COMMITTEE_INFO.name => AdminEvent::ModifyCommitteeInfo {
            committee_address: params.address("committeeAddress")?,
            name: params.string("name")?,
            description: params.string("description")?,
        },
        name if name == REMOVE_COMMITTEE.name => AdminEvent::RemoveCommittee {
            committee_address: params.address("committeeAddress")?,
        },
        name if name == TRANSFER.name => AdminEvent::Transfer {
            from: params.address("_from")?,
            to: params.address("_to")?,
            amount: params.wrap(params.get("_amount")?.as_uint())?,
        },
        name if name == SET_PERMISSION.name => AdminEvent::SetPermission {
            entity: params.address("entity")?,
            app: params.address("app")?,
            role: params.wrap(params.get("role")?.as_bytes32())?,
            allowed: params.wrap(params.get("allowed")?.as_bool())?,
        },
        other => AdminEvent::Unknown {
            name: other.to_string(),
        },
    };
    Ok(event)
}
