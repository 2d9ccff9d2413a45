//! Append-only registry of tracked markets and farms.
//!
//! Each partition mirrors one remote list. Discovery only reads the indices
//! past the locally known length, so an entity's static record is fetched
//! exactly once for the lifetime of the process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use futures::future::try_join_all;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    error::Error,
    helpers::is_zero_address,
    model::{Entity, Listing, PartitionId},
    provider::{ChainSource, RawValue},
};

/// One remote list. `known` counts every index read so far, `entities` holds
/// one record per distinct address.
#[derive(Debug, Default)]
pub struct Partition {
    known: usize,
    entities: Vec<Entity>,
    by_address: HashMap<String, usize>,
}

impl Partition {
    pub fn known_length(&self) -> usize {
        self.known
    }

    pub fn get(&self, address: &str) -> Option<&Entity> {
        self.by_address
            .get(address)
            .and_then(|index| self.entities.get(*index))
    }

    fn push(&mut self, entity: Entity) {
        self.known += 1;
        if self.by_address.contains_key(&entity.address) {
            warn!(
                "address {} listed again at index {}, keeping the first pid",
                entity.address, entity.pid
            );
            return;
        }
        self.by_address
            .insert(entity.address.clone(), self.entities.len());
        self.entities.push(entity);
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    partitions: StdMutex<HashMap<PartitionId, Arc<Mutex<Partition>>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn partition(&self, id: PartitionId) -> Arc<Mutex<Partition>> {
        let mut partitions = match self.partitions.lock() {
            Ok(partitions) => partitions,
            Err(poisoned) => poisoned.into_inner(),
        };
        partitions.entry(id).or_default().clone()
    }

    /// Brings a partition up to the remote length and returns how many
    /// entities were added.
    ///
    /// When nothing is new this costs a single length read. A failed record
    /// fetch adds nothing, so the known length only ever moves forward over
    /// fully fetched entries.
    pub async fn discover(
        &self,
        id: PartitionId,
        listing: &Listing,
        source: &dyn ChainSource,
    ) -> Result<usize, Error> {
        let partition = self.partition(id);
        let mut partition = partition.lock().await;
        let known = partition.known_length();

        let fresh = match listing {
            Listing::Array { contract, method } => {
                let list = source
                    .call_contract(contract, method, &[])
                    .await?
                    .list(method)?;
                Self::check_length(id, known, list.len());
                list.iter()
                    .enumerate()
                    .skip(known)
                    .map(|(pid, raw)| {
                        Ok(Entity {
                            address: raw.address(method)?,
                            pid,
                            rewarder: None,
                        })
                    })
                    .collect::<Result<Vec<Entity>, Error>>()?
            },
            Listing::Indexed {
                contract,
                length_method,
                item_method,
            } => {
                let remote = source
                    .call_contract(contract, length_method, &[])
                    .await?
                    .integer(length_method)?;
                let remote = usize::try_from(remote).map_err(|_| {
                    Error::UnexpectedValue {
                        field: (*length_method).to_owned(),
                        value: remote.to_string(),
                    }
                })?;
                Self::check_length(id, known, remote);

                let records = (known..remote).map(|pid| async move {
                    let raw = source
                        .call_contract(contract, item_method, &[json!(pid)])
                        .await?;
                    Self::decode_record(&raw, pid)
                });
                try_join_all(records).await?
            },
        };

        let added = fresh.len();
        for entity in fresh {
            partition.push(entity);
        }

        if added > 0 {
            info!(
                "{}: discovered {} new entities, known length {}",
                id,
                added,
                partition.known_length()
            );
        }

        Ok(added)
    }

    fn check_length(id: PartitionId, known: usize, remote: usize) {
        if remote < known {
            warn!(
                "{}: remote length {} below known length {}, keeping known entries",
                id, remote, known
            );
        }
    }

    fn decode_record(raw: &RawValue, pid: usize) -> Result<Entity, Error> {
        let address = raw.member("lpToken", 0)?.address("lpToken")?;
        let rewarder = match raw.member("rewarder", 4) {
            Ok(value) => {
                let rewarder = value.address("rewarder")?;
                (!is_zero_address(&rewarder)).then_some(rewarder)
            },
            Err(Error::FieldNotExist(_)) => None,
            Err(e) => return Err(e),
        };

        Ok(Entity {
            address,
            pid,
            rewarder,
        })
    }

    /// Membership as of the last `discover` of this partition.
    pub async fn is_known(&self, id: PartitionId, address: &str) -> bool {
        self.entity(id, address).await.is_some()
    }

    pub async fn entity(&self, id: PartitionId, address: &str) -> Option<Entity> {
        let partition = self.partition(id);
        let partition = partition.lock().await;
        partition.get(address).cloned()
    }

    pub async fn entities(&self, id: PartitionId) -> Vec<Entity> {
        let partition = self.partition(id);
        let partition = partition.lock().await;
        partition.entities.clone()
    }

    pub async fn known_length(&self, id: PartitionId) -> usize {
        let partition = self.partition(id);
        let partition = partition.lock().await;
        partition.known_length()
    }
}
