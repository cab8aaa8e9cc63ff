use alloy::primitives::{Bytes, FixedBytes, B256};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

pub type BLSPubKey = FixedBytes<48>;
pub type SignatureBytes = FixedBytes<96>;

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    #[serde_as(as = "DisplayFromStr")]
    pub slot: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub proposer_index: u64,
    pub parent_root: B256,
    pub state_root: B256,
    pub body_root: B256,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncCommittee {
    pub pubkeys: Vec<BLSPubKey>,
    pub aggregate_pubkey: BLSPubKey,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncAggregate {
    pub sync_committee_bits: Bytes,
    pub sync_committee_signature: SignatureBytes,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Bootstrap {
    pub header: Header,
    pub current_sync_committee: SyncCommittee,
    pub current_sync_committee_branch: Vec<B256>,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub attested_header: Header,
    pub next_sync_committee: SyncCommittee,
    pub next_sync_committee_branch: Vec<B256>,
    pub finalized_header: Header,
    pub finality_branch: Vec<B256>,
    pub sync_aggregate: SyncAggregate,
    #[serde_as(as = "DisplayFromStr")]
    pub signature_slot: u64,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FinalityUpdate {
    pub attested_header: Header,
    pub finalized_header: Header,
    pub finality_branch: Vec<B256>,
    pub sync_aggregate: SyncAggregate,
    #[serde_as(as = "DisplayFromStr")]
    pub signature_slot: u64,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OptimisticUpdate {
    pub attested_header: Header,
    pub sync_aggregate: SyncAggregate,
    #[serde_as(as = "DisplayFromStr")]
    pub signature_slot: u64,
}

/// Finalized header together with its inclusion proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finality {
    pub finalized_header: Header,
    pub finality_branch: Vec<B256>,
}

/// The part of an update that differs between the three update shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateKind {
    Full {
        next_sync_committee: SyncCommittee,
        next_sync_committee_branch: Vec<B256>,
        finality: Finality,
    },
    Finality(Finality),
    Optimistic,
}

/// Common view over [`Update`], [`FinalityUpdate`] and [`OptimisticUpdate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericUpdate {
    pub attested_header: Header,
    pub sync_aggregate: SyncAggregate,
    pub signature_slot: u64,
    pub kind: UpdateKind,
}

impl GenericUpdate {
    pub fn finality(&self) -> Option<&Finality> {
        match &self.kind {
            UpdateKind::Full { finality, .. } | UpdateKind::Finality(finality) => Some(finality),
            UpdateKind::Optimistic => None,
        }
    }

    pub fn finalized_header(&self) -> Option<&Header> {
        self.finality().map(|f| &f.finalized_header)
    }

    pub fn next_sync_committee(&self) -> Option<(&SyncCommittee, &[B256])> {
        match &self.kind {
            UpdateKind::Full {
                next_sync_committee,
                next_sync_committee_branch,
                ..
            } => Some((next_sync_committee, next_sync_committee_branch)),
            _ => None,
        }
    }
}

impl From<&Update> for GenericUpdate {
    fn from(update: &Update) -> Self {
        Self {
            attested_header: update.attested_header.clone(),
            sync_aggregate: update.sync_aggregate.clone(),
            signature_slot: update.signature_slot,
            kind: UpdateKind::Full {
                next_sync_committee: update.next_sync_committee.clone(),
                next_sync_committee_branch: update.next_sync_committee_branch.clone(),
                finality: Finality {
                    finalized_header: update.finalized_header.clone(),
                    finality_branch: update.finality_branch.clone(),
                },
            },
        }
    }
}

impl From<&FinalityUpdate> for GenericUpdate {
    fn from(update: &FinalityUpdate) -> Self {
        Self {
            attested_header: update.attested_header.clone(),
            sync_aggregate: update.sync_aggregate.clone(),
            signature_slot: update.signature_slot,
            kind: UpdateKind::Finality(Finality {
                finalized_header: update.finalized_header.clone(),
                finality_branch: update.finality_branch.clone(),
            }),
        }
    }
}

impl From<&OptimisticUpdate> for GenericUpdate {
    fn from(update: &OptimisticUpdate) -> Self {
        Self {
            attested_header: update.attested_header.clone(),
            sync_aggregate: update.sync_aggregate.clone(),
            signature_slot: update.signature_slot,
            kind: UpdateKind::Optimistic,
        }
    }
}
