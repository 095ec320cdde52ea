//! Read-only query paths served by the keeper.
//!
//! Requests carry CBOR-encoded parameters; responses are JSON. The first
//! non-empty segment of the path (split on `/` or `.`) selects the endpoint,
//! so `egress-index`, `/egress-index` and `egress-index.v1` all route the
//! same way.

use interchain_core::{codec, validate_chain_id, DatagramKind};
use serde::{Deserialize, Serialize};

use crate::error::{ChannelError, Result};

/// Egress datagram at a given index.
pub const EGRESS_DATAGRAM: &str = "egress-datagram";
/// Egress queue length.
pub const EGRESS_INDEX: &str = "egress-index";
/// Ingress counter.
pub const INGRESS_INDEX: &str = "ingress-index";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryEgressDatagramParams {
    pub dest_chain: String,
    pub datagram_kind: u8,
    pub sequence: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryEgressIndexParams {
    pub dest_chain: String,
    pub datagram_kind: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryIngressIndexParams {
    pub src_chain: String,
    pub datagram_kind: u8,
}

/// A decoded query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryRequest {
    EgressDatagram {
        dest_chain: String,
        kind: DatagramKind,
        sequence: u64,
    },
    EgressIndex {
        dest_chain: String,
        kind: DatagramKind,
    },
    IngressIndex {
        src_chain: String,
        kind: DatagramKind,
    },
}

impl QueryRequest {
    pub fn path(&self) -> &'static str {
        match self {
            QueryRequest::EgressDatagram { .. } => EGRESS_DATAGRAM,
            QueryRequest::EgressIndex { .. } => EGRESS_INDEX,
            QueryRequest::IngressIndex { .. } => INGRESS_INDEX,
        }
    }

    /// CBOR parameters for this request.
    pub fn encode_params(&self) -> Result<Vec<u8>> {
        let bytes = match self {
            QueryRequest::EgressDatagram {
                dest_chain,
                kind,
                sequence,
            } => codec::encode(&QueryEgressDatagramParams {
                dest_chain: dest_chain.clone(),
                datagram_kind: kind.to_byte(),
                sequence: *sequence,
            })?,
            QueryRequest::EgressIndex { dest_chain, kind } => {
                codec::encode(&QueryEgressIndexParams {
                    dest_chain: dest_chain.clone(),
                    datagram_kind: kind.to_byte(),
                })?
            }
            QueryRequest::IngressIndex { src_chain, kind } => {
                codec::encode(&QueryIngressIndexParams {
                    src_chain: src_chain.clone(),
                    datagram_kind: kind.to_byte(),
                })?
            }
        };
        Ok(bytes)
    }

    /// Route `path` and decode `data` for it.
    pub fn parse(path: &str, data: &[u8]) -> Result<Self> {
        let endpoint = path
            .split(['/', '.'])
            .find(|segment| !segment.is_empty())
            .ok_or_else(|| ChannelError::UnknownRequest(path.to_string()))?;

        match endpoint {
            EGRESS_DATAGRAM => {
                let params: QueryEgressDatagramParams = decode_params(data)?;
                Ok(QueryRequest::EgressDatagram {
                    dest_chain: checked_chain(params.dest_chain)?,
                    kind: checked_kind(params.datagram_kind)?,
                    sequence: params.sequence,
                })
            }
            EGRESS_INDEX => {
                let params: QueryEgressIndexParams = decode_params(data)?;
                Ok(QueryRequest::EgressIndex {
                    dest_chain: checked_chain(params.dest_chain)?,
                    kind: checked_kind(params.datagram_kind)?,
                })
            }
            INGRESS_INDEX => {
                let params: QueryIngressIndexParams = decode_params(data)?;
                Ok(QueryRequest::IngressIndex {
                    src_chain: checked_chain(params.src_chain)?,
                    kind: checked_kind(params.datagram_kind)?,
                })
            }
            other => Err(ChannelError::UnknownRequest(other.to_string())),
        }
    }
}

fn decode_params<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
    codec::decode(data).map_err(|e| ChannelError::InvalidArgument(format!("bad params: {e}")))
}

fn checked_kind(byte: u8) -> Result<DatagramKind> {
    DatagramKind::try_from(byte).map_err(|e| ChannelError::InvalidArgument(e.to_string()))
}

fn checked_chain(chain_id: String) -> Result<String> {
    validate_chain_id(&chain_id).map_err(|e| ChannelError::InvalidArgument(e.to_string()))?;
    Ok(chain_id)
}

/// ABCI-style query result: `code` 0 on success, `value` holds JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub code: u32,
    pub log: String,
    pub value: Vec<u8>,
}

impl QueryResponse {
    pub fn from_result(result: Result<Vec<u8>>) -> Self {
        match result {
            Ok(value) => Self {
                code: 0,
                log: String::new(),
                value,
            },
            Err(e) => Self {
                code: e.code(),
                log: e.to_string(),
                value: Vec::new(),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}
