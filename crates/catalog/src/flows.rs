// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Matching network flows against known AI service endpoints

use crate::records::AiFlowMatch;
use crate::{CatalogError, Result};
use diagnostics::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;

/// One flow log entry
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct FlowRecord {
    pub source_address: IpAddr,
    #[serde(default)]
    pub source_port: u16,
    pub destination_address: IpAddr,
    pub destination_port: u16,
    pub protocol: String,
    #[serde(default)]
    pub bytes: u64,
    /// Epoch seconds
    pub start: i64,
}

impl FlowRecord {
    /// Stable identity of the flow's 5-tuple
    #[must_use]
    pub fn tuple_id(&self) -> String {
        let tuple = format!(
            "{}|{}|{}|{}|{}",
            self.source_address,
            self.source_port,
            self.destination_address,
            self.destination_port,
            self.protocol.to_ascii_lowercase()
        );
        format!("{:x}", Sha256::digest(tuple.as_bytes()))
    }
}

/// Parse one flow per line, skipping blank lines
///
/// Lines that fail to parse are logged and skipped; the count of skipped
/// lines is returned alongside the flows.
#[must_use]
pub fn parse_flow_lines(text: &str) -> (Vec<FlowRecord>, usize) {
    let mut flows = Vec::new();
    let mut skipped = 0;
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<FlowRecord>(line) {
            Ok(flow) => flows.push(flow),
            Err(e) => {
                skipped += 1;
                let line_number = index + 1;
                let failure = e.to_string();
                warn!(
                    "skipping flow on line {line_number}: {failure}",
                    line_number: line_number,
                    failure: failure
                );
            }
        }
    }
    (flows, skipped)
}

/// Known AI service addresses
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    services: HashMap<IpAddr, String>,
}

impl EndpointRegistry {
    /// Build from service name to address lists
    ///
    /// Fails on the first address that does not parse, or on an address
    /// claimed by two services.
    pub fn from_config(endpoints: &BTreeMap<String, Vec<String>>) -> Result<Self> {
        let mut services = HashMap::new();
        for (service, addresses) in endpoints {
            for address in addresses {
                let ip: IpAddr = address.trim().parse().map_err(|e| {
                    CatalogError::Config(format!("endpoint {service}: bad address {address:?}: {e}"))
                })?;
                if let Some(previous) = services.insert(ip, service.clone()) {
                    if previous != *service {
                        return Err(CatalogError::Config(format!(
                            "address {ip} is listed for both {previous} and {service}"
                        )));
                    }
                }
            }
        }
        Ok(Self { services })
    }

    #[must_use]
    pub fn service_for(&self, address: &IpAddr) -> Option<&str> {
        self.services.get(address).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

/// Flows to registered endpoints, one match per 5-tuple
///
/// Repeated flows on a tuple add their bytes; the match keeps the earliest
/// start. Matches are in order of first appearance.
#[must_use]
pub fn correlate(flows: &[FlowRecord], registry: &EndpointRegistry) -> Vec<AiFlowMatch> {
    let mut matches: Vec<AiFlowMatch> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for flow in flows {
        let Some(service) = registry.service_for(&flow.destination_address) else {
            continue;
        };
        let id = flow.tuple_id();
        let bytes = i64::try_from(flow.bytes).unwrap_or(i64::MAX);

        if let Some(&position) = positions.get(&id) {
            let existing = &mut matches[position];
            existing.bytes = existing.bytes.saturating_add(bytes);
            existing.first_seen = existing.first_seen.min(flow.start);
            continue;
        }

        let _ = positions.insert(id.clone(), matches.len());
        matches.push(AiFlowMatch {
            unique_id: id,
            is_stale: false,
            source_address: flow.source_address.to_string(),
            source_port: i32::from(flow.source_port),
            destination_address: flow.destination_address.to_string(),
            destination_port: i32::from(flow.destination_port),
            protocol: flow.protocol.to_ascii_lowercase(),
            service: service.to_string(),
            bytes,
            first_seen: flow.start,
        });
    }

    let count = matches.len();
    let total = flows.len();
    info!("correlated {total} flows into {count} AI endpoint matches", total: total, count: count);
    matches
}
