// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Typed asset records
//!
//! Every asset type is one struct with a fixed column layout. Field names are
//! PascalCase on the wire and in storage, matching the provider's own
//! descriptions. Each type also declares the provider-native description it
//! is projected from.

use crate::codec::{ForArrow, string_list};
use crate::{CatalogError, Result};
use arrow_schema::{DataType, Field, FieldRef};
use chrono::DateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Something with an identity key that is unique within its record set
pub trait Record: Clone + Send + Sync + 'static {
    fn identity(&self) -> &str;
}

/// A record type persisted as one catalog object
pub trait Asset: Record + Serialize + DeserializeOwned + ForArrow {
    /// Logical asset type name, as written in the directory
    const ASSET_TYPE: &'static str;

    const KIND: AssetKind;

    /// Provider-native shape this record is projected from
    type Description: DeserializeOwned;

    fn is_stale(&self) -> bool;

    fn set_stale(&mut self, stale: bool);

    /// Map a provider description field by field into a fresh record
    fn from_provider(description: Self::Description) -> Result<Self>;

    /// Storage key of this type's record set
    #[must_use]
    fn storage_key() -> String {
        storage_key_for(Self::ASSET_TYPE)
    }
}

#[must_use]
pub fn storage_key_for(asset_type: &str) -> String {
    format!("Assets/{asset_type}inventory.parquet")
}

/// The closed set of asset types the catalog knows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetKind {
    ComputeInstance,
    NetworkInterface,
    SecurityGroup,
    Vpc,
    IamRole,
    LambdaFunction,
    StorageBucket,
    AiFlowMatch,
}

impl AssetKind {
    pub const ALL: [AssetKind; 8] = [
        AssetKind::ComputeInstance,
        AssetKind::NetworkInterface,
        AssetKind::SecurityGroup,
        AssetKind::Vpc,
        AssetKind::IamRole,
        AssetKind::LambdaFunction,
        AssetKind::StorageBucket,
        AssetKind::AiFlowMatch,
    ];

    /// Kinds populated from resource listings. Flow matches come from
    /// flow correlation instead.
    pub const INVENTORY: [AssetKind; 7] = [
        AssetKind::ComputeInstance,
        AssetKind::NetworkInterface,
        AssetKind::SecurityGroup,
        AssetKind::Vpc,
        AssetKind::IamRole,
        AssetKind::LambdaFunction,
        AssetKind::StorageBucket,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::ComputeInstance => ComputeInstance::ASSET_TYPE,
            AssetKind::NetworkInterface => NetworkInterface::ASSET_TYPE,
            AssetKind::SecurityGroup => SecurityGroup::ASSET_TYPE,
            AssetKind::Vpc => Vpc::ASSET_TYPE,
            AssetKind::IamRole => IamRole::ASSET_TYPE,
            AssetKind::LambdaFunction => LambdaFunction::ASSET_TYPE,
            AssetKind::StorageBucket => StorageBucket::ASSET_TYPE,
            AssetKind::AiFlowMatch => AiFlowMatch::ASSET_TYPE,
        }
    }

    #[must_use]
    pub fn storage_key(self) -> String {
        storage_key_for(self.as_str())
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetKind {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        AssetKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CatalogError::Config(format!("unknown asset type {s:?}")))
    }
}

// Shared provider shapes

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// Tags as a JSON object text, or `None` when there are none
fn tags_json(tags: &[Tag]) -> Result<Option<String>> {
    if tags.is_empty() {
        return Ok(None);
    }
    let map: BTreeMap<&str, &str> = tags
        .iter()
        .map(|tag| (tag.key.as_str(), tag.value.as_str()))
        .collect();
    Ok(Some(serde_json::to_string(&map)?))
}

fn epoch_seconds(asset_type: &'static str, field: &str, value: Option<&str>) -> Result<Option<i64>> {
    value
        .map(|text| {
            DateTime::parse_from_rfc3339(text)
                .map(|when| when.timestamp())
                .map_err(|e| CatalogError::projection(asset_type, format!("{field} {text:?}: {e}")))
        })
        .transpose()
}

fn require_id(asset_type: &'static str, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CatalogError::projection(asset_type, format!("empty {field}")));
    }
    Ok(())
}

fn utf8(name: &str, nullable: bool) -> FieldRef {
    Arc::new(Field::new(name, DataType::Utf8, nullable))
}

fn identity_fields() -> Vec<FieldRef> {
    vec![
        utf8("UniqueId", false),
        Arc::new(Field::new("IsStale", DataType::Boolean, false)),
    ]
}

macro_rules! impl_record {
    ($ty:ty) => {
        impl Record for $ty {
            fn identity(&self) -> &str {
                &self.unique_id
            }
        }
    };
}

// ComputeInstance

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ComputeInstance {
    pub unique_id: String,
    pub is_stale: bool,
    pub instance_type: String,
    pub state: String,
    pub private_ip_address: Option<String>,
    pub public_ip_address: Option<String>,
    pub vpc_id: Option<String>,
    pub subnet_id: Option<String>,
    pub image_id: String,
    /// Epoch seconds
    pub launch_time: Option<i64>,
    pub security_groups: Vec<String>,
    /// JSON object of tag key to value
    pub tags: Option<String>,
    pub iam_instance_profile: Option<String>,
    /// Filled in by workload classification, when it has run
    pub is_ai_workload: Option<bool>,
    pub ai_score: Option<i32>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct InstanceDescription {
    pub instance_id: String,
    pub instance_type: String,
    pub state: InstanceState,
    pub private_ip_address: Option<String>,
    pub public_ip_address: Option<String>,
    pub vpc_id: Option<String>,
    pub subnet_id: Option<String>,
    #[serde(default)]
    pub image_id: String,
    pub launch_time: Option<String>,
    #[serde(default)]
    pub security_groups: Vec<GroupIdentifier>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    pub iam_instance_profile: Option<InstanceProfile>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct InstanceState {
    pub name: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct GroupIdentifier {
    pub group_id: String,
    pub group_name: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct InstanceProfile {
    pub arn: String,
}

impl_record!(ComputeInstance);

impl ForArrow for ComputeInstance {
    fn for_arrow() -> Vec<FieldRef> {
        let mut fields = identity_fields();
        fields.extend([
            utf8("InstanceType", false),
            utf8("State", false),
            utf8("PrivateIpAddress", true),
            utf8("PublicIpAddress", true),
            utf8("VpcId", true),
            utf8("SubnetId", true),
            utf8("ImageId", false),
            Arc::new(Field::new("LaunchTime", DataType::Int64, true)),
            Arc::new(string_list("SecurityGroups", false)),
            utf8("Tags", true),
            utf8("IamInstanceProfile", true),
            Arc::new(Field::new("IsAiWorkload", DataType::Boolean, true)),
            Arc::new(Field::new("AiScore", DataType::Int32, true)),
        ]);
        fields
    }
}

impl Asset for ComputeInstance {
    const ASSET_TYPE: &'static str = "ComputeInstance";
    const KIND: AssetKind = AssetKind::ComputeInstance;
    type Description = InstanceDescription;

    fn is_stale(&self) -> bool {
        self.is_stale
    }

    fn set_stale(&mut self, stale: bool) {
        self.is_stale = stale;
    }

    fn from_provider(d: InstanceDescription) -> Result<Self> {
        require_id(Self::ASSET_TYPE, "InstanceId", &d.instance_id)?;
        Ok(Self {
            launch_time: epoch_seconds(Self::ASSET_TYPE, "LaunchTime", d.launch_time.as_deref())?,
            tags: tags_json(&d.tags)?,
            unique_id: d.instance_id,
            is_stale: false,
            instance_type: d.instance_type,
            state: d.state.name,
            private_ip_address: d.private_ip_address,
            public_ip_address: d.public_ip_address,
            vpc_id: d.vpc_id,
            subnet_id: d.subnet_id,
            image_id: d.image_id,
            security_groups: d.security_groups.into_iter().map(|g| g.group_id).collect(),
            iam_instance_profile: d.iam_instance_profile.map(|p| p.arn),
            is_ai_workload: None,
            ai_score: None,
        })
    }
}

// NetworkInterface

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkInterface {
    pub unique_id: String,
    pub is_stale: bool,
    pub vpc_id: Option<String>,
    pub subnet_id: Option<String>,
    pub private_ip_addresses: Vec<String>,
    pub public_ip: Option<String>,
    pub attached_instance_id: Option<String>,
    pub status: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkInterfaceDescription {
    pub network_interface_id: String,
    pub vpc_id: Option<String>,
    pub subnet_id: Option<String>,
    #[serde(default)]
    pub private_ip_addresses: Vec<PrivateIpAddress>,
    pub association: Option<Association>,
    pub attachment: Option<Attachment>,
    #[serde(default)]
    pub status: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct PrivateIpAddress {
    pub private_ip_address: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct Association {
    pub public_ip: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct Attachment {
    pub instance_id: Option<String>,
}

impl_record!(NetworkInterface);

impl ForArrow for NetworkInterface {
    fn for_arrow() -> Vec<FieldRef> {
        let mut fields = identity_fields();
        fields.extend([
            utf8("VpcId", true),
            utf8("SubnetId", true),
            Arc::new(string_list("PrivateIpAddresses", false)),
            utf8("PublicIp", true),
            utf8("AttachedInstanceId", true),
            utf8("Status", false),
        ]);
        fields
    }
}

impl Asset for NetworkInterface {
    const ASSET_TYPE: &'static str = "NetworkInterface";
    const KIND: AssetKind = AssetKind::NetworkInterface;
    type Description = NetworkInterfaceDescription;

    fn is_stale(&self) -> bool {
        self.is_stale
    }

    fn set_stale(&mut self, stale: bool) {
        self.is_stale = stale;
    }

    fn from_provider(d: NetworkInterfaceDescription) -> Result<Self> {
        require_id(Self::ASSET_TYPE, "NetworkInterfaceId", &d.network_interface_id)?;
        Ok(Self {
            unique_id: d.network_interface_id,
            is_stale: false,
            vpc_id: d.vpc_id,
            subnet_id: d.subnet_id,
            private_ip_addresses: d
                .private_ip_addresses
                .into_iter()
                .map(|ip| ip.private_ip_address)
                .collect(),
            public_ip: d.association.and_then(|a| a.public_ip),
            attached_instance_id: d.attachment.and_then(|a| a.instance_id),
            status: d.status,
        })
    }
}

// SecurityGroup

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityGroup {
    pub unique_id: String,
    pub is_stale: bool,
    pub group_name: String,
    pub vpc_id: Option<String>,
    pub description: Option<String>,
    /// JSON array of ingress permissions
    pub ingress_rules: String,
    /// JSON array of egress permissions
    pub egress_rules: String,
    pub rule_count: i32,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityGroupDescription {
    pub group_id: String,
    #[serde(default)]
    pub group_name: String,
    pub vpc_id: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub ip_permissions: Vec<serde_json::Value>,
    #[serde(default)]
    pub ip_permissions_egress: Vec<serde_json::Value>,
}

impl_record!(SecurityGroup);

impl ForArrow for SecurityGroup {
    fn for_arrow() -> Vec<FieldRef> {
        let mut fields = identity_fields();
        fields.extend([
            utf8("GroupName", false),
            utf8("VpcId", true),
            utf8("Description", true),
            utf8("IngressRules", false),
            utf8("EgressRules", false),
            Arc::new(Field::new("RuleCount", DataType::Int32, false)),
        ]);
        fields
    }
}

impl Asset for SecurityGroup {
    const ASSET_TYPE: &'static str = "SecurityGroup";
    const KIND: AssetKind = AssetKind::SecurityGroup;
    type Description = SecurityGroupDescription;

    fn is_stale(&self) -> bool {
        self.is_stale
    }

    fn set_stale(&mut self, stale: bool) {
        self.is_stale = stale;
    }

    fn from_provider(d: SecurityGroupDescription) -> Result<Self> {
        require_id(Self::ASSET_TYPE, "GroupId", &d.group_id)?;
        let rules = d.ip_permissions.len() + d.ip_permissions_egress.len();
        let rule_count = i32::try_from(rules)
            .map_err(|_| CatalogError::projection(Self::ASSET_TYPE, format!("{rules} rules")))?;
        Ok(Self {
            ingress_rules: serde_json::to_string(&d.ip_permissions)?,
            egress_rules: serde_json::to_string(&d.ip_permissions_egress)?,
            unique_id: d.group_id,
            is_stale: false,
            group_name: d.group_name,
            vpc_id: d.vpc_id,
            description: d.description,
            rule_count,
        })
    }
}

// Vpc

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Vpc {
    pub unique_id: String,
    pub is_stale: bool,
    pub cidr_block: String,
    pub is_default: bool,
    pub state: String,
    pub tags: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct VpcDescription {
    pub vpc_id: String,
    pub cidr_block: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl_record!(Vpc);

impl ForArrow for Vpc {
    fn for_arrow() -> Vec<FieldRef> {
        let mut fields = identity_fields();
        fields.extend([
            utf8("CidrBlock", false),
            Arc::new(Field::new("IsDefault", DataType::Boolean, false)),
            utf8("State", false),
            utf8("Tags", true),
        ]);
        fields
    }
}

impl Asset for Vpc {
    const ASSET_TYPE: &'static str = "Vpc";
    const KIND: AssetKind = AssetKind::Vpc;
    type Description = VpcDescription;

    fn is_stale(&self) -> bool {
        self.is_stale
    }

    fn set_stale(&mut self, stale: bool) {
        self.is_stale = stale;
    }

    fn from_provider(d: VpcDescription) -> Result<Self> {
        require_id(Self::ASSET_TYPE, "VpcId", &d.vpc_id)?;
        Ok(Self {
            tags: tags_json(&d.tags)?,
            unique_id: d.vpc_id,
            is_stale: false,
            cidr_block: d.cidr_block,
            is_default: d.is_default,
            state: d.state,
        })
    }
}

// IamRole

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct IamRole {
    pub unique_id: String,
    pub is_stale: bool,
    pub role_name: String,
    pub arn: String,
    pub path: String,
    /// Trust policy document as JSON text
    pub assume_role_policy: Option<String>,
    pub attached_policies: Vec<String>,
    pub create_date: Option<i64>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct RoleDescription {
    pub role_id: String,
    pub role_name: String,
    pub arn: String,
    #[serde(default = "root_path")]
    pub path: String,
    /// Either the document itself or its URL-encoded text
    pub assume_role_policy_document: Option<serde_json::Value>,
    #[serde(default)]
    pub attached_policies: Vec<AttachedPolicy>,
    pub create_date: Option<String>,
}

fn root_path() -> String {
    "/".to_string()
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct AttachedPolicy {
    pub policy_name: Option<String>,
    pub policy_arn: String,
}

impl_record!(IamRole);

impl ForArrow for IamRole {
    fn for_arrow() -> Vec<FieldRef> {
        let mut fields = identity_fields();
        fields.extend([
            utf8("RoleName", false),
            utf8("Arn", false),
            utf8("Path", false),
            utf8("AssumeRolePolicy", true),
            Arc::new(string_list("AttachedPolicies", false)),
            Arc::new(Field::new("CreateDate", DataType::Int64, true)),
        ]);
        fields
    }
}

impl Asset for IamRole {
    const ASSET_TYPE: &'static str = "IamRole";
    const KIND: AssetKind = AssetKind::IamRole;
    type Description = RoleDescription;

    fn is_stale(&self) -> bool {
        self.is_stale
    }

    fn set_stale(&mut self, stale: bool) {
        self.is_stale = stale;
    }

    fn from_provider(d: RoleDescription) -> Result<Self> {
        require_id(Self::ASSET_TYPE, "RoleId", &d.role_id)?;
        let assume_role_policy = match d.assume_role_policy_document {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(text)) => Some(text),
            Some(document) => Some(serde_json::to_string(&document)?),
        };
        Ok(Self {
            create_date: epoch_seconds(Self::ASSET_TYPE, "CreateDate", d.create_date.as_deref())?,
            unique_id: d.role_id,
            is_stale: false,
            role_name: d.role_name,
            arn: d.arn,
            path: d.path,
            assume_role_policy,
            attached_policies: d.attached_policies.into_iter().map(|p| p.policy_arn).collect(),
        })
    }
}

// LambdaFunction

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct LambdaFunction {
    pub unique_id: String,
    pub is_stale: bool,
    pub function_name: String,
    pub runtime: Option<String>,
    pub handler: Option<String>,
    pub memory_size: i32,
    pub timeout: i32,
    pub role: String,
    pub last_modified: Option<String>,
    pub layers: Vec<String>,
    /// Names only; values are never stored
    pub environment_variables: Vec<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct FunctionDescription {
    pub function_arn: String,
    pub function_name: String,
    pub runtime: Option<String>,
    pub handler: Option<String>,
    pub memory_size: Option<i32>,
    pub timeout: Option<i32>,
    #[serde(default)]
    pub role: String,
    pub last_modified: Option<String>,
    #[serde(default)]
    pub layers: Vec<Layer>,
    pub environment: Option<Environment>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct Layer {
    pub arn: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct Environment {
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

impl_record!(LambdaFunction);

impl ForArrow for LambdaFunction {
    fn for_arrow() -> Vec<FieldRef> {
        let mut fields = identity_fields();
        fields.extend([
            utf8("FunctionName", false),
            utf8("Runtime", true),
            utf8("Handler", true),
            Arc::new(Field::new("MemorySize", DataType::Int32, false)),
            Arc::new(Field::new("Timeout", DataType::Int32, false)),
            utf8("Role", false),
            utf8("LastModified", true),
            Arc::new(string_list("Layers", false)),
            Arc::new(string_list("EnvironmentVariables", false)),
        ]);
        fields
    }
}

impl Asset for LambdaFunction {
    const ASSET_TYPE: &'static str = "LambdaFunction";
    const KIND: AssetKind = AssetKind::LambdaFunction;
    type Description = FunctionDescription;

    fn is_stale(&self) -> bool {
        self.is_stale
    }

    fn set_stale(&mut self, stale: bool) {
        self.is_stale = stale;
    }

    fn from_provider(d: FunctionDescription) -> Result<Self> {
        require_id(Self::ASSET_TYPE, "FunctionArn", &d.function_arn)?;
        Ok(Self {
            unique_id: d.function_arn,
            is_stale: false,
            function_name: d.function_name,
            runtime: d.runtime,
            handler: d.handler,
            // Provider defaults when the listing omits them
            memory_size: d.memory_size.unwrap_or(128),
            timeout: d.timeout.unwrap_or(3),
            role: d.role,
            last_modified: d.last_modified,
            layers: d.layers.into_iter().map(|layer| layer.arn).collect(),
            environment_variables: d
                .environment
                .map(|env| env.variables.into_keys().collect())
                .unwrap_or_default(),
        })
    }
}

// StorageBucket

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct StorageBucket {
    pub unique_id: String,
    pub is_stale: bool,
    pub region: Option<String>,
    pub creation_date: Option<i64>,
    /// All four public access blocks enabled; `None` if unknown
    pub public_access_blocked: Option<bool>,
    pub encryption: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct BucketDescription {
    pub name: String,
    pub region: Option<String>,
    pub creation_date: Option<String>,
    pub public_access_block_configuration: Option<PublicAccessBlock>,
    pub encryption: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "PascalCase")]
pub struct PublicAccessBlock {
    #[serde(default)]
    pub block_public_acls: bool,
    #[serde(default)]
    pub ignore_public_acls: bool,
    #[serde(default)]
    pub block_public_policy: bool,
    #[serde(default)]
    pub restrict_public_buckets: bool,
}

impl PublicAccessBlock {
    #[must_use]
    pub fn fully_blocked(&self) -> bool {
        self.block_public_acls
            && self.ignore_public_acls
            && self.block_public_policy
            && self.restrict_public_buckets
    }
}

impl_record!(StorageBucket);

impl ForArrow for StorageBucket {
    fn for_arrow() -> Vec<FieldRef> {
        let mut fields = identity_fields();
        fields.extend([
            utf8("Region", true),
            Arc::new(Field::new("CreationDate", DataType::Int64, true)),
            Arc::new(Field::new("PublicAccessBlocked", DataType::Boolean, true)),
            utf8("Encryption", true),
        ]);
        fields
    }
}

impl Asset for StorageBucket {
    const ASSET_TYPE: &'static str = "StorageBucket";
    const KIND: AssetKind = AssetKind::StorageBucket;
    type Description = BucketDescription;

    fn is_stale(&self) -> bool {
        self.is_stale
    }

    fn set_stale(&mut self, stale: bool) {
        self.is_stale = stale;
    }

    fn from_provider(d: BucketDescription) -> Result<Self> {
        require_id(Self::ASSET_TYPE, "Name", &d.name)?;
        Ok(Self {
            creation_date: epoch_seconds(
                Self::ASSET_TYPE,
                "CreationDate",
                d.creation_date.as_deref(),
            )?,
            unique_id: d.name,
            is_stale: false,
            region: d.region,
            public_access_blocked: d
                .public_access_block_configuration
                .map(|block| block.fully_blocked()),
            encryption: d.encryption,
        })
    }
}

// AiFlowMatch

/// A network flow whose destination is a known AI service endpoint
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct AiFlowMatch {
    pub unique_id: String,
    #[serde(default)]
    pub is_stale: bool,
    pub source_address: String,
    pub source_port: i32,
    pub destination_address: String,
    pub destination_port: i32,
    pub protocol: String,
    pub service: String,
    pub bytes: i64,
    /// Epoch seconds of the earliest flow in the match
    pub first_seen: i64,
}

impl_record!(AiFlowMatch);

impl ForArrow for AiFlowMatch {
    fn for_arrow() -> Vec<FieldRef> {
        let mut fields = identity_fields();
        fields.extend([
            utf8("SourceAddress", false),
            Arc::new(Field::new("SourcePort", DataType::Int32, false)),
            utf8("DestinationAddress", false),
            Arc::new(Field::new("DestinationPort", DataType::Int32, false)),
            utf8("Protocol", false),
            utf8("Service", false),
            Arc::new(Field::new("Bytes", DataType::Int64, false)),
            Arc::new(Field::new("FirstSeen", DataType::Int64, false)),
        ]);
        fields
    }
}

impl Asset for AiFlowMatch {
    const ASSET_TYPE: &'static str = "AiFlowMatch";
    const KIND: AssetKind = AssetKind::AiFlowMatch;
    /// Matches are produced already in record form
    type Description = AiFlowMatch;

    fn is_stale(&self) -> bool {
        self.is_stale
    }

    fn set_stale(&mut self, stale: bool) {
        self.is_stale = stale;
    }

    fn from_provider(d: AiFlowMatch) -> Result<Self> {
        require_id(Self::ASSET_TYPE, "UniqueId", &d.unique_id)?;
        Ok(Self {
            is_stale: false,
            ..d
        })
    }
}
