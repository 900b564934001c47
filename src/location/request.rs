//! Request context consumed by endpoint resolution.

use serde::{Deserialize, Serialize};
use url::Url;

/// Kind of resource a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    DatabaseAccount,
    Database,
    Collection,
    PartitionKeyRange,
    User,
    Permission,
    Offer,
    StoredProcedure,
    Trigger,
    UserDefinedFunction,
    Document,
    Attachment,
    Conflict,
}

impl ResourceType {
    /// Control-plane ("master") resources, as opposed to resources stored
    /// inside a collection.
    pub fn is_master_resource(&self) -> bool {
        matches!(
            self,
            Self::DatabaseAccount
                | Self::Database
                | Self::Collection
                | Self::PartitionKeyRange
                | Self::User
                | Self::Permission
                | Self::Offer
        )
    }
}

/// Operation a request performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationType {
    Read,
    ReadFeed,
    Query,
    Head,
    Create,
    Replace,
    Upsert,
    Patch,
    Delete,
    ExecuteJavaScript,
}

impl OperationType {
    /// Whether the operation must go to a write region.
    pub fn is_write_operation(&self) -> bool {
        matches!(
            self,
            Self::Create
                | Self::Replace
                | Self::Upsert
                | Self::Patch
                | Self::Delete
                | Self::ExecuteJavaScript
        )
    }

    /// Endpoint role serving this operation.
    pub fn kind(&self) -> OperationKind {
        if self.is_write_operation() {
            OperationKind::Write
        } else {
            OperationKind::Read
        }
    }
}

/// Endpoint role: read regions or write regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Read,
    Write,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// Routing-relevant context of one outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRequest {
    pub resource_type: ResourceType,
    pub operation_type: OperationType,
    /// Index into the write endpoint list when writes may use any region.
    pub alternate_index: Option<usize>,
    /// Endpoint pinned by the caller, bypassing all selection rules.
    pub endpoint_override: Option<Url>,
}

impl ServiceRequest {
    pub fn new(resource_type: ResourceType, operation_type: OperationType) -> Self {
        Self {
            resource_type,
            operation_type,
            alternate_index: None,
            endpoint_override: None,
        }
    }

    pub fn with_alternate_index(mut self, index: usize) -> Self {
        self.alternate_index = Some(index);
        self
    }

    pub fn with_endpoint_override(mut self, endpoint: Url) -> Self {
        self.endpoint_override = Some(endpoint);
        self
    }

    /// Endpoint role serving this request.
    pub fn kind(&self) -> OperationKind {
        self.operation_type.kind()
    }
}
