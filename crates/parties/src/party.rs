use serde::{Deserialize, Serialize};

use vanflow_core::{AgentId, CustomerId, DomainError, DomainResult, Entity};

/// Customer placing orders.
///
/// Customers are administered by the surrounding application; this core only
/// embeds them in orders (required relationship, validated at construction)
/// and matches them in the query layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    id: CustomerId,
    name: String,
    email: Option<String>,
}

impl Customer {
    pub fn new(id: CustomerId, name: impl Into<String>, email: Option<String>) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("customer name cannot be empty"));
        }
        if let Some(email) = &email {
            if !email.contains('@') {
                return Err(DomainError::validation("customer email is malformed"));
            }
        }
        Ok(Self { id, name, email })
    }

    pub fn id_typed(&self) -> CustomerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Field sales agent carrying van inventory.
///
/// Agents are created/destroyed by an external identity collaborator. The
/// write paths of this core reference agents by `AgentId` only; presentation
/// paths take the entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    id: AgentId,
    name: String,
}

impl Agent {
    pub fn new(id: AgentId, name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("agent name cannot be empty"));
        }
        Ok(Self { id, name })
    }

    pub fn id_typed(&self) -> AgentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Entity for Agent {
    type Id = AgentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
