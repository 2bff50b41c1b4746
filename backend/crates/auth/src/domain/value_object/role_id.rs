use kernel::id::{Id, markers};

/// Identifier of an organization role
pub type RoleId = Id<markers::OrganizationRole>;
