use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

macro_rules! storage_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates an identifier from a stored value.
            #[must_use]
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the underlying storage value.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
                write!(formatter, "{}", self.0)
            }
        }
    };
}

storage_id!(
    /// Role template identifier.
    TemplateId
);
storage_id!(
    /// Tenant-owned role identifier.
    RoleId
);
storage_id!(
    /// Tenant-scope role assignment identifier.
    AssignmentId
);
storage_id!(
    /// Project-scope assignment identifier.
    ProjectAssignmentId
);
storage_id!(
    /// Project identifier owned by the external project service.
    ProjectId
);
