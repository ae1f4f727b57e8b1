use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

/// Identifiers minted by the LMS launch; opaque strings that end up as URL
/// path segments.
macro_rules! launch_id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(ChallengeId);

launch_id_newtype!(LaunchId);
launch_id_newtype!(UserId);
launch_id_newtype!(AssignmentId);

impl fmt::Display for ChallengeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIds {
    pub launch_id: LaunchId,
    pub user_id: UserId,
    pub assignment_id: AssignmentId,
}

impl SessionIds {
    pub fn new(
        launch_id: impl Into<String>,
        user_id: impl Into<String>,
        assignment_id: impl Into<String>,
    ) -> Self {
        Self {
            launch_id: LaunchId::new(launch_id),
            user_id: UserId::new(user_id),
            assignment_id: AssignmentId::new(assignment_id),
        }
    }
}
