use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::UserId;
use crate::store::{record, record_id};

record_id!(FamilyMemberId);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    #[default]
    Father,
    Mother,
    Brother,
    Guardian,
    Other,
}

/// One entry of a user's family background.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyMember {
    pub id: FamilyMemberId,
    pub user_id: UserId,
    pub fullname: String,
    pub relationship: Relationship,
    pub occupation: Option<String>,
    pub birthdate: Option<NaiveDate>,
}

record!(FamilyMember, FamilyMemberId, "family background");

#[derive(Debug, Clone, Deserialize)]
pub struct FamilyMemberInput {
    pub fullname: String,
    #[serde(default)]
    pub relationship: Relationship,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub birthdate: Option<NaiveDate>,
}

impl FamilyMemberInput {
    pub(crate) fn normalized(self) -> Self {
        Self {
            fullname: self.fullname.trim().to_string(),
            occupation: self
                .occupation
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relationship_defaults_to_father_and_reads_lowercase() {
        let input: FamilyMemberInput =
            serde_json::from_value(serde_json::json!({ "fullname": "Jose Rizal" }))
                .expect("parses");
        assert_eq!(input.relationship, Relationship::Father);

        let guardian: Relationship = serde_json::from_str("\"guardian\"").expect("parses");
        assert_eq!(guardian, Relationship::Guardian);
    }

    #[test]
    fn blank_occupation_is_dropped() {
        let input = FamilyMemberInput {
            fullname: "  Ana Cruz ".to_string(),
            relationship: Relationship::Mother,
            occupation: Some("   ".to_string()),
            birthdate: None,
        }
        .normalized();
        assert_eq!(input.fullname, "Ana Cruz");
        assert_eq!(input.occupation, None);
    }
}
