//! Closed relationship-type vocabulary and the directed edge type.

use serde::{Deserialize, Serialize};

/// Closed vocabulary of BloodHound relationship types CADRA understands.
///
/// Wire strings match BloodHound's own relationship type names exactly,
/// including its `ADCSESC*` family spelling (`ADCSES1`, not `ADCSESC1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeType {
    Adcsesc1,
    Adcsesc3,
    Adcsesc6a,
    Adcsesc9a,
    Adcsesc10a,
    AddAllowedToAct,
    AddKeyCredentialLink,
    AddMember,
    AddSelf,
    AllowedToAct,
    AllowedToDelegate,
    AllExtendedRights,
    DcSync,
    Enroll,
    ForceChangePassword,
    GenericAll,
    GenericWrite,
    GetChanges,
    GetChangesAll,
    GetChangesInFilteredSet,
    ManageCa,
    ManageCertificates,
    MemberOf,
    Owns,
    ReadGmsaPassword,
    ReadLapsPassword,
    SqlAdmin,
    SyncLapsPassword,
    WriteAccountRestrictions,
    WriteDacl,
    WriteOwner,
    WritePkiEnrollmentFlag,
    WritePkiNameFlag,
    WriteSpn,
}

impl EdgeType {
    #[must_use]
    pub const fn wire_str(self) -> &'static str {
        match self {
            Self::Adcsesc1 => "ADCSES1",
            Self::Adcsesc3 => "ADCSES3",
            Self::Adcsesc6a => "ADCSES6a",
            Self::Adcsesc9a => "ADCSES9a",
            Self::Adcsesc10a => "ADCSES10a",
            Self::AddAllowedToAct => "AddAllowedToAct",
            Self::AddKeyCredentialLink => "AddKeyCredentialLink",
            Self::AddMember => "AddMember",
            Self::AddSelf => "AddSelf",
            Self::AllowedToAct => "AllowedToAct",
            Self::AllowedToDelegate => "AllowedToDelegate",
            Self::AllExtendedRights => "AllExtendedRights",
            Self::DcSync => "DCSync",
            Self::Enroll => "Enroll",
            Self::ForceChangePassword => "ForceChangePassword",
            Self::GenericAll => "GenericAll",
            Self::GenericWrite => "GenericWrite",
            Self::GetChanges => "GetChanges",
            Self::GetChangesAll => "GetChangesAll",
            Self::GetChangesInFilteredSet => "GetChangesInFilteredSet",
            Self::ManageCa => "ManageCA",
            Self::ManageCertificates => "ManageCertificates",
            Self::MemberOf => "MemberOf",
            Self::Owns => "Owns",
            Self::ReadGmsaPassword => "ReadGMSAPassword",
            Self::ReadLapsPassword => "ReadLAPSPassword",
            Self::SqlAdmin => "SQLAdmin",
            Self::SyncLapsPassword => "SyncLAPSPassword",
            Self::WriteAccountRestrictions => "WriteAccountRestrictions",
            Self::WriteDacl => "WriteDacl",
            Self::WriteOwner => "WriteOwner",
            Self::WritePkiEnrollmentFlag => "WritePKIEnrollmentFlag",
            Self::WritePkiNameFlag => "WritePKINameFlag",
            Self::WriteSpn => "WriteSPN",
        }
    }

    /// Parse a relationship type string as it comes off the wire. Returns
    /// `None` for any type outside the closed vocabulary — the caller
    /// decides whether that is a warning-and-skip or a hard error.
    #[must_use]
    pub fn parse(wire: &str) -> Option<Self> {
        Some(match wire {
            "ADCSES1" => Self::Adcsesc1,
            "ADCSES3" => Self::Adcsesc3,
            "ADCSES6a" => Self::Adcsesc6a,
            "ADCSES9a" => Self::Adcsesc9a,
            "ADCSES10a" => Self::Adcsesc10a,
            "AddAllowedToAct" => Self::AddAllowedToAct,
            "AddKeyCredentialLink" => Self::AddKeyCredentialLink,
            "AddMember" => Self::AddMember,
            "AddSelf" => Self::AddSelf,
            "AllowedToAct" => Self::AllowedToAct,
            "AllowedToDelegate" => Self::AllowedToDelegate,
            "AllExtendedRights" => Self::AllExtendedRights,
            "DCSync" => Self::DcSync,
            "Enroll" => Self::Enroll,
            "ForceChangePassword" => Self::ForceChangePassword,
            "GenericAll" => Self::GenericAll,
            "GenericWrite" => Self::GenericWrite,
            "GetChanges" => Self::GetChanges,
            "GetChangesAll" => Self::GetChangesAll,
            "GetChangesInFilteredSet" => Self::GetChangesInFilteredSet,
            "ManageCA" => Self::ManageCa,
            "ManageCertificates" => Self::ManageCertificates,
            "MemberOf" => Self::MemberOf,
            "Owns" => Self::Owns,
            "ReadGMSAPassword" => Self::ReadGmsaPassword,
            "ReadLAPSPassword" => Self::ReadLapsPassword,
            "SQLAdmin" => Self::SqlAdmin,
            "SyncLAPSPassword" => Self::SyncLapsPassword,
            "WriteAccountRestrictions" => Self::WriteAccountRestrictions,
            "WriteDacl" => Self::WriteDacl,
            "WriteOwner" => Self::WriteOwner,
            "WritePKIEnrollmentFlag" => Self::WritePkiEnrollmentFlag,
            "WritePKINameFlag" => Self::WritePkiNameFlag,
            "WriteSPN" => Self::WriteSpn,
            _ => return None,
        })
    }
}

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_str())
    }
}

/// A directed BloodHound relationship between two nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub edge_type: EdgeType,
    pub start_node_id: String,
    pub end_node_id: String,
}

impl Edge {
    #[must_use]
    pub fn new(
        edge_type: EdgeType,
        start_node_id: impl Into<String>,
        end_node_id: impl Into<String>,
    ) -> Self {
        Self {
            edge_type,
            start_node_id: start_node_id.into(),
            end_node_id: end_node_id.into(),
        }
    }
}
