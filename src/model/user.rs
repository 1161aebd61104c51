//! User-specific extensions: derived UAC flags, group membership, and the
//! principal-properties default table.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::edge::EdgeType;
use crate::model::node::{Node, PropertyValue};

/// Closed vocabulary of `userAccountControl` flags CADRA derives from raw
/// BloodHound boolean properties. Only the subset the source actually
/// derives is modeled; every other real UAC flag (`LOCKOUT`,
/// `SMARTCARD_REQUIRED`, ...) has no corresponding raw property and is
/// never produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UacFlag {
    AccountDisable,
    PasswdNotReqd,
    DontExpirePasswd,
    TrustedForDelegation,
    NotDelegated,
    DontRequirePreauth,
    TrustedToAuthenticateForDelegation,
}

impl UacFlag {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AccountDisable => "ACCOUNTDISABLE",
            Self::PasswdNotReqd => "PASSWD_NOTREQD",
            Self::DontExpirePasswd => "DONT_EXPIRE_PASSWD",
            Self::TrustedForDelegation => "TRUSTED_FOR_DELEGATION",
            Self::NotDelegated => "NOT_DELEGATED",
            Self::DontRequirePreauth => "DONT_REQUIRE_PREAUTH",
            Self::TrustedToAuthenticateForDelegation => {
                "TRUSTED_TO_AUTHENTICATE_FOR_DELEGATION"
            }
        }
    }
}

/// Derive the set of UAC flags implied by a user's raw boolean properties.
///
/// A flag is present iff its driving property exists on the node *and* is
/// `true` (`enabled` is inverted: the flag fires when `enabled == false`).
/// A property that is absent entirely never contributes a flag — this is
/// not the same as it being `false`.
#[must_use]
pub fn derive_uac_flags(node: &Node) -> Vec<UacFlag> {
    let mut flags = Vec::new();
    let mut push_if = |prop: &str, want: bool, flag: UacFlag| {
        if let Some(PropertyValue::Bool(actual)) = node.raw_property(prop)
            && *actual == want
        {
            flags.push(flag);
        }
    };
    push_if("enabled", false, UacFlag::AccountDisable);
    push_if("passwordnotreqd", true, UacFlag::PasswdNotReqd);
    push_if("pwdneverexpires", true, UacFlag::DontExpirePasswd);
    push_if(
        "unconstraineddelegation",
        true,
        UacFlag::TrustedForDelegation,
    );
    push_if("sensitive", true, UacFlag::NotDelegated);
    push_if("dontreqpreauth", true, UacFlag::DontRequirePreauth);
    push_if(
        "trustedtoauth",
        true,
        UacFlag::TrustedToAuthenticateForDelegation,
    );
    flags
}

/// Extra state carried only by `User` nodes: derived UAC flags, the
/// `samaccountname`s of groups reached via `MemberOf` edges on this
/// principal's paths, and the distinct outbound edge types observed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserExtras {
    pub uac_flags: Vec<UacFlag>,
    pub memberof: Vec<String>,
    pub edges: Vec<EdgeType>,
}

impl UserExtras {
    #[must_use]
    pub fn has_flag(&self, flag: UacFlag) -> bool {
        self.uac_flags.contains(&flag)
    }

    /// Record an observed outbound edge type, deduplicating.
    pub fn observe_edge(&mut self, edge_type: EdgeType) {
        if !self.edges.contains(&edge_type) {
            self.edges.push(edge_type);
        }
    }
}

/// Closed default values for principal (`User`)-only properties, substituted
/// when neither the raw bag nor the generic-properties table has a value.
#[must_use]
pub fn principal_properties() -> &'static HashMap<&'static str, PropertyValue> {
    use std::sync::OnceLock;
    static TABLE: OnceLock<HashMap<&'static str, PropertyValue>> = OnceLock::new();
    TABLE.get_or_init(|| {
        HashMap::from([
            ("sensitive", PropertyValue::Bool(false)),
            ("dontreqpreauth", PropertyValue::Bool(false)),
            ("passwordnotreqd", PropertyValue::Bool(false)),
            ("pwdneverexpires", PropertyValue::Bool(false)),
            ("unconstraineddelegation", PropertyValue::Bool(false)),
            ("trustedtoauth", PropertyValue::Bool(false)),
            (
                "serviceprincipalnames",
                PropertyValue::List(Vec::new()),
            ),
        ])
    })
}
