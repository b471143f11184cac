//! Role + ownership access decisions.
//!
//! Gate order is fixed: verb support, then role, then ownership. Record
//! existence is never consulted here, so a manager gets the same answer for
//! an employee that belongs to someone else and for one that does not exist.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use roster_core::{EmployeeId, InfrastructureError, OwnerKey};

use crate::{Identity, Role};

/// HTTP verb as seen by the authorizer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
    /// Any method the service does not implement.
    Other,
}

impl From<&str> for Verb {
    /// Method names are case-sensitive.
    fn from(method: &str) -> Self {
        match method {
            "GET" => Verb::Get,
            "POST" => Verb::Post,
            "PUT" => Verb::Put,
            "DELETE" => Verb::Delete,
            _ => Verb::Other,
        }
    }
}

/// What the request targets.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// `/employees`
    EmployeeCollection,
    /// `/employees/{id}`
    EmployeeItem,
    /// `/manager/{id}`
    ManagerCollection,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AccessRequest {
    pub verb: Verb,
    pub kind: ResourceKind,
    pub target: Option<EmployeeId>,
}

impl AccessRequest {
    /// Request against the employees resource; `target` picks item vs collection.
    pub fn employees(verb: Verb, target: Option<EmployeeId>) -> Self {
        let kind = match target {
            Some(_) => ResourceKind::EmployeeItem,
            None => ResourceKind::EmployeeCollection,
        };
        Self { verb, kind, target }
    }

    /// Request against `/employees/{id}`. `target` is `None` when the path
    /// segment is not a usable id; the role gate still applies first.
    pub fn employee_item(verb: Verb, target: Option<EmployeeId>) -> Self {
        Self {
            verb,
            kind: ResourceKind::EmployeeItem,
            target,
        }
    }

    pub fn manager_team(verb: Verb) -> Self {
        Self {
            verb,
            kind: ResourceKind::ManagerCollection,
            target: None,
        }
    }
}

/// Reason code attached to every allow/deny outcome.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reason {
    Ok,
    MissingCredential,
    MalformedCredential,
    UnknownCredential,
    RoleForbidden,
    NotOwner,
    ResourceIdRequired,
    MethodNotAllowed,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::Ok => "OK",
            Reason::MissingCredential => "MISSING_CREDENTIAL",
            Reason::MalformedCredential => "MALFORMED_CREDENTIAL",
            Reason::UnknownCredential => "UNKNOWN_CREDENTIAL",
            Reason::RoleForbidden => "ROLE_FORBIDDEN",
            Reason::NotOwner => "NOT_OWNER",
            Reason::ResourceIdRequired => "RESOURCE_ID_REQUIRED",
            Reason::MethodNotAllowed => "METHOD_NOT_ALLOWED",
        }
    }
}

impl core::fmt::Display for Reason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthzError {
    #[error("Forbidden: role not permitted")]
    RoleForbidden,

    #[error("Forbidden: not your employee")]
    NotOwner,

    #[error("Employee ID required")]
    ResourceIdRequired,

    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl AuthzError {
    pub fn reason(&self) -> Reason {
        match self {
            AuthzError::RoleForbidden => Reason::RoleForbidden,
            AuthzError::NotOwner => Reason::NotOwner,
            AuthzError::ResourceIdRequired => Reason::ResourceIdRequired,
            AuthzError::MethodNotAllowed => Reason::MethodNotAllowed,
        }
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AccessDecision {
    outcome: Result<(), AuthzError>,
}

impl AccessDecision {
    pub fn allow() -> Self {
        Self { outcome: Ok(()) }
    }

    pub fn deny(err: AuthzError) -> Self {
        Self { outcome: Err(err) }
    }

    pub fn allowed(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn reason(&self) -> Reason {
        match self.outcome {
            Ok(()) => Reason::Ok,
            Err(e) => e.reason(),
        }
    }

    pub fn into_result(self) -> Result<(), AuthzError> {
        self.outcome
    }
}

/// First phase of a decision: either final, or waiting on one ownership answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    Decided(AccessDecision),
    RequiresOwnership {
        owner_key: OwnerKey,
        employee_id: EmployeeId,
    },
}

impl Evaluation {
    /// Finish the decision. `owns` is ignored when already decided.
    pub fn resolve(self, owns: bool) -> AccessDecision {
        match self {
            Evaluation::Decided(decision) => decision,
            Evaluation::RequiresOwnership { .. } if owns => AccessDecision::allow(),
            Evaluation::RequiresOwnership { .. } => AccessDecision::deny(AuthzError::NotOwner),
        }
    }
}

/// Pure decision table (no IO).
pub fn evaluate(identity: &Identity, request: &AccessRequest) -> Evaluation {
    use ResourceKind::*;

    let role = identity.role();
    let decided = |result: Result<(), AuthzError>| {
        Evaluation::Decided(match result {
            Ok(()) => AccessDecision::allow(),
            Err(e) => AccessDecision::deny(e),
        })
    };

    match (request.kind, request.verb) {
        (_, Verb::Other) => decided(Err(AuthzError::MethodNotAllowed)),

        (ManagerCollection, Verb::Get) => match role {
            Role::Admin | Role::Manager => decided(Ok(())),
            Role::Employee => decided(Err(AuthzError::RoleForbidden)),
        },
        (ManagerCollection, _) => decided(Err(AuthzError::MethodNotAllowed)),

        (EmployeeCollection | EmployeeItem, Verb::Get) => decided(Ok(())),

        (EmployeeCollection | EmployeeItem, Verb::Post) => match role {
            Role::Admin => decided(Ok(())),
            Role::Manager | Role::Employee => decided(Err(AuthzError::RoleForbidden)),
        },

        (EmployeeCollection | EmployeeItem, Verb::Put) => match (role, request.target) {
            (Role::Employee, _) => decided(Err(AuthzError::RoleForbidden)),
            (_, None) => decided(Err(AuthzError::ResourceIdRequired)),
            (Role::Admin, Some(_)) => decided(Ok(())),
            (Role::Manager, Some(employee_id)) => Evaluation::RequiresOwnership {
                owner_key: identity.owner_key().clone(),
                employee_id,
            },
        },

        (EmployeeCollection | EmployeeItem, Verb::Delete) => match (role, request.target) {
            (Role::Manager | Role::Employee, _) => decided(Err(AuthzError::RoleForbidden)),
            (Role::Admin, None) => decided(Err(AuthzError::ResourceIdRequired)),
            (Role::Admin, Some(_)) => decided(Ok(())),
        },
    }
}

/// Authorize with a synchronous ownership check.
///
/// `ownership` is called at most once, and only for a manager updating a
/// specific employee.
pub fn authorize<F>(identity: &Identity, request: &AccessRequest, ownership: F) -> AccessDecision
where
    F: FnOnce(&OwnerKey, EmployeeId) -> bool,
{
    match evaluate(identity, request) {
        Evaluation::Decided(decision) => decision,
        Evaluation::RequiresOwnership {
            owner_key,
            employee_id,
        } => {
            if ownership(&owner_key, employee_id) {
                AccessDecision::allow()
            } else {
                AccessDecision::deny(AuthzError::NotOwner)
            }
        }
    }
}

/// Ownership query supplied by the persistence layer.
#[async_trait]
pub trait OwnershipLookup: Send + Sync {
    /// `true` iff a row with `employee_id` exists and its `manager_id` equals
    /// `owner`. An absent row is `Ok(false)`, not an error.
    async fn is_managed_by(
        &self,
        owner: &OwnerKey,
        employee_id: EmployeeId,
    ) -> Result<bool, InfrastructureError>;
}

/// Async form of [`authorize`]: performs the ownership read when needed.
pub async fn authorize_with(
    identity: &Identity,
    request: &AccessRequest,
    lookup: &dyn OwnershipLookup,
) -> Result<AccessDecision, InfrastructureError> {
    let decision = match evaluate(identity, request) {
        Evaluation::RequiresOwnership {
            owner_key,
            employee_id,
        } => {
            let owns = lookup.is_managed_by(&owner_key, employee_id).await?;
            debug!(%owner_key, %employee_id, owns, "ownership checked");
            if owns {
                AccessDecision::allow()
            } else {
                AccessDecision::deny(AuthzError::NotOwner)
            }
        }
        Evaluation::Decided(decision) => decision,
    };

    debug!(
        role = %identity.role(),
        verb = ?request.verb,
        kind = ?request.kind,
        reason = %decision.reason(),
        "access decision"
    );
    Ok(decision)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use proptest::prelude::*;

    use super::*;
    use crate::Credential;

    fn identity(role: Role) -> Identity {
        Identity::new(Credential::new("tok"), role, OwnerKey::new("M1"))
    }

    fn id(n: i64) -> EmployeeId {
        EmployeeId::new(n).unwrap()
    }

    fn decide(role: Role, request: AccessRequest, owns: bool) -> AccessDecision {
        authorize(&identity(role), &request, |_, _| owns)
    }

    #[test]
    fn everyone_may_read_employees() {
        for role in Role::ALL {
            assert!(decide(role, AccessRequest::employees(Verb::Get, None), false).allowed());
            let item = AccessRequest::employees(Verb::Get, Some(id(9999)));
            assert!(decide(role, item, false).allowed());
        }
    }

    #[test]
    fn manager_listing_excludes_employees() {
        let req = AccessRequest::manager_team(Verb::Get);
        assert!(decide(Role::Admin, req, false).allowed());
        assert!(decide(Role::Manager, req, false).allowed());
        assert_eq!(decide(Role::Employee, req, false).reason(), Reason::RoleForbidden);
    }

    #[test]
    fn manager_listing_only_supports_get() {
        for verb in [Verb::Post, Verb::Put, Verb::Delete, Verb::Other] {
            let decision = decide(Role::Admin, AccessRequest::manager_team(verb), true);
            assert_eq!(decision.reason(), Reason::MethodNotAllowed);
        }
    }

    #[test]
    fn only_admin_creates() {
        let req = AccessRequest::employees(Verb::Post, None);
        assert!(decide(Role::Admin, req, false).allowed());
        assert_eq!(decide(Role::Manager, req, true).reason(), Reason::RoleForbidden);
        assert_eq!(decide(Role::Employee, req, true).reason(), Reason::RoleForbidden);
    }

    #[test]
    fn update_without_id_needs_an_id_unless_employee() {
        let req = AccessRequest::employees(Verb::Put, None);
        assert_eq!(decide(Role::Admin, req, true).reason(), Reason::ResourceIdRequired);
        assert_eq!(decide(Role::Manager, req, true).reason(), Reason::ResourceIdRequired);
        assert_eq!(decide(Role::Employee, req, true).reason(), Reason::RoleForbidden);
    }

    #[test]
    fn manager_update_follows_ownership() {
        let req = AccessRequest::employees(Verb::Put, Some(id(7)));
        assert!(decide(Role::Manager, req, true).allowed());
        assert_eq!(decide(Role::Manager, req, false).reason(), Reason::NotOwner);
        assert!(decide(Role::Admin, req, false).allowed());
    }

    #[test]
    fn ownership_check_receives_manager_key_and_target() {
        let req = AccessRequest::employees(Verb::Put, Some(id(8)));
        let decision = authorize(&identity(Role::Manager), &req, |owner, employee_id| {
            assert_eq!(owner.as_str(), "M1");
            assert_eq!(employee_id, id(8));
            false
        });
        assert_eq!(decision.into_result(), Err(AuthzError::NotOwner));
    }

    #[test]
    fn only_admin_deletes() {
        let with_id = AccessRequest::employees(Verb::Delete, Some(id(7)));
        let without_id = AccessRequest::employees(Verb::Delete, None);
        assert!(decide(Role::Admin, with_id, false).allowed());
        assert_eq!(decide(Role::Admin, without_id, false).reason(), Reason::ResourceIdRequired);
        assert_eq!(decide(Role::Manager, with_id, true).reason(), Reason::RoleForbidden);
        assert_eq!(decide(Role::Manager, without_id, true).reason(), Reason::RoleForbidden);
        assert_eq!(decide(Role::Employee, with_id, true).reason(), Reason::RoleForbidden);
    }

    #[test]
    fn unsupported_verbs_are_rejected_for_everyone() {
        for role in Role::ALL {
            let decision = decide(role, AccessRequest::employees(Verb::Other, Some(id(1))), true);
            assert_eq!(decision.into_result(), Err(AuthzError::MethodNotAllowed));
        }
    }

    #[test]
    fn unusable_item_id_still_goes_through_the_role_gate() {
        for verb in [Verb::Post, Verb::Put, Verb::Delete] {
            let req = AccessRequest::employee_item(verb, None);
            assert_eq!(decide(Role::Employee, req, true).reason(), Reason::RoleForbidden);
        }

        let delete = AccessRequest::employee_item(Verb::Delete, None);
        assert_eq!(decide(Role::Manager, delete, true).reason(), Reason::RoleForbidden);
        assert_eq!(decide(Role::Admin, delete, true).reason(), Reason::ResourceIdRequired);

        let put = AccessRequest::employee_item(Verb::Put, None);
        assert_eq!(decide(Role::Admin, put, true).reason(), Reason::ResourceIdRequired);
        assert_eq!(decide(Role::Manager, put, true).reason(), Reason::ResourceIdRequired);

        let patch = AccessRequest::employee_item(Verb::Other, None);
        assert_eq!(decide(Role::Admin, patch, true).reason(), Reason::MethodNotAllowed);
    }

    #[test]
    fn verbs_parse_case_sensitively() {
        assert_eq!(Verb::from("PUT"), Verb::Put);
        assert_eq!(Verb::from("put"), Verb::Other);
        assert_eq!(Verb::from("PATCH"), Verb::Other);
    }

    #[test]
    fn reasons_serialize_as_codes() {
        assert_eq!(
            serde_json::to_string(&Reason::ResourceIdRequired).unwrap(),
            "\"RESOURCE_ID_REQUIRED\""
        );
        assert_eq!(Reason::NotOwner.to_string(), "NOT_OWNER");
    }

    struct FixedLookup(Result<bool, InfrastructureError>);

    #[async_trait]
    impl OwnershipLookup for FixedLookup {
        async fn is_managed_by(
            &self,
            _owner: &OwnerKey,
            _employee_id: EmployeeId,
        ) -> Result<bool, InfrastructureError> {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn async_authorize_consults_lookup() {
        let req = AccessRequest::employees(Verb::Put, Some(id(7)));
        let manager = identity(Role::Manager);

        let decision = authorize_with(&manager, &req, &FixedLookup(Ok(true))).await.unwrap();
        assert!(decision.allowed());

        let decision = authorize_with(&manager, &req, &FixedLookup(Ok(false))).await.unwrap();
        assert_eq!(decision.reason(), Reason::NotOwner);
    }

    #[tokio::test]
    async fn lookup_failure_is_not_a_decision() {
        let req = AccessRequest::employees(Verb::Put, Some(id(7)));
        let lookup = FixedLookup(Err(InfrastructureError::connection("down")));

        let result = authorize_with(&identity(Role::Manager), &req, &lookup).await;
        assert!(result.is_err());

        // Admins never reach the lookup.
        let result = authorize_with(&identity(Role::Admin), &req, &lookup).await;
        assert!(result.unwrap().allowed());
    }

    #[tokio::test]
    async fn sync_and_async_forms_agree() {
        let requests = [
            AccessRequest::employees(Verb::Put, Some(id(7))),
            AccessRequest::employees(Verb::Delete, Some(id(7))),
            AccessRequest::employee_item(Verb::Put, None),
            AccessRequest::manager_team(Verb::Get),
        ];
        for role in Role::ALL {
            for owns in [true, false] {
                for req in requests {
                    let sync = decide(role, req, owns);
                    let lookup = FixedLookup(Ok(owns));
                    let via_lookup = authorize_with(&identity(role), &req, &lookup)
                        .await
                        .unwrap();
                    assert_eq!(sync, via_lookup, "{role} {req:?} owns={owns}");
                }
            }
        }
    }

    fn any_role() -> impl Strategy<Value = Role> {
        prop::sample::select(Role::ALL.to_vec())
    }

    fn any_verb() -> impl Strategy<Value = Verb> {
        prop::sample::select(vec![Verb::Get, Verb::Post, Verb::Put, Verb::Delete, Verb::Other])
    }

    fn any_request() -> impl Strategy<Value = AccessRequest> {
        (any_verb(), prop::option::of(1i64..100_000), 0u8..3).prop_map(|(verb, target, kind)| {
            let target = target.map(|n| EmployeeId::new(n).unwrap());
            match kind {
                0 => AccessRequest::manager_team(verb),
                1 => AccessRequest::employee_item(verb, target),
                _ => AccessRequest::employees(verb, target),
            }
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: identical inputs always produce identical decisions.
        #[test]
        fn decisions_are_deterministic(
            role in any_role(),
            request in any_request(),
            owns in any::<bool>(),
        ) {
            let first = decide(role, request, owns);
            let second = decide(role, request, owns);
            prop_assert_eq!(first, second);
            prop_assert_eq!(
                evaluate(&identity(role), &request),
                evaluate(&identity(role), &request)
            );
        }

        /// Property: employees can never mutate employee records.
        #[test]
        fn employees_never_mutate(
            verb in prop::sample::select(vec![Verb::Post, Verb::Put, Verb::Delete]),
            target in prop::option::of(1i64..100_000),
            item in any::<bool>(),
            owns in any::<bool>(),
        ) {
            let target = target.map(|n| EmployeeId::new(n).unwrap());
            let request = if item {
                AccessRequest::employee_item(verb, target)
            } else {
                AccessRequest::employees(verb, target)
            };
            let decision = decide(Role::Employee, request, owns);
            prop_assert_eq!(decision.reason(), Reason::RoleForbidden);
        }

        /// Property: a manager may update X iff the ownership check says so.
        #[test]
        fn manager_update_iff_owner(target in 1i64..100_000, owns in any::<bool>()) {
            let target = EmployeeId::new(target).unwrap();
            let request = AccessRequest::employees(Verb::Put, Some(target));
            let decision = decide(Role::Manager, request, owns);
            prop_assert_eq!(decision.allowed(), owns);
            if !owns {
                prop_assert_eq!(decision.reason(), Reason::NotOwner);
            }
        }

        /// Property: ownership is consulted only for a manager PUT with an id, and at most once.
        #[test]
        fn ownership_consulted_only_when_needed(role in any_role(), request in any_request()) {
            let calls = Cell::new(0u32);
            let _ = authorize(&identity(role), &request, |_, _| {
                calls.set(calls.get() + 1);
                true
            });
            let needed = role == Role::Manager
                && request.verb == Verb::Put
                && request.kind != ResourceKind::ManagerCollection
                && request.target.is_some();
            prop_assert_eq!(calls.get(), u32::from(needed));
        }

        /// Property: a denied decision always carries a non-OK reason, an allowed one always OK.
        #[test]
        fn reason_matches_outcome(
            role in any_role(),
            request in any_request(),
            owns in any::<bool>(),
        ) {
            let decision = decide(role, request, owns);
            prop_assert_eq!(decision.allowed(), decision.reason() == Reason::Ok);
        }
    }
}
