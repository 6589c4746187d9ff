use crate::Principal;

/// The identity the identity provider handed us, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    principal: Option<Principal>,
}

impl Session {
    pub fn anonymous() -> Self {
        Session { principal: None }
    }

    pub fn authenticated(principal: Principal) -> Self {
        Session {
            principal: Some(principal),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    pub fn principal(&self) -> Option<Principal> {
        self.principal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_has_no_principal() {
        let session = Session::anonymous();
        assert!(!session.is_authenticated());
        assert_eq!(session.principal(), None);
        assert_eq!(session, Session::default());
    }

    #[test]
    fn authenticated_exposes_principal() {
        let principal = Principal::new("2vxsx-fae");
        let session = Session::authenticated(principal);
        assert!(session.is_authenticated());
        assert_eq!(session.principal(), Some(principal));
    }
}
