use crate::auth::types::User;

/// Authentication type attached to principals built from a backend user.
pub const AUTHENTICATION_TYPE: &str = "Firebase Google authentication";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClaimKind {
    Name,
    Email,
    UserId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Claim {
    pub kind: ClaimKind,
    pub value: String,
}

/// Claims-bearing identity handed to the host's authorization layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Principal {
    authentication_type: Option<String>,
    claims: Vec<Claim>,
}

impl Principal {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn from_user(user: &User) -> Self {
        let mut claims = Vec::with_capacity(3);
        let mut push = |kind, value: Option<&str>| {
            if let Some(value) = value.filter(|value| !value.is_empty()) {
                claims.push(Claim {
                    kind,
                    value: value.to_string(),
                });
            }
        };
        push(ClaimKind::Name, user.display_name.as_deref());
        push(ClaimKind::Email, user.email.as_deref());
        push(ClaimKind::UserId, Some(user.uid.as_str()));

        Self {
            authentication_type: Some(AUTHENTICATION_TYPE.to_string()),
            claims,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authentication_type.is_some()
    }

    pub fn authentication_type(&self) -> Option<&str> {
        self.authentication_type.as_deref()
    }

    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    pub fn claim(&self, kind: ClaimKind) -> Option<&str> {
        self.claims
            .iter()
            .find(|claim| claim.kind == kind)
            .map(|claim| claim.value.as_str())
    }

    pub fn name(&self) -> Option<&str> {
        self.claim(ClaimKind::Name)
    }

    pub fn email(&self) -> Option<&str> {
        self.claim(ClaimKind::Email)
    }
}

impl From<Option<&User>> for Principal {
    fn from(user: Option<&User>) -> Self {
        user.map(Principal::from_user).unwrap_or_default()
    }
}
