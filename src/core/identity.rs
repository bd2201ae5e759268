//! Identity collaborator used to namespace per-user caches.

/// Supplies the signed-in user's stable identifier, if any.
pub trait Identity: Send + Sync {
    fn user_id(&self) -> Option<String>;
}

/// Identity fixed at startup, typically from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    user_id: Option<String>,
}

impl StaticIdentity {
    pub fn new(user_id: Option<String>) -> Self {
        // Blank identifiers count as signed out.
        let user_id = user_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        Self { user_id }
    }
}

impl Identity for StaticIdentity {
    fn user_id(&self) -> Option<String> {
        self.user_id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_identity() {
        assert_eq!(
            StaticIdentity::new(Some("u-1".to_string())).user_id(),
            Some("u-1".to_string())
        );
        assert_eq!(StaticIdentity::new(Some("  ".to_string())).user_id(), None);
        assert_eq!(StaticIdentity::new(None).user_id(), None);
    }
}
