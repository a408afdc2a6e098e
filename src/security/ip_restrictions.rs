//! Allow-list and auth-bypass list management
//!
//! Both lists hold IP addresses or CIDR blocks. Entries are validated before
//! insertion and kept unique; a rejected entry never changes the list.

use starter_common::util::validate_ip_or_cidr;
use starter_common::{SecurityConfig, SecurityType, ValidationError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IpRestrictionError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("{0} is already in the list")]
    Duplicate(String),

    #[error("{0} is not in the list")]
    NotFound(String),

    /// Bypass entries only apply to basic auth
    #[error("Basic auth bypass IPs can only be configured when basic authentication is enabled (current security type: {0})")]
    BypassRequiresBasicAuth(SecurityType),
}

/// Mutable view over one IP list of the security settings
pub struct IpList<'a> {
    entries: &'a mut Vec<String>,
}

impl<'a> IpList<'a> {
    /// The IP allow-list, empty means unrestricted
    pub fn allowed(security: &'a mut SecurityConfig) -> Self {
        Self {
            entries: &mut security.allowed_ips,
        }
    }

    /// Addresses that skip basic auth; refused unless basic auth is active
    pub fn auth_bypass(security: &'a mut SecurityConfig) -> Result<Self, IpRestrictionError> {
        if security.kind != SecurityType::BasicAuth {
            return Err(IpRestrictionError::BypassRequiresBasicAuth(security.kind));
        }
        Ok(Self {
            entries: &mut security.auth_bypass_ips,
        })
    }

    pub fn list(&self) -> &[String] {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn add(&mut self, candidate: &str) -> Result<(), IpRestrictionError> {
        let candidate = candidate.trim();
        validate_ip_or_cidr(candidate)?;
        if self.entries.iter().any(|entry| entry == candidate) {
            return Err(IpRestrictionError::Duplicate(candidate.to_string()));
        }
        self.entries.push(candidate.to_string());
        tracing::info!(entry = candidate, "IP entry added");
        Ok(())
    }

    pub fn remove(&mut self, entry: &str) -> Result<(), IpRestrictionError> {
        let entry = entry.trim();
        let position = self
            .entries
            .iter()
            .position(|existing| existing == entry)
            .ok_or_else(|| IpRestrictionError::NotFound(entry.to_string()))?;
        self.entries.remove(position);
        tracing::info!(entry, "IP entry removed");
        Ok(())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        tracing::info!("IP list cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_validates_and_deduplicates() {
        let mut security = SecurityConfig::default();
        let mut list = IpList::allowed(&mut security);

        list.add("192.168.1.0/24").unwrap();
        list.add(" 10.0.0.5 ").unwrap();
        assert_eq!(
            list.add("192.168.1.0/24"),
            Err(IpRestrictionError::Duplicate("192.168.1.0/24".to_string()))
        );
        assert!(matches!(
            list.add("192.168.1.300"),
            Err(IpRestrictionError::Invalid(_))
        ));
        assert_eq!(list.list(), ["192.168.1.0/24", "10.0.0.5"]);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut security = SecurityConfig::default();
        security.allowed_ips = vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()];
        let mut list = IpList::allowed(&mut security);

        assert!(matches!(
            list.remove("10.0.0.9"),
            Err(IpRestrictionError::NotFound(_))
        ));
        list.remove("10.0.0.1").unwrap();
        assert_eq!(list.list(), ["10.0.0.2"]);
        list.clear();
        assert!(list.is_empty());
    }

    #[test]
    fn test_bypass_gated_on_basic_auth() {
        let mut security = SecurityConfig::default();
        security.kind = SecurityType::ClientCert;
        assert!(matches!(
            IpList::auth_bypass(&mut security),
            Err(IpRestrictionError::BypassRequiresBasicAuth(SecurityType::ClientCert))
        ));

        security.kind = SecurityType::BasicAuth;
        let mut list = IpList::auth_bypass(&mut security).unwrap();
        list.add("192.168.0.0/16").unwrap();
        assert_eq!(security.auth_bypass_ips, vec!["192.168.0.0/16"]);
    }
}
