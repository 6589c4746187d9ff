use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize};
use std::{collections::HashSet, fmt, sync::Mutex};

/// Opaque identity handle of an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Principal(&'static str);

impl<'de> Deserialize<'de> for Principal {
    #[inline]
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Principal::new)
    }
}

impl Principal {
    // Interned, so the handle is a static str and can be Copy.
    // Each distinct principal text is leaked once; a session only ever sees a handful.
    pub fn new<R: AsRef<str>>(text: R) -> Self {
        static SET: Lazy<Mutex<HashSet<&'static str>>> = Lazy::new(|| Mutex::new(HashSet::new()));
        let mut set = match SET.lock() {
            Ok(set) => set,
            Err(poisoned) => poisoned.into_inner(),
        };
        match set.get(text.as_ref()) {
            Some(interned) => Principal(interned),
            None => {
                let leaked: &'static str = Box::leak(text.as_ref().to_owned().into_boxed_str());
                set.insert(leaked);
                Principal(leaked)
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning() {
        let first = Principal::new("2vxsx-fae");
        let second = Principal::new("2vxsx-fae");
        let other = Principal::new("rrkah-fqaaa-aaaaa-aaaaq-cai");
        assert!(std::ptr::eq(first.0, second.0));
        assert!(!std::ptr::eq(first.0, other.0));
    }

    #[test]
    fn deserialize_from_text() {
        let principal: Principal = serde_json::from_str("\"2vxsx-fae\"").unwrap();
        assert_eq!(principal, Principal::new("2vxsx-fae"));
        assert_eq!(principal.to_string(), "2vxsx-fae");
    }
}
