//! Composite cache keys.

use std::fmt;

use solana_sdk::pubkey::Pubkey;

use crate::pda::DerivedAddress;

/// Key of one cached query: operation name, cluster label, and the ordered
/// address inputs the query depends on.
///
/// Construction by [`QueryKey::try_new`] is the dependent-query discipline:
/// while any upstream input is [`DerivedAddress::Unavailable`] no key exists,
/// and a query without a key is never scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    op: String,
    cluster: String,
    inputs: Vec<String>,
}

impl QueryKey {
    /// Build a key from fully resolved inputs; `None` while any input is
    /// unavailable.
    pub fn try_new(op: &str, cluster: &str, inputs: &[&DerivedAddress]) -> Option<Self> {
        let mut resolved = Vec::with_capacity(inputs.len());
        for input in inputs {
            resolved.push(input.known()?.to_string());
        }
        Some(Self {
            op: op.to_string(),
            cluster: cluster.to_string(),
            inputs: resolved,
        })
    }

    pub fn op(&self) -> &str {
        &self.op
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    /// Whether this key depends on the given address.
    pub fn mentions(&self, address: &Pubkey) -> bool {
        let needle = address.to_string();
        self.inputs.iter().any(|input| *input == needle)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}[{}]", self.op, self.cluster, self.inputs.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pda::DerivedAddress;

    #[test]
    fn unavailable_input_yields_no_key() {
        let known = DerivedAddress::Known(Pubkey::new_unique());
        assert!(QueryKey::try_new("tokenState", "devnet", &[&known, &DerivedAddress::Unavailable]).is_none());
        assert!(QueryKey::try_new("tokenState", "devnet", &[&known]).is_some());
    }

    #[test]
    fn keys_differ_across_clusters() {
        let address = DerivedAddress::Known(Pubkey::new_unique());
        let a = QueryKey::try_new("tokenState", "devnet", &[&address]).unwrap();
        let b = QueryKey::try_new("tokenState", "testnet", &[&address]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn mentions_matches_inputs_only() {
        let target = Pubkey::new_unique();
        let key = QueryKey::try_new(
            "tokenBalance",
            "devnet",
            &[&DerivedAddress::Known(target)],
        )
        .unwrap();
        assert!(key.mentions(&target));
        assert!(!key.mentions(&Pubkey::new_unique()));
    }
}
