//! Naming helpers shared by synthesis and display

/// Suffix of cluster names that only resolve through gossip, never public DNS
pub const GOSSIP_DOMAIN_SUFFIX: &str = ".k8s.local";

/// Whether a cluster name is gossip-style (unresolvable by external DNS)
pub fn is_gossip_name(name: &str) -> bool {
    name.trim_end_matches('.').ends_with(GOSSIP_DOMAIN_SUFFIX)
}

/// Strip the leading characters shared by every name.
///
/// Trimming stops as soon as any name would drop to an empty string or the
/// names disagree on their next character. Order and length are preserved and
/// the input is left untouched.
pub fn trim_common_prefix<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut trimmed: Vec<&str> = names.iter().map(|n| n.as_ref()).collect();

    loop {
        let Some(first) = trimmed.first().and_then(|n| n.chars().next()) else {
            break;
        };

        let shared = trimmed
            .iter()
            .all(|n| n.chars().count() > 1 && n.starts_with(first));
        if !shared {
            break;
        }

        for name in trimmed.iter_mut() {
            *name = &name[first.len_utf8()..];
        }
    }

    trimmed.into_iter().map(String::from).collect()
}
