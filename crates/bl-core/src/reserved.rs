/// Keys that would shadow shared object prototypes in hosts that store
/// dialogue graphs as plain maps. They are refused anywhere a node id or
/// restored flag key is accepted.
pub const RESERVED_KEYS: [&str; 3] = ["__proto__", "constructor", "prototype"];

pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

#[cfg(test)]
mod reserved_tests {
    use super::*;

    #[test]
    fn reserved_keys_are_detected() {
        assert!(is_reserved_key("__proto__"));
        assert!(is_reserved_key("constructor"));
        assert!(is_reserved_key("prototype"));
        assert!(!is_reserved_key("start"));
        assert!(!is_reserved_key("Constructor"));
    }
}
