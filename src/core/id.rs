use std::collections::HashMap;

use uuid::{Uuid, Variant};

/// Generate a fresh canonical identifier (random version-4 UUID).
pub fn generate_id() -> Uuid {
    Uuid::new_v4()
}

/// Strict format predicate for identifiers as they appear in persisted data:
/// the 36-character hyphenated RFC 4122 textual form, version 1-5, variant
/// bits `10xx`. Braced, URN and compact forms are rejected.
pub fn is_canonical_id(s: &str) -> bool {
    if s.len() != 36 {
        return false;
    }
    let Ok(id) = Uuid::try_parse(s) else {
        return false;
    };
    matches!(id.get_version_num(), 1..=5) && id.get_variant() == Variant::RFC4122
}

/// Rewrites non-canonical identifiers to fresh UUIDs within one load pass.
///
/// The same bad string always resolves to the same replacement, so an entity
/// id and every reference to it stay consistent. Empty ids get a fresh UUID
/// without entering the shared map, because two entities that both lost their
/// id must not collapse onto one replacement.
pub(crate) struct IdRepair {
    replacements: HashMap<String, Uuid>,
    repaired: bool,
}

impl IdRepair {
    pub(crate) fn new() -> Self {
        Self {
            replacements: HashMap::new(),
            repaired: false,
        }
    }

    /// Canonicalize an entity's own id. Always yields a usable id.
    pub(crate) fn entity_id(&mut self, raw: &str) -> Uuid {
        if is_canonical_id(raw)
            && let Ok(id) = Uuid::parse_str(raw)
        {
            return id;
        }
        self.repaired = true;
        if raw.is_empty() {
            return generate_id();
        }
        *self
            .replacements
            .entry(raw.to_owned())
            .or_insert_with(generate_id)
    }

    /// Canonicalize a reference to another entity. Blank references are
    /// dropped rather than repaired.
    pub(crate) fn reference(&mut self, raw: &str) -> Option<Uuid> {
        if raw.is_empty() {
            self.repaired = true;
            return None;
        }
        Some(self.entity_id(raw))
    }

    pub(crate) fn repaired_any(&self) -> bool {
        self.repaired
    }
}
