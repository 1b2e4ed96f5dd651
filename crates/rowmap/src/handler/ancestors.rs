use rowmap_core::stmt::Value;

/// Objects whose nested mappings are being resolved, innermost last.
///
/// A nested result map that refers back to one of these is a circular
/// reference: the engine links the ancestor instead of building a copy.
#[derive(Debug, Default)]
pub(super) struct Ancestors {
    stack: Vec<(String, Value)>,
}

impl Ancestors {
    pub(super) fn push(&mut self, result_map_id: &str, object: Value) {
        self.stack.push((result_map_id.to_string(), object));
    }

    /// Pops the innermost entry, which must belong to `result_map_id`.
    pub(super) fn pop(&mut self, result_map_id: &str) {
        let popped = self.stack.pop();
        debug_assert!(
            popped.as_ref().is_some_and(|(id, _)| id == result_map_id),
            "unbalanced ancestor stack; expected `{result_map_id}`"
        );
    }

    /// Innermost object under construction for `result_map_id`.
    pub(super) fn get(&self, result_map_id: &str) -> Option<&Value> {
        self.stack
            .iter()
            .rev()
            .find(|(id, _)| id == result_map_id)
            .map(|(_, object)| object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn innermost_wins() {
        let mut ancestors = Ancestors::default();
        ancestors.push("blog", Value::I64(1));
        ancestors.push("author", Value::I64(2));
        ancestors.push("blog", Value::I64(3));

        assert_eq!(ancestors.get("blog"), Some(&Value::I64(3)));
        ancestors.pop("blog");
        assert_eq!(ancestors.get("blog"), Some(&Value::I64(1)));
        ancestors.pop("author");
        ancestors.pop("blog");
        assert_eq!(ancestors.get("blog"), None);
    }
}
