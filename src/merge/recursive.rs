//! Additive merge: fill in what the existing document lacks
//!
//! - Tables: merged by key (recursive)
//! - Keys present in both: existing value kept, whatever its type
//! - Keys only in the template: added

use toml::{Table, Value};

/// Recursively add keys from `template` that `existing` does not have.
///
/// Never removes or overwrites a key of `existing`. Key order of `existing`
/// is kept; added keys are appended in template order.
pub fn merge_preserving(existing: &mut Table, template: &Table) {
    for (key, template_value) in template {
        match existing.get_mut(key) {
            None => {
                existing.insert(key.clone(), template_value.clone());
            }
            Some(Value::Table(existing_table)) => {
                if let Value::Table(template_table) = template_value {
                    merge_preserving(existing_table, template_table);
                }
            }
            Some(_) => {}
        }
    }
}
