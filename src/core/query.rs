use crate::core::presence::is_present;
use crate::domain::model::{AddressRole, Record, NAME_COLUMN};

/// Free-text query: `Name`, then every present role field in Street..Country order.
///
/// Returns `None` when `Name` is missing; such a record is never looked up.
pub fn build_query(record: &Record, role: AddressRole) -> Option<String> {
    let name = record.get(NAME_COLUMN).filter(|n| is_present(Some(*n)))?;

    let mut parts = vec![name.to_string()];
    for column in role.columns() {
        let value = record.get(&column);
        if let Some(value) = value.filter(|v| is_present(Some(*v))) {
            parts.push(value.to_string());
        }
    }

    Some(parts.join(", "))
}
