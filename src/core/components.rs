use crate::domain::model::AddressComponent;

/// `long_name` of the first component tagged with `component_type`.
pub fn extract<'a>(components: &'a [AddressComponent], component_type: &str) -> Option<&'a str> {
    components
        .iter()
        .find(|c| c.types.iter().any(|t| t == component_type))
        .and_then(|c| c.long_name.as_deref())
}

/// `"<number> <route>"`, or the route alone. Empty when no route resolves.
pub fn derive_street(components: &[AddressComponent]) -> String {
    match (extract(components, "street_number"), extract(components, "route")) {
        (Some(number), Some(route)) => format!("{} {}", number, route).trim().to_string(),
        (None, Some(route)) => route.to_string(),
        _ => String::new(),
    }
}
