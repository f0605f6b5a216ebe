use crate::edgar::parsing::{Element, MISSING};

use super::mapping::MappingDescriptor;

/// Looks up one descriptor inside `scope`.
///
/// Every step takes the first match in document order and never leaves the
/// scope. Text is the element's own text, trimmed; attributes are verbatim.
pub fn lookup(scope: Element<'_>, descriptor: &MappingDescriptor) -> Option<String> {
    match descriptor {
        MappingDescriptor::DirectText { tag, .. } => {
            scope.find(tag).map(|e| e.text().trim().to_string())
        }
        MappingDescriptor::NestedText { outer, inner, .. } => scope
            .find(outer)?
            .find(inner)
            .map(|e| e.text().trim().to_string()),
        MappingDescriptor::DirectAttribute { tag, attribute, .. } => {
            scope.find(tag)?.attribute(attribute).map(str::to_string)
        }
        MappingDescriptor::NestedAttribute {
            outer,
            inner,
            attribute,
            ..
        } => scope
            .find(outer)?
            .find(inner)?
            .attribute(attribute)
            .map(str::to_string),
    }
}

/// Resolves a descriptor to its value, or [`MISSING`] when the scope or any
/// element or attribute on the path is absent.
pub fn resolve(scope: Option<Element<'_>>, descriptor: &MappingDescriptor) -> String {
    scope
        .and_then(|scope| lookup(scope, descriptor))
        .unwrap_or_else(|| MISSING.to_string())
}
