//! Display order of object properties from a `ui:order` hint.

use crate::error::{FormError, Result};

/// Wildcard standing for every property not named in the hint.
pub const WILDCARD: &str = "*";

fn property_list(names: &[&str]) -> String {
    if names.len() > 1 {
        format!("properties '{}'", names.join("', '"))
    } else {
        format!("property '{}'", names.first().copied().unwrap_or_default())
    }
}

/// Order `properties` by an optional `ui:order` hint.
///
/// Without a hint the schema order is kept. A hint without wildcard must be
/// a permutation of `properties`; with one `*`, unnamed properties are
/// inserted at its position in schema order.
pub fn order_properties<S: AsRef<str>>(
    properties: &[S],
    order: Option<&[S]>,
) -> Result<Vec<String>> {
    let properties: Vec<&str> = properties.iter().map(AsRef::as_ref).collect();
    let Some(order) = order else {
        return Ok(properties.into_iter().map(str::to_string).collect());
    };
    let order: Vec<&str> = order.iter().map(AsRef::as_ref).collect();

    let unknown: Vec<&str> = order
        .iter()
        .copied()
        .filter(|p| *p != WILDCARD && !properties.contains(p))
        .collect();
    if !unknown.is_empty() {
        return Err(FormError::Order(format!(
            "uiSchema order list contains extraneous {}",
            property_list(&unknown)
        )));
    }

    let mut seen: Vec<&str> = Vec::with_capacity(order.len());
    for name in &order {
        if *name != WILDCARD && seen.contains(name) {
            return Err(FormError::Order(format!(
                "uiSchema order list contains {} more than once",
                property_list(&[name])
            )));
        }
        seen.push(name);
    }

    let wildcards = order.iter().filter(|p| **p == WILDCARD).count();
    if wildcards > 1 {
        return Err(FormError::Order(
            "uiSchema order list contains more than one wildcard item".to_string(),
        ));
    }

    let rest: Vec<&str> = properties
        .iter()
        .copied()
        .filter(|p| !order.contains(p))
        .collect();

    if wildcards == 0 {
        if !rest.is_empty() {
            return Err(FormError::Order(format!(
                "uiSchema order list does not contain {}",
                property_list(&rest)
            )));
        }
        return Ok(order.into_iter().map(str::to_string).collect());
    }

    let mut complete = Vec::with_capacity(properties.len());
    for name in order {
        if name == WILDCARD {
            complete.extend(rest.iter().map(|p| p.to_string()));
        } else {
            complete.push(name.to_string());
        }
    }
    Ok(complete)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_hint() {
        assert_eq!(order_properties(&["b", "a"], None).unwrap(), vec!["b", "a"]);
    }

    #[test]
    fn test_wildcard() {
        assert_eq!(
            order_properties(&["a", "b", "c"], Some(&["b", "*"])).unwrap(),
            vec!["b", "a", "c"]
        );
        assert_eq!(
            order_properties(&["a", "b", "c", "d"], Some(&["*", "a", "c"])).unwrap(),
            vec!["b", "d", "a", "c"]
        );
    }

    #[test]
    fn test_permutation() {
        assert_eq!(
            order_properties(&["a", "b"], Some(&["b", "a"])).unwrap(),
            vec!["b", "a"]
        );
    }

    #[test]
    fn test_errors() {
        let err = order_properties(&["a", "b"], Some(&["a", "b", "c"])).unwrap_err();
        assert!(matches!(err, FormError::Order(_)));
        assert!(err.to_string().contains("'c'"));

        let err = order_properties(&["a", "b"], Some(&["a"])).unwrap_err();
        assert!(err.to_string().contains("does not contain property 'b'"));

        assert!(order_properties(&["a", "b"], Some(&["a", "a", "*"])).is_err());
        assert!(order_properties(&["a", "b"], Some(&["*", "a", "*"])).is_err());
    }
}
