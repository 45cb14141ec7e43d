use serde_json::Value;

/// Read-only view of one ui-schema node.
///
/// A `ui:` key is looked up directly first, then inside `ui:options`, so
/// `{"ui:widget": "x"}` and `{"ui:options": {"widget": "x"}}` are equivalent.
#[derive(Debug, Clone, Copy, Default)]
pub struct UiSchema<'a> {
    node: Option<&'a Value>,
}

/// Array-related `ui:options`, each defaulting to `true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiOptions {
    pub addable: bool,
    pub orderable: bool,
    pub removable: bool,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            addable: true,
            orderable: true,
            removable: true,
        }
    }
}

impl<'a> UiSchema<'a> {
    pub fn new(node: Option<&'a Value>) -> Self {
        Self {
            node: node.filter(|v| v.is_object()),
        }
    }

    /// The underlying JSON node, if any.
    pub fn node(&self) -> Option<&'a Value> {
        self.node
    }

    /// Look up a `ui:<name>` hint.
    pub fn option(&self, name: &str) -> Option<&'a Value> {
        let node = self.node?;
        node.get(format!("ui:{name}"))
            .or_else(|| node.get("ui:options").and_then(|o| o.get(name)))
    }

    fn str_option(&self, name: &str) -> Option<&'a str> {
        self.option(name).and_then(Value::as_str)
    }

    fn bool_option(&self, name: &str) -> Option<bool> {
        self.option(name).and_then(Value::as_bool)
    }

    pub fn widget(&self) -> Option<&'a str> {
        self.str_option("widget")
    }

    pub fn title(&self) -> Option<&'a str> {
        self.str_option("title")
    }

    pub fn description(&self) -> Option<&'a str> {
        self.str_option("description")
    }

    pub fn help(&self) -> Option<&'a str> {
        self.str_option("help")
    }

    /// The `ui:order` hint as a list of property names.
    pub fn order(&self) -> Option<Vec<String>> {
        let order = self.option("order")?.as_array()?;
        Some(
            order
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn options(&self) -> UiOptions {
        UiOptions {
            addable: self.bool_option("addable").unwrap_or(true),
            orderable: self.bool_option("orderable").unwrap_or(true),
            removable: self.bool_option("removable").unwrap_or(true),
        }
    }

    /// Ui node of an object property.
    pub fn property(&self, name: &str) -> UiSchema<'a> {
        UiSchema::new(self.node.and_then(|n| n.get(name)))
    }

    /// Ui node of array element `index`.
    ///
    /// For tuple arrays of `fixed_len` positions, elements past the tuple use
    /// `additionalItems`; a ui `items` list addresses fixed positions.
    pub fn item(&self, index: usize, fixed_len: Option<usize>) -> UiSchema<'a> {
        let Some(node) = self.node else {
            return UiSchema::default();
        };
        if let Some(len) = fixed_len
            && index >= len
        {
            return UiSchema::new(node.get("additionalItems"));
        }
        match node.get("items") {
            Some(Value::Array(items)) => UiSchema::new(items.get(index)),
            other => UiSchema::new(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_options_default_true() {
        let ui = UiSchema::new(None);
        assert_eq!(ui.options(), UiOptions::default());
        assert!(ui.widget().is_none());
    }

    #[test]
    fn test_options_lookup() {
        let node = json!({
            "ui:widget": "textarea",
            "ui:options": {"orderable": false, "title": "from options"},
            "ui:order": ["b", "*"],
            "name": {"ui:help": "your name"}
        });
        let ui = UiSchema::new(Some(&node));
        assert_eq!(ui.widget(), Some("textarea"));
        assert_eq!(ui.title(), Some("from options"));
        assert!(!ui.options().orderable);
        assert!(ui.options().addable);
        assert_eq!(ui.order().unwrap(), vec!["b", "*"]);
        assert_eq!(ui.property("name").help(), Some("your name"));
    }

    #[test]
    fn test_item_lookup() {
        let node = json!({
            "items": [{"ui:widget": "a"}, {"ui:widget": "b"}],
            "additionalItems": {"ui:widget": "extra"}
        });
        let ui = UiSchema::new(Some(&node));
        assert_eq!(ui.item(1, Some(2)).widget(), Some("b"));
        assert_eq!(ui.item(2, Some(2)).widget(), Some("extra"));

        let node = json!({"items": {"ui:widget": "all"}});
        let ui = UiSchema::new(Some(&node));
        assert_eq!(ui.item(7, None).widget(), Some("all"));
    }
}
