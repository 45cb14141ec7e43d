//! Renderer lookup for the field tree.
//!
//! A [`Registry`] is an immutable bundle of renderers keyed by field kind
//! name (`object`, `string`, `select`, ...) and by widget name. It is passed
//! explicitly to [`Field::render`]; there is no process-wide registry.

use std::{collections::HashMap, fmt, sync::Arc};

use crate::{
    error::{FormError, Result},
    field::Field,
};

/// Kind name used when no renderer matches a field.
pub const UNSUPPORTED: &str = "unsupported";

/// Turns one field and its already rendered children into output.
pub trait Render<O> {
    fn render(&self, field: &Field, children: Vec<O>) -> O;
}

impl<O, F> Render<O> for F
where
    F: Fn(&Field, Vec<O>) -> O,
{
    fn render(&self, field: &Field, children: Vec<O>) -> O {
        self(field, children)
    }
}

/// Shared renderer handle.
pub type Renderer<O> = Arc<dyn Render<O> + Send + Sync>;

pub struct Registry<O> {
    fields: HashMap<String, Renderer<O>>,
    widgets: HashMap<String, Renderer<O>>,
}

impl<O> Default for Registry<O> {
    fn default() -> Self {
        Self {
            fields: HashMap::new(),
            widgets: HashMap::new(),
        }
    }
}

impl<O> Clone for Registry<O> {
    fn clone(&self) -> Self {
        Self {
            fields: self.fields.clone(),
            widgets: self.widgets.clone(),
        }
    }
}

impl<O> fmt::Debug for Registry<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: Vec<_> = self.fields.keys().collect();
        let mut widgets: Vec<_> = self.widgets.keys().collect();
        fields.sort();
        widgets.sort();
        f.debug_struct("Registry")
            .field("fields", &fields)
            .field("widgets", &widgets)
            .finish()
    }
}

impl<O> Registry<O> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the renderer of a field kind.
    pub fn with_field(
        mut self,
        kind: &str,
        renderer: impl Render<O> + Send + Sync + 'static,
    ) -> Self {
        self.fields.insert(kind.to_string(), Arc::new(renderer));
        self
    }

    /// Register the renderer of a `ui:widget` name.
    pub fn with_widget(
        mut self,
        name: &str,
        renderer: impl Render<O> + Send + Sync + 'static,
    ) -> Self {
        self.widgets.insert(name.to_string(), Arc::new(renderer));
        self
    }

    /// Fill in every entry of `theme` this registry does not define itself.
    pub fn with_theme(mut self, theme: Registry<O>) -> Self {
        for (kind, renderer) in theme.fields {
            self.fields.entry(kind).or_insert(renderer);
        }
        for (name, renderer) in theme.widgets {
            self.widgets.entry(name).or_insert(renderer);
        }
        self
    }

    /// Renderer for `field`: its widget first, then its kind.
    ///
    /// A kind without renderer falls back to the `unsupported` renderer;
    /// an unknown widget is a configuration error.
    pub fn lookup(&self, field: &Field) -> Result<&Renderer<O>> {
        if let Some(widget) = field.widget.as_deref() {
            return self.widgets.get(widget).ok_or_else(|| {
                FormError::Configuration(format!(
                    "no widget `{widget}` for field {} of kind `{}`",
                    field.id,
                    field.kind.name()
                ))
            });
        }
        let kind = field.kind.name();
        if let Some(renderer) = self.fields.get(kind) {
            return Ok(renderer);
        }
        warn!("no renderer for kind `{kind}`, using `{UNSUPPORTED}`");
        self.fields.get(UNSUPPORTED).ok_or_else(|| {
            FormError::Configuration(format!("no renderer for kind `{kind}`"))
        })
    }
}

impl Field {
    /// Render this field bottom-up through `registry`.
    pub fn render<O>(&self, registry: &Registry<O>) -> Result<O> {
        let children = self
            .children
            .iter()
            .map(|child| child.render(registry))
            .collect::<Result<Vec<O>>>()?;
        let renderer = registry.lookup(self)?;
        Ok(renderer.render(self, children))
    }
}
