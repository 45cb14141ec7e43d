//! Inspect the form state derived from a schema, ui schema and data file.

use std::{fs, path::Path};

use anyhow::{Context as _, bail};
use clap::{Parser, ValueEnum};
use jkform::{Field, FormOptions, FormState, JsonSchemaValidator, Registry, Submission, Value};

/// Derived tree to print.
#[derive(ValueEnum, Clone, Copy, Debug)]
enum Show {
    /// Schema resolved against the data.
    Resolved,
    /// Default-filled data.
    Defaults,
    /// Identifier tree.
    Ids,
    /// Error tree after validation.
    Errors,
    /// Field outline as a renderer would see it.
    Fields,
}

#[derive(Parser, Debug)]
#[command(name = "jkform", version, about = "Inspect JSON Schema form state")]
struct Cli {
    /// Schema file (`.json` or `.toml`).
    schema: String,
    /// UI schema file.
    #[arg(long)]
    ui: Option<String>,
    /// Form data file.
    #[arg(long)]
    data: Option<String>,
    /// Identifier of the root node.
    #[arg(long, default_value = "root")]
    id_prefix: String,
    /// Validate the data before printing.
    #[arg(long)]
    validate: bool,
    #[arg(long, value_enum, default_value_t = Show::Defaults)]
    show: Show,
}

fn load(path: impl AsRef<Path>) -> anyhow::Result<Value> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
    let value = match ext {
        "json" => serde_json::from_str(&content)?,
        "toml" => {
            let v: toml::Value = toml::from_str(&content)?;
            serde_json::to_value(v)?
        }
        _ => {
            bail!("Unsupported file extension: {ext:?}");
        }
    };
    Ok(value)
}

const KINDS: &[&str] = &[
    "object", "array", "files", "select", "file", "string", "number", "boolean", "null",
    jkform::registry::UNSUPPORTED,
];

fn widgets<'f>(field: &'f Field, names: &mut Vec<&'f str>) {
    if let Some(widget) = field.widget.as_deref() {
        names.push(widget);
    }
    for child in &field.children {
        widgets(child, names);
    }
}

/// Plain-text outline renderer for every kind and every widget in `tree`.
fn outline(tree: &Field) -> Registry<String> {
    let line = |field: &Field, children: Vec<String>| {
        let mut out = format!("{} ({}) #{}", field.label(), field.kind.name(), field.id);
        if field.required {
            out.push_str(" *");
        }
        if let Some(data) = &field.data
            && !field.kind.is_container()
        {
            out.push_str(&format!(" = {data}"));
        }
        for error in &field.errors.errors {
            out.push_str(&format!("\n  ! {error}"));
        }
        if let Some(error) = &field.error {
            out.push_str(&format!("\n  ! {error}"));
        }
        for child in children {
            for l in child.lines() {
                out.push_str("\n  ");
                out.push_str(l);
            }
        }
        out
    };
    let mut names = Vec::new();
    widgets(tree, &mut names);
    let registry = KINDS
        .iter()
        .fold(Registry::new(), |registry, kind| registry.with_field(kind, line));
    names
        .into_iter()
        .fold(registry, |registry, widget| registry.with_widget(widget, line))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let schema = load(&cli.schema)?;
    let ui = cli.ui.as_ref().map(load).transpose()?;
    let data = cli.data.as_ref().map(load).transpose()?;
    let options = FormOptions::default().id_prefix(cli.id_prefix.clone());

    let mut form = FormState::new(schema, ui, data, options, JsonSchemaValidator)?;
    if cli.validate
        && let Submission::Rejected(errors) = form.submit()?
    {
        log::info!("{} validation errors", errors.len());
    }

    match cli.show {
        Show::Resolved => println!("{}", serde_json::to_string_pretty(form.resolved_schema())?),
        Show::Defaults => println!("{}", serde_json::to_string_pretty(form.form_data())?),
        Show::Ids => println!("{}", serde_json::to_string_pretty(form.id_schema())?),
        Show::Errors => {
            println!("{}", serde_json::to_string_pretty(form.error_schema())?);
            for line in form.error_list() {
                eprintln!("{line}");
            }
        }
        Show::Fields => {
            let tree = form.field();
            println!("{}", tree.render(&outline(&tree))?);
        }
    }
    Ok(())
}
