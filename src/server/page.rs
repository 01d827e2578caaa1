//! HTML pages for the upload form and results.
//!
//! Templates live in `templates/` and are compiled into the binary. Values
//! are HTML-escaped by minijinja's auto-escaping for `.html` templates.

use crate::config::ServerConfig;
use crate::constants::server::{HTML_TOP_K, IMAGE_FIELD};
use crate::error::Result;
use crate::inference::{ClassificationOutput, LabelScore};
use axum::http::StatusCode;
use minijinja::{Environment, context};
use serde::Serialize;

const TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("templates/layout.html")),
    ("form.html", include_str!("templates/form.html")),
    ("gallery.html", include_str!("templates/gallery.html")),
    ("score.html", include_str!("templates/score.html")),
    ("index.html", include_str!("templates/index.html")),
    ("result.html", include_str!("templates/result.html")),
    ("error.html", include_str!("templates/error.html")),
];

/// Gallery entry: display name plus its percent-encoded path segment.
#[derive(Serialize)]
struct ExampleLink<'a> {
    name: &'a str,
    path: String,
}

#[derive(Serialize)]
struct ScoreRow<'a> {
    label: &'a str,
    percent: String,
}

impl<'a> From<&'a LabelScore> for ScoreRow<'a> {
    fn from(score: &'a LabelScore) -> Self {
        let percent = f64::from(score.confidence.clamp(0.0, 1.0)) * 100.0;
        Self {
            label: &score.label,
            percent: format!("{percent:.1}"),
        }
    }
}

fn example_links(examples: &[String]) -> Vec<ExampleLink<'_>> {
    examples
        .iter()
        .map(|name| ExampleLink {
            name,
            path: urlencoding::encode(name).into_owned(),
        })
        .collect()
}

/// Compiled page templates with the configured title and description.
pub struct Pages {
    env: Environment<'static>,
}

impl Pages {
    /// Compile the templates for one server configuration.
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        env.add_global("title", config.title.clone());
        env.add_global("description", config.description.clone());
        env.add_global("image_field", IMAGE_FIELD);
        Ok(Self { env })
    }

    /// Upload form with the example gallery.
    pub fn index(&self, examples: &[String]) -> Result<String> {
        let template = self.env.get_template("index.html")?;
        Ok(template.render(context! { examples => example_links(examples) })?)
    }

    /// Ranked results for one classified image.
    ///
    /// The first few labels are shown, the rest sit in a collapsed list.
    /// `example` names a gallery image to show above the results.
    pub fn result(
        &self,
        source: &str,
        example: Option<&str>,
        output: &ClassificationOutput,
        examples: &[String],
    ) -> Result<String> {
        let rows: Vec<ScoreRow<'_>> = output.confidences.iter().map(ScoreRow::from).collect();
        let (shown, rest) = rows.split_at(rows.len().min(HTML_TOP_K));

        let template = self.env.get_template("result.html")?;
        Ok(template.render(context! {
            source,
            example => example.map(|name| urlencoding::encode(name).into_owned()),
            label => &output.label,
            shown,
            rest,
            examples => example_links(examples),
        })?)
    }

    /// Error page with the upload form.
    pub fn error(&self, status: StatusCode, message: &str) -> Result<String> {
        let template = self.env.get_template("error.html")?;
        Ok(template.render(context! {
            status => status.as_u16(),
            reason => status.canonical_reason().unwrap_or("Error"),
            message,
        })?)
    }
}
