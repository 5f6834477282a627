use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

const BASE_CSS: &str = include_str!("../assets/folio.css");

pub const TICHA_STYLESHEET: &str =
    "https://ticha.haverford.edu/static/zapotexts/css/page_detail_style.css";
pub const BOOTSTRAP_STYLESHEET: &str =
    "https://maxcdn.bootstrapcdn.com/bootstrap/3.3.7/css/bootstrap.min.css";
pub const BOOTSTRAP_SCRIPT: &str =
    "https://maxcdn.bootstrapcdn.com/bootstrap/3.3.7/js/bootstrap.min.js";

#[derive(Debug, Clone, Copy)]
pub enum Theme {
    Auto,
    Light,
    Dark,
}

/// Assembles a standalone preview page around a converted fragment.
#[derive(Debug, Clone)]
pub struct Renderer {
    theme: Theme,
    custom_vars: BTreeMap<String, String>,
    stylesheet_links: Vec<String>,
    scripts: Vec<String>,
}

impl Renderer {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            custom_vars: BTreeMap::new(),
            stylesheet_links: vec![
                TICHA_STYLESHEET.to_string(),
                BOOTSTRAP_STYLESHEET.to_string(),
            ],
            scripts: vec![BOOTSTRAP_SCRIPT.to_string()],
        }
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_vars.insert(key.into(), value.into());
        self
    }

    pub fn with_stylesheet_link(mut self, href: impl Into<String>) -> Self {
        self.stylesheet_links.push(href.into());
        self
    }

    pub fn with_script(mut self, src: impl Into<String>) -> Self {
        self.scripts.push(src.into());
        self
    }

    /// Drops every external stylesheet and script, including the defaults.
    pub fn without_external_assets(mut self) -> Self {
        self.stylesheet_links.clear();
        self.scripts.clear();
        self
    }

    pub fn stylesheet(&self) -> String {
        let mut out = String::new();
        let (light_vars, dark_vars) = default_theme_vars();

        match self.theme {
            Theme::Auto => {
                out.push_str(&root_block(&light_vars, true));
                out.push_str("@media (prefers-color-scheme: dark) {\n");
                out.push_str(&indent_root_block(&dark_vars));
                out.push_str("}\n");
            }
            Theme::Light => {
                out.push_str(&root_block(&light_vars, true));
            }
            Theme::Dark => {
                out.push_str(&root_block(&dark_vars, true));
            }
        }

        if !self.custom_vars.is_empty() {
            out.push_str(&root_block(&self.custom_vars, false));
        }

        out.push_str(BASE_CSS);
        out
    }

    pub fn embed_html(&self, html: &str, with_inline_css: bool) -> String {
        let mut out = String::new();
        out.push_str("<!DOCTYPE html>\n");
        out.push_str("<html lang=\"en\">\n");
        out.push_str("<head>\n");
        out.push_str("  <meta charset=\"utf-8\" />\n");
        out.push_str("  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />\n");
        for href in &self.stylesheet_links {
            out.push_str("  <link rel=\"stylesheet\" href=\"");
            out.push_str(&escape_attr(href));
            out.push_str("\" />\n");
        }
        if with_inline_css {
            out.push_str("  <style>\n");
            out.push_str(&self.stylesheet());
            out.push_str("\n  </style>\n");
        }
        out.push_str("</head>\n");
        out.push_str("<body>\n");
        out.push_str("<div class=\"container\">\n");
        out.push_str("<div class=\"row text-left\">\n");
        out.push_str("<div class=\"col-lg-6 col-md-6 col-sm-6 col-xs-12\">\n</div>\n");
        out.push_str("<div class=\"col-lg-6 col-md-6 col-sm-6 col-xs-12\">\n");
        out.push_str(html);
        if !html.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("</div>\n</div>\n</div>\n");
        for src in &self.scripts {
            out.push_str("<script src=\"");
            out.push_str(&escape_attr(src));
            out.push_str("\"></script>\n");
        }
        out.push_str("</body>\n");
        out.push_str("</html>\n");
        out
    }

    pub fn generate_files(&self, out_dir: &Path) -> io::Result<()> {
        fs::create_dir_all(out_dir)?;
        fs::write(out_dir.join("folio.css"), self.stylesheet())?;
        Ok(())
    }
}

fn default_theme_vars() -> (BTreeMap<String, String>, BTreeMap<String, String>) {
    let light = BTreeMap::from([
        ("--folio-bg".to_string(), "#fbfaf5".to_string()),
        ("--folio-fg".to_string(), "#1f2328".to_string()),
        ("--folio-muted".to_string(), "#6b6358".to_string()),
        ("--folio-page-border".to_string(), "#d9d2c5".to_string()),
        ("--folio-column-rule".to_string(), "#e4ddd0".to_string()),
        ("--folio-mark".to_string(), "#8a3b12".to_string()),
        ("--folio-gloss-bg".to_string(), "#ffffff".to_string()),
        ("--folio-gloss-border".to_string(), "#c9c2b8".to_string()),
    ]);

    let dark = BTreeMap::from([
        ("--folio-bg".to_string(), "#14120f".to_string()),
        ("--folio-fg".to_string(), "#ece6da".to_string()),
        ("--folio-muted".to_string(), "#a39a8b".to_string()),
        ("--folio-page-border".to_string(), "#3a342b".to_string()),
        ("--folio-column-rule".to_string(), "#2d2922".to_string()),
        ("--folio-mark".to_string(), "#f0a36b".to_string()),
        ("--folio-gloss-bg".to_string(), "#1f1c17".to_string()),
        ("--folio-gloss-border".to_string(), "#4a4237".to_string()),
    ]);

    (light, dark)
}

fn format_vars(vars: &BTreeMap<String, String>, indent: &str) -> String {
    let mut out = String::new();
    for (key, value) in vars {
        out.push_str(indent);
        out.push_str(key);
        out.push_str(": ");
        out.push_str(value);
        out.push_str(";\n");
    }
    out
}

fn root_block(vars: &BTreeMap<String, String>, include_color_scheme: bool) -> String {
    let mut out = String::new();
    out.push_str(":root {\n");
    if include_color_scheme {
        out.push_str("  color-scheme: light dark;\n");
    }
    out.push_str(&format_vars(vars, "  "));
    out.push_str("}\n");
    out
}

fn indent_root_block(vars: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    out.push_str("  :root {\n");
    out.push_str("    color-scheme: light dark;\n");
    out.push_str(&format_vars(vars, "    "));
    out.push_str("  }\n");
    out
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}
