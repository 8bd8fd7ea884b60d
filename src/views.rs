//! View renderer
//!
//! Screens are plain markup strings. A [`Container`] holds the markup of the current screen,
//! a [`Layout`] turns it into a full document with the navigation of the app.

use crate::session::Flash;

/// Escape text for use in HTML content and attribute values
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }

    escaped
}

/// Markup of dismissible alerts, one per flash
pub fn alerts(flashes: &[Flash]) -> String {
    flashes
        .iter()
        .map(|flash| {
            format!(
                r#"<div class="alert alert-{} alert-dismissible fade show w-100 mb-3 text-center" role="alert"><span>{}</span><button type="button" class="btn-close" data-bs-dismiss="alert" aria-label="Close"></button></div>"#,
                flash.level.as_str(),
                escape(&flash.message),
            )
        })
        .collect()
}

/// The element screens are painted into
#[derive(Debug, Default)]
pub struct Container {
    markup: String,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with new markup
    pub fn render<M>(&mut self, markup: M)
    where
        M: Into<String>,
    {
        self.markup = markup.into();
    }

    /// Replace the contents, then run a step on the painted container
    pub fn render_then<M, F>(&mut self, markup: M, after: F)
    where
        M: Into<String>,
        F: FnOnce(&mut Self),
    {
        self.render(markup);
        after(self);
    }

    /// Insert markup before the current contents
    pub fn prepend(&mut self, markup: &str) {
        self.markup.insert_str(0, markup);
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }
}

/// Entry in the navigation bar
#[derive(Debug)]
pub enum NavItem {
    /// Plain link
    Link {
        label: &'static str,
        href: String,
        class: &'static str,
    },
    /// Button posting an empty form, used for logout
    Action {
        label: &'static str,
        action: String,
        class: &'static str,
    },
    /// Informational text
    Text(String),
}

impl NavItem {
    pub fn link(label: &'static str, href: String, class: &'static str) -> Self {
        NavItem::Link { label, href, class }
    }

    pub fn action(label: &'static str, action: String, class: &'static str) -> Self {
        NavItem::Action {
            label,
            action,
            class,
        }
    }

    fn render(&self) -> String {
        match self {
            NavItem::Link { label, href, class } => format!(
                r#"<a href="{}" class="{class}">{}</a>"#,
                escape(href),
                escape(label)
            ),
            NavItem::Action {
                label,
                action,
                class,
            } => format!(
                r#"<form method="post" action="{}" class="d-inline"><button type="submit" class="{class}">{}</button></form>"#,
                escape(action),
                escape(label)
            ),
            NavItem::Text(text) => format!(
                r#"<span class="navbar-text ms-3">{}</span>"#,
                escape(text)
            ),
        }
    }
}

/// Document chrome of an app
#[derive(Debug)]
pub struct Layout {
    /// Document and brand title
    pub title: &'static str,

    /// Where the brand links to, depends on the session
    pub brand_href: String,

    /// Navigation, rebuilt from the session on every render
    pub nav: Vec<NavItem>,

    /// Optional markup below the container
    pub footer: Option<String>,
}

impl Layout {
    /// Full HTML document around the container
    pub fn render(&self, container: &Container) -> String {
        let nav = self.nav.iter().map(NavItem::render).collect::<String>();
        let footer = self.footer.as_deref().unwrap_or_default();

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css">
</head>
<body>
<nav class="navbar navbar-dark bg-dark mb-4">
<div class="container">
<a class="navbar-brand" href="{brand_href}">{title}</a>
<div id="nav-links" class="d-flex align-items-center gap-2">{nav}</div>
</div>
</nav>
<main id="app" class="container">{content}</main>
{footer}
<script src="https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/js/bootstrap.bundle.min.js"></script>
</body>
</html>
"#,
            title = escape(self.title),
            brand_href = escape(&self.brand_href),
            content = container.markup(),
        )
    }
}
