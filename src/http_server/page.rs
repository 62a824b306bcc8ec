//! Panel page
//!
//! Server-side HTML for the two-panel view: the source catalog on the left,
//! the query form and the annotated result on the right. Every value coming
//! from the engine or the user is escaped.

use chrono::{DateTime, Utc};

use crate::annotation::decode_reference;
use crate::catalog::{CatalogError, CatalogTable, CatalogView};
use crate::observability::{log_event_with_fields, Event};
use crate::query::{QueryError, ResultTable};

/// Query shown in the form before anything is submitted
pub const DEFAULT_QUERY: &str = "SELECT distinct city FROM personnel";

/// Example buttons: label and query
pub const EXAMPLE_QUERIES: [(&str, &str); 3] = [
    ("All", "SELECT * FROM personnel"),
    ("Distinct", "SELECT distinct city FROM personnel"),
    (
        "Union",
        "SELECT city FROM personnel UNION SELECT '5' FROM personnel",
    ),
];

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 0; }
nav { background: #343a40; color: #fff; padding: 0.75rem 1rem; font-size: 1.25rem; }
main { display: flex; gap: 1rem; padding: 1rem; }
section { background: #f8f9fa; padding: 1rem 2rem; overflow: auto; }
#catalog { flex: 5; }
#query { flex: 7; }
table { border-collapse: collapse; margin-bottom: 1rem; }
th, td { border: 1px solid #dee2e6; padding: 0.3rem 0.6rem; }
tr:nth-child(even) { background: #f2f2f2; }
td.where-hl { color: red; }
textarea { width: 100%; font-family: monospace; }
.error { color: #721c24; background: #f8d7da; padding: 0.5rem 1rem; }
.issues { font-size: 0.85rem; color: #856404; }
footer { font-size: 0.75rem; color: #6c757d; padding: 0 1rem 1rem; }
"#;

/// Reference-counted hover highlighting; a source cell stays lit while any
/// hovered output cell still holds it.
const SCRIPT: &str = r#"
(function () {
  const counts = new Map();
  const held = new Map();

  function enter(cell) {
    if (held.has(cell)) return;
    const ids = (cell.dataset.where || "")
      .split(" ")
      .filter((id) => id && document.getElementById(id));
    held.set(cell, ids);
    for (const id of ids) {
      const n = (counts.get(id) || 0) + 1;
      counts.set(id, n);
      if (n === 1) document.getElementById(id).classList.add("where-hl");
    }
  }

  function leave(cell) {
    const ids = held.get(cell);
    if (!ids) return;
    held.delete(cell);
    for (const id of ids) {
      const n = counts.get(id) - 1;
      if (n === 0) {
        counts.delete(id);
        document.getElementById(id).classList.remove("where-hl");
      } else {
        counts.set(id, n);
      }
    }
  }

  document.querySelectorAll("td[data-where]").forEach((cell) => {
    cell.addEventListener("mouseenter", () => enter(cell));
    cell.addEventListener("mouseleave", () => leave(cell));
  });

  document.querySelectorAll("button[data-query]").forEach((button) => {
    button.addEventListener("click", () => {
      document.getElementById("request").value = button.dataset.query;
    });
  });
})();
"#;

/// What the right-hand panel shows
pub enum Submission<'a> {
    /// Nothing submitted yet
    None,
    Rendered(&'a ResultTable),
    Failed(&'a QueryError),
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Render the full page
pub fn render_page(
    catalog: &Result<CatalogView, CatalogError>,
    query: &str,
    submission: Submission<'_>,
    rendered_at: DateTime<Utc>,
) -> String {
    let mut html = String::new();
    html.push_str("<!doctype html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Where Panel</title>\n");
    html.push_str(&format!("<style>{}</style>\n", STYLE));
    html.push_str("</head>\n<body>\n<nav>Where Provenance</nav>\n<main>\n");

    html.push_str("<section id=\"catalog\">\n<h2>Your Database</h2>\n");
    html.push_str("<p>Overview of provenance-tagged relations</p>\n");
    match catalog {
        Ok(view) => push_catalog(&mut html, view),
        Err(err) => push_error(&mut html, err.code(), &err.to_string()),
    }
    html.push_str("</section>\n");

    html.push_str("<section id=\"query\">\n<h2>Your Query</h2>\n");
    html.push_str("<p>Type your SQL query (without ending semicolon)</p>\n");
    push_form(&mut html, query);
    match submission {
        Submission::None => {}
        Submission::Rendered(table) => push_result(&mut html, table),
        Submission::Failed(err) => push_error(&mut html, err.code(), &err.to_string()),
    }
    html.push_str("</section>\n</main>\n");

    html.push_str(&format!(
        "<footer>Rendered {}</footer>\n",
        escape_html(&rendered_at.to_rfc3339())
    ));
    html.push_str(&format!("<script>{}</script>\n", SCRIPT));
    html.push_str("</body>\n</html>\n");
    html
}

fn push_catalog(html: &mut String, view: &CatalogView) {
    for table in &view.tables {
        push_catalog_table(html, table);
    }
    if !view.issues.is_empty() {
        html.push_str("<ul class=\"issues\">\n");
        for issue in &view.issues {
            html.push_str(&format!(
                "<li>{}: {}</li>\n",
                escape_html(&issue.relation),
                escape_html(&issue.message)
            ));
        }
        html.push_str("</ul>\n");
    }
}

fn push_catalog_table(html: &mut String, table: &CatalogTable) {
    html.push_str(&format!("<h3>{}</h3>\n<table>\n<tr>", escape_html(&table.relation)));
    for header in &table.headers {
        html.push_str(&format!("<th>{}</th>", escape_html(header)));
    }
    html.push_str("</tr>\n");
    for row in &table.rows {
        html.push_str(&format!("<tr title=\"{}\">", escape_html(&row.token)));
        for cell in &row.cells {
            html.push_str(&format!(
                "<td id=\"{}\">{}</td>",
                escape_html(&cell.id.to_string()),
                escape_html(cell.value.as_deref().unwrap_or_default())
            ));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n");
}

fn push_form(html: &mut String, query: &str) {
    html.push_str("<form method=\"post\" action=\"/\">\n<label>Example queries: </label>\n");
    for (label, example) in EXAMPLE_QUERIES {
        html.push_str(&format!(
            "<button type=\"button\" data-query=\"{}\">{}</button>\n",
            escape_html(example),
            escape_html(label)
        ));
    }
    html.push_str(&format!(
        "<textarea id=\"request\" name=\"request\" rows=\"2\">{}</textarea>\n",
        escape_html(query)
    ));
    html.push_str("<input type=\"submit\" value=\" Send query \">\n</form>\n");
}

fn push_result(html: &mut String, table: &ResultTable) {
    html.push_str("<hr>\n<h2>query result</h2>\n<table>\n<tr>");
    for column in &table.columns {
        html.push_str(&format!("<th>{}</th>", escape_html(column)));
    }
    html.push_str("</tr>\n");
    for row in &table.rows {
        html.push_str(&format!("<tr title=\"{}\">", escape_html(&row.annotation)));
        for cell in &row.cells {
            html.push_str(&format!(
                "<td data-ref=\"{}\" data-where=\"{}\">{}</td>",
                escape_html(&cell.reference),
                escape_html(&correlated_ids(&cell.reference).join(" ")),
                escape_html(cell.value.as_deref().unwrap_or_default())
            ));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n");
}

fn push_error(html: &mut String, code: &str, message: &str) {
    html.push_str(&format!(
        "<p class=\"error\"><strong>{}</strong> {}</p>\n",
        escape_html(code),
        escape_html(message)
    ));
}

/// Identifiers a cell correlates with; undecodable references correlate with
/// nothing
fn correlated_ids(reference: &str) -> Vec<String> {
    match decode_reference(reference) {
        Ok(set) => set.iter().map(ToString::to_string).collect(),
        Err(err) => {
            log_event_with_fields(
                Event::DecodeFailed,
                &[
                    ("code", err.code()),
                    ("reason", err.to_string().as_str()),
                    ("reference", reference),
                ],
            );
            Vec::new()
        }
    }
}
