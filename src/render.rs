// HTML rendering for the changelog page.
// Layout and commit panels; all interpolated text is escaped.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::changelog::DisplayEntry;

/// Everything one page render needs, read from the cache and config.
pub struct ChangelogPage<'a> {
    pub entries: &'a [DisplayEntry],
    pub page: usize,
    pub max_pages: usize,
    pub last_update: DateTime<Utc>,
    pub cover_image: &'a str,
    pub repo_name: &'a str,
}

const STYLE: &str = "\
      .cover {
        position: relative;
        height: 330px;
        margin-top: -20px;
      }
      .cover .background-image, .cover .overlay {
        position: absolute;
        top: 0;
        left: 0;
        height: 100%;
        width: 100%;
      }
      .cover .background-image {
        background-position: center center;
        background-attachment: fixed;
        background-repeat: no-repeat;
      }
      .cover .overlay {
        background: linear-gradient(to bottom, rgba(0,0,0,0.2), rgba(0,0,0,0.7));
      }
      .cover h1 {
        position: absolute;
        bottom: 0;
        color: rgba(255, 255, 255, 0.8);
        width: 100%;
        text-align: center;
      }
      .background-container {
        position: fixed;
        left: 0;
        top: 0;
        width: 100%;
        height: 100%;
        z-index: -1000;
        background-position: center center;
        background-attachment: fixed;
        background-repeat: no-repeat;
        opacity: 0.5;
      }
      .contents {
        margin-top: 50px;
      }
      .contents .panel, .btn-group .btn {
        box-shadow: 0 2px 1px rgba(0,0,0,0.2);
        border: none;
        opacity: 0.9;
      }
      .commit {
        font-weight: bold;
      }
      .by-line img {
        height: 15px;
        width: 15px;
      }
      .by-line span.text {
        opacity: 0.7;
        font-size: 0.8em;
        margin-left: 5px;
      }
      .paginate {
        margin: 30px 0;
        float: right;
      }
      .footer {
        background-color: rgba(0,0,0,0.8);
        padding: 50px;
        text-align: center;
        color: rgba(255, 255, 255, 0.8);
      }
      .footer .last-update {
        opacity: 0.8;
        font-size: 0.9em;
      }
";

/// Render the full changelog page.
pub fn render(view: &ChangelogPage) -> String {
    let title = format!("{} changelog", view.repo_name.to_lowercase());
    let title = escape(&title);
    let cover = escape(view.cover_image);

    let mut html = String::with_capacity(8 * 1024);
    html.push_str("<html>\n<head>\n");
    let _ = writeln!(html, "<title>{}</title>", title);
    html.push_str(
        "<link href=\"//netdna.bootstrapcdn.com/bootstrap/3.1.0/css/bootstrap.min.css\" rel=\"stylesheet\">\n",
    );
    html.push_str("<style type=\"text/css\">\n");
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n<body>\n");

    html.push_str("<div class=\"cover\">\n");
    let _ = writeln!(
        html,
        "  <div class=\"background-image\" style=\"background-image: url('{}')\"></div>",
        cover
    );
    html.push_str("  <div class=\"overlay\"></div>\n");
    let _ = writeln!(html, "  <h1>{}</h1>", title);
    html.push_str("</div>\n");
    let _ = writeln!(
        html,
        "<div class=\"background-container\" style=\"background-image: url('{}')\"></div>",
        cover
    );

    html.push_str("<div class=\"container\">\n");
    html.push_str("<div class=\"col-xs-12 col-md-6 col-md-offset-3 contents\">\n");
    commit_panels(&mut html, view.entries);
    pagination(&mut html, view.page, view.max_pages);
    html.push_str("</div>\n</div>\n");

    html.push_str("<div class=\"footer\">\n");
    let _ = writeln!(
        html,
        "  <div class=\"last-update\"><em>Last Updated: {}</em></div>",
        view.last_update.format("%Y-%m-%d %H:%M:%S UTC")
    );
    html.push_str("</div>\n</body>\n</html>\n");

    html
}

fn commit_panels(html: &mut String, entries: &[DisplayEntry]) {
    for entry in entries {
        html.push_str("<div class=\"panel panel-default\">\n<div class=\"panel-body\">\n");
        let _ = writeln!(
            html,
            "  <div class=\"commit\">{}</div>",
            escape(&entry.message)
        );
        html.push_str("  <div class=\"by-line\">\n");
        let _ = writeln!(
            html,
            "    <img src=\"{}?s=140\">",
            escape(&entry.avatar_url)
        );
        let _ = writeln!(
            html,
            "    <span class=\"text\"><strong>{}</strong> authored on {}</span>",
            escape(&entry.author_name),
            entry.authored_at.format("%d %B %Y")
        );
        html.push_str("  </div>\n</div>\n</div>\n");
    }
}

/// Previous shows iff the page has a predecessor, Next iff one more
/// page exists below the configured maximum.
fn pagination(html: &mut String, page: usize, max_pages: usize) {
    html.push_str("<div class=\"paginate\">\n<div class=\"btn-group\">\n");
    if page > 1 {
        let _ = writeln!(
            html,
            "  <a class=\"btn btn-default\" href=\"/?page={}\">\
             <span class=\"glyphicon glyphicon-chevron-left\"></span> Previous</a>",
            page - 1
        );
    }
    if page < max_pages {
        let _ = writeln!(
            html,
            "  <a class=\"btn btn-default\" href=\"/?page={}\">\
             Next <span class=\"glyphicon glyphicon-chevron-right\"></span></a>",
            page + 1
        );
    }
    html.push_str("</div>\n</div>\n");
}

fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
