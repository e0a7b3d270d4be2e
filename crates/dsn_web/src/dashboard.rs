use std::fmt::Write;

use dsn_core::{Article, DailyDocument, DateSummary};

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

const STYLE: &str = "body{font-family:sans-serif;max-width:880px;margin:2rem auto;padding:0 1rem;color:#222}\
article{border-bottom:1px solid #ddd;padding:1rem 0}\
.meta{color:#666;font-size:.85rem}\
.score{font-weight:bold;color:#0a6}\
.tag{background:#eef;border-radius:4px;padding:0 .4rem;margin-right:.3rem;font-size:.8rem}\
nav a{margin-right:.6rem}";

fn render_article(out: &mut String, article: &Article) {
    let _ = write!(
        out,
        "<article id=\"{id}\"><h2><a href=\"{url}\" target=\"_blank\" rel=\"noopener\">{title}</a></h2>\
         <div class=\"meta\"><span class=\"score\">{score:.0}</span> · {source} · {published}</div>",
        id = escape_html(&article.id),
        url = escape_html(&article.url),
        title = escape_html(article.display_title()),
        score = article.score,
        source = escape_html(&article.source),
        published = escape_html(&article.published),
    );
    if article.translated_title.is_some() {
        let _ = write!(out, "<div class=\"meta\">{}</div>", escape_html(&article.title));
    }
    if let Some(summary) = &article.summary {
        let _ = write!(out, "<p>{}</p>", escape_html(summary));
    }
    if !article.tags.is_empty() {
        out.push_str("<div>");
        for tag in &article.tags {
            let _ = write!(out, "<span class=\"tag\">{}</span>", escape_html(tag));
        }
        out.push_str("</div>");
    }
    out.push_str("</article>");
}

/// Static page for the latest day with links to the per-date JSON.
pub fn render_dashboard(latest: Option<&DailyDocument>, dates: &[DateSummary]) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "<!DOCTYPE html><html lang=\"ko\"><head><meta charset=\"utf-8\">\
         <title>Data Science News</title><style>{}</style></head><body>",
        STYLE
    );

    match latest {
        Some(doc) => {
            let _ = write!(
                out,
                "<h1>Data Science News · {}</h1><p class=\"meta\">{} articles</p>",
                doc.date,
                doc.articles.len()
            );
            for article in &doc.articles {
                render_article(&mut out, article);
            }
        }
        None => out.push_str("<h1>Data Science News</h1><p>No articles collected yet.</p>"),
    }

    if !dates.is_empty() {
        out.push_str("<nav><h3>Archive</h3>");
        for summary in dates {
            let _ = write!(
                out,
                "<a href=\"/api/articles/{date}\">{date} ({count})</a>",
                date = summary.date,
                count = summary.count
            );
        }
        out.push_str("</nav>");
    }

    out.push_str("</body></html>");
    out
}
