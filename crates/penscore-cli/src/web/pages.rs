//! HTML rendering.

use std::fmt::Write;

use axum::response::Html;
use html_escape::{encode_double_quoted_attribute, encode_text};

use penscore_core::analysis::WEAK_THRESHOLD;
use penscore_core::dashboard::DashboardStats;
use penscore_core::{Criterion, Report, Ruling, Scores, Worksheet};

use super::session::SessionUser;

const STYLE: &str = "body{font-family:sans-serif;max-width:960px;margin:0 auto;padding:1em}\
nav a{margin-right:1em}table{border-collapse:collapse}td,th{border:1px solid #ccc;padding:4px 8px}\
.weak{color:#d9534f}.badge{color:#fff;padding:2px 8px;border-radius:4px}\
.sheet .row{height:48px;border-bottom:1px solid #999;font-size:28px;color:#bbb}\
.sheet .row.double{border-top:1px dashed #bbb}\
@media print{nav,form{display:none}}";

pub fn layout(title: &str, user: Option<&SessionUser>, body: &str) -> Html<String> {
    let account = match user {
        Some(user) => format!(
            "<a href=\"/dashboard\">Dashboard</a><a href=\"/reports\">Reports</a>\
             <span>{}</span> <a href=\"/logout\">Logout</a>",
            encode_text(&user.name)
        ),
        None => "<a href=\"/login\">Login</a><a href=\"/register\">Register</a>".to_string(),
    };

    Html(format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{title}</title>\
         <style>{STYLE}</style></head><body>\
         <nav><a href=\"/\">Home</a><a href=\"/upload\">Analyse</a>\
         <a href=\"/practice\">Practice</a>{account}</nav>\
         <h1>{title}</h1>{body}</body></html>",
        title = encode_text(title),
    ))
}

pub fn home(user: Option<&SessionUser>) -> Html<String> {
    let greeting = match user {
        Some(user) => format!("<p>Welcome back, {}.</p>", encode_text(&user.name)),
        None => "<p>Log in to keep a history of your analyses.</p>".to_string(),
    };
    let body = format!(
        "{greeting}<p>Upload a photo of your handwriting in English or Devanagari \
         and get scores for slant, spacing and letter consistency, or for \
         shirorekha, matras and height uniformity.</p>\
         <p><a href=\"/upload\">Analyse a sample</a> | <a href=\"/practice\">Practice sheets</a></p>"
    );
    layout("Handwriting Analysis", user, &body)
}

pub fn register_form() -> Html<String> {
    layout(
        "Register",
        None,
        "<form method=\"post\" action=\"/register\">\
         <p><label>Name <input name=\"name\" required></label></p>\
         <p><label>Email <input name=\"email\" type=\"email\" required></label></p>\
         <p><label>Password <input name=\"password\" type=\"password\" required></label></p>\
         <p><button>Register</button></p></form>",
    )
}

pub fn login_form() -> Html<String> {
    layout(
        "Login",
        None,
        "<form method=\"post\" action=\"/login\">\
         <p><label>Email <input name=\"email\" type=\"email\" required></label></p>\
         <p><label>Password <input name=\"password\" type=\"password\" required></label></p>\
         <p><button>Login</button></p></form>",
    )
}

pub fn upload_form(user: Option<&SessionUser>) -> Html<String> {
    layout(
        "Analyse Handwriting",
        user,
        "<form method=\"post\" action=\"/upload\" enctype=\"multipart/form-data\">\
         <p><input type=\"file\" name=\"file\" accept=\"image/*\" required></p>\
         <p><label>Script <select name=\"language\">\
         <option value=\"english\">English</option>\
         <option value=\"devanagari\">Devanagari (Hindi / Marathi)</option>\
         </select></label></p><p><button>Analyse</button></p></form>",
    )
}

fn score_table(scores: &Scores, overall: f64) -> String {
    let mut rows = String::new();
    for (criterion, value) in scores.entries() {
        let class = if value < WEAK_THRESHOLD { " class=\"weak\"" } else { "" };
        let _ = write!(
            rows,
            "<tr><th>{}</th><td{class}>{value:.1}%</td></tr>",
            criterion.label()
        );
    }
    format!("<table>{rows}<tr><th>Overall</th><td><b>{overall:.1}%</b></td></tr></table>")
}

fn labels(criteria: &[Criterion]) -> String {
    if criteria.is_empty() {
        return "None".to_string();
    }
    criteria.iter().map(|c| c.label()).collect::<Vec<_>>().join(", ")
}

fn list(items: &[String]) -> String {
    let items: String = items.iter().map(|i| format!("<li>{}</li>", encode_text(i))).collect();
    format!("<ul>{items}</ul>")
}

/// Everything shown on a result page.
pub struct ResultView<'a> {
    pub image_url: String,
    pub processed_url: String,
    pub scores: &'a Scores,
    pub overall: f64,
    pub weak_areas: &'a [Criterion],
    pub feedback: &'a [String],
    pub features: Vec<(&'static str, f64)>,
    pub report_id: Option<i64>,
}

pub fn result(view: ResultView<'_>, user: Option<&SessionUser>) -> Html<String> {
    let mut body = format!(
        "<p>Script: {}</p>\
         <div><img src=\"{}\" alt=\"Original\" width=\"320\"> \
         <img src=\"{}\" alt=\"Processed\" width=\"320\"></div>\
         <h2>Scores</h2>{}\
         <p>Weak areas: {}</p><h2>Feedback</h2>{}",
        view.scores.language().display_name(),
        encode_double_quoted_attribute(&view.image_url),
        encode_double_quoted_attribute(&view.processed_url),
        score_table(view.scores, view.overall),
        labels(view.weak_areas),
        list(view.feedback),
    );

    if !view.features.is_empty() {
        body.push_str("<h2>Measurements</h2><table>");
        for (name, value) in &view.features {
            let _ = write!(body, "<tr><th>{name}</th><td>{value:.3}</td></tr>");
        }
        body.push_str("</table>");
    }

    match view.report_id {
        Some(id) => {
            let _ = write!(
                body,
                "<p><a href=\"/download_report/{id}\">Download PDF report</a> | \
                 <a href=\"/reports\">All reports</a></p>"
            );
        }
        None => body.push_str("<p><a href=\"/login\">Log in</a> to save your results.</p>"),
    }

    layout("Analysis Result", user, &body)
}

pub fn reports(reports: &[Report], user: &SessionUser) -> Html<String> {
    if reports.is_empty() {
        return layout(
            "Your Reports",
            Some(user),
            "<p>No reports yet. <a href=\"/upload\">Analyse a sample</a>.</p>",
        );
    }

    let mut rows = String::new();
    for report in reports {
        let _ = write!(
            rows,
            "<tr><td>{date}</td><td>{lang}</td><td>{overall:.1}%</td><td>{lowest}</td>\
             <td><a href=\"/view_report/{id}\">View</a> \
             <a href=\"/download_report/{id}\">PDF</a> \
             <form method=\"post\" action=\"/delete_report/{id}\" style=\"display:inline\">\
             <button>Delete</button></form></td></tr>",
            id = report.id,
            date = encode_text(&report.date()),
            lang = report.language().display_name(),
            overall = report.overall,
            lowest = labels(&report.scores.lowest()),
        );
    }

    let body = format!(
        "<table><tr><th>Date</th><th>Script</th><th>Overall</th><th>Needs most work</th>\
         <th></th></tr>{rows}</table>"
    );
    layout("Your Reports", Some(user), &body)
}

fn chart(dates: &[String], values: &[f64]) -> String {
    const WIDTH: f64 = 600.0;
    const HEIGHT: f64 = 200.0;

    if values.is_empty() {
        return String::new();
    }
    let step = if values.len() > 1 {
        WIDTH / (values.len() - 1) as f64
    } else {
        0.0
    };
    let points: Vec<String> = values
        .iter()
        .enumerate()
        .map(|(i, v)| format!("{:.1},{:.1}", i as f64 * step, HEIGHT - v / 100.0 * HEIGHT))
        .collect();
    let title = dates.last().map(|d| encode_text(d).into_owned()).unwrap_or_default();

    format!(
        "<svg width=\"{WIDTH}\" height=\"{HEIGHT}\" viewBox=\"0 0 {WIDTH} {HEIGHT}\">\
         <title>Overall score up to {title}</title>\
         <polyline fill=\"none\" stroke=\"#0275d8\" stroke-width=\"2\" points=\"{}\"/></svg>",
        points.join(" ")
    )
}

pub fn dashboard(stats: Option<&DashboardStats>, user: &SessionUser) -> Html<String> {
    let Some(stats) = stats else {
        return layout(
            "Dashboard",
            Some(user),
            "<p>No reports yet. <a href=\"/upload\">Analyse your first sample</a>.</p>",
        );
    };

    let progress = &stats.progress;
    let mut body = format!(
        "<p><span class=\"badge\" style=\"background:{color}\">{badge}</span> \
         Next: {next} ({remaining} more)</p>\
         <table><tr><th>Total reports</th><td>{total}</td></tr>\
         <tr><th>Average</th><td>{avg:.2}%</td></tr>\
         <tr><th>Best</th><td>{best:.1}%</td></tr>\
         <tr><th>Worst</th><td>{worst:.1}%</td></tr>\
         <tr><th>Improvement</th><td>{improvement:.2}%</td></tr></table>",
        color = progress.badge.color(),
        badge = progress.badge.name(),
        next = encode_text(&progress.next_badge),
        remaining = progress.remaining,
        total = stats.total_reports,
        avg = stats.average_score,
        best = stats.best_score,
        worst = stats.worst_score,
        improvement = stats.improvement,
    );

    for script in &stats.scripts {
        let _ = write!(
            body,
            "<h2>{} averages ({} reports)</h2><table>",
            script.language.display_name(),
            script.reports
        );
        for (criterion, value) in &script.traits {
            let _ = write!(body, "<tr><th>{}</th><td>{value:.1}%</td></tr>", criterion.label());
        }
        body.push_str("</table>");
    }

    body.push_str("<h2>Progress</h2>");
    body.push_str(&chart(&stats.chart.dates, &stats.chart.overall));
    body.push_str("<h2>Suggestions</h2>");
    body.push_str(&list(&stats.suggestions));

    layout("Dashboard", Some(user), &body)
}

pub fn practice_menu(user: Option<&SessionUser>) -> Html<String> {
    layout(
        "Practice Sheets",
        user,
        "<ul><li><a href=\"/worksheet/english/az\">English A to Z</a></li>\
         <li><a href=\"/worksheet/cursive\">Cursive</a></li>\
         <li><a href=\"/worksheet/devanagari/matra\">Devanagari matras</a></li>\
         <li><a href=\"/worksheet/devanagari/shirorekha\">Shirorekha</a></li>\
         <li><a href=\"/worksheet\">Custom worksheet</a></li></ul>\
         <form onsubmit=\"location.href='/full_practice/'+encodeURIComponent(this.t.value);return false\">\
         <input name=\"t\" placeholder=\"Text to trace\"> <button>Full page</button></form>",
    )
}

pub fn worksheet_form(user: Option<&SessionUser>) -> Html<String> {
    layout(
        "Custom Worksheet",
        user,
        "<form method=\"post\" action=\"/worksheet\">\
         <p><label>Heading <input name=\"heading\"></label></p>\
         <p><textarea name=\"text\" rows=\"10\" cols=\"50\"></textarea></p>\
         <p><label><input type=\"checkbox\" name=\"double_line\"> Double lines</label></p>\
         <p><button>Create</button></p></form>",
    )
}

pub fn worksheet(sheet: &Worksheet, user: Option<&SessionUser>) -> Html<String> {
    let mut body = String::from("<div class=\"sheet\">");
    for line in &sheet.lines {
        let class = match line.ruling {
            Ruling::Single => "row",
            Ruling::Double => "row double",
        };
        let _ = write!(body, "<div class=\"{class}\">{}</div>", encode_text(&line.sample));
    }
    body.push_str("</div>");
    layout(&sheet.heading, user, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_escapes_user_name() {
        let user = SessionUser {
            id: 1,
            name: "<b>Tom & Jerry</b>".to_string(),
        };
        let Html(html) = layout("Home", Some(&user), "");

        assert!(html.contains("<span>&lt;b&gt;Tom &amp; Jerry&lt;/b&gt;</span>"));
        assert!(!html.contains("<b>Tom"));
    }

    #[test]
    fn test_worksheet_rows() {
        let sheet = Worksheet::from_text("<Mine>", "one\ntwo", Ruling::Double);
        let Html(html) = worksheet(&sheet, None);

        assert!(html.contains("<h1>&lt;Mine&gt;</h1>"));
        assert_eq!(html.matches("row double").count(), 2);
    }
}
