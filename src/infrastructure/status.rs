//! HTML status page.
//!
//! Renders one table per strategy in use. Fixed-window hosts get the
//! `Vhost / Count / Limit / Current / UpdatedAt / LeftTime` columns and
//! sliding-window hosts get `Vhost / Count / Time / 64/Ring`, the column
//! sets operators of the server module are used to.

use crate::domain::report::{HostReport, ReportDetail};
use std::fmt::Write;

const FIXED_HEADER: &str = "<table><tr><th>Vhost</th><th>Count</th><th>Limit</th>\
<th>Current</th><th>UpdatedAt</th><th>LeftTime</th></tr>\n";

const SLIDING_HEADER: &str =
    "<table><tr><th>Vhost</th><th>Count</th><th>Time</th><th>64/Ring</th></tr>\n";

/// Content type of the rendered page.
pub const STATUS_CONTENT_TYPE: &str = "text/html";

/// Render status rows as HTML tables.
///
/// Rows keep their order within each table. With no rows at all an empty
/// fixed-window table is rendered.
pub fn render_html(reports: &[HostReport]) -> String {
    let (fixed, sliding): (Vec<_>, Vec<_>) = reports
        .iter()
        .partition(|report| matches!(report.detail, ReportDetail::Fixed { .. }));

    let mut page = String::new();
    if !fixed.is_empty() || sliding.is_empty() {
        page.push_str(FIXED_HEADER);
        for report in &fixed {
            fixed_row(&mut page, report);
        }
        page.push_str("</table>\n");
    }
    if !sliding.is_empty() {
        page.push_str(SLIDING_HEADER);
        for report in &sliding {
            sliding_row(&mut page, report);
        }
        page.push_str("</table>\n");
    }
    page
}

fn host_cell(page: &mut String, report: &HostReport) {
    let host = escape(report.host.as_str());
    // Writing into a String cannot fail.
    let _ = write!(page, "<td><a href='http://{0}/'>{0}</a></td>", host);
}

fn fixed_row(page: &mut String, report: &HostReport) {
    if let ReportDetail::Fixed {
        limit,
        current_count,
        window_ends_at,
        remaining,
    } = report.detail
    {
        page.push_str("<tr>");
        host_cell(page, report);
        let _ = writeln!(
            page,
            "<td>{}</td><td>{}</td><td bgcolor='#CCCCCC'>{}</td><td>{}</td><td>{}</td></tr>",
            report.total_count, limit, current_count, window_ends_at, remaining
        );
    }
}

fn sliding_row(page: &mut String, report: &HostReport) {
    if let ReportDetail::Sliding {
        update_period,
        oldest_age,
    } = report.detail
    {
        page.push_str("<tr>");
        host_cell(page, report);
        let _ = write!(
            page,
            "<td>{}</td><td>{}</td><td>",
            report.total_count, update_period
        );
        match oldest_age {
            Some(age) => {
                let _ = write!(page, "{}", age);
            }
            None => page.push('-'),
        }
        page.push_str("</td></tr>\n");
    }
}

/// Escape text for use in HTML content and single- or double-quoted
/// attributes.
pub fn escape(text: &str) -> String {
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
