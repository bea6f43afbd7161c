//! Server-side rendering of the classification form.

use crate::classifier::{ModelKind, Threshold};
use crate::pipeline::Classification;
use crate::utils::format_percent;

const STYLE: &str = "body{font-family:'Segoe UI',Tahoma,sans-serif;background:#e0f2fe;color:#0b2c5f;padding:24px}\
.container{max-width:760px;margin:0 auto;background:#fff;padding:32px 40px;border-radius:20px;box-shadow:0 16px 48px rgba(37,99,235,.25)}\
label{display:block;margin-top:14px;font-weight:600}\
input,select{width:100%;padding:10px;margin-top:6px;border:1px solid #93c5fd;border-radius:10px}\
button{margin-top:18px;padding:12px 24px;border:0;border-radius:10px;background:#2563eb;color:#fff;font-weight:600}\
.error{margin-top:20px;padding:14px;border-radius:10px;background:#fee2e2;color:#991b1b}\
.result{margin-top:24px}.tag{display:inline-block;margin:4px;padding:4px 12px;border-radius:999px;background:#dbeafe}\
.note{color:#92400e}table{width:100%;border-collapse:collapse;margin-top:12px}\
td,th{padding:6px 8px;border-bottom:1px solid #e5e7eb;text-align:left}tr.selected td{font-weight:700}";

/// Everything the page shows for one render.
#[derive(Debug)]
pub struct PageView<'a> {
    /// Every model selector with whether it is loaded.
    pub models: Vec<(ModelKind, bool)>,
    pub selected_model: ModelKind,
    /// Threshold the user typed, echoed back into the form.
    pub threshold_percent: Option<f64>,
    pub default_threshold: Threshold,
    /// Absent on a plain GET.
    pub outcome: Option<Result<&'a Classification, String>>,
}

pub fn render_page(view: &PageView<'_>) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str("<!DOCTYPE html>\n<html lang=\"vi\">\n<head>\n<meta charset=\"UTF-8\">\n");
    html.push_str("<title>Phân loại bài báo</title>\n");
    html.push_str(&format!("<style>{STYLE}</style>\n</head>\n<body>\n<div class=\"container\">\n"));
    html.push_str("<h1>Phân loại bài báo</h1>\n");
    html.push_str(&render_form(view));
    match &view.outcome {
        Some(Ok(result)) => html.push_str(&render_result(result)),
        Some(Err(message)) => html.push_str(&format!(
            "<div class=\"error\">{}</div>\n",
            escape_html(message)
        )),
        None => {}
    }
    html.push_str("</div>\n</body>\n</html>\n");
    html
}

fn render_form(view: &PageView<'_>) -> String {
    let options: String = view
        .models
        .iter()
        .map(|(kind, available)| {
            let selected = if *kind == view.selected_model { " selected" } else { "" };
            let suffix = if *available { "" } else { " (not loaded)" };
            format!(
                "<option value=\"{}\"{selected}>{}{suffix}</option>\n",
                kind.selector(),
                kind.display_name()
            )
        })
        .collect();
    let threshold_value = view
        .threshold_percent
        .map(|p| format!(" value=\"{p}\""))
        .unwrap_or_default();

    format!(
        "<form method=\"post\" action=\"/\">\n\
         <label for=\"url\">Article URL</label>\n\
         <input type=\"text\" id=\"url\" name=\"url\" placeholder=\"https://vnexpress.net/...\" required>\n\
         <label for=\"model_type\">Model</label>\n\
         <select id=\"model_type\" name=\"model_type\">\n{options}</select>\n\
         <label for=\"threshold\">Threshold (%)</label>\n\
         <input type=\"number\" id=\"threshold\" name=\"threshold\" min=\"1\" max=\"99\" step=\"any\" placeholder=\"{}\"{threshold_value}>\n\
         <button type=\"submit\">Classify</button>\n\
         </form>\n",
        view.default_threshold.percent()
    )
}

fn render_result(result: &Classification) -> String {
    let tags: String = result
        .selected
        .by_confidence()
        .into_iter()
        .map(|l| format!("<span class=\"tag\">{}</span>", escape_html(&l.label)))
        .collect();
    let rows: String = result
        .prediction
        .scores
        .iter()
        .map(|s| {
            let class = if result.selected.names().any(|n| n == s.label) {
                " class=\"selected\""
            } else {
                ""
            };
            format!(
                "<tr{class}><td>{}</td><td>{}</td></tr>\n",
                escape_html(&s.label),
                format_percent(s.probability)
            )
        })
        .collect();
    let note = if result.selected.is_fallback() {
        format!(
            "<p class=\"note\">No label reached {}; the most probable label is shown.</p>\n",
            result.threshold
        )
    } else {
        String::new()
    };

    format!(
        "<div class=\"result\">\n\
         <h2>{}</h2>\n\
         <p>{} · threshold {}</p>\n\
         <div>{tags}</div>\n{note}\
         <table>\n<tr><th>Label</th><th>Probability</th></tr>\n{rows}</table>\n\
         </div>\n",
        escape_html(&result.title),
        result.model.display_name(),
        result.threshold
    )
}

/// Escape text for HTML element content and double-quoted attributes.
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::select_labels;
    use crate::models::{PredictionResult, ScoredLabel};

    fn view(outcome: Option<Result<&Classification, String>>) -> PageView<'_> {
        PageView {
            models: vec![(ModelKind::NaiveBayes, true), (ModelKind::Recurrent, false)],
            selected_model: ModelKind::NaiveBayes,
            threshold_percent: None,
            default_threshold: Threshold::DEFAULT,
            outcome,
        }
    }

    fn classification() -> Classification {
        let prediction = PredictionResult {
            scores: vec![
                ScoredLabel {
                    label: "giáo dục".into(),
                    probability: 0.2,
                },
                ScoredLabel {
                    label: "giải trí".into(),
                    probability: 0.95,
                },
            ],
        };
        let selected = select_labels(&prediction, Threshold::DEFAULT).unwrap();
        Classification {
            url: "https://vnexpress.net/a".into(),
            title: "Ca sĩ <b>lộ</b> clip".into(),
            model: ModelKind::NaiveBayes,
            threshold: Threshold::DEFAULT,
            prediction,
            selected,
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_form_marks_unavailable_models() {
        let html = render_page(&view(None));
        assert!(html.contains("<option value=\"nb\" selected>Naive Bayes</option>"));
        assert!(html.contains("<option value=\"rnn\">RNN (not loaded)</option>"));
        assert!(!html.contains("class=\"error\""));
    }

    #[test]
    fn test_result_is_escaped_and_tabulated() {
        let result = classification();
        let html = render_page(&view(Some(Ok(&result))));
        assert!(html.contains("Ca sĩ &lt;b&gt;lộ&lt;/b&gt; clip"));
        assert!(html.contains("<span class=\"tag\">giải trí</span>"));
        assert!(html.contains("<tr class=\"selected\"><td>giải trí</td><td>95.00%</td></tr>"));
        assert!(html.contains("<tr><td>giáo dục</td><td>20.00%</td></tr>"));
    }

    #[test]
    fn test_error_message_is_shown() {
        let html = render_page(&view(Some(Err("Invalid URL: <script>".into()))));
        assert!(html.contains("<div class=\"error\">Invalid URL: &lt;script&gt;</div>"));
    }
}
