//! Full-page rendering for `GET /`.

use minijinja::{AutoEscape, Environment, context};
use quakewatch_dashboard::{Labels, ResultArea, ViewState};

const PAGE: &str = "page.html";

/// Renders the dashboard page from the current view state.
pub struct PageRenderer {
    env: Environment<'static>,
    labels: &'static Labels,
}

impl std::fmt::Debug for PageRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageRenderer")
            .field("title", &self.labels.title)
            .finish_non_exhaustive()
    }
}

impl PageRenderer {
    /// Compile the built-in page template.
    pub fn new(labels: &'static Labels) -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.add_template(PAGE, include_str!("../templates/page.html"))?;
        Ok(Self { env, labels })
    }

    /// Render the page.
    ///
    /// The result container and city rows hold fragments already escaped
    /// by the dashboard renderer, so they are inserted verbatim. Plain-text
    /// results are escaped here.
    pub fn render(&self, state: &ViewState) -> Result<String, minijinja::Error> {
        let (result_html, result_text) = match &state.result {
            ResultArea::Empty => (None, None),
            ResultArea::Html(html) => (Some(html.as_str()), None),
            ResultArea::Text(text) => (None, Some(text.as_str())),
        };
        self.env.get_template(PAGE)?.render(context! {
            title => self.labels.title,
            caption => self.labels.countdown_caption,
            city_headings => self.labels.city_headings,
            trigger_label => &state.trigger_label,
            result_html => result_html,
            result_text => result_text,
            timer_text => &state.timer_text,
            city_rows => &state.city_rows,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use quakewatch_dashboard::labels::{EN, TR};

    use super::*;

    fn state() -> ViewState {
        ViewState {
            trigger_label: "Fetch Data".to_owned(),
            result: ResultArea::Empty,
            timer_text: String::new(),
            city_rows: Vec::new(),
        }
    }

    #[test]
    fn page_has_all_elements() {
        let page = PageRenderer::new(&EN).unwrap().render(&state()).unwrap();
        for id in ["fetch-data", "result", "timer", "closestCitiesTable"] {
            assert!(page.contains(&format!("id=\"{id}\"")), "missing #{id}");
        }
        assert!(page.contains(">Fetch Data<"));
    }

    #[test]
    fn fragments_are_inserted_verbatim_and_text_is_escaped() {
        let renderer = PageRenderer::new(&TR).unwrap();

        let mut s = state();
        s.result = ResultArea::Html("<table class=\"x\"></table>".to_owned());
        s.city_rows = vec!["<tr><td>Izmir</td></tr>".to_owned()];
        let page = renderer.render(&s).unwrap();
        assert!(page.contains("<table class=\"x\"></table>"));
        assert!(page.contains("<tr><td>Izmir</td></tr>"));

        s.result = ResultArea::Text("<b>down</b>".to_owned());
        let page = renderer.render(&s).unwrap();
        assert!(page.contains("&lt;b&gt;down&lt;/b&gt;"));
    }
}
