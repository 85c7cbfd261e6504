//! HTML views rendered with Handlebars.

use handlebars::Handlebars;
use serde_json::json;

use crate::error::ViewError;
use crate::scenarios::ScenarioCatalog;

const DASHBOARD_TEMPLATE: &str = include_str!("../../templates/dashboard.hbs");
const CHART_DETAILS_TEMPLATE: &str = include_str!("../../templates/chart_details.hbs");

/// Client scripts served under `/assets`.
const ASSETS: [(&str, &str); 2] = [
    ("dashboard.js", include_str!("../../assets/dashboard.js")),
    ("chart.js", include_str!("../../assets/chart.js")),
];

/// Built-in client script by file name.
pub fn asset(name: &str) -> Option<&'static str> {
    ASSETS
        .iter()
        .find(|(file, _)| *file == name)
        .map(|(_, body)| *body)
}

const TITLE: &str = "CyberSecure SOC - AI/ML Threat Detection";

/// Chart panels linked from the dashboard.
pub const CHART_TYPES: [&str; 5] = ["threats", "timeline", "geographic", "performance", "network"];

/// Registry holding the compiled dashboard templates.
pub struct Views {
    registry: Handlebars<'static>,
}

impl std::fmt::Debug for Views {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Views").finish_non_exhaustive()
    }
}

impl Views {
    pub fn new() -> Result<Self, ViewError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        registry
            .register_template_string("dashboard", DASHBOARD_TEMPLATE)
            .map_err(Box::new)?;
        registry
            .register_template_string("chart_details", CHART_DETAILS_TEMPLATE)
            .map_err(Box::new)?;
        Ok(Self { registry })
    }

    pub fn dashboard(&self, scenarios: &ScenarioCatalog) -> Result<String, ViewError> {
        let scenarios: Vec<_> = scenarios
            .iter()
            .map(|(key, s)| {
                json!({
                    "key": key,
                    "name": s.name,
                    "description": s.description,
                    "severity": s.severity,
                })
            })
            .collect();
        let data = json!({
            "title": TITLE,
            "scenarios": scenarios,
            "charts": CHART_TYPES,
        });
        Ok(self.registry.render("dashboard", &data)?)
    }

    /// Detail page for one chart. `chart_type` is user input and is
    /// HTML-escaped by the template engine.
    pub fn chart_details(&self, chart_type: &str) -> Result<String, ViewError> {
        let data = json!({
            "title": TITLE,
            "chart_type": chart_type,
        });
        Ok(self.registry.render("chart_details", &data)?)
    }
}
