use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default identifiers and class names the stock lookup page ships with.
pub const DEFAULT_FORM_ID: &str = "stock-form";
pub const DEFAULT_PERIOD_FIELD: &str = "period";
pub const DEFAULT_CHART_SELECTOR: &str = ".stock-chart";
pub const DEFAULT_TOOLTIP_SELECTOR: &str = "[data-bs-toggle=\"tooltip\"]";
pub const DEFAULT_VALIDATED_CLASS: &str = "was-validated";

/// Fade-in timing: delay before the reveal, and the CSS transition used.
pub const DEFAULT_FADE_DELAY_MS: u32 = 100;
pub const DEFAULT_FADE_TRANSITION: &str = "opacity 0.5s ease-in";

/// Inline opacity values for the two fade phases.
pub const OPACITY_HIDDEN: &str = "0";
pub const OPACITY_VISIBLE: &str = "1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("empty field: {0}")]
    EmptyField(&'static str),
    #[error("fade transition must name a CSS transition")]
    EmptyTransition,
}

/// Selectors, identifiers and timings for one enhanced page.
///
/// Defaults match the stock lookup page markup; hosts embedding the enhancer
/// elsewhere can override individual fields through the builders or by
/// passing a JSON config across the wasm boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancerConfig {
    /// `id` of the form that both auto-submit and validation styling target.
    pub form_id: String,
    /// `name` attribute shared by the period radio group.
    pub period_field: String,
    /// Selector for the chart image, expected to match at most one `<img>`.
    pub chart_selector: String,
    /// Selector for tooltip trigger elements.
    pub tooltip_selector: String,
    /// Class added to the form on submit so validation styling shows.
    pub validated_class: String,
    /// Delay between the image `load` event and the reveal.
    pub fade_delay_ms: u32,
    /// Inline CSS transition installed on the chart image.
    pub fade_transition: String,
}

impl Default for EnhancerConfig {
    fn default() -> Self {
        Self {
            form_id: DEFAULT_FORM_ID.to_string(),
            period_field: DEFAULT_PERIOD_FIELD.to_string(),
            chart_selector: DEFAULT_CHART_SELECTOR.to_string(),
            tooltip_selector: DEFAULT_TOOLTIP_SELECTOR.to_string(),
            validated_class: DEFAULT_VALIDATED_CLASS.to_string(),
            fade_delay_ms: DEFAULT_FADE_DELAY_MS,
            fade_transition: DEFAULT_FADE_TRANSITION.to_string(),
        }
    }
}

impl EnhancerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_form_id(mut self, form_id: impl Into<String>) -> Self {
        self.form_id = form_id.into();
        self
    }

    pub fn with_period_field(mut self, period_field: impl Into<String>) -> Self {
        self.period_field = period_field.into();
        self
    }

    pub fn with_chart_selector(mut self, chart_selector: impl Into<String>) -> Self {
        self.chart_selector = chart_selector.into();
        self
    }

    pub fn with_tooltip_selector(mut self, tooltip_selector: impl Into<String>) -> Self {
        self.tooltip_selector = tooltip_selector.into();
        self
    }

    pub fn with_validated_class(mut self, validated_class: impl Into<String>) -> Self {
        self.validated_class = validated_class.into();
        self
    }

    pub fn with_fade_delay_ms(mut self, fade_delay_ms: u32) -> Self {
        self.fade_delay_ms = fade_delay_ms;
        self
    }

    pub fn with_fade_transition(mut self, fade_transition: impl Into<String>) -> Self {
        self.fade_transition = fade_transition.into();
        self
    }

    /// Selector matching every radio in the period group.
    pub fn period_radio_selector(&self) -> String {
        format!("input[type=\"radio\"][name=\"{}\"]", self.period_field)
    }

    /// Reject configs that would bind nothing meaningful.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.form_id.is_empty() {
            return Err(ConfigError::EmptyField("form_id"));
        }
        if self.period_field.is_empty() {
            return Err(ConfigError::EmptyField("period_field"));
        }
        if self.chart_selector.is_empty() {
            return Err(ConfigError::EmptyField("chart_selector"));
        }
        if self.tooltip_selector.is_empty() {
            return Err(ConfigError::EmptyField("tooltip_selector"));
        }
        if self.validated_class.is_empty() {
            return Err(ConfigError::EmptyField("validated_class"));
        }
        if self.fade_transition.is_empty() {
            return Err(ConfigError::EmptyTransition);
        }
        Ok(())
    }
}

/// Visual phase of the chart image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FadePhase {
    Hidden,
    Revealed,
}

/// Terminal-state merge for the chart fade.
///
/// Two writers race for the reveal: the already-complete probe at binding
/// time and the deferred `load` callback. Either may run first, both may run;
/// `reveal` is safe to apply any number of times and the phase only ever
/// moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeState {
    phase: FadePhase,
}

impl FadeState {
    pub fn hidden() -> Self {
        Self {
            phase: FadePhase::Hidden,
        }
    }

    pub fn phase(&self) -> FadePhase {
        self.phase
    }

    pub fn is_revealed(&self) -> bool {
        self.phase == FadePhase::Revealed
    }

    /// Move to `Revealed`; returns whether this call made the transition.
    pub fn reveal(&mut self) -> bool {
        let changed = self.phase == FadePhase::Hidden;
        self.phase = FadePhase::Revealed;
        changed
    }

    /// Inline opacity value for the current phase.
    pub fn opacity(&self) -> &'static str {
        match self.phase {
            FadePhase::Hidden => OPACITY_HIDDEN,
            FadePhase::Revealed => OPACITY_VISIBLE,
        }
    }
}

impl Default for FadeState {
    fn default() -> Self {
        Self::hidden()
    }
}

/// Which of the two fade paths applies at binding time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealPath {
    /// The image finished loading before the listener was attached.
    Immediate,
    /// Wait for the `load` event, then the configured delay.
    AfterLoad,
}

pub fn reveal_path(already_loaded: bool) -> RevealPath {
    if already_loaded {
        RevealPath::Immediate
    } else {
        RevealPath::AfterLoad
    }
}

/// Effects of one submit attempt against the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitDecision {
    /// Cancel the native submission and stop propagation.
    pub cancel: bool,
    /// Add the validated marker class. Always true, valid or not.
    pub mark_validated: bool,
}

/// Map the native constraint-validation result to submit effects.
pub fn submit_decision(form_valid: bool) -> SubmitDecision {
    SubmitDecision {
        cancel: !form_valid,
        mark_validated: true,
    }
}

/// The four one-shot bindings the enhancer installs per page load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Behavior {
    AutoSubmit,
    ChartFade,
    Tooltips,
    FormValidation,
}

impl Behavior {
    pub const ALL: [Behavior; 4] = [
        Behavior::AutoSubmit,
        Behavior::ChartFade,
        Behavior::Tooltips,
        Behavior::FormValidation,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Behavior::AutoSubmit => "auto-submit",
            Behavior::ChartFade => "chart-fade",
            Behavior::Tooltips => "tooltips",
            Behavior::FormValidation => "form-validation",
        }
    }
}

/// What one setup pass actually bound, surfaced to the host as JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupReport {
    /// Radios in the period group that got a change listener.
    pub period_radios: u32,
    /// Whether the chart image was found and styled.
    pub chart_bound: bool,
    /// Tooltip widgets constructed, one per trigger element.
    pub tooltips: u32,
    /// Whether the form got a submit listener.
    pub form_bound: bool,
}

impl SetupReport {
    /// Total listener/widget registrations made.
    pub fn bindings(&self) -> u32 {
        self.period_radios
            + self.tooltips
            + u32::from(self.chart_bound)
            + u32::from(self.form_bound)
    }

    /// Whether a behavior resulted in at least one binding.
    pub fn bound(&self, behavior: Behavior) -> bool {
        match behavior {
            Behavior::AutoSubmit => self.period_radios > 0,
            Behavior::ChartFade => self.chart_bound,
            Behavior::Tooltips => self.tooltips > 0,
            Behavior::FormValidation => self.form_bound,
        }
    }

    /// Behaviors that found nothing to bind on this page.
    pub fn inactive(&self) -> Vec<Behavior> {
        Behavior::ALL
            .into_iter()
            .filter(|b| !self.bound(*b))
            .collect()
    }

    /// One-line summary for the setup debug log.
    pub fn summary(&self) -> String {
        format!(
            "{} period radios, chart {}, {} tooltips, form {}",
            self.period_radios,
            if self.chart_bound { "bound" } else { "absent" },
            self.tooltips,
            if self.form_bound { "bound" } else { "absent" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_page_contract() {
        let cfg = EnhancerConfig::default();
        assert_eq!(cfg.form_id, "stock-form");
        assert_eq!(cfg.period_field, "period");
        assert_eq!(cfg.chart_selector, ".stock-chart");
        assert_eq!(cfg.tooltip_selector, "[data-bs-toggle=\"tooltip\"]");
        assert_eq!(cfg.validated_class, "was-validated");
        assert_eq!(cfg.fade_delay_ms, 100);
        assert_eq!(cfg.fade_transition, "opacity 0.5s ease-in");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn period_radio_selector_uses_field_name() {
        let cfg = EnhancerConfig::new().with_period_field("range");
        assert_eq!(
            cfg.period_radio_selector(),
            "input[type=\"radio\"][name=\"range\"]"
        );
    }

    #[test]
    fn builders_override_fields() {
        let cfg = EnhancerConfig::new()
            .with_form_id("quote-form")
            .with_chart_selector(".quote-chart")
            .with_fade_delay_ms(250);
        assert_eq!(cfg.form_id, "quote-form");
        assert_eq!(cfg.chart_selector, ".quote-chart");
        assert_eq!(cfg.fade_delay_ms, 250);
        // Untouched fields keep their defaults.
        assert_eq!(cfg.validated_class, DEFAULT_VALIDATED_CLASS);
    }

    #[test]
    fn validate_rejects_empty_fields() {
        let cfg = EnhancerConfig::new().with_form_id("");
        assert_eq!(cfg.validate(), Err(ConfigError::EmptyField("form_id")));
        let cfg = EnhancerConfig::new().with_tooltip_selector("");
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::EmptyField("tooltip_selector"))
        );
        let cfg = EnhancerConfig::new().with_fade_transition("");
        assert_eq!(cfg.validate(), Err(ConfigError::EmptyTransition));
    }

    #[test]
    fn config_json_roundtrip() {
        let cfg = EnhancerConfig::new().with_period_field("range");
        let json = serde_json::to_string(&cfg).unwrap();
        let decoded: EnhancerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, cfg);
    }

    #[test]
    fn partial_config_json_fills_defaults() {
        let decoded: EnhancerConfig = serde_json::from_str(r#"{"form_id":"f"}"#).unwrap();
        assert_eq!(decoded.form_id, "f");
        assert_eq!(decoded.period_field, DEFAULT_PERIOD_FIELD);
        assert_eq!(decoded.fade_delay_ms, DEFAULT_FADE_DELAY_MS);
    }

    #[test]
    fn fade_reveal_is_idempotent() {
        let mut fade = FadeState::hidden();
        assert_eq!(fade.phase(), FadePhase::Hidden);
        assert_eq!(fade.opacity(), "0");

        // First writer wins the transition.
        assert!(fade.reveal());
        assert!(fade.is_revealed());
        assert_eq!(fade.opacity(), "1");

        // Second writer converges on the same terminal state.
        assert!(!fade.reveal());
        assert!(fade.is_revealed());
        assert_eq!(fade.opacity(), "1");
    }

    #[test]
    fn reveal_path_picks_immediate_for_loaded_image() {
        assert_eq!(reveal_path(true), RevealPath::Immediate);
        assert_eq!(reveal_path(false), RevealPath::AfterLoad);
    }

    #[test]
    fn submit_decision_cancels_only_invalid() {
        let invalid = submit_decision(false);
        assert!(invalid.cancel);
        assert!(invalid.mark_validated);

        let valid = submit_decision(true);
        assert!(!valid.cancel);
        assert!(valid.mark_validated);
    }

    #[test]
    fn behavior_names_are_stable() {
        let names: Vec<&str> = Behavior::ALL.iter().map(|b| b.name()).collect();
        assert_eq!(
            names,
            vec!["auto-submit", "chart-fade", "tooltips", "form-validation"]
        );
    }

    #[test]
    fn report_tracks_inactive_behaviors() {
        let report = SetupReport {
            period_radios: 2,
            chart_bound: false,
            tooltips: 0,
            form_bound: true,
        };
        assert!(report.bound(Behavior::AutoSubmit));
        assert!(!report.bound(Behavior::ChartFade));
        assert_eq!(
            report.inactive(),
            vec![Behavior::ChartFade, Behavior::Tooltips]
        );
        assert_eq!(SetupReport::default().inactive().len(), 4);
    }

    #[test]
    fn report_counts_bindings() {
        let report = SetupReport {
            period_radios: 6,
            chart_bound: true,
            tooltips: 3,
            form_bound: true,
        };
        assert_eq!(report.bindings(), 11);
        assert_eq!(
            report.summary(),
            "6 period radios, chart bound, 3 tooltips, form bound"
        );

        let empty = SetupReport::default();
        assert_eq!(empty.bindings(), 0);
        assert_eq!(
            empty.summary(),
            "0 period radios, chart absent, 0 tooltips, form absent"
        );
    }

    #[test]
    fn report_json_roundtrip() {
        let report = SetupReport {
            period_radios: 2,
            chart_bound: false,
            tooltips: 4,
            form_bound: true,
        };
        let json = serde_json::to_string(&report).unwrap();
        let decoded: SetupReport = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, report);
    }
}
