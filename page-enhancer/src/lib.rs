//! Browser-side enhancement layer for the stock lookup page.
//!
//! The hosting page constructs a [`PageEnhancer`] once after
//! `DOMContentLoaded`; the constructor performs four independent one-shot
//! bindings (period auto-submit, chart fade-in, tooltip activation, form
//! validation styling) and returns a handle that owns the tooltip widgets for
//! the lifetime of the page. There is no explicit teardown; the browser drops
//! everything on unload.

use enhancer_core::{EnhancerConfig, SetupReport};

#[cfg(target_arch = "wasm32")]
use std::cell::RefCell;
#[cfg(target_arch = "wasm32")]
use std::rc::Rc;

#[cfg(target_arch = "wasm32")]
use enhancer_core::{reveal_path, submit_decision, FadeState, RevealPath, OPACITY_HIDDEN};
#[cfg(target_arch = "wasm32")]
use gloo_timers::future::TimeoutFuture;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::closure::Closure;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsCast;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen_futures::spawn_local;
#[cfg(target_arch = "wasm32")]
use web_sys::{window, Document, Element, Event, HtmlFormElement, HtmlImageElement};

// ---------- Host boundary helpers (portable) ---------------------------------

/// Parse and validate a JSON [`EnhancerConfig`] as received from the host.
/// Missing fields keep their defaults.
pub fn config_from_json(json: &str) -> Result<EnhancerConfig, String> {
    let config: EnhancerConfig = serde_json::from_str(json).map_err(|e| e.to_string())?;
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

/// Console line emitted once after setup. Behaviors that found nothing to
/// bind are listed so a mis-deployed page is visible at a glance.
pub fn setup_log_line(report: &SetupReport) -> String {
    let inactive = report.inactive();
    if inactive.is_empty() {
        format!("page enhancer: {}", report.summary())
    } else {
        let names: Vec<&str> = inactive.iter().map(|b| b.name()).collect();
        format!(
            "page enhancer: {} (inactive: {})",
            report.summary(),
            names.join(", ")
        )
    }
}

// ---------- Tooltip capability -----------------------------------------------

/// "Given an element, produce one opaque interactive widget."
///
/// The enhancer never looks inside the widget; rendering, positioning and
/// show/hide are owned by the UI framework behind the impl.
#[cfg(target_arch = "wasm32")]
pub trait TooltipFactory {
    fn attach(&mut self, element: &Element) -> Result<(), JsValue>;
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
extern "C" {
    /// Opaque tooltip widget constructed by the page-global UI framework.
    #[wasm_bindgen(js_namespace = bootstrap)]
    type Tooltip;

    #[wasm_bindgen(constructor, js_namespace = bootstrap)]
    fn new(element: &Element) -> Tooltip;
}

/// Production factory delegating to `bootstrap.Tooltip`. Widgets are created
/// once per trigger element and retained until the handle is dropped.
#[cfg(target_arch = "wasm32")]
#[derive(Default)]
pub struct BootstrapTooltips {
    widgets: Vec<Tooltip>,
}

#[cfg(target_arch = "wasm32")]
impl BootstrapTooltips {
    pub fn count(&self) -> u32 {
        self.widgets.len() as u32
    }
}

#[cfg(target_arch = "wasm32")]
impl TooltipFactory for BootstrapTooltips {
    fn attach(&mut self, element: &Element) -> Result<(), JsValue> {
        self.widgets.push(Tooltip::new(element));
        Ok(())
    }
}

// ---------- DOM wiring (wasm) ------------------------------------------------

#[cfg(target_arch = "wasm32")]
fn document() -> Result<Document, JsValue> {
    window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))
}

/// Move the fade to its terminal phase and mirror it into the inline style.
/// Safe to call from both writers; later calls are no-ops visually.
#[cfg(target_arch = "wasm32")]
fn reveal_now(image: &HtmlImageElement, fade: &Rc<RefCell<FadeState>>) {
    let mut state = fade.borrow_mut();
    state.reveal();
    if let Err(err) = image.style().set_property("opacity", state.opacity()) {
        web_sys::console::error_1(&err);
    }
}

/// Attach a change listener to every radio in the period group. The handler
/// resolves the form at event time and submits it; no debounce, the selected
/// value is never inspected.
#[cfg(target_arch = "wasm32")]
fn bind_period_autosubmit(doc: &Document, config: &EnhancerConfig) -> Result<u32, JsValue> {
    let radios = doc.query_selector_all(&config.period_radio_selector())?;
    let mut bound = 0;
    for idx in 0..radios.length() {
        let node = match radios.item(idx) {
            Some(node) => node,
            None => continue,
        };
        let radio: Element = node
            .dyn_into()
            .map_err(|_| JsValue::from_str("period radio is not an element"))?;

        let doc = doc.clone();
        let form_id = config.form_id.clone();
        let closure = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |_event: Event| {
            let form = doc
                .get_element_by_id(&form_id)
                .and_then(|el| el.dyn_into::<HtmlFormElement>().ok());
            match form {
                Some(form) => {
                    if let Err(err) = form.submit() {
                        web_sys::console::error_1(&err);
                    }
                }
                // Page authoring fault; surface it and leave the page alone.
                None => web_sys::console::error_1(&JsValue::from_str(
                    "auto-submit: stock form missing or not a form",
                )),
            }
        }));
        radio.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref())?;
        closure.forget();
        bound += 1;
    }
    Ok(bound)
}

/// Hide the chart image and reveal it once loaded.
///
/// The load event may already have fired before the listener is attached
/// (cached image), so the `complete` flag is probed independently. Both
/// writers go through the same [`FadeState`] merge and converge on opaque.
/// The deferred reveal is never cancelled, even if the image is detached
/// before the delay elapses.
#[cfg(target_arch = "wasm32")]
fn bind_chart_fade(doc: &Document, config: &EnhancerConfig) -> Result<bool, JsValue> {
    let element = match doc.query_selector(&config.chart_selector)? {
        Some(el) => el,
        None => return Ok(false),
    };
    let image: HtmlImageElement = element
        .dyn_into()
        .map_err(|_| JsValue::from_str("chart element is not an image"))?;

    let style = image.style();
    style.set_property("opacity", OPACITY_HIDDEN)?;
    style.set_property("transition", &config.fade_transition)?;

    let fade = Rc::new(RefCell::new(FadeState::hidden()));

    {
        let image = image.clone();
        let fade = fade.clone();
        let delay = config.fade_delay_ms;
        let closure = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |_event: Event| {
            let image = image.clone();
            let fade = fade.clone();
            spawn_local(async move {
                TimeoutFuture::new(delay).await;
                reveal_now(&image, &fade);
            });
        }));
        image.add_event_listener_with_callback("load", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    match reveal_path(image.complete()) {
        RevealPath::Immediate => reveal_now(&image, &fade),
        RevealPath::AfterLoad => {}
    }
    Ok(true)
}

/// Construct one tooltip widget per trigger element.
#[cfg(target_arch = "wasm32")]
fn activate_tooltips(
    doc: &Document,
    config: &EnhancerConfig,
    tooltips: &mut impl TooltipFactory,
) -> Result<u32, JsValue> {
    let triggers = doc.query_selector_all(&config.tooltip_selector)?;
    let mut attached = 0;
    for idx in 0..triggers.length() {
        if let Some(node) = triggers.item(idx) {
            let element: Element = node
                .dyn_into()
                .map_err(|_| JsValue::from_str("tooltip trigger is not an element"))?;
            tooltips.attach(&element)?;
            attached += 1;
        }
    }
    Ok(attached)
}

/// Attach the submit listener that cancels invalid submissions and marks the
/// form so validation-state styling becomes visible. Validation rules
/// themselves are declared in markup and checked by the browser.
#[cfg(target_arch = "wasm32")]
fn bind_form_validation(doc: &Document, config: &EnhancerConfig) -> Result<bool, JsValue> {
    let element = match doc.get_element_by_id(&config.form_id) {
        Some(el) => el,
        None => return Ok(false),
    };
    let form: HtmlFormElement = element
        .dyn_into()
        .map_err(|_| JsValue::from_str("stock form is not a form element"))?;

    let validated_class = config.validated_class.clone();
    let form_clone = form.clone();
    let closure = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |event: Event| {
        let decision = submit_decision(form_clone.check_validity());
        if decision.cancel {
            event.prevent_default();
            event.stop_propagation();
        }
        if decision.mark_validated {
            if let Err(err) = form_clone.class_list().add_1(&validated_class) {
                web_sys::console::error_1(&err);
            }
        }
    }));
    form.add_event_listener_with_callback("submit", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(true)
}

/// Run the four one-shot bindings against `doc`.
///
/// Behaviors are independent and order-insensitive; each touches only its own
/// elements. An absent chart or form is skipped and reported; empty radio or
/// tooltip queries simply bind nothing.
#[cfg(target_arch = "wasm32")]
pub fn enhance_document(
    doc: &Document,
    config: &EnhancerConfig,
    tooltips: &mut impl TooltipFactory,
) -> Result<SetupReport, JsValue> {
    Ok(SetupReport {
        period_radios: bind_period_autosubmit(doc, config)?,
        chart_bound: bind_chart_fade(doc, config)?,
        tooltips: activate_tooltips(doc, config, tooltips)?,
        form_bound: bind_form_validation(doc, config)?,
    })
}

// ---------- Public handle for JS ---------------------------------------------

/// Page enhancer handle for JS.
///
/// Construct exactly once after the document is ready; bindings live until
/// the page unloads.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub struct PageEnhancer {
    config: EnhancerConfig,
    report: SetupReport,
    tooltips: BootstrapTooltips,
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
impl PageEnhancer {
    /// Enhance the current document with the stock page defaults.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<PageEnhancer, JsValue> {
        Self::with_parsed(EnhancerConfig::default())
    }

    /// Enhance with a JSON [`EnhancerConfig`]; missing fields keep defaults.
    pub fn with_config(config_json: &str) -> Result<PageEnhancer, JsValue> {
        let config = config_from_json(config_json).map_err(|e| JsValue::from_str(&e))?;
        Self::with_parsed(config)
    }

    /// Effective configuration as JSON for host-side inspection.
    pub fn config_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.config).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Setup report as JSON for host-side inspection.
    pub fn report_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.report).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Number of tooltip widgets owned by this handle.
    pub fn tooltip_count(&self) -> u32 {
        self.tooltips.count()
    }
}

#[cfg(target_arch = "wasm32")]
impl PageEnhancer {
    fn with_parsed(config: EnhancerConfig) -> Result<PageEnhancer, JsValue> {
        let doc = document()?;
        let mut tooltips = BootstrapTooltips::default();
        let report = enhance_document(&doc, &config, &mut tooltips)?;
        web_sys::console::debug_1(&setup_log_line(&report).into());
        Ok(PageEnhancer {
            config,
            report,
            tooltips,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_from_json_accepts_partial_config() {
        let config = config_from_json(r#"{"period_field":"range"}"#).unwrap();
        assert_eq!(config.period_field, "range");
        assert_eq!(config.form_id, "stock-form");
    }

    #[test]
    fn config_from_json_rejects_malformed_json() {
        let err = config_from_json("{not json").unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn config_from_json_rejects_invalid_config() {
        let err = config_from_json(r#"{"validated_class":""}"#).unwrap_err();
        assert!(err.contains("validated_class"));
    }

    #[test]
    fn setup_log_line_includes_counts() {
        let report = SetupReport {
            period_radios: 6,
            chart_bound: true,
            tooltips: 3,
            form_bound: true,
        };
        assert_eq!(
            setup_log_line(&report),
            "page enhancer: 6 period radios, chart bound, 3 tooltips, form bound"
        );
    }

    #[test]
    fn setup_log_line_lists_inactive_behaviors() {
        let report = SetupReport {
            period_radios: 2,
            chart_bound: true,
            tooltips: 0,
            form_bound: false,
        };
        assert_eq!(
            setup_log_line(&report),
            "page enhancer: 2 period radios, chart bound, 0 tooltips, form absent \
             (inactive: tooltips, form-validation)"
        );
    }
}
