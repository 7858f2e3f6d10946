//! DOM collaborators: screen elements, the wax seal, the owl, the candle
//! row and the countdown digit cells. Every lookup is optional; a missing
//! element degrades to a logged no-op instead of failing the experience.

use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement};

use crate::scenes::Screen;

/// Handles captured once at startup.
pub struct Stage {
    doc: Document,
    screens: Vec<(Screen, HtmlElement)>,
    pub seal: Option<HtmlElement>,
    pub owl: Option<HtmlElement>,
    pub candles: Option<HtmlElement>,
    pub audio_toggle: Option<HtmlElement>,
    pub audio_icon: Option<HtmlElement>,
    lock_cells: [Option<HtmlElement>; 3],
    dinner_cells: [Option<HtmlElement>; 3],
}

impl Stage {
    pub fn capture(doc: &Document) -> Self {
        let screens = Screen::ALL
            .iter()
            .filter_map(|s| by_id(doc, s.dom_id()).map(|el| (*s, el)))
            .collect::<Vec<_>>();
        if screens.len() < Screen::ALL.len() {
            log::warn!("only {} of {} screen elements present", screens.len(), Screen::ALL.len());
        }
        Self {
            doc: doc.clone(),
            screens,
            seal: by_id(doc, "wax-seal"),
            owl: by_id(doc, "hedwig"),
            candles: by_id(doc, "candles"),
            audio_toggle: by_id(doc, "audio-toggle"),
            audio_icon: query(doc, "#audio-toggle .audio-icon"),
            lock_cells: [
                by_id(doc, "lock-hours"),
                by_id(doc, "lock-minutes"),
                by_id(doc, "lock-seconds"),
            ],
            dinner_cells: [
                by_id(doc, "hours"),
                by_id(doc, "minutes"),
                by_id(doc, "seconds"),
            ],
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn screen_el(&self, screen: Screen) -> Option<&HtmlElement> {
        self.screens
            .iter()
            .find(|(s, _)| *s == screen)
            .map(|(_, el)| el)
    }

    /// Deactivate every screen, then activate `screen`.
    pub fn activate_only(&self, screen: Screen) {
        for (_, el) in &self.screens {
            remove_class(el, "active");
        }
        match self.screen_el(screen) {
            Some(el) => add_class(el, "active"),
            None => log::warn!("screen element missing: {}", screen.dom_id()),
        }
    }

    pub fn set_lock_cells(&self, h: &str, m: &str, s: &str) {
        set_cells(&self.lock_cells, h, m, s);
    }

    pub fn set_dinner_cells(&self, h: &str, m: &str, s: &str) {
        set_cells(&self.dinner_cells, h, m, s);
    }

    pub fn query(&self, selector: &str) -> Option<HtmlElement> {
        query(&self.doc, selector)
    }

    /// Populate the candle container with a numbered row.
    pub fn generate_candles(&self, count: usize) {
        let Some(container) = &self.candles else { return };
        let mut html = String::new();
        for i in 1..=count {
            html.push_str(&format!(
                "<div class=\"candle\" data-number=\"{i}\">\
                 <div class=\"candle-body\"><div class=\"candle-flame\"></div></div>\
                 <span class=\"candle-number\">{i}</span></div>"
            ));
        }
        container.set_inner_html(&html);
    }

    pub fn candle_elements(&self) -> Vec<HtmlElement> {
        collect_all(&self.doc, ".candle")
    }

    /// Remove the given classes from every element currently carrying any of
    /// them (restart cleanup).
    pub fn strip_classes(&self, classes: &[&str]) {
        let selector = classes
            .iter()
            .map(|c| format!(".{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        for el in collect_all(&self.doc, &selector) {
            for class in classes {
                remove_class(&el, class);
            }
        }
    }
}

fn set_cells(cells: &[Option<HtmlElement>; 3], h: &str, m: &str, s: &str) {
    for (cell, text) in cells.iter().zip([h, m, s]) {
        if let Some(el) = cell {
            el.set_text_content(Some(text));
        }
    }
}

pub fn by_id(doc: &Document, id: &str) -> Option<HtmlElement> {
    doc.get_element_by_id(id)?.dyn_into().ok()
}

pub fn query(doc: &Document, selector: &str) -> Option<HtmlElement> {
    doc.query_selector(selector).ok()??.dyn_into().ok()
}

fn collect_all(doc: &Document, selector: &str) -> Vec<HtmlElement> {
    let mut out = Vec::new();
    if let Ok(list) = doc.query_selector_all(selector) {
        for i in 0..list.length() {
            if let Some(el) = list.item(i).and_then(|n| n.dyn_into::<HtmlElement>().ok()) {
                out.push(el);
            }
        }
    }
    out
}

pub fn add_class(el: &Element, class: &str) {
    el.class_list().add_1(class).ok();
}

pub fn remove_class(el: &Element, class: &str) {
    el.class_list().remove_1(class).ok();
}

pub fn has_class(el: &Element, class: &str) -> bool {
    el.class_list().contains(class)
}

/// Center of an element's bounding box in viewport pixels.
pub fn center_of(el: &Element) -> (f64, f64) {
    let rect = el.get_bounding_client_rect();
    (rect.left() + rect.width() / 2.0, rect.top() + rect.height() / 2.0)
}

/// Top-center of an element's bounding box.
pub fn top_center_of(el: &Element) -> (f64, f64) {
    let rect = el.get_bounding_client_rect();
    (rect.left() + rect.width() / 2.0, rect.top())
}

/// Bottom-center of an element's bounding box.
pub fn bottom_center_of(el: &Element) -> (f64, f64) {
    let rect = el.get_bounding_client_rect();
    (rect.left() + rect.width() / 2.0, rect.top() + rect.height())
}

pub fn viewport_center() -> (f64, f64) {
    let Some(win) = web_sys::window() else {
        return (0.0, 0.0);
    };
    let w = win.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    let h = win.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    (w / 2.0, h / 2.0)
}
