//! Map Widget Bridge
//!
//! Binds the incident map to the Google Maps shim in `js/map_bridge.js`. The
//! widget renders tiles and markers; everything it draws is computed by
//! `wayfarer::map` and handed over as JSON.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use wayfarer::map::{Coordinate, MarkerSpec, WidgetMarker};

#[wasm_bindgen(module = "/js/map_bridge.js")]
extern "C" {
    #[wasm_bindgen(js_name = createMap)]
    fn create_map(
        element: &web_sys::HtmlElement,
        api_key: &str,
        lat: f64,
        lng: f64,
        zoom: u8,
        on_double_click: &Closure<dyn FnMut(f64, f64)>,
    ) -> js_sys::Promise;

    #[wasm_bindgen(js_name = setMarkers)]
    fn set_markers(handle: &JsValue, markers_json: &str);

    #[wasm_bindgen(js_name = destroyMap)]
    fn destroy_map(handle: &JsValue);
}

#[derive(Default)]
struct Widget {
    handle: Option<JsValue>,
    /// Markers set before the widget finished loading
    pending: Option<String>,
    destroyed: bool,
}

/// A mounted map widget
pub struct MapView {
    widget: Rc<RefCell<Widget>>,
    _on_double_click: Closure<dyn FnMut(f64, f64)>,
}

impl MapView {
    /// Load the widget into `element`; `on_pick` receives double-clicked points
    pub fn mount(
        element: &web_sys::HtmlElement,
        api_key: &str,
        center: Coordinate,
        zoom: u8,
        mut on_pick: impl FnMut(Coordinate) + 'static,
    ) -> Self {
        let on_double_click = Closure::wrap(Box::new(move |lat: f64, lng: f64| {
            match Coordinate::new(lat, lng) {
                Ok(position) => on_pick(position),
                Err(e) => web_sys::console::warn_1(&format!("Ignoring map click: {}", e).into()),
            }
        }) as Box<dyn FnMut(f64, f64)>);

        let widget = Rc::new(RefCell::new(Widget::default()));
        let promise = create_map(
            element,
            api_key,
            center.lat,
            center.lng,
            zoom,
            &on_double_click,
        );

        let loading = Rc::clone(&widget);
        wasm_bindgen_futures::spawn_local(async move {
            match JsFuture::from(promise).await {
                Ok(handle) => {
                    let mut widget = loading.borrow_mut();
                    if widget.destroyed {
                        destroy_map(&handle);
                        return;
                    }
                    if let Some(json) = widget.pending.take() {
                        set_markers(&handle, &json);
                    }
                    widget.handle = Some(handle);
                }
                Err(e) => {
                    web_sys::console::error_1(&format!("Failed to load map widget: {:?}", e).into());
                }
            }
        });

        Self {
            widget,
            _on_double_click: on_double_click,
        }
    }

    /// Replace every marker on the map
    pub fn show(&self, markers: &[MarkerSpec]) {
        let widgets: Vec<WidgetMarker> = markers.iter().map(MarkerSpec::to_widget).collect();
        let json = match serde_json::to_string(&widgets) {
            Ok(json) => json,
            Err(e) => {
                web_sys::console::error_1(&format!("Failed to encode markers: {}", e).into());
                return;
            }
        };

        let mut widget = self.widget.borrow_mut();
        match widget.handle.as_ref() {
            Some(handle) => set_markers(handle, &json),
            None => widget.pending = Some(json),
        }
    }

    pub fn destroy(&self) {
        let mut widget = self.widget.borrow_mut();
        widget.destroyed = true;
        if let Some(handle) = widget.handle.take() {
            destroy_map(&handle);
        }
    }
}
