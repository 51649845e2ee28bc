//! GTK4 embedding for the Cairo backend.
//!
//! The widget's frame clock drives the render scheduler: every tick drains the
//! queued frame handles into [`ScatterChart::on_animation_frame`], then the
//! draw function composites both layer surfaces onto the widget.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use gtk4 as gtk;
use gtk::prelude::*;
use gtk::{gdk, glib};
use tracing::{debug, warn};

use crate::api::ScatterChart;
use crate::core::types::{CanvasSize, ScreenPoint};
use crate::error::{ScatterError, ScatterResult};
use crate::interaction::PolygonState;
use crate::render::{CairoSurface, DevicePixelRatio, ManualFrameClock};

pub type GtkScatterChart = ScatterChart<CairoSurface, ManualFrameClock>;

/// A `DrawingArea` bound to one scatter chart.
pub struct GtkScatterAdapter {
    area: gtk::DrawingArea,
    chart: Rc<RefCell<GtkScatterChart>>,
}

impl GtkScatterAdapter {
    #[must_use]
    pub fn new(chart: GtkScatterChart) -> Self {
        let area = gtk::DrawingArea::new();
        let canvas = chart.canvas();
        area.set_content_width(canvas.width.round() as i32);
        area.set_content_height(canvas.height.round() as i32);
        area.set_focusable(true);

        let adapter = Self {
            area,
            chart: Rc::new(RefCell::new(chart)),
        };
        adapter.install_draw_func();
        adapter.install_tick_callback();
        adapter.install_scale_factor_listener();
        adapter.install_resize_listener();
        adapter.install_pointer_controllers();
        adapter.install_key_controller();
        adapter
    }

    #[must_use]
    pub fn widget(&self) -> &gtk::DrawingArea {
        &self.area
    }

    #[must_use]
    pub fn chart(&self) -> Rc<RefCell<GtkScatterChart>> {
        Rc::clone(&self.chart)
    }

    /// Enters polygon drawing; subsequent primary clicks add vertices.
    pub fn start_drawing(&self) -> bool {
        self.chart.borrow_mut().start_drawing()
    }

    fn install_draw_func(&self) {
        let chart = Rc::clone(&self.chart);
        self.area.set_draw_func(move |_area, cr, _width, _height| {
            let Ok(chart) = chart.try_borrow() else {
                warn!("chart busy during widget draw, frame skipped");
                return;
            };
            if let Err(err) = composite_layers(&chart, cr) {
                warn!(error = %err, "failed to composite chart layers");
            }
        });
    }

    fn install_tick_callback(&self) {
        let chart = Rc::clone(&self.chart);
        self.area.add_tick_callback(move |widget, _clock| {
            let mut chart = chart.borrow_mut();
            let mut painted = false;

            match chart.poll_resize(Instant::now()) {
                Ok(true) => {
                    let canvas = chart.canvas();
                    debug!(width = canvas.width, height = canvas.height, "gtk resize applied");
                }
                Ok(false) => {}
                Err(err) => warn!(error = %err, "resize failed"),
            }

            let due = chart.frame_requester_mut().drain_due();
            for handle in due {
                match chart.on_animation_frame(handle) {
                    Ok(ran) => painted |= ran,
                    Err(err) => warn!(handle = handle.raw(), error = %err, "frame draw failed"),
                }
            }
            if painted {
                widget.queue_draw();
            }
            glib::ControlFlow::Continue
        });
    }

    fn install_scale_factor_listener(&self) {
        let chart = Rc::clone(&self.chart);
        self.area.connect_scale_factor_notify(move |widget| {
            let ratio = match DevicePixelRatio::new(f64::from(widget.scale_factor())) {
                Ok(ratio) => ratio,
                Err(err) => {
                    warn!(error = %err, "ignoring invalid scale factor");
                    return;
                }
            };
            if let Err(err) = chart.borrow_mut().set_device_pixel_ratio(ratio) {
                warn!(error = %err, "device pixel ratio change failed");
            }
        });
    }

    fn install_resize_listener(&self) {
        let chart = Rc::clone(&self.chart);
        self.area.connect_resize(move |_area, width, height| {
            chart
                .borrow_mut()
                .request_resize(CanvasSize::new(f64::from(width), f64::from(height)), Instant::now());
        });
    }

    fn install_pointer_controllers(&self) {
        let motion = gtk::EventControllerMotion::new();
        let chart = Rc::clone(&self.chart);
        motion.connect_motion(move |_controller, x, y| {
            chart.borrow_mut().pointer_move(ScreenPoint::new(x, y));
        });
        self.area.add_controller(motion);

        let click = gtk::GestureClick::new();
        click.set_button(gdk::BUTTON_PRIMARY);
        let chart = Rc::clone(&self.chart);
        click.connect_pressed(move |gesture, _presses, x, y| {
            if let Some(widget) = gesture.widget() {
                widget.grab_focus();
            }
            let point = ScreenPoint::new(x, y);
            let mut chart = chart.borrow_mut();
            if chart.drawing().is_drawing() {
                let edit = chart.add_vertex(point);
                debug!(?edit, "gtk click while drawing");
            } else {
                let target = chart.polygons().polygon_at(point).cloned();
                chart.select_polygon(target.as_ref());
            }
        });
        self.area.add_controller(click);
    }

    fn install_key_controller(&self) {
        let keys = gtk::EventControllerKey::new();
        let chart = Rc::clone(&self.chart);
        keys.connect_key_pressed(move |_controller, key, _code, _modifiers| {
            let mut chart = chart.borrow_mut();
            let handled = match key {
                gdk::Key::Escape => chart.cancel_drawing(),
                gdk::Key::Return | gdk::Key::KP_Enter => {
                    chart.complete_polygon();
                    true
                }
                gdk::Key::Delete | gdk::Key::BackSpace => {
                    let selected = chart
                        .polygons()
                        .iter()
                        .find(|polygon| polygon.state == PolygonState::Selected)
                        .map(|polygon| polygon.id.clone());
                    selected.is_some_and(|id| chart.delete_polygon(&id))
                }
                _ => false,
            };
            if handled {
                glib::Propagation::Stop
            } else {
                glib::Propagation::Proceed
            }
        });
        self.area.add_controller(keys);
    }
}

impl Drop for GtkScatterAdapter {
    fn drop(&mut self) {
        if let Ok(mut chart) = self.chart.try_borrow_mut() {
            chart.teardown();
        }
    }
}

/// Paints the layer backing buffers bottom to top, undoing the backing scale.
fn composite_layers(chart: &GtkScatterChart, cr: &gtk::cairo::Context) -> ScatterResult<()> {
    for layer in chart.layers().ordered() {
        if !layer.is_enabled() {
            continue;
        }
        let Some(surface) = layer.surface().image_surface() else {
            continue;
        };
        let inverse = 1.0 / layer.device_pixel_ratio().get();
        cr.save().map_err(cairo_error)?;
        cr.scale(inverse, inverse);
        cr.set_source_surface(surface, 0.0, 0.0)
            .map_err(cairo_error)?;
        cr.paint().map_err(cairo_error)?;
        cr.restore().map_err(cairo_error)?;
    }
    Ok(())
}

fn cairo_error(err: gtk::cairo::Error) -> ScatterError {
    ScatterError::Backend(format!("gtk composite failed: {err}"))
}
