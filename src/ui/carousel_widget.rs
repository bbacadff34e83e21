// Draggable image carousel
// - Prev/next buttons step by most of the viewport width
// - Drag follows the pointer with elastic give at the edges
// - Edge fades appear while content is hidden past an edge
// - A tap on a slide asks the owner to open the lightbox

use gdk4::Texture;
use gtk4::prelude::*;
use gtk4::subclass::prelude::*;
use gtk4::{
    glib, Align, Box as GtkBox, Button, ContentFit, GestureClick, GestureDrag, Orientation,
    Overlay, Picture, Widget,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::carousel_viewport::CarouselViewport;
use super::texture_loader::{request_texture, TextureMiss};
use crate::carousel::{
    slide_at, visible_slides, BoundsTracker, FadeVisibility, Frame, LoadFlags, OffsetController,
    SlideRequests, TapDecision, TapTracker,
};
use crate::config::{CarouselConfig, SLIDE_DECODE_EDGE};
use crate::models::ImageList;

/// Width of the edge-fade overlays.
const FADE_WIDTH: i32 = 56;

type SlideActivatedCallback = Rc<dyn Fn(&ImageList, usize)>;

mod imp {
    use super::*;

    pub struct CarouselWidgetInner {
        pub root: RefCell<Option<Overlay>>,
        pub viewport: RefCell<Option<CarouselViewport>>,
        pub track: RefCell<Option<GtkBox>>,
        pub pictures: RefCell<Vec<Picture>>,
        pub fade_left: RefCell<Option<GtkBox>>,
        pub fade_right: RefCell<Option<GtkBox>>,
        pub config: RefCell<CarouselConfig>,
        pub images: RefCell<ImageList>,
        pub controller: RefCell<OffsetController>,
        pub bounds: RefCell<BoundsTracker>,
        pub flags: RefCell<LoadFlags>,
        pub requested: RefCell<SlideRequests>,
        pub taps: RefCell<TapTracker>,
        pub tick_id: RefCell<Option<gtk4::TickCallbackId>>,
        pub last_frame_time: Cell<Option<i64>>,
        pub on_slide_activated: RefCell<Option<SlideActivatedCallback>>,
    }

    impl Default for CarouselWidgetInner {
        fn default() -> Self {
            let images = ImageList::empty();
            Self {
                root: RefCell::new(None),
                viewport: RefCell::new(None),
                track: RefCell::new(None),
                pictures: RefCell::new(Vec::new()),
                fade_left: RefCell::new(None),
                fade_right: RefCell::new(None),
                config: RefCell::new(CarouselConfig::default()),
                flags: RefCell::new(LoadFlags::new(&images)),
                images: RefCell::new(images),
                controller: RefCell::new(OffsetController::new(CarouselConfig::default())),
                bounds: RefCell::new(BoundsTracker::new()),
                requested: RefCell::new(SlideRequests::default()),
                taps: RefCell::new(TapTracker::default()),
                tick_id: RefCell::new(None),
                last_frame_time: Cell::new(None),
                on_slide_activated: RefCell::new(None),
            }
        }
    }

    #[glib::object_subclass]
    impl ObjectSubclass for CarouselWidgetInner {
        const NAME: &'static str = "FolioCarouselWidget";
        type Type = super::CarouselWidget;
        type ParentType = glib::Object;
    }

    impl ObjectImpl for CarouselWidgetInner {
        fn dispose(&self) {
            if let Some(id) = self.tick_id.borrow_mut().take() {
                id.remove();
            }
            self.controller.borrow_mut().cancel();
            self.on_slide_activated.borrow_mut().take();
        }
    }
}

glib::wrapper! {
    pub struct CarouselWidget(ObjectSubclass<imp::CarouselWidgetInner>);
}

impl CarouselWidget {
    pub fn new(images: ImageList, config: CarouselConfig) -> Self {
        let obj: Self = glib::Object::builder().build();
        {
            let imp = obj.imp();
            *imp.controller.borrow_mut() = OffsetController::new(config.clone());
            *imp.config.borrow_mut() = config;
        }
        obj.setup_widgets();
        obj.set_images(images);
        obj
    }

    fn setup_widgets(&self) {
        let imp = self.imp();
        let gap = imp.config.borrow().slide_gap;

        let track = GtkBox::new(Orientation::Horizontal, gap);
        track.add_css_class("carousel-track");

        let viewport = CarouselViewport::new(&track);
        let carousel_weak = self.downgrade();
        viewport.connect_allocate(move |viewport_w, track_w| {
            carousel_weak
                .upgrade()
                .map(|carousel| carousel.on_viewport_allocated(viewport_w, track_w))
        });

        let fade_left = Self::create_fade("fade-left", Align::Start);
        let fade_right = Self::create_fade("fade-right", Align::End);

        let prev_button = Self::create_nav_button("‹", "Previous", Align::Start);
        let carousel_weak = self.downgrade();
        prev_button.connect_clicked(move |_| {
            if let Some(carousel) = carousel_weak.upgrade() {
                carousel.imp().controller.borrow_mut().step_backward();
                carousel.ensure_ticking();
            }
        });

        let next_button = Self::create_nav_button("›", "Next", Align::End);
        let carousel_weak = self.downgrade();
        next_button.connect_clicked(move |_| {
            if let Some(carousel) = carousel_weak.upgrade() {
                carousel.imp().controller.borrow_mut().step_forward();
                carousel.ensure_ticking();
            }
        });

        let root = Overlay::new();
        root.add_css_class("carousel");
        root.set_child(Some(&viewport));
        root.add_overlay(&fade_left);
        root.add_overlay(&fade_right);
        root.add_overlay(&prev_button);
        root.add_overlay(&next_button);

        self.setup_gestures(&viewport);

        *imp.root.borrow_mut() = Some(root);
        *imp.viewport.borrow_mut() = Some(viewport);
        *imp.track.borrow_mut() = Some(track);
        *imp.fade_left.borrow_mut() = Some(fade_left);
        *imp.fade_right.borrow_mut() = Some(fade_right);
    }

    fn create_fade(class: &str, halign: Align) -> GtkBox {
        let fade = GtkBox::new(Orientation::Vertical, 0);
        fade.add_css_class("carousel-fade");
        fade.add_css_class(class);
        fade.set_halign(halign);
        fade.set_width_request(FADE_WIDTH);
        fade.set_can_target(false);
        fade.set_opacity(0.0);
        fade
    }

    fn create_nav_button(glyph: &str, label: &str, halign: Align) -> Button {
        let button = Button::with_label(glyph);
        button.add_css_class("carousel-nav");
        button.set_halign(halign);
        button.set_valign(Align::Center);
        button.set_tooltip_text(Some(label));
        button.update_property(&[gtk4::accessible::Property::Label(label)]);
        button
    }

    /// Set up drag and tap handling on the viewport
    fn setup_gestures(&self, viewport: &CarouselViewport) {
        let drag = GestureDrag::new();
        drag.set_button(1);

        let carousel_weak = self.downgrade();
        drag.connect_drag_begin(move |_, _x, _y| {
            if let Some(carousel) = carousel_weak.upgrade() {
                let imp = carousel.imp();
                imp.controller.borrow_mut().begin_drag();
                if let Some(viewport) = imp.viewport.borrow().as_ref() {
                    viewport.set_cursor_from_name(Some("grabbing"));
                }
            }
        });

        let carousel_weak = self.downgrade();
        drag.connect_drag_update(move |_, offset_x, offset_y| {
            if let Some(carousel) = carousel_weak.upgrade() {
                let frame = carousel
                    .imp()
                    .controller
                    .borrow_mut()
                    .update_drag(offset_x, offset_y);
                carousel.apply_frame(frame);
            }
        });

        let carousel_weak = self.downgrade();
        drag.connect_drag_end(move |_, _x, _y| {
            if let Some(carousel) = carousel_weak.upgrade() {
                carousel.release_drag();
            }
        });

        let carousel_weak = self.downgrade();
        drag.connect_cancel(move |_, _sequence| {
            if let Some(carousel) = carousel_weak.upgrade() {
                carousel.release_drag();
            }
        });
        viewport.add_controller(drag);

        let click = GestureClick::new();
        click.set_button(1);

        let carousel_weak = self.downgrade();
        click.connect_pressed(move |_, _n, x, y| {
            if let Some(carousel) = carousel_weak.upgrade() {
                carousel.imp().taps.borrow_mut().press(x, y);
            }
        });

        let carousel_weak = self.downgrade();
        click.connect_released(move |_, _n, x, y| {
            if let Some(carousel) = carousel_weak.upgrade() {
                carousel.handle_release(x, y);
            }
        });

        let carousel_weak = self.downgrade();
        click.connect_stopped(move |_| {
            if let Some(carousel) = carousel_weak.upgrade() {
                carousel.imp().taps.borrow_mut().cancel();
            }
        });
        viewport.add_controller(click);
    }

    /// Replace the image list. A different list rebuilds the slides and
    /// resets their load state.
    pub fn set_images(&self, images: ImageList) {
        let imp = self.imp();
        let changed = imp.flags.borrow_mut().sync(&images);
        if !changed && !imp.pictures.borrow().is_empty() {
            return;
        }
        tracing::debug!("Carousel showing {} images", images.len());

        let Some(track) = imp.track.borrow().clone() else {
            return;
        };
        for picture in imp.pictures.borrow_mut().drain(..) {
            track.remove(&picture);
        }

        let (slide_w, slide_h) = {
            let config = imp.config.borrow();
            (config.slide_width(), config.slide_height)
        };
        let mut pictures = Vec::with_capacity(images.len());
        for index in 0..images.len() {
            let picture = Picture::new();
            picture.set_content_fit(ContentFit::Cover);
            picture.set_can_shrink(true);
            picture.set_size_request(slide_w, slide_h);
            picture.set_alternative_text(Some(&format!("Slide {}", index + 1)));
            picture.add_css_class("carousel-slide");
            track.append(&picture);
            pictures.push(picture);
        }

        *imp.requested.borrow_mut() = SlideRequests::new(images.len());
        *imp.pictures.borrow_mut() = pictures;
        *imp.images.borrow_mut() = images;

        if let Some(viewport) = imp.viewport.borrow().as_ref() {
            viewport.queue_resize();
        }
    }

    fn release_drag(&self) {
        let imp = self.imp();
        imp.controller.borrow_mut().end_drag();
        if let Some(viewport) = imp.viewport.borrow().as_ref() {
            viewport.set_cursor_from_name(Some("grab"));
        }
        let frame = imp.controller.borrow().frame();
        self.apply_frame(frame);
        self.ensure_ticking();
    }

    fn handle_release(&self, x: f64, y: f64) {
        let imp = self.imp();
        let suppress = imp.controller.borrow().drag_suppresses_tap();
        let threshold = imp.config.borrow().tap_threshold;
        let decision = imp.taps.borrow_mut().release(x, y, suppress, threshold);
        if decision != TapDecision::Tap {
            return;
        }

        let offset = imp
            .viewport
            .borrow()
            .as_ref()
            .map(|viewport| viewport.offset())
            .unwrap_or(0.0);
        let (slide_w, gap) = {
            let config = imp.config.borrow();
            (config.slide_width() as f64, config.slide_gap as f64)
        };
        let images = imp.images.borrow().clone();
        let Some(index) = slide_at(x - offset, slide_w, gap, images.len()) else {
            return;
        };
        tracing::debug!("Slide {} tapped", index);

        let callback = imp.on_slide_activated.borrow().clone();
        if let Some(callback) = callback {
            callback(&images, index);
        }
    }

    /// Called from the viewport's allocation with fresh extents.
    fn on_viewport_allocated(&self, viewport_w: Option<f64>, track_w: Option<f64>) -> f64 {
        let imp = self.imp();
        let current = imp.controller.borrow().offset();
        let update = imp.bounds.borrow_mut().observe(viewport_w, track_w, current);
        let frame = match update {
            Some(update) => imp.controller.borrow_mut().apply_bounds(&update),
            None => imp.controller.borrow().frame(),
        };
        self.apply_fades(frame.fade);
        self.request_visible(frame.offset);
        frame.offset
    }

    fn apply_frame(&self, frame: Frame) {
        let imp = self.imp();
        self.apply_fades(frame.fade);
        if let Some(viewport) = imp.viewport.borrow().as_ref() {
            viewport.refresh();
        }
        self.request_visible(frame.offset);
    }

    fn apply_fades(&self, fade: FadeVisibility) {
        let imp = self.imp();
        if let Some(left) = imp.fade_left.borrow().as_ref() {
            left.set_opacity(if fade.show_left { 1.0 } else { 0.0 });
        }
        if let Some(right) = imp.fade_right.borrow().as_ref() {
            right.set_opacity(if fade.show_right { 1.0 } else { 0.0 });
        }
    }

    /// Start the frame-clock driven settle if one is pending.
    fn ensure_ticking(&self) {
        let imp = self.imp();
        if imp.tick_id.borrow().is_some() || !imp.controller.borrow().is_animating() {
            return;
        }
        let Some(viewport) = imp.viewport.borrow().clone() else {
            return;
        };
        imp.last_frame_time.set(None);

        let carousel_weak = self.downgrade();
        let id = viewport.add_tick_callback(move |_widget, clock| {
            let Some(carousel) = carousel_weak.upgrade() else {
                return glib::ControlFlow::Break;
            };
            let imp = carousel.imp();
            let now = clock.frame_time();
            let dt = imp
                .last_frame_time
                .replace(Some(now))
                .map(|prev| (now - prev) as f64 / 1_000_000.0)
                .unwrap_or(0.0);

            let animating = imp.controller.borrow_mut().tick(dt);
            let frame = imp.controller.borrow().frame();
            carousel.apply_frame(frame);

            if animating {
                glib::ControlFlow::Continue
            } else {
                // Returning Break removes the callback; forget the id.
                imp.tick_id.borrow_mut().take();
                glib::ControlFlow::Break
            }
        });
        *imp.tick_id.borrow_mut() = Some(id);
    }

    /// Ask for images of slides in or near the viewport.
    fn request_visible(&self, offset: f64) {
        let imp = self.imp();
        let viewport_w = imp.bounds.borrow().bounds().viewport_extent;
        if !imp.bounds.borrow().is_measured() {
            return;
        }
        let (slide_w, gap) = {
            let config = imp.config.borrow();
            (config.slide_width() as f64, config.slide_gap as f64)
        };
        let count = imp.images.borrow().len();
        let range = visible_slides(offset, viewport_w, slide_w, gap, count, viewport_w);

        let pending = imp.requested.borrow_mut().claim(range);
        for index in pending {
            self.request_slide(index);
        }
    }

    fn request_slide(&self, index: usize) {
        let images = self.imp().images.borrow().clone();
        let Some(source) = images.get(index).map(str::to_string) else {
            return;
        };
        let carousel_weak = self.downgrade();
        request_texture(&source, SLIDE_DECODE_EDGE, move |texture| {
            if let Some(carousel) = carousel_weak.upgrade() {
                carousel.apply_slide_texture(&images, index, texture);
            }
        });
    }

    fn apply_slide_texture(
        &self,
        images: &ImageList,
        index: usize,
        texture: Result<&Texture, TextureMiss>,
    ) {
        let imp = self.imp();
        if !imp.images.borrow().same_list(images) {
            return;
        }
        let texture = match texture {
            Ok(texture) => texture,
            Err(TextureMiss::Busy) => {
                // Ask again on the next layout pass.
                imp.requested.borrow_mut().release(index);
                if let Some(viewport) = imp.viewport.borrow().as_ref() {
                    viewport.refresh();
                }
                return;
            }
            // Failed loads stay unmarked; the slide keeps its empty frame.
            Err(TextureMiss::Failed) => return,
        };
        if imp.flags.borrow().is_loaded(index) {
            return;
        }
        let pictures = imp.pictures.borrow();
        let Some(picture) = pictures.get(index) else {
            return;
        };
        picture.set_paintable(Some(texture));
        let mut flags = imp.flags.borrow_mut();
        if flags.mark_loaded(index) {
            picture.add_css_class("loaded");
            tracing::trace!(
                index,
                loaded = flags.loaded_count(),
                total = flags.len(),
                "slide image shown"
            );
        }
    }

    /// Called with the image list and slide index on a genuine tap.
    pub fn connect_slide_activated<F: Fn(&ImageList, usize) + 'static>(&self, callback: F) {
        *self.imp().on_slide_activated.borrow_mut() = Some(Rc::new(callback));
    }

    /// Get the widget to add to the UI
    pub fn widget(&self) -> Widget {
        self.imp()
            .root
            .borrow()
            .as_ref()
            .map(|root| root.clone().upcast())
            .unwrap_or_else(|| GtkBox::new(Orientation::Horizontal, 0).upcast())
    }
}
