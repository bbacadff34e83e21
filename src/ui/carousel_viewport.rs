// Clipping viewport for the carousel track.
// Every allocation reports (viewport width, track width) to the owner, which
// answers with the offset to translate the track by.

use glib::Object;
use gtk4::prelude::*;
use gtk4::subclass::prelude::*;
use gtk4::{glib, graphene, gsk, Orientation, Overflow, Widget};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// `(viewport_width, track_width) -> offset`. A `None` extent means that
/// side has not been laid out yet.
pub type AllocateCallback = Rc<dyn Fn(Option<f64>, Option<f64>) -> Option<f64>>;

mod imp {
    use super::*;

    #[derive(Default)]
    pub struct CarouselViewportInner {
        pub track: RefCell<Option<Widget>>,
        pub offset: Cell<f64>,
        pub on_allocate: RefCell<Option<AllocateCallback>>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for CarouselViewportInner {
        const NAME: &'static str = "FolioCarouselViewport";
        type Type = super::CarouselViewport;
        type ParentType = Widget;
    }

    impl ObjectImpl for CarouselViewportInner {
        fn constructed(&self) {
            self.parent_constructed();

            let obj = self.obj();
            obj.set_overflow(Overflow::Hidden);
            obj.set_hexpand(true);
            obj.add_css_class("carousel-viewport");
            obj.set_cursor_from_name(Some("grab"));
        }

        fn dispose(&self) {
            self.on_allocate.borrow_mut().take();
            if let Some(track) = self.track.borrow_mut().take() {
                track.unparent();
            }
        }
    }

    impl WidgetImpl for CarouselViewportInner {
        fn measure(&self, orientation: Orientation, _for_size: i32) -> (i32, i32, i32, i32) {
            let Some(track) = self.track.borrow().clone() else {
                return (0, 0, -1, -1);
            };
            match orientation {
                // Any width is fine; the track scrolls inside it.
                Orientation::Horizontal => {
                    let (track_min, _, _, _) = track.measure(Orientation::Horizontal, -1);
                    (0, track_min, -1, -1)
                }
                _ => {
                    let (track_min, _, _, _) = track.measure(Orientation::Vertical, -1);
                    (track_min, track_min, -1, -1)
                }
            }
        }

        fn size_allocate(&self, width: i32, height: i32, baseline: i32) {
            let Some(track) = self.track.borrow().clone() else {
                return;
            };
            // Slides are fixed-size, so the minimum is the content width.
            let (track_width, _, _, _) = track.measure(Orientation::Horizontal, height);
            let track_width = track_width.max(0);

            let callback = self.on_allocate.borrow().clone();
            if let Some(callback) = callback {
                let viewport = (width > 0).then_some(width as f64);
                if let Some(offset) = callback(viewport, Some(track_width as f64)) {
                    self.offset.set(offset);
                }
            }

            let transform = gsk::Transform::new()
                .translate(&graphene::Point::new(self.offset.get().round() as f32, 0.0));
            track.allocate(track_width, height, baseline, Some(transform));
        }
    }
}

glib::wrapper! {
    pub struct CarouselViewport(ObjectSubclass<imp::CarouselViewportInner>)
        @extends Widget,
        @implements gtk4::Accessible, gtk4::Buildable, gtk4::ConstraintTarget;
}

impl CarouselViewport {
    pub fn new(track: &impl IsA<Widget>) -> Self {
        let obj: Self = Object::builder().build();
        track.set_parent(&obj);
        *obj.imp().track.borrow_mut() = Some(track.clone().upcast());
        obj
    }

    pub fn connect_allocate<F>(&self, callback: F)
    where
        F: Fn(Option<f64>, Option<f64>) -> Option<f64> + 'static,
    {
        *self.imp().on_allocate.borrow_mut() = Some(Rc::new(callback));
    }

    /// Offset applied at the last allocation.
    pub fn offset(&self) -> f64 {
        self.imp().offset.get()
    }

    /// Re-runs allocation so the owner can supply a new offset.
    pub fn refresh(&self) {
        self.queue_allocate();
    }
}
