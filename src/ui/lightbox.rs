// Modal lightbox shared by every carousel on the page
// - Backdrop click, close button and Escape close it
// - Arrow keys and the side buttons wrap around the image list
// - The image fades/scales in once its full-size texture has arrived

use gdk4::Texture;
use gtk4::gdk::Key;
use gtk4::prelude::*;
use gtk4::subclass::prelude::*;
use gtk4::{
    glib, Align, Box as GtkBox, Button, ContentFit, EventControllerKey, EventControllerScroll,
    EventControllerScrollFlags, GestureClick, Label, Orientation, Overlay, Picture,
    PropagationPhase, Widget,
};
use std::cell::RefCell;

use super::texture_loader::{request_texture, TextureMiss};
use crate::carousel::{CloseReason, Lightbox, LightboxKey};
use crate::config::LIGHTBOX_DECODE_EDGE;
use crate::models::ImageList;

/// Maps a key press onto the keys the lightbox understands.
pub fn lightbox_key(key: Key) -> LightboxKey {
    match key {
        Key::Escape => LightboxKey::Escape,
        Key::Left | Key::KP_Left => LightboxKey::ArrowLeft,
        Key::Right | Key::KP_Right => LightboxKey::ArrowRight,
        _ => LightboxKey::Other,
    }
}

mod imp {
    use super::*;

    pub struct LightboxOverlayInner {
        pub root: RefCell<Option<Overlay>>,
        pub picture: RefCell<Option<Picture>>,
        pub counter: RefCell<Option<Label>>,
        pub state: RefCell<Lightbox>,
        // Key controller attached to the toplevel while open
        pub key_binding: RefCell<Option<(Widget, EventControllerKey)>>,
    }

    impl Default for LightboxOverlayInner {
        fn default() -> Self {
            Self {
                root: RefCell::new(None),
                picture: RefCell::new(None),
                counter: RefCell::new(None),
                state: RefCell::new(Lightbox::new(ImageList::empty())),
                key_binding: RefCell::new(None),
            }
        }
    }

    #[glib::object_subclass]
    impl ObjectSubclass for LightboxOverlayInner {
        const NAME: &'static str = "FolioLightboxOverlay";
        type Type = super::LightboxOverlay;
        type ParentType = glib::Object;
    }

    impl ObjectImpl for LightboxOverlayInner {
        fn dispose(&self) {
            if let Some((target, controller)) = self.key_binding.borrow_mut().take() {
                target.remove_controller(&controller);
            }
            self.state.borrow_mut().close(CloseReason::Teardown);
        }
    }
}

glib::wrapper! {
    pub struct LightboxOverlay(ObjectSubclass<imp::LightboxOverlayInner>);
}

impl Default for LightboxOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl LightboxOverlay {
    pub fn new() -> Self {
        let obj: Self = glib::Object::builder().build();
        obj.setup_widgets();
        obj
    }

    fn setup_widgets(&self) {
        let imp = self.imp();

        let backdrop = GtkBox::new(Orientation::Vertical, 0);
        backdrop.add_css_class("lightbox-backdrop");
        backdrop.set_hexpand(true);
        backdrop.set_vexpand(true);
        let backdrop_click = GestureClick::new();
        let lightbox_weak = self.downgrade();
        backdrop_click.connect_released(move |_, _n, _x, _y| {
            if let Some(lightbox) = lightbox_weak.upgrade() {
                lightbox.close(CloseReason::Backdrop);
            }
        });
        backdrop.add_controller(backdrop_click);

        let picture = Picture::new();
        picture.set_content_fit(ContentFit::Contain);
        picture.set_can_shrink(true);
        picture.set_hexpand(true);
        picture.set_vexpand(true);
        picture.add_css_class("lightbox-image");

        let counter = Label::new(None);
        counter.add_css_class("lightbox-counter");

        let frame = GtkBox::new(Orientation::Vertical, 8);
        frame.add_css_class("lightbox-frame");
        frame.set_halign(Align::Center);
        frame.set_valign(Align::Center);
        frame.set_margin_start(72);
        frame.set_margin_end(72);
        frame.set_margin_top(48);
        frame.set_margin_bottom(48);
        frame.append(&picture);
        frame.append(&counter);

        let close_button = Button::with_label("✕");
        close_button.add_css_class("lightbox-close");
        close_button.set_halign(Align::End);
        close_button.set_valign(Align::Start);
        close_button.set_tooltip_text(Some("Close"));
        close_button.update_property(&[gtk4::accessible::Property::Label("Close")]);
        let lightbox_weak = self.downgrade();
        close_button.connect_clicked(move |_| {
            if let Some(lightbox) = lightbox_weak.upgrade() {
                lightbox.close(CloseReason::Button);
            }
        });

        let prev_button = Self::create_nav_button("‹", "Previous", Align::Start);
        let lightbox_weak = self.downgrade();
        prev_button.connect_clicked(move |_| {
            if let Some(lightbox) = lightbox_weak.upgrade() {
                lightbox.handle_key(LightboxKey::ArrowLeft);
            }
        });

        let next_button = Self::create_nav_button("›", "Next", Align::End);
        let lightbox_weak = self.downgrade();
        next_button.connect_clicked(move |_| {
            if let Some(lightbox) = lightbox_weak.upgrade() {
                lightbox.handle_key(LightboxKey::ArrowRight);
            }
        });

        let root = Overlay::new();
        root.add_css_class("lightbox");
        root.set_child(Some(&backdrop));
        root.add_overlay(&frame);
        root.add_overlay(&close_button);
        root.add_overlay(&prev_button);
        root.add_overlay(&next_button);
        root.set_visible(false);

        // The page underneath must not scroll while the lightbox is up.
        let scroll_blocker = EventControllerScroll::new(EventControllerScrollFlags::BOTH_AXES);
        scroll_blocker.connect_scroll(|_, _dx, _dy| glib::Propagation::Stop);
        root.add_controller(scroll_blocker);

        *imp.root.borrow_mut() = Some(root);
        *imp.picture.borrow_mut() = Some(picture);
        *imp.counter.borrow_mut() = Some(counter);
    }

    fn create_nav_button(glyph: &str, label: &str, halign: Align) -> Button {
        let button = Button::with_label(glyph);
        button.add_css_class("lightbox-nav");
        button.set_halign(halign);
        button.set_valign(Align::Center);
        button.set_tooltip_text(Some(label));
        button.update_property(&[gtk4::accessible::Property::Label(label)]);
        button
    }

    /// Open on `index` of `images`. Empty lists are ignored.
    pub fn open(&self, images: &ImageList, index: usize) {
        let imp = self.imp();
        let was_open = imp.state.borrow().is_open();
        if !imp.state.borrow_mut().open_list(images, index) {
            return;
        }
        if let Some(root) = imp.root.borrow().as_ref() {
            root.set_visible(true);
        }
        if !was_open {
            self.attach_keys();
        }
        self.show_active();
    }

    pub fn close(&self, reason: CloseReason) {
        let imp = self.imp();
        if !imp.state.borrow_mut().close(reason) {
            return;
        }
        self.hide_overlay();
    }

    fn hide_overlay(&self) {
        let imp = self.imp();
        self.detach_keys();
        if let Some(root) = imp.root.borrow().as_ref() {
            root.set_visible(false);
        }
        if let Some(picture) = imp.picture.borrow().as_ref() {
            picture.remove_css_class("loaded");
            picture.set_paintable(None::<&Texture>);
        }
    }

    /// Returns true when the key was consumed.
    pub fn handle_key(&self, key: LightboxKey) -> bool {
        let imp = self.imp();
        let was_open = imp.state.borrow().is_open();
        let handled = imp.state.borrow_mut().handle_key(key);
        if !handled {
            return false;
        }
        if was_open && !imp.state.borrow().is_open() {
            self.hide_overlay();
        } else {
            self.show_active();
        }
        true
    }

    fn attach_keys(&self) {
        let imp = self.imp();
        let Some(target) = imp
            .root
            .borrow()
            .as_ref()
            .and_then(|root| root.root())
            .map(|root| root.upcast::<Widget>())
        else {
            tracing::debug!("Lightbox opened before being added to a window");
            return;
        };

        let key_controller = EventControllerKey::new();
        key_controller.set_propagation_phase(PropagationPhase::Capture);
        let lightbox_weak = self.downgrade();
        key_controller.connect_key_pressed(move |_, key, _code, _state| {
            if let Some(lightbox) = lightbox_weak.upgrade() {
                if lightbox.handle_key(lightbox_key(key)) {
                    return glib::Propagation::Stop;
                }
            }
            glib::Propagation::Proceed
        });
        target.add_controller(key_controller.clone());
        *imp.key_binding.borrow_mut() = Some((target, key_controller));
    }

    fn detach_keys(&self) {
        if let Some((target, controller)) = self.imp().key_binding.borrow_mut().take() {
            target.remove_controller(&controller);
        }
    }

    /// Show the active image: hidden until its texture arrives.
    fn show_active(&self) {
        let imp = self.imp();
        let (images, index, source) = {
            let state = imp.state.borrow();
            let (Some(index), Some(source)) = (state.active_index(), state.active_source()) else {
                return;
            };
            (state.images().clone(), index, source.to_string())
        };

        if let Some(picture) = imp.picture.borrow().as_ref() {
            picture.remove_css_class("loaded");
            picture.set_alternative_text(Some(&format!("Image {}", index + 1)));
        }
        if let Some(counter) = imp.counter.borrow().as_ref() {
            counter.set_text(&format!("{} / {}", index + 1, images.len()));
        }

        let lightbox_weak = self.downgrade();
        request_texture(&source, LIGHTBOX_DECODE_EDGE, move |texture| {
            if let Some(lightbox) = lightbox_weak.upgrade() {
                lightbox.apply_texture(&images, index, texture);
            }
        });
    }

    fn apply_texture(
        &self,
        images: &ImageList,
        index: usize,
        texture: Result<&Texture, TextureMiss>,
    ) {
        let imp = self.imp();
        let texture = match texture {
            Ok(texture) => texture,
            Err(miss) => {
                tracing::debug!(index, ?miss, "lightbox image unavailable");
                return;
            }
        };
        {
            let mut state = imp.state.borrow_mut();
            if !state.images().same_list(images) || !state.mark_loaded(index) {
                return;
            }
        }
        if let Some(picture) = imp.picture.borrow().as_ref() {
            picture.set_paintable(Some(texture));
            picture.add_css_class("loaded");
        }
    }

    /// Get the widget to add to the UI
    pub fn widget(&self) -> Widget {
        self.imp()
            .root
            .borrow()
            .as_ref()
            .map(|root| root.clone().upcast())
            .unwrap_or_else(|| GtkBox::new(Orientation::Vertical, 0).upcast())
    }
}
