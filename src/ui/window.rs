// Main window for the folio portfolio page
// Sticky top bar, hero, one section per portfolio section (carousel plus
// project cards), and a single lightbox overlay shared by all carousels.

use gdk4::Display;
use gtk4::graphene;
use gtk4::prelude::*;
use gtk4::{
    glib, Align, Application, ApplicationWindow, Box as GtkBox, Button, CssProvider,
    EventControllerScroll, EventControllerScrollFlags, FlowBox, Label, LinkButton, Orientation,
    Overlay, PolicyType, PropagationPhase, ScrolledWindow, SelectionMode, Settings, Widget,
    STYLE_PROVIDER_PRIORITY_APPLICATION,
};
use std::cell::RefCell;
use std::path::Path;
use std::rc::{Rc, Weak};

use super::carousel_widget::CarouselWidget;
use super::lightbox::LightboxOverlay;
use super::texture_loader;
use crate::carousel::ScrollLock;
use crate::config::CarouselConfig;
use crate::models::{Link, Portfolio, ProjectCard, Section};

const PAGE_MARGIN: i32 = 32;
const SECTION_SPACING: i32 = 56;

/// Embedded copy of the essentials, used when style.css is not on disk.
const FALLBACK_CSS: &str = r#"
window {
    background-color: #0e0f13;
    color: #e6e6e6;
}

.top-bar {
    border-bottom: 1px solid #23252d;
    padding: 10px 24px;
}

.carousel-slide {
    opacity: 0;
    transition: opacity 400ms ease-out;
}

.carousel-slide.loaded {
    opacity: 1;
}

.carousel-fade.fade-left {
    background-image: linear-gradient(to right, #0e0f13, rgba(14, 15, 19, 0));
}

.carousel-fade.fade-right {
    background-image: linear-gradient(to left, #0e0f13, rgba(14, 15, 19, 0));
}

.lightbox-backdrop {
    background-color: rgba(0, 0, 0, 0.85);
}

.lightbox-image {
    opacity: 0;
    transition: opacity 250ms ease-out;
}

.lightbox-image.loaded {
    opacity: 1;
}
"#;

/// Load and apply the page stylesheet
fn load_css() {
    let provider = CssProvider::new();

    let css_path = concat!(env!("CARGO_MANIFEST_DIR"), "/src/style.css");

    if Path::new(css_path).exists() {
        provider.load_from_path(css_path);
        tracing::info!("Loaded CSS from: {}", css_path);
    } else {
        provider.load_from_string(FALLBACK_CSS);
        tracing::info!("Loaded fallback embedded CSS");
    }

    if let Some(display) = Display::default() {
        gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }
}

fn link_button(link: &Link, class: &str) -> LinkButton {
    let button = LinkButton::with_label(&link.url, &link.label);
    button.add_css_class(class);
    button
}

/// Main window showing one portfolio page
pub struct MainWindow {
    self_weak: RefCell<Weak<MainWindow>>,
    window: ApplicationWindow,
    scrolled: ScrolledWindow,
    page: GtkBox,
    lightbox: LightboxOverlay,
    carousels: RefCell<Vec<CarouselWidget>>,
    anchors: RefCell<Vec<(String, Widget)>>,
}

impl MainWindow {
    pub fn new(app: &Application, portfolio: &Portfolio, config: CarouselConfig) -> Rc<Self> {
        load_css();
        if let Some(settings) = Settings::default() {
            settings.set_gtk_application_prefer_dark_theme(true);
        }
        texture_loader::set_cache_capacity(config.texture_cache_entries);

        let window = ApplicationWindow::builder()
            .application(app)
            .title(portfolio.banner.as_str())
            .default_width(1200)
            .default_height(800)
            .build();

        let page = GtkBox::new(Orientation::Vertical, SECTION_SPACING);
        page.add_css_class("page");
        page.set_margin_start(PAGE_MARGIN);
        page.set_margin_end(PAGE_MARGIN);
        page.set_margin_bottom(PAGE_MARGIN * 2);

        let scrolled = ScrolledWindow::new();
        scrolled.set_hscrollbar_policy(PolicyType::Never);
        scrolled.set_vexpand(true);
        scrolled.set_child(Some(&page));

        let lightbox = LightboxOverlay::new();

        let main_window = Rc::new(Self {
            self_weak: RefCell::new(Weak::new()),
            window,
            scrolled,
            page,
            lightbox,
            carousels: RefCell::new(Vec::new()),
            anchors: RefCell::new(Vec::new()),
        });
        *main_window.self_weak.borrow_mut() = Rc::downgrade(&main_window);

        let top_bar = main_window.build_top_bar(portfolio);
        main_window.page.append(&Self::build_hero(portfolio));
        for section in &portfolio.sections {
            let section_widget = main_window.build_section(section, &config);
            main_window.page.append(&section_widget);
        }
        main_window.setup_scroll_lock();

        let content = GtkBox::new(Orientation::Vertical, 0);
        content.append(&top_bar);
        content.append(&main_window.scrolled);

        let root = Overlay::new();
        root.set_child(Some(&content));
        root.add_overlay(&main_window.lightbox.widget());
        main_window.window.set_child(Some(&root));

        tracing::info!(
            "Page ready: {} sections, {} carousels",
            portfolio.sections.len(),
            main_window.carousels.borrow().len()
        );
        main_window
    }

    fn build_top_bar(&self, portfolio: &Portfolio) -> GtkBox {
        let bar = GtkBox::new(Orientation::Horizontal, 8);
        bar.add_css_class("top-bar");

        let brand = Label::new(Some(&portfolio.banner));
        brand.add_css_class("brand");
        brand.set_halign(Align::Start);
        brand.set_hexpand(true);
        bar.append(&brand);

        for section in &portfolio.sections {
            let pill = Button::with_label(&section.nav_label);
            pill.add_css_class("pill");
            pill.set_tooltip_text(Some(&section.title));
            let window_weak = self.self_weak.borrow().clone();
            let id = section.id.clone();
            pill.connect_clicked(move |_| {
                if let Some(window) = window_weak.upgrade() {
                    window.scroll_to_section(&id);
                }
            });
            bar.append(&pill);
        }
        bar
    }

    fn build_hero(portfolio: &Portfolio) -> GtkBox {
        let hero = GtkBox::new(Orientation::Vertical, 12);
        hero.add_css_class("hero");

        let heading = Label::new(Some(&portfolio.heading));
        heading.add_css_class("hero-title");
        heading.set_halign(Align::Start);
        hero.append(&heading);

        let tagline = Label::new(Some(&portfolio.tagline));
        tagline.add_css_class("hero-tagline");
        tagline.set_halign(Align::Start);
        hero.append(&tagline);

        if !portfolio.links.is_empty() {
            let links = GtkBox::new(Orientation::Horizontal, 12);
            for link in &portfolio.links {
                links.append(&link_button(link, "hero-link"));
            }
            hero.append(&links);
        }
        hero
    }

    fn build_section(&self, section: &Section, config: &CarouselConfig) -> GtkBox {
        let section_box = GtkBox::new(Orientation::Vertical, 16);
        section_box.add_css_class("section");

        let header = GtkBox::new(Orientation::Horizontal, 8);
        let title = Label::new(Some(&section.title));
        title.add_css_class("section-title");
        title.set_halign(Align::Start);
        title.set_hexpand(true);
        header.append(&title);
        if let Some(ref view_all) = section.view_all {
            header.append(&link_button(view_all, "view-all"));
        }
        section_box.append(&header);

        if !section.images.is_empty() {
            let carousel = CarouselWidget::new(section.images.clone(), config.clone());
            let lightbox_weak = self.lightbox.downgrade();
            carousel.connect_slide_activated(move |images, index| {
                if let Some(lightbox) = lightbox_weak.upgrade() {
                    lightbox.open(images, index);
                }
            });
            section_box.append(&carousel.widget());
            self.carousels.borrow_mut().push(carousel);
        }

        if !section.projects.is_empty() {
            let cards = FlowBox::new();
            cards.set_selection_mode(SelectionMode::None);
            cards.set_column_spacing(16);
            cards.set_row_spacing(16);
            cards.set_max_children_per_line(3);
            for project in &section.projects {
                cards.insert(&Self::build_project_card(project), -1);
            }
            section_box.append(&cards);
        }

        self.anchors
            .borrow_mut()
            .push((section.id.clone(), section_box.clone().upcast()));
        section_box
    }

    fn build_project_card(project: &ProjectCard) -> GtkBox {
        let card = GtkBox::new(Orientation::Vertical, 6);
        card.add_css_class("project-card");

        let name = LinkButton::with_label(&project.url, &project.name);
        name.set_halign(Align::Start);
        card.append(&name);

        let description = Label::new(Some(&project.description));
        description.add_css_class("project-description");
        description.set_halign(Align::Start);
        description.set_wrap(true);
        card.append(&description);
        card
    }

    /// Page scrolling is swallowed while the scroll lock is held.
    fn setup_scroll_lock(&self) {
        let controller = EventControllerScroll::new(EventControllerScrollFlags::BOTH_AXES);
        controller.set_propagation_phase(PropagationPhase::Capture);
        controller.connect_scroll(|_, _dx, _dy| {
            if ScrollLock::global().is_locked() {
                glib::Propagation::Stop
            } else {
                glib::Propagation::Proceed
            }
        });
        self.scrolled.add_controller(controller);
    }

    /// Scroll the page so the section with `id` sits at the top.
    pub fn scroll_to_section(&self, id: &str) {
        if ScrollLock::global().is_locked() {
            return;
        }
        let anchors = self.anchors.borrow();
        let Some((_, anchor)) = anchors.iter().find(|(anchor_id, _)| anchor_id == id) else {
            tracing::debug!("No section with id {:?}", id);
            return;
        };
        let Some(point) = anchor.compute_point(&self.page, &graphene::Point::new(0.0, 0.0)) else {
            return;
        };
        let adjustment = self.scrolled.vadjustment();
        let max = (adjustment.upper() - adjustment.page_size()).max(adjustment.lower());
        adjustment.set_value((point.y() as f64).clamp(adjustment.lower(), max));
    }

    pub fn present(&self) {
        self.window.present();
    }
}
