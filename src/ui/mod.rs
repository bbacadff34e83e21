pub mod carousel_viewport;
pub mod carousel_widget;
pub mod lightbox;
pub mod texture_loader;
pub mod window;

pub use window::MainWindow;
