use std::rc::Rc;

/// File extensions the image decoder is built with.
pub fn is_image_extension(ext: &str) -> bool {
    matches!(
        ext.to_lowercase().as_str(),
        "jpg" | "jpeg" | "png" | "webp" | "gif" | "bmp" | "tiff" | "tif"
    )
}

/// Immutable, cheaply clonable list of image references (paths or URIs).
///
/// Clones share storage, and [`ImageList::same_list`] compares that storage
/// rather than the contents: two lists built separately from identical
/// strings are different lists.
#[derive(Debug, Clone)]
pub struct ImageList {
    sources: Rc<[String]>,
}

impl ImageList {
    pub fn new<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sources: Vec<String> = sources.into_iter().map(Into::into).collect();
        Self {
            sources: Rc::from(sources),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::<String>::new())
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.sources.get(index).map(String::as_str)
    }

    pub fn same_list(&self, other: &ImageList) -> bool {
        Rc::ptr_eq(&self.sources, &other.sources)
    }
}

impl From<Vec<String>> for ImageList {
    fn from(sources: Vec<String>) -> Self {
        Self {
            sources: Rc::from(sources),
        }
    }
}
