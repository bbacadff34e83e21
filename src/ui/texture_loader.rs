// Background texture loading shared by carousels and the lightbox.
// Worker threads read and decode; results come back to the main loop over an
// async channel and are cached as textures keyed by (source, max edge).

use gdk4::Texture;
use gtk4::prelude::*;
use gtk4::{gdk, glib};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::rc::Rc;

use crate::image_loader::{self, DecodedImage};

const LOADER_THREADS: usize = 4;
const LOADER_QUEUE: usize = 256;
const DEFAULT_CACHE_ENTRIES: usize = 64;

type TextureKey = (String, u32);
type Waiter = Box<dyn FnOnce(Result<&Texture, TextureMiss>)>;

/// Why a texture request produced no texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureMiss {
    /// The decode queue was full; asking again later may succeed.
    Busy,
    /// The image could not be read or decoded.
    Failed,
}

#[derive(Debug)]
struct DecodeRequest {
    key: TextureKey,
}

#[derive(Debug)]
struct DecodeResult {
    key: TextureKey,
    image: Option<DecodedImage>,
}

struct LoaderState {
    pending: HashSet<TextureKey>,
    waiters: HashMap<TextureKey, Vec<Waiter>>,
    cache: lru::LruCache<TextureKey, Texture>,
}

struct TextureLoader {
    request_tx: flume::Sender<DecodeRequest>,
    state: RefCell<LoaderState>,
}

thread_local! {
    static TEXTURE_LOADER: Rc<TextureLoader> = TextureLoader::new();
}

impl TextureLoader {
    fn new() -> Rc<Self> {
        let (request_tx, request_rx) = flume::bounded::<DecodeRequest>(LOADER_QUEUE);
        let (result_tx, result_rx) = async_channel::unbounded::<DecodeResult>();

        for _ in 0..LOADER_THREADS {
            let rx = request_rx.clone();
            let tx = result_tx.clone();
            std::thread::spawn(move || {
                while let Ok(req) = rx.recv() {
                    let (source, max_edge) = &req.key;
                    let image = match image_loader::load_source(source, *max_edge) {
                        Ok(image) => Some(image),
                        Err(err) => {
                            tracing::warn!("Failed to load {}: {}", source, err);
                            None
                        }
                    };
                    if tx.send_blocking(DecodeResult { key: req.key, image }).is_err() {
                        break;
                    }
                }
            });
        }

        let capacity = NonZeroUsize::new(DEFAULT_CACHE_ENTRIES).unwrap_or(NonZeroUsize::MIN);
        let loader = Rc::new(Self {
            request_tx,
            state: RefCell::new(LoaderState {
                pending: HashSet::new(),
                waiters: HashMap::new(),
                cache: lru::LruCache::new(capacity),
            }),
        });

        let loader_weak = Rc::downgrade(&loader);
        glib::spawn_future_local(async move {
            while let Ok(result) = result_rx.recv().await {
                match loader_weak.upgrade() {
                    Some(loader) => loader.finish(result),
                    None => break,
                }
            }
        });

        loader
    }

    fn request(&self, key: TextureKey, waiter: Waiter) {
        let mut state = self.state.borrow_mut();

        if let Some(texture) = state.cache.get(&key).cloned() {
            // Keep delivery asynchronous so callers never re-enter themselves.
            glib::idle_add_local_once(move || waiter(Ok(&texture)));
            return;
        }

        state.waiters.entry(key.clone()).or_default().push(waiter);

        if state.pending.insert(key.clone()) {
            tracing::trace!("Queueing decode of {} at {}px", key.0, key.1);
            if self
                .request_tx
                .try_send(DecodeRequest { key: key.clone() })
                .is_err()
            {
                tracing::warn!("Texture queue full, dropping {}", key.0);
                state.pending.remove(&key);
                let dropped = state.waiters.remove(&key).unwrap_or_default();
                glib::idle_add_local_once(move || {
                    for waiter in dropped {
                        waiter(Err(TextureMiss::Busy));
                    }
                });
            }
        }
    }

    fn finish(&self, result: DecodeResult) {
        let texture = result
            .image
            .and_then(|image| create_texture_from_rgba(image.rgba, image.width, image.height));

        let waiters = {
            let mut state = self.state.borrow_mut();
            state.pending.remove(&result.key);
            if let Some(ref texture) = texture {
                state.cache.put(result.key.clone(), texture.clone());
            }
            state.waiters.remove(&result.key).unwrap_or_default()
        };

        for waiter in waiters {
            waiter(texture.as_ref().ok_or(TextureMiss::Failed));
        }
    }
}

/// Requests `source` decoded to at most `max_edge` pixels on its longest side.
///
/// `on_ready` always runs exactly once on the main loop, with the texture or
/// the reason there is none. Callers hold weak references in the closure so
/// late results for torn-down widgets are dropped.
pub fn request_texture<F>(source: &str, max_edge: u32, on_ready: F)
where
    F: FnOnce(Result<&Texture, TextureMiss>) + 'static,
{
    TEXTURE_LOADER.with(|loader| {
        loader.request((source.to_string(), max_edge), Box::new(on_ready));
    });
}

/// Resizes the texture cache, evicting the oldest entries if it shrinks.
pub fn set_cache_capacity(entries: usize) {
    let capacity = NonZeroUsize::new(entries).unwrap_or(NonZeroUsize::MIN);
    TEXTURE_LOADER.with(|loader| loader.state.borrow_mut().cache.resize(capacity));
}

fn create_texture_from_rgba(rgba: Vec<u8>, width: u32, height: u32) -> Option<Texture> {
    if width == 0 || height == 0 {
        return None;
    }
    let expected = (width as usize)
        .saturating_mul(height as usize)
        .saturating_mul(4);
    if rgba.len() < expected {
        return None;
    }
    let bytes = glib::Bytes::from_owned(rgba);
    let texture = gdk::MemoryTexture::new(
        width as i32,
        height as i32,
        gdk::MemoryFormat::R8g8b8a8,
        &bytes,
        (width * 4) as usize,
    );
    Some(texture.upcast())
}
